//! Main compiler module.
//!
//! This module contains the `Compiler`, the per-run compilation context bundling
//! the LLVM module, the insertion cursor and the symbol table, and the `compile`
//! entry points driving the lowering of a program's root node.

use std::ops::{Deref, DerefMut};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::Module,
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::BasicTypeEnum,
    values::{AnyValue, FunctionValue, PointerValue},
    OptimizationLevel,
};

use crate::{
    ast::{ast::NodeType, statements::ASTRootNode},
    errors::errors::{Error, ErrorImpl, WithNode},
    symbols::symbol_table::SymbolTable,
};

use super::options::CompilerOptions;

/// The state of one compilation run.
///
/// This structure is the only mutable state shared by the lowering of every
/// node; it is handed down by mutable reference and never stored in a node.
///
/// # Type Parameters
///
/// * `'ctx` - Lifetime of the LLVM context
pub struct Compiler<'ctx> {
    /// Options this run was created with
    pub options: CompilerOptions,

    /// Reference to the LLVM context
    pub context: &'ctx Context,
    /// The LLVM module being built
    pub module: Module<'ctx>,
    /// The LLVM IR builder, holding the current insertion point
    pub builder: Builder<'ctx>,
    /// Names visible at the current insertion point
    pub symbol_table: SymbolTable<'ctx>,

    /// Top-level results in source order
    pub lowered: Vec<FunctionValue<'ctx>>,
    /// Distinct functions in print order, each flagged once its defining item is seen
    printed: Vec<(FunctionValue<'ctx>, bool)>,
}

impl<'ctx> Compiler<'ctx> {
    /// Creates a new Compiler instance with an empty module.
    ///
    /// # Arguments
    ///
    /// * `context` - Reference to the LLVM context
    /// * `options` - Module name and backend switches for this run
    pub fn new(context: &'ctx Context, options: CompilerOptions) -> Self {
        Compiler {
            module: context.create_module(&options.module_name),
            builder: context.create_builder(),
            symbol_table: SymbolTable::new(),
            lowered: vec![],
            printed: vec![],
            context,
            options,
        }
    }

    /// Sets the module triple and data layout to those of the host machine.
    pub fn configure_native_target(&self) -> Result<(), ErrorImpl> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|message| ErrorImpl::Backend { message })?;

        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple).map_err(|message| ErrorImpl::Backend {
            message: message.to_string(),
        })?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| ErrorImpl::Backend {
                message: format!("no target machine for {:?}", target_triple),
            })?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());

        Ok(())
    }

    /// Opens a scope that stays open until the returned guard is dropped.
    pub fn enter_scope(&mut self) -> ScopeGuard<'_, 'ctx> {
        self.symbol_table.push_scope();
        ScopeGuard { compiler: self }
    }

    /// The function containing the current insertion point.
    pub fn current_function(&self) -> Result<FunctionValue<'ctx>, ErrorImpl> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or(ErrorImpl::NoInsertionPoint)
    }

    /// Allocates a named stack slot in the entry block of the current function.
    ///
    /// Slots are hoisted there regardless of where the declaration sits, so
    /// that every slot dominates all of its uses.
    ///
    /// # Arguments
    ///
    /// * `type_` - Type of the value held by the slot
    /// * `name` - Name given to the slot
    pub fn create_entry_block_alloca(
        &self,
        type_: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>, ErrorImpl> {
        let function = self.current_function()?;
        let entry = function
            .get_first_basic_block()
            .ok_or(ErrorImpl::NoInsertionPoint)?;

        let entry_builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => entry_builder.position_before(&first),
            None => entry_builder.position_at_end(entry),
        }

        Ok(entry_builder.build_alloca(type_, name)?)
    }

    /// Creates a new basic block at the end of the given function.
    ///
    /// # Arguments
    ///
    /// * `name` - Label name for the basic block
    /// * `function` - The function to append the block to
    pub fn create_basic_block(&self, name: &str, function: FunctionValue<'ctx>) -> BasicBlock<'ctx> {
        self.context.append_basic_block(function, name)
    }

    /// Moves `block` behind the last block of its function.
    pub fn move_to_end(&self, block: BasicBlock<'ctx>, function: FunctionValue<'ctx>) -> Result<(), ErrorImpl> {
        match function.get_last_basic_block() {
            Some(last) if last != block => block.move_after(last).map_err(|_| ErrorImpl::Backend {
                message: String::from("failed to reorder basic blocks"),
            }),
            _ => Ok(()),
        }
    }

    /// Lowers every top-level item of `root`, recording the results in source order.
    pub fn lower_root(&mut self, root: &ASTRootNode) -> Result<Vec<FunctionValue<'ctx>>, Error> {
        let functions = root.lower(self)?;
        self.lowered.extend(functions.iter().copied());
        Ok(functions)
    }

    /// Records the function a top-level item just lowered to.
    ///
    /// A function is printed once. It takes the position of the item that gave
    /// it a body; a function that never got one keeps its first position.
    pub fn record_top_level(&mut self, function: FunctionValue<'ctx>) {
        let defined = function.count_basic_blocks() > 0;
        match self.printed.iter().position(|(seen, _)| *seen == function) {
            Some(index) if defined && !self.printed[index].1 => {
                self.printed.remove(index);
                self.printed.push((function, true));
            }
            Some(_) => {}
            None => self.printed.push((function, defined)),
        }
    }

    /// Prints each distinct lowered function once, in source order, one per line.
    pub fn emit_ir(&self) -> String {
        let functions: Vec<FunctionValue<'ctx>> =
            self.printed.iter().map(|(function, _)| *function).collect();
        print_values(&functions)
    }
}

/// Prints each value with the backend's printer, in order.
pub fn print_values(values: &[FunctionValue<'_>]) -> String {
    values
        .iter()
        .map(|value| value.print_to_string().to_string())
        .collect::<Vec<String>>()
        .join("\n")
}

/// An open scope of a [`Compiler`]'s symbol table.
///
/// Dereferences to the compiler and pops the scope when dropped, so the table
/// stays balanced on every exit path, including early error returns.
pub struct ScopeGuard<'a, 'ctx> {
    compiler: &'a mut Compiler<'ctx>,
}

impl<'ctx> Deref for ScopeGuard<'_, 'ctx> {
    type Target = Compiler<'ctx>;

    fn deref(&self) -> &Self::Target {
        &*self.compiler
    }
}

impl<'ctx> DerefMut for ScopeGuard<'_, 'ctx> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.compiler
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.compiler.symbol_table.pop_scope();
    }
}

/// Lowers a whole program.
///
/// This is the primary entry point for code generation. It:
/// 1. Creates a new Compiler instance
/// 2. Configures the host target when requested
/// 3. Lowers every top-level item of `root` in source order
///
/// # Arguments
///
/// * `root` - The program's root node
/// * `options` - Options for this run
/// * `context` - Reference to the LLVM context
///
/// # Returns
///
/// The Compiler holding the finished module, or the first failure.
pub fn compile<'ctx>(
    root: &ASTRootNode,
    options: CompilerOptions,
    context: &'ctx Context,
) -> Result<Compiler<'ctx>, Error> {
    let mut compiler = Compiler::new(context, options);

    if compiler.options.native_target {
        compiler.configure_native_target().in_node(NodeType::Root)?;
    }

    compiler.lower_root(root)?;
    tracing::debug!(
        "lowered {} top-level items into module {}",
        compiler.lowered.len(),
        compiler.options.module_name
    );

    Ok(compiler)
}

/// Lowers a whole program and prints the result.
///
/// A failed run produces no text.
pub fn compile_to_ir(root: &ASTRootNode, options: CompilerOptions) -> Result<String, Error> {
    let context = Context::create();
    let compiler = compile(root, options, &context)?;
    Ok(compiler.emit_ir())
}
