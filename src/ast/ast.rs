use std::fmt::{Debug, Display};

use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};

use crate::{
    compiler::compiler::Compiler,
    errors::errors::{Error, ErrorImpl, WithNode},
    types::{cast::cast_to, types::Type},
};

/// Node Types
///
/// Identifies each concrete node kind; used to locate a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    I32,
    F32,
    Char,
    Variable,
    BinaryExpr,
    CastOp,
    FunctionCall,
    AddressOf,
    Dereference,
    ArrayElement,
    CondExpr,
    CondStatement,
    Block,
    VariableDeclaration,
    VariableAssignment,
    MultiAssignment,
    AssignableList,
    NodeList,
    FunctionDecl,
    FunctionDef,
    Root,
}

impl Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeType::I32 => "i32 literal",
            NodeType::F32 => "f32 literal",
            NodeType::Char => "char literal",
            NodeType::Variable => "variable reference",
            NodeType::BinaryExpr => "binary expression",
            NodeType::CastOp => "cast",
            NodeType::FunctionCall => "function call",
            NodeType::AddressOf => "address-of",
            NodeType::Dereference => "dereference",
            NodeType::ArrayElement => "array element",
            NodeType::CondExpr => "conditional expression",
            NodeType::CondStatement => "conditional statement",
            NodeType::Block => "block",
            NodeType::VariableDeclaration => "variable declaration",
            NodeType::VariableAssignment => "assignment",
            NodeType::MultiAssignment => "multi-assignment",
            NodeType::AssignableList => "assignment target list",
            NodeType::NodeList => "list",
            NodeType::FunctionDecl => "function declaration",
            NodeType::FunctionDef => "function definition",
            NodeType::Root => "program",
        };
        write!(f, "{}", name)
    }
}

/// Value-producing node.
///
/// Lowering emits the node's instructions at the compiler's insertion point
/// and yields its runtime value, if it has one.
pub trait Node: Debug {
    fn get_node_type(&self) -> NodeType;
    fn lower<'ctx>(&self, compiler: &mut Compiler<'ctx>)
        -> Result<Option<BasicValueEnum<'ctx>>, Error>;
}

/// Node with addressable storage; the target of `=`.
pub trait AssignableNode: Node {
    /// Computes the storage this node refers to, together with its declared type.
    fn address<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<Place<'ctx>, Error>;

    /// Stores `value` into this node's storage, casting to the declared type first.
    ///
    /// Returns the value as stored.
    fn assign<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
        value: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        let place = self.address(compiler)?;
        place.store(compiler, value).in_node(self.get_node_type())
    }
}

/// Target that takes an ordered sequence of values at once.
pub trait MultiAssignableNode: Debug {
    fn multi_assign<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
        values: Vec<BasicValueEnum<'ctx>>,
    ) -> Result<(), Error>;
}

/// Ordered sequence of nodes, lowered left to right into an ordered sequence of values.
pub trait AggregateNode: Debug {
    fn lower_values<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Vec<BasicValueEnum<'ctx>>, Error>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Top-level declaration or definition.
pub trait Item: Debug {
    fn lower_item<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<FunctionValue<'ctx>, Error>;
}

/// Storage location with the type it was declared with.
#[derive(Debug, Clone, Copy)]
pub struct Place<'ctx> {
    pub pointer: PointerValue<'ctx>,
    pub type_: Type,
}

impl<'ctx> Place<'ctx> {
    pub fn new(pointer: PointerValue<'ctx>, type_: Type) -> Self {
        Place { pointer, type_ }
    }

    pub fn load(&self, compiler: &Compiler<'ctx>, name: &str) -> Result<BasicValueEnum<'ctx>, ErrorImpl> {
        Ok(compiler.builder.build_load(self.pointer, name)?)
    }

    pub fn store(
        &self,
        compiler: &Compiler<'ctx>,
        value: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, ErrorImpl> {
        let value = cast_to(compiler, value, self.type_)?;
        compiler.builder.build_store(self.pointer, value)?;
        Ok(value)
    }

    /// The place of element `index` of the array stored here.
    ///
    /// Constant indices are bounds-checked; dynamic ones are not.
    pub fn element(&self, compiler: &Compiler<'ctx>, index: IntValue<'ctx>) -> Result<Place<'ctx>, ErrorImpl> {
        let element_type = self.type_.element()?;
        let size = self.type_.array_size().unwrap_or(0);

        if let Some(constant) = index.get_sign_extended_constant() {
            if constant < 0 || constant >= i64::from(size) {
                return Err(ErrorImpl::IndexOutOfBounds {
                    index: constant,
                    size,
                });
            }
        }

        let zero = compiler.context.i32_type().const_zero();
        let pointer = unsafe {
            compiler
                .builder
                .build_in_bounds_gep(self.pointer, &[zero, index], "elementptr")?
        };

        Ok(Place::new(pointer, element_type))
    }

    /// Distributes `values` into this place.
    ///
    /// Arrays take values positionally; when fewer values than elements are
    /// given, the last value fills every remaining element. Any other place
    /// takes exactly one value.
    pub fn distribute(
        &self,
        compiler: &Compiler<'ctx>,
        values: &[BasicValueEnum<'ctx>],
    ) -> Result<(), ErrorImpl> {
        let size = match self.type_.array_size() {
            Some(size) if !self.type_.is_pointer() => size,
            _ => {
                if values.len() != 1 {
                    return Err(ErrorImpl::ArityMismatch {
                        expected: 1,
                        received: values.len(),
                    });
                }
                self.store(compiler, values[0])?;
                return Ok(());
            }
        };

        let last = match values.last() {
            Some(last) if values.len() <= size as usize => *last,
            _ => {
                return Err(ErrorImpl::ArityMismatch {
                    expected: size as usize,
                    received: values.len(),
                })
            }
        };

        let i32_type = compiler.context.i32_type();
        for position in 0..size {
            let value = values.get(position as usize).copied().unwrap_or(last);
            let element = self.element(compiler, i32_type.const_int(u64::from(position), false))?;
            element.store(compiler, value)?;
        }

        Ok(())
    }
}
