use std::collections::HashMap;

use inkwell::values::{BasicValueEnum, PointerValue};

use crate::{errors::errors::ErrorImpl, types::types::Type};

/// A named value as seen by the code generator.
///
/// `slot` is the stack storage backing the symbol. When present, `value`
/// has the shape of `type_`, the slot's declared type.
#[derive(Debug, Clone, Copy)]
pub struct SymbolicValue<'ctx> {
    value: Option<BasicValueEnum<'ctx>>,
    slot: Option<PointerValue<'ctx>>,
    type_: Type,
}

impl<'ctx> SymbolicValue<'ctx> {
    pub fn new(
        value: Option<BasicValueEnum<'ctx>>,
        slot: Option<PointerValue<'ctx>>,
        type_: Type,
    ) -> Self {
        SymbolicValue { value, slot, type_ }
    }

    pub fn llvm_value(&self) -> Option<BasicValueEnum<'ctx>> {
        self.value
    }

    pub fn llvm_slot(&self) -> Option<PointerValue<'ctx>> {
        self.slot
    }

    pub fn get_type(&self) -> Type {
        self.type_
    }
}

/// A stack of lexical scopes. Lookups search from the innermost scope outward.
#[derive(Debug, Default)]
pub struct SymbolTable<'ctx> {
    scopes: Vec<HashMap<String, SymbolicValue<'ctx>>>,
}

impl<'ctx> SymbolTable<'ctx> {
    pub fn new() -> Self {
        SymbolTable { scopes: vec![] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        tracing::trace!("pushed scope, depth {}", self.scopes.len());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        tracing::trace!("popped scope, depth {}", self.scopes.len());
    }

    /// Number of currently open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares `name` in the innermost scope.
    ///
    /// A name already declared in that same scope is overwritten; the replaced
    /// symbol is returned. Names in outer scopes are shadowed, not touched.
    pub fn declare(
        &mut self,
        name: &str,
        symbol: SymbolicValue<'ctx>,
    ) -> Result<Option<SymbolicValue<'ctx>>, ErrorImpl> {
        let scope = self.scopes.last_mut().ok_or(ErrorImpl::NoActiveScope)?;
        let previous = scope.insert(name.to_string(), symbol);

        if previous.is_some() {
            tracing::debug!("redeclared `{}` in the same scope", name);
        }

        Ok(previous)
    }

    pub fn resolve(&self, name: &str) -> Result<&SymbolicValue<'ctx>, ErrorImpl> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| ErrorImpl::SymbolNotDeclared {
                symbol: name.to_string(),
            })
    }
}
