use std::slice::Iter;

use inkwell::{
    types::{AnyType, BasicMetadataTypeEnum, BasicType},
    values::{BasicValueEnum, FunctionValue},
};

use crate::{
    compiler::compiler::Compiler,
    errors::errors::{Error, ErrorImpl, WithNode},
    symbols::symbol_table::SymbolicValue,
    types::{cast::cast_to, types::Type},
};

use super::{
    ast::{AggregateNode, AssignableNode, Item, MultiAssignableNode, Node, NodeType, Place},
    expressions::lower_value,
    lists::NodeList,
};

/// Sequence of nodes lowered inside its own scope.
///
/// Yields the value of its last node, unless the block is void.
#[derive(Debug)]
pub struct BlockNode {
    pub body: NodeList,
    pub is_void: bool,
}

impl BlockNode {
    pub fn new(body: NodeList, is_void: bool) -> Self {
        BlockNode { body, is_void }
    }
}

impl Node for BlockNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Block
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let mut scope = compiler.enter_scope();
        let values = self.body.lower_each(&mut *scope)?;

        if self.is_void {
            return Ok(None);
        }
        Ok(values.last().copied().flatten())
    }
}

/// Initial value of a declared variable.
#[derive(Debug)]
pub enum Initializer {
    /// Stored as is, cast to the declared type.
    Value(Box<dyn Node>),
    /// Distributed into the variable like a multi-assignment.
    List(NodeList),
}

/// `name: type_ = value`.
#[derive(Debug)]
pub struct VariableDeclarationNode {
    pub type_: Type,
    pub name: String,
    pub value: Option<Initializer>,
}

impl VariableDeclarationNode {
    pub fn new(type_: Type, name: &str, value: Option<Initializer>) -> Self {
        VariableDeclarationNode {
            type_,
            name: name.to_string(),
            value,
        }
    }
}

enum InitialValues<'ctx> {
    Value(BasicValueEnum<'ctx>),
    List(Vec<BasicValueEnum<'ctx>>),
}

impl Node for VariableDeclarationNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::VariableDeclaration
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let slot_type = self
            .type_
            .basic_type(compiler.context)
            .in_node(NodeType::VariableDeclaration)?;

        // the initializer may refer to an outer variable of the same name
        let initial = match &self.value {
            Some(Initializer::Value(node)) => Some(InitialValues::Value(lower_value(node.as_ref(), compiler)?)),
            Some(Initializer::List(list)) => Some(InitialValues::List(list.lower_values(compiler)?)),
            None => None,
        };

        let slot = compiler
            .create_entry_block_alloca(slot_type, &self.name)
            .in_node(NodeType::VariableDeclaration)?;
        let place = Place::new(slot, self.type_);

        let value = match initial {
            Some(InitialValues::Value(value)) => {
                Some(place.store(compiler, value).in_node(NodeType::VariableDeclaration)?)
            }
            Some(InitialValues::List(values)) => {
                place
                    .distribute(compiler, &values)
                    .in_node(NodeType::VariableDeclaration)?;
                None
            }
            None => None,
        };

        compiler
            .symbol_table
            .declare(&self.name, SymbolicValue::new(value, Some(slot), self.type_))
            .in_node(NodeType::VariableDeclaration)?;
        tracing::trace!("declared {}: {}", self.name, self.type_);

        Ok(value)
    }
}

/// `target = value`. Yields the value as stored.
#[derive(Debug)]
pub struct VariableAssignmentNode {
    pub target: Box<dyn AssignableNode>,
    pub value: Box<dyn Node>,
}

impl VariableAssignmentNode {
    pub fn new(target: Box<dyn AssignableNode>, value: Box<dyn Node>) -> Self {
        VariableAssignmentNode { target, value }
    }
}

impl Node for VariableAssignmentNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::VariableAssignment
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let value = lower_value(self.value.as_ref(), compiler)?;
        self.target.assign(compiler, value).map(Some)
    }
}

/// `target = [values...]`.
#[derive(Debug)]
pub struct MultiAssignmentNode {
    pub target: Box<dyn MultiAssignableNode>,
    pub values: Box<dyn AggregateNode>,
}

impl MultiAssignmentNode {
    pub fn new(target: Box<dyn MultiAssignableNode>, values: Box<dyn AggregateNode>) -> Self {
        MultiAssignmentNode { target, values }
    }
}

impl Node for MultiAssignmentNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::MultiAssignment
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let values = self.values.lower_values(compiler)?;
        self.target.multi_assign(compiler, values)?;
        Ok(None)
    }
}

// FUNCTIONS

#[derive(Debug, Clone)]
pub struct ParameterNode {
    pub name: String,
    pub type_: Type,
}

impl ParameterNode {
    pub fn new(name: &str, type_: Type) -> Self {
        ParameterNode {
            name: name.to_string(),
            type_,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterListNode {
    parameters: Vec<ParameterNode>,
}

impl ParameterListNode {
    pub fn new() -> Self {
        ParameterListNode { parameters: vec![] }
    }

    pub fn push(&mut self, parameter: ParameterNode) {
        self.parameters.push(parameter);
    }

    pub fn iter(&self) -> Iter<'_, ParameterNode> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl From<Vec<ParameterNode>> for ParameterListNode {
    fn from(parameters: Vec<ParameterNode>) -> Self {
        ParameterListNode { parameters }
    }
}

/// Function signature, registered in the module by name.
///
/// A name already present in the module is reused as is.
#[derive(Debug)]
pub struct FunctionDeclNode {
    pub identifier: String,
    pub parameters: ParameterListNode,
    pub return_type: Type,
}

impl FunctionDeclNode {
    pub fn new(identifier: &str, parameters: ParameterListNode, return_type: Type) -> Self {
        FunctionDeclNode {
            identifier: identifier.to_string(),
            parameters,
            return_type,
        }
    }
}

impl Item for FunctionDeclNode {
    fn lower_item<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<FunctionValue<'ctx>, Error> {
        let mut parameter_types: Vec<BasicMetadataTypeEnum<'ctx>> = vec![];
        for parameter in self.parameters.iter() {
            let type_ = parameter
                .type_
                .basic_type(compiler.context)
                .in_node(NodeType::FunctionDecl)?;
            parameter_types.push(type_.into());
        }

        let function_type = if self.return_type.is_void() {
            compiler.context.void_type().fn_type(&parameter_types, false)
        } else {
            self.return_type
                .basic_type(compiler.context)
                .in_node(NodeType::FunctionDecl)?
                .fn_type(&parameter_types, false)
        };

        if let Some(function) = compiler.module.get_function(&self.identifier) {
            if function.get_type() != function_type {
                tracing::warn!(
                    "signature of {} does not match its earlier declaration",
                    self.identifier
                );
                return Err(Error::new(
                    ErrorImpl::SignatureMismatch {
                        function: self.identifier.clone(),
                        expected: function.get_type().print_to_string().to_string(),
                        received: function_type.print_to_string().to_string(),
                    },
                    NodeType::FunctionDecl,
                ));
            }
            tracing::trace!("reusing declaration of {}", self.identifier);
            return Ok(function);
        }

        let function = compiler
            .module
            .add_function(&self.identifier, function_type, None);
        for (argument, parameter) in function.get_param_iter().zip(self.parameters.iter()) {
            argument.set_name(&parameter.name);
        }

        tracing::debug!("declared function {}", self.identifier);
        Ok(function)
    }
}

/// Function signature with a body.
///
/// Parameters are copied into stack slots on entry. The body's final value
/// is returned, cast to the declared return type.
#[derive(Debug)]
pub struct FunctionDefNode {
    pub declaration: FunctionDeclNode,
    pub body: Box<dyn Node>,
}

impl FunctionDefNode {
    pub fn new(declaration: FunctionDeclNode, body: Box<dyn Node>) -> Self {
        FunctionDefNode { declaration, body }
    }

    fn lower_body<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
        function: FunctionValue<'ctx>,
    ) -> Result<(), Error> {
        let entry = compiler.create_basic_block("entry", function);
        compiler.builder.position_at_end(entry);

        let mut scope = compiler.enter_scope();

        for (argument, parameter) in function.get_param_iter().zip(self.declaration.parameters.iter()) {
            let type_ = Type::from_backend_type(argument.get_type().as_any_type_enum())
                .in_node(NodeType::FunctionDef)?;
            let slot = scope
                .create_entry_block_alloca(argument.get_type(), &parameter.name)
                .in_node(NodeType::FunctionDef)?;
            scope
                .builder
                .build_store(slot, argument)
                .in_node(NodeType::FunctionDef)?;
            scope
                .symbol_table
                .declare(&parameter.name, SymbolicValue::new(Some(argument), Some(slot), type_))
                .in_node(NodeType::FunctionDef)?;
        }

        let body = self.body.lower(&mut *scope)?;

        match function.get_type().get_return_type() {
            None => {
                scope.builder.build_return(None).in_node(NodeType::FunctionDef)?;
            }
            Some(return_type) => {
                let value = body
                    .ok_or_else(|| ErrorImpl::MissingReturnValue {
                        function: self.declaration.identifier.clone(),
                    })
                    .in_node(NodeType::FunctionDef)?;
                let return_type = Type::from_backend_type(return_type.as_any_type_enum())
                    .in_node(NodeType::FunctionDef)?;
                let value = cast_to(&*scope, value, return_type).in_node(NodeType::FunctionDef)?;
                scope
                    .builder
                    .build_return(Some(&value))
                    .in_node(NodeType::FunctionDef)?;
            }
        }

        Ok(())
    }
}

impl Item for FunctionDefNode {
    fn lower_item<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<FunctionValue<'ctx>, Error> {
        let function = self.declaration.lower_item(compiler)?;
        if function.count_basic_blocks() > 0 {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDefined {
                    function: self.declaration.identifier.clone(),
                },
                NodeType::FunctionDef,
            ));
        }

        let saved_block = compiler.builder.get_insert_block();
        let lowered = self.lower_body(compiler, function);
        if let Some(block) = saved_block {
            compiler.builder.position_at_end(block);
        }
        lowered?;

        if compiler.options.verify_functions && !function.verify(false) {
            tracing::warn!("function {} failed verification", self.declaration.identifier);
            return Err(Error::new(
                ErrorImpl::VerificationFailed {
                    function: self.declaration.identifier.clone(),
                },
                NodeType::FunctionDef,
            ));
        }

        tracing::debug!("defined function {}", self.declaration.identifier);
        Ok(function)
    }
}

/// The program: top-level items lowered in source order.
#[derive(Debug, Default)]
pub struct ASTRootNode {
    items: Vec<Box<dyn Item>>,
}

impl ASTRootNode {
    pub fn new() -> Self {
        ASTRootNode { items: vec![] }
    }

    pub fn push(&mut self, item: Box<dyn Item>) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lowers every item, stopping at the first failure.
    pub fn lower<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<Vec<FunctionValue<'ctx>>, Error> {
        let mut functions = Vec::with_capacity(self.items.len());
        for item in self.items.iter() {
            let function = item.lower_item(compiler)?;
            compiler.record_top_level(function);
            functions.push(function);
        }
        Ok(functions)
    }
}

impl From<Vec<Box<dyn Item>>> for ASTRootNode {
    fn from(items: Vec<Box<dyn Item>>) -> Self {
        ASTRootNode { items }
    }
}
