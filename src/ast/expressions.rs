use inkwell::{
    types::AnyType,
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum},
};

use crate::{
    compiler::compiler::Compiler,
    errors::errors::{Error, ErrorImpl, WithNode},
    operators::operators::{create_binary_operation, Operator},
    types::{
        cast::{cast, cast_to},
        types::{PrimitiveType, Type},
    },
};

use super::{
    ast::{AggregateNode, AssignableNode, MultiAssignableNode, Node, NodeType, Place},
    lists::NodeList,
};

// LITERALS

/// 32-bit signed integer literal.
#[derive(Debug, Clone)]
pub struct I32Node {
    pub value: i32,
}

impl I32Node {
    pub fn new(value: i32) -> Self {
        I32Node { value }
    }
}

impl Node for I32Node {
    fn get_node_type(&self) -> NodeType {
        NodeType::I32
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        Ok(Some(
            compiler
                .context
                .i32_type()
                .const_int(self.value as u64, true)
                .into(),
        ))
    }
}

/// 32-bit float literal.
#[derive(Debug, Clone)]
pub struct F32Node {
    pub value: f32,
}

impl F32Node {
    pub fn new(value: f32) -> Self {
        F32Node { value }
    }
}

impl Node for F32Node {
    fn get_node_type(&self) -> NodeType {
        NodeType::F32
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        Ok(Some(
            compiler
                .context
                .f32_type()
                .const_float(f64::from(self.value))
                .into(),
        ))
    }
}

/// Character literal, an 8-bit integer.
#[derive(Debug, Clone)]
pub struct CharNode {
    pub value: u8,
}

impl CharNode {
    pub fn new(value: u8) -> Self {
        CharNode { value }
    }
}

impl Node for CharNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Char
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        Ok(Some(
            compiler
                .context
                .i8_type()
                .const_int(u64::from(self.value), false)
                .into(),
        ))
    }
}

// VARIABLES

/// Reference to a named variable.
///
/// Reads load from the variable's slot with its declared type. Symbols
/// without a slot are read directly.
#[derive(Debug, Clone)]
pub struct VariableNode {
    pub name: String,
}

impl VariableNode {
    pub fn new(name: &str) -> Self {
        VariableNode {
            name: name.to_string(),
        }
    }
}

impl Node for VariableNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Variable
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let symbol = *compiler
            .symbol_table
            .resolve(&self.name)
            .in_node(NodeType::Variable)?;

        match symbol.llvm_slot() {
            Some(slot) => Place::new(slot, symbol.get_type())
                .load(compiler, &self.name)
                .map(Some)
                .in_node(NodeType::Variable),
            None => symbol
                .llvm_value()
                .map(Some)
                .ok_or(ErrorImpl::MissingValue)
                .in_node(NodeType::Variable),
        }
    }
}

impl AssignableNode for VariableNode {
    fn address<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<Place<'ctx>, Error> {
        let symbol = compiler
            .symbol_table
            .resolve(&self.name)
            .in_node(NodeType::Variable)?;

        let slot = symbol.llvm_slot().ok_or_else(|| {
            Error::new(
                ErrorImpl::SymbolNotDeclared {
                    symbol: self.name.clone(),
                },
                NodeType::Variable,
            )
        })?;

        Ok(Place::new(slot, symbol.get_type()))
    }
}

impl MultiAssignableNode for VariableNode {
    fn multi_assign<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
        values: Vec<BasicValueEnum<'ctx>>,
    ) -> Result<(), Error> {
        let place = self.address(compiler)?;
        place
            .distribute(compiler, &values)
            .in_node(NodeType::Variable)
    }
}

/// Element of an array, `array[index]`.
///
/// Constant indices are checked against the array's size; dynamic indices
/// are not.
#[derive(Debug)]
pub struct ArrayElementNode {
    pub array: Box<dyn AssignableNode>,
    pub index: Box<dyn Node>,
}

impl ArrayElementNode {
    pub fn new(array: Box<dyn AssignableNode>, index: Box<dyn Node>) -> Self {
        ArrayElementNode { array, index }
    }
}

impl Node for ArrayElementNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::ArrayElement
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let place = self.address(compiler)?;
        place
            .load(compiler, "element")
            .map(Some)
            .in_node(NodeType::ArrayElement)
    }
}

impl AssignableNode for ArrayElementNode {
    fn address<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<Place<'ctx>, Error> {
        let array = self.array.address(compiler)?;
        let index = lower_value(self.index.as_ref(), compiler)?;

        let index_type =
            Type::from_backend_type(index.get_type().as_any_type_enum()).in_node(NodeType::ArrayElement)?;
        if !index_type.is_integer() {
            return Err(Error::new(
                ErrorImpl::InvalidIndexType {
                    type_: index_type.to_string(),
                },
                NodeType::ArrayElement,
            ));
        }

        let index = cast(compiler, index, index_type, Type::scalar(PrimitiveType::I32))
            .in_node(NodeType::ArrayElement)?;

        array
            .element(compiler, index.into_int_value())
            .in_node(NodeType::ArrayElement)
    }
}

// OPERATIONS

/// Binary operation; both operands are always lowered, left first.
#[derive(Debug)]
pub struct BinaryExprNode {
    pub op: Operator,
    pub lhs: Box<dyn Node>,
    pub rhs: Box<dyn Node>,
}

impl BinaryExprNode {
    pub fn new(op: Operator, lhs: Box<dyn Node>, rhs: Box<dyn Node>) -> Self {
        BinaryExprNode { op, lhs, rhs }
    }
}

impl Node for BinaryExprNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::BinaryExpr
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let lhs = lower_value(self.lhs.as_ref(), compiler)?;
        let rhs = lower_value(self.rhs.as_ref(), compiler)?;

        create_binary_operation(&compiler.builder, self.op, lhs, rhs)
            .map(Some)
            .in_node(NodeType::BinaryExpr)
    }
}

/// Explicit conversion of a value to `type_`.
#[derive(Debug)]
pub struct CastOpNode {
    pub type_: Type,
    pub value: Box<dyn Node>,
}

impl CastOpNode {
    pub fn new(type_: Type, value: Box<dyn Node>) -> Self {
        CastOpNode { type_, value }
    }
}

impl Node for CastOpNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::CastOp
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let value = lower_value(self.value.as_ref(), compiler)?;

        cast_to(compiler, value, self.type_)
            .map(Some)
            .in_node(NodeType::CastOp)
    }
}

/// Call of a function declared in the module.
///
/// Arguments are lowered left to right and cast to the parameter types.
#[derive(Debug)]
pub struct FunctionCallNode {
    pub identifier: String,
    pub arguments: NodeList,
}

impl FunctionCallNode {
    pub fn new(identifier: &str, arguments: NodeList) -> Self {
        FunctionCallNode {
            identifier: identifier.to_string(),
            arguments,
        }
    }
}

impl Node for FunctionCallNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::FunctionCall
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let function = compiler
            .module
            .get_function(&self.identifier)
            .ok_or_else(|| ErrorImpl::FunctionNotDeclared {
                function: self.identifier.clone(),
            })
            .in_node(NodeType::FunctionCall)?;

        let parameters = function.get_params();
        if parameters.len() != self.arguments.len() {
            return Err(Error::new(
                ErrorImpl::ArityMismatch {
                    expected: parameters.len(),
                    received: self.arguments.len(),
                },
                NodeType::FunctionCall,
            ));
        }

        let values = self.arguments.lower_values(compiler)?;

        let mut arguments: Vec<BasicMetadataValueEnum<'ctx>> = vec![];
        for (value, parameter) in values.into_iter().zip(parameters) {
            let parameter_type = Type::from_backend_type(parameter.get_type().as_any_type_enum())
                .in_node(NodeType::FunctionCall)?;
            let argument = cast_to(compiler, value, parameter_type).in_node(NodeType::FunctionCall)?;
            arguments.push(argument.into());
        }

        // void calls cannot be named
        let name = match function.get_type().get_return_type() {
            Some(_) => "calltmp",
            None => "",
        };
        let call = compiler
            .builder
            .build_call(function, &arguments, name)
            .in_node(NodeType::FunctionCall)?;

        Ok(call.try_as_basic_value().left())
    }
}

// INDIRECTION

/// Address of an assignable node's storage, `&target`.
#[derive(Debug)]
pub struct AddressOfNode {
    pub target: Box<dyn AssignableNode>,
}

impl AddressOfNode {
    pub fn new(target: Box<dyn AssignableNode>) -> Self {
        AddressOfNode { target }
    }
}

impl Node for AddressOfNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::AddressOf
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let place = self.target.address(compiler)?;
        Ok(Some(place.pointer.as_basic_value_enum()))
    }
}

/// Value behind a pointer, `*pointer`.
///
/// The storage is the pointer value itself; the declared type is recovered
/// from the pointer's LLVM shape.
#[derive(Debug)]
pub struct DereferenceNode {
    pub pointer: Box<dyn Node>,
}

impl DereferenceNode {
    pub fn new(pointer: Box<dyn Node>) -> Self {
        DereferenceNode { pointer }
    }
}

impl Node for DereferenceNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Dereference
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let place = self.address(compiler)?;
        place
            .load(compiler, "deref")
            .map(Some)
            .in_node(NodeType::Dereference)
    }
}

impl AssignableNode for DereferenceNode {
    fn address<'ctx>(&self, compiler: &mut Compiler<'ctx>) -> Result<Place<'ctx>, Error> {
        let pointer = lower_value(self.pointer.as_ref(), compiler)?;

        let pointer_type =
            Type::from_backend_type(pointer.get_type().as_any_type_enum()).in_node(NodeType::Dereference)?;
        let pointee = pointer_type.pointee().in_node(NodeType::Dereference)?;

        Ok(Place::new(pointer.into_pointer_value(), pointee))
    }
}

/// Lowers a node that must produce a value.
pub(crate) fn lower_value<'ctx, N: Node + ?Sized>(
    node: &N,
    compiler: &mut Compiler<'ctx>,
) -> Result<BasicValueEnum<'ctx>, Error> {
    node.lower(compiler)?
        .ok_or_else(|| Error::new(ErrorImpl::MissingValue, node.get_node_type()))
}
