use inkwell::{
    types::AnyType,
    values::{BasicValueEnum, IntValue},
};

use crate::{
    compiler::compiler::Compiler,
    errors::errors::{Error, ErrorImpl, WithNode},
    types::{
        cast::{cast, cast_to},
        types::{PrimitiveType, Type},
    },
};

use super::{
    ast::{Node, NodeType},
    expressions::lower_value,
};

/// `if (condition) then else otherwise`, producing the value of the branch that ran.
///
/// Both branches must produce a value. Without an `else`, the skipped path
/// contributes a zero of the `then` value's type.
#[derive(Debug)]
pub struct CondExprNode {
    pub condition: Box<dyn Node>,
    pub then: Box<dyn Node>,
    pub otherwise: Option<Box<dyn Node>>,
}

impl CondExprNode {
    pub fn new(condition: Box<dyn Node>, then: Box<dyn Node>, otherwise: Option<Box<dyn Node>>) -> Self {
        CondExprNode {
            condition,
            then,
            otherwise,
        }
    }
}

impl Node for CondExprNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::CondExpr
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        lower_conditional(
            compiler,
            self.condition.as_ref(),
            self.then.as_ref(),
            self.otherwise.as_deref(),
            true,
        )
    }
}

/// `if (condition) then else otherwise` lowered for its side effects only.
#[derive(Debug)]
pub struct CondStatementNode {
    pub condition: Box<dyn Node>,
    pub then: Box<dyn Node>,
    pub otherwise: Option<Box<dyn Node>>,
}

impl CondStatementNode {
    pub fn new(condition: Box<dyn Node>, then: Box<dyn Node>, otherwise: Option<Box<dyn Node>>) -> Self {
        CondStatementNode {
            condition,
            then,
            otherwise,
        }
    }
}

impl Node for CondStatementNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::CondStatement
    }
    fn lower<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        lower_conditional(
            compiler,
            self.condition.as_ref(),
            self.then.as_ref(),
            self.otherwise.as_deref(),
            false,
        )
    }
}

/// Lowers a conditional into `then`, `else` and `ifcont` blocks.
///
/// The builder is left at the end of `ifcont`. When `wants_value` is set,
/// the branch values are merged there by a phi node.
fn lower_conditional<'ctx>(
    compiler: &mut Compiler<'ctx>,
    condition: &dyn Node,
    then: &dyn Node,
    otherwise: Option<&dyn Node>,
    wants_value: bool,
) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
    let node = if wants_value {
        NodeType::CondExpr
    } else {
        NodeType::CondStatement
    };

    let function = compiler.current_function().in_node(node)?;

    let condition = lower_value(condition, compiler)?;
    let condition = to_condition(compiler, condition).in_node(node)?;

    let then_block = compiler.create_basic_block("then", function);
    let else_block = otherwise.map(|_| compiler.create_basic_block("else", function));
    let merge_block = compiler.create_basic_block("ifcont", function);

    let condition_block = compiler
        .builder
        .get_insert_block()
        .ok_or(ErrorImpl::NoInsertionPoint)
        .in_node(node)?;
    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block.unwrap_or(merge_block))
        .in_node(node)?;

    compiler.builder.position_at_end(then_block);
    let then_value = then.lower(compiler)?;
    if wants_value && then_value.is_none() {
        return Err(Error::new(
            ErrorImpl::MissingBranchValue {
                branch: String::from("then"),
            },
            node,
        ));
    }
    compiler
        .builder
        .build_unconditional_branch(merge_block)
        .in_node(node)?;
    // lowering the branch may have moved the cursor into a nested merge block
    let then_end = compiler
        .builder
        .get_insert_block()
        .ok_or(ErrorImpl::NoInsertionPoint)
        .in_node(node)?;

    let mut else_incoming = None;
    if let (Some(otherwise), Some(else_block)) = (otherwise, else_block) {
        compiler.move_to_end(else_block, function).in_node(node)?;
        compiler.builder.position_at_end(else_block);

        let mut else_value = otherwise.lower(compiler)?;
        if let (true, Some(then_value)) = (wants_value, then_value) {
            let value = else_value.ok_or_else(|| {
                Error::new(
                    ErrorImpl::MissingBranchValue {
                        branch: String::from("else"),
                    },
                    node,
                )
            })?;
            // the phi takes the type of the `then` value
            let then_type =
                Type::from_backend_type(then_value.get_type().as_any_type_enum()).in_node(node)?;
            else_value = Some(cast_to(compiler, value, then_type).in_node(node)?);
        }

        compiler
            .builder
            .build_unconditional_branch(merge_block)
            .in_node(node)?;
        let else_end = compiler
            .builder
            .get_insert_block()
            .ok_or(ErrorImpl::NoInsertionPoint)
            .in_node(node)?;
        else_incoming = else_value.map(|value| (value, else_end));
    }

    compiler.move_to_end(merge_block, function).in_node(node)?;
    compiler.builder.position_at_end(merge_block);

    let then_value = match (wants_value, then_value) {
        (true, Some(then_value)) => then_value,
        _ => return Ok(None),
    };

    let phi = compiler
        .builder
        .build_phi(then_value.get_type(), "iftmp")
        .in_node(node)?;
    match else_incoming {
        Some((else_value, else_end)) => {
            phi.add_incoming(&[(&then_value, then_end), (&else_value, else_end)]);
        }
        None => {
            let zero = then_value.get_type().const_zero();
            phi.add_incoming(&[(&then_value, then_end), (&zero, condition_block)]);
        }
    }

    Ok(Some(phi.as_basic_value()))
}

/// Turns any scalar into an `i1`, comparing non-bool values against zero.
fn to_condition<'ctx>(
    compiler: &Compiler<'ctx>,
    value: BasicValueEnum<'ctx>,
) -> Result<IntValue<'ctx>, ErrorImpl> {
    let from = Type::from_backend_type(value.get_type().as_any_type_enum())?;
    let condition = cast(compiler, value, from, Type::scalar(PrimitiveType::Bool))?;
    Ok(condition.into_int_value())
}
