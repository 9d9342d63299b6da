use std::fmt::Display;

use inkwell::{
    builder::Builder,
    types::BasicTypeEnum,
    values::BasicValueEnum,
    FloatPredicate, IntPredicate,
};

use crate::{errors::errors::ErrorImpl, MK_OPERATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    LessThan,
    GreaterThan,
    LessEq,
    GreaterEq,
    And,
    Or,
}

impl Operator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::NotEq
                | Operator::LessThan
                | Operator::GreaterThan
                | Operator::LessEq
                | Operator::GreaterEq
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessEq => "<=",
            Operator::GreaterEq => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

/// Emits `lhs <op> rhs`.
///
/// Both operands must have exactly the same LLVM type; nothing is emitted
/// otherwise. Integer division and remainder are signed, float comparisons
/// are unordered, and comparisons always yield an `i1`. `And` and `Or` are
/// bitwise on integer operands and never short-circuit.
pub fn create_binary_operation<'ctx>(
    builder: &Builder<'ctx>,
    op: Operator,
    lhs: BasicValueEnum<'ctx>,
    rhs: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, ErrorImpl> {
    if lhs.get_type() != rhs.get_type() {
        return Err(ErrorImpl::OperandTypeMismatch {
            operator: op.to_string(),
            lhs: describe(lhs.get_type()),
            rhs: describe(rhs.get_type()),
        });
    }

    let supported = match lhs.get_type() {
        BasicTypeEnum::IntType(_) => true,
        BasicTypeEnum::FloatType(_) => !op.is_boolean(),
        _ => false,
    };
    if !supported {
        return Err(ErrorImpl::UnsupportedOperand {
            operator: op.to_string(),
            type_: describe(lhs.get_type()),
        });
    }

    let value = match op {
        Operator::Add => MK_OPERATION!(builder, lhs, rhs, build_float_add, build_int_add, "addtmp"),
        Operator::Sub => MK_OPERATION!(builder, lhs, rhs, build_float_sub, build_int_sub, "subtmp"),
        Operator::Mul => MK_OPERATION!(builder, lhs, rhs, build_float_mul, build_int_mul, "multmp"),
        Operator::Div => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            build_float_div,
            build_int_signed_div,
            "divtmp"
        ),
        Operator::Mod => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            build_float_rem,
            build_int_signed_rem,
            "modtmp"
        ),
        Operator::Eq => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            FloatPredicate::UEQ,
            IntPredicate::EQ,
            "cmptmp",
            compare
        ),
        Operator::NotEq => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            FloatPredicate::UNE,
            IntPredicate::NE,
            "cmptmp",
            compare
        ),
        Operator::LessThan => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            FloatPredicate::ULT,
            IntPredicate::SLT,
            "cmptmp",
            compare
        ),
        Operator::GreaterThan => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            FloatPredicate::UGT,
            IntPredicate::SGT,
            "cmptmp",
            compare
        ),
        Operator::LessEq => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            FloatPredicate::ULE,
            IntPredicate::SLE,
            "cmptmp",
            compare
        ),
        Operator::GreaterEq => MK_OPERATION!(
            builder,
            lhs,
            rhs,
            FloatPredicate::UGE,
            IntPredicate::SGE,
            "cmptmp",
            compare
        ),
        Operator::And => builder
            .build_and(lhs.into_int_value(), rhs.into_int_value(), "andtmp")
            .map(BasicValueEnum::from),
        Operator::Or => builder
            .build_or(lhs.into_int_value(), rhs.into_int_value(), "ortmp")
            .map(BasicValueEnum::from),
    }?;

    Ok(value)
}

fn describe(type_: BasicTypeEnum<'_>) -> String {
    type_.print_to_string().to_string()
}
