use inkwell::{
    types::AnyType,
    values::{BasicValue, BasicValueEnum},
    FloatPredicate, IntPredicate,
};

use crate::{compiler::compiler::Compiler, errors::errors::ErrorImpl};

use super::types::{PrimitiveType, Type};

/// Converts `value` from `from` to `to`.
///
/// Supported conversions are between integer-like scalars (signed), between
/// floats, and between the two (signed, truncating toward zero). Identical
/// types pass the value through untouched. Anything else, including pointers
/// and arrays, is an error and emits nothing.
pub fn cast<'ctx>(
    compiler: &Compiler<'ctx>,
    value: BasicValueEnum<'ctx>,
    from: Type,
    to: Type,
) -> Result<BasicValueEnum<'ctx>, ErrorImpl> {
    if from == to {
        return Ok(value);
    }

    let unsupported = || ErrorImpl::UnsupportedCast {
        from: from.to_string(),
        to: to.to_string(),
    };

    if !(from.is_integer() || from.is_float()) || !(to.is_integer() || to.is_float()) {
        return Err(unsupported());
    }

    let builder = &compiler.builder;
    let dst_type = to.basic_type(compiler.context)?;

    let converted = match (from.is_float(), to.kind()) {
        (false, PrimitiveType::Bool) => {
            let int = value.into_int_value();
            builder
                .build_int_compare(IntPredicate::NE, int, int.get_type().const_zero(), "casttmp")?
                .as_basic_value_enum()
        }
        (true, PrimitiveType::Bool) => {
            let float = value.into_float_value();
            builder
                .build_float_compare(
                    FloatPredicate::ONE,
                    float,
                    float.get_type().const_zero(),
                    "casttmp",
                )?
                .as_basic_value_enum()
        }
        (false, PrimitiveType::F32) => {
            let int = value.into_int_value();
            let float_type = dst_type.into_float_type();
            let float = if from.kind() == PrimitiveType::Bool {
                builder.build_unsigned_int_to_float(int, float_type, "casttmp")?
            } else {
                builder.build_signed_int_to_float(int, float_type, "casttmp")?
            };
            float.as_basic_value_enum()
        }
        (true, PrimitiveType::F32) => builder
            .build_float_cast(value.into_float_value(), dst_type.into_float_type(), "casttmp")?
            .as_basic_value_enum(),
        (false, _) => {
            let int = value.into_int_value();
            let int_type = dst_type.into_int_type();
            let extended = if from.kind() == PrimitiveType::Bool {
                builder.build_int_z_extend(int, int_type, "casttmp")?
            } else {
                builder.build_int_cast_sign_flag(int, int_type, true, "casttmp")?
            };
            extended.as_basic_value_enum()
        }
        (true, _) => builder
            .build_float_to_signed_int(value.into_float_value(), dst_type.into_int_type(), "casttmp")?
            .as_basic_value_enum(),
    };

    Ok(converted)
}

/// Casts `value` to `to`, recovering its current type from its LLVM shape.
pub fn cast_to<'ctx>(
    compiler: &Compiler<'ctx>,
    value: BasicValueEnum<'ctx>,
    to: Type,
) -> Result<BasicValueEnum<'ctx>, ErrorImpl> {
    let from = Type::from_backend_type(value.get_type().as_any_type_enum())?;
    cast(compiler, value, from, to)
}
