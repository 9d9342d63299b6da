//! Utility macros for the code generator.
//!
//! - `MK_OPERATION!` - Builds either the float or the integer variant of a binary instruction

/// Builds the float or integer variant of a binary instruction depending on the operand kind.
///
/// # Arguments
///
/// * `$builder` - The LLVM builder to emit into
/// * `$lhs`, `$rhs` - The operands, already checked to share one shape
/// * `$float_fn` - The `Builder` method used for float operands
/// * `$int_fn` - The `Builder` method used for integer operands
/// * `$name` - The name given to the produced value
///
/// # Example
///
/// ```ignore
/// MK_OPERATION!(builder, lhs, rhs, build_float_add, build_int_add, "addtmp")
/// ```
#[macro_export]
macro_rules! MK_OPERATION {
    ($builder:expr, $lhs:expr, $rhs:expr, $float_fn:ident, $int_fn:ident, $name:literal) => {
        if $lhs.is_float_value() {
            $builder
                .$float_fn($lhs.into_float_value(), $rhs.into_float_value(), $name)
                .map(BasicValueEnum::from)
        } else {
            $builder
                .$int_fn($lhs.into_int_value(), $rhs.into_int_value(), $name)
                .map(BasicValueEnum::from)
        }
    };
    ($builder:expr, $lhs:expr, $rhs:expr, $float_pred:expr, $int_pred:expr, $name:literal, compare) => {
        if $lhs.is_float_value() {
            $builder
                .build_float_compare(
                    $float_pred,
                    $lhs.into_float_value(),
                    $rhs.into_float_value(),
                    $name,
                )
                .map(BasicValueEnum::from)
        } else {
            $builder
                .build_int_compare(
                    $int_pred,
                    $lhs.into_int_value(),
                    $rhs.into_int_value(),
                    $name,
                )
                .map(BasicValueEnum::from)
        }
    };
}
