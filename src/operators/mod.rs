//! Binary operator semantics.
//!
//! Maps an operator and two equally-typed operands onto the matching LLVM
//! instruction, choosing the float or integer variant from the operand type.

pub mod operators;
