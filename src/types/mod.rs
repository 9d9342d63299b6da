//! Source-level types and conversions between them.
//!
//! - `Type` describes a value's shape: primitive kind, scalar or fixed-size
//!   array, and whether it is held by value or through a pointer
//! - The mapping to LLVM types, and its inverse for values whose source type
//!   was erased (function arguments, loaded pointers)
//! - `cast`, the conversion semantics between primitive kinds

pub mod cast;
pub mod types;
