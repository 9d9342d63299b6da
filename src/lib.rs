#![allow(clippy::module_inception)]

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod macros;
pub mod operators;
pub mod symbols;
pub mod types;
