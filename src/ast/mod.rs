//! AST (Abstract Syntax Tree) module.
//!
//! Every node owns its children and lowers itself into the compiler's module.
//! Nodes take one or more capability roles:
//!
//! - `Node`: produces a value when lowered
//! - `AssignableNode`: has addressable storage, the target of `=`
//! - `MultiAssignableNode`: takes an ordered sequence of values at once
//! - `AggregateNode`: lowers to an ordered sequence of values
//!
//! Submodules:
//! - ast: Node kinds, the capability traits and storage places
//! - expressions: Literals, variables, operations, calls and indirection
//! - control_flow: Conditional expressions and statements
//! - lists: Node lists and assignment target lists
//! - statements: Blocks, declarations, assignments, functions and the root

pub mod ast;
pub mod control_flow;
pub mod expressions;
pub mod lists;
pub mod statements;
