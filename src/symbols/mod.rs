//! Lexically scoped symbol resolution.
//!
//! The symbol table is a stack of scopes, pushed when a function body or a
//! nested block starts lowering and popped when it finishes. Scopes are
//! normally opened through `Compiler::enter_scope`, whose guard pops on every
//! exit path.

pub mod symbol_table;
