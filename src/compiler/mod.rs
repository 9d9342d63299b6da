//! Code generation module for the compiler.
//!
//! This module contains the LLVM-backed compilation context that every node
//! lowers into. It handles:
//!
//! - Module, builder and symbol table ownership for one run
//! - Scope guards keeping the symbol table balanced
//! - Entry-block slot allocation and basic block bookkeeping
//! - Driving the lowering of a program and printing the result

pub mod compiler;
pub mod options;
