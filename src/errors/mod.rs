//! Error types and error handling for the code generator.
//!
//! This module defines the error types used while lowering the AST:
//!
//! - `ErrorImpl`, one variant per failure kind (name resolution, type mismatch,
//!   arity mismatch, malformed control flow, backend invariants)
//! - `Error`, which pairs a failure with the node kind it surfaced in
//! - `ErrorTip` suggestions shown alongside a diagnostic

pub mod errors;
