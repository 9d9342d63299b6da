use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::ast::ast::NodeType;

/// A lowering failure, paired with the kind of node it surfaced in.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    node: NodeType,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, node: NodeType) -> Self {
        Error {
            internal_error: error_impl,
            node,
        }
    }

    pub fn get_node(&self) -> NodeType {
        self.node
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::SymbolNotDeclared { .. } => "SymbolNotDeclared",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::FunctionAlreadyDefined { .. } => "FunctionAlreadyDefined",
            ErrorImpl::SignatureMismatch { .. } => "SignatureMismatch",
            ErrorImpl::OperandTypeMismatch { .. } => "OperandTypeMismatch",
            ErrorImpl::UnsupportedOperand { .. } => "UnsupportedOperand",
            ErrorImpl::UnsupportedCast { .. } => "UnsupportedCast",
            ErrorImpl::InvalidIndexType { .. } => "InvalidIndexType",
            ErrorImpl::NotAPointer { .. } => "NotAPointer",
            ErrorImpl::NotAnArray { .. } => "NotAnArray",
            ErrorImpl::InvalidType { .. } => "InvalidType",
            ErrorImpl::UnknownBackendType { .. } => "UnknownBackendType",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            ErrorImpl::MissingBranchValue { .. } => "MissingBranchValue",
            ErrorImpl::MissingValue => "MissingValue",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::VerificationFailed { .. } => "VerificationFailed",
            ErrorImpl::NoActiveScope => "NoActiveScope",
            ErrorImpl::NoInsertionPoint => "NoInsertionPoint",
            ErrorImpl::Backend { .. } => "Backend",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::SymbolNotDeclared { symbol } => ErrorTip::Suggestion(format!(
                "`{}` is not declared in any enclosing scope",
                symbol
            )),
            ErrorImpl::FunctionNotDeclared { function } => ErrorTip::Suggestion(format!(
                "Function `{}` must be declared before it is called",
                function
            )),
            ErrorImpl::SignatureMismatch { function, expected, .. } => ErrorTip::Suggestion(format!(
                "Every declaration and the definition of `{}` must have the signature `{}`",
                function, expected
            )),
            ErrorImpl::OperandTypeMismatch { lhs, rhs, .. } => ErrorTip::Suggestion(format!(
                "Cast one side so that `{}` and `{}` match",
                lhs, rhs
            )),
            ErrorImpl::UnsupportedCast { from, to } => ErrorTip::Suggestion(format!(
                "There is no conversion from `{}` to `{}`",
                from, to
            )),
            ErrorImpl::ArityMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} values, received {}",
                expected, received
            )),
            ErrorImpl::MissingBranchValue { branch } => ErrorTip::Suggestion(format!(
                "The `{}` branch must produce a value, or add an `else` branch",
                branch
            )),
            ErrorImpl::MissingReturnValue { function } => ErrorTip::Suggestion(format!(
                "The body of `{}` must end in a value of its return type",
                function
            )),
            ErrorImpl::IndexOutOfBounds { index, size } => ErrorTip::Suggestion(format!(
                "Valid indices are 0 to {}, found {}",
                size.saturating_sub(1),
                index
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} in {}: {}",
            self.get_error_name(),
            self.node,
            self.internal_error
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("symbol {symbol:?} not declared")]
    SymbolNotDeclared { symbol: String },
    #[error("function {function:?} not declared")]
    FunctionNotDeclared { function: String },
    #[error("function {function:?} already has a body")]
    FunctionAlreadyDefined { function: String },
    #[error("function {function:?} was declared as {expected}, found {received}")]
    SignatureMismatch {
        function: String,
        expected: String,
        received: String,
    },
    #[error("operand types of `{operator}` do not match: {lhs} vs {rhs}")]
    OperandTypeMismatch {
        operator: String,
        lhs: String,
        rhs: String,
    },
    #[error("operator `{operator}` cannot be applied to {type_}")]
    UnsupportedOperand { operator: String, type_: String },
    #[error("cannot cast {from} to {to}")]
    UnsupportedCast { from: String, to: String },
    #[error("array index must be an integer, found {type_}")]
    InvalidIndexType { type_: String },
    #[error("expected a pointer, found {type_}")]
    NotAPointer { type_: String },
    #[error("expected an array, found {type_}")]
    NotAnArray { type_: String },
    #[error("invalid type {type_}: {reason}")]
    InvalidType { type_: String, reason: String },
    #[error("backend type {type_} has no source type")]
    UnknownBackendType { type_: String },
    #[error("expected {expected} values, received {received}")]
    ArityMismatch { expected: usize, received: usize },
    #[error("index {index} out of bounds for array of size {size}")]
    IndexOutOfBounds { index: i64, size: u32 },
    #[error("{branch} branch of a conditional expression produced no value")]
    MissingBranchValue { branch: String },
    #[error("expression produced no value")]
    MissingValue,
    #[error("body of function {function:?} produced no return value")]
    MissingReturnValue { function: String },
    #[error("function {function:?} failed verification")]
    VerificationFailed { function: String },
    #[error("no scope is open")]
    NoActiveScope,
    #[error("no insertion point is set")]
    NoInsertionPoint,
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl From<BuilderError> for ErrorImpl {
    fn from(error: BuilderError) -> Self {
        ErrorImpl::Backend {
            message: error.to_string(),
        }
    }
}

/// Attaches the node a failure surfaced in, turning a helper's error into an [`Error`].
pub trait WithNode<T> {
    fn in_node(self, node: NodeType) -> Result<T, Error>;
}

impl<T, E: Into<ErrorImpl>> WithNode<T> for Result<T, E> {
    fn in_node(self, node: NodeType) -> Result<T, Error> {
        self.map_err(|error| Error::new(error.into(), node))
    }
}
