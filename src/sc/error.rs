use std::fmt;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Classification of shape compiler failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unification or extension failed, `if` arms differ, or an
    /// operand has the wrong type for an operator.
    TypeMismatch,
    /// A value needed at compile time could not be folded.
    NotConstant,
    /// A runtime value has no representation in the target dialect.
    UnsupportedValue,
    /// An operation node has no codegen mapping.
    UnsupportedNode,
    /// Index arity or magnitude out of range for the operand.
    BadIndex,
    /// Left side of an assignment is not a mutable location.
    NotAssignable,
    /// Compiled function result disagrees with the declared type.
    ResultTypeMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::NotConstant => "not a constant",
            ErrorKind::UnsupportedValue => "unsupported value",
            ErrorKind::UnsupportedNode => "unsupported operation",
            ErrorKind::BadIndex => "bad index",
            ErrorKind::NotAssignable => "not assignable",
            ErrorKind::ResultTypeMismatch => "result type mismatch",
        };
        f.write_str(text)
    }
}

/// A compile error with its source location.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn type_mismatch(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, span, message)
    }

    pub fn not_constant(span: Span) -> Self {
        Self::new(ErrorKind::NotConstant, span, "not a constant")
    }

    pub fn unsupported_value(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedValue, span, message)
    }

    pub fn unsupported_node(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedNode, span, message)
    }

    pub fn bad_index(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadIndex, span, message)
    }

    pub fn not_assignable(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAssignable, span, message)
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::from(self)
    }
}

pub type ScResult<T> = Result<T, CompileError>;
