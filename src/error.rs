//! Checker and lowering errors.
//!
//! Plain enum plus a hand-written `Display`/`std::error::Error` impl;
//! this layer never reaches for `thiserror`.

use crate::ast::Pos;
use std::fmt;

/// One failure mode per user-visible diagnostic. Internal inconsistencies
/// (a mismatched `Value` discriminant, an invalid `untyped` `Meta`) are
/// `debug_assert!` panics instead, never a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UndefinedId,
    UndefinedType,
    InvalidKeyType,
    InvalidSubscript,
    InvalidSizeVal,
    InvalidOpType,
    InvalidLvalue,
    InvalidCondType,
    MismatchedType,
    MismatchedElemCnt,
    MismatchedCount,
    NumericOverflow,
    DivideByZero,
    NotAccessibleExp,
    NotCallableExp,
}

impl ErrorKind {
    fn phrase(self) -> &'static str {
        match self {
            ErrorKind::UndefinedId => "undefined identifier",
            ErrorKind::UndefinedType => "undefined type",
            ErrorKind::InvalidKeyType => "invalid map key type",
            ErrorKind::InvalidSubscript => "invalid subscript",
            ErrorKind::InvalidSizeVal => "invalid size value",
            ErrorKind::InvalidOpType => "invalid operand type",
            ErrorKind::InvalidLvalue => "invalid lvalue",
            ErrorKind::InvalidCondType => "invalid condition type",
            ErrorKind::MismatchedType => "mismatched type",
            ErrorKind::MismatchedElemCnt => "mismatched element count",
            ErrorKind::MismatchedCount => "mismatched count",
            ErrorKind::NumericOverflow => "numeric overflow",
            ErrorKind::DivideByZero => "divide by zero",
            ErrorKind::NotAccessibleExp => "expression is not accessible",
            ErrorKind::NotCallableExp => "expression is not callable",
        }
    }
}

/// A single checker diagnostic: a kind, the source position it was raised
/// at, and up to a couple of formatted arguments (typically `Meta`
/// renderings) to interpolate into the phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: Pos,
    pub args: Vec<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, pos: Pos, args: Vec<String>) -> Self {
        debug_assert!(args.len() <= 2, "Error carries at most two formatted arguments");
        Error { kind, pos, args }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.kind.phrase())?;
        if !self.args.is_empty() {
            write!(f, " ({})", self.args.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
