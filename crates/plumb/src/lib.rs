//! Plumb - pipes, curried functions, and deferred expressions
//!
//! A functional-composition toolkit: a chainable [`Pipe`] container that
//! sequences transformations over a value with explicit error-state
//! propagation, a deferred-expression builder ([`It`] / [`Obj`]) that turns
//! operator and attribute usage into reusable callables, and a currying
//! engine ([`curry`]) that lets multi-parameter functions be called
//! incrementally with positional or keyword arguments, in any order, across
//! multiple invocations.
//!
//! ## Quick Start
//!
//! ```ignore
//! use plumb::{ErrorKind, It, P, Value};
//!
//! // Deferred expressions compile into callables; | chains steps;
//! // the terminal surfaces the value or the captured failure.
//! let out = (P >> 4 | (It * 2 + 1)).get()?;
//! assert_eq!(out, Value::Int(9));
//!
//! // A failed step flips the pipe into its error state; later steps
//! // are skipped until a catch recovers or a terminal surfaces it.
//! let out = (P >> 1 | (It / 0) | (It + 1))
//!     .get_or_default(Value::Float(f64::NAN));
//! ```
//!
//! ## Curried functions
//!
//! Targets declare an explicit parameter list; arguments accumulate
//! across calls and the target runs exactly once, when every parameter
//! is bound:
//!
//! ```ignore
//! use plumb::{curry, Param, Value};
//!
//! let join = curry(
//!     "join",
//!     vec![Param::required("sep"), Param::required("items")],
//!     |values| { /* ... */ },
//! );
//!
//! let with_comma = join.call(", ")?;       // partial: a callable value
//! let joined = with_comma.call(items)?;    // saturated: target runs
//! ```
//!
//! ## Deferred expressions
//!
//! `It` stands for the eventual input; operators and builder methods record
//! nodes instead of computing. Comparisons, `pow`, and floor division have
//! no Rust operator and exist as builder methods only.
//!
//! ```ignore
//! use plumb::{It, Obj};
//!
//! let f = ((It + 1) * 2).compile();          // f(3) == 8
//! let is_adult = It.attr("age").ge(18).compile();
//! let first_word = Obj.method("split", (" ",)).index(0).compile();
//! ```

mod curry;
mod eval;
mod expr;
mod pipe;
mod value;

use thiserror::Error;

// ============ Primary Public API ============

pub use curry::{Applied, Curried, Param, Signature, curry, curry_with_keywords};
pub use expr::{Arg, BinOp, Expr, It, Obj, UnaryOp};
pub use pipe::{Catch, ErrorFilter, Failure, P, Pipe, Step, Then, step, unpipe, unpipe_with};
pub use value::{Args, Func, Key, Value, compare, equals};

pub use eval::eval;

// ============ Errors ============

/// Runtime error for the whole toolkit.
///
/// Usage variants report misuse of the calling convention and surface
/// directly from the call that committed them; the remaining variants are
/// computation errors, produced while a step or expression runs, and are
/// what [`Pipe`] captures into its error state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{func}() takes {expected} positional arguments but {got} were given")]
    TooManyArguments {
        func: String,
        expected: usize,
        got: usize,
    },

    #[error("{func}() got an unexpected keyword argument '{name}'")]
    UnknownArgument { func: String, name: String },

    #[error("{func}() got multiple values for argument '{name}'")]
    DuplicateArgument { func: String, name: String },

    #[error("{func}() missing required argument '{name}'")]
    MissingArgument { func: String, name: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Unsupported operand type(s) for {op}: {lhs} and {rhs}")]
    UnsupportedOperand {
        op: String,
        lhs: String,
        rhs: String,
    },

    #[error("Unknown method '{method}' on {target}")]
    UnknownMethod { target: String, method: String },

    #[error("Unknown attribute '{attribute}' on {target}")]
    UnknownAttribute { target: String, attribute: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    Overflow,

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Negative shift count")]
    NegativeShift,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Fieldless kind, used by catch filters.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TooManyArguments { .. } => ErrorKind::TooManyArguments,
            Error::UnknownArgument { .. } => ErrorKind::UnknownArgument,
            Error::DuplicateArgument { .. } => ErrorKind::DuplicateArgument,
            Error::MissingArgument { .. } => ErrorKind::MissingArgument,
            Error::TypeError { .. } => ErrorKind::TypeError,
            Error::UnsupportedOperand { .. } => ErrorKind::UnsupportedOperand,
            Error::UnknownMethod { .. } => ErrorKind::UnknownMethod,
            Error::UnknownAttribute { .. } => ErrorKind::UnknownAttribute,
            Error::DivisionByZero => ErrorKind::DivisionByZero,
            Error::Overflow => ErrorKind::Overflow,
            Error::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Error::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Error::NegativeShift => ErrorKind::NegativeShift,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether this is a usage error (misuse at the call site) as opposed
    /// to a computation error raised while a step runs.
    pub fn is_usage(&self) -> bool {
        self.kind().is_usage()
    }
}

/// Discriminant-only mirror of [`Error`], the currency of catch filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TooManyArguments,
    UnknownArgument,
    DuplicateArgument,
    MissingArgument,
    TypeError,
    UnsupportedOperand,
    UnknownMethod,
    UnknownAttribute,
    DivisionByZero,
    Overflow,
    IndexOutOfRange,
    KeyNotFound,
    NegativeShift,
    Other,
}

impl ErrorKind {
    pub fn is_usage(self) -> bool {
        matches!(
            self,
            ErrorKind::TooManyArguments
                | ErrorKind::UnknownArgument
                | ErrorKind::DuplicateArgument
                | ErrorKind::MissingArgument
        )
    }
}
