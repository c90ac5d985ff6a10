//! The pipe container
//!
//! A [`Pipe`] holds either a value or a captured failure and threads the
//! value through a chain of steps. Steps apply only while the pipe holds
//! a value; once a step fails, the error state propagates untouched until
//! a matching [`catch`](Pipe::catch) recovers it or a terminal call
//! surfaces it.
//!
//! `|` chains any step form: a [`Func`], a [`Curried`], a deferred
//! expression (compiled on the spot), a `(func, args)` pair whose extra
//! arguments follow the piped value, a [`Then`] wrapper carrying keyword
//! arguments, or a [`Catch`] recovery step. `P >> value` seeds a pipe
//! mid-expression.

use std::fmt;
use std::ops;
use std::rc::Rc;

use log::debug;

use crate::curry::Curried;
use crate::expr::Expr;
use crate::value::{Args, Func, Value};
use crate::{Error, ErrorKind, Result};

// ============ Failure State ============

/// A captured error plus the failure it replaced, if recovery itself
/// failed. The chain is reachable through [`std::error::Error::source`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct Failure {
    error: Error,
    #[source]
    cause: Option<Box<Failure>>,
}

impl Failure {
    pub fn new(error: Error) -> Failure {
        Failure { error, cause: None }
    }

    pub fn chained(error: Error, cause: Failure) -> Failure {
        Failure {
            error,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_error(self) -> Error {
        self.error
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }
}

// ============ Catch Filters ============

/// Selects which errors a recovery step handles.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorFilter {
    Any,
    Kinds(Vec<ErrorKind>),
}

impl ErrorFilter {
    pub fn matches(&self, error: &Error) -> bool {
        match self {
            ErrorFilter::Any => true,
            ErrorFilter::Kinds(kinds) => kinds.contains(&error.kind()),
        }
    }
}

impl From<ErrorKind> for ErrorFilter {
    fn from(kind: ErrorKind) -> ErrorFilter {
        ErrorFilter::Kinds(vec![kind])
    }
}

impl<const N: usize> From<[ErrorKind; N]> for ErrorFilter {
    fn from(kinds: [ErrorKind; N]) -> ErrorFilter {
        ErrorFilter::Kinds(kinds.to_vec())
    }
}

// ============ Step Forms ============

/// A recovery step: handles errors matching its filter, passes value
/// states and non-matching errors through unchanged.
#[derive(Clone)]
pub struct Catch {
    filter: ErrorFilter,
    handler: Rc<dyn Fn(&Error) -> Result<Value>>,
}

impl Catch {
    pub fn new(
        filter: impl Into<ErrorFilter>,
        handler: impl Fn(&Error) -> Result<Value> + 'static,
    ) -> Catch {
        Catch {
            filter: filter.into(),
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for Catch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<catch {:?}>", self.filter)
    }
}

/// A call step carrying extra arguments. The piped value goes first,
/// then the wrapper's positionals, then its keywords.
#[derive(Debug, Clone)]
pub struct Then {
    func: Func,
    args: Args,
}

impl Then {
    pub fn new(func: impl Into<Func>) -> Then {
        Then {
            func: func.into(),
            args: Args::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Then {
        self.args = self.args.arg(value);
        self
    }

    pub fn kw(mut self, name: impl Into<String>, value: impl Into<Value>) -> Then {
        self.args = self.args.kw(name, value);
        self
    }

    fn run(&self, value: Value) -> Result<Value> {
        let mut call = Args::new().arg(value);
        for extra in self.args.positional() {
            call = call.arg(extra.clone());
        }
        for (name, extra) in self.args.keyword() {
            call = call.kw(name.clone(), extra.clone());
        }
        self.func.call(call)
    }
}

/// Anything `|` accepts.
#[derive(Debug, Clone)]
pub enum Step {
    Call(Func),
    CallWith(Then),
    Recover(Catch),
}

impl From<Func> for Step {
    fn from(func: Func) -> Step {
        Step::Call(func)
    }
}

impl From<Curried> for Step {
    fn from(curried: Curried) -> Step {
        Step::Call(curried.into_func())
    }
}

impl From<Expr> for Step {
    fn from(expr: Expr) -> Step {
        Step::Call(expr.compile())
    }
}

impl From<Then> for Step {
    fn from(then: Then) -> Step {
        Step::CallWith(then)
    }
}

impl From<Catch> for Step {
    fn from(catch: Catch) -> Step {
        Step::Recover(catch)
    }
}

impl<F: Into<Func>, A: Into<Args>> From<(F, A)> for Step {
    fn from((func, args): (F, A)) -> Step {
        Step::CallWith(Then {
            func: func.into(),
            args: args.into(),
        })
    }
}

/// Wrap a closure as a call step.
pub fn step(f: impl Fn(Value) -> Result<Value> + 'static) -> Step {
    Step::Call(Func::unary("step", f))
}

// ============ The Pipe ============

/// A value threaded through fallible steps, or the failure that stopped
/// it. Methods borrow the receiver, so one pipe state can fan out into
/// several continuations.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    state: std::result::Result<Value, Failure>,
}

impl Pipe {
    pub fn new(value: impl Into<Value>) -> Pipe {
        Pipe {
            state: Ok(value.into()),
        }
    }

    /// Start in the error state.
    pub fn failed(error: Error) -> Pipe {
        Pipe {
            state: Err(Failure::new(error)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.state.is_err()
    }

    /// Apply `f` to the held value. No-op in the error state.
    pub fn then(&self, f: impl FnOnce(Value) -> Result<Value>) -> Pipe {
        match &self.state {
            Ok(value) => match f(value.clone()) {
                Ok(next) => Pipe { state: Ok(next) },
                Err(error) => {
                    debug!("pipe captured: {error}");
                    Pipe {
                        state: Err(Failure::new(error)),
                    }
                }
            },
            Err(_) => self.clone(),
        }
    }

    /// Apply a [`Then`] wrapper: the piped value goes first, then the
    /// wrapper's extra positional and keyword arguments.
    pub fn then_with(&self, then: &Then) -> Pipe {
        self.then(|value| then.run(value))
    }

    /// Recover from a matching error. In the value state, or when the
    /// error does not match, the pipe passes through unchanged. A handler
    /// that itself fails chains the new error onto the old failure.
    pub fn catch(
        &self,
        filter: impl Into<ErrorFilter>,
        handler: impl FnOnce(&Error) -> Result<Value>,
    ) -> Pipe {
        let filter = filter.into();
        match &self.state {
            Err(failure) if filter.matches(&failure.error) => match handler(&failure.error) {
                Ok(value) => {
                    debug!("pipe recovered from: {}", failure.error);
                    Pipe { state: Ok(value) }
                }
                Err(error) => Pipe {
                    state: Err(Failure::chained(error, failure.clone())),
                },
            },
            _ => self.clone(),
        }
    }

    /// Surface the held value or the captured failure.
    pub fn get(self) -> std::result::Result<Value, Failure> {
        self.state
    }

    /// The held value, or `default` in the error state.
    pub fn get_or_default(self, default: impl Into<Value>) -> Value {
        self.state.unwrap_or_else(|_| default.into())
    }

    /// Like [`get_or_default`](Pipe::get_or_default), but only matching
    /// errors take the default; anything else still surfaces.
    pub fn get_or_default_caught(
        self,
        default: impl Into<Value>,
        filter: impl Into<ErrorFilter>,
    ) -> std::result::Result<Value, Failure> {
        let filter = filter.into();
        match self.state {
            Ok(value) => Ok(value),
            Err(failure) if filter.matches(&failure.error) => Ok(default.into()),
            Err(failure) => Err(failure),
        }
    }

    /// The held value, or `error` in place of the captured failure.
    /// With `chained` the original failure rides along as the cause.
    pub fn get_or_raise(
        self,
        error: Error,
        chained: bool,
    ) -> std::result::Result<Value, Failure> {
        match self.state {
            Ok(value) => Ok(value),
            Err(failure) if chained => Err(Failure::chained(error, failure)),
            Err(_) => Err(Failure::new(error)),
        }
    }
}

impl<S: Into<Step>> ops::BitOr<S> for Pipe {
    type Output = Pipe;

    fn bitor(self, step: S) -> Pipe {
        match step.into() {
            Step::Call(func) => self.then(|value| func.call(value)),
            Step::CallWith(then) => self.then(|value| then.run(value)),
            Step::Recover(catch) => {
                let handler = Rc::clone(&catch.handler);
                self.catch(catch.filter, move |error| handler(error))
            }
        }
    }
}

/// Seed marker: `P >> value` starts a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct P;

impl<V: Into<Value>> ops::Shr<V> for P {
    type Output = Pipe;

    fn shr(self, value: V) -> Pipe {
        Pipe::new(value)
    }
}

/// Terminal helper, for pipelines built in expression position.
pub fn unpipe(pipe: Pipe) -> std::result::Result<Value, Failure> {
    pipe.get()
}

/// Terminal helper applying one final transform before extraction.
pub fn unpipe_with(
    pipe: Pipe,
    f: impl FnOnce(Value) -> Result<Value>,
) -> std::result::Result<Value, Failure> {
    pipe.then(f).get()
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::It;

    fn halve() -> Func {
        Func::unary("halve", |v| {
            crate::eval::apply_binop(crate::expr::BinOp::Div, &v, &Value::Int(2))
        })
    }

    #[test]
    fn value_threads_through_steps() {
        let out = (P >> 8 | (It * 3) | (It + 1)).get().unwrap();
        assert_eq!(out, Value::Int(25));
    }

    #[test]
    fn error_state_skips_remaining_steps() {
        let pipe = Pipe::new(1) | (It / 0) | (It + 1);
        assert!(pipe.is_err());
        let failure = pipe.get().unwrap_err();
        assert_eq!(failure.error(), &Error::DivisionByZero);
        assert!(failure.cause().is_none());
    }

    #[test]
    fn catch_recovers_matching_errors_only() {
        let failed = Pipe::new(1) | (It / 0);
        let recovered = failed.catch(ErrorKind::DivisionByZero, |_| Ok(Value::Int(0)));
        assert_eq!(recovered.get().unwrap(), Value::Int(0));

        let failed = Pipe::new(1) | (It / 0);
        let untouched = failed.catch(ErrorKind::Overflow, |_| Ok(Value::Int(0)));
        assert_eq!(
            untouched.get().unwrap_err().error(),
            &Error::DivisionByZero
        );
    }

    #[test]
    fn failing_handler_chains_the_old_failure() {
        let failed = Pipe::new(1) | (It / 0);
        let worse = failed.catch(ErrorFilter::Any, |_| {
            Err(Error::Other("recovery failed".to_string()))
        });
        let failure = worse.get().unwrap_err();
        assert_eq!(failure.error(), &Error::Other("recovery failed".to_string()));
        assert_eq!(
            failure.cause().map(Failure::error),
            Some(&Error::DivisionByZero)
        );
        // The chain is visible through the std error trait
        assert!(std::error::Error::source(&failure).is_some());
    }

    #[test]
    fn catch_as_a_pipeline_step() {
        let out = (P >> 1
            | (It / 0)
            | Catch::new(ErrorKind::DivisionByZero, |_| Ok(Value::Float(f64::NAN))))
        .get()
        .unwrap();
        assert!(out.as_float().unwrap().is_nan());
    }

    #[test]
    fn extra_arguments_follow_the_piped_value() {
        let append = Func::new("append", |args: Args| {
            let mut out = String::new();
            for v in args.positional() {
                out.push_str(v.as_str()?);
            }
            Ok(Value::from(out))
        });
        let out = (Pipe::new("a") | (append.clone(), ("b", "c"))).get().unwrap();
        assert_eq!(out, Value::from("abc"));

        let out = (Pipe::new("x") | Then::new(append.clone()).arg("y"))
            .get()
            .unwrap();
        assert_eq!(out, Value::from("xy"));

        let wrapper = Then::new(append).arg("!");
        let out = Pipe::new("done").then_with(&wrapper).get().unwrap();
        assert_eq!(out, Value::from("done!"));
    }

    #[test]
    fn terminals() {
        let failed = Pipe::new(1) | (It / 0);
        assert_eq!(failed.clone().get_or_default(-1), Value::Int(-1));
        assert_eq!(
            failed
                .clone()
                .get_or_default_caught(-1, ErrorKind::DivisionByZero)
                .unwrap(),
            Value::Int(-1)
        );
        assert!(
            failed
                .clone()
                .get_or_default_caught(-1, ErrorKind::Overflow)
                .is_err()
        );

        let raised = failed
            .clone()
            .get_or_raise(Error::Other("boom".to_string()), true)
            .unwrap_err();
        assert_eq!(raised.error(), &Error::Other("boom".to_string()));
        assert_eq!(
            raised.cause().map(Failure::error),
            Some(&Error::DivisionByZero)
        );
        let flat = failed
            .get_or_raise(Error::Other("boom".to_string()), false)
            .unwrap_err();
        assert!(flat.cause().is_none());

        assert_eq!(unpipe(Pipe::new(3)).unwrap(), Value::Int(3));
        assert_eq!(
            unpipe_with(Pipe::new(3), |v| {
                crate::eval::apply_binop(crate::expr::BinOp::Mul, &v, &Value::Int(2))
            })
            .unwrap(),
            Value::Int(6)
        );
        // The final transform is skipped in the error state
        assert_eq!(
            unpipe_with(Pipe::new(1) | (It / 0), |_| panic!("not reached"))
                .unwrap_err()
                .error(),
            &Error::DivisionByZero
        );
    }

    #[test]
    fn pipe_state_is_not_consumed_by_borrowing_methods() {
        let base = Pipe::new(10);
        let a = base.then(|v| crate::eval::apply_binop(crate::expr::BinOp::Add, &v, &Value::Int(1)));
        let b = base.then(|v| crate::eval::apply_binop(crate::expr::BinOp::Sub, &v, &Value::Int(1)));
        assert_eq!(a.get().unwrap(), Value::Int(11));
        assert_eq!(b.get().unwrap(), Value::Int(9));
        assert_eq!(base.get().unwrap(), Value::Int(10));
    }

    #[test]
    fn closure_steps() {
        let out = (Pipe::new(2) | step(|v| Ok(v)) | halve()).get().unwrap();
        assert_eq!(out, Value::Float(1.0));
    }
}
