//! Single-value helpers
//!
//! Predicates, truthiness combinators, and clamps. As in the list
//! catalog, each returns a [`Curried`] with the value parameter last.

use std::cmp::Ordering;

use log::debug;
use plumb::{Curried, Error, Param, Value, compare, curry};

fn unary(name: &'static str, f: impl Fn(&Value) -> plumb::Result<Value> + 'static) -> Curried {
    curry(name, vec![Param::required("value")], move |values| {
        f(&values[0])
    })
}

/// Truthiness negation.
pub fn not_() -> Curried {
    unary("not", |value| Ok(Value::Bool(!value.truthy())))
}

/// Short-circuit and: yields `other` when the value is truthy, else the
/// value itself.
pub fn and_(other: impl Into<Value>) -> Curried {
    curry(
        "and",
        vec![Param::required("other"), Param::required("value")],
        |values| {
            Ok(if values[1].truthy() {
                values[0].clone()
            } else {
                values[1].clone()
            })
        },
    )
    .with(other.into())
}

/// Short-circuit or: yields the value when truthy, else `other`.
pub fn or_(other: impl Into<Value>) -> Curried {
    curry(
        "or",
        vec![Param::required("other"), Param::required("value")],
        |values| {
            Ok(if values[1].truthy() {
                values[1].clone()
            } else {
                values[0].clone()
            })
        },
    )
    .with(other.into())
}

pub fn is_even() -> Curried {
    unary("is_even", |value| Ok(Value::Bool(value.as_int()? % 2 == 0)))
}

pub fn is_odd() -> Curried {
    unary("is_odd", |value| Ok(Value::Bool(value.as_int()? % 2 != 0)))
}

/// True when the value is congruent to `remainder` modulo `modulus`.
pub fn is_congruent(remainder: i64, modulus: i64) -> Curried {
    curry(
        "is_congruent",
        vec![
            Param::required("remainder"),
            Param::required("modulus"),
            Param::required("value"),
        ],
        |values| {
            let r = values[0].as_int()?;
            let m = values[1].as_int()?;
            let v = values[2].as_int()?;
            if m == 0 {
                return Err(Error::DivisionByZero);
            }
            // Floored remainders make the comparison sign-stable
            let floored = |x: i64| {
                let rem = x % m;
                if rem != 0 && (rem < 0) != (m < 0) {
                    rem + m
                } else {
                    rem
                }
            };
            Ok(Value::Bool(floored(v) == floored(r)))
        },
    )
    .with((remainder, modulus))
}

pub fn is_none() -> Curried {
    unary("is_none", |value| Ok(Value::Bool(value.is_unit())))
}

pub fn is_not_none() -> Curried {
    unary("is_not_none", |value| Ok(Value::Bool(!value.is_unit())))
}

/// Clip into `[lo, hi]`.
pub fn clamp(lo: impl Into<Value>, hi: impl Into<Value>) -> Curried {
    curry(
        "clamp",
        vec![
            Param::required("lo"),
            Param::required("hi"),
            Param::required("value"),
        ],
        |values| {
            let (lo, hi, value) = (&values[0], &values[1], &values[2]);
            if compare(value, lo)? == Ordering::Less {
                return Ok(lo.clone());
            }
            if compare(value, hi)? == Ordering::Greater {
                return Ok(hi.clone());
            }
            Ok(value.clone())
        },
    )
    .with((lo.into(), hi.into()))
}

/// Clip from below.
pub fn lclamp(lo: impl Into<Value>) -> Curried {
    curry(
        "lclamp",
        vec![Param::required("lo"), Param::required("value")],
        |values| {
            let (lo, value) = (&values[0], &values[1]);
            if compare(value, lo)? == Ordering::Less {
                Ok(lo.clone())
            } else {
                Ok(value.clone())
            }
        },
    )
    .with(lo.into())
}

/// Clip from above.
pub fn rclamp(hi: impl Into<Value>) -> Curried {
    curry(
        "rclamp",
        vec![Param::required("hi"), Param::required("value")],
        |values| {
            let (hi, value) = (&values[0], &values[1]);
            if compare(value, hi)? == Ordering::Greater {
                Ok(hi.clone())
            } else {
                Ok(value.clone())
            }
        },
    )
    .with(hi.into())
}

/// Fail unconditionally with `message`. Marks pipeline branches that
/// must be unreachable.
pub fn raise_(message: impl Into<String>) -> Curried {
    curry(
        "raise",
        vec![Param::required("message"), Param::required("value")],
        |values| {
            let message = values[0].as_str()?;
            debug!("raise step hit with value {}", values[1]);
            Err(Error::Other(message.to_string()))
        },
    )
    .with(Value::from(message.into()))
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs
