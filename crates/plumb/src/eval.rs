//! Expression evaluation
//!
//! Walks an [`Expr`] bottom-up, substituting the input for every
//! placeholder occurrence. Operator semantics follow the conventions the
//! rest of the crate uses for dynamic values: `/` always yields a float,
//! `//` floors toward negative infinity, `%` takes the sign of the
//! divisor, and integer arithmetic is checked rather than wrapping.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::expr::{Arg, BinOp, Expr, UnaryOp};
use crate::value::{Key, Value, compare, equals};
use crate::{Error, Result};

/// Evaluate `expr` against `input`. Every [`Expr::Input`] node resolves
/// to the same `input` value.
pub fn eval(expr: &Expr, input: &Value) -> Result<Value> {
    match expr {
        Expr::Input => Ok(input.clone()),
        Expr::Constant(v) => Ok(v.clone()),
        Expr::Attr(base, name) => {
            let target = eval(base, input)?;
            eval_attr(&target, name)
        }
        Expr::Index(base, key) => {
            let target = eval(base, input)?;
            let key = eval(key, input)?;
            eval_index(&target, &key)
        }
        Expr::Unary(op, operand) => {
            let operand = eval(operand, input)?;
            apply_unop(*op, &operand)
        }
        Expr::Binary(lhs, op, rhs) => {
            let lhs = eval(lhs, input)?;
            let rhs = eval(rhs, input)?;
            apply_binop(*op, &lhs, &rhs)
        }
        Expr::Call(base, method, args) => {
            let target = eval(base, input)?;
            let mut positional = Vec::new();
            let mut keyword = IndexMap::new();
            for arg in args {
                match arg {
                    Arg::Positional(e) => positional.push(eval(e, input)?),
                    Arg::Keyword(name, e) => {
                        keyword.insert(name.clone(), eval(e, input)?);
                    }
                }
            }
            call_method(&target, method, positional, keyword)
        }
    }
}

// ============ Attribute and Index Access ============

fn eval_attr(target: &Value, name: &str) -> Result<Value> {
    match target {
        Value::Map(m) => m.get(&Key::Str(name.into())).cloned().ok_or_else(|| {
            Error::UnknownAttribute {
                target: "map".to_string(),
                attribute: name.to_string(),
            }
        }),
        other => Err(Error::UnknownAttribute {
            target: other.type_name().to_string(),
            attribute: name.to_string(),
        }),
    }
}

fn eval_index(target: &Value, key: &Value) -> Result<Value> {
    match target {
        Value::List(xs) => {
            let i = key.as_int()?;
            let idx = resolve_index(i, xs.len())?;
            Ok(xs[idx].clone())
        }
        Value::Str(s) => {
            let i = key.as_int()?;
            let chars: Vec<char> = s.chars().collect();
            let idx = resolve_index(i, chars.len())?;
            Ok(Value::from(chars[idx].to_string()))
        }
        Value::Map(m) => {
            let k = key.key()?;
            m.get(&k)
                .cloned()
                .ok_or_else(|| Error::KeyNotFound { key: k.to_string() })
        }
        other => Err(crate::value::type_error("an indexable value", other)),
    }
}

/// Negative indices count from the end.
fn resolve_index(i: i64, len: usize) -> Result<usize> {
    let adjusted = if i < 0 { i + len as i64 } else { i };
    if adjusted < 0 || adjusted as usize >= len {
        Err(Error::IndexOutOfRange { index: i, len })
    } else {
        Ok(adjusted as usize)
    }
}

// ============ Unary Operators ============

pub(crate) fn apply_unop(op: UnaryOp, operand: &Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(Error::Overflow),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, Value::Int(i)) => Ok(Value::Int(!i)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Abs, Value::Int(i)) => i.checked_abs().map(Value::Int).ok_or(Error::Overflow),
        (UnaryOp::Abs, Value::Float(f)) => Ok(Value::Float(f.abs())),
        (op, operand) => Err(Error::UnsupportedOperand {
            op: op.to_string(),
            lhs: operand.type_name().to_string(),
            rhs: String::new(),
        }),
    }
}

// ============ Binary Operators ============

enum NumPair {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Int mixed with Float promotes to Floats. Bools are deliberately not
/// numeric here.
fn numeric_pair(a: &Value, b: &Value) -> Option<NumPair> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(NumPair::Ints(*x, *y)),
        (Value::Int(x), Value::Float(y)) => Some(NumPair::Floats(*x as f64, *y)),
        (Value::Float(x), Value::Int(y)) => Some(NumPair::Floats(*x, *y as f64)),
        (Value::Float(x), Value::Float(y)) => Some(NumPair::Floats(*x, *y)),
        _ => None,
    }
}

fn unsupported(op: BinOp, lhs: &Value, rhs: &Value) -> Error {
    Error::UnsupportedOperand {
        op: op.symbol().to_string(),
        lhs: lhs.type_name().to_string(),
        rhs: rhs.type_name().to_string(),
    }
}

pub(crate) fn apply_binop(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match op {
        BinOp::Add => add(lhs, rhs),
        BinOp::Sub => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => a.checked_sub(b).map(Value::Int).ok_or(Error::Overflow),
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a - b)),
            None => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::Mul => mul(lhs, rhs),
        BinOp::Div => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => {
                if b == 0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(Value::Float(a as f64 / b as f64))
                }
            }
            Some(NumPair::Floats(a, b)) => {
                if b == 0.0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(Value::Float(a / b))
                }
            }
            None => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::FloorDiv => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => floor_div_int(a, b).map(Value::Int),
            Some(NumPair::Floats(a, b)) => {
                if b == 0.0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(Value::Float((a / b).floor()))
                }
            }
            None => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::Mod => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => rem_int(a, b).map(Value::Int),
            Some(NumPair::Floats(a, b)) => {
                if b == 0.0 {
                    Err(Error::DivisionByZero)
                } else {
                    let r = a % b;
                    // Result takes the divisor's sign
                    if r != 0.0 && (r < 0.0) != (b < 0.0) {
                        Ok(Value::Float(r + b))
                    } else {
                        Ok(Value::Float(r))
                    }
                }
            }
            None => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::Pow => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => {
                if b < 0 {
                    // Negative exponent leaves the integers
                    Ok(Value::Float((a as f64).powf(b as f64)))
                } else {
                    let exp = u32::try_from(b).map_err(|_| Error::Overflow)?;
                    a.checked_pow(exp).map(Value::Int).ok_or(Error::Overflow)
                }
            }
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a.powf(b))),
            None => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::MatMul => dot_product(lhs, rhs),
        BinOp::Eq => Ok(Value::Bool(equals(lhs, rhs))),
        BinOp::Ne => Ok(Value::Bool(!equals(lhs, rhs))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let holds = match partial_compare(lhs, rhs) {
                Err(_) => return Err(unsupported(op, lhs, rhs)),
                // NaN compares false against everything
                Ok(None) => false,
                Ok(Some(ord)) => match op {
                    BinOp::Lt => ord == Ordering::Less,
                    BinOp::Le => ord != Ordering::Greater,
                    BinOp::Gt => ord == Ordering::Greater,
                    BinOp::Ge => ord != Ordering::Less,
                    _ => unreachable!(),
                },
            };
            Ok(Value::Bool(holds))
        }
        BinOp::BitAnd => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a & b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a & b)),
            _ => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::BitOr => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a | b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a | b)),
            _ => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::BitXor => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a ^ b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a ^ b)),
            _ => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::Shl => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let shift = shift_amount(*b)?;
                a.checked_shl(shift)
                    .filter(|res| res >> shift == *a)
                    .map(Value::Int)
                    .ok_or(Error::Overflow)
            }
            _ => Err(unsupported(op, lhs, rhs)),
        },
        BinOp::Shr => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let shift = shift_amount(*b)?;
                // Arithmetic shift floors toward negative infinity, which
                // matches floor division by a power of two
                a.checked_shr(shift).map(Value::Int).ok_or(Error::Overflow)
            }
            _ => Err(unsupported(op, lhs, rhs)),
        },
    }
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::from(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut out = a.as_ref().clone();
            out.extend(b.iter().cloned());
            Ok(Value::list(out))
        }
        _ => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => a.checked_add(b).map(Value::Int).ok_or(Error::Overflow),
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a + b)),
            None => Err(unsupported(BinOp::Add, lhs, rhs)),
        },
    }
}

fn mul(lhs: &Value, rhs: &Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            // Non-positive counts yield the empty string
            Ok(Value::from(s.repeat(usize::try_from(*n).unwrap_or(0))))
        }
        (Value::List(xs), Value::Int(n)) | (Value::Int(n), Value::List(xs)) => {
            let count = usize::try_from(*n).unwrap_or(0);
            let mut out = Vec::with_capacity(xs.len() * count);
            for _ in 0..count {
                out.extend(xs.iter().cloned());
            }
            Ok(Value::list(out))
        }
        _ => match numeric_pair(lhs, rhs) {
            Some(NumPair::Ints(a, b)) => a.checked_mul(b).map(Value::Int).ok_or(Error::Overflow),
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a * b)),
            None => Err(unsupported(BinOp::Mul, lhs, rhs)),
        },
    }
}

fn floor_div_int(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    let q = a.checked_div(b).ok_or(Error::Overflow)?;
    let r = a % b;
    // Truncated quotient floors toward zero; adjust when signs differ
    if r != 0 && (r < 0) != (b < 0) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn rem_int(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    let r = a.checked_rem(b).ok_or(Error::Overflow)?;
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn shift_amount(b: i64) -> Result<u32> {
    if b < 0 {
        return Err(Error::NegativeShift);
    }
    u32::try_from(b).map_err(|_| Error::Overflow)
}

/// Dot product of two equal-length numeric lists. Stays integral when
/// every element is an int.
fn dot_product(lhs: &Value, rhs: &Value) -> Result<Value> {
    let (a, b) = match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => (a, b),
        _ => return Err(unsupported(BinOp::MatMul, lhs, rhs)),
    };
    if a.len() != b.len() {
        return Err(Error::TypeError {
            expected: "lists of equal length".to_string(),
            got: format!("lengths {} and {}", a.len(), b.len()),
        });
    }
    let mut acc = Value::Int(0);
    for (x, y) in a.iter().zip(b.iter()) {
        let product = apply_binop(BinOp::Mul, x, y)?;
        acc = apply_binop(BinOp::Add, &acc, &product)?;
    }
    Ok(acc)
}

/// Ordering for the relational operators. `None` marks an incomparable
/// numeric pair (NaN involved); an `Err` marks operand types with no
/// ordering at all.
fn partial_compare(a: &Value, b: &Value) -> Result<Option<Ordering>> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Some(x.cmp(y))),
        (Value::Float(x), Value::Float(y)) => Ok(x.partial_cmp(y)),
        (Value::Int(x), Value::Float(y)) => Ok((*x as f64).partial_cmp(y)),
        (Value::Float(x), Value::Int(y)) => Ok(x.partial_cmp(&(*y as f64))),
        (Value::Bool(x), Value::Bool(y)) => Ok(Some(x.cmp(y))),
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(xs), Value::List(ys)) => {
            for (x, y) in xs.iter().zip(ys.iter()) {
                match partial_compare(x, y)? {
                    Some(Ordering::Equal) => continue,
                    other => return Ok(other),
                }
            }
            Ok(Some(xs.len().cmp(&ys.len())))
        }
        _ => Err(Error::TypeError {
            expected: "comparable values".to_string(),
            got: format!("{} and {}", a.type_name(), b.type_name()),
        }),
    }
}

// ============ Method Calls ============

fn call_method(
    target: &Value,
    method: &str,
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
) -> Result<Value> {
    match target {
        Value::Str(_) => str_method(target, method, positional, keyword),
        Value::List(_) => list_method(target, method, positional, keyword),
        Value::Map(_) => map_method(target, method, positional, keyword),
        other => Err(Error::UnknownMethod {
            target: other.type_name().to_string(),
            method: method.to_string(),
        }),
    }
}

fn str_method(
    target: &Value,
    method: &str,
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
) -> Result<Value> {
    let s = target.as_str()?;
    match method {
        "len" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::Int(s.chars().count() as i64))
        }
        "upper" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::from(s.to_uppercase()))
        }
        "lower" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::from(s.to_lowercase()))
        }
        "strip" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::from(s.trim()))
        }
        "split" => {
            check_arity(method, &positional, &keyword, 1, &[])?;
            match positional.first() {
                None => Ok(Value::list(
                    s.split_whitespace().map(Value::from).collect::<Vec<_>>(),
                )),
                Some(sep) => {
                    let sep = str_arg(method, sep, "sep")?;
                    Ok(Value::list(
                        s.split(sep.as_str()).map(Value::from).collect::<Vec<_>>(),
                    ))
                }
            }
        }
        "join" => {
            check_arity(method, &positional, &keyword, 1, &[])?;
            let parts = required_arg(method, &positional, 0, "parts")?;
            let parts = parts.as_list()?;
            let mut rendered = Vec::with_capacity(parts.len());
            for part in parts {
                rendered.push(str_arg(method, part, "parts")?);
            }
            Ok(Value::from(rendered.join(s)))
        }
        "replace" => {
            check_arity(method, &positional, &keyword, 2, &[])?;
            let old = str_arg(method, &required_arg(method, &positional, 0, "old")?, "old")?;
            let new = str_arg(method, &required_arg(method, &positional, 1, "new")?, "new")?;
            Ok(Value::from(s.replace(old.as_str(), new.as_str())))
        }
        "starts_with" => {
            check_arity(method, &positional, &keyword, 1, &[])?;
            let prefix = required_arg(method, &positional, 0, "prefix")?;
            let prefix = str_arg(method, &prefix, "prefix")?;
            Ok(Value::Bool(s.starts_with(prefix.as_str())))
        }
        "ends_with" => {
            check_arity(method, &positional, &keyword, 1, &[])?;
            let suffix = required_arg(method, &positional, 0, "suffix")?;
            let suffix = str_arg(method, &suffix, "suffix")?;
            Ok(Value::Bool(s.ends_with(suffix.as_str())))
        }
        "find" => {
            check_arity(method, &positional, &keyword, 1, &[])?;
            let needle = required_arg(method, &positional, 0, "needle")?;
            let needle = str_arg(method, &needle, "needle")?;
            match s.find(needle.as_str()) {
                // Byte offset back to a character index
                Some(byte) => Ok(Value::Int(s[..byte].chars().count() as i64)),
                None => Ok(Value::Int(-1)),
            }
        }
        _ => Err(Error::UnknownMethod {
            target: "str".to_string(),
            method: method.to_string(),
        }),
    }
}

fn list_method(
    target: &Value,
    method: &str,
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
) -> Result<Value> {
    let xs = target.as_list()?;
    match method {
        "len" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::Int(xs.len() as i64))
        }
        "get" => {
            check_arity(method, &positional, &keyword, 1, &["default"])?;
            let i = required_arg(method, &positional, 0, "index")?.as_int()?;
            match resolve_index(i, xs.len()) {
                Ok(idx) => Ok(xs[idx].clone()),
                Err(err) => match keyword.get("default") {
                    Some(default) => Ok(default.clone()),
                    None => Err(err),
                },
            }
        }
        "reversed" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            let mut out = xs.to_vec();
            out.reverse();
            Ok(Value::list(out))
        }
        "sorted" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            let mut out = xs.to_vec();
            sort_values(&mut out)?;
            Ok(Value::list(out))
        }
        _ => Err(Error::UnknownMethod {
            target: "list".to_string(),
            method: method.to_string(),
        }),
    }
}

/// Fallible sort: `sort_by` cannot return early, so the first comparison
/// error is stashed and reported after the pass.
pub(crate) fn sort_values(values: &mut [Value]) -> Result<()> {
    let mut failed = None;
    values.sort_by(|a, b| match compare(a, b) {
        Ok(ord) => ord,
        Err(err) => {
            failed.get_or_insert(err);
            Ordering::Equal
        }
    });
    match failed {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn map_method(
    target: &Value,
    method: &str,
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
) -> Result<Value> {
    let m = target.as_map()?;
    match method {
        "len" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::Int(m.len() as i64))
        }
        "get" => {
            check_arity(method, &positional, &keyword, 2, &[])?;
            let key = required_arg(method, &positional, 0, "key")?.key()?;
            match m.get(&key) {
                Some(v) => Ok(v.clone()),
                None => Ok(positional.get(1).cloned().unwrap_or(Value::Unit)),
            }
        }
        "keys" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::list(
                m.keys().map(Key::to_value).collect::<Vec<_>>(),
            ))
        }
        "values" => {
            check_arity(method, &positional, &keyword, 0, &[])?;
            Ok(Value::list(m.values().cloned().collect::<Vec<_>>()))
        }
        _ => Err(Error::UnknownMethod {
            target: "map".to_string(),
            method: method.to_string(),
        }),
    }
}

// ============ Argument Helpers ============

fn check_arity(
    method: &str,
    positional: &[Value],
    keyword: &IndexMap<String, Value>,
    max_positional: usize,
    allowed_keywords: &[&str],
) -> Result<()> {
    if positional.len() > max_positional {
        return Err(Error::TooManyArguments {
            func: method.to_string(),
            expected: max_positional,
            got: positional.len(),
        });
    }
    for name in keyword.keys() {
        if !allowed_keywords.contains(&name.as_str()) {
            return Err(Error::UnknownArgument {
                func: method.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn required_arg(method: &str, positional: &[Value], index: usize, name: &str) -> Result<Value> {
    positional
        .get(index)
        .cloned()
        .ok_or_else(|| Error::MissingArgument {
            func: method.to_string(),
            name: name.to_string(),
        })
}

fn str_arg(method: &str, value: &Value, name: &str) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(Error::TypeError {
            expected: format!("a str for {method}({name}=...)"),
            got: other.type_name().to_string(),
        }),
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{It, Obj};

    fn run(expr: Expr, input: impl Into<Value>) -> Result<Value> {
        eval(&expr, &input.into())
    }

    #[test]
    fn division_always_floats() {
        assert_eq!(run(It.expr().div(2), 7).unwrap(), Value::Float(3.5));
        assert_eq!(run(It.expr().div(2), 8).unwrap(), Value::Float(4.0));
        assert_eq!(run(It.expr().div(0), 1), Err(Error::DivisionByZero));
        assert_eq!(run(It.expr().div(0.0), 1.0), Err(Error::DivisionByZero));
    }

    #[test]
    fn floor_div_and_mod_floor_toward_negative_infinity() {
        assert_eq!(run(It.expr().floordiv(3), -7).unwrap(), Value::Int(-3));
        assert_eq!(run(It.expr().floordiv(-3), 7).unwrap(), Value::Int(-3));
        assert_eq!(run(It.expr().rem(3), -7).unwrap(), Value::Int(2));
        assert_eq!(run(It.expr().rem(-3), 7).unwrap(), Value::Int(-2));
        assert_eq!(
            run(It.expr().floordiv(2.0), 7.0).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn pow_negative_exponent_leaves_the_integers() {
        assert_eq!(run(It.pow(3), 2).unwrap(), Value::Int(8));
        assert_eq!(run(It.pow(-1), 2).unwrap(), Value::Float(0.5));
        assert_eq!(run(It.pow(2), i64::MAX), Err(Error::Overflow));
    }

    #[test]
    fn sequence_operators() {
        assert_eq!(run(It + "b", "a").unwrap(), Value::from("ab"));
        assert_eq!(
            run(It * 2, vec![1i64, 2]).unwrap(),
            Value::from(vec![1i64, 2, 1, 2])
        );
        assert_eq!(run(It * -1, "xyz").unwrap(), Value::from(""));
    }

    #[test]
    fn dot_product_stays_integral_for_ints() {
        let input = Value::from(vec![1i64, 2, 3]);
        let weights = Value::from(vec![4i64, 5, 6]);
        assert_eq!(
            run(It.matmul(weights.clone()), input.clone()).unwrap(),
            Value::Int(32)
        );
        assert_eq!(
            run(It.matmul(Value::from(vec![0.5, 0.5, 0.5])), input).unwrap(),
            Value::Float(3.0)
        );
        assert!(matches!(
            run(It.matmul(Value::from(vec![1i64])), weights),
            Err(Error::TypeError { .. })
        ));
    }

    #[test]
    fn nan_comparisons_are_false() {
        assert_eq!(run(It.lt(1.0), f64::NAN).unwrap(), Value::Bool(false));
        assert_eq!(run(It.ge(1.0), f64::NAN).unwrap(), Value::Bool(false));
        assert_eq!(run(It.ne(f64::NAN), f64::NAN).unwrap(), Value::Bool(true));
    }

    #[test]
    fn attr_and_index_access() {
        let row = Value::map([("name", Value::from("ada")), ("age", Value::Int(36))]);
        assert_eq!(run(It.attr("name"), row.clone()).unwrap(), Value::from("ada"));
        assert_eq!(
            run(It.attr("missing"), row.clone()),
            Err(Error::UnknownAttribute {
                target: "map".to_string(),
                attribute: "missing".to_string(),
            })
        );
        assert_eq!(run(It.index(-1), vec![1i64, 2, 3]).unwrap(), Value::Int(3));
        assert_eq!(
            run(It.index(5), vec![1i64, 2]),
            Err(Error::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(run(It.index(1), "hé").unwrap(), Value::from("é"));
    }

    #[test]
    fn method_calls_dispatch_by_receiver() {
        assert_eq!(
            run(Obj.method("split", (" ",)), "a b").unwrap(),
            Value::from(vec!["a", "b"])
        );
        assert_eq!(run(Obj.method("len", ()), "héllo").unwrap(), Value::Int(5));
        assert_eq!(
            run(Obj.method("sorted", ()), vec![3i64, 1, 2]).unwrap(),
            Value::from(vec![1i64, 2, 3])
        );
        assert_eq!(
            run(Obj.method("upper", ("x",)), "a"),
            Err(Error::TooManyArguments {
                func: "upper".to_string(),
                expected: 0,
                got: 1,
            })
        );
        assert_eq!(
            run(Obj.method("length", ()), "a"),
            Err(Error::UnknownMethod {
                target: "str".to_string(),
                method: "length".to_string(),
            })
        );
    }

    #[test]
    fn list_get_with_default_keyword() {
        use crate::expr::Arg;
        let e = Obj.method(
            "get",
            vec![Arg::pos(9.into()), Arg::kw("default", (-1).into())],
        );
        assert_eq!(run(e, vec![1i64, 2]).unwrap(), Value::Int(-1));
    }
}
