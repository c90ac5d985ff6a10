//! List transformations
//!
//! Every entry returns a [`Curried`] with the data parameter last, so a
//! configured step drops straight into a pipe: `pipe | map_(It * It)`.
//! Callable configuration accepts anything convertible to a value, which
//! includes deferred expressions (compiled on conversion) and curried
//! functions.

use indexmap::{IndexMap, IndexSet};
use plumb::{Curried, Error, Key, Param, Value, compare, curry};

fn unary(name: &'static str, f: impl Fn(&Value) -> plumb::Result<Value> + 'static) -> Curried {
    curry(name, vec![Param::required("items")], move |values| {
        f(&values[0])
    })
}

fn configured(
    name: &'static str,
    f: impl Fn(&Value, &Value) -> plumb::Result<Value> + 'static,
) -> Curried {
    curry(
        name,
        vec![Param::required("f"), Param::required("items")],
        move |values| f(&values[0], &values[1]),
    )
}

/// Keep the items the predicate accepts.
pub fn filter_(pred: impl Into<Value>) -> Curried {
    configured("filter", |pred, items| {
        let mut out = Vec::new();
        for item in items.as_list()? {
            if pred.call(item.clone())?.truthy() {
                out.push(item.clone());
            }
        }
        Ok(Value::list(out))
    })
    .with(pred.into())
}

/// Apply `f` to every item.
pub fn map_(f: impl Into<Value>) -> Curried {
    configured("map", |f, items| {
        let items = items.as_list()?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(f.call(item.clone())?);
        }
        Ok(Value::list(out))
    })
    .with(f.into())
}

/// True when the predicate accepts every item. Empty lists pass.
pub fn all_(pred: impl Into<Value>) -> Curried {
    configured("all", |pred, items| {
        for item in items.as_list()? {
            if !pred.call(item.clone())?.truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    })
    .with(pred.into())
}

/// True when the predicate accepts at least one item.
pub fn any_(pred: impl Into<Value>) -> Curried {
    configured("any", |pred, items| {
        for item in items.as_list()? {
            if pred.call(item.clone())?.truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    })
    .with(pred.into())
}

/// First item the predicate accepts, or `None`.
pub fn find(pred: impl Into<Value>) -> Curried {
    configured("find", |pred, items| {
        for item in items.as_list()? {
            if pred.call(item.clone())?.truthy() {
                return Ok(item.clone());
            }
        }
        Ok(Value::Unit)
    })
    .with(pred.into())
}

/// First item, or `None` for an empty list.
pub fn first() -> Curried {
    unary("first", |items| {
        Ok(items.as_list()?.first().cloned().unwrap_or(Value::Unit))
    })
}

/// Last item, or `None` for an empty list.
pub fn last() -> Curried {
    unary("last", |items| {
        Ok(items.as_list()?.last().cloned().unwrap_or(Value::Unit))
    })
}

/// Deduplicate, keeping first occurrences in order. Items must be
/// hashable.
pub fn distinct() -> Curried {
    unary("distinct", |items| {
        let mut seen = IndexSet::new();
        let mut out = Vec::new();
        for item in items.as_list()? {
            if seen.insert(item.key()?) {
                out.push(item.clone());
            }
        }
        Ok(Value::list(out))
    })
}

/// Concatenate one level of nesting.
pub fn flatten() -> Curried {
    unary("flatten", |items| {
        let mut out = Vec::new();
        for item in items.as_list()? {
            let inner = item.as_list().map_err(|_| Error::TypeError {
                expected: "a list of lists".to_string(),
                got: item.type_name().to_string(),
            })?;
            out.extend(inner.iter().cloned());
        }
        Ok(Value::list(out))
    })
}

/// Skip the first `n` items.
pub fn drop(n: i64) -> Curried {
    curry(
        "drop",
        vec![Param::required("n"), Param::required("items")],
        |values| {
            let n = values[0].as_int()?.max(0) as usize;
            let items = values[1].as_list()?;
            Ok(Value::list(items.iter().skip(n).cloned().collect::<Vec<_>>()))
        },
    )
    .with(n)
}

/// Keep the first `n` items.
pub fn take(n: i64) -> Curried {
    curry(
        "take",
        vec![Param::required("n"), Param::required("items")],
        |values| {
            let n = values[0].as_int()?.max(0) as usize;
            let items = values[1].as_list()?;
            Ok(Value::list(items.iter().take(n).cloned().collect::<Vec<_>>()))
        },
    )
    .with(n)
}

/// Skip items while the predicate accepts them, then keep the rest.
pub fn drop_while(pred: impl Into<Value>) -> Curried {
    configured("drop_while", |pred, items| {
        let items = items.as_list()?;
        let mut out = Vec::new();
        let mut dropping = true;
        for item in items {
            if dropping && pred.call(item.clone())?.truthy() {
                continue;
            }
            dropping = false;
            out.push(item.clone());
        }
        Ok(Value::list(out))
    })
    .with(pred.into())
}

/// Keep items while the predicate accepts them, then stop.
pub fn take_while(pred: impl Into<Value>) -> Curried {
    configured("take_while", |pred, items| {
        let mut out = Vec::new();
        for item in items.as_list()? {
            if !pred.call(item.clone())?.truthy() {
                break;
            }
            out.push(item.clone());
        }
        Ok(Value::list(out))
    })
    .with(pred.into())
}

/// Left fold: `f` receives `(accumulator, item)`.
pub fn fold(f: impl Into<Value>, init: impl Into<Value>) -> Curried {
    curry(
        "fold",
        vec![
            Param::required("f"),
            Param::required("init"),
            Param::required("items"),
        ],
        |values| {
            let f = &values[0];
            let mut acc = values[1].clone();
            for item in values[2].as_list()? {
                acc = f.call((acc, item.clone()))?;
            }
            Ok(acc)
        },
    )
    .with((f.into(), init.into()))
}

/// Numeric sum. Stays integral until a float appears.
pub fn sum() -> Curried {
    unary("sum", |items| {
        let mut int_total = 0i64;
        let mut float_total = 0.0f64;
        let mut is_float = false;
        for item in items.as_list()? {
            match item {
                Value::Int(i) if !is_float => {
                    int_total = int_total.checked_add(*i).ok_or(Error::Overflow)?;
                }
                Value::Int(i) => float_total += *i as f64,
                Value::Float(f) => {
                    if !is_float {
                        is_float = true;
                        float_total = int_total as f64;
                    }
                    float_total += f;
                }
                other => {
                    return Err(Error::TypeError {
                        expected: "a list of numbers".to_string(),
                        got: other.type_name().to_string(),
                    });
                }
            }
        }
        Ok(if is_float {
            Value::Float(float_total)
        } else {
            Value::Int(int_total)
        })
    })
}

/// Group items by a key function. Keys must be hashable; groups keep
/// first-seen order.
pub fn group_by(key_fn: impl Into<Value>) -> Curried {
    configured("group_by", |key_fn, items| {
        let mut groups: IndexMap<Key, Vec<Value>> = IndexMap::new();
        for item in items.as_list()? {
            let key = key_fn.call(item.clone())?.key()?;
            groups.entry(key).or_default().push(item.clone());
        }
        Ok(Value::map(
            groups.into_iter().map(|(k, v)| (k, Value::list(v))),
        ))
    })
    .with(key_fn.into())
}

/// Render every item and join with a separator. Strings render bare,
/// everything else in display form.
pub fn join_to_str(sep: impl Into<String>) -> Curried {
    curry(
        "join_to_str",
        vec![Param::required("sep"), Param::required("items")],
        |values| {
            let sep = values[0].as_str()?;
            let mut parts = Vec::new();
            for item in values[1].as_list()? {
                parts.push(match item {
                    Value::Str(s) => s.to_string(),
                    other => other.to_string(),
                });
            }
            Ok(Value::from(parts.join(sep)))
        },
    )
    .with(Value::from(sep.into()))
}

fn slice_base() -> Curried {
    curry(
        "slice",
        vec![
            Param::required("start"),
            Param::required("stop"),
            Param::required("items"),
            Param::optional("step", 1).keyword_only(),
        ],
        |values| {
            let start = values[0].as_int()?;
            let stop = values[1].as_int()?;
            let items = values[2].as_list()?;
            let step = values[3].as_int()?;
            if step < 1 {
                return Err(Error::Other(format!(
                    "slice() step must be positive, got {step}"
                )));
            }
            let len = items.len() as i64;
            let start = start.clamp(0, len) as usize;
            let stop = stop.clamp(0, len) as usize;
            let mut out = Vec::new();
            let mut i = start;
            while i < stop {
                out.push(items[i].clone());
                i += step as usize;
            }
            Ok(Value::list(out))
        },
    )
}

/// Items in `start..stop`. Bounds clamp to the list.
pub fn slice_(start: i64, stop: i64) -> Curried {
    slice_base().with((start, stop))
}

/// Like [`slice_`], taking every `step`-th item.
pub fn slice_step(start: i64, stop: i64, step: i64) -> Curried {
    slice_base().with(plumb::Args::new().arg(start).arg(stop).kw("step", step))
}

/// Stable sort by a key function.
pub fn sorted_by(key_fn: impl Into<Value>) -> Curried {
    configured("sorted_by", |key_fn, items| {
        let items = items.as_list()?;
        let mut decorated = Vec::with_capacity(items.len());
        for item in items {
            decorated.push((key_fn.call(item.clone())?, item.clone()));
        }
        sort_decorated(&mut decorated)?;
        Ok(Value::list(
            decorated.into_iter().map(|(_, item)| item).collect::<Vec<_>>(),
        ))
    })
    .with(key_fn.into())
}

/// Sliding windows of `size` consecutive items. Only full windows are
/// produced.
pub fn windowed(size: i64) -> Curried {
    curry(
        "windowed",
        vec![Param::required("size"), Param::required("items")],
        |values| {
            let size = values[0].as_int()?;
            if size < 1 {
                return Err(Error::Other(format!(
                    "windowed() size must be positive, got {size}"
                )));
            }
            let items = values[1].as_list()?;
            let out: Vec<Value> = items
                .windows(size as usize)
                .map(|w| Value::list(w.to_vec()))
                .collect();
            Ok(Value::list(out))
        },
    )
    .with(size)
}

pub(crate) fn sort_decorated<T>(decorated: &mut [(Value, T)]) -> plumb::Result<()> {
    let mut failed = None;
    decorated.sort_by(|a, b| match compare(&a.0, &b.0) {
        Ok(ord) => ord,
        Err(err) => {
            failed.get_or_insert(err);
            std::cmp::Ordering::Equal
        }
    });
    match failed {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs

#[cfg(test)]
mod tests {
    use super::*;
    use plumb::It;

    fn nums() -> Value {
        Value::from(vec![3i64, 1, 4, 1, 5, 9, 2, 6])
    }

    #[test]
    fn map_and_filter_compose_with_expressions() {
        let doubled = map_(It * 2).call(nums()).unwrap();
        assert_eq!(doubled, Value::from(vec![6i64, 2, 8, 2, 10, 18, 4, 12]));

        let small = filter_(It.lt(4)).call(nums()).unwrap();
        assert_eq!(small, Value::from(vec![3i64, 1, 1, 2]));
    }

    #[test]
    fn quantifiers_short_circuit() {
        assert_eq!(all_(It.gt(0)).call(nums()).unwrap(), Value::Bool(true));
        assert_eq!(all_(It.gt(3)).call(nums()).unwrap(), Value::Bool(false));
        assert_eq!(any_(It.gt(8)).call(nums()).unwrap(), Value::Bool(true));
        assert_eq!(
            any_(It.gt(100)).call(Value::list(Vec::<Value>::new())).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn positional_selectors() {
        assert_eq!(first().call(nums()).unwrap(), Value::Int(3));
        assert_eq!(last().call(nums()).unwrap(), Value::Int(6));
        assert_eq!(
            first().call(Value::list(Vec::<Value>::new())).unwrap(),
            Value::Unit
        );
        assert_eq!(find(It.gt(4)).call(nums()).unwrap(), Value::Int(5));
        assert_eq!(find(It.gt(100)).call(nums()).unwrap(), Value::Unit);
    }

    #[test]
    fn slicing_and_windows() {
        assert_eq!(
            slice_(2, 5).call(nums()).unwrap(),
            Value::from(vec![4i64, 1, 5])
        );
        assert_eq!(
            slice_step(0, 6, 2).call(nums()).unwrap(),
            Value::from(vec![3i64, 4, 5])
        );
        assert_eq!(
            slice_(5, 100).call(nums()).unwrap(),
            Value::from(vec![9i64, 2, 6])
        );
        let windows = windowed(3).call(Value::from(vec![1i64, 2, 3, 4])).unwrap();
        assert_eq!(
            windows,
            Value::list(vec![
                Value::from(vec![1i64, 2, 3]),
                Value::from(vec![2i64, 3, 4]),
            ])
        );
    }

    #[test]
    fn fold_threads_the_accumulator() {
        let concat = plumb::Func::new("concat", |args: plumb::Args| {
            let mut out = String::new();
            for v in args.positional() {
                out.push_str(v.as_str()?);
            }
            Ok(Value::from(out))
        });
        let folded = fold(concat, "")
            .call(Value::from(vec!["a", "b", "c"]))
            .unwrap();
        assert_eq!(folded, Value::from("abc"));
    }

    #[test]
    fn group_by_keeps_first_seen_order() {
        let grouped = group_by(It % 3).call(nums()).unwrap();
        let m = grouped.as_map().unwrap();
        let keys: Vec<&Key> = m.keys().collect();
        assert_eq!(keys, vec![&Key::Int(0), &Key::Int(1), &Key::Int(2)]);
        assert_eq!(m[&Key::Int(1)], Value::from(vec![1i64, 4, 1]));
    }

    #[test]
    fn distinct_requires_hashable_items() {
        assert_eq!(
            distinct().call(nums()).unwrap(),
            Value::from(vec![3i64, 1, 4, 5, 9, 2, 6])
        );
        let nested = Value::list(vec![Value::from(vec![1i64])]);
        assert!(matches!(
            distinct().call(nested),
            Err(Error::TypeError { .. })
        ));
    }
}
