//! Map transformations
//!
//! Same shape as the list catalog: every entry returns a [`Curried`]
//! whose last parameter is the mapping.

use plumb::{Curried, Key, Param, Value, curry};

use crate::iterables::sort_decorated;

fn unary(name: &'static str, f: impl Fn(&Value) -> plumb::Result<Value> + 'static) -> Curried {
    curry(name, vec![Param::required("mapping")], move |values| {
        f(&values[0])
    })
}

/// `[key, value]` pairs in entry order.
pub fn item_view() -> Curried {
    unary("item_view", |mapping| {
        Ok(Value::list(
            mapping
                .as_map()?
                .iter()
                .map(|(k, v)| Value::list([k.to_value(), v.clone()]))
                .collect::<Vec<_>>(),
        ))
    })
}

/// Keys in entry order.
pub fn key_view() -> Curried {
    unary("key_view", |mapping| {
        Ok(Value::list(
            mapping.as_map()?.keys().map(Key::to_value).collect::<Vec<_>>(),
        ))
    })
}

/// Values in entry order.
pub fn value_view() -> Curried {
    unary("value_view", |mapping| {
        Ok(Value::list(
            mapping.as_map()?.values().cloned().collect::<Vec<_>>(),
        ))
    })
}

/// Entries reordered by ascending key.
pub fn sorted_dict() -> Curried {
    unary("sorted_dict", |mapping| {
        let mut decorated: Vec<(Value, (Key, Value))> = mapping
            .as_map()?
            .iter()
            .map(|(k, v)| (k.to_value(), (k.clone(), v.clone())))
            .collect();
        sort_decorated(&mut decorated)?;
        Ok(Value::map(decorated.into_iter().map(|(_, entry)| entry)))
    })
}

/// Entries reordered by a function of the key.
pub fn sorted_by_key(f: impl Into<Value>) -> Curried {
    curry(
        "sorted_by_key",
        vec![Param::required("f"), Param::required("mapping")],
        |values| {
            let f = &values[0];
            let mut decorated: Vec<(Value, (Key, Value))> = Vec::new();
            for (k, v) in values[1].as_map()? {
                decorated.push((f.call(k.to_value())?, (k.clone(), v.clone())));
            }
            sort_decorated(&mut decorated)?;
            Ok(Value::map(decorated.into_iter().map(|(_, entry)| entry)))
        },
    )
    .with(f.into())
}

/// Entries reordered by a function of the value.
pub fn sorted_by_value(f: impl Into<Value>) -> Curried {
    curry(
        "sorted_by_value",
        vec![Param::required("f"), Param::required("mapping")],
        |values| {
            let f = &values[0];
            let mut decorated: Vec<(Value, (Key, Value))> = Vec::new();
            for (k, v) in values[1].as_map()? {
                decorated.push((f.call(v.clone())?, (k.clone(), v.clone())));
            }
            sort_decorated(&mut decorated)?;
            Ok(Value::map(decorated.into_iter().map(|(_, entry)| entry)))
        },
    )
    .with(f.into())
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs
