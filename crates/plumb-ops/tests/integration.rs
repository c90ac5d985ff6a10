//! Black-box integration tests for the step catalog
//!
//! Pipelines here combine catalog entries with core pipes, expressions,
//! and curried functions exactly the way downstream code would.

use plumb::{Args, Error, ErrorKind, It, Key, Obj, P, Param, Pipe, Value, curry};
use plumb_ops::iterables::{
    distinct, drop, filter_, find, first, flatten, fold, group_by, join_to_str, map_, slice_,
    sorted_by, sum, take, take_while, windowed,
};
use plumb_ops::mappings::{key_view, sorted_by_value, value_view};
use plumb_ops::values::{clamp, is_even, is_odd, not_, raise_};

fn nums() -> Value {
    Value::from(vec![1i64, 2, 3, 4, 5, 6])
}

// ============ List Pipelines ============

#[test]
fn squares_then_sum() {
    let total = (P >> Value::from(vec![1i64, 2, 3]) | map_(It * It) | sum())
        .get()
        .unwrap();
    assert_eq!(total, Value::Int(14));
}

#[test]
fn filter_map_reduce() {
    let out = (P >> nums()
        | filter_(is_even())
        | map_(It * 10)
        | fold(
            curry(
                "add",
                vec![Param::required("a"), Param::required("b")],
                |values| Ok(Value::Int(values[0].as_int()? + values[1].as_int()?)),
            ),
            0,
        ))
    .get()
    .unwrap();
    assert_eq!(out, Value::Int(120));
}

#[test]
fn windowed_sums_nest_catalog_entries() {
    // sum() is itself a one-argument curried function, so it can serve
    // as the mapper over each window
    let out = (P >> nums() | windowed(2) | map_(sum())).get().unwrap();
    assert_eq!(out, Value::from(vec![3i64, 5, 7, 9, 11]));
}

#[test]
fn take_drop_slice_sections() {
    assert_eq!(
        take(3).call(nums()).unwrap(),
        Value::from(vec![1i64, 2, 3])
    );
    assert_eq!(
        drop(4).call(nums()).unwrap(),
        Value::from(vec![5i64, 6])
    );
    assert_eq!(
        slice_(1, 4).call(nums()).unwrap(),
        Value::from(vec![2i64, 3, 4])
    );
    assert_eq!(
        take_while(It.lt(4)).call(nums()).unwrap(),
        Value::from(vec![1i64, 2, 3])
    );
}

#[test]
fn flatten_then_distinct() {
    let nested = Value::list(vec![
        Value::from(vec![1i64, 2]),
        Value::from(vec![2i64, 3]),
        Value::from(vec![3i64, 1]),
    ]);
    let out = (P >> nested | flatten() | distinct()).get().unwrap();
    assert_eq!(out, Value::from(vec![1i64, 2, 3]));
}

#[test]
fn group_by_length() {
    let words = Value::from(vec!["to", "be", "or", "not", "was"]);
    let grouped = group_by(Obj.method("len", ())).call(words).unwrap();
    let m = grouped.as_map().unwrap();
    assert_eq!(m[&Key::Int(2)], Value::from(vec!["to", "be", "or"]));
    assert_eq!(m[&Key::Int(3)], Value::from(vec!["not", "was"]));
}

#[test]
fn sorted_by_key_function() {
    let words = Value::from(vec!["ccc", "a", "bb"]);
    let out = sorted_by(Obj.method("len", ())).call(words).unwrap();
    assert_eq!(out, Value::from(vec!["a", "bb", "ccc"]));
}

#[test]
fn join_renders_mixed_items() {
    let mixed = Value::list(vec![Value::from("x"), Value::Int(1), Value::Bool(true)]);
    assert_eq!(
        join_to_str(", ").call(mixed).unwrap(),
        Value::from("x, 1, True")
    );
}

#[test]
fn find_or_unit() {
    assert_eq!(find(It.gt(4)).call(nums()).unwrap(), Value::Int(5));
    assert_eq!(find(It.gt(100)).call(nums()).unwrap(), Value::Unit);
    assert_eq!(first().call(nums()).unwrap(), Value::Int(1));
}

// ============ Map Pipelines ============

#[test]
fn map_views_chain_into_list_steps() {
    let inventory = Value::map([("hammers", 3i64), ("nails", 150), ("saws", 2)]);
    let total = (P >> inventory.clone() | value_view() | sum()).get().unwrap();
    assert_eq!(total, Value::Int(155));

    let heaviest = (P >> inventory | sorted_by_value(It.expr()) | key_view())
        .then(|keys| Ok(keys.as_list()?.last().cloned().unwrap_or(Value::Unit)))
        .get()
        .unwrap();
    assert_eq!(heaviest, Value::from("nails"));
}

// ============ Value Steps ============

#[test]
fn scalar_steps_in_pipes() {
    let out = (P >> 17 | clamp(0, 10) | not_()).get().unwrap();
    assert_eq!(out, Value::Bool(false));

    let out = (P >> -3 | clamp(0, 10)).get().unwrap();
    assert_eq!(out, Value::Int(0));
}

#[test]
fn raise_marks_unreachable_branches() {
    let failed = P >> nums() | filter_(It.gt(100)) | first() | raise_("no data expected");
    // raise_ always fails; the pipeline stops there
    let failure = failed.get().unwrap_err();
    assert_eq!(
        failure.error(),
        &Error::Other("no data expected".to_string())
    );
}

#[test]
fn step_errors_surface_and_catch_by_kind() {
    let failed = P >> nums() | (It + 1);
    // Lists do not add to ints
    assert_eq!(
        failed.get().unwrap_err().error().kind(),
        ErrorKind::UnsupportedOperand
    );

    let recovered = (P >> Value::from("oops") | sum())
        .catch(ErrorKind::TypeError, |_| Ok(Value::Int(0)))
        .get()
        .unwrap();
    assert_eq!(recovered, Value::Int(0));
}

// ============ Override Surface ============

#[test]
fn overrides_expose_plain_names() {
    use plumb_ops::overrides::{all, filter, map, slice};

    let out = (P >> nums() | filter(is_odd()) | map(It * It) | slice(0, 2))
        .get()
        .unwrap();
    assert_eq!(out, Value::from(vec![1i64, 9]));

    assert_eq!(
        all(It.gt(0)).call(nums()).unwrap(),
        Value::Bool(true)
    );
}

// ============ Currying Interop ============

#[test]
fn catalog_entries_saturate_like_any_curried() {
    // take is (n, items); bind n, then feed items in a second call
    let head = take(2);
    assert_eq!(head.call(nums()).unwrap(), Value::from(vec![1i64, 2]));

    // Or skip the helper and bind both at once through the raw signature
    let spread = Args::new().arg(Value::from(vec![9i64, 8, 7]));
    assert_eq!(head.call(spread).unwrap(), Value::from(vec![9i64, 8]));
}

#[test]
fn configured_step_reuse() {
    let evens = filter_(is_even());
    let a = (Pipe::new(nums()) | evens.clone()).get().unwrap();
    let b = (Pipe::new(Value::from(vec![7i64, 8])) | evens).get().unwrap();
    assert_eq!(a, Value::from(vec![2i64, 4, 6]));
    assert_eq!(b, Value::from(vec![8i64]));
}
