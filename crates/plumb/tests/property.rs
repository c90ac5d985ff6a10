//! Property tests for operator semantics, call splitting, and pipe
//! error-state invariance.

use plumb::{Args, Curried, Error, It, Param, Pipe, Value, curry};
use proptest::prelude::*;

fn small_int() -> impl Strategy<Value = i64> {
    -1000i64..1000
}

fn nonzero_int() -> impl Strategy<Value = i64> {
    prop_oneof![-1000i64..0, 1i64..1000]
}

fn weighted() -> Curried {
    curry(
        "weighted",
        vec![
            Param::required("x"),
            Param::required("y"),
            Param::required("z"),
        ],
        |values| {
            let x = values[0].as_int()?;
            let y = values[1].as_int()?;
            let z = values[2].as_int()?;
            // Place-value encoding keeps argument order observable
            Ok(Value::Int(x * 1_000_000 + y * 1_000 + z))
        },
    )
}

fn call_chain(f: &Curried, groups: &[&[i64]]) -> Value {
    let mut current = Value::Func(f.clone().into_func());
    for group in groups {
        let mut args = Args::new();
        for v in *group {
            args = args.arg(*v);
        }
        current = current.call(args).unwrap();
    }
    current
}

proptest! {
    #[test]
    fn floored_division_identity(a in small_int(), b in nonzero_int()) {
        let q = It.floordiv(b).compile().call(a).unwrap().as_int().unwrap();
        let r = (It % b).compile().call(a).unwrap().as_int().unwrap();
        prop_assert_eq!(q * b + r, a);
        // Remainder takes the divisor's sign
        prop_assert!(r == 0 || (r < 0) == (b < 0));
    }

    #[test]
    fn true_division_always_floats(a in small_int(), b in nonzero_int()) {
        let out = (It / b).compile().call(a).unwrap();
        prop_assert!(matches!(out, Value::Float(_)));
    }

    #[test]
    fn arithmetic_errors_are_reported_not_wrapped(a in small_int()) {
        prop_assert_eq!((It / 0).compile().call(a), Err(Error::DivisionByZero));
        prop_assert_eq!(It.floordiv(0).compile().call(a), Err(Error::DivisionByZero));
        prop_assert_eq!((It % 0).compile().call(a), Err(Error::DivisionByZero));
        prop_assert_eq!(
            (It + i64::MAX).compile().call(a.abs() + 1),
            Err(Error::Overflow)
        );
    }

    #[test]
    fn relational_builders_match_native_ordering(a in small_int(), b in small_int()) {
        prop_assert_eq!(It.lt(b).compile().call(a).unwrap(), Value::Bool(a < b));
        prop_assert_eq!(It.le(b).compile().call(a).unwrap(), Value::Bool(a <= b));
        prop_assert_eq!(It.gt(b).compile().call(a).unwrap(), Value::Bool(a > b));
        prop_assert_eq!(It.ge(b).compile().call(a).unwrap(), Value::Bool(a >= b));
        prop_assert_eq!(It.eq(b).compile().call(a).unwrap(), Value::Bool(a == b));
        prop_assert_eq!(It.ne(b).compile().call(a).unwrap(), Value::Bool(a != b));
    }

    #[test]
    fn call_splitting_never_changes_the_result(
        a in small_int(),
        b in small_int(),
        c in small_int(),
        split in 0usize..3,
    ) {
        let f = weighted();
        let whole = f.call((a, b, c)).unwrap();
        let pieces = match split {
            0 => call_chain(&f, &[&[a], &[b], &[c]]),
            1 => call_chain(&f, &[&[a, b], &[c]]),
            _ => call_chain(&f, &[&[a], &[b, c]]),
        };
        prop_assert_eq!(whole, pieces);
    }

    #[test]
    fn failed_pipes_ignore_any_number_of_steps(extra_steps in 0usize..8) {
        let mut pipe = Pipe::new(1) | (It / 0);
        let failure = pipe.clone().get().unwrap_err();
        for _ in 0..extra_steps {
            pipe = pipe | (It + 1);
        }
        prop_assert_eq!(pipe.get().unwrap_err(), failure);
    }

    #[test]
    fn string_repetition_length(n in 0i64..50) {
        let out = (It * n).compile().call("ab").unwrap();
        prop_assert_eq!(out.as_str().unwrap().len(), (n as usize) * 2);
    }
}
