//! Curried callables
//!
//! A [`Curried`] pairs a target function with an explicit parameter list
//! and accumulates arguments across calls. Each call merges its bundle
//! into the bound set; once every declared parameter is bound, the target
//! is invoked exactly once and its result returned. Until then each call
//! yields a fresh partially-applied callable and leaves the receiver
//! untouched.
//!
//! Defaults are applied after the first call merges its arguments:
//! parameters still unbound at that point take their declared default.
//! A keyword in a later call that targets a defaulted parameter is
//! therefore a duplicate. Supply overrides in the first call (or bind
//! the parameter positionally before its default lands) when the default
//! should not stick.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::value::{Args, Func, Value};
use crate::{Error, Result};

// ============ Parameter Declarations ============

/// One declared parameter of a curried function.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    default: Option<Value>,
    keyword_only: bool,
}

impl Param {
    /// A required positional-or-keyword parameter.
    pub fn required(name: impl Into<String>) -> Param {
        Param {
            name: name.into(),
            default: None,
            keyword_only: false,
        }
    }

    /// An optional parameter with a default.
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Param {
        Param {
            name: name.into(),
            default: Some(default.into()),
            keyword_only: false,
        }
    }

    /// Restrict this parameter to keyword binding.
    pub fn keyword_only(mut self) -> Param {
        self.keyword_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A validated parameter list.
#[derive(Debug, Clone)]
pub struct Signature {
    params: Vec<Param>,
    collect_extra_keywords: bool,
}

impl Signature {
    /// Panics on a malformed declaration: duplicate names, a required
    /// positional parameter after an optional one, or a positional
    /// parameter after a keyword-only one. These are programmer errors
    /// in the declaration itself, not call-time usage errors.
    pub fn new(params: impl IntoIterator<Item = Param>) -> Signature {
        let params: Vec<Param> = params.into_iter().collect();
        let mut seen_optional = false;
        let mut seen_keyword_only = false;
        for (i, param) in params.iter().enumerate() {
            assert!(
                !params[..i].iter().any(|p| p.name == param.name),
                "duplicate parameter name {:?}",
                param.name
            );
            if param.keyword_only {
                seen_keyword_only = true;
            } else {
                assert!(
                    !seen_keyword_only,
                    "positional parameter {:?} after a keyword-only parameter",
                    param.name
                );
                if param.default.is_some() {
                    seen_optional = true;
                } else {
                    assert!(
                        !seen_optional,
                        "required parameter {:?} after an optional parameter",
                        param.name
                    );
                }
            }
        }
        Signature {
            params,
            collect_extra_keywords: false,
        }
    }

    /// Also gather keyword arguments that match no declared parameter,
    /// handing them to the target as an extras map.
    pub fn collecting_extra_keywords(mut self) -> Signature {
        self.collect_extra_keywords = true;
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    fn positional_capacity(&self) -> usize {
        self.params.iter().take_while(|p| !p.keyword_only).count()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

// ============ Curried State ============

type Target = dyn Fn(&[Value], &IndexMap<String, Value>) -> Result<Value>;

/// A partially-applied function. Immutable: calling it never changes the
/// receiver, so one partial application can fan out into many.
#[derive(Clone)]
pub struct Curried {
    name: Rc<str>,
    signature: Rc<Signature>,
    target: Rc<Target>,
    slots: Vec<Option<Value>>,
    extras: IndexMap<String, Value>,
    defaults_applied: bool,
}

/// Declare a curried function. The target receives the bound values in
/// declaration order once every parameter is bound.
pub fn curry(
    name: impl Into<Rc<str>>,
    params: impl IntoIterator<Item = Param>,
    f: impl Fn(&[Value]) -> Result<Value> + 'static,
) -> Curried {
    Curried::new(name, Signature::new(params), move |values, _extras| f(values))
}

/// Declare a curried function that also collects unmatched keyword
/// arguments into an extras map.
pub fn curry_with_keywords(
    name: impl Into<Rc<str>>,
    params: impl IntoIterator<Item = Param>,
    f: impl Fn(&[Value], &IndexMap<String, Value>) -> Result<Value> + 'static,
) -> Curried {
    Curried::new(
        name,
        Signature::new(params).collecting_extra_keywords(),
        f,
    )
}

impl Curried {
    pub fn new(
        name: impl Into<Rc<str>>,
        signature: Signature,
        target: impl Fn(&[Value], &IndexMap<String, Value>) -> Result<Value> + 'static,
    ) -> Curried {
        let slots = vec![None; signature.params.len()];
        Curried {
            name: name.into(),
            signature: Rc::new(signature),
            target: Rc::new(target),
            slots,
            extras: IndexMap::new(),
            defaults_applied: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters currently bound.
    pub fn bound(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Bind arguments at composition time, keeping the result a
    /// `Curried`.
    ///
    /// Panics when the bundle misuses the signature or binds the last
    /// free parameter; both are programmer errors when a pipeline is
    /// being assembled. Run-time binding goes through
    /// [`call`](Curried::call), which reports the same conditions as
    /// errors and invokes on saturation.
    pub fn with(&self, args: impl Into<Args>) -> Curried {
        let next = self
            .merge(args.into())
            .expect("argument bundle must fit the declared signature");
        assert!(
            next.slots.iter().any(Option::is_none),
            "with() must leave at least one parameter free"
        );
        next
    }

    /// Merge one argument bundle and either invoke (if that bound the
    /// last parameter) or return the next partial application as a
    /// callable value.
    pub fn call(&self, args: impl Into<Args>) -> Result<Value> {
        let next = self.merge(args.into())?;
        if next.slots.iter().all(Option::is_some) {
            let values: Vec<Value> = next.slots.into_iter().flatten().collect();
            debug!(
                "{}: all {} parameters bound, invoking",
                next.name,
                values.len()
            );
            (next.target)(&values, &next.extras)
        } else {
            trace!(
                "{}: {}/{} parameters bound",
                next.name,
                next.bound(),
                next.arity()
            );
            Ok(Value::Func(next.into_func()))
        }
    }

    /// Rebind this state plus one new bundle into a fresh state.
    ///
    /// Rebinding replays everything from scratch: the contiguous bound
    /// prefix of positional-or-keyword parameters is reconstructed as
    /// positionals, new positionals append to it, and every other bound
    /// value is re-applied as a keyword ahead of the new keywords. A new
    /// keyword that lands on an already-bound slot is a duplicate.
    fn merge(&self, args: Args) -> Result<Curried> {
        let (new_positional, new_keyword) = args.into_parts();
        let signature = &self.signature;

        let mut positional = Vec::new();
        let mut rest = 0;
        while rest < signature.positional_capacity() {
            match &self.slots[rest] {
                Some(v) => positional.push(v.clone()),
                None => break,
            }
            rest += 1;
        }
        positional.extend(new_positional);

        if positional.len() > signature.positional_capacity() {
            return Err(Error::TooManyArguments {
                func: self.name.to_string(),
                expected: signature.positional_capacity(),
                got: positional.len(),
            });
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.slots.len()];
        for (i, value) in positional.into_iter().enumerate() {
            slots[i] = Some(value);
        }

        let mut extras = IndexMap::new();
        let replayed = self.slots[rest..]
            .iter()
            .enumerate()
            .filter_map(|(offset, slot)| {
                let value = slot.clone()?;
                Some((signature.params[rest + offset].name.clone(), value))
            });
        let replayed_extras = self.extras.iter().map(|(k, v)| (k.clone(), v.clone()));
        for (name, value) in replayed.chain(replayed_extras).chain(new_keyword) {
            match signature.position_of(&name) {
                Some(i) => {
                    if slots[i].is_some() {
                        return Err(Error::DuplicateArgument {
                            func: self.name.to_string(),
                            name,
                        });
                    }
                    slots[i] = Some(value);
                }
                None if signature.collect_extra_keywords => {
                    if extras.insert(name.clone(), value).is_some() {
                        return Err(Error::DuplicateArgument {
                            func: self.name.to_string(),
                            name,
                        });
                    }
                }
                None => {
                    return Err(Error::UnknownArgument {
                        func: self.name.to_string(),
                        name,
                    });
                }
            }
        }

        let mut next = Curried {
            name: Rc::clone(&self.name),
            signature: Rc::clone(signature),
            target: Rc::clone(&self.target),
            slots,
            extras,
            defaults_applied: self.defaults_applied,
        };
        if !next.defaults_applied {
            for (slot, param) in next.slots.iter_mut().zip(&next.signature.params) {
                if slot.is_none() {
                    *slot = param.default.clone();
                }
            }
            next.defaults_applied = true;
        }
        Ok(next)
    }

    pub fn into_func(self) -> Func {
        let name = Rc::clone(&self.name);
        Func::new(name, move |args: Args| self.call(args))
    }
}

impl fmt::Debug for Curried {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<curried {} ({}/{} bound)>",
            self.name,
            self.bound(),
            self.arity()
        )
    }
}

impl From<Curried> for Func {
    fn from(curried: Curried) -> Func {
        curried.into_func()
    }
}

impl From<Curried> for Value {
    fn from(curried: Curried) -> Value {
        Value::Func(curried.into_func())
    }
}

// ============ Application Chains ============

/// The running result of a `>>` application chain. Feeding a value into
/// a callable result applies it; feeding one into a non-callable or an
/// already-failed chain carries the error through.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied(pub Result<Value>);

impl Applied {
    pub fn finish(self) -> Result<Value> {
        self.0
    }
}

impl<V: Into<Value>> std::ops::Shr<V> for Curried {
    type Output = Applied;

    fn shr(self, value: V) -> Applied {
        Applied(self.call(value.into()))
    }
}

impl<V: Into<Value>> std::ops::Shr<V> for Applied {
    type Output = Applied;

    fn shr(self, value: V) -> Applied {
        match self.0 {
            Ok(callable) => Applied(callable.call(value.into())),
            err => Applied(err),
        }
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs

#[cfg(test)]
mod tests {
    use super::*;

    fn concat3() -> Curried {
        curry(
            "concat3",
            vec![
                Param::required("x"),
                Param::required("y"),
                Param::required("z"),
            ],
            |values| {
                let mut out = String::new();
                for v in values {
                    out.push_str(v.as_str()?);
                }
                Ok(Value::from(out))
            },
        )
    }

    fn concat3_default() -> Curried {
        curry(
            "concat3",
            vec![
                Param::required("x"),
                Param::required("y"),
                Param::optional("z", "X"),
            ],
            |values| {
                let mut out = String::new();
                for v in values {
                    out.push_str(v.as_str()?);
                }
                Ok(Value::from(out))
            },
        )
    }

    fn unwrap_func(value: Value) -> Func {
        match value {
            Value::Func(f) => f,
            other => panic!("expected a partial application, got {other}"),
        }
    }

    #[test]
    fn saturation_invokes_once() {
        let f = concat3();
        assert_eq!(f.call(("a", "b", "c")).unwrap(), Value::from("abc"));
    }

    #[test]
    fn keyword_first_then_positionals() {
        let f = concat3();
        let step = unwrap_func(f.call(Args::new().kw("z", "a")).unwrap());
        let step = unwrap_func(step.call("b").unwrap());
        assert_eq!(step.call("c").unwrap(), Value::from("bca"));
    }

    #[test]
    fn keywords_out_of_order() {
        let f = concat3();
        let step = unwrap_func(f.call(Args::new().kw("y", "a")).unwrap());
        let step = unwrap_func(step.call(Args::new().kw("x", "b")).unwrap());
        assert_eq!(step.call("c").unwrap(), Value::from("bac"));
    }

    #[test]
    fn defaults_bake_on_first_call() {
        let f = concat3_default();
        // z took its default when the first call merged
        let step = unwrap_func(f.call("a").unwrap());
        assert_eq!(step.call("b").unwrap(), Value::from("abX"));

        // A later keyword override of the baked default is a duplicate
        let step = unwrap_func(f.call("a").unwrap());
        assert_eq!(
            step.call(Args::new().kw("z", "Z")),
            Err(Error::DuplicateArgument {
                func: "concat3".to_string(),
                name: "z".to_string(),
            })
        );

        // First-call overrides still work
        assert_eq!(
            f.call(Args::new().arg("a").arg("b").kw("z", "Z")).unwrap(),
            Value::from("abZ")
        );
    }

    #[test]
    fn duplicate_and_unknown_keywords_are_usage_errors() {
        let f = concat3();
        let step = unwrap_func(f.call("a").unwrap());
        assert_eq!(
            step.call(Args::new().kw("x", "b")),
            Err(Error::DuplicateArgument {
                func: "concat3".to_string(),
                name: "x".to_string(),
            })
        );
        assert_eq!(
            f.call(Args::new().kw("w", "b")),
            Err(Error::UnknownArgument {
                func: "concat3".to_string(),
                name: "w".to_string(),
            })
        );
        assert_eq!(
            f.call(("a", "b", "c", "d")),
            Err(Error::TooManyArguments {
                func: "concat3".to_string(),
                expected: 3,
                got: 4,
            })
        );
    }

    #[test]
    fn partial_application_leaves_receiver_untouched() {
        let f = concat3();
        let _ = f.call("a").unwrap();
        assert_eq!(f.bound(), 0);
        assert_eq!(f.call(("x", "y", "z")).unwrap(), Value::from("xyz"));
    }

    #[test]
    fn shr_chains_apply_one_value_at_a_time() {
        let f = concat3();
        assert_eq!(
            (f >> "a" >> "b" >> "c").finish().unwrap(),
            Value::from("abc")
        );
        // Feeding a value into the final (non-callable) result fails
        let f = concat3();
        let over = f >> "a" >> "b" >> "c" >> "d";
        assert!(matches!(over.finish(), Err(Error::TypeError { .. })));
    }

    #[test]
    fn keyword_only_params_reject_positional_binding() {
        let f = curry(
            "tag",
            vec![
                Param::required("value"),
                Param::optional("label", "none").keyword_only(),
            ],
            |values| Ok(Value::from(format!("{}:{}", values[1].as_str()?, values[0]))),
        );
        assert_eq!(f.call(1).unwrap(), Value::from("none:1"));
        assert_eq!(
            f.call((1, 2)),
            Err(Error::TooManyArguments {
                func: "tag".to_string(),
                expected: 1,
                got: 2,
            })
        );
        assert_eq!(
            f.call(Args::new().arg(1).kw("label", "n")).unwrap(),
            Value::from("n:1")
        );
    }

    #[test]
    fn extras_are_collected_but_never_block_saturation() {
        let f = curry_with_keywords(
            "render",
            vec![Param::required("value")],
            |values, extras| {
                let mut out = values[0].to_string();
                for (k, v) in extras {
                    out.push_str(&format!(" {}={}", k, v.as_str()?));
                }
                Ok(Value::from(out))
            },
        );
        assert_eq!(
            f.call(Args::new().arg(1).kw("unit", "ms")).unwrap(),
            Value::from("1 unit=ms")
        );
        // Extras alone do not saturate
        let step = unwrap_func(f.call(Args::new().kw("unit", "ms")).unwrap());
        assert_eq!(step.call(7).unwrap(), Value::from("7 unit=ms"));
    }

    #[test]
    fn with_binds_without_invoking() {
        let f = concat3();
        let bound = f.with(("a", "b"));
        assert_eq!(bound.bound(), 2);
        assert_eq!(bound.call("c").unwrap(), Value::from("abc"));
        assert_eq!(f.bound(), 0);
    }

    #[test]
    #[should_panic(expected = "leave at least one parameter free")]
    fn with_rejects_saturation() {
        concat3().with(("a", "b", "c"));
    }

    #[test]
    #[should_panic(expected = "duplicate parameter name")]
    fn signature_rejects_duplicate_names() {
        Signature::new(vec![Param::required("x"), Param::required("x")]);
    }
}
