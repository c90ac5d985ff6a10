//! Dynamic runtime values
//!
//! Every callable in the toolkit takes and returns [`Value`]s. Strings,
//! lists, and maps are reference-counted and immutable, so cloning a value
//! is cheap and pipes never deep-copy what they hold.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::{Error, Result};

// ============ Value ============

/// A runtime value.
///
/// `Value` is deliberately not `Send`/`Sync`: the toolkit is synchronous
/// and single-threaded, and sharing goes through `Rc`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    Map(Rc<IndexMap<Key, Value>>),
    Func(Func),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Func(_) => "func",
        }
    }

    /// Build a list value from anything convertible.
    pub fn list<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map value from key/value pairs, preserving insertion order.
    pub fn map<I, K, V>(pairs: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        Value::Map(Rc::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Truthiness: zero, empty, `Unit`, and `false` are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Unit => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Func(_) => true,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(type_error("bool", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(type_error("int", other)),
        }
    }

    /// Numeric accessor; `Int` coerces to `Float`.
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(type_error("float", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(type_error("str", other)),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(type_error("list", other)),
        }
    }

    pub fn as_map(&self) -> Result<&IndexMap<Key, Value>> {
        match self {
            Value::Map(entries) => Ok(entries),
            other => Err(type_error("map", other)),
        }
    }

    pub fn as_func(&self) -> Result<&Func> {
        match self {
            Value::Func(f) => Ok(f),
            other => Err(type_error("a callable", other)),
        }
    }

    pub fn into_func(self) -> Result<Func> {
        match self {
            Value::Func(f) => Ok(f),
            other => Err(type_error("a callable", &other)),
        }
    }

    /// Invoke this value as a function. Non-callables are a type error,
    /// which is how using a still-partial curried result goes wrong.
    pub fn call(&self, args: impl Into<Args>) -> Result<Value> {
        match self {
            Value::Func(f) => f.call(args),
            other => Err(type_error("a callable", other)),
        }
    }

    /// Hashable projection for use as a map key.
    pub fn key(&self) -> Result<Key> {
        match self {
            Value::Unit => Ok(Key::Unit),
            Value::Bool(b) => Ok(Key::Bool(*b)),
            Value::Int(i) => Ok(Key::Int(*i)),
            Value::Str(s) => Ok(Key::Str(Rc::clone(s))),
            other => Err(Error::TypeError {
                expected: "a hashable value".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }
}

pub(crate) fn type_error(expected: &str, got: &Value) -> Error {
    Error::TypeError {
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

// ============ Conversions ============

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(Rc::from(s))
    }
}

impl From<Func> for Value {
    fn from(f: Func) -> Value {
        Value::Func(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::list(items)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Value {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Value {
        match opt {
            Some(v) => v.into(),
            None => Value::Unit,
        }
    }
}

impl From<IndexMap<Key, Value>> for Value {
    fn from(entries: IndexMap<Key, Value>) -> Value {
        Value::Map(Rc::new(entries))
    }
}

// ============ Keys ============

/// The hashable subset of [`Value`], used for map keys and grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Unit,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
}

impl Key {
    pub fn type_name(&self) -> &'static str {
        match self {
            Key::Unit => "None",
            Key::Bool(_) => "bool",
            Key::Int(_) => "int",
            Key::Str(_) => "str",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Unit => Value::Unit,
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Str(s) => Value::Str(Rc::clone(s)),
        }
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Key {
        Key::Bool(b)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Key {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Key {
        Key::Int(i64::from(i))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Key {
        Key::Str(Rc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Key {
        Key::Str(Rc::from(s))
    }
}

// ============ Callables ============

/// A named callable over dynamic values.
///
/// Compiled expressions and curried descriptors both convert into `Func`,
/// which is what makes callables first-class values. Equality is identity:
/// two funcs compare equal only if they share the same closure.
#[derive(Clone)]
pub struct Func {
    name: Rc<str>,
    f: Rc<dyn Fn(Args) -> Result<Value>>,
}

impl Func {
    pub fn new(name: impl Into<Rc<str>>, f: impl Fn(Args) -> Result<Value> + 'static) -> Func {
        Func {
            name: name.into(),
            f: Rc::new(f),
        }
    }

    /// Wrap a single-argument function; keyword or extra positional
    /// arguments are a usage error.
    pub fn unary(name: impl Into<Rc<str>>, f: impl Fn(Value) -> Result<Value> + 'static) -> Func {
        let name = name.into();
        let fn_name = Rc::clone(&name);
        Func {
            name,
            f: Rc::new(move |args: Args| f(args.into_single(&fn_name)?)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: impl Into<Args>) -> Result<Value> {
        (self.f)(args.into())
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<func {}>", self.name)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Func) -> bool {
        // Compare the data pointers only; the vtable half of the fat
        // pointer is not stable across codegen units.
        std::ptr::eq(
            Rc::as_ptr(&self.f) as *const (),
            Rc::as_ptr(&other.f) as *const (),
        )
    }
}

// ============ Call Arguments ============

/// One call's argument bundle: positional values plus keyword values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
}

impl Args {
    pub fn new() -> Args {
        Args::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Args {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword argument. Later entries win within one bundle;
    /// duplicate detection against earlier calls happens in the curry
    /// engine.
    pub fn kw(mut self, name: impl Into<String>, value: impl Into<Value>) -> Args {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<Value>, IndexMap<String, Value>) {
        (self.positional, self.keyword)
    }

    /// Extract exactly one positional argument.
    pub(crate) fn into_single(self, fn_name: &str) -> Result<Value> {
        let Args {
            mut positional,
            keyword,
        } = self;
        if let Some(name) = keyword.keys().next() {
            return Err(Error::UnknownArgument {
                func: fn_name.to_string(),
                name: name.clone(),
            });
        }
        let got = positional.len();
        if got > 1 {
            return Err(Error::TooManyArguments {
                func: fn_name.to_string(),
                expected: 1,
                got,
            });
        }
        positional.pop().ok_or_else(|| Error::MissingArgument {
            func: fn_name.to_string(),
            name: "value".to_string(),
        })
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Args {
        Args::new()
    }
}

impl From<Value> for Args {
    fn from(v: Value) -> Args {
        Args::new().arg(v)
    }
}

// Single-argument calls are the common case; scalars convert directly.
impl From<i64> for Args {
    fn from(v: i64) -> Args {
        Args::new().arg(v)
    }
}

impl From<i32> for Args {
    fn from(v: i32) -> Args {
        Args::new().arg(v)
    }
}

impl From<f64> for Args {
    fn from(v: f64) -> Args {
        Args::new().arg(v)
    }
}

impl From<bool> for Args {
    fn from(v: bool) -> Args {
        Args::new().arg(v)
    }
}

impl From<&str> for Args {
    fn from(v: &str) -> Args {
        Args::new().arg(v)
    }
}

impl From<String> for Args {
    fn from(v: String) -> Args {
        Args::new().arg(v)
    }
}

impl From<Func> for Args {
    fn from(f: Func) -> Args {
        Args::new().arg(Value::Func(f))
    }
}

/// A bare vector spreads as positional arguments; wrap it in a
/// [`Value`] first to pass one list argument.
impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Args {
        Args {
            positional,
            keyword: IndexMap::new(),
        }
    }
}

impl<T1: Into<Value>> From<(T1,)> for Args {
    fn from(t: (T1,)) -> Args {
        Args::new().arg(t.0)
    }
}

impl<T1: Into<Value>, T2: Into<Value>> From<(T1, T2)> for Args {
    fn from(t: (T1, T2)) -> Args {
        Args::new().arg(t.0).arg(t.1)
    }
}

impl<T1: Into<Value>, T2: Into<Value>, T3: Into<Value>> From<(T1, T2, T3)> for Args {
    fn from(t: (T1, T2, T3)) -> Args {
        Args::new().arg(t.0).arg(t.1).arg(t.2)
    }
}

impl<T1: Into<Value>, T2: Into<Value>, T3: Into<Value>, T4: Into<Value>> From<(T1, T2, T3, T4)>
    for Args
{
    fn from(t: (T1, T2, T3, T4)) -> Args {
        Args::new().arg(t.0).arg(t.1).arg(t.2).arg(t.3)
    }
}

// ============ Equality and Ordering ============

/// Operator equality: `Int` and `Float` compare numerically, containers
/// compare element-wise, funcs compare by identity. Mismatched types are
/// unequal, never an error.
pub fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            // Insertion order does not matter for equality.
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| equals(v, w)))
        }
        _ => lhs == rhs,
    }
}

/// Total comparator for sorting. Mixed numeric pairs compare through
/// `f64`; any other cross-type pair is a type error.
pub fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
        (Value::Int(a), Value::Float(b)) => Ok((*a as f64).total_cmp(b)),
        (Value::Float(a), Value::Int(b)) => Ok(a.total_cmp(&(*b as f64))),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                match compare(x, y)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        (Value::Unit, Value::Unit) => Ok(Ordering::Equal),
        (a, b) => Err(Error::TypeError {
            expected: "comparable values".to_string(),
            got: format!("{} and {}", a.type_name(), b.type_name()),
        }),
    }
}

// ============ Display ============

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write_quoted(f, s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Func(func) => write!(f, "<func {}>", func.name()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Unit => write!(f, "None"),
            Key::Bool(true) => write!(f, "True"),
            Key::Bool(false) => write!(f, "False"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => write_quoted(f, s),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            _ => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs
