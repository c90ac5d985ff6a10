//! Deferred expression trees
//!
//! [`It`] stands for the eventual input of a compiled expression; applying
//! operators, attribute selection, or indexing to it records an [`Expr`]
//! node instead of computing anything. [`Obj`] records a single method
//! call on the input. `compile` turns a tree into a [`Func`] that
//! substitutes its argument for every placeholder occurrence and evaluates
//! bottom-up.
//!
//! Builder methods are the primary interface; `std::ops` sugar exists for
//! the operators Rust can overload (`+ - * / % & | ^ << >>`, unary `-`
//! and `!`). Exponentiation, floor division, matrix multiply, and the
//! comparisons have no Rust operator and exist only as builder methods.
//!
//! Boolean operators, membership tests, and chained relational
//! comparisons are not part of the expression language and cannot be
//! constructed: there are no such builders, `&&`/`||` cannot be
//! overloaded, and comparison builders return `Expr` rather than `bool`.
//! Predicate combinators in the ops catalog cover those cases.

use std::fmt;
use std::ops;

use crate::value::{Func, Value};
use crate::{Args, eval};

// ============ Operator Tags ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::MatMul => "@",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Abs,
}

// ============ Call Arguments ============

#[derive(Debug, Clone, PartialEq)]
pub enum Arg<E> {
    Positional(E),
    Keyword(String, E),
}

impl<E> Arg<E> {
    pub fn pos(expr: E) -> Self {
        Arg::Positional(expr)
    }

    pub fn kw(name: impl Into<String>, expr: E) -> Self {
        Arg::Keyword(name.into(), expr)
    }
}

// ============ Expression Nodes ============

/// A deferred expression. Immutable once constructed: every builder
/// application returns a new node referencing its operands.
///
/// `Call` nodes are constructed through [`Obj`]; the builder surface on
/// `Expr` deliberately has no `method`, which is what makes method
/// chaining single-level.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The placeholder: resolves to the input at evaluation time. May
    /// occur any number of times in one tree; every occurrence resolves
    /// to the same input.
    Input,
    /// A constant captured at construction time.
    Constant(Value),
    Attr(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    Call(Box<Expr>, String, Vec<Arg<Expr>>),
}

impl Expr {
    pub fn binop(self, op: BinOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Binary(Box::new(self), op, Box::new(rhs.into()))
    }

    pub fn unop(self, op: UnaryOp) -> Expr {
        Expr::Unary(op, Box::new(self))
    }

    /// Select an attribute off this expression's result.
    pub fn attr(self, name: impl Into<String>) -> Expr {
        Expr::Attr(Box::new(self), name.into())
    }

    /// Subscript this expression's result. Negative integer indices count
    /// from the end, as the evaluation rules define.
    pub fn index(self, key: impl Into<Expr>) -> Expr {
        Expr::Index(Box::new(self), Box::new(key.into()))
    }

    // Named builders, one per operator. For the operators Rust can
    // overload these are sugar-equivalent; for the rest they are the only
    // spelling.

    pub fn add(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Add, rhs)
    }

    pub fn sub(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Sub, rhs)
    }

    pub fn mul(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Mul, rhs)
    }

    pub fn div(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Div, rhs)
    }

    pub fn floordiv(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::FloorDiv, rhs)
    }

    pub fn rem(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Mod, rhs)
    }

    pub fn pow(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Pow, rhs)
    }

    pub fn matmul(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::MatMul, rhs)
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Eq, rhs)
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Ne, rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Lt, rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Le, rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Gt, rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Ge, rhs)
    }

    pub fn bitand(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::BitAnd, rhs)
    }

    pub fn bitor(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::BitOr, rhs)
    }

    pub fn bitxor(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::BitXor, rhs)
    }

    pub fn shl(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Shl, rhs)
    }

    pub fn shr(self, rhs: impl Into<Expr>) -> Expr {
        self.binop(BinOp::Shr, rhs)
    }

    pub fn neg(self) -> Expr {
        self.unop(UnaryOp::Neg)
    }

    /// Bitwise complement on ints, logical negation on bools.
    pub fn not_(self) -> Expr {
        self.unop(UnaryOp::Not)
    }

    pub fn abs(self) -> Expr {
        self.unop(UnaryOp::Abs)
    }

    /// Compile into a one-argument callable.
    pub fn compile(self) -> Func {
        let name = self.to_string();
        Func::new(name, move |args: Args| {
            let input = args.into_single("expr")?;
            eval::eval(&self, &input)
        })
    }
}

impl From<It> for Expr {
    fn from(_: It) -> Expr {
        Expr::Input
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Expr {
        Expr::Constant(v)
    }
}

impl From<i64> for Expr {
    fn from(i: i64) -> Expr {
        Expr::Constant(Value::Int(i))
    }
}

impl From<i32> for Expr {
    fn from(i: i32) -> Expr {
        Expr::Constant(Value::Int(i64::from(i)))
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Expr {
        Expr::Constant(Value::Float(f))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Expr {
        Expr::Constant(Value::Bool(b))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Expr {
        Expr::Constant(Value::from(s))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Expr {
        Expr::Constant(Value::from(s))
    }
}

impl From<Expr> for Func {
    fn from(expr: Expr) -> Func {
        expr.compile()
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Value {
        Value::Func(expr.compile())
    }
}

// ============ Placeholder Singletons ============

/// The placeholder singleton: stands for the eventual input.
///
/// Zero-sized and stateless; all state lives in the nodes it produces.
/// Operators with Rust sugar work directly (`It * 2 + 1`); the rest are
/// builder methods (`It.pow(2)`, `It.lt(5)`, `It.attr("name")`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct It;

impl It {
    pub fn expr(self) -> Expr {
        Expr::Input
    }

    pub fn attr(self, name: impl Into<String>) -> Expr {
        Expr::Input.attr(name)
    }

    pub fn index(self, key: impl Into<Expr>) -> Expr {
        Expr::Input.index(key)
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.eq(rhs)
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.ne(rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.lt(rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.le(rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.gt(rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.ge(rhs)
    }

    pub fn pow(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.pow(rhs)
    }

    pub fn floordiv(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.floordiv(rhs)
    }

    pub fn matmul(self, rhs: impl Into<Expr>) -> Expr {
        Expr::Input.matmul(rhs)
    }

    pub fn abs(self) -> Expr {
        Expr::Input.abs()
    }

    /// Compile the identity expression.
    pub fn compile(self) -> Func {
        Expr::Input.compile()
    }
}

/// Method-call helper: records a single method call on the input.
///
/// `Obj.method("split", (" ",))` evaluates as `input.split(" ")`. The
/// result is an ordinary [`Expr`], so attribute selection, indexing, and
/// operators may chain after it, but a second method call may not.
/// Method chaining is single-level by design: `method` lives here and not
/// on `Expr`, so the restriction holds at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Obj;

impl Obj {
    pub fn method(self, name: impl Into<String>, args: impl Into<MethodArgs>) -> Expr {
        Expr::Call(Box::new(Expr::Input), name.into(), args.into().0)
    }
}

/// Arguments to a recorded method call. Converts from positional tuples
/// or an explicit `Vec<Arg<Expr>>` when keywords are needed.
#[derive(Debug, Clone, Default)]
pub struct MethodArgs(pub Vec<Arg<Expr>>);

impl From<()> for MethodArgs {
    fn from(_: ()) -> MethodArgs {
        MethodArgs(Vec::new())
    }
}

impl From<Vec<Arg<Expr>>> for MethodArgs {
    fn from(args: Vec<Arg<Expr>>) -> MethodArgs {
        MethodArgs(args)
    }
}

impl<T1: Into<Expr>> From<(T1,)> for MethodArgs {
    fn from(t: (T1,)) -> MethodArgs {
        MethodArgs(vec![Arg::pos(t.0.into())])
    }
}

impl<T1: Into<Expr>, T2: Into<Expr>> From<(T1, T2)> for MethodArgs {
    fn from(t: (T1, T2)) -> MethodArgs {
        MethodArgs(vec![Arg::pos(t.0.into()), Arg::pos(t.1.into())])
    }
}

impl<T1: Into<Expr>, T2: Into<Expr>, T3: Into<Expr>> From<(T1, T2, T3)> for MethodArgs {
    fn from(t: (T1, T2, T3)) -> MethodArgs {
        MethodArgs(vec![
            Arg::pos(t.0.into()),
            Arg::pos(t.1.into()),
            Arg::pos(t.2.into()),
        ])
    }
}

// ============ Operator Sugar ============

// One impl block per overloadable operator, for expression and
// placeholder left-hand sides plus bare numeric left-hand sides.
macro_rules! impl_expr_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> ops::$trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                self.binop($op, rhs)
            }
        }

        impl<R: Into<Expr>> ops::$trait<R> for It {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::Input.binop($op, rhs)
            }
        }

        impl_expr_op!(@scalar $trait, $method, $op, i32);
        impl_expr_op!(@scalar $trait, $method, $op, i64);
        impl_expr_op!(@scalar $trait, $method, $op, f64);
    };
    (@scalar $trait:ident, $method:ident, $op:expr, $ty:ty) => {
        impl ops::$trait<Expr> for $ty {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::from(self).binop($op, rhs)
            }
        }

        impl ops::$trait<It> for $ty {
            type Output = Expr;
            fn $method(self, _: It) -> Expr {
                Expr::from(self).binop($op, Expr::Input)
            }
        }
    };
}

impl_expr_op!(Add, add, BinOp::Add);
impl_expr_op!(Sub, sub, BinOp::Sub);
impl_expr_op!(Mul, mul, BinOp::Mul);
impl_expr_op!(Div, div, BinOp::Div);
impl_expr_op!(Rem, rem, BinOp::Mod);
impl_expr_op!(BitAnd, bitand, BinOp::BitAnd);
impl_expr_op!(BitOr, bitor, BinOp::BitOr);
impl_expr_op!(BitXor, bitxor, BinOp::BitXor);
impl_expr_op!(Shl, shl, BinOp::Shl);
impl_expr_op!(Shr, shr, BinOp::Shr);

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.unop(UnaryOp::Neg)
    }
}

impl ops::Neg for It {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Input.unop(UnaryOp::Neg)
    }
}

impl ops::Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        self.unop(UnaryOp::Not)
    }
}

impl ops::Not for It {
    type Output = Expr;
    fn not(self) -> Expr {
        Expr::Input.unop(UnaryOp::Not)
    }
}

// ============ Display ============

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "~",
            UnaryOp::Abs => "abs",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Input => write!(f, "it"),
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Attr(base, name) => {
                // Operator results need parens as an attribute receiver
                let needs_parens = matches!(base.as_ref(), Expr::Binary(..) | Expr::Unary(..));
                if needs_parens {
                    write!(f, "({base}).{name}")
                } else {
                    write!(f, "{base}.{name}")
                }
            }
            Expr::Index(base, key) => {
                let needs_parens = matches!(base.as_ref(), Expr::Binary(..) | Expr::Unary(..));
                if needs_parens {
                    write!(f, "({base})[{key}]")
                } else {
                    write!(f, "{base}[{key}]")
                }
            }
            Expr::Unary(UnaryOp::Abs, operand) => write!(f, "abs({operand})"),
            Expr::Unary(op, operand) => {
                let needs_parens = matches!(operand.as_ref(), Expr::Binary(..));
                if needs_parens {
                    write!(f, "{op}({operand})")
                } else {
                    write!(f, "{op}{operand}")
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                if matches!(lhs.as_ref(), Expr::Binary(..)) {
                    write!(f, "({lhs})")?;
                } else {
                    write!(f, "{lhs}")?;
                }
                write!(f, " {op} ")?;
                if matches!(rhs.as_ref(), Expr::Binary(..)) {
                    write!(f, "({rhs})")?;
                } else {
                    write!(f, "{rhs}")?;
                }
                Ok(())
            }
            Expr::Call(base, name, args) => {
                write!(f, "{base}.{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl<E: fmt::Display> fmt::Display for Arg<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Positional(expr) => write!(f, "{expr}"),
            Arg::Keyword(name, expr) => write!(f, "{name}={expr}"),
        }
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs
