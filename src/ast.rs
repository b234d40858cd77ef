//! This module defines the core Abstract Syntax Tree (AST) types shared by the reader
//! and the evaluator. The main enum, [`Value`], covers every DIY Lang datum: integers,
//! booleans, symbols, strings, lists and closures. Ergonomic helper functions such as
//! [`val`], [`sym`] and [`nil`] make trees easy to build in code and tests, and the
//! `From` conversions let Rust literals, arrays and vectors become values directly.
//!
//! The [`std::fmt::Display`] implementation is the printer: its output reads back
//! through [`crate::parser::parse`] to an equal value.

use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::evaluator::Environment;

/// Type alias for integer values in the interpreter
pub(crate) type NumberType = i64;

/// A user-defined function: parameter names, a body, and the environment
/// that was active when the `lambda` was evaluated.
pub struct Closure {
    pub(crate) env: Environment,
    pub(crate) params: Vec<String>,
    pub(crate) body: Value,
}

impl Closure {
    pub fn new(env: Environment, params: Vec<String>, body: Value) -> Self {
        Closure { env, params, body }
    }

    /// Number of parameters the closure must be called with
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for Closure {
    // The captured environment usually contains this closure again
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure(params={:?}, body={:?})", self.params, self.body)
    }
}

/// Core AST type in interpreter
///
/// To build an AST, use the ergonomic helper functions:
/// - `val(42)` for values, `sym("name")` for symbols, `nil()` for empty lists
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// Fixed-width integers
    Integer(NumberType),
    /// Booleans, written `#t` and `#f`
    Boolean(bool),
    /// Symbols (identifiers)
    Symbol(String),
    /// String literals, compared by content
    String(String),
    /// Heterogeneous lists; the empty list is `()`
    List(Vec<Value>),
    /// User-defined functions, shared rather than copied
    Closure(Rc<Closure>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::Closure(closure) => write!(f, "{closure:?}"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Closure> for Value {
    fn from(closure: Closure) -> Self {
        Value::Closure(Rc::new(closure))
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(|x| x.into()).collect())
    }
}

// Fallible conversion used by the integer operators

impl TryFrom<Value> for NumberType {
    type Error = Error;

    fn try_from(value: Value) -> Result<NumberType, Error> {
        match value {
            Value::Integer(n) => Ok(n),
            other => Err(Error::TypeError(format!("expected integer, got {other}"))),
        }
    }
}

/// Helper function for creating symbols - works great in mixed lists!
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values - works great in mixed lists!
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating the empty list
pub fn nil() -> Value {
    Value::List(vec![])
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::String(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::List(elements) => match elements.as_slice() {
                [Value::Symbol(head), quoted] if head == "quote" => write!(f, "'{quoted}"),
                _ => {
                    write!(f, "(")?;
                    for (i, elem) in elements.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        write!(f, "{elem}")?;
                    }
                    write!(f, ")")
                }
            },
            Value::Closure(closure) => write!(f, "<closure/{}>", closure.arity()),
        }
    }
}

impl Value {
    /// Anything but a list is an atom (closures included)
    pub fn is_atom(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    /// Only the boolean `#f` counts as false
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Closures are only equal to themselves
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false, // Different variants are never equal
        }
    }
}
