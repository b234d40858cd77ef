//! Built-in binary integer operators.
//!
//! Each operator takes exactly two integer operands:
//!
//! ```scheme
//! (+ 2 3)    ; => 5
//! (- 2 3)    ; => -1
//! (* 2 3)    ; => 6
//! (/ 7 2)    ; => 3
//! (mod 7 2)  ; => 1
//! (> 3 2)    ; => #t
//! ```
//!
//! ## Rounding
//!
//! Division and remainder are floored: the quotient rounds toward negative
//! infinity and the remainder takes the sign of the divisor, so
//! `(/ -7 2)` is `-4` and `(mod -7 2)` is `1`. The two always satisfy
//! `a = b * (/ a b) + (mod a b)`.
//!
//! ## Error Handling
//!
//! - **Type Safety**: a non-integer operand is a `TypeError` naming that operand
//! - **Overflow Detection**: results outside `i64` are an `ArithmeticError`
//! - **Division by zero**: `/` and `mod` by `0` are an `ArithmeticError`

use crate::Error;
use crate::ast::{NumberType, Value};

/// The operators that take two integers, identified by their head symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
}

/// Definition of a built-in operator
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    /// The symbol that names this operator in source code
    pub symbol: &'static str,
    pub op: ArithOp,
}

static BUILTIN_OPS: &[BuiltinOp] = &[
    BuiltinOp {
        symbol: "mod",
        op: ArithOp::Mod,
    },
    BuiltinOp {
        symbol: "+",
        op: ArithOp::Add,
    },
    BuiltinOp {
        symbol: "-",
        op: ArithOp::Sub,
    },
    BuiltinOp {
        symbol: "/",
        op: ArithOp::Div,
    },
    BuiltinOp {
        symbol: "*",
        op: ArithOp::Mul,
    },
    BuiltinOp {
        symbol: ">",
        op: ArithOp::Gt,
    },
];

/// Look up the operator named by a head symbol
pub fn find_builtin_op(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_OPS.iter().find(|builtin| builtin.symbol == name)
}

impl ArithOp {
    /// Apply the operator to two already evaluated operands
    pub fn apply(self, left: Value, right: Value) -> Result<Value, Error> {
        let a = NumberType::try_from(left)?;
        let b = NumberType::try_from(right)?;

        match self {
            ArithOp::Add => a
                .checked_add(b)
                .map(Value::Integer)
                .ok_or_else(|| overflow("addition")),
            ArithOp::Sub => a
                .checked_sub(b)
                .map(Value::Integer)
                .ok_or_else(|| overflow("subtraction")),
            ArithOp::Mul => a
                .checked_mul(b)
                .map(Value::Integer)
                .ok_or_else(|| overflow("multiplication")),
            ArithOp::Div => floor_div(a, b).map(Value::Integer),
            ArithOp::Mod => floor_mod(a, b).map(Value::Integer),
            ArithOp::Gt => Ok(Value::Boolean(a > b)),
        }
    }
}

fn overflow(operation: &str) -> Error {
    Error::ArithmeticError(format!("integer overflow in {operation}"))
}

fn floor_div(a: NumberType, b: NumberType) -> Result<NumberType, Error> {
    if b == 0 {
        return Err(Error::ArithmeticError("division by zero".into()));
    }
    let quotient = a.checked_div(b).ok_or_else(|| overflow("division"))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn floor_mod(a: NumberType, b: NumberType) -> Result<NumberType, Error> {
    if b == 0 {
        return Err(Error::ArithmeticError("modulo by zero".into()));
    }
    // i64::MIN % -1 overflows in the hardware instruction but is 0
    let remainder = a.checked_rem(b).unwrap_or(0);
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}
