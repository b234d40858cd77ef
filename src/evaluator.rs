use tracing::trace;

use crate::Error;
use crate::ast::{Closure, Value};
use crate::builtinops::{BuiltinOp, find_builtin_op};

mod environment;

pub use environment::Environment;

/// Evaluate an expression (public API)
///
/// Integers, booleans and strings evaluate to themselves, symbols are looked up,
/// and non-empty lists are special forms or function calls. The expression is
/// never modified; `env` only changes through `define` and `defn`.
pub fn evaluate(expr: &Value, env: &Environment) -> Result<Value, Error> {
    match expr {
        Value::Integer(_) | Value::Boolean(_) | Value::String(_) => Ok(expr.clone()),

        Value::Symbol(name) => env.lookup(name),

        Value::List(elements) if !elements.is_empty() => eval_list(elements, env),

        // The empty list and bare closures are not expressions
        _ => Err(Error::MalformedExpression(expr.to_string())),
    }
}

/// Evaluate a non-empty list: special forms first, then function application.
///
/// The order of the arms is observable, e.g. `(define 1 2)` reports the bad
/// name before anything is evaluated, and a user function can never shadow a
/// special form such as `if` or `+`.
fn eval_list(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    let (head, arg_exprs) = match elements.split_first() {
        Some(split) => split,
        None => return Err(Error::MalformedExpression("()".to_owned())),
    };

    if let Value::Symbol(name) = head {
        match name.as_str() {
            "quote" => return eval_quote(elements),
            "atom" => return eval_atom(elements, env),
            "eq" => return eval_eq(elements, env),
            "if" => return eval_if(elements, env),
            "define" => return eval_define(elements, env),
            "let" => return eval_let(elements, env),
            "defn" => return eval_defn(elements, env),
            "lambda" => return eval_lambda(elements, env),
            "cons" => return eval_cons(elements, env),
            "head" => return eval_head(elements, env),
            "tail" => return eval_tail(elements, env),
            "empty" => return eval_empty(elements, env),
            "cond" => return eval_cond(elements, env),
            _ => {}
        }

        if let Some(builtin) = find_builtin_op(name) {
            return eval_arithmetic(builtin, elements, env);
        }

        // Named invocation
        return match env.lookup(name)? {
            Value::Closure(closure) => apply(&closure, arg_exprs, env),
            _ => Err(Error::NotAFunction(name.clone())),
        };
    }

    match head {
        Value::Closure(closure) => apply(closure, arg_exprs, env),

        // A call in head position, e.g. ((lambda (x) x) 1)
        Value::List(_) => match evaluate(head, env)? {
            Value::Closure(closure) => apply(&closure, arg_exprs, env),
            other => Err(Error::NotAFunction(other.to_string())),
        },

        _ => Err(Error::NotAFunction(head.to_string())),
    }
}

/// Apply a closure: arguments are evaluated in the caller's environment, the
/// body in the closure's own environment extended with the parameters.
fn apply(closure: &Closure, arg_exprs: &[Value], env: &Environment) -> Result<Value, Error> {
    if closure.arity() != arg_exprs.len() {
        return Err(Error::arity_error(closure.arity(), arg_exprs.len()));
    }

    let args = arg_exprs
        .iter()
        .map(|arg| evaluate(arg, env))
        .collect::<Result<Vec<_>, _>>()?;

    let call_env = closure.env.extend(closure.params.iter().cloned().zip(args));
    evaluate(&closure.body, &call_env)
}

/// Check the length of a form, head included
fn check_arity(elements: &[Value], expected: usize, form: &str) -> Result<(), Error> {
    if elements.len() == expected {
        Ok(())
    } else {
        Err(Error::arity_error_with_expr(
            expected - 1,
            elements.len().saturating_sub(1),
            form,
        ))
    }
}

/// `let` bindings and `cond` clauses have no head, so every element counts
fn check_pair(elements: &[Value], form: &str) -> Result<(), Error> {
    if elements.len() == 2 {
        Ok(())
    } else {
        Err(Error::arity_error_with_expr(2, elements.len(), form))
    }
}

fn expect_symbol<'a>(value: &'a Value, form: &str) -> Result<&'a str, Error> {
    value
        .as_symbol()
        .ok_or_else(|| Error::NotASymbol(format!("{form} argument must be a symbol, got {value}")))
}

fn expect_list<'a>(value: &'a Value, form: &str) -> Result<&'a [Value], Error> {
    match value {
        Value::List(elements) => Ok(elements),
        other => Err(Error::TypeError(format!(
            "{form} arguments must be a list, got {other}"
        ))),
    }
}

fn eval_quote(elements: &[Value]) -> Result<Value, Error> {
    check_arity(elements, 2, "quote")?;
    Ok(elements[1].clone())
}

fn eval_atom(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 2, "atom")?;
    let value = evaluate(&elements[1], env)?;
    Ok(Value::Boolean(value.is_atom()))
}

/// Lists are never `eq`, not even two empty lists
fn eval_eq(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 3, "eq")?;
    let left = evaluate(&elements[1], env)?;
    let right = evaluate(&elements[2], env)?;
    if !left.is_atom() || !right.is_atom() {
        return Ok(Value::Boolean(false));
    }
    Ok(Value::Boolean(left == right))
}

fn eval_arithmetic(
    builtin: &BuiltinOp,
    elements: &[Value],
    env: &Environment,
) -> Result<Value, Error> {
    check_arity(elements, 3, builtin.symbol)?;
    let left = evaluate(&elements[1], env)?;
    let right = evaluate(&elements[2], env)?;
    builtin.op.apply(left, right)
}

fn eval_if(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 4, "if")?;
    if evaluate(&elements[1], env)?.is_truthy() {
        evaluate(&elements[2], env)
    } else {
        evaluate(&elements[3], env)
    }
}

fn eval_define(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 3, "define")?;
    let name = expect_symbol(&elements[1], "define")?;
    let value = evaluate(&elements[2], env)?;
    env.set(name, value.clone())?;
    trace!(symbol = name, %value, "define");
    Ok(value)
}

/// Bindings are made one at a time, so later ones can see earlier ones
fn eval_let(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 3, "let")?;
    let bindings = expect_list(&elements[1], "let")?;

    let mut scope = env.clone();
    for binding in bindings {
        let pair = expect_list(binding, "let")?;
        check_pair(pair, "let binding")?;
        let name = expect_symbol(&pair[0], "let")?;
        let value = evaluate(&pair[1], &scope)?;
        scope = scope.extend([(name.to_owned(), value)]);
    }

    evaluate(&elements[2], &scope)
}

/// `(defn name params body)` binds `(lambda params body)` and returns `name`
fn eval_defn(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 4, "defn")?;
    let name = expect_symbol(&elements[1], "defn")?;
    let closure = make_closure(&elements[2], &elements[3], env)?;
    env.set(name, closure)?;
    trace!(symbol = name, "defn");
    Ok(elements[1].clone())
}

fn eval_lambda(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 3, "lambda")?;
    make_closure(&elements[1], &elements[2], env)
}

fn make_closure(params: &Value, body: &Value, env: &Environment) -> Result<Value, Error> {
    let params = expect_list(params, "lambda")?
        .iter()
        .map(|param| expect_symbol(param, "lambda").map(str::to_owned))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Closure::new(env.clone(), params, body.clone()).into())
}

fn eval_cons(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 3, "cons")?;
    let first = evaluate(&elements[1], env)?;
    let rest = evaluate(&elements[2], env)?;

    match (first, rest) {
        (first, Value::List(rest)) => {
            let mut list = Vec::with_capacity(rest.len() + 1);
            list.push(first);
            list.extend(rest);
            Ok(Value::List(list))
        }
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Ok(Value::String(a))
        }
        (first, rest) => Err(Error::TypeError(format!(
            "cons arguments must be list or string, got {first} and {rest}"
        ))),
    }
}

fn eval_head(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 2, "head")?;
    match evaluate(&elements[1], env)? {
        Value::List(list) => list
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyCollection("head of empty list".to_owned())),
        Value::String(text) => text
            .chars()
            .next()
            .map(|c| Value::String(c.to_string()))
            .ok_or_else(|| Error::EmptyCollection("head of empty string".to_owned())),
        other => Err(Error::TypeError(format!(
            "head argument must be list or string, got {other}"
        ))),
    }
}

fn eval_tail(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 2, "tail")?;
    match evaluate(&elements[1], env)? {
        Value::List(list) => match list.split_first() {
            Some((_, rest)) => Ok(Value::List(rest.to_vec())),
            None => Err(Error::EmptyCollection("tail of empty list".to_owned())),
        },
        Value::String(text) => {
            let mut chars = text.chars();
            match chars.next() {
                Some(_) => Ok(Value::String(chars.as_str().to_owned())),
                None => Err(Error::EmptyCollection("tail of empty string".to_owned())),
            }
        }
        other => Err(Error::TypeError(format!(
            "tail argument must be list or string, got {other}"
        ))),
    }
}

fn eval_empty(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 2, "empty")?;
    match evaluate(&elements[1], env)? {
        Value::List(list) => Ok(Value::Boolean(list.is_empty())),
        Value::String(text) => Ok(Value::Boolean(text.is_empty())),
        other => Err(Error::TypeError(format!(
            "empty argument must be list or string, got {other}"
        ))),
    }
}

/// `(cond ((test result) ...))` - `#f` when no test holds
fn eval_cond(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    check_arity(elements, 2, "cond")?;
    for clause in expect_list(&elements[1], "cond")? {
        let clause = expect_list(clause, "cond")?;
        check_pair(clause, "cond clause")?;
        if evaluate(&clause[0], env)?.is_truthy() {
            return evaluate(&clause[1], env);
        }
    }
    Ok(Value::Boolean(false))
}
