//! Statement and program level entry points.
//!
//! These tie the reader, the evaluator and the printer together and are what a
//! front-end such as the REPL calls. Results come back already printed.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::Error;
use crate::evaluator::{Environment, evaluate};
use crate::parser::{parse, parse_multiple, unparse};

/// Interpret a single statement and return the printed result.
///
/// Evaluates in `env` when given, so definitions persist across calls;
/// otherwise a fresh environment is used and discarded.
///
/// ```
/// use diylang::{Environment, interpret};
///
/// let env = Environment::new();
/// interpret("(define square (lambda (x) (* x x)))", Some(&env)).unwrap();
/// assert_eq!(interpret("(square 5)", Some(&env)).unwrap(), "25");
/// ```
pub fn interpret(source: &str, env: Option<&Environment>) -> Result<String, Error> {
    debug!(source, "interpret");
    let expr = parse(source)?;

    match env {
        Some(env) => Ok(unparse(&evaluate(&expr, env)?)),
        None => with_scratch_env(|env| Ok(unparse(&evaluate(&expr, env)?))),
    }
}

/// Run `f` in a fresh environment that is cleared afterwards, so functions
/// defined in it do not keep it alive.
fn with_scratch_env<T>(f: impl FnOnce(&Environment) -> Result<T, Error>) -> Result<T, Error> {
    let env = Environment::new();
    let result = f(&env);
    env.clear();
    result
}

/// Interpret every expression of a program in order and return the printed
/// value of the last one. Stops at the first error.
pub fn interpret_source(source: &str, env: &Environment) -> Result<String, Error> {
    let exprs = parse_multiple(source)?;
    debug!(expressions = exprs.len(), "interpret program");

    let mut last = None;
    for expr in &exprs {
        last = Some(evaluate(expr, env)?);
    }

    last.map(|value| unparse(&value))
        .ok_or(Error::EmptyProgram)
}

/// Interpret a program file, see [`interpret_source`].
pub fn interpret_file(path: impl AsRef<Path>, env: Option<&Environment>) -> Result<String, Error> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading file");
    let source = fs::read_to_string(path)?;

    match env {
        Some(env) => interpret_source(&source, env),
        None => with_scratch_env(|env| interpret_source(&source, env)),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    #[test]
    fn test_interpret_statements() {
        let test_cases = vec![
            ("(+ 2 3)", "5"),
            ("'(a 'b \"c\")", "(a 'b \"c\")"),
            ("(cons \"ab\" \"cd\")", "\"abcd\""),
            ("(if (> 3 2) 'yes 'no)", "yes"),
            ("(lambda (a b) a)", "<closure/2>"),
            ("(eq '() '())", "#f"),
            ("(tail '(1))", "()"),
            ("  42  ; trailing comment", "42"),
        ];

        for (source, expected) in test_cases {
            assert_eq!(interpret(source, None).unwrap(), expected, "'{source}'");
        }
    }

    #[test]
    fn test_interpret_without_env_is_isolated() {
        assert_eq!(interpret("(define x 1)", None).unwrap(), "1");
        // A second fresh environment knows nothing about x
        assert_eq!(interpret("(define x 2)", None).unwrap(), "2");
        assert_eq!(interpret("x", None).unwrap_err().kind(), "UnboundSymbol");
    }

    #[test]
    fn test_scratch_env_is_cleared() {
        let mut kept = None;
        let result = with_scratch_env(|env| {
            kept = Some(env.clone());
            interpret_source("(defn f (n) (if (eq n 0) 0 (f (- n 1)))) (f 3)", env)
        });
        assert_eq!(result.unwrap(), "0");
        assert!(kept.unwrap().get_all_bindings().is_empty());

        // Errors still clear the environment
        let mut kept = None;
        let err = with_scratch_env(|env| {
            kept = Some(env.clone());
            interpret_source("(define a 1) (a)", env)
        })
        .unwrap_err();
        assert_eq!(err.kind(), "NotAFunction");
        assert!(!kept.unwrap().contains("a"));
    }

    #[test]
    fn test_interpret_rejects_multiple_statements() {
        let err = interpret("(define x 1) x", None).unwrap_err();
        assert_eq!(err.kind(), "SyntaxError");
        let err = interpret("(+ 1", None).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_interpret_source_returns_last_value() {
        let env = Environment::new();
        let source = "
            ; helpers
            (defn inc (n) (+ n 1))
            (define two (inc 1))
            (inc two)
        ";
        assert_eq!(interpret_source(source, &env).unwrap(), "3");
        assert_eq!(interpret("two", Some(&env)).unwrap(), "2");
    }

    #[test]
    fn test_interpret_source_errors() {
        let env = Environment::new();
        assert!(matches!(
            interpret_source("  ; nothing here\n", &env),
            Err(Error::EmptyProgram)
        ));

        // Evaluation stops at the first failure, earlier definitions remain
        let err = interpret_source("(define a 1) (undefined) (define b 2)", &env).unwrap_err();
        assert_eq!(err.kind(), "UnboundSymbol");
        assert!(env.contains("a"));
        assert!(!env.contains("b"));
    }
}
