#![expect(clippy::unwrap_used)] // test code OK

use std::io::Write;

use diylang::ast::{Value, sym, val};
use diylang::{Environment, Error, interpret, interpret_file, parse, unparse};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn run_session(env: &Environment, steps: &[(&str, &str)]) {
    for (i, (source, expected)) in steps.iter().enumerate() {
        match interpret(source, Some(env)) {
            Ok(actual) => assert_eq!(actual, *expected, "step #{}: '{source}'", i + 1),
            Err(e) => panic!("step #{}: '{source}' failed with {}: {e}", i + 1, e.kind()),
        }
    }
}

fn error_kind(source: &str, env: &Environment) -> &'static str {
    match interpret(source, Some(env)) {
        Ok(value) => panic!("'{source}' should fail, got {value}"),
        Err(e) => e.kind(),
    }
}

fn program_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

#[test]
fn end_to_end_scenarios() {
    let env = Environment::new();
    run_session(
        &env,
        &[
            ("(+ 2 3)", "5"),
            ("(define square (lambda (x) (* x x)))", "<closure/1>"),
            ("(square 5)", "25"),
            ("(head '(1 2 3))", "1"),
            ("(tail '(1 2 3))", "(2 3)"),
            ("(if (> 3 2) 'yes 'no)", "yes"),
            ("(cons \"ab\" \"cd\")", "\"abcd\""),
            ("(let ((x 1) (y (+ x 1))) (+ x y))", "3"),
        ],
    );
}

#[test]
fn single_assignment_holds_across_statements() {
    let env = Environment::new();
    run_session(&env, &[("(define x 1)", "1")]);

    assert_eq!(error_kind("(define x 2)", &env), "AlreadyDefined");
    assert_eq!(error_kind("(defn x (a) a)", &env), "AlreadyDefined");
    assert_eq!(error_kind("(let ((y 1)) (define x 3))", &env), "AlreadyDefined");
    run_session(&env, &[("x", "1")]);
}

#[test]
fn closures_use_their_defining_scope() {
    let env = Environment::new();
    run_session(
        &env,
        &[
            ("(define x 1)", "1"),
            ("(define f (lambda () x))", "<closure/0>"),
            ("(define g (lambda (x) (f)))", "<closure/1>"),
            ("(g 2)", "1"),
            ("(defn counter-from (n) (lambda () n))", "counter-from"),
            ("((counter-from 7))", "7"),
        ],
    );
}

#[test]
fn closure_arity_is_exact() {
    let env = Environment::new();
    run_session(&env, &[("(defn pair (a b) (cons a (cons b '())))", "pair")]);

    for source in ["(pair 1)", "(pair 1 2 3)", "(pair)"] {
        match interpret(source, Some(&env)) {
            Err(Error::ArityError { expected, .. }) => assert_eq!(expected, 2, "'{source}'"),
            other => panic!("'{source}': expected ArityError, got {other:?}"),
        }
    }
    run_session(&env, &[("(pair 1 2)", "(1 2)")]);
}

#[test]
fn cond_without_a_true_test_is_false() {
    let env = Environment::new();
    run_session(
        &env,
        &[
            ("(cond ((#f 'a) ((> 1 2) 'b)))", "#f"),
            ("(cond ((#f 'a) ((> 2 1) 'b)))", "b"),
            ("(cond ())", "#f"),
        ],
    );

    // Unwrapped clauses are two arguments to cond, not a clause list
    match interpret("(cond (#f 1) (#f 2))", Some(&env)) {
        Err(Error::ArityError { expected, got, expression }) => {
            assert_eq!((expected, got), (1, 2));
            assert_eq!(expression.as_deref(), Some("cond"));
        }
        other => panic!("expected ArityError, got {other:?}"),
    }
}

#[test]
fn printed_values_read_back_equal() {
    let sources = [
        "42",
        "-7",
        "#t",
        "sym-bol?",
        "\"quote \\\" and backslash \\\\ and newline \\n\"",
        "()",
        "(1 (2 (3 ())) \"x\")",
        "'(a 'b ''c)",
        "(quote)",
        "(quote a b)",
    ];

    for source in sources {
        let value = parse(source).unwrap();
        let printed = unparse(&value);
        assert_eq!(parse(&printed).unwrap(), value, "'{source}' printed as {printed}");
        // Printing is stable after the first round
        assert_eq!(unparse(&parse(&printed).unwrap()), printed);
    }
}

#[test]
fn quote_returns_its_argument_unevaluated() {
    let env = Environment::new();
    for source in ["x", "(undefined 1 2)", "(+ 1 2)", "'y"] {
        let quoted = format!("(quote {source})");
        assert_eq!(
            interpret(&quoted, Some(&env)).unwrap(),
            unparse(&parse(source).unwrap())
        );
    }
}

#[test]
fn values_build_programmatically() {
    let expr = val(vec![sym("cons"), val(1), val(vec![sym("quote"), val([2, 3])])]);
    let env = Environment::new();
    let result = diylang::evaluate(&expr, &env).unwrap();
    assert_eq!(result, Value::from([1, 2, 3]));
}

#[test]
fn interpret_file_evaluates_in_order() {
    let file = program_file(
        ";; list utilities\n\
         (defn length (l)\n\
           (if (empty l) 0 (+ 1 (length (tail l)))))\n\
         \n\
         (defn append (a b)\n\
           (if (empty a) b (cons (head a) (append (tail a) b))))\n\
         \n\
         (define xs (append '(1 2) '(3 4 5)))  ; five elements\n\
         (length xs)\n",
    );

    assert_eq!(interpret_file(file.path(), None).unwrap(), "5");

    // With a caller-supplied environment the definitions stay available
    let env = Environment::new();
    assert_eq!(interpret_file(file.path(), Some(&env)).unwrap(), "5");
    run_session(&env, &[("xs", "(1 2 3 4 5)"), ("(append xs '(6))", "(1 2 3 4 5 6)")]);
}

#[test]
fn interpret_file_errors() {
    let empty = program_file("; only a comment\n");
    assert!(matches!(interpret_file(empty.path(), None), Err(Error::EmptyProgram)));

    let broken = program_file("(define a 1)\n(define b (+ a\n");
    let err = interpret_file(broken.path(), None).unwrap_err();
    assert_eq!(err.kind(), "IncompleteExpression");

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.diy");
    let err = interpret_file(&missing, None).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.kind(), "IoError");
}
