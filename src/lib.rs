//! DIY Lang - a small Lisp with a recursive-descent reader and a tree-walking evaluator
//!
//! The crate turns source text into a symbolic tree ([`ast::Value`]) and reduces
//! that tree to a value under a lexical [`evaluator::Environment`].
//!
//! ```scheme
//! (define square (lambda (x) (* x x)))   ; closures
//! (square 5)                              ; => 25
//! (let ((x 1) (y (+ x 1))) (+ x y))       ; sequential let => 3
//! (head '(1 2 3))                         ; => 1
//! (cons "ab" "cd")                        ; => "abcd"
//! ```
//!
//! ## Language Rules
//!
//! - Integers are fixed-width (`i64`); overflow and division by zero are errors
//! - Only `#f` is false: `0`, `()` and `""` are all truthy
//! - A name can be bound once per visible scope: redefining anything already
//!   visible (including names inherited from enclosing scopes) is an error
//! - Closures capture the environment they were created in (lexical scoping)
//! - Special forms and closure calls check their argument count exactly
//!
//! ## Modules
//!
//! - `ast`: the value/tree model and the printer
//! - `parser`: text to tree (`parse`, `parse_multiple`) and back (`unparse`)
//! - `evaluator`: special forms, closure application, environments
//! - `builtinops`: the binary integer operators
//! - `interpreter`: statement and file level entry points

use std::fmt;

/// Default maximum nesting depth accepted by the reader.
/// Bounds the recursion of the parser itself; evaluation has no depth limit.
/// Deeper input is well-formed but refused with the `TooDeeplyNested` label,
/// see [`parser::ParseConfig`] to raise it.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (stray parens, bad boolean, literal out of range)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed parens, unterminated string)
    Incomplete,
    /// Expression nesting exceeded the configured maximum depth
    TooDeeplyNested,
    /// Extra input found after a complete, valid expression
    TrailingContent,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseErrorKind::InvalidSyntax => "invalid syntax",
            ParseErrorKind::Incomplete => "incomplete expression",
            ParseErrorKind::TooDeeplyNested => "too deeply nested",
            ParseErrorKind::TrailingContent => "trailing content",
        };
        f.write_str(text)
    }
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
}

impl ParseError {
    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Show a little of what came before the error as well
        let char_offset = input
            .char_indices()
            .take_while(|(i, _)| *i < error_offset)
            .count();
        let context_start = char_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        ParseError {
            kind,
            message: message.into(),
            context: Some(display_context),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

/// Error types for the interpreter
///
/// Every failure aborts the current `parse`/`evaluate` call. Use [`Error::kind`]
/// for the short label a front-end shows next to the message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    ParseError(ParseError),
    #[error("{}", arity_message(.expected, .got, .expression))]
    ArityError {
        expected: usize,
        got: usize,
        expression: Option<String>,
    },
    #[error("{0}")]
    NotASymbol(String),
    #[error("{0} not in environment")]
    UnboundSymbol(String),
    #[error("{0} already defined")]
    AlreadyDefined(String),
    #[error("{0}")]
    TypeError(String),
    #[error("{0}")]
    EmptyCollection(String),
    #[error("{0} not a function")]
    NotAFunction(String),
    #[error("cannot evaluate {0}")]
    MalformedExpression(String),
    #[error("{0}")]
    ArithmeticError(String),
    #[error("program contains no expressions")]
    EmptyProgram,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn arity_message(expected: &usize, got: &usize, expression: &Option<String>) -> String {
    match expression {
        Some(form) => {
            format!("wrong number of arguments in {form}, expected {expected} got {got}")
        }
        None => format!("wrong number of arguments, expected {expected} got {got}"),
    }
}

impl Error {
    /// Create an ArityError for a closure call
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError naming the special form that was misused
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: impl Into<String>) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression.into()),
        }
    }

    /// The user-visible label of this error
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ParseError(e) if e.kind == ParseErrorKind::Incomplete => "IncompleteExpression",
            Error::ParseError(e) if e.kind == ParseErrorKind::TooDeeplyNested => "TooDeeplyNested",
            Error::ParseError(_) => "SyntaxError",
            Error::ArityError { .. } => "ArityError",
            Error::NotASymbol(_) => "NotASymbol",
            Error::UnboundSymbol(_) => "UnboundSymbol",
            Error::AlreadyDefined(_) => "AlreadyDefined",
            Error::TypeError(_) => "TypeError",
            Error::EmptyCollection(_) => "EmptyCollection",
            Error::NotAFunction(_) => "NotAFunction",
            Error::MalformedExpression(_) => "MalformedExpression",
            Error::ArithmeticError(_) => "ArithmeticError",
            Error::EmptyProgram => "EmptyProgram",
            Error::Io(_) => "IoError",
        }
    }

    /// True when more input could turn the failed source into a valid expression
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::ParseError(e) if e.kind == ParseErrorKind::Incomplete)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::ParseError(e)
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod interpreter;
pub mod parser;

pub use evaluator::{Environment, evaluate};
pub use interpreter::{interpret, interpret_file, interpret_source};
pub use parser::{parse, parse_multiple, unparse};
