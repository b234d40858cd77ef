//! The reader: DIY Lang source text to [`Value`] trees, and back.
//!
//! Grammar, per expression:
//! - integer: a token of ASCII digits only (`42`; `-5` is a symbol)
//! - boolean: exactly `#t` or `#f` (any other two-character `#x` token is an error)
//! - string: `"..."` with `\"`, `\\`, `\n`, `\t`, `\r` escapes
//! - quote: `'expr` reads as `(quote expr)`
//! - list: `( expr* )`
//! - symbol: any other run of characters that are not whitespace, parens, `'` or `;`
//!
//! A `;` starts a comment running to the end of the line. Comments count as
//! whitespace, so they may appear anywhere between expressions.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{char, multispace1},
    combinator::{cut, recognize, value},
    error::{ErrorKind, ParseError as NomParseError},
    multi::{many0, many0_count},
    sequence::pair,
};

use crate::ast::{NumberType, Value};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Reader settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum nesting of lists and quotes
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            max_depth: MAX_PARSE_DEPTH,
        }
    }
}

/// nom error carrying the reader's own error classification
#[derive(Debug, Clone, PartialEq)]
struct ReadError<'a> {
    input: &'a str,
    kind: ParseErrorKind,
    message: String,
}

impl<'a> ReadError<'a> {
    fn new(input: &'a str, kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ReadError {
            input,
            kind,
            message: message.into(),
        }
    }
}

impl<'a> NomParseError<&'a str> for ReadError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        match input.chars().next() {
            None => ReadError::new(input, ParseErrorKind::Incomplete, "unexpected end of input"),
            Some(c) => ReadError::new(
                input,
                ParseErrorKind::InvalidSyntax,
                format!("unexpected '{c}'"),
            ),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type ReadResult<'a, O> = IResult<&'a str, O, ReadError<'a>>;

/// Convert nom parsing errors to crate errors with a context snippet
fn to_parse_error(source: &str, error: nom::Err<ReadError<'_>>) -> Error {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = source.len().saturating_sub(e.input.len());
            ParseError::with_context(e.kind, e.message, source, offset).into()
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "incomplete input").into()
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '(' | ')' | '\'' | ';'))
}

/// Skip whitespace and `;` line comments
fn skip_trivia(input: &str) -> ReadResult<'_, ()> {
    value(
        (),
        many0_count(alt((
            multispace1,
            recognize(pair(char(';'), take_till(|c: char| c == '\n'))),
        ))),
    )
    .parse(input)
}

/// Parse an integer, boolean or symbol token
fn parse_atom(input: &str) -> ReadResult<'_, Value> {
    let (rest, token) = take_while1(is_symbol_char).parse(input)?;

    if token.chars().all(|c| c.is_ascii_digit()) {
        return match token.parse::<NumberType>() {
            Ok(n) => Ok((rest, Value::Integer(n))),
            Err(_) => Err(nom::Err::Failure(ReadError::new(
                input,
                ParseErrorKind::InvalidSyntax,
                format!("integer literal out of range: {token}"),
            ))),
        };
    }

    if token.starts_with('#') && token.chars().count() == 2 {
        return match token {
            "#t" => Ok((rest, Value::Boolean(true))),
            "#f" => Ok((rest, Value::Boolean(false))),
            _ => Err(nom::Err::Failure(ReadError::new(
                input,
                ParseErrorKind::InvalidSyntax,
                format!("expected boolean, found {token}"),
            ))),
        };
    }

    Ok((rest, Value::Symbol(token.to_owned())))
}

/// Parse a string literal
fn parse_string(input: &str) -> ReadResult<'_, Value> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut text = String::new();

    let unterminated =
        || nom::Err::Failure(ReadError::new(input, ParseErrorKind::Incomplete, "unclosed string"));

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => return Ok((char_iter.as_str(), Value::String(text))),
            Some('\\') => {
                match char_iter.next() {
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    // Unknown escapes are kept as written
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => return Err(unterminated()),
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                text.push(ch);
                remaining = char_iter.as_str();
            }
            None => return Err(unterminated()),
        }
    }
}

/// Parse `'expr` into `(quote expr)`
fn parse_quote(input: &str, depth: usize, config: ParseConfig) -> ReadResult<'_, Value> {
    let (input, _) = char('\'').parse(input)?;
    let (input, expr) = cut(|i| parse_expr(i, depth + 1, config)).parse(input)?;
    Ok((
        input,
        Value::List(vec![Value::Symbol("quote".into()), expr]),
    ))
}

/// Parse a parenthesized list
fn parse_list(input: &str, depth: usize, config: ParseConfig) -> ReadResult<'_, Value> {
    let (input, _) = char('(').parse(input)?;

    // Elements stop at the first `)` or at end of input
    let (input, elements) = many0(|i| parse_expr(i, depth + 1, config)).parse(input)?;

    let (input, _) = skip_trivia(input)?;
    let (input, _) = cut(char(')')).parse(input)?;

    Ok((input, Value::List(elements)))
}

/// Parse one expression, skipping leading whitespace and comments
fn parse_expr(input: &str, depth: usize, config: ParseConfig) -> ReadResult<'_, Value> {
    if depth >= config.max_depth {
        return Err(nom::Err::Failure(ReadError::new(
            input,
            ParseErrorKind::TooDeeplyNested,
            format!("expression too deeply nested (max depth: {})", config.max_depth),
        )));
    }

    let (input, _) = skip_trivia(input)?;
    alt((
        |i| parse_quote(i, depth, config),
        |i| parse_list(i, depth, config),
        parse_string,
        parse_atom,
    ))
    .parse(input)
}

/// Parse exactly one expression.
pub fn parse(source: &str) -> Result<Value, Error> {
    parse_with_config(source, ParseConfig::default())
}

/// Parse exactly one expression with explicit reader settings.
pub fn parse_with_config(source: &str, config: ParseConfig) -> Result<Value, Error> {
    let (rest, expr) = parse_expr(source, 0, config).map_err(|e| to_parse_error(source, e))?;
    let (rest, _) = skip_trivia(rest).map_err(|e| to_parse_error(source, e))?;

    if rest.is_empty() {
        Ok(expr)
    } else {
        Err(ParseError::with_context(
            ParseErrorKind::TrailingContent,
            format!("expected end of input, found '{}'", rest.trim_end()),
            source,
            source.len() - rest.len(),
        )
        .into())
    }
}

/// Parse a sequence of top-level expressions, in source order.
///
/// ```
/// use diylang::ast::{sym, val};
/// use diylang::parse_multiple;
///
/// let exprs = parse_multiple("(foo bar) ; comment\n(baz 1 2 3)").unwrap();
/// assert_eq!(exprs, vec![
///     val(vec![sym("foo"), sym("bar")]),
///     val(vec![sym("baz"), val(1), val(2), val(3)]),
/// ]);
/// ```
pub fn parse_multiple(source: &str) -> Result<Vec<Value>, Error> {
    parse_multiple_with_config(source, ParseConfig::default())
}

pub fn parse_multiple_with_config(source: &str, config: ParseConfig) -> Result<Vec<Value>, Error> {
    let (rest, exprs) = many0(|i| parse_expr(i, 0, config))
        .parse(source)
        .map_err(|e| to_parse_error(source, e))?;
    let (rest, _) = skip_trivia(rest).map_err(|e| to_parse_error(source, e))?;

    if rest.is_empty() {
        Ok(exprs)
    } else {
        // Only a stray closing paren stops the expression loop early
        Err(ParseError::with_context(
            ParseErrorKind::InvalidSyntax,
            "unexpected ')'",
            source,
            source.len() - rest.len(),
        )
        .into())
    }
}

/// Turn a tree back into DIY Lang source text.
pub fn unparse(value: &Value) -> String {
    value.to_string()
}
