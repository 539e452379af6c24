//! Narrow evaluator for literal assignments in Python-style settings files.
//!
//! Only string, number, `None`/`True`/`False`, dict, list and tuple literals are
//! understood. Nothing is ever executed: any other expression is a parse error.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while_m_n},
    character::complete::{char, digit0, digit1, multispace1, one_of, satisfy},
    combinator::{cut, not, opt, recognize, value},
    error::{context, convert_error, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use regex::Regex;
use std::iter::Peekable;
use std::str::CharIndices;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(String),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Looks up a string key in a dict literal. Later keys shadow earlier ones.
    pub fn get(&self, key: &str) -> Option<&Literal> {
        match self {
            Literal::Dict(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| matches!(k, Literal::Str(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Literal::Dict(_))
    }

    /// Scalar value as a connection setting. `None`, `False` and containers have none.
    pub fn as_setting(&self) -> Option<String> {
        match self {
            Literal::Str(s) => Some(s.clone()),
            Literal::Number(n) => Some(n.clone()),
            Literal::Bool(true) => Some("True".to_string()),
            _ => None,
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Literal {
        use serde_json::Value;
        match value {
            Value::Null => Literal::None,
            Value::Bool(b) => Literal::Bool(*b),
            Value::Number(n) => Literal::Number(n.to_string()),
            Value::String(s) => Literal::Str(s.clone()),
            Value::Array(items) => Literal::List(items.iter().map(Literal::from_json).collect()),
            Value::Object(map) => Literal::Dict(
                map.iter()
                    .map(|(k, v)| (Literal::Str(k.clone()), Literal::from_json(v)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// The name is bound more than once at top level.
    Duplicate(usize),
    Syntax(String),
}

/// Finds the single top-level `name = <literal>` statement in `source` and evaluates it.
///
/// Returns `Ok(None)` when the name is never bound by a top-level statement.
pub fn top_level_assignment(source: &str, name: &str) -> Result<Option<Literal>, AssignmentError> {
    let pattern = format!(r"^{}[ \t]*=", regex::escape(name));
    let re = Regex::new(&pattern).map_err(|e| AssignmentError::Syntax(e.to_string()))?;

    // `==` is a comparison, not a binding.
    let value_starts: Vec<usize> = statement_starts(source)
        .into_iter()
        .filter_map(|start| re.find(&source[start..]).map(|m| start + m.end()))
        .filter(|&end| !source[end..].starts_with('='))
        .collect();

    match value_starts.as_slice() {
        [] => Ok(None),
        [start] => parse_statement_value(&source[*start..]).map(Some),
        many => Err(AssignmentError::Duplicate(many.len())),
    }
}

/// Byte offsets of column-zero lines that begin a new statement: not inside a
/// string, a bracketed expression or a backslash-continued line.
fn statement_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let mut depth = 0usize;
    let mut i = 0;

    while let Some(c) = source[i..].chars().next() {
        let rest = &source[i..];
        match c {
            '#' => {
                i += comment(rest).map_or(rest.len(), |(r, _)| rest.len() - r.len());
                continue;
            }
            '\'' | '"' => {
                // Re-read from the prefix so raw strings are skipped as raw. A string
                // that does not parse is left for the value parser to report.
                let prefix = source[..i]
                    .chars()
                    .rev()
                    .take_while(|p| "rRuUbB".contains(*p))
                    .take(2)
                    .count();
                if let Ok((r, _)) = string_piece(&source[i - prefix..]) {
                    i = source.len() - r.len();
                    continue;
                }
            }
            '\\' if rest[1..].starts_with('\n') => {
                i += 2;
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '\n' if depth == 0 => starts.push(i + 1),
            _ => {}
        }
        i += c.len_utf8();
    }
    starts
}

/// Parses the right-hand side of an assignment: one literal, then end of statement.
fn parse_statement_value(input: &str) -> Result<Literal, AssignmentError> {
    let mut statement = delimited(ws, literal, statement_end);
    match statement(input) {
        Ok((_, lit)) => Ok(lit),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(AssignmentError::Syntax(convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(AssignmentError::Syntax("Incomplete input".to_string())),
    }
}

// Trailing spaces, an optional comment, then a newline, `;` or end of input.
fn statement_end(input: &str) -> Res<()> {
    let (input, _) = take_while(|c| c == ' ' || c == '\t')(input)?;
    let (input, _) = opt(comment)(input)?;
    if input.is_empty() {
        return Ok((input, ()));
    }
    context(
        "end of statement (only literal values are supported)",
        value((), alt((tag("\r\n"), tag("\n"), tag(";")))),
    )(input)
}

// Whitespace, comments and line continuations.
fn ws(input: &str) -> Res<()> {
    value(
        (),
        many0(alt((value((), multispace1), comment, value((), tag("\\\n"))))),
    )(input)
}

fn comment(input: &str) -> Res<()> {
    value((), pair(char('#'), take_while(|c| c != '\n')))(input)
}

fn literal(input: &str) -> Res<Literal> {
    context(
        "literal",
        alt((dict, list, group, strings, number, constant)),
    )(input)
}

fn dict(input: &str) -> Res<Literal> {
    let (input, _) = char('{')(input)?;
    let (input, _) = ws(input)?;
    let (input, entries) = separated_list0(delimited(ws, char(','), ws), entry)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = opt(char(','))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(context("closing brace", char('}')))(input)?;
    Ok((input, Literal::Dict(entries)))
}

fn entry(input: &str) -> Res<(Literal, Literal)> {
    let (input, key) = literal(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(context("colon", char(':')))(input)?;
    let (input, _) = ws(input)?;
    let (input, val) = cut(literal)(input)?;
    Ok((input, (key, val)))
}

fn list(input: &str) -> Res<Literal> {
    let (input, _) = char('[')(input)?;
    let (input, (items, _)) = sequence_items(input)?;
    let (input, _) = cut(context("closing bracket", char(']')))(input)?;
    Ok((input, Literal::List(items)))
}

// Tuples and parenthesised values. `(x)` is just `x`; `(x,)` is a tuple.
fn group(input: &str) -> Res<Literal> {
    let (input, _) = char('(')(input)?;
    let (input, (mut items, trailing_comma)) = sequence_items(input)?;
    let (input, _) = cut(context("closing parenthesis", char(')')))(input)?;
    if items.len() == 1 && !trailing_comma {
        return Ok((input, items.remove(0)));
    }
    Ok((input, Literal::List(items)))
}

fn sequence_items(input: &str) -> Res<(Vec<Literal>, bool)> {
    let (input, _) = ws(input)?;
    let (input, items) = separated_list0(delimited(ws, char(','), ws), literal)(input)?;
    let (input, _) = ws(input)?;
    let (input, trailing) = opt(char(','))(input)?;
    let (input, _) = ws(input)?;
    Ok((input, (items, trailing.is_some())))
}

// Adjacent string literals concatenate.
fn strings(input: &str) -> Res<Literal> {
    let (input, first) = string_piece(input)?;
    let (input, rest) = many0(preceded(ws, string_piece))(input)?;
    let joined = rest.into_iter().fold(first, |mut acc, piece| {
        acc.push_str(&piece);
        acc
    });
    Ok((input, Literal::Str(joined)))
}

fn string_piece(input: &str) -> Res<String> {
    let (rest, prefix) = take_while_m_n(0, 2, |c: char| "rRuUbB".contains(c))(input)?;
    let raw = prefix.contains(['r', 'R']);
    let bytes = prefix.contains(['b', 'B']);
    let (body, quote) = alt((tag("'''"), tag("\"\"\""), tag("'"), tag("\"")))(rest)?;

    let mut out = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if body[i..].starts_with(quote) {
            return Ok((&body[i + quote.len()..], out));
        }
        match c {
            '\n' if quote.len() == 1 => break,
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                if raw {
                    out.push('\\');
                    out.push(escaped);
                    continue;
                }
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'a' => out.push('\x07'),
                    'b' => out.push('\x08'),
                    'f' => out.push('\x0c'),
                    'v' => out.push('\x0b'),
                    '\\' | '\'' | '"' => out.push(escaped),
                    '\n' => {}
                    '0'..='7' => {
                        let mut code = escaped.to_digit(8).unwrap_or_default();
                        for _ in 0..2 {
                            match chars.next_if(|(_, d)| d.is_digit(8)) {
                                Some((_, d)) => code = code * 8 + d.to_digit(8).unwrap_or_default(),
                                None => break,
                            }
                        }
                        out.push(decoded_escape(body, i, code)?);
                    }
                    'x' => out.push(hex_escape(body, i, &mut chars, 2)?),
                    'u' if !bytes => out.push(hex_escape(body, i, &mut chars, 4)?),
                    'U' if !bytes => out.push(hex_escape(body, i, &mut chars, 8)?),
                    'N' if !bytes => {
                        return Err(escape_error(&body[i..], "named unicode escape is not supported"));
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            other => out.push(other),
        }
    }

    Err(nom::Err::Failure(VerboseError {
        errors: vec![(input, VerboseErrorKind::Context("unterminated string"))],
    }))
}

// `\xNN`, `\uNNNN` and `\UNNNNNNNN`: exactly `width` hex digits.
fn hex_escape<'a>(
    body: &'a str,
    at: usize,
    chars: &mut Peekable<CharIndices<'a>>,
    width: usize,
) -> Result<char, nom::Err<VerboseError<&'a str>>> {
    let mut code = 0u32;
    for _ in 0..width {
        match chars.next_if(|(_, d)| d.is_ascii_hexdigit()) {
            Some((_, d)) => code = code * 16 + d.to_digit(16).unwrap_or_default(),
            None => return Err(escape_error(&body[at..], "truncated hex escape")),
        }
    }
    decoded_escape(body, at, code)
}

fn decoded_escape(body: &str, at: usize, code: u32) -> Result<char, nom::Err<VerboseError<&str>>> {
    char::from_u32(code).ok_or_else(|| escape_error(&body[at..], "escape is not a valid character"))
}

fn escape_error<'a>(at: &'a str, message: &'static str) -> nom::Err<VerboseError<&'a str>> {
    nom::Err::Failure(VerboseError {
        errors: vec![(at, VerboseErrorKind::Context(message))],
    })
}

fn number(input: &str) -> Res<Literal> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    let (input, text) = terminated(
        recognize(tuple((opt(one_of("+-")), mantissa, opt(exponent)))),
        not(identifier_char),
    )(input)?;
    Ok((input, Literal::Number(text.trim_start_matches('+').to_string())))
}

fn constant(input: &str) -> Res<Literal> {
    alt((
        value(Literal::None, keyword("None")),
        value(Literal::Bool(true), keyword("True")),
        value(Literal::Bool(false), keyword("False")),
    ))(input)
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    terminated(tag(word), not(identifier_char))
}

fn identifier_char(input: &str) -> Res<char> {
    satisfy(|c: char| c.is_alphanumeric() || c == '_')(input)
}
