//! The fixture expression language.
//!
//! Strings may embed expressions of the form `|<op><operand>|`:
//!
//! | Operator | Meaning                                       |
//! |----------|-----------------------------------------------|
//! | `~`      | random value, operand `category:subtype`      |
//! | `+`      | embed a registered fixture by name            |
//! | `*`      | structural query over every registered fixture|
//! | `>`      | embed a fixture file                          |
//! | `_`      | fixture by name, falling back to `<name>.json`|
//! | `:`      | property of the adjacent value on the left    |
//!
//! An expression never spans a line break. Anything that does not form an
//! expression is literal text.
//!
//! Every expression occurrence is a slot. String and number results are
//! written into the first slot still holding its expression, left to
//! right, so a string always comes back as text; a slot that receives no
//! result keeps its expression verbatim. Any other result (booleans, null,
//! arrays, objects) replaces the whole string, and if several are produced
//! the last one wins.
//!
//! `:` reads from the value produced by the expression right before it and
//! merges with it into one slot, so `|+user||:address||:city|` yields a
//! single result. A property that does not exist leaves that value in
//! place and keeps the `:` expression verbatim.

use std::fmt;

use hazy_core::value::{is_scalar_text, property, to_text};
use hazy_core::{Fixture, HazyError, Result};
use tracing::debug;

/// Message raised for an expression with a blank operand.
pub const EMPTY_EXPRESSION: &str = "Cannot define an empty expression";

/// Message raised for `:` without a left-hand value.
pub const MISSING_PROPERTY_TARGET: &str =
    "Syntax error, ':' requires a value on its left to read a property from";

/// Expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `:` property access.
    Property,
    /// `~` random value.
    Random,
    /// `+` registered fixture.
    Embed,
    /// `*` structural query.
    Query,
    /// `>` fixture file.
    File,
    /// `_` fixture or fixture file.
    Find,
}

impl Operator {
    /// Every operator.
    pub const ALL: [Self; 6] = [
        Self::Property,
        Self::Random,
        Self::Embed,
        Self::Query,
        Self::File,
        Self::Find,
    ];

    /// Returns the operator written as `c`.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(Self::Property),
            '~' => Some(Self::Random),
            '+' => Some(Self::Embed),
            '*' => Some(Self::Query),
            '>' => Some(Self::File),
            '_' => Some(Self::Find),
            _ => None,
        }
    }

    /// Returns the operator's character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Property => ':',
            Self::Random => '~',
            Self::Embed => '+',
            Self::Query => '*',
            Self::File => '>',
            Self::Find => '_',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single `|<op><operand>|` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// The operator.
    pub op: Operator,
    /// Text between the operator and the closing delimiter.
    pub operand: String,
    /// The expression exactly as written, delimiters included.
    pub raw: String,
}

/// A piece of tokenized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text outside any expression.
    Literal(String),
    /// An expression.
    Expr(Expression),
}

impl Segment {
    /// Returns true for expressions.
    #[must_use]
    pub const fn is_expr(&self) -> bool {
        matches!(self, Self::Expr(_))
    }
}

/// Splits text into literal and expression segments.
///
/// # Errors
///
/// Returns a syntax error if an expression has a blank operand.
///
/// # Examples
///
/// ```
/// use hazy_engine::lang::{tokenize, Operator, Segment};
///
/// let segments = tokenize("Hi |~person:first|!")?;
/// assert_eq!(segments.len(), 3);
/// assert!(matches!(&segments[1], Segment::Expr(e) if e.op == Operator::Random));
/// # Ok::<(), hazy_core::HazyError>(())
/// ```
pub fn tokenize(text: &str) -> Result<Vec<Segment>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'|' {
            if let Some(expr) = expression_at(text, pos) {
                let expr = expr?;
                if literal_start < pos {
                    segments.push(Segment::Literal(text[literal_start..pos].to_string()));
                }
                pos += expr.raw.len();
                literal_start = pos;
                segments.push(Segment::Expr(expr));
                continue;
            }
        }
        pos += 1;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(text[literal_start..].to_string()));
    }
    Ok(segments)
}

/// Reads the expression starting at the delimiter at `start`, if any.
fn expression_at(text: &str, start: usize) -> Option<Result<Expression>> {
    let op = text[start + 1..].chars().next().and_then(Operator::from_char)?;
    // Operator characters are all ASCII.
    let operand_start = start + 2;
    let end = operand_start + text[operand_start..].find(['|', '\n'])?;
    if text.as_bytes()[end] != b'|' {
        return None;
    }

    let operand = &text[operand_start..end];
    if operand.trim().is_empty() {
        return Some(Err(HazyError::syntax(EMPTY_EXPRESSION)));
    }
    Some(Ok(Expression {
        op,
        operand: operand.to_string(),
        raw: text[start..=end].to_string(),
    }))
}

/// Lookups the language delegates to its host.
pub trait Scope {
    /// Resolves `~category:subtype`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown categories or subtypes.
    fn random(&self, operand: &str) -> Result<Fixture>;

    /// Resolves `+name`. `None` leaves the expression verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if processing the fixture fails.
    fn embed(&self, name: &str) -> Result<Option<Fixture>>;

    /// Resolves `*pattern` to the list of matching fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid.
    fn query(&self, pattern: &str) -> Result<Vec<Fixture>>;

    /// Resolves `>path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    fn file(&self, path: &str) -> Result<Fixture>;

    /// Resolves `_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a fixture nor a file is found.
    fn find(&self, name: &str) -> Result<Fixture>;

    /// Whether to emit a debug event per evaluated expression.
    fn trace_expressions(&self) -> bool {
        false
    }
}

/// Evaluated piece of a string.
#[derive(Debug)]
enum Piece {
    Text(String),
    /// An expression slot. `value` is `None` when the lookup found nothing.
    Expr {
        raw: String,
        value: Option<Fixture>,
    },
}

impl Piece {
    fn unresolved(expr: &Expression) -> Self {
        Self::Expr {
            raw: expr.raw.clone(),
            value: None,
        }
    }
}

/// Expression evaluator bound to a [`Scope`].
#[derive(Debug)]
pub struct Lang<'a, S: Scope + ?Sized> {
    scope: &'a S,
}

impl<'a, S: Scope + ?Sized> Lang<'a, S> {
    /// Creates an evaluator that resolves lookups through `scope`.
    pub const fn new(scope: &'a S) -> Self {
        Self { scope }
    }

    /// Evaluates every expression in `text`.
    ///
    /// Text without expressions is returned unchanged as a string.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by tokenizing or by a lookup.
    pub fn process(&self, text: &str) -> Result<Fixture> {
        let Some(pieces) = self.evaluate(text)? else {
            return Ok(Fixture::String(text.to_string()));
        };

        let composite = pieces.iter().rev().find_map(|piece| match piece {
            Piece::Expr {
                value: Some(value), ..
            } if !is_scalar_text(value) => Some(value),
            _ => None,
        });
        if let Some(value) = composite {
            return Ok(value.clone());
        }

        Ok(Fixture::String(fill(&pieces, false)))
    }

    /// Evaluates every expression in `text` and always yields text.
    ///
    /// Non-scalar results are written as JSON too, so a document stays
    /// parseable after substitution.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by tokenizing or by a lookup.
    pub fn render(&self, text: &str) -> Result<String> {
        Ok(self
            .evaluate(text)?
            .map_or_else(|| text.to_string(), |pieces| fill(&pieces, true)))
    }

    /// Returns `None` when `text` holds no expression.
    fn evaluate(&self, text: &str) -> Result<Option<Vec<Piece>>> {
        let segments = tokenize(text)?;
        if !segments.iter().any(Segment::is_expr) {
            return Ok(None);
        }

        let mut pieces: Vec<Piece> = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                Segment::Literal(literal) => pieces.push(Piece::Text(literal)),
                Segment::Expr(expr) => {
                    let piece = self.resolve(&expr, &mut pieces)?;
                    if self.scope.trace_expressions() {
                        debug!(
                            op = %expr.op,
                            operand = %expr.operand,
                            resolved = matches!(piece, Piece::Expr { value: Some(_), .. }),
                            "Evaluated expression"
                        );
                    }
                    pieces.push(piece);
                }
            }
        }
        Ok(Some(pieces))
    }

    fn resolve(&self, expr: &Expression, pieces: &mut Vec<Piece>) -> Result<Piece> {
        let operand = expr.operand.trim();
        let value = match expr.op {
            Operator::Property => return read_property(expr, pieces),
            Operator::Random => Some(self.scope.random(operand)?),
            Operator::Embed => self.scope.embed(operand)?,
            Operator::Query => Some(Fixture::Array(self.scope.query(operand)?)),
            Operator::File => Some(self.scope.file(operand)?),
            Operator::Find => Some(self.scope.find(operand)?),
        };
        Ok(Piece::Expr {
            raw: expr.raw.clone(),
            value,
        })
    }
}

/// Resolves `:` against the piece right before it.
///
/// An adjacent result is consumed and merged into the returned slot, so
/// chains collapse into one value. Adjacent literal text is read as a
/// string and kept. A missing property puts the consumed result back.
fn read_property(expr: &Expression, pieces: &mut Vec<Piece>) -> Result<Piece> {
    let key = expr.operand.trim();
    match pieces.pop() {
        Some(Piece::Expr {
            raw,
            value: Some(target),
        }) if !target.is_null() => match property(&target, key) {
            Some(found) => Ok(Piece::Expr {
                raw: raw + &expr.raw,
                value: Some(found),
            }),
            None => {
                pieces.push(Piece::Expr {
                    raw,
                    value: Some(target),
                });
                Ok(Piece::unresolved(expr))
            }
        },
        Some(Piece::Text(text)) if !text.is_empty() => {
            let value = property(&Fixture::String(text.clone()), key);
            pieces.push(Piece::Text(text));
            Ok(Piece::Expr {
                raw: expr.raw.clone(),
                value,
            })
        }
        _ => Err(HazyError::syntax(MISSING_PROPERTY_TARGET)),
    }
}

/// Writes results into slots in order. Without `composites` only string
/// and number results are written.
fn fill(pieces: &[Piece], composites: bool) -> String {
    let mut results = pieces.iter().filter_map(|piece| match piece {
        Piece::Expr {
            value: Some(value), ..
        } if composites || is_scalar_text(value) => Some(to_text(value)),
        _ => None,
    });

    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Expr { raw, .. } => out.push_str(results.next().as_deref().unwrap_or(raw)),
        }
    }
    out
}
