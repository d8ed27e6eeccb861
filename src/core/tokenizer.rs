// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Expression tokenizer and normalizer.
//!
//! Splits raw expression text into a flat sequence of typed tokens and folds
//! leading / parenthesis-adjacent unary signs into binary form, so the later
//! stages never see a unary operator.

use std::fmt;

use crate::core::names::validate_name;

/// The four binary expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    Divide,
}

impl Operator {
    pub fn glyph(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mult => '*',
            Operator::Divide => '/',
        }
    }
}

/// One expression token.
///
/// The load point (the `.` pseudo-symbol for the current location counter)
/// is a dedicated variant distinguished by value equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprToken {
    Value(i64),
    Name(String),
    LoadPoint,
    Op(Operator),
    Open,
    Close,
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprToken::Value(v) => write!(f, "{v}"),
            ExprToken::Name(name) => write!(f, "{name}"),
            ExprToken::LoadPoint => write!(f, "."),
            ExprToken::Op(op) => write!(f, "{}", op.glyph()),
            ExprToken::Open => write!(f, "("),
            ExprToken::Close => write!(f, ")"),
        }
    }
}

/// Error from any stage of the expression pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    message: String,
}

impl ExprError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExprError {}

/// Fixed-point scale applied to fractional literals.
const FRACTION_SCALE: f64 = 0x8000 as f64;

/// Tokenize expression text into normalized tokens.
///
/// Splitting happens on whitespace and on every operator or parenthesis
/// character; each surviving fragment is classified as exactly one token.
pub fn tokenize(text: &str) -> Result<Vec<ExprToken>, ExprError> {
    let mut tokens = Vec::new();
    for term in split_terms(text) {
        tokens.push(classify(term)?);
    }
    Ok(fold_unaries(tokens))
}

/// Split raw text into operator/parenthesis characters and the fragments
/// between them, discarding whitespace and empty fragments.
fn split_terms(text: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() || is_delimiter(c) {
            if let Some(s) = start.take() {
                terms.push(&text[s..idx]);
            }
            if is_delimiter(c) {
                terms.push(&text[idx..idx + c.len_utf8()]);
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        terms.push(&text[s..]);
    }
    terms
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '(' | ')')
}

fn classify(term: &str) -> Result<ExprToken, ExprError> {
    match term {
        "." => return Ok(ExprToken::LoadPoint),
        "+" => return Ok(ExprToken::Op(Operator::Add)),
        "-" => return Ok(ExprToken::Op(Operator::Sub)),
        "*" => return Ok(ExprToken::Op(Operator::Mult)),
        "/" => return Ok(ExprToken::Op(Operator::Divide)),
        "(" => return Ok(ExprToken::Open),
        ")" => return Ok(ExprToken::Close),
        _ => {}
    }

    let first = term.chars().next().unwrap_or(' ');
    if first.is_ascii_digit() && !term.contains('_') {
        return numeric_literal(term);
    }
    if let Some(rest) = term.strip_prefix("=X") {
        return hex_literal(term, rest);
    }
    if let Some(rest) = term.strip_prefix("=C") {
        return char_literal(term, rest);
    }

    match validate_name(term) {
        Ok(()) => Ok(ExprToken::Name(term.to_string())),
        Err(reason) => Err(ExprError::new(format!("invalid term {term} ({reason})"))),
    }
}

/// Decimal or fractional literal. A fraction `f` becomes
/// `trunc(0x8000 * f)`, truncation toward zero.
fn numeric_literal(term: &str) -> Result<ExprToken, ExprError> {
    let value = match term.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f: f64 = term
                .parse()
                .map_err(|_| ExprError::new(format!("invalid numeric literal '{term}'")))?;
            (FRACTION_SCALE * f) as i64
        }
    };

    if !(-32768..=32767).contains(&value) {
        return Err(ExprError::new(format!("{term} exceeds allowed range")));
    }
    Ok(ExprToken::Value(value))
}

/// `=X` hex literal, 1 to 4 digits, signed 16-bit reinterpretation.
fn hex_literal(term: &str, digits: &str) -> Result<ExprToken, ExprError> {
    let n = digits.len();
    if n < 1 || n > 4 {
        return Err(ExprError::new(format!(
            "hex literal {term} must have 1 to 4 digits"
        )));
    }
    let mut value = i64::from_str_radix(digits, 16)
        .map_err(|_| ExprError::new(format!("invalid hex literal '{term}'")))?;
    if value >= 0x8000 {
        value -= 0x10000;
    }
    Ok(ExprToken::Value(value))
}

/// `=C` character literal: 1 or 2 characters between matching quotes,
/// packed big endian, signed 16-bit reinterpretation.
fn char_literal(term: &str, quoted: &str) -> Result<ExprToken, ExprError> {
    let n = quoted.len();
    let bytes = quoted.as_bytes();
    let quote_ok = n >= 3
        && n <= 4
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[0] == bytes[n - 1];
    if !quote_ok {
        return Err(ExprError::new(format!(
            "invalid character literal {term}"
        )));
    }

    let mut value: i64 = 0;
    for &b in &bytes[1..n - 1] {
        value = value * 256 + i64::from(b);
    }
    if value >= 0x8000 {
        value -= 0x10000;
    }
    Ok(ExprToken::Value(value))
}

/// Drop redundant unary `+` and rewrite unary `-`.
///
/// A unary position holds at the start of the sequence and immediately after
/// an opening parenthesis. A unary `-` directly before an integer literal is
/// folded into the literal; before anything else it becomes `0 -`.
fn fold_unaries(tokens: Vec<ExprToken>) -> Vec<ExprToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut unary_ok = true;
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let opens = matches!(token, ExprToken::Open);
        if unary_ok {
            match token {
                ExprToken::Op(Operator::Add) => {}
                ExprToken::Op(Operator::Sub) => {
                    if matches!(iter.peek(), Some(ExprToken::Value(_))) {
                        if let Some(ExprToken::Value(v)) = iter.next() {
                            out.push(ExprToken::Value(-v));
                        }
                    } else {
                        out.push(ExprToken::Value(0));
                        out.push(ExprToken::Op(Operator::Sub));
                    }
                }
                other => out.push(other),
            }
        } else {
            out.push(token);
        }
        unary_ok = opens;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<ExprToken> {
        tokenize(text).expect("tokenize")
    }

    #[test]
    fn splits_on_operators_without_spaces() {
        assert_eq!(
            toks("3+4*2"),
            vec![
                ExprToken::Value(3),
                ExprToken::Op(Operator::Add),
                ExprToken::Value(4),
                ExprToken::Op(Operator::Mult),
                ExprToken::Value(2),
            ]
        );
    }

    #[test]
    fn recognizes_load_point_and_names() {
        assert_eq!(
            toks(". + LOOP"),
            vec![
                ExprToken::LoadPoint,
                ExprToken::Op(Operator::Add),
                ExprToken::Name("LOOP".to_string()),
            ]
        );
    }

    #[test]
    fn hex_literals_reinterpret_as_signed() {
        assert_eq!(toks("=X0005"), vec![ExprToken::Value(5)]);
        assert_eq!(toks("=X8000"), vec![ExprToken::Value(-32768)]);
        assert_eq!(toks("=XFFFF"), vec![ExprToken::Value(-1)]);
        assert!(tokenize("=X12345").is_err());
        assert!(tokenize("=XZZ").is_err());
    }

    #[test]
    fn char_literals_pack_big_endian() {
        assert_eq!(toks("=C\"A\""), vec![ExprToken::Value(0x41)]);
        assert_eq!(toks("=C\"AB\""), vec![ExprToken::Value(0x4142)]);
        assert_eq!(toks("=C'A'"), vec![ExprToken::Value(0x41)]);
        assert!(tokenize("=C\"ABC\"").is_err());
        assert!(tokenize("=C\"A'").is_err());
        assert!(tokenize("=C\"\"").is_err());
    }

    #[test]
    fn fractional_literals_scale_and_truncate() {
        assert_eq!(toks("0.5"), vec![ExprToken::Value(0x4000)]);
        assert_eq!(toks("0.0"), vec![ExprToken::Value(0)]);
        // 0x8000 * 0.6 = 19660.8 truncates toward zero.
        assert_eq!(toks("0.6"), vec![ExprToken::Value(19660)]);
    }

    #[test]
    fn decimal_range_is_gated() {
        assert_eq!(toks("32767"), vec![ExprToken::Value(32767)]);
        assert!(tokenize("32768").is_err());
        assert!(tokenize("0.9").is_ok());
        assert!(tokenize("1.5").is_err()); // 0x8000 * 1.5 exceeds the range
    }

    #[test]
    fn underscores_are_not_numbers() {
        assert!(tokenize("1_0").is_err());
    }

    #[test]
    fn unary_plus_is_dropped() {
        assert_eq!(toks("+5"), vec![ExprToken::Value(5)]);
    }

    #[test]
    fn unary_minus_folds_into_literals() {
        assert_eq!(toks("-5"), vec![ExprToken::Value(-5)]);
        assert_eq!(toks("(-5)"), vec![
            ExprToken::Open,
            ExprToken::Value(-5),
            ExprToken::Close,
        ]);
    }

    #[test]
    fn unary_minus_rewrites_symbols_as_subtraction() {
        assert_eq!(
            toks("-X"),
            vec![
                ExprToken::Value(0),
                ExprToken::Op(Operator::Sub),
                ExprToken::Name("X".to_string()),
            ]
        );
        assert_eq!(
            toks("-."),
            vec![
                ExprToken::Value(0),
                ExprToken::Op(Operator::Sub),
                ExprToken::LoadPoint,
            ]
        );
    }

    #[test]
    fn unary_position_ends_after_a_term() {
        // The minus after `5` is an ordinary binary operator.
        assert_eq!(
            toks("5-3"),
            vec![
                ExprToken::Value(5),
                ExprToken::Op(Operator::Sub),
                ExprToken::Value(3),
            ]
        );
    }

    #[test]
    fn bad_terms_name_the_fragment() {
        let err = tokenize("lower").unwrap_err();
        assert!(err.message().contains("lower"), "{err}");
        let err = tokenize("BEGIN+1").unwrap_err();
        assert!(err.message().contains("reserved"), "{err}");
    }
}
