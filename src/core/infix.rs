// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Infix grammar validation.
//!
//! A small finite-state walk over token categories that rejects illegal
//! adjacencies and unbalanced parentheses before conversion to postfix.

use crate::core::tokenizer::{ExprError, ExprToken};

/// Token category for the adjacency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Start,
    BinaryOp,
    Term,
    Open,
    Close,
    End,
}

fn kind_of(token: &ExprToken) -> Kind {
    match token {
        ExprToken::Op(_) => Kind::BinaryOp,
        ExprToken::Open => Kind::Open,
        ExprToken::Close => Kind::Close,
        ExprToken::Value(_) | ExprToken::Name(_) | ExprToken::LoadPoint => Kind::Term,
    }
}

/// Allow-list of legal (previous, next) category pairs.
fn pair_allowed(prev: Kind, next: Kind) -> bool {
    matches!(
        (prev, next),
        (Kind::Start, Kind::Term)
            | (Kind::Start, Kind::Open)
            | (Kind::BinaryOp, Kind::Term)
            | (Kind::BinaryOp, Kind::Open)
            | (Kind::Term, Kind::BinaryOp)
            | (Kind::Term, Kind::Close)
            | (Kind::Term, Kind::End)
            | (Kind::Open, Kind::Term)
            | (Kind::Open, Kind::Open)
            | (Kind::Close, Kind::BinaryOp)
            | (Kind::Close, Kind::Close)
            | (Kind::Close, Kind::End)
    )
}

/// Sanity-check a normalized infix token sequence.
///
/// Returns the first illegal adjacency or parenthesis imbalance as an error
/// naming the offending token and its predecessor.
pub fn validate_infix(tokens: &[ExprToken]) -> Result<(), ExprError> {
    if tokens.is_empty() {
        return Err(ExprError::new("empty expression"));
    }

    let mut last_kind = Kind::Start;
    let mut last_text = "start of expression".to_string();
    let mut depth = 0i32;

    for token in tokens {
        let kind = kind_of(token);
        match kind {
            Kind::Open => depth += 1,
            Kind::Close => {
                depth -= 1;
                if depth < 0 {
                    return Err(ExprError::new("un-balanced '(' and ')'"));
                }
            }
            _ => {}
        }

        if !pair_allowed(last_kind, kind) {
            return Err(ExprError::new(format!(
                "'{token}' cannot immediately follow '{last_text}'"
            )));
        }

        last_kind = kind;
        last_text = token.to_string();
    }

    if depth != 0 {
        return Err(ExprError::new("un-balanced '(' and ')'"));
    }

    if !pair_allowed(last_kind, Kind::End) {
        return Err(ExprError::new(format!(
            "end of expression cannot immediately follow '{last_text}'"
        )));
    }

    Ok(())
}
