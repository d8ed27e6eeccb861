// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Infix to postfix conversion (shunting yard).
//!
//! Input must already have passed [`crate::core::infix::validate_infix`];
//! this stage performs no validation of its own.

use crate::core::tokenizer::{ExprToken, Operator};

/// Operator precedence. All four operators are left-associative.
fn precedence(op: Operator) -> u8 {
    match op {
        Operator::Add | Operator::Sub => 0,
        Operator::Mult | Operator::Divide => 5,
    }
}

/// Reorder a validated infix sequence into postfix order.
pub fn to_postfix(tokens: Vec<ExprToken>) -> Vec<ExprToken> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<ExprToken> = Vec::new();

    for token in tokens {
        match token {
            ExprToken::Op(op) => {
                while let Some(ExprToken::Op(top)) = stack.last() {
                    // Left-associative: pop while the stacked operator binds
                    // at least as tightly.
                    if precedence(op) > precedence(*top) {
                        break;
                    }
                    if let Some(popped) = stack.pop() {
                        output.push(popped);
                    }
                }
                stack.push(ExprToken::Op(op));
            }
            ExprToken::Open => stack.push(ExprToken::Open),
            ExprToken::Close => {
                while let Some(top) = stack.pop() {
                    if matches!(top, ExprToken::Open) {
                        break;
                    }
                    output.push(top);
                }
            }
            other => output.push(other),
        }
    }

    while let Some(top) = stack.pop() {
        output.push(top);
    }

    output
}
