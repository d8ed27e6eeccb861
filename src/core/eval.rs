// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Postfix evaluation and the expression pipeline entry point.
//!
//! [`evaluate_expression`] chains the tokenizer, the infix validator, the
//! shunting-yard conversion and the postfix walk. Every failure carries a
//! reason; no range clamping happens here, 16-bit truncation is the caller's
//! concern at the point a resolved value is stored.

use std::collections::HashMap;

use crate::core::infix::validate_infix;
use crate::core::shunting::to_postfix;
use crate::core::symbol_table::SymbolTable;
use crate::core::tokenizer::{tokenize, ExprError, ExprToken, Operator};

/// Merged symbol environment for one evaluation.
///
/// Built fresh per expression: global symbols first, then local symbols
/// (local shadows global), plus the load point for the `.` pseudo-symbol.
#[derive(Debug)]
pub struct EvalEnv {
    values: HashMap<String, i64>,
    load_point: i64,
}

impl EvalEnv {
    #[must_use]
    pub fn new(load_point: i64) -> Self {
        Self {
            values: HashMap::new(),
            load_point,
        }
    }

    #[must_use]
    pub fn with_scopes(
        load_point: i64,
        globals: &SymbolTable,
        locals: Option<&SymbolTable>,
    ) -> Self {
        let mut env = Self::new(load_point);
        env.merge(globals);
        if let Some(locals) = locals {
            env.merge(locals);
        }
        env
    }

    fn merge(&mut self, table: &SymbolTable) {
        for entry in table.iter() {
            if let Some(value) = entry.value {
                self.values.insert(entry.name.clone(), value);
            } else {
                // An unresolved forward definition shadows without binding.
                self.values.remove(&entry.name);
            }
        }
    }

    pub fn bind(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    #[must_use]
    pub fn load_point(&self) -> i64 {
        self.load_point
    }
}

/// Floor division, matching mathematical floor semantics for negative
/// operands (Rust's `/` truncates toward zero instead).
fn floor_div(lhs: i64, rhs: i64) -> i64 {
    let quot = lhs / rhs;
    let rem = lhs % rhs;
    if rem != 0 && (rem < 0) != (rhs < 0) {
        quot - 1
    } else {
        quot
    }
}

fn apply_binary(op: Operator, lhs: i64, rhs: i64) -> Result<i64, ExprError> {
    Ok(match op {
        Operator::Add => lhs.wrapping_add(rhs),
        Operator::Sub => lhs.wrapping_sub(rhs),
        Operator::Mult => lhs.wrapping_mul(rhs),
        Operator::Divide => {
            if rhs == 0 {
                return Err(ExprError::new("division by zero"));
            }
            floor_div(lhs, rhs)
        }
    })
}

/// Walk a postfix sequence with a value stack.
pub fn evaluate_rpn(rpn: &[ExprToken], env: &EvalEnv) -> Result<i64, ExprError> {
    let mut stack: Vec<i64> = Vec::new();

    for token in rpn {
        match token {
            ExprToken::Value(v) => stack.push(*v),
            ExprToken::LoadPoint => stack.push(env.load_point()),
            ExprToken::Name(name) => match env.lookup(name) {
                Some(value) => stack.push(value),
                None => {
                    return Err(ExprError::new(format!("name '{name}' is not defined")));
                }
            },
            ExprToken::Op(op) => {
                let rhs = stack.pop();
                let lhs = stack.pop();
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => stack.push(apply_binary(*op, lhs, rhs)?),
                    _ => return Err(ExprError::new("malformed postfix expression")),
                }
            }
            ExprToken::Open | ExprToken::Close => {
                return Err(ExprError::new("malformed postfix expression"));
            }
        }
    }

    if stack.len() != 1 {
        return Err(ExprError::new(
            "expression did not reduce to a single value",
        ));
    }
    Ok(stack[0])
}

/// Evaluate raw expression text against the merged scope environment.
pub fn evaluate_expression(
    text: &str,
    load_point: i64,
    globals: &SymbolTable,
    locals: Option<&SymbolTable>,
) -> Result<i64, ExprError> {
    let tokens =
        tokenize(text).map_err(|err| ExprError::new(format!("parse failed: {err}")))?;
    validate_infix(&tokens)?;
    let rpn = to_postfix(tokens);
    let env = EvalEnv::with_scopes(load_point, globals, locals);
    evaluate_rpn(&rpn, &env)
}
