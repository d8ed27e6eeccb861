// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the assembler.

use std::fmt;

use crate::report::{color, Color};

/// Per-line resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LineStatus {
    Ok,
    Warning,
    Error,
}

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    Expression,
    Instruction,
    Internal,
    Io,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A diagnostic tied to a source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub severity: Severity,
    pub message: String,
    pub source: String,
}

impl Diagnostic {
    /// Console rendering: the offending source text, then
    /// `file:line Severity: message` with the severity colored.
    pub fn format(&self, use_color: bool) -> String {
        let (label, tint) = match self.severity {
            Severity::Warning => ("Warning", Color::Yellow),
            Severity::Error => ("Error", Color::Red),
        };
        format!(
            "{}\n{}:{} {}: {}",
            self.source,
            self.file,
            self.line,
            color(label, tint, use_color),
            self.message
        )
    }
}

/// Fatal failure: invariant violations and I/O errors that abort the run.
#[derive(Debug)]
pub struct RunError {
    error: AsmError,
}

impl RunError {
    pub fn new(error: AsmError) -> Self {
        Self { error }
    }

    pub fn io(msg: &str, param: Option<&str>) -> Self {
        Self::new(AsmError::new(AsmErrorKind::Io, msg, param))
    }

    pub fn internal(msg: &str, param: Option<&str>) -> Self {
        Self::new(AsmError::new(AsmErrorKind::Internal, msg, param))
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunError {}

/// Error and warning totals over the line records.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassCounts {
    pub lines: u32,
    pub errors: u32,
    pub warnings: u32,
}

impl PassCounts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}
