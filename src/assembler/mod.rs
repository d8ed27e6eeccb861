// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! DataCode1 two-pass assembler - main entry point.
//!
//! Pass 0 reads source files into line records. Pass 1 defines symbols and
//! resolves address-affecting directives; pass 2 repeats the walk with a
//! complete symbol environment and encodes instructions and data. Every
//! operand is an expression routed through [`crate::core::eval`].

pub mod cli;
pub mod encoder;
pub mod error;
pub mod listing;
#[cfg(test)]
mod tests;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::eval::evaluate_expression;
use crate::core::imagestore::{CodeImage, ImageHeader};
use crate::core::names::validate_name;
use crate::core::symbol_table::{SymbolEntry, SymbolTable};
use crate::core::text_utils::{split_comment, value_to_bytes};
use crate::core::tokenizer::ExprError;

use cli::{resolve_output_paths, Cli, VERSION};
use error::{Diagnostic, LineStatus, PassCounts, RunError, Severity};
use listing::{write_map, ListingWriter};

/// Fixed code origin: 0x9000 reinterpreted as a signed 16-bit value.
pub const CODE_ORIGIN: i64 = -28672;

/// Classified kind of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Unknown,
    Empty,
    Comment,
    AlpDirective,
    DataDirective,
    ScopeBegin,
    ScopeEnd,
    Label,
    SymbolDef,
    EntryDirective,
    ExternalDirective,
    FinishDirective,
    Expression,
    Data,
    Instruction,
}

/// Addressing region selected by the `ALP`/`DATA` directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Alp,
    Data,
}

/// One physical source line, created in pass 0 and mutated in place by the
/// two resolution passes.
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub file: String,
    pub lineno: u32,
    pub text: String,
    pub kind: LineKind,
    pub status: LineStatus,
    pub message: String,
    pub addr: Option<i64>,
    pub code: Option<Vec<u8>>,
    /// Pass-1 resolution of an `ALP,`/`DATA,` address expression, so pass 2
    /// never re-evaluates it. `Some(None)` records a failed resolution.
    pub(crate) new_address: Option<Option<i64>>,
    /// Local scope opened by this `BEGIN` line during pass 1.
    pub(crate) scope: Option<usize>,
}

impl LineRecord {
    fn new(file: &str, lineno: u32, text: &str) -> Self {
        Self {
            file: file.to_string(),
            lineno,
            text: text.to_string(),
            kind: LineKind::Unknown,
            status: LineStatus::Ok,
            message: String::new(),
            addr: None,
            code: None,
            new_address: None,
            scope: None,
        }
    }
}

/// Core assembler state.
#[derive(Debug)]
pub struct Assembler {
    records: Vec<LineRecord>,
    globals: SymbolTable,
    locals: Vec<SymbolTable>,
    jump_to: i64,
    missing_end: bool,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            globals: SymbolTable::new(),
            locals: Vec::new(),
            jump_to: CODE_ORIGIN,
            missing_end: false,
        }
    }

    /// Pass 0 for one file: read every line into a record.
    pub fn load_source(&mut self, path: &Path) -> Result<(), RunError> {
        let name = path.to_string_lossy().to_string();
        let text = fs::read_to_string(path)
            .map_err(|err| RunError::io(&format!("Error reading source: {err}"), Some(&name)))?;
        self.load_text(&name, &text);
        Ok(())
    }

    /// Pass 0 from in-memory text.
    pub fn load_text(&mut self, file: &str, text: &str) {
        for (idx, line) in text.lines().enumerate() {
            self.records
                .push(LineRecord::new(file, idx as u32 + 1, line));
        }
    }

    /// Run both resolution passes over the loaded records.
    pub fn assemble(&mut self) -> Result<(), RunError> {
        tracing::debug!("pass 1");
        self.run_pass(1)?;
        tracing::debug!("pass 2");
        self.run_pass(2)?;
        Ok(())
    }

    fn run_pass(&mut self, pass: u8) -> Result<(), RunError> {
        let mut addr = CODE_ORIGIN;
        let mut mode = Mode::Alp;
        let mut scope: Option<usize> = None;

        for idx in 0..self.records.len() {
            self.process_line(idx, pass, &mut addr, &mut mode, &mut scope)?;
        }

        self.missing_end = scope.is_some();
        Ok(())
    }

    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    pub fn globals(&self) -> &SymbolTable {
        &self.globals
    }

    #[must_use]
    pub fn jump_target(&self) -> i64 {
        self.jump_to
    }

    #[must_use]
    pub fn missing_end(&self) -> bool {
        self.missing_end
    }

    /// Error/warning totals over the records, including the trailing
    /// missing-`END` warning.
    #[must_use]
    pub fn counts(&self) -> PassCounts {
        let mut counts = PassCounts::new();
        counts.lines = self.records.len() as u32;
        for rec in &self.records {
            match rec.status {
                LineStatus::Error => counts.errors += 1,
                LineStatus::Warning => counts.warnings += 1,
                LineStatus::Ok => {}
            }
        }
        if self.missing_end {
            counts.warnings += 1;
        }
        counts
    }

    /// Collect per-line code fragments, in source order.
    #[must_use]
    pub fn image(&self) -> CodeImage {
        let mut image = CodeImage::new();
        for rec in &self.records {
            if let (Some(addr), Some(code)) = (rec.addr, rec.code.as_ref()) {
                image.push(addr, code);
            }
        }
        image
    }

    /// Console diagnostics for every non-ok record.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for rec in &self.records {
            let severity = match rec.status {
                LineStatus::Error => Severity::Error,
                LineStatus::Warning => Severity::Warning,
                LineStatus::Ok => continue,
            };
            out.push(Diagnostic {
                file: rec.file.clone(),
                line: rec.lineno,
                severity,
                message: rec.message.clone(),
                source: rec.text.clone(),
            });
        }
        if self.missing_end {
            if let Some(last) = self.records.last() {
                out.push(Diagnostic {
                    file: last.file.clone(),
                    line: last.lineno + 1,
                    severity: Severity::Warning,
                    message: "Missing END".to_string(),
                    source: String::new(),
                });
            }
        }
        out
    }

    fn eval(&self, expr: &str, addr: i64, scope: Option<usize>) -> Result<i64, ExprError> {
        let locals = scope.map(|id| &self.locals[id]);
        evaluate_expression(expr, addr, &self.globals, locals)
    }

    fn set_error(&mut self, idx: usize, message: &str) {
        let rec = &mut self.records[idx];
        rec.status = LineStatus::Error;
        rec.message = message.to_string();
    }

    fn set_warning(&mut self, idx: usize, message: &str) {
        let rec = &mut self.records[idx];
        rec.status = LineStatus::Warning;
        rec.message = message.to_string();
    }

    /// One line-dispatch decision tree, shared by both passes.
    fn process_line(
        &mut self,
        idx: usize,
        pass: u8,
        addr: &mut i64,
        mode: &mut Mode,
        scope: &mut Option<usize>,
    ) -> Result<(), RunError> {
        let text = self.records[idx].text.clone();
        let file = self.records[idx].file.clone();
        let lineno = self.records[idx].lineno;

        let (code_text, comment) = split_comment(&text);
        let line = code_text.trim();

        if line.is_empty() {
            self.records[idx].kind = if comment.is_some() {
                LineKind::Comment
            } else {
                LineKind::Empty
            };
            return Ok(());
        }

        if line == "BEGIN" {
            if scope.is_none() {
                self.records[idx].kind = LineKind::ScopeBegin;
                if pass == 1 {
                    self.locals.push(SymbolTable::new());
                    self.records[idx].scope = Some(self.locals.len() - 1);
                }
                // Pass 2 reuses the scope created in pass 1 so that names
                // defined inside the block resolve identically.
                match self.records[idx].scope {
                    Some(id) => *scope = Some(id),
                    None => {
                        return Err(RunError::internal(
                            "BEGIN scope missing from pass 1",
                            Some(&format!("{file}:{lineno}")),
                        ))
                    }
                }
            } else {
                self.set_error(idx, "Nested BEGIN");
            }
            return Ok(());
        }

        if line == "END" {
            if scope.is_some() {
                self.records[idx].kind = LineKind::ScopeEnd;
                *scope = None;
            } else {
                self.set_error(idx, "Unexpected END");
            }
            return Ok(());
        }

        if let Some(name) = line.strip_suffix(':') {
            self.handle_label(idx, name.trim(), pass, *addr, *scope, &file, lineno);
            return Ok(());
        }

        if is_symbol_definition(line) {
            self.handle_symbol_definition(idx, line, pass, *addr, *scope, &file, lineno);
            return Ok(());
        }

        if line.starts_with("ALP") {
            self.records[idx].kind = LineKind::AlpDirective;
            *mode = Mode::Alp;
            if line == "ALP" {
                // Round the address up to even.
                *addr += addr.rem_euclid(2);
            } else if let Some(expr) = line.strip_prefix("ALP,") {
                self.relocate(idx, expr, pass, addr, *scope, true, "ALP");
            } else {
                self.set_error(idx, "Mal-formed ALP directive");
            }
            return Ok(());
        }

        if line.starts_with("DATA") {
            self.records[idx].kind = LineKind::DataDirective;
            *mode = Mode::Data;
            if line == "DATA" {
                // Stand-alone: mode switch only.
            } else if let Some(expr) = line.strip_prefix("DATA,") {
                self.relocate(idx, expr, pass, addr, *scope, false, "DATA");
            } else {
                self.set_error(idx, "Mal-formed DATA directive");
            }
            return Ok(());
        }

        if line.starts_with("ENTRY") {
            self.records[idx].kind = LineKind::EntryDirective;
            self.set_error(idx, "Extended DataCode ENTRY directive not supported yet");
            return Ok(());
        }

        if line.starts_with("EXTERNAL") {
            self.records[idx].kind = LineKind::ExternalDirective;
            self.set_error(
                idx,
                "Extended DataCode EXTERNAL directive not supported yet",
            );
            return Ok(());
        }

        if line.starts_with("FINISH") && line.ends_with(';') {
            self.records[idx].kind = LineKind::FinishDirective;
            if line == "FINISH;" {
                // Stand-alone: the default jump target stands.
            } else if let Some(rest) = line.strip_prefix("FINISH,") {
                let expr = &rest[..rest.len() - 1];
                match self.eval(expr, *addr, *scope) {
                    Ok(target) => self.jump_to = target,
                    Err(_) if pass == 2 => self.set_error(idx, "FINISH directive unresolved"),
                    Err(_) => {}
                }
            } else {
                self.set_error(idx, "Mal-formed FINISH directive");
            }
            return Ok(());
        }

        if *mode == Mode::Data {
            self.handle_data_line(idx, line, addr);
            return Ok(());
        }

        if let Some(expr) = line.strip_prefix("=E ") {
            return self.handle_expression_line(idx, expr, pass, addr, *scope, &file, lineno);
        }

        self.handle_instruction(idx, line, pass, addr, *scope, &file, lineno)
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_label(
        &mut self,
        idx: usize,
        name: &str,
        pass: u8,
        addr: i64,
        scope: Option<usize>,
        file: &str,
        lineno: u32,
    ) {
        if let Err(reason) = validate_name(name) {
            self.set_error(idx, &format!("Invalid label format: {reason}."));
            return;
        }

        let scope_name = if scope.is_some() { "local" } else { "global" };
        let existing = self
            .scope_table(scope)
            .entry(name)
            .map(|entry| format!("{}:{}", entry.file, entry.lineno));

        match existing {
            None => {
                let entry = SymbolEntry {
                    name: name.to_string(),
                    file: file.to_string(),
                    lineno,
                    value: Some(addr),
                };
                let _ = self.scope_table_mut(scope).define_once(entry);
                let rec = &mut self.records[idx];
                rec.kind = LineKind::Label;
                rec.addr = Some(addr);
            }
            // Duplicates are expected on pass 2; only pass 1 checks.
            Some(original) if pass == 1 => {
                self.set_error(
                    idx,
                    &format!(
                        "Duplicate {scope_name} name: {name} - initial declaration: {original}"
                    ),
                );
            }
            Some(_) => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_symbol_definition(
        &mut self,
        idx: usize,
        line: &str,
        pass: u8,
        addr: i64,
        scope: Option<usize>,
        file: &str,
        lineno: u32,
    ) {
        self.records[idx].kind = LineKind::SymbolDef;

        let eq = line.find('=').unwrap_or(0);
        let name = line[..eq].trim();
        let expr = line[eq + 1..].trim();

        if let Err(reason) = validate_name(name) {
            self.set_error(idx, &format!("Invalid name format: {reason}."));
            return;
        }

        let scope_name = if scope.is_some() { "local" } else { "global" };
        if pass == 1 {
            if let Some(existing) = self.scope_table(scope).entry(name) {
                let original = format!("{}:{}", existing.file, existing.lineno);
                self.set_error(
                    idx,
                    &format!(
                        "Duplicate {scope_name} name: {name} - initial declaration: {original}"
                    ),
                );
            }
        }

        // The definition is stored even while unresolved so duplicate
        // detection and shadowing behave the same on both passes.
        let result = self.eval(expr, addr, scope);
        let entry = SymbolEntry {
            name: name.to_string(),
            file: file.to_string(),
            lineno,
            value: result.as_ref().ok().copied(),
        };
        let _ = self.scope_table_mut(scope).define(entry);

        if pass == 2 {
            if let Err(err) = result {
                self.set_error(idx, &format!("{err}."));
            }
        }
    }

    /// `ALP,<expr>` / `DATA,<expr>`: the address expression must resolve
    /// during pass 1; pass 2 replays the recorded result.
    #[allow(clippy::too_many_arguments)]
    fn relocate(
        &mut self,
        idx: usize,
        expr: &str,
        pass: u8,
        addr: &mut i64,
        scope: Option<usize>,
        round_up: bool,
        directive: &str,
    ) {
        if pass == 1 {
            match self.eval(expr, *addr, scope) {
                Ok(mut new_address) => {
                    if round_up {
                        new_address += new_address.rem_euclid(2);
                    }
                    *addr = new_address;
                    self.records[idx].new_address = Some(Some(new_address));
                }
                Err(err) => {
                    self.records[idx].new_address = Some(None);
                    self.set_error(
                        idx,
                        &format!("{directive} directive must resolve in pass 1: {err}"),
                    );
                }
            }
        } else if let Some(Some(new_address)) = self.records[idx].new_address {
            *addr = new_address;
        }
    }

    /// DATA-mode payload lines: `=X<hex pairs>` or `=C"text"`.
    fn handle_data_line(&mut self, idx: usize, line: &str, addr: &mut i64) {
        if let Some(hex_line) = line.strip_prefix("=X") {
            self.records[idx].kind = LineKind::Data;
            self.records[idx].addr = Some(*addr);
            let n = hex_line.len();
            if n % 2 == 1 {
                // Even if invalid, this keeps the addressing roughly right.
                *addr += ((n + 1) / 2) as i64;
                self.set_error(idx, "Odd number of hex digits");
                return;
            }

            let mut data = Vec::with_capacity(n / 2);
            for j in 0..n / 2 {
                let pair = &hex_line[2 * j..2 * j + 2];
                match u8::from_str_radix(pair, 16) {
                    Ok(byte) => data.push(byte),
                    Err(_) => {
                        *addr += (n / 2) as i64;
                        self.set_error(idx, &format!("Invalid hex digits: {pair}"));
                        return;
                    }
                }
            }
            *addr += data.len() as i64;
            self.records[idx].code = Some(data);
        } else if let Some(char_line) = line.strip_prefix("=C") {
            self.records[idx].kind = LineKind::Data;
            self.records[idx].addr = Some(*addr);
            let bytes = char_line.as_bytes();
            let n = bytes.len();
            if n < 2 || bytes[0] != b'"' || bytes[n - 1] != b'"' {
                *addr += n as i64 - 2;
                self.set_error(idx, "Miss-quoted string");
                return;
            }
            let payload = &bytes[1..n - 1];
            *addr += payload.len() as i64;
            self.records[idx].code = Some(payload.to_vec());
        } else {
            self.set_error(idx, "Unknown data type");
        }
    }

    /// `=E <expr>`: a 16-bit value emitted at the current address.
    #[allow(clippy::too_many_arguments)]
    fn handle_expression_line(
        &mut self,
        idx: usize,
        expr: &str,
        pass: u8,
        addr: &mut i64,
        scope: Option<usize>,
        file: &str,
        lineno: u32,
    ) -> Result<(), RunError> {
        self.records[idx].kind = LineKind::Expression;
        self.check_address_replay(idx, pass, *addr, file, lineno)?;
        self.records[idx].addr = Some(*addr);

        match self.eval(expr, *addr, scope) {
            Ok(value) => {
                self.records[idx].code = Some(value_to_bytes(value).to_vec());
                if !(-32768..=32767).contains(&value) {
                    self.set_warning(idx, &format!("Expression value ({value}) out of range"));
                }
            }
            Err(err) => {
                if pass == 2 {
                    self.set_error(idx, &format!("{err}."));
                }
            }
        }

        if *addr < -0x8000 {
            self.set_error(idx, "Address less than =X8000");
        } else if *addr >= 0x7FFF {
            self.set_error(idx, "Address exceeds =X7FFF");
        }

        *addr += 2;
        Ok(())
    }

    /// Anything left is an instruction (or nonsense). Pass 1 only advances
    /// the counter; operands may reference forward symbols.
    #[allow(clippy::too_many_arguments)]
    fn handle_instruction(
        &mut self,
        idx: usize,
        line: &str,
        pass: u8,
        addr: &mut i64,
        scope: Option<usize>,
        file: &str,
        lineno: u32,
    ) -> Result<(), RunError> {
        self.check_address_replay(idx, pass, *addr, file, lineno)?;
        self.records[idx].addr = Some(*addr);

        if pass == 1 {
            *addr += 2;
            return Ok(());
        }

        let locals = scope.map(|id| &self.locals[id]);
        match encoder::encode(line, *addr, &self.globals, locals) {
            Ok(code) => {
                let rec = &mut self.records[idx];
                rec.kind = LineKind::Instruction;
                rec.code = Some(value_to_bytes(i64::from(code)).to_vec());
            }
            Err(err) => self.set_error(idx, err.message()),
        }

        if *addr < -0x8000 {
            self.set_error(idx, "Address less than =X8000");
        } else if *addr >= 0x7FFF {
            self.set_error(idx, "Address exceeds =X7FFF");
        }
        *addr += 2;
        Ok(())
    }

    /// The pass-2 location-counter walk must reproduce the pass-1 address;
    /// divergence is an internal-consistency failure, not a user error.
    fn check_address_replay(
        &self,
        idx: usize,
        pass: u8,
        addr: i64,
        file: &str,
        lineno: u32,
    ) -> Result<(), RunError> {
        if pass == 2 && self.records[idx].addr != Some(addr) {
            return Err(RunError::internal(
                "pass1/pass2 address mis-match",
                Some(&format!("{file}:{lineno}")),
            ));
        }
        Ok(())
    }

    fn scope_table(&self, scope: Option<usize>) -> &SymbolTable {
        match scope {
            Some(id) => &self.locals[id],
            None => &self.globals,
        }
    }

    fn scope_table_mut(&mut self, scope: Option<usize>) -> &mut SymbolTable {
        match scope {
            Some(id) => &mut self.locals[id],
            None => &mut self.globals,
        }
    }
}

/// `NAME = expression` detection: an `=` past the first column and no comma
/// anywhere (which would make the `=` part of an instruction operand).
fn is_symbol_definition(line: &str) -> bool {
    match line.find('=') {
        Some(0) | None => false,
        Some(_) => !line.contains(','),
    }
}

/// Summary of a completed run, for console reporting.
pub struct RunReport {
    pub diagnostics: Vec<Diagnostic>,
    pub counts: PassCounts,
    pub listing_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub map_path: Option<PathBuf>,
}

/// Assemble the CLI's source files and write the listing plus, when no
/// errors were recorded, the code image and the symbol map.
pub fn run(cli: &Cli) -> Result<RunReport, RunError> {
    let paths = resolve_output_paths(cli);
    let source_name = cli
        .sources
        .iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let date = current_datetime();

    let mut assembler = Assembler::new();
    for path in &cli.sources {
        assembler.load_source(path)?;
    }
    assembler.assemble()?;
    let counts = assembler.counts();

    // The listing is written regardless of the outcome.
    let listing_file = File::create(&paths.listing).map_err(|_| {
        RunError::io(
            "Error opening file for write",
            Some(&paths.listing.to_string_lossy()),
        )
    })?;
    let mut listing = ListingWriter::new(BufWriter::new(listing_file));
    let map_name = paths.map.to_string_lossy().to_string();
    listing
        .write_all(&assembler, &counts, &source_name, &date, &map_name)
        .map_err(|err| RunError::io(&err.to_string(), None))?;
    tracing::debug!("listing written to {}", paths.listing.display());

    if counts.errors > 0 {
        return Ok(RunReport {
            diagnostics: assembler.diagnostics(),
            counts,
            listing_path: paths.listing,
            output_path: None,
            map_path: None,
        });
    }

    let header = ImageHeader {
        source: source_name.clone(),
        date: date.clone(),
        version: VERSION.to_string(),
    };
    let image = assembler.image();
    let target_file = File::create(&paths.target).map_err(|_| {
        RunError::io(
            "Error opening file for write",
            Some(&paths.target.to_string_lossy()),
        )
    })?;
    let out = BufWriter::new(target_file);
    let result = if cli.ocb {
        image.write_ocb(out, &header, assembler.jump_target())
    } else {
        image.write_phx(out, &header, assembler.jump_target())
    };
    result.map_err(|err| RunError::io(&err.to_string(), None))?;
    tracing::debug!("image written to {}", paths.target.display());

    let map_file = File::create(&paths.map).map_err(|_| {
        RunError::io("Error opening file for write", Some(&map_name))
    })?;
    write_map(
        BufWriter::new(map_file),
        &map_name,
        &source_name,
        &date,
        assembler.globals(),
    )
    .map_err(|err| RunError::io(&err.to_string(), None))?;
    tracing::debug!("map written to {}", paths.map.display());

    Ok(RunReport {
        diagnostics: assembler.diagnostics(),
        counts,
        listing_path: paths.listing,
        output_path: Some(paths.target),
        map_path: Some(paths.map),
    })
}

/// Current UTC time as `dd-mm-yyyy HH:MM:SS`, for the listing, map, and
/// image headers.
#[must_use]
pub fn current_datetime() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_datetime(secs)
}

fn format_datetime(epoch_secs: u64) -> String {
    let mut days = epoch_secs / 86_400;
    let time_of_day = epoch_secs % 86_400;

    let mut year = 1970u64;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let month_days: [u64; 12] = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };
    let mut month = 1u64;
    for len in month_days {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    format!(
        "{:02}-{:02}-{year} {:02}:{:02}:{:02}",
        days + 1,
        month,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60
    )
}

fn is_leap(year: u64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
