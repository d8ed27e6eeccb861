// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing and symbol-map file generation.

use std::io::{self, Write};

use crate::core::symbol_table::{SymbolEntry, SymbolTable};
use crate::core::text_utils::{bytes_to_hex, value_to_hex};

use super::error::{LineStatus, PassCounts};
use super::{Assembler, LineKind, LineRecord};

/// Placeholder for a line that should carry code but has none (error lines).
const NO_CODE: &str = "----";

/// Writer for the plain-text assembly listing.
pub struct ListingWriter<W: Write> {
    out: W,
}

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Header, every line record, the missing-`END` warning if any, and the
    /// footer, in one call.
    pub fn write_all(
        &mut self,
        assembler: &Assembler,
        counts: &PassCounts,
        source: &str,
        date: &str,
        map_name: &str,
    ) -> io::Result<()> {
        self.header(source, date)?;
        for rec in assembler.records() {
            self.write_record(rec)?;
        }
        if assembler.missing_end() {
            self.missing_end()?;
        }
        self.footer(counts, assembler.globals(), map_name)
    }

    pub fn header(&mut self, source: &str, date: &str) -> io::Result<()> {
        writeln!(self.out, "Source: {source}")?;
        writeln!(self.out, "Date:   {date}")?;
        writeln!(self.out)
    }

    /// One record: line number, signed 4-hex-digit address, code bytes,
    /// original text, and any error/warning annotation beneath it.
    pub fn write_record(&mut self, rec: &LineRecord) -> io::Result<()> {
        match rec.kind {
            LineKind::Instruction | LineKind::Expression => {
                let addr = value_to_hex(rec.addr.unwrap_or(0));
                let code = match &rec.code {
                    Some(bytes) => bytes_to_hex(bytes),
                    None => NO_CODE.to_string(),
                };
                let text = format!(" {:>4}  {}  {:>4}    {}", rec.lineno, addr, code, rec.text);
                writeln!(self.out, "{}", text.trim_end())?;
            }
            LineKind::Data => {
                // Data payloads fold two bytes per listing row; only the
                // first row repeats the source text.
                let mut addr = rec.addr.unwrap_or(0);
                let mut text = rec.text.as_str();
                match &rec.code {
                    Some(bytes) => {
                        for chunk in bytes.chunks(2) {
                            let row = format!(
                                " {:>4}  {}  {:<4}      {}",
                                rec.lineno,
                                value_to_hex(addr),
                                bytes_to_hex(chunk),
                                text
                            );
                            writeln!(self.out, "{}", row.trim_end())?;
                            addr += 2;
                            text = "";
                        }
                    }
                    None => {
                        let row = format!(
                            " {:>4}  {}  {:<4}      {}",
                            rec.lineno,
                            value_to_hex(addr),
                            NO_CODE,
                            text
                        );
                        writeln!(self.out, "{}", row.trim_end())?;
                    }
                }
            }
            LineKind::Label => {
                let addr = value_to_hex(rec.addr.unwrap_or(0));
                writeln!(self.out, " {:>4}  {}          {}", rec.lineno, addr, rec.text)?;
            }
            _ => {
                let text = format!(" {:>4}                {}", rec.lineno, rec.text);
                writeln!(self.out, "{}", text.trim_end())?;
            }
        }

        match rec.status {
            LineStatus::Error => writeln!(self.out, "*** Error: {}", rec.message)?,
            LineStatus::Warning => writeln!(self.out, "*** Warning: {}", rec.message)?,
            LineStatus::Ok => {}
        }
        Ok(())
    }

    pub fn missing_end(&mut self) -> io::Result<()> {
        writeln!(self.out, "*** Warning: Missing END")
    }

    /// Trailing summary: the sorted global names on success, the error and
    /// warning totals otherwise.
    pub fn footer(
        &mut self,
        counts: &PassCounts,
        globals: &SymbolTable,
        map_name: &str,
    ) -> io::Result<()> {
        writeln!(self.out)?;
        if counts.errors == 0 {
            writeln!(self.out, "Global Names (also available in {map_name}):")?;
            for entry in globals.sorted() {
                writeln!(self.out, "{}", symbol_line(entry))?;
            }
            writeln!(self.out)?;
            if counts.warnings == 0 {
                writeln!(self.out, "Assembly successful")?;
            } else {
                writeln!(
                    self.out,
                    "Assembly complete with {} warnings",
                    counts.warnings
                )?;
            }
        } else {
            writeln!(self.out, "Assembly failed")?;
            writeln!(self.out, "Errors:   {}", counts.errors)?;
            writeln!(self.out, "Warnings: {}", counts.warnings)?;
        }
        Ok(())
    }
}

/// Write the symbol map file: sorted global names, machine-reusable as
/// future `=X` definitions.
pub fn write_map<W: Write>(
    mut out: W,
    map_name: &str,
    source: &str,
    date: &str,
    globals: &SymbolTable,
) -> io::Result<()> {
    writeln!(out, "// {map_name}")?;
    writeln!(out, "// Source: {source}")?;
    writeln!(out, "// Date: {date}")?;
    writeln!(out)?;
    for entry in globals.sorted() {
        writeln!(out, "{}", symbol_line(entry))?;
    }
    writeln!(out)?;
    writeln!(out, "// end")
}

/// `NAME==Xhhhh // value`, padded so the comments line up.
fn symbol_line(entry: &SymbolEntry) -> String {
    let value = entry.value.unwrap_or(0);
    let gap = " ".repeat(14usize.saturating_sub(entry.name.len()));
    format!("{}==X{}{} // {}", entry.name, value_to_hex(value), gap, value)
}
