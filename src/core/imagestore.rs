// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Code image store with PHX/OCB output helpers.

use std::io::{self, Write};

use crate::core::text_utils::{value_to_bytes, value_to_hex};

const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const ETX: u8 = 0x03;
const ESC: u8 = 0x1B;
const CRLF: &str = "\r\n";

/// Hex columns emitted per PHX line before wrapping.
const PHX_LINE_LIMIT: usize = 80;

/// Header block shared by both image formats.
#[derive(Debug, Clone)]
pub struct ImageHeader {
    pub source: String,
    pub date: String,
    pub version: String,
}

impl ImageHeader {
    fn text(&self) -> String {
        format!(
            "Source: {}{CRLF}Date: {}{CRLF}dc1forge version: {}{CRLF}",
            self.source, self.date, self.version
        )
    }
}

/// One contiguous run of assembled bytes at a fixed address.
#[derive(Debug, Clone)]
pub struct CodeFragment {
    pub addr: i64,
    pub bytes: Vec<u8>,
}

/// Ordered collection of code fragments, in source-line order.
#[derive(Debug, Default)]
pub struct CodeImage {
    fragments: Vec<CodeFragment>,
}

impl CodeImage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: i64, bytes: &[u8]) {
        self.fragments.push(CodeFragment {
            addr,
            bytes: bytes.to_vec(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    #[must_use]
    pub fn num_bytes(&self) -> usize {
        self.fragments.iter().map(|f| f.bytes.len()).sum()
    }

    /// Write the PHX (printable hexadecimal) format.
    ///
    /// SOH, header, STX, then a `Txxxx` directive per discontiguous run with
    /// the hex payload wrapped at 80 columns, then `Jxxxx` and ETX. Every
    /// line is CRLF-terminated.
    pub fn write_phx<W: Write>(
        &self,
        mut out: W,
        header: &ImageHeader,
        jump_to: i64,
    ) -> io::Result<()> {
        out.write_all(&[SOH])?;
        out.write_all(header.text().as_bytes())?;
        out.write_all(&[STX])?;
        out.write_all(CRLF.as_bytes())?;

        let mut count = 0usize;
        let mut address: Option<i64> = None;
        for fragment in &self.fragments {
            if address != Some(fragment.addr) {
                if count > 0 {
                    out.write_all(CRLF.as_bytes())?;
                    count = 0;
                }
                write!(out, "T{}{CRLF}", value_to_hex(fragment.addr))?;
            }
            let mut addr = fragment.addr;
            for b in &fragment.bytes {
                write!(out, "{b:02X}")?;
                count += 2;
                addr += 1;
                if count >= PHX_LINE_LIMIT {
                    out.write_all(CRLF.as_bytes())?;
                    count = 0;
                }
            }
            address = Some(addr);
        }
        if count > 0 {
            out.write_all(CRLF.as_bytes())?;
        }

        write!(out, "J{}{CRLF}", value_to_hex(jump_to))?;
        out.write_all(&[ETX])?;
        out.write_all(CRLF.as_bytes())?;
        Ok(())
    }

    /// Write the OCB (object compressed binary) format.
    ///
    /// Same logical content as PHX, with two-byte escape-tag markers and
    /// every `0x1B` data byte doubled so the stream stays re-parseable.
    pub fn write_ocb<W: Write>(
        &self,
        mut out: W,
        header: &ImageHeader,
        jump_to: i64,
    ) -> io::Result<()> {
        out.write_all(&[ESC, SOH])?;
        out.write_all(&escape(header.text().as_bytes()))?;
        out.write_all(&[ESC, STX])?;

        let mut address: Option<i64> = None;
        for fragment in &self.fragments {
            if address != Some(fragment.addr) {
                out.write_all(&[ESC, b'T'])?;
                out.write_all(&escape(&value_to_bytes(fragment.addr)))?;
            }
            out.write_all(&escape(&fragment.bytes))?;
            address = Some(fragment.addr + fragment.bytes.len() as i64);
        }

        out.write_all(&[ESC, b'J'])?;
        out.write_all(&escape(&value_to_bytes(jump_to)))?;
        out.write_all(&[ESC, ETX])?;
        out.write_all(b"\r\n")?;
        Ok(())
    }
}

/// Double every escape byte so data bytes can never read as markers.
fn escape(data: &[u8]) -> Vec<u8> {
    let mut work = Vec::with_capacity(data.len());
    for &b in data {
        if b == ESC {
            work.push(ESC);
        }
        work.push(b);
    }
    work
}
