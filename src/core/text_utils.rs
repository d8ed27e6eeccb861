// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text and 16-bit value helpers.

/// Split a line into code and comment parts at the first `//`.
///
/// The split is blind: a `//` inside a quoted literal still starts the
/// comment. Returns the code text and the comment text (without the `//`),
/// the latter `None` when the line carries no comment.
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(idx) => (&line[..idx], Some(&line[idx + 2..])),
        None => (line, None),
    }
}

/// Split `text` on `sep`, trimming every field.
///
/// With `drop_empty` set, fields that trim to nothing are discarded.
pub fn split_fields(text: &str, sep: char, drop_empty: bool) -> Vec<&str> {
    text.split(sep)
        .map(str::trim)
        .filter(|field| !drop_empty || !field.is_empty())
        .collect()
}

/// Truncate a signed value to 16 bits, big endian.
///
/// `255` => `[0x00, 0xFF]`, `-2` => `[0xFF, 0xFE]`, `-32768` => `[0x80, 0x00]`.
pub fn value_to_bytes(value: i64) -> [u8; 2] {
    let v = (value & 0xFFFF) as u16;
    v.to_be_bytes()
}

/// Truncate a signed value to a 4-digit upper-case hex string.
///
/// `255` => `00FF`, `-1` => `FFFF`, `-32768` => `8000`.
pub fn value_to_hex(value: i64) -> String {
    format!("{:04X}", (value & 0xFFFF) as u16)
}

/// Format bytes as contiguous upper-case hex pairs.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
    out
}
