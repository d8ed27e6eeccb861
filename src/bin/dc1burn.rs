// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! ROM burner: repacks a PHX code image into a raw 4096-byte ROM image.
//!
//! The PHX payload must load at =X8000 and nominally jump to =X9000; the
//! unwritten remainder of the ROM is filled with the jump-to-self trap.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use dc1forge::report::{color, use_color, Color};

const SOH: char = '\x01';
const STX: char = '\x02';
const ETX: char = '\x03';

const ROM_SIZE: usize = 4096;

/// `J .+0`: the two-byte jump-to-self trap used as ROM filler.
const TRAP: [u8; 2] = [0xC1, 0x02];

#[derive(Parser, Debug)]
#[command(
    name = "dc1burn",
    version,
    about = "Burns a PHX code image into a raw ROM image",
    long_about = "Uses the specified PHX_FILE to \"burn\" the specified ROM_FILE.\n\
                  The PHX file must start loading at 8000 and nominally jump to 9000."
)]
struct Args {
    /// PHX input file
    phx_file: PathBuf,
    /// ROM output file
    rom_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BurnError {
    message: String,
}

impl BurnError {
    fn new(filename: &str, message: &str) -> Self {
        Self {
            message: format!("{filename}: {message}"),
        }
    }
}

impl fmt::Display for BurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BurnError {}

/// Decode the PHX text into a full ROM image.
fn burn(phx: &str, filename: &str) -> Result<Vec<u8>, BurnError> {
    let p1 = phx
        .find(SOH)
        .ok_or_else(|| BurnError::new(filename, "Missing SOH"))?;
    let p2 = phx[p1..]
        .find(STX)
        .map(|ofs| p1 + ofs)
        .ok_or_else(|| BurnError::new(filename, "Missing STX"))?;
    let p3 = phx[p2..]
        .find("T8000")
        .map(|ofs| p2 + ofs)
        .ok_or_else(|| BurnError::new(filename, "Missing T8000 directive"))?;
    let p4 = phx[p3..]
        .find("J8000")
        .map(|ofs| p3 + ofs)
        .ok_or_else(|| BurnError::new(filename, "Missing J8000 directive"))?;
    phx[p4..]
        .find(ETX)
        .ok_or_else(|| BurnError::new(filename, "Missing ETX"))?;

    let mut output = Vec::with_capacity(ROM_SIZE);
    while output.len() < ROM_SIZE {
        output.extend_from_slice(&TRAP);
    }

    let mut nibble = 0u32;
    let mut byte = 0u32;
    let mut addr: i64 = 0; // relative to ROM start

    // The useful payload sits between the T8000 directive and the J.
    let payload = &phx[p3 + 5..p4];
    let mut chars = payload.chars();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {}
            '0'..='9' | 'A'..='F' => {
                byte = (byte << 4) + hex_value(c);
                nibble += 1;
                if nibble == 2 {
                    if addr < 0 || addr >= ROM_SIZE as i64 {
                        let load_addr = addr + 0x8000;
                        return Err(BurnError::new(
                            filename,
                            &format!("load address 0x{load_addr:04X} exceeds 0x9000"),
                        ));
                    }
                    output[addr as usize] = byte as u8;
                    addr += 1;
                    nibble = 0;
                    byte = 0;
                }
            }
            'T' => {
                if nibble != 0 {
                    return Err(BurnError::new(filename, "T directive between hex pair"));
                }
                let mut directive = 0i64;
                for _ in 0..4 {
                    let c = chars.next().unwrap_or('\0');
                    if !c.is_ascii_hexdigit() || c.is_ascii_lowercase() {
                        return Err(BurnError::new(
                            filename,
                            &format!("T directive - non hex char '{c}'"),
                        ));
                    }
                    directive = (directive << 4) + i64::from(hex_value(c));
                }
                addr = directive - 0x8000;
            }
            _ => {
                return Err(BurnError::new(
                    filename,
                    &format!("non PHX character '{c}'"),
                ));
            }
        }
    }

    if nibble > 0 {
        return Err(BurnError::new(filename, "odd number of PHX characters"));
    }

    Ok(output)
}

fn hex_value(c: char) -> u32 {
    c.to_digit(16).unwrap_or(0)
}

fn main() {
    let args = Args::parse();
    let phx_name = args.phx_file.to_string_lossy().to_string();

    let result = fs::read_to_string(&args.phx_file)
        .map_err(|err| BurnError::new(&phx_name, &err.to_string()))
        .and_then(|phx| burn(&phx, &phx_name))
        .and_then(|rom| {
            fs::write(&args.rom_file, rom)
                .map_err(|err| BurnError::new(&args.rom_file.to_string_lossy(), &err.to_string()))
        });

    match result {
        Ok(()) => println!("{} burn complete", args.rom_file.display()),
        Err(err) => {
            eprintln!("{}: {err}", color("Error", Color::Red, use_color()));
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phx(body: &str) -> String {
        format!("\u{1}Source: t.dc1\r\n\u{2}\r\nT8000\r\n{body}\r\nJ8000\r\n\u{3}\r\n")
    }

    #[test]
    fn burns_payload_into_a_trap_filled_rom() {
        let rom = burn(&phx("E005FF21"), "t.phx").unwrap();
        assert_eq!(rom.len(), ROM_SIZE);
        assert_eq!(&rom[..4], &[0xE0, 0x05, 0xFF, 0x21]);
        assert_eq!(&rom[4..6], &TRAP);
        assert_eq!(&rom[ROM_SIZE - 2..], &TRAP);
    }

    #[test]
    fn honors_later_t_directives() {
        let rom = burn(&phx("01\r\nT8010\r\n02"), "t.phx").unwrap();
        assert_eq!(rom[0], 0x01);
        assert_eq!(rom[0x10], 0x02);
    }

    #[test]
    fn rejects_missing_markers() {
        let no_soh = "T8000\r\nJ8000";
        assert_eq!(
            burn(no_soh, "t.phx").unwrap_err().to_string(),
            "t.phx: Missing SOH"
        );
        let no_t = "\u{1}x\u{2}J8000\u{3}";
        assert!(burn(no_t, "t.phx")
            .unwrap_err()
            .to_string()
            .contains("Missing T8000"));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(burn(&phx("0"), "t.phx")
            .unwrap_err()
            .to_string()
            .contains("odd number"));
        assert!(burn(&phx("0G"), "t.phx")
            .unwrap_err()
            .to_string()
            .contains("non PHX character"));
        assert!(burn(&phx("0T8010"), "t.phx")
            .unwrap_err()
            .to_string()
            .contains("between hex pair"));
    }

    #[test]
    fn rejects_out_of_window_addresses() {
        let err = burn(&phx("00\r\nT9000\r\n00"), "t.phx").unwrap_err();
        assert!(err.to_string().contains("exceeds 0x9000"), "{err}");
    }
}
