// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! DataCode1 instruction encoding.
//!
//! Every instruction assembles to one 16-bit code. Mnemonic families and
//! their action numbers are fixed tables; operands are expressions resolved
//! against the current scope environment.

use crate::assembler::error::{AsmError, AsmErrorKind};
use crate::core::eval::evaluate_expression;
use crate::core::symbol_table::SymbolTable;
use crate::core::text_utils::split_fields;

/// Index register names, in code order. Codes 0..3 select direct P/R/S/T,
/// 4..7 the byte-mode variants, 8..11 the indirect variants, 12..14 the
/// literal and shift sub-modes.
pub const INDEX_NAMES: [&str; 15] = [
    "P", "R", "S", "T", "PB", "RB", "SB", "TB", "I", "RI", "SI", "TI", "L", "A", "LC",
];

/// Map an index register name to its code.
#[must_use]
pub fn index_code(name: &str) -> Option<usize> {
    INDEX_NAMES.iter().position(|candidate| *candidate == name)
}

/// One regular ALU family: four register mnemonics sharing an action base.
struct AluFamily {
    mnemonics: [&'static str; 4],
    action_base: u16,
    /// Literal-form family code for index `L`, when the family has one.
    literal_code: Option<u16>,
    /// How many of the four registers accept the direct/byte encodings.
    direct_registers: usize,
}

/// The eight regular families. SUB/AND/NEQ/IOR pack two actions each, so
/// only their A and R registers have direct forms.
const ALU_FAMILIES: [AluFamily; 8] = [
    AluFamily {
        mnemonics: ["SETA", "SETR", "SETS", "SETT"],
        action_base: 0,
        literal_code: Some(0),
        direct_registers: 4,
    },
    AluFamily {
        mnemonics: ["STRA", "STRR", "STRS", "STRT"],
        action_base: 4,
        literal_code: None,
        direct_registers: 4,
    },
    AluFamily {
        mnemonics: ["ADDA", "ADDR", "ADDS", "ADDT"],
        action_base: 8,
        literal_code: Some(1),
        direct_registers: 4,
    },
    AluFamily {
        mnemonics: ["CMPA", "CMPR", "CMPS", "CMPT"],
        action_base: 12,
        literal_code: Some(3),
        direct_registers: 4,
    },
    AluFamily {
        mnemonics: ["SUBA", "SUBR", "SUBS", "SUBT"],
        action_base: 16,
        literal_code: Some(2),
        direct_registers: 2,
    },
    AluFamily {
        mnemonics: ["ANDA", "ANDR", "ANDS", "ANDT"],
        action_base: 18,
        literal_code: Some(4),
        direct_registers: 2,
    },
    AluFamily {
        mnemonics: ["NEQA", "NEQR", "NEQS", "NEQT"],
        action_base: 20,
        literal_code: Some(5),
        direct_registers: 2,
    },
    AluFamily {
        mnemonics: ["IORA", "IORR", "IORS", "IORT"],
        action_base: 22,
        literal_code: Some(6),
        direct_registers: 2,
    },
];

/// Conditional jump mnemonics; position % 4 selects the qualifier.
const CONDITIONAL_JUMPS: [&str; 20] = [
    "JVS", "JVN", "JCS", "JCN", "JLT", "JGE", "JEQ", "JNE", "JNGA", "JPZA", "JEZA", "JNZA",
    "JNGR", "JPZR", "JEZR", "JNZR", "JNGS", "JPZS", "JEZS", "JNZS",
];

const SHIFT_LEFT: [&str; 4] = ["SHLA", "SHLR", "SHLS", "SHLT"];
const SHIFT_RIGHT: [&str; 4] = ["SHRA", "SHRR", "SHRS", "SHRT"];

fn invalid_index() -> AsmError {
    AsmError::new(AsmErrorKind::Instruction, "Invalid index register", None)
}

fn unresolved(reason: &str) -> AsmError {
    AsmError::new(
        AsmErrorKind::Expression,
        "Expression not defined",
        Some(reason),
    )
}

/// Encode one instruction line (`MNEMONIC [operand[,INDEX]]`) at `addr`.
pub fn encode(
    line: &str,
    addr: i64,
    globals: &SymbolTable,
    locals: Option<&SymbolTable>,
) -> Result<u16, AsmError> {
    let line = line.trim();
    let cmd = line.split_whitespace().next().unwrap_or("");
    let remaining = &line[cmd.len()..];
    let operands = split_fields(remaining, ',', false);
    let operand = operands.first().copied().unwrap_or("");

    // A missing index field implies direct P addressing.
    let index = if operands.len() >= 2 {
        index_code(operands[1])
    } else {
        Some(0)
    };

    let eval = |text: &str| {
        evaluate_expression(text, addr, globals, locals)
            .map_err(|err| unresolved(err.message()))
    };

    for family in &ALU_FAMILIES {
        if let Some(reg) = family.mnemonics.iter().position(|m| *m == cmd) {
            return match index {
                Some(idx) if idx < 8 && reg < family.direct_registers => {
                    regular(family.action_base + reg as u16, idx, eval(operand)?, addr)
                }
                Some(12) => match family.literal_code {
                    Some(code) => literal(code, reg as u16, eval(operand)?),
                    None => Err(invalid_index()),
                },
                _ => Err(invalid_index()),
            };
        }
    }

    if cmd == "J" || cmd == "JS" {
        let action = if cmd == "J" { 24 } else { 25 };
        return match index {
            Some(idx) if idx < 4 || (8..12).contains(&idx) => {
                jumps(action, idx % 4, idx, eval(operand)?, addr)
            }
            _ => Err(invalid_index()),
        };
    }

    if let Some(pos) = CONDITIONAL_JUMPS.iter().position(|m| *m == cmd) {
        return match index {
            Some(idx @ (0 | 8)) => jumps(26, pos % 4, idx, eval(operand)?, addr),
            _ => Err(invalid_index()),
        };
    }

    if cmd == "MLT" {
        return match index {
            Some(idx) if idx < 8 => regular(27, idx, eval(operand)?, addr),
            _ => Err(invalid_index()),
        };
    }

    for (direction, table) in [(0u16, &SHIFT_LEFT), (1u16, &SHIFT_RIGHT)] {
        if let Some(reg) = table.iter().position(|m| *m == cmd) {
            return match index {
                Some(idx @ 12..=14) => shifts(direction, reg as u16, idx - 12, eval(operand)?),
                _ => Err(invalid_index()),
            };
        }
    }

    match cmd {
        "SETL" => {
            let level = eval(operand)?;
            if (0..4).contains(&level) {
                Ok(0xFF00 + level as u16)
            } else {
                Err(AsmError::new(
                    AsmErrorKind::Instruction,
                    "Level out of range",
                    None,
                ))
            }
        }
        "SETK" => Ok(0xFF21),
        "CLRK" => Ok(0xFF20),
        "NUL" => Ok(0xFFFF),
        _ => Err(AsmError::new(
            AsmErrorKind::Instruction,
            "Unknown instruction/op code",
            None,
        )),
    }
}

/// Direct and byte-mode encoding shared by the ALU families and `MLT`.
///
/// Index codes with `idx % 4 == 0` address relative to P, so the operand is
/// rebased against the address of the following instruction.
fn regular(action: u16, idx: usize, value: i64, addr: i64) -> Result<u16, AsmError> {
    let (min, max) = if idx < 4 { (-254, 254) } else { (-127, 127) };
    let offset = if idx % 4 == 0 { value - addr - 2 } else { value };

    if offset < min || offset > max {
        return Err(AsmError::new(
            AsmErrorKind::Instruction,
            "Offset value out of range",
            None,
        ));
    }

    let idx_reg = ((idx % 4) as u16) * 0x0200;
    let sign = if offset >= 0 { 0x0000 } else { 0x0100 };
    let magnitude = offset.unsigned_abs() as u16;
    let lsb = if idx < 4 {
        magnitude & 0xFE
    } else {
        magnitude * 2 + 1
    };

    Ok(action * 0x0800 + idx_reg + sign + lsb)
}

/// Jump encoding for `J`, `JS`, and the conditional family. Indirect index
/// codes (8..) set the low bit.
fn jumps(action: u16, qualifier: usize, idx: usize, value: i64, addr: i64) -> Result<u16, AsmError> {
    let offset = if idx % 4 == 0 { value - addr - 2 } else { value };

    if !(-254..=254).contains(&offset) {
        return Err(AsmError::new(
            AsmErrorKind::Instruction,
            "Offset value out of range",
            None,
        ));
    }

    let extra = ((qualifier % 4) as u16) * 0x0200;
    let sign = if offset >= 0 { 0x0000 } else { 0x0100 };
    let lsb = (offset.unsigned_abs() as u16 & 0xFE) + (idx / 8) as u16;

    Ok(action * 0x0800 + extra + sign + lsb)
}

/// Literal form: an 8-bit constant folded into the code word.
fn literal(code: u16, register: u16, value: i64) -> Result<u16, AsmError> {
    if !(0..=255).contains(&value) {
        return Err(AsmError::new(
            AsmErrorKind::Instruction,
            "Literal value out of range 0 .. 255",
            None,
        ));
    }
    Ok(0xE000 + register * 0x0800 + code * 0x0100 + value as u16)
}

/// Shift encoding. Mode 2 (`LC`) is the fixed one-bit logical-carry shift:
/// it accepts a count of exactly 1 and encodes mode 0 with count 0.
fn shifts(direction: u16, register: u16, mode: usize, count: i64) -> Result<u16, AsmError> {
    let max = if mode < 2 { 15 } else { 1 };
    if count < 1 || count > max {
        return Err(AsmError::new(
            AsmErrorKind::Instruction,
            &format!("Shift value out of range 1 .. {max}"),
            None,
        ));
    }

    let (mode, count) = if mode == 2 {
        (0u16, 0u16)
    } else {
        (mode as u16, count as u16)
    };

    Ok(0xE740 + register * 0x0800 + direction * 0x0020 + mode * 0x0010 + count)
}
