// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::error::LineStatus;
use super::{Assembler, LineKind, CODE_ORIGIN};
use crate::core::imagestore::ImageHeader;

fn assemble(lines: &[&str]) -> Assembler {
    let mut asm = Assembler::new();
    asm.load_text("test.dc1", &lines.join("\n"));
    asm.assemble().expect("assemble");
    asm
}

fn code_of(asm: &Assembler, idx: usize) -> Vec<u8> {
    asm.records()[idx]
        .code
        .clone()
        .unwrap_or_else(|| panic!("line {} has no code", idx + 1))
}

#[test]
fn label_and_finish_assemble_cleanly() {
    let asm = assemble(&["START:", "FINISH;"]);
    let counts = asm.counts();
    assert_eq!(counts.errors, 0);
    assert_eq!(counts.warnings, 0);

    assert_eq!(asm.globals().len(), 1);
    let start = asm.globals().entry("START").expect("START defined");
    assert_eq!(start.value, Some(CODE_ORIGIN));
    assert_eq!(asm.jump_target(), CODE_ORIGIN);
    assert!(asm.image().is_empty());
}

#[test]
fn empty_and_comment_lines_are_classified() {
    let asm = assemble(&["", "   ", "// remark", "NUL // trailing"]);
    let records = asm.records();
    assert_eq!(records[0].kind, LineKind::Empty);
    assert_eq!(records[1].kind, LineKind::Empty);
    assert_eq!(records[2].kind, LineKind::Comment);
    assert_eq!(records[3].kind, LineKind::Instruction);
    assert_eq!(code_of(&asm, 3), vec![0xFF, 0xFF]);
}

#[test]
fn forward_references_resolve_on_pass_two() {
    let asm = assemble(&["SETA TARGET", "NUL", "TARGET:"]);
    assert_eq!(asm.counts().errors, 0);
    // TARGET sits two words past the SETA, so the P-relative offset is 2.
    assert_eq!(code_of(&asm, 0), vec![0x00, 0x02]);
}

#[test]
fn duplicate_labels_are_flagged_once() {
    let asm = assemble(&["A:", "A:"]);
    let records = asm.records();
    assert_eq!(records[0].status, LineStatus::Ok);
    assert_eq!(records[1].status, LineStatus::Error);
    assert!(records[1].message.contains("Duplicate global name: A"));
    assert_eq!(asm.counts().errors, 1);
}

#[test]
fn duplicate_symbol_definitions_keep_the_latest_value() {
    let asm = assemble(&["V=1", "V=2"]);
    assert_eq!(asm.records()[1].status, LineStatus::Error);
    assert_eq!(asm.globals().lookup("V"), Some(2));
}

#[test]
fn local_scope_shadows_and_is_discarded() {
    let asm = assemble(&["X=1", "BEGIN", "X=2", "=E X", "END", "=E X"]);
    assert_eq!(asm.counts().errors, 0);
    assert_eq!(code_of(&asm, 3), vec![0x00, 0x02]);
    assert_eq!(code_of(&asm, 5), vec![0x00, 0x01]);
    // Only the global X survives into the map.
    assert_eq!(asm.globals().len(), 1);
}

#[test]
fn local_forward_references_survive_the_pass_boundary() {
    let asm = assemble(&["BEGIN", "SETA LOC", "LOC:", "END"]);
    assert_eq!(asm.counts().errors, 0);
    // LOC is the next word, offset 0.
    assert_eq!(code_of(&asm, 1), vec![0x00, 0x00]);
    assert!(asm.globals().is_empty());
}

#[test]
fn scope_errors_do_not_corrupt_later_lines() {
    let asm = assemble(&["BEGIN", "BEGIN", "END", "END", "NUL"]);
    let records = asm.records();
    assert_eq!(records[1].message, "Nested BEGIN");
    assert_eq!(records[3].message, "Unexpected END");
    assert_eq!(asm.counts().errors, 2);
    assert_eq!(code_of(&asm, 4), vec![0xFF, 0xFF]);
    assert_eq!(records[4].addr, Some(CODE_ORIGIN));
}

#[test]
fn data_directives_relocate_and_encode_payloads() {
    let asm = assemble(&[
        "DATA,=X0010",
        "=X0102",
        "=C\"AB\"",
        "ALP,=X0020",
        "NUL",
    ]);
    assert_eq!(asm.counts().errors, 0);
    let records = asm.records();
    assert_eq!(records[1].addr, Some(0x10));
    assert_eq!(code_of(&asm, 1), vec![0x01, 0x02]);
    assert_eq!(records[2].addr, Some(0x12));
    assert_eq!(code_of(&asm, 2), vec![b'A', b'B']);
    assert_eq!(records[4].addr, Some(0x20));
}

#[test]
fn bare_alp_rounds_the_address_up() {
    let asm = assemble(&["DATA,=X0011", "ALP", "NUL"]);
    assert_eq!(asm.records()[2].addr, Some(0x12));
}

#[test]
fn data_payload_errors_are_recorded() {
    let asm = assemble(&["DATA", "=X123", "=CAB", "SETA 1"]);
    let records = asm.records();
    assert_eq!(records[1].message, "Odd number of hex digits");
    assert_eq!(records[2].message, "Miss-quoted string");
    assert_eq!(records[3].message, "Unknown data type");
    assert_eq!(asm.counts().errors, 3);
}

#[test]
fn entry_and_external_are_unsupported() {
    let asm = assemble(&["ENTRY, NAME", "EXTERNAL, NAME"]);
    let records = asm.records();
    assert_eq!(records[0].kind, LineKind::EntryDirective);
    assert!(records[0].message.contains("not supported"));
    assert_eq!(records[1].kind, LineKind::ExternalDirective);
    assert!(records[1].message.contains("not supported"));
    assert_eq!(asm.counts().errors, 2);
}

#[test]
fn finish_expression_sets_the_jump_target() {
    let asm = assemble(&["START:", "NUL", "FINISH,START;"]);
    assert_eq!(asm.jump_target(), CODE_ORIGIN);

    let asm = assemble(&["FINISH,=X0040;"]);
    assert_eq!(asm.jump_target(), 0x40);
}

#[test]
fn unresolved_finish_is_a_pass_two_error() {
    let asm = assemble(&["FINISH,NOWHERE;"]);
    let rec = &asm.records()[0];
    assert_eq!(rec.status, LineStatus::Error);
    assert_eq!(rec.message, "FINISH directive unresolved");
}

#[test]
fn malformed_directives_are_flagged() {
    let asm = assemble(&["ALP 5", "DATA 5", "FINISH, ;"]);
    let records = asm.records();
    assert_eq!(records[0].message, "Mal-formed ALP directive");
    assert_eq!(records[1].message, "Mal-formed DATA directive");
    // An empty FINISH expression fails evaluation on pass 2.
    assert_eq!(records[2].status, LineStatus::Error);
}

#[test]
fn alp_expressions_must_resolve_in_pass_one() {
    let asm = assemble(&["ALP,LATER", "LATER:"]);
    let rec = &asm.records()[0];
    assert_eq!(rec.status, LineStatus::Error);
    assert!(rec.message.contains("ALP directive must resolve in pass 1"));
}

#[test]
fn expression_lines_encode_and_warn_out_of_range() {
    let asm = assemble(&["=E 2+3*4"]);
    assert_eq!(code_of(&asm, 0), vec![0x00, 14]);
    assert_eq!(asm.records()[0].addr, Some(CODE_ORIGIN));

    let asm = assemble(&["=E 30000+30000"]);
    let rec = &asm.records()[0];
    assert_eq!(rec.status, LineStatus::Warning);
    assert!(rec.message.contains("out of range"));
    assert_eq!(code_of(&asm, 0), vec![0xEA, 0x60]);
    // Warnings alone do not fail the run.
    assert_eq!(asm.counts().errors, 0);
}

#[test]
fn addresses_past_the_window_are_errors() {
    let asm = assemble(&["ALP,=X7FFC", "=E 1", "=E 1", "=E 1"]);
    let records = asm.records();
    assert_eq!(records[1].status, LineStatus::Ok);
    // 0x7FFE is still inside; its successor is not.
    assert_eq!(records[2].status, LineStatus::Ok);
    assert_eq!(records[3].message, "Address exceeds =X7FFF");
}

#[test]
fn unknown_instructions_are_per_line_errors() {
    let asm = assemble(&["FROB 1", "NUL"]);
    assert_eq!(asm.records()[0].message, "Unknown instruction/op code");
    assert_eq!(code_of(&asm, 1), vec![0xFF, 0xFF]);
}

#[test]
fn missing_end_is_a_warning() {
    let asm = assemble(&["BEGIN", "NUL"]);
    assert!(asm.missing_end());
    let counts = asm.counts();
    assert_eq!(counts.errors, 0);
    assert_eq!(counts.warnings, 1);
}

#[test]
fn image_collects_fragments_in_source_order() {
    let asm = assemble(&["NUL", "SETK"]);
    let image = asm.image();
    assert_eq!(image.num_bytes(), 4);

    let header = ImageHeader {
        source: "test.dc1".to_string(),
        date: "01-01-2026 00:00:00".to_string(),
        version: "0.4.0".to_string(),
    };
    let mut out = Vec::new();
    image.write_phx(&mut out, &header, asm.jump_target()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("T9000"));
    assert!(text.contains("FFFFFF21"));
    assert!(text.contains("J9000"));
}

#[test]
fn listing_reports_success_and_symbols() {
    let asm = assemble(&["START:", "FINISH;"]);
    let counts = asm.counts();
    let mut out = Vec::new();
    let mut listing = super::listing::ListingWriter::new(&mut out);
    listing
        .write_all(&asm, &counts, "test.dc1", "01-01-2026 00:00:00", "test.map")
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Source: test.dc1"));
    assert!(text.contains("START==X9000"));
    assert!(text.contains("Assembly successful"));
}

#[test]
fn listing_reports_failure_counts() {
    let asm = assemble(&["FROB"]);
    let counts = asm.counts();
    let mut out = Vec::new();
    let mut listing = super::listing::ListingWriter::new(&mut out);
    listing
        .write_all(&asm, &counts, "test.dc1", "01-01-2026 00:00:00", "test.map")
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("*** Error: Unknown instruction/op code"));
    assert!(text.contains("Assembly failed"));
    assert!(text.contains("Errors:   1"));
}

#[test]
fn datetime_formatting_is_civil() {
    assert_eq!(super::format_datetime(0), "01-01-1970 00:00:00");
    // 2000-02-29 12:34:56 UTC.
    assert_eq!(super::format_datetime(951_827_696), "29-02-2000 12:34:56");
}
