use crate::{assemble, Assembly, DataDiagnosticKind};
use rvcpu::Mnemonic::*;
use rvcpu::RegisterId::*;
use rvcpu::{encode_b, encode_i, encode_j, encode_r, encode_s, encode_shift, encode_u};

fn assemble_ok(input: &str) -> Assembly {
    match assemble(input) {
        Ok(assembly) => assembly,
        Err(err) => panic!("assembly failed with code {}: {}", err.code(), err),
    }
}

fn error_code(input: &str) -> u32 {
    assemble(input).unwrap_err().code()
}

#[test]
fn assemble_small_program() {
    let input = "addi x1, x0, 5
add x3, x1, x2
sub x3, x1, x2
sw x5, 16(x6)
lui x1, 0x12345";

    let assembly = assemble_ok(input);
    assert_eq!(
        assembly.words,
        vec![
            encode_i(ADDI, RA, ZERO, 5),
            encode_r(ADD, GP, RA, SP),
            encode_r(SUB, GP, RA, SP),
            encode_s(SW, T0, T1, 16),
            encode_u(RA, 0x12345),
        ]
    );
    assert_eq!(assembly.program.len(), 5);
    assert!(assembly.data.is_empty());
    assert!(assembly.warnings.is_empty());
}

#[test]
fn immediate_boundaries() {
    assert_eq!(
        assemble_ok("addi x1, x0, 2047").words[0],
        encode_i(ADDI, RA, ZERO, 2047)
    );
    assert_eq!(
        assemble_ok("addi x1, x0, -2048").words[0],
        encode_i(ADDI, RA, ZERO, -2048)
    );
    assert_eq!(error_code("addi x1, x0, 2048"), 108);
    assert_eq!(error_code("addi x1, x0, -2049"), 108);
}

#[test]
fn shift_amount_range() {
    assert_eq!(
        assemble_ok("slli x1, x2, 1").words[0],
        encode_shift(SLLI, RA, SP, 1)
    );
    assert_eq!(
        assemble_ok("srai x1, x2, 4").words[0],
        encode_shift(SRAI, RA, SP, 4)
    );
    // srai carries its own funct6.
    assert_ne!(
        assemble_ok("srai x1, x2, 4").words[0],
        assemble_ok("srli x1, x2, 4").words[0]
    );
    assert_eq!(error_code("slli x1, x2, 0"), 107);
    assert_eq!(error_code("srli x1, x2, 65"), 107);
}

#[test]
fn branch_to_earlier_label_encodes_negative_displacement() {
    let input = "L: addi x1, x0, 1
bne x1, x2, L";

    let assembly = assemble_ok(input);
    assert_eq!(assembly.words[1], encode_b(BNE, RA, SP, -4));
}

#[test]
fn branch_to_later_label_encodes_positive_displacement() {
    let input = "beq x1, x2, done
addi x1, x0, 1
done: addi x2, x0, 1";

    let assembly = assemble_ok(input);
    assert_eq!(assembly.words[0], encode_b(BEQ, RA, SP, 8));
}

#[test]
fn branch_accepts_literal_displacement() {
    assert_eq!(
        assemble_ok("beq x0, x0, 16").words[0],
        encode_b(BEQ, ZERO, ZERO, 16)
    );
    assert_eq!(error_code("beq x0, x0, 4096"), 106);
    assert_eq!(error_code("beq x0, x0, -4098"), 106);
    assert_eq!(error_code("beq x0, x0, nowhere"), 109);
}

#[test]
fn jump_encoding_and_ranges() {
    assert_eq!(assemble_ok("jal ra, 8").words[0], encode_j(RA, 8));
    assert_eq!(error_code("jal ra, 1048576"), 111);
    assert_eq!(error_code("jal ra, -1048578"), 111);
    assert_eq!(error_code("jal ra, nowhere"), 109);
}

#[test]
fn jalr_operand_forms() {
    assert_eq!(
        assemble_ok("jalr x1, 4(x2)").words[0],
        encode_i(JALR, RA, SP, 4)
    );
    // No tail at all reads as a missing source register; 112 is reserved
    // for a parenthesised tail with no immediate in front of it.
    assert_eq!(error_code("jalr x1"), 103);
    assert_eq!(error_code("jalr x1, x2"), 103);
    assert_eq!(error_code("jalr x1, (x2)"), 112);
    assert_eq!(error_code("jalr x1, 4(x2"), 103);
}

#[test]
fn load_operand_forms() {
    assert_eq!(
        assemble_ok("lb x3, 4(x9)").words[0],
        encode_i(LB, GP, S1, 4)
    );
    assert_eq!(
        assemble_ok("lw x1, 0x10(sp)").words[0],
        encode_i(LW, RA, SP, 16)
    );
    assert_eq!(error_code("lb x3, (x9)"), 105);
    assert_eq!(error_code("lb x3, 4"), 103);
    assert_eq!(error_code("ld x3, 2048(x9)"), 108);
}

#[test]
fn memory_operand_diagnostic_priority() {
    // Loads and jalr report a bad offset before a bad base register.
    assert_eq!(error_code("lb x3, 9999(zz)"), 108);
    assert_eq!(error_code("lb x3, abc(zz)"), 105);
    assert_eq!(error_code("lb x3, 4(zz)"), 103);
    assert_eq!(error_code("jalr x1, 9999(zz)"), 108);
    // Stores check both registers first.
    assert_eq!(error_code("sw x5, 9999(zz)"), 103);
    assert_eq!(error_code("sw zz, 9999(x6)"), 103);
}

#[test]
fn memory_operand_tolerates_spaces_around_parentheses() {
    let spaced = assemble_ok("lw x1, 8 ( sp )");
    let tight = assemble_ok("lw x1, 8(sp)");
    assert_eq!(spaced.words, tight.words);
    assert_eq!(spaced.program.entry(1).unwrap().text, "lw x1 8(sp)");
}

#[test]
fn lui_range() {
    assert_eq!(
        assemble_ok("lui x1, 4294967295").words[0],
        encode_u(RA, 4_294_967_295u32)
    );
    assert_eq!(error_code("lui x1, -1"), 110);
    assert_eq!(error_code("lui x1, 4294967296"), 110);
    assert_eq!(error_code("lui x1, abc"), 105);
}

#[test]
fn unknown_names() {
    assert_eq!(error_code("foo x1, x2, x3"), 101);
    assert_eq!(error_code("addi y1, x0, 1"), 102);
    assert_eq!(error_code("addi x1, y0, 1"), 103);
    assert_eq!(error_code("add x1, x2, x99"), 103);
}

#[test]
fn register_aliases_match_numeric_names() {
    let aliased = assemble_ok("add s0, fp, x8");
    assert_eq!(aliased.words[0], encode_r(ADD, S0, S0, S0));
}

#[test]
fn trailing_operands_are_rejected() {
    assert_eq!(error_code("addi x1, x0, 5 garbage"), 104);
    assert_eq!(error_code("%%%"), 104);
}

#[test]
fn duplicate_labels_abort_the_load() {
    let input = "L: addi x1, x0, 1
L: addi x2, x0, 1";
    let err = assemble(input).unwrap_err();
    assert_eq!(err.code(), 200);
    assert_eq!(err.line, 2);
}

#[test]
fn label_table_counts_text_and_file_lines() {
    let input = ".text
; banner

start:
  addi x1, x0, 1
loop: addi x2, x2, 1
  beq x1, x2, start";

    let assembly = assemble_ok(input);
    let program = &assembly.program;

    let start = program.label("start").unwrap();
    assert_eq!((start.text_index, start.file_line), (1, 4));
    let label_loop = program.label("loop").unwrap();
    assert_eq!((label_loop.text_index, label_loop.file_line), (2, 6));

    assert_eq!(program.len(), 3);
    assert_eq!(program.entry(1).unwrap().file_line, 5);
    assert_eq!(program.entry(2).unwrap().file_line, 6);
    assert_eq!(program.entry(2).unwrap().text, "addi x2 x2 1");
    assert_eq!(program.entry(3).unwrap().file_line, 7);

    // start is two instructions behind the branch.
    assert_eq!(assembly.words[2], encode_b(BEQ, RA, SP, -8));
}

#[test]
fn comments_commas_and_tabs_are_whitespace() {
    let assembly = assemble_ok("addi\tx1,,x0,  5 ; trailing words");
    assert_eq!(assembly.words[0], encode_i(ADDI, RA, ZERO, 5));
    assert_eq!(assembly.program.entry(1).unwrap().text, "addi x1 x0 5");
}

#[test]
fn empty_text_segment_loads() {
    assert!(assemble_ok("").words.is_empty());
    assert!(assemble_ok(".text\n\n; nothing\n").words.is_empty());
}

#[test]
fn data_segment_image() {
    let input = ".data
.byte 1, -1, 256
.half 0x1234
.word -2
.dword 18446744073709551615
.text
addi x1, x0, 0";

    let assembly = assemble_ok(input);
    let mut expected = vec![1u8, 0xFF, 0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF];
    expected.extend_from_slice(&[0xFF; 8]);
    assert_eq!(assembly.data, expected);

    assert_eq!(assembly.warnings.len(), 1);
    let warning = &assembly.warnings[0];
    assert_eq!(warning.value, "256");
    assert_eq!(warning.line, 2);
    assert_eq!(warning.kind, DataDiagnosticKind::OutOfRange);
}

#[test]
fn data_values_continue_the_previous_directive() {
    let input = ".data
.byte 1 2
3 4
.text";

    let assembly = assemble_ok(input);
    assert_eq!(assembly.data, vec![1, 2, 3, 4]);
}

#[test]
fn data_errors_abort_the_load() {
    assert_eq!(error_code(".data\n5\n.text\n"), 402);
    assert_eq!(error_code(".data\n.asciz 1\n.text\n"), 401);
}

#[test]
fn file_without_text_marker_is_all_text() {
    let assembly = assemble_ok("addi x1, x0, 1\naddi x2, x0, 2");
    assert_eq!(assembly.program.len(), 2);
    assert_eq!(assembly.program.entry(1).unwrap().file_line, 1);
}
