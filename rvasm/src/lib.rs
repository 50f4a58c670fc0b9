//! Two-pass assembler for the RV64I simulator.
//!
//! [`assemble`](fn.assemble.html) takes a source file and produces an
//! [`Assembly`](struct.Assembly.html): the encoded instruction words, the
//! [`Program`](../rvcpu/program/struct.Program.html) (instruction stream plus
//! label table) and the data-segment image.
//!
//! # Source format
//!
//! A source file holds an optional `.data` section followed by an optional
//! `.text` section; with no `.text` marker the whole file is treated as text.
//! Comments start at `;` or `#` and run to the end of the line; commas and
//! tabs count as spaces.
//!
//! The data section is driven by directives, each declaring the width of the
//! values that follow (on the same line or on bare value lines below it):
//!
//! Keyword  | Width   | Accepted range
//! ---------|---------|------------------------
//! `.byte`  | 1 byte  | -128 to 255
//! `.half`  | 2 bytes | -32768 to 65535
//! `.word`  | 4 bytes | -2147483648 to 4294967295
//! `.dword` | 8 bytes | any 64-bit value
//!
//! Values are written little-endian at a monotonically increasing data
//! pointer. An out-of-range value is skipped with a diagnostic; the load
//! proceeds.
//!
//! Text lines are `[label:] [mnemonic operands]`. Integer literals may be
//! decimal, hexadecimal (`0x`) or octal (leading `0`). Loads, stores and
//! `jalr` take their memory operand as `offset(register)`; branches and
//! `jal` take a label or a literal byte displacement. The first pass records
//! labels against the index of the next instruction; the second pass encodes
//! each line into one 32-bit word, resolving labels to PC-relative byte
//! displacements.
//!
//! Errors carry the numeric diagnostic codes of the original toolchain (101
//! unknown mnemonic, 108 immediate out of range, ...); any error aborts the
//! assembly at that line.

mod data;
mod error;
mod instructions;
mod int_util;
mod labels;
mod parser;

#[cfg(test)]
mod test;

pub use crate::data::{DataDiagnostic, DataDiagnosticKind, Directive};
pub use crate::error::{AssembleError, ErrorKind};

use crate::parser::Rule;
use rvcpu::{InstructionEntry, Program, Word};

/// One source line, paired with its 1-based line number in the file.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SourceLine<'i> {
    pub text: &'i str,
    pub file_line: u32,
}

struct Sections<'i> {
    data: Vec<SourceLine<'i>>,
    text: Vec<SourceLine<'i>>,
}

/// The result of a successful assembly.
#[derive(Debug)]
pub struct Assembly {
    /// Encoded instruction words, one per instruction stream entry.
    pub words: Vec<Word>,
    /// Instruction stream and label table.
    pub program: Program,
    /// Data-segment image, to be placed at the data base address.
    pub data: Vec<u8>,
    /// Non-fatal data-segment diagnostics.
    pub warnings: Vec<DataDiagnostic>,
}

/// The section marker on a line, if any: the line with comment stripped and
/// surrounding whitespace trimmed must be exactly `.data` or `.text`.
fn marker(line: &str) -> Option<&str> {
    let stripped = match line.find(|c| c == ';' || c == '#') {
        Some(position) => &line[..position],
        None => line,
    };
    match stripped.trim() {
        ".data" => Some(".data"),
        ".text" => Some(".text"),
        _ => None,
    }
}

fn split_sections(input: &str) -> Sections {
    let lines: Vec<SourceLine> = input
        .lines()
        .enumerate()
        .map(|(i, text)| SourceLine {
            text,
            file_line: i as u32 + 1,
        })
        .collect();

    let data_start = lines.iter().position(|line| marker(line.text) == Some(".data"));
    let text_start = lines
        .iter()
        .enumerate()
        .position(|(i, line)| {
            marker(line.text) == Some(".text") && data_start.map_or(true, |d| i > d)
        });

    match (data_start, text_start) {
        (Some(d), Some(t)) => Sections {
            data: lines[d + 1..t].to_vec(),
            text: lines[t + 1..].to_vec(),
        },
        (Some(d), None) => Sections {
            data: lines[d + 1..].to_vec(),
            text: Vec::new(),
        },
        (None, Some(t)) => Sections {
            data: Vec::new(),
            text: lines[t + 1..].to_vec(),
        },
        (None, None) => Sections {
            data: Vec::new(),
            text: lines,
        },
    }
}

/// Display form of an instruction line: comment and label stripped, commas
/// and runs of whitespace collapsed, parentheses reattached.
fn clean_statement(line: &str) -> String {
    let stripped = match line.find(|c| c == ';' || c == '#') {
        Some(position) => &line[..position],
        None => line,
    };

    let mut tokens = stripped
        .split(|c: char| c == ' ' || c == '\t' || c == ',')
        .filter(|token| !token.is_empty())
        .peekable();

    if let Some(first) = tokens.peek() {
        if first.ends_with(':') {
            tokens.next();
        }
    }

    tokens
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" (", "(")
        .replace("( ", "(")
        .replace(" )", ")")
}

/// Assembles a complete source file.
pub fn assemble(input: &str) -> Result<Assembly, AssembleError> {
    let sections = split_sections(input);

    let (data, warnings) = data::process_data(&sections.data)?;
    let labels = labels::scan_labels(&sections.text)?;

    let mut words = Vec::new();
    let mut entries = Vec::new();
    let mut text_index = 1u32;

    for line in &sections.text {
        let parsed = parser::parse_line(line.text)
            .map_err(|_| AssembleError::new(ErrorKind::Syntax, line.file_line))?;

        let statement = parsed
            .into_inner()
            .find(|pair| pair.as_rule() == Rule::statement);
        let statement = match statement {
            Some(statement) => statement,
            None => continue,
        };

        let (mnemonic, operands) = instructions::collect_statement(statement);
        let word = instructions::encode_statement(mnemonic, &operands, &labels, text_index)
            .map_err(|kind| AssembleError::new(kind, line.file_line))?;

        words.push(word);
        entries.push(InstructionEntry {
            text: clean_statement(line.text),
            file_line: line.file_line,
            breakpoint: false,
        });
        text_index += 1;
    }

    Ok(Assembly {
        words,
        program: Program::new(entries, labels),
        data,
        warnings,
    })
}
