use crate::error::{AssembleError, ErrorKind};
use crate::int_util::parse_int;
use crate::parser;
use crate::SourceLine;
use byteorder::ByteOrder;
use std::fmt;
use util::Endian;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Directive {
    Byte,
    Half,
    Word,
    Dword,
}

impl Directive {
    fn from_token(token: &str) -> Option<Directive> {
        match token {
            ".byte" => Some(Directive::Byte),
            ".half" => Some(Directive::Half),
            ".word" => Some(Directive::Word),
            ".dword" => Some(Directive::Dword),
            _ => None,
        }
    }

    fn width(self) -> usize {
        match self {
            Directive::Byte => 1,
            Directive::Half => 2,
            Directive::Word => 4,
            Directive::Dword => 8,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Directive::Byte => "byte",
            Directive::Half => "halfword",
            Directive::Word => "word",
            Directive::Dword => "dword",
        }
    }

    /// Accepted value range: signed minimum through unsigned maximum of the
    /// element width.
    fn bounds(self) -> (i128, i128) {
        match self {
            Directive::Byte => (-128, 255),
            Directive::Half => (-32_768, 65_535),
            Directive::Word => (-2_147_483_648, 4_294_967_295),
            Directive::Dword => (i128::from(i64::MIN), i128::from(u64::MAX)),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataDiagnosticKind {
    OutOfRange,
    NotAnInteger,
}

/// A non-fatal data-segment complaint: the offending token is skipped and
/// the load proceeds.
#[derive(Clone, Debug, PartialEq)]
pub struct DataDiagnostic {
    pub line: u32,
    pub value: String,
    pub directive: Directive,
    pub kind: DataDiagnosticKind,
}

impl fmt::Display for DataDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            DataDiagnosticKind::OutOfRange => {
                let (low, high) = self.directive.bounds();
                write!(
                    f,
                    "{} value \"{}\" in line {} not in range ({} - {}).",
                    self.directive.name(),
                    self.value,
                    self.line,
                    low,
                    high
                )
            }
            DataDiagnosticKind::NotAnInteger => write!(
                f,
                "{} value \"{}\" in line {} is not an integer.",
                self.directive.name(),
                self.value,
                self.line
            ),
        }
    }
}

fn append(image: &mut Vec<u8>, directive: Directive, value: i128) {
    let width = directive.width();
    let start = image.len();
    image.resize(start + width, 0);
    let mask = if width == 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    };
    Endian::write_uint(&mut image[start..], (value as u64) & mask, width);
}

/// Interprets the data segment into a little-endian byte image, to be placed
/// at the data base address. Out-of-range and non-integer tokens are skipped
/// with a diagnostic; a value line before any directive or an unknown
/// directive aborts the load.
pub(crate) fn process_data(
    lines: &[SourceLine],
) -> Result<(Vec<u8>, Vec<DataDiagnostic>), AssembleError> {
    let mut image = Vec::new();
    let mut diagnostics = Vec::new();
    let mut current: Option<Directive> = None;

    for line in lines {
        let tokens = parser::parse_data_line(line.text)
            .map_err(|_| AssembleError::new(ErrorKind::Syntax, line.file_line))?;
        if tokens.is_empty() {
            continue;
        }

        let mut values = &tokens[..];
        if tokens[0].starts_with('.') {
            let directive = Directive::from_token(tokens[0]).ok_or_else(|| {
                AssembleError::new(
                    ErrorKind::UnknownDirective(tokens[0].to_string()),
                    line.file_line,
                )
            })?;
            current = Some(directive);
            values = &tokens[1..];
        }

        let directive = match current {
            Some(directive) => directive,
            None => {
                return Err(AssembleError::new(
                    ErrorKind::DataWithoutDirective,
                    line.file_line,
                ));
            }
        };

        for token in values {
            match parse_int(token) {
                None => diagnostics.push(DataDiagnostic {
                    line: line.file_line,
                    value: token.to_string(),
                    directive,
                    kind: DataDiagnosticKind::NotAnInteger,
                }),
                Some(value) => {
                    let (low, high) = directive.bounds();
                    if value < low || value > high {
                        diagnostics.push(DataDiagnostic {
                            line: line.file_line,
                            value: token.to_string(),
                            directive,
                            kind: DataDiagnosticKind::OutOfRange,
                        });
                    } else {
                        append(&mut image, directive, value);
                    }
                }
            }
        }
    }

    Ok((image, diagnostics))
}
