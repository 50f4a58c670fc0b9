use crate::error::{AssembleError, ErrorKind};
use crate::parser::{self, Rule};
use crate::SourceLine;
use rvcpu::{Label, LabelMap};

/// First pass over the text segment: builds the label table.
///
/// `text_index` counts only lines that will yield an instruction; blank
/// lines and bare labels do not consume an index, so a label always points
/// at the next instruction to come. A line the grammar rejects still counts
/// as an instruction line here; the second pass reports it.
pub(crate) fn scan_labels(lines: &[SourceLine]) -> Result<LabelMap, AssembleError> {
    let mut labels = LabelMap::new();
    let mut text_index = 1u32;

    for line in lines {
        let parsed = match parser::parse_line(line.text) {
            Ok(parsed) => parsed,
            Err(_) => {
                text_index += 1;
                continue;
            }
        };

        let mut label = None;
        let mut has_statement = false;
        for pair in parsed.into_inner() {
            match pair.as_rule() {
                Rule::label_decl => {
                    label = Some(pair.into_inner().next().unwrap().as_str());
                }
                Rule::statement => has_statement = true,
                _ => {}
            }
        }

        if let Some(name) = label {
            if let Some(previous) = labels.get(name) {
                return Err(AssembleError::new(
                    ErrorKind::DuplicateLabel {
                        name: name.to_string(),
                        previous_line: previous.file_line,
                    },
                    line.file_line,
                ));
            }
            labels.insert(
                name.to_string(),
                Label {
                    text_index,
                    file_line: line.file_line,
                },
            );
        }

        if has_statement {
            text_index += 1;
        }
    }

    Ok(labels)
}
