use crate::error::ErrorKind;
use crate::int_util::parse_int;
use crate::parser::Rule;
use matches::debug_assert_matches;
use pest::iterators::Pair;
use rvcpu::{
    encode_b, encode_i, encode_j, encode_r, encode_s, encode_shift, encode_u, InstrFormat,
    LabelMap, Mnemonic, RegisterId, Word,
};

/// One operand as the grammar saw it: either a bare token or the
/// `offset(base)` memory form, possibly with pieces missing (the encoder
/// turns each missing piece into its diagnostic).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Operand<'i> {
    Plain(&'i str),
    Paren {
        offset: Option<&'i str>,
        base: Option<&'i str>,
        closed: bool,
    },
}

pub(crate) fn collect_statement<'i>(pair: Pair<'i, Rule>) -> (&'i str, Vec<Operand<'i>>) {
    debug_assert_matches!(pair.as_rule(), Rule::statement);
    let mut pairs = pair.into_inner();
    let mnemonic = pairs.next().unwrap().as_str();

    let operands = pairs
        .map(|operand| {
            let inner = operand.into_inner().next().unwrap();
            match inner.as_rule() {
                Rule::tok => Operand::Plain(inner.as_str()),
                Rule::paren => {
                    let mut offset = None;
                    let mut base = None;
                    let mut closed = false;
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::offset => offset = Some(part.as_str()),
                            Rule::base => base = Some(part.as_str()),
                            Rule::close => closed = true,
                            _ => unreachable!(),
                        }
                    }
                    Operand::Paren {
                        offset,
                        base,
                        closed,
                    }
                }
                _ => unreachable!(),
            }
        })
        .collect();

    (mnemonic, operands)
}

fn token_at<'i>(operands: &[Operand<'i>], index: usize) -> &'i str {
    match operands.get(index) {
        Some(Operand::Plain(token)) => token,
        _ => "",
    }
}

fn parse_rd(token: &str) -> Result<RegisterId, ErrorKind> {
    token
        .parse()
        .map_err(|_| ErrorKind::UnknownRd(token.to_string()))
}

fn parse_rs(token: &str) -> Result<RegisterId, ErrorKind> {
    token
        .parse()
        .map_err(|_| ErrorKind::UnknownRs(token.to_string()))
}

fn check_extra(operands: &[Operand], expected: usize) -> Result<(), ErrorKind> {
    if operands.len() > expected {
        Err(ErrorKind::Syntax)
    } else {
        Ok(())
    }
}

/// Shape check of the `offset(base)` operand: there must be a parenthesised
/// tail with a base token and a closing `)`. Returns the raw offset and base
/// tokens; their validity is the caller's concern, since loads/`jalr` and
/// stores diagnose them in different orders.
fn memory_operand<'i>(
    operands: &[Operand<'i>],
    index: usize,
) -> Result<(Option<&'i str>, &'i str), ErrorKind> {
    let (offset, base, closed) = match operands.get(index) {
        Some(Operand::Paren {
            offset,
            base,
            closed,
        }) => (*offset, *base, *closed),
        Some(Operand::Plain(_)) | None => return Err(ErrorKind::UnknownRs(String::new())),
    };

    match base {
        Some(token) if closed => Ok((offset, token)),
        _ => Err(ErrorKind::UnknownRs(base.unwrap_or("").to_string())),
    }
}

/// Parses and range-checks a memory-operand offset. `missing` is the
/// diagnostic for a parenthesised tail with no offset in front of it
/// (`jalr` differs from loads and stores).
fn parse_offset(token: Option<&str>, missing: ErrorKind) -> Result<i128, ErrorKind> {
    let token = match token {
        Some(token) => token,
        None => return Err(missing),
    };
    let value = parse_int(token).ok_or_else(|| ErrorKind::BadImmediate(token.to_string()))?;
    if value < -2048 || value > 2047 {
        return Err(ErrorKind::ImmediateRange(value));
    }
    Ok(value)
}

/// A branch or jump target: a label resolved to a PC-relative byte
/// displacement, or a literal displacement.
fn resolve_target(
    token: &str,
    labels: &LabelMap,
    current_index: u32,
) -> Result<i128, ErrorKind> {
    if let Some(label) = labels.get(token) {
        return Ok((i128::from(label.text_index) - i128::from(current_index)) * 4);
    }
    parse_int(token).ok_or_else(|| ErrorKind::LabelNotFound(token.to_string()))
}

/// Encodes one parsed statement into its 32-bit word. `current_index` is the
/// 1-based text index of this instruction, the reference point for
/// label-relative displacements.
pub(crate) fn encode_statement(
    mnemonic: &str,
    operands: &[Operand],
    labels: &LabelMap,
    current_index: u32,
) -> Result<Word, ErrorKind> {
    let mnemonic: Mnemonic = mnemonic
        .parse()
        .map_err(|_| ErrorKind::UnknownMnemonic(mnemonic.to_string()))?;

    match mnemonic.format() {
        InstrFormat::R => {
            check_extra(operands, 3)?;
            let rd = parse_rd(token_at(operands, 0))?;
            let rs1 = parse_rs(token_at(operands, 1))?;
            let rs2 = parse_rs(token_at(operands, 2))?;
            Ok(encode_r(mnemonic, rd, rs1, rs2))
        }

        InstrFormat::I => {
            check_extra(operands, 3)?;
            let rd = parse_rd(token_at(operands, 0))?;
            let rs1 = parse_rs(token_at(operands, 1))?;
            let token = token_at(operands, 2);
            let value =
                parse_int(token).ok_or_else(|| ErrorKind::BadImmediate(token.to_string()))?;

            if mnemonic.is_shift() {
                if value < 1 || value > 64 {
                    return Err(ErrorKind::ShiftRange(value));
                }
                Ok(encode_shift(mnemonic, rd, rs1, value as u32))
            } else {
                if value < -2048 || value > 2047 {
                    return Err(ErrorKind::ImmediateRange(value));
                }
                Ok(encode_i(mnemonic, rd, rs1, value as i32))
            }
        }

        InstrFormat::Load => {
            check_extra(operands, 2)?;
            let (offset, base) = memory_operand(operands, 1)?;
            // The offset is diagnosed before the registers are.
            let offset = parse_offset(offset, ErrorKind::BadImmediate(String::new()))?;
            let base = parse_rs(base)?;
            let rd = parse_rd(token_at(operands, 0))?;
            Ok(encode_i(mnemonic, rd, base, offset as i32))
        }

        InstrFormat::Jalr => {
            check_extra(operands, 2)?;
            let (offset, base) = memory_operand(operands, 1)?;
            let offset = parse_offset(offset, ErrorKind::MalformedJalr)?;
            let base = parse_rs(base)?;
            let rd = parse_rd(token_at(operands, 0))?;
            Ok(encode_i(mnemonic, rd, base, offset as i32))
        }

        InstrFormat::S => {
            check_extra(operands, 2)?;
            let (offset, base) = memory_operand(operands, 1)?;
            // Stores diagnose both registers before the offset.
            let rs2 = parse_rs(token_at(operands, 0))?;
            let base = parse_rs(base)?;
            let offset = parse_offset(offset, ErrorKind::BadImmediate(String::new()))?;
            Ok(encode_s(mnemonic, rs2, base, offset as i32))
        }

        InstrFormat::B => {
            check_extra(operands, 3)?;
            let rs1 = parse_rs(token_at(operands, 0))?;
            let rs2 = parse_rs(token_at(operands, 1))?;
            let displacement = resolve_target(token_at(operands, 2), labels, current_index)?;
            if displacement < -4096 || displacement > 4094 {
                return Err(ErrorKind::BranchRange(displacement));
            }
            Ok(encode_b(mnemonic, rs1, rs2, displacement as i32))
        }

        InstrFormat::U => {
            check_extra(operands, 2)?;
            let token = token_at(operands, 1);
            let value =
                parse_int(token).ok_or_else(|| ErrorKind::BadImmediate(token.to_string()))?;
            let rd = parse_rd(token_at(operands, 0))?;
            if value < 0 || value > 4_294_967_295 {
                return Err(ErrorKind::UpperImmediateRange(value));
            }
            Ok(encode_u(rd, value as u32))
        }

        InstrFormat::J => {
            check_extra(operands, 2)?;
            let displacement = resolve_target(token_at(operands, 1), labels, current_index)?;
            if displacement < -1_048_576 || displacement > 1_048_575 {
                return Err(ErrorKind::JumpRange(displacement));
            }
            let rd = parse_rd(token_at(operands, 0))?;
            Ok(encode_j(rd, displacement as i32))
        }
    }
}
