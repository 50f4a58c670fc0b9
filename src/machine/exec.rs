use num::FromPrimitive;
use std::num::Wrapping;

use crate::cache::DataCache;
use crate::constants;
use crate::instructions::BaseOpcode;
use crate::machine::Machine;
use crate::memory::Storage;
use crate::program::Frame;
use crate::Word;

pub(crate) enum ExecResult {
    Next,
    Jump(u32),
}

fn write_reg(registers: &mut [i64; constants::REGISTER_COUNT], id: usize, value: Wrapping<i64>) {
    if id != 0 {
        registers[id] = value.0;
    }
}

fn set_if(registers: &mut [i64; constants::REGISTER_COUNT], id: usize, condition: bool) {
    write_reg(registers, id, Wrapping(if condition { 1 } else { 0 }));
}

fn sign_extend_12(value: u32) -> i64 {
    (((value << 20) as i32) >> 20) as i64
}

fn sign_extend_13(value: u32) -> i64 {
    (((value << 19) as i32) >> 19) as i64
}

fn sign_extend_21(value: u32) -> i64 {
    (((value << 11) as i32) >> 11) as i64
}

fn load_size(funct3: u32) -> Option<u32> {
    match funct3 {
        0b000 | 0b100 => Some(1),
        0b001 | 0b101 => Some(2),
        0b010 | 0b110 => Some(4),
        0b011 => Some(8),
        _ => None,
    }
}

fn store_size(funct3: u32) -> Option<u32> {
    match funct3 {
        0b000 => Some(1),
        0b001 => Some(2),
        0b010 => Some(4),
        0b011 => Some(8),
        _ => None,
    }
}

/// Extends the raw loaded bytes into a register value per funct3.
fn extend_loaded(funct3: u32, raw: u64) -> i64 {
    match funct3 {
        0b000 => raw as u8 as i8 as i64,
        0b001 => raw as u16 as i16 as i64,
        0b010 => raw as u32 as i32 as i64,
        0b011 => raw as i64,
        0b100 => i64::from(raw as u8),
        0b101 => i64::from(raw as u16),
        0b110 => i64::from(raw as u32),
        _ => 0,
    }
}

/// Decodes and executes one instruction word against the machine.
///
/// The interpreter is total: words that decode to nothing are no-ops. All
/// arithmetic is wrapping 64-bit two's complement, and writes to register 0
/// are discarded in one place.
pub(crate) fn execute(
    m: &mut Machine,
    cache: Option<&mut DataCache>,
    instruction: Word,
) -> ExecResult {
    let opcode = (instruction & constants::OPCODE_MASK) >> constants::OPCODE_OFFSET;
    let opcode = BaseOpcode::from_u32(opcode);

    let rdid = ((instruction & constants::RD_MASK) >> constants::RD_OFFSET) as usize;
    let rs1id = ((instruction & constants::RS1_MASK) >> constants::RS1_OFFSET) as usize;
    let rs2id = ((instruction & constants::RS2_MASK) >> constants::RS2_OFFSET) as usize;
    let funct3 = (instruction & constants::FUNCT3_MASK) >> constants::FUNCT3_OFFSET;
    let funct7 = (instruction & constants::FUNCT7_MASK) >> constants::FUNCT7_OFFSET;

    let rs1i = Wrapping(m.registers[rs1id]);
    let rs2i = Wrapping(m.registers[rs2id]);
    let rs1u = m.registers[rs1id] as u64;
    let rs2u = m.registers[rs2id] as u64;

    let imm_i = sign_extend_12((instruction >> 20) & 0xFFF);

    let opcode = match opcode {
        Some(opcode) => opcode,
        None => return ExecResult::Next,
    };

    match opcode {
        BaseOpcode::OP => {
            let shamt = (rs2u & 0b111111) as usize;
            match (funct7, funct3) {
                (0, 0b000) => write_reg(&mut m.registers, rdid, rs1i + rs2i),
                (constants::FUNCT7_ALT, 0b000) => write_reg(&mut m.registers, rdid, rs1i - rs2i),
                (0, 0b100) => write_reg(&mut m.registers, rdid, rs1i ^ rs2i),
                (0, 0b110) => write_reg(&mut m.registers, rdid, rs1i | rs2i),
                (0, 0b111) => write_reg(&mut m.registers, rdid, rs1i & rs2i),
                (0, 0b001) => write_reg(&mut m.registers, rdid, rs1i << shamt),
                (0, 0b101) => {
                    write_reg(&mut m.registers, rdid, Wrapping((rs1u >> shamt) as i64))
                }
                (constants::FUNCT7_ALT, 0b101) => {
                    write_reg(&mut m.registers, rdid, rs1i >> shamt)
                }
                (0, 0b010) => set_if(&mut m.registers, rdid, rs1i < rs2i),
                (0, 0b011) => set_if(&mut m.registers, rdid, rs1u < rs2u),
                _ => {}
            }
        }

        BaseOpcode::OPIMM => {
            let imm = Wrapping(imm_i);
            match funct3 {
                0b000 => write_reg(&mut m.registers, rdid, rs1i + imm),
                0b100 => write_reg(&mut m.registers, rdid, rs1i ^ imm),
                0b110 => write_reg(&mut m.registers, rdid, rs1i | imm),
                0b111 => write_reg(&mut m.registers, rdid, rs1i & imm),
                0b001 | 0b101 => {
                    let funct6 = (instruction & constants::FUNCT6_MASK) >> constants::FUNCT6_OFFSET;
                    let shamt =
                        ((instruction & constants::SHAMT_MASK) >> constants::SHAMT_OFFSET) as usize;
                    match (funct6, funct3) {
                        (0, 0b001) => write_reg(&mut m.registers, rdid, rs1i << shamt),
                        (0, 0b101) => {
                            write_reg(&mut m.registers, rdid, Wrapping((rs1u >> shamt) as i64))
                        }
                        (constants::FUNCT6_ARITH, 0b101) => {
                            write_reg(&mut m.registers, rdid, rs1i >> shamt)
                        }
                        _ => {}
                    }
                }
                0b010 => set_if(&mut m.registers, rdid, rs1i.0 < imm_i),
                0b011 => set_if(&mut m.registers, rdid, rs1u < imm_i as u64),
                _ => {}
            }
        }

        BaseOpcode::LOAD => {
            if let Some(size) = load_size(funct3) {
                let address = rs1i.0.wrapping_add(imm_i) as u32;
                let raw = match cache {
                    Some(cache) => cache.read(&mut m.memory, address, size),
                    None => m.memory.read(address, size),
                };
                write_reg(&mut m.registers, rdid, Wrapping(extend_loaded(funct3, raw)));
            }
        }

        BaseOpcode::STORE => {
            if let Some(size) = store_size(funct3) {
                let imm = ((instruction >> 7) & 0b11111) | (((instruction >> 25) & 0b1111111) << 5);
                let address = rs1i.0.wrapping_add(sign_extend_12(imm)) as u32;
                match cache {
                    Some(cache) => cache.write(&mut m.memory, address, rs2u, size),
                    None => m.memory.write(address, size, rs2u),
                }
            }
        }

        BaseOpcode::BRANCH => {
            let imm = (((instruction >> 8) & 0b1111) << 1)
                | (((instruction >> 25) & 0b111111) << 5)
                | (((instruction >> 7) & 0b1) << 11)
                | (((instruction >> 31) & 0b1) << 12);
            let offset = sign_extend_13(imm);
            let taken = match funct3 {
                0b000 => rs1i == rs2i,
                0b001 => rs1i != rs2i,
                0b100 => rs1i < rs2i,
                0b101 => rs1i >= rs2i,
                0b110 => rs1u < rs2u,
                0b111 => rs1u >= rs2u,
                _ => false,
            };
            if taken {
                return ExecResult::Jump(m.pc.wrapping_add(offset as u32));
            }
        }

        BaseOpcode::JALR => {
            write_reg(
                &mut m.registers,
                rdid,
                Wrapping(i64::from(m.pc.wrapping_add(constants::WORD_BYTES))),
            );
            let target = rs1i.0.wrapping_add(imm_i) as u32;
            // Returns pop a frame; this happens even for rd != 0.
            m.call_stack.pop();
            return ExecResult::Jump(target);
        }

        BaseOpcode::JAL => {
            write_reg(
                &mut m.registers,
                rdid,
                Wrapping(i64::from(m.pc.wrapping_add(constants::WORD_BYTES))),
            );
            let imm = (((instruction >> 21) & 0b11111_11111) << 1)
                | (((instruction >> 20) & 0b1) << 11)
                | (((instruction >> 12) & 0b11111111) << 12)
                | (((instruction >> 31) & 0b1) << 20);
            let target = m.pc.wrapping_add(sign_extend_21(imm) as u32);
            let target_index = target / constants::WORD_BYTES + 1;
            let frame = match m.program.label_at(target_index) {
                Some((name, label)) => Frame {
                    function: name.to_string(),
                    line: label.file_line.saturating_sub(1),
                },
                None => Frame {
                    function: String::new(),
                    line: 0,
                },
            };
            m.call_stack.push(frame);
            return ExecResult::Jump(target);
        }

        BaseOpcode::LUI => {
            let value = ((instruction >> 12) << 12) as i32 as i64;
            write_reg(&mut m.registers, rdid, Wrapping(value));
        }
    }

    ExecResult::Next
}
