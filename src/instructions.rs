use crate::{constants, Word};
use num::traits::ToPrimitive;
use std::fmt;
use std::str::FromStr;
use util::ParseEnumError;

// RV64I subset, 32-bit instruction words.

// Instruction Formats
//
//          +--------+-----+-----+--------+----------+--------+
//          |31    25|24 20|19 15|14    12|11       7|6      0|
//          +--------+-----+-----+--------+----------+--------+
// R-Format | funct7 | rs2 | rs1 | funct3 | rd       | opcode |
// I-Format | imm[11:0]    | rs1 | funct3 | rd       | opcode |
// S-Format | imm[11:5] rs2| rs1 | funct3 | imm[4:0] | opcode |
// B-Format | imm[12|10:5] rs2 rs1 funct3 imm[4:1|11]| opcode |
// U-Format | imm[31:12]                  | rd       | opcode |
// J-Format | imm[20|10:1|11|19:12]       | rd       | opcode |

/// Base opcodes of the subset, keyed by their 7-bit field value.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum BaseOpcode {
    OP     = 0b0110011,
    OPIMM  = 0b0010011,
    LOAD   = 0b0000011,
    JALR   = 0b1100111,
    STORE  = 0b0100011,
    BRANCH = 0b1100011,
    LUI    = 0b0110111,
    JAL    = 0b1101111,
}

/// The six encoding classes, with I split by opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstrFormat {
    R,
    I,
    Load,
    Jalr,
    S,
    B,
    U,
    J,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Mnemonic {
    //  Name  | Format | funct3 | Effect
    //--------+--------+--------+------------------------------------------
    ADD,   // | R      | 000    | rd = rs1 + rs2
    SUB,   // | R      | 000    | rd = rs1 - rs2 (funct7 0100000)
    XOR,   // | R      | 100    | rd = rs1 ^ rs2
    OR,    // | R      | 110    | rd = rs1 | rs2
    AND,   // | R      | 111    | rd = rs1 & rs2
    SLL,   // | R      | 001    | rd = rs1 << rs2
    SRL,   // | R      | 101    | rd = rs1 >> rs2 (inserting zeros)
    SRA,   // | R      | 101    | rd = rs1 >> rs2 (inserting sign, funct7 0100000)
    SLT,   // | R      | 010    | rd = (rs1 < rs2) ? 1 : 0
    SLTU,  // | R      | 011    | rd = (rs1 < rs2) ? 1 : 0 (unsigned)
    ADDI,  // | I      | 000    | rd = rs1 + imm
    XORI,  // | I      | 100    | rd = rs1 ^ imm
    ORI,   // | I      | 110    | rd = rs1 | imm
    ANDI,  // | I      | 111    | rd = rs1 & imm
    SLLI,  // | I      | 001    | rd = rs1 << shamt
    SRLI,  // | I      | 101    | rd = rs1 >> shamt (inserting zeros)
    SRAI,  // | I      | 101    | rd = rs1 >> shamt (inserting sign, funct6 010000)
    LB,    // | Load   | 000    | rd = sign_ext(MEM[rs1 + imm][0..1])
    LH,    // | Load   | 001    | rd = sign_ext(MEM[rs1 + imm][0..2])
    LW,    // | Load   | 010    | rd = sign_ext(MEM[rs1 + imm][0..4])
    LD,    // | Load   | 011    | rd = MEM[rs1 + imm][0..8]
    LBU,   // | Load   | 100    | rd = zero_ext(MEM[rs1 + imm][0..1])
    LHU,   // | Load   | 101    | rd = zero_ext(MEM[rs1 + imm][0..2])
    LWU,   // | Load   | 110    | rd = zero_ext(MEM[rs1 + imm][0..4])
    JALR,  // | Jalr   | 000    | rd = pc + 4; pc = rs1 + imm
    SB,    // | S      | 000    | MEM[rs1 + imm][0..1] = rs2
    SH,    // | S      | 001    | MEM[rs1 + imm][0..2] = rs2
    SW,    // | S      | 010    | MEM[rs1 + imm][0..4] = rs2
    SD,    // | S      | 011    | MEM[rs1 + imm][0..8] = rs2
    BEQ,   // | B      | 000    | if rs1 == rs2: pc += imm
    BNE,   // | B      | 001    | if rs1 != rs2: pc += imm
    BLT,   // | B      | 100    | if rs1 < rs2: pc += imm
    BGE,   // | B      | 101    | if rs1 >= rs2: pc += imm
    BLTU,  // | B      | 110    | if rs1 < rs2: pc += imm (unsigned)
    BGEU,  // | B      | 111    | if rs1 >= rs2: pc += imm (unsigned)
    LUI,   // | U      | -      | rd = sign_ext32(imm << 12)
    JAL,   // | J      | -      | rd = pc + 4; pc += imm
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::ADD => "add",
            Mnemonic::SUB => "sub",
            Mnemonic::XOR => "xor",
            Mnemonic::OR => "or",
            Mnemonic::AND => "and",
            Mnemonic::SLL => "sll",
            Mnemonic::SRL => "srl",
            Mnemonic::SRA => "sra",
            Mnemonic::SLT => "slt",
            Mnemonic::SLTU => "sltu",
            Mnemonic::ADDI => "addi",
            Mnemonic::XORI => "xori",
            Mnemonic::ORI => "ori",
            Mnemonic::ANDI => "andi",
            Mnemonic::SLLI => "slli",
            Mnemonic::SRLI => "srli",
            Mnemonic::SRAI => "srai",
            Mnemonic::LB => "lb",
            Mnemonic::LH => "lh",
            Mnemonic::LW => "lw",
            Mnemonic::LD => "ld",
            Mnemonic::LBU => "lbu",
            Mnemonic::LHU => "lhu",
            Mnemonic::LWU => "lwu",
            Mnemonic::JALR => "jalr",
            Mnemonic::SB => "sb",
            Mnemonic::SH => "sh",
            Mnemonic::SW => "sw",
            Mnemonic::SD => "sd",
            Mnemonic::BEQ => "beq",
            Mnemonic::BNE => "bne",
            Mnemonic::BLT => "blt",
            Mnemonic::BGE => "bge",
            Mnemonic::BLTU => "bltu",
            Mnemonic::BGEU => "bgeu",
            Mnemonic::LUI => "lui",
            Mnemonic::JAL => "jal",
        }
    }

    pub fn format(self) -> InstrFormat {
        use self::Mnemonic::*;
        match self {
            ADD | SUB | XOR | OR | AND | SLL | SRL | SRA | SLT | SLTU => InstrFormat::R,
            ADDI | XORI | ORI | ANDI | SLLI | SRLI | SRAI => InstrFormat::I,
            LB | LH | LW | LD | LBU | LHU | LWU => InstrFormat::Load,
            JALR => InstrFormat::Jalr,
            SB | SH | SW | SD => InstrFormat::S,
            BEQ | BNE | BLT | BGE | BLTU | BGEU => InstrFormat::B,
            LUI => InstrFormat::U,
            JAL => InstrFormat::J,
        }
    }

    pub fn opcode(self) -> BaseOpcode {
        match self.format() {
            InstrFormat::R => BaseOpcode::OP,
            InstrFormat::I => BaseOpcode::OPIMM,
            InstrFormat::Load => BaseOpcode::LOAD,
            InstrFormat::Jalr => BaseOpcode::JALR,
            InstrFormat::S => BaseOpcode::STORE,
            InstrFormat::B => BaseOpcode::BRANCH,
            InstrFormat::U => BaseOpcode::LUI,
            InstrFormat::J => BaseOpcode::JAL,
        }
    }

    pub fn funct3(self) -> u32 {
        use self::Mnemonic::*;
        match self {
            ADD | SUB | ADDI | LB | SB | BEQ | JALR => 0b000,
            SLL | SLLI | LH | SH | BNE => 0b001,
            SLT | LW | SW => 0b010,
            SLTU | LD | SD => 0b011,
            XOR | XORI | LBU | BLT => 0b100,
            SRL | SRA | SRLI | SRAI | LHU | BGE => 0b101,
            OR | ORI | LWU | BLTU => 0b110,
            AND | ANDI | BGEU => 0b111,
            LUI | JAL => 0,
        }
    }

    pub fn funct7(self) -> u32 {
        match self {
            Mnemonic::SUB | Mnemonic::SRA => constants::FUNCT7_ALT,
            _ => 0,
        }
    }

    /// `slli`/`srli`/`srai`, which carry funct6 + shamt instead of imm[11:0].
    pub fn is_shift(self) -> bool {
        matches!(
            self,
            Mnemonic::SLLI | Mnemonic::SRLI | Mnemonic::SRAI
        )
    }
}

/// The 32 architectural registers, in index order, named by ABI alias.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum RegisterId {
    ZERO,
    RA,
    SP,
    GP,
    TP,
    T0,
    T1,
    T2,
    S0,
    S1,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    T3,
    T4,
    T5,
    T6,
}

#[inline]
pub fn enum_to_u32<T: ToPrimitive + Copy>(val: T) -> u32 {
    val.to_u32().unwrap()
}

#[inline]
pub fn register_index(id: RegisterId) -> usize {
    enum_to_u32(id) as usize
}

impl RegisterId {
    pub fn abi_name(self) -> &'static str {
        const NAMES: [&str; constants::REGISTER_COUNT] = [
            "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3",
            "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11",
            "t3", "t4", "t5", "t6",
        ];
        NAMES[register_index(self)]
    }
}

impl FromStr for RegisterId {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<RegisterId, ParseEnumError> {
        use num::FromPrimitive;

        // "fp" is a second alias of s0.
        if s == "fp" {
            return Ok(RegisterId::S0);
        }

        // "x0" .. "x31"
        if let Some(digits) = s.strip_prefix('x') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(index) = digits.parse::<u32>() {
                    if let Some(id) = RegisterId::from_u32(index) {
                        return Ok(id);
                    }
                }
            }
            return Err(ParseEnumError::new(s, "RegisterId"));
        }

        (0..constants::REGISTER_COUNT as u32)
            .filter_map(RegisterId::from_u32)
            .find(|id| id.abi_name() == s)
            .ok_or_else(|| ParseEnumError::new(s, "RegisterId"))
    }
}

impl FromStr for Mnemonic {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Mnemonic, ParseEnumError> {
        use num::FromPrimitive;

        (0..)
            .map(Mnemonic::from_u32)
            .take_while(Option::is_some)
            .filter_map(|m| m)
            .find(|m| m.name() == s)
            .ok_or_else(|| ParseEnumError::new(s, "Mnemonic"))
    }
}

macro_rules! impl_enum_display {
    ($e:ty, $name:ident) => {
        impl fmt::Display for $e {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.$name())
            }
        }
    };
}

impl_enum_display!(Mnemonic, name);
impl_enum_display!(RegisterId, abi_name);

#[inline]
fn reg_field(id: RegisterId, offset: u32) -> Word {
    enum_to_u32(id) << offset
}

/// Constructs an R-format instruction.
pub fn encode_r(m: Mnemonic, rd: RegisterId, rs1: RegisterId, rs2: RegisterId) -> Word {
    enum_to_u32(m.opcode())
        | reg_field(rd, constants::RD_OFFSET)
        | (m.funct3() << constants::FUNCT3_OFFSET)
        | reg_field(rs1, constants::RS1_OFFSET)
        | reg_field(rs2, constants::RS2_OFFSET)
        | (m.funct7() << constants::FUNCT7_OFFSET)
}

/// Constructs an I-format instruction (arithmetic, load or `jalr`).
///
/// The immediate is truncated to its 12-bit field; range checking is the
/// assembler's concern.
pub fn encode_i(m: Mnemonic, rd: RegisterId, rs1: RegisterId, imm: i32) -> Word {
    enum_to_u32(m.opcode())
        | reg_field(rd, constants::RD_OFFSET)
        | (m.funct3() << constants::FUNCT3_OFFSET)
        | reg_field(rs1, constants::RS1_OFFSET)
        | (((imm as u32) & 0xFFF) << constants::RS2_IMM_OFFSET)
}

/// Constructs a shift-immediate instruction (`slli`/`srli`/`srai`).
pub fn encode_shift(m: Mnemonic, rd: RegisterId, rs1: RegisterId, shamt: u32) -> Word {
    let funct6 = if m == Mnemonic::SRAI {
        constants::FUNCT6_ARITH
    } else {
        0
    };
    enum_to_u32(m.opcode())
        | reg_field(rd, constants::RD_OFFSET)
        | (m.funct3() << constants::FUNCT3_OFFSET)
        | reg_field(rs1, constants::RS1_OFFSET)
        | ((shamt & 0b111111) << constants::SHAMT_OFFSET)
        | (funct6 << constants::FUNCT6_OFFSET)
}

/// Constructs an S-format instruction.
pub fn encode_s(m: Mnemonic, rs2: RegisterId, rs1: RegisterId, imm: i32) -> Word {
    let imm = imm as u32;
    enum_to_u32(m.opcode())
        | ((imm & 0b11111) << constants::RD_OFFSET)
        | (m.funct3() << constants::FUNCT3_OFFSET)
        | reg_field(rs1, constants::RS1_OFFSET)
        | reg_field(rs2, constants::RS2_OFFSET)
        | (((imm >> 5) & 0b1111111) << constants::FUNCT7_OFFSET)
}

/// Constructs a B-format instruction; bit 0 of `offset` is discarded.
pub fn encode_b(m: Mnemonic, rs1: RegisterId, rs2: RegisterId, offset: i32) -> Word {
    let imm = offset as u32;
    enum_to_u32(m.opcode())
        | (((imm >> 11) & 0b1) << 7)
        | (((imm >> 1) & 0b1111) << 8)
        | (m.funct3() << constants::FUNCT3_OFFSET)
        | reg_field(rs1, constants::RS1_OFFSET)
        | reg_field(rs2, constants::RS2_OFFSET)
        | (((imm >> 5) & 0b111111) << 25)
        | (((imm >> 12) & 0b1) << 31)
}

/// Constructs the U-format `lui` instruction; the low 20 bits of `value`
/// land in imm[31:12].
pub fn encode_u(rd: RegisterId, value: u32) -> Word {
    enum_to_u32(BaseOpcode::LUI) | reg_field(rd, constants::RD_OFFSET) | (value << 12)
}

/// Constructs the J-format `jal` instruction; bit 0 of `offset` is discarded.
pub fn encode_j(rd: RegisterId, offset: i32) -> Word {
    let imm = offset as u32;
    enum_to_u32(BaseOpcode::JAL)
        | reg_field(rd, constants::RD_OFFSET)
        | (((imm >> 12) & 0b11111111) << 12)
        | (((imm >> 11) & 0b1) << 20)
        | (((imm >> 1) & 0b1111111111) << 21)
        | (((imm >> 20) & 0b1) << 31)
}
