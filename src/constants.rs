pub const WORD_BYTES        : u32 = 4;
pub const REGISTER_COUNT    : usize = 32;

pub const OPCODE_MASK       : u32 = 0b00000000000000000000000001111111;
pub const RD_MASK           : u32 = 0b00000000000000000000111110000000;
pub const FUNCT3_MASK       : u32 = 0b00000000000000000111000000000000;
pub const RS1_MASK          : u32 = 0b00000000000011111000000000000000;
pub const RS2_MASK          : u32 = 0b00000001111100000000000000000000;
pub const FUNCT7_MASK       : u32 = 0b11111110000000000000000000000000;
pub const FUNCT6_MASK       : u32 = 0b11111100000000000000000000000000;
pub const SHAMT_MASK        : u32 = 0b00000011111100000000000000000000;

pub const OPCODE_OFFSET     : u32 = 0;
pub const RD_OFFSET         : u32 = 7;
pub const FUNCT3_OFFSET     : u32 = 12;
pub const RS1_OFFSET        : u32 = 15;
pub const RS2_OFFSET        : u32 = 20;
pub const RS2_IMM_OFFSET    : u32 = 20;
pub const FUNCT7_OFFSET     : u32 = 25;
pub const FUNCT6_OFFSET     : u32 = 26;
pub const SHAMT_OFFSET      : u32 = 20;

/// funct6 value distinguishing arithmetic right shifts.
pub const FUNCT6_ARITH      : u32 = 0b010000;
/// funct7 value distinguishing `sub`/`sra` from `add`/`srl`.
pub const FUNCT7_ALT        : u32 = 0b0100000;

/// First byte of the data segment; instructions start at 0.
pub const DATA_BASE         : u32 = 0x10000;

/// Address width assumed when splitting an address into tag/index/offset.
pub const CACHE_ADDR_BITS   : u32 = 20;

/// Iteration cap for `run`, guarding against runaway loops.
pub const RUN_STEP_LIMIT    : u64 = 1_000_000;

/// Seed for the RANDOM replacement policy, fixed for reproducible journals.
pub const RANDOM_REPLACEMENT_SEED : u64 = 0x5EED_CAFE;
