//! Machine model for a 64-bit RISC-V (RV64I) subset.
//!
//! The crate provides the pieces a simulator front-end is built from:
//!
//! * [`Machine`](machine/struct.Machine.html): registers, program counter,
//!   sparse main memory, the loaded instruction stream and the call stack,
//!   advanced one instruction at a time with [`step`](machine/struct.Machine.html#method.step).
//! * [`SparseMemory`](memory/struct.SparseMemory.html): a byte-addressable
//!   32-bit address space that defaults to zero.
//! * [`DataCache`](cache/struct.DataCache.html): an optional set-associative
//!   L1 data cache between load/store instructions and memory, journaling
//!   every access.
//! * The register and mnemonic tables plus the instruction-word encoders in
//!   [`instructions`](instructions/index.html), shared with the assembler.

extern crate num;
#[macro_use]
extern crate num_derive;

pub mod cache;
pub mod constants;
pub mod instructions;
pub mod machine;
pub mod memory;
pub mod program;

pub use crate::cache::{
    CacheConfig, CacheStats, ConfigError, DataCache, ReplacementPolicy, WritePolicy,
};
pub use crate::instructions::*;
pub use crate::machine::{BreakpointError, Machine, RunOutcome, StepOutcome};
pub use crate::memory::{SparseMemory, Storage};
pub use crate::program::{Frame, InstructionEntry, Label, LabelMap, Program};

/// A 32-bit instruction word.
pub type Word = u32;
