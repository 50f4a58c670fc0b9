//! Orchestrator for the RV64I simulator: owns the lifecycle of a loaded
//! program and the optional data cache, and exposes the command verbs the
//! interactive front-end dispatches to.
//!
//! The [`Simulator`](struct.Simulator.html) holds `Option<Machine>`; `None`
//! is the *idle* state, entered at startup and re-entered whenever a load
//! fails. The cache outlives individual loads but is fully invalidated (and
//! its journal reopened) on each one.

use rvasm::{AssembleError, DataDiagnostic};
use rvcpu::{
    BreakpointError, CacheConfig, CacheStats, ConfigError, DataCache, Frame, Machine, RunOutcome,
    SparseMemory, StepOutcome, Storage,
};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};


#[derive(Debug)]
pub enum LoadError {
    Io(io::Error, PathBuf),
    Assemble(AssembleError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Io(err, path) => {
                write!(f, "File \"{}\" could not be read: {}", path.display(), err)
            }
            LoadError::Assemble(err) => write!(f, "Error ({}): {}", err.code(), err),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum CommandError {
    NothingLoaded,
    Breakpoint(BreakpointError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandError::NothingLoaded => write!(f, "Nothing loaded."),
            CommandError::Breakpoint(err) => write!(f, "{}", err),
        }
    }
}

impl From<BreakpointError> for CommandError {
    fn from(err: BreakpointError) -> CommandError {
        CommandError::Breakpoint(err)
    }
}

/// What a successful load produced.
#[derive(Debug)]
pub struct LoadSummary {
    pub instructions: u32,
    pub data_bytes: usize,
    pub warnings: Vec<DataDiagnostic>,
    /// Path of the cache journal, when a cache is enabled and the journal
    /// could be opened.
    pub journal: Option<PathBuf>,
}

#[derive(Default)]
pub struct Simulator {
    machine: Option<Machine>,
    cache: Option<DataCache>,
    source_path: Option<PathBuf>,
}

impl Simulator {
    pub fn new() -> Simulator {
        Default::default()
    }

    pub fn loaded(&self) -> bool {
        self.machine.is_some()
    }

    pub fn machine(&self) -> Option<&Machine> {
        self.machine.as_ref()
    }

    /// Resets the whole machine state, assembles the file and starts over.
    /// On any failure the simulator is left idle, so subsequent `step`,
    /// `run` and `break` are rejected.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary, LoadError> {
        let path = path.as_ref();
        self.machine = None;
        self.source_path = None;

        let source =
            fs::read_to_string(path).map_err(|err| LoadError::Io(err, path.to_owned()))?;
        let assembly = rvasm::assemble(&source).map_err(LoadError::Assemble)?;

        let mut summary = LoadSummary {
            instructions: assembly.words.len() as u32,
            data_bytes: assembly.data.len(),
            warnings: assembly.warnings,
            journal: None,
        };

        self.machine = Some(Machine::new(
            assembly.program,
            &assembly.words,
            &assembly.data,
        ));
        self.source_path = Some(path.to_owned());

        if let Some(cache) = &mut self.cache {
            cache.reset();
            summary.journal = cache.open_journal(path).ok();
        }

        Ok(summary)
    }

    pub fn step(&mut self) -> Result<StepOutcome, CommandError> {
        match &mut self.machine {
            Some(machine) => Ok(machine.step(self.cache.as_mut())),
            None => Err(CommandError::NothingLoaded),
        }
    }

    pub fn run(&mut self) -> Result<RunOutcome, CommandError> {
        match &mut self.machine {
            Some(machine) => Ok(machine.run(self.cache.as_mut())),
            None => Err(CommandError::NothingLoaded),
        }
    }

    pub fn set_breakpoint(&mut self, file_line: u32) -> Result<(), CommandError> {
        match &mut self.machine {
            Some(machine) => Ok(machine.set_breakpoint(file_line)?),
            None => Err(CommandError::NothingLoaded),
        }
    }

    pub fn clear_breakpoint(&mut self, file_line: u32) -> Result<(), CommandError> {
        match &mut self.machine {
            Some(machine) => Ok(machine.clear_breakpoint(file_line)?),
            None => Err(CommandError::NothingLoaded),
        }
    }

    /// All 32 registers; zeros while idle (`regs` has no precondition).
    pub fn registers(&self) -> [i64; 32] {
        match &self.machine {
            Some(machine) => *machine.registers(),
            None => [0; 32],
        }
    }

    /// `count` bytes of memory from `address`; zeros while idle.
    pub fn read_memory(&self, address: u32, count: u32) -> Vec<u8> {
        match &self.machine {
            Some(machine) => (0..count)
                .map(|i| machine.memory().read_byte(address.wrapping_add(i)))
                .collect(),
            None => vec![0; count as usize],
        }
    }

    pub fn call_stack(&self) -> Result<&[Frame], CommandError> {
        match &self.machine {
            Some(machine) => Ok(machine.call_stack()),
            None => Err(CommandError::NothingLoaded),
        }
    }

    /// Builds the cache from a configuration file. A failure leaves the
    /// cache disabled. When a program is already loaded the journal opens
    /// immediately, named after the current source file.
    pub fn cache_enable<P: AsRef<Path>>(&mut self, config_path: P) -> Result<(), ConfigError> {
        self.cache = None;
        let config = CacheConfig::from_file(config_path)?;
        let mut cache = DataCache::new(config);
        if self.machine.is_some() {
            if let Some(source) = &self.source_path {
                let _ = cache.open_journal(source);
            }
        }
        self.cache = Some(cache);
        Ok(())
    }

    pub fn cache_disable(&mut self) {
        self.cache = None;
    }

    pub fn cache(&self) -> Option<&DataCache> {
        self.cache.as_ref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Writes dirty lines back and clears every valid bit. Returns false
    /// when no cache is enabled.
    pub fn cache_invalidate(&mut self) -> bool {
        match (&mut self.cache, &mut self.machine) {
            (Some(cache), Some(machine)) => {
                cache.invalidate(machine.memory_mut());
                true
            }
            (Some(cache), None) => {
                // No memory to write back into; just drop the lines.
                cache.invalidate(&mut SparseMemory::new());
                true
            }
            (None, _) => false,
        }
    }

    /// Writes the valid cache contents to `path`. `Ok(false)` when no cache
    /// is enabled.
    pub fn cache_dump<P: AsRef<Path>>(&self, path: P) -> io::Result<bool> {
        match &self.cache {
            Some(cache) => {
                let mut writer = BufWriter::new(File::create(path)?);
                cache.dump(&mut writer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
