use crate::constants;
use crate::memory::Storage;
use byteorder::ByteOrder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use util::{Endian, ParseEnumError};

/// How a victim way is chosen on a miss.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReplacementPolicy {
    LRU,
    FIFO,
    RANDOM,
}

/// When stores reach main memory.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WritePolicy {
    WriteBack,
    WriteThrough,
}

impl ReplacementPolicy {
    pub fn name(self) -> &'static str {
        match self {
            ReplacementPolicy::LRU => "LRU",
            ReplacementPolicy::FIFO => "FIFO",
            ReplacementPolicy::RANDOM => "RANDOM",
        }
    }
}

impl WritePolicy {
    pub fn name(self) -> &'static str {
        match self {
            WritePolicy::WriteBack => "WB",
            WritePolicy::WriteThrough => "WT",
        }
    }
}

impl FromStr for ReplacementPolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<ReplacementPolicy, ParseEnumError> {
        match s {
            "LRU" => Ok(ReplacementPolicy::LRU),
            "FIFO" => Ok(ReplacementPolicy::FIFO),
            "RANDOM" => Ok(ReplacementPolicy::RANDOM),
            _ => Err(ParseEnumError::new(s, "ReplacementPolicy")),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<WritePolicy, ParseEnumError> {
        match s {
            "WB" => Ok(WritePolicy::WriteBack),
            "WT" => Ok(WritePolicy::WriteThrough),
            _ => Err(ParseEnumError::new(s, "WritePolicy")),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    MissingLine(&'static str),
    InvalidNumber(&'static str, String),
    InvalidPolicy(ParseEnumError),
    Geometry(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Reading config file failed: {}", err),
            ConfigError::MissingLine(what) => {
                write!(f, "Config file format invalid: missing {}.", what)
            }
            ConfigError::InvalidNumber(what, value) => {
                write!(f, "Config file format invalid: {} \"{}\".", what, value)
            }
            ConfigError::InvalidPolicy(err) => write!(f, "Config file format invalid: {}", err),
            ConfigError::Geometry(what) => write!(f, "Invalid cache geometry: {}.", what),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<ParseEnumError> for ConfigError {
    fn from(err: ParseEnumError) -> ConfigError {
        ConfigError::InvalidPolicy(err)
    }
}

/// Cache geometry and policies, read from a five-line configuration file:
/// cache size in bytes, block size, associativity (0 means fully
/// associative), replacement policy (`LRU|FIFO|RANDOM`), write policy
/// (`WB|WT`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheConfig {
    pub cache_size: u32,
    pub block_size: u32,
    pub associativity: u32,
    pub replacement: ReplacementPolicy,
    pub write: WritePolicy,
}

fn parse_size_line(line: Option<&str>, what: &'static str) -> Result<u32, ConfigError> {
    let text = line.ok_or(ConfigError::MissingLine(what))?.trim();
    text.parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber(what, text.to_string()))
}

impl CacheConfig {
    /// Parses and validates the five-line format. An associativity of 0 is
    /// resolved to `cache_size / block_size` with a single set.
    pub fn parse(input: &str) -> Result<CacheConfig, ConfigError> {
        let mut lines = input.lines();

        let cache_size = parse_size_line(lines.next(), "cache size")?;
        let block_size = parse_size_line(lines.next(), "block size")?;
        let associativity = parse_size_line(lines.next(), "associativity")?;
        let replacement = lines
            .next()
            .ok_or(ConfigError::MissingLine("replacement policy"))?
            .trim()
            .parse::<ReplacementPolicy>()?;
        let write = lines
            .next()
            .ok_or(ConfigError::MissingLine("write policy"))?
            .trim()
            .parse::<WritePolicy>()?;

        if cache_size == 0 || !cache_size.is_power_of_two() {
            return Err(ConfigError::Geometry("cache size must be a power of two"));
        }
        if block_size == 0 || !block_size.is_power_of_two() {
            return Err(ConfigError::Geometry("block size must be a power of two"));
        }
        if block_size > cache_size {
            return Err(ConfigError::Geometry("block size exceeds cache size"));
        }

        let associativity = if associativity == 0 {
            cache_size / block_size
        } else {
            associativity
        };

        if cache_size % (block_size * associativity) != 0 {
            return Err(ConfigError::Geometry(
                "cache size must be a multiple of block size times associativity",
            ));
        }

        let sets = cache_size / (block_size * associativity);
        let offset_bits = block_size.trailing_zeros();
        let index_bits = sets.trailing_zeros();
        if offset_bits + index_bits > constants::CACHE_ADDR_BITS {
            return Err(ConfigError::Geometry(
                "offset and index widths exceed the 20-bit tagging space",
            ));
        }

        Ok(CacheConfig {
            cache_size,
            block_size,
            associativity,
            replacement,
            write,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CacheConfig, ConfigError> {
        let mut input = String::new();
        File::open(path)?.read_to_string(&mut input)?;
        CacheConfig::parse(&input)
    }

    pub fn sets(&self) -> u32 {
        self.cache_size / (self.block_size * self.associativity)
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cache Size: {}", self.cache_size)?;
        writeln!(f, "Block Size: {}", self.block_size)?;
        writeln!(f, "Associativity: {}", self.associativity)?;
        writeln!(f, "Replacement Policy: {}", self.replacement)?;
        write!(f, "Write Back Policy: {}", self.write)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }
}

#[derive(Clone, Debug)]
struct CacheLine {
    valid: bool,
    dirty: bool,
    tag: u32,
    block: Vec<u8>,
    arrival_time: u64,
    last_use_time: u64,
}

impl CacheLine {
    fn new(block_size: u32) -> CacheLine {
        CacheLine {
            valid: false,
            dirty: false,
            tag: 0,
            block: vec![0; block_size as usize],
            arrival_time: 0,
            last_use_time: 0,
        }
    }

    fn invalidate(&mut self) {
        self.valid = false;
        self.dirty = false;
        self.arrival_time = 0;
        self.last_use_time = 0;
    }
}

struct Journal {
    file: File,
}

impl Journal {
    fn open(path: &Path) -> io::Result<Journal> {
        Ok(Journal {
            file: File::create(path)?,
        })
    }

    // Best-effort append; flushed per line so a crash preserves the trace.
    fn record(&mut self, args: fmt::Arguments) {
        let _ = self.file.write_fmt(args);
        let _ = self.file.flush();
    }
}

/// A set-associative L1 data cache in front of main memory.
///
/// Every access increments the global access counter, which doubles as the
/// clock stamped into `arrival_time` (on insertion) and `last_use_time` (on
/// hit or insertion). Addresses are split per the configured widths over a
/// 20-bit tagging space.
pub struct DataCache {
    config: CacheConfig,
    offset_bits: u32,
    index_bits: u32,
    tag_bits: u32,
    sets: Vec<Vec<CacheLine>>,
    stats: CacheStats,
    rng: StdRng,
    journal: Option<Journal>,
}

impl DataCache {
    pub fn new(config: CacheConfig) -> DataCache {
        let sets = config.sets();
        let offset_bits = config.block_size.trailing_zeros();
        let index_bits = sets.trailing_zeros();
        let tag_bits = constants::CACHE_ADDR_BITS - index_bits - offset_bits;

        DataCache {
            config,
            offset_bits,
            index_bits,
            tag_bits,
            sets: (0..sets)
                .map(|_| {
                    (0..config.associativity)
                        .map(|_| CacheLine::new(config.block_size))
                        .collect()
                })
                .collect(),
            stats: CacheStats::default(),
            rng: StdRng::seed_from_u64(constants::RANDOM_REPLACEMENT_SEED),
            journal: None,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Load-time reset: invalidates every line, zeroes the statistics and
    /// reseeds the replacement RNG so journals replay identically.
    pub fn reset(&mut self) {
        for set in &mut self.sets {
            for line in set.iter_mut() {
                line.invalidate();
            }
        }
        self.stats = CacheStats::default();
        self.rng = StdRng::seed_from_u64(constants::RANDOM_REPLACEMENT_SEED);
    }

    /// The `cache_sim invalidate` operation: dirty lines are written back
    /// first (write-back mode), then every valid bit is cleared. Statistics
    /// are preserved.
    pub fn invalidate<S: Storage>(&mut self, memory: &mut S) {
        for set_index in 0..self.sets.len() {
            for way in 0..self.sets[set_index].len() {
                self.write_back_if_dirty(memory, set_index, way);
                self.sets[set_index][way].invalidate();
            }
        }
    }

    /// Opens a fresh journal named `<source without extension>.output` next
    /// to the source file, replacing any previous journal.
    pub fn open_journal(&mut self, source_path: &Path) -> io::Result<PathBuf> {
        let path = source_path.with_extension("output");
        self.journal = Some(Journal::open(&path)?);
        Ok(path)
    }

    pub fn close_journal(&mut self) {
        self.journal = None;
    }

    /// Reads `size` bytes at `address` through the cache. An access that
    /// straddles a block boundary is split at the boundary, one journaled
    /// access per block.
    pub fn read<S: Storage>(&mut self, memory: &mut S, address: u32, size: u32) -> u64 {
        assert!(size >= 1 && size <= 8);
        let mut buf = [0u8; 8];
        let mut cursor = address;
        let mut filled = 0;

        while filled < size {
            let offset = cursor & (self.config.block_size - 1);
            let take = (size - filled).min(self.config.block_size - offset);
            let (set_index, way) = self.access_read(memory, cursor);
            let block = &self.sets[set_index][way].block;
            buf[filled as usize..(filled + take) as usize]
                .copy_from_slice(&block[offset as usize..(offset + take) as usize]);
            filled += take;
            cursor = cursor.wrapping_add(take);
        }

        Endian::read_uint(&buf, size as usize)
    }

    /// Writes the low `size` bytes of `data` at `address` through the cache,
    /// splitting at block boundaries like [`read`](#method.read).
    pub fn write<S: Storage>(&mut self, memory: &mut S, address: u32, data: u64, size: u32) {
        assert!(size >= 1 && size <= 8);
        let mut buf = [0u8; 8];
        Endian::write_uint(&mut buf[..size as usize], data, size as usize);
        let mut cursor = address;
        let mut written = 0;

        while written < size {
            let offset = cursor & (self.config.block_size - 1);
            let take = (size - written).min(self.config.block_size - offset);
            let chunk = buf[written as usize..(written + take) as usize].to_vec();
            self.access_write(memory, cursor, &chunk);
            written += take;
            cursor = cursor.wrapping_add(take);
        }
    }

    /// Writes the contents of every valid way, one line each.
    pub fn dump<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (set_index, set) in self.sets.iter().enumerate() {
            for (way, line) in set.iter().enumerate() {
                if !line.valid {
                    continue;
                }
                let state = if line.dirty { "Dirty" } else { "Clean" };
                write!(
                    writer,
                    "Set: 0x{:X}, Way: {}, Tag: 0x{:X}, {}, Data:",
                    set_index, way, line.tag, state
                )?;
                for byte in &line.block {
                    write!(writer, " {:02X}", byte)?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    fn split(&self, address: u32) -> (u32, u32, u32) {
        let offset = address & ((1 << self.offset_bits) - 1);
        let index = (address >> self.offset_bits) & ((1 << self.index_bits) - 1);
        let tag = (address >> (self.offset_bits + self.index_bits)) & ((1 << self.tag_bits) - 1);
        (tag, index, offset)
    }

    fn line_address(&self, tag: u32, index: u32) -> u32 {
        (tag << (self.offset_bits + self.index_bits)) | (index << self.offset_bits)
    }

    fn find_way(&self, set_index: usize, tag: u32) -> Option<usize> {
        self.sets[set_index]
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    fn choose_victim(&mut self, set_index: usize) -> usize {
        let set = &self.sets[set_index];
        match self.config.replacement {
            ReplacementPolicy::LRU => set
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| line.last_use_time)
                .map(|(way, _)| way)
                .unwrap_or(0),
            ReplacementPolicy::FIFO => set
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| line.arrival_time)
                .map(|(way, _)| way)
                .unwrap_or(0),
            ReplacementPolicy::RANDOM => self.rng.gen_range(0..set.len()),
        }
    }

    fn write_back_if_dirty<S: Storage>(&mut self, memory: &mut S, set_index: usize, way: usize) {
        let line = &self.sets[set_index][way];
        if self.config.write == WritePolicy::WriteBack && line.valid && line.dirty {
            let base = self.line_address(line.tag, set_index as u32);
            for (i, byte) in line.block.iter().enumerate() {
                memory.write_byte(base.wrapping_add(i as u32), *byte);
            }
        }
    }

    fn fill<S: Storage>(&mut self, memory: &mut S, set_index: usize, way: usize, tag: u32) {
        let base = self.line_address(tag, set_index as u32);
        let clock = self.stats.accesses;
        let line = &mut self.sets[set_index][way];
        for (i, byte) in line.block.iter_mut().enumerate() {
            *byte = memory.read_byte(base.wrapping_add(i as u32));
        }
        line.valid = true;
        line.dirty = false;
        line.tag = tag;
        line.arrival_time = clock;
        line.last_use_time = clock;
    }

    fn record(&mut self, op: char, address: u32, set: u32, hit: bool, tag: u32, dirty: bool) {
        if let Some(journal) = &mut self.journal {
            journal.record(format_args!(
                "{}: Address: 0x{:X}, Set: 0x{:X}, {}, Tag: 0x{:X}, {}\n",
                op,
                address,
                set,
                if hit { "Hit" } else { "Miss" },
                tag,
                if dirty { "Dirty" } else { "Clean" },
            ));
        }
    }

    fn access_read<S: Storage>(&mut self, memory: &mut S, address: u32) -> (usize, usize) {
        self.stats.accesses += 1;
        let (tag, index, _) = self.split(address);
        let set_index = index as usize;

        if let Some(way) = self.find_way(set_index, tag) {
            self.stats.hits += 1;
            let clock = self.stats.accesses;
            let line = &mut self.sets[set_index][way];
            line.last_use_time = clock;
            let dirty = line.dirty;
            self.record('R', address, index, true, tag, dirty);
            return (set_index, way);
        }

        self.stats.misses += 1;
        let way = self.choose_victim(set_index);
        self.write_back_if_dirty(memory, set_index, way);
        self.fill(memory, set_index, way, tag);
        self.record('R', address, index, false, tag, false);
        (set_index, way)
    }

    fn access_write<S: Storage>(&mut self, memory: &mut S, address: u32, bytes: &[u8]) {
        self.stats.accesses += 1;
        let (tag, index, offset) = self.split(address);
        let set_index = index as usize;

        if let Some(way) = self.find_way(set_index, tag) {
            self.stats.hits += 1;
            let clock = self.stats.accesses;
            let write_policy = self.config.write;
            let line = &mut self.sets[set_index][way];
            line.last_use_time = clock;
            line.block[offset as usize..offset as usize + bytes.len()].copy_from_slice(bytes);
            match write_policy {
                WritePolicy::WriteBack => line.dirty = true,
                WritePolicy::WriteThrough => {
                    for (i, byte) in bytes.iter().enumerate() {
                        memory.write_byte(address.wrapping_add(i as u32), *byte);
                    }
                }
            }
            let dirty = self.sets[set_index][way].dirty;
            self.record('W', address, index, true, tag, dirty);
            return;
        }

        self.stats.misses += 1;
        match self.config.write {
            WritePolicy::WriteBack => {
                // Write-allocate: fetch the block, overlay the store bytes.
                let way = self.choose_victim(set_index);
                self.write_back_if_dirty(memory, set_index, way);
                self.fill(memory, set_index, way, tag);
                let line = &mut self.sets[set_index][way];
                line.block[offset as usize..offset as usize + bytes.len()].copy_from_slice(bytes);
                line.dirty = true;
                self.record('W', address, index, false, tag, true);
            }
            WritePolicy::WriteThrough => {
                // No allocate: the set is left untouched.
                for (i, byte) in bytes.iter().enumerate() {
                    memory.write_byte(address.wrapping_add(i as u32), *byte);
                }
                self.record('W', address, index, false, tag, false);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::SparseMemory;
    use matches::assert_matches;

    fn config(
        cache_size: u32,
        block_size: u32,
        associativity: u32,
        replacement: ReplacementPolicy,
        write: WritePolicy,
    ) -> CacheConfig {
        CacheConfig::parse(&format!(
            "{}\n{}\n{}\n{}\n{}\n",
            cache_size, block_size, associativity, replacement, write
        ))
        .unwrap()
    }

    #[test]
    fn parse_config() {
        let parsed = CacheConfig::parse("64\n16\n2\nLRU\nWB\n").unwrap();
        assert_eq!(
            parsed,
            CacheConfig {
                cache_size: 64,
                block_size: 16,
                associativity: 2,
                replacement: ReplacementPolicy::LRU,
                write: WritePolicy::WriteBack,
            }
        );
        assert_eq!(parsed.sets(), 2);
    }

    #[test]
    fn parse_config_fully_associative() {
        let parsed = CacheConfig::parse("64\n16\n0\nFIFO\nWT\n").unwrap();
        assert_eq!(parsed.associativity, 4);
        assert_eq!(parsed.sets(), 1);
    }

    #[test]
    fn parse_config_rejects_bad_input() {
        assert_matches!(
            CacheConfig::parse("64\n16\n2\nLRU\n"),
            Err(ConfigError::MissingLine(_))
        );
        assert_matches!(
            CacheConfig::parse("64\nsixteen\n2\nLRU\nWB\n"),
            Err(ConfigError::InvalidNumber(_, _))
        );
        assert_matches!(
            CacheConfig::parse("64\n16\n2\nMRU\nWB\n"),
            Err(ConfigError::InvalidPolicy(_))
        );
        assert_matches!(
            CacheConfig::parse("48\n16\n2\nLRU\nWB\n"),
            Err(ConfigError::Geometry(_))
        );
        assert_matches!(
            CacheConfig::parse("64\n16\n3\nLRU\nWB\n"),
            Err(ConfigError::Geometry(_))
        );
    }

    #[test]
    fn accesses_equal_hits_plus_misses() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        for address in &[0u32, 32, 64, 0, 4, 32, 96] {
            cache.read(&mut memory, *address, 4);
        }
        let stats = cache.stats();
        assert_eq!(stats.accesses, stats.hits + stats.misses);
        assert_eq!(stats.accesses, 7);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut memory = SparseMemory::new();
        memory.write_word(0, 0xAAAA_AAAA);
        memory.write_word(32, 0xBBBB_BBBB);
        memory.write_word(64, 0xCCCC_CCCC);

        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        // A, B, A, C: B is the least recently used when C arrives.
        cache.read(&mut memory, 0, 4);
        cache.read(&mut memory, 32, 4);
        cache.read(&mut memory, 0, 4);
        cache.read(&mut memory, 64, 4);

        // A must still hit, B must miss.
        let before = cache.stats().hits;
        cache.read(&mut memory, 0, 4);
        assert_eq!(cache.stats().hits, before + 1);
        cache.read(&mut memory, 32, 4);
        assert_eq!(cache.stats().hits, before + 1);
    }

    #[test]
    fn fifo_evicts_earliest_arrival() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::FIFO,
            WritePolicy::WriteBack,
        ));

        // A, B, A, C: under FIFO the re-use of A does not protect it.
        cache.read(&mut memory, 0, 4);
        cache.read(&mut memory, 32, 4);
        cache.read(&mut memory, 0, 4);
        cache.read(&mut memory, 64, 4);

        // B must still hit, A must miss.
        let before = cache.stats().hits;
        cache.read(&mut memory, 32, 4);
        assert_eq!(cache.stats().hits, before + 1);
        cache.read(&mut memory, 0, 4);
        assert_eq!(cache.stats().hits, before + 1);
    }

    #[test]
    fn write_back_defers_memory_update_until_eviction() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        cache.write(&mut memory, 0, 0xDEAD_BEEF, 4);
        assert_eq!(memory.read_word(0), 0);

        // Fill both ways of set 0, forcing the dirty block out.
        cache.read(&mut memory, 32, 4);
        cache.read(&mut memory, 64, 4);
        assert_eq!(memory.read_word(0), 0xDEAD_BEEF);
    }

    #[test]
    fn write_through_updates_memory_immediately() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteThrough,
        ));

        cache.write(&mut memory, 8, 0x1234, 2);
        assert_eq!(memory.read_half(8), 0x1234);
        // Miss without allocation: a subsequent read still misses.
        let misses = cache.stats().misses;
        cache.read(&mut memory, 8, 2);
        assert_eq!(cache.stats().misses, misses + 1);
    }

    #[test]
    fn write_through_hit_keeps_line_clean() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteThrough,
        ));

        cache.read(&mut memory, 0, 4);
        cache.write(&mut memory, 0, 0xFF, 1);
        assert_eq!(memory.read_byte(0), 0xFF);
        assert_eq!(cache.read(&mut memory, 0, 1), 0xFF);

        // Invalidation with no dirty lines must not touch memory.
        memory.write_byte(1, 0x55);
        cache.invalidate(&mut memory);
        assert_eq!(memory.read_byte(1), 0x55);
    }

    #[test]
    fn fully_associative_uses_single_set() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            0,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        // Four blocks fit regardless of their index bits.
        for address in &[0u32, 16, 32, 48] {
            cache.read(&mut memory, *address, 4);
        }
        let before = cache.stats().misses;
        for address in &[0u32, 16, 32, 48] {
            cache.read(&mut memory, *address, 4);
        }
        assert_eq!(cache.stats().misses, before);
    }

    #[test]
    fn invalidate_writes_dirty_lines_back() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        cache.write(&mut memory, 16, 0xABCD, 2);
        assert_eq!(memory.read_half(16), 0);
        cache.invalidate(&mut memory);
        assert_eq!(memory.read_half(16), 0xABCD);

        // Lines are gone; the next read misses.
        let misses = cache.stats().misses;
        cache.read(&mut memory, 16, 2);
        assert_eq!(cache.stats().misses, misses + 1);
    }

    #[test]
    fn reset_clears_lines_and_stats() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        cache.read(&mut memory, 0, 4);
        cache.write(&mut memory, 4, 9, 1);
        cache.reset();
        assert_eq!(cache.stats(), CacheStats::default());
        let _ = cache.read(&mut memory, 0, 4);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn straddling_accesses_split_at_block_boundaries() {
        let mut memory = SparseMemory::new();
        memory.write_word(14, 0xA1B2_C3D4);
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        // Bytes 14..18 span the blocks at 0 and 16: one access per block.
        assert_eq!(cache.read(&mut memory, 14, 4), 0xA1B2_C3D4);
        assert_eq!(cache.stats().accesses, 2);
        assert_eq!(cache.stats().misses, 2);

        // Bytes 30..34 span the blocks at 16 (already resident) and 32.
        cache.write(&mut memory, 30, 0x1122_3344, 4);
        assert_eq!(cache.stats().accesses, 4);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 3);

        assert_eq!(cache.read(&mut memory, 30, 4), 0x1122_3344);
        assert_eq!(cache.stats().accesses, 6);
        assert_eq!(cache.stats().hits, 3);
    }

    #[test]
    fn dirty_write_back_data_survives_through_cache_reads() {
        let mut memory = SparseMemory::new();
        let mut cache = DataCache::new(config(
            64,
            16,
            2,
            ReplacementPolicy::LRU,
            WritePolicy::WriteBack,
        ));

        cache.write(&mut memory, 0, 0x1122_3344_5566_7788, 8);
        assert_eq!(cache.read(&mut memory, 0, 8), 0x1122_3344_5566_7788);
        assert_eq!(cache.read(&mut memory, 4, 4), 0x1122_3344);
    }
}
