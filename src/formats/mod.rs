pub mod ccl;
pub mod tws;

use crate::chips_challenge::prelude::*;

pub use ccl::parse_ccl;
pub use tws::parse_tws;

/// Everything the engine needs to instantiate one level, as parsed from a
/// CCL archive. Immutable once built; any number of live levels can be
/// spun up from the same metadata.
#[derive(Clone, Debug, Default)]
pub struct LevelMetadata {
    pub title: Option<String>,
    pub level_number: u16,
    /// Seconds; zero means untimed.
    pub time_limit: u16,
    pub chips_required: u16,
    pub trap_links: Option<ConnList>,
    pub cloner_links: Option<ConnList>,
    pub monster_list: Vec<Position>,
    pub password: String,
    pub hint: Option<String>,
    pub author: Option<String>,
    /// RLE-compressed tile layers, decoded at level build time.
    pub layer_top: Vec<u8>,
    pub layer_bottom: Vec<u8>,
}

/// A parsed CCL archive.
#[derive(Clone, Debug, Default)]
pub struct LevelSet {
    pub levels: Vec<LevelMetadata>,
}

impl LevelSet {
    pub fn level(&self, idx: usize) -> Option<&LevelMetadata> {
        self.levels.get(idx)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// One recorded solution out of a TWS archive.
#[derive(Clone, Debug, Default)]
pub struct SolutionMetadata {
    pub level_num: u16,
    pub password: [u8; 4],
    pub other_flags: u8,
    /// Three-bit index into the direction table, for the initial random
    /// slide floor direction.
    pub slide_dir_index: u8,
    pub step_value: u8,
    pub prng_seed: u32,
    pub num_ticks: u32,
    /// Per-tick inputs; empty for "attempted, no solution" records.
    pub inputs: Vec<GameInput>,
}

/// The 3-bit direction code used by the input stream and the slide field.
pub(crate) const INPUT_DIRECTIONS: [u8; 8] = [
    Direction::NORTH.bits(),
    Direction::WEST.bits(),
    Direction::SOUTH.bits(),
    Direction::EAST.bits(),
    Direction::NORTH.bits() | Direction::WEST.bits(),
    Direction::SOUTH.bits() | Direction::WEST.bits(),
    Direction::NORTH.bits() | Direction::EAST.bits(),
    Direction::SOUTH.bits() | Direction::EAST.bits(),
];

impl SolutionMetadata {
    /// The input recorded for a given tick; silence past the end.
    pub fn input(&self, tick: u32) -> GameInput {
        self.inputs
            .get(tick as usize)
            .copied()
            .unwrap_or(GameInput::NIL)
    }

    /// The initial direction of random slide floors for this playback.
    pub fn initial_slide_dir(&self) -> Direction {
        Direction::from_bits(INPUT_DIRECTIONS[(self.slide_dir_index & 7) as usize])
    }
}

/// A parsed TWS archive, sorted by level number.
#[derive(Clone, Debug)]
pub struct SolutionSet {
    pub ruleset: RulesetId,
    pub set_name: Option<String>,
    pub recent_level: u16,
    pub solutions: Vec<SolutionMetadata>,
}

impl SolutionSet {
    pub fn solution_for_level(&self, level_num: u16) -> Option<&SolutionMetadata> {
        self.solutions.iter().find(|s| s.level_num == level_num)
    }
}

/// A bounds-checked little-endian reader over an archive.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
    what: &'static str,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], what: &'static str) -> Reader<'a> {
        Reader { data, offset: 0, what }
    }

    fn short(&self) -> Error {
        anyhow!("{} file ends too soon", self.what)
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn require(&self, n: usize) -> Result<()> {
        if self.offset + n > self.data.len() {
            Err(self.short())
        } else {
            Ok(())
        }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32_le(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Reads a NUL-terminated string out of at most `max` bytes.
pub(crate) fn read_c_string(bytes: &[u8], max: usize) -> String {
    let bytes = &bytes[..bytes.len().min(max)];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
