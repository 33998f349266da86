use crate::utils::prelude::*;

pub const MAP_WIDTH: usize = 32;
pub const MAP_HEIGHT: usize = 32;
pub const MAP_CELLS: usize = MAP_WIDTH * MAP_HEIGHT;
pub const MAX_CREATURES: usize = 2 * MAP_CELLS;

/// Ticks per in-game second.
pub const TICKS_PER_SECOND: u32 = 20;

/// The rule variant a level is played under.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RulesetId {
    Lynx = 1,
    Ms = 2,
}

impl RulesetId {
    /// Parses a ruleset from its archive byte.
    pub fn from_byte(value: u8) -> Result<RulesetId> {
        match value {
            1 => Ok(RulesetId::Lynx),
            2 => Ok(RulesetId::Ms),
            _ => Err(anyhow!("invalid ruleset byte {value}")),
        }
    }
}

impl std::str::FromStr for RulesetId {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lynx" | "Lynx" => Ok(RulesetId::Lynx),
            "ms" | "MS" | "Ms" => Ok(RulesetId::Ms),
            _ => Err(anyhow!("unrecognized ruleset {s}")),
        }
    }
}

/// The overall outcome of a level in play.
#[repr(i8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WinState {
    Died = -1,
    #[default]
    Playing = 0,
    Won = 1,
}

/// What, if anything, has happened to the player.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChipStatus {
    #[default]
    Okay = 0,
    Drowned,
    Burned,
    Bombed,
    OutOfTime,
    Collided,
    Squished,
    SquishedDeath,
    NotOkay,
}

/// Sound effects raised by the engine. The first eighteen are one-shot and
/// cleared at the start of every tick; the rest loop until stopped.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sfx {
    ChipLoses = 0,
    ChipWins = 1,
    TimeOut = 2,
    TimeLow = 3,
    Derezz = 4,
    CantMove = 5,
    IcCollected = 6,
    ItemCollected = 7,
    BootsStolen = 8,
    Teleporting = 9,
    DoorOpened = 10,
    SocketOpened = 11,
    ButtonPushed = 12,
    TileEmptied = 13,
    WallCreated = 14,
    TrapEntered = 15,
    BombExplodes = 16,
    WaterSplash = 17,

    BlockMoving = 18,
    SkatingForward = 19,
    SkatingTurn = 20,
    Sliding = 21,
    SlideWalking = 22,
    IceWalking = 23,
    WaterWalking = 24,
    FireWalking = 25,
}

pub const SFX_ONESHOT_COUNT: u32 = 18;
pub const SFX_ONESHOT_MASK: u32 = (1 << SFX_ONESHOT_COUNT) - 1;

// Level status flags.
pub const SF_INVALID: u16 = 0x2;
pub const SF_BAD_TILES: u16 = 0x4;
pub const SF_SHOW_HINT: u16 = 0x8;
pub const SF_NO_ANIMATION: u16 = 0x10;
pub const SF_SHUTTERED: u16 = 0x20;
