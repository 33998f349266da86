use crate::chips_challenge::lynx::LxState;
use crate::chips_challenge::ms::MsState;
use crate::chips_challenge::prelude::*;
use crate::formats::ccl::rle_decode;
use crate::formats::LevelMetadata;

/// Per-game knobs applied when a level is instantiated. Replays carry a
/// recorded seed, step parity and initial random-slide direction; fresh
/// games leave the defaults.
#[derive(Clone, Copy, Debug)]
pub struct LevelSetup {
    pub ruleset: RulesetId,
    pub pedantic_mode: bool,
    pub prng_seed: Option<u64>,
    pub step_parity: u8,
    pub initial_rff_dir: Direction,
}

impl LevelSetup {
    pub fn new(ruleset: RulesetId) -> LevelSetup {
        LevelSetup {
            ruleset,
            pedantic_mode: false,
            prng_seed: None,
            step_parity: 0,
            initial_rff_dir: Direction::NORTH,
        }
    }

    pub fn pedantic(mut self) -> LevelSetup {
        self.pedantic_mode = true;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> LevelSetup {
        self.prng_seed = Some(seed);
        self
    }
}

// The CCL byte-to-tile table. Direction variants pack the facing index
// into the low two bits of the actor tile.
const fn n(id: TileId) -> TileId {
    id
}
const fn w(id: TileId) -> TileId {
    TileId::from_byte(id.byte() | 1)
}
const fn s(id: TileId) -> TileId {
    TileId::from_byte(id.byte() | 2)
}
const fn e(id: TileId) -> TileId {
    TileId::from_byte(id.byte() | 3)
}

#[rustfmt::skip]
const DAT_TILE_MAP: [TileId; 0x70] = [
    // 0x00
    TileId::EMPTY, TileId::WALL, TileId::IC_CHIP, TileId::WATER,
    TileId::FIRE, TileId::HIDDENWALL_PERM, TileId::WALL_NORTH, TileId::WALL_WEST,
    TileId::WALL_SOUTH, TileId::WALL_EAST, TileId::BLOCK_STATIC, TileId::DIRT,
    TileId::ICE, TileId::SLIDE_SOUTH,
    n(TileId::BLOCK), w(TileId::BLOCK),
    // 0x10
    s(TileId::BLOCK), e(TileId::BLOCK), TileId::SLIDE_NORTH, TileId::SLIDE_EAST,
    TileId::SLIDE_WEST, TileId::EXIT, TileId::DOOR_BLUE, TileId::DOOR_RED,
    TileId::DOOR_GREEN, TileId::DOOR_YELLOW, TileId::ICEWALL_NORTHWEST, TileId::ICEWALL_NORTHEAST,
    TileId::ICEWALL_SOUTHEAST, TileId::ICEWALL_SOUTHWEST, TileId::BLUEWALL_FAKE, TileId::BLUEWALL_REAL,
    // 0x20
    TileId::EMPTY, TileId::BURGLAR, TileId::SOCKET, TileId::BUTTON_GREEN,
    TileId::BUTTON_RED, TileId::SWITCHWALL_CLOSED, TileId::SWITCHWALL_OPEN, TileId::BUTTON_BROWN,
    TileId::BUTTON_BLUE, TileId::TELEPORT, TileId::BOMB, TileId::BEARTRAP,
    TileId::HIDDENWALL_TEMP, TileId::GRAVEL, TileId::POPUP_WALL, TileId::HINT_BUTTON,
    // 0x30
    TileId::WALL_SOUTHEAST, TileId::CLONE_MACHINE, TileId::SLIDE_RANDOM, TileId::DROWNED_CHIP,
    TileId::BURNED_CHIP, TileId::BOMBED_CHIP, TileId::EMPTY, TileId::EMPTY,
    TileId::EMPTY, TileId::EXITED_CHIP, TileId::EXIT_EXTRA_1, TileId::EXIT_EXTRA_2,
    n(TileId::SWIMMING_CHIP), w(TileId::SWIMMING_CHIP), s(TileId::SWIMMING_CHIP), e(TileId::SWIMMING_CHIP),
    // 0x40
    n(TileId::BUG), w(TileId::BUG), s(TileId::BUG), e(TileId::BUG),
    n(TileId::FIREBALL), w(TileId::FIREBALL), s(TileId::FIREBALL), e(TileId::FIREBALL),
    n(TileId::BALL), w(TileId::BALL), s(TileId::BALL), e(TileId::BALL),
    n(TileId::TANK), w(TileId::TANK), s(TileId::TANK), e(TileId::TANK),
    // 0x50
    n(TileId::GLIDER), w(TileId::GLIDER), s(TileId::GLIDER), e(TileId::GLIDER),
    n(TileId::TEETH), w(TileId::TEETH), s(TileId::TEETH), e(TileId::TEETH),
    n(TileId::WALKER), w(TileId::WALKER), s(TileId::WALKER), e(TileId::WALKER),
    n(TileId::BLOB), w(TileId::BLOB), s(TileId::BLOB), e(TileId::BLOB),
    // 0x60
    n(TileId::PARAMECIUM), w(TileId::PARAMECIUM), s(TileId::PARAMECIUM), e(TileId::PARAMECIUM),
    TileId::KEY_BLUE, TileId::KEY_RED, TileId::KEY_GREEN, TileId::KEY_YELLOW,
    TileId::BOOTS_WATER, TileId::BOOTS_FIRE, TileId::BOOTS_ICE, TileId::BOOTS_SLIDE,
    n(TileId::CHIP), w(TileId::CHIP), s(TileId::CHIP), e(TileId::CHIP),
];

/// Decompresses one map layer and maps its bytes onto tiles.
fn decode_layer(encoded: &[u8], which: &str) -> Result<Vec<TileId>> {
    let raw = rle_decode(encoded)
        .with_context(|| format!("decompressing the {which} layer"))?;
    if raw.len() != MAP_CELLS {
        return Err(anyhow!(
            "{which} layer decompressed to {} bytes, expected {MAP_CELLS}",
            raw.len()
        ));
    }
    raw.iter()
        .map(|&byte| {
            if (byte as usize) < DAT_TILE_MAP.len() {
                Ok(DAT_TILE_MAP[byte as usize])
            } else {
                Err(anyhow!("unknown tile byte {byte:#04X} in the {which} layer"))
            }
        })
        .collect()
}

impl LevelMetadata {
    /// Builds a live level for the given ruleset. Parse-level problems
    /// (short layers, unknown tile bytes) are errors; questionable but
    /// playable layouts only raise `status_flags` bits.
    pub fn make_level(&self, setup: LevelSetup) -> Result<Level> {
        let top = decode_layer(&self.layer_top, "top")?;
        let bottom = decode_layer(&self.layer_bottom, "bottom")?;

        let mut map = Map::default();
        let mut status_flags = 0u16;
        for pos in 0..MAP_CELLS {
            map.cells[pos].top = MapTile::new(top[pos]);
            map.cells[pos].bottom = MapTile::new(bottom[pos]);
            if bottom[pos] != TileId::EMPTY
                && (!bottom[pos].is_terrain() || top[pos].is_terrain())
            {
                status_flags |= SF_BAD_TILES;
            }
        }

        let mut trap_connections = ConnList::default();
        if let Some(links) = &self.trap_links {
            for &conn in &links.0 {
                trap_connections.push(conn);
            }
        }
        let mut cloner_connections = ConnList::default();
        if let Some(links) = &self.cloner_links {
            for &conn in &links.0 {
                cloner_connections.push(conn);
            }
        }

        let state = match setup.ruleset {
            RulesetId::Ms => {
                let mut ms = MsState::default();
                ms.init_actor_list = self
                    .monster_list
                    .iter()
                    .copied()
                    .take(CONN_LIST_MAX)
                    .collect();
                RulesetState::Ms(Box::new(ms))
            }
            RulesetId::Lynx => {
                let mut lx = LxState::default();
                lx.pedantic_mode = setup.pedantic_mode;
                RulesetState::Lynx(Box::new(lx))
            }
        };

        let mut level = Level {
            ruleset: setup.ruleset,
            timer_offset: 0,
            time_limit: self.time_limit as u32 * TICKS_PER_SECOND,
            game_input: GameInput::NIL,
            current_tick: 0,
            chips_left: self.chips_required,
            camera_pos: POSITION_NULL,
            player_keys: [0; 4],
            player_boots: [0; 4],
            status_flags,
            rff_dir: setup.initial_rff_dir,
            init_step_parity: setup.step_parity as u32,
            sfx: 0,
            prng: match setup.prng_seed {
                Some(seed) => Prng::new_seeded(seed),
                None => Prng::new_random(),
            },
            actors: Vec::new(),
            trap_connections,
            cloner_connections,
            map,
            level_complete: false,
            win_state: WinState::Playing,
            state,
        };

        match setup.ruleset {
            RulesetId::Ms => level.ms_init_level(),
            RulesetId::Lynx => level.lx_init_level(),
        }

        Ok(level)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::chips_challenge::prelude::*;
    use crate::formats::ccl::rle_encode;
    use crate::formats::LevelMetadata;

    // CCL bytes for the tiles the walkthrough tests lay down.
    pub const B_FLOOR: u8 = 0x00;
    pub const B_WALL: u8 = 0x01;
    pub const B_CHIP_S: u8 = 0x6E;
    pub const B_WATER: u8 = 0x03;
    pub const B_BLOCK: u8 = 0x0A;
    pub const B_ICE: u8 = 0x0C;
    pub const B_EXIT: u8 = 0x15;
    pub const B_SOCKET: u8 = 0x22;
    pub const B_IC_CHIP: u8 = 0x02;
    pub const B_TELEPORT: u8 = 0x29;
    pub const B_BALL_N: u8 = 0x48;
    pub const B_TANK_N: u8 = 0x4C;
    pub const B_GLIDER_N: u8 = 0x50;

    /// Builds metadata for a field described by sparse `(x, y, byte)`
    /// placements over empty floor.
    pub fn sparse_metadata(
        placements: &[(usize, usize, u8)],
        time_limit: u16,
        chips_required: u16,
    ) -> LevelMetadata {
        let mut field = [B_FLOOR; MAP_CELLS];
        for &(x, y, byte) in placements {
            field[y * MAP_WIDTH + x] = byte;
        }
        LevelMetadata {
            title: Some("fixture".into()),
            level_number: 1,
            time_limit,
            chips_required,
            layer_top: rle_encode(&field),
            layer_bottom: rle_encode(&[B_FLOOR; MAP_CELLS]),
            ..LevelMetadata::default()
        }
    }

    pub fn at(x: usize, y: usize) -> Position {
        (y * MAP_WIDTH + x) as Position
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::chips_challenge::prelude::*;

    #[test]
    fn rejects_short_layers() {
        let mut meta = sparse_metadata(&[], 0, 0);
        meta.layer_top = vec![0x00, 0x00];
        let err = meta.make_level(LevelSetup::new(RulesetId::Ms)).unwrap_err();
        assert!(err.to_string().contains("decompressing") || err.to_string().contains("expected"));
    }

    #[test]
    fn rejects_unknown_tile_bytes() {
        let meta = sparse_metadata(&[(3, 3, 0x70)], 0, 0);
        let err = meta.make_level(LevelSetup::new(RulesetId::Ms)).unwrap_err();
        assert!(err.to_string().contains("unknown tile byte"));
    }

    #[test]
    fn time_limit_converts_to_ticks() {
        let meta = sparse_metadata(&[(4, 4, B_CHIP_S)], 30, 7);
        let level = meta.make_level(LevelSetup::new(RulesetId::Ms)).unwrap();
        assert_eq!(level.time_limit(), 600);
        assert_eq!(level.chips_left(), 7);
    }

    #[test]
    fn ms_init_places_chip_from_the_map() {
        let meta = sparse_metadata(&[(9, 7, B_CHIP_S)], 0, 0);
        let level = meta.make_level(LevelSetup::new(RulesetId::Ms)).unwrap();
        assert_eq!(level.chip().pos, at(9, 7));
        assert_eq!(level.chip().id, TileId::CHIP);
    }

    #[test]
    fn lynx_init_strips_actor_tiles_and_claims_cells() {
        let meta = sparse_metadata(&[(4, 4, B_CHIP_S), (10, 4, B_GLIDER_N)], 0, 0);
        let level = meta.make_level(LevelSetup::new(RulesetId::Lynx)).unwrap();
        // Chip is first; the monster's cell is claimed and its tile gone.
        assert_eq!(level.chip().id, TileId::CHIP);
        assert_eq!(level.chip().pos, at(4, 4));
        assert_eq!(level.top_tile(at(10, 4)), TileId::EMPTY);
        assert!(level.lx_has_claim(at(10, 4)));
        assert!(!level.lx_has_claim(at(4, 4)));
        let glider = level
            .actors()
            .iter()
            .find(|a| a.id == TileId::GLIDER)
            .unwrap();
        assert_eq!(glider.pos, at(10, 4));
    }

    #[test]
    fn lynx_init_without_chip_is_flagged_invalid() {
        let meta = sparse_metadata(&[(10, 4, B_GLIDER_N)], 0, 0);
        let level = meta.make_level(LevelSetup::new(RulesetId::Lynx)).unwrap();
        assert!(level.status_flags() & SF_INVALID != 0);
        assert!(level.chip().hidden);
    }

    #[test]
    fn ms_init_breaks_covered_teleports() {
        // A teleport buried under a block never works.
        let mut meta = sparse_metadata(&[(4, 4, B_CHIP_S), (8, 8, B_BLOCK)], 0, 0);
        let mut bottom = [B_FLOOR; MAP_CELLS];
        bottom[8 * MAP_WIDTH + 8] = B_TELEPORT;
        meta.layer_bottom = crate::formats::ccl::rle_encode(&bottom);
        let level = meta.make_level(LevelSetup::new(RulesetId::Ms)).unwrap();
        assert!(level.map[at(8, 8)].bottom.has_state(crate::chips_challenge::ms::FS_BROKEN));
    }
}
