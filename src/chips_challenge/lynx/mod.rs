pub(crate) mod collision;
pub(crate) mod decision;
pub(crate) mod movement;

use crate::chips_challenge::prelude::*;

// Actor state flags. The low nibble stores the current forced move.
pub(crate) const CS_FDIRMASK: u16 = 0x000F;
pub(crate) const CS_SLIDETOKEN: u16 = 0x0010;
pub(crate) const CS_REVERSE: u16 = 0x0020;
pub(crate) const CS_PUSHED: u16 = 0x0040;
pub(crate) const CS_TELEPORTED: u16 = 0x0080;

// Collision-check flags.
pub(crate) const CMM_RELEASING: u32 = 0x0001;
pub(crate) const CMM_CLEARANIMATIONS: u32 = 0x0002;
pub(crate) const CMM_STARTMOVEMENT: u32 = 0x0004;
pub(crate) const CMM_PUSHBLOCKS: u32 = 0x0008;
pub(crate) const CMM_PUSHBLOCKSNOW: u32 = 0x0010;

// Tile state flags, kept on the cell's top tile.
pub(crate) const FS_CLAIMED: u8 = 0x40; // a non-Chip actor owns this cell
pub(crate) const FS_ANIMATED: u8 = 0x20; // an animation is playing here
pub(crate) const FS_HAD_TRAP: u8 = 0x01; // a trap was here at least once
pub(crate) const FS_HAD_TELEPORT: u8 = 0x02; // a teleport was here at least once

pub(crate) const PEDANTIC_MAX_CREATURES: usize = 128;

/// How far the endgame runs after completion or death before the result
/// is final.
pub(crate) const ENDGAME_TICKS: u8 = 13;

/// Find-actor filters.
pub(crate) const FA_NO_CHIP: u8 = 0x01;
pub(crate) const FA_ANIMS: u8 = 0x02;

/// The outcome of one actor's movement processing within a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MoveResult {
    Died,
    Failed,
    Success,
}

/// Working state for the Lynx ruleset.
#[derive(Clone, Debug)]
pub struct LxState {
    pub pedantic_mode: bool,
    pub chip_colliding_actor: ActorIndex,
    pub last_actor: i16,
    pub chip_predicted_pos: Position,
    pub to_place_wall_pos: Position,
    pub prng1: u8,
    pub prng2: u8,
    pub endgame_timer: u8,
    pub toggle_walls_xor: u8,
    pub chip_stuck: bool,
    pub chip_pushing: bool,
    pub chip_bonked: bool,
    pub map_breached: bool,
}

impl Default for LxState {
    fn default() -> Self {
        LxState {
            pedantic_mode: false,
            chip_colliding_actor: ACTOR_NONE,
            last_actor: -1,
            chip_predicted_pos: POSITION_NULL,
            to_place_wall_pos: POSITION_NULL,
            prng1: 0,
            prng2: 0,
            endgame_timer: 0,
            toggle_walls_xor: 0,
            chip_stuck: false,
            chip_pushing: false,
            chip_bonked: false,
            map_breached: false,
        }
    }
}

pub(crate) fn set_forced_move(actor: &mut Actor, dir: Direction) {
    actor.state &= !CS_FDIRMASK;
    actor.state |= dir.bits() as u16;
}

pub(crate) fn forced_move(actor: &Actor) -> Direction {
    Direction::from_bits((actor.state & CS_FDIRMASK) as u8)
}

impl Level {
    pub(crate) fn lx_add_claim(&mut self, pos: Position) {
        self.map[pos].top.add_state(FS_CLAIMED);
    }

    pub(crate) fn lx_remove_claim(&mut self, pos: Position) {
        self.map[pos].top.remove_state(FS_CLAIMED);
    }

    pub(crate) fn lx_has_claim(&self, pos: Position) -> bool {
        self.map[pos].top.has_state(FS_CLAIMED)
    }

    pub(crate) fn lx_add_animation(&mut self, pos: Position) {
        self.map[pos].top.add_state(FS_ANIMATED);
    }

    pub(crate) fn lx_remove_animation(&mut self, pos: Position) {
        self.map[pos].top.remove_state(FS_ANIMATED);
    }

    pub(crate) fn lx_has_animation(&self, pos: Position) -> bool {
        self.map[pos].top.has_state(FS_ANIMATED)
    }

    pub(crate) fn lx_ever_had_trap(&self, pos: Position) -> bool {
        self.map[pos].top.has_state(FS_HAD_TRAP)
    }

    pub(crate) fn lx_ever_had_teleport(&self, pos: Position) -> bool {
        self.map[pos].top.has_state(FS_HAD_TELEPORT)
    }

    /// One past the highest live actor slot.
    pub(crate) fn lx_live(&self) -> usize {
        (self.lx().last_actor + 1).max(0) as usize
    }

    pub(crate) fn lx_in_endgame(&self) -> bool {
        self.lx().endgame_timer > 0
    }

    pub(crate) fn lx_start_endgame(&mut self) {
        self.lx_mut().endgame_timer = ENDGAME_TICKS;
        self.timer_offset = 1;
    }

    /// The byte-wide shift-register generator unique to Lynx walkers.
    pub(crate) fn lx_byte_rng(&mut self) -> u8 {
        let state = self.lx_mut();
        let mut n = (state.prng1 >> 2).wrapping_sub(state.prng1);
        if state.prng1 & 0x02 == 0 {
            n = n.wrapping_sub(1);
        }
        state.prng1 = (state.prng1 >> 1) | (state.prng2 & 0x80);
        state.prng2 = (state.prng2 << 1) | (n & 0x01);
        state.prng1 ^ state.prng2
    }

    pub(crate) fn lx_stop_terrain_sfx(&mut self) {
        self.stop_sfx(Sfx::SkatingForward);
        self.stop_sfx(Sfx::SkatingTurn);
        self.stop_sfx(Sfx::FireWalking);
        self.stop_sfx(Sfx::WaterWalking);
        self.stop_sfx(Sfx::IceWalking);
        self.stop_sfx(Sfx::SlideWalking);
        self.stop_sfx(Sfx::Sliding);
    }

    /// The visible actor at `pos` matching the given filter.
    pub(crate) fn lx_find_actor(&self, pos: Position, flags: u8) -> Option<usize> {
        let first = if flags & FA_NO_CHIP != 0 { 1 } else { 0 };
        for n in first..self.lx_live() {
            let actor = &self.actors[n];
            if actor.id == TileId::NOTHING {
                break;
            }
            if actor.pos == pos
                && !actor.hidden
                && (flags & FA_ANIMS != 0) == actor.id.is_animation()
            {
                return Some(n);
            }
        }
        None
    }

    /// Finds a slot for a freshly cloned actor, reusing a hidden one when
    /// possible. Respects the pedantic-mode creature cap.
    pub(crate) fn lx_create_actor(&mut self) -> Option<usize> {
        for n in 1..self.lx_live() {
            if self.actors[n].hidden {
                return Some(n);
            }
        }
        let cap = if self.lx().pedantic_mode {
            PEDANTIC_MAX_CREATURES
        } else {
            MAX_CREATURES
        };
        let next = self.lx_live();
        if next >= cap {
            log::warn!("{}: creature limit reached, no clone made", self.current_tick);
            return None;
        }
        if next >= self.actors.len() {
            self.actors.push(Actor::default());
        }
        self.lx_mut().last_actor = next as i16;
        Some(next)
    }

    /// Replaces a dying actor with its death animation in place.
    pub(crate) fn lx_remove_actor(&mut self, idx: usize, animation: TileId) {
        if self.actors[idx].id != TileId::CHIP {
            let pos = self.actors[idx].pos;
            self.lx_remove_claim(pos);
        }
        if self.actors[idx].state & CS_PUSHED != 0 {
            self.stop_sfx(Sfx::BlockMoving);
        }
        self.actors[idx].id = animation;
        let frame: i8 = if (self.current_tick + self.init_step_parity) & 1 != 0 {
            12
        } else {
            11
        };
        self.actors[idx].animation_frame = frame - 1;
        self.actors[idx].hidden = false;
        self.actors[idx].state = 0;
        self.actors[idx].move_decision = Direction::NIL;
        // An actor that only just stepped off a cell animates where it
        // came from.
        if self.actors[idx].move_cooldown == 8 {
            self.actors[idx].pos = neighbor(
                self.actors[idx].pos,
                self.actors[idx].direction.back(),
            );
            self.actors[idx].move_cooldown = 0;
        }
        let pos = self.actors[idx].pos;
        self.lx_add_animation(pos);
    }

    /// Kills the player for the given reason and arms the endgame timer.
    pub(crate) fn lx_remove_chip(&mut self, reason: ChipStatus, also: Option<usize>) {
        match reason {
            ChipStatus::Drowned => {
                self.add_sfx(Sfx::WaterSplash);
                self.lx_remove_actor(0, TileId::WATER_SPLASH);
            }
            ChipStatus::Bombed => {
                self.add_sfx(Sfx::BombExplodes);
                self.lx_remove_actor(0, TileId::BOMB_EXPLOSION);
            }
            ChipStatus::OutOfTime => {
                self.lx_remove_actor(0, TileId::ENTITY_EXPLOSION);
            }
            ChipStatus::Burned => {
                self.add_sfx(Sfx::ChipLoses);
                self.lx_remove_actor(0, TileId::ENTITY_EXPLOSION);
            }
            ChipStatus::Collided => {
                self.add_sfx(Sfx::ChipLoses);
                self.lx_remove_actor(0, TileId::ENTITY_EXPLOSION);
                if let Some(other) = also {
                    if other != 0 {
                        self.lx_remove_actor(other, TileId::ENTITY_EXPLOSION);
                    }
                }
            }
            _ => {}
        }
        self.lx_stop_terrain_sfx();
        self.lx_start_endgame();
    }

    pub(crate) fn lx_erase_animation(&mut self, idx: usize) {
        self.actors[idx].hidden = true;
        let pos = self.actors[idx].pos;
        self.lx_remove_animation(pos);
        if idx as i16 == self.lx().last_actor {
            self.actors[idx].id = TileId::NOTHING;
            self.lx_mut().last_actor -= 1;
        }
    }

    pub(crate) fn lx_init_level(&mut self) {
        self.actors = Vec::with_capacity(MAX_CREATURES);
        let pedantic = self.lx().pedantic_mode;
        let mut chip_idx: Option<usize> = None;

        if pedantic && self.status_flags & SF_BAD_TILES != 0 {
            self.status_flags |= SF_INVALID;
        }

        for pos in 0..MAP_CELLS as Position {
            // Dormant MS-style blocks become north-facing block actors.
            if self.map[pos].top.id == TileId::BLOCK_STATIC {
                self.map[pos].top.id = TileId::BLOCK.with_dir(Direction::NORTH);
            }
            if self.map[pos].bottom.id == TileId::BLOCK_STATIC {
                self.map[pos].bottom.id = TileId::BLOCK.with_dir(Direction::NORTH);
            }
            if self.map[pos].top.id.is_ms_special() {
                self.map[pos].top.id = TileId::WALL;
                if pedantic {
                    self.status_flags |= SF_INVALID;
                }
            }
            if self.map[pos].bottom.id.is_ms_special() {
                self.map[pos].bottom.id = TileId::WALL;
                if pedantic {
                    self.status_flags |= SF_INVALID;
                }
            }
            if self.map[pos].bottom.id != TileId::EMPTY
                && (!self.map[pos].bottom.id.is_terrain()
                    || self.map[pos].top.id.is_terrain())
            {
                self.status_flags |= SF_INVALID;
            }

            if self.map[pos].top.id.is_actor() {
                let tile = self.map[pos].top.id;
                let idx = self.actors.len();
                let mut actor = Actor {
                    pos,
                    id: tile.get_id(),
                    direction: tile.get_dir(),
                    ..Actor::default()
                };
                if pedantic
                    && actor.id == TileId::BLOCK
                    && self.map[pos].bottom.id.is_ice()
                {
                    actor.direction = Direction::NIL;
                }
                if actor.id == TileId::CHIP {
                    if chip_idx.is_some() {
                        self.status_flags |= SF_INVALID;
                    }
                    chip_idx = Some(idx);
                    actor.direction = Direction::SOUTH;
                } else {
                    self.map[pos].top.add_state(FS_CLAIMED);
                }
                self.actors.push(actor);
                self.map[pos].top.id = self.map[pos].bottom.id;
                self.map[pos].bottom.id = TileId::EMPTY;
            }

            if pedantic
                && matches!(
                    self.map[pos].top.id,
                    TileId::WALL_NORTH | TileId::WALL_WEST
                )
            {
                self.status_flags |= SF_INVALID;
            }
            if self.map[pos].top.id == TileId::BEARTRAP {
                self.map[pos].top.add_state(FS_HAD_TRAP);
            }
            if self.map[pos].top.id == TileId::TELEPORT {
                self.map[pos].top.add_state(FS_HAD_TELEPORT);
            }
        }

        if chip_idx.is_none() {
            self.status_flags |= SF_INVALID;
            chip_idx = Some(self.actors.len());
            self.actors.push(Actor {
                pos: 0,
                hidden: true,
                ..Actor::default()
            });
        }

        // Chip is always the first actor.
        if let Some(chip) = chip_idx {
            self.actors.swap(0, chip);
        }

        self.player_keys = [0; 4];
        self.player_boots = [0; 4];

        let last_actor = self.actors.len() as i16 - 1;
        let chip_pos = self.actors[0].pos;
        let chip_stuck = pedantic
            && chip_pos != POSITION_NULL
            && self.map[chip_pos].top.id.is_ice();
        *self.lx_mut() = LxState {
            pedantic_mode: pedantic,
            last_actor,
            chip_stuck,
            ..LxState::default()
        };
    }

    /// Advances the Lynx game state by one tick.
    pub(crate) fn lx_tick_level(&mut self) {
        if self.actors[0].id == TileId::PUSHING_CHIP {
            self.actors[0].id = TileId::CHIP;
        }

        if !self.lx_in_endgame() {
            if self.level_complete {
                self.lx_start_endgame();
            } else if self.time_limit != 0 && self.current_tick >= self.time_limit {
                self.add_sfx(Sfx::TimeOut);
                self.lx_remove_chip(ChipStatus::OutOfTime, None);
            }
        }

        for n in 0..self.lx_live() {
            if self.actors[n].hidden || self.actors[n].state & CS_REVERSE == 0 {
                continue;
            }
            self.actors[n].state &= !CS_REVERSE;
            if !self.actors[n].is_moving() {
                self.actors[n].direction = self.actors[n].direction.back();
            }
        }

        for n in 0..self.lx_live() {
            if self.actors[n].state & CS_PUSHED == 0 {
                continue;
            }
            if self.actors[n].hidden || !self.actors[n].is_moving() {
                self.stop_sfx(Sfx::BlockMoving);
                self.actors[n].state &= !CS_PUSHED;
            }
        }

        if self.lx().toggle_walls_xor != 0 {
            let xor = self.lx().toggle_walls_xor;
            for pos in 0..MAP_CELLS {
                let tile = &mut self.map.cells[pos].top;
                if matches!(
                    tile.id,
                    TileId::SWITCHWALL_OPEN | TileId::SWITCHWALL_CLOSED
                ) {
                    tile.id = TileId::from_byte(tile.id.byte() ^ xor);
                }
            }
            self.lx_mut().toggle_walls_xor = 0;
        }

        self.lx_mut().chip_predicted_pos = POSITION_NULL;
        self.lx_mut().chip_colliding_actor = ACTOR_NONE;

        // Decision phase: all actors decide where they want to go.
        for n in (0..self.lx_live()).rev() {
            if n != 0 && self.actors[n].hidden {
                continue;
            }
            if self.actors[n].is_moving() {
                continue;
            }
            self.lx_do_decision(n);
        }

        // Movement phase: all actors act on their decisions.
        for n in (0..self.lx_live()).rev() {
            if n == 0 && self.level_complete {
                continue;
            }
            if n != 0 && self.actors[n].hidden {
                continue;
            }
            let result = self.lx_advance_movement(n, false);
            if result == MoveResult::Died {
                continue;
            }
            self.actors[n].move_decision = Direction::NIL;
            set_forced_move(&mut self.actors[n], Direction::NIL);
            let pos = self.actors[n].pos;
            let terrain = self.map[pos].top.id;
            // The last actor to rest on a recessed wall decides where the
            // wall eventually pops.
            if n != 0 && self.lx().pedantic_mode && terrain == TileId::POPUP_WALL {
                self.lx_mut().to_place_wall_pos = pos;
            }
            if terrain == TileId::BUTTON_BROWN && !self.actors[n].is_moving() {
                let linked = self.lx_find_trap_from_button(pos);
                if linked != POSITION_NULL {
                    self.lx_activate_trap(linked);
                }
            }
        }

        // Teleport phase, in reverse reading order.
        for n in (0..self.lx_live()).rev() {
            if self.actors[n].hidden || self.actors[n].is_moving() {
                continue;
            }
            if self.map[self.actors[n].pos].top.id != TileId::TELEPORT {
                continue;
            }
            self.lx_teleport(n);
        }

        if self.lx_in_endgame() {
            self.lx_mut().endgame_timer -= 1;
            if self.lx().endgame_timer == 0 {
                self.lx_stop_terrain_sfx();
                self.stop_sfx(Sfx::BlockMoving);
                self.win_state = if self.level_complete {
                    WinState::Won
                } else {
                    WinState::Died
                };
            }
        }

        if self.lx().chip_pushing && self.actors[0].id == TileId::CHIP {
            self.actors[0].id = TileId::PUSHING_CHIP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips_challenge::level::init::testutil::*;
    use crate::chips_challenge::prelude::*;

    fn lx_level(placements: &[(usize, usize, u8)], time: u16, chips: u16) -> Level {
        sparse_metadata(placements, time, chips)
            .make_level(LevelSetup::new(RulesetId::Lynx).with_seed(1))
            .unwrap()
    }

    fn hold(level: &mut Level, dir: Direction, ticks: u32) {
        for _ in 0..ticks {
            level.set_input(GameInput::from_direction(dir));
            level.tick();
        }
    }

    fn coast(level: &mut Level, ticks: u32) {
        for _ in 0..ticks {
            level.set_input(GameInput::NIL);
            level.tick();
        }
    }

    #[test]
    fn chip_walks_east_to_the_exit() {
        let mut level = lx_level(&[(5, 5, B_CHIP_S), (7, 5, B_EXIT)], 0, 0);
        hold(&mut level, Direction::EAST, 12);
        assert!(level.is_complete());
        // The endgame runs a little longer before the result is final.
        assert_eq!(level.win_state(), WinState::Playing);
        coast(&mut level, ENDGAME_TICKS as u32 + 2);
        assert_eq!(level.win_state(), WinState::Won);
    }

    #[test]
    fn chip_bonks_on_a_wall() {
        let mut level = lx_level(&[(5, 5, B_CHIP_S), (6, 5, B_WALL)], 0, 0);
        hold(&mut level, Direction::EAST, 8);
        assert_eq!(level.chip().pos, at(5, 5));
        assert_eq!(level.win_state(), WinState::Playing);
    }

    #[test]
    fn a_move_takes_four_ticks() {
        let mut level = lx_level(&[(5, 5, B_CHIP_S)], 0, 0);
        hold(&mut level, Direction::EAST, 1);
        assert_eq!(level.chip().pos, at(6, 5));
        assert!(level.chip().is_moving());
        coast(&mut level, 3);
        assert!(!level.chip().is_moving());
    }

    #[test]
    fn pushed_block_fills_water() {
        let mut level = lx_level(
            &[(5, 5, B_CHIP_S), (6, 5, B_BLOCK), (7, 5, B_WATER)],
            0,
            0,
        );
        hold(&mut level, Direction::EAST, 8);
        assert_eq!(level.top_tile(at(7, 5)), TileId::DIRT);
        // The splash animation still blocks the freshly dried cell.
        assert_eq!(level.chip().pos, at(6, 5));
        assert_eq!(level.win_state(), WinState::Playing);
    }

    #[test]
    fn walking_into_water_drowns() {
        let mut level = lx_level(&[(5, 5, B_CHIP_S), (6, 5, B_WATER)], 0, 0);
        hold(&mut level, Direction::EAST, 6);
        coast(&mut level, ENDGAME_TICKS as u32 + 2);
        assert_eq!(level.win_state(), WinState::Died);
        assert!(level.chip().id.is_animation() || level.chip().hidden);
    }

    #[test]
    fn running_out_of_time_kills() {
        let mut level = lx_level(&[(5, 5, B_CHIP_S)], 1, 0);
        coast(&mut level, 40);
        assert_eq!(level.win_state(), WinState::Died);
    }

    #[test]
    fn ice_carries_chip_across() {
        let mut level = lx_level(
            &[(5, 5, B_CHIP_S), (6, 5, B_ICE), (7, 5, B_ICE)],
            0,
            0,
        );
        hold(&mut level, Direction::EAST, 4);
        coast(&mut level, 20);
        assert_eq!(level.chip().pos, at(8, 5));
    }

    #[test]
    fn monsters_claim_the_cells_they_enter() {
        let mut level = lx_level(
            &[(5, 5, B_CHIP_S), (10, 10, B_GLIDER_N)],
            0,
            0,
        );
        coast(&mut level, 4);
        let glider = level
            .actors()
            .iter()
            .find(|a| a.id == TileId::GLIDER)
            .unwrap();
        assert_eq!(glider.pos, at(10, 9));
        assert!(level.lx_has_claim(at(10, 9)));
        assert!(!level.lx_has_claim(at(10, 10)));
    }

    #[test]
    fn green_button_toggles_walls_a_tick_later() {
        // 0x23 is the green button, 0x25 the closed toggle wall.
        let mut level = lx_level(
            &[(5, 5, B_CHIP_S), (6, 5, 0x23), (9, 9, 0x25)],
            0,
            0,
        );
        assert_eq!(level.top_tile(at(9, 9)), TileId::SWITCHWALL_CLOSED);
        hold(&mut level, Direction::EAST, 4);
        assert_eq!(level.chip().pos, at(6, 5));
        // The flip is pending until the next tick flushes it.
        coast(&mut level, 1);
        assert_eq!(level.top_tile(at(9, 9)), TileId::SWITCHWALL_OPEN);
    }

    #[test]
    fn teleport_carries_chip_to_its_twin() {
        let mut level = lx_level(
            &[(10, 5, B_CHIP_S), (11, 5, B_TELEPORT), (3, 3, B_TELEPORT)],
            0,
            0,
        );
        hold(&mut level, Direction::EAST, 4);
        coast(&mut level, 8);
        // Emerges from the twin teleport still heading east.
        assert_eq!(pos_y(level.chip().pos), 3);
        assert!(pos_x(level.chip().pos) >= 4);
    }
}
