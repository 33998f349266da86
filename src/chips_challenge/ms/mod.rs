pub(crate) mod buttons;
pub(crate) mod choose;
pub(crate) mod collision;
pub(crate) mod movement;
pub(crate) mod slip;

use crate::chips_challenge::prelude::*;

// Actor state flags.
pub(crate) const CS_RELEASED: u16 = 0x0001; // can leave a beartrap
pub(crate) const CS_CLONING: u16 = 0x0002; // cannot move this tick
pub(crate) const CS_HASMOVED: u16 = 0x0004; // already used current move
pub(crate) const CS_TURNING: u16 = 0x0008; // is turning around
pub(crate) const CS_SLIP: u16 = 0x0010; // is on the slip list
pub(crate) const CS_SLIDE: u16 = 0x0020; // is on the slip list but can move
pub(crate) const CS_DEFERPUSH: u16 = 0x0040; // button pushes will be delayed
pub(crate) const CS_MUTANT: u16 = 0x0080; // block wearing Chip's face
pub(crate) const CS_SDIRMASK: u16 = 0x0F00; // stashed direction (tank turns)
pub(crate) const CS_SPONTANEOUS: u16 = 0x1000; // may spontaneously generate

pub(crate) const CS_SDIRSHIFT: u16 = 8;

// Collision-check flags.
pub(crate) const CMM_NOLEAVECHECK: u32 = 0x0001;
pub(crate) const CMM_NOEXPOSEWALLS: u32 = 0x0002;
pub(crate) const CMM_CLONECANTBLOCK: u32 = 0x0004;
pub(crate) const CMM_NOPUSHING: u32 = 0x0008;
pub(crate) const CMM_TELEPORTPUSH: u32 = 0x0010;
pub(crate) const CMM_NOFIRECHECK: u32 = 0x0020;
pub(crate) const CMM_NODEFERBUTTONS: u32 = 0x0040;

// Tile state flags.
pub(crate) const FS_BUTTONDOWN: u8 = 0x01; // button press is deferred
pub(crate) const FS_CLONING: u8 = 0x02; // clone machine is activated
pub(crate) const FS_BROKEN: u8 = 0x04; // teleport/toggle wall doesn't work
pub(crate) const FS_HASMUTANT: u8 = 0x08; // beartrap contains mutant block
pub(crate) const FS_MARKER: u8 = 0x10; // marker used during initialization

/// An actor under forced motion, and the direction it is being carried in.
#[derive(Clone, Copy, Debug)]
pub struct MsSlipper {
    pub actor: ActorIndex,
    pub direction: Direction,
}

/// Working state for the MS ruleset.
#[derive(Clone, Debug)]
pub struct MsState {
    pub slip_list: Vec<MsSlipper>,
    pub block_list: Vec<ActorIndex>,
    pub mscc_slippers: u32,
    pub chip_ticks_since_moved: u8,
    pub chip_status: ChipStatus,
    pub chip_last_slip_dir: Direction,
    pub mouse_goal: Position,
    pub controller_dir: Direction,
    pub init_actor_list: Vec<Position>,
}

impl Default for MsState {
    fn default() -> Self {
        MsState {
            slip_list: Vec::new(),
            block_list: Vec::new(),
            mscc_slippers: 0,
            chip_ticks_since_moved: 0,
            chip_status: ChipStatus::Okay,
            chip_last_slip_dir: Direction::NIL,
            mouse_goal: POSITION_NULL,
            controller_dir: Direction::NIL,
            init_actor_list: Vec::new(),
        }
    }
}

pub(crate) fn set_spare_direction(actor: &mut Actor, dir: Direction) {
    actor.state &= !CS_SDIRMASK;
    actor.state |= (dir.bits() as u16) << CS_SDIRSHIFT;
}

// The shift binds before the mask here, so reads come from the low nibble
// of the state word; tank turns depend on exactly that value.
pub(crate) fn spare_direction(actor: &Actor) -> Direction {
    Direction::from_bits((actor.state & CS_SDIRMASK >> CS_SDIRSHIFT) as u8)
}

impl Level {
    /// The terrain at a location, looking under any item or actor tile.
    pub(crate) fn ms_terrain(&self, pos: Position) -> TileId {
        let cell = &self.map[pos];
        let obscures =
            |id: TileId| id.is_key() || id.is_boots() || id.is_actor();
        if !obscures(cell.top.id) {
            return cell.top.id;
        }
        if !obscures(cell.bottom.id) {
            return cell.bottom.id;
        }
        TileId::EMPTY
    }

    pub(crate) fn ms_set_terrain(&mut self, pos: Position, tile: TileId) {
        let cell = &mut self.map[pos];
        let obscures =
            |id: TileId| id.is_key() || id.is_boots() || id.is_actor();
        if !obscures(cell.top.id) {
            cell.top.id = tile;
        } else {
            cell.bottom.id = tile;
        }
    }

    pub(crate) fn ms_create_actor(&mut self) -> Option<usize> {
        if self.actors.len() >= MAX_CREATURES {
            log::warn!(
                "{}: filled the actor array (this should not be possible)",
                self.current_tick
            );
            return None;
        }
        self.actors.push(Actor::default());
        Some(self.actors.len() - 1)
    }

    /// The visible creature at `pos`, ignoring Chip unless asked for.
    pub(crate) fn ms_look_up_creature(
        &self,
        pos: Position,
        include_chip: bool,
    ) -> Option<usize> {
        for n in 0..self.actors.len() {
            if self.actors[n].hidden {
                continue;
            }
            if self.actors[n].pos == pos
                && (self.actors[n].id != TileId::CHIP || include_chip)
            {
                return Some(n);
            }
        }
        None
    }

    /// The block at `pos`. A block that has never moved has no actor yet;
    /// one is conjured on demand and remembered on the block list.
    pub(crate) fn ms_look_up_block(&mut self, pos: Position) -> Option<usize> {
        for i in 0..self.ms().block_list.len() {
            let b = self.ms().block_list[i] as usize;
            if self.actors[b].pos == pos && !self.actors[b].hidden {
                return Some(b);
            }
        }

        let block = self.ms_create_actor()?;
        self.actors[block].id = TileId::BLOCK;
        self.actors[block].pos = pos;
        let id = self.map[pos].top.id;
        if id == TileId::BLOCK_STATIC {
            self.actors[block].direction = Direction::NIL;
        } else if id.get_id() == TileId::BLOCK {
            self.actors[block].direction = id.get_dir();
        } else {
            log::warn!(
                "{}: block lookup on a blockless location",
                self.current_tick
            );
        }
        self.ms_mut().block_list.push(block as ActorIndex);
        Some(block)
    }

    /// Rewrites the actor's map tile to match its current state.
    pub(crate) fn ms_update_floor(&mut self, idx: usize) {
        if self.actors[idx].hidden {
            return;
        }
        let pos = self.actors[idx].pos;
        if self.actors[idx].id == TileId::BLOCK {
            self.map[pos].top.id = if self.actors[idx].state & CS_MUTANT != 0 {
                TileId::CHIP.with_dir(Direction::NORTH)
            } else {
                TileId::BLOCK_STATIC
            };
            return;
        } else if self.actors[idx].id == TileId::CHIP {
            let status = self.ms().chip_status;
            match status {
                ChipStatus::Burned => {
                    self.map[pos].top.id = TileId::BURNED_CHIP;
                    return;
                }
                ChipStatus::Drowned => {
                    self.map[pos].top.id = TileId::DROWNED_CHIP;
                    return;
                }
                ChipStatus::Okay => {
                    if self.map[pos].bottom.id == TileId::WATER {
                        self.actors[idx].id = TileId::SWIMMING_CHIP;
                    }
                }
                _ => {}
            }
        }

        if self.actors[idx].state & CS_TURNING != 0 {
            self.actors[idx].direction = self.actors[idx].direction.right();
        }
        self.map[pos].top.id =
            self.actors[idx].id.with_dir(self.actors[idx].direction);
        self.map[pos].top.clear_state();
    }

    /// Stacks the actor's tile onto the map at its position.
    pub(crate) fn ms_add_to_map(&mut self, idx: usize) {
        if self.actors[idx].hidden {
            return;
        }
        let pos = self.actors[idx].pos;
        self.map[pos].push_tile(MapTile::new(TileId::EMPTY));
        self.ms_update_floor(idx);
    }

    /// Wakes the dormant creature template at `pos` into a live actor.
    pub(crate) fn ms_awaken_creature(&mut self, pos: Position) -> Option<usize> {
        let tileid = self.map[pos].top.id;
        if !tileid.is_actor() || tileid.get_id() == TileId::CHIP {
            return None;
        }
        let new = self.ms_create_actor()?;
        self.actors[new].id = tileid.get_id();
        self.actors[new].direction = tileid.get_dir();
        self.actors[new].pos = pos;
        if self.actors[new].id == TileId::BLOCK {
            self.ms_mut().block_list.push(new as ActorIndex);
        }
        Some(new)
    }

    /// Marks a creature as dead. Chip is special-cased: his demise is a
    /// status, not a disappearance.
    pub(crate) fn ms_remove_actor(&mut self, idx: usize) {
        self.actors[idx].state &= !(CS_SLIP | CS_SLIDE);
        if self.actors[idx].id == TileId::CHIP {
            if self.ms().chip_status == ChipStatus::Okay {
                self.ms_mut().chip_status = ChipStatus::NotOkay;
            }
        } else {
            self.actors[idx].hidden = true;
        }
    }

    /// Notes whether the game has ended, returning the new win state.
    pub(crate) fn ms_check_for_ending(&mut self) -> WinState {
        if self.ms().chip_status != ChipStatus::Okay
            && self.ms().chip_status != ChipStatus::Squished
        {
            if self.win_state != WinState::Died {
                self.add_sfx(Sfx::ChipLoses);
            }
            self.win_state = WinState::Died;
        } else if self.level_complete {
            if self.win_state != WinState::Won {
                self.add_sfx(Sfx::ChipWins);
            }
            self.win_state = WinState::Won;
        }
        self.win_state
    }

    pub(crate) fn ms_create_clones(&mut self) {
        for n in 0..self.actors.len() {
            if self.actors[n].state & CS_CLONING != 0 {
                self.actors[n].state &= !CS_CLONING;
            }
        }
    }

    pub(crate) fn ms_init_level(&mut self) {
        self.actors = Vec::with_capacity(MAX_CREATURES);
        self.status_flags &= !SF_BAD_TILES;
        self.status_flags |= SF_NO_ANIMATION;

        // Teleports and toggle walls that start out covered never work.
        for pos in 0..MAP_CELLS {
            let cell = &mut self.map.cells[pos];
            if cell.top.id.is_terrain()
                || cell.top.id.get_id() == TileId::CHIP
                || cell.top.id.get_id() == TileId::BLOCK
            {
                if matches!(
                    cell.bottom.id,
                    TileId::TELEPORT
                        | TileId::SWITCHWALL_OPEN
                        | TileId::SWITCHWALL_CLOSED
                ) {
                    cell.bottom.add_state(FS_BROKEN);
                }
            }
        }

        self.actors.push(Actor {
            pos: 0,
            id: TileId::CHIP,
            direction: Direction::SOUTH,
            ..Actor::default()
        });
        self.ms_add_to_map(0);

        for n in 0..self.ms().init_actor_list.len() {
            let pos = self.ms().init_actor_list[n];
            if !in_bounds(pos) {
                log::warn!(
                    "level has invalid creature location ({} {})",
                    pos_x(pos),
                    pos_y(pos)
                );
                continue;
            }
            let top_id = self.map[pos].top.id;
            let bottom_id = self.map[pos].bottom.id;
            if !top_id.is_actor() {
                log::warn!(
                    "level has no creature at location ({} {})",
                    pos_x(pos),
                    pos_y(pos)
                );
                continue;
            }
            if top_id.get_id() != TileId::BLOCK
                && bottom_id != TileId::CLONE_MACHINE
            {
                if let Some(actor) = self.ms_create_actor() {
                    self.actors[actor].pos = pos;
                    self.actors[actor].id = top_id.get_id();
                    self.actors[actor].direction = top_id.get_dir();
                }
                if bottom_id.is_actor() && bottom_id.get_id() == TileId::CHIP {
                    self.actors[0].pos = pos;
                    self.actors[0].direction = bottom_id.get_dir();
                }
            }
            self.map[pos].top.add_state(FS_MARKER);
        }

        for pos in 0..MAP_CELLS as Position {
            if self.map[pos].top.has_state(FS_MARKER) {
                self.map[pos].top.remove_state(FS_MARKER);
            } else if self.map[pos].top.id.is_actor()
                && self.map[pos].top.id.get_id() == TileId::CHIP
            {
                self.actors[0].pos = pos;
                self.actors[0].direction = self.map[pos].bottom.id.get_dir();
            }
        }

        // Traps whose button is already down, or that hold a block or Chip
        // at startup, begin sprung.
        for i in 0..self.trap_connections.0.len() {
            let conn = self.trap_connections.0[i];
            if conn.to == self.actors[0].pos
                || (in_bounds(conn.to)
                    && self.map[conn.to].top.id == TileId::BLOCK_STATIC)
                || self.ms_is_trap_button_down(conn.from)
            {
                self.ms_spring_trap(conn.from);
            }
        }
    }

    /// Advances the MS game state by one tick.
    pub(crate) fn ms_tick_level(&mut self) {
        if self.current_tick & 3 == 0 {
            for n in 1..self.actors.len() {
                if self.actors[n].state & CS_TURNING != 0 {
                    self.actors[n].state &= !(CS_TURNING | CS_HASMOVED);
                    self.ms_update_floor(n);
                }
            }
            self.ms_mut().chip_ticks_since_moved += 1;
            if self.ms().chip_ticks_since_moved > 3 {
                self.ms_mut().chip_ticks_since_moved = 3;
                if !self.actors[0].direction.is_nil() {
                    self.actors[0].direction = Direction::SOUTH;
                }
                self.ms_update_floor(0);
            }
        }

        self.ms_mut().mscc_slippers = self.ms().slip_list.len() as u32;
        if self.actors[0].state & (CS_SLIP | CS_SLIDE) != 0 {
            let v = self.ms().mscc_slippers.wrapping_sub(1);
            self.ms_mut().mscc_slippers = v;
        }

        if self.current_tick != 0 && self.current_tick & 1 == 0 {
            self.ms_mut().controller_dir = Direction::NIL;
            for n in 0..self.actors.len() {
                if !self.actors[n].hidden
                    && self.actors[n].id != TileId::CHIP
                    && self.current_tick & 3 == 0
                    && self.ms().chip_status == ChipStatus::Squished
                    && !self.level_complete
                {
                    self.ms_mut().chip_status = ChipStatus::SquishedDeath;
                }
                if self.actors[n].hidden
                    || self.actors[n].state & CS_CLONING != 0
                    || self.actors[n].id == TileId::CHIP
                {
                    continue;
                }
                self.ms_choose_move(n);
                let decision = self.actors[n].move_decision;
                if !decision.is_nil() {
                    self.ms_advance_movement(n, decision);
                }
            }
            if self.ms_check_for_ending() != WinState::Playing {
                return;
            }
        }

        if self.current_tick != 0 && self.current_tick & 1 == 0 {
            self.ms_do_floor_movements();
            if self.ms_check_for_ending() != WinState::Playing {
                return;
            }
        }
        self.ms_update_sliplist();

        if self.time_limit != 0 {
            if self.current_tick >= self.time_limit {
                self.ms_mut().chip_status = ChipStatus::OutOfTime;
                self.add_sfx(Sfx::TimeOut);
                return;
            } else if self.time_limit - self.current_tick <= 15 * TICKS_PER_SECOND
                && self.current_tick % TICKS_PER_SECOND == 0
            {
                self.add_sfx(Sfx::TimeLow);
            }
        }

        self.ms_choose_move(0);
        let decision = self.actors[0].move_decision;
        if !decision.is_nil() {
            self.ms_advance_movement(0, decision);
            if self.ms_check_for_ending() != WinState::Playing {
                return;
            }
            self.actors[0].state |= CS_HASMOVED;
        }
        self.ms_update_sliplist();
        self.ms_create_clones();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips_challenge::level::init::testutil::*;
    use crate::chips_challenge::prelude::*;

    fn ms_level(placements: &[(usize, usize, u8)], time: u16, chips: u16) -> Level {
        sparse_metadata(placements, time, chips)
            .make_level(LevelSetup::new(RulesetId::Ms).with_seed(1))
            .unwrap()
    }

    fn hold(level: &mut Level, dir: Direction, ticks: u32) {
        for _ in 0..ticks {
            level.set_input(GameInput::from_direction(dir));
            level.tick();
        }
    }

    #[test]
    fn chip_walks_east_to_the_exit() {
        let mut level =
            ms_level(&[(5, 5, B_CHIP_S), (7, 5, B_EXIT)], 0, 0);
        hold(&mut level, Direction::EAST, 20);
        assert!(level.is_complete());
        assert_eq!(level.win_state(), WinState::Won);
    }

    #[test]
    fn chip_bonks_on_a_wall() {
        let mut level =
            ms_level(&[(5, 5, B_CHIP_S), (6, 5, B_WALL)], 0, 0);
        hold(&mut level, Direction::EAST, 5);
        assert_eq!(level.chip().pos, at(5, 5));
        assert_eq!(level.win_state(), WinState::Playing);
        assert!(level.sfx() & (1 << Sfx::CantMove as u32) != 0);
    }

    #[test]
    fn pushed_block_fills_water() {
        let mut level = ms_level(
            &[(5, 5, B_CHIP_S), (6, 5, B_BLOCK), (7, 5, B_WATER)],
            0,
            0,
        );
        hold(&mut level, Direction::EAST, 8);
        assert_eq!(level.top_tile(at(7, 5)), TileId::DIRT);
        assert_eq!(level.chip().pos, at(6, 5));
        assert_eq!(level.win_state(), WinState::Playing);
    }

    #[test]
    fn chip_collects_a_chip_and_opens_the_socket() {
        let mut level = ms_level(
            &[
                (5, 5, B_CHIP_S),
                (6, 5, B_IC_CHIP),
                (7, 5, B_SOCKET),
                (8, 5, B_EXIT),
            ],
            0,
            1,
        );
        hold(&mut level, Direction::EAST, 30);
        assert_eq!(level.chips_left(), 0);
        assert!(level.is_complete());
    }

    #[test]
    fn running_out_of_time_kills() {
        let mut level = ms_level(&[(5, 5, B_CHIP_S)], 1, 0);
        for _ in 0..30 {
            level.set_input(GameInput::NIL);
            level.tick();
        }
        assert_eq!(level.win_state(), WinState::Died);
        assert_eq!(level.ms().chip_status, ChipStatus::OutOfTime);
    }

    #[test]
    fn ice_carries_chip_across() {
        let mut level = ms_level(
            &[(5, 5, B_CHIP_S), (6, 5, B_ICE), (7, 5, B_ICE)],
            0,
            0,
        );
        hold(&mut level, Direction::EAST, 4);
        for _ in 0..30 {
            level.set_input(GameInput::NIL);
            level.tick();
        }
        assert_eq!(level.chip().pos, at(8, 5));
        assert!(level.ms().slip_list.is_empty());
    }

    #[test]
    fn a_ball_bounces_inside_its_corridor() {
        // The monster list drives actor creation under MS rules.
        let mut meta = sparse_metadata(
            &[
                (5, 5, B_CHIP_S),
                (16, 6, B_WALL),
                (16, 8, B_BALL_N),
                (16, 10, B_WALL),
            ],
            0,
            0,
        );
        meta.monster_list = vec![at(16, 8)];
        let mut level = meta
            .make_level(LevelSetup::new(RulesetId::Ms).with_seed(1))
            .unwrap();

        assert_eq!(level.actor(1).id, TileId::BALL);
        let mut positions = std::collections::BTreeSet::new();
        for _ in 0..40 {
            level.set_input(GameInput::NIL);
            level.tick();
            positions.insert(level.actor(1).pos);
        }
        // Still shuttling inside its corridor, and actually moving.
        assert!(positions.len() > 1);
        for pos in positions {
            assert!(pos == at(16, 7) || pos == at(16, 8) || pos == at(16, 9));
        }
    }

    #[test]
    fn diagonal_input_keeps_the_vertical_component() {
        let mut level = ms_level(&[(5, 5, B_CHIP_S)], 0, 0);
        let diagonal = GameInput::from_direction(Direction::NORTH | Direction::EAST);
        level.set_input(diagonal);
        level.tick();
        assert_eq!(level.chip().pos, at(5, 4));
    }

    #[test]
    fn tank_stalls_against_a_wall_until_turned() {
        let mut meta = sparse_metadata(
            &[(5, 5, B_CHIP_S), (16, 8, B_TANK_N), (16, 7, B_WALL)],
            0,
            0,
        );
        meta.monster_list = vec![at(16, 8)];
        let mut level = meta
            .make_level(LevelSetup::new(RulesetId::Ms).with_seed(1))
            .unwrap();
        for _ in 0..12 {
            level.set_input(GameInput::NIL);
            level.tick();
        }
        assert_eq!(level.actor(1).pos, at(16, 8));
        assert!(level.actor(1).state & CS_HASMOVED != 0);
    }
}
