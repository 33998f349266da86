use super::*;
use crate::chips_challenge::prelude::*;

impl Level {
    /// Initiates a move by the given creature. Returns false if the move
    /// cannot begin; side effects (exposed walls, pushed blocks) may still
    /// have occurred.
    fn ms_start_movement(&mut self, idx: usize, dir: Direction) -> bool {
        let floor = self.map[self.actors[idx].pos].bottom.id;
        let odir = self.actors[idx].direction;

        if dir.is_nil() {
            log::warn!("{}: movement started with a nil direction", self.current_tick);
        }

        if !self.ms_can_make_move(self.actors[idx], dir, 0) {
            if self.actors[idx].id == TileId::CHIP
                || (floor != TileId::BEARTRAP
                    && floor != TileId::CLONE_MACHINE
                    && self.actors[idx].state & CS_SLIP == 0)
            {
                if self.actors[idx].id != TileId::CHIP || !odir.is_nil() {
                    self.actors[idx].direction = dir;
                }
                self.ms_update_floor(idx);
            }
            return false;
        }

        if floor == TileId::BEARTRAP {
            if self.actors[idx].state & CS_RELEASED == 0 {
                log::warn!(
                    "{}: creature left a beartrap without being released",
                    self.current_tick
                );
            }
            if self.actors[idx].state & CS_MUTANT != 0 {
                let pos = self.actors[idx].pos;
                self.map[pos].bottom.add_state(FS_HASMUTANT);
            }
        }
        self.actors[idx].state &= !CS_RELEASED;
        self.actors[idx].direction = dir;
        true
    }

    /// Completes a move. Most side effects of entering a tile happen here,
    /// and this is the only place a creature can join the slip list.
    fn ms_end_movement(&mut self, idx: usize, dir: Direction) {
        let mut dead = false;
        let mut block_cloning = false;

        let oldpos = self.actors[idx].pos;
        let mut newpos = neighbor(oldpos, dir);
        // The entered cell, which stays fixed even if a teleport relocates
        // the actor below.
        let cellpos = newpos;
        let floor = self.map[cellpos].top.id;
        let actor_id_top = self.map[oldpos].top.id.get_id();

        let actor_id = self.actors[idx].id;
        if actor_id == TileId::CHIP {
            match floor {
                TileId::EMPTY | TileId::DIRT | TileId::BLUEWALL_FAKE => {
                    self.map[cellpos].pop_tile();
                }
                TileId::WATER => {
                    if !self.player_has_item(floor) {
                        self.ms_mut().chip_status = ChipStatus::Drowned;
                    }
                }
                TileId::FIRE => {
                    if !self.player_has_item(floor) {
                        self.ms_mut().chip_status = ChipStatus::Burned;
                    }
                }
                TileId::POPUP_WALL => {
                    self.map[cellpos].top.id = TileId::WALL;
                }
                TileId::DOOR_RED
                | TileId::DOOR_BLUE
                | TileId::DOOR_YELLOW
                | TileId::DOOR_GREEN => {
                    if !self.player_has_item(floor) {
                        log::warn!(
                            "{}: player entered door {:02X} without a key",
                            self.current_tick,
                            floor.byte()
                        );
                    }
                    if floor != TileId::DOOR_GREEN {
                        if let Some(slot) = self.player_item_slot(floor) {
                            *slot = slot.saturating_sub(1);
                        }
                    }
                    self.map[cellpos].pop_tile();
                    self.add_sfx(Sfx::DoorOpened);
                }
                TileId::BOOTS_ICE
                | TileId::BOOTS_SLIDE
                | TileId::BOOTS_FIRE
                | TileId::BOOTS_WATER
                | TileId::KEY_RED
                | TileId::KEY_BLUE
                | TileId::KEY_YELLOW
                | TileId::KEY_GREEN => {
                    if let Some(slot) = self.player_item_slot(floor) {
                        *slot += 1;
                    }
                    self.map[cellpos].pop_tile();
                    self.add_sfx(Sfx::ItemCollected);
                }
                TileId::BURGLAR => {
                    self.player_boots = [0; 4];
                    self.add_sfx(Sfx::BootsStolen);
                }
                TileId::IC_CHIP => {
                    if self.chips_left > 0 {
                        self.chips_left -= 1;
                    }
                    self.map[cellpos].pop_tile();
                    self.add_sfx(Sfx::IcCollected);
                }
                TileId::SOCKET => {
                    if self.chips_left > 0 {
                        log::warn!(
                            "{}: entered the socket with chips still remaining",
                            self.current_tick
                        );
                    }
                    self.map[cellpos].pop_tile();
                    self.add_sfx(Sfx::SocketOpened);
                }
                TileId::BOMB => {
                    self.ms_mut().chip_status = ChipStatus::Bombed;
                    self.add_sfx(Sfx::BombExplodes);
                }
                _ => {
                    if floor.is_actor() {
                        self.ms_mut().chip_status = ChipStatus::Collided;
                    }
                }
            }
        } else if actor_id == TileId::BLOCK {
            match floor {
                TileId::EMPTY => {
                    self.map[cellpos].pop_tile();
                }
                TileId::WATER => {
                    self.map[cellpos].top.id = TileId::DIRT;
                    dead = true;
                    self.add_sfx(Sfx::WaterSplash);
                }
                TileId::BOMB => {
                    self.map[cellpos].top.id = TileId::EMPTY;
                    dead = true;
                    self.add_sfx(Sfx::BombExplodes);
                }
                TileId::TELEPORT => {
                    if !self.map[cellpos].top.has_state(FS_BROKEN) {
                        newpos = self.ms_teleport(idx, newpos);
                    }
                }
                _ => {}
            }
            let over = self.map[oldpos].top.id;
            if over.is_actor() && over.get_id() == TileId::CHIP {
                self.actors[idx].state |= CS_MUTANT;
            }
        } else {
            match floor {
                TileId::WATER => {
                    if actor_id_top != TileId::GLIDER {
                        dead = true;
                    }
                }
                TileId::FIRE => {
                    if actor_id_top != TileId::FIREBALL {
                        dead = true;
                    }
                }
                TileId::BOMB => {
                    self.map[cellpos].top.id = TileId::EMPTY;
                    dead = true;
                    self.add_sfx(Sfx::BombExplodes);
                }
                TileId::TELEPORT => {
                    if !self.map[cellpos].top.has_state(FS_BROKEN) {
                        newpos = self.ms_teleport(idx, newpos);
                    }
                }
                _ => {}
            }
        }

        if self.map[oldpos].bottom.id != TileId::CLONE_MACHINE
            || actor_id == TileId::CHIP
        {
            self.map[oldpos].pop_tile();
        }
        if dead {
            self.ms_remove_actor(idx);
            if self.map[oldpos].bottom.id == TileId::CLONE_MACHINE {
                self.map[oldpos].bottom.remove_state(FS_CLONING);
            }
            return;
        }

        if actor_id == TileId::CHIP
            && floor == TileId::TELEPORT
            && !self.map[cellpos].top.has_state(FS_BROKEN)
        {
            newpos = self.ms_teleport(idx, newpos);
            self.add_sfx(Sfx::Teleporting);
            if self.ms_terrain(newpos) == TileId::BLOCK_STATIC {
                // Landing against a block keeps the prior slip direction
                // alive for the next forced move.
                if self.ms().chip_last_slip_dir.is_nil() {
                    self.actors[idx].direction = Direction::NIL;
                } else {
                    self.actors[idx].direction = self.ms().chip_last_slip_dir;
                }
            }
        }

        self.actors[idx].pos = newpos;
        self.ms_add_to_map(idx);
        self.actors[idx].pos = oldpos;

        // Buttons trip on the entered cell's lower tile. Presses made by a
        // pushed block are parked as state bits instead.
        let deferred = self.actors[idx].state & CS_DEFERPUSH != 0;
        match floor {
            TileId::BUTTON_BLUE => {
                if deferred {
                    self.map[cellpos].bottom.add_state(FS_BUTTONDOWN);
                } else {
                    self.ms_turn_tanks(Some(idx));
                }
                self.add_sfx(Sfx::ButtonPushed);
            }
            TileId::BUTTON_GREEN => {
                if deferred {
                    self.map[cellpos].bottom.add_state(FS_BUTTONDOWN);
                } else {
                    self.ms_toggle_walls();
                }
            }
            TileId::BUTTON_RED => {
                self.actors[idx].state |= CS_SPONTANEOUS;
                if deferred {
                    self.map[cellpos].bottom.add_state(FS_BUTTONDOWN);
                } else {
                    self.ms_activate_cloner(newpos);
                }
                self.add_sfx(Sfx::ButtonPushed);
                self.actors[idx].state &= !CS_SPONTANEOUS;
            }
            TileId::BUTTON_BROWN => {
                if deferred {
                    self.map[cellpos].bottom.add_state(FS_BUTTONDOWN);
                } else {
                    self.ms_spring_trap(newpos);
                }
                self.add_sfx(Sfx::ButtonPushed);
            }
            _ => {}
        }
        self.actors[idx].pos = newpos;

        if self.map[oldpos].bottom.id == TileId::CLONE_MACHINE {
            if actor_id == TileId::BLOCK
                && self.map[oldpos].top.id != TileId::BLOCK_STATIC
            {
                block_cloning = true;
            }
            self.map[oldpos].bottom.add_state(FS_CLONING);
        }

        if floor == TileId::BEARTRAP {
            if self.ms_is_trap_open(newpos, oldpos) {
                self.actors[idx].state |= CS_RELEASED;
            }
        } else if self.map[newpos].top.id == TileId::BEARTRAP {
            for i in 0..self.trap_connections.0.len() {
                if self.trap_connections.0[i].to == newpos {
                    self.actors[idx].state |= CS_RELEASED;
                    break;
                }
            }
        }

        if actor_id == TileId::CHIP {
            if self.ms().mouse_goal == self.actors[idx].pos {
                self.ms_cancel_mouse_goal();
            }
            if self.ms().chip_status != ChipStatus::Okay
                && self.ms().chip_status != ChipStatus::Squished
            {
                return;
            }
            if self.map[cellpos].bottom.id == TileId::EXIT {
                self.level_complete = true;
                return;
            }
        } else {
            let under = self.map[cellpos].bottom.id;
            if under.is_actor()
                && (under.get_id() == TileId::CHIP
                    || under.get_id() == TileId::SWIMMING_CHIP)
            {
                self.ms_mut().chip_status =
                    if actor_id != TileId::BLOCK || !block_cloning {
                        ChipStatus::Collided
                    } else {
                        ChipStatus::Squished
                    };
                return;
            }
        }

        let was_slipping = self.actors[idx].state & (CS_SLIP | CS_SLIDE) != 0;

        if floor == TileId::TELEPORT {
            self.ms_start_floor_movement(idx, floor, Direction::NIL);
        } else if floor.is_ice()
            && (actor_id != TileId::CHIP || !self.player_has_item(TileId::BOOTS_ICE))
        {
            self.ms_start_floor_movement(idx, floor, Direction::NIL);
        } else if floor.is_slide()
            && (actor_id != TileId::CHIP || !self.player_has_item(TileId::BOOTS_SLIDE))
        {
            self.ms_start_floor_movement(idx, floor, Direction::NIL);
        } else if floor == TileId::BEARTRAP && actor_id == TileId::BLOCK && was_slipping
        {
            self.ms_start_floor_movement(idx, floor, Direction::NIL);
            if self.actors[idx].state & CS_MUTANT != 0 {
                self.map[cellpos].bottom.add_state(FS_HASMUTANT);
            }
        } else {
            self.actors[idx].state &= !(CS_SLIP | CS_SLIDE);
            if was_slipping && actor_id != TileId::CHIP {
                let v = self.ms().mscc_slippers.wrapping_sub(1);
                self.ms_mut().mscc_slippers = v;
                self.ms_remove_from_slip_list(idx);
            }
        }
        if !was_slipping
            && self.actors[idx].state & (CS_SLIP | CS_SLIDE) != 0
            && actor_id != TileId::CHIP
        {
            let d = self.ms_actor_slip_dir(idx);
            self.ms_mut().controller_dir = d;
        }
    }

    /// Moves the given creature in the given direction.
    pub(crate) fn ms_advance_movement(&mut self, idx: usize, dir: Direction) -> bool {
        if dir.is_nil() {
            return true;
        }

        if self.actors[idx].id == TileId::CHIP {
            self.ms_mut().chip_ticks_since_moved = 0;
        }

        if !self.ms_start_movement(idx, dir) {
            if self.actors[idx].id == TileId::CHIP {
                self.add_sfx(Sfx::CantMove);
                self.ms_reset_buttons();
                self.ms_cancel_mouse_goal();
            }
            return false;
        }

        self.ms_end_movement(idx, dir);
        if self.actors[idx].id == TileId::CHIP {
            self.ms_handle_buttons();
        }
        true
    }

    /// Relocates the creature through the teleport network: scan cells in
    /// reverse reading order from just before the entry point until a
    /// working teleport lets it out. A failed full sweep leaves it on the
    /// teleport it arrived at.
    pub(crate) fn ms_teleport(&mut self, idx: usize, start: Position) -> Position {
        let origdir = self.actors[idx].direction;
        if origdir.is_nil() {
            log::warn!(
                "{}: directionless creature {:02X} on teleport at ({} {})",
                self.current_tick,
                self.actors[idx].id.byte(),
                pos_x(self.actors[idx].pos),
                pos_y(self.actors[idx].pos)
            );
        } else if self.actors[idx].hidden {
            log::warn!(
                "{}: hidden creature {:02X} on teleport at ({} {})",
                self.current_tick,
                self.actors[idx].id.byte(),
                pos_x(self.actors[idx].pos),
                pos_y(self.actors[idx].pos)
            );
        }

        let origpos = self.actors[idx].pos;
        let mut dest = start;

        loop {
            dest -= 1;
            if dest < 0 {
                dest += MAP_CELLS as Position;
            }
            if dest == start {
                break;
            }
            let tile = self.map[dest].top;
            if tile.id != TileId::TELEPORT || tile.has_state(FS_BROKEN) {
                continue;
            }
            self.actors[idx].pos = dest;
            let probe = self.actors[idx];
            let can_exit = self.ms_can_make_move(
                probe,
                probe.direction,
                CMM_NOLEAVECHECK
                    | CMM_NOEXPOSEWALLS
                    | CMM_NODEFERBUTTONS
                    | CMM_NOFIRECHECK
                    | CMM_TELEPORTPUSH,
            );
            // A teleport-push can ripple back into this actor (a pushed
            // block striking a blue button turns tanks), so both fields
            // are restored explicitly.
            self.actors[idx].direction = origdir;
            self.actors[idx].pos = origpos;
            if can_exit {
                break;
            }
        }

        dest
    }
}
