use super::*;
use crate::chips_challenge::prelude::*;

impl Level {
    /// Commits an actor to the move it decided on (or was forced into).
    /// This is where collisions with the player resolve into deaths.
    fn lx_start_moving_to(&mut self, idx: usize, releasing: bool) -> MoveResult {
        let move_dir = if !self.actors[idx].move_decision.is_nil() {
            self.actors[idx].move_decision
        } else if !forced_move(&self.actors[idx]).is_nil() {
            forced_move(&self.actors[idx])
        } else {
            return MoveResult::Failed;
        };
        self.actors[idx].direction = move_dir;

        let from_terrain = self.map[self.actors[idx].pos].top.id;

        if idx == 0 && !self.player_has_item(TileId::BOOTS_SLIDE) {
            if from_terrain.is_slide() && self.actors[idx].move_decision.is_nil() {
                self.actors[idx].state |= CS_SLIDETOKEN;
            } else if !from_terrain.is_ice() || self.player_has_item(TileId::BOOTS_ICE)
            {
                self.actors[idx].state &= !CS_SLIDETOKEN;
            }
        }

        let flags = CMM_PUSHBLOCKSNOW
            | CMM_CLEARANIMATIONS
            | CMM_STARTMOVEMENT
            | if releasing { CMM_RELEASING } else { 0 };
        if !self.lx_check_collision(self.actors[idx], move_dir, flags) {
            if idx == 0 {
                if !self.lx().chip_bonked {
                    self.lx_mut().chip_bonked = true;
                    self.add_sfx(Sfx::CantMove);
                }
                self.lx_mut().chip_pushing = true;
            }
            // A bonk on ice turns the slider around.
            if from_terrain.is_ice()
                && !(idx == 0 && self.player_has_item(TileId::BOOTS_ICE))
            {
                self.actors[idx].direction =
                    decision::ice_turned_dir(from_terrain, self.actors[idx].direction);
            }
            return MoveResult::Failed;
        }

        if self.lx().map_breached && self.actors[0].id == TileId::CHIP {
            self.lx_remove_chip(ChipStatus::Collided, Some(idx));
            return MoveResult::Died;
        }

        if idx != 0 {
            let pos = self.actors[idx].pos;
            self.lx_remove_claim(pos);
            // If Chip looks set to enter the cell being vacated, remember
            // who he is about to run into.
            if self.actors[idx].id != TileId::BLOCK
                && pos == self.lx().chip_predicted_pos
            {
                self.lx_mut().chip_colliding_actor = idx as ActorIndex;
            }
        }
        // Walking into the spot a monster just left still kills.
        if idx == 0 && self.lx().chip_colliding_actor != ACTOR_NONE {
            let other = self.lx().chip_colliding_actor as usize;
            if !self.actors[other].hidden {
                self.actors[other].move_cooldown = 8;
                self.lx_remove_chip(ChipStatus::Collided, Some(other));
                return MoveResult::Died;
            }
        }

        let newpos = neighbor(self.actors[idx].pos, move_dir);
        self.actors[idx].pos = newpos;
        self.actors[idx].move_cooldown += 8;

        if idx != 0 {
            self.lx_add_claim(newpos);
            if newpos == self.actors[0].pos && !self.actors[0].hidden {
                self.lx_remove_chip(ChipStatus::Collided, Some(idx));
                return MoveResult::Died;
            }
        } else {
            self.lx_mut().chip_bonked = false;
            if let Some(monster) = self.lx_find_actor(newpos, FA_NO_CHIP) {
                self.lx_remove_chip(ChipStatus::Collided, Some(monster));
                return MoveResult::Died;
            }
        }

        if self.actors[idx].state & CS_PUSHED != 0 {
            self.lx_mut().chip_pushing = true;
            self.add_sfx(Sfx::BlockMoving);
        }
        MoveResult::Success
    }

    /// Burns down an actor's cooldown. The base rate doubles on ice and
    /// slides and halves for blobs. Returns true while the move is still
    /// in progress.
    fn lx_reduce_cooldown(&mut self, idx: usize) -> bool {
        if self.actors[idx].id.is_animation() {
            return true;
        }
        if self.actors[idx].id == TileId::CHIP && self.lx().chip_stuck {
            return true;
        }

        let mut speed: i8 = 2;
        if self.actors[idx].id == TileId::BLOB {
            speed /= 2;
        }
        let terrain = self.map[self.actors[idx].pos].top.id;
        let is_chip = self.actors[idx].id == TileId::CHIP;
        if terrain.is_slide() && !(is_chip && self.player_has_item(TileId::BOOTS_SLIDE))
        {
            speed *= 2;
        }
        if terrain.is_ice() && !(is_chip && self.player_has_item(TileId::BOOTS_ICE)) {
            speed *= 2;
        }
        self.actors[idx].move_cooldown -= speed;
        self.actors[idx].animation_frame = self.actors[idx].move_cooldown / 2;
        self.actors[idx].is_moving()
    }

    /// Advances one actor through its movement for the tick: start a new
    /// move if idle, spend cooldown, and land when it runs out.
    pub(crate) fn lx_advance_movement(
        &mut self,
        idx: usize,
        releasing: bool,
    ) -> MoveResult {
        if self.actors[idx].id.is_animation() {
            return MoveResult::Success;
        }

        if !self.actors[idx].is_moving() {
            let mut previous_releasing_dir = Direction::NIL;
            if releasing {
                previous_releasing_dir = self.actors[idx].move_decision;
                self.actors[idx].move_decision = self.actors[idx].direction;
            }
            if self.actors[idx].move_decision.is_nil()
                && forced_move(&self.actors[idx]).is_nil()
            {
                if self.lx().pedantic_mode
                    && self.lx_enter_tile(idx, true) == MoveResult::Died
                {
                    return MoveResult::Died;
                }
                return MoveResult::Success;
            }
            let start_res = self.lx_start_moving_to(idx, releasing);
            if start_res != MoveResult::Died {
                self.actors[idx].hidden = false;
            }
            match start_res {
                MoveResult::Died => return MoveResult::Died,
                MoveResult::Failed => {
                    if releasing {
                        self.actors[idx].move_decision = previous_releasing_dir;
                    }
                    if self.lx().pedantic_mode
                        && self.lx_enter_tile(idx, true) == MoveResult::Died
                    {
                        return MoveResult::Died;
                    }
                    return MoveResult::Failed;
                }
                MoveResult::Success => {}
            }
        }

        if self.lx_reduce_cooldown(idx) {
            return MoveResult::Success;
        }
        self.lx_enter_tile(idx, false)
    }

    /// Applies the effects of the tile an actor has just fully arrived
    /// on. With `standing_still` set (pedantic-mode idling) the one-shot
    /// effects have already fired and nothing recurs.
    fn lx_enter_tile(&mut self, idx: usize, standing_still: bool) -> MoveResult {
        if standing_still {
            return MoveResult::Success;
        }

        let pos = self.actors[idx].pos;
        let terrain = self.map[pos].top.id;
        let id = self.actors[idx].id;
        let mut survived = true;

        if id == TileId::CHIP {
            match terrain {
                TileId::WATER => {
                    if !self.player_has_item(TileId::BOOTS_WATER) {
                        self.lx_remove_chip(ChipStatus::Drowned, None);
                        return MoveResult::Died;
                    }
                }
                TileId::FIRE => {
                    if !self.player_has_item(TileId::BOOTS_FIRE) {
                        self.lx_remove_chip(ChipStatus::Burned, None);
                        return MoveResult::Died;
                    }
                }
                TileId::DIRT | TileId::BLUEWALL_FAKE => {
                    self.map[pos].top.id = TileId::EMPTY;
                    self.add_sfx(Sfx::TileEmptied);
                }
                TileId::POPUP_WALL => {
                    // In pedantic mode the wall pops under the last actor
                    // recorded on a recessed wall, even if that cell held
                    // a trap or teleport.
                    let wall_pos = if self.lx().pedantic_mode
                        && in_bounds(self.lx().to_place_wall_pos)
                    {
                        let p = self.lx().to_place_wall_pos;
                        self.lx_mut().to_place_wall_pos = POSITION_NULL;
                        p
                    } else {
                        pos
                    };
                    self.map[wall_pos].top.id = TileId::WALL;
                    self.add_sfx(Sfx::WallCreated);
                }
                TileId::DOOR_RED
                | TileId::DOOR_BLUE
                | TileId::DOOR_YELLOW
                | TileId::DOOR_GREEN => {
                    if !self.player_has_item(terrain) {
                        log::warn!(
                            "{}: player entered door {:02X} without a key",
                            self.current_tick,
                            terrain.byte()
                        );
                    }
                    if terrain != TileId::DOOR_GREEN {
                        if let Some(slot) = self.player_item_slot(terrain) {
                            *slot = slot.saturating_sub(1);
                        }
                    }
                    self.map[pos].top.id = TileId::EMPTY;
                    self.add_sfx(Sfx::DoorOpened);
                }
                TileId::KEY_RED
                | TileId::KEY_BLUE
                | TileId::KEY_YELLOW
                | TileId::KEY_GREEN
                | TileId::BOOTS_ICE
                | TileId::BOOTS_SLIDE
                | TileId::BOOTS_FIRE
                | TileId::BOOTS_WATER => {
                    if let Some(slot) = self.player_item_slot(terrain) {
                        *slot += 1;
                    }
                    self.map[pos].top.id = TileId::EMPTY;
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
                    self.map[pos].top.id = TileId::EMPTY;
                    self.add_sfx(Sfx::IcCollected);
                }
                TileId::SOCKET => {
                    if self.chips_left > 0 {
                        log::warn!(
                            "{}: entered the socket with chips still remaining",
                            self.current_tick
                        );
                    }
                    self.map[pos].top.id = TileId::EMPTY;
                    self.add_sfx(Sfx::SocketOpened);
                }
                TileId::BOMB => {
                    self.map[pos].top.id = TileId::EMPTY;
                    self.lx_remove_chip(ChipStatus::Bombed, None);
                    return MoveResult::Died;
                }
                TileId::BEARTRAP => {
                    self.add_sfx(Sfx::TrapEntered);
                }
                TileId::EXIT => {
                    self.level_complete = true;
                    self.add_sfx(Sfx::ChipWins);
                }
                _ => {}
            }
        } else if id == TileId::BLOCK {
            match terrain {
                TileId::WATER => {
                    self.map[pos].top.id = TileId::DIRT;
                    self.add_sfx(Sfx::WaterSplash);
                    self.lx_remove_actor(idx, TileId::WATER_SPLASH);
                    survived = false;
                }
                TileId::BOMB => {
                    self.map[pos].top.id = TileId::EMPTY;
                    self.add_sfx(Sfx::BombExplodes);
                    self.lx_remove_actor(idx, TileId::BOMB_EXPLOSION);
                    survived = false;
                }
                TileId::BEARTRAP => {
                    self.add_sfx(Sfx::TrapEntered);
                }
                _ => {}
            }
        } else {
            match terrain {
                TileId::WATER => {
                    if id != TileId::GLIDER {
                        self.add_sfx(Sfx::WaterSplash);
                        self.lx_remove_actor(idx, TileId::WATER_SPLASH);
                        survived = false;
                    }
                }
                TileId::FIRE => {
                    if id != TileId::FIREBALL {
                        self.lx_remove_actor(idx, TileId::ENTITY_EXPLOSION);
                        survived = false;
                    }
                }
                TileId::BOMB => {
                    self.map[pos].top.id = TileId::EMPTY;
                    self.add_sfx(Sfx::BombExplodes);
                    self.lx_remove_actor(idx, TileId::BOMB_EXPLOSION);
                    survived = false;
                }
                TileId::BEARTRAP => {
                    self.add_sfx(Sfx::TrapEntered);
                }
                _ => {}
            }
        }

        if !survived {
            return MoveResult::Died;
        }

        // Buttons answer to whatever lands on them.
        match terrain {
            TileId::BUTTON_BLUE => {
                self.add_sfx(Sfx::ButtonPushed);
                self.lx_turn_tanks();
            }
            TileId::BUTTON_GREEN => {
                let xor = TileId::SWITCHWALL_OPEN.byte() ^ TileId::SWITCHWALL_CLOSED.byte();
                self.lx_mut().toggle_walls_xor ^= xor;
            }
            TileId::BUTTON_RED => {
                let cloner = self.lx_find_cloner_from_button(pos);
                if cloner != POSITION_NULL && self.lx_activate_cloner(cloner) {
                    self.add_sfx(Sfx::ButtonPushed);
                }
            }
            TileId::BUTTON_BROWN => {
                self.add_sfx(Sfx::ButtonPushed);
            }
            _ => {}
        }

        MoveResult::Success
    }

    /// Reverses every tank that is free to listen. Tanks on ice or clone
    /// machines ignore the button.
    fn lx_turn_tanks(&mut self) {
        for n in 0..self.lx_live() {
            if self.actors[n].hidden || self.actors[n].id != TileId::TANK {
                continue;
            }
            let terrain = self.map[self.actors[n].pos].top.id;
            if terrain == TileId::CLONE_MACHINE || terrain.is_ice() {
                continue;
            }
            self.actors[n].state ^= CS_REVERSE;
        }
    }

    /// The cell wired to a button. Pedantic mode ignores the connection
    /// lists and scans the map in reading order starting just past the
    /// button; a trap erased by a recessed wall is restored when found.
    fn lx_find_connected_cell(&mut self, from_pos: Position, target: TileId) -> Position {
        if self.lx().pedantic_mode {
            for offset in 1..MAP_CELLS {
                let searched =
                    ((from_pos as usize + offset) % MAP_CELLS) as Position;
                if self.map[searched].top.id == target {
                    return searched;
                }
                if target == TileId::BEARTRAP && self.lx_ever_had_trap(searched) {
                    self.map[searched].top.id = TileId::BEARTRAP;
                    return searched;
                }
            }
            return POSITION_NULL;
        }
        let list = if target == TileId::BEARTRAP {
            &self.trap_connections
        } else {
            &self.cloner_connections
        };
        for conn in &list.0 {
            if conn.from == from_pos {
                return conn.to;
            }
        }
        POSITION_NULL
    }

    pub(crate) fn lx_find_trap_from_button(&mut self, pos: Position) -> Position {
        self.lx_find_connected_cell(pos, TileId::BEARTRAP)
    }

    pub(crate) fn lx_find_cloner_from_button(&mut self, pos: Position) -> Position {
        self.lx_find_connected_cell(pos, TileId::CLONE_MACHINE)
    }

    /// Springs the trap at `pos`, releasing whatever it holds.
    pub(crate) fn lx_activate_trap(&mut self, pos: Position) {
        if self.map[pos].top.id != TileId::BEARTRAP {
            log::warn!(
                "{}: trap activation on a trapless cell ({} {})",
                self.current_tick,
                pos_x(pos),
                pos_y(pos)
            );
            return;
        }
        if let Some(actor) = self.lx_find_actor(pos, 0) {
            if !self.actors[actor].direction.is_nil() {
                self.lx_advance_movement(actor, true);
            }
        }
    }

    /// Fires the cloner at `pos`: copy the occupant, then march the
    /// original off the machine. If the original cannot leave, the copy
    /// is taken back.
    pub(crate) fn lx_activate_cloner(&mut self, pos: Position) -> bool {
        if self.map[pos].top.id != TileId::CLONE_MACHINE {
            log::warn!(
                "{}: cloner activation on a machineless cell ({} {})",
                self.current_tick,
                pos_x(pos),
                pos_y(pos)
            );
            return false;
        }
        let Some(original) = self.lx_find_actor(pos, 0) else {
            return false;
        };
        let Some(clone) = self.lx_create_actor() else {
            return false;
        };
        let template = self.actors[original];
        self.actors[clone] = template;
        if self.lx_advance_movement(original, true) != MoveResult::Success {
            self.actors[clone].hidden = true;
            return false;
        }
        true
    }

    /// Jumps an actor resting on a teleport to the previous working
    /// teleport (in reading order) it can exit from. A full sweep with no
    /// exit leaves it where it started.
    pub(crate) fn lx_teleport(&mut self, idx: usize) {
        if self.actors[idx].direction.is_nil() {
            log::warn!(
                "{}: directionless creature {:02X} on teleport at ({} {})",
                self.current_tick,
                self.actors[idx].id.byte(),
                pos_x(self.actors[idx].pos),
                pos_y(self.actors[idx].pos)
            );
        }

        let start_pos = self.actors[idx].pos;
        let mut checked_pos = start_pos;
        let is_chip = self.actors[idx].id == TileId::CHIP;

        loop {
            if checked_pos == 0 {
                checked_pos = MAP_CELLS as Position;
            }
            checked_pos -= 1;
            let terrain = self.map[checked_pos].top.id;
            if terrain == TileId::TELEPORT {
                // The claim comes off before the check and a failed check
                // does not put it back, so on the next lap it is the
                // occupier's claim that gets removed. Replays depend on
                // this.
                if !is_chip {
                    let pos = self.actors[idx].pos;
                    self.lx_remove_claim(pos);
                }
                self.actors[idx].pos = checked_pos;
                let dir = self.actors[idx].direction;
                if !self.lx_has_claim(checked_pos)
                    && self.lx_check_collision(self.actors[idx], dir, 0)
                {
                    break;
                }
                if checked_pos == start_pos {
                    if is_chip {
                        if self.lx().pedantic_mode {
                            self.lx_mut().chip_stuck = true;
                        }
                    } else {
                        self.lx_add_claim(start_pos);
                    }
                    return;
                }
            } else if self.lx_ever_had_teleport(checked_pos) {
                // A teleport erased by a recessed wall comes back when the
                // network is walked.
                self.map[checked_pos].top.id = TileId::TELEPORT;
                if checked_pos == self.actors[0].pos {
                    self.actors[0].hidden = true;
                }
            }
        }

        self.actors[idx].state |= CS_TELEPORTED;
        if is_chip {
            self.add_sfx(Sfx::Teleporting);
        } else {
            let pos = self.actors[idx].pos;
            self.lx_add_claim(pos);
        }
    }
}
