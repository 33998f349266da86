use super::*;
use crate::chips_challenge::prelude::*;

impl Level {
    /// Turns every tank around. A tank that is halfway through a move at
    /// the time gets special treatment.
    pub(crate) fn ms_turn_tanks(&mut self, invoking: Option<usize>) {
        for n in 0..self.actors.len() {
            if self.actors[n].hidden || self.actors[n].id != TileId::TANK {
                continue;
            }
            self.actors[n].direction = self.actors[n].direction.back();
            let actor = self.actors[n];
            if actor.state & CS_SLIP != 0
                && actor.state & CS_SLIDE == 0
                && !spare_direction(&actor).is_nil()
                && actor.state & CS_SPONTANEOUS == 0
            {
                self.actors[n].direction = spare_direction(&actor).back();
            }
            if self.actors[n].state & CS_TURNING == 0 {
                self.actors[n].state |= CS_TURNING | CS_HASMOVED;
            }
            if Some(n) == invoking {
                continue;
            }
            if self.map[self.actors[n].pos].top.id.get_id() == TileId::TANK {
                self.ms_update_floor(n);
            } else if self.actors[n].state & CS_SPONTANEOUS != 0 {
                if self.actors[n].state & CS_TURNING != 0 {
                    self.actors[n].state &= !CS_TURNING;
                    self.ms_update_floor(n);
                    self.actors[n].state |= CS_TURNING;
                }
                self.actors[n].direction = self.actors[n].direction.back();
            }
        }
    }

    /// Flip-flops every toggle wall that still works.
    pub(crate) fn ms_toggle_walls(&mut self) {
        for pos in 0..MAP_CELLS {
            let cell = &mut self.map.cells[pos];
            for tile in [&mut cell.top, &mut cell.bottom] {
                if matches!(
                    tile.id,
                    TileId::SWITCHWALL_OPEN | TileId::SWITCHWALL_CLOSED
                ) && !tile.has_state(FS_BROKEN)
                {
                    tile.id = if tile.id == TileId::SWITCHWALL_OPEN {
                        TileId::SWITCHWALL_CLOSED
                    } else {
                        TileId::SWITCHWALL_OPEN
                    };
                }
            }
        }
    }

    pub(crate) fn ms_locate_trap_by_button(&self, button_pos: Position) -> Position {
        for conn in &self.trap_connections.0 {
            if conn.from == button_pos {
                return conn.to;
            }
        }
        POSITION_NULL
    }

    pub(crate) fn ms_locate_cloner_by_button(&self, button_pos: Position) -> Position {
        for conn in &self.cloner_connections.0 {
            if conn.from == button_pos {
                return conn.to;
            }
        }
        POSITION_NULL
    }

    /// A brown button reads as held down while anything covers it.
    pub(crate) fn ms_is_trap_button_down(&self, pos: Position) -> bool {
        in_bounds(pos) && self.map[pos].top.id != TileId::BUTTON_BROWN
    }

    /// Whether a bear trap is currently passable.
    pub(crate) fn ms_is_trap_open(&self, pos: Position, skip_pos: Position) -> bool {
        for conn in &self.trap_connections.0 {
            if conn.to == pos
                && conn.from != skip_pos
                && self.ms_is_trap_button_down(conn.from)
            {
                return true;
            }
        }
        false
    }

    /// Fires the cloner wired to the given red button.
    pub(crate) fn ms_activate_cloner(&mut self, button_pos: Position) {
        let pos = self.ms_locate_cloner_by_button(button_pos);
        if !in_bounds(pos) {
            return;
        }
        let tileid = self.map[pos].top.id;
        if !tileid.is_actor() || tileid.get_id() == TileId::CHIP {
            return;
        }
        if tileid.get_id() == TileId::BLOCK {
            if let Some(block) = self.ms_look_up_block(pos) {
                let dir = self.actors[block].direction;
                if !dir.is_nil() {
                    self.ms_advance_movement(block, dir);
                }
            }
        } else {
            if self.map[pos].bottom.has_state(FS_CLONING) {
                return;
            }
            let dummy = Actor {
                pos,
                id: tileid.get_id(),
                direction: tileid.get_dir(),
                ..Actor::default()
            };
            if !self.ms_can_make_move(dummy, dummy.direction, CMM_CLONECANTBLOCK) {
                return;
            }
            let Some(actor) = self.ms_awaken_creature(pos) else {
                return;
            };
            self.actors[actor].state |= CS_CLONING;
            if self.map[pos].bottom.id == TileId::CLONE_MACHINE {
                self.map[pos].bottom.add_state(FS_CLONING);
            }
        }
    }

    /// Opens a bear trap; any creature already in it is released.
    pub(crate) fn ms_spring_trap(&mut self, button_pos: Position) {
        let pos = self.ms_locate_trap_by_button(button_pos);
        if pos < 0 {
            return;
        }
        if pos as usize >= MAP_CELLS {
            log::warn!(
                "{}: off-map trap opening attempted: ({} {})",
                self.current_tick,
                pos_x(pos),
                pos_y(pos)
            );
            return;
        }
        let id = self.map[pos].top.id;
        if id == TileId::BLOCK_STATIC || self.map[pos].bottom.has_state(FS_HASMUTANT) {
            if let Some(block) = self.ms_look_up_block(pos) {
                self.actors[block].state |= CS_RELEASED;
            }
        } else if id.is_actor() {
            if let Some(actor) = self.ms_look_up_creature(pos, true) {
                self.actors[actor].state |= CS_RELEASED;
            }
        }
    }

    /// Clears every pending deferred button press.
    pub(crate) fn ms_reset_buttons(&mut self) {
        for pos in 0..MAP_CELLS {
            self.map.cells[pos].top.remove_state(FS_BUTTONDOWN);
            self.map.cells[pos].bottom.remove_state(FS_BUTTONDOWN);
        }
    }

    /// Applies the effects of all deferred button presses.
    pub(crate) fn ms_handle_buttons(&mut self) {
        for pos in 0..MAP_CELLS as Position {
            let id;
            if self.map[pos].top.has_state(FS_BUTTONDOWN) {
                self.map[pos].top.remove_state(FS_BUTTONDOWN);
                id = self.map[pos].top.id;
            } else if self.map[pos].bottom.has_state(FS_BUTTONDOWN) {
                self.map[pos].bottom.remove_state(FS_BUTTONDOWN);
                id = self.map[pos].bottom.id;
            } else {
                continue;
            }
            match id {
                TileId::BUTTON_BLUE => {
                    self.add_sfx(Sfx::ButtonPushed);
                    self.ms_turn_tanks(None);
                }
                TileId::BUTTON_GREEN => {
                    self.ms_toggle_walls();
                }
                TileId::BUTTON_RED => {
                    self.ms_activate_cloner(pos);
                    self.add_sfx(Sfx::ButtonPushed);
                }
                TileId::BUTTON_BROWN => {
                    self.ms_spring_trap(pos);
                    self.add_sfx(Sfx::ButtonPushed);
                }
                _ => {
                    log::warn!(
                        "{}: fooey! tile {:02X} is not a button",
                        self.current_tick,
                        id.byte()
                    );
                }
            }
        }
    }
}
