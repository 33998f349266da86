use super::*;
use crate::chips_challenge::prelude::*;

/// Unpacks a Chip-relative mouse target into a map location.
fn chip_rel_position_to_absolute(chip_pos: Position, relpos: Position) -> Position {
    let x = relpos % MOUSE_RANGE + MOUSE_RANGE_MIN;
    let y = relpos / MOUSE_RANGE + MOUSE_RANGE_MIN;
    chip_pos + y * MAP_WIDTH as Position + x
}

impl Level {
    pub(crate) fn ms_has_mouse_goal(&self) -> bool {
        self.ms().mouse_goal >= 0
    }

    pub(crate) fn ms_cancel_mouse_goal(&mut self) {
        self.ms_mut().mouse_goal = POSITION_NULL;
    }

    /// Determines the move(s) a creature will make on the current tick.
    pub(crate) fn ms_choose_move(&mut self, idx: usize) {
        if self.actors[idx].id == TileId::CHIP {
            let discard = self.actors[idx].state & CS_SLIP != 0;
            self.ms_choose_move_chip(discard);
        } else if self.actors[idx].state & CS_SLIP != 0 {
            self.actors[idx].move_decision = Direction::NIL;
        } else {
            self.ms_choose_move_creature(idx);
        }
    }

    /// Enumerates a monster's ranked candidate directions and decides on
    /// the first one it could actually take. Also feeds the controller
    /// direction used by creatures sitting on cloners and traps.
    pub(crate) fn ms_choose_move_creature(&mut self, idx: usize) {
        let mut choices = [Direction::NIL; 4];

        self.actors[idx].move_decision = Direction::NIL;

        if self.actors[idx].hidden {
            return;
        }
        if self.actors[idx].id == TileId::BLOCK {
            return;
        }
        if self.current_tick & 2 != 0 {
            return;
        }
        if (self.actors[idx].id == TileId::TEETH || self.actors[idx].id == TileId::BLOB)
            && (self.current_tick + self.init_step_parity) & 4 != 0
        {
            return;
        }
        if self.actors[idx].state & CS_TURNING != 0 {
            self.actors[idx].state &= !(CS_TURNING | CS_HASMOVED);
            self.ms_update_floor(idx);
        }
        if self.actors[idx].state & CS_HASMOVED != 0 {
            // A stalled tank left standing on an open floor winks out.
            let pos = self.actors[idx].pos;
            let mut floor = self.map[pos].top.id;
            let over = floor.get_id();
            if floor.is_actor()
                && (over == TileId::CHIP || over == TileId::SWIMMING_CHIP)
            {
                floor = self.map[pos].bottom.id;
            }
            if !floor.is_actor()
                && !collision::ms_impedes_move_into(
                    floor,
                    self.actors[idx].id,
                    Direction::NIL,
                )
            {
                self.actors[idx].hidden = true;
            }
        }
        if self.actors[idx].state & CS_HASMOVED != 0 {
            self.ms_mut().controller_dir = Direction::NIL;
            return;
        }
        if self.actors[idx].state & (CS_SLIP | CS_SLIDE) != 0 {
            return;
        }

        let floor = self.ms_terrain(self.actors[idx].pos);
        let dir = self.actors[idx].direction;
        let mut pdir = dir;

        let species = self.actors[idx].id;
        if floor == TileId::CLONE_MACHINE || floor == TileId::BEARTRAP {
            match species {
                TileId::TANK
                | TileId::BALL
                | TileId::GLIDER
                | TileId::FIREBALL
                | TileId::WALKER => {
                    choices[0] = dir;
                }
                TileId::BLOB => {
                    choices = [dir, dir.left(), dir.back(), dir.right()];
                    self.prng.permute4(&mut choices);
                }
                TileId::BUG | TileId::PARAMECIUM | TileId::TEETH => {
                    let ctl = self.ms().controller_dir;
                    choices[0] = ctl;
                    self.actors[idx].move_decision = ctl;
                    return;
                }
                _ => {
                    log::warn!(
                        "{}: non-creature {:02X} at ({} {}) trying to move",
                        self.current_tick,
                        self.actors[idx].id.byte(),
                        pos_x(self.actors[idx].pos),
                        pos_y(self.actors[idx].pos)
                    );
                }
            }
        } else {
            match species {
                TileId::TANK => {
                    choices[0] = dir;
                }
                TileId::BALL => {
                    choices[0] = dir;
                    choices[1] = dir.back();
                }
                TileId::GLIDER => {
                    choices = [dir, dir.left(), dir.right(), dir.back()];
                }
                TileId::FIREBALL => {
                    choices = [dir, dir.right(), dir.left(), dir.back()];
                }
                TileId::WALKER => {
                    choices = [dir, dir.left(), dir.back(), dir.right()];
                    self.prng.permute3(&mut choices[1..]);
                }
                TileId::BLOB => {
                    choices = [dir, dir.left(), dir.back(), dir.right()];
                    self.prng.permute4(&mut choices);
                }
                TileId::BUG => {
                    choices = [dir.left(), dir, dir.right(), dir.back()];
                }
                TileId::PARAMECIUM => {
                    choices = [dir.right(), dir, dir.left(), dir.back()];
                }
                TileId::TEETH => {
                    let mut y = pos_y(self.actors[0].pos) - pos_y(self.actors[idx].pos);
                    let mut x = pos_x(self.actors[0].pos) - pos_x(self.actors[idx].pos);
                    let vert = if y < 0 {
                        Direction::NORTH
                    } else if y > 0 {
                        Direction::SOUTH
                    } else {
                        Direction::NIL
                    };
                    if y < 0 {
                        y = -y;
                    }
                    let horiz = if x < 0 {
                        Direction::WEST
                    } else if x > 0 {
                        Direction::EAST
                    } else {
                        Direction::NIL
                    };
                    if x < 0 {
                        x = -x;
                    }
                    if x > y {
                        choices[0] = horiz;
                        choices[1] = vert;
                    } else {
                        choices[0] = vert;
                        choices[1] = horiz;
                    }
                    choices[2] = choices[0];
                    pdir = choices[0];
                }
                _ => {
                    log::warn!(
                        "{}: non-creature {:02X} at ({} {}) trying to move",
                        self.current_tick,
                        self.actors[idx].id.byte(),
                        pos_x(self.actors[idx].pos),
                        pos_y(self.actors[idx].pos)
                    );
                }
            }
        }

        for n in 0..4 {
            if choices[n].is_nil() {
                break;
            }
            self.actors[idx].move_decision = choices[n];
            self.ms_mut().controller_dir = choices[n];
            if self.ms_can_make_move(self.actors[idx], choices[n], 0) {
                return;
            }
        }

        if self.actors[idx].id == TileId::TANK {
            if self.actors[idx].state & CS_RELEASED != 0 || floor != TileId::BEARTRAP {
                self.actors[idx].state |= CS_HASMOVED;
            }
            self.actors[idx].move_decision = Direction::NIL;
        } else {
            self.actors[idx].move_decision = pdir;
        }
    }

    /// Picks the direction that closes on the mouse goal, column-major or
    /// row-major by whichever axis is farther, preferring a passable one.
    fn ms_chip_mouse_direction(&mut self) -> Direction {
        if !self.ms_has_mouse_goal() {
            return Direction::NIL;
        }
        if self.ms().mouse_goal == self.actors[0].pos {
            self.ms_cancel_mouse_goal();
            return Direction::NIL;
        }

        let goal = self.ms().mouse_goal;
        let pos = self.actors[0].pos;
        let y = pos_y(goal) - pos_y(pos);
        let x = pos_x(goal) - pos_x(pos);
        let mut d1 = if y < 0 {
            Direction::NORTH
        } else if y > 0 {
            Direction::SOUTH
        } else {
            Direction::NIL
        };
        let mut d2 = if x < 0 {
            Direction::WEST
        } else if x > 0 {
            Direction::EAST
        } else {
            Direction::NIL
        };
        if x.abs() > y.abs() {
            std::mem::swap(&mut d1, &mut d2);
        }
        if !d1.is_nil() && !d2.is_nil() {
            if self.ms_can_make_move(self.actors[0], d1, 0) {
                d1
            } else {
                d2
            }
        } else if d2.is_nil() {
            d1
        } else {
            d2
        }
    }

    /// Determines Chip's next move from the player's input. When `discard`
    /// is set, Chip may not choose and the input is thrown away.
    pub(crate) fn ms_choose_move_chip(&mut self, discard: bool) {
        self.actors[0].move_decision = Direction::NIL;

        if self.actors[0].hidden {
            return;
        }

        if self.current_tick & 3 == 0 {
            self.actors[0].state &= !CS_HASMOVED;
        }
        if self.actors[0].state & CS_HASMOVED != 0 {
            if self.game_input != GameInput::NIL && self.ms_has_mouse_goal() {
                self.ms_cancel_mouse_goal();
            }
            return;
        }

        let mut input = self.game_input;
        if discard
            || (self.actors[0].state & CS_SLIDE != 0
                && input == GameInput::from_direction(self.actors[0].direction))
        {
            if self.current_tick != 0 && self.current_tick & 1 == 0 {
                self.ms_cancel_mouse_goal();
            }
            return;
        }

        if input.0 >= GameInput::ABS_MOUSE_MOVE_FIRST
            && input.0 <= GameInput::ABS_MOUSE_MOVE_LAST
        {
            self.ms_mut().mouse_goal =
                (input.0 - GameInput::ABS_MOUSE_MOVE_FIRST) as Position;
            input = GameInput::NIL;
        } else if input.0 >= GameInput::MOUSE_MOVE_FIRST
            && input.0 <= GameInput::MOUSE_MOVE_LAST
        {
            let rel = (input.0 - GameInput::MOUSE_MOVE_FIRST) as Position;
            self.ms_mut().mouse_goal =
                chip_rel_position_to_absolute(self.actors[0].pos, rel);
            input = GameInput::NIL;
        } else {
            // A diagonal keeps only its vertical component.
            let dir = input.direction();
            if dir.is_diagonal() {
                input = GameInput(
                    input.0 & (Direction::NORTH | Direction::SOUTH).bits() as u16,
                );
            }
        }

        let mut decision = input.direction();
        if input == GameInput::NIL
            && self.ms_has_mouse_goal()
            && self.current_tick & 3 == 2
        {
            decision = self.ms_chip_mouse_direction();
        }

        self.actors[0].move_decision = decision;
    }
}
