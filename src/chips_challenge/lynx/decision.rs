use super::*;
use crate::chips_challenge::prelude::*;

const CLOCKWISE_DIRECTIONS: [Direction; 4] = [
    Direction::NORTH,
    Direction::EAST,
    Direction::SOUTH,
    Direction::WEST,
];

/// The direction ice sends an actor that bonked while sliding.
pub(crate) fn ice_turned_dir(tile: TileId, dir: Direction) -> Direction {
    if tile == TileId::ICE {
        return dir.back();
    }
    let vert = if matches!(tile, TileId::ICEWALL_SOUTHWEST | TileId::ICEWALL_SOUTHEAST)
    {
        Direction::SOUTH
    } else {
        Direction::NORTH
    };
    let horiz = if matches!(tile, TileId::ICEWALL_SOUTHWEST | TileId::ICEWALL_NORTHWEST)
    {
        Direction::WEST
    } else {
        Direction::EAST
    };
    if dir == vert {
        return horiz.back();
    }
    if dir == horiz {
        return vert.back();
    }
    dir
}

impl Level {
    /// The direction a slide floor forces. The random slide floor rotates
    /// clockwise each time an actor consults it for a move.
    pub(crate) fn lx_slide_forced_direction(
        &mut self,
        tile: TileId,
        advance_rff: bool,
    ) -> Direction {
        match tile {
            TileId::SLIDE_NORTH => Direction::NORTH,
            TileId::SLIDE_WEST => Direction::WEST,
            TileId::SLIDE_SOUTH => Direction::SOUTH,
            TileId::SLIDE_EAST => Direction::EAST,
            TileId::SLIDE_RANDOM => {
                if advance_rff {
                    self.rff_dir = self.rff_dir.right();
                }
                self.rff_dir
            }
            _ => Direction::NIL,
        }
    }

    /// The move the terrain obliges this actor to take, if any: ice and
    /// slides carry it, and a completed teleport leaves one tick of
    /// inertia.
    pub(crate) fn lx_calculate_forced_move(&mut self, idx: usize) -> Direction {
        if self.current_tick == 0 {
            return Direction::NIL;
        }
        let terrain = self.map[self.actors[idx].pos].top.id;
        if terrain.is_ice() {
            if self.actors[idx].id == TileId::CHIP
                && (self.player_has_item(TileId::BOOTS_ICE) || self.lx().chip_stuck)
            {
                return Direction::NIL;
            }
            if self.actors[idx].direction.is_nil() {
                return Direction::NIL;
            }
            self.actors[idx].direction
        } else if terrain.is_slide() {
            if self.actors[idx].id == TileId::CHIP
                && self.player_has_item(TileId::BOOTS_SLIDE)
            {
                return Direction::NIL;
            }
            self.lx_slide_forced_direction(terrain, true)
        } else if self.actors[idx].state & CS_TELEPORTED != 0 {
            self.actors[idx].state &= !CS_TELEPORTED;
            self.actors[idx].direction
        } else {
            Direction::NIL
        }
    }

    /// Fills in a monster's ranked candidate directions. Returns true if
    /// the decision was settled outright instead.
    fn lx_checked_decision_dirs(
        &mut self,
        idx: usize,
        choices: &mut [Direction; 4],
    ) -> bool {
        let dir = self.actors[idx].direction;
        let species = self.actors[idx].id;
        match species {
            TileId::TANK => {
                choices[0] = dir;
            }
            TileId::BALL => {
                choices[0] = dir;
                choices[1] = dir.back();
            }
            TileId::GLIDER => {
                *choices = [dir, dir.left(), dir.right(), dir.back()];
            }
            TileId::FIREBALL => {
                *choices = [dir, dir.right(), dir.left(), dir.back()];
            }
            TileId::BUG => {
                *choices = [dir.left(), dir, dir.right(), dir.back()];
            }
            TileId::PARAMECIUM => {
                *choices = [dir.right(), dir, dir.left(), dir.back()];
            }
            TileId::WALKER => {
                if self.lx_check_collision(self.actors[idx], dir, CMM_CLEARANIMATIONS) {
                    self.actors[idx].move_decision = dir;
                    return true;
                }
                let mut checked = dir;
                let mut rotate_n = self.lx_byte_rng() & 3;
                while rotate_n > 0 {
                    checked = checked.right();
                    rotate_n -= 1;
                }
                choices[0] = checked;
            }
            TileId::BLOB => {
                choices[0] = CLOCKWISE_DIRECTIONS[self.prng.random4() as usize];
            }
            TileId::TEETH => {
                if (self.current_tick + self.init_step_parity) & 4 != 0 {
                    return false;
                }
                let chip_pos = self.actors[0].pos;
                let mut dx = pos_x(chip_pos) - pos_x(self.actors[idx].pos);
                let mut dy = pos_y(chip_pos) - pos_y(self.actors[idx].pos);
                let horiz = if dx < 0 {
                    Direction::WEST
                } else if dx > 0 {
                    Direction::EAST
                } else {
                    Direction::NIL
                };
                if dx < 0 {
                    dx = -dx;
                }
                let vert = if dy < 0 {
                    Direction::NORTH
                } else if dy > 0 {
                    Direction::SOUTH
                } else {
                    Direction::NIL
                };
                if dy < 0 {
                    dy = -dy;
                }
                if dx > dy {
                    choices[0] = horiz;
                    choices[1] = vert;
                    choices[2] = horiz;
                } else {
                    choices[0] = vert;
                    choices[1] = horiz;
                    choices[2] = vert;
                }
            }
            _ => {}
        }
        false
    }

    /// Decides Chip's move for the tick from the player's input, honoring
    /// forced moves unless a slide token lets them be overridden.
    fn lx_chip_decision(&mut self) {
        self.lx_mut().chip_pushing = false;
        self.actors[0].move_decision = Direction::NIL;

        let mut can_move = true;

        let move_dir = if self.game_input.is_directional() {
            self.game_input.direction()
        } else {
            Direction::NIL
        };
        if move_dir.is_nil() || self.lx().chip_stuck {
            can_move = false;
        }

        let terrain = self.map[self.actors[0].pos].top.id;
        let can_override =
            terrain.is_slide() && self.actors[0].state & CS_SLIDETOKEN != 0;
        let forced = forced_move(&self.actors[0]);
        if !forced.is_nil() && !can_override {
            can_move = false;
        }

        if !can_move {
            // Nothing to do.
        } else if !move_dir.is_diagonal() {
            // A plain cardinal is taken on faith; the collision check runs
            // for its side effects alone.
            self.lx_check_collision(self.actors[0], move_dir, CMM_PUSHBLOCKS);
            self.actors[0].move_decision = move_dir;
        } else if (self.actors[0].direction & move_dir).is_nil() {
            // A diagonal away from the current heading prefers horizontal
            // unless that side is blocked.
            let horiz = move_dir & (Direction::WEST | Direction::EAST);
            let vert = move_dir & (Direction::NORTH | Direction::SOUTH);
            let can_go_horiz =
                self.lx_check_collision(self.actors[0], horiz, CMM_PUSHBLOCKS);
            self.actors[0].move_decision = if can_go_horiz { horiz } else { vert };
        } else {
            // A diagonal containing the current heading keeps it, unless
            // only the other component is open.
            let current = self.actors[0].direction;
            let other = move_dir ^ current;
            let can_go_current =
                self.lx_check_collision(self.actors[0], current, CMM_PUSHBLOCKS);
            let can_go_other =
                self.lx_check_collision(self.actors[0], other, CMM_PUSHBLOCKS);
            self.actors[0].move_decision = if !can_go_current && can_go_other {
                other
            } else {
                current
            };
        }

        if self.actors[0].move_decision.is_nil() && forced.is_nil() {
            self.lx_stop_terrain_sfx();
        }
        // Predict the next position (flaws and all) for the collision
        // bookkeeping in the movement phase.
        if !self.actors[0].move_decision.is_nil() {
            self.lx_mut().chip_predicted_pos =
                neighbor(self.actors[0].pos, self.actors[0].move_decision);
        }
    }

    /// One actor's decision step: animations age, Chip consults the
    /// player, monsters consult their species.
    pub(crate) fn lx_do_decision(&mut self, idx: usize) {
        if self.actors[idx].id.is_animation() {
            self.actors[idx].animation_frame -= 1;
            if self.actors[idx].animation_frame < 0 {
                self.lx_erase_animation(idx);
            }
            return;
        }

        let forced = self.lx_calculate_forced_move(idx);
        set_forced_move(&mut self.actors[idx], forced);

        if idx == 0 {
            self.lx_chip_decision();
            return;
        }
        if self.actors[idx].id == TileId::BLOCK {
            return;
        }
        self.actors[idx].move_decision = Direction::NIL;
        if !forced.is_nil() {
            return;
        }

        let terrain = self.map[self.actors[idx].pos].top.id;
        if terrain == TileId::CLONE_MACHINE || terrain == TileId::BEARTRAP {
            self.actors[idx].move_decision = self.actors[idx].direction;
            return;
        }

        let mut choices = [Direction::NIL; 4];
        if self.lx_checked_decision_dirs(idx, &mut choices) {
            return;
        }
        for checked in choices {
            if checked.is_nil() {
                return;
            }
            self.actors[idx].move_decision = checked;
            if self.lx_check_collision(self.actors[idx], checked, CMM_CLEARANIMATIONS) {
                return;
            }
        }
    }
}
