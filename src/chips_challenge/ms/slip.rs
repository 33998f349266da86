use super::*;
use crate::chips_challenge::prelude::*;

/// The direction an actor leaves an ice-wall corner in, given the
/// direction it entered with.
pub(crate) fn ice_wall_turn_dir(floor: TileId, dir: Direction) -> Direction {
    match floor {
        TileId::ICEWALL_NORTHEAST => match dir {
            Direction::SOUTH => Direction::EAST,
            Direction::WEST => Direction::NORTH,
            _ => dir,
        },
        TileId::ICEWALL_SOUTHWEST => match dir {
            Direction::NORTH => Direction::WEST,
            Direction::EAST => Direction::SOUTH,
            _ => dir,
        },
        TileId::ICEWALL_NORTHWEST => match dir {
            Direction::SOUTH => Direction::WEST,
            Direction::EAST => Direction::NORTH,
            _ => dir,
        },
        TileId::ICEWALL_SOUTHEAST => match dir {
            Direction::NORTH => Direction::EAST,
            Direction::WEST => Direction::SOUTH,
            _ => dir,
        },
        _ => dir,
    }
}

impl Level {
    /// The direction a slide floor carries an actor in. A random slide
    /// floor draws a fresh direction on every query.
    pub(crate) fn ms_slide_dir(&mut self, floor: TileId) -> Direction {
        match floor {
            TileId::SLIDE_NORTH => Direction::NORTH,
            TileId::SLIDE_WEST => Direction::WEST,
            TileId::SLIDE_SOUTH => Direction::SOUTH,
            TileId::SLIDE_EAST => Direction::EAST,
            TileId::SLIDE_RANDOM => Direction::from_bits(1 << self.prng.random4()),
            _ => Direction::NIL,
        }
    }

    /// Appends to the slip list, or refreshes the direction of an actor
    /// already on it.
    pub(crate) fn ms_append_to_slip_list(&mut self, idx: usize, direction: Direction) {
        let actor = idx as ActorIndex;
        for entry in self.ms_mut().slip_list.iter_mut() {
            if entry.actor == actor {
                entry.direction = direction;
                return;
            }
        }
        self.ms_mut().slip_list.push(MsSlipper { actor, direction });
        let v = self.ms().mscc_slippers.wrapping_add(1);
        self.ms_mut().mscc_slippers = v;
    }

    /// Prepends to the slip list; Chip's forced moves resolve before the
    /// monsters'.
    pub(crate) fn ms_prepend_to_slip_list(&mut self, idx: usize, direction: Direction) {
        let actor = idx as ActorIndex;
        let state = self.ms_mut();
        if let Some(first) = state.slip_list.first_mut() {
            if first.actor == actor {
                first.direction = direction;
                return;
            }
        }
        state.slip_list.insert(0, MsSlipper { actor, direction });
    }

    pub(crate) fn ms_actor_slip_dir(&self, idx: usize) -> Direction {
        let actor = idx as ActorIndex;
        for entry in &self.ms().slip_list {
            if entry.actor == actor {
                return entry.direction;
            }
        }
        Direction::NIL
    }

    pub(crate) fn ms_remove_from_slip_list(&mut self, idx: usize) {
        let actor = idx as ActorIndex;
        let state = self.ms_mut();
        if let Some(found) = state.slip_list.iter().position(|e| e.actor == actor) {
            state.slip_list.remove(found);
        }
    }

    /// Puts the actor under forced motion for the floor it landed on.
    /// `fdir` carries a pre-decided direction; nil lets the floor decide.
    pub(crate) fn ms_start_floor_movement(
        &mut self,
        idx: usize,
        floor: TileId,
        fdir: Direction,
    ) {
        let mut dir = fdir;
        self.actors[idx].state &= !(CS_SLIP | CS_SLIDE);

        if floor.is_ice() {
            if fdir.is_nil() {
                dir = ice_wall_turn_dir(floor, self.actors[idx].direction);
            }
        } else if floor.is_slide() {
            dir = self.ms_slide_dir(floor);
        } else if floor == TileId::TELEPORT {
            if fdir.is_nil() {
                dir = self.actors[idx].direction;
            }
        } else if floor == TileId::BEARTRAP && self.actors[idx].id == TileId::BLOCK {
            dir = self.actors[idx].direction;
        } else if self.actors[idx].id != TileId::CHIP {
            return;
        } else {
            dir = self.actors[idx].direction;
        }

        if self.actors[idx].id == TileId::CHIP {
            self.actors[idx].state |=
                if floor.is_ice() || (floor == TileId::TELEPORT && !dir.is_nil()) {
                    CS_SLIP
                } else {
                    CS_SLIDE
                };
            self.ms_prepend_to_slip_list(idx, dir);
            self.actors[idx].direction = dir;
            self.ms_update_floor(idx);
        } else {
            self.actors[idx].state |= CS_SLIP;
            set_spare_direction(&mut self.actors[idx], Direction::NIL);
            self.ms_append_to_slip_list(idx, dir);
        }
    }

    pub(crate) fn ms_end_floor_movement(&mut self, idx: usize) {
        self.actors[idx].state &= !(CS_SLIP | CS_SLIDE);
        self.ms_remove_from_slip_list(idx);
    }

    /// Cleans deadwood entries out of the slip list.
    pub(crate) fn ms_update_sliplist(&mut self) {
        for n in (0..self.ms().slip_list.len()).rev() {
            let idx = self.ms().slip_list[n].actor as usize;
            if self.actors[idx].state & (CS_SLIP | CS_SLIDE) == 0 {
                self.ms_end_floor_movement(idx);
            }
        }
    }

    /// Chip's leg of the forced-movement pass. Chip observes his own slip
    /// direction rather than the monsters' controller direction, so the
    /// two passes are split.
    fn ms_chip_floor_movements(&mut self) {
        let mut n = 0;
        while n < self.ms().slip_list.len() {
            let entry = self.ms().slip_list[n];
            let a = entry.actor as usize;
            n += 1;
            if self.actors[a].state & (CS_SLIP | CS_SLIDE) == 0 {
                continue;
            }
            let mut slipdir = entry.direction;
            if slipdir.is_nil() && self.actors[a].id == TileId::CHIP {
                let pos = self.actors[a].pos;
                self.map[pos].top.id = TileId::CHIP.with_dir(Direction::NORTH);
            }
            if slipdir.is_nil() {
                continue;
            }
            if self.actors[a].id != TileId::CHIP {
                continue;
            }
            self.ms_mut().chip_last_slip_dir = slipdir;
            let advanced = self.ms_advance_movement(a, slipdir);
            if advanced {
                self.actors[a].state &= !CS_HASMOVED;
            } else {
                let floor = self.map[self.actors[a].pos].bottom.id;
                if floor.is_slide() {
                    self.actors[a].state &= !CS_HASMOVED;
                } else if floor.is_ice() {
                    slipdir = ice_wall_turn_dir(floor, slipdir.back());
                    self.ms_mut().chip_last_slip_dir = slipdir;
                    if self.ms_advance_movement(a, slipdir) {
                        self.actors[a].state &= !CS_HASMOVED;
                    }
                } else if floor == TileId::TELEPORT || floor == TileId::BLOCK_STATIC {
                    slipdir = slipdir.back();
                    self.ms_mut().chip_last_slip_dir = slipdir;
                    if self.ms_advance_movement(a, slipdir) {
                        self.actors[a].state &= !CS_HASMOVED;
                    }
                }
                if self.actors[a].state & (CS_SLIP | CS_SLIDE) != 0 {
                    self.ms_end_floor_movement(a);
                    let under = self.map[self.actors[a].pos].bottom.id;
                    self.ms_start_floor_movement(a, under, Direction::NIL);
                }
            }
            if self.ms_check_for_ending() != WinState::Playing {
                return;
            }
        }
    }

    /// The monsters' leg of the forced-movement pass. The slipper counter
    /// drives an advance counter that reproduces MSCC's processing order.
    fn ms_non_chip_floor_movements(&mut self) {
        let mut advance: i64 = 0;
        let mut n = 0;
        while n < self.ms().slip_list.len() {
            let old_slippers = self.ms().mscc_slippers;
            let entry = self.ms().slip_list[n];
            let a = entry.actor as usize;
            if self.actors[a].id == TileId::CHIP {
                n += 1;
                continue;
            }
            if advance != 0 {
                advance -= 1;
                n += 1;
                continue;
            }
            if self.actors[a].state & (CS_SLIP | CS_SLIDE) == 0 {
                n += 1;
                continue;
            }
            let mut slipdir = entry.direction;
            let origdir = slipdir;
            if slipdir.is_nil() {
                n += 1;
                continue;
            }
            set_spare_direction(&mut self.actors[a], entry.direction);
            let mut advanced = self.ms_advance_movement(a, slipdir);
            if !advanced {
                let floor = self.map[self.actors[a].pos].bottom.id;
                if floor.is_ice() {
                    slipdir = ice_wall_turn_dir(floor, slipdir.back());
                    advanced = self.ms_advance_movement(a, slipdir);
                }
                if self.actors[a].state & (CS_SLIP | CS_SLIDE) != 0 {
                    self.ms_end_floor_movement(a);
                    let v = self.ms().mscc_slippers.wrapping_sub(1);
                    self.ms_mut().mscc_slippers = v;
                    let under = self.map[self.actors[a].pos].bottom.id;
                    self.ms_start_floor_movement(
                        a,
                        under,
                        if advanced { Direction::NIL } else { origdir },
                    );
                }
            }
            if self.actors[a].state & CS_SLIP != 0 && advanced {
                self.actors[a].state |= CS_SLIDE;
            }
            set_spare_direction(&mut self.actors[a], Direction::NIL);
            if self.ms_check_for_ending() != WinState::Playing {
                return;
            }
            if self.ms().mscc_slippers == old_slippers {
                advance += 1;
            }
        }
    }

    /// Executes all forced moves for creatures on the slip list.
    pub(crate) fn ms_do_floor_movements(&mut self) {
        self.ms_chip_floor_movements();
        self.ms_update_sliplist();
        if self.ms_check_for_ending() == WinState::Playing {
            self.ms_non_chip_floor_movements();
        }
        if !self.level_complete && self.ms().chip_status == ChipStatus::Squished {
            self.ms_mut().chip_status = ChipStatus::SquishedDeath;
        }
    }
}
