use super::*;
use crate::chips_challenge::prelude::*;

/// Whether a move by the given kind of actor into this tile is blocked,
/// before any occupant or inventory checks.
pub(crate) fn ms_impedes_move_into(
    tile: TileId,
    actor_id: TileId,
    dir: Direction,
) -> bool {
    match tile {
        TileId::NOTHING
        | TileId::WALL
        | TileId::HIDDENWALL_PERM
        | TileId::SWITCHWALL_CLOSED
        | TileId::CLONE_MACHINE
        | TileId::DROWNED_CHIP
        | TileId::BURNED_CHIP
        | TileId::BOMBED_CHIP
        | TileId::EXITED_CHIP
        | TileId::EXIT_EXTRA_1
        | TileId::EXIT_EXTRA_2
        | TileId::OVERLAY_BUFFER
        | TileId::FLOOR_RESERVED1
        | TileId::FLOOR_RESERVED2
        | TileId::WATER_SPLASH
        | TileId::BOMB_EXPLOSION
        | TileId::ENTITY_EXPLOSION => true,

        TileId::EMPTY
        | TileId::SLIDE_NORTH
        | TileId::SLIDE_WEST
        | TileId::SLIDE_SOUTH
        | TileId::SLIDE_EAST
        | TileId::SLIDE_RANDOM
        | TileId::ICE
        | TileId::WATER
        | TileId::FIRE
        | TileId::BOMB
        | TileId::BEARTRAP
        | TileId::HINT_BUTTON
        | TileId::BUTTON_BLUE
        | TileId::BUTTON_GREEN
        | TileId::BUTTON_RED
        | TileId::BUTTON_BROWN
        | TileId::TELEPORT
        | TileId::SWITCHWALL_OPEN
        | TileId::KEY_RED
        | TileId::KEY_BLUE
        | TileId::KEY_YELLOW
        | TileId::KEY_GREEN => false,

        TileId::GRAVEL
        | TileId::EXIT
        | TileId::BOOTS_ICE
        | TileId::BOOTS_SLIDE
        | TileId::BOOTS_FIRE
        | TileId::BOOTS_WATER => {
            actor_id != TileId::CHIP && actor_id != TileId::BLOCK
        }

        TileId::DIRT
        | TileId::BURGLAR
        | TileId::HIDDENWALL_TEMP
        | TileId::BLUEWALL_REAL
        | TileId::BLUEWALL_FAKE
        | TileId::POPUP_WALL
        | TileId::DOOR_RED
        | TileId::DOOR_BLUE
        | TileId::DOOR_YELLOW
        | TileId::DOOR_GREEN
        | TileId::SOCKET
        | TileId::IC_CHIP
        | TileId::BLOCK_STATIC => actor_id != TileId::CHIP,

        // Ice corners admit entry on exactly two edges. Checked with `!=`
        // because a nil direction can reach here during tank turns.
        TileId::ICEWALL_NORTHWEST => {
            dir != Direction::NORTH && dir != Direction::WEST
        }
        TileId::ICEWALL_NORTHEAST => {
            dir != Direction::NORTH && dir != Direction::EAST
        }
        TileId::ICEWALL_SOUTHWEST => {
            dir != Direction::SOUTH && dir != Direction::WEST
        }
        TileId::ICEWALL_SOUTHEAST | TileId::WALL_SOUTHEAST => {
            dir != Direction::SOUTH && dir != Direction::EAST
        }
        TileId::WALL_NORTH => {
            dir != Direction::NORTH
                && dir != Direction::EAST
                && dir != Direction::WEST
        }
        TileId::WALL_EAST => {
            dir != Direction::NORTH
                && dir != Direction::SOUTH
                && dir != Direction::WEST
        }
        TileId::WALL_SOUTH => {
            dir != Direction::SOUTH
                && dir != Direction::EAST
                && dir != Direction::WEST
        }
        TileId::WALL_WEST => {
            dir != Direction::NORTH
                && dir != Direction::SOUTH
                && dir != Direction::WEST
        }

        _ => false,
    }
}

impl Level {
    /// Whether the given creature may attempt a move in the given
    /// direction. Side effects can and do occur here, as steered by
    /// `flags`: walls may be exposed, and Chip may push blocks.
    pub(crate) fn ms_can_make_move(
        &mut self,
        actor: Actor,
        dir: Direction,
        flags: u32,
    ) -> bool {
        if dir.is_nil() {
            log::warn!("{}: collision check with a nil direction", self.current_tick);
        }

        let mut y = pos_y(actor.pos);
        let mut x = pos_x(actor.pos);
        y += match dir {
            Direction::NORTH => -1,
            Direction::SOUTH => 1,
            _ => 0,
        };
        x += match dir {
            Direction::WEST => -1,
            Direction::EAST => 1,
            _ => 0,
        };
        if y < 0 || y >= MAP_HEIGHT as Position || x < 0 || x >= MAP_WIDTH as Position {
            return false;
        }
        let to = pos_from_xy(x, y);

        if flags & CMM_NOLEAVECHECK == 0 {
            match self.map[actor.pos].bottom.id {
                TileId::WALL_NORTH if dir == Direction::NORTH => return false,
                TileId::WALL_WEST if dir == Direction::WEST => return false,
                TileId::WALL_SOUTH if dir == Direction::SOUTH => return false,
                TileId::WALL_EAST if dir == Direction::EAST => return false,
                TileId::WALL_SOUTHEAST
                    if !(dir & (Direction::SOUTH | Direction::EAST)).is_nil() =>
                {
                    return false;
                }
                TileId::BEARTRAP if actor.state & CS_RELEASED == 0 => {
                    return false;
                }
                _ => {}
            }
        }

        if actor.id == TileId::CHIP {
            let floor = self.ms_terrain(to);
            if ms_impedes_move_into(floor, actor.id, dir) {
                return false;
            }
            if floor == TileId::SOCKET && self.chips_left > 0 {
                return false;
            }
            if floor.is_door() && !self.player_has_item(floor) {
                return false;
            }
            let top = self.map[to].top.id;
            if top.is_actor() {
                let id = top.get_id();
                if id == TileId::CHIP
                    || id == TileId::SWIMMING_CHIP
                    || id == TileId::BLOCK
                {
                    return false;
                }
            }
            if floor == TileId::HIDDENWALL_TEMP || floor == TileId::BLUEWALL_REAL {
                if flags & CMM_NOEXPOSEWALLS == 0 {
                    self.ms_set_terrain(to, TileId::WALL);
                }
                return false;
            }
            if floor == TileId::BLOCK_STATIC {
                if !self.ms_push_block(to, dir, flags) {
                    return false;
                } else if flags & CMM_NOPUSHING != 0 {
                    return false;
                }
                if self.map[to].bottom.id == TileId::CLONE_MACHINE {
                    return false;
                }
                if flags & CMM_TELEPORTPUSH != 0
                    && self.ms_terrain(to) == TileId::BLOCK_STATIC
                {
                    return true;
                }
                return self.ms_can_make_move(actor, dir, flags | CMM_NOPUSHING);
            }
        } else if actor.id == TileId::BLOCK {
            let floor = self.map[to].top.id;
            if floor.is_actor() {
                let id = floor.get_id();
                return id == TileId::CHIP || id == TileId::SWIMMING_CHIP;
            }
            if ms_impedes_move_into(floor, actor.id, dir) {
                return false;
            }
        } else {
            let mut floor = self.map[to].top.id;
            if floor.is_actor() {
                let id = floor.get_id();
                if id == TileId::CHIP || id == TileId::SWIMMING_CHIP {
                    floor = self.map[to].bottom.id;
                    if floor.is_actor() {
                        let id = floor.get_id();
                        return id == TileId::CHIP || id == TileId::SWIMMING_CHIP;
                    }
                }
            }
            if floor.is_actor() {
                // A dormant clone template reads as an actor tile even
                // though no creature answers for it.
                let blocker = self.ms_look_up_creature(to, false);
                if flags & CMM_CLONECANTBLOCK == 0 {
                    return false;
                }
                let not_turning = blocker
                    .map_or(true, |b| self.actors[b].state & CS_TURNING == 0);
                if not_turning && floor == actor.id.with_dir(actor.direction) {
                    return true;
                }
                let Some(blocker) = blocker else {
                    return false;
                };
                return self.actors[blocker].direction == actor.direction;
            }
            if ms_impedes_move_into(floor, actor.id, dir) {
                return false;
            }
            if floor == TileId::FIRE
                && (actor.id == TileId::BUG || actor.id == TileId::WALKER)
                && flags & CMM_NOFIRECHECK == 0
            {
                return false;
            }
        }

        if self.map[to].bottom.id == TileId::CLONE_MACHINE {
            return false;
        }

        true
    }

    /// Moves the block at `pos` one cell in the given direction, if it can
    /// go. Buttons it lands on are deferred unless the flags say otherwise.
    pub(crate) fn ms_push_block(
        &mut self,
        pos: Position,
        dir: Direction,
        flags: u32,
    ) -> bool {
        let Some(cr) = self.ms_look_up_block(pos) else {
            log::warn!("{}: attempt to push disembodied block!", self.current_tick);
            return false;
        };
        let slipping = self.actors[cr].state & (CS_SLIP | CS_SLIDE) != 0;
        if slipping {
            let slipdir = self.ms_actor_slip_dir(cr);
            if dir == slipdir || dir == slipdir.back() {
                if flags & CMM_TELEPORTPUSH == 0 {
                    return false;
                }
            }
        }

        if flags & CMM_TELEPORTPUSH == 0
            && self.map[pos].bottom.id == TileId::BLOCK_STATIC
        {
            self.map[pos].bottom.id = TileId::EMPTY;
        }
        if flags & CMM_NODEFERBUTTONS == 0 {
            self.actors[cr].state |= CS_DEFERPUSH;
        }
        let advanced = self.ms_advance_movement(cr, dir);
        if flags & CMM_NODEFERBUTTONS == 0 {
            self.actors[cr].state &= !CS_DEFERPUSH;
        }
        if !advanced {
            self.actors[cr].state &= !(CS_SLIP | CS_SLIDE);
            if slipping {
                let v = self.ms().mscc_slippers.wrapping_sub(1);
                self.ms_mut().mscc_slippers = v;
                self.ms_remove_from_slip_list(cr);
            }
        }
        advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips_challenge::level::init::testutil::*;
    use crate::chips_challenge::prelude::*;

    fn empty_room() -> Level {
        sparse_metadata(&[(16, 16, B_CHIP_S)], 0, 0)
            .make_level(LevelSetup::new(RulesetId::Ms).with_seed(1))
            .unwrap()
    }

    #[test]
    fn every_species_can_move_on_open_floor() {
        let mut level = empty_room();
        let species = [
            TileId::TANK,
            TileId::BALL,
            TileId::GLIDER,
            TileId::FIREBALL,
            TileId::WALKER,
            TileId::BLOB,
            TileId::TEETH,
            TileId::BUG,
            TileId::PARAMECIUM,
        ];
        for id in species {
            for idx in 0..4u8 {
                let dir = Direction::from_idx(idx);
                let actor = Actor {
                    pos: at(10, 10),
                    id,
                    direction: dir,
                    ..Actor::default()
                };
                assert!(
                    level.ms_can_make_move(actor, dir, 0),
                    "{id:?} blocked moving {dir:?} on open floor"
                );
            }
        }
    }

    #[test]
    fn chip_cannot_enter_walls() {
        let mut level = sparse_metadata(
            &[
                (16, 16, B_CHIP_S),
                (16, 15, B_WALL),
                (15, 16, B_WALL),
                (17, 16, B_WALL),
                (16, 17, B_WALL),
            ],
            0,
            0,
        )
        .make_level(LevelSetup::new(RulesetId::Ms).with_seed(1))
        .unwrap();
        for idx in 0..4u8 {
            let dir = Direction::from_idx(idx);
            let chip = *level.chip();
            assert!(!level.ms_can_make_move(chip, dir, 0));
        }
    }

    #[test]
    fn the_map_edge_blocks_movement() {
        let mut level = empty_room();
        let actor = Actor {
            pos: at(0, 0),
            id: TileId::BALL,
            direction: Direction::NORTH,
            ..Actor::default()
        };
        assert!(!level.ms_can_make_move(actor, Direction::NORTH, 0));
        assert!(!level.ms_can_make_move(actor, Direction::WEST, 0));
        assert!(level.ms_can_make_move(actor, Direction::SOUTH, 0));
        assert!(level.ms_can_make_move(actor, Direction::EAST, 0));
    }

    #[test]
    fn ice_corners_admit_two_edges() {
        // Entry into a corner is allowed only while travelling along one
        // of its two wall directions.
        assert!(!ms_impedes_move_into(
            TileId::ICEWALL_NORTHWEST,
            TileId::CHIP,
            Direction::NORTH
        ));
        assert!(!ms_impedes_move_into(
            TileId::ICEWALL_NORTHWEST,
            TileId::CHIP,
            Direction::WEST
        ));
        assert!(ms_impedes_move_into(
            TileId::ICEWALL_NORTHWEST,
            TileId::CHIP,
            Direction::SOUTH
        ));
        assert!(!ms_impedes_move_into(
            TileId::ICEWALL_SOUTHEAST,
            TileId::CHIP,
            Direction::SOUTH
        ));
        assert!(ms_impedes_move_into(
            TileId::ICEWALL_SOUTHEAST,
            TileId::CHIP,
            Direction::WEST
        ));
    }

    #[test]
    fn hazards_gate_by_species() {
        assert!(ms_impedes_move_into(TileId::GRAVEL, TileId::TANK, Direction::EAST));
        assert!(!ms_impedes_move_into(TileId::GRAVEL, TileId::CHIP, Direction::EAST));
        assert!(!ms_impedes_move_into(TileId::GRAVEL, TileId::BLOCK, Direction::EAST));
        assert!(!ms_impedes_move_into(TileId::FIRE, TileId::FIREBALL, Direction::EAST));
        assert!(ms_impedes_move_into(TileId::DIRT, TileId::GLIDER, Direction::EAST));
        assert!(!ms_impedes_move_into(TileId::DIRT, TileId::CHIP, Direction::EAST));
    }
}
