use super::*;
use crate::chips_challenge::prelude::*;

/// The directions this terrain refuses to let an actor leave in.
pub(crate) fn exit_impeding_directions(tile: TileId) -> Direction {
    match tile {
        TileId::WALL_NORTH => Direction::NORTH,
        TileId::WALL_WEST => Direction::WEST,
        TileId::WALL_SOUTH => Direction::SOUTH,
        TileId::WALL_EAST => Direction::EAST,
        TileId::WALL_SOUTHEAST => Direction::SOUTH | Direction::EAST,
        TileId::ICEWALL_NORTHWEST => Direction::SOUTH | Direction::EAST,
        TileId::ICEWALL_NORTHEAST => Direction::SOUTH | Direction::WEST,
        TileId::ICEWALL_SOUTHWEST => Direction::NORTH | Direction::EAST,
        TileId::ICEWALL_SOUTHEAST => Direction::NORTH | Direction::WEST,
        _ => Direction::NIL,
    }
}

impl Level {
    /// Whether this terrain blocks the given kind of actor from entering
    /// in the given direction.
    pub(crate) fn lx_impedes_move_into(
        &self,
        tile: TileId,
        actor_id: TileId,
        dir: Direction,
    ) -> bool {
        match tile {
            TileId::WALL
            | TileId::HIDDENWALL_PERM
            | TileId::SWITCHWALL_CLOSED
            | TileId::CLONE_MACHINE
            | TileId::BLOCK_STATIC
            | TileId::DROWNED_CHIP
            | TileId::BURNED_CHIP
            | TileId::EXITED_CHIP
            | TileId::EXIT_EXTRA_1
            | TileId::EXIT_EXTRA_2
            | TileId::OVERLAY_BUFFER
            | TileId::FLOOR_RESERVED2
            | TileId::FLOOR_RESERVED1 => true,

            TileId::GRAVEL => {
                actor_id != TileId::CHIP && actor_id != TileId::BLOCK
            }

            TileId::DIRT
            | TileId::BURGLAR
            | TileId::HINT_BUTTON
            | TileId::HIDDENWALL_TEMP
            | TileId::BLUEWALL_FAKE
            | TileId::BLUEWALL_REAL
            | TileId::POPUP_WALL
            | TileId::EXIT
            | TileId::IC_CHIP
            | TileId::KEY_YELLOW
            | TileId::KEY_GREEN
            | TileId::BOOTS_SLIDE
            | TileId::BOOTS_ICE
            | TileId::BOOTS_WATER
            | TileId::BOOTS_FIRE => actor_id != TileId::CHIP,

            TileId::SOCKET => actor_id != TileId::CHIP || self.chips_left > 0,

            TileId::DOOR_RED
            | TileId::DOOR_BLUE
            | TileId::DOOR_GREEN
            | TileId::DOOR_YELLOW => {
                actor_id != TileId::CHIP || !self.player_has_item(tile)
            }

            TileId::FIRE => {
                actor_id != TileId::CHIP
                    && actor_id != TileId::BLOCK
                    && actor_id != TileId::FIREBALL
            }

            TileId::ICEWALL_NORTHWEST => {
                !(dir & (Direction::SOUTH | Direction::EAST)).is_nil()
            }
            TileId::ICEWALL_NORTHEAST => {
                !(dir & (Direction::SOUTH | Direction::WEST)).is_nil()
            }
            TileId::ICEWALL_SOUTHWEST => {
                !(dir & (Direction::NORTH | Direction::EAST)).is_nil()
            }
            TileId::ICEWALL_SOUTHEAST | TileId::WALL_SOUTHEAST => {
                !(dir & (Direction::NORTH | Direction::WEST)).is_nil()
            }
            TileId::WALL_NORTH => dir == Direction::SOUTH,
            TileId::WALL_EAST => dir == Direction::EAST,
            TileId::WALL_SOUTH => dir == Direction::NORTH,
            TileId::WALL_WEST => dir == Direction::EAST,

            _ => false,
        }
    }

    /// Whether the actor could move one cell in the given direction right
    /// now. Animations may be cleared and blocks pushed along the way, as
    /// steered by `flags`.
    pub(crate) fn lx_check_collision(
        &mut self,
        actor: Actor,
        dir: Direction,
        flags: u32,
    ) -> bool {
        if actor.move_cooldown > 0 {
            return false;
        }
        let this_terrain = self.map[actor.pos].top.id;
        if !(exit_impeding_directions(this_terrain) & dir).is_nil() {
            return false;
        }
        if (this_terrain == TileId::BEARTRAP || this_terrain == TileId::CLONE_MACHINE)
            && flags & CMM_RELEASING == 0
        {
            return false;
        }
        // No doubling back against a force floor.
        if this_terrain.is_slide()
            && !(actor.id == TileId::CHIP && self.player_has_item(TileId::BOOTS_SLIDE))
            && self.lx_slide_forced_direction(this_terrain, false) == dir.back()
        {
            return false;
        }

        let mut x = pos_x(actor.pos);
        let mut y = pos_y(actor.pos);
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
        if x < 0 || x >= MAP_WIDTH as Position {
            return false;
        }
        if y < 0 || y >= MAP_HEIGHT as Position {
            if self.lx().pedantic_mode && flags & CMM_STARTMOVEMENT != 0 {
                self.lx_mut().map_breached = true;
            }
            return false;
        }
        let target = pos_from_xy(x, y);

        let mut new_terrain = self.map[target].top.id;
        if matches!(
            new_terrain,
            TileId::SWITCHWALL_CLOSED | TileId::SWITCHWALL_OPEN
        ) {
            new_terrain =
                TileId::from_byte(new_terrain.byte() ^ self.lx().toggle_walls_xor);
        }
        if self.lx_impedes_move_into(new_terrain, actor.id, dir) {
            return false;
        }

        if self.lx_has_animation(target) {
            if actor.id == TileId::CHIP {
                return false;
            }
            if flags & CMM_CLEARANIMATIONS != 0 {
                if let Some(anim) = self.lx_find_actor(target, FA_ANIMS) {
                    self.lx_erase_animation(anim);
                }
            }
        }
        if self.lx_has_claim(target) {
            if actor.id != TileId::CHIP {
                return false;
            }
            if let Some(other) = self.lx_find_actor(target, FA_NO_CHIP) {
                if self.actors[other].id == TileId::BLOCK
                    && !self.lx_can_be_pushed(other, dir, flags & !CMM_RELEASING)
                {
                    return false;
                }
            }
        }

        // Disguised walls reveal themselves only after the occupancy
        // checks.
        if actor.id == TileId::CHIP
            && matches!(new_terrain, TileId::HIDDENWALL_TEMP | TileId::BLUEWALL_REAL)
        {
            self.map[target].top.id = TileId::WALL;
            return false;
        }
        true
    }

    /// Whether the given block would yield to a push in the given
    /// direction, applying the push when the flags ask for it.
    pub(crate) fn lx_can_be_pushed(
        &mut self,
        idx: usize,
        dir: Direction,
        flags: u32,
    ) -> bool {
        if !self.lx_check_collision(self.actors[idx], dir, flags) {
            if !self.actors[idx].is_moving()
                && flags & (CMM_PUSHBLOCKS | CMM_PUSHBLOCKSNOW) != 0
            {
                self.actors[idx].direction = dir;
                if self.lx().pedantic_mode {
                    self.actors[idx].move_decision = dir;
                }
            }
            return false;
        }
        if flags & (CMM_PUSHBLOCKS | CMM_PUSHBLOCKSNOW) != 0 {
            self.actors[idx].direction = dir;
            self.actors[idx].move_decision = dir;
            self.actors[idx].state |= CS_PUSHED;
            if flags & CMM_PUSHBLOCKSNOW != 0 {
                self.lx_advance_movement(idx, false);
            }
        }
        true
    }
}
