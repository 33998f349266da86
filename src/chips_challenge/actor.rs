use crate::chips_challenge::prelude::*;

/// Index of an actor within a level's actor array.
pub type ActorIndex = u16;

/// Denotes "no actor".
pub const ACTOR_NONE: ActorIndex = u16::MAX;

/// A mobile entity: the player, a monster, a block, or (under Lynx) a
/// transient death animation. The `state` word is interpreted by the active
/// ruleset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub pos: Position,
    pub id: TileId,
    pub direction: Direction,
    pub move_cooldown: i8,
    pub animation_frame: i8,
    pub hidden: bool,
    pub state: u16,
    pub move_decision: Direction,
}

impl Default for Actor {
    fn default() -> Self {
        Actor {
            pos: POSITION_NULL,
            id: TileId::NOTHING,
            direction: Direction::NIL,
            move_cooldown: 0,
            animation_frame: 0,
            hidden: false,
            state: 0,
            move_decision: Direction::NIL,
        }
    }
}

impl Actor {
    /// Whether the actor is partway through a move (Lynx cooldown model).
    pub fn is_moving(&self) -> bool {
        self.move_cooldown > 0
    }
}
