/*
 *  A deterministic tick engine for a Chip's Challenge style puzzle game,
 *  covering the MS and Lynx rule variants.
 */

pub(crate) mod actor;
pub(crate) mod consts;
pub mod direction;
pub(crate) mod level;
pub(crate) mod lynx;
pub(crate) mod map;
pub(crate) mod ms;
pub mod position;
pub mod prng;
pub mod tile;

pub mod prelude {
    pub(crate) use crate::utils::prelude::*;

    pub use super::{
        actor::{Actor, ActorIndex, ACTOR_NONE},
        consts::*,
        direction::{Direction, GameInput, MOUSE_RANGE, MOUSE_RANGE_MAX, MOUSE_RANGE_MIN},
        level::{ConnList, Level, LevelSetup, RulesetState, TileConn, CONN_LIST_MAX},
        lynx::LxState,
        map::{Map, MapCell, MapTile},
        ms::{MsSlipper, MsState},
        position::{self, *},
        prng::Prng,
        tile::TileId,
    };
}
