use crate::chips_challenge::prelude::*;

/// A linear cell offset on the 32x32 grid: `pos = y * 32 + x`.
pub type Position = i16;

/// Denotes "no position".
pub const POSITION_NULL: Position = -1;

/// The cell adjacent to `pos` in the given direction. The arithmetic does
/// not prevent row wrap; callers must bounds-check x and y themselves.
pub fn neighbor(pos: Position, dir: Direction) -> Position {
    pos + direction_offset(dir)
}

fn direction_offset(dir: Direction) -> Position {
    match dir {
        Direction::NORTH => -(MAP_WIDTH as Position),
        Direction::WEST => -1,
        Direction::SOUTH => MAP_WIDTH as Position,
        Direction::EAST => 1,
        _ => 0,
    }
}

pub fn pos_x(pos: Position) -> Position {
    pos % MAP_WIDTH as Position
}

pub fn pos_y(pos: Position) -> Position {
    pos / MAP_WIDTH as Position
}

pub fn pos_from_xy(x: Position, y: Position) -> Position {
    y * MAP_WIDTH as Position + x
}

pub fn in_bounds(pos: Position) -> bool {
    pos >= 0 && (pos as usize) < MAP_CELLS
}
