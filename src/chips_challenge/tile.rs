use crate::chips_challenge::prelude::*;

/// A tile identifier. The space is a closed taxonomy partitioned into
/// disjoint ranges: terrain, collectibles, actors and animations. Actor
/// tiles carry their facing in the low two bits, so this is a bit-packed
/// newtype rather than a closed Rust enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(u8);

impl TileId {
    pub const NOTHING: TileId = TileId(0x00);

    pub const EMPTY: TileId = TileId(0x01);

    pub const SLIDE_NORTH: TileId = TileId(0x02);
    pub const SLIDE_WEST: TileId = TileId(0x03);
    pub const SLIDE_SOUTH: TileId = TileId(0x04);
    pub const SLIDE_EAST: TileId = TileId(0x05);
    pub const SLIDE_RANDOM: TileId = TileId(0x06);
    pub const ICE: TileId = TileId(0x07);
    pub const ICEWALL_NORTHWEST: TileId = TileId(0x08);
    pub const ICEWALL_NORTHEAST: TileId = TileId(0x09);
    pub const ICEWALL_SOUTHWEST: TileId = TileId(0x0A);
    pub const ICEWALL_SOUTHEAST: TileId = TileId(0x0B);
    pub const GRAVEL: TileId = TileId(0x0C);
    pub const DIRT: TileId = TileId(0x0D);
    pub const WATER: TileId = TileId(0x0E);
    pub const FIRE: TileId = TileId(0x0F);
    pub const BOMB: TileId = TileId(0x10);
    pub const BEARTRAP: TileId = TileId(0x11);
    pub const BURGLAR: TileId = TileId(0x12);
    pub const HINT_BUTTON: TileId = TileId(0x13);

    pub const BUTTON_BLUE: TileId = TileId(0x14);
    pub const BUTTON_GREEN: TileId = TileId(0x15);
    pub const BUTTON_RED: TileId = TileId(0x16);
    pub const BUTTON_BROWN: TileId = TileId(0x17);
    pub const TELEPORT: TileId = TileId(0x18);

    pub const WALL: TileId = TileId(0x19);
    pub const WALL_NORTH: TileId = TileId(0x1A);
    pub const WALL_WEST: TileId = TileId(0x1B);
    pub const WALL_SOUTH: TileId = TileId(0x1C);
    pub const WALL_EAST: TileId = TileId(0x1D);
    pub const WALL_SOUTHEAST: TileId = TileId(0x1E);
    pub const HIDDENWALL_PERM: TileId = TileId(0x1F);
    pub const HIDDENWALL_TEMP: TileId = TileId(0x20);
    pub const BLUEWALL_REAL: TileId = TileId(0x21);
    pub const BLUEWALL_FAKE: TileId = TileId(0x22);
    pub const SWITCHWALL_OPEN: TileId = TileId(0x23);
    pub const SWITCHWALL_CLOSED: TileId = TileId(0x24);
    pub const POPUP_WALL: TileId = TileId(0x25);

    pub const CLONE_MACHINE: TileId = TileId(0x26);

    pub const DOOR_RED: TileId = TileId(0x27);
    pub const DOOR_BLUE: TileId = TileId(0x28);
    pub const DOOR_YELLOW: TileId = TileId(0x29);
    pub const DOOR_GREEN: TileId = TileId(0x2A);
    pub const SOCKET: TileId = TileId(0x2B);
    pub const EXIT: TileId = TileId(0x2C);

    pub const IC_CHIP: TileId = TileId(0x2D);
    pub const KEY_RED: TileId = TileId(0x2E);
    pub const KEY_BLUE: TileId = TileId(0x2F);
    pub const KEY_YELLOW: TileId = TileId(0x30);
    pub const KEY_GREEN: TileId = TileId(0x31);
    pub const BOOTS_ICE: TileId = TileId(0x32);
    pub const BOOTS_SLIDE: TileId = TileId(0x33);
    pub const BOOTS_FIRE: TileId = TileId(0x34);
    pub const BOOTS_WATER: TileId = TileId(0x35);

    pub const BLOCK_STATIC: TileId = TileId(0x36);

    pub const DROWNED_CHIP: TileId = TileId(0x37);
    pub const BURNED_CHIP: TileId = TileId(0x38);
    pub const BOMBED_CHIP: TileId = TileId(0x39);
    pub const EXITED_CHIP: TileId = TileId(0x3A);
    pub const EXIT_EXTRA_1: TileId = TileId(0x3B);
    pub const EXIT_EXTRA_2: TileId = TileId(0x3C);

    pub const OVERLAY_BUFFER: TileId = TileId(0x3D);

    pub const FLOOR_RESERVED2: TileId = TileId(0x3E);
    pub const FLOOR_RESERVED1: TileId = TileId(0x3F);

    pub const CHIP: TileId = TileId(0x40);

    pub const BLOCK: TileId = TileId(0x44);

    pub const TANK: TileId = TileId(0x48);
    pub const BALL: TileId = TileId(0x4C);
    pub const GLIDER: TileId = TileId(0x50);
    pub const FIREBALL: TileId = TileId(0x54);
    pub const WALKER: TileId = TileId(0x58);
    pub const BLOB: TileId = TileId(0x5C);
    pub const TEETH: TileId = TileId(0x60);
    pub const BUG: TileId = TileId(0x64);
    pub const PARAMECIUM: TileId = TileId(0x68);

    pub const SWIMMING_CHIP: TileId = TileId(0x6C);
    pub const PUSHING_CHIP: TileId = TileId(0x70);

    pub const ENTITY_RESERVED2: TileId = TileId(0x74);
    pub const ENTITY_RESERVED1: TileId = TileId(0x78);

    pub const WATER_SPLASH: TileId = TileId(0x7C);
    pub const BOMB_EXPLOSION: TileId = TileId(0x7D);
    pub const ENTITY_EXPLOSION: TileId = TileId(0x7E);
    pub const ANIMATION_RESERVED1: TileId = TileId(0x7F);

    pub const fn from_byte(byte: u8) -> TileId {
        TileId(byte)
    }

    pub const fn byte(self) -> u8 {
        self.0
    }

    pub fn is_slide(self) -> bool {
        self >= TileId::SLIDE_NORTH && self <= TileId::SLIDE_RANDOM
    }

    pub fn is_ice(self) -> bool {
        self >= TileId::ICE && self <= TileId::ICEWALL_SOUTHEAST
    }

    pub fn is_door(self) -> bool {
        self >= TileId::DOOR_RED && self <= TileId::DOOR_GREEN
    }

    pub fn is_key(self) -> bool {
        self >= TileId::KEY_RED && self <= TileId::KEY_GREEN
    }

    pub fn is_boots(self) -> bool {
        self >= TileId::BOOTS_ICE && self <= TileId::BOOTS_WATER
    }

    pub fn is_ms_special(self) -> bool {
        self >= TileId::DROWNED_CHIP && self <= TileId::OVERLAY_BUFFER
    }

    pub fn is_terrain(self) -> bool {
        self <= TileId::FLOOR_RESERVED1
    }

    pub fn is_actor(self) -> bool {
        self >= TileId::CHIP && self < TileId::WATER_SPLASH
    }

    pub fn is_animation(self) -> bool {
        self >= TileId::WATER_SPLASH && self <= TileId::ANIMATION_RESERVED1
    }

    /// An actor tile facing the given direction.
    pub fn with_dir(self, dir: Direction) -> TileId {
        TileId(self.0 | dir.to_idx())
    }

    /// The facing packed into an actor tile.
    pub fn get_dir(self) -> Direction {
        Direction::from_idx(self.0 & 3)
    }

    /// The actor tile stripped of its facing.
    pub fn get_id(self) -> TileId {
        TileId(self.0 & !3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips_challenge::prelude::*;

    #[test]
    fn actor_direction_packing() {
        for idx in 0..4u8 {
            let dir = Direction::from_idx(idx);
            let tile = TileId::GLIDER.with_dir(dir);
            assert_eq!(tile.get_dir(), dir);
            assert_eq!(tile.get_id(), TileId::GLIDER);
        }
    }

    #[test]
    fn range_predicates_are_disjoint() {
        for byte in 0x00..=0x7Fu8 {
            let tile = TileId::from_byte(byte);
            let actorish = tile.is_actor() as u8 + tile.is_animation() as u8;
            assert!(actorish <= 1);
            if tile.is_actor() || tile.is_animation() {
                assert!(!tile.is_terrain());
            }
        }
        assert!(TileId::SLIDE_RANDOM.is_slide());
        assert!(!TileId::ICE.is_slide());
        assert!(TileId::ICEWALL_SOUTHEAST.is_ice());
        assert!(TileId::BLOCK_STATIC.is_terrain());
        assert!(TileId::SWIMMING_CHIP.is_actor());
        assert!(TileId::WATER_SPLASH.is_animation());
        assert!(TileId::OVERLAY_BUFFER.is_ms_special());
    }
}
