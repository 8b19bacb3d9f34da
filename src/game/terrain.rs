use crate::constants::*;
use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TerrainFlags: u8 {
        const NONE = 0;
        const WALL = 1;
        const SWAMP = 2;
    }
}

/// Flat terrain buffer for one room, one byte per tile.
#[derive(Clone)]
pub struct RoomTerrain {
    buffer: Vec<u8>,
}

impl Default for RoomTerrain {
    fn default() -> Self {
        RoomTerrain::open()
    }
}

impl RoomTerrain {
    pub fn new(buffer: Vec<u8>) -> RoomTerrain {
        assert_eq!(buffer.len(), ROOM_WIDTH as usize * ROOM_HEIGHT as usize);

        RoomTerrain { buffer }
    }

    /// All-plain terrain.
    pub fn open() -> RoomTerrain {
        RoomTerrain {
            buffer: vec![0; ROOM_WIDTH as usize * ROOM_HEIGHT as usize],
        }
    }

    pub fn get_xy(&self, x: u8, y: u8) -> TerrainFlags {
        let index = (y as usize * ROOM_WIDTH as usize) + x as usize;

        TerrainFlags::from_bits_truncate(self.buffer[index])
    }

    pub fn set_xy(&mut self, x: u8, y: u8, flags: TerrainFlags) {
        let index = (y as usize * ROOM_WIDTH as usize) + x as usize;

        self.buffer[index] = flags.bits();
    }

    pub fn is_wall(&self, x: u8, y: u8) -> bool {
        self.get_xy(x, y).contains(TerrainFlags::WALL)
    }

    pub fn is_swamp(&self, x: u8, y: u8) -> bool {
        self.get_xy(x, y).contains(TerrainFlags::SWAMP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_round_trip() {
        let mut terrain = RoomTerrain::open();

        terrain.set_xy(5, 6, TerrainFlags::WALL);
        terrain.set_xy(7, 7, TerrainFlags::SWAMP);

        assert!(terrain.is_wall(5, 6));
        assert!(!terrain.is_wall(6, 5));
        assert!(terrain.is_swamp(7, 7));
    }
}
