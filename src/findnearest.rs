use crate::game::*;

/// Nearest-selection over arbitrary iterators. Path-based selection is the
/// authoritative tie-break for task targets; linear range is the cheap
/// approximation used where a full path query is not worth it.
pub trait FindNearest: Iterator + Sized {
    /// Closest item by actual path length, skipping unreachable items.
    fn find_nearest_path_by<F>(self, world: &World, start: Position, pos_of: F) -> Option<Self::Item>
    where
        F: Fn(&Self::Item) -> Position,
    {
        self.filter_map(|item| {
            world
                .path_len(start, pos_of(&item), 1)
                .map(|length| (length, item))
        })
        .min_by_key(|(length, _)| *length)
        .map(|(_, item)| item)
    }

    /// Closest item by straight-line range, same room only.
    fn find_nearest_linear_by<F>(self, start: Position, pos_of: F) -> Option<Self::Item>
    where
        F: Fn(&Self::Item) -> Position,
    {
        self.filter_map(|item| start.range_to(pos_of(&item)).map(|range| (range, item)))
            .min_by_key(|(range, _)| *range)
            .map(|(_, item)| item)
    }
}

impl<I: Iterator> FindNearest for I {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_selection_prefers_closest_and_skips_other_rooms() {
        let here = RoomName::new(0, 0);
        let start = Position::new(here, 10, 10);

        let candidates = vec![
            Position::new(here, 40, 40),
            Position::new(here, 12, 12),
            Position::new(RoomName::new(5, 5), 10, 11),
        ];

        let nearest = candidates.iter().find_nearest_linear_by(start, |p| **p).unwrap();

        assert_eq!(*nearest, Position::new(here, 12, 12));
    }

    #[test]
    fn path_selection_skips_unreachable_candidates() {
        let here = RoomName::new(0, 0);
        let mut terrain = RoomTerrain::open();

        // Seal off the right half of the room.
        for y in 0..50 {
            terrain.set_xy(30, y, TerrainFlags::WALL);
        }

        let mut world = World::new();
        world.add_room_with_terrain(here, terrain);

        let start = Position::new(here, 10, 10);
        let candidates = vec![Position::new(here, 40, 10), Position::new(here, 20, 10)];

        let nearest = candidates
            .iter()
            .find_nearest_path_by(&world, start, |p| **p)
            .unwrap();

        assert_eq!(*nearest, Position::new(here, 20, 10));
    }
}
