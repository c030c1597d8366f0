//! The six cube face directions plus their integer offsets, matching
//! `original_source/src/direction.h`'s `DIRECTION_*` enum and `DIRECTIONS`
//! offset table.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    Up = 4,
    Down = 5,
}

impl Direction {
    /// N, S, E, W in that order — the horizontal subset used by terrain
    /// neighbor checks and `World::set_block`'s face-boundary dirtying.
    pub const HORIZONTAL: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];

    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Integer offset: N=+Z, S=-Z, E=+X, W=-X, U=+Y, D=-Y.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, 0, 1),
            Direction::South => (0, 0, -1),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
            Direction::Up => (0, 1, 0),
            Direction::Down => (0, -1, 0),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_match_axis_conventions() {
        assert_eq!(Direction::North.offset(), (0, 0, 1));
        assert_eq!(Direction::East.offset(), (1, 0, 0));
        assert_eq!(Direction::Up.offset(), (0, 1, 0));
    }

    #[test]
    fn opposite_is_involutive() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }
}
