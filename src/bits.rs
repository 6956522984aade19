use std::fmt;

use crate::game::{Direction, MAX_SIZE};

/// A (row, column) cell coordinate, 0-indexed with rows growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Position { row, col }
    }

    /// Step one cell in the given direction.
    /// Returns None if the new position would leave a `size` x `size` grid.
    pub fn step(self, dir: Direction, size: usize) -> Option<Position> {
        let (drow, dcol) = dir.delta();
        let row = self.row as i32 + drow as i32;
        let col = self.col as i32 + dcol as i32;

        if row >= 0 && col >= 0 && row < size as i32 && col < size as i32 {
            Some(Position::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Flat index into a row-major grid of the given size.
    pub fn index(self, size: usize) -> usize {
        self.row as usize * size + self.col as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Fixed-capacity visited set over a grid of at most `MAX_SIZE` x `MAX_SIZE`
/// cells: one u64 word per row, one bit per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitboard {
    rows: [u64; MAX_SIZE],
}

impl Bitboard {
    pub fn new() -> Self {
        Bitboard {
            rows: [0; MAX_SIZE],
        }
    }

    pub fn get(&self, pos: Position) -> bool {
        assert!(
            (pos.row as usize) < MAX_SIZE && (pos.col as usize) < MAX_SIZE,
            "position out of bounds"
        );
        (self.rows[pos.row as usize] & (1u64 << pos.col)) != 0
    }

    /// Mark `pos`. Returns true if it was not already marked.
    pub fn set(&mut self, pos: Position) -> bool {
        let was_set = self.get(pos);
        self.rows[pos.row as usize] |= 1u64 << pos.col;
        !was_set
    }

    /// Number of marked cells.
    pub fn count(&self) -> usize {
        self.rows.iter().map(|word| word.count_ones() as usize).sum()
    }
}

impl Default for Bitboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitboard_get_set() {
        let mut bb = Bitboard::new();
        assert!(!bb.get(Position::new(0, 0)));
        assert!(!bb.get(Position::new(63, 63)));

        assert!(bb.set(Position::new(5, 7)));
        assert!(bb.get(Position::new(5, 7)));
        assert!(!bb.get(Position::new(7, 5)));

        // Setting the same bit again reports it was already set
        assert!(!bb.set(Position::new(5, 7)));

        bb.set(Position::new(0, 0));
        bb.set(Position::new(63, 63));
        assert!(bb.get(Position::new(0, 0)));
        assert!(bb.get(Position::new(63, 63)));
    }

    #[test]
    fn test_bitboard_count() {
        let mut bb = Bitboard::new();
        assert_eq!(bb.count(), 0);

        bb.set(Position::new(1, 1));
        bb.set(Position::new(1, 2));
        bb.set(Position::new(40, 63));
        bb.set(Position::new(1, 2));
        assert_eq!(bb.count(), 3);
    }

    #[test]
    #[should_panic(expected = "position out of bounds")]
    fn test_bitboard_out_of_bounds() {
        let bb = Bitboard::new();
        bb.get(Position::new(64, 0));
    }

    #[test]
    fn test_position_step() {
        let pos = Position::new(3, 4);
        assert_eq!(pos.step(Direction::North, 8), Some(Position::new(2, 4)));
        assert_eq!(pos.step(Direction::South, 8), Some(Position::new(4, 4)));
        assert_eq!(pos.step(Direction::East, 8), Some(Position::new(3, 5)));
        assert_eq!(pos.step(Direction::West, 8), Some(Position::new(3, 3)));

        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Direction::North, 8), None);
        assert_eq!(corner.step(Direction::West, 8), None);

        let edge = Position::new(7, 7);
        assert_eq!(edge.step(Direction::South, 8), None);
        assert_eq!(edge.step(Direction::East, 8), None);
    }

    #[test]
    fn test_position_order_is_row_major() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
        assert_eq!(Position::new(2, 3).index(16), 35);
    }
}
