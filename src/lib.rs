//! Sokoban level loading and move simulation.
//!
//! A level set is plain text in the usual `#@$.+* ` notation. Each level is
//! normalized onto a fixed-size square grid, validated, and exposed as a
//! [`Level`] that accepts one directional move at a time.

pub mod bits;
pub mod board;
pub mod catalog;
pub mod game;
pub mod levels;

pub use bits::Position;
pub use board::{Board, NormalizeError, normalize};
pub use catalog::Catalog;
pub use game::{DEFAULT_SIZE, Direction, Level, MAX_SIZE, MoveOutcome, Symbol, Tile};
pub use levels::{LevelError, load_level_set, load_level_set_from_path, parse_level, read_level_set};
