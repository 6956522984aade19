use std::fmt;

use arrayvec::ArrayVec;
use thiserror::Error;
use tracing::debug;

use crate::bits::{Bitboard, Position};
use crate::game::{Direction, Level, MAX_SIZE, Symbol, Tile};

/// Smallest level that can hold a walled-in player.
const MIN_SIZE: usize = 3;

/// Why a block of level rows was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("level has no rows")]
    Empty,
    #[error(
        "level size {max_size} is outside the supported range {min}..={max}",
        min = MIN_SIZE,
        max = MAX_SIZE
    )]
    UnsupportedSize { max_size: usize },
    #[error("unrecognized character {ch:?} at row {row}, column {col}")]
    UnrecognizedTile { ch: char, row: usize, col: usize },
    #[error("level is {width}x{height}, larger than {max_size}x{max_size}")]
    TooLarge {
        width: usize,
        height: usize,
        max_size: usize,
    },
    #[error("level has {walls} peripheral walls, need {expected}")]
    NotEnclosed { walls: usize, expected: usize },
    #[error("level needs exactly one player start, found {count}")]
    PlayerCountError { count: usize },
    #[error("level has no open goal")]
    NoGoals,
    #[error("level has no box to move")]
    NoBoxes,
    #[error("level has {boxes} boxes for {goals} goals")]
    InsufficientBoxes { boxes: usize, goals: usize },
}

/// The static layer of a level: a square grid of walls, floors and goals,
/// stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, pos: Position) -> Tile {
        self.tiles[pos.index(self.size)]
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.get(pos) == Tile::Wall
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.size)
    }

    /// True if every cell of the outermost ring is a wall.
    pub fn is_enclosed(&self) -> bool {
        border_wall_count(self.size, |pos| self.get(pos) == Tile::Wall) == 4 * (self.size - 1)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row
                .iter()
                .map(|&tile| Symbol::compose(tile, false, false).to_char())
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Count walls on the border ring of a `size` x `size` grid, corners once.
fn border_wall_count(size: usize, is_wall: impl Fn(Position) -> bool) -> usize {
    let last = (size - 1) as u8;
    let mut count = 0;
    for i in 0..size as u8 {
        count += is_wall(Position::new(0, i)) as usize;
        count += is_wall(Position::new(last, i)) as usize;
    }
    for i in 1..last {
        count += is_wall(Position::new(i, 0)) as usize;
        count += is_wall(Position::new(i, last)) as usize;
    }
    count
}

/// Every position of a `size` x `size` grid in row-major order.
fn cells(size: usize) -> impl Iterator<Item = Position> {
    (0..size).flat_map(move |row| (0..size).map(move |col| Position::new(row as u8, col as u8)))
}

/// Mark every non-wall cell reachable from `start` by orthogonal steps.
/// Boxes do not block: only walls do.
fn flood_fill(symbols: &[Symbol], size: usize, start: Position) -> Bitboard {
    let mut reached = Bitboard::new();
    let mut stack: ArrayVec<Position, { MAX_SIZE * MAX_SIZE }> = ArrayVec::new();

    reached.set(start);
    stack.push(start);

    while let Some(pos) = stack.pop() {
        for dir in Direction::ALL {
            if let Some(next) = pos.step(dir, size) {
                // Each cell is pushed at most once, so the stack never
                // exceeds the number of cells.
                if symbols[next.index(size)] != Symbol::Wall && reached.set(next) {
                    stack.push(next);
                }
            }
        }
    }

    reached
}

/// Turn ragged level rows into a `max_size` x `max_size` level.
///
/// Rows are right-padded with walls to the widest row, then the block is
/// centered on the grid. An odd split puts the extra column on the right and
/// the extra row at the bottom. The padded grid must be fully walled in, have
/// exactly one player, at least one open goal and at least as many boxes as
/// goals. Cells the player cannot reach are turned into walls, and goals or
/// boxes on them are dropped.
pub fn normalize<S: AsRef<str>>(raw_rows: &[S], max_size: usize) -> Result<Level, NormalizeError> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&max_size) {
        return Err(NormalizeError::UnsupportedSize { max_size });
    }
    if raw_rows.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let mut rows: Vec<Vec<Symbol>> = Vec::with_capacity(raw_rows.len());
    for (row, line) in raw_rows.iter().enumerate() {
        let symbols = line
            .as_ref()
            .chars()
            .enumerate()
            .map(|(col, ch)| {
                Symbol::from_char(ch).ok_or(NormalizeError::UnrecognizedTile { ch, row, col })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(symbols);
    }

    let height = rows.len();
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    if width > max_size || height > max_size {
        return Err(NormalizeError::TooLarge {
            width,
            height,
            max_size,
        });
    }

    // Right-pad to the block width, then center the block. Everything not
    // covered by a row stays a wall.
    let left = (max_size - width) / 2;
    let top = (max_size - height) / 2;
    let mut symbols = vec![Symbol::Wall; max_size * max_size];
    for (r, row) in rows.iter().enumerate() {
        for (c, &symbol) in row.iter().enumerate() {
            symbols[(top + r) * max_size + left + c] = symbol;
        }
    }

    let walls = border_wall_count(max_size, |pos| symbols[pos.index(max_size)] == Symbol::Wall);
    let expected = 4 * (max_size - 1);
    if walls != expected {
        return Err(NormalizeError::NotEnclosed { walls, expected });
    }

    let players: Vec<Position> = cells(max_size)
        .filter(|pos| symbols[pos.index(max_size)].is_player())
        .collect();
    let player = match players.as_slice() {
        [player] => *player,
        _ => {
            return Err(NormalizeError::PlayerCountError {
                count: players.len(),
            });
        }
    };

    validate_counts(&symbols)?;

    let reached = flood_fill(&symbols, max_size, player);
    let mut pruned = 0;
    for pos in cells(max_size) {
        let cell = &mut symbols[pos.index(max_size)];
        if *cell != Symbol::Wall && !reached.get(pos) {
            *cell = Symbol::Wall;
            pruned += 1;
        }
    }
    if pruned > 0 {
        debug!(
            pruned,
            reachable = reached.count(),
            "pruned cells unreachable from the player start"
        );
        validate_counts(&symbols)?;
    }

    let goals: Vec<Position> = cells(max_size)
        .filter(|pos| symbols[pos.index(max_size)].is_goal())
        .collect();
    let boxes: Vec<Position> = cells(max_size)
        .filter(|pos| symbols[pos.index(max_size)].is_box())
        .collect();
    let board = Board {
        size: max_size,
        tiles: symbols.iter().map(|symbol| symbol.tile()).collect(),
    };
    debug_assert!(board.is_enclosed());

    Ok(Level::new(board, goals, player, boxes))
}

fn validate_counts(symbols: &[Symbol]) -> Result<(), NormalizeError> {
    if !symbols.iter().any(|s| s.is_open_goal()) {
        return Err(NormalizeError::NoGoals);
    }
    let goals = symbols.iter().filter(|s| s.is_goal()).count();
    let boxes = symbols.iter().filter(|s| s.is_box()).count();
    if boxes == 0 {
        return Err(NormalizeError::NoBoxes);
    }
    if boxes < goals {
        return Err(NormalizeError::InsufficientBoxes { boxes, goals });
    }
    Ok(())
}
