use std::fmt;
use std::sync::Arc;

use crate::bits::Position;
use crate::board::Board;

/// Upper bound on the configurable level size.
pub const MAX_SIZE: usize = 64;

/// Level size used by the game when none is configured.
pub const DEFAULT_SIZE: usize = 16;

/// Static layer of a cell. Never changes after a level is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Goal,
}

/// One of the seven level-file symbols.
///
/// Symbols only exist at the text boundary: parsing splits them into a
/// static [`Tile`] plus player/box overlays, rendering folds them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Wall,
    Floor,
    Goal,
    Player,
    PlayerOnGoal,
    Box,
    BoxOnGoal,
}

impl Symbol {
    pub const ALL: [Symbol; 7] = [
        Symbol::Wall,
        Symbol::Floor,
        Symbol::Goal,
        Symbol::Player,
        Symbol::PlayerOnGoal,
        Symbol::Box,
        Symbol::BoxOnGoal,
    ];

    pub fn from_char(ch: char) -> Option<Symbol> {
        Symbol::ALL.into_iter().find(|symbol| symbol.to_char() == ch)
    }

    pub fn to_char(self) -> char {
        match self {
            Symbol::Wall => '#',
            Symbol::Floor => ' ',
            Symbol::Goal => '.',
            Symbol::Player => '@',
            Symbol::PlayerOnGoal => '+',
            Symbol::Box => '$',
            Symbol::BoxOnGoal => '*',
        }
    }

    /// Fold a static tile and its overlays into a symbol.
    /// The player wins over a box; walls carry no overlay.
    pub fn compose(tile: Tile, player: bool, has_box: bool) -> Symbol {
        match (tile, player, has_box) {
            (Tile::Wall, _, _) => Symbol::Wall,
            (Tile::Floor, true, _) => Symbol::Player,
            (Tile::Goal, true, _) => Symbol::PlayerOnGoal,
            (Tile::Floor, false, true) => Symbol::Box,
            (Tile::Goal, false, true) => Symbol::BoxOnGoal,
            (Tile::Floor, false, false) => Symbol::Floor,
            (Tile::Goal, false, false) => Symbol::Goal,
        }
    }

    pub fn tile(self) -> Tile {
        match self {
            Symbol::Wall => Tile::Wall,
            Symbol::Floor | Symbol::Player | Symbol::Box => Tile::Floor,
            Symbol::Goal | Symbol::PlayerOnGoal | Symbol::BoxOnGoal => Tile::Goal,
        }
    }

    pub fn is_player(self) -> bool {
        matches!(self, Symbol::Player | Symbol::PlayerOnGoal)
    }

    pub fn is_box(self) -> bool {
        matches!(self, Symbol::Box | Symbol::BoxOnGoal)
    }

    pub fn is_goal(self) -> bool {
        self.tile() == Tile::Goal
    }

    /// A goal without a box on it.
    pub fn is_open_goal(self) -> bool {
        matches!(self, Symbol::Goal | Symbol::PlayerOnGoal)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// (row, col) unit vector.
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    /// Parse a compass letter (`N`, `S`, `E`, `W`) or a LURD letter
    /// (`u`, `d`, `l`, `r`), case-insensitive.
    pub fn from_char(ch: char) -> Option<Direction> {
        match ch.to_ascii_lowercase() {
            'n' | 'u' => Some(Direction::North),
            's' | 'd' => Some(Direction::South),
            'e' | 'r' => Some(Direction::East),
            'w' | 'l' => Some(Direction::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "North"),
            Direction::South => write!(f, "South"),
            Direction::East => write!(f, "East"),
            Direction::West => write!(f, "West"),
        }
    }
}

/// What a single move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Wall ahead, or a box that cannot be pushed. Nothing changed.
    Blocked,
    /// The player stepped onto an empty cell.
    Walked,
    /// The player pushed the box with this index one cell ahead.
    Pushed { box_index: usize },
}

impl MoveOutcome {
    pub fn moved(self) -> bool {
        self != MoveOutcome::Blocked
    }
}

const NO_BOX: u16 = u16::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Boxes {
    positions: Vec<Position>,
    // Maps flat cell index to box index (NO_BOX = empty cell)
    index: Vec<u16>,
    size: usize,
}

impl Boxes {
    fn new(size: usize, positions: &[Position]) -> Self {
        let mut boxes = Boxes {
            positions: Vec::with_capacity(positions.len()),
            index: vec![NO_BOX; size * size],
            size,
        };
        for &pos in positions {
            boxes.add(pos);
        }
        boxes
    }

    fn add(&mut self, pos: Position) {
        assert!(
            self.positions.len() < NO_BOX as usize,
            "Cannot add box: too many boxes"
        );
        self.index[pos.index(self.size)] = self.positions.len() as u16;
        self.positions.push(pos);
    }

    fn move_box(&mut self, from: Position, to: Position) {
        let idx = self.index[from.index(self.size)];
        self.positions[idx as usize] = to;
        self.index[from.index(self.size)] = NO_BOX;
        self.index[to.index(self.size)] = idx;
    }

    fn box_at(&self, pos: Position) -> Option<usize> {
        match self.index[pos.index(self.size)] {
            NO_BOX => None,
            idx => Some(idx as usize),
        }
    }

    fn has_box_at(&self, pos: Position) -> bool {
        self.index[pos.index(self.size)] != NO_BOX
    }
}

/// A normalized level and its play state.
///
/// The static board is shared between clones. Only the player position and
/// the box positions change, and only through [`Level::step`] and
/// [`Level::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    board: Arc<Board>,
    goals: Vec<Position>,
    initial_player: Position,
    initial_boxes: Vec<Position>,
    source_line: Option<usize>,
    player: Position,
    boxes: Boxes,
}

impl Level {
    pub(crate) fn new(
        board: Board,
        goals: Vec<Position>,
        initial_player: Position,
        initial_boxes: Vec<Position>,
    ) -> Self {
        let boxes = Boxes::new(board.size(), &initial_boxes);
        Level {
            board: Arc::new(board),
            goals,
            initial_player,
            initial_boxes,
            source_line: None,
            player: initial_player,
            boxes,
        }
    }

    pub(crate) fn with_source_line(mut self, line: usize) -> Self {
        self.source_line = Some(line);
        self
    }

    /// Restart the level: the player and every box go back to where they
    /// started.
    pub fn reset(&mut self) {
        self.player = self.initial_player;
        self.boxes = Boxes::new(self.board.size(), &self.initial_boxes);
    }

    /// Move the player one cell, pushing a box if one is in the way.
    ///
    /// A push succeeds only when the cell beyond the box is neither a wall
    /// nor another box. A move either applies fully or not at all.
    pub fn step(&mut self, dir: Direction) -> MoveOutcome {
        let size = self.board.size();
        let Some(dest) = self.player.step(dir, size) else {
            return MoveOutcome::Blocked;
        };
        if self.board.is_wall(dest) {
            return MoveOutcome::Blocked;
        }

        match self.boxes.box_at(dest) {
            None => {
                self.player = dest;
                MoveOutcome::Walked
            }
            Some(box_index) => {
                let Some(beyond) = dest.step(dir, size) else {
                    return MoveOutcome::Blocked;
                };
                if self.board.is_wall(beyond) || self.boxes.has_box_at(beyond) {
                    return MoveOutcome::Blocked;
                }
                self.boxes.move_box(dest, beyond);
                self.player = dest;
                MoveOutcome::Pushed { box_index }
            }
        }
    }

    /// Returns true if the player's position changed.
    pub fn move_player(&mut self, dir: Direction) -> bool {
        self.step(dir).moved()
    }

    /// Every goal is covered by a box. Extra boxes may sit anywhere.
    pub fn is_complete(&self) -> bool {
        self.goals.iter().all(|&goal| self.boxes.has_box_at(goal))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn tile(&self, pos: Position) -> Tile {
        self.board.get(pos)
    }

    pub fn player(&self) -> Position {
        self.player
    }

    /// Current box positions, indexed by box identity.
    pub fn boxes(&self) -> &[Position] {
        &self.boxes.positions
    }

    /// Identity index of the box at `pos`, if any.
    pub fn box_at(&self, pos: Position) -> Option<usize> {
        self.boxes.box_at(pos)
    }

    pub fn goals(&self) -> &[Position] {
        &self.goals
    }

    pub fn initial_player(&self) -> Position {
        self.initial_player
    }

    pub fn initial_boxes(&self) -> &[Position] {
        &self.initial_boxes
    }

    /// Number of goals currently covered by a box.
    pub fn boxes_on_goals(&self) -> usize {
        self.goals
            .iter()
            .filter(|&&goal| self.boxes.has_box_at(goal))
            .count()
    }

    /// 1-indexed line of the level source where this level starts, when it
    /// was loaded from a level set.
    pub fn source_line(&self) -> Option<usize> {
        self.source_line
    }

    pub fn symbol_at(&self, pos: Position) -> Symbol {
        Symbol::compose(
            self.board.get(pos),
            pos == self.player,
            self.boxes.has_box_at(pos),
        )
    }

    /// Render the current state as rows of level-file symbols.
    pub fn to_rows(&self) -> Vec<String> {
        let size = self.board.size();
        (0..size)
            .map(|row| {
                (0..size)
                    .map(|col| self.symbol_at(Position::new(row as u8, col as u8)).to_char())
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_rows() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
