use crate::game::Level;

/// The ordered levels of a level set plus the one being played.
#[derive(Debug, Clone)]
pub struct Catalog {
    levels: Vec<Level>,
    current: usize,
}

impl Catalog {
    pub fn new(levels: Vec<Level>) -> Self {
        Catalog { levels, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Level> {
        self.levels.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Level> {
        self.levels.get_mut(self.current)
    }

    /// Make level `index` (0-indexed) the active one and start it over.
    /// Out of range leaves the selection unchanged.
    pub fn select(&mut self, index: usize) -> Option<&mut Level> {
        if index >= self.levels.len() {
            return None;
        }
        self.current = index;
        let level = &mut self.levels[index];
        level.reset();
        Some(level)
    }

    /// Start the active level over.
    pub fn reset_current(&mut self) -> Option<&mut Level> {
        self.select(self.current)
    }

    /// Move on to the next level, wrapping around after the last one.
    pub fn advance(&mut self) -> Option<&mut Level> {
        if self.levels.is_empty() {
            return None;
        }
        self.select((self.current + 1) % self.levels.len())
    }
}

impl From<Vec<Level>> for Catalog {
    fn from(levels: Vec<Level>) -> Self {
        Catalog::new(levels)
    }
}
