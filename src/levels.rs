use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{NormalizeError, normalize};
use crate::game::{Level, Symbol};

/// Error type for reading a level set.
#[derive(Debug, Error)]
pub enum LevelError {
    /// IO error when reading from file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A tile row starts with one of the seven level symbols, a space
/// included. Anything else (empty lines, labels, `;` comments) ends the
/// current block.
fn is_tile_row(line: &str) -> bool {
    line.chars().next().and_then(Symbol::from_char).is_some()
}

/// A run of tile rows and the 1-indexed line it starts on.
struct Block<'a> {
    line: usize,
    rows: Vec<&'a str>,
}

/// Parse every level in `source`, keeping the ones that normalize.
///
/// Broken levels are logged and skipped; this never fails.
pub fn load_level_set(source: &str, max_size: usize) -> Vec<Level> {
    let mut levels = Vec::new();
    let mut rejected = 0;
    let mut block_index = 0;
    let mut current: Option<Block> = None;

    let mut flush = |block: Block| {
        match normalize(&block.rows, max_size) {
            Ok(level) => {
                debug!(
                    block = block_index,
                    line = block.line,
                    player = %level.player(),
                    goals = level.goals().len(),
                    boxes = level.boxes().len(),
                    "loaded level"
                );
                levels.push(level.with_source_line(block.line));
            }
            Err(err) => {
                warn!(
                    block = block_index,
                    line = block.line,
                    error = %err,
                    "dropping malformed level"
                );
                rejected += 1;
            }
        }
        block_index += 1;
    };

    // `lines` strips both "\n" and "\r\n" endings
    for (idx, line) in source.lines().enumerate() {
        if is_tile_row(line) {
            current
                .get_or_insert_with(|| Block {
                    line: idx + 1,
                    rows: Vec::new(),
                })
                .rows
                .push(line);
        } else if let Some(block) = current.take() {
            flush(block);
        }
    }
    if let Some(block) = current.take() {
        flush(block);
    }

    info!(loaded = levels.len(), rejected, "loaded level set");
    levels
}

/// Read and parse a level set file, surfacing IO errors.
pub fn read_level_set(path: impl AsRef<Path>, max_size: usize) -> Result<Vec<Level>, LevelError> {
    let contents = fs::read_to_string(path)?;
    Ok(load_level_set(&contents, max_size))
}

/// Read and parse a level set file. An unreadable file yields no levels.
pub fn load_level_set_from_path(path: impl AsRef<Path>, max_size: usize) -> Vec<Level> {
    let path = path.as_ref();
    match read_level_set(path, max_size) {
        Ok(levels) => levels,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read level set");
            Vec::new()
        }
    }
}

/// Parse a single block of tile rows given as one string.
pub fn parse_level(text: &str, max_size: usize) -> Result<Level, NormalizeError> {
    let rows: Vec<&str> = text.lines().collect();
    normalize(&rows, max_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Position;
    use crate::game::DEFAULT_SIZE;

    #[test]
    fn test_load_basic() {
        let level1 = "####
# .#
#  ###
#*@  #
#  $ #
#  ###
####";

        let level2 = "######
#    #
# #@ #
# $* #
# .* #
#    #
######";

        let level3 = "  ####
###  ####
#     $ #
# #  #$ #
# . .#@ #
#########";

        let xsb_content = format!(
            "; 1\n\n{}\n\n; 2\n\n{}\n\n; 3\n\n{}\n",
            level1, level2, level3
        );

        let levels = load_level_set(&xsb_content, DEFAULT_SIZE);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].source_line(), Some(3));
        assert_eq!(levels[1].source_line(), Some(13));
        assert_eq!(levels[2].source_line(), Some(23));
        for level in &levels {
            assert_eq!(level.size(), DEFAULT_SIZE);
            assert!(!level.is_complete());
        }
        assert_eq!(levels[1].boxes().len(), 3);
        assert_eq!(levels[1].goals().len(), 3);
    }

    #[test]
    fn test_labels_delimit_levels() {
        let source = "level 1\n#####\n#@$.#\n#####\r\nlevel 2\n#####\n#+ $#\n#$.*#\n#####";
        let levels = load_level_set(source, DEFAULT_SIZE);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].player(), Position::new(7, 6));
        assert_eq!(levels[1].goals().len(), 3);
        assert_eq!(levels[1].source_line(), Some(6));
    }

    #[test]
    fn test_adjacent_blocks_without_blank_line() {
        // "Maze" does not start with a tile symbol, so it splits the blocks
        let source = "#####\n#@$.#\n#####\nMaze\n#####\n#@$.#\n#####";
        assert_eq!(load_level_set(source, DEFAULT_SIZE).len(), 2);
    }

    #[test]
    fn test_leading_space_rows_stay_in_block() {
        let source = "  ###\n###.###\n#@ $  #\n#######\n";
        let levels = load_level_set(source, DEFAULT_SIZE);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].goals().len(), 1);
    }

    #[test]
    fn test_blank_floor_row_stays_in_block() {
        let rows = ["#####", "#@$.#", "   ", "#####"];
        let expected = normalize(&rows, DEFAULT_SIZE).unwrap();

        let levels = load_level_set(&rows.join("\n"), DEFAULT_SIZE);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].player(), Position::new(7, 6));
        assert_eq!(levels[0].player(), expected.player());
        assert_eq!(levels[0].boxes(), expected.boxes());
        assert_eq!(levels[0].board(), expected.board());

        // Only a genuinely empty line splits the two levels
        let source = "#####\n#@$.#\n#####\n\n#####\n#@$.#\n#####\n";
        assert_eq!(load_level_set(source, DEFAULT_SIZE).len(), 2);
    }

    #[test]
    fn test_malformed_level_is_skipped() {
        // Level 2 has no player start
        let source = "; 1\n#####\n#@$.#\n#####\n\n; 2\n#####\n# $.#\n#####\n";
        let levels = load_level_set(source, DEFAULT_SIZE);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].source_line(), Some(2));

        // A broken level in the middle does not stop the rest
        let source = "#####\n#@$.#\n#####\n\n####\n#@@#\n####\n\n#####\n#@$.#\n#####";
        let levels = load_level_set(source, DEFAULT_SIZE);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].source_line(), Some(9));
    }

    #[test]
    fn test_empty_source() {
        assert!(load_level_set("", DEFAULT_SIZE).is_empty());
        assert!(load_level_set("; just a comment\n\n", DEFAULT_SIZE).is_empty());
    }

    #[test]
    fn test_max_size_applies_to_every_block() {
        let source = "#####\n#@$.#\n#####\n\n#########\n#@$.    #\n#########";
        assert_eq!(load_level_set(source, 8).len(), 1);
        assert_eq!(load_level_set(source, 9).len(), 2);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("sokobalt-levels-{}.txt", std::process::id()));
        fs::write(
            &path,
            "level 1\n#####\n#@$.#\n#####\n\nlevel 2\n#####\n# $.#\n#####\n",
        )
        .unwrap();

        let levels = read_level_set(&path, DEFAULT_SIZE).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(load_level_set_from_path(&path, DEFAULT_SIZE).len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_file_no_file() {
        let result = read_level_set("nonexistent_file.txt", DEFAULT_SIZE);
        assert!(matches!(result.unwrap_err(), LevelError::Io(_)));
        assert!(load_level_set_from_path("nonexistent_file.txt", DEFAULT_SIZE).is_empty());
    }

    #[test]
    fn test_parse_level() {
        let level = parse_level("#####\n#@$.#\n#####", 5).unwrap();
        assert_eq!(level.player(), Position::new(2, 1));
        assert_eq!(
            parse_level("#####\n#@$x#\n#####", 5).unwrap_err(),
            NormalizeError::UnrecognizedTile {
                ch: 'x',
                row: 1,
                col: 3
            }
        );
    }
}
