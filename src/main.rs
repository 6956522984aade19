use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use sokobalt::{Catalog, DEFAULT_SIZE, Direction, Level, MoveOutcome, load_level_set_from_path};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sokobalt")]
#[command(about = "Load Sokoban level sets and replay moves", long_about = None)]
struct Args {
    /// Path to the level set file
    #[arg(value_name = "FILE")]
    levels_file: PathBuf,

    /// Level number to show or play (1-indexed); lists all levels if omitted
    #[arg(value_name = "LEVEL")]
    level: Option<usize>,

    /// Width and height every level is padded to
    #[arg(short = 's', long, default_value_t = DEFAULT_SIZE)]
    max_size: usize,

    /// Moves to replay, as N/S/E/W or LURD letters
    #[arg(short, long)]
    moves: Option<String>,

    /// Print the board after every move
    #[arg(short, long)]
    print_steps: bool,

    /// Log every accepted and rejected level
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_moves(text: &str) -> Result<Vec<Direction>> {
    text.chars()
        .enumerate()
        .filter(|(_, ch)| !ch.is_whitespace())
        .map(|(idx, ch)| {
            Direction::from_char(ch)
                .ok_or_else(|| anyhow!("invalid move {:?} at offset {}", ch, idx))
        })
        .collect()
}

fn list_levels(catalog: &Catalog) {
    for (idx, level) in catalog.iter().enumerate() {
        println!(
            "level: {:<3}  line: {:<5}  boxes: {:<3}  goals: {:<3}",
            idx + 1,
            level.source_line().unwrap_or(0),
            level.boxes().len(),
            level.goals().len()
        );
    }
    println!("---");
    println!("levels: {}", catalog.len());
}

fn replay(level: &mut Level, moves: &[Direction], print_steps: bool) {
    let mut walked = 0;
    let mut pushes = 0;
    let mut blocked = 0;

    for (count, &dir) in moves.iter().enumerate() {
        let outcome = level.step(dir);
        match outcome {
            MoveOutcome::Blocked => blocked += 1,
            MoveOutcome::Walked => walked += 1,
            MoveOutcome::Pushed { .. } => pushes += 1,
        }
        if print_steps {
            let what = match outcome {
                MoveOutcome::Blocked => "blocked".to_string(),
                MoveOutcome::Walked => "walk".to_string(),
                MoveOutcome::Pushed { box_index } => format!("push crate #{}", box_index + 1),
            };
            println!(
                "Move {} {} ({}/{}):\n{}",
                dir,
                what,
                count + 1,
                moves.len(),
                level
            );
        }
    }

    println!(
        "moves: {:<5}  pushes: {:<5}  blocked: {:<5}  complete: {}",
        walked + pushes,
        pushes,
        blocked,
        if level.is_complete() { 'Y' } else { 'N' }
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let levels = load_level_set_from_path(&args.levels_file, args.max_size);
    if levels.is_empty() {
        bail!("no playable levels in {}", args.levels_file.display());
    }
    let mut catalog = Catalog::from(levels);

    let Some(level_num) = args.level else {
        list_levels(&catalog);
        return Ok(());
    };

    if level_num == 0 {
        bail!("level numbers must be at least 1");
    }
    let total = catalog.len();
    let level = catalog.select(level_num - 1).with_context(|| {
        format!("level {} not found (file contains {} levels)", level_num, total)
    })?;

    match &args.moves {
        None => print!("{}", level),
        Some(text) => {
            let moves = parse_moves(text).context("could not parse --moves")?;
            println!("Starting position:\n{}", level);
            replay(level, &moves, args.print_steps);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moves() {
        let moves = parse_moves("NeS w\nuDlR").unwrap();
        assert_eq!(
            moves,
            vec![
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West,
                Direction::North,
                Direction::South,
                Direction::West,
                Direction::East,
            ]
        );
        assert!(parse_moves("").unwrap().is_empty());
        assert!(parse_moves("NX").is_err());
    }
}
