//! # Burrow Entry Point
//!
//! Generates dungeon floors from the command line and prints them either as an
//! ASCII map or as JSON.

use burrow::{BurrowError, BurrowResult, GenerationConfig, Grid, Level, TileType, WorldState};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

/// Command line arguments for the Burrow dungeon generator.
#[derive(Parser, Debug)]
#[command(name = "burrow")]
#[command(about = "BSP dungeon generator with A* pathfinding for roguelikes")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with generation settings; missing fields use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Floors to descend after the first one
    #[arg(short, long, default_value_t = 0)]
    floors: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the final level as JSON instead of drawing the map
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

/// Initializes the logging system; `RUST_LOG` takes precedence over the flag.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn load_config(args: &Args) -> BurrowResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn run(args: &Args) -> BurrowResult<()> {
    info!("Starting Burrow v{}", burrow::VERSION);

    let config = load_config(args)?;
    info!("Using seed {}", config.seed);

    let mut world = WorldState::new(config)?;
    world.reset()?;
    for _ in 0..args.floors {
        world.descend()?;
    }

    let level = world
        .level()
        .ok_or_else(|| BurrowError::InvalidState("no level was generated".to_string()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(level)?);
    } else {
        print!("{}", render_ascii(&world.grid, level));
    }

    Ok(())
}

/// Draws the grid with the spawn, stairs, pickups and monsters on top.
fn render_ascii(grid: &Grid, level: &Level) -> String {
    let mut rows: Vec<Vec<char>> = grid
        .tiles
        .iter()
        .map(|row| row.iter().map(|tile| tile_glyph(tile.tile_type)).collect())
        .collect();

    let mut stamp = |pos: burrow::Position, glyph: char| {
        if let Some(cell) = rows
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            *cell = glyph;
        }
    };

    for pickup in &level.pickups {
        stamp(pickup.position, '*');
    }
    for monster in &level.monsters {
        let glyph = monster.kind.name().chars().next().unwrap_or('m');
        stamp(monster.position, glyph.to_ascii_uppercase());
    }
    stamp(level.stairs, '%');
    stamp(level.player_spawn, '@');

    let mut out = String::with_capacity(rows.len() * (grid.width as usize + 1));
    for row in rows {
        out.extend(row);
        out.push('\n');
    }
    out
}

fn tile_glyph(tile_type: TileType) -> char {
    match tile_type {
        TileType::Void => ' ',
        TileType::Floor => '.',
        TileType::Path => '#',
        TileType::HTWall | TileType::HBWall => '-',
        TileType::VLWall | TileType::VRWall => '|',
        TileType::LTCorner | TileType::RTCorner | TileType::LBCorner | TileType::RBCorner => '-',
        TileType::TDoor | TileType::BDoor | TileType::LDoor | TileType::RDoor => '+',
    }
}
