//! # LITHOS Server
//!
//! Headless world host: opens a world, streams the spawn area, applies a
//! demo edit and persists everything on exit.
//!
//! ## Usage
//!
//! ```bash
//! # Default configuration
//! ./lithos_server
//!
//! # Custom configuration
//! ./lithos_server world.toml
//! ```

use std::process::ExitCode;

use lithos::core::Tile;
use lithos::procedural::TileEdit;
use lithos::shared::{ChunkPosition, GlobalTilePosition, WorldConfig};
use lithos::{World, WorldResult};

fn load_config() -> WorldResult<WorldConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            println!("📄 Loading configuration from {path} ...");
            Ok(WorldConfig::from_toml_file(path)?)
        }
        None => {
            println!("📄 No configuration given, using defaults");
            Ok(WorldConfig::default())
        }
    }
}

fn run() -> WorldResult<()> {
    let config = load_config()?;
    println!("   World:    {}", config.world_name);
    println!("   Saves:    {}", config.world_dir().display());
    println!("   Chunks:   {} tiles", config.chunk_size);
    println!("   Light:    {:?}", config.light_model);
    println!();

    let world = World::open(config)?;
    println!("🌍 World open, seed {:#x}", world.seed().value());

    // === SPAWN AREA ===
    let spawn = ChunkPosition::ORIGIN;
    world.set_position(spawn);
    let area = spawn.neighborhood().count();
    let mut built = 0;
    let mut failed = 0;
    for _ in 0..area {
        let report = world.tick();
        built += usize::from(report.built.is_some());
        failed += usize::from(report.failed.is_some());
    }
    println!("🧱 Spawn area: {built} chunks built, {failed} failed");

    if let Some(render) = world.render(spawn) {
        let stats = &render.meshes.stats;
        println!(
            "   Spawn mesh: {} faces, {} welded vertices, {} smoothing moves",
            stats.faces, stats.welded_vertices, stats.smoothing_moves
        );
    }

    // === DEMO EDIT ===
    let size = world.config().chunk_size_i32();
    let lamp = GlobalTilePosition::new(size / 2, size / 2, size / 2);
    let affected = world.apply_edit(TileEdit::new(lamp, Tile::Lamp))?;
    println!("💡 Placed a lamp at {lamp:?}, {} chunks to rebuild", affected.len());
    for _ in 0..affected.len() {
        world.tick();
    }

    let stats = world.stats();
    println!();
    println!(
        "📊 Ticks: {}  Built: {}  Discarded: {}  Failed: {}  Edits: {}",
        stats.ticks, stats.built, stats.discarded, stats.failed, stats.edits
    );

    let written = world.shutdown()?;
    println!("💾 Flushed {written} chunks to disk");
    Ok(())
}

fn main() -> ExitCode {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    LITHOS SERVER v0.1.0");
    println!("                         HEADLESS MODE");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    match run() {
        Ok(()) => {
            println!("   ✓ Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("   ✗ FATAL: {error}");
            ExitCode::FAILURE
        }
    }
}
