//! Headless Cycles runner
//!
//! Usage: `prestige-cycles [run.ron]`. Logging follows `RUST_LOG`.

use prestige_core::Decimal;
use prestige_cycles::{CyclesGame, Result, RunConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    let mut game = CyclesGame::new(&config.engine)?;
    game.scheduler_mut().set_speed(config.speed);
    game.scheduler_mut().add_offline_time(config.offline_seconds);

    let ticks = config.ticks();
    for tick in 0..ticks {
        game.tick(config.step);
        if config.autoplay {
            autoplay(&game)?;
        }
        if game.has_won() {
            tracing::info!(tick, "game won");
            break;
        }
    }

    let layers = game.layers();
    println!("=== Cycles after {} ticks ===", game.scheduler().clock().tick);
    println!("  points:      {}", layers.main.points.value());
    println!("  cycles:      {}", layers.cycles.points.value());
    println!("  hypercycles: {}", layers.hypercycles.points.value());
    println!("  broken:      {}", layers.broken.points.value());
    println!("  won:         {}", game.has_won());
    for layer in game.registry().iter() {
        for (name, pipeline) in layer.pipelines() {
            println!("  {} {} = {}", layer.name(), name, pipeline.effect());
            for (label, value) in pipeline.describe() {
                println!("    {label}: {value}");
            }
        }
    }

    if let Some(path) = &config.save_path {
        game.snapshot().save(path)?;
        tracing::info!(path = %path.display(), "save written");
    }
    Ok(())
}

/// Buy what is affordable, work on Cycle of Difficulties, and prestige a
/// layer once doing so at least doubles it
fn autoplay(game: &CyclesGame) -> Result<()> {
    game.buy_all();

    let chal11 = &game.layers().cycles.chal11;
    if chal11.is_active() {
        chal11.complete();
    } else if !chal11.is_maxed() && game.layers().cycles.buy12.owned() >= Decimal::from(2) {
        chal11.enter();
    }

    for id in ["c", "hc", "bc"] {
        let Some(conversion) = game.registry().get(&id.into()).and_then(|l| l.conversion()) else {
            continue;
        };
        if conversion.current_gain() >= conversion.gain().value().max(1) {
            game.prestige(id)?;
        }
    }
    Ok(())
}
