use antsim_core::config::PlacementConfig;
use antsim_core::{Colony, ColonyConfig, FoodStore, SteeringMode};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Serialize)]
struct BenchRow {
    mode: SteeringMode,
    parallel: bool,
    ticks: u32,
    total_ms: f64,
    per_tick_us: f64,
    delivered: u64,
}

/// Scatter food uniformly so every configuration starts from the same plate.
fn scattered_food(config: &ColonyConfig, count: usize) -> FoodStore {
    let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
    let items: Vec<[f64; 2]> = (0..count)
        .map(|_| {
            [
                rng.random::<f64>() * config.width,
                rng.random::<f64>() * config.height,
            ]
        })
        .collect();
    FoodStore::with_items(items, config.width, config.height)
}

fn time_ticks(colony: &mut Colony, ticks: u32) -> Duration {
    let start = Instant::now();
    for _ in 0..ticks {
        colony.tick();
    }
    start.elapsed()
}

fn main() {
    let agent_count = 5_000;
    let ticks = 200;
    println!("Benchmarking {agent_count} agents for {ticks} ticks per configuration");

    let mut rows = Vec::new();
    for mode in [SteeringMode::Direct, SteeringMode::Trail] {
        for parallel in [false, true] {
            let mut config = ColonyConfig {
                width: 1920.0,
                height: 1080.0,
                agent_count,
                initial_mode: mode,
                parallel,
                seed: 42,
                ..ColonyConfig::default()
            };
            config.food.placement = PlacementConfig::Uniform;
            let food = scattered_food(&config, 500);
            let mut colony = match Colony::with_food(config, food) {
                Ok(colony) => colony,
                Err(e) => {
                    eprintln!("invalid benchmark config: {e}");
                    return;
                }
            };

            let elapsed = time_ticks(&mut colony, ticks);
            println!(
                "{mode:?} parallel={parallel}: {elapsed:?} total, {:?} per tick",
                elapsed / ticks
            );
            rows.push(BenchRow {
                mode,
                parallel,
                ticks,
                total_ms: elapsed.as_secs_f64() * 1e3,
                per_tick_us: elapsed.as_secs_f64() * 1e6 / ticks as f64,
                delivered: colony.total_delivered(),
            });
        }
    }

    match serde_json::to_string_pretty(&rows) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to encode results: {e}"),
    }
}
