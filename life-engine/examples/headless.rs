// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Headless simulation run
//!
//! Builds a world from an optional TOML file (first argument), applies the
//! environment overrides, plays a few generations and prints what a renderer
//! would have drawn.
//!
//! Run with `RUST_LOG=debug cargo run --example headless` to see engine logs.

use life_engine::clock::{GameState, ManualTimer};
use life_engine::render::CollectingSink;
use life_engine::{LifeWorld, SimulationConfig};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    }
    .with_env_overrides()?;

    println!("Life Engine - Headless Run");
    println!("==========================\n");
    println!("{}", config.to_toml_string()?);

    let step_millis = (config.step_interval * 1000.0).ceil() as u64;
    let mut world = LifeWorld::with_timer(config, ManualTimer::new())?;
    println!(
        "Field of {} cells on {} worker threads",
        world.cell_count(),
        world.engine().thread_count()
    );

    world.set_game_state(GameState::Playing);
    world.update(Duration::ZERO)?;

    let mut sink = CollectingSink::new();
    for _ in 0..10 {
        world.clock_mut().timer_mut().advance(step_millis);
        world.update(Duration::from_millis(step_millis))?;

        let drawn = world.render(&mut sink);
        println!(
            "Generation {:>3}: {:>5} alive",
            world.engine().generation(),
            drawn
        );
    }

    world.set_game_state(GameState::Stopped);
    world.update(Duration::ZERO)?;
    println!("\nRendered {} frames", sink.frames());
    Ok(())
}
