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
//! # Life Engine
//!
//! A small simulation core: an ECS holding per-object state, a fixed-size
//! worker pool, and a three-dimensional "Game of Life" automaton whose
//! generations are split across that pool.
//!
//! ## Features
//!
//! - **ECS**: closed component set, compile-time type keys, systems with
//!   statically declared required components
//! - **Thread Pool**: FIFO job queue, quiescence barrier, panic reporting
//! - **Automaton**: padded `(N+2)³` grid, 14-cell neighborhood, color
//!   blending, ping-pong buffers
//! - **Parallelization**: optional Rayon path producing identical generations
//!
//! Windowing, rendering, audio and input live outside this crate; they talk
//! to it through [`render::RenderSink`] and [`clock::GameState`].
//!
//! ## Example
//!
//! ```rust
//! use life_engine::{LifeWorld, SimulationConfig};
//! use life_engine::render::CollectingSink;
//!
//! let config = SimulationConfig {
//!     field_size: 4,
//!     threads: Some(2),
//!     ..SimulationConfig::default()
//! };
//! let mut world = LifeWorld::new(config).unwrap();
//! world.step().unwrap();
//!
//! let mut sink = CollectingSink::new();
//! world.render(&mut sink);
//! assert_eq!(sink.cells().len(), world.engine().current().alive_count());
//! ```

#![warn(missing_docs)]

/// Three-dimensional cellular automaton
pub mod automaton;

/// Game state and step timing
pub mod clock;

/// Simulation configuration
pub mod config;

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Hardware concurrency detection
pub mod hardware;

/// Fixed-size worker thread pool
pub mod pool;

/// Rendering collaborator interface
pub mod render;

/// Simulation world tying everything together
pub mod world;

pub use automaton::{AutomatonEngine, Field, Rules};
pub use config::SimulationConfig;
pub use error::EngineError;
pub use pool::ThreadPool;
pub use world::LifeWorld;
