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
//! Three-dimensional cellular automaton
//!
//! This module provides:
//! - [`Field`]: the padded `(N+2)³` cell grid
//! - [`Rules`]: birth, death and survival thresholds over a 14-cell neighborhood
//! - [`AutomatonEngine`]: double-buffered stepping, split across the worker pool
//! - [`SeedPattern`]: initial contents

mod engine;
mod field;
pub mod rules;
mod seed;

pub use engine::AutomatonEngine;
pub use field::{CellRecord, Color, Field};
pub use rules::{partition, Rules, NEIGHBOR_OFFSETS};
pub use seed::{SeedCell, SeedPattern};
