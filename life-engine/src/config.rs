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
//! Simulation configuration
//!
//! Loaded from TOML; every key is optional. Only values that would make the
//! engine unable to run are rejected. Thresholds are taken as given, even
//! when they exceed the neighborhood size.
//!
//! ```toml
//! field_size = 8
//! birth_threshold = 3
//! death_threshold = 5
//! step_interval = 0.5
//!
//! [seed]
//! kind = "Random"
//! density = 0.2
//! seed = 42
//! ```

use crate::automaton::{Rules, SeedPattern};
use crate::error::ConfigError;
use crate::hardware;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`SimulationConfig::threads`]
pub const THREADS_ENV: &str = "LIFE_ENGINE_THREADS";

/// Environment variable overriding [`SimulationConfig::step_interval`]
pub const STEP_INTERVAL_ENV: &str = "LIFE_ENGINE_STEP_INTERVAL";

/// Tunable simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Interior edge length of the field
    pub field_size: usize,
    /// Live neighbors needed for a dead cell to be born
    pub birth_threshold: u32,
    /// Live neighbors at which a live cell dies
    pub death_threshold: u32,
    /// Live neighbors below which a live cell dies; 0 disables
    pub survival_floor: u32,
    /// Seconds of play time between generations
    pub step_interval: f32,
    /// Worker threads; detected from the hardware when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Edge length of one rendered cell, in world units
    pub cube_size: f32,
    /// Field contents on (re)start
    pub seed: SeedPattern,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            field_size: 6,
            birth_threshold: 3,
            death_threshold: 4,
            survival_floor: 0,
            step_interval: 5.0,
            threads: None,
            cube_size: 20.0,
            seed: SeedPattern::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Apply `LIFE_ENGINE_THREADS` and `LIFE_ENGINE_STEP_INTERVAL` if set
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(THREADS_ENV) {
            let threads = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::Invalid(format!("{THREADS_ENV}={raw:?}: {e}")))?;
            self.threads = Some(threads);
        }
        if let Some(raw) = lookup(STEP_INTERVAL_ENV) {
            self.step_interval = raw
                .trim()
                .parse::<f32>()
                .map_err(|e| ConfigError::Invalid(format!("{STEP_INTERVAL_ENV}={raw:?}: {e}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.field_size == 0 {
            return Err(ConfigError::Invalid("field_size must be at least 1".to_string()));
        }
        if !self.step_interval.is_finite() || self.step_interval < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "step_interval must be a finite, non-negative number of seconds, got {}",
                self.step_interval
            )));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".to_string()));
        }
        if let SeedPattern::Random { density, .. } = self.seed {
            if !(0.0..=1.0).contains(&density) {
                return Err(ConfigError::Invalid(format!(
                    "seed density must be within [0, 1], got {density}"
                )));
            }
        }
        Ok(())
    }

    /// Rules derived from the thresholds
    pub fn rules(&self) -> Rules {
        Rules::new(self.birth_threshold, self.death_threshold)
            .with_survival_floor(self.survival_floor)
    }

    /// Worker thread count, falling back to hardware detection
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(hardware::default_thread_count)
    }
}
