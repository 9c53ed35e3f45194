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
//! Error types
//!
//! Contract violations inside the ECS are not errors: a missing component is
//! an `Option::None`, a broken precondition is a panic. The enums here cover
//! what a caller can actually react to: pool setup, failing jobs, grid access
//! and configuration loading.

use thiserror::Error;

/// Errors raised by the worker pool
#[derive(Error, Debug)]
pub enum PoolError {
    /// The OS refused to spawn a worker thread
    #[error("failed to spawn worker thread {index}: {source}")]
    Spawn {
        /// Index of the worker that could not be started
        index: usize,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// One or more jobs panicked since the last completion barrier
    #[error("{count} job(s) panicked, first: {first_message}")]
    JobsPanicked {
        /// Number of jobs that panicked
        count: usize,
        /// Panic payload of the first failing job
        first_message: String,
    },

    /// A job was submitted after shutdown
    #[error("thread pool is shut down")]
    ShutDown,
}

/// Errors raised when addressing cells of a [`Field`](crate::automaton::Field)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Coordinates fall outside the padded grid
    #[error("cell ({x}, {y}, {z}) is outside a field of size {size}")]
    OutOfBounds {
        /// X coordinate
        x: usize,
        /// Y coordinate
        y: usize,
        /// Z coordinate
        z: usize,
        /// Interior edge length
        size: usize,
    },

    /// Coordinates address the read-only halo shell
    #[error("cell ({x}, {y}, {z}) lies on the halo border")]
    Halo {
        /// X coordinate
        x: usize,
        /// Y coordinate
        y: usize,
        /// Z coordinate
        z: usize,
    },
}

/// Errors raised while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for this schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is structurally unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the type registration table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two distinct types claimed the same key
    #[error("type key {key} already registered to {existing}, cannot register {requested}")]
    KeyCollision {
        /// The contested key
        key: u32,
        /// Name of the type already holding the key
        existing: &'static str,
        /// Name of the type that tried to claim it
        requested: &'static str,
    },
}

/// Errors raised by the automaton engine and the world driving it
#[derive(Error, Debug)]
pub enum EngineError {
    /// The worker pool could not be brought up
    #[error("initialization failed: {0}")]
    Init(#[source] PoolError),

    /// A generation could not be completed; the previous one stays current
    #[error("generation {generation} failed: {source}")]
    Generation {
        /// Generation number that was being computed
        generation: u64,
        /// Cause reported by the pool
        #[source]
        source: PoolError,
    },

    /// Seeding addressed an invalid cell
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A system could not be registered
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
