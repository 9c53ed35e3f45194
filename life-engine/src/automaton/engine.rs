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
//! Generation stepping
//!
//! The engine keeps two fields. The current one sits behind an [`Arc`] so
//! every band job can read it; the next one is split into bands of x-planes
//! whose storage is moved into the jobs and sent back over a channel once
//! computed. After the pool's completion barrier the planes are put back and
//! the two fields trade places. No cell is ever written by two jobs, and no
//! job ever writes the field it reads.

use crate::automaton::field::{CellRecord, Field};
use crate::automaton::rules::{self, Rules};
use crate::automaton::seed::SeedPattern;
use crate::error::{EngineError, FieldError};
use crate::pool::ThreadPool;
use std::sync::Arc;

/// Computed planes returned by a band job
struct BandOutput {
    start: usize,
    planes: Vec<Box<[CellRecord]>>,
}

/// Double-buffered automaton driven by a [`ThreadPool`]
///
/// # Examples
///
/// ```
/// use life_engine::automaton::{AutomatonEngine, Color, Field, Rules};
///
/// let mut field = Field::new(4);
/// for (x, y, z) in [(1, 2, 2), (3, 2, 2), (2, 1, 2)] {
///     field.set_alive(x, y, z, Color::WHITE).unwrap();
/// }
///
/// let mut engine = AutomatonEngine::with_threads(field, Rules::new(3, 4), 2).unwrap();
/// engine.advance_generation().unwrap();
/// assert!(engine.current().is_alive(2, 2, 2));
/// assert_eq!(engine.generation(), 1);
/// ```
pub struct AutomatonEngine {
    rules: Rules,
    current: Arc<Field>,
    next: Field,
    pool: ThreadPool,
    generation: u64,
}

impl AutomatonEngine {
    /// Create an engine around `field`, using an existing pool
    pub fn new(field: Field, rules: Rules, pool: ThreadPool) -> Self {
        let next = Field::new(field.size());
        AutomatonEngine {
            rules,
            current: Arc::new(field),
            next,
            pool,
            generation: 0,
        }
    }

    /// Create an engine with its own pool of `threads` workers
    ///
    /// # Panics
    ///
    /// Panics if `threads` is zero.
    pub fn with_threads(field: Field, rules: Rules, threads: usize) -> Result<Self, EngineError> {
        let pool = ThreadPool::new(threads).map_err(EngineError::Init)?;
        Ok(Self::new(field, rules, pool))
    }

    /// Compute the next generation on the worker pool
    ///
    /// On failure the previous generation stays current and the engine can
    /// be stepped again.
    pub fn advance_generation(&mut self) -> Result<(), EngineError> {
        let bands = rules::partition(self.current.size(), self.band_count());
        let (sender, receiver) = crossbeam_channel::unbounded::<BandOutput>();
        let mut failure = None;

        for band in bands {
            let start = band.start;
            let mut planes = self.next.take_planes(band);
            let current = Arc::clone(&self.current);
            let rules = self.rules;
            let sender = sender.clone();

            let submitted = self.pool.submit(move || {
                rules.update_band(&current, start, &mut planes);
                // The receiver outlives the barrier, so this cannot fail
                let _ = sender.send(BandOutput { start, planes });
            });
            if let Err(err) = submitted {
                failure = Some(err);
                break;
            }
        }
        drop(sender);

        let barrier = self.pool.wait_for_finish();
        for output in receiver.try_iter() {
            self.next.restore_planes(output.start, output.planes);
        }

        if let Some(source) = failure.or(barrier.err()) {
            let rebuilt = self.next.repair();
            log::error!(
                "Generation {} failed ({source}), rebuilt {rebuilt} planes",
                self.generation + 1
            );
            return Err(EngineError::Generation {
                generation: self.generation + 1,
                source,
            });
        }

        self.publish();
        Ok(())
    }

    /// Compute the next generation on rayon's global pool
    ///
    /// Produces exactly the same field as [`AutomatonEngine::advance_generation`].
    #[cfg(feature = "parallel")]
    pub fn advance_generation_rayon(&mut self) {
        use rayon::prelude::*;

        let current = &*self.current;
        let rules = self.rules;
        self.next
            .interior_planes_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(offset, plane)| rules.update_plane(current, offset + 1, plane));

        self.publish();
    }

    fn publish(&mut self) {
        let computed = std::mem::replace(&mut self.next, Field::placeholder());
        let previous = std::mem::replace(&mut self.current, Arc::new(computed));
        // A snapshot held by a caller forces a copy
        self.next = Arc::try_unwrap(previous).unwrap_or_else(|shared| (*shared).clone());
        self.generation += 1;

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Generation {} advanced, {} cells alive",
                self.generation,
                self.current.alive_count()
            );
        }
    }

    /// The generation currently published
    pub fn current(&self) -> &Field {
        &self.current
    }

    /// Shared handle to the current generation
    ///
    /// Holding it across a step costs the engine one field copy.
    pub fn snapshot(&self) -> Arc<Field> {
        Arc::clone(&self.current)
    }

    /// Mutable access to the current generation, for seeding and editing
    pub fn current_mut(&mut self) -> &mut Field {
        Arc::make_mut(&mut self.current)
    }

    /// Reset the current generation to `pattern`
    pub fn seed(&mut self, pattern: &SeedPattern) -> Result<usize, FieldError> {
        pattern.apply(self.current_mut())
    }

    /// Number of generations computed since construction or the last reset
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of jobs each generation is split into
    pub fn band_count(&self) -> usize {
        self.pool.thread_count().clamp(1, self.current.size().max(1))
    }

    /// Number of pool workers
    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Rules in effect
    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Replace the rules for subsequent generations
    pub fn set_rules(&mut self, rules: Rules) {
        self.rules = rules;
    }

    /// Kill every cell and restart the generation counter
    pub fn reset(&mut self) {
        self.current_mut().clear();
        self.next.clear();
        self.generation = 0;
    }

    /// Replace both fields with empty ones of a new size
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn resize(&mut self, size: usize) {
        self.current = Arc::new(Field::new(size));
        self.next = Field::new(size);
        self.generation = 0;
    }

    /// Shut the worker pool down; later steps fail
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::field::Color;
    use crate::error::PoolError;

    fn birth_field() -> Field {
        let mut field = Field::new(5);
        for (x, y, z) in [(2, 3, 3), (4, 3, 3), (3, 2, 3)] {
            field.set_alive(x, y, z, Color::WHITE).unwrap();
        }
        field
    }

    #[test]
    fn test_band_count_is_clamped() {
        let engine = AutomatonEngine::with_threads(Field::new(3), Rules::default(), 8).unwrap();
        assert_eq!(engine.band_count(), 3);
        assert_eq!(engine.thread_count(), 8);
    }

    #[test]
    fn test_generation_counter() {
        let mut engine = AutomatonEngine::with_threads(birth_field(), Rules::default(), 2).unwrap();
        engine.advance_generation().unwrap();
        engine.advance_generation().unwrap();
        assert_eq!(engine.generation(), 2);
        engine.reset();
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.current().alive_count(), 0);
    }

    #[test]
    fn test_snapshot_survives_step() {
        let mut engine = AutomatonEngine::with_threads(birth_field(), Rules::default(), 2).unwrap();
        let before = engine.snapshot();
        engine.advance_generation().unwrap();
        assert_eq!(before.alive_count(), 3);
        assert_ne!(*before, *engine.current());
        engine.advance_generation().unwrap();
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn test_step_after_shutdown_keeps_previous_generation() {
        let mut engine = AutomatonEngine::with_threads(birth_field(), Rules::default(), 2).unwrap();
        let before = engine.current().clone();
        engine.shutdown();

        let err = engine.advance_generation().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Generation {
                generation: 1,
                source: PoolError::ShutDown
            }
        ));
        assert_eq!(*engine.current(), before);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_seed_and_resize() {
        let mut engine = AutomatonEngine::with_threads(Field::new(6), Rules::default(), 2).unwrap();
        assert_eq!(engine.seed(&SeedPattern::default()), Ok(10));
        engine.resize(3);
        assert_eq!(engine.current().size(), 3);
        assert_eq!(engine.band_count(), 2);
        engine.advance_generation().unwrap();
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_rayon_matches_pool() {
        let seed = SeedPattern::Random {
            density: 0.4,
            seed: 7,
        };
        let mut field = Field::new(8);
        seed.apply(&mut field).unwrap();

        let mut pooled = AutomatonEngine::with_threads(field.clone(), Rules::default(), 3).unwrap();
        let mut rayon = AutomatonEngine::with_threads(field, Rules::default(), 1).unwrap();
        for _ in 0..4 {
            pooled.advance_generation().unwrap();
            rayon.advance_generation_rayon();
        }
        assert_eq!(pooled.current(), rayon.current());
    }
}
