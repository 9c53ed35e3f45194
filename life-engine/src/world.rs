//! Simulation world
//!
//! Ties the ECS, the automaton and the clock together. Every interior cell
//! of the field has a matching entity carrying [`Position`], [`Sprite`] and
//! [`Cell`] components; those entities are refreshed from the grid on the
//! frame thread after each published generation, never from pool workers.

use crate::automaton::{AutomatonEngine, Field};
use crate::clock::{ClockEvents, GameState, SimulationClock, SystemTimer, Timer};
use crate::config::SimulationConfig;
use crate::ecs::components::{Cell, Position, Sprite};
use crate::ecs::systems::{AnimationSystem, LifetimeSystem, MovementSystem, PhysicsSystem};
use crate::ecs::{Entity, EntityKey, Manager};
use crate::error::EngineError;
use crate::pool::ThreadPool;
use crate::render::{CellInstance, RenderSink};
use std::time::Duration;

/// The simulation: entities, systems, the automaton and its clock
pub struct LifeWorld<T: Timer = SystemTimer> {
    config: SimulationConfig,
    manager: Manager,
    engine: AutomatonEngine,
    clock: SimulationClock<T>,
    cell_keys: Vec<EntityKey>,
}

impl LifeWorld<SystemTimer> {
    /// Build a world driven by the system clock
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        Self::with_timer(config, SystemTimer::new())
    }
}

impl<T: Timer> LifeWorld<T> {
    /// Build a world driven by `timer`
    ///
    /// The field is seeded and cell entities are created immediately; the
    /// clock starts in [`GameState::Stopped`].
    pub fn with_timer(config: SimulationConfig, timer: T) -> Result<Self, EngineError> {
        config.validate()?;

        let pool = ThreadPool::new(config.thread_count()).map_err(EngineError::Init)?;
        let engine = AutomatonEngine::new(Field::new(config.field_size), config.rules(), pool);

        let mut manager = Manager::new();
        manager.create_system::<MovementSystem>()?;
        manager.create_system::<PhysicsSystem>()?;
        manager.create_system::<AnimationSystem>()?;
        manager.create_system::<LifetimeSystem>()?;

        let clock = SimulationClock::new(timer, config.step_interval);
        let mut world = LifeWorld {
            config,
            manager,
            engine,
            clock,
            cell_keys: Vec::new(),
        };
        world.init_field()?;
        Ok(world)
    }

    /// Reseed the field and rebuild the cell entities
    pub fn init_field(&mut self) -> Result<(), EngineError> {
        self.manager.remove_entities(&self.cell_keys);
        self.cell_keys.clear();

        self.engine.reset();
        let seeded = self.engine.seed(&self.config.seed)?;
        log::debug!("Field of size {} seeded with {seeded} cells", self.config.field_size);

        let cube = self.config.cube_size;
        let field = self.engine.current();
        for [x, y, z] in field.interior_coords() {
            let key = EntityKey::from_coords(x as u64, y as u64, z as u64);
            let record = *field.cell(x, y, z);

            let entity = self.manager.create_entity(key);
            entity.insert_component(Position::new(
                cube * (x - 1) as f32,
                cube * (y - 1) as f32,
                cube * (z - 1) as f32,
            ));
            entity.add_component::<Sprite>();
            entity.insert_component(Cell {
                coords: [x, y, z],
                alive: record.alive,
                color: record.color,
            });
            entity.activate();
            self.cell_keys.push(key);
        }
        Ok(())
    }

    /// Run one frame
    ///
    /// Applies game-state transitions, advances the automaton when a step is
    /// due, then runs every system. Systems run even if the generation
    /// failed; the failure is returned afterwards.
    pub fn update(&mut self, delta: Duration) -> Result<ClockEvents, EngineError> {
        let events = self.clock.tick();

        let mut outcome = Ok(());
        if events.reinitialize {
            outcome = self.init_field();
        }
        if events.advance && outcome.is_ok() {
            outcome = self.step();
        }

        self.manager.update(delta);
        outcome.map(|()| events)
    }

    /// Advance one generation now and refresh the cell entities
    pub fn step(&mut self) -> Result<(), EngineError> {
        self.engine.advance_generation()?;
        self.sync_cells();
        Ok(())
    }

    /// Copy the current grid state into the `Cell` components
    pub fn sync_cells(&mut self) {
        let field = self.engine.current();
        for key in &self.cell_keys {
            let Some(cell) = self
                .manager
                .entity_mut(*key)
                .and_then(|entity| entity.get_component_mut::<Cell>())
            else {
                continue;
            };
            let [x, y, z] = cell.coords;
            let record = field.cell(x, y, z);
            cell.alive = record.alive;
            cell.color = record.color;
        }
    }

    /// Hand the cell entities to `sink`
    ///
    /// Returns the number of cells emitted.
    pub fn render(&self, sink: &mut dyn RenderSink) -> usize {
        let include_dead = sink.wants_dead_cells();
        let mut drawn = 0;

        sink.begin_frame();
        for entity in self.manager.query::<(Position, Cell)>() {
            let (Some(pos), Some(cell)) = (
                entity.get_component::<Position>(),
                entity.get_component::<Cell>(),
            ) else {
                continue;
            };
            if !cell.alive && !include_dead {
                continue;
            }
            sink.draw_cell(&CellInstance {
                position: pos.as_array(),
                alive: cell.alive,
                color: cell.color,
            });
            drawn += 1;
        }
        sink.end_frame();

        drawn
    }

    /// Request a game-state change, applied on the next update
    pub fn set_game_state(&mut self, state: GameState) {
        self.clock.set_state(state);
    }

    /// Get the current game state
    pub fn game_state(&self) -> GameState {
        self.clock.state()
    }

    /// Replace the configuration
    ///
    /// Rules and step interval apply from the next generation. A new field
    /// size rebuilds the field at once. The thread count is fixed for the
    /// lifetime of the world.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), EngineError> {
        config.validate()?;
        if config.threads.is_some() && config.thread_count() != self.engine.thread_count() {
            log::warn!(
                "Thread count change to {} ignored, pool keeps {} workers",
                config.thread_count(),
                self.engine.thread_count()
            );
        }

        let resized = config.field_size != self.config.field_size;
        self.engine.set_rules(config.rules());
        self.clock.set_step_interval(config.step_interval);
        self.config = config;

        if resized {
            self.engine.resize(self.config.field_size);
            self.init_field()?;
        }
        Ok(())
    }

    /// Get the configuration in effect
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Borrow the entity manager
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Mutably borrow the entity manager
    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    /// Borrow the automaton engine
    pub fn engine(&self) -> &AutomatonEngine {
        &self.engine
    }

    /// Mutably borrow the automaton engine
    ///
    /// Edits to the field show up in the cell entities after the next
    /// [`LifeWorld::sync_cells`] or step.
    pub fn engine_mut(&mut self) -> &mut AutomatonEngine {
        &mut self.engine
    }

    /// Borrow the clock
    pub fn clock(&self) -> &SimulationClock<T> {
        &self.clock
    }

    /// Mutably borrow the clock
    pub fn clock_mut(&mut self) -> &mut SimulationClock<T> {
        &mut self.clock
    }

    /// Entity mirroring the cell at padded coordinates
    pub fn cell_entity(&self, x: usize, y: usize, z: usize) -> Option<&Entity> {
        self.manager
            .entity(EntityKey::from_coords(x as u64, y as u64, z as u64))
    }

    /// Number of cell entities
    pub fn cell_count(&self) -> usize {
        self.cell_keys.len()
    }
}
