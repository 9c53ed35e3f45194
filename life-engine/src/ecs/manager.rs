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
//! Entity and system registry
//!
//! The manager owns every entity and every system, and drives one frame of
//! system updates per [`Manager::update`] call. It is single-threaded: pool
//! workers never see it.

use crate::ecs::component::ComponentSet;
use crate::ecs::entity::{Entity, EntityKey};
use crate::ecs::registry::{Registered, TypeKey, TypeRegistry};
use crate::ecs::system::{self, AnySystem, System};
use crate::error::RegistryError;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::time::Duration;

struct SystemSlot {
    system: Box<dyn AnySystem>,
    stopped: bool,
}

/// Owner of all entities and systems
pub struct Manager {
    entities: IndexMap<EntityKey, Entity>,
    systems: IndexMap<TypeKey, SystemSlot>,
    registry: TypeRegistry,
    overwrites: usize,
}

impl Manager {
    /// Create an empty manager
    pub fn new() -> Self {
        Manager {
            entities: IndexMap::new(),
            systems: IndexMap::new(),
            registry: TypeRegistry::with_components(),
            overwrites: 0,
        }
    }

    /// Register a fresh, inactive entity under `key`
    ///
    /// An existing entity with the same key is replaced. That is a caller
    /// error: it is logged and counted in [`Manager::overwrite_count`] but
    /// does not panic.
    pub fn create_entity(&mut self, key: EntityKey) -> &mut Entity {
        match self.entities.entry(key) {
            Entry::Occupied(mut slot) => {
                log::warn!("{key} already exists, replacing it");
                self.overwrites += 1;
                slot.insert(Entity::new(key));
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(Entity::new(key)),
        }
    }

    /// Number of times `create_entity` replaced an existing entity
    pub fn overwrite_count(&self) -> usize {
        self.overwrites
    }

    /// Look up an entity, live or not
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(&key)
    }

    /// Mutably look up an entity, live or not
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(&key)
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Mutable variant of [`Manager::entities`]
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Live entities holding every component in `S`
    pub fn query<S: ComponentSet>(&self) -> impl Iterator<Item = &Entity> + '_ {
        system::filter(&self.entities, S::KINDS)
    }

    /// Mutable variant of [`Manager::query`]
    pub fn query_mut<S: ComponentSet>(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        system::filter_mut(&mut self.entities, S::KINDS)
    }

    /// Remove an entity outright
    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        self.entities.shift_remove(&key)
    }

    /// Remove every entity whose key is listed, returning the number removed
    pub fn remove_entities(&mut self, keys: &[EntityKey]) -> usize {
        let doomed: HashSet<EntityKey> = keys.iter().copied().collect();
        let before = self.entities.len();
        self.entities.retain(|key, _| !doomed.contains(key));
        before - self.entities.len()
    }

    /// Drop every entity whose liveness flag is cleared
    ///
    /// Returns the number removed.
    pub fn remove_inactive_entities(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|_, entity| entity.is_active());
        before - self.entities.len()
    }

    /// Remove every entity
    pub fn clear_entities(&mut self) {
        self.entities.clear();
    }

    /// Number of entities, live or not
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Construct `S` with its default state and take ownership of it
    pub fn create_system<S: System + Default>(&mut self) -> Result<&mut S, RegistryError> {
        self.add_system(S::default())
    }

    /// Take ownership of `system`
    ///
    /// A system of the same type replaces the previous instance. A different
    /// type claiming the same [`TypeKey`] is rejected.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<&mut S, RegistryError> {
        let key = self.registry.register::<S>()?;
        let slot = SystemSlot {
            system: Box::new(system),
            stopped: false,
        };

        let stored = match self.systems.entry(key) {
            Entry::Occupied(mut existing) => {
                log::warn!("System {} already exists, replacing it", S::type_name());
                existing.insert(slot);
                existing.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(slot),
        };

        match stored.system.as_any_mut().downcast_mut::<S>() {
            Some(system) => Ok(system),
            None => unreachable!("system slot {key} holds a foreign type"),
        }
    }

    /// Borrow the system of type `S`
    pub fn system<S: System>(&self) -> Option<&S> {
        self.systems
            .get(&S::TYPE_KEY)
            .and_then(|slot| slot.system.as_any().downcast_ref::<S>())
    }

    /// Mutably borrow the system of type `S`
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems
            .get_mut(&S::TYPE_KEY)
            .and_then(|slot| slot.system.as_any_mut().downcast_mut::<S>())
    }

    /// Skip `S` on subsequent updates; returns false if `S` is not present
    pub fn stop_system<S: System>(&mut self) -> bool {
        self.set_stopped(S::TYPE_KEY, true)
    }

    /// Resume `S`; returns false if `S` is not present
    pub fn start_system<S: System>(&mut self) -> bool {
        self.set_stopped(S::TYPE_KEY, false)
    }

    fn set_stopped(&mut self, key: TypeKey, stopped: bool) -> bool {
        match self.systems.get_mut(&key) {
            Some(slot) => {
                slot.stopped = stopped;
                true
            }
            None => false,
        }
    }

    /// Whether `S` is present and stopped
    pub fn is_system_stopped<S: System>(&self) -> bool {
        self.systems
            .get(&S::TYPE_KEY)
            .map_or(false, |slot| slot.stopped)
    }

    /// Drop the system of type `S`; returns whether one was present
    pub fn remove_system<S: System>(&mut self) -> bool {
        self.systems.shift_remove(&S::TYPE_KEY).is_some()
    }

    /// Number of owned systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Names of owned systems, in creation order
    pub fn system_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.systems.values().map(|slot| slot.system.system_name())
    }

    /// Type table covering components and the systems created so far
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Run one frame
    ///
    /// Inactive entities are dropped first, so no system ever sees an
    /// entity that was killed before this frame. Systems then run in
    /// creation order, skipping stopped ones.
    pub fn update(&mut self, delta: Duration) {
        self.remove_inactive_entities();
        for slot in self.systems.values_mut() {
            if slot.stopped {
                continue;
            }
            slot.system.run(&mut self.entities, delta);
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Animation, Position, Velocity};
    use crate::ecs::system::SystemContext;

    #[derive(Default)]
    struct FrameCounter {
        runs: usize,
        last_seen: usize,
    }

    impl Registered for FrameCounter {
        const TYPE_KEY: TypeKey = TypeKey::user(10);
    }

    impl System for FrameCounter {
        type Required = (Position,);

        fn update_state(&mut self, ctx: &mut SystemContext<'_>, _delta: Duration) {
            self.runs += 1;
            self.last_seen = ctx.entities().count();
        }
    }

    #[derive(Default)]
    struct Impostor;

    impl Registered for Impostor {
        const TYPE_KEY: TypeKey = TypeKey::user(10);
    }

    impl System for Impostor {
        type Required = ();

        fn update_state(&mut self, _ctx: &mut SystemContext<'_>, _delta: Duration) {}
    }

    #[test]
    fn test_create_entity() {
        let mut manager = Manager::new();
        manager.create_entity(EntityKey::new(1)).activate();
        assert_eq!(manager.entity_count(), 1);
        assert!(manager.entity(EntityKey::new(1)).is_some_and(Entity::is_active));
    }

    #[test]
    fn test_duplicate_key_overwrites_and_is_counted() {
        let mut manager = Manager::new();
        manager
            .create_entity(EntityKey::new(5))
            .add_component::<Velocity>();
        let replaced = manager.create_entity(EntityKey::new(5));
        assert_eq!(replaced.component_count(), 0);
        assert_eq!(manager.entity_count(), 1);
        assert_eq!(manager.overwrite_count(), 1);
    }

    #[test]
    fn test_remove_inactive_entities() {
        let mut manager = Manager::new();
        for raw in 0..4 {
            let entity = manager.create_entity(EntityKey::new(raw));
            if raw % 2 == 0 {
                entity.activate();
            }
        }
        assert_eq!(manager.remove_inactive_entities(), 2);
        let keys: Vec<u64> = manager.entities().map(|e| e.key().raw()).collect();
        assert_eq!(keys, vec![0, 2]);
    }

    #[test]
    fn test_remove_entities() {
        let mut manager = Manager::new();
        for raw in 0..5 {
            manager.create_entity(EntityKey::new(raw)).activate();
        }
        let removed = manager.remove_entities(&[EntityKey::new(1), EntityKey::new(3), EntityKey::new(9)]);
        assert_eq!(removed, 2);
        assert_eq!(manager.entity_count(), 3);
    }

    #[test]
    fn test_update_filters_before_systems() {
        let mut manager = Manager::new();
        manager.create_system::<FrameCounter>().unwrap();
        for raw in 0..3 {
            let entity = manager.create_entity(EntityKey::new(raw));
            entity.add_component::<Position>();
            entity.activate();
        }
        if let Some(entity) = manager.entity_mut(EntityKey::new(1)) {
            entity.kill();
        }

        manager.update(Duration::from_millis(16));

        let counter = manager.system::<FrameCounter>().unwrap();
        assert_eq!(counter.runs, 1);
        assert_eq!(counter.last_seen, 2);
        assert_eq!(manager.entity_count(), 2);
    }

    #[test]
    fn test_stopped_system_is_skipped() {
        let mut manager = Manager::new();
        manager.create_system::<FrameCounter>().unwrap();
        assert!(manager.stop_system::<FrameCounter>());
        assert!(manager.is_system_stopped::<FrameCounter>());

        manager.update(Duration::ZERO);
        assert_eq!(manager.system::<FrameCounter>().unwrap().runs, 0);

        manager.start_system::<FrameCounter>();
        manager.update(Duration::ZERO);
        assert_eq!(manager.system::<FrameCounter>().unwrap().runs, 1);
    }

    #[test]
    fn test_system_mut() {
        let mut manager = Manager::new();
        manager.create_system::<FrameCounter>().unwrap().runs = 41;
        manager.system_mut::<FrameCounter>().unwrap().runs += 1;
        assert_eq!(manager.system::<FrameCounter>().unwrap().runs, 42);
    }

    #[test]
    fn test_same_system_type_replaces() {
        let mut manager = Manager::new();
        manager.create_system::<FrameCounter>().unwrap().runs = 3;
        manager.create_system::<FrameCounter>().unwrap();
        assert_eq!(manager.system_count(), 1);
        assert_eq!(manager.system::<FrameCounter>().unwrap().runs, 0);
    }

    #[test]
    fn test_key_collision_is_rejected() {
        let mut manager = Manager::new();
        manager.create_system::<FrameCounter>().unwrap();
        assert!(manager.create_system::<Impostor>().is_err());
        assert!(manager.system::<FrameCounter>().is_some());
    }

    #[test]
    fn test_query() {
        let mut manager = Manager::new();
        let entity = manager.create_entity(EntityKey::new(1));
        entity.add_components::<(Position, Animation)>();
        entity.activate();
        manager.create_entity(EntityKey::new(2)).activate();

        assert_eq!(manager.query::<(Position, Animation)>().count(), 1);
        assert_eq!(manager.query::<()>().count(), 2);
        for entity in manager.query_mut::<(Animation,)>() {
            entity.kill();
        }
        assert_eq!(manager.query::<()>().count(), 1);
    }

    #[test]
    fn test_remove_system() {
        let mut manager = Manager::new();
        manager.create_system::<FrameCounter>().unwrap();
        assert!(manager.remove_system::<FrameCounter>());
        assert!(!manager.remove_system::<FrameCounter>());
        assert!(!manager.stop_system::<FrameCounter>());
    }
}
