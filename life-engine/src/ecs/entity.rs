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
//! Entity management
//!
//! An entity is a key, a set of component slots and a liveness flag. Entities
//! start inactive; `activate` and `kill` are the only transitions, and the
//! [`Manager`](crate::ecs::Manager) drops inactive entities before systems run.

use crate::ecs::component::{Component, ComponentBundle, ComponentKind, ComponentStore};
use std::fmt;

/// Opaque entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(u64);

impl EntityKey {
    /// Create a key from a raw u64 value
    pub fn new(raw: u64) -> Self {
        EntityKey(raw)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Derive a key from 3D grid coordinates
    ///
    /// Uses the Cantor pairing function twice, `π(π(x, y), z)`, which is a
    /// bijection so distinct coordinates never collide.
    ///
    /// # Panics
    ///
    /// Panics if the paired value does not fit in a u64.
    pub fn from_coords(x: u64, y: u64, z: u64) -> Self {
        EntityKey(cantor_pair(cantor_pair(x, y), z))
    }

    /// Recover the coordinates passed to [`EntityKey::from_coords`]
    pub fn to_coords(&self) -> (u64, u64, u64) {
        let (xy, z) = cantor_unpair(self.0);
        let (x, y) = cantor_unpair(xy);
        (x, y, z)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

fn cantor_pair(a: u64, b: u64) -> u64 {
    // The intermediate product exceeds u64 well before the result does
    let sum = a as u128 + b as u128;
    let paired = sum
        .checked_mul(sum + 1)
        .and_then(|product| u64::try_from(product / 2 + b as u128).ok());
    match paired {
        Some(value) => value,
        None => panic!("pairing ({a}, {b}) overflows u64"),
    }
}

fn cantor_unpair(z: u64) -> (u64, u64) {
    let target = z as u128;
    // Largest w with w(w+1)/2 <= z
    let mut w = (((8.0 * z as f64 + 1.0).sqrt() - 1.0) / 2.0) as u128;
    while triangle(w + 1) <= target {
        w += 1;
    }
    while triangle(w) > target {
        w -= 1;
    }
    let b = target - triangle(w);
    // Both parts are at most w, which is below 2^33
    ((w - b) as u64, b as u64)
}

fn triangle(w: u128) -> u128 {
    w * (w + 1) / 2
}

/// An entity and the components it owns
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    key: EntityKey,
    components: ComponentStore,
    active: bool,
}

impl Entity {
    /// Create an inactive entity with no components
    pub fn new(key: EntityKey) -> Self {
        Entity {
            key,
            components: ComponentStore::new(),
            active: false,
        }
    }

    /// Get the key this entity is registered under
    pub fn key(&self) -> EntityKey {
        self.key
    }

    /// Attach a default `T`, replacing any existing one
    pub fn add_component<T: Component>(&mut self) -> &mut T {
        self.components.insert(T::default())
    }

    /// Attach `value`, replacing any existing `T`
    pub fn insert_component<T: Component>(&mut self, value: T) -> &mut T {
        self.components.insert(value)
    }

    /// Attach a default instance of every component in the bundle
    ///
    /// ```
    /// use life_engine::ecs::components::{Position, Velocity};
    /// use life_engine::ecs::{Entity, EntityKey};
    ///
    /// let mut entity = Entity::new(EntityKey::new(1));
    /// entity.add_components::<(Position, Velocity)>();
    /// assert_eq!(entity.component_count(), 2);
    /// ```
    pub fn add_components<B: ComponentBundle>(&mut self) {
        B::insert_defaults(&mut self.components);
    }

    /// Borrow the attached `T`
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components.get()
    }

    /// Mutably borrow the attached `T`
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut()
    }

    /// Detach `T`; no-op if absent
    pub fn remove_component<T: Component>(&mut self) -> bool {
        self.components.remove::<T>()
    }

    /// Whether `T` is attached
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.contains(T::KIND)
    }

    /// Whether every kind in `kinds` is attached
    pub fn has_all(&self, kinds: &[ComponentKind]) -> bool {
        self.components.has_all(kinds)
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Component slots of this entity
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Mark the entity live
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Mark the entity for removal
    pub fn kill(&mut self) {
        self.active = false;
    }

    /// Whether the entity is live
    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Animation, Position, Velocity};

    #[test]
    fn test_entity_starts_inactive() {
        let entity = Entity::new(EntityKey::new(42));
        assert_eq!(entity.key().raw(), 42);
        assert!(!entity.is_active());
        assert_eq!(entity.component_count(), 0);
    }

    #[test]
    fn test_activate_and_kill() {
        let mut entity = Entity::new(EntityKey::new(1));
        entity.add_component::<Position>();
        entity.activate();
        assert!(entity.is_active());
        entity.kill();
        assert!(!entity.is_active());
        assert!(entity.has_component::<Position>());
    }

    #[test]
    fn test_add_component_twice_keeps_latest() {
        let mut entity = Entity::new(EntityKey::new(1));
        entity.add_component::<Animation>().frame = 4;
        assert_eq!(entity.get_component::<Animation>().map(|a| a.frame), Some(4));

        entity.add_component::<Animation>();
        assert_eq!(entity.get_component::<Animation>().map(|a| a.frame), Some(0));
        assert_eq!(entity.component_count(), 1);
    }

    #[test]
    fn test_remove_missing_component_is_noop() {
        let mut entity = Entity::new(EntityKey::new(1));
        assert!(!entity.remove_component::<Velocity>());
        entity.add_component::<Velocity>();
        assert!(entity.remove_component::<Velocity>());
        assert!(entity.get_component::<Velocity>().is_none());
    }

    #[test]
    fn test_get_component_mut() {
        let mut entity = Entity::new(EntityKey::new(1));
        entity.insert_component(Position::new(1.0, 0.0, 0.0));
        if let Some(pos) = entity.get_component_mut::<Position>() {
            pos.translate(1.0, 0.0, 0.0);
        }
        assert_eq!(entity.get_component::<Position>().map(|p| p.x()), Some(2.0));
    }

    #[test]
    fn test_key_from_coords_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for x in 0..8 {
            for y in 0..8 {
                for z in 0..8 {
                    assert!(seen.insert(EntityKey::from_coords(x, y, z)));
                }
            }
        }
    }

    #[test]
    fn test_key_to_coords_inverts_pairing() {
        for coords in [(0, 0, 0), (1, 2, 3), (7, 0, 5), (41, 17, 9)] {
            let key = EntityKey::from_coords(coords.0, coords.1, coords.2);
            assert_eq!(key.to_coords(), coords);
        }
    }

    #[test]
    fn test_largest_keys_unpair() {
        for raw in [u64::MAX, u64::MAX - 1] {
            let key = EntityKey::new(raw);
            let (x, y, z) = key.to_coords();
            assert_eq!(EntityKey::from_coords(x, y, z), key);
        }
    }

    #[test]
    fn test_known_pairing_values() {
        assert_eq!(cantor_pair(0, 0), 0);
        assert_eq!(cantor_pair(1, 0), 1);
        assert_eq!(cantor_pair(0, 1), 2);
        assert_eq!(cantor_pair(2, 1), 7);
    }

    #[test]
    #[should_panic(expected = "overflows u64")]
    fn test_pairing_overflow_panics() {
        EntityKey::from_coords(u64::MAX / 2, 1, 0);
    }

    #[test]
    #[should_panic(expected = "overflows u64")]
    fn test_pairing_overflow_panics_at_extremes() {
        EntityKey::from_coords(u64::MAX, u64::MAX, 0);
    }
}
