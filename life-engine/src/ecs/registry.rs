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
//! Type identity for components and systems
//!
//! Every component and system type carries a [`TypeKey`] fixed at compile
//! time, so identity never depends on the order in which types are first
//! touched. Keys are partitioned into ranges:
//!
//! - `0..256`: components, one per [`ComponentKind`] variant
//! - `256..1024`: systems shipped with this crate
//! - `1024..`: user systems, built with [`TypeKey::user`]
//!
//! [`TypeRegistry`] is the startup-time table that records which concrete
//! type owns each key and rejects two types claiming the same one.

use crate::ecs::components::ComponentKind;
use crate::error::RegistryError;
use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;

/// Stable identifier of a component or system type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

impl TypeKey {
    /// First key of the built-in system range
    pub const BUILTIN_SYSTEM_BASE: u32 = 256;

    /// First key of the user range
    pub const USER_BASE: u32 = 1024;

    /// Create a key from a raw value
    pub const fn new(raw: u32) -> Self {
        TypeKey(raw)
    }

    /// Key of a component kind
    pub const fn component(kind: ComponentKind) -> Self {
        TypeKey(kind.index() as u32)
    }

    /// Key of the `n`th built-in system
    pub(crate) const fn builtin_system(n: u32) -> Self {
        TypeKey(Self::BUILTIN_SYSTEM_BASE + n)
    }

    /// Key in the user range, for systems defined outside this crate
    pub const fn user(n: u32) -> Self {
        TypeKey(Self::USER_BASE + n)
    }

    /// Get the raw value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

/// Types with a compile-time [`TypeKey`]
pub trait Registered: 'static {
    /// The key identifying this type
    const TYPE_KEY: TypeKey;

    /// Human readable type name for diagnostics
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Get the key of `T`
///
/// Returns the same value on every call and across runs; distinct registered
/// types never share a key once they pass through a [`TypeRegistry`].
pub fn id_of<T: Registered>() -> TypeKey {
    T::TYPE_KEY
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    type_id: TypeId,
    name: &'static str,
}

/// Table of registered types, filled during startup
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: IndexMap<TypeKey, Registration>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        TypeRegistry {
            entries: IndexMap::new(),
        }
    }

    /// Create a registry holding every built-in component kind
    pub fn with_components() -> Self {
        let mut registry = Self::new();
        registry.register_components();
        registry
    }

    fn register_components(&mut self) {
        for kind in ComponentKind::ALL {
            self.entries.insert(
                TypeKey::component(*kind),
                Registration {
                    type_id: kind.type_id(),
                    name: kind.name(),
                },
            );
        }
    }

    /// Register `T` under its key
    ///
    /// Registering the same type twice is a no-op. A different type already
    /// holding the key is an error.
    pub fn register<T: Registered>(&mut self) -> Result<TypeKey, RegistryError> {
        let key = T::TYPE_KEY;
        let type_id = TypeId::of::<T>();

        match self.entries.get(&key) {
            Some(existing) if existing.type_id == type_id => Ok(key),
            Some(existing) => Err(RegistryError::KeyCollision {
                key: key.raw(),
                existing: existing.name,
                requested: T::type_name(),
            }),
            None => {
                self.entries.insert(
                    key,
                    Registration {
                        type_id,
                        name: T::type_name(),
                    },
                );
                Ok(key)
            }
        }
    }

    /// Whether `key` has been claimed
    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Name of the type holding `key`
    pub fn name_of(&self, key: TypeKey) -> Option<&'static str> {
        self.entries.get(&key).map(|r| r.name)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Cell, Position, Velocity};

    struct Alpha;
    impl Registered for Alpha {
        const TYPE_KEY: TypeKey = TypeKey::user(1);
    }

    struct Beta;
    impl Registered for Beta {
        const TYPE_KEY: TypeKey = TypeKey::user(1);
    }

    #[test]
    fn test_id_is_stable() {
        assert_eq!(id_of::<Position>(), id_of::<Position>());
        assert_eq!(id_of::<Alpha>(), TypeKey::new(TypeKey::USER_BASE + 1));
    }

    #[test]
    fn test_component_ids_are_distinct() {
        assert_ne!(id_of::<Position>(), id_of::<Velocity>());
        assert_ne!(id_of::<Velocity>(), id_of::<Cell>());
    }

    #[test]
    fn test_registry_holds_components() {
        let registry = TypeRegistry::with_components();
        assert_eq!(registry.len(), ComponentKind::COUNT);
        assert!(registry.contains(id_of::<Position>()));
        assert_eq!(registry.name_of(id_of::<Position>()), Some("Position"));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.register::<Alpha>(), Ok(TypeKey::user(1)));
        assert_eq!(registry.register::<Alpha>(), Ok(TypeKey::user(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_collision() {
        let mut registry = TypeRegistry::new();
        registry.register::<Alpha>().unwrap();
        let err = registry.register::<Beta>().unwrap_err();
        assert!(matches!(err, RegistryError::KeyCollision { key, .. } if key == TypeKey::user(1).raw()));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(TypeKey::new(7).to_string(), "TypeKey(7)");
    }
}
