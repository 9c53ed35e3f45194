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
//! System execution framework
//!
//! A system declares its required components as a type-level
//! [`ComponentSet`] and receives a [`SystemContext`] each frame. The context
//! only yields live entities; the required set cannot change after the
//! system type is defined.

use crate::ecs::component::{Component, ComponentBundle, ComponentKind, ComponentSet};
use crate::ecs::entity::{Entity, EntityKey};
use crate::ecs::registry::Registered;
use indexmap::IndexMap;
use std::any::Any;
use std::time::Duration;

/// Trait for systems owned by a [`Manager`](crate::ecs::Manager)
///
/// # Examples
///
/// ```
/// use life_engine::ecs::components::Animation;
/// use life_engine::ecs::registry::{Registered, TypeKey};
/// use life_engine::ecs::{System, SystemContext};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Advance;
///
/// impl Registered for Advance {
///     const TYPE_KEY: TypeKey = TypeKey::user(7);
/// }
///
/// impl System for Advance {
///     type Required = (Animation,);
///
///     fn update_state(&mut self, ctx: &mut SystemContext<'_>, _delta: Duration) {
///         for entity in ctx.entities_mut() {
///             if let Some(anim) = entity.get_component_mut::<Animation>() {
///                 anim.frame += 1;
///             }
///         }
///     }
/// }
/// ```
pub trait System: Registered + Send {
    /// Components an entity must hold to appear in [`SystemContext::entities`]
    type Required: ComponentSet;

    /// Run one frame of the system
    fn update_state(&mut self, ctx: &mut SystemContext<'_>, delta: Duration);

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        Self::type_name()
    }
}

/// Filtered views over the manager's entities, handed to a running system
pub struct SystemContext<'a> {
    entities: &'a mut IndexMap<EntityKey, Entity>,
    required: &'static [ComponentKind],
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(
        entities: &'a mut IndexMap<EntityKey, Entity>,
        required: &'static [ComponentKind],
    ) -> Self {
        SystemContext { entities, required }
    }

    /// Kinds the running system requires
    pub fn required(&self) -> &'static [ComponentKind] {
        self.required
    }

    /// Live entities holding every required component
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        filter(&*self.entities, self.required)
    }

    /// Mutable variant of [`SystemContext::entities`]
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        filter_mut(&mut *self.entities, self.required)
    }

    /// Live entities holding `T`, regardless of the required set
    pub fn entities_by_tag<T: Component>(&self) -> impl Iterator<Item = &Entity> + '_ {
        filter(&*self.entities, <(T,)>::KINDS)
    }

    /// Mutable variant of [`SystemContext::entities_by_tag`]
    pub fn entities_by_tag_mut<T: Component>(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        filter_mut(&mut *self.entities, <(T,)>::KINDS)
    }

    /// Live entities holding every component of the bundle
    pub fn entities_by_tags<B: ComponentBundle>(&self) -> impl Iterator<Item = &Entity> + '_ {
        filter(&*self.entities, B::KINDS)
    }

    /// Mutable variant of [`SystemContext::entities_by_tags`]
    pub fn entities_by_tags_mut<B: ComponentBundle>(
        &mut self,
    ) -> impl Iterator<Item = &mut Entity> + '_ {
        filter_mut(&mut *self.entities, B::KINDS)
    }

    /// Look up a live entity by key
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(&key).filter(|e| e.is_active())
    }

    /// Mutably look up a live entity by key
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(&key).filter(|e| e.is_active())
    }
}

pub(crate) fn filter<'e>(
    entities: &'e IndexMap<EntityKey, Entity>,
    kinds: &'static [ComponentKind],
) -> impl Iterator<Item = &'e Entity> + 'e {
    entities
        .values()
        .filter(move |e| e.is_active() && e.has_all(kinds))
}

pub(crate) fn filter_mut<'e>(
    entities: &'e mut IndexMap<EntityKey, Entity>,
    kinds: &'static [ComponentKind],
) -> impl Iterator<Item = &'e mut Entity> + 'e {
    entities
        .values_mut()
        .filter(move |e| e.is_active() && e.has_all(kinds))
}

/// Object-safe view of a [`System`], used for storage inside the manager
pub(crate) trait AnySystem: Send {
    fn run(&mut self, entities: &mut IndexMap<EntityKey, Entity>, delta: Duration);
    fn system_name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> AnySystem for S {
    fn run(&mut self, entities: &mut IndexMap<EntityKey, Entity>, delta: Duration) {
        let mut ctx = SystemContext::new(entities, <S::Required as ComponentSet>::KINDS);
        self.update_state(&mut ctx, delta);
    }

    fn system_name(&self) -> &str {
        self.name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Animation, Position, Sprite, Velocity};
    use crate::ecs::registry::TypeKey;

    struct Counting {
        seen: usize,
    }

    impl Registered for Counting {
        const TYPE_KEY: TypeKey = TypeKey::user(100);
    }

    impl System for Counting {
        type Required = (Position, Velocity);

        fn update_state(&mut self, ctx: &mut SystemContext<'_>, _delta: Duration) {
            self.seen = ctx.entities().count();
        }
    }

    fn sample() -> IndexMap<EntityKey, Entity> {
        let mut map = IndexMap::new();
        for raw in 0..6u64 {
            let key = EntityKey::new(raw);
            let mut entity = Entity::new(key);
            entity.add_component::<Position>();
            if raw % 2 == 0 {
                entity.add_component::<Velocity>();
            }
            if raw == 4 {
                entity.add_components::<(Sprite, Animation)>();
            }
            if raw != 2 {
                entity.activate();
            }
            map.insert(key, entity);
        }
        map
    }

    #[test]
    fn test_entities_respects_required_set() {
        let mut map = sample();
        let ctx = SystemContext::new(&mut map, <(Position, Velocity)>::KINDS);
        let keys: Vec<u64> = ctx.entities().map(|e| e.key().raw()).collect();
        // 2 holds both but is inactive
        assert_eq!(keys, vec![0, 4]);
    }

    #[test]
    fn test_entities_by_tag_ignores_required_set() {
        let mut map = sample();
        let ctx = SystemContext::new(&mut map, <(Position, Velocity)>::KINDS);
        assert_eq!(ctx.entities_by_tag::<Position>().count(), 5);
        assert_eq!(ctx.entities_by_tags::<(Sprite, Animation)>().count(), 1);
    }

    #[test]
    fn test_entity_lookup_skips_inactive() {
        let mut map = sample();
        let mut ctx = SystemContext::new(&mut map, &[]);
        assert!(ctx.entity(EntityKey::new(1)).is_some());
        assert!(ctx.entity(EntityKey::new(2)).is_none());
        assert!(ctx.entity_mut(EntityKey::new(99)).is_none());
    }

    #[test]
    fn test_any_system_runs_with_required_kinds() {
        let mut map = sample();
        let mut system = Counting { seen: 0 };
        AnySystem::run(&mut system, &mut map, Duration::ZERO);
        assert_eq!(system.seen, 2);
        assert!(system.system_name().contains("Counting"));
    }
}
