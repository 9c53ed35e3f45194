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
//! Component storage
//!
//! Components are plain data records attached to entities. Each entity owns a
//! [`ComponentStore`]: one slot per [`ComponentKind`], so a second insert of
//! the same type replaces the first and lookups are a single index.

pub use crate::ecs::components::{AnyComponent, ComponentKind};

/// Trait implemented by every member of the closed component set
///
/// Implementations are generated by `declare_components!`; the conversions
/// to and from [`AnyComponent`] never fail for the matching variant.
pub trait Component: Default + Send + Sync + 'static {
    /// Slot this component occupies
    const KIND: ComponentKind;

    /// Wrap the value in the tagged union
    fn into_any(self) -> AnyComponent;

    /// Borrow the value out of the tagged union, if the variant matches
    fn from_any(any: &AnyComponent) -> Option<&Self>;

    /// Mutably borrow the value out of the tagged union, if the variant matches
    fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self>;
}

/// A statically known list of component types
///
/// Implemented for `()` and tuples of up to six components. Systems use it to
/// declare their required components.
pub trait ComponentSet: 'static {
    /// Kinds in the set, in tuple order
    const KINDS: &'static [ComponentKind];

    /// Insert a default instance of every member into `store`
    fn insert_defaults(store: &mut ComponentStore);
}

/// A [`ComponentSet`] with at least two members
///
/// Bulk operations take a bundle so that single components go through the
/// singular methods; `entity.add_components::<(Position,)>()` does not compile.
pub trait ComponentBundle: ComponentSet {}

impl ComponentSet for () {
    const KINDS: &'static [ComponentKind] = &[];

    fn insert_defaults(_store: &mut ComponentStore) {}
}

macro_rules! impl_component_set {
    ($($t:ident),+) => {
        impl<$($t: Component),+> ComponentSet for ($($t,)+) {
            const KINDS: &'static [ComponentKind] = &[$($t::KIND),+];

            fn insert_defaults(store: &mut ComponentStore) {
                $(store.insert($t::default());)+
            }
        }
    };
}

macro_rules! impl_component_bundle {
    ($($t:ident),+) => {
        impl<$($t: Component),+> ComponentBundle for ($($t,)+) {}
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

impl_component_bundle!(A, B);
impl_component_bundle!(A, B, C);
impl_component_bundle!(A, B, C, D);
impl_component_bundle!(A, B, C, D, E);
impl_component_bundle!(A, B, C, D, E, F);

/// Per-entity component slots
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStore {
    slots: [Option<AnyComponent>; ComponentKind::COUNT],
}

impl ComponentStore {
    /// Create an empty store
    pub fn new() -> Self {
        ComponentStore {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Store `value`, replacing any previous instance of the same type
    pub fn insert<T: Component>(&mut self, value: T) -> &mut T {
        let slot = &mut self.slots[T::KIND.index()];
        *slot = Some(value.into_any());
        match slot.as_mut().and_then(T::from_any_mut) {
            Some(component) => component,
            None => unreachable!("slot {} holds a foreign variant", T::KIND.name()),
        }
    }

    /// Borrow the stored `T`
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.slots[T::KIND.index()].as_ref().and_then(T::from_any)
    }

    /// Mutably borrow the stored `T`
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots[T::KIND.index()].as_mut().and_then(T::from_any_mut)
    }

    /// Drop the stored `T`, returning whether one was present
    pub fn remove<T: Component>(&mut self) -> bool {
        self.slots[T::KIND.index()].take().is_some()
    }

    /// Whether a component of `kind` is stored
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Whether every kind in `kinds` is stored
    pub fn has_all(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|kind| self.contains(*kind))
    }

    /// Kinds currently stored, in declaration order
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.slots.iter().flatten().map(AnyComponent::kind)
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no component is stored
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}
