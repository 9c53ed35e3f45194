//! Entity Component System (ECS) core implementation
//!
//! This module provides:
//! - Compile-time type keys for components and systems
//! - Entities owning one slot per component kind
//! - Systems with statically declared required components
//! - The [`Manager`] owning both and driving per-frame updates

pub mod component;
pub mod components;
mod entity;
mod manager;
pub mod registry;
mod system;
pub mod systems;

pub use component::{AnyComponent, Component, ComponentBundle, ComponentKind, ComponentSet, ComponentStore};
pub use entity::{Entity, EntityKey};
pub use manager::Manager;
pub use registry::{id_of, Registered, TypeKey, TypeRegistry};
pub use system::{System, SystemContext};
