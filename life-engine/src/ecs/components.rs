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
//! Built-in components
//!
//! The component set is closed: every kind is listed in one
//! `declare_components!` invocation, which generates [`ComponentKind`], the
//! tagged [`AnyComponent`] union stored inside entities, and the
//! [`Component`]/[`Registered`] impls. Adding a component means adding a
//! line there; nothing is ever downcast at runtime.

use crate::automaton::Color;
use crate::ecs::component::Component;
use crate::ecs::registry::{Registered, TypeKey};
use std::any::TypeId;

macro_rules! declare_components {
    ($($(#[$doc:meta])* $variant:ident => $ty:ident),+ $(,)?) => {
        /// Closed set of component kinds known to the engine
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ComponentKind {
            $($(#[$doc])* $variant),+
        }

        impl ComponentKind {
            /// Every kind, in declaration order
            pub const ALL: &'static [ComponentKind] = &[$(ComponentKind::$variant),+];

            /// Number of kinds
            pub const COUNT: usize = Self::ALL.len();

            /// Dense index of this kind, `0..COUNT`
            pub const fn index(self) -> usize {
                self as usize
            }

            /// Name of the component type
            pub const fn name(self) -> &'static str {
                match self {
                    $(ComponentKind::$variant => stringify!($ty)),+
                }
            }

            /// Rust type id of the component type
            pub fn type_id(self) -> TypeId {
                match self {
                    $(ComponentKind::$variant => TypeId::of::<$ty>()),+
                }
            }
        }

        /// A component value tagged with its kind
        #[derive(Debug, Clone, PartialEq)]
        pub enum AnyComponent {
            $($(#[$doc])* $variant($ty)),+
        }

        impl AnyComponent {
            /// Kind of the stored component
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(AnyComponent::$variant(_) => ComponentKind::$variant),+
                }
            }
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$variant;

                fn into_any(self) -> AnyComponent {
                    AnyComponent::$variant(self)
                }

                fn from_any(any: &AnyComponent) -> Option<&Self> {
                    match any {
                        AnyComponent::$variant(c) => Some(c),
                        _ => None,
                    }
                }

                fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self> {
                    match any {
                        AnyComponent::$variant(c) => Some(c),
                        _ => None,
                    }
                }
            }

            impl Registered for $ty {
                const TYPE_KEY: TypeKey = TypeKey::component(ComponentKind::$variant);

                fn type_name() -> &'static str {
                    stringify!($ty)
                }
            }
        )+
    };
}

declare_components! {
    /// World-space placement
    Position => Position,
    /// Linear and angular velocity
    Velocity => Velocity,
    /// Handle to an externally rendered sprite
    Sprite => Sprite,
    /// Current animation frame
    Animation => Animation,
    /// Automaton cell mirrored from the grid
    Cell => Cell,
    /// Remaining time before the entity is killed
    Lifetime => Lifetime,
}

/// 3D position component
///
/// Carries the rotation angle and uniform scale used by the render
/// collaborator alongside the coordinates.
///
/// # Examples
///
/// ```
/// use life_engine::ecs::components::Position;
///
/// let pos = Position::new(1.0, 2.0, 3.0);
/// assert_eq!(pos.y(), 2.0);
/// assert_eq!(pos.scale(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    x: f32,
    y: f32,
    z: f32,
    angle: f32,
    scale: f32,
}

impl Position {
    /// Create a position at the given coordinates, unrotated and unscaled
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Position {
            x,
            y,
            z,
            angle: 0.0,
            scale: 1.0,
        }
    }

    /// Get the x coordinate
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Get the y coordinate
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Get the z coordinate
    pub fn z(&self) -> f32 {
        self.z
    }

    /// Get the rotation angle in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Get the uniform scale factor
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set all three coordinates
    pub fn set(&mut self, x: f32, y: f32, z: f32) {
        self.x = x;
        self.y = y;
        self.z = z;
    }

    /// Set the rotation angle in radians
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Set the uniform scale factor
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Move by the given offset
    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Get the coordinates as an array
    pub fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(0.0, 0.0, 0.0)
    }
}

/// Velocity component, in units per second
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    dx: f32,
    dy: f32,
    dz: f32,
    spin: f32,
}

impl Velocity {
    /// Create a velocity with no angular part
    pub fn new(dx: f32, dy: f32, dz: f32) -> Self {
        Velocity {
            dx,
            dy,
            dz,
            spin: 0.0,
        }
    }

    /// Set the angular velocity in radians per second
    pub fn with_spin(mut self, spin: f32) -> Self {
        self.spin = spin;
        self
    }

    /// Get the x component
    pub fn dx(&self) -> f32 {
        self.dx
    }

    /// Get the y component
    pub fn dy(&self) -> f32 {
        self.dy
    }

    /// Get the z component
    pub fn dz(&self) -> f32 {
        self.dz
    }

    /// Get the angular velocity
    pub fn spin(&self) -> f32 {
        self.spin
    }

    /// Add to the y component
    pub fn accelerate_y(&mut self, amount: f32) {
        self.dy += amount;
    }
}

/// Sprite handle
///
/// The texture itself lives in the render collaborator; the core only picks
/// which clip of the sprite sheet to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sprite {
    /// Index of the clip currently shown
    pub clip: usize,
    /// Number of clips in the sheet, 0 if unknown
    pub clip_count: usize,
}

/// Current animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Animation {
    /// Frame index chosen by gameplay code
    pub frame: usize,
}

/// Mirror of one automaton cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    /// Padded grid coordinates of the cell
    pub coords: [usize; 3],
    /// Whether the cell is alive in the current generation
    pub alive: bool,
    /// Cell color in the current generation
    pub color: Color,
}

/// Time to live in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lifetime {
    /// Seconds left before the entity is killed
    pub remaining: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_indices_are_dense() {
        for (i, kind) in ComponentKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(ComponentKind::COUNT, 6);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ComponentKind::Position.name(), "Position");
        assert_eq!(ComponentKind::Lifetime.name(), "Lifetime");
    }

    #[test]
    fn test_any_component_roundtrip_kind() {
        let any = Velocity::new(1.0, 0.0, 0.0).into_any();
        assert_eq!(any.kind(), ComponentKind::Velocity);
        assert!(Velocity::from_any(&any).is_some());
        assert!(Position::from_any(&any).is_none());
    }

    #[test]
    fn test_kind_type_ids() {
        assert_eq!(ComponentKind::Cell.type_id(), TypeId::of::<Cell>());
        assert_ne!(ComponentKind::Cell.type_id(), TypeId::of::<Sprite>());
    }

    #[test]
    fn test_position_defaults() {
        let pos = Position::default();
        assert_eq!(pos.as_array(), [0.0, 0.0, 0.0]);
        assert_eq!(pos.scale(), 1.0);
    }

    #[test]
    fn test_position_translate() {
        let mut pos = Position::new(1.0, 1.0, 1.0);
        pos.translate(0.5, -1.0, 2.0);
        assert_eq!(pos.as_array(), [1.5, 0.0, 3.0]);
    }

    #[test]
    fn test_velocity_spin() {
        let vel = Velocity::new(0.0, 1.0, 0.0).with_spin(0.25);
        assert_eq!(vel.spin(), 0.25);
        assert_eq!(vel.dy(), 1.0);
    }
}
