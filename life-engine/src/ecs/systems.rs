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
//! Built-in systems
//!
//! Small behaviors operating on the built-in components. Each one records how
//! many entities it touched during its last run, which is what the tests and
//! the headless example look at.

use crate::ecs::components::{Animation, Lifetime, Position, Sprite, Velocity};
use crate::ecs::registry::{Registered, TypeKey};
use crate::ecs::system::{System, SystemContext};
use std::time::Duration;

/// Default vertical acceleration applied by [`PhysicsSystem`], units/s²
pub const DEFAULT_GRAVITY: f32 = 0.5 / 150.0;

/// Integrates [`Velocity`] into [`Position`]
///
/// Linear velocity moves the position and spin turns its angle, both scaled
/// by the frame delta.
#[derive(Debug, Default)]
pub struct MovementSystem {
    updated: usize,
}

impl MovementSystem {
    /// Entities moved during the last run
    pub fn last_updated(&self) -> usize {
        self.updated
    }
}

impl Registered for MovementSystem {
    const TYPE_KEY: TypeKey = TypeKey::builtin_system(0);

    fn type_name() -> &'static str {
        "MovementSystem"
    }
}

impl System for MovementSystem {
    type Required = (Position, Velocity);

    fn update_state(&mut self, ctx: &mut SystemContext<'_>, delta: Duration) {
        let dt = delta.as_secs_f32();
        self.updated = 0;

        for entity in ctx.entities_mut() {
            let Some(vel) = entity.get_component::<Velocity>().copied() else {
                continue;
            };
            if let Some(pos) = entity.get_component_mut::<Position>() {
                pos.translate(vel.dx() * dt, vel.dy() * dt, vel.dz() * dt);
                pos.set_angle(pos.angle() + vel.spin() * dt);
                self.updated += 1;
            }
        }
    }
}

/// Applies constant vertical acceleration to every [`Velocity`]
#[derive(Debug)]
pub struct PhysicsSystem {
    gravity: f32,
    updated: usize,
}

impl PhysicsSystem {
    /// Create a physics system with the given acceleration along y
    pub fn new(gravity: f32) -> Self {
        PhysicsSystem { gravity, updated: 0 }
    }

    /// Get the acceleration along y
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Set the acceleration along y
    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Entities accelerated during the last run
    pub fn last_updated(&self) -> usize {
        self.updated
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl Registered for PhysicsSystem {
    const TYPE_KEY: TypeKey = TypeKey::builtin_system(1);

    fn type_name() -> &'static str {
        "PhysicsSystem"
    }
}

impl System for PhysicsSystem {
    type Required = (Velocity,);

    fn update_state(&mut self, ctx: &mut SystemContext<'_>, delta: Duration) {
        let dv = self.gravity * delta.as_secs_f32();
        self.updated = 0;

        for entity in ctx.entities_mut() {
            if let Some(vel) = entity.get_component_mut::<Velocity>() {
                vel.accelerate_y(dv);
                self.updated += 1;
            }
        }
    }
}

/// Shows the sprite clip selected by each entity's [`Animation`] frame
#[derive(Debug, Default)]
pub struct AnimationSystem {
    updated: usize,
}

impl AnimationSystem {
    /// Sprites updated during the last run
    pub fn last_updated(&self) -> usize {
        self.updated
    }
}

impl Registered for AnimationSystem {
    const TYPE_KEY: TypeKey = TypeKey::builtin_system(2);

    fn type_name() -> &'static str {
        "AnimationSystem"
    }
}

impl System for AnimationSystem {
    type Required = (Sprite, Animation);

    fn update_state(&mut self, ctx: &mut SystemContext<'_>, _delta: Duration) {
        self.updated = 0;

        for entity in ctx.entities_mut() {
            let Some(frame) = entity.get_component::<Animation>().map(|a| a.frame) else {
                continue;
            };
            if let Some(sprite) = entity.get_component_mut::<Sprite>() {
                // A sheet of unknown size shows the frame as is
                sprite.clip = match sprite.clip_count {
                    0 => frame,
                    count => frame % count,
                };
                self.updated += 1;
            }
        }
    }
}

/// Counts down [`Lifetime`] and kills entities whose time ran out
///
/// Killed entities stay in the manager until the next frame's filtering pass.
#[derive(Debug, Default)]
pub struct LifetimeSystem {
    expired: usize,
}

impl LifetimeSystem {
    /// Entities killed during the last run
    pub fn last_expired(&self) -> usize {
        self.expired
    }
}

impl Registered for LifetimeSystem {
    const TYPE_KEY: TypeKey = TypeKey::builtin_system(3);

    fn type_name() -> &'static str {
        "LifetimeSystem"
    }
}

impl System for LifetimeSystem {
    type Required = (Lifetime,);

    fn update_state(&mut self, ctx: &mut SystemContext<'_>, delta: Duration) {
        let dt = delta.as_secs_f32();
        self.expired = 0;

        for entity in ctx.entities_mut() {
            let Some(lifetime) = entity.get_component_mut::<Lifetime>() else {
                continue;
            };
            lifetime.remaining -= dt;
            if lifetime.remaining <= 0.0 {
                entity.kill();
                self.expired += 1;
            }
        }
    }
}
