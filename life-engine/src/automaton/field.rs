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
//! Padded cell grid
//!
//! A [`Field`] of size `N` stores `(N+2)³` cells: the `N³` interior plus a
//! one-cell halo on every face. The halo is always dead and is never written,
//! so neighbor lookups from any interior cell stay in bounds without checks.
//!
//! Storage is one boxed plane per x coordinate. Planes can be moved out and
//! back in, which is how the engine hands disjoint regions to worker jobs.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Range};

/// Linear RGB color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Color {
    /// Black, the color of a cell that was never alive
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    /// White
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    /// Red
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    /// Green
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    /// Blue
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    /// Create a color from its channels
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }

    /// Channels as an array
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, other: Color) {
        *self = *self + other;
    }
}

impl Div<f32> for Color {
    type Output = Color;

    fn div(self, divisor: f32) -> Color {
        Color::new(self.r / divisor, self.g / divisor, self.b / divisor)
    }
}

/// State of one cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellRecord {
    /// Whether the cell is alive
    pub alive: bool,
    /// Last color the cell had while alive
    pub color: Color,
}

impl CellRecord {
    /// A dead black cell
    pub const DEAD: CellRecord = CellRecord {
        alive: false,
        color: Color::BLACK,
    };

    /// A live cell of the given color
    pub fn alive(color: Color) -> Self {
        CellRecord { alive: true, color }
    }
}

/// Padded three-dimensional grid of [`CellRecord`]s
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    size: usize,
    planes: Vec<Box<[CellRecord]>>,
}

impl Field {
    /// Create an all-dead field with an `size³` interior
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "Field size must be positive");
        let side = size + 2;
        Field {
            size,
            planes: (0..side).map(|_| dead_plane(side)).collect(),
        }
    }

    // Stand-in used while a field is moved out of its owner; never read.
    pub(crate) fn placeholder() -> Self {
        Field {
            size: 0,
            planes: Vec::new(),
        }
    }

    /// Interior edge length `N`
    pub fn size(&self) -> usize {
        self.size
    }

    /// Padded edge length `N + 2`
    pub fn side(&self) -> usize {
        self.size + 2
    }

    /// Interior coordinate range along any axis, `1..=N` as a half-open range
    pub fn interior(&self) -> Range<usize> {
        1..self.size + 1
    }

    /// Whether the coordinates lie on the halo shell
    pub fn is_halo(&self, x: usize, y: usize, z: usize) -> bool {
        let edge = self.size + 1;
        [x, y, z].iter().any(|&c| c == 0 || c == edge)
    }

    /// Borrow a cell by padded coordinates
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&CellRecord> {
        let side = self.side();
        if x >= side || y >= side || z >= side {
            return None;
        }
        self.planes.get(x).and_then(|plane| plane.get(y * side + z))
    }

    /// Borrow a cell by padded coordinates
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the padded grid.
    #[inline]
    pub fn cell(&self, x: usize, y: usize, z: usize) -> &CellRecord {
        &self.planes[x][y * self.side() + z]
    }

    /// Whether a cell is alive; coordinates outside the grid count as dead
    pub fn is_alive(&self, x: usize, y: usize, z: usize) -> bool {
        self.get(x, y, z).map_or(false, |cell| cell.alive)
    }

    /// Overwrite an interior cell
    pub fn set(&mut self, x: usize, y: usize, z: usize, record: CellRecord) -> Result<(), FieldError> {
        let side = self.side();
        if x >= side || y >= side || z >= side {
            return Err(FieldError::OutOfBounds {
                x,
                y,
                z,
                size: self.size,
            });
        }
        if self.is_halo(x, y, z) {
            return Err(FieldError::Halo { x, y, z });
        }
        self.planes[x][y * side + z] = record;
        Ok(())
    }

    /// Make an interior cell alive with the given color
    pub fn set_alive(&mut self, x: usize, y: usize, z: usize, color: Color) -> Result<(), FieldError> {
        self.set(x, y, z, CellRecord::alive(color))
    }

    /// Kill every cell
    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.fill(CellRecord::DEAD);
        }
    }

    /// Number of live interior cells
    pub fn alive_count(&self) -> usize {
        self.alive_cells().count()
    }

    /// Padded coordinates and colors of live interior cells, x-major
    pub fn alive_cells(&self) -> impl Iterator<Item = ([usize; 3], Color)> + '_ {
        self.interior_coords().filter_map(move |[x, y, z]| {
            let cell = self.cell(x, y, z);
            cell.alive.then_some(([x, y, z], cell.color))
        })
    }

    /// Padded coordinates of every interior cell, x-major
    pub fn interior_coords(&self) -> impl Iterator<Item = [usize; 3]> {
        let size = self.size;
        (1..=size).flat_map(move |x| {
            (1..=size).flat_map(move |y| (1..=size).map(move |z| [x, y, z]))
        })
    }

    /// Borrow the plane at `x`
    pub fn plane(&self, x: usize) -> &[CellRecord] {
        &self.planes[x]
    }

    /// Mutably borrow the interior planes, `x` in `1..=N`
    pub fn interior_planes_mut(&mut self) -> &mut [Box<[CellRecord]>] {
        let size = self.size;
        &mut self.planes[1..=size]
    }

    /// Move the planes in `xs` out of the field, leaving empty slots
    pub(crate) fn take_planes(&mut self, xs: Range<usize>) -> Vec<Box<[CellRecord]>> {
        self.planes[xs].iter_mut().map(std::mem::take).collect()
    }

    /// Put planes taken with [`Field::take_planes`] back, starting at `start`
    pub(crate) fn restore_planes(&mut self, start: usize, planes: Vec<Box<[CellRecord]>>) {
        for (slot, plane) in self.planes[start..].iter_mut().zip(planes) {
            *slot = plane;
        }
    }

    /// Whether every plane is present
    pub(crate) fn is_intact(&self) -> bool {
        let area = self.side() * self.side();
        self.planes.iter().all(|plane| plane.len() == area)
    }

    /// Replace planes lost to a failed job with dead ones
    ///
    /// Returns the number of planes rebuilt.
    pub(crate) fn repair(&mut self) -> usize {
        let side = self.side();
        let mut rebuilt = 0;
        for plane in &mut self.planes {
            if plane.len() != side * side {
                *plane = dead_plane(side);
                rebuilt += 1;
            }
        }
        rebuilt
    }
}

fn dead_plane(side: usize) -> Box<[CellRecord]> {
    vec![CellRecord::DEAD; side * side].into_boxed_slice()
}
