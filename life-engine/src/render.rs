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
//! Rendering hand-off
//!
//! Drawing is done outside this crate. Once per frame the world walks its
//! cell entities and hands each one to a [`RenderSink`].

use crate::automaton::Color;

/// Everything a renderer needs to draw one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellInstance {
    /// World-space position of the cube
    pub position: [f32; 3],
    /// Whether the cell is alive
    pub alive: bool,
    /// Cell color
    pub color: Color,
}

/// Receiver of per-frame cell data
pub trait RenderSink {
    /// Called before the first cell of a frame
    fn begin_frame(&mut self) {}

    /// Called once per emitted cell
    fn draw_cell(&mut self, cell: &CellInstance);

    /// Called after the last cell of a frame
    fn end_frame(&mut self) {}

    /// Whether dead cells should be emitted too
    fn wants_dead_cells(&self) -> bool {
        false
    }
}

/// Sink that keeps the cells of the most recent frame
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    cells: Vec<CellInstance>,
    frames: usize,
    include_dead: bool,
}

impl CollectingSink {
    /// Create a sink collecting live cells only
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink collecting every cell
    pub fn with_dead_cells() -> Self {
        CollectingSink {
            include_dead: true,
            ..Self::default()
        }
    }

    /// Cells of the last completed or in-progress frame
    pub fn cells(&self) -> &[CellInstance] {
        &self.cells
    }

    /// Number of frames begun
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl RenderSink for CollectingSink {
    fn begin_frame(&mut self) {
        self.cells.clear();
        self.frames += 1;
    }

    fn draw_cell(&mut self, cell: &CellInstance) {
        self.cells.push(*cell);
    }

    fn wants_dead_cells(&self) -> bool {
        self.include_dead
    }
}
