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
//! Birth and death rules
//!
//! The neighborhood is fixed at 14 cells: the 6 face neighbors and the 8
//! corner diagonals. The 12 edge diagonals of a full Moore neighborhood are
//! not counted.

use crate::automaton::field::{CellRecord, Color, Field};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Offsets of the cells counted as neighbors
pub const NEIGHBOR_OFFSETS: [(isize, isize, isize); 14] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
    (-1, 1, -1),
    (1, 1, -1),
    (1, 1, 1),
    (-1, 1, 1),
    (-1, -1, -1),
    (1, -1, -1),
    (1, -1, 1),
    (-1, -1, 1),
];

/// Thresholds driving the automaton
///
/// Values larger than the neighborhood are accepted; the rule they control
/// then simply never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// A dead cell with at least this many live neighbors is born
    pub birth_threshold: u32,
    /// A live cell with at least this many live neighbors dies
    pub death_threshold: u32,
    /// A live cell with fewer live neighbors than this dies; 0 disables
    pub survival_floor: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            birth_threshold: 3,
            death_threshold: 4,
            survival_floor: 0,
        }
    }
}

impl Rules {
    /// Create rules with the given birth and death thresholds
    pub fn new(birth_threshold: u32, death_threshold: u32) -> Self {
        Rules {
            birth_threshold,
            death_threshold,
            survival_floor: 0,
        }
    }

    /// Set the survival floor
    pub fn with_survival_floor(mut self, floor: u32) -> Self {
        self.survival_floor = floor;
        self
    }

    /// Compute the next state of the interior cell at `(x, y, z)`
    ///
    /// Born cells take the average color of their live neighbors, or keep
    /// their own color when they have none. Cells that die keep their last
    /// color.
    pub fn next_cell(&self, current: &Field, x: usize, y: usize, z: usize) -> CellRecord {
        let cell = *current.cell(x, y, z);
        let mut count = 0u32;
        let mut color_sum = Color::BLACK;

        for &(dx, dy, dz) in &NEIGHBOR_OFFSETS {
            let neighbor = current.cell(
                x.wrapping_add_signed(dx),
                y.wrapping_add_signed(dy),
                z.wrapping_add_signed(dz),
            );
            if !neighbor.alive {
                continue;
            }
            count += 1;
            color_sum += neighbor.color;
            if cell.alive && count >= self.death_threshold {
                break;
            }
        }

        if cell.alive {
            if count >= self.death_threshold || count < self.survival_floor {
                CellRecord {
                    alive: false,
                    color: cell.color,
                }
            } else {
                cell
            }
        } else if count >= self.birth_threshold {
            // With no live neighbors there is nothing to average
            let color = if count == 0 { cell.color } else { color_sum / count as f32 };
            CellRecord::alive(color)
        } else {
            cell
        }
    }

    /// Compute interior rows of one x-plane of the next generation
    ///
    /// `plane` must be a full padded plane; only interior `(y, z)` entries
    /// are written.
    pub fn update_plane(&self, current: &Field, x: usize, plane: &mut [CellRecord]) {
        let side = current.side();
        debug_assert_eq!(plane.len(), side * side);
        for y in current.interior() {
            for z in current.interior() {
                plane[y * side + z] = self.next_cell(current, x, y, z);
            }
        }
    }

    /// Compute a band of consecutive x-planes starting at `start`
    pub fn update_band(&self, current: &Field, start: usize, planes: &mut [Box<[CellRecord]>]) {
        for (offset, plane) in planes.iter_mut().enumerate() {
            self.update_plane(current, start + offset, plane);
        }
    }
}

/// Split the interior `1..=size` into contiguous bands
///
/// The band count is clamped to `1..=size`; the last band absorbs the
/// remainder when `size` does not divide evenly.
pub fn partition(size: usize, bands: usize) -> Vec<Range<usize>> {
    if size == 0 {
        return Vec::new();
    }
    let bands = bands.clamp(1, size);
    let width = size / bands;
    (0..bands)
        .map(|i| {
            let start = 1 + i * width;
            let end = if i + 1 == bands { size + 1 } else { start + width };
            start..end
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_distinct_and_unit() {
        for (i, a) in NEIGHBOR_OFFSETS.iter().enumerate() {
            assert_ne!(*a, (0, 0, 0));
            assert!([a.0, a.1, a.2].iter().all(|c| c.abs() <= 1));
            for b in &NEIGHBOR_OFFSETS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_offsets_exclude_edge_diagonals() {
        let edges = NEIGHBOR_OFFSETS
            .iter()
            .filter(|(dx, dy, dz)| [dx, dy, dz].iter().filter(|c| ***c != 0).count() == 2)
            .count();
        assert_eq!(edges, 0);
    }

    #[test]
    fn test_birth() {
        let mut field = Field::new(3);
        field.set_alive(1, 2, 2, Color::RED).unwrap();
        field.set_alive(3, 2, 2, Color::GREEN).unwrap();
        field.set_alive(2, 1, 2, Color::BLUE).unwrap();

        let next = Rules::new(3, 4).next_cell(&field, 2, 2, 2);
        assert!(next.alive);
        assert_eq!(next.color, Color::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0));
    }

    #[test]
    fn test_edge_diagonal_is_not_counted() {
        let mut field = Field::new(3);
        field.set_alive(1, 1, 2, Color::WHITE).unwrap();
        let next = Rules::new(1, 4).next_cell(&field, 2, 2, 2);
        assert!(!next.alive);
    }

    #[test]
    fn test_zero_birth_threshold_births_isolated_cell() {
        let mut field = Field::new(3);
        field
            .set(2, 2, 2, CellRecord { alive: false, color: Color::GREEN })
            .unwrap();
        let next = Rules::new(0, 4).next_cell(&field, 2, 2, 2);
        assert_eq!(next, CellRecord::alive(Color::GREEN));
    }

    #[test]
    fn test_death_keeps_color() {
        let mut field = Field::new(3);
        field.set_alive(2, 2, 2, Color::RED).unwrap();
        for (x, y, z) in [(1, 2, 2), (3, 2, 2)] {
            field.set_alive(x, y, z, Color::WHITE).unwrap();
        }
        let next = Rules::new(3, 2).next_cell(&field, 2, 2, 2);
        assert_eq!(next, CellRecord { alive: false, color: Color::RED });
    }

    #[test]
    fn test_zero_death_threshold_kills_isolated_cell() {
        let mut field = Field::new(3);
        field.set_alive(2, 2, 2, Color::RED).unwrap();
        assert!(!Rules::new(3, 0).next_cell(&field, 2, 2, 2).alive);
    }

    #[test]
    fn test_survival_floor() {
        let mut field = Field::new(3);
        field.set_alive(2, 2, 2, Color::RED).unwrap();
        field.set_alive(1, 2, 2, Color::RED).unwrap();

        assert!(Rules::new(3, 4).next_cell(&field, 2, 2, 2).alive);
        let lonely = Rules::new(3, 4).with_survival_floor(2);
        assert!(!lonely.next_cell(&field, 2, 2, 2).alive);
    }

    #[test]
    fn test_partition_even() {
        assert_eq!(partition(6, 3), vec![1..3, 3..5, 5..7]);
    }

    #[test]
    fn test_partition_remainder_goes_last() {
        assert_eq!(partition(7, 3), vec![1..3, 3..5, 5..8]);
    }

    #[test]
    fn test_partition_clamps_band_count() {
        assert_eq!(partition(2, 8), vec![1..2, 2..3]);
        assert_eq!(partition(4, 0), vec![1..5]);
        assert!(partition(0, 4).is_empty());
    }
}
