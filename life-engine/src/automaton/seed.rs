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
//! Initial field contents

use crate::automaton::field::{Color, Field};
use crate::error::FieldError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One explicitly placed live cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedCell {
    /// Padded coordinates, each in `1..=N`
    pub at: [usize; 3],
    /// Initial color
    #[serde(default = "default_seed_color")]
    pub color: Color,
}

fn default_seed_color() -> Color {
    Color::WHITE
}

/// How to fill a field when the simulation (re)starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SeedPattern {
    /// No live cells
    Empty,
    /// The corner cell plus `arm - 1` cells along each axis
    ///
    /// The corner is white, the x arm red, the y arm green and the z arm
    /// blue. Arms are clipped to the field.
    AxisCross {
        /// Arm length, corner included
        arm: usize,
    },
    /// An explicit list of live cells
    Cells {
        /// Cells to bring alive
        cells: Vec<SeedCell>,
    },
    /// Each interior cell alive with probability `density`
    Random {
        /// Probability in `[0, 1]`
        density: f64,
        /// RNG seed, so a run is reproducible
        seed: u64,
    },
}

impl Default for SeedPattern {
    fn default() -> Self {
        SeedPattern::AxisCross { arm: 4 }
    }
}

impl SeedPattern {
    /// Clear `field` and bring the pattern's cells alive
    ///
    /// Returns the number of live cells written.
    pub fn apply(&self, field: &mut Field) -> Result<usize, FieldError> {
        field.clear();
        match self {
            SeedPattern::Empty => Ok(0),
            SeedPattern::AxisCross { arm } => {
                let reach = (*arm).min(field.size());
                if reach == 0 {
                    return Ok(0);
                }
                field.set_alive(1, 1, 1, Color::WHITE)?;
                for step in 2..=reach {
                    field.set_alive(step, 1, 1, Color::RED)?;
                    field.set_alive(1, step, 1, Color::GREEN)?;
                    field.set_alive(1, 1, step, Color::BLUE)?;
                }
                Ok(1 + 3 * (reach - 1))
            }
            SeedPattern::Cells { cells } => {
                for cell in cells {
                    let [x, y, z] = cell.at;
                    field.set_alive(x, y, z, cell.color)?;
                }
                Ok(field.alive_count())
            }
            SeedPattern::Random { density, seed } => {
                let density = if density.is_nan() {
                    0.0
                } else {
                    density.clamp(0.0, 1.0)
                };
                let mut rng = StdRng::seed_from_u64(*seed);
                let coords: Vec<[usize; 3]> = field.interior_coords().collect();
                let mut written = 0;
                for [x, y, z] in coords {
                    if rng.gen_bool(density) {
                        let color = Color::new(rng.gen(), rng.gen(), rng.gen());
                        field.set_alive(x, y, z, color)?;
                        written += 1;
                    }
                }
                Ok(written)
            }
        }
    }
}
