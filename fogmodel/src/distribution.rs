// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Time between two tuples emitted by a sensor, in milliseconds.
///
/// The runtime owns the random number generator; the model only describes
/// the shape of the distribution.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Deterministic(f64),
    Uniform { min: f64, max: f64 },
}

impl Distribution {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let ok = match *self {
            Self::Deterministic(value) => value.is_finite() && value > 0.0,
            Self::Uniform { min, max } => {
                min.is_finite() && max.is_finite() && min >= 0.0 && max > 0.0 && min <= max
            }
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidSpec(format!(
                "invalid inter-arrival distribution {:?}",
                self
            )))
        }
    }

    pub fn mean_inter_transmit_time(&self) -> f64 {
        match *self {
            Self::Deterministic(value) => value,
            Self::Uniform { min, max } => (min + max) / 2.0,
        }
    }

    /// Draw the next inter-arrival time.
    pub fn next_value(&self, rng: &mut dyn RngCore) -> f64 {
        match *self {
            Self::Deterministic(value) => value,
            Self::Uniform { min, max } if min == max => min,
            Self::Uniform { min, max } => rng.gen_range(min..max),
        }
    }
}
