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

use serde::{Deserialize, Serialize};

use crate::topology::check_non_negative;
use crate::Error;

/// which way a tuple travels in the device hierarchy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TupleDirection {
    /// toward the root
    Up,
    /// toward the edge
    Down,
}

/// what sits at the ends of an edge
///
/// - `Sensor`: sensor tuple type -> module
/// - `Module`: module -> module
/// - `Actuator`: module -> actuator type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeKind {
    Sensor,
    Module,
    Actuator,
}

/// A tuple flow between two named endpoints of an application.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AppEdge {
    pub source: String,
    pub destination: String,
    /// MI needed to process one tuple
    pub tuple_cpu_length: f64,
    /// bytes transferred per tuple
    pub tuple_nw_length: f64,
    pub tuple_type: String,
    pub direction: TupleDirection,
    pub kind: EdgeKind,
    /// emission period in ms for edges driven by a timer at the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodicity: Option<f64>,
}

impl AppEdge {
    pub fn new(
        source: &str,
        destination: &str,
        tuple_cpu_length: f64,
        tuple_nw_length: f64,
        tuple_type: &str,
        direction: TupleDirection,
        kind: EdgeKind,
    ) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            tuple_cpu_length,
            tuple_nw_length,
            tuple_type: tuple_type.to_string(),
            direction,
            kind,
            periodicity: None,
        }
    }

    pub fn periodic(self, periodicity: f64) -> Self {
        Self {
            periodicity: Some(periodicity),
            ..self
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.periodicity.is_some()
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        let owner = format!("{} -> {}", self.source, self.destination);
        check_non_negative(&owner, "tuple_cpu_length", self.tuple_cpu_length)?;
        check_non_negative(&owner, "tuple_nw_length", self.tuple_nw_length)?;
        if self.tuple_type.is_empty() {
            return Err(Error::InvalidSpec(format!("{}: empty tuple type", owner)));
        }
        if let Some(period) = self.periodicity {
            if !period.is_finite() || period <= 0.0 {
                return Err(Error::InvalidSpec(format!(
                    "{}: periodicity must be positive, got {}",
                    owner, period
                )));
            }
            // sensors are paced by their own distribution
            if self.kind == EdgeKind::Sensor {
                return Err(Error::InvalidSpec(format!(
                    "{}: sensor edges cannot be periodic",
                    owner
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_edge() {
        let e = AppEdge::new(
            "slot-detector",
            "PTZ_CONTROL",
            28.0,
            100.0,
            "PTZ_PARAMS",
            TupleDirection::Up,
            EdgeKind::Actuator,
        )
        .periodic(100.0);
        assert!(e.is_periodic());
        assert_eq!(e.validate(), Ok(()));
        assert!(e.clone().periodic(0.0).validate().is_err());
    }

    #[test]
    fn test_negative_cost() {
        let e = AppEdge::new(
            "a",
            "b",
            -1.0,
            10.0,
            "t",
            TupleDirection::Up,
            EdgeKind::Module,
        );
        assert!(matches!(e.validate(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_yaml_edge() {
        let e: AppEdge = serde_yaml::from_str(
            "
source: CAMERA
destination: picture-capture
tuple_cpu_length: 1000
tuple_nw_length: 500
tuple_type: CAMERA
direction: UP
kind: SENSOR
",
        )
        .unwrap();
        assert_eq!(e.kind, EdgeKind::Sensor);
        assert_eq!(e.direction, TupleDirection::Up);
        assert_eq!(e.periodicity, None);
    }
}
