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

use crate::Error;

/// Storage attached to every device unless the scenario says otherwise.
pub const DEFAULT_STORAGE: u64 = 1_000_000;

/// Attributes the runtime uses for cost accounting; the model carries them
/// but never looks inside.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Characteristics {
    pub arch: String,
    pub os: String,
    pub vmm: String,
    pub time_zone: f64,
    pub cost_per_sec: f64,
    pub cost_per_mem: f64,
    pub cost_per_storage: f64,
    pub cost_per_bw: f64,
}

impl Default for Characteristics {
    fn default() -> Self {
        Self {
            arch: "x86".into(),
            os: "Linux".into(),
            vmm: "Xen".into(),
            time_zone: 10.0,
            cost_per_sec: 3.0,
            cost_per_mem: 0.05,
            cost_per_storage: 0.001,
            cost_per_bw: 0.0,
        }
    }
}

/// parameters to create a fog device
///
/// constructed programmatically or read from a scenario file.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DeviceSpec {
    pub name: String,
    pub mips: u64,
    pub ram: u64,
    pub uplink_bandwidth: u64,
    pub downlink_bandwidth: u64,
    #[serde(default = "default_storage")]
    pub storage: u64,
    pub level: u32,
    pub rate_per_mips: f64,
    pub busy_power: f64,
    pub idle_power: f64,
    #[serde(default)]
    pub characteristics: Characteristics,
}

fn default_storage() -> u64 {
    DEFAULT_STORAGE
}

impl DeviceSpec {
    /// Argument order follows the usual "name, mips, ram, up, down, level,
    /// rate, busy, idle" tier tables.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        mips: u64,
        ram: u64,
        uplink_bandwidth: u64,
        downlink_bandwidth: u64,
        level: u32,
        rate_per_mips: f64,
        busy_power: f64,
        idle_power: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            mips,
            ram,
            uplink_bandwidth,
            downlink_bandwidth,
            storage: DEFAULT_STORAGE,
            level,
            rate_per_mips,
            busy_power,
            idle_power,
            characteristics: Characteristics::default(),
        }
    }

    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::InvalidSpec("device name is empty".into()));
        }
        for (field, value) in [
            ("mips", self.mips),
            ("ram", self.ram),
            ("uplink_bandwidth", self.uplink_bandwidth),
            ("downlink_bandwidth", self.downlink_bandwidth),
            ("storage", self.storage),
        ] {
            if value == 0 {
                return Err(Error::InvalidSpec(format!(
                    "{}: {} must be positive",
                    self.name, field
                )));
            }
        }
        for (field, value) in [
            ("rate_per_mips", self.rate_per_mips),
            ("busy_power", self.busy_power),
            ("idle_power", self.idle_power),
        ] {
            check_non_negative(&self.name, field, value)?;
        }
        Ok(())
    }
}

pub(crate) fn check_non_negative(owner: &str, field: &str, value: f64) -> Result<(), Error> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidSpec(format!(
            "{}: {} must be a non-negative number, got {}",
            owner, field, value
        )));
    }
    Ok(())
}

/// A fog device as stored in the topology.
#[derive(Clone, Debug, PartialEq)]
pub struct Device {
    spec: DeviceSpec,
    /// latency of the link to the parent; 0 until attached
    pub(super) uplink_latency: f64,
}

impl Device {
    pub(super) fn new(spec: DeviceSpec) -> Self {
        Self {
            spec,
            uplink_latency: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
    pub fn mips(&self) -> u64 {
        self.spec.mips
    }
    pub fn ram(&self) -> u64 {
        self.spec.ram
    }
    pub fn uplink_bandwidth(&self) -> u64 {
        self.spec.uplink_bandwidth
    }
    pub fn downlink_bandwidth(&self) -> u64 {
        self.spec.downlink_bandwidth
    }
    pub fn storage(&self) -> u64 {
        self.spec.storage
    }
    pub fn level(&self) -> u32 {
        self.spec.level
    }
    pub fn rate_per_mips(&self) -> f64 {
        self.spec.rate_per_mips
    }
    pub fn busy_power(&self) -> f64 {
        self.spec.busy_power
    }
    pub fn idle_power(&self) -> f64 {
        self.spec.idle_power
    }
    pub fn uplink_latency(&self) -> f64 {
        self.uplink_latency
    }
    pub fn characteristics(&self) -> &Characteristics {
        &self.spec.characteristics
    }
    pub fn spec(&self) -> &DeviceSpec {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> DeviceSpec {
        DeviceSpec::new("a-0", 2800, 4000, 1000, 10000, 2, 0.0, 107.339, 83.4333)
    }

    #[test]
    fn test_valid_spec() {
        assert_eq!(router().validate(), Ok(()));
        assert_eq!(router().storage, DEFAULT_STORAGE);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut spec = router();
        spec.ram = 0;
        assert!(matches!(spec.validate(), Err(Error::InvalidSpec(_))));
        let mut spec = router();
        spec.uplink_bandwidth = 0;
        assert!(matches!(spec.validate(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_negative_power_rejected() {
        let mut spec = router();
        spec.idle_power = -1.0;
        assert!(matches!(spec.validate(), Err(Error::InvalidSpec(_))));
        let mut spec = router();
        spec.rate_per_mips = f64::NAN;
        assert!(matches!(spec.validate(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_zero_cost_is_meaningful() {
        let mut spec = router();
        spec.busy_power = 0.0;
        spec.idle_power = 0.0;
        assert_eq!(spec.validate(), Ok(()));
    }
}
