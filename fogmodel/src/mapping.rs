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
use std::collections::{BTreeMap, BTreeSet};

use crate::{DeviceTopology, Error};

/// Which devices host which modules.
///
/// Plain data: names are only checked against a topology when the mapping is
/// consumed, so a mapping may be written before the topology exists. Both
/// directions are kept in ordered maps, so iteration is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "BTreeMap<String, BTreeSet<String>>", into = "BTreeMap<String, BTreeSet<String>>")]
pub struct ModuleMapping {
    module_to_devices: BTreeMap<String, BTreeSet<String>>,
    device_to_modules: BTreeMap<String, BTreeSet<String>>,
}

impl ModuleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an instance of `module` on `device`; assigning twice is a no-op.
    pub fn assign(&mut self, module: &str, device: &str) {
        self.module_to_devices
            .entry(module.to_string())
            .or_default()
            .insert(device.to_string());
        self.device_to_modules
            .entry(device.to_string())
            .or_default()
            .insert(module.to_string());
    }

    pub fn devices_for(&self, module: &str) -> BTreeSet<&str> {
        self.module_to_devices
            .get(module)
            .map(|d| d.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn modules_on(&self, device: &str) -> BTreeSet<&str> {
        self.device_to_modules
            .get(device)
            .map(|m| m.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, module: &str, device: &str) -> bool {
        self.module_to_devices
            .get(module)
            .map_or(false, |d| d.contains(device))
    }

    /// Mapped modules, sorted by name.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.module_to_devices.keys().map(String::as_str)
    }

    /// Devices hosting at least one module, sorted by name.
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.device_to_modules.keys().map(String::as_str)
    }

    /// (module, device) pairs sorted by module, then device.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.module_to_devices
            .iter()
            .flat_map(|(m, ds)| ds.iter().map(move |d| (m.as_str(), d.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.module_to_devices.is_empty()
    }

    /// Every referenced device must exist in `topology`.
    pub fn validate_devices(&self, topology: &DeviceTopology) -> Result<(), Error> {
        match self.devices().find(|d| !topology.contains(d)) {
            Some(missing) => Err(Error::UnknownDevice(missing.to_string())),
            None => Ok(()),
        }
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for ModuleMapping {
    fn from(map: BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut mapping = Self::new();
        for (module, devices) in map.iter() {
            mapping.module_to_devices.entry(module.clone()).or_default();
            for device in devices {
                mapping.assign(module, device);
            }
        }
        mapping
    }
}

impl From<ModuleMapping> for BTreeMap<String, BTreeSet<String>> {
    fn from(mapping: ModuleMapping) -> Self {
        mapping.module_to_devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceSpec;

    #[test]
    fn test_both_directions_agree() {
        let mut mapping = ModuleMapping::new();
        mapping.assign("capture", "c-0-0");
        mapping.assign("capture", "c-0-1");
        mapping.assign("detect", "a-0");
        mapping.assign("detect", "a-0");
        mapping.assign("detect", "c-0-0");

        for (module, device) in [
            ("capture", "c-0-0"),
            ("capture", "c-0-1"),
            ("detect", "a-0"),
            ("detect", "c-0-0"),
        ] {
            assert!(mapping.devices_for(module).contains(device));
            assert!(mapping.modules_on(device).contains(module));
        }
        for module in mapping.modules() {
            for device in mapping.devices() {
                assert_eq!(
                    mapping.devices_for(module).contains(device),
                    mapping.modules_on(device).contains(module)
                );
            }
        }
        assert_eq!(mapping.devices_for("detect").len(), 2);
        assert!(mapping.devices_for("unknown").is_empty());
        assert_eq!(mapping.assignments().count(), 4);
    }

    #[test]
    fn test_validate_devices() {
        let mut topo = DeviceTopology::new();
        topo.add_device(DeviceSpec::new(
            "cloud", 44800, 40000, 100, 10000, 0, 0.01, 1648.0, 1332.0,
        ))
        .unwrap();
        let mut mapping = ModuleMapping::new();
        mapping.assign("detect", "cloud");
        assert_eq!(mapping.validate_devices(&topo), Ok(()));
        mapping.assign("capture", "c-0-0");
        assert_eq!(
            mapping.validate_devices(&topo),
            Err(Error::UnknownDevice("c-0-0".into()))
        );
    }

    #[test]
    fn test_yaml() {
        let mapping: ModuleMapping = serde_yaml::from_str(
            "
picture-capture: [c-0-0, c-0-1]
slot-detector: [a-0]
",
        )
        .unwrap();
        assert_eq!(
            mapping.modules_on("c-0-1").into_iter().collect::<Vec<_>>(),
            vec!["picture-capture"]
        );
        let text = serde_yaml::to_string(&mapping).unwrap();
        assert!(text.contains("slot-detector"));
    }

    #[test]
    fn test_yaml_keeps_modules_without_devices() {
        let mapping: ModuleMapping = serde_yaml::from_str(
            "
picture-capture: [c-0-0]
slot-detector: []
",
        )
        .unwrap();
        assert_eq!(
            mapping.modules().collect::<Vec<_>>(),
            vec!["picture-capture", "slot-detector"]
        );
        assert!(mapping.devices_for("slot-detector").is_empty());
        assert_eq!(mapping.assignments().count(), 1);

        let text = serde_yaml::to_string(&mapping).unwrap();
        let back: ModuleMapping = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, mapping);
    }
}
