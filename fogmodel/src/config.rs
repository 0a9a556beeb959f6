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
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    AppEdge, AppLoop, ApplicationGraph, Deployment, DeviceId, DeviceSpec, Distribution, Error,
    FractionalSelectivity, Module, ModuleMapping, PlacementPolicy, Scenario, ScenarioBuilder,
};

/// One level of the device tree.
///
/// `count` devices are created under every device of the previous tier. The
/// device fields name the tier: its devices are called `<name>` when the tier
/// and all tiers above it have a single device per parent, and
/// `<name>-<i>-<j>...` otherwise, one index per tier with several devices per
/// parent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TierConfig {
    #[serde(flatten)]
    pub device: DeviceSpec,
    #[serde(default = "default_count")]
    pub count: usize,
    /// latency to the parent, ignored on the root tier
    #[serde(default)]
    pub uplink_latency: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<SensorConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actuators: Vec<ActuatorConfig>,
}

fn default_count() -> usize {
    1
}

/// A sensor attached to every device of a tier. `name` is a prefix, the
/// device suffix is appended.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SensorConfig {
    pub name: String,
    pub tuple_type: String,
    pub latency: f64,
    pub distribution: Distribution,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gateway {
    /// the device the endpoint is declared on
    Device,
    /// that device's parent
    Parent,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::Device
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActuatorConfig {
    pub name: String,
    pub actuator_type: String,
    pub latency: f64,
    #[serde(default)]
    pub gateway: Gateway,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TupleMappingConfig {
    pub module: String,
    pub input_type: String,
    pub output_type: String,
    pub selectivity: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub id: String,
    pub modules: Vec<Module>,
    pub edges: Vec<AppEdge>,
    #[serde(default)]
    pub tuple_mappings: Vec<TupleMappingConfig>,
    #[serde(default)]
    pub loops: Vec<Vec<String>>,
}

impl ApplicationConfig {
    pub fn build(&self) -> Result<ApplicationGraph, Error> {
        let mut app = ApplicationGraph::new(&self.id);
        for module in self.modules.iter() {
            app.add_module_with(module.clone())?;
        }
        for edge in self.edges.iter() {
            app.add_edge(edge.clone())?;
        }
        for m in self.tuple_mappings.iter() {
            app.add_tuple_mapping(
                &m.module,
                &m.input_type,
                &m.output_type,
                FractionalSelectivity::new(m.selectivity)?,
            )?;
        }
        app.set_loops(
            self.loops
                .iter()
                .map(|path| AppLoop::new(path.as_slice()))
                .collect(),
        )?;
        Ok(app)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlacementConfig {
    pub policy: PlacementPolicy,
    /// module -> tiers (or single devices) it is pinned to
    #[serde(default)]
    pub pins: BTreeMap<String, Vec<String>>,
}

/// A complete scenario description, read from a YAML file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// root tier first
    pub tiers: Vec<TierConfig>,
    pub application: ApplicationConfig,
    pub placement: PlacementConfig,
}

impl ScenarioConfig {
    pub fn from_file(file_name: &str) -> Result<Self, Error> {
        let file = File::open(Path::new(file_name))?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(config: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(config)?)
    }

    /// Create the scenario and the initial mapping its pins describe.
    pub fn build(&self) -> Result<(Scenario, ModuleMapping), Error> {
        let mut builder = ScenarioBuilder::new();
        let mut tier_devices: HashMap<&str, Vec<String>> = HashMap::new();
        // (device, name suffix) of the previous tier
        let mut parents: Vec<(Option<DeviceId>, String)> = vec![(None, String::new())];

        for (depth, tier) in self.tiers.iter().enumerate() {
            let tier_name = tier.device.name.as_str();
            if tier.count == 0 || (depth == 0 && tier.count != 1) {
                return Err(Error::InvalidSpec(format!(
                    "tier {}: invalid device count {}",
                    tier_name, tier.count
                )));
            }
            if tier_devices.contains_key(tier_name) {
                return Err(Error::InvalidSpec(format!("tier {} is declared twice", tier_name)));
            }
            let mut current = Vec::new();
            let mut names = Vec::new();
            for (parent, parent_suffix) in parents.iter() {
                for i in 0..tier.count {
                    let suffix = if tier.count > 1 {
                        format!("{}-{}", parent_suffix, i)
                    } else {
                        parent_suffix.clone()
                    };
                    let name = format!("{}{}", tier_name, suffix);
                    let id = builder.add_device(tier.device.with_name(&name))?;
                    if let Some(parent) = parent {
                        builder.attach(id, *parent, tier.uplink_latency)?;
                    }
                    for sensor in tier.sensors.iter() {
                        builder.add_sensor(
                            &endpoint_name(&sensor.name, &suffix, &name),
                            &sensor.tuple_type,
                            id,
                            sensor.latency,
                            sensor.distribution,
                        )?;
                    }
                    for actuator in tier.actuators.iter() {
                        let gateway = match actuator.gateway {
                            Gateway::Device => id,
                            Gateway::Parent => parent.ok_or_else(|| {
                                Error::InvalidSpec(format!(
                                    "actuator {} on root tier {} has no parent gateway",
                                    actuator.name, tier_name
                                ))
                            })?,
                        };
                        builder.add_actuator(
                            &endpoint_name(&actuator.name, &suffix, &name),
                            &actuator.actuator_type,
                            gateway,
                            actuator.latency,
                        )?;
                    }
                    current.push((Some(id), suffix));
                    names.push(name);
                }
            }
            log::debug!("tier {}: {} devices", tier_name, names.len());
            tier_devices.insert(tier_name, names);
            parents = current;
        }

        builder.set_application(self.application.build()?);
        let scenario = builder.build()?;

        let mut initial = ModuleMapping::new();
        for (module, targets) in self.placement.pins.iter() {
            for target in targets {
                match tier_devices.get(target.as_str()) {
                    Some(devices) => devices.iter().for_each(|d| initial.assign(module, d)),
                    None => initial.assign(module, target),
                }
            }
        }
        Ok((scenario, initial))
    }

    /// Build the scenario and place it with the configured policy.
    pub fn deploy(&self) -> Result<Deployment, Error> {
        let (scenario, initial) = self.build()?;
        scenario.deploy(self.placement.policy, &initial)
    }
}

fn endpoint_name(prefix: &str, suffix: &str, device: &str) -> String {
    if suffix.is_empty() {
        format!("{}-{}", prefix, device)
    } else {
        format!("{}{}", prefix, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CAMERAS: &str = "---
tiers:
  - name: cloud
    mips: 44800
    ram: 40000
    uplink_bandwidth: 100
    downlink_bandwidth: 10000
    level: 0
    rate_per_mips: 0.01
    busy_power: 1648
    idle_power: 1332
  - name: a
    count: 1
    mips: 2800
    ram: 4000
    uplink_bandwidth: 1000
    downlink_bandwidth: 10000
    level: 1
    rate_per_mips: 0.0
    busy_power: 107.339
    idle_power: 83.4333
    uplink_latency: 2.0
  - name: c
    count: 2
    mips: 500
    ram: 1000
    uplink_bandwidth: 10000
    downlink_bandwidth: 10000
    level: 2
    rate_per_mips: 0.0
    busy_power: 87.53
    idle_power: 82.44
    uplink_latency: 2.0
    sensors:
      - name: s
        tuple_type: CAMERA
        latency: 1.0
        distribution:
          deterministic: 2.0
    actuators:
      - name: ptz
        actuator_type: PTZ_CONTROL
        latency: 1.0
        gateway: parent
application:
  id: watch
  modules:
    - name: capture
      ram: 10
    - name: detect
      ram: 10
  edges:
    - source: CAMERA
      destination: capture
      tuple_cpu_length: 1000
      tuple_nw_length: 500
      tuple_type: CAMERA
      direction: UP
      kind: SENSOR
    - source: capture
      destination: detect
      tuple_cpu_length: 1000
      tuple_nw_length: 500
      tuple_type: slots
      direction: UP
      kind: MODULE
    - source: detect
      destination: PTZ_CONTROL
      tuple_cpu_length: 28
      tuple_nw_length: 100
      tuple_type: PTZ_PARAMS
      direction: UP
      kind: ACTUATOR
      periodicity: 100
  tuple_mappings:
    - module: capture
      input_type: CAMERA
      output_type: slots
      selectivity: 1.0
    - module: detect
      input_type: slots
      output_type: PTZ_PARAMS
      selectivity: 1.0
  loops:
    - [CAMERA, capture, detect, PTZ_CONTROL]
placement:
  policy: edgewards
  pins:
    capture: [c]
    detect: [a]
";

    #[test]
    fn read_yaml_config() {
        let config = ScenarioConfig::from_str(TWO_CAMERAS).unwrap();
        assert_eq!(config.tiers.len(), 3);
        assert_eq!(config.tiers[0].count, 1);
        assert_eq!(config.tiers[2].device.ram, 1000);
        assert_eq!(config.tiers[2].device.storage, crate::DEFAULT_STORAGE);
        assert_eq!(config.tiers[2].actuators[0].gateway, Gateway::Parent);
        assert_eq!(
            config.tiers[2].sensors[0].distribution,
            Distribution::Deterministic(2.0)
        );
        assert_eq!(config.application.edges[2].periodicity, Some(100.0));
        assert_eq!(config.placement.policy, PlacementPolicy::Edgewards);
    }

    #[test]
    fn test_build_names_and_pins() {
        let _logger = env_logger::builder().is_test(true).try_init();
        let config = ScenarioConfig::from_str(TWO_CAMERAS).unwrap();
        let (scenario, initial) = config.build().unwrap();
        let topo = scenario.topology();
        for name in ["cloud", "a", "c-0", "c-1"] {
            assert!(topo.contains(name), "{}", name);
        }
        let router = topo.id_of("a").unwrap();
        assert_eq!(scenario.registry().gateway_of("ptz-1"), Some((router, 1.0)));
        assert!(scenario.registry().sensor("s-0").is_some());
        assert_eq!(initial.devices_for("capture").len(), 2);
        assert!(initial.contains("detect", "a"));
        assert_eq!(scenario.app().loops().len(), 1);
    }

    #[test]
    fn test_deploy_edgewards() {
        let deployment = ScenarioConfig::from_str(TWO_CAMERAS)
            .unwrap()
            .deploy()
            .unwrap();
        let mapping = deployment.mapping();
        assert!(mapping.contains("capture", "c-0"));
        assert!(mapping.contains("capture", "c-1"));
        assert_eq!(
            mapping.devices_for("detect").into_iter().collect::<Vec<_>>(),
            vec!["a"]
        );
    }

    #[test]
    fn test_root_tier_count() {
        let mut config = ScenarioConfig::from_str(TWO_CAMERAS).unwrap();
        config.tiers[0].count = 2;
        assert!(matches!(config.build(), Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            ScenarioConfig::from_str("tiers: 3"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_file("/nonexistent/scenario.yaml"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn write_yaml_config() {
        let config = ScenarioConfig::from_str(TWO_CAMERAS).unwrap();
        let text = serde_yaml::to_string(&config).unwrap();
        let again = ScenarioConfig::from_str(&text).unwrap();
        assert_eq!(again.tiers.len(), config.tiers.len());
        assert_eq!(again.placement.pins, config.placement.pins);
    }
}
