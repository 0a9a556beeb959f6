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
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{ApplicationGraph, DeviceTopology, Error, ModuleMapping, SensorActuatorRegistry};

mod edgewards;
mod fixed;

pub use edgewards::Edgewards;
pub use fixed::FixedMapping;

/// The frozen inputs every strategy works from.
#[derive(Clone, Copy, Debug)]
pub struct PlacementInput<'a> {
    pub topology: &'a DeviceTopology,
    pub registry: &'a SensorActuatorRegistry,
    pub app: &'a ApplicationGraph,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// The supplied mapping is the placement. Used, for instance, to put
    /// every stage in the cloud.
    Mapping,

    /// Walk from every sensor toward the root and host each module on the
    /// first device of the path with enough free RAM. Modules named in the
    /// supplied mapping start their search at the named device.
    Edgewards,
}

impl PlacementPolicy {
    pub fn strategy(&self) -> Box<dyn PlacementStrategy> {
        match self {
            Self::Mapping => Box::new(FixedMapping),
            Self::Edgewards => Box::new(Edgewards),
        }
    }
}

impl FromStr for PlacementPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mapping" | "cloud" => Ok(Self::Mapping),
            "edgewards" | "edge" => Ok(Self::Edgewards),
            _ => Err(Error::InvalidSpec(format!("invalid placement policy: {}", s))),
        }
    }
}

/// A way of turning an (optionally empty) initial mapping into a complete
/// one.
///
/// Implementations must be deterministic for a given input: same topology,
/// registry, application and initial mapping, same result. Their output is
/// checked with [`validate_placement`] before anyone sees it.
pub trait PlacementStrategy {
    fn name(&self) -> &'static str;

    fn place(
        &self,
        input: &PlacementInput,
        initial: &ModuleMapping,
    ) -> Result<ModuleMapping, Error>;
}

/// Run `strategy` and check its result against the placement contract.
pub fn place(
    input: &PlacementInput,
    initial: &ModuleMapping,
    strategy: &dyn PlacementStrategy,
) -> Result<ModuleMapping, Error> {
    let mapping = strategy.place(input, initial)?;
    validate_placement(input, &mapping)?;
    log::info!(
        "{}: {} placement hosts {} module instances on {} devices",
        input.app.app_id(),
        strategy.name(),
        mapping.assignments().count(),
        mapping.devices().count()
    );
    for (module, device) in mapping.assignments() {
        log::debug!("  {} -> {}", module, device);
    }
    Ok(mapping)
}

/// RAM claimed on each device by the modules `mapping` puts there.
pub fn ram_in_use(
    app: &ApplicationGraph,
    mapping: &ModuleMapping,
) -> Result<BTreeMap<String, u64>, Error> {
    let mut usage = BTreeMap::new();
    for (module, device) in mapping.assignments() {
        let ram = app
            .module(module)
            .ok_or_else(|| Error::UnknownModule(module.to_string()))?
            .ram;
        let used = usage.entry(device.to_string()).or_insert(0u64);
        *used = used
            .checked_add(ram)
            .ok_or_else(|| Error::InsufficientCapacity {
                module: module.to_string(),
                attempted: vec![device.to_string()],
            })?;
    }
    Ok(usage)
}

/// The placement contract, independent of the strategy that produced the
/// mapping:
///
/// - every device and module named by the mapping exists,
/// - every module reachable from a sensor is hosted somewhere,
/// - no device holds more module RAM than it has.
pub fn validate_placement(input: &PlacementInput, mapping: &ModuleMapping) -> Result<(), Error> {
    mapping.validate_devices(input.topology)?;
    if let Some(unknown) = mapping.modules().find(|m| input.app.module(m).is_none()) {
        return Err(Error::UnknownModule(unknown.to_string()));
    }
    for module in input.app.modules_reachable_from_sensors() {
        if mapping.devices_for(module).is_empty() {
            return Err(Error::UnplacedModule(module.to_string()));
        }
    }
    for device_name in mapping.devices() {
        let device = input
            .topology
            .device_by_name(device_name)
            .ok_or_else(|| Error::UnknownDevice(device_name.to_string()))?;
        let mut used = Some(0u64);
        for module in mapping.modules_on(device_name) {
            // existence was checked above
            let ram = input.app.module(module).map_or(0, |m| m.ram);
            used = used.and_then(|u| u.checked_add(ram));
            if used.map_or(true, |u| u > device.ram()) {
                log::error!(
                    "device {} needs more RAM for its modules than its {}",
                    device_name,
                    device.ram()
                );
                return Err(Error::InsufficientCapacity {
                    module: module.to_string(),
                    attempted: vec![device_name.to_string()],
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppEdge, DeviceSpec, EdgeKind, TupleDirection};

    fn device(name: &str, level: u32, ram: u64) -> DeviceSpec {
        DeviceSpec::new(name, 1000, ram, 1000, 1000, level, 0.0, 100.0, 80.0)
    }

    /// router(4000) <- camera(1000), plus a tiny device next to the camera
    fn topology() -> DeviceTopology {
        let mut topo = DeviceTopology::new();
        let router = topo.add_device(device("router", 2, 4000)).unwrap();
        let camera = topo.add_device(device("camera", 3, 1000)).unwrap();
        let tiny = topo.add_device(device("tiny", 3, 5)).unwrap();
        topo.attach(camera, router, 2.0).unwrap();
        topo.attach(tiny, router, 2.0).unwrap();
        topo
    }

    fn app() -> ApplicationGraph {
        let mut app = ApplicationGraph::new("capture-detect");
        app.add_module("capture", 10).unwrap();
        app.add_module("detect", 10).unwrap();
        app.add_edge(AppEdge::new(
            "capture",
            "detect",
            1000.0,
            500.0,
            "slots",
            TupleDirection::Up,
            EdgeKind::Module,
        ))
        .unwrap();
        app
    }

    #[test]
    fn test_fixed_mapping_capacity() {
        let _logger = env_logger::builder().is_test(true).try_init();
        let topo = topology();
        let registry = SensorActuatorRegistry::new();
        let app = app();
        let input = PlacementInput {
            topology: &topo,
            registry: &registry,
            app: &app,
        };

        let mut mapping = ModuleMapping::new();
        mapping.assign("capture", "camera");
        mapping.assign("detect", "camera");
        assert_eq!(
            place(&input, &mapping, PlacementPolicy::Mapping.strategy().as_ref()),
            Ok(mapping.clone())
        );
        assert_eq!(ram_in_use(&app, &mapping).unwrap()["camera"], 20);

        let mut mapping = ModuleMapping::new();
        mapping.assign("capture", "camera");
        mapping.assign("detect", "tiny");
        assert_eq!(
            place(&input, &mapping, &FixedMapping),
            Err(Error::InsufficientCapacity {
                module: "detect".into(),
                attempted: vec!["tiny".into()]
            })
        );
    }

    #[test]
    fn test_ram_overflow_is_rejected() {
        let mut topo = DeviceTopology::new();
        topo.add_device(device("cloud", 0, u64::MAX)).unwrap();
        let registry = SensorActuatorRegistry::new();
        let mut app = ApplicationGraph::new("overflow");
        app.add_module("a", u64::MAX).unwrap();
        app.add_module("b", 1).unwrap();
        let input = PlacementInput {
            topology: &topo,
            registry: &registry,
            app: &app,
        };

        let mut mapping = ModuleMapping::new();
        mapping.assign("a", "cloud");
        assert_eq!(validate_placement(&input, &mapping), Ok(()));
        mapping.assign("b", "cloud");
        assert_eq!(
            validate_placement(&input, &mapping),
            Err(Error::InsufficientCapacity {
                module: "b".into(),
                attempted: vec!["cloud".into()]
            })
        );
        assert!(place(&input, &mapping, &FixedMapping).is_err());
        assert!(ram_in_use(&app, &mapping).is_err());
    }

    #[test]
    fn test_unknown_names() {
        let topo = topology();
        let registry = SensorActuatorRegistry::new();
        let app = app();
        let input = PlacementInput {
            topology: &topo,
            registry: &registry,
            app: &app,
        };
        let mut mapping = ModuleMapping::new();
        mapping.assign("capture", "nowhere");
        assert_eq!(
            validate_placement(&input, &mapping),
            Err(Error::UnknownDevice("nowhere".into()))
        );
        let mut mapping = ModuleMapping::new();
        mapping.assign("ghost", "camera");
        assert_eq!(
            validate_placement(&input, &mapping),
            Err(Error::UnknownModule("ghost".into()))
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "Edgewards".parse::<PlacementPolicy>(),
            Ok(PlacementPolicy::Edgewards)
        );
        assert_eq!("cloud".parse::<PlacementPolicy>(), Ok(PlacementPolicy::Mapping));
        assert!("random".parse::<PlacementPolicy>().is_err());
    }
}
