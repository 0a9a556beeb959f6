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

//! Scenario assembly.
//!
//! A [`ScenarioBuilder`] collects the device tree, the sensors and actuators
//! and the application. [`ScenarioBuilder::build`] checks them and seals them
//! into a [`Scenario`], which placement only reads. A successful placement
//! turns the scenario into a [`Deployment`], the object handed to a runtime.

use std::fmt;

use crate::placement::{self, PlacementInput, PlacementPolicy, PlacementStrategy};
use crate::{
    ApplicationGraph, DeviceId, DeviceSpec, DeviceTopology, Distribution, Error, ModuleMapping,
    SensorActuatorRegistry,
};

#[derive(Clone, Debug, Default)]
pub struct ScenarioBuilder {
    topology: DeviceTopology,
    registry: SensorActuatorRegistry,
    app: Option<ApplicationGraph>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, spec: DeviceSpec) -> Result<DeviceId, Error> {
        self.topology.add_device(spec)
    }

    pub fn attach(&mut self, child: DeviceId, parent: DeviceId, latency: f64) -> Result<(), Error> {
        self.topology.attach(child, parent, latency)
    }

    pub fn add_sensor(
        &mut self,
        name: &str,
        tuple_type: &str,
        gateway: DeviceId,
        latency: f64,
        distribution: Distribution,
    ) -> Result<(), Error> {
        self.registry
            .add_sensor(&self.topology, name, tuple_type, gateway, latency, distribution)
    }

    pub fn add_actuator(
        &mut self,
        name: &str,
        actuator_type: &str,
        gateway: DeviceId,
        latency: f64,
    ) -> Result<(), Error> {
        self.registry
            .add_actuator(&self.topology, name, actuator_type, gateway, latency)
    }

    /// Install the application, replacing any previous one.
    pub fn set_application(&mut self, app: ApplicationGraph) {
        self.app = Some(app);
    }

    pub fn application_mut(&mut self) -> Option<&mut ApplicationGraph> {
        self.app.as_mut()
    }

    pub fn topology(&self) -> &DeviceTopology {
        &self.topology
    }

    pub fn registry(&self) -> &SensorActuatorRegistry {
        &self.registry
    }

    /// Seal the scenario. The tree must have a single root and the
    /// application must be complete.
    pub fn build(self) -> Result<Scenario, Error> {
        self.topology.validate()?;
        let app = self
            .app
            .ok_or_else(|| Error::InvalidSpec("scenario has no application".into()))?;
        app.validate()?;
        log::info!(
            "scenario {}: {} devices, {} sensors, {} actuators, {} modules",
            app.app_id(),
            self.topology.len(),
            self.registry.sensors().len(),
            self.registry.actuators().len(),
            app.modules().count()
        );
        Ok(Scenario {
            topology: self.topology,
            registry: self.registry,
            app,
        })
    }
}

/// A sealed scenario: nothing in it changes after `build`.
#[derive(Clone, Debug)]
pub struct Scenario {
    topology: DeviceTopology,
    registry: SensorActuatorRegistry,
    app: ApplicationGraph,
}

impl Scenario {
    pub fn topology(&self) -> &DeviceTopology {
        &self.topology
    }

    pub fn registry(&self) -> &SensorActuatorRegistry {
        &self.registry
    }

    pub fn app(&self) -> &ApplicationGraph {
        &self.app
    }

    pub fn placement_input(&self) -> PlacementInput<'_> {
        PlacementInput {
            topology: &self.topology,
            registry: &self.registry,
            app: &self.app,
        }
    }

    /// Compute a validated mapping without giving up the scenario.
    pub fn place(
        &self,
        policy: PlacementPolicy,
        initial: &ModuleMapping,
    ) -> Result<ModuleMapping, Error> {
        self.place_with(policy.strategy().as_ref(), initial)
    }

    pub fn place_with(
        &self,
        strategy: &dyn PlacementStrategy,
        initial: &ModuleMapping,
    ) -> Result<ModuleMapping, Error> {
        placement::place(&self.placement_input(), initial, strategy)
    }

    pub fn deploy(
        self,
        policy: PlacementPolicy,
        initial: &ModuleMapping,
    ) -> Result<Deployment, Error> {
        let mapping = self.place(policy, initial)?;
        Ok(Deployment {
            scenario: self,
            mapping,
        })
    }
}

/// A scenario with a mapping that satisfies the placement contract.
#[derive(Clone, Debug)]
pub struct Deployment {
    scenario: Scenario,
    mapping: ModuleMapping,
}

impl Deployment {
    pub fn topology(&self) -> &DeviceTopology {
        self.scenario.topology()
    }

    pub fn registry(&self) -> &SensorActuatorRegistry {
        self.scenario.registry()
    }

    pub fn app(&self) -> &ApplicationGraph {
        self.scenario.app()
    }

    pub fn mapping(&self) -> &ModuleMapping {
        &self.mapping
    }

    pub fn into_parts(self) -> (Scenario, ModuleMapping) {
        (self.scenario, self.mapping)
    }
}

impl fmt::Display for Deployment {
    /// One line per device hosting modules, root first.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Deployment of {}", self.app().app_id())?;
        let mut hosts = self
            .topology()
            .devices()
            .filter(|(_, d)| !self.mapping.modules_on(d.name()).is_empty())
            .collect::<Vec<_>>();
        hosts.sort_by_key(|(id, d)| (d.level(), *id));
        for (_, device) in hosts {
            let modules = self.mapping.modules_on(device.name());
            writeln!(
                f,
                "  [{}] {}: {}",
                device.level(),
                device.name(),
                modules.into_iter().collect::<Vec<_>>().join(", ")
            )?;
        }
        Ok(())
    }
}
