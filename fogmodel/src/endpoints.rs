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

//! sensors and actuators bound to gateway devices

use std::collections::HashMap;

use crate::topology::check_non_negative;
use crate::{DeviceId, DeviceTopology, Distribution, Error};

#[derive(Clone, Debug, PartialEq)]
pub struct Sensor {
    pub name: String,
    /// type of the tuples this sensor emits
    pub tuple_type: String,
    pub gateway: DeviceId,
    pub latency: f64,
    pub distribution: Distribution,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actuator {
    pub name: String,
    pub actuator_type: String,
    pub gateway: DeviceId,
    pub latency: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EndpointRef {
    Sensor(usize),
    Actuator(usize),
}

/// Sensors and actuators share a single namespace.
#[derive(Clone, Debug, Default)]
pub struct SensorActuatorRegistry {
    sensors: Vec<Sensor>,
    actuators: Vec<Actuator>,
    by_name: HashMap<String, EndpointRef>,
}

impl SensorActuatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_new(
        &self,
        topology: &DeviceTopology,
        name: &str,
        gateway: DeviceId,
        latency: f64,
    ) -> Result<(), Error> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateEndpoint(name.to_string()));
        }
        if topology.device(gateway).is_none() {
            return Err(Error::UnknownDevice(format!("#{}", gateway.index())));
        }
        check_non_negative(name, "latency", latency)
    }

    pub fn add_sensor(
        &mut self,
        topology: &DeviceTopology,
        name: &str,
        tuple_type: &str,
        gateway: DeviceId,
        latency: f64,
        distribution: Distribution,
    ) -> Result<(), Error> {
        self.check_new(topology, name, gateway, latency)?;
        distribution.validate()?;
        self.by_name
            .insert(name.to_string(), EndpointRef::Sensor(self.sensors.len()));
        self.sensors.push(Sensor {
            name: name.to_string(),
            tuple_type: tuple_type.to_string(),
            gateway,
            latency,
            distribution,
        });
        log::trace!("sensor {} ({}) on device #{}", name, tuple_type, gateway.index());
        Ok(())
    }

    pub fn add_actuator(
        &mut self,
        topology: &DeviceTopology,
        name: &str,
        actuator_type: &str,
        gateway: DeviceId,
        latency: f64,
    ) -> Result<(), Error> {
        self.check_new(topology, name, gateway, latency)?;
        self.by_name.insert(
            name.to_string(),
            EndpointRef::Actuator(self.actuators.len()),
        );
        self.actuators.push(Actuator {
            name: name.to_string(),
            actuator_type: actuator_type.to_string(),
            gateway,
            latency,
        });
        log::trace!(
            "actuator {} ({}) on device #{}",
            name,
            actuator_type,
            gateway.index()
        );
        Ok(())
    }

    pub fn sensor(&self, name: &str) -> Option<&Sensor> {
        match self.by_name.get(name) {
            Some(EndpointRef::Sensor(i)) => Some(&self.sensors[*i]),
            _ => None,
        }
    }

    pub fn actuator(&self, name: &str) -> Option<&Actuator> {
        match self.by_name.get(name) {
            Some(EndpointRef::Actuator(i)) => Some(&self.actuators[*i]),
            _ => None,
        }
    }

    /// Gateway device and link latency of a sensor or actuator.
    pub fn gateway_of(&self, name: &str) -> Option<(DeviceId, f64)> {
        match self.by_name.get(name)? {
            EndpointRef::Sensor(i) => Some((self.sensors[*i].gateway, self.sensors[*i].latency)),
            EndpointRef::Actuator(i) => {
                Some((self.actuators[*i].gateway, self.actuators[*i].latency))
            }
        }
    }

    /// Sensors in registration order.
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// Actuators in registration order.
    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    pub fn sensors_of_type<'a>(&'a self, tuple_type: &'a str) -> impl Iterator<Item = &'a Sensor> {
        self.sensors
            .iter()
            .filter(move |s| s.tuple_type == tuple_type)
    }

    pub fn actuators_of_type<'a>(
        &'a self,
        actuator_type: &'a str,
    ) -> impl Iterator<Item = &'a Actuator> {
        self.actuators
            .iter()
            .filter(move |a| a.actuator_type == actuator_type)
    }

    /// Names of the sensors and actuators whose gateway is `device`.
    pub fn endpoints_on(&self, device: DeviceId) -> Vec<&str> {
        self.sensors
            .iter()
            .filter(|s| s.gateway == device)
            .map(|s| s.name.as_str())
            .chain(
                self.actuators
                    .iter()
                    .filter(|a| a.gateway == device)
                    .map(|a| a.name.as_str()),
            )
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
