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

use std::collections::{HashMap, HashSet, VecDeque};

use super::{PlacementInput, PlacementStrategy};
use crate::{Device, DeviceId, Error, Module, ModuleMapping, TupleDirection};

/// Push modules as close to the sensors as capacity allows.
///
/// Sensors are visited in registration order. For each one the path from its
/// gateway to the root is walked, and the modules fed by its tuple type are
/// placed in breadth-first order of the application graph:
///
/// - a module already hosted on the path, no lower than its upstream modules,
///   is reused,
/// - otherwise it goes to the first device with enough free RAM, starting at
///   the highest device hosting one of its upstream modules (via `Up` edges),
///   or at the device the initial mapping names for it if that is higher,
/// - if no device up to and including the root fits, placement fails.
///
/// Initial entries for modules no registered sensor feeds are carried over as
/// they are, within the capacity of the named devices.
#[derive(Clone, Copy, Debug, Default)]
pub struct Edgewards;

struct State<'a> {
    input: &'a PlacementInput<'a>,
    initial: &'a ModuleMapping,
    mapping: ModuleMapping,
    used: HashMap<DeviceId, u64>,
}

impl<'a> State<'a> {
    /// Host `module` on `device` unless it is already there. Returns false if
    /// the device lacks the RAM.
    fn try_host(&mut self, module: &Module, id: DeviceId, device: &Device) -> bool {
        if self.mapping.contains(&module.name, device.name()) {
            return true;
        }
        let used = self.used.entry(id).or_insert(0);
        let total = match used.checked_add(module.ram) {
            Some(total) if total <= device.ram() => total,
            _ => {
                log::trace!(
                    "{} does not fit on {} ({} of {} in use)",
                    module.name,
                    device.name(),
                    used,
                    device.ram()
                );
                return false;
            }
        };
        *used = total;
        self.mapping.assign(&module.name, device.name());
        log::debug!("{} placed on {}", module.name, device.name());
        true
    }

    /// Place `module` somewhere on `path` at or above `floor`, returning the
    /// index it ended up at.
    fn place_on_path(
        &mut self,
        module: &Module,
        path: &[(DeviceId, &Device)],
        floor: usize,
    ) -> Result<usize, Error> {
        if let Some(idx) =
            (floor..path.len()).find(|i| self.mapping.contains(&module.name, path[*i].1.name()))
        {
            return Ok(idx);
        }
        let start = (floor..path.len())
            .find(|i| self.initial.contains(&module.name, path[*i].1.name()))
            .unwrap_or(floor);
        let mut attempted = Vec::new();
        for (idx, (id, device)) in path.iter().enumerate().skip(start) {
            if self.try_host(module, *id, device) {
                return Ok(idx);
            }
            attempted.push(device.name().to_string());
        }
        log::error!("no device between the edge and the root fits {}", module.name);
        Err(Error::InsufficientCapacity {
            module: module.name.clone(),
            attempted,
        })
    }

    fn place_for_sensor(&mut self, sensor_type: &str, gateway: DeviceId) -> Result<(), Error> {
        let topology = self.input.topology;
        let app = self.input.app;
        let path = topology
            .ancestors_of(gateway)?
            .filter_map(|id| topology.device(id).map(|d| (id, d)))
            .collect::<Vec<_>>();

        let mut placed_at: HashMap<&str, usize> = HashMap::new();
        let mut queue = VecDeque::from([sensor_type]);
        while let Some(name) = queue.pop_front() {
            for edge in app.edges_from(name) {
                let module = match app.module(&edge.destination) {
                    Some(m) => m,
                    None => continue,
                };
                if placed_at.contains_key(module.name.as_str()) {
                    continue;
                }
                let floor = app
                    .edges_to(&module.name)
                    .filter(|e| e.direction == TupleDirection::Up)
                    .filter_map(|e| placed_at.get(e.source.as_str()).copied())
                    .max()
                    .unwrap_or(0);
                let idx = self.place_on_path(module, &path, floor)?;
                placed_at.insert(module.name.as_str(), idx);
                queue.push_back(module.name.as_str());
            }
        }
        Ok(())
    }
}

impl PlacementStrategy for Edgewards {
    fn name(&self) -> &'static str {
        "edgewards"
    }

    fn place(
        &self,
        input: &PlacementInput,
        initial: &ModuleMapping,
    ) -> Result<ModuleMapping, Error> {
        initial.validate_devices(input.topology)?;
        let mut state = State {
            input,
            initial,
            mapping: ModuleMapping::new(),
            used: HashMap::new(),
        };

        let sensor_types = input.app.sensor_types();
        for sensor in input.registry.sensors() {
            if !sensor_types.contains(&sensor.tuple_type.as_str()) {
                log::debug!(
                    "sensor {} emits {}, which {} does not consume",
                    sensor.name,
                    sensor.tuple_type,
                    input.app.app_id()
                );
                continue;
            }
            state.place_for_sensor(&sensor.tuple_type, sensor.gateway)?;
        }

        let walked = state
            .mapping
            .modules()
            .map(str::to_string)
            .collect::<HashSet<_>>();
        for (module_name, device_name) in initial.assignments() {
            if walked.contains(module_name) {
                continue;
            }
            let module = input
                .app
                .module(module_name)
                .ok_or_else(|| Error::UnknownModule(module_name.to_string()))?;
            let id = input
                .topology
                .id_of(device_name)
                .ok_or_else(|| Error::UnknownDevice(device_name.to_string()))?;
            let device = input
                .topology
                .device(id)
                .ok_or_else(|| Error::UnknownDevice(device_name.to_string()))?;
            if !state.try_host(module, id, device) {
                return Err(Error::InsufficientCapacity {
                    module: module_name.to_string(),
                    attempted: vec![device_name.to_string()],
                });
            }
        }
        Ok(state.mapping)
    }
}
