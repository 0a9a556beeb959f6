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

//! the hierarchy of fog devices
//!
//! Devices live in a petgraph arena and are identified by their node index.
//! The only edges are uplinks, oriented child -> parent, so the parent of a
//! device is its single outgoing neighbor and its children are the sources of
//! its incoming edges. Levels are supplied by the author of the scenario
//! (tiers may skip levels); the topology only checks that they strictly
//! increase away from the root.

use itertools::Itertools;
use petgraph::algo::has_path_connecting;
use petgraph::prelude::*;
use std::collections::HashMap;

use crate::Error;

mod device;
pub(crate) use device::check_non_negative;
pub use device::{Characteristics, Device, DeviceSpec, DEFAULT_STORAGE};

/// Numeric id of a device; stable for the lifetime of the topology.
pub type DeviceId = NodeIndex;

/// link from a device to its parent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uplink {
    pub latency: f64,
}

#[derive(Clone, Debug)]
pub struct DeviceTopology {
    graph: Graph<Device, Uplink>,
    by_name: HashMap<String, DeviceId>,
}

impl DeviceTopology {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            by_name: HashMap::new(),
        }
    }

    /// Validate `spec` and store a new, unattached device.
    pub fn add_device(&mut self, spec: DeviceSpec) -> Result<DeviceId, Error> {
        spec.validate()?;
        if self.by_name.contains_key(&spec.name) {
            return Err(Error::DuplicateDevice(spec.name));
        }
        let name = spec.name.clone();
        let id = self.graph.add_node(Device::new(spec));
        self.by_name.insert(name, id);
        log::debug!("added device {} (id {})", self.graph[id].name(), id.index());
        Ok(id)
    }

    /// Hang `child` off `parent` with the given uplink latency.
    ///
    /// Checks are ordered: unknown ids, latency, cycles, an existing parent,
    /// and finally the level ordering. Nothing is modified on error.
    pub fn attach(
        &mut self,
        child: DeviceId,
        parent: DeviceId,
        uplink_latency: f64,
    ) -> Result<(), Error> {
        let child_dev = self.lookup(child)?;
        let parent_dev = self.lookup(parent)?;
        check_non_negative(child_dev.name(), "uplink_latency", uplink_latency)?;

        // parent is the child itself or sits below it
        if child == parent || has_path_connecting(&self.graph, parent, child, None) {
            return Err(Error::CycleDetected {
                child: child_dev.name().to_string(),
                parent: parent_dev.name().to_string(),
            });
        }
        if let Some(existing) = self.parent_of(child) {
            return Err(Error::DuplicateParent {
                child: child_dev.name().to_string(),
                parent: self.graph[existing].name().to_string(),
            });
        }
        if parent_dev.level() >= child_dev.level() {
            return Err(Error::InvalidLevel {
                child: child_dev.name().to_string(),
                child_level: child_dev.level(),
                parent: parent_dev.name().to_string(),
                parent_level: parent_dev.level(),
            });
        }

        self.graph.add_edge(
            child,
            parent,
            Uplink {
                latency: uplink_latency,
            },
        );
        self.graph[child].uplink_latency = uplink_latency;
        log::trace!(
            "attached {} -> {} ({} ms)",
            self.graph[child].name(),
            self.graph[parent].name(),
            uplink_latency
        );
        Ok(())
    }

    fn lookup(&self, id: DeviceId) -> Result<&Device, Error> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::UnknownDevice(format!("#{}", id.index())))
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.graph.node_weight(id)
    }

    pub fn id_of(&self, name: &str) -> Option<DeviceId> {
        self.by_name.get(name).copied()
    }

    pub fn device_by_name(&self, name: &str) -> Option<&Device> {
        self.id_of(name).map(|id| &self.graph[id])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn level_of(&self, id: DeviceId) -> Result<u32, Error> {
        self.lookup(id).map(Device::level)
    }

    pub fn parent_of(&self, id: DeviceId) -> Option<DeviceId> {
        self.graph.neighbors_directed(id, Outgoing).next()
    }

    /// Children in the order they were attached.
    pub fn children_of(&self, id: DeviceId) -> Vec<DeviceId> {
        self.graph
            .edges_directed(id, Incoming)
            .sorted_by_key(|e| e.id())
            .map(|e| e.source())
            .collect()
    }

    /// Walk from `id` up to the root, both included.
    pub fn ancestors_of(&self, id: DeviceId) -> Result<Ancestors<'_>, Error> {
        self.lookup(id)?;
        Ok(Ancestors {
            topo: self,
            next: Some(id),
        })
    }

    /// All devices in id (creation) order.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> + '_ {
        self.graph.node_indices().map(move |id| (id, &self.graph[id]))
    }

    /// Devices without a parent.
    pub fn roots(&self) -> Vec<DeviceId> {
        self.graph
            .node_indices()
            .filter(|id| self.parent_of(*id).is_none())
            .collect()
    }

    /// The root, if the topology is a single tree.
    pub fn root(&self) -> Option<DeviceId> {
        match self.roots().as_slice() {
            [root] => Some(*root),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// A finished topology is one non-empty tree. Since every device has at
    /// most one parent and attach refuses cycles, a single root means every
    /// ancestor chain ends there.
    pub fn validate(&self) -> Result<(), Error> {
        let roots = self.roots();
        if roots.len() != 1 {
            return Err(Error::InvalidSpec(format!(
                "topology must have exactly one root, found {}: [{}]",
                roots.len(),
                roots.iter().map(|r| self.graph[*r].name()).join(", ")
            )));
        }
        Ok(())
    }

    pub fn to_graphviz(&self) -> String {
        use petgraph::dot::{Config, Dot};

        let generator = Dot::with_attr_getters(
            &self.graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, edge| format!("label=\"{} ms\"", edge.weight().latency),
            &|_, node| {
                format!(
                    "label=\"{}\n(id: {}, level: {})\"",
                    node.1.name(),
                    node.0.index(),
                    node.1.level()
                )
            },
        );
        format!("{:?}", generator)
    }
}

impl Default for DeviceTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_graphviz())
    }
}

/// Lazy walk up the parent links. Cloning restarts from the current position.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    topo: &'a DeviceTopology,
    next: Option<DeviceId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = DeviceId;

    fn next(&mut self) -> Option<DeviceId> {
        let current = self.next?;
        self.next = self.topo.parent_of(current);
        Some(current)
    }
}
