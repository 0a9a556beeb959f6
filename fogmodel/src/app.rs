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

//! application specification
//!
//! An application is a directed graph of named endpoints: sensor tuple types,
//! modules and actuator types. Edges are added by name and resolved on
//! insertion, so a dangling name fails right away instead of surfacing in the
//! runtime. Sensor and actuator types are not declared up front: the first
//! `Sensor`-kind edge leaving a new name declares it a sensor type, and the
//! first `Actuator`-kind edge reaching a new name declares an actuator type.
//!
//! All traversals report edges and modules in declaration order.

use itertools::Itertools;
use petgraph::prelude::*;
use petgraph::visit::{Bfs, Reversed, Walker};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::Error;

mod edge;
mod loops;
mod selectivity;

pub use edge::{AppEdge, EdgeKind, TupleDirection};
pub use loops::AppLoop;
pub use selectivity::{FractionalSelectivity, Selectivity, TupleMapping};

/// A processing stage.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Module {
    pub name: String,
    /// RAM required by one instance; the only resource the placement checks
    pub ram: u64,
    #[serde(default = "Module::default_mips")]
    pub mips: u64,
    #[serde(default = "Module::default_size")]
    pub size: u64,
    #[serde(default = "Module::default_bandwidth")]
    pub bandwidth: u64,
}

impl Module {
    pub fn new(name: &str, ram: u64) -> Self {
        Self {
            name: name.to_string(),
            ram,
            mips: Self::default_mips(),
            size: Self::default_size(),
            bandwidth: Self::default_bandwidth(),
        }
    }
    fn default_mips() -> u64 {
        1000
    }
    fn default_size() -> u64 {
        10000
    }
    fn default_bandwidth() -> u64 {
        1000
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Role {
    Sensor,
    Module(Module),
    Actuator,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoleTag {
    Sensor,
    Module,
    Actuator,
}

impl Role {
    fn tag(&self) -> RoleTag {
        match self {
            Self::Sensor => RoleTag::Sensor,
            Self::Module(_) => RoleTag::Module,
            Self::Actuator => RoleTag::Actuator,
        }
    }
}

#[derive(Clone, Debug)]
struct Endpoint {
    name: String,
    role: Role,
}

#[derive(Clone, Debug)]
pub struct ApplicationGraph {
    app_id: String,
    graph: Graph<Endpoint, AppEdge>,
    by_name: HashMap<String, NodeIndex>,
    tuple_mappings: Vec<TupleMapping>,
    loops: Vec<AppLoop>,
}

impl ApplicationGraph {
    pub fn new(app_id: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            graph: Graph::new(),
            by_name: HashMap::new(),
            tuple_mappings: Vec::new(),
            loops: Vec::new(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn add_module(&mut self, name: &str, ram: u64) -> Result<(), Error> {
        self.add_module_with(Module::new(name, ram))
    }

    pub fn add_module_with(&mut self, module: Module) -> Result<(), Error> {
        if module.name.is_empty() {
            return Err(Error::InvalidSpec("module name is empty".into()));
        }
        if module.ram == 0 || module.mips == 0 {
            return Err(Error::InvalidSpec(format!(
                "{}: ram and mips must be positive",
                module.name
            )));
        }
        if self.by_name.contains_key(&module.name) {
            return Err(Error::DuplicateModule(module.name));
        }
        let name = module.name.clone();
        let idx = self.graph.add_node(Endpoint {
            name: name.clone(),
            role: Role::Module(module),
        });
        self.by_name.insert(name, idx);
        Ok(())
    }

    fn tag_of(&self, name: &str) -> Option<RoleTag> {
        self.by_name
            .get(name)
            .map(|idx| self.graph[*idx].role.tag())
    }

    /// Check one endpoint of `edge` against the role its kind requires.
    ///
    /// A missing name is fine when the edge kind may declare it.
    fn check_endpoint(
        &self,
        edge: &AppEdge,
        name: &str,
        expected: RoleTag,
        may_declare: bool,
    ) -> Result<(), Error> {
        match self.tag_of(name) {
            Some(tag) if tag == expected => Ok(()),
            Some(_) => Err(Error::EdgeKindMismatch {
                source: edge.source.clone(),
                destination: edge.destination.clone(),
                kind: edge.kind,
            }),
            None if may_declare => Ok(()),
            None => Err(Error::UnresolvedEndpoint(name.to_string())),
        }
    }

    fn resolve_or_declare(&mut self, name: &str, role: Role) -> NodeIndex {
        if let Some(idx) = self.by_name.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(Endpoint {
            name: name.to_string(),
            role,
        });
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, edge: AppEdge) -> Result<(), Error> {
        edge.validate()?;
        let (src_role, dst_role) = match edge.kind {
            EdgeKind::Sensor => (RoleTag::Sensor, RoleTag::Module),
            EdgeKind::Module => (RoleTag::Module, RoleTag::Module),
            EdgeKind::Actuator => (RoleTag::Module, RoleTag::Actuator),
        };
        self.check_endpoint(&edge, &edge.source, src_role, src_role == RoleTag::Sensor)?;
        self.check_endpoint(
            &edge,
            &edge.destination,
            dst_role,
            dst_role == RoleTag::Actuator,
        )?;

        let src = self.resolve_or_declare(&edge.source, Role::Sensor);
        let dst = self.resolve_or_declare(&edge.destination, Role::Actuator);
        log::trace!(
            "{}: edge {} -> {} ({})",
            self.app_id,
            edge.source,
            edge.destination,
            edge.tuple_type
        );
        self.graph.add_edge(src, dst, edge);
        Ok(())
    }

    /// Declare that `module` turns `input_type` tuples into `output_type`
    /// tuples with the given selectivity. Both types must already flow
    /// into/out of the module; a repeated declaration replaces the previous
    /// selectivity.
    pub fn add_tuple_mapping<S: Selectivity + 'static>(
        &mut self,
        module: &str,
        input_type: &str,
        output_type: &str,
        selectivity: S,
    ) -> Result<(), Error> {
        if self.module(module).is_none() {
            return Err(Error::UnknownModule(module.to_string()));
        }
        if !self.edges_to(module).any(|e| e.tuple_type == input_type) {
            return Err(Error::UnknownType {
                module: module.to_string(),
                tuple_type: input_type.to_string(),
            });
        }
        if !self.edges_from(module).any(|e| e.tuple_type == output_type) {
            return Err(Error::UnknownType {
                module: module.to_string(),
                tuple_type: output_type.to_string(),
            });
        }
        let mapping = TupleMapping {
            module: module.to_string(),
            input_type: input_type.to_string(),
            output_type: output_type.to_string(),
            selectivity: Arc::new(selectivity),
        };
        match self.tuple_mappings.iter_mut().find(|m| {
            m.module == module && m.input_type == input_type && m.output_type == output_type
        }) {
            Some(existing) => *existing = mapping,
            None => self.tuple_mappings.push(mapping),
        }
        Ok(())
    }

    /// Replace the application loops. Either every loop is valid and all of
    /// them are installed, or nothing changes.
    pub fn set_loops(&mut self, loops: Vec<AppLoop>) -> Result<(), Error> {
        for l in loops.iter() {
            if l.path().len() < 2 {
                return Err(Error::InvalidSpec(format!(
                    "loop {:?} needs at least two elements",
                    l.path()
                )));
            }
            for name in l.path() {
                if !self.by_name.contains_key(name) {
                    return Err(Error::UnresolvedEndpoint(name.clone()));
                }
            }
            for (from, to) in l.hops() {
                if self
                    .graph
                    .find_edge(self.by_name[from], self.by_name[to])
                    .is_none()
                {
                    return Err(Error::DisconnectedLoop {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
        }
        self.loops = loops;
        for (id, l) in self.loops.iter_mut().enumerate() {
            l.set_id(id);
        }
        Ok(())
    }

    pub fn loops(&self) -> &[AppLoop] {
        &self.loops
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        match &self.graph[*self.by_name.get(name)?].role {
            Role::Module(m) => Some(m),
            _ => None,
        }
    }

    /// Modules in declaration order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.graph.node_weights().filter_map(|n| match &n.role {
            Role::Module(m) => Some(m),
            _ => None,
        })
    }

    fn names_with(&self, tag: RoleTag) -> Vec<&str> {
        self.graph
            .node_weights()
            .filter(|n| n.role.tag() == tag)
            .map(|n| n.name.as_str())
            .collect()
    }

    pub fn sensor_types(&self) -> Vec<&str> {
        self.names_with(RoleTag::Sensor)
    }

    pub fn actuator_types(&self) -> Vec<&str> {
        self.names_with(RoleTag::Actuator)
    }

    /// All edges in declaration order.
    pub fn edges(&self) -> impl Iterator<Item = &AppEdge> {
        self.graph.edge_weights()
    }

    fn edges_directed(&self, name: &str, dir: Direction) -> std::vec::IntoIter<&AppEdge> {
        match self.by_name.get(name) {
            Some(idx) => self
                .graph
                .edges_directed(*idx, dir)
                .sorted_by_key(|e| e.id())
                .map(|e| e.weight())
                .collect::<Vec<_>>()
                .into_iter(),
            None => Vec::new().into_iter(),
        }
    }

    /// Outgoing edges of `name`, in declaration order.
    pub fn edges_from(&self, name: &str) -> impl Iterator<Item = &AppEdge> {
        self.edges_directed(name, Outgoing)
    }

    /// Incoming edges of `name`, in declaration order.
    pub fn edges_to(&self, name: &str) -> impl Iterator<Item = &AppEdge> {
        self.edges_directed(name, Incoming)
    }

    fn modules_among(&self, nodes: BTreeSet<NodeIndex>) -> Vec<&str> {
        nodes
            .into_iter()
            .filter(|idx| self.graph[*idx].role.tag() == RoleTag::Module)
            .map(|idx| self.graph[idx].name.as_str())
            .collect()
    }

    /// Every module with a path to `name`, in declaration order.
    pub fn modules_upstream_of(&self, name: &str) -> Vec<&str> {
        let start = match self.by_name.get(name) {
            Some(idx) => *idx,
            None => return Vec::new(),
        };
        let reversed = Reversed(&self.graph);
        let upstream = Bfs::new(reversed, start)
            .iter(reversed)
            .filter(|idx| *idx != start)
            .collect::<BTreeSet<_>>();
        self.modules_among(upstream)
    }

    /// Modules reachable from some sensor type, in declaration order. These
    /// are the modules a placement must host somewhere.
    pub fn modules_reachable_from_sensors(&self) -> Vec<&str> {
        let mut reached = BTreeSet::new();
        for sensor in self
            .graph
            .node_indices()
            .filter(|idx| self.graph[*idx].role.tag() == RoleTag::Sensor)
        {
            reached.extend(Bfs::new(&self.graph, sensor).iter(&self.graph));
        }
        self.modules_among(reached)
    }

    pub fn tuple_mappings(&self) -> &[TupleMapping] {
        &self.tuple_mappings
    }

    pub fn tuple_mappings_of<'a>(
        &'a self,
        module: &'a str,
    ) -> impl Iterator<Item = &'a TupleMapping> {
        self.tuple_mappings
            .iter()
            .filter(move |m| m.module == module)
    }

    pub fn selectivity(
        &self,
        module: &str,
        input_type: &str,
        output_type: &str,
    ) -> Option<&dyn Selectivity> {
        self.tuple_mappings
            .iter()
            .find(|m| {
                m.module == module && m.input_type == input_type && m.output_type == output_type
            })
            .map(|m| m.selectivity.as_ref())
    }

    /// Every tuple type a module emits in response to input must be produced
    /// by one of its tuple mappings. Periodic edges are timer driven and need
    /// none.
    pub fn validate(&self) -> Result<(), Error> {
        for module in self.modules() {
            for edge in self.edges_from(&module.name).filter(|e| !e.is_periodic()) {
                if !self
                    .tuple_mappings_of(&module.name)
                    .any(|m| m.output_type == edge.tuple_type)
                {
                    return Err(Error::MissingTupleMapping {
                        module: module.name.clone(),
                        output_type: edge.tuple_type.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
