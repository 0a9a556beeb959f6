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

//! Deployment model for fog/edge applications.
//!
//! A deployment is described by three independent pieces:
//!   - a tree of fog devices ([`DeviceTopology`]), from the cloud at the root
//!     down to edge devices,
//!   - the sensors and actuators attached to those devices
//!     ([`SensorActuatorRegistry`]),
//!   - a dataflow application ([`ApplicationGraph`]) of modules connected by
//!     tuple flows.
//!
//! A [`ModuleMapping`] says which devices host instances of which modules. It
//! is either supplied directly or computed by a [`PlacementStrategy`]; in both
//! cases it is checked against the placement contract before being handed to
//! a runtime as part of a [`Deployment`].

mod app;
mod config;
mod distribution;
mod endpoints;
mod error;
mod mapping;
pub mod placement;
mod scenario;
mod topology;

// public scenarios (e.g., smart_precipitation)
pub mod predefined;

pub use crate::app::{
    AppEdge, AppLoop, ApplicationGraph, EdgeKind, FractionalSelectivity, Module, Selectivity,
    TupleDirection, TupleMapping,
};
pub use crate::config::{
    ActuatorConfig, ApplicationConfig, Gateway, PlacementConfig, ScenarioConfig, SensorConfig,
    TierConfig, TupleMappingConfig,
};
pub use crate::distribution::Distribution;
pub use crate::endpoints::{Actuator, Sensor, SensorActuatorRegistry};
pub use crate::error::Error;
pub use crate::mapping::ModuleMapping;
pub use crate::placement::{
    validate_placement, Edgewards, FixedMapping, PlacementInput, PlacementPolicy,
    PlacementStrategy,
};
pub use crate::scenario::{Deployment, Scenario, ScenarioBuilder};
pub use crate::topology::{
    Ancestors, Characteristics, Device, DeviceId, DeviceSpec, DeviceTopology, Uplink,
    DEFAULT_STORAGE,
};
pub use petgraph::graph::NodeIndex;
