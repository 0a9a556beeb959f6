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

use std::fmt;

use crate::app::EdgeKind;

/// Errors raised while building a scenario or placing an application on it.
///
/// Construction errors never leave a partially applied change behind: the
/// structure that reported the error is unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// malformed numeric parameter
    InvalidSpec(String),
    UnknownDevice(String),
    UnknownModule(String),
    /// a tuple type that does not flow into/out of the given module
    UnknownType { module: String, tuple_type: String },
    UnresolvedEndpoint(String),
    DuplicateDevice(String),
    DuplicateModule(String),
    /// a sensor or actuator name that is already registered
    DuplicateEndpoint(String),
    DuplicateParent { child: String, parent: String },
    CycleDetected { child: String, parent: String },
    InvalidLevel {
        child: String,
        child_level: u32,
        parent: String,
        parent_level: u32,
    },
    EdgeKindMismatch {
        source: String,
        destination: String,
        kind: EdgeKind,
    },
    DisconnectedLoop { from: String, to: String },
    MissingTupleMapping { module: String, output_type: String },
    UnplacedModule(String),
    InsufficientCapacity {
        module: String,
        attempted: Vec<String>,
    },
    /// scenario description could not be read or parsed
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidSpec(what) => write!(f, "ERROR: invalid specification: {}", what),
            Self::UnknownDevice(name) => write!(f, "ERROR: unknown device {}", name),
            Self::UnknownModule(name) => write!(f, "ERROR: unknown module {}", name),
            Self::UnknownType { module, tuple_type } => write!(
                f,
                "ERROR: tuple type {} does not flow through module {}",
                tuple_type, module
            ),
            Self::UnresolvedEndpoint(name) => {
                write!(f, "ERROR: endpoint {} does not resolve", name)
            }
            Self::DuplicateDevice(name) => write!(f, "ERROR: device {} already exists", name),
            Self::DuplicateModule(name) => write!(f, "ERROR: module {} already exists", name),
            Self::DuplicateEndpoint(name) => {
                write!(f, "ERROR: sensor/actuator {} already exists", name)
            }
            Self::DuplicateParent { child, parent } => write!(
                f,
                "ERROR: device {} already has parent {}",
                child, parent
            ),
            Self::CycleDetected { child, parent } => write!(
                f,
                "ERROR: attaching {} under {} creates a cycle",
                child, parent
            ),
            Self::InvalidLevel {
                child,
                child_level,
                parent,
                parent_level,
            } => write!(
                f,
                "ERROR: device {} (level {}) cannot hang off {} (level {})",
                child, child_level, parent, parent_level
            ),
            Self::EdgeKindMismatch {
                source,
                destination,
                kind,
            } => write!(
                f,
                "ERROR: edge {} -> {} does not match kind {:?}",
                source, destination, kind
            ),
            Self::DisconnectedLoop { from, to } => {
                write!(f, "ERROR: loop has no edge {} -> {}", from, to)
            }
            Self::MissingTupleMapping {
                module,
                output_type,
            } => write!(
                f,
                "ERROR: module {} has no tuple mapping producing {}",
                module, output_type
            ),
            Self::UnplacedModule(name) => {
                write!(f, "ERROR: module {} is not placed on any device", name)
            }
            Self::InsufficientCapacity { module, attempted } => write!(
                f,
                "ERROR: no capacity for module {} (tried: {})",
                module,
                attempted.join(", ")
            ),
            Self::Config(what) => write!(f, "ERROR: scenario configuration: {}", what),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Config(e.to_string())
    }
}
