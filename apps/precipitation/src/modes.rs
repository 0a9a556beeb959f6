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

use fogmodel::PlacementPolicy;
use std::str::FromStr;
use structopt::StructOpt;

// Cloud puts every module instance in the cloud on top of the edge pins.
// Edgewards places from the cameras upward.
#[derive(StructOpt, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployMode {
    Cloud,
    Edgewards,
}

impl DeployMode {
    pub fn policy(&self) -> PlacementPolicy {
        match self {
            DeployMode::Cloud => PlacementPolicy::Mapping,
            DeployMode::Edgewards => PlacementPolicy::Edgewards,
        }
    }
}

impl FromStr for DeployMode {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cloud" => Ok(DeployMode::Cloud),
            "Edgewards" => Ok(DeployMode::Edgewards),
            _ => Err(Self::Err::new(
                std::io::ErrorKind::Other,
                format!("Invalid deploy mode: {}", s),
            )),
        }
    }
}
