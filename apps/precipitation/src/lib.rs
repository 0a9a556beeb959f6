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

//! Smart precipitation analyser.
//!
//! Cameras spread over a field take a picture every few milliseconds. A
//! `picture-capture` module on the camera extracts the regions of interest,
//! and a `slot-detector` module near the area router analyses them and steers
//! the PTZ (pan-tilt-zoom) unit of the camera.
//!
//! The field is split into areas, each behind a router; all routers reach the
//! cloud through a proxy server. The scenario can be deployed in two modes:
//!   - **Cloud**: every module also runs in the cloud, with a fixed mapping.
//!   - **Edgewards**: modules are placed as close to the cameras as their RAM
//!     allows, starting from the camera/router pins.
//!
//! Scenarios other than the reference one are read from YAML files (see
//! `scenarios/`).

use anyhow::{Context, Result};
use fogmodel::predefined::{smart_precipitation, smart_precipitation_pins};
use fogmodel::{Deployment, ScenarioConfig};

mod modes;

pub use modes::DeployMode;

pub const AREAS: usize = 2;
pub const CAMERAS_PER_AREA: usize = 4;

/// Deploy the reference scenario with `areas` areas of `cameras` cameras.
pub fn deploy(mode: DeployMode, areas: usize, cameras: usize) -> Result<Deployment> {
    log::info!(
        "deploying {} areas of {} cameras in {:?} mode",
        areas,
        cameras,
        mode
    );
    let scenario = smart_precipitation(areas, cameras)?;
    let pins = smart_precipitation_pins(&scenario, mode.policy());
    let deployment = scenario.deploy(mode.policy(), &pins)?;
    Ok(deployment)
}

/// Deploy the scenario described in `file_name`.
pub fn deploy_from_file(file_name: &str) -> Result<Deployment> {
    let config = ScenarioConfig::from_file(file_name)
        .with_context(|| format!("Failed to read scenario {}", file_name))?;
    let deployment = config
        .deploy()
        .with_context(|| format!("Failed to deploy scenario {}", file_name))?;
    Ok(deployment)
}

/// Human readable summary: placement per device, then the loops with the
/// devices hosting each of their modules.
pub fn report(deployment: &Deployment) -> String {
    let mut out = deployment.to_string();
    for l in deployment.app().loops() {
        out.push_str(&format!("Loop {}: {}\n", l.id(), l.path().join(" -> ")));
        for name in l.path() {
            let devices = deployment.mapping().devices_for(name);
            if !devices.is_empty() {
                out.push_str(&format!(
                    "  {} on {} devices\n",
                    name,
                    devices.len()
                ));
            }
        }
    }
    out
}
