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

use fogmodel::predefined::{CAPTURE_MODULE, DETECT_MODULE};
use fogmodel::{validate_placement, Error, ModuleMapping, PlacementPolicy};
use precipitation::{DeployMode, AREAS, CAMERAS_PER_AREA};

fn scenario_file(name: &str) -> String {
    format!("{}/scenarios/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn sorted(devices: std::collections::BTreeSet<&str>) -> Vec<&str> {
    devices.into_iter().collect()
}

#[test]
fn test_edgewards_reference_field() {
    let _logger = env_logger::builder().is_test(true).try_init();

    let deployment = precipitation::deploy(DeployMode::Edgewards, AREAS, CAMERAS_PER_AREA)
        .expect("Failed to deploy");
    let mapping = deployment.mapping();
    assert_eq!(
        sorted(mapping.devices_for(CAPTURE_MODULE)),
        vec!["c-0-0", "c-0-1", "c-0-2", "c-0-3", "c-1-0", "c-1-1", "c-1-2", "c-1-3"]
    );
    assert_eq!(sorted(mapping.devices_for(DETECT_MODULE)), vec!["a-0", "a-1"]);
    assert!(mapping.modules_on("cloud").is_empty());
    assert!(mapping.modules_on("proxy-server").is_empty());
    assert_eq!(
        validate_placement(&deployment_input(&deployment), mapping),
        Ok(())
    );
}

fn deployment_input(deployment: &fogmodel::Deployment) -> fogmodel::PlacementInput<'_> {
    fogmodel::PlacementInput {
        topology: deployment.topology(),
        registry: deployment.registry(),
        app: deployment.app(),
    }
}

#[test]
fn test_cloud_reference_field() {
    let _logger = env_logger::builder().is_test(true).try_init();

    let deployment = precipitation::deploy(DeployMode::Cloud, AREAS, CAMERAS_PER_AREA)
        .expect("Failed to deploy");
    let mapping = deployment.mapping();
    assert!(mapping.contains(CAPTURE_MODULE, "cloud"));
    assert!(mapping.contains(DETECT_MODULE, "cloud"));
    // the edge pins are kept next to the cloud instances
    assert_eq!(mapping.devices_for(CAPTURE_MODULE).len(), 9);
    assert_eq!(mapping.devices_for(DETECT_MODULE).len(), 3);
}

#[test]
fn test_scenario_file_matches_reference() {
    let _logger = env_logger::builder().is_test(true).try_init();

    let from_file = precipitation::deploy_from_file(&scenario_file("smart_precipitation.yaml"))
        .expect("Failed to deploy scenario file");
    let reference = precipitation::deploy(DeployMode::Edgewards, AREAS, CAMERAS_PER_AREA)
        .expect("Failed to deploy");

    assert_eq!(from_file.mapping(), reference.mapping());
    assert_eq!(from_file.topology().len(), reference.topology().len());
    for (_, device) in reference.topology().devices() {
        let other = from_file
            .topology()
            .device_by_name(device.name())
            .unwrap_or_else(|| panic!("{} missing from the scenario file", device.name()));
        assert_eq!(other.spec(), device.spec());
        assert_eq!(other.uplink_latency(), device.uplink_latency());
    }
    for sensor in reference.registry().sensors() {
        let other = from_file.registry().sensor(&sensor.name).unwrap();
        assert_eq!(other.distribution, sensor.distribution);
        assert_eq!(
            from_file.topology().device(other.gateway).unwrap().name(),
            reference.topology().device(sensor.gateway).unwrap().name()
        );
    }
    assert_eq!(
        from_file.registry().actuators().len(),
        reference.registry().actuators().len()
    );
    assert_eq!(from_file.app().loops(), reference.app().loops());
}

#[test]
fn test_small_devices_push_detection_up() {
    let _logger = env_logger::builder().is_test(true).try_init();

    let deployment = precipitation::deploy_from_file(&scenario_file("tiny_cameras.yaml"))
        .expect("Failed to deploy scenario file");
    let mapping = deployment.mapping();
    assert_eq!(sorted(mapping.devices_for(CAPTURE_MODULE)), vec!["c-0", "c-1"]);
    assert_eq!(sorted(mapping.devices_for(DETECT_MODULE)), vec!["gateway"]);
    assert!(mapping.modules_on("a-0").is_empty());
}

#[test]
fn test_small_routers_push_detection_to_proxy() {
    let _logger = env_logger::builder().is_test(true).try_init();

    let deployment = precipitation::deploy_from_file(&scenario_file("small_routers.yaml"))
        .expect("Failed to deploy scenario file");
    let mapping = deployment.mapping();
    assert_eq!(mapping.devices_for(CAPTURE_MODULE).len(), 8);
    assert_eq!(
        sorted(mapping.devices_for(DETECT_MODULE)),
        vec!["proxy-server"]
    );
    assert!(mapping.modules_on("a-0").is_empty());
    assert!(mapping.modules_on("a-1").is_empty());
    assert!(mapping.modules_on("cloud").is_empty());
}

#[test]
fn test_incomplete_mapping_is_rejected() {
    let _logger = env_logger::builder().is_test(true).try_init();

    let scenario = fogmodel::predefined::smart_precipitation(1, 1).expect("Failed to build");
    let mut mapping = ModuleMapping::new();
    mapping.assign(CAPTURE_MODULE, "c-0-0");
    mapping.assign(DETECT_MODULE, "c-9-9");
    assert_eq!(
        scenario.place(PlacementPolicy::Mapping, &mapping),
        Err(Error::UnknownDevice("c-9-9".into()))
    );

    let mut mapping = ModuleMapping::new();
    mapping.assign(CAPTURE_MODULE, "c-0-0");
    assert_eq!(
        scenario.place(PlacementPolicy::Mapping, &mapping),
        Err(Error::UnplacedModule(DETECT_MODULE.into()))
    );
}

#[test]
fn test_missing_scenario_file() {
    let err = precipitation::deploy_from_file(&scenario_file("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("missing.yaml"));
}
