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

//! Ready-made scenarios.

use crate::{
    AppEdge, AppLoop, ApplicationGraph, DeviceId, DeviceSpec, Distribution, EdgeKind, Error,
    FractionalSelectivity, ModuleMapping, PlacementPolicy, Scenario, ScenarioBuilder,
    TupleDirection,
};

pub const PRECIPITATION_APP_ID: &str = "SmartPrecipitationAnalyser";

/// ms between two pictures of a camera
pub const CAMERA_DELAY: f64 = 2.0;

pub const CAPTURE_MODULE: &str = "picture-capture";
pub const DETECT_MODULE: &str = "slot-detector";

/// The picture analysis pipeline:
///
/// <pre>
/// CAMERA -> picture-capture -> slot-detector -> PTZ_CONTROL
/// </pre>
///
/// The detector drives the PTZ actuator on a 100 ms timer.
pub fn precipitation_application() -> Result<ApplicationGraph, Error> {
    let mut app = ApplicationGraph::new(PRECIPITATION_APP_ID);
    app.add_module(CAPTURE_MODULE, 10)?;
    app.add_module(DETECT_MODULE, 10)?;

    app.add_edge(AppEdge::new(
        "CAMERA",
        CAPTURE_MODULE,
        1000.0,
        500.0,
        "CAMERA",
        TupleDirection::Up,
        EdgeKind::Sensor,
    ))?;
    app.add_edge(AppEdge::new(
        CAPTURE_MODULE,
        DETECT_MODULE,
        1000.0,
        500.0,
        "slots",
        TupleDirection::Up,
        EdgeKind::Module,
    ))?;
    app.add_edge(
        AppEdge::new(
            DETECT_MODULE,
            "PTZ_CONTROL",
            28.0,
            100.0,
            "PTZ_PARAMS",
            TupleDirection::Up,
            EdgeKind::Actuator,
        )
        .periodic(100.0),
    )?;

    app.add_tuple_mapping(
        CAPTURE_MODULE,
        "CAMERA",
        "slots",
        FractionalSelectivity::new(1.0)?,
    )?;
    app.add_tuple_mapping(
        DETECT_MODULE,
        "slots",
        "PTZ_PARAMS",
        FractionalSelectivity::new(1.0)?,
    )?;

    app.set_loops(vec![AppLoop::new(&[
        "CAMERA",
        CAPTURE_MODULE,
        DETECT_MODULE,
        "PTZ_CONTROL",
    ])])?;
    Ok(app)
}

fn add_camera(
    builder: &mut ScenarioBuilder,
    id: &str,
    router: DeviceId,
) -> Result<DeviceId, Error> {
    let camera = builder.add_device(DeviceSpec::new(
        &format!("c-{}", id),
        500,
        1000,
        10000,
        10000,
        3,
        0.0,
        87.53,
        82.44,
    ))?;
    builder.attach(camera, router, 2.0)?;
    builder.add_sensor(
        &format!("s-{}", id),
        "CAMERA",
        camera,
        1.0,
        Distribution::Deterministic(CAMERA_DELAY),
    )?;
    // the PTZ unit is driven from the area router
    builder.add_actuator(&format!("ptz-{}", id), "PTZ_CONTROL", router, 1.0)?;
    Ok(camera)
}

fn add_area(
    builder: &mut ScenarioBuilder,
    id: usize,
    cameras: usize,
    proxy: DeviceId,
) -> Result<DeviceId, Error> {
    let router = builder.add_device(DeviceSpec::new(
        &format!("a-{}", id),
        2800,
        4000,
        1000,
        10000,
        2,
        0.0,
        107.339,
        83.4333,
    ))?;
    builder.attach(router, proxy, 2.0)?;
    for c in 0..cameras {
        add_camera(builder, &format!("{}-{}", id, c), router)?;
    }
    Ok(router)
}

/// The smart precipitation analyser: a cloud, a proxy server, `areas`
/// routers and `cameras_per_area` cameras under each router.
///
/// <pre>
///                 cloud
///                   | 100 ms
///              proxy-server
///          2 ms /        \
///            a-0   ...   a-n
///      2 ms /   \
///       c-0-0 ... c-0-m
/// </pre>
///
/// Every camera carries a CAMERA sensor `s-<area>-<camera>`; its PTZ actuator
/// `ptz-<area>-<camera>` hangs off the area router.
pub fn smart_precipitation(areas: usize, cameras_per_area: usize) -> Result<Scenario, Error> {
    if areas == 0 || cameras_per_area == 0 {
        return Err(Error::InvalidSpec(format!(
            "need at least one area and one camera, got {} areas of {} cameras",
            areas, cameras_per_area
        )));
    }
    let mut builder = ScenarioBuilder::new();
    let cloud = builder.add_device(DeviceSpec::new(
        "cloud",
        44800,
        40000,
        100,
        10000,
        0,
        0.01,
        16.0 * 103.0,
        16.0 * 83.25,
    ))?;
    let proxy = builder.add_device(DeviceSpec::new(
        "proxy-server",
        2800,
        4000,
        10000,
        10000,
        1,
        0.0,
        107.339,
        83.4333,
    ))?;
    builder.attach(proxy, cloud, 100.0)?;
    for a in 0..areas {
        add_area(&mut builder, a, cameras_per_area, proxy)?;
    }
    builder.set_application(precipitation_application()?);
    builder.build()
}

/// Capture pinned to every camera and detection to every router. With the
/// `Mapping` policy both are also pinned to the cloud, which is then the
/// complete placement.
pub fn smart_precipitation_pins(scenario: &Scenario, policy: PlacementPolicy) -> ModuleMapping {
    let mut mapping = ModuleMapping::new();
    for (_, device) in scenario.topology().devices() {
        if device.name().starts_with("c-") {
            mapping.assign(CAPTURE_MODULE, device.name());
        } else if device.name().starts_with("a-") {
            mapping.assign(DETECT_MODULE, device.name());
        }
    }
    if policy == PlacementPolicy::Mapping {
        mapping.assign(CAPTURE_MODULE, "cloud");
        mapping.assign(DETECT_MODULE, "cloud");
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_topology() {
        let _logger = env_logger::builder().is_test(true).try_init();
        let scenario = smart_precipitation(2, 4).unwrap();
        let topo = scenario.topology();
        // cloud, proxy, 2 routers, 8 cameras
        assert_eq!(topo.len(), 12);
        assert_eq!(topo.root(), topo.id_of("cloud"));
        assert_eq!(scenario.registry().sensors().len(), 8);
        assert_eq!(scenario.registry().actuators().len(), 8);

        let camera = topo.id_of("c-1-3").unwrap();
        let path = topo
            .ancestors_of(camera)
            .unwrap()
            .map(|id| topo.device(id).unwrap().name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(path, vec!["c-1-3", "a-1", "proxy-server", "cloud"]);
        assert_eq!(
            scenario.registry().gateway_of("ptz-1-3"),
            Some((topo.id_of("a-1").unwrap(), 1.0))
        );
        assert_eq!(topo.device_by_name("cloud").unwrap().busy_power(), 1648.0);
    }

    #[test]
    fn test_edgewards_reference_placement() {
        let scenario = smart_precipitation(2, 4).unwrap();
        let pins = smart_precipitation_pins(&scenario, PlacementPolicy::Edgewards);
        let mapping = scenario.place(PlacementPolicy::Edgewards, &pins).unwrap();
        assert_eq!(mapping, pins);
        assert_eq!(mapping.devices_for(CAPTURE_MODULE).len(), 8);
        assert_eq!(
            mapping.devices_for(DETECT_MODULE).into_iter().collect::<Vec<_>>(),
            vec!["a-0", "a-1"]
        );
    }

    #[test]
    fn test_cloud_reference_placement() {
        let scenario = smart_precipitation(2, 4).unwrap();
        let pins = smart_precipitation_pins(&scenario, PlacementPolicy::Mapping);
        let mapping = scenario.place(PlacementPolicy::Mapping, &pins).unwrap();
        assert!(mapping.contains(CAPTURE_MODULE, "cloud"));
        assert!(mapping.contains(DETECT_MODULE, "cloud"));
        assert_eq!(mapping.modules_on("cloud").len(), 2);
    }

    #[test]
    fn test_empty_field() {
        assert!(matches!(
            smart_precipitation(0, 4),
            Err(Error::InvalidSpec(_))
        ));
    }
}
