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

use env_logger::Target;
use structopt::StructOpt;

use precipitation::DeployMode;

#[derive(StructOpt)]
#[structopt(
    name = "precipitation",
    about = "Place the smart precipitation analyser on a fog topology"
)]
struct Arguments {
    /// supported modes: Cloud, Edgewards
    #[structopt(short, long, default_value = "Edgewards")]
    mode: DeployMode,
    #[structopt(short, long, default_value = "2")]
    areas: usize,
    #[structopt(short, long, default_value = "4")]
    cameras: usize,
    /// YAML scenario to deploy instead of the reference one
    #[structopt(long)]
    config: Option<String>,
    /// print the device tree in graphviz format
    #[structopt(long)]
    graphviz: bool,
    /// print the final mapping as YAML
    #[structopt(long)]
    dump_mapping: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::from_args();

    let _logger = env_logger::builder()
        .filter(Some("precipitation"), log::LevelFilter::Info)
        .filter(Some("fogmodel"), log::LevelFilter::Info)
        .parse_default_env()
        .target(Target::Stderr)
        .init();

    log::info!("Starting smart precipitation analyser system...");
    let deployment = match &args.config {
        Some(file_name) => precipitation::deploy_from_file(file_name)?,
        None => precipitation::deploy(args.mode, args.areas, args.cameras)?,
    };

    if args.graphviz {
        println!("{}", deployment.topology().to_graphviz());
    }
    if args.dump_mapping {
        print!("{}", serde_yaml::to_string(deployment.mapping())?);
    }
    print!("{}", precipitation::report(&deployment));
    Ok(())
}
