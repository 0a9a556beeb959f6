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

use super::{PlacementInput, PlacementStrategy};
use crate::{Error, ModuleMapping};

/// Takes the initial mapping as the placement.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedMapping;

impl PlacementStrategy for FixedMapping {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn place(
        &self,
        input: &PlacementInput,
        initial: &ModuleMapping,
    ) -> Result<ModuleMapping, Error> {
        initial.validate_devices(input.topology)?;
        Ok(initial.clone())
    }
}
