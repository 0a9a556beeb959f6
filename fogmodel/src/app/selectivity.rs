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

use rand::{Rng, RngCore};
use std::fmt::Debug;
use std::sync::Arc;

use crate::Error;

/// How many output tuples a module emits per input tuple.
///
/// Evaluated by the runtime once per arriving tuple; the runtime supplies the
/// random source.
pub trait Selectivity: Debug + Send + Sync {
    /// true if the arriving tuple produces an output tuple
    fn can_select(&self, rng: &mut dyn RngCore) -> bool;

    /// expected number of outputs per input
    fn mean_rate(&self) -> f64;

    /// largest number of outputs a single input can produce
    fn max_rate(&self) -> f64;
}

/// Emits one output for a fixed fraction of the inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalSelectivity {
    fraction: f64,
}

impl FractionalSelectivity {
    pub fn new(fraction: f64) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidSpec(format!(
                "selectivity {} is outside [0, 1]",
                fraction
            )));
        }
        Ok(Self { fraction })
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }
}

impl Selectivity for FractionalSelectivity {
    fn can_select(&self, rng: &mut dyn RngCore) -> bool {
        rng.gen::<f64>() < self.fraction
    }

    fn mean_rate(&self) -> f64 {
        self.fraction
    }

    fn max_rate(&self) -> f64 {
        self.fraction
    }
}

/// (module, input type) -> output type, with its selectivity
#[derive(Clone, Debug)]
pub struct TupleMapping {
    pub module: String,
    pub input_type: String,
    pub output_type: String,
    pub selectivity: Arc<dyn Selectivity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_bounds() {
        assert!(FractionalSelectivity::new(1.0).is_ok());
        assert!(FractionalSelectivity::new(0.0).is_ok());
        assert!(FractionalSelectivity::new(1.5).is_err());
        assert!(FractionalSelectivity::new(-0.1).is_err());
        assert!(FractionalSelectivity::new(f64::NAN).is_err());
    }

    #[test]
    fn test_extremes_are_exact() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let always = FractionalSelectivity::new(1.0).unwrap();
        let never = FractionalSelectivity::new(0.0).unwrap();
        for _ in 0..50 {
            assert!(always.can_select(&mut rng));
            assert!(!never.can_select(&mut rng));
        }
    }

    #[test]
    fn test_fraction_is_approximated() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let half = FractionalSelectivity::new(0.5).unwrap();
        let selected = (0..10_000).filter(|_| half.can_select(&mut rng)).count();
        assert!((4_500..5_500).contains(&selected), "{}", selected);
        assert_eq!(half.mean_rate(), 0.5);
    }
}
