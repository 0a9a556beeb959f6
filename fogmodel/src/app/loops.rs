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

/// A critical path through the application (sensor type, modules...,
/// actuator type) whose end-to-end latency the runtime reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppLoop {
    id: usize,
    path: Vec<String>,
}

impl AppLoop {
    pub fn new<S: AsRef<str>>(path: &[S]) -> Self {
        Self {
            id: 0,
            path: path.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// position of the loop in its application; assigned by `set_loops`
    pub fn id(&self) -> usize {
        self.id
    }

    pub(super) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn start(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    pub fn end(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// consecutive pairs of the path
    pub fn hops(&self) -> impl Iterator<Item = (&str, &str)> {
        self.path
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
    }

    /// true if `src -> dst` is one of the hops
    pub fn has_edge(&self, src: &str, dst: &str) -> bool {
        self.hops().any(|(s, d)| s == src && d == dst)
    }

    /// the element following the first occurrence of `name`
    pub fn next_after(&self, name: &str) -> Option<&str> {
        let pos = self.path.iter().position(|p| p == name)?;
        self.path.get(pos + 1).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation() {
        let l = AppLoop::new(&["CAMERA", "picture-capture", "slot-detector", "PTZ_CONTROL"]);
        assert_eq!(l.start(), Some("CAMERA"));
        assert_eq!(l.end(), Some("PTZ_CONTROL"));
        assert!(l.has_edge("picture-capture", "slot-detector"));
        assert!(!l.has_edge("slot-detector", "picture-capture"));
        assert_eq!(l.next_after("picture-capture"), Some("slot-detector"));
        assert_eq!(l.next_after("PTZ_CONTROL"), None);
        assert_eq!(l.hops().count(), 3);
    }
}
