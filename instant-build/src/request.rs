// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

use instant_common::InstantError;

/// Player build flags forwarded to the engine's build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildOption {
    Development,
    AllowDebugging,
    AutoRunPlayer,
    ConnectWithProfiler,
    StrictMode,
    DetailedBuildReport
}

pub type BuildOptions = BTreeSet<BuildOption>;

const BUILD_OPTION_NAMES: &[(&str, BuildOption)] = &[
    ("development", BuildOption::Development),
    ("allow-debugging", BuildOption::AllowDebugging),
    ("auto-run-player", BuildOption::AutoRunPlayer),
    ("connect-with-profiler", BuildOption::ConnectWithProfiler),
    ("strict-mode", BuildOption::StrictMode),
    ("detailed-build-report", BuildOption::DetailedBuildReport)
];

impl FromStr for BuildOption {
    type Err = InstantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BUILD_OPTION_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, option)| *option)
            .ok_or_else(|| InstantError::InvalidArgument(format!("Unknown build option: {s}")))
    }
}

impl fmt::Display for BuildOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = BUILD_OPTION_NAMES
            .iter()
            .find(|(_, option)| option == self)
            .map_or("unknown", |(name, _)| name);
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildTarget {
    Android
}

/// Everything the build pipeline needs for one player build. Assembled per
/// build and dropped once the build returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub output_path: String,
    /// Scene asset paths in build order. May be empty, in which case the
    /// pipeline is expected to reject the request.
    pub scenes: Vec<String>,
    pub options: BuildOptions,
    pub target: BuildTarget,
    pub asset_bundle_manifest_path: Option<String>
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_by_kebab_case_name() {
        assert_eq!(
            "allow-debugging".parse::<BuildOption>().unwrap(),
            BuildOption::AllowDebugging
        );
        assert!(matches!(
            "AllowDebugging".parse::<BuildOption>(),
            Err(InstantError::InvalidArgument(_))
        ));
        assert_eq!(BuildOption::StrictMode.to_string(), "strict-mode");
    }
}
