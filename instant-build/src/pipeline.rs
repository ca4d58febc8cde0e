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


use instant_common::Result;
use serde::{Deserialize, Serialize};

use crate::request::BuildRequest;

/// The message older engine versions return when the user cancels a build.
pub const LEGACY_CANCELLED_MESSAGE: &str = "Building Player was cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildResult {
    Succeeded,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown
}

/// Summary the pipeline gives back after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub result: BuildResult,
    #[serde(default)]
    pub total_errors: u32
}

/// How a pipeline reported its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// A structured report.
    Report(BuildReport),
    /// Older pipelines only return an error message, with `None` or an empty
    /// string meaning success.
    Legacy(Option<String>)
}

/// What a legacy free-form message amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyOutcome {
    Completed,
    Cancelled,
    Failed(String)
}

impl PipelineOutcome {
    pub fn report(result: BuildResult, total_errors: u32) -> Self {
        PipelineOutcome::Report(BuildReport {
            result,
            total_errors
        })
    }
}

/// Classifies a legacy pipeline message.
///
/// Cancellation can only be recognised by comparing against the exact
/// sentinel text, so a pipeline that words it differently is reported as a
/// failure.
pub fn classify_legacy_message(message: Option<&str>) -> LegacyOutcome {
    match message.map(str::trim) {
        None | Some("") => LegacyOutcome::Completed,
        Some(LEGACY_CANCELLED_MESSAGE) => LegacyOutcome::Cancelled,
        Some(other) => LegacyOutcome::Failed(other.to_string())
    }
}

/// The engine's player build pipeline.
pub trait BuildPipeline {
    /// Runs a build to completion. `Err` means the pipeline couldn't be
    /// invoked at all, not that the build failed.
    fn build(&self, request: &BuildRequest) -> Result<PipelineOutcome>;
}
