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


use instant_build::{BuildPipeline, BuildReport, BuildRequest, PipelineOutcome};
use instant_common::*;
use std::{ffi::OsString, fs, path::Path};
use tracing::{debug, info};

use crate::config::PipelineConfig;

/// Runs the engine's build through an external command.
///
/// The request is written to a JSON file passed as `--build-request <path>`.
/// The command is expected to write a [BuildReport] as JSON to the path given
/// by `--build-report <path>`. Commands that don't write a report are
/// treated as legacy pipelines: exit code 0 means success and anything else
/// is a failure described by the command's output.
pub struct ProcessBuildPipeline<R: CommandRunner> {
    config: Option<PipelineConfig>,
    runner: R
}

impl<R: CommandRunner> ProcessBuildPipeline<R> {
    pub fn new(config: Option<PipelineConfig>, runner: R) -> Self {
        ProcessBuildPipeline { config, runner }
    }
}

impl<R: CommandRunner> BuildPipeline for ProcessBuildPipeline<R> {
    fn build(&self, request: &BuildRequest) -> Result<PipelineOutcome> {
        let config = self.config.as_ref().ok_or_else(|| {
            InstantError::Config("No [pipeline] command is configured".into())
        })?;

        let scratch = tempfile::Builder::new().prefix("instant-build").tempdir()?;
        let request_path = scratch.path().join("build-request.json");
        let report_path = scratch.path().join("build-report.json");
        let request_json = serde_json::to_vec_pretty(request)
            .map_err(|err| InstantError::Report(format!("Failed to encode build request: {err}")))?;
        fs::write(&request_path, request_json)?;

        let mut args: Vec<OsString> = config.args.iter().map(OsString::from).collect();
        args.push("--build-request".into());
        args.push(request_path.into());
        args.push("--build-report".into());
        args.push(report_path.as_os_str().into());

        info!("Building {} scene(s) to {}", request.scenes.len(), request.output_path);
        let result = self
            .runner
            .run(&config.command, &args, config.working_dir.as_deref())?;
        debug!(exit_code = result.exit_code, "build pipeline finished");

        if report_path.is_file() {
            return read_report(&report_path).map(PipelineOutcome::Report);
        }
        if result.success() {
            return Ok(PipelineOutcome::Legacy(None));
        }
        let message = if result.message.trim().is_empty() {
            format!("Build pipeline exited with code {}", result.exit_code)
        } else {
            result.message
        };
        Ok(PipelineOutcome::Legacy(Some(message)))
    }
}

fn read_report(path: &Path) -> Result<BuildReport> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|err| InstantError::Report(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use instant_build::{BuildOptions, BuildResult, BuildTarget};
    use std::{cell::RefCell, path::PathBuf};

    /// Pretends to be the engine. Writes `report` (if any) where asked and
    /// keeps a copy of the request it was given.
    struct FakeEngine {
        report: Option<&'static str>,
        reply: CommandResult,
        seen_request: RefCell<Option<BuildRequest>>,
        seen_args: RefCell<Vec<String>>
    }

    impl FakeEngine {
        fn new(report: Option<&'static str>, exit_code: i32, message: &str) -> Self {
            FakeEngine {
                report,
                reply: CommandResult {
                    exit_code,
                    message: message.into()
                },
                seen_request: RefCell::new(None),
                seen_args: RefCell::new(vec![])
            }
        }
    }

    impl CommandRunner for FakeEngine {
        fn run(
            &self,
            _program: &Path,
            args: &[OsString],
            _working_dir: Option<&Path>
        ) -> Result<CommandResult> {
            let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
            let value_of = |flag: &str| {
                let at = args.iter().position(|a| a == flag).unwrap();
                PathBuf::from(&args[at + 1])
            };
            let request = fs::read_to_string(value_of("--build-request")).unwrap();
            *self.seen_request.borrow_mut() = Some(serde_json::from_str(&request).unwrap());
            if let Some(report) = self.report {
                fs::write(value_of("--build-report"), report).unwrap();
            }
            *self.seen_args.borrow_mut() = args;
            Ok(self.reply.clone())
        }
    }

    fn config() -> Option<PipelineConfig> {
        Some(PipelineConfig {
            command: "unity".into(),
            args: vec!["-batchmode".into(), "-quit".into()],
            working_dir: None
        })
    }

    fn request() -> BuildRequest {
        BuildRequest {
            output_path: "/out/game.apk".into(),
            scenes: vec!["Assets/Main.unity".into()],
            options: BuildOptions::new(),
            target: BuildTarget::Android,
            asset_bundle_manifest_path: None
        }
    }

    #[test]
    fn report_file_is_parsed() {
        let engine = FakeEngine::new(Some(r#"{"result": "failed", "total_errors": 4}"#), 1, "");
        let pipeline = ProcessBuildPipeline::new(config(), &engine);
        assert_eq!(
            pipeline.build(&request()).unwrap(),
            PipelineOutcome::report(BuildResult::Failed, 4)
        );
        assert_eq!(*engine.seen_request.borrow(), Some(request()));
        let args = engine.seen_args.borrow();
        assert_eq!(args[..3], ["-batchmode", "-quit", "--build-request"]);
        assert_eq!(args[4], "--build-report");
    }

    #[test]
    fn unrecognised_result_is_unknown() {
        let engine = FakeEngine::new(Some(r#"{"result": "PlayerBuildInterrupted"}"#), 0, "");
        let pipeline = ProcessBuildPipeline::new(config(), &engine);
        assert_eq!(
            pipeline.build(&request()).unwrap(),
            PipelineOutcome::report(BuildResult::Unknown, 0)
        );
    }

    #[test]
    fn garbage_report_is_an_error() {
        let engine = FakeEngine::new(Some("not json"), 0, "");
        let pipeline = ProcessBuildPipeline::new(config(), &engine);
        assert!(matches!(
            pipeline.build(&request()),
            Err(InstantError::Report(_))
        ));
    }

    #[test]
    fn missing_report_falls_back_to_exit_code() {
        let ok = FakeEngine::new(None, 0, "Build completed");
        assert_eq!(
            ProcessBuildPipeline::new(config(), &ok).build(&request()).unwrap(),
            PipelineOutcome::Legacy(None)
        );

        let failed = FakeEngine::new(None, 1, "Building Player was cancelled");
        assert_eq!(
            ProcessBuildPipeline::new(config(), &failed)
                .build(&request())
                .unwrap(),
            PipelineOutcome::Legacy(Some("Building Player was cancelled".into()))
        );

        let silent = FakeEngine::new(None, 2, "");
        assert_eq!(
            ProcessBuildPipeline::new(config(), &silent)
                .build(&request())
                .unwrap(),
            PipelineOutcome::Legacy(Some("Build pipeline exited with code 2".into()))
        );
    }

    #[test]
    fn unconfigured_pipeline_is_an_error() {
        let engine = FakeEngine::new(None, 0, "");
        let pipeline = ProcessBuildPipeline::new(None, &engine);
        assert!(matches!(
            pipeline.build(&request()),
            Err(InstantError::Config(_))
        ));
        assert!(engine.seen_args.borrow().is_empty());
    }
}
