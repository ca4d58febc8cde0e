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


use instant_common::{InstantError, Result};
use instant_sign::ApkSigning;
use std::path::Path;
use tracing::{error, info};

use crate::{
    notifier::{
        Notifier, SettingsSurface, BUILD_ERROR_TITLE, CANCEL_BUTTON_TEXT, OK_BUTTON_TEXT
    },
    pipeline::{classify_legacy_message, BuildPipeline, BuildResult, LegacyOutcome, PipelineOutcome},
    policy::PolicyRegistry,
    request::{BuildOptions, BuildRequest, BuildTarget},
    settings::BuildSettings
};

/// Drives a Play Instant player build: checks the project settings, runs
/// the engine's build pipeline and re-signs the output when the pipeline
/// can't be trusted to sign with APK Signature Scheme v2.
///
/// Failures never escape as errors. Every operation returns `false` after
/// logging the problem and, in interactive sessions, showing it to the user.
pub struct BuildOrchestrator<'a> {
    settings: &'a dyn BuildSettings,
    policies: &'a PolicyRegistry,
    pipeline: &'a dyn BuildPipeline,
    signer: &'a dyn ApkSigning,
    notifier: &'a dyn Notifier,
    pipeline_always_signs: bool
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        settings: &'a dyn BuildSettings,
        policies: &'a PolicyRegistry,
        pipeline: &'a dyn BuildPipeline,
        signer: &'a dyn ApkSigning,
        notifier: &'a dyn Notifier
    ) -> Self {
        BuildOrchestrator {
            settings,
            policies,
            pipeline,
            signer,
            notifier,
            pipeline_always_signs: true
        }
    }

    /// Set to `false` for pipelines that may produce APKs without a v2
    /// signature. [BuildOrchestrator::build_and_sign] then checks and
    /// re-signs the output.
    pub fn pipeline_always_signs(mut self, always_signs: bool) -> Self {
        self.pipeline_always_signs = always_signs;
        self
    }

    /// Paths of the configured scenes that are enabled, in configured order.
    /// Scenes with an empty path are skipped.
    pub fn get_enabled_build_scenes(&self) -> Vec<String> {
        self.settings
            .editor_scenes()
            .into_iter()
            .filter(|scene| scene.enabled && !scene.path.is_empty())
            .map(|scene| scene.path)
            .collect()
    }

    pub fn assemble_build_request(&self, output_path: &str, options: BuildOptions) -> BuildRequest {
        let mut scenes = self.settings.scenes_in_build();
        if scenes.is_empty() {
            scenes = self.get_enabled_build_scenes();
        }
        BuildRequest {
            output_path: output_path.into(),
            scenes,
            options,
            target: BuildTarget::Android,
            asset_bundle_manifest_path: self.settings.asset_bundle_manifest_path()
        }
    }

    /// Checks the build type, then every required policy. Reports the first
    /// gate that fails and offers to open the matching settings.
    pub fn check_prerequisites(&self) -> Result<()> {
        if !self.settings.is_instant_build_type() {
            let message = format!(
                "The \"build_type\" setting must be \"instant\" to build a Play Instant app.\n\n\
                 Click \"{OK_BUTTON_TEXT}\" to open the build settings and change it."
            );
            if self.display_build_error_dialog(&message) {
                self.notifier.show_settings(SettingsSurface::BuildSettings);
            }
            return Err(InstantError::Config("build type is not instant".into()));
        }

        let failed = self.policies.failed_policies();
        if !failed.is_empty() {
            let details = failed
                .iter()
                .map(|policy| format!("{}: {}", policy.name(), policy.guidance()))
                .collect::<Vec<_>>()
                .join("\n");
            let message = format!(
                "Cannot build because the following required settings are not set:\n\n{details}\n\n\
                 Click \"{OK_BUTTON_TEXT}\" to open the settings window and make these changes."
            );
            if self.display_build_error_dialog(&message) {
                self.notifier.show_settings(SettingsSurface::QuickFix);
            }
            return Err(InstantError::PolicyViolation(
                failed.iter().map(|policy| policy.name().to_string()).collect()
            ));
        }
        Ok(())
    }

    /// Runs the prerequisite checks and then the build pipeline. Returns true
    /// only for a build that completed without errors.
    pub fn validate_and_build(&self, request: &BuildRequest) -> bool {
        if self.check_prerequisites().is_err() {
            return false;
        }

        let outcome = match self.pipeline.build(request) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.display_build_error(&err.to_string());
                return false;
            }
        };

        match outcome {
            PipelineOutcome::Report(report) => match report.result {
                BuildResult::Cancelled => {
                    info!("Build cancelled");
                    false
                }
                // The pipeline has already reported these errors itself
                BuildResult::Succeeded if report.total_errors > 0 => {
                    error!(
                        "Build reported success with {} error(s)",
                        report.total_errors
                    );
                    false
                }
                BuildResult::Succeeded => {
                    info!("Build succeeded: {}", request.output_path);
                    true
                }
                BuildResult::Failed => {
                    self.display_build_error(&format!(
                        "Build failed with {} error(s)",
                        report.total_errors
                    ));
                    false
                }
                BuildResult::Unknown => {
                    self.display_build_error("Build failed with unknown error");
                    false
                }
            },
            PipelineOutcome::Legacy(message) => match classify_legacy_message(message.as_deref())
            {
                LegacyOutcome::Completed => true,
                LegacyOutcome::Cancelled => {
                    info!("{}", crate::pipeline::LEGACY_CANCELLED_MESSAGE);
                    false
                }
                LegacyOutcome::Failed(message) => {
                    self.display_build_error(&message);
                    false
                }
            }
        }
    }

    /// Builds, then makes sure the APK carries a v2 signature.
    pub fn build_and_sign(&self, request: &BuildRequest) -> bool {
        if !self.validate_and_build(request) {
            return false;
        }
        if self.pipeline_always_signs {
            return true;
        }
        self.ensure_v2_signature(Path::new(&request.output_path))
    }

    /// Verifies `apk` and re-signs it in place if it lacks a valid APK
    /// Signature Scheme v2 signature.
    pub fn ensure_v2_signature(&self, apk: &Path) -> bool {
        if !self.signer.is_available() {
            self.display_build_error(
                "Unable to locate apksigner. Check that a recent version of Android SDK \
                 Build-Tools is installed and ANDROID_SDK_ROOT points at the SDK."
            );
            return false;
        }
        if self.signer.verify_v2(apk) {
            return true;
        }

        info!("Re-signing {} with apksigner", apk.display());
        match self.signer.sign(apk) {
            Some(message) if !message.is_empty() => {
                self.display_build_error(&format!(
                    "Failed to re-sign the APK using apksigner:\n\n{message}"
                ));
                false
            }
            _ => true
        }
    }

    /// Shows `message` with OK and Cancel buttons. Returns true if the user
    /// pressed OK; always false in headless mode, where nothing is shown.
    pub fn display_build_error_dialog(&self, message: &str) -> bool {
        error!("Build error: {message}");
        if self.notifier.is_headless() {
            return false;
        }
        self.notifier.display_dialog(
            BUILD_ERROR_TITLE,
            message,
            OK_BUTTON_TEXT,
            Some(CANCEL_BUTTON_TEXT)
        )
    }

    /// Logs `message` and, when interactive, shows it in a one-button dialog.
    pub fn display_build_error(&self, message: &str) {
        error!("Build error: {message}");
        if !self.notifier.is_headless() {
            self.notifier
                .display_dialog(BUILD_ERROR_TITLE, message, OK_BUTTON_TEXT, None);
        }
    }
}
