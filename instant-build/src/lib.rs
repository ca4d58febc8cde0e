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


//! # Play Instant build orchestration
//!
//! This crate decides whether a Play Instant player build may run, runs it
//! through the engine's build pipeline, and makes sure the resulting APK is
//! signed with APK Signature Scheme v2.
//!
//! Everything outside the crate is injected: the project's build settings,
//! the pipeline, the signer and the [Notifier] that talks to the user.
//!
//! ```ignore
//! let settings: ProjectSettings = load_settings()?;
//! let policies = PolicyRegistry::required(&player_settings);
//! let orchestrator = BuildOrchestrator::new(&settings, &policies, &pipeline, &signer, &notifier)
//!     .pipeline_always_signs(false);
//!
//! let request = orchestrator.assemble_build_request("out/game.apk", BuildOptions::new());
//! if !orchestrator.build_and_sign(&request) {
//!     // Already logged and shown to the user
//! }
//! ```

pub mod notifier;
pub mod orchestrator;
pub mod pipeline;
pub mod policy;
pub mod request;
pub mod settings;

pub use instant_common::{InstantError, Result};
pub use notifier::{HeadlessNotifier, Notifier, SettingsSurface, TerminalNotifier};
pub use orchestrator::BuildOrchestrator;
pub use pipeline::{BuildPipeline, BuildReport, BuildResult, PipelineOutcome};
pub use policy::{Policy, PolicyRegistry};
pub use request::{BuildOption, BuildOptions, BuildRequest, BuildTarget};
pub use settings::{BuildSettings, EditorScene, PlayerSettings, ProjectSettings};
