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


use instant_build::{PlayerSettings, ProjectSettings};
use instant_common::{InstantError, Result};
use instant_sign::KeystoreConfig;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf}
};
use tracing::debug;

/// Contents of the project's `instant.toml`.
///
/// ```toml
/// build_type = "instant"
/// pipeline_always_signs = false
///
/// [[editor_scenes]]
/// path = "Assets/Scenes/Main.unity"
///
/// [player_settings]
/// min_sdk_version = 21
/// graphics_apis = ["open_gles3"]
///
/// [pipeline]
/// command = "/Applications/Unity/Unity.app/Contents/MacOS/Unity"
/// args = ["-batchmode", "-quit", "-executeMethod", "InstantBuild.Run"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub project: ProjectSettings,
    /// Whether the build pipeline is known to sign its output with APK
    /// Signature Scheme v2. If not, builds are checked and re-signed.
    pub pipeline_always_signs: bool,
    pub player_settings: PlayerSettings,
    pub pipeline: Option<PipelineConfig>,
    pub tools: ToolsConfig,
    pub signing: Option<SigningConfig>
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project: ProjectSettings::default(),
            pipeline_always_signs: true,
            player_settings: PlayerSettings::default(),
            pipeline: None,
            tools: ToolsConfig::default(),
            signing: None
        }
    }
}

/// The external program that performs the player build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Falls back to `JAVA_HOME`.
    pub java_home: Option<PathBuf>,
    /// Falls back to `ANDROID_SDK_ROOT`, then `ANDROID_HOME`.
    pub android_sdk_root: Option<PathBuf>
}

/// Release keystore for re-signing. Passwords use apksigner's syntax, so
/// `env:RELEASE_KS_PASS` keeps secrets out of the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SigningConfig {
    pub keystore: PathBuf,
    pub keystore_pass: String,
    pub key_alias: String,
    pub key_pass: String
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|err| {
            InstantError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Config::parse(&text)
    }

    /// Like [Config::load], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if path.exists() {
            Config::load(path)
        } else {
            debug!("{} not found, using default configuration", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|err| InstantError::Config(err.to_string()))
    }

    /// The configured release keystore, or the debug keystore.
    pub fn keystore(&self) -> KeystoreConfig {
        match &self.signing {
            Some(signing) => KeystoreConfig {
                path: signing.keystore.clone(),
                store_password: signing.keystore_pass.clone(),
                alias: signing.key_alias.clone(),
                key_password: signing.key_pass.clone()
            },
            None => KeystoreConfig::debug()
        }
    }
}
