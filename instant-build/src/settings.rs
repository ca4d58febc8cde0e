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


//! The project's build configuration, as seen by the orchestrator.

use serde::Deserialize;

/// One entry of the project's configured scene list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorScene {
    pub path: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool
}

fn default_enabled() -> bool {
    true
}

impl EditorScene {
    pub fn new(path: &str, enabled: bool) -> Self {
        EditorScene {
            path: path.into(),
            enabled
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    #[default]
    Installed,
    Instant
}

/// Read access to the build configuration store.
pub trait BuildSettings {
    /// Explicit scene list for instant builds. Empty means "use the
    /// project's enabled scenes".
    fn scenes_in_build(&self) -> Vec<String>;
    fn asset_bundle_manifest_path(&self) -> Option<String>;
    fn is_instant_build_type(&self) -> bool;
    /// The project's full scene list, in configured order.
    fn editor_scenes(&self) -> Vec<EditorScene>;
}

/// Build configuration loaded from the project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub build_type: BuildType,
    pub scenes_in_build: Vec<String>,
    pub asset_bundle_manifest_path: Option<String>,
    pub editor_scenes: Vec<EditorScene>
}

impl BuildSettings for ProjectSettings {
    fn scenes_in_build(&self) -> Vec<String> {
        self.scenes_in_build.clone()
    }

    fn asset_bundle_manifest_path(&self) -> Option<String> {
        self.asset_bundle_manifest_path
            .clone()
            .filter(|path| !path.is_empty())
    }

    fn is_instant_build_type(&self) -> bool {
        self.build_type == BuildType::Instant
    }

    fn editor_scenes(&self) -> Vec<EditorScene> {
        self.editor_scenes.clone()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndroidBuildSystem {
    #[default]
    Gradle,
    Internal
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicsApi {
    OpenGles2,
    OpenGles3,
    Vulkan
}

/// The subset of player settings the required policies inspect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub build_system: AndroidBuildSystem,
    pub min_sdk_version: u32,
    pub graphics_apis: Vec<GraphicsApi>
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerSettings {
            build_system: AndroidBuildSystem::Gradle,
            min_sdk_version: 16,
            graphics_apis: vec![GraphicsApi::Vulkan, GraphicsApi::OpenGles3]
        }
    }
}
