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


//! Project settings an instant build can't do without.

use crate::settings::{AndroidBuildSystem, GraphicsApi, PlayerSettings};

/// Instant apps need at least Android 5.0.
pub const MIN_INSTANT_SDK_VERSION: u32 = 21;

/// A named requirement on the project's settings.
pub trait Policy {
    fn name(&self) -> &str;
    /// Tells the user what to change when the policy isn't met.
    fn guidance(&self) -> &str;
    fn is_correct_state(&self) -> bool;
}

/// Policies evaluated before every build, in registration order.
#[derive(Default)]
pub struct PolicyRegistry {
    policies: Vec<Box<dyn Policy>>
}

impl PolicyRegistry {
    pub fn new() -> Self {
        PolicyRegistry::default()
    }

    /// The policies every instant build requires, judged against `player`.
    pub fn required(player: &PlayerSettings) -> Self {
        let mut registry = PolicyRegistry::new();
        registry.register(Box::new(BuildSystemPolicy {
            build_system: player.build_system
        }));
        registry.register(Box::new(MinSdkVersionPolicy {
            min_sdk_version: player.min_sdk_version
        }));
        registry.register(Box::new(GraphicsApiPolicy {
            graphics_apis: player.graphics_apis.clone()
        }));
        registry
    }

    pub fn register(&mut self, policy: Box<dyn Policy>) {
        self.policies.push(policy);
    }

    pub fn policies(&self) -> impl Iterator<Item = &dyn Policy> {
        self.policies.iter().map(|policy| policy.as_ref())
    }

    /// Every policy whose state check fails, in registration order.
    pub fn failed_policies(&self) -> Vec<&dyn Policy> {
        self.policies().filter(|policy| !policy.is_correct_state()).collect()
    }
}

struct BuildSystemPolicy {
    build_system: AndroidBuildSystem
}

impl Policy for BuildSystemPolicy {
    fn name(&self) -> &str {
        "Android build system"
    }

    fn guidance(&self) -> &str {
        "Set player_settings.build_system to \"gradle\"."
    }

    fn is_correct_state(&self) -> bool {
        self.build_system == AndroidBuildSystem::Gradle
    }
}

struct MinSdkVersionPolicy {
    min_sdk_version: u32
}

impl Policy for MinSdkVersionPolicy {
    fn name(&self) -> &str {
        "Android minimum API level"
    }

    fn guidance(&self) -> &str {
        "Set player_settings.min_sdk_version to 21 or higher."
    }

    fn is_correct_state(&self) -> bool {
        self.min_sdk_version >= MIN_INSTANT_SDK_VERSION
    }
}

struct GraphicsApiPolicy {
    graphics_apis: Vec<GraphicsApi>
}

impl Policy for GraphicsApiPolicy {
    fn name(&self) -> &str {
        "Graphics API"
    }

    fn guidance(&self) -> &str {
        "Remove \"vulkan\" from player_settings.graphics_apis and include \"open_gles2\" or \"open_gles3\"."
    }

    fn is_correct_state(&self) -> bool {
        !self.graphics_apis.contains(&GraphicsApi::Vulkan)
            && self
                .graphics_apis
                .iter()
                .any(|api| matches!(api, GraphicsApi::OpenGles2 | GraphicsApi::OpenGles3))
    }
}
