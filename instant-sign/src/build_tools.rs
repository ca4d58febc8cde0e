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


use std::{
    env, fs,
    path::{Path, PathBuf}
};
use tracing::{debug, warn};

/// Android SDK root from `ANDROID_SDK_ROOT`, falling back to the deprecated
/// `ANDROID_HOME`.
pub fn sdk_root_from_env() -> Option<PathBuf> {
    env::var_os("ANDROID_SDK_ROOT")
        .or_else(|| env::var_os("ANDROID_HOME"))
        .filter(|root| !root.is_empty())
        .map(PathBuf::from)
}

/// Finds `lib/apksigner.jar` in the newest installed Build-Tools.
pub fn find_apksigner_jar(sdk_root: &Path) -> Option<PathBuf> {
    let build_tools = sdk_root.join("build-tools");
    let entries = match fs::read_dir(&build_tools) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Failed to read {}: {err}", build_tools.display());
            return None;
        }
    };

    let mut newest: Option<(Vec<u32>, PathBuf)> = None;
    for entry in entries.flatten() {
        let jar = entry.path().join("lib").join("apksigner.jar");
        if !jar.is_file() {
            debug!("Skipping {}, it has no apksigner", entry.path().display());
            continue;
        }
        let version = parse_version(&entry.file_name().to_string_lossy());
        if newest.as_ref().map_or(true, |(best, _)| version > *best) {
            newest = Some((version, jar));
        }
    }
    newest.map(|(_, jar)| jar)
}

/// "30.0.3" -> [30, 0, 3]. Suffixes such as "-rc1" are ignored, so
/// versions compare numerically rather than as strings.
fn parse_version(name: &str) -> Vec<u32> {
    name.split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install(sdk: &Path, version: &str, with_jar: bool) {
        let lib = sdk.join("build-tools").join(version).join("lib");
        fs::create_dir_all(&lib).unwrap();
        if with_jar {
            fs::write(lib.join("apksigner.jar"), b"PK").unwrap();
        }
    }

    #[test]
    fn versions_compare_numerically() {
        assert!(parse_version("30.0.3") > parse_version("9.0.0"));
        assert!(parse_version("28.0.10") > parse_version("28.0.9"));
        assert_eq!(parse_version("31.0.0-rc1"), vec![31, 0, 0]);
    }

    #[test]
    fn newest_build_tools_with_apksigner_wins() {
        let sdk = TempDir::new().unwrap();
        install(sdk.path(), "9.0.0", true);
        install(sdk.path(), "30.0.3", true);
        install(sdk.path(), "34.0.0", false);
        assert_eq!(
            find_apksigner_jar(sdk.path()).unwrap(),
            sdk.path().join("build-tools/30.0.3/lib/apksigner.jar")
        );
    }

    #[test]
    fn missing_build_tools_is_none() {
        let sdk = TempDir::new().unwrap();
        assert_eq!(find_apksigner_jar(sdk.path()), None);
    }
}
