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
    env,
    path::{Path, PathBuf}
};
use tracing::debug;

use crate::{InstantError, Result};

/// Finds a JDK binary such as `jar` or `java`, preferring the given Java
/// home, then `JAVA_HOME`, then the `PATH`.
pub fn locate_jdk_tool(tool: &str, java_home: Option<&Path>) -> Result<PathBuf> {
    let java_home = java_home
        .map(Path::to_path_buf)
        .or_else(|| env::var_os("JAVA_HOME").map(PathBuf::from));
    if let Some(home) = java_home {
        let candidate = home.join("bin").join(executable_name(tool));
        if candidate.is_file() {
            return Ok(candidate);
        }
        debug!("No {tool} binary at {}", candidate.display());
    }
    which::which(tool).map_err(|_e| {
        InstantError::ToolUnavailable(format!(
            "Unable to locate {tool}. Check that a JDK is installed and JAVA_HOME is set."
        ))
    })
}

/// Appends `.exe` on Windows.
pub fn executable_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{tool}.exe")
    } else {
        tool.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn java_home_binary_is_preferred() {
        let home = TempDir::new().unwrap();
        let bin = home.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let java = bin.join(executable_name("java"));
        fs::write(&java, b"").unwrap();
        assert_eq!(locate_jdk_tool("java", Some(home.path())).unwrap(), java);
    }

    #[test]
    fn unknown_tool_is_unavailable() {
        let home = TempDir::new().unwrap();
        let result = locate_jdk_tool("no-such-jdk-tool-xyz", Some(home.path()));
        assert!(matches!(result, Err(InstantError::ToolUnavailable(_))));
    }
}
