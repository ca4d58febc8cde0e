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


//! Types shared between the Play Instant build crates.
//!
//! Every crate in the workspace reports failures through [InstantError] and
//! reaches external binaries (`jar`, `apksigner`, the engine's build
//! pipeline) through the [CommandRunner] capability, so tests can swap in a
//! fake without spawning real processes.

use std::{io, path::PathBuf};

use thiserror::Error;

pub mod process;
pub mod tools;

pub use process::{quote_arg, render_command, CommandResult, CommandRunner, SystemCommandRunner};
pub use tools::{executable_name, locate_jdk_tool};

/// Common error type making it easier to share `Result`s between the
/// Play Instant crates.
#[derive(Debug, Error)]
pub enum InstantError {
    /// A precondition was violated before any external tool was invoked.
    /// For example, an archive entry name containing a space, which `jar`
    /// can't tell apart from an argument separator.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// An external tool ran to completion but reported failure. `message` is
    /// the tool's own captured output, passed through verbatim.
    #[error("{tool} failed: {message}")]
    ProcessFailed { tool: String, message: String },
    /// The operating system refused to start an external tool, usually
    /// because the configured path doesn't exist or isn't executable.
    #[error("Failed to start {}: {source}", .tool.display())]
    ProcessSpawnFailed {
        tool: PathBuf,
        #[source]
        source: io::Error
    },
    /// A required external binary (`jar`, `java`, `apksigner`) couldn't be
    /// located on this machine.
    #[error("{0}")]
    ToolUnavailable(String),
    /// One or more required project settings are not in the state an
    /// instant build needs. Holds the name of every failed setting in
    /// registration order.
    #[error("Required settings are not set: {}", .0.join(", "))]
    PolicyViolation(Vec<String>),
    /// An APK's ZIP structure couldn't be walked, for example the End Of
    /// Central Directory record points past the end of the file.
    #[error("Malformed APK: {0}")]
    MalformedApk(String),
    /// The project configuration file is missing fields or is malformed.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The build pipeline produced a report that couldn't be read.
    #[error("Unreadable build report: {0}")]
    Report(String),
    /// The command line front end was used incorrectly.
    #[error("{0}")]
    Cli(String),
    /// An error occurred while reading or writing a local file.
    #[error("IO error: {0}")]
    FileIo(#[from] io::Error)
}

/// Result type where the error is always [InstantError].
pub type Result<T> = std::result::Result<T, InstantError>;

impl InstantError {
    /// The message shown to the user for this error. For process failures
    /// this is exactly the tool's captured output.
    pub fn user_message(&self) -> String {
        match self {
            InstantError::ProcessFailed { message, .. } => message.clone(),
            other => other.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_failure_message_is_verbatim() {
        let err = InstantError::ProcessFailed {
            tool: "jar".into(),
            message: "java.io.FileNotFoundException: in.zip".into()
        };
        assert_eq!(err.user_message(), "java.io.FileNotFoundException: in.zip");
        assert_eq!(
            err.to_string(),
            "jar failed: java.io.FileNotFoundException: in.zip"
        );
    }

    #[test]
    fn policy_violation_lists_every_name() {
        let err = InstantError::PolicyViolation(vec!["Graphics API".into(), "Min SDK".into()]);
        assert_eq!(
            err.to_string(),
            "Required settings are not set: Graphics API, Min SDK"
        );
    }
}
