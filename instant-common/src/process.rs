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
    ffi::{OsStr, OsString},
    path::Path,
    process::Command
};

use tracing::debug;

use crate::{InstantError, Result};

/// Outcome of running an external tool to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Process exit code. `-1` if the process was terminated by a signal.
    pub exit_code: i32,
    /// Captured stdout followed by captured stderr.
    pub message: String
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability to run an external program and wait for it.
///
/// Calls block until the child exits. No timeout is applied: a hung tool
/// hangs the caller.
pub trait CommandRunner {
    fn run(
        &self,
        program: &Path,
        args: &[OsString],
        working_dir: Option<&Path>
    ) -> Result<CommandResult>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(
        &self,
        program: &Path,
        args: &[OsString],
        working_dir: Option<&Path>
    ) -> Result<CommandResult> {
        (**self).run(program, args, working_dir)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(
        &self,
        program: &Path,
        args: &[OsString],
        working_dir: Option<&Path>
    ) -> Result<CommandResult> {
        (**self).run(program, args, working_dir)
    }
}

/// Runs programs with [std::process::Command], capturing their output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &Path,
        args: &[OsString],
        working_dir: Option<&Path>
    ) -> Result<CommandResult> {
        debug!(command = %render_command(program, args), cwd = ?working_dir, "running");
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }
        let output = command
            .output()
            .map_err(|source| InstantError::ProcessSpawnFailed {
                tool: program.to_path_buf(),
                source
            })?;

        let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
        message.push_str(&String::from_utf8_lossy(&output.stderr));
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(exit_code, "finished {}", program.display());
        Ok(CommandResult { exit_code, message })
    }
}

// Characters a POSIX shell or cmd.exe would treat specially
const SPECIAL_CHARS: &[char] = &[
    '"', '\'', '\\', '$', '`', '&', '|', ';', '<', '>', '(', ')', '*', '?', '!', '#', '~', '{',
    '}', '[', ']', '%', '^'
];

/// Quotes a single argument so the rendered command line can be pasted into
/// a shell. Plain arguments are returned unchanged.
pub fn quote_arg(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.is_empty() {
        return "\"\"".into();
    }
    if !arg.chars().any(|c| c.is_whitespace() || SPECIAL_CHARS.contains(&c)) {
        return arg.into_owned();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Renders a program and its arguments as one quoted command line.
pub fn render_command(program: &Path, args: &[OsString]) -> String {
    let mut line = quote_arg(program.as_os_str());
    for arg in args {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line
}
