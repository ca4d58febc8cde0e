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


//! How build problems reach the user.
//!
//! Interactive sessions get a prompt they can answer. Headless sessions
//! (CI, piped output) never block on input; they only log.

use std::{
    cell::RefCell,
    io::{self, BufRead, Write},
    path::PathBuf
};
use tracing::{error, info, warn};

pub const BUILD_ERROR_TITLE: &str = "Build Error";
pub const OK_BUTTON_TEXT: &str = "OK";
pub const CANCEL_BUTTON_TEXT: &str = "Cancel";

/// Where the user can go to correct a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSurface {
    /// Build type, scene list and other instant build settings.
    BuildSettings,
    /// Player settings checked by the required policies.
    QuickFix
}

pub trait Notifier {
    fn is_headless(&self) -> bool;
    /// Shows `message` and returns true if the user pressed `ok_text`.
    /// Without `cancel_text` the dialog only has the one button.
    fn display_dialog(
        &self,
        title: &str,
        message: &str,
        ok_text: &str,
        cancel_text: Option<&str>
    ) -> bool;
    fn show_settings(&self, surface: SettingsSurface);
}

/// Never prompts. Dialogs are logged and count as dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessNotifier;

impl Notifier for HeadlessNotifier {
    fn is_headless(&self) -> bool {
        true
    }

    fn display_dialog(
        &self,
        title: &str,
        message: &str,
        _ok_text: &str,
        _cancel_text: Option<&str>
    ) -> bool {
        error!("{title}: {message}");
        false
    }

    fn show_settings(&self, surface: SettingsSurface) {
        warn!("Cannot open {surface:?} settings in headless mode");
    }
}

/// Prompts on a terminal. Settings "windows" are printed as a pointer to
/// the section of the project file to edit.
pub struct TerminalNotifier<I: BufRead, O: Write> {
    input: RefCell<I>,
    output: RefCell<O>,
    config_path: PathBuf
}

impl TerminalNotifier<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(config_path: PathBuf) -> Self {
        TerminalNotifier::new(io::stdin().lock(), io::stdout(), config_path)
    }
}

impl<I: BufRead, O: Write> TerminalNotifier<I, O> {
    pub fn new(input: I, output: O, config_path: PathBuf) -> Self {
        TerminalNotifier {
            input: RefCell::new(input),
            output: RefCell::new(output),
            config_path
        }
    }

    fn prompt(&self, title: &str, message: &str, choices: &str) -> io::Result<String> {
        let mut output = self.output.borrow_mut();
        writeln!(output, "\n== {title} ==\n{message}\n")?;
        write!(output, "{choices} ")?;
        output.flush()?;
        let mut answer = String::new();
        if self.input.borrow_mut().read_line(&mut answer)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(answer.trim().to_string())
    }
}

impl<I: BufRead, O: Write> Notifier for TerminalNotifier<I, O> {
    fn is_headless(&self) -> bool {
        false
    }

    fn display_dialog(
        &self,
        title: &str,
        message: &str,
        ok_text: &str,
        cancel_text: Option<&str>
    ) -> bool {
        let choices = match cancel_text {
            Some(cancel) => format!("[{ok_text}/{cancel}]"),
            None => format!("[{ok_text}]")
        };
        match self.prompt(title, message, &choices) {
            // Enter accepts the default button
            Ok(answer) => {
                answer.is_empty()
                    || answer.eq_ignore_ascii_case(ok_text)
                    || answer.eq_ignore_ascii_case("y")
            }
            Err(err) => {
                error!("Failed to prompt: {err}");
                false
            }
        }
    }

    fn show_settings(&self, surface: SettingsSurface) {
        let section = match surface {
            SettingsSurface::BuildSettings => "the top-level build settings",
            SettingsSurface::QuickFix => "the [player_settings] table"
        };
        info!("Opening {surface:?} settings");
        let mut output = self.output.borrow_mut();
        if let Err(err) = writeln!(
            output,
            "Edit {section} in {} and run the build again.",
            self.config_path.display()
        ) {
            error!("Failed to write to terminal: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(answer: &str) -> TerminalNotifier<&[u8], Vec<u8>> {
        TerminalNotifier::new(answer.as_bytes(), vec![], "instant.toml".into())
    }

    #[test]
    fn headless_dialogs_are_dismissed() {
        assert!(!HeadlessNotifier.display_dialog("t", "m", OK_BUTTON_TEXT, None));
    }

    #[test]
    fn enter_or_ok_acknowledges() {
        for answer in ["\n", "ok\n", "OK\n", "y\n"] {
            let notifier = terminal(answer);
            assert!(notifier.display_dialog("t", "m", OK_BUTTON_TEXT, Some(CANCEL_BUTTON_TEXT)));
        }
    }

    #[test]
    fn cancel_declines() {
        let notifier = terminal("cancel\n");
        assert!(!notifier.display_dialog(
            BUILD_ERROR_TITLE,
            "Bad settings",
            OK_BUTTON_TEXT,
            Some(CANCEL_BUTTON_TEXT)
        ));
        let printed = String::from_utf8(notifier.output.borrow().clone()).unwrap();
        assert!(printed.contains("== Build Error ==\nBad settings"));
        assert!(printed.contains("[OK/Cancel]"));
    }

    #[test]
    fn closed_stdin_declines() {
        assert!(!terminal("").display_dialog("t", "m", OK_BUTTON_TEXT, None));
    }

    #[test]
    fn settings_point_at_config_file() {
        let notifier = terminal("");
        notifier.show_settings(SettingsSurface::QuickFix);
        let printed = String::from_utf8(notifier.output.borrow().clone()).unwrap();
        assert!(printed.contains("[player_settings]"));
        assert!(printed.contains("instant.toml"));
    }
}
