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


//! ZIP archive creation and extraction through the JDK's `jar` tool.
//!
//! Nothing here understands the ZIP format: `jar` does the work and this
//! crate only decides how to call it and what its exit code means.

use instant_common::*;
use std::{
    ffi::OsString,
    path::{Path, PathBuf}
};
use tracing::{debug, error};

const JAR_TOOL: &str = "jar";

/// Wraps the `jar` binary so it can be used as a general purpose zip tool.
pub struct ArchiveTool<R: CommandRunner> {
    jar: PathBuf,
    runner: R
}

impl<R: CommandRunner> ArchiveTool<R> {
    pub fn new(jar: PathBuf, runner: R) -> Self {
        ArchiveTool { jar, runner }
    }

    /// Creates `archive_path` containing `entry_name`, read relative to
    /// `base_directory`. Entries are stored uncompressed and no manifest is
    /// added.
    ///
    /// `entry_name` must not contain spaces. The archive and base directory
    /// paths may contain anything.
    pub fn create_archive(
        &self,
        archive_path: &Path,
        base_directory: &Path,
        entry_name: &str
    ) -> Result<()> {
        if entry_name.contains(' ') {
            return Err(InstantError::InvalidArgument(format!(
                "Cannot handle file names with spaces: {entry_name}"
            )));
        }
        let args: Vec<OsString> = vec![
            "c0Mf".into(),
            archive_path.into(),
            "-C".into(),
            base_directory.into(),
            entry_name.into()
        ];
        self.run_jar(&args, None)
    }

    /// Extracts every entry of `archive_path` into `output_directory`.
    ///
    /// `jar` runs inside `output_directory`, so a relative `archive_path` is
    /// resolved against the current directory first.
    pub fn extract_archive(&self, archive_path: &Path, output_directory: &Path) -> Result<()> {
        if !output_directory.is_dir() {
            return Err(InstantError::InvalidArgument(format!(
                "Output directory does not exist: {}",
                output_directory.display()
            )));
        }
        let archive_path = std::path::absolute(archive_path)?;
        let args: Vec<OsString> = vec!["xf".into(), archive_path.into()];
        self.run_jar(&args, Some(output_directory))
    }

    fn run_jar(&self, args: &[OsString], working_dir: Option<&Path>) -> Result<()> {
        let result = self.runner.run(&self.jar, args, working_dir)?;
        if result.success() {
            debug!("{} succeeded", render_command(&self.jar, args));
            return Ok(());
        }
        error!(
            exit_code = result.exit_code,
            "{} failed: {}",
            render_command(&self.jar, args),
            result.message
        );
        Err(InstantError::ProcessFailed {
            tool: JAR_TOOL.into(),
            message: result.message
        })
    }
}

/// Finds the `jar` binary, preferring the given Java home, then `JAVA_HOME`,
/// then whatever `jar` is on the `PATH`.
pub fn locate_jar(java_home: Option<&Path>) -> Result<PathBuf> {
    locate_jdk_tool(JAR_TOOL, java_home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::RefCell,
        env, fs,
        io::{Read, Write}
    };
    use tempfile::TempDir;
    use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

    /// Records every invocation and replies with a canned result.
    struct RecordingRunner {
        reply: CommandResult,
        calls: RefCell<Vec<(Vec<String>, Option<PathBuf>)>>
    }

    impl RecordingRunner {
        fn replying(exit_code: i32, message: &str) -> Self {
            RecordingRunner {
                reply: CommandResult {
                    exit_code,
                    message: message.into()
                },
                calls: RefCell::new(vec![])
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(
            &self,
            _program: &Path,
            args: &[OsString],
            working_dir: Option<&Path>
        ) -> Result<CommandResult> {
            self.calls.borrow_mut().push((
                args.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
                working_dir.map(Path::to_path_buf)
            ));
            Ok(self.reply.clone())
        }
    }

    /// Behaves like `jar c0Mf` / `jar xf` for a single-file entry.
    struct JarEmulator;

    impl CommandRunner for JarEmulator {
        fn run(
            &self,
            _program: &Path,
            args: &[OsString],
            working_dir: Option<&Path>
        ) -> Result<CommandResult> {
            let args: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();
            match args[0].to_str() {
                Some("c0Mf") => {
                    let entry = args[4].to_string_lossy().into_owned();
                    let mut contents = vec![];
                    fs::File::open(args[3].join(&entry))?.read_to_end(&mut contents)?;
                    let mut zip = ZipWriter::new(fs::File::create(&args[1])?);
                    let options =
                        SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
                    zip.start_file(entry, options).unwrap();
                    zip.write_all(&contents)?;
                    zip.finish().unwrap();
                }
                Some("xf") => {
                    let out = working_dir.expect("xf needs a working directory");
                    let mut archive =
                        ZipArchive::new(fs::File::open(out.join(&args[1]))?).unwrap();
                    archive.extract(out).unwrap();
                }
                other => panic!("unexpected jar mode {other:?}")
            }
            Ok(CommandResult {
                exit_code: 0,
                message: String::new()
            })
        }
    }

    #[test]
    fn entry_names_with_spaces_are_rejected_before_running_jar() {
        let runner = RecordingRunner::replying(0, "");
        let tool = ArchiveTool::new("jar".into(), &runner);
        let result = tool.create_archive(
            Path::new("out.zip"),
            Path::new("/tmp"),
            "base module.apk"
        );
        assert!(matches!(result, Err(InstantError::InvalidArgument(_))));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn create_passes_store_only_no_manifest_arguments() {
        let runner = RecordingRunner::replying(0, "");
        let tool = ArchiveTool::new("jar".into(), &runner);
        tool.create_archive(
            Path::new("/out dir/base.zip"),
            Path::new("/build/My Game"),
            "base.apk"
        )
        .unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            vec!["c0Mf", "/out dir/base.zip", "-C", "/build/My Game", "base.apk"]
        );
        assert_eq!(calls[0].1, None);
    }

    #[test]
    fn extract_runs_in_output_directory() {
        let out = TempDir::new().unwrap();
        let runner = RecordingRunner::replying(0, "");
        let tool = ArchiveTool::new("jar".into(), &runner);
        tool.extract_archive(Path::new("/in/base.zip"), out.path())
            .unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls[0].0, vec!["xf", "/in/base.zip"]);
        assert_eq!(calls[0].1.as_deref(), Some(out.path()));
    }

    #[test]
    fn relative_archive_is_resolved_before_changing_directory() {
        let out = TempDir::new().unwrap();
        let runner = RecordingRunner::replying(0, "");
        let tool = ArchiveTool::new("jar".into(), &runner);
        tool.extract_archive(Path::new("bundle.zip"), out.path())
            .unwrap();
        let expected = env::current_dir().unwrap().join("bundle.zip");
        let calls = runner.calls.borrow();
        assert_eq!(
            calls[0].0,
            vec!["xf".to_string(), expected.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn missing_output_directory_is_rejected_before_running_jar() {
        let work = TempDir::new().unwrap();
        let runner = RecordingRunner::replying(0, "");
        let tool = ArchiveTool::new("jar".into(), &runner);
        let result = tool.extract_archive(Path::new("a.zip"), &work.path().join("missing"));
        assert!(matches!(result, Err(InstantError::InvalidArgument(_))));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn nonzero_exit_carries_captured_output() {
        for code in [1, 2, 127, -1] {
            let runner = RecordingRunner::replying(code, "java.util.zip.ZipException: bad");
            let tool = ArchiveTool::new("jar".into(), &runner);
            let created = tool.create_archive(Path::new("a.zip"), Path::new("."), "a.txt");
            let extracted = tool.extract_archive(Path::new("a.zip"), Path::new("."));
            for result in [created, extracted] {
                match result {
                    Err(InstantError::ProcessFailed { message, .. }) => {
                        assert_eq!(message, "java.util.zip.ZipException: bad")
                    }
                    other => panic!("expected process failure, got {other:?}")
                }
            }
        }
    }

    #[test]
    fn archive_round_trip_reproduces_file() {
        let work = TempDir::new().unwrap();
        let base = work.path().join("build output");
        fs::create_dir_all(&base).unwrap();
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        fs::write(base.join("base.apk"), &payload).unwrap();

        let archive = work.path().join("bundle.zip");
        let out = work.path().join("extracted");
        fs::create_dir_all(&out).unwrap();

        let tool = ArchiveTool::new("jar".into(), JarEmulator);
        tool.create_archive(&archive, &base, "base.apk").unwrap();
        tool.extract_archive(&archive, &out).unwrap();

        assert_eq!(fs::read(out.join("base.apk")).unwrap(), payload);
    }

    #[test]
    fn archive_round_trip_with_relative_paths() {
        // `TempDir::new_in(".")` keeps the paths relative to the test's cwd.
        let work = TempDir::new_in(".").unwrap();
        assert!(work.path().is_relative());
        let base = work.path().join("base");
        let out = work.path().join("out");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(base.join("base.apk"), b"instant").unwrap();

        let archive = work.path().join("bundle.zip");
        let tool = ArchiveTool::new("jar".into(), JarEmulator);
        tool.create_archive(&archive, &base, "base.apk").unwrap();
        tool.extract_archive(&archive, &out).unwrap();

        assert_eq!(fs::read(out.join("base.apk")).unwrap(), b"instant");
    }

    #[test]
    fn java_home_jar_is_preferred() {
        let home = TempDir::new().unwrap();
        let bin = home.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let jar = bin.join(executable_name("jar"));
        fs::write(&jar, b"").unwrap();
        assert_eq!(locate_jar(Some(home.path())).unwrap(), jar);
    }
}
