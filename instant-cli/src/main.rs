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


use clap::{Parser, Subcommand};
use config::Config;
use instant_build::{
    BuildOption, BuildOrchestrator, HeadlessNotifier, Notifier, PolicyRegistry, TerminalNotifier
};
use instant_common::{InstantError, Result, SystemCommandRunner};
use instant_sign::ApkSigner;
use instant_zip::{locate_jar, ArchiveTool};
use pipeline::ProcessBuildPipeline;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod pipeline;

#[derive(Parser)]
#[command(name = "instant")]
#[command(about = "Build and sign Play Instant APKs")]
struct Cli {
    /// Project configuration file
    #[arg(short, long, global = true, default_value = "instant.toml")]
    config: PathBuf,

    /// Never prompt, only log. Implied when stdin or stdout is not a terminal.
    #[arg(long, global = true)]
    headless: bool,

    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand)]
enum Command {
    /// Create or extract ZIP archives with the JDK's jar tool
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Print the scenes a build would include
    Scenes,
    /// Check the build type and required settings without building
    Validate,
    /// Build the player and make sure it is signed with APK Signature Scheme v2
    Build {
        /// Output APK path
        output: PathBuf,
        /// Build option, e.g. "development". May be repeated.
        #[arg(short = 'O', long = "option")]
        options: Vec<BuildOption>,
        /// Skip the signature check after building
        #[arg(long)]
        no_sign: bool
    },
    /// Verify an APK and re-sign it if it lacks a v2 signature
    Sign {
        apk: PathBuf
    }
}

#[derive(Subcommand)]
enum ArchiveCommand {
    /// Store BASE_DIR/ENTRY uncompressed in ARCHIVE
    Create {
        archive: PathBuf,
        base_dir: PathBuf,
        entry: String
    },
    /// Extract every entry of ARCHIVE into OUTPUT_DIR
    Extract {
        archive: PathBuf,
        output_dir: PathBuf
    }
}

/// Builds and signs Play Instant APKs.
///
/// ```
/// $ instant validate
/// $ instant build out/game.apk --option development
/// $ instant archive create out/game.zip out game.apk
/// ```
///
/// Settings are read from `instant.toml` in the working directory unless
/// `--config` says otherwise.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let notifier = make_notifier(cli.headless, &cli.config);

    match cli.command {
        Command::Archive(archive) => run_archive(&cli.config, archive),
        Command::Scenes => {
            let config = Config::load(&cli.config)?;
            with_orchestrator(&config, notifier.as_ref(), |orchestrator| {
                let request = orchestrator.assemble_build_request("", Default::default());
                for scene in request.scenes {
                    println!("{scene}");
                }
                Ok(())
            })
        }
        Command::Validate => {
            let config = Config::load(&cli.config)?;
            with_orchestrator(&config, notifier.as_ref(), |orchestrator| {
                orchestrator.check_prerequisites()?;
                println!("Settings are ready for an instant build");
                Ok(())
            })
        }
        Command::Build {
            output,
            options,
            no_sign
        } => {
            let config = Config::load(&cli.config)?;
            with_orchestrator(&config, notifier.as_ref(), |orchestrator| {
                let request = orchestrator.assemble_build_request(
                    &output.to_string_lossy(),
                    options.into_iter().collect()
                );
                let built = if no_sign {
                    orchestrator.validate_and_build(&request)
                } else {
                    orchestrator.build_and_sign(&request)
                };
                if !built {
                    return Err(InstantError::Cli("Build did not complete".into()));
                }
                println!("Built {:?}", output);
                Ok(())
            })
        }
        Command::Sign { apk } => {
            let config = Config::load_or_default(&cli.config)?;
            // An explicit sign request always checks, whatever the pipeline does
            with_orchestrator(&config, notifier.as_ref(), |orchestrator| {
                if !orchestrator.ensure_v2_signature(&apk) {
                    return Err(InstantError::Cli("Signing did not complete".into()));
                }
                println!("{:?} is signed with APK Signature Scheme v2", apk);
                Ok(())
            })
        }
    }
}

fn make_notifier(headless: bool, config_path: &Path) -> Box<dyn Notifier> {
    if headless || !io::stdout().is_terminal() || !io::stdin().is_terminal() {
        Box::new(HeadlessNotifier)
    } else {
        Box::new(TerminalNotifier::stdio(config_path.to_path_buf()))
    }
}

fn with_orchestrator<T>(
    config: &Config,
    notifier: &dyn Notifier,
    run: impl FnOnce(&BuildOrchestrator) -> Result<T>
) -> Result<T> {
    let policies = PolicyRegistry::required(&config.player_settings);
    let pipeline = ProcessBuildPipeline::new(config.pipeline.clone(), SystemCommandRunner);
    let signer = ApkSigner::locate(
        config.tools.android_sdk_root.as_deref(),
        config.tools.java_home.as_deref(),
        config.keystore(),
        SystemCommandRunner
    );
    let orchestrator =
        BuildOrchestrator::new(&config.project, &policies, &pipeline, &signer, notifier)
            .pipeline_always_signs(config.pipeline_always_signs);
    run(&orchestrator)
}

fn run_archive(config_path: &Path, command: ArchiveCommand) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let jar = locate_jar(config.tools.java_home.as_deref())?;
    let tool = ArchiveTool::new(jar, SystemCommandRunner);
    match command {
        ArchiveCommand::Create {
            archive,
            base_dir,
            entry
        } => {
            tool.create_archive(&archive, &base_dir, &entry)?;
            println!("Wrote {:?} to disk", archive);
        }
        ArchiveCommand::Extract {
            archive,
            output_dir
        } => {
            tool.extract_archive(&archive, &output_dir)?;
            println!("Extracted {:?} to {:?}", archive, output_dir);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_options_parse() {
        let cli = Cli::try_parse_from([
            "instant",
            "--headless",
            "build",
            "out/game.apk",
            "-O",
            "development",
            "--option",
            "allow-debugging"
        ])
        .unwrap();
        assert!(cli.headless);
        match cli.command {
            Command::Build { options, no_sign, .. } => {
                assert_eq!(options, vec![BuildOption::Development, BuildOption::AllowDebugging]);
                assert!(!no_sign);
            }
            _ => panic!("expected build")
        }
    }

    #[test]
    fn unknown_build_option_is_rejected() {
        assert!(Cli::try_parse_from(["instant", "build", "out.apk", "-O", "turbo"]).is_err());
    }
}
