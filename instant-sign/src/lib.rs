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


//! Re-signing of built APKs with the Android SDK's `apksigner`.
//!
//! Older engine build pipelines produce APKs that are only signed with the
//! v1 (JAR) scheme, which instant apps don't accept. [ApkSigner] checks the
//! output for an APK Signature Scheme v2 signature and re-signs it in place
//! when there isn't one.

use instant_common::*;
use std::{
    env, fs,
    ffi::OsString,
    path::{Path, PathBuf}
};
use tracing::{debug, error, info, warn};

pub mod build_tools;
pub mod signing_block;
mod zip_parser;

pub use signing_block::has_v2_signature_block;

const APKSIGNER_TOOL: &str = "apksigner";
const V2_VERIFIED_LINE: &str = "Verified using v2 scheme (APK Signature Scheme v2): true";

/// The signing operations the build orchestrator needs.
pub trait ApkSigning {
    /// Whether the signing tool could be found on this machine.
    fn is_available(&self) -> bool;
    /// Whether `apk` is correctly signed with APK Signature Scheme v2.
    fn verify_v2(&self, apk: &Path) -> bool;
    /// Re-signs `apk` in place. Returns `None` on success, otherwise the
    /// tool's error message.
    fn sign(&self, apk: &Path) -> Option<String>;
}

/// Keystore arguments passed through to `apksigner sign`. Passwords use
/// apksigner's own syntax, e.g. `pass:android` or `env:KEYSTORE_PASS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreConfig {
    pub path: PathBuf,
    pub store_password: String,
    pub alias: String,
    pub key_password: String
}

impl KeystoreConfig {
    /// The debug keystore every Android toolchain creates under
    /// `~/.android`.
    pub fn debug() -> Self {
        let home = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from);
        KeystoreConfig::debug_under(home)
    }

    fn debug_under(home: Option<PathBuf>) -> Self {
        let home = home.unwrap_or_else(|| {
            warn!(
                "Neither HOME nor USERPROFILE is set, looking for the debug keystore in the \
                 current directory"
            );
            PathBuf::new()
        });
        KeystoreConfig {
            path: home.join(".android").join("debug.keystore"),
            store_password: "pass:android".into(),
            alias: "androiddebugkey".into(),
            key_password: "pass:android".into()
        }
    }
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        KeystoreConfig::debug()
    }
}

/// Runs `apksigner.jar` from the Android SDK Build-Tools with `java -jar`.
pub struct ApkSigner<R: CommandRunner> {
    java: Option<PathBuf>,
    apksigner_jar: Option<PathBuf>,
    keystore: KeystoreConfig,
    runner: R
}

impl<R: CommandRunner> ApkSigner<R> {
    pub fn new(
        java: Option<PathBuf>,
        apksigner_jar: Option<PathBuf>,
        keystore: KeystoreConfig,
        runner: R
    ) -> Self {
        ApkSigner {
            java,
            apksigner_jar,
            keystore,
            runner
        }
    }

    /// Looks for `java` and the newest `apksigner.jar`. Missing tools are
    /// not an error here; [ApkSigning::is_available] reports them later.
    pub fn locate(
        sdk_root: Option<&Path>,
        java_home: Option<&Path>,
        keystore: KeystoreConfig,
        runner: R
    ) -> Self {
        let java = locate_jdk_tool("java", java_home)
            .map_err(|err| debug!("{err}"))
            .ok();
        let sdk_root = sdk_root
            .map(Path::to_path_buf)
            .or_else(build_tools::sdk_root_from_env);
        let apksigner_jar = sdk_root.as_deref().and_then(build_tools::find_apksigner_jar);
        if let Some(jar) = &apksigner_jar {
            debug!("Using {}", jar.display());
        }
        ApkSigner::new(java, apksigner_jar, keystore, runner)
    }

    fn run_apksigner(&self, args: Vec<OsString>) -> Result<CommandResult> {
        let (java, apksigner_jar) = match (&self.java, &self.apksigner_jar) {
            (Some(java), Some(jar)) => (java, jar),
            _ => {
                return Err(InstantError::ToolUnavailable(
                    "Unable to locate apksigner".into()
                ))
            }
        };
        let mut full_args: Vec<OsString> = vec!["-jar".into(), apksigner_jar.into()];
        full_args.extend(args);
        self.runner.run(java, &full_args, None)
    }
}

impl<R: CommandRunner> ApkSigning for ApkSigner<R> {
    fn is_available(&self) -> bool {
        self.java.is_some() && self.apksigner_jar.is_some()
    }

    fn verify_v2(&self, apk: &Path) -> bool {
        // Skip spawning a JVM when there is plainly no v2 block
        match fs::read(apk)
            .map_err(InstantError::from)
            .and_then(|bytes| has_v2_signature_block(&bytes))
        {
            Ok(true) => {}
            Ok(false) => {
                info!("{} has no APK Signature Scheme v2 block", apk.display());
                return false;
            }
            Err(err) => {
                error!("Failed to read {}: {err}", apk.display());
                return false;
            }
        }

        let args: Vec<OsString> = vec!["verify".into(), "--verbose".into(), apk.into()];
        match self.run_apksigner(args) {
            Ok(result) if result.success() => {
                let verified = result.message.lines().any(|line| line.trim() == V2_VERIFIED_LINE);
                debug!(verified, "{APKSIGNER_TOOL} verify {}", apk.display());
                verified
            }
            Ok(result) => {
                info!(
                    "{APKSIGNER_TOOL} verify rejected {}: {}",
                    apk.display(),
                    result.message
                );
                false
            }
            Err(err) => {
                error!("{err}");
                false
            }
        }
    }

    fn sign(&self, apk: &Path) -> Option<String> {
        let args: Vec<OsString> = vec![
            "sign".into(),
            "--ks".into(),
            self.keystore.path.as_os_str().into(),
            "--ks-pass".into(),
            self.keystore.store_password.as_str().into(),
            "--ks-key-alias".into(),
            self.keystore.alias.as_str().into(),
            "--key-pass".into(),
            self.keystore.key_password.as_str().into(),
            apk.into()
        ];
        match self.run_apksigner(args) {
            Ok(result) if result.success() => {
                info!("Re-signed {}", apk.display());
                None
            }
            Ok(result) if result.message.trim().is_empty() => Some(format!(
                "{APKSIGNER_TOOL} exited with code {}",
                result.exit_code
            )),
            Ok(result) => Some(result.message),
            Err(err) => Some(err.user_message())
        }
    }
}
