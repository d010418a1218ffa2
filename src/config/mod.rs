//! Command-line parsing and validation for both binaries.

mod defaults;
mod validation;

use crate::layout::HostPlatform;
use crate::session::LanguageVersion;
use crate::supervisor::LaunchMode;
use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_EXIT_GRACE_MS, DEFAULT_INTERPRETER, DEFAULT_READY_SETTLE_MS, MAX_EXIT_GRACE_MS,
    MAX_READY_SETTLE_MS, MAX_RESULT_TIMEOUT_MS, MIN_READY_SETTLE_MS,
};

/// CLI options for the host. `validate` fills in every derived path.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "modforge",
    about = "Compile discovered mods through the modforge helper",
    author,
    version
)]
pub struct HostConfig {
    /// Installation root holding Core/, Plugins/ and Tools/ (default: per-user data dir + Modforge)
    #[arg(long = "install-root", env = "MODFORGE_INSTALL_ROOT")]
    pub install_root: Option<PathBuf>,

    /// Application directory (default: current directory)
    #[arg(long = "app-dir", env = "MODFORGE_APP_DIR")]
    pub app_dir: Option<PathBuf>,

    /// Per-application mods directory (default: <app-dir>/Mods)
    #[arg(long = "mods-dir")]
    pub mods_dir: Option<PathBuf>,

    /// Application-managed libraries (default: <app-dir>/Managed)
    #[arg(long = "managed-dir")]
    pub managed_dir: Option<PathBuf>,

    /// Host engine version, e.g. 2019.4.1f1
    #[arg(long = "host-version", env = "MODFORGE_HOST_VERSION")]
    pub host_version: String,

    /// Host operating system used for the platform symbol
    #[arg(long, value_enum, default_value_t = HostPlatform::current())]
    pub platform: HostPlatform,

    /// Host is a development build
    #[arg(long = "debug-build", default_value_t = false)]
    pub debug_build: bool,

    /// Public-key token of the host core runtime (16 hex digits)
    #[arg(long = "runtime-key", env = "MODFORGE_RUNTIME_KEY")]
    pub runtime_key: Option<String>,

    /// Helper executable (default: <install-root>/Tools/modforge-compiler)
    #[arg(long, env = "MODFORGE_HELPER")]
    pub helper: Option<PathBuf>,

    /// How to start the helper
    #[arg(long, value_enum, default_value_t = LaunchMode::Auto)]
    pub launch: LaunchMode,

    /// Interpreter command used for interpreted launches
    #[arg(long, env = "MODFORGE_INTERPRETER", default_value = DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// How long the helper must stay up before the first frame is sent (milliseconds)
    #[arg(long = "ready-settle-ms", default_value_t = DEFAULT_READY_SETTLE_MS)]
    pub ready_settle_ms: u64,

    /// Give up waiting for the compile result after this long (milliseconds)
    #[arg(long = "result-timeout-ms")]
    pub result_timeout_ms: Option<u64>,

    /// Grace period for each helper teardown step (milliseconds)
    #[arg(long = "exit-grace-ms", default_value_t = DEFAULT_EXIT_GRACE_MS)]
    pub exit_grace_ms: u64,

    /// Write the compiled library image here
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the action plan as JSON lines and exit without launching the helper
    #[arg(long = "plan", default_value_t = false)]
    pub plan: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "MODFORGE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "MODFORGE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Parsed interpreter argv, filled by `validate`.
    #[arg(skip)]
    pub interpreter_argv: Vec<String>,
}

/// CLI options for the helper process.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "modforge-compiler",
    about = "Compiler helper driven over stdin/stdout by modforge",
    author,
    version
)]
pub struct HelperConfig {
    /// Enable file logging (debug)
    #[arg(long = "logs", env = "MODFORGE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "MODFORGE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Directory holding the compatibility shim (default: next to this executable)
    #[arg(long = "shim-dir", env = "MODFORGE_SHIM_DIR")]
    pub shim_dir: Option<PathBuf>,

    /// Language version used to parse sources
    #[arg(long = "lang-version", value_enum, default_value_t = LanguageVersion::Latest)]
    pub lang_version: LanguageVersion,
}

/// Shared view of the logging switches.
pub trait LoggingFlags {
    fn logs(&self) -> bool;
    fn no_logs(&self) -> bool;

    fn logging_enabled(&self) -> bool {
        self.logs() && !self.no_logs()
    }
}

impl LoggingFlags for HostConfig {
    fn logs(&self) -> bool {
        self.logs
    }

    fn no_logs(&self) -> bool {
        self.no_logs
    }
}

impl LoggingFlags for HelperConfig {
    fn logs(&self) -> bool {
        self.logs
    }

    fn no_logs(&self) -> bool {
        self.no_logs
    }
}
