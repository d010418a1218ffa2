//! Installation layout shared by the host and the helper.
//!
//! ```text
//! <data dir>/Modforge/
//!   Core/      bundled reference libraries
//!   Plugins/   installed plugins (sources and libraries)
//!   Tools/     modforge-compiler + MicroRuntimeForwarder.dll
//! ```

use clap::ValueEnum;
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const PRODUCT_FOLDER: &str = "Modforge";
pub const CORE_DIR: &str = "Core";
pub const PLUGINS_DIR: &str = "Plugins";
pub const TOOLS_DIR: &str = "Tools";

/// Forwarding reference that papers over the micro runtime's missing facades.
pub const COMPATIBILITY_SHIM_FILE: &str = "MicroRuntimeForwarder.dll";

/// Public-key token reported by the micro flavour of the host core runtime.
pub const MICRO_RUNTIME_KEY: &str = "7cec85d7bea7798e";

const HELPER_STEM: &str = "modforge-compiler";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Windows,
    Macos,
    Linux,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::Macos
        } else {
            HostPlatform::Linux
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HostPlatform::Windows => "windows",
            HostPlatform::Macos => "macos",
            HostPlatform::Linux => "linux",
        }
    }

    /// Preprocessor symbol naming the standalone player flavour.
    pub fn platform_symbol(self) -> &'static str {
        match self {
            HostPlatform::Windows => "UNITY_STANDALONE_WIN",
            HostPlatform::Macos => "UNITY_STANDALONE_OSX",
            HostPlatform::Linux => "UNITY_STANDALONE_LINUX",
        }
    }

    pub fn helper_file_name(self) -> String {
        match self {
            HostPlatform::Windows => format!("{HELPER_STEM}.exe"),
            HostPlatform::Macos | HostPlatform::Linux => HELPER_STEM.to_string(),
        }
    }

    /// Per-user application data directory, resolved through `lookup` so
    /// callers can substitute the environment.
    pub fn data_dir_with<F>(self, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());
        match self {
            HostPlatform::Windows => non_empty("APPDATA").map(PathBuf::from),
            HostPlatform::Macos => non_empty("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support")),
            HostPlatform::Linux => non_empty("XDG_DATA_HOME")
                .map(PathBuf::from)
                .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".local/share"))),
        }
    }

    pub fn data_dir(self) -> Option<PathBuf> {
        self.data_dir_with(|key| env::var_os(key))
    }
}

/// Fixed directory tree under the installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<data dir>/Modforge` for the given platform, if a data dir is known.
    pub fn for_platform(platform: HostPlatform) -> Option<Self> {
        platform
            .data_dir()
            .map(|dir| Self::new(dir.join(PRODUCT_FOLDER)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn core_dir(&self) -> PathBuf {
        self.root.join(CORE_DIR)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(PLUGINS_DIR)
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join(TOOLS_DIR)
    }

    pub fn helper_path(&self, platform: HostPlatform) -> PathBuf {
        self.tools_dir().join(platform.helper_file_name())
    }
}
