use super::defaults::{
    DEFAULT_INTERPRETER, MANAGED_DIR_NAME, MAX_EXIT_GRACE_MS, MAX_READY_SETTLE_MS,
    MAX_RESULT_TIMEOUT_MS, MIN_READY_SETTLE_MS, MODS_DIR_NAME, RUNTIME_KEY_LEN,
};
use super::{HelperConfig, HostConfig, LoggingFlags};
use crate::driver::HelperEnvironment;
use crate::host::{DiscoveryRoots, HostIdentity, HostRequest, HostVersion};
use crate::layout::InstallLayout;
use crate::supervisor::{LaunchSpec, SupervisorOptions};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl HostConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and resolve every defaulted path to an absolute one.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_READY_SETTLE_MS..=MAX_READY_SETTLE_MS).contains(&self.ready_settle_ms) {
            bail!(
                "--ready-settle-ms must be between {MIN_READY_SETTLE_MS} and {MAX_READY_SETTLE_MS}, got {}",
                self.ready_settle_ms
            );
        }
        if let Some(ms) = self.result_timeout_ms {
            if ms == 0 || ms > MAX_RESULT_TIMEOUT_MS {
                bail!(
                    "--result-timeout-ms must be between 1 and {MAX_RESULT_TIMEOUT_MS}, got {ms}"
                );
            }
        }
        if self.exit_grace_ms > MAX_EXIT_GRACE_MS {
            bail!(
                "--exit-grace-ms must be at most {MAX_EXIT_GRACE_MS}, got {}",
                self.exit_grace_ms
            );
        }

        self.host_version = self.host_version.trim().to_string();
        HostVersion::parse(&self.host_version).context("--host-version is not a valid version")?;

        if let Some(key) = self.runtime_key.take() {
            self.runtime_key = Some(normalize_runtime_key(&key)?);
        }

        self.interpreter_argv = shell_words::split(&self.interpreter)
            .with_context(|| format!("failed to parse --interpreter '{}'", self.interpreter))?;
        if self.interpreter_argv.is_empty() {
            bail!("--interpreter must not be empty (default is '{DEFAULT_INTERPRETER}')");
        }

        let app_dir = match self.app_dir.take() {
            Some(dir) => absolute(dir)?,
            None => env::current_dir().context("failed to read the current directory")?,
        };
        let mods_dir = match self.mods_dir.take() {
            Some(dir) => absolute(dir)?,
            None => app_dir.join(MODS_DIR_NAME),
        };
        let managed_dir = match self.managed_dir.take() {
            Some(dir) => absolute(dir)?,
            None => app_dir.join(MANAGED_DIR_NAME),
        };
        let install_root = match self.install_root.take() {
            Some(root) => absolute(root)?,
            None => InstallLayout::for_platform(self.platform)
                .map(|layout| layout.root().to_path_buf())
                .ok_or_else(|| {
                    anyhow!("cannot locate the per-user data directory; pass --install-root")
                })?,
        };
        if let Some(helper) = self.helper.take() {
            self.helper = Some(absolute(helper)?);
        }
        if let Some(output) = self.output.take() {
            self.output = Some(absolute(output)?);
        }

        self.app_dir = Some(app_dir);
        self.mods_dir = Some(mods_dir);
        self.managed_dir = Some(managed_dir);
        self.install_root = Some(install_root);
        Ok(())
    }

    pub fn layout(&self) -> Result<InstallLayout> {
        Ok(InstallLayout::new(resolved(&self.install_root, "--install-root")?))
    }

    pub fn helper_path(&self) -> Result<PathBuf> {
        match &self.helper {
            Some(helper) => Ok(helper.clone()),
            None => Ok(self.layout()?.helper_path(self.platform)),
        }
    }

    pub fn host_identity(&self) -> Result<HostIdentity> {
        Ok(HostIdentity {
            platform: self.platform,
            version: HostVersion::parse(&self.host_version)?,
            debug_build: self.debug_build,
            runtime_key: self.runtime_key.clone(),
        })
    }

    pub fn discovery_roots(&self) -> Result<DiscoveryRoots> {
        let layout = self.layout()?;
        Ok(DiscoveryRoots {
            core: layout.core_dir(),
            plugins: layout.plugins_dir(),
            mods: resolved(&self.mods_dir, "--mods-dir")?.to_path_buf(),
            managed: resolved(&self.managed_dir, "--managed-dir")?.to_path_buf(),
        })
    }

    pub fn launch_spec(&self) -> Result<LaunchSpec> {
        let mut spec = LaunchSpec::new(self.helper_path()?);
        spec.mode = self.launch;
        spec.interpreter = self.interpreter_argv.clone();
        if self.logging_enabled() {
            spec.helper_args.push("--logs".to_string());
        }
        Ok(spec)
    }

    pub fn supervisor_options(&self) -> SupervisorOptions {
        SupervisorOptions {
            ready_settle: Duration::from_millis(self.ready_settle_ms),
            result_timeout: self.result_timeout_ms.map(Duration::from_millis),
            exit_grace: Duration::from_millis(self.exit_grace_ms),
        }
    }

    pub fn host_request(&self) -> Result<HostRequest> {
        Ok(HostRequest {
            identity: self.host_identity()?,
            roots: self.discovery_roots()?,
            launch: self.launch_spec()?,
            options: self.supervisor_options(),
        })
    }
}

impl HelperConfig {
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&mut self) -> Result<()> {
        if let Some(dir) = self.shim_dir.take() {
            self.shim_dir = Some(absolute(dir)?);
        }
        Ok(())
    }

    /// Shim lookup goes to `--shim-dir` when given, else the executable's
    /// own directory.
    pub fn helper_environment(&self) -> Result<HelperEnvironment> {
        match &self.shim_dir {
            Some(dir) => Ok(HelperEnvironment::from_install_dir(dir)),
            None => HelperEnvironment::locate().context("failed to locate the helper executable"),
        }
    }
}

fn resolved<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a Path> {
    value
        .as_deref()
        .ok_or_else(|| anyhow!("{flag} is unresolved; call validate() first"))
}

pub(super) fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir().context("failed to read the current directory")?;
    Ok(cwd.join(path))
}

pub(super) fn normalize_runtime_key(raw: &str) -> Result<String> {
    let key = raw.trim().to_ascii_lowercase();
    if key.len() != RUNTIME_KEY_LEN || !key.chars().all(|ch| ch.is_ascii_hexdigit()) {
        bail!("--runtime-key must be {RUNTIME_KEY_LEN} hex digits, got '{raw}'");
    }
    Ok(key)
}
