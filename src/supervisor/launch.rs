use super::error::SupervisorError;
use super::escape::{join_arguments, split_argument_line};
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How the helper executable is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Direct when the helper is a native executable, interpreted otherwise.
    #[default]
    Auto,
    Direct,
    /// Run through the host runtime's interpreter (`mono helper.exe`).
    Interpreted,
}

impl LaunchMode {
    pub fn label(self) -> &'static str {
        match self {
            LaunchMode::Auto => "auto",
            LaunchMode::Direct => "direct",
            LaunchMode::Interpreted => "interpreted",
        }
    }
}

/// Whether the platform can execute `path` without an interpreter.
pub fn is_native_executable(path: &Path) -> bool {
    let is_exe = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if is_exe {
            return false;
        }
        path.metadata()
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        is_exe
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub helper: PathBuf,
    pub mode: LaunchMode,
    /// Interpreter program followed by its own arguments.
    pub interpreter: Vec<String>,
    /// Extra arguments handed to the helper itself.
    pub helper_args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(helper: impl Into<PathBuf>) -> Self {
        Self {
            helper: helper.into(),
            mode: LaunchMode::Auto,
            interpreter: vec!["mono".to_string()],
            helper_args: Vec::new(),
        }
    }

    pub fn resolved_mode(&self) -> LaunchMode {
        match self.mode {
            LaunchMode::Auto if is_native_executable(&self.helper) => LaunchMode::Direct,
            LaunchMode::Auto => LaunchMode::Interpreted,
            mode => mode,
        }
    }

    /// Build the program plus a single escaped argument string.
    pub fn command_line(&self) -> Result<CommandLine, SupervisorError> {
        let helper = self.helper.to_string_lossy().to_string();
        match self.resolved_mode() {
            LaunchMode::Interpreted => {
                let (program, interpreter_args) = self
                    .interpreter
                    .split_first()
                    .ok_or(SupervisorError::EmptyInterpreter)?;
                let mut args: Vec<&str> = interpreter_args.iter().map(String::as_str).collect();
                args.push(&helper);
                args.extend(self.helper_args.iter().map(String::as_str));
                Ok(CommandLine {
                    program: PathBuf::from(program),
                    arguments: join_arguments(&args),
                    mode: LaunchMode::Interpreted,
                })
            }
            _ => Ok(CommandLine {
                program: self.helper.clone(),
                arguments: join_arguments(&self.helper_args),
                mode: LaunchMode::Direct,
            }),
        }
    }
}

/// A resolved invocation: never `Auto`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub program: PathBuf,
    pub arguments: String,
    pub mode: LaunchMode,
}

impl CommandLine {
    pub fn argv(&self) -> Result<Vec<String>, SupervisorError> {
        Ok(split_argument_line(&self.arguments)?)
    }

    pub fn to_command(&self) -> Result<Command, SupervisorError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv()?);
        Ok(cmd)
    }
}
