//! Process-backed dexopt execution
//!
//! Stands in for the installer daemon by running a helper program once per
//! request, passing the wire command as arguments.

use otadex_errors::{BackendError, PlatformError};
use otadex_types::DexoptInvocation;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use crate::backend::DexoptBackend;

/// Platform-specific command builder and execution
#[derive(Debug, Clone)]
pub struct PlatformCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl PlatformCommand {
    /// Create a new platform command
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<str>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    /// Run to completion with inherited stdio
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned.
    pub fn status(&self) -> Result<ExitStatus, PlatformError> {
        Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PlatformError::CommandNotFound {
                    command: self.program.display().to_string(),
                },
                ErrorKind::PermissionDenied => PlatformError::PermissionDenied {
                    operation: self.display(),
                    message: e.to_string(),
                },
                _ => PlatformError::ProcessExecutionFailed {
                    command: self.display(),
                    message: e.to_string(),
                },
            })
    }
}

/// Executes requests by running `program dexopt <args...>`
///
/// Profile operations run `program merge-profiles <uid> <package>` and
/// `program dump-profiles <gid> <package> <paths>`; exit status 0 means
/// `true`, 1 means `false`.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: PathBuf,
}

impl ProcessBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, cmd: &PlatformCommand) -> Result<i32, BackendError> {
        let status = cmd.status()?;
        // Killed by a signal
        Ok(status.code().unwrap_or(-1))
    }

    fn run_predicate(&self, cmd: &PlatformCommand) -> Result<bool, BackendError> {
        match self.run(cmd)? {
            0 => Ok(true),
            1 => Ok(false),
            status => Err(BackendError::CommandFailed {
                command: cmd.display(),
                status,
            }),
        }
    }
}

impl DexoptBackend for ProcessBackend {
    fn execute(&self, invocation: &DexoptInvocation) -> Result<(), BackendError> {
        let command = invocation.to_command();
        let mut cmd = PlatformCommand::new(&self.program);
        cmd.args(command.as_str().split_whitespace());

        match self.run(&cmd)? {
            0 => Ok(()),
            status => Err(BackendError::CommandFailed {
                command: command.into_string(),
                status,
            }),
        }
    }

    fn wait_for_connection(&self) -> Result<(), BackendError> {
        if self.program.is_absolute() && !self.program.is_file() {
            return Err(BackendError::ConnectionFailed {
                message: format!("{} does not exist", self.program.display()),
            });
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BackendError> {
        Ok(())
    }

    fn merge_profiles(&self, uid: u32, package: &str) -> Result<bool, BackendError> {
        let mut cmd = PlatformCommand::new(&self.program);
        cmd.arg("merge-profiles").arg(uid.to_string()).arg(package);
        self.run_predicate(&cmd)
    }

    fn dump_profiles(
        &self,
        gid: u32,
        package: &str,
        code_paths: &[PathBuf],
    ) -> Result<bool, BackendError> {
        let paths = code_paths
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        let mut cmd = PlatformCommand::new(&self.program);
        cmd.arg("dump-profiles").arg(gid.to_string()).arg(package).arg(paths);
        self.run_predicate(&cmd)
    }
}
