//! Shell command automations.
//!
//! Runs a command through the platform shell, passing the automation's input
//! values as positional parameters (`$1`, `$2`, ...) and capturing stdout as
//! the result.

use std::path::PathBuf;
use std::process::{Command as ProcessCommand, Stdio};
use std::time::Instant;

use anyhow::Context;

use super::schema::Automation;
use super::state::Value;

/// A shell command that can back an automated step.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    /// Command line passed to the shell
    pub command: String,

    /// Shell override (defaults to `sh` / `cmd`)
    pub shell: Option<String>,

    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
}

impl ShellCommand {
    /// Create a command run by the platform shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), shell: None, working_dir: None }
    }

    /// Run with a specific shell instead of the platform default.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run the command with `args` as positional parameters.
    ///
    /// Returns stdout with trailing line endings removed. A non-zero exit is
    /// an error carrying the command's stderr.
    pub fn run(&self, args: &[Value]) -> anyhow::Result<Value> {
        let (shell, shell_arg) = self.shell_invocation();
        let start = Instant::now();

        let mut cmd = ProcessCommand::new(shell);
        cmd.arg(shell_arg).arg(&self.command);

        // `sh -c <cmd> <$0> <$1>...`
        if shell_arg == "-c" {
            cmd.arg(shell);
        }
        cmd.args(args.iter().map(ToString::to_string));

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd
            .output()
            .with_context(|| format!("Failed to spawn `{}` with {shell}", self.command))?;

        tracing::debug!(
            command = %self.command,
            code = ?output.status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Command finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string());
            anyhow::bail!("`{}` exited with {}: {}", self.command, code, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Value::from(stdout.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Wrap this command in an automation.
    pub fn into_automation(self) -> Automation {
        let description = self.command.clone();
        Automation::new(move |args| self.run(args)).with_description(description)
    }

    fn shell_invocation(&self) -> (&str, &'static str) {
        match self.shell.as_deref() {
            Some(shell) if shell.eq_ignore_ascii_case("cmd") => (shell, "/C"),
            Some(shell) => (shell, "-c"),
            None => get_shell(),
        }
    }
}

/// Get the shell and argument for the current platform.
fn get_shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}
