/// External command execution with captured output
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// How the child's environment is derived from the overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvPolicy {
    /// The overrides are the child's entire environment. Tools that need
    /// inherited variables (PATH and friends) must be given them explicitly.
    #[default]
    Replace,
    /// The overrides are layered over the inherited environment.
    Merge,
}

/// A failed external command: display name, exit code, captured output.
///
/// The `Display` form is the error string handed to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{program} failed with return code {code}:\n{output}")]
pub struct CommandFailure {
    /// Display name of the command (argv[0]).
    pub program: String,
    /// Child exit code; the negative signal number if signal-terminated.
    pub code: i32,
    /// Combined stdout/stderr captured from the child.
    pub output: String,
}

/// Outcome of running an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Child exited 0; carries the combined captured output.
    Success { output: String },
    /// Child exited non-zero.
    Failure(CommandFailure),
}

/// One external command invocation: argv, working directory, environment.
///
/// Builder methods consume and return the request; a finished invocation is
/// immutable.
#[derive(Debug, Clone)]
pub struct Invocation {
    argv: Vec<OsString>,
    current_dir: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    env_policy: EnvPolicy,
}

impl Invocation {
    /// Create an invocation of `program` with no arguments.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            argv: vec![program.as_ref().to_os_string()],
            current_dir: None,
            env: Vec::new(),
            env_policy: EnvPolicy::default(),
        }
    }

    /// Add a single argument
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.argv.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.argv
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Set the child's working directory (inherited when unset)
    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable override
    pub fn env<K, V>(mut self, key: K, value: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Point the child's KUBECONFIG at a credentials file
    pub fn kubeconfig(self, path: &Path) -> Self {
        self.env("KUBECONFIG", path)
    }

    /// Choose how the overrides combine with the inherited environment
    pub fn env_policy(mut self, policy: EnvPolicy) -> Self {
        self.env_policy = policy;
        self
    }

    /// Display name for error reporting (argv[0]).
    pub fn program(&self) -> String {
        self.argv[0].to_string_lossy().into_owned()
    }

    /// Run the command and classify its exit.
    ///
    /// Blocks the calling task until the child exits. Stdout and stderr are
    /// captured into one combined buffer (stdout first); nothing is streamed
    /// to the terminal. A non-zero exit is not an `Err`, it comes back as
    /// [`RunOutcome::Failure`]. `Err` is reserved for spawn-level problems
    /// such as a missing program or working directory.
    pub async fn run(&self) -> Result<RunOutcome> {
        let program = self.program();
        debug!("Running command: {:?}", self.argv);

        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        if self.env_policy == EnvPolicy::Replace {
            command.env_clear();
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let output = command
            .output()
            .await
            .with_context(|| format!("failed to run {}", program))?;

        let combined = combine_output(&output.stdout, &output.stderr);

        if output.status.success() {
            Ok(RunOutcome::Success { output: combined })
        } else {
            Ok(RunOutcome::Failure(CommandFailure {
                program,
                code: exit_code(output.status),
                output: combined,
            }))
        }
    }
}

/// Combined child output: stdout followed by stderr.
fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined
}

/// Exit code of a finished child.
///
/// A signal-terminated child has no code; report the negative signal number
/// as subprocess conventions do.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .or_else(|| status.signal().map(|signal| -signal))
            .unwrap_or(-1)
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(-1)
    }
}

/// Check if a command-line tool is installed
pub async fn check_tool_installed(
    tool: &str,
    version_args: &[&str],
    install_url: &str,
) -> Result<()> {
    let outcome = Invocation::new(tool)
        .args(version_args)
        .env_policy(EnvPolicy::Merge)
        .run()
        .await;

    match outcome {
        Ok(RunOutcome::Success { .. }) => Ok(()),
        _ => anyhow::bail!(
            "{} is not installed or not in PATH. Please install from {}",
            tool,
            install_url
        ),
    }
}
