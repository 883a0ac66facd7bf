//! # Command Runner
//!
//! Runs the CLI under test as a child process.
//!
//! - `-n <namespace>` is appended to every invocation unless suppressed
//! - stderr is always captured; stdout is captured or streamed to a caller sink
//! - a [`CancellationToken`] interrupts the child with SIGINT; the call still waits
//!   for the child to exit
//! - failures abort the current test through a [`FailureReporter`] unless allowed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use knctl_e2e::runner::{CommandRunner, RunOpts};
//!
//! # async fn example() {
//! let knctl = CommandRunner::new("knctl", "e2e-tests");
//!
//! // Aborts the test if knctl fails
//! let out = knctl.run(&["service", "list"]).await;
//!
//! // Returns the error instead
//! let result = knctl
//!     .run_with_opts(&["service", "show", "-s", "missing"], RunOpts::allow_error())
//!     .await;
//! # }
//! ```

use crate::config::E2eConfig;
use crate::constants::REDACTED_PLACEHOLDER;
use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Error returned when the CLI cannot be run or exits unsuccessfully
///
/// Every variant carries the stderr and the stdout captured before the failure.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Execution error: stderr: '' error: 'starting {program}: {source}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Execution error: stderr: '{stderr}' error: '{status}'")]
    Exit {
        stdout: String,
        stderr: String,
        status: ExitStatus,
    },
    #[error("Execution error: stderr: '{stderr}' error: '{source}'")]
    Io {
        stdout: String,
        stderr: String,
        #[source]
        source: io::Error,
    },
}

impl CommandError {
    /// Stdout captured before the failure (empty when streamed to a sink)
    #[must_use]
    pub fn stdout(&self) -> &str {
        match self {
            CommandError::Spawn { .. } => "",
            CommandError::Exit { stdout, .. } | CommandError::Io { stdout, .. } => stdout,
        }
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        match self {
            CommandError::Spawn { .. } => "",
            CommandError::Exit { stderr, .. } | CommandError::Io { stderr, .. } => stderr,
        }
    }

    /// Exit code of the child, if it exited normally
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Exit { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// Receives fatal failures of a run
///
/// A reporter normally does not return (the default one panics, failing the test).
/// If it does return, the run returns its error to the caller.
pub trait FailureReporter: Send + Sync {
    fn fatal(&self, message: &str);
}

/// Fails the current test by panicking
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl FailureReporter for PanicReporter {
    fn fatal(&self, message: &str) {
        panic!("{message}");
    }
}

/// Options for a single run
#[derive(Default)]
pub struct RunOpts {
    /// Do not append `-n <namespace>`
    pub no_namespace: bool,
    /// Return failures instead of reporting them as fatal
    pub allow_error: bool,
    /// Stream stdout here instead of capturing it
    pub stdout_writer: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    /// Interrupt the child when cancelled
    pub cancel: Option<CancellationToken>,
    /// Keep arguments out of traces and failure messages
    pub redact: bool,
}

impl fmt::Debug for RunOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOpts")
            .field("no_namespace", &self.no_namespace)
            .field("allow_error", &self.allow_error)
            .field("stdout_writer", &self.stdout_writer.is_some())
            .field("cancel", &self.cancel)
            .field("redact", &self.redact)
            .finish()
    }
}

impl RunOpts {
    #[must_use]
    pub fn allow_error() -> Self {
        Self {
            allow_error: true,
            ..Self::default()
        }
    }
}

/// Runs one CLI binary bound to one namespace
#[derive(Clone)]
pub struct CommandRunner {
    program: String,
    namespace: String,
    reporter: Arc<dyn FailureReporter>,
}

impl fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("program", &self.program)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            namespace: namespace.into(),
            reporter: Arc::new(PanicReporter),
        }
    }

    pub fn from_config(config: &E2eConfig) -> Self {
        Self::new(config.knctl_binary.clone(), config.namespace.clone())
    }

    /// Replace the fatal failure reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Run with default options and return stdout
    ///
    /// A failure is fatal to the current test.
    pub async fn run<S: AsRef<str>>(&self, args: &[S]) -> String {
        match self.run_with_opts(args, RunOpts::default()).await {
            Ok(stdout) => stdout,
            Err(e) => e.stdout().to_string(),
        }
    }

    /// Run with options and return stdout or the execution error
    pub async fn run_with_opts<S: AsRef<str>>(
        &self,
        args: &[S],
        opts: RunOpts,
    ) -> Result<String, CommandError> {
        let mut args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        if !opts.no_namespace {
            args.push("-n".to_string());
            args.push(self.namespace.clone());
        }

        let desc = self.describe(&args, opts.redact);
        debug!("Running '{}'...", desc);

        let RunOpts {
            allow_error,
            stdout_writer,
            cancel,
            ..
        } = opts;

        let result = execute(&self.program, &args, stdout_writer, cancel.as_ref()).await;

        if let Err(e) = &result {
            if !allow_error {
                self.reporter
                    .fatal(&format!("Failed to successfully execute '{desc}': {e}"));
            }
        }

        result
    }

    /// Command line as shown in traces and failure messages
    fn describe(&self, args: &[String], redact: bool) -> String {
        if redact {
            format!("{} {}", self.program, REDACTED_PLACEHOLDER)
        } else {
            format!("{} {}", self.program, args.join(" "))
        }
    }
}

async fn execute(
    program: &str,
    args: &[String],
    stdout_writer: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    cancel: Option<&CancellationToken>,
) -> Result<String, CommandError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let stdout_task = async move {
        match (stdout_pipe, stdout_writer) {
            (Some(mut pipe), Some(mut sink)) => {
                tokio::io::copy(&mut pipe, &mut sink).await?;
                sink.flush().await?;
                Ok::<_, io::Error>(Vec::new())
            }
            (pipe, None) => read_all(pipe).await,
            (None, Some(_)) => Ok(Vec::new()),
        }
    };

    let (status, stdout, stderr) = tokio::join!(
        wait_for_exit(&mut child, cancel),
        stdout_task,
        read_all(stderr_pipe)
    );

    let stderr = match stderr {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(source) => {
            return Err(CommandError::Io {
                stdout: String::new(),
                stderr: String::new(),
                source,
            })
        }
    };

    let stdout = match stdout {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(source) => {
            return Err(CommandError::Io {
                stdout: String::new(),
                stderr,
                source,
            })
        }
    };

    match status {
        Ok(status) if status.success() => Ok(stdout),
        Ok(status) => Err(CommandError::Exit {
            stdout,
            stderr,
            status,
        }),
        Err(source) => Err(CommandError::Io {
            stdout,
            stderr,
            source,
        }),
    }
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Wait for the child to exit, interrupting it once if `cancel` fires first
async fn wait_for_exit(
    child: &mut Child,
    cancel: Option<&CancellationToken>,
) -> io::Result<ExitStatus> {
    let Some(cancel) = cancel else {
        return child.wait().await;
    };

    tokio::select! {
        status = child.wait() => return status,
        () = cancel.cancelled() => {}
    }

    debug!("Run cancelled, interrupting child process");
    interrupt(child);
    child.wait().await
}

#[cfg(unix)]
fn interrupt(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // Already reaped
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pid) = i32::try_from(pid) else {
        warn!("Child pid {} out of range, cannot interrupt", pid);
        return;
    };

    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGINT) {
        warn!("Failed to interrupt child process {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to stop child process: {}", e);
    }
}
