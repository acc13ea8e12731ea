//! Builder for running the probe tool and capturing its output channels.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::OutputEncoding;

/// Outcome of one tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The process ran to completion with this exit code. A child killed
    /// by a signal reports `-1`.
    Exited(i32),
    /// The run was cancelled and the process terminated early.
    Cancelled,
}

impl RunStatus {
    /// True for a zero exit code.
    pub fn success(self) -> bool {
        self == RunStatus::Exited(0)
    }

    /// Exit code, if the process ran to completion.
    pub fn code(self) -> Option<i32> {
        match self {
            RunStatus::Exited(code) => Some(code),
            RunStatus::Cancelled => None,
        }
    }
}

/// Output captured from a tool run: the exit outcome plus both channels
/// as ordered line sequences.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status: RunStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl RunOutput {
    /// Captured standard output joined back into one text block.
    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    /// Captured standard error joined back into one text block.
    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

/// A builder for one probe tool invocation.
///
/// Both output channels are drained concurrently from the moment the
/// process starts, so a chatty child can never deadlock against a full,
/// unread pipe. Cancellation kills the child and reports
/// [`RunStatus::Cancelled`] instead of an exit code.
///
/// # Example
///
/// ```no_run
/// use probekit::ProbeCommand;
///
/// # async fn example() -> probekit::Result<()> {
/// let mut cmd = ProbeCommand::new("ffprobe");
/// cmd.args(["-print_format", "json", "-show_format"])
///     .arg("/path/to/video.mkv");
/// let output = cmd.run(None).await?;
/// println!("{}", output.stdout_text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProbeCommand {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    encoding: OutputEncoding,
}

impl ProbeCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            encoding: OutputEncoding::default(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the working directory for the spawned process.
    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the encoding applied to captured output.
    pub fn encoding(&mut self, encoding: OutputEncoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Run the process to completion, capturing stdout and stderr.
    ///
    /// Cancelling `cancel` kills the child, reaps it, and yields a
    /// [`RunStatus::Cancelled`] output; whatever was captured before the
    /// kill remains available for diagnostics.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program cannot be spawned because
    ///   it does not exist.
    /// - [`Error::Io`] for other spawn or drain failures.
    /// - [`Error::DecodeFailed`] if strict UTF-8 decoding was requested
    ///   and the output is not valid UTF-8.
    pub async fn run(&self, cancel: Option<CancellationToken>) -> Result<RunOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!("running {} {:?}", self.program.display(), self.args);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(self.program.to_string_lossy())
            } else {
                Error::Io(e)
            }
        })?;

        // Drain both channels from the start; waiting on one before the
        // other lets the child block writing to the undrained pipe.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = tokio::spawn(drain_lines(stdout));
        let err_task = tokio::spawn(drain_lines(stderr));

        let status = tokio::select! {
            status = child.wait() => Some(status?),
            _ = wait_cancelled(&cancel) => None,
        };

        let was_cancelled = status.is_none();
        if was_cancelled {
            debug!("cancellation requested; killing {}", self.program.display());
            let _ = child.start_kill();
            let _ = child.wait().await;
        }

        let raw_stdout = join_drain(out_task.await)?;
        let raw_stderr = join_drain(err_task.await)?;

        // Cancelled output is diagnostic only and never reaches the
        // decoder, so strict encoding does not apply to it.
        let encoding = if was_cancelled {
            OutputEncoding::Utf8Lossy
        } else {
            self.encoding
        };
        let stdout = decode_lines(raw_stdout, encoding)?;
        let stderr = decode_lines(raw_stderr, encoding)?;

        let status = match status {
            Some(status) => RunStatus::Exited(status.code().unwrap_or(-1)),
            None => RunStatus::Cancelled,
        };
        debug!("{} finished: {:?}", self.program.display(), status);

        Ok(RunOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// [`run`](Self::run) for synchronous callers, without cancellation.
    pub fn run_blocking(&self) -> Result<RunOutput> {
        block_on(self.run(None))
    }
}

/// Run a probe future from synchronous code.
pub(crate) fn block_on<T>(future: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            // Already inside a runtime; park this worker while we wait.
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        Err(_) => {
            // No runtime active; a temporary one carries the call.
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(future)
        }
    }
}

/// Read a channel to EOF as raw byte lines, tolerant of invalid UTF-8.
async fn drain_lines<R>(reader: Option<R>) -> std::io::Result<Vec<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines.push(buf.clone());
    }
    Ok(lines)
}

async fn wait_cancelled(cancel: &Option<CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

fn join_drain(
    joined: std::result::Result<std::io::Result<Vec<Vec<u8>>>, tokio::task::JoinError>,
) -> Result<Vec<Vec<u8>>> {
    match joined {
        Ok(Ok(lines)) => Ok(lines),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(std::io::Error::other(e).into()),
    }
}

fn decode_lines(lines: Vec<Vec<u8>>, encoding: OutputEncoding) -> Result<Vec<String>> {
    lines.iter().map(|line| encoding.decode(line)).collect()
}
