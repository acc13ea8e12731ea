//! Named-conduit input: exposes an arbitrary byte source to the tool as an
//! openable locator, so unseekable or unbounded streams can be probed.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::input::ByteSource;

const SOCKET_NAME: &str = "input.sock";

/// A listening conduit the tool opens as one of its inputs.
///
/// Lifecycle: [`create`](Self::create) binds the socket before the process
/// is spawned, [`pump`](Self::pump) runs concurrently with the process, and
/// dropping the pipe releases the socket and its scratch directory on every
/// exit path, exactly once.
pub struct InputPipe {
    dir: tempfile::TempDir,
    listener: UnixListener,
}

impl InputPipe {
    /// Bind a fresh conduit inside its own scratch directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("probekit-").tempdir()?;
        let listener = UnixListener::bind(dir.path().join(SOCKET_NAME))?;
        debug!("input pipe listening at {}", dir.path().join(SOCKET_NAME).display());
        Ok(Self { dir, listener })
    }

    /// Path of the bound socket.
    pub fn socket_path(&self) -> PathBuf {
        self.dir.path().join(SOCKET_NAME)
    }

    /// Locator to substitute into the tool's argument list. The tool opens
    /// it with its `unix:` protocol and reads until the writer shuts down.
    pub fn locator(&self) -> String {
        format!("unix:{}", self.socket_path().display())
    }

    /// Copy `source` into the first connection until the source is
    /// exhausted or the reader stops taking input.
    ///
    /// The reader closing early is expected (the tool often stops once it
    /// has seen enough) and ends the pump successfully. Cancelling `cancel`
    /// also ends it successfully; the orchestrator cancels once the process
    /// has finished, so a tool that exits without ever opening its input
    /// cannot strand the pump in accept.
    pub async fn pump(&self, mut source: ByteSource, cancel: CancellationToken) -> Result<()> {
        let mut conn = tokio::select! {
            accepted = self.listener.accept() => accepted?.0,
            _ = cancel.cancelled() => {
                debug!("pump cancelled before the reader connected");
                return Ok(());
            }
        };

        let copied = tokio::select! {
            copied = tokio::io::copy(&mut source, &mut conn) => copied,
            _ = cancel.cancelled() => {
                debug!("pump cancelled mid-copy");
                return Ok(());
            }
        };

        match copied {
            Ok(bytes) => {
                // Shut the write side down so the reader sees EOF.
                let _ = conn.shutdown().await;
                debug!("pumped {bytes} bytes into the input pipe");
                Ok(())
            }
            Err(e) if reader_closed(&e) => {
                debug!("input pipe reader closed early; stopping pump");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn reader_closed(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset
    )
}
