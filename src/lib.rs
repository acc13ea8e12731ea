//! # probekit
//!
//! A typed client for ffprobe: run the tool against local files, URLs, or
//! arbitrary byte streams and get decoded analysis reports back.
//!
//! This crate provides:
//!
//! - **Container analysis** ([`Probe::analyse`]) -- format attributes plus
//!   every stream, partitioned by kind into a [`MediaAnalysis`].
//! - **Frame, packet, and pixel format reports** ([`Probe::frames`],
//!   [`Probe::packets`], [`Probe::pixel_formats`]) -- the tool's deeper
//!   inspection modes, decoded into typed models.
//! - **Flexible input** ([`Input`]) -- paths are existence-checked, URLs
//!   pass through untouched, and unseekable byte streams are fed through a
//!   named conduit the tool opens like any other locator.
//! - **Cancellation** -- every async operation has a `_cancellable` form
//!   taking a [`CancellationToken`]; cancelling kills the tool and yields
//!   [`Error::Cancelled`].
//! - **Blocking adapters** -- `_blocking` forms for synchronous callers,
//!   both inside and outside a tokio runtime.
//! - **Decode-only entry points** ([`report::decode_container`] and
//!   friends) -- decode captured or cached JSON without running the tool.
//!
//! # Example
//!
//! ```no_run
//! use probekit::Probe;
//!
//! # async fn example() -> probekit::Result<()> {
//! let probe = Probe::new();
//! let analysis = probe.analyse("/media/movie.mkv").await?;
//!
//! println!("duration: {:?}", analysis.duration());
//! for stream in analysis.video_streams() {
//!     println!("video: {:?} {:?}x{:?}", stream.codec_name, stream.width, stream.height);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod command;
pub mod error;
pub mod input;
pub mod options;
#[cfg(unix)]
pub mod pipe;
pub mod probe;
pub mod report;

// ---- Re-exports for convenience ----

pub use analysis::MediaAnalysis;
pub use command::{ProbeCommand, RunOutput, RunStatus};
pub use error::{Error, Result};
pub use input::{ByteSource, Input};
pub use options::{OutputEncoding, ProbeOptions};
#[cfg(unix)]
pub use pipe::InputPipe;
pub use probe::Probe;
pub use report::{
    ContainerReport, FormatInfo, FrameInfo, FrameReport, PacketInfo, PacketReport, PixelFormat,
    PixelFormatCatalogue, SideData, StreamInfo,
};

// Cancellation uses tokio-util's token; callers get it from here so they
// do not need their own tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

use std::path::Path;

/// Analyse a local file with default options.
pub async fn analyse(path: impl AsRef<Path>) -> Result<MediaAnalysis> {
    Probe::new().analyse(path.as_ref()).await
}

/// Analyse a local file with default options, from synchronous code.
pub fn analyse_blocking(path: impl AsRef<Path>) -> Result<MediaAnalysis> {
    Probe::new().analyse_blocking(path.as_ref())
}
