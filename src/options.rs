//! Invocation options consumed by every probe operation.
//!
//! There is no process-wide default configuration: callers construct a
//! [`ProbeOptions`] value (or take [`Default`]) and hand it to a
//! [`Probe`](crate::Probe). The value is immutable for the lifetime of the
//! client holding it.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// How captured process output bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Replace invalid UTF-8 sequences with U+FFFD.
    #[default]
    Utf8Lossy,
    /// Reject invalid UTF-8 as a decode failure.
    Utf8,
}

impl OutputEncoding {
    pub(crate) fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            OutputEncoding::Utf8Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
            OutputEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|_| Error::decode("output is not valid UTF-8")),
        }
    }
}

/// Options for one probe client.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Binary to invoke. A bare name is resolved on `PATH`; a path with
    /// directory components is checked for existence as-is.
    pub binary_path: PathBuf,
    /// Working directory for the spawned process.
    pub working_directory: Option<PathBuf>,
    /// Extra arguments inserted between the report-kind flags and the
    /// input locator.
    pub extra_arguments: Vec<String>,
    /// Encoding applied to captured stdout/stderr.
    pub encoding: OutputEncoding,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("ffprobe"),
            working_directory: None,
            extra_arguments: Vec::new(),
            encoding: OutputEncoding::default(),
        }
    }
}
