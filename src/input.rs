//! Input sources accepted by probe operations.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

/// Boxed readable byte source fed to the tool through the input pipe.
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

/// Where probe input comes from.
///
/// One value covers the three source kinds so every operation takes the
/// same parameter instead of growing per-kind variants.
pub enum Input {
    /// Local file path, checked for existence before the tool is spawned.
    Path(PathBuf),
    /// URL or special locator (`https://...`, `rtsp://...`), handed to the
    /// tool untouched and never existence-checked.
    Url(String),
    /// Arbitrary byte source, exposed to the tool as a named conduit.
    /// The source does not need to be seekable or bounded.
    Stream(ByteSource),
}

impl Input {
    /// Input from a local file path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path(path.into())
    }

    /// Input from a URL or other locator the tool understands natively.
    pub fn url(url: impl Into<String>) -> Self {
        Input::Url(url.into())
    }

    /// Input from an async byte source.
    pub fn stream(source: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Input::Stream(Box::new(source))
    }

    /// Input from an in-memory buffer.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Input::Stream(Box::new(Cursor::new(data.into())))
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

/// Bare strings convert as paths. Use [`Input::url`] for locators the
/// existence pre-check must not touch.
impl From<&str> for Input {
    fn from(path: &str) -> Self {
        Input::Path(PathBuf::from(path))
    }
}

impl From<String> for Input {
    fn from(path: String) -> Self {
        Input::Path(PathBuf::from(path))
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Input::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
