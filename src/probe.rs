//! The probe client: pre-flight checks, invocation, and decoding glued
//! into typed analysis operations.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
#[cfg(unix)]
use tracing::debug;

use crate::analysis::MediaAnalysis;
use crate::command::{block_on, ProbeCommand, RunOutput, RunStatus};
use crate::error::{Error, Result};
use crate::input::Input;
use crate::options::ProbeOptions;
#[cfg(unix)]
use crate::pipe::InputPipe;
use crate::report::{self, FrameReport, PacketReport, PixelFormatCatalogue};

/// Which report a run asks the tool for; selects the fixed flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportKind {
    ContainerStreams,
    Frames,
    Packets,
    PixelFormats,
}

impl ReportKind {
    fn flags(self) -> &'static [&'static str] {
        match self {
            ReportKind::ContainerStreams => &[
                "-loglevel",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-sexagesimal",
                "-show_streams",
            ],
            ReportKind::Frames => &[
                "-loglevel",
                "error",
                "-print_format",
                "json",
                "-show_frames",
                "-sexagesimal",
            ],
            ReportKind::Packets => &[
                "-loglevel",
                "error",
                "-print_format",
                "json",
                "-show_packets",
                "-sexagesimal",
            ],
            ReportKind::PixelFormats => &[
                "-loglevel",
                "error",
                "-print_format",
                "json",
                "-show_pixel_formats",
            ],
        }
    }
}

/// The analysis client.
///
/// Holds immutable [`ProbeOptions`] and nothing else; clone it freely and
/// share it across tasks. Every operation spawns its own process, so
/// concurrent calls never contend.
///
/// # Example
///
/// ```no_run
/// use probekit::Probe;
///
/// # async fn example() -> probekit::Result<()> {
/// let probe = Probe::new();
/// let analysis = probe.analyse("/path/to/video.mkv").await?;
/// if let Some(video) = analysis.primary_video_stream() {
///     println!("codec: {:?}", video.codec_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Probe {
    options: ProbeOptions,
}

impl Probe {
    /// A client over the default options: an `ffprobe` found on the search
    /// path, lossy UTF-8 output.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client over explicit options.
    pub fn with_options(options: ProbeOptions) -> Self {
        Self { options }
    }

    /// The options this client runs with.
    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Analyse a container: format attributes plus every stream.
    pub async fn analyse(&self, input: impl Into<Input>) -> Result<MediaAnalysis> {
        self.analyse_cancellable(input, None).await
    }

    /// [`analyse`](Self::analyse) with an optional cancellation token.
    /// Cancelling kills the tool and yields [`Error::Cancelled`].
    pub async fn analyse_cancellable(
        &self,
        input: impl Into<Input>,
        cancel: Option<CancellationToken>,
    ) -> Result<MediaAnalysis> {
        let output = self
            .capture(ReportKind::ContainerStreams, Some(input.into()), cancel)
            .await?;
        let report = report::decode_container(&output.stdout_text())?;
        Ok(MediaAnalysis::new(report))
    }

    /// [`analyse`](Self::analyse) for synchronous callers.
    pub fn analyse_blocking(&self, input: impl Into<Input>) -> Result<MediaAnalysis> {
        let input = input.into();
        block_on(self.analyse_cancellable(input, None))
    }

    /// Frame-level analysis of an input.
    pub async fn frames(&self, input: impl Into<Input>) -> Result<FrameReport> {
        self.frames_cancellable(input, None).await
    }

    /// [`frames`](Self::frames) with an optional cancellation token.
    pub async fn frames_cancellable(
        &self,
        input: impl Into<Input>,
        cancel: Option<CancellationToken>,
    ) -> Result<FrameReport> {
        let output = self
            .capture(ReportKind::Frames, Some(input.into()), cancel)
            .await?;
        report::decode_frames(&output.stdout_text())
    }

    /// [`frames`](Self::frames) for synchronous callers.
    pub fn frames_blocking(&self, input: impl Into<Input>) -> Result<FrameReport> {
        let input = input.into();
        block_on(self.frames_cancellable(input, None))
    }

    /// Packet-level analysis of an input.
    pub async fn packets(&self, input: impl Into<Input>) -> Result<PacketReport> {
        self.packets_cancellable(input, None).await
    }

    /// [`packets`](Self::packets) with an optional cancellation token.
    pub async fn packets_cancellable(
        &self,
        input: impl Into<Input>,
        cancel: Option<CancellationToken>,
    ) -> Result<PacketReport> {
        let output = self
            .capture(ReportKind::Packets, Some(input.into()), cancel)
            .await?;
        report::decode_packets(&output.stdout_text())
    }

    /// [`packets`](Self::packets) for synchronous callers.
    pub fn packets_blocking(&self, input: impl Into<Input>) -> Result<PacketReport> {
        let input = input.into();
        block_on(self.packets_cancellable(input, None))
    }

    /// The tool's pixel format catalogue. Takes no input; the catalogue
    /// describes the tool itself.
    pub async fn pixel_formats(&self) -> Result<PixelFormatCatalogue> {
        let output = self.capture(ReportKind::PixelFormats, None, None).await?;
        report::decode_pixel_formats(&output.stdout_text())
    }

    /// [`pixel_formats`](Self::pixel_formats) for synchronous callers.
    pub fn pixel_formats_blocking(&self) -> Result<PixelFormatCatalogue> {
        block_on(self.pixel_formats())
    }

    /// One capture routine behind every operation: pre-flight checks, the
    /// run itself (with the input pipe when the source is a byte stream),
    /// and exit classification. Decoding stays with the callers.
    async fn capture(
        &self,
        kind: ReportKind,
        input: Option<Input>,
        cancel: Option<CancellationToken>,
    ) -> Result<RunOutput> {
        #[cfg(unix)]
        let mut pipe: Option<(InputPipe, crate::input::ByteSource)> = None;

        // Pre-flight: input first, then the tool, before anything spawns.
        let locator = match input {
            None => None,
            Some(Input::Path(path)) => {
                if !path.exists() {
                    return Err(Error::input_not_found(path));
                }
                Some(path.to_string_lossy().into_owned())
            }
            Some(Input::Url(url)) => Some(url),
            #[cfg(unix)]
            Some(Input::Stream(source)) => {
                let created = InputPipe::create()?;
                let locator = created.locator();
                pipe = Some((created, source));
                Some(locator)
            }
            #[cfg(not(unix))]
            Some(Input::Stream(_)) => {
                return Err(Error::Unsupported(
                    "byte-stream input requires a Unix host".into(),
                ));
            }
        };
        let tool = self.resolve_tool()?;

        let mut command = ProbeCommand::new(tool);
        command
            .args(kind.flags().iter().copied())
            .args(self.options.extra_arguments.iter().cloned())
            .encoding(self.options.encoding);
        if let Some(dir) = &self.options.working_directory {
            command.current_dir(dir);
        }
        if let Some(locator) = locator {
            command.arg(locator);
        }

        #[cfg(unix)]
        let output = match pipe {
            Some((pipe, source)) => run_with_pipe(&command, pipe, source, cancel).await?,
            None => command.run(cancel).await?,
        };
        #[cfg(not(unix))]
        let output = command.run(cancel).await?;

        // Post-flight classification.
        match output.status {
            RunStatus::Cancelled => Err(Error::Cancelled),
            RunStatus::Exited(0) => Ok(output),
            RunStatus::Exited(code) => Err(Error::process_failed(code, output.stderr_text())),
        }
    }

    /// Resolve the configured binary: explicit paths must exist, bare
    /// names are searched on `PATH`.
    fn resolve_tool(&self) -> Result<PathBuf> {
        let binary = &self.options.binary_path;
        if binary.components().count() > 1 {
            if binary.exists() {
                Ok(binary.clone())
            } else {
                Err(Error::tool_not_found(binary.to_string_lossy()))
            }
        } else {
            which::which(binary).map_err(|_| Error::tool_not_found(binary.to_string_lossy()))
        }
    }
}

/// Run the command while pumping `source` into the conduit.
///
/// The pump gets its own token, cancelled as soon as the run finishes, so
/// a tool that exits without ever opening its input cannot strand the
/// pump in accept. Both halves are awaited before this returns; a pump
/// failure is logged and dropped because the process outcome is
/// authoritative.
#[cfg(unix)]
async fn run_with_pipe(
    command: &ProbeCommand,
    pipe: InputPipe,
    source: crate::input::ByteSource,
    cancel: Option<CancellationToken>,
) -> Result<RunOutput> {
    let pump_cancel = CancellationToken::new();
    let run = command.run(cancel);
    let pump = pipe.pump(source, pump_cancel.clone());
    tokio::pin!(run, pump);

    let mut pump_done = false;
    let output = loop {
        tokio::select! {
            output = &mut run => break output,
            result = &mut pump, if !pump_done => {
                pump_done = true;
                if let Err(e) = result {
                    debug!("input pump failed: {e}");
                }
            }
        }
    };
    if !pump_done {
        pump_cancel.cancel();
        if let Err(e) = pump.await {
            debug!("input pump failed: {e}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn unreachable_tool_options() -> ProbeOptions {
        // A path that cannot exist; reaching the spawn would fail loudly.
        ProbeOptions {
            binary_path: PathBuf::from("/nonexistent/probekit-test-tool"),
            ..ProbeOptions::default()
        }
    }

    #[tokio::test]
    async fn missing_input_is_reported_before_the_tool_is_resolved() {
        let probe = Probe::with_options(unreachable_tool_options());
        let missing = "/nonexistent/probekit-test-input.mkv";

        let error = probe.analyse(missing).await.unwrap_err();
        assert_matches!(error, Error::InputNotFound { path } => {
            assert_eq!(path, PathBuf::from(missing));
        });
        // Same pre-flight on every input-taking operation.
        assert_matches!(
            probe.frames(missing).await.unwrap_err(),
            Error::InputNotFound { .. }
        );
        assert_matches!(
            probe.packets(missing).await.unwrap_err(),
            Error::InputNotFound { .. }
        );
    }

    #[tokio::test]
    async fn explicit_tool_path_must_exist() {
        let probe = Probe::with_options(unreachable_tool_options());
        let input = tempfile::NamedTempFile::new().unwrap();
        let error = probe.analyse(input.path()).await.unwrap_err();
        assert_matches!(error, Error::ToolNotFound { tool } => {
            assert_eq!(tool, "/nonexistent/probekit-test-tool");
        });
    }

    #[tokio::test]
    async fn bare_tool_name_is_searched_on_path() {
        let probe = Probe::with_options(ProbeOptions {
            binary_path: PathBuf::from("probekit-test-no-such-tool"),
            ..ProbeOptions::default()
        });
        let input = tempfile::NamedTempFile::new().unwrap();
        let error = probe.analyse(input.path()).await.unwrap_err();
        assert_matches!(error, Error::ToolNotFound { .. });
    }

    #[tokio::test]
    async fn url_input_skips_the_existence_check() {
        // The URL never touches the filesystem, so the failure must come
        // from tool resolution, not from InputNotFound.
        let probe = Probe::with_options(unreachable_tool_options());
        let error = probe
            .analyse(Input::url("https://example.com/clip.mp4"))
            .await
            .unwrap_err();
        assert_matches!(error, Error::ToolNotFound { .. });
    }

    #[test]
    fn flag_sets_select_the_report() {
        assert!(ReportKind::ContainerStreams.flags().contains(&"-show_streams"));
        assert!(ReportKind::ContainerStreams.flags().contains(&"-show_format"));
        assert!(ReportKind::Frames.flags().contains(&"-show_frames"));
        assert!(ReportKind::Packets.flags().contains(&"-show_packets"));
        assert!(ReportKind::PixelFormats.flags().contains(&"-show_pixel_formats"));
        // Timestamps come back sexagesimal everywhere they appear.
        assert!(ReportKind::Frames.flags().contains(&"-sexagesimal"));
        assert!(!ReportKind::PixelFormats.flags().contains(&"-sexagesimal"));
    }
}
