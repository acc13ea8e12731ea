//! Immutable analysis view over a decoded container report.

use std::time::Duration;

use crate::report::{ContainerReport, FormatInfo, StreamInfo};

/// A decoded container report with its stream partitions computed once.
///
/// Streams keep their report order everywhere: in [`streams`], inside each
/// partition, and for the primary-stream accessors. Data and attachment
/// streams stay reachable through [`streams`] but get no dedicated
/// partition.
///
/// [`streams`]: MediaAnalysis::streams
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAnalysis {
    report: ContainerReport,
    video: Vec<usize>,
    audio: Vec<usize>,
    subtitle: Vec<usize>,
}

impl MediaAnalysis {
    /// Wrap an already-decoded report, e.g. from
    /// [`decode_container`](crate::report::decode_container) over captured
    /// JSON.
    pub fn new(report: ContainerReport) -> Self {
        let mut video = Vec::new();
        let mut audio = Vec::new();
        let mut subtitle = Vec::new();
        for (position, stream) in report.streams.iter().enumerate() {
            if stream.is_video() {
                video.push(position);
            } else if stream.is_audio() {
                audio.push(position);
            } else if stream.is_subtitle() {
                subtitle.push(position);
            }
        }
        Self {
            report,
            video,
            audio,
            subtitle,
        }
    }

    /// Container-level attributes.
    pub fn format(&self) -> &FormatInfo {
        &self.report.format
    }

    /// Every stream in report order, including data and attachment streams.
    pub fn streams(&self) -> &[StreamInfo] {
        &self.report.streams
    }

    pub fn video_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.video.iter().map(|&i| &self.report.streams[i])
    }

    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.audio.iter().map(|&i| &self.report.streams[i])
    }

    pub fn subtitle_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.subtitle.iter().map(|&i| &self.report.streams[i])
    }

    /// The first video stream, when one exists.
    pub fn primary_video_stream(&self) -> Option<&StreamInfo> {
        self.video.first().map(|&i| &self.report.streams[i])
    }

    /// The first audio stream, when one exists.
    pub fn primary_audio_stream(&self) -> Option<&StreamInfo> {
        self.audio.first().map(|&i| &self.report.streams[i])
    }

    /// The first subtitle stream, when one exists.
    pub fn primary_subtitle_stream(&self) -> Option<&StreamInfo> {
        self.subtitle.first().map(|&i| &self.report.streams[i])
    }

    /// Container duration. `None` when the report has no duration or it
    /// does not parse.
    pub fn duration(&self) -> Option<Duration> {
        parse_duration(self.report.format.duration.as_deref()?)
    }

    /// Consume the view and take back the underlying report.
    pub fn into_report(self) -> ContainerReport {
        self.report
    }
}

/// Parse the tool's sexagesimal form (`H:MM:SS.ffffff`) or plain seconds.
/// Negative and malformed values are `None`.
fn parse_duration(value: &str) -> Option<Duration> {
    let mut parts = value.rsplit(':');
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    let minutes: f64 = match parts.next() {
        Some(part) => part.trim().parse().ok()?,
        None => 0.0,
    };
    let hours: f64 = match parts.next() {
        Some(part) => part.trim().parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() {
        return None;
    }
    // A `-0` field keeps its sign but drops out of the sum.
    if seconds.is_sign_negative() || minutes.is_sign_negative() || hours.is_sign_negative() {
        return None;
    }
    Duration::try_from_secs_f64(hours * 3600.0 + minutes * 60.0 + seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::decode_container;

    fn mixed_analysis() -> MediaAnalysis {
        let report = decode_container(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "codec_name": "hevc"},
                    {"index": 1, "codec_type": "audio", "codec_name": "truehd"},
                    {"index": 2, "codec_type": "subtitle", "codec_name": "subrip"},
                    {"index": 3, "codec_type": "data", "codec_name": "bin_data"},
                    {"index": 4, "codec_type": "audio", "codec_name": "ac3"},
                    {"index": 5, "codec_type": "attachment", "codec_name": "ttf"},
                    {"index": 6, "codec_type": "video", "codec_name": "mjpeg"}
                ],
                "format": {"format_name": "matroska,webm", "duration": "0:02:36.533000"}
            }"#,
        )
        .unwrap();
        MediaAnalysis::new(report)
    }

    #[test]
    fn partitions_preserve_report_order() {
        let analysis = mixed_analysis();
        let video: Vec<u32> = analysis.video_streams().map(|s| s.index).collect();
        let audio: Vec<u32> = analysis.audio_streams().map(|s| s.index).collect();
        let subtitle: Vec<u32> = analysis.subtitle_streams().map(|s| s.index).collect();
        assert_eq!(video, vec![0, 6]);
        assert_eq!(audio, vec![1, 4]);
        assert_eq!(subtitle, vec![2]);
    }

    #[test]
    fn unpartitioned_streams_stay_reachable() {
        let analysis = mixed_analysis();
        let partitioned = analysis.video_streams().count()
            + analysis.audio_streams().count()
            + analysis.subtitle_streams().count();
        assert_eq!(analysis.streams().len(), 7);
        assert_eq!(partitioned, 5);
        let data = &analysis.streams()[3];
        assert_eq!(data.codec_type.as_deref(), Some("data"));
    }

    #[test]
    fn primary_streams_are_the_first_of_their_kind() {
        let analysis = mixed_analysis();
        assert_eq!(
            analysis.primary_video_stream().and_then(|s| s.codec_name.as_deref()),
            Some("hevc")
        );
        assert_eq!(
            analysis.primary_audio_stream().and_then(|s| s.codec_name.as_deref()),
            Some("truehd")
        );
        assert_eq!(
            analysis.primary_subtitle_stream().and_then(|s| s.codec_name.as_deref()),
            Some("subrip")
        );
    }

    #[test]
    fn duration_reads_the_sexagesimal_form() {
        let duration = mixed_analysis().duration().unwrap();
        assert_eq!(duration.as_secs(), 156);
        assert_eq!(duration.subsec_millis(), 533);
    }

    #[test]
    fn parse_duration_accepts_plain_seconds() {
        assert_eq!(parse_duration("156.533000"), Some(Duration::from_secs_f64(156.533)));
        assert_eq!(parse_duration("90"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn parse_duration_rejects_junk() {
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration("-0:00:05.000000"), None);
        assert_eq!(parse_duration("1:2:3:4"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn parse_duration_rejects_negative_fields() {
        // The hour field of a sub-hour negative is `-0`, whose sign an
        // f64 sum would lose.
        assert_eq!(parse_duration("-0:00:05.000000"), None);
        assert_eq!(parse_duration("-1:00:05.000000"), None);
        assert_eq!(parse_duration("0:-0:05.000000"), None);
        assert_eq!(parse_duration("-5.000000"), None);
    }

    #[test]
    fn duration_is_none_for_a_negative_report_value() {
        let report = decode_container(
            r#"{"format": {"format_name": "mpegts", "duration": "-0:00:05.000000"}}"#,
        )
        .unwrap();
        assert_eq!(MediaAnalysis::new(report).duration(), None);
    }

    #[test]
    fn into_report_returns_the_decoded_report() {
        let analysis = mixed_analysis();
        let report = analysis.into_report();
        assert_eq!(report.streams.len(), 7);
        assert_eq!(report.format.format_name.as_deref(), Some("matroska,webm"));
    }
}
