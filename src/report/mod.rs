//! Typed views over the tool's JSON reports and the decoders that
//! produce them.
//!
//! Four report shapes exist: the container report (`format` plus
//! `streams`), the frame report, the packet report, and the pixel format
//! catalogue. Decoding is tolerant of numeric fields the tool emits as
//! either bare numbers or quoted strings, and of side data records with
//! discriminators outside the known table.

mod side_data;
mod types;

use serde::Deserialize;

use crate::error::{Error, Result};

pub use side_data::{
    ContentLightLevelMetadata, DolbyVisionConfiguration, Hdr10PlusMetadata,
    MasteringDisplayMetadata, SideData, UnknownSideData,
};
pub use types::{
    ContainerReport, FormatInfo, FrameInfo, FrameReport, PacketInfo, PacketReport, PixelFormat,
    PixelFormatCatalogue, PixelFormatComponent, PixelFormatFlags, StreamInfo,
};

/// Wire shape of the container report. `format` is optional here so its
/// absence can be reported as a decode failure instead of a serde error.
#[derive(Debug, Deserialize)]
struct RawContainerReport {
    format: Option<FormatInfo>,
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// Decodes a container report from the tool's JSON output.
///
/// A syntactically valid report without a `format` object is still a
/// failed analysis, so it maps to [`Error::DecodeFailed`] like any other
/// malformed payload.
pub fn decode_container(json: &str) -> Result<ContainerReport> {
    let raw: RawContainerReport = serde_json::from_str(json)?;
    let format = raw
        .format
        .ok_or_else(|| Error::decode("container report has no format object"))?;
    Ok(ContainerReport {
        format,
        streams: raw.streams,
    })
}

/// Decodes a frame report from the tool's JSON output.
pub fn decode_frames(json: &str) -> Result<FrameReport> {
    Ok(serde_json::from_str(json)?)
}

/// Decodes a packet report from the tool's JSON output.
pub fn decode_packets(json: &str) -> Result<PacketReport> {
    Ok(serde_json::from_str(json)?)
}

/// Decodes the pixel format catalogue from the tool's JSON output.
pub fn decode_pixel_formats(json: &str) -> Result<PixelFormatCatalogue> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn container_report_decodes_format_and_streams() {
        let report = decode_container(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "codec_name": "h264"},
                    {"index": 1, "codec_type": "audio", "codec_name": "aac"}
                ],
                "format": {
                    "filename": "input.mkv",
                    "nb_streams": 2,
                    "format_name": "matroska,webm",
                    "duration": "0:02:36.533000"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(report.streams.len(), 2);
        assert_eq!(report.format.filename.as_deref(), Some("input.mkv"));
        assert_eq!(report.format.nb_streams, Some(2));
    }

    #[test]
    fn missing_format_is_a_decode_failure() {
        let error = decode_container(r#"{"streams": []}"#).unwrap_err();
        assert_matches!(error, Error::DecodeFailed { .. });
    }

    #[test]
    fn null_format_is_a_decode_failure() {
        let error = decode_container(r#"{"streams": [], "format": null}"#).unwrap_err();
        assert_matches!(error, Error::DecodeFailed { .. });
    }

    #[test]
    fn malformed_json_is_a_decode_failure() {
        let error = decode_container("not json at all").unwrap_err();
        assert_matches!(error, Error::DecodeFailed { .. });
    }

    #[test]
    fn missing_streams_defaults_to_an_empty_list() {
        let report = decode_container(r#"{"format": {"format_name": "wav"}}"#).unwrap();
        assert!(report.streams.is_empty());
    }

    #[test]
    fn frame_report_tolerates_an_empty_payload() {
        let report = decode_frames(r#"{}"#).unwrap();
        assert!(report.frames.is_empty());
    }

    #[test]
    fn pixel_format_catalogue_decodes() {
        let catalogue = decode_pixel_formats(
            r#"{
                "pixel_formats": [
                    {
                        "name": "yuv420p",
                        "nb_components": 3,
                        "log2_chroma_w": 1,
                        "log2_chroma_h": 1,
                        "bits_per_pixel": 12,
                        "flags": {"planar": 1},
                        "components": [
                            {"index": 1, "bit_depth": 8},
                            {"index": 2, "bit_depth": 8},
                            {"index": 3, "bit_depth": 8}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(catalogue.pixel_formats.len(), 1);
        let format = &catalogue.pixel_formats[0];
        assert_eq!(format.name, "yuv420p");
        assert!(format.flags.is_planar());
        assert_eq!(format.components.len(), 3);
    }
}
