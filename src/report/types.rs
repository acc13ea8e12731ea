//! Typed models for the four report schemas the tool emits.
//!
//! Field names mirror the tool's JSON keys. Numeric-looking container
//! fields (duration, size, bit rate) stay exact decimal strings; frame and
//! packet numerics go through [`num_string`], which accepts either JSON
//! numbers or numeric strings and always writes strings back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::side_data::SideData;

/// Container-level analysis: one format record plus every elementary
/// stream. Decoding guarantees `format` is present; see
/// [`decode_container`](super::decode_container).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerReport {
    pub format: FormatInfo,
    pub streams: Vec<StreamInfo>,
}

/// Frame-level analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    #[serde(default)]
    pub frames: Vec<FrameInfo>,
}

/// Packet-level analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketReport {
    #[serde(default)]
    pub packets: Vec<PacketInfo>,
}

/// The tool's catalogue of every pixel format it knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelFormatCatalogue {
    #[serde(default)]
    pub pixel_formats: Vec<PixelFormat>,
}

/// Container-level attributes.
///
/// Durations and timestamps are sexagesimal (`H:MM:SS.ffffff`) because
/// every analysis invocation passes `-sexagesimal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_streams: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_programs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_long_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Container size in bytes, kept as the tool's exact decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    /// Format-detection confidence, 0-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_score: Option<i32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl FormatInfo {
    /// Look up a tag value; absent keys are `None`, never an error.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// One elementary stream's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_long_name: Option<String>,
    /// Media kind: `video`, `audio`, `subtitle`, `data`, or `attachment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_tag_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_fmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_primaries: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_transfer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_order: Option<String>,
    /// Base frame rate as a rational string, e.g. `24000/1001`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_frame_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_frame_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_raw_sample: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_layout: Option<String>,
    /// Role flags (`default`, `forced`, ...) as 0/1 integers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub disposition: HashMap<String, i32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub side_data_list: Vec<SideData>,
}

impl StreamInfo {
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    pub fn is_subtitle(&self) -> bool {
        self.codec_type.as_deref() == Some("subtitle")
    }

    /// Look up a tag value; absent keys are `None`, never an error.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn language(&self) -> Option<&str> {
        self.tag("language")
    }

    pub fn title(&self) -> Option<&str> {
        self.tag("title")
    }

    /// Raw creation timestamp. Older tool versions emitted the key with a
    /// trailing space, so both spellings resolve.
    pub fn creation_time(&self) -> Option<&str> {
        self.tag("creation_time").or_else(|| self.tag("creation_time "))
    }

    /// Rotation in degrees, when the container carries a rotate tag.
    pub fn rotate(&self) -> Option<i64> {
        self.tag("rotate")?.parse().ok()
    }

    /// Look up a disposition flag; absent keys are `None`.
    pub fn disposition_flag(&self, key: &str) -> Option<i32> {
        self.disposition.get(key).copied()
    }

    pub fn is_default(&self) -> bool {
        self.disposition_flag("default").unwrap_or(0) != 0
    }

    pub fn is_forced(&self) -> bool {
        self.disposition_flag("forced").unwrap_or(0) != 0
    }

    /// Frame rate as a number, preferring `r_frame_rate` and falling back
    /// to `avg_frame_rate`. `None` for unknown rates such as `0/0`.
    pub fn frame_rate(&self) -> Option<f64> {
        self.r_frame_rate
            .as_deref()
            .and_then(parse_rational)
            .or_else(|| self.avg_frame_rate.as_deref().and_then(parse_rational))
    }
}

/// One decoded frame's metadata. Timestamps come in pairs: raw tick counts
/// plus the tool's formatted time strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub media_type: String,
    #[serde(with = "num_string")]
    pub stream_index: i64,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub key_frame: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pkt_pts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkt_pts_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pkt_dts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkt_dts_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub best_effort_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_effort_timestamp_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pkt_duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkt_duration_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pkt_pos: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pkt_size: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_fmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pict_type: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub coded_picture_number: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub display_picture_number: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub interlaced_frame: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub top_field_first: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub repeat_pict: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub side_data_list: Vec<SideData>,
}

impl FrameInfo {
    pub fn is_key_frame(&self) -> bool {
        self.key_frame.unwrap_or(0) != 0
    }
}

/// One demuxed packet's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketInfo {
    pub codec_type: String,
    #[serde(with = "num_string")]
    pub stream_index: i64,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pts_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub dts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dts_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_time: Option<String>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub pos: Option<i64>,
    /// Demux flags, e.g. `K_` for a keyframe packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// One pixel format from the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelFormat {
    pub name: String,
    pub nb_components: i32,
    pub log2_chroma_w: i32,
    pub log2_chroma_h: i32,
    pub bits_per_pixel: i32,
    pub flags: PixelFormatFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<PixelFormatComponent>,
}

/// Capability flags as the tool reports them, 0/1 integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelFormatFlags {
    #[serde(default)]
    pub big_endian: i32,
    #[serde(default)]
    pub palette: i32,
    #[serde(default)]
    pub bitstream: i32,
    #[serde(default)]
    pub hwaccel: i32,
    #[serde(default)]
    pub planar: i32,
    #[serde(default)]
    pub rgb: i32,
    #[serde(default)]
    pub alpha: i32,
}

impl PixelFormatFlags {
    pub fn is_big_endian(&self) -> bool {
        self.big_endian != 0
    }

    pub fn is_paletted(&self) -> bool {
        self.palette != 0
    }

    pub fn is_bitstream(&self) -> bool {
        self.bitstream != 0
    }

    pub fn is_hardware_accelerated(&self) -> bool {
        self.hwaccel != 0
    }

    pub fn is_planar(&self) -> bool {
        self.planar != 0
    }

    pub fn is_rgb(&self) -> bool {
        self.rgb != 0
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha != 0
    }
}

/// Per-channel bit depth of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelFormatComponent {
    pub index: i32,
    pub bit_depth: i32,
}

/// Parse a rational like `24000/1001` (or a plain number) into a float.
/// Returns `None` for unknown rates such as `0/0`.
pub(crate) fn parse_rational(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Serde codec for the tool's string-or-number fields: accepts `188` or
/// `"188"`, always writes `"188"` back.
pub(crate) mod num_string {
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(i64),
        Str(String),
    }

    fn parse<E: de::Error>(value: NumOrString) -> Result<i64, E> {
        match value {
            NumOrString::Num(n) => Ok(n),
            NumOrString::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(NumOrString::deserialize(deserializer)?)
    }

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub mod opt {
        use serde::de::Deserializer;
        use serde::ser::Serializer;
        use serde::Deserialize;

        use super::NumOrString;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<NumOrString>::deserialize(deserializer)? {
                Some(value) => super::parse(value).map(Some),
                None => Ok(None),
            }
        }

        pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => serializer.collect_str(v),
                None => serializer.serialize_none(),
            }
        }
    }
}
