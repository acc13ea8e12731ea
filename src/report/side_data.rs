//! Discriminated decoding for stream and frame side data records.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::num_string;

const DOLBY_VISION_CONFIGURATION: &str = "DOVI configuration record";
const MASTERING_DISPLAY_METADATA: &str = "Mastering display metadata";
const CONTENT_LIGHT_LEVEL_METADATA: &str = "Content light level metadata";
const HDR10_PLUS_METADATA: &str = "HDR Dynamic Metadata SMPTE2094-40 (HDR10+)";

/// Polymorphic extension record keyed by its `side_data_type` string.
///
/// Known discriminators decode to typed variants; anything else falls back
/// to [`SideData::Unknown`], which keeps only the discriminator so an
/// unrecognized record never fails the report. A record with a missing or
/// blank discriminator does fail the decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SideData {
    DolbyVisionConfiguration(DolbyVisionConfiguration),
    MasteringDisplayMetadata(MasteringDisplayMetadata),
    ContentLightLevelMetadata(ContentLightLevelMetadata),
    Hdr10PlusMetadata(Hdr10PlusMetadata),
    Unknown(UnknownSideData),
}

impl SideData {
    /// The record's discriminator string.
    pub fn side_data_type(&self) -> &str {
        match self {
            SideData::DolbyVisionConfiguration(d) => &d.side_data_type,
            SideData::MasteringDisplayMetadata(d) => &d.side_data_type,
            SideData::ContentLightLevelMetadata(d) => &d.side_data_type,
            SideData::Hdr10PlusMetadata(d) => &d.side_data_type,
            SideData::Unknown(d) => &d.side_data_type,
        }
    }

    /// The Dolby Vision configuration, when this record carries one.
    pub fn as_dolby_vision(&self) -> Option<&DolbyVisionConfiguration> {
        match self {
            SideData::DolbyVisionConfiguration(d) => Some(d),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SideData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Read generically first; the discriminator decides the shape.
        let value = Value::deserialize(deserializer)?;
        let discriminator = value
            .get("side_data_type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if discriminator.trim().is_empty() {
            return Err(de::Error::custom(
                "side data record is missing its side_data_type",
            ));
        }
        let decoded = match discriminator {
            DOLBY_VISION_CONFIGURATION => {
                serde_json::from_value(value).map(SideData::DolbyVisionConfiguration)
            }
            MASTERING_DISPLAY_METADATA => {
                serde_json::from_value(value).map(SideData::MasteringDisplayMetadata)
            }
            CONTENT_LIGHT_LEVEL_METADATA => {
                serde_json::from_value(value).map(SideData::ContentLightLevelMetadata)
            }
            HDR10_PLUS_METADATA => serde_json::from_value(value).map(SideData::Hdr10PlusMetadata),
            _ => serde_json::from_value(value).map(SideData::Unknown),
        };
        decoded.map_err(de::Error::custom)
    }
}

/// Dolby Vision configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DolbyVisionConfiguration {
    pub side_data_type: String,
    #[serde(default)]
    pub dv_version_major: i32,
    #[serde(default)]
    pub dv_version_minor: i32,
    #[serde(default)]
    pub dv_profile: i32,
    #[serde(default)]
    pub dv_level: i32,
    #[serde(default)]
    pub rpu_present_flag: i32,
    #[serde(default)]
    pub el_present_flag: i32,
    #[serde(default)]
    pub bl_present_flag: i32,
    #[serde(default)]
    pub dv_bl_signal_compatibility_id: i32,
}

/// Mastering display color volume. Primaries and luminance values are
/// rational strings as reported, e.g. `35400/50000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteringDisplayMetadata {
    pub side_data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blue_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blue_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_point_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_point_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_luminance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_luminance: Option<String>,
}

/// Content light level metadata. Tool versions disagree on whether the
/// levels are numbers or strings, so both decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLightLevelMetadata {
    pub side_data_type: String,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub max_content: Option<i64>,
    #[serde(default, with = "num_string::opt", skip_serializing_if = "Option::is_none")]
    pub max_average: Option<i64>,
}

/// HDR10+ dynamic metadata (SMPTE ST 2094-40).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hdr10PlusMetadata {
    pub side_data_type: String,
    /// The tool emits this key with a space in it.
    #[serde(rename = "application version", default)]
    pub application_version: i32,
    #[serde(default)]
    pub num_windows: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targeted_system_display_maximum_luminance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxscl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_maxrgb: Option<String>,
    #[serde(default)]
    pub num_distribution_maxrgb_percentiles: i32,
    #[serde(default)]
    pub distribution_maxrgb_percentage: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_maxrgb_percentile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_bright_pixels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knee_point_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knee_point_y: Option<String>,
    #[serde(default)]
    pub num_bezier_curve_anchors: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bezier_curve_anchors: Option<String>,
}

/// Fallback for discriminators outside the known table. Variant-specific
/// fields are dropped; the report stays best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownSideData {
    pub side_data_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dovi_record_decodes_to_the_typed_variant() {
        let side_data: SideData = serde_json::from_str(
            r#"{"side_data_type":"DOVI configuration record","dv_profile":5,"dv_level":6}"#,
        )
        .unwrap();
        let dovi = side_data.as_dolby_vision().expect("expected a DOVI record");
        assert_eq!(dovi.dv_profile, 5);
        assert_eq!(dovi.dv_level, 6);
        // Fields the record did not carry default to zero.
        assert_eq!(dovi.rpu_present_flag, 0);
        assert_eq!(side_data.side_data_type(), "DOVI configuration record");
    }

    #[test]
    fn unrecognized_discriminator_falls_back_without_failing() {
        let side_data: SideData = serde_json::from_str(
            r#"{"side_data_type":"Unknown X","some_field":"some_value"}"#,
        )
        .unwrap();
        assert!(matches!(side_data, SideData::Unknown(_)));
        assert_eq!(side_data.side_data_type(), "Unknown X");
    }

    #[test]
    fn missing_discriminator_fails_the_decode() {
        let result = serde_json::from_str::<SideData>(r#"{"dv_profile":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_discriminator_fails_the_decode() {
        let result = serde_json::from_str::<SideData>(r#"{"side_data_type":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn whitespace_discriminator_fails_the_decode() {
        let result = serde_json::from_str::<SideData>(r#"{"side_data_type":"   "}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serializing_keeps_the_discriminator() {
        let side_data: SideData = serde_json::from_str(
            r#"{"side_data_type":"DOVI configuration record","dv_profile":8,"dv_level":6,"rpu_present_flag":1}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&side_data).unwrap();
        assert_eq!(value["side_data_type"], "DOVI configuration record");
        assert_eq!(value["dv_profile"], 8);
    }

    #[test]
    fn mastering_display_and_light_level_decode_together() {
        let list: Vec<SideData> = serde_json::from_str(
            r#"[
                {
                    "side_data_type": "Mastering display metadata",
                    "red_x": "35400/50000", "red_y": "14600/50000",
                    "white_point_x": "15635/50000", "white_point_y": "16450/50000",
                    "min_luminance": "50/10000", "max_luminance": "10000000/10000"
                },
                {
                    "side_data_type": "Content light level metadata",
                    "max_content": 1000,
                    "max_average": "400"
                }
            ]"#,
        )
        .unwrap();
        match &list[0] {
            SideData::MasteringDisplayMetadata(m) => {
                assert_eq!(m.red_x.as_deref(), Some("35400/50000"));
                assert_eq!(m.max_luminance.as_deref(), Some("10000000/10000"));
            }
            other => panic!("unexpected record: {other:?}"),
        }
        match &list[1] {
            SideData::ContentLightLevelMetadata(c) => {
                assert_eq!(c.max_content, Some(1000));
                assert_eq!(c.max_average, Some(400));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn hdr10_plus_reads_the_spaced_application_version_key() {
        let side_data: SideData = serde_json::from_str(
            r#"{
                "side_data_type": "HDR Dynamic Metadata SMPTE2094-40 (HDR10+)",
                "application version": 1,
                "num_windows": 1,
                "targeted_system_display_maximum_luminance": "400/1",
                "knee_point_x": "123/4095"
            }"#,
        )
        .unwrap();
        match side_data {
            SideData::Hdr10PlusMetadata(h) => {
                assert_eq!(h.application_version, 1);
                assert_eq!(h.num_windows, 1);
                assert_eq!(h.knee_point_x.as_deref(), Some("123/4095"));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }
}
