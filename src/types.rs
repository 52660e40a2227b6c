use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API region. Each region maps to a fixed base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Global,
    Eu,
    Us,
}

impl Region {
    /// Base URL for this region's API endpoint.
    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Global => "https://api.bfl.ai",
            Region::Eu => "https://api.eu.bfl.ai",
            Region::Us => "https://api.us.bfl.ai",
        }
    }

    /// Parse a region string ("global", "eu", "us"), case-insensitive.
    ///
    /// Unrecognized strings fall back to [`Region::Global`], matching the
    /// service's documented default.
    pub fn parse(s: &str) -> Region {
        match s.to_ascii_lowercase().as_str() {
            "eu" => Region::Eu,
            "us" => Region::Us,
            _ => Region::Global,
        }
    }
}

/// Output image format requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    /// The wire value sent in the request payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        }
    }
}

/// Status of a generation job as reported by the polling endpoint.
///
/// Only `Ready` and `Error` are terminal. Anything the server reports that
/// is not recognized here (moderation holds, queue states added later) maps
/// to `Other` and keeps the poll loop running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Ready,
    Error,
    Other,
}

impl JobStatus {
    /// Map the wire status string onto the enum.
    pub fn parse(s: &str) -> JobStatus {
        match s {
            "Pending" => JobStatus::Pending,
            "Ready" => JobStatus::Ready,
            "Error" => JobStatus::Error,
            _ => JobStatus::Other,
        }
    }

    /// Whether this status ends the poll loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Error)
    }
}

/// Result of a successful generation.
///
/// The `url` is time-limited (roughly ten minutes); download promptly.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Server-assigned job identifier.
    pub id: String,
    /// Signed URL of the generated image.
    pub url: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// The full terminal result payload, for fields not modeled here.
    pub raw: Value,
}

/// Documented per-model concurrency ceiling.
///
/// Most models allow 24 concurrent jobs per account; `flux-kontext-max` is
/// limited to 6. Pass the value to
/// [`BflClient::with_max_concurrent`](crate::BflClient::with_max_concurrent)
/// when a client instance targets a single model.
pub fn recommended_concurrency(model: &str) -> usize {
    match model {
        "flux-kontext-max" => 6,
        _ => 24,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_base_urls() {
        assert_eq!(Region::Global.base_url(), "https://api.bfl.ai");
        assert_eq!(Region::Eu.base_url(), "https://api.eu.bfl.ai");
        assert_eq!(Region::Us.base_url(), "https://api.us.bfl.ai");
    }

    #[test]
    fn test_region_parse_known() {
        assert_eq!(Region::parse("eu"), Region::Eu);
        assert_eq!(Region::parse("US"), Region::Us);
        assert_eq!(Region::parse("global"), Region::Global);
    }

    #[test]
    fn test_region_parse_unknown_falls_back_to_global() {
        assert_eq!(Region::parse("asia"), Region::Global);
        assert_eq!(Region::parse(""), Region::Global);
    }

    #[test]
    fn test_output_format_wire_values() {
        assert_eq!(OutputFormat::Png.as_str(), "png");
        assert_eq!(OutputFormat::Jpeg.as_str(), "jpeg");
        assert_eq!(
            serde_json::to_string(&OutputFormat::Jpeg).unwrap(),
            "\"jpeg\""
        );
    }

    #[test]
    fn test_job_status_parsing() {
        assert_eq!(JobStatus::parse("Ready"), JobStatus::Ready);
        assert_eq!(JobStatus::parse("Error"), JobStatus::Error);
        assert_eq!(JobStatus::parse("Pending"), JobStatus::Pending);
    }

    #[test]
    fn test_job_status_unknown_maps_to_other() {
        let status = JobStatus::parse("Request Moderated");
        assert_eq!(status, JobStatus::Other);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Ready.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn test_recommended_concurrency() {
        assert_eq!(recommended_concurrency("flux-2-pro"), 24);
        assert_eq!(recommended_concurrency("flux-kontext-max"), 6);
    }
}
