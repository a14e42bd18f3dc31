use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("calibration incomplete: {0}")]
    Calibration(String),

    #[error("frame has unusable dimensions {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    #[error("detection for track {track_id} has out-of-range coordinates")]
    InvalidDetection { track_id: i64 },

    #[error("detector produced no result for this frame")]
    DetectionUnavailable,
}
