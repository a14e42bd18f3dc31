use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{
    Point2D,
    errors::AnalyticsError,
    geometry_utils::{bottom_centre, centroid_of_box},
};

/// Identity assigned by the external tracker; stable across frames for one person.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Axis-aligned box in frame pixels, as `[x1, y1, x2, y2]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        BoundingBox { x1, y1, x2, y2 }
    }

    pub fn centroid(&self) -> Point2D {
        centroid_of_box(self)
    }

    /// Where the person stands; this is what the heatmap records.
    pub fn foot_point(&self) -> Point2D {
        bottom_centre(self)
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from(c: [i32; 4]) -> Self {
        BoundingBox::new(c[0], c[1], c[2], c[3])
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub track_id: TrackId,
    #[serde(with = "bbox_as_array")]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(track_id: i64, bbox: [i32; 4]) -> Self {
        Detection {
            track_id: TrackId(track_id),
            bbox: bbox.into(),
        }
    }
}

mod bbox_as_array {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::BoundingBox;

    pub fn serialize<S: Serializer>(b: &BoundingBox, s: S) -> Result<S::Ok, S::Error> {
        <[i32; 4]>::from(*b).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BoundingBox, D::Error> {
        <[i32; 4]>::deserialize(d).map(BoundingBox::from)
    }
}

/// Everything about a frame the engine needs, minus the pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMeta {
    pub width: u32,
    pub height: u32,
    pub timestamp: SystemTime,
}

impl FrameMeta {
    pub fn new(width: u32, height: u32, timestamp: SystemTime) -> Self {
        FrameMeta {
            width,
            height,
            timestamp,
        }
    }

    /// A frame with no pixels cannot hold a detection or a heatmap
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// One line of a recorded detector feed.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DetectionFrame {
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    /// `None` when the detector failed on this frame
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
}

impl DetectionFrame {
    pub fn meta(&self) -> FrameMeta {
        FrameMeta::new(
            self.width,
            self.height,
            UNIX_EPOCH + Duration::from_millis(self.timestamp_ms),
        )
    }

    pub fn detections(&self) -> Result<&[Detection], AnalyticsError> {
        self.detections
            .as_deref()
            .ok_or(AnalyticsError::DetectionUnavailable)
    }
}
