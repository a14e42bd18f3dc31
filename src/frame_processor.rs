use std::time::Duration;

use indexmap::IndexMap;
use log::{error, info, warn};
use ndarray::Array2;
use serde::Serialize;

use crate::{
    Point2D,
    analytics_config::AnalyticsConfig,
    detections::{Detection, DetectionFrame, FrameMeta, TrackId},
    errors::AnalyticsError,
    geometry_utils::within_bounds,
    systems::{
        Session, dwell,
        population_alerts::AlertEvent,
        track_ledger::{Track, ZoneState},
        zone::{CalibrationHandle, Zone},
    },
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProcessorState {
    /// No zone yet; frames are acknowledged but nothing is tracked
    Uncalibrated,
    Active,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetail {
    pub zone: ZoneState,
    pub zone_time: f64,
    pub outside_time: f64,
    pub total_time: f64,
    pub alerted: bool,
    /// Box centroid used for the zone test
    pub location: Point2D,
    pub bbox: [i32; 4],
}

impl TrackDetail {
    fn new(track: &Track, location: Point2D, bbox: [i32; 4]) -> Self {
        TrackDetail {
            zone: track.current_zone,
            zone_time: track.zone_time.as_secs_f64(),
            outside_time: track.outside_time.as_secs_f64(),
            total_time: track.total_time().as_secs_f64(),
            alerted: track.alerted(),
            location,
            bbox,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMetrics {
    pub total_count: usize,
    pub zone_count: usize,
    pub outside_count: usize,
    pub zone_population_alert: bool,
    pub overall_population_alert: bool,
    pub frame_width: u32,
    pub frame_height: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub state: ProcessorState,
    /// Tells the UI to prompt for drawing the zone
    pub calibration_required: bool,
    pub per_track_details: IndexMap<TrackId, TrackDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_metrics: Option<GlobalMetrics>,
}

impl FrameSummary {
    fn empty(state: ProcessorState) -> Self {
        FrameSummary {
            state,
            calibration_required: state == ProcessorState::Uncalibrated,
            per_track_details: IndexMap::new(),
            global_metrics: None,
        }
    }
}

/// Result of one processing step. `new_alerts` belong to the caller; they
/// are not repeated on later frames.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutput {
    pub summary: FrameSummary,
    pub new_alerts: Vec<AlertEvent>,
}

impl FrameOutput {
    fn empty(state: ProcessorState) -> Self {
        FrameOutput {
            summary: FrameSummary::empty(state),
            new_alerts: Vec::new(),
        }
    }
}

/// Drives one session through its frames, strictly one at a time.
///
/// Thresholds are fixed at construction; to change them, build a new
/// processor from the new config.
pub struct FrameProcessor {
    config: AnalyticsConfig,
    session: Session,
    eviction_window: Option<Duration>,
}

impl FrameProcessor {
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        info!(
            "Frame processor initialised with thresholds: person={}s, zone={}, overall={}",
            config.person_threshold, config.zone_threshold, config.overall_threshold
        );
        let session = Session::new(&config);
        let eviction_window = config.eviction.window();
        Ok(FrameProcessor {
            config,
            session,
            eviction_window,
        })
    }

    pub fn state(&self) -> ProcessorState {
        if self.session.zone.is_ready() {
            ProcessorState::Active
        } else {
            ProcessorState::Uncalibrated
        }
    }

    pub fn begin_calibration(&self) -> CalibrationHandle {
        CalibrationHandle::begin()
    }

    /// Install a calibrated zone; the processor becomes active straight away.
    /// An unready zone, or one with corners out of range, is ignored.
    pub fn apply_zone(&mut self, zone: Zone) -> ProcessorState {
        match zone.check() {
            Ok(()) => self.session.zone = zone,
            Err(e) => warn!("Ignoring zone: {}", e),
        }
        self.state()
    }

    /// Back to uncalibrated, with no trace of previous frames.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Normalised heatmap density for a frame of the given size
    pub fn heatmap_density(&mut self, width: u32, height: u32) -> Array2<f32> {
        self.session
            .heatmap
            .density(width as usize, height as usize)
    }

    /// Process a recorded feed line; a failed detection counts as nobody seen.
    pub fn process_detection_frame(&mut self, frame: &DetectionFrame) -> FrameOutput {
        let detections: &[Detection] = match frame.detections() {
            Ok(detections) => detections,
            Err(e) => {
                warn!("{}; treating frame as empty", e);
                &[]
            }
        };
        self.process_frame(&frame.meta(), detections)
    }

    /// Advance the session by one frame.
    ///
    /// Counts are taken over `detections` as given: a track id listed twice
    /// is counted twice in the totals, while its detail entry (and its dwell,
    /// which the second listing advances by zero) is kept once.
    pub fn process_frame(&mut self, meta: &FrameMeta, detections: &[Detection]) -> FrameOutput {
        if !self.session.zone.is_ready() {
            return FrameOutput::empty(ProcessorState::Uncalibrated);
        }

        if let Err(e) = validate_frame(meta, detections) {
            error!("Skipping frame: {}", e);
            return FrameOutput::empty(ProcessorState::Active);
        }

        let now = meta.timestamp;
        let Session {
            zone,
            ledger,
            dwell_rule,
            population,
            heatmap,
        } = &mut self.session;

        if let Some(window) = self.eviction_window {
            ledger.evict_unseen(now, window);
        }

        let mut per_track_details = IndexMap::new();
        let mut new_alerts = Vec::new();
        let mut zone_count = 0;

        for Detection { track_id, bbox } in detections {
            let location = bbox.centroid();
            heatmap.push(bbox.foot_point());

            let zone_state = if zone.is_inside(location.0, location.1) {
                zone_count += 1;
                ZoneState::Inside
            } else {
                ZoneState::Outside
            };

            let track = ledger.observe(*track_id, now);
            dwell::advance(track, now, zone_state);

            if let Some(alert) = dwell_rule.check(track) {
                new_alerts.push(alert);
            }

            per_track_details.insert(
                *track_id,
                TrackDetail::new(track, location, (*bbox).into()),
            );
        }

        let total_count = detections.len();
        new_alerts.extend(population.evaluate(zone_count, total_count));
        let population_state = population.state();

        FrameOutput {
            summary: FrameSummary {
                state: ProcessorState::Active,
                calibration_required: false,
                per_track_details,
                global_metrics: Some(GlobalMetrics {
                    total_count,
                    zone_count,
                    outside_count: total_count - zone_count,
                    zone_population_alert: population_state.zone_population_alert_active,
                    overall_population_alert: population_state.overall_population_alert_active,
                    frame_width: meta.width,
                    frame_height: meta.height,
                }),
            },
            new_alerts,
        }
    }
}

/// Reject anything that would leave the ledger half-updated.
fn validate_frame(meta: &FrameMeta, detections: &[Detection]) -> Result<(), AnalyticsError> {
    if !meta.has_area() {
        return Err(AnalyticsError::InvalidFrame {
            width: meta.width,
            height: meta.height,
        });
    }
    for d in detections {
        let b = d.bbox;
        if !within_bounds((b.x1, b.y1)) || !within_bounds((b.x2, b.y2)) {
            return Err(AnalyticsError::InvalidDetection {
                track_id: d.track_id.0,
            });
        }
    }
    Ok(())
}
