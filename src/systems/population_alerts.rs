use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use super::{alert_latch::AlertLatch, track_ledger::Track};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    #[serde(rename = "Per-Person")]
    PerTrack,
    #[serde(rename = "Zone Population")]
    ZonePopulation,
    #[serde(rename = "Overall Population")]
    OverallPopulation,
}

/// A freshly fired alert. The engine keeps no copy once it is returned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
}

impl AlertEvent {
    fn new(kind: AlertKind, message: String) -> Self {
        warn!("{}", message);
        AlertEvent { kind, message }
    }
}

/// Fires once per track, the first time its zone dwell exceeds the threshold.
#[derive(Debug, Clone)]
pub struct DwellAlertRule {
    threshold: Duration,
    zone_label: String,
}

impl DwellAlertRule {
    pub fn new(threshold_secs: u32, zone_label: &str) -> Self {
        DwellAlertRule {
            threshold: Duration::from_secs(threshold_secs as u64),
            zone_label: String::from(zone_label),
        }
    }

    pub fn check(&self, track: &mut Track) -> Option<AlertEvent> {
        if track.alert.evaluate(track.zone_time > self.threshold) {
            Some(AlertEvent::new(
                AlertKind::PerTrack,
                format!(
                    "ALERT: Person {} in {} too long!",
                    track.id.0, self.zone_label
                ),
            ))
        } else {
            None
        }
    }
}

/// Latch states reported with every active frame.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PopulationState {
    pub zone_population_alert_active: bool,
    pub overall_population_alert_active: bool,
}

/// Two independent hysteresis latches over the per-frame head counts.
#[derive(Debug, Clone)]
pub struct PopulationAlertEngine {
    zone_threshold: usize,
    overall_threshold: usize,
    zone_label: String,
    zone_latch: AlertLatch,
    overall_latch: AlertLatch,
}

impl PopulationAlertEngine {
    pub fn new(zone_threshold: u32, overall_threshold: u32, zone_label: &str) -> Self {
        PopulationAlertEngine {
            zone_threshold: zone_threshold as usize,
            overall_threshold: overall_threshold as usize,
            zone_label: String::from(zone_label),
            zone_latch: AlertLatch::hysteresis(),
            overall_latch: AlertLatch::hysteresis(),
        }
    }

    /// Evaluate both latches for one frame, returning any alerts that fired.
    pub fn evaluate(&mut self, inside_count: usize, total_count: usize) -> Vec<AlertEvent> {
        let mut fired = Vec::new();

        if self.zone_latch.evaluate(inside_count > self.zone_threshold) {
            fired.push(AlertEvent::new(
                AlertKind::ZonePopulation,
                format!(
                    "ZONE POPULATION ALERT: {} people in {}!",
                    inside_count, self.zone_label
                ),
            ));
        }

        if self.overall_latch.evaluate(total_count > self.overall_threshold) {
            fired.push(AlertEvent::new(
                AlertKind::OverallPopulation,
                format!("OVERALL POPULATION ALERT: {} people in frame!", total_count),
            ));
        }

        fired
    }

    pub fn state(&self) -> PopulationState {
        PopulationState {
            zone_population_alert_active: self.zone_latch.is_fired(),
            overall_population_alert_active: self.overall_latch.is_fired(),
        }
    }

    pub fn reset(&mut self) {
        self.zone_latch.reset();
        self.overall_latch.reset();
    }
}
