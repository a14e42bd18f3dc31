pub mod alert_latch;
pub mod dwell;
pub mod heatmap;
pub mod population_alerts;
pub mod track_ledger;
pub mod zone;

use log::info;

use heatmap::HeatmapAccumulator;
use population_alerts::{DwellAlertRule, PopulationAlertEngine};
use track_ledger::TrackLedger;
use zone::Zone;

use crate::analytics_config::AnalyticsConfig;

/// All mutable state for one analysis run. Independent runs (e.g. two
/// camera streams) each own a separate `Session`.
pub struct Session {
    pub zone: Zone,
    pub ledger: TrackLedger,
    pub dwell_rule: DwellAlertRule,
    pub population: PopulationAlertEngine,
    pub heatmap: HeatmapAccumulator,
}

impl Session {
    pub fn new(config: &AnalyticsConfig) -> Session {
        let zone = match config.zone {
            Some((p1, p2)) => Zone::from_points(p1, p2),
            None => Zone::new(),
        };

        Session {
            zone,
            ledger: TrackLedger::new(),
            dwell_rule: DwellAlertRule::new(config.person_threshold, &config.zone_label),
            population: PopulationAlertEngine::new(
                config.zone_threshold,
                config.overall_threshold,
                &config.zone_label,
            ),
            heatmap: HeatmapAccumulator::new(config.heatmap_capacity, config.heatmap_kernel_size),
        }
    }

    /// Clear the zone, every track, both population latches and the heatmap.
    pub fn reset(&mut self) {
        self.zone.clear();
        self.ledger.clear();
        self.population.reset();
        self.heatmap.clear();
        info!("Session reset: zone, tracks, population alerts and heatmap cleared");
    }
}
