use std::{fs, time::Duration};

use anyhow::{Context, Result, anyhow};
use colorsys::Rgb;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{Point2D, errors::AnalyticsError, geometry_utils::within_bounds};

/// How long a ledger entry may go unobserved before it is dropped.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub enum EvictionPolicy {
    /// Keep every track until the session is reset
    #[default]
    Never,
    UnseenForSecs(f64),
}

impl EvictionPolicy {
    pub fn window(&self) -> Option<Duration> {
        match self {
            EvictionPolicy::Never => None,
            EvictionPolicy::UnseenForSecs(secs) => Duration::try_from_secs_f64(*secs).ok(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsConfig {
    /// Seconds a single person may spend in the zone before a per-person alert
    pub person_threshold: u32,

    /// Alert once more than this many people are inside the zone
    pub zone_threshold: u32,

    /// Alert once more than this many people are in the frame at all
    pub overall_threshold: u32,

    // -------- HEATMAP SETTINGS
    /// Opacity of the heatmap overlay (0 is invisible, 1 replaces the frame)
    pub heatmap_alpha: f32,

    /// Width in pixels of the (square) blur kernel; must be odd
    pub heatmap_kernel_size: usize,

    /// How many recent foot positions feed the heatmap
    pub heatmap_capacity: usize,

    // -------- ZONE SETTINGS
    pub zone_label: String,

    /// Hex colour string, e.g. "#ff0000"
    pub zone_colour: String,

    /// Optional pre-calibrated zone corners; skips interactive calibration
    pub zone: Option<(Point2D, Point2D)>,
    /// TrueType/OpenType font for annotation labels; without one, only
    /// shapes are drawn
    pub font_path: Option<String>,

    pub eviction: EvictionPolicy,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            person_threshold: 10,
            zone_threshold: 5,
            overall_threshold: 20,
            heatmap_alpha: 0.4,
            heatmap_kernel_size: 91,
            heatmap_capacity: 500,
            zone_label: String::from("Danger Zone"),
            zone_colour: String::from("#ff0000"),
            zone: None,
            font_path: None,
            eviction: EvictionPolicy::Never,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if !(0.0..=1.0).contains(&self.heatmap_alpha) {
            return Err(AnalyticsError::Configuration(format!(
                "heatmapAlpha must be within [0,1], got {}",
                self.heatmap_alpha
            )));
        }
        if self.heatmap_kernel_size == 0 || self.heatmap_kernel_size % 2 == 0 {
            return Err(AnalyticsError::Configuration(format!(
                "heatmapKernelSize must be odd, got {}",
                self.heatmap_kernel_size
            )));
        }
        if self.heatmap_capacity == 0 {
            return Err(AnalyticsError::Configuration(String::from(
                "heatmapCapacity must be above 0",
            )));
        }
        self.zone_rgb()?;
        if let Some((a, b)) = self.zone {
            if !within_bounds(a) || !within_bounds(b) {
                return Err(AnalyticsError::Configuration(format!(
                    "zone corners {:?} -> {:?} are out of range",
                    a, b
                )));
            }
        }
        if let EvictionPolicy::UnseenForSecs(secs) = self.eviction {
            if self.eviction.window().is_none() {
                return Err(AnalyticsError::Configuration(format!(
                    "eviction window must be a non-negative number of seconds, got {}",
                    secs
                )));
            }
        }
        Ok(())
    }

    pub fn zone_rgb(&self) -> Result<[u8; 3], AnalyticsError> {
        Rgb::from_hex_str(&self.zone_colour)
            .map(|rgb| rgb.into())
            .map_err(|e| {
                AnalyticsError::Configuration(format!(
                    "zoneColour \"{}\" is not a hex colour: {:?}",
                    self.zone_colour, e
                ))
            })
    }

    pub fn write_config_to_file(&self, config_file_path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, text)
            .with_context(|| format!("failed to write config to {}", config_file_path))?;
        info!("Wrote config to file: {:?}", config_file_path);
        Ok(())
    }
}

pub fn load_config_from_file(config_file_path: &str) -> Result<AnalyticsConfig> {
    match fs::read_to_string(config_file_path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Analytics config file not found at {}; using defaults",
                config_file_path
            );
            Ok(AnalyticsConfig::default())
        }
        Err(e) => Err(anyhow!(
            "Failed to load analytics config from \"{}\": {}",
            config_file_path,
            e
        )),
        Ok(s) => {
            info!("Loaded analytics config OK from \"{}\"", config_file_path);
            let config = serde_json::from_str::<AnalyticsConfig>(&s)
                .with_context(|| format!("Failed to parse config data in {}", config_file_path))?;
            debug!("Config parsed data from file: {:?}", &config);
            config.validate()?;
            Ok(config)
        }
    }
}
