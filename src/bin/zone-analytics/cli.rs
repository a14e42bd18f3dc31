use std::str::FromStr;

use clap::Parser;
use zone_dwell_analytics::Point2D;

// Some defaults; some of which can be overriden via CLI args
const CONFIG_FILE_PATH: &str = "./zoneAnalytics.json";
const ALERTS_FILE_PATH: &str = "./alerts.jsonl";

/// Two zone corners given as `x1,y1,x2,y2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneCorners(pub Point2D, pub Point2D);

impl FromStr for ZoneCorners {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<i32>())
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|e| format!("zone coordinates must be integers: {}", e))?;
        match values[..] {
            [x1, y1, x2, y2] => Ok(ZoneCorners((x1, y1), (x2, y2))),
            _ => Err(format!(
                "expected 4 comma-separated values (x1,y1,x2,y2), got {}",
                values.len()
            )),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to load analytics config (thresholds, heatmap and zone settings)
    #[arg(long = "config", default_value_t = String::from(CONFIG_FILE_PATH))]
    pub config_path: String,

    /// JSON-lines detector feed to replay, one frame per line
    #[arg(long = "input")]
    pub input_path: String,

    /// Zone rectangle as x1,y1,x2,y2; overrides any zone in the config file
    #[arg(long = "zone")]
    pub zone: Option<ZoneCorners>,

    /// Where to append fired alerts (JSON lines)
    #[arg(long = "alerts.output", default_value_t = String::from(ALERTS_FILE_PATH))]
    pub alerts_path: String,

    /// Optionally write every frame summary (JSON lines)
    #[arg(long = "summary.output")]
    pub summary_path: Option<String>,

    /// Optionally save the final heatmap as an image
    #[arg(long = "heatmap.output")]
    pub heatmap_path: Option<String>,

    /// Write the effective config back to the config path
    #[arg(long = "config.save")]
    pub save_config: bool,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zone_corners() {
        assert_eq!(
            "10, 20,300,400".parse::<ZoneCorners>(),
            Ok(ZoneCorners((10, 20), (300, 400)))
        );
        assert!("10,20,300".parse::<ZoneCorners>().is_err());
        assert!("a,b,c,d".parse::<ZoneCorners>().is_err());
    }
}
