use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use image::RgbImage;
use log::{debug, info, warn};

use zone_dwell_analytics::{
    alert_log::AlertLog,
    analytics_config::load_config_from_file,
    detections::DetectionFrame,
    frame_processor::{FrameProcessor, ProcessorState},
    render::{RenderStyle, blend_heatmap},
};

mod cli;

use cli::{Cli, ZoneCorners};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path)?;
    if cli.save_config {
        let mut saved = config.clone();
        if let Some(ZoneCorners(p1, p2)) = cli.zone {
            saved.zone = Some((p1, p2));
        }
        saved.write_config_to_file(&cli.config_path)?;
    }

    let style = RenderStyle::from_config(&config)?;
    let mut processor = FrameProcessor::new(config)?;

    if let Some(ZoneCorners(p1, p2)) = cli.zone {
        // The command line plays the part of the zone-drawing input device
        let mut calibration = processor.begin_calibration();
        calibration.submit_point(p1);
        calibration.submit_point(p2);
        processor.apply_zone(calibration.finish()?);
    }
    if processor.state() == ProcessorState::Uncalibrated {
        warn!("No zone configured; every frame will report an empty summary");
    }

    let input = File::open(&cli.input_path)
        .with_context(|| format!("failed to open detection feed {}", &cli.input_path))?;
    let mut alert_log = AlertLog::append_to_file(&cli.alerts_path)?;
    let mut summary_output = match &cli.summary_path {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path))?,
        )),
        None => None,
    };

    let mut frames_processed = 0;
    let mut last_frame_size = None;

    for (line_number, line) in BufReader::new(input).lines().enumerate() {
        let line = line.context("failed to read detection feed")?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: DetectionFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping malformed frame on line {}: {}", line_number + 1, e);
                continue;
            }
        };

        let meta = frame.meta();
        let output = processor.process_detection_frame(&frame);
        alert_log.record(meta.timestamp, &output.new_alerts)?;

        if let Some(writer) = summary_output.as_mut() {
            serde_json::to_writer(&mut *writer, &output.summary)?;
            writer.write_all(b"\n")?;
        }

        // A zero-sized frame is skipped by the processor and must not size the heatmap
        if meta.has_area() {
            last_frame_size = Some((meta.width, meta.height));
        }
        frames_processed += 1;
    }

    if let Some(writer) = summary_output.as_mut() {
        writer.flush()?;
    }

    info!(
        "Processed {} frames; {} tracks seen; {} alerts logged",
        frames_processed,
        processor.session().ledger.len(),
        alert_log.written()
    );

    if let Some(path) = &cli.heatmap_path {
        match last_frame_size {
            Some((width, height)) if !processor.session().heatmap.is_empty() => {
                let density = processor.heatmap_density(width, height);
                let mut image = RgbImage::new(width, height);
                blend_heatmap(&mut image, &density, style.heatmap_alpha);
                image
                    .save(path)
                    .with_context(|| format!("failed to save heatmap to {}", path))?;
                info!("Saved heatmap ({}x{}) to {}", width, height, path);
            }
            _ => warn!("No occupancy recorded; heatmap not written"),
        }
    }

    Ok(())
}
