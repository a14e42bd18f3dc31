use std::fs;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
    rect::Rect,
};
use log::debug;
use ndarray::Array2;

use crate::{
    analytics_config::AnalyticsConfig,
    errors::AnalyticsError,
    frame_processor::{FrameOutput, ProcessorState},
    systems::{heatmap::colour_map, track_ledger::ZoneState, zone::Zone},
};

const INSIDE_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
const OUTSIDE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const CALIBRATE_COLOUR: Rgb<u8> = Rgb([255, 255, 0]);
const ZONE_ALERT_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
const OVERALL_ALERT_COLOUR: Rgb<u8> = Rgb([255, 0, 255]);

const TEXT_COLOUR: Rgb<u8> = Rgb([0, 0, 0]);

const BANNER_HEIGHT: u32 = 20;
const MARKER_SIZE: u32 = 12;
const TEXT_SCALE: f32 = 16.;

#[derive(Clone)]
pub struct RenderStyle {
    pub heatmap_alpha: f32,
    pub zone_colour: Rgb<u8>,
    pub zone_label: String,
    /// Labels are only drawn when a font is loaded
    pub font: Option<FontArc>,
}

impl RenderStyle {
    pub fn from_config(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let font = match &config.font_path {
            Some(path) => Some(load_font(path)?),
            None => None,
        };
        Ok(RenderStyle {
            heatmap_alpha: config.heatmap_alpha,
            zone_colour: Rgb(config.zone_rgb()?),
            zone_label: config.zone_label.clone(),
            font,
        })
    }

    fn label(&self, image: &mut RgbImage, x: i32, y: i32, colour: Rgb<u8>, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(image, colour, x, y, PxScale::from(TEXT_SCALE), font, text);
        }
    }
}

pub fn load_font(path: &str) -> Result<FontArc, AnalyticsError> {
    let bytes = fs::read(path).map_err(|e| {
        AnalyticsError::Configuration(format!("failed to read font {}: {}", path, e))
    })?;
    FontArc::try_from_vec(bytes).map_err(|e| {
        AnalyticsError::Configuration(format!("{} is not a usable font: {}", path, e))
    })
}

/// The rectangle covering both corners inclusively, in any order
fn rect_between(x1: i32, y1: i32, x2: i32, y2: i32) -> Rect {
    let (left, top) = (x1.min(x2), y1.min(y2));
    let extent = |lo: i32, hi: i32| (hi as i64 - lo as i64 + 1).clamp(1, i32::MAX as i64) as u32;
    Rect::at(left, top).of_size(extent(left, x1.max(x2)), extent(top, y1.max(y2)))
}

fn banner(image: &mut RgbImage, style: &RenderStyle, top: i32, colour: Rgb<u8>, text: &str) {
    let width = image.width().saturating_sub(80).max(1);
    draw_filled_rect_mut(image, Rect::at(40, top).of_size(width, BANNER_HEIGHT), colour);
    style.label(image, 44, top + 2, TEXT_COLOUR, text);
}

/// Draw the frame's state over a copy of the source image. Pure: neither
/// the source nor any session state is modified.
pub fn annotate(
    frame: &RgbImage,
    output: &FrameOutput,
    zone: &Zone,
    heatmap: Option<&Array2<f32>>,
    style: &RenderStyle,
) -> RgbImage {
    let mut annotated = frame.clone();

    if output.summary.state == ProcessorState::Uncalibrated {
        banner(
            &mut annotated,
            style,
            30,
            CALIBRATE_COLOUR,
            "Draw the zone to start monitoring",
        );
        return annotated;
    }

    if let Some(((x1, y1), (x2, y2))) = zone.normalised_corners() {
        draw_hollow_rect_mut(&mut annotated, rect_between(x1, y1, x2, y2), style.zone_colour);
        style.label(&mut annotated, x1, y1 - 18, style.zone_colour, &style.zone_label);
    }

    for (id, detail) in output.summary.per_track_details.iter() {
        let [x1, y1, x2, y2] = detail.bbox;
        let (left, top) = (x1.min(x2), y1.min(y2));
        let colour = match detail.zone {
            ZoneState::Inside => INSIDE_COLOUR,
            ZoneState::Outside => OUTSIDE_COLOUR,
        };
        draw_hollow_rect_mut(&mut annotated, rect_between(x1, y1, x2, y2), colour);
        style.label(&mut annotated, left + 2, top + 2, colour, &id.to_string());
        if detail.alerted {
            let marker_top = top - MARKER_SIZE as i32 - 4;
            draw_filled_rect_mut(
                &mut annotated,
                Rect::at(left, marker_top).of_size(MARKER_SIZE, MARKER_SIZE),
                INSIDE_COLOUR,
            );
            style.label(
                &mut annotated,
                left + MARKER_SIZE as i32 + 4,
                marker_top - 2,
                INSIDE_COLOUR,
                "ALERT!",
            );
        }
    }

    if let Some(metrics) = &output.summary.global_metrics {
        if metrics.zone_population_alert {
            let text = format!(
                "ZONE POPULATION ALERT: {} people in {}",
                metrics.zone_count, style.zone_label
            );
            banner(&mut annotated, style, 70, ZONE_ALERT_COLOUR, &text);
        }
        if metrics.overall_population_alert {
            let text = format!("OVERALL POPULATION ALERT: {} people", metrics.total_count);
            banner(&mut annotated, style, 110, OVERALL_ALERT_COLOUR, &text);
        }
    }

    if let Some(density) = heatmap {
        blend_heatmap(&mut annotated, density, style.heatmap_alpha);
    }

    annotated
}

/// Blend the colour-mapped density over the whole image at `alpha`
pub fn blend_heatmap(image: &mut RgbImage, density: &Array2<f32>, alpha: f32) {
    let expected = (image.height() as usize, image.width() as usize);
    if density.dim() != expected {
        debug!(
            "Heatmap is {:?} but frame is {:?}; skipping overlay",
            density.dim(),
            expected
        );
        return;
    }
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let heat = colour_map(density[[y as usize, x as usize]]);
        for (channel, h) in pixel.0.iter_mut().zip(heat) {
            *channel = (*channel as f32 * (1. - alpha) + h as f32 * alpha).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::{
        detections::{Detection, FrameMeta},
        frame_processor::FrameProcessor,
    };

    fn style() -> RenderStyle {
        RenderStyle::from_config(&AnalyticsConfig::default()).unwrap()
    }

    #[test]
    fn uncalibrated_frame_gets_prompt_banner_only() {
        let mut processor = FrameProcessor::new(AnalyticsConfig::default()).unwrap();
        let meta = FrameMeta::new(200, 100, UNIX_EPOCH);
        let output = processor.process_frame(&meta, &[Detection::new(1, [10, 10, 20, 20])]);
        let frame = RgbImage::new(200, 100);
        let annotated = annotate(&frame, &output, &processor.session().zone, None, &style());
        assert_eq!(*annotated.get_pixel(100, 35), CALIBRATE_COLOUR);
        assert_eq!(*annotated.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_are_coloured_by_zone() {
        let mut processor = FrameProcessor::new(AnalyticsConfig::default()).unwrap();
        processor.apply_zone(Zone::from_points((0, 0), (99, 99)));
        let meta = FrameMeta::new(300, 200, UNIX_EPOCH + Duration::from_secs(1));
        let output = processor.process_frame(
            &meta,
            &[
                Detection::new(1, [20, 20, 60, 60]),
                Detection::new(2, [150, 150, 190, 190]),
            ],
        );
        let frame = RgbImage::new(300, 200);
        let annotated = annotate(&frame, &output, &processor.session().zone, None, &style());
        assert_eq!(*annotated.get_pixel(20, 40), INSIDE_COLOUR);
        assert_eq!(*annotated.get_pixel(150, 170), OUTSIDE_COLOUR);
        // zone outline
        assert_eq!(*annotated.get_pixel(99, 50), style().zone_colour);
        // source frame untouched
        assert_eq!(*frame.get_pixel(20, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn heatmap_blend_respects_alpha() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([100, 100, 100]));
        let density = Array2::from_shape_vec((1, 2), vec![0., 255.]).unwrap();
        blend_heatmap(&mut image, &density, 0.5);
        let close = |p: &Rgb<u8>, want: [u8; 3]| p.0.iter().zip(want).all(|(x, y)| x.abs_diff(y) <= 1);
        assert!(close(image.get_pixel(0, 0), [50, 50, 178]));
        assert!(close(image.get_pixel(1, 0), [178, 50, 50]));
    }

    #[test]
    fn huge_rectangles_do_not_overflow() {
        let rect = rect_between(i32::MIN, 0, i32::MAX, 10);
        assert_eq!(rect.width(), i32::MAX as u32);
        assert_eq!(rect.height(), 11);
        assert_eq!(rect_between(5, 5, 5, 5).width(), 1);
    }

    #[test]
    fn out_of_range_zone_never_reaches_the_renderer() {
        let mut processor = FrameProcessor::new(AnalyticsConfig::default()).unwrap();
        let state = processor.apply_zone(Zone::from_points((i32::MIN, 0), (i32::MAX, 10)));
        assert_eq!(state, ProcessorState::Uncalibrated);
        let meta = FrameMeta::new(64, 48, UNIX_EPOCH);
        let output = processor.process_frame(&meta, &[]);
        let frame = RgbImage::new(64, 48);
        annotate(&frame, &output, &processor.session().zone, None, &style());
    }

    #[test]
    fn missing_font_is_a_configuration_error() {
        let config = AnalyticsConfig {
            font_path: Some(String::from("./no-such-font.ttf")),
            ..Default::default()
        };
        assert!(matches!(
            RenderStyle::from_config(&config),
            Err(AnalyticsError::Configuration(_))
        ));
    }

    #[test]
    fn labels_are_drawn_with_a_font() {
        // Only runs where the common DejaVu font is installed
        let path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
        if !std::path::Path::new(path).exists() {
            return;
        }
        let config = AnalyticsConfig {
            font_path: Some(String::from(path)),
            ..Default::default()
        };
        let with_font = RenderStyle::from_config(&config).unwrap();

        let mut processor = FrameProcessor::new(AnalyticsConfig::default()).unwrap();
        let meta = FrameMeta::new(400, 100, UNIX_EPOCH);
        let output = processor.process_frame(&meta, &[]);
        let frame = RgbImage::new(400, 100);
        let annotated = annotate(&frame, &output, &processor.session().zone, None, &with_font);
        let text_pixels = (44..360)
            .flat_map(|x| (30..50).map(move |y| (x, y)))
            .filter(|(x, y)| *annotated.get_pixel(*x, *y) != CALIBRATE_COLOUR)
            .count();
        assert!(text_pixels > 0);
    }

    #[test]
    fn mismatched_heatmap_is_skipped() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
        let density = Array2::zeros((2, 2));
        blend_heatmap(&mut image, &density, 1.0);
        assert_eq!(*image.get_pixel(0, 0), Rgb([10, 10, 10]));
    }
}
