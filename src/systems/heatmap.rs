use std::collections::VecDeque;

use colorsys::{Hsl, Rgb};
use image::Luma;
use imageproc::{definitions::Image, filter::separable_filter_equal};
use log::debug;
use map_range::MapRange;
use ndarray::Array2;

use crate::{Point2D, geometry_utils::frame_index};

/// Bounded history of recent foot positions, plus the density surface
/// derived from them.
#[derive(Debug)]
pub struct HeatmapAccumulator {
    points: VecDeque<Point2D>,
    capacity: usize,
    kernel: Vec<f32>,
    /// Per-pixel counts, reused between renders while the frame size holds
    grid: Image<Luma<f32>>,
}

impl HeatmapAccumulator {
    pub fn new(capacity: usize, kernel_size: usize) -> Self {
        HeatmapAccumulator {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
            kernel: gaussian_kernel(kernel_size),
            grid: Image::new(0, 0),
        }
    }

    /// Append, then drop the oldest points beyond capacity
    pub fn push(&mut self, p: Point2D) {
        self.points.push_back(p);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &Point2D> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Blurred density of retained points on a `width` x `height` frame,
    /// normalised so the hottest pixel is 255 and the coldest 0.
    /// Indexed `[[row, col]]`.
    pub fn density(&mut self, width: usize, height: usize) -> Array2<f32> {
        if width == 0 || height == 0 {
            return Array2::zeros((height, width));
        }
        let size = (width as u32, height as u32);
        if self.grid.dimensions() != size {
            debug!(
                "Heatmap grid resized {:?} -> {:?}",
                self.grid.dimensions(),
                size
            );
            self.grid = Image::new(size.0, size.1);
        } else {
            self.grid.pixels_mut().for_each(|p| p.0[0] = 0.);
        }

        for p in self.points.iter() {
            if let Some((row, col)) = frame_index(*p, width, height) {
                self.grid.get_pixel_mut(col as u32, row as u32).0[0] += 1.;
            }
        }

        // Borders are clamped, i.e. edge pixels replicate outwards
        let blurred = separable_filter_equal(&self.grid, &self.kernel);
        let surface = Array2::from_shape_fn((height, width), |(row, col)| {
            blurred.get_pixel(col as u32, row as u32).0[0]
        });
        normalise(&surface)
    }
}

/// Normalised 1-D Gaussian weights. Sigma follows the usual rule for
/// deriving it from the kernel width.
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    let size = size.max(1);
    let half = (size / 2) as f32;
    let sigma = (0.3 * ((size as f32 - 1.) * 0.5 - 1.) + 0.8).max(f32::EPSILON);
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2. * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

fn normalise(surface: &Array2<f32>) -> Array2<f32> {
    let (min, max) = surface
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !(max - min).is_normal() {
        return Array2::zeros(surface.dim());
    }
    surface.mapv(|v| v.map_range(min..max, 0. ..255.))
}

/// Jet-style colour for a normalised density value: blue when cold, red when hot
pub fn colour_map(value: f32) -> [u8; 3] {
    let t = (value / 255.).clamp(0., 1.) as f64;
    let hsl = Hsl::new((1. - t) * 240., 100., 50., None);
    Rgb::from(&hsl).into()
}
