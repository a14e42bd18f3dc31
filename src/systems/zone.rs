use log::info;

use crate::{
    Point2D,
    errors::AnalyticsError,
    geometry_utils::{rect_contains, within_bounds},
};

/// The single rectangular region of interest, spanned by two corners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zone {
    points: Option<(Point2D, Point2D)>,
    ready: bool,
}

impl Zone {
    pub fn new() -> Self {
        Zone::default()
    }

    pub fn from_points(p1: Point2D, p2: Point2D) -> Self {
        let mut zone = Zone::new();
        zone.set_points(p1, p2);
        zone
    }

    /// Store the corners and mark the zone ready; a later call overwrites.
    pub fn set_points(&mut self, p1: Point2D, p2: Point2D) {
        self.points = Some((p1, p2));
        self.ready = true;
        info!("Zone defined: {:?} -> {:?}", p1, p2);
    }

    pub fn is_inside(&self, x: i32, y: i32) -> bool {
        match self.points {
            Some((a, b)) if self.ready => rect_contains(a, b, (x, y)),
            _ => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready && self.points.is_some()
    }

    /// Ready, with both corners inside the coordinate range
    pub fn check(&self) -> Result<(), AnalyticsError> {
        match self.points {
            Some((a, b)) if self.ready => {
                if within_bounds(a) && within_bounds(b) {
                    Ok(())
                } else {
                    Err(AnalyticsError::Calibration(format!(
                        "zone corners {:?} -> {:?} are out of range",
                        a, b
                    )))
                }
            }
            _ => Err(AnalyticsError::Calibration(String::from(
                "zone has no corners set",
            ))),
        }
    }

    pub fn points(&self) -> Option<(Point2D, Point2D)> {
        self.points
    }

    /// Top-left and bottom-right corners, whatever order they were drawn in
    pub fn normalised_corners(&self) -> Option<(Point2D, Point2D)> {
        self.points.map(|((x1, y1), (x2, y2))| {
            ((x1.min(x2), y1.min(y2)), (x1.max(x2), y1.max(y2)))
        })
    }

    pub fn clear(&mut self) {
        self.points = None;
        self.ready = false;
    }
}

/// Collects the press/release pair from whatever input device draws the zone.
///
/// The first submitted point is the press corner; every later point moves
/// the release corner, so a stream of drag events ends up at the final
/// release position.
#[derive(Debug, Default)]
pub struct CalibrationHandle {
    press: Option<Point2D>,
    release: Option<Point2D>,
}

impl CalibrationHandle {
    pub fn begin() -> Self {
        CalibrationHandle::default()
    }

    pub fn submit_point(&mut self, p: Point2D) {
        if self.press.is_none() {
            self.press = Some(p);
        } else {
            self.release = Some(p);
        }
    }

    pub fn finish(self) -> Result<Zone, AnalyticsError> {
        match (self.press, self.release) {
            (Some(a), Some(b)) => {
                let zone = Zone::from_points(a, b);
                zone.check()?;
                Ok(zone)
            }
            (Some(_), None) => Err(AnalyticsError::Calibration(String::from(
                "only the first corner was submitted",
            ))),
            _ => Err(AnalyticsError::Calibration(String::from(
                "no corners were submitted",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unready_zone_contains_nothing() {
        let zone = Zone::new();
        assert!(!zone.is_ready());
        assert!(!zone.is_inside(0, 0));
    }

    #[test]
    fn containment_is_inclusive_and_order_independent() {
        let zone = Zone::from_points((100, 100), (0, 0));
        assert!(zone.is_inside(0, 0));
        assert!(zone.is_inside(100, 100));
        assert!(zone.is_inside(50, 50));
        assert!(!zone.is_inside(101, 50));
        assert_eq!(zone.normalised_corners(), Some(((0, 0), (100, 100))));
    }

    #[test]
    fn set_points_overwrites() {
        let mut zone = Zone::from_points((0, 0), (10, 10));
        zone.set_points((20, 20), (30, 30));
        assert!(!zone.is_inside(5, 5));
        assert!(zone.is_inside(25, 25));
    }

    #[test]
    fn clear_makes_zone_unready() {
        let mut zone = Zone::from_points((0, 0), (10, 10));
        zone.clear();
        assert!(!zone.is_ready());
        assert!(!zone.is_inside(5, 5));
    }

    #[test]
    fn calibration_uses_press_and_last_release() {
        let mut handle = CalibrationHandle::begin();
        handle.submit_point((10, 10));
        handle.submit_point((40, 40));
        handle.submit_point((80, 60));
        let zone = handle.finish().unwrap();
        assert!(zone.is_ready());
        assert_eq!(zone.points(), Some(((10, 10), (80, 60))));
    }

    #[test]
    fn calibration_needs_two_points() {
        let mut handle = CalibrationHandle::begin();
        handle.submit_point((10, 10));
        assert!(matches!(
            handle.finish(),
            Err(AnalyticsError::Calibration(_))
        ));
        assert!(CalibrationHandle::begin().finish().is_err());
    }

    #[test]
    fn out_of_range_corners_are_rejected() {
        assert!(Zone::from_points((0, 0), (1 << 24, 1 << 24)).check().is_ok());
        assert!(Zone::from_points((i32::MIN, 0), (i32::MAX, 10)).check().is_err());
        assert!(Zone::new().check().is_err());

        let mut handle = CalibrationHandle::begin();
        handle.submit_point((0, 0));
        handle.submit_point((i32::MAX, 10));
        assert!(matches!(
            handle.finish(),
            Err(AnalyticsError::Calibration(_))
        ));
    }
}
