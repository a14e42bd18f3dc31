use crate::{Point2D, detections::BoundingBox};

/// Coordinates beyond this magnitude are treated as a fault; it keeps
/// every midpoint and extent calculation well clear of overflow.
pub const MAX_COORDINATE: u32 = 1 << 24;

pub fn within_bounds(p: Point2D) -> bool {
    p.0.unsigned_abs() <= MAX_COORDINATE && p.1.unsigned_abs() <= MAX_COORDINATE
}

/// Midpoint of the box, rounding towards negative infinity on both axes
pub fn centroid_of_box(b: &BoundingBox) -> Point2D {
    ((b.x1 + b.x2).div_euclid(2), (b.y1 + b.y2).div_euclid(2))
}

/// Horizontal middle of the bottom edge
pub fn bottom_centre(b: &BoundingBox) -> Point2D {
    ((b.x1 + b.x2).div_euclid(2), b.y2)
}

/// Inclusive containment in the rectangle spanned by two corners, in any order
pub fn rect_contains(a: Point2D, b: Point2D, p: Point2D) -> bool {
    let (x1, y1) = a;
    let (x2, y2) = b;
    let (x, y) = p;
    x1.min(x2) <= x && x <= x1.max(x2) && y1.min(y2) <= y && y <= y1.max(y2)
}

/// Grid coordinates for a point, if it lies on a `width` x `height` frame
pub fn frame_index(p: Point2D, width: usize, height: usize) -> Option<(usize, usize)> {
    let (x, y) = p;
    if x < 0 || y < 0 {
        return None;
    }
    let (col, row) = (x as usize, y as usize);
    if col < width && row < height {
        Some((row, col))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_rounds_down() {
        assert_eq!(centroid_of_box(&BoundingBox::new(0, 0, 100, 100)), (50, 50));
        assert_eq!(centroid_of_box(&BoundingBox::new(0, 0, 5, 3)), (2, 1));
        assert_eq!(centroid_of_box(&BoundingBox::new(-5, -3, 0, 0)), (-3, -2));
    }

    #[test]
    fn test_bottom_centre() {
        assert_eq!(bottom_centre(&BoundingBox::new(10, 20, 30, 80)), (20, 80));
    }

    #[test]
    fn test_rect_contains_any_corner_order() {
        assert!(rect_contains((0, 0), (100, 100), (50, 50)));
        assert!(rect_contains((100, 100), (0, 0), (50, 50)));
        assert!(rect_contains((100, 0), (0, 100), (0, 100))); // edges count
        assert!(!rect_contains((0, 0), (100, 100), (101, 50)));
        assert!(!rect_contains((0, 0), (100, 100), (50, -1)));
    }

    #[test]
    fn test_within_bounds() {
        assert!(within_bounds((0, 0)));
        assert!(within_bounds((-(1 << 24), 1 << 24)));
        assert!(!within_bounds(((1 << 24) + 1, 0)));
        assert!(!within_bounds((0, i32::MIN)));
    }

    #[test]
    fn test_frame_index() {
        assert_eq!(frame_index((3, 2), 10, 10), Some((2, 3)));
        assert_eq!(frame_index((10, 2), 10, 10), None);
        assert_eq!(frame_index((-1, 2), 10, 10), None);
    }
}
