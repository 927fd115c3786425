//! Page-space geometry: points, rectangles and rotation about a pivot.
//!
//! All coordinates are PDF points with a top-left origin and y growing
//! downward, the frame certificate layouts are authored in. The PDF canvas
//! converts to bottom-left user space when it writes content streams.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Rotates this point about `pivot` by `degrees`.
    ///
    /// In the y-down frame a positive angle turns clockwise on the page.
    /// The text canvas applies exactly this rotation to rotated text boxes,
    /// so anything drawn relative to rotated text must go through here.
    pub fn rotated_about(self, pivot: Point, degrees: f32) -> Point {
        if degrees == 0.0 {
            return self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point {
            x: pivot.x + dx * cos - dy * sin,
            y: pivot.y + dx * sin + dy * cos,
        }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Axis-aligned rectangle `(x0, y0)`..`(x1, y1)` with `x0 <= x1`, `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x0 + self.width() / 2.0,
            self.y0 + self.height() / 2.0,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Overlapping area, or `None` when the rectangles do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Union of every rectangle in `rects`, `None` for an empty slice.
    pub fn union_all(rects: &[Rect]) -> Option<Rect> {
        let (first, rest) = rects.split_first()?;
        Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let p = Point::new(12.5, -3.0);
        assert_eq!(p.rotated_about(Point::new(100.0, 100.0), 0.0), p);
    }

    #[test]
    fn test_rotate_quarter_turn_is_clockwise_in_y_down_frame() {
        // A point to the right of the pivot ends up below it.
        let pivot = Point::new(10.0, 10.0);
        let p = Point::new(20.0, 10.0).rotated_about(pivot, 90.0);
        assert!(approx(p.x, 10.0), "x = {}", p.x);
        assert!(approx(p.y, 20.0), "y = {}", p.y);
    }

    #[test]
    fn test_rotate_preserves_distance_to_pivot() {
        let pivot = Point::new(-4.0, 7.0);
        let p = Point::new(30.0, 45.0);
        for deg in [-45.0, -10.0, 33.0, 90.0, 180.0, 270.0] {
            let r = p.rotated_about(pivot, deg);
            assert!(approx(r.distance_to(pivot), p.distance_to(pivot)), "angle {deg}");
        }
    }

    #[test]
    fn test_rect_center_and_size() {
        let r = Rect::from_origin_size(10.0, 20.0, 100.0, 40.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 40.0);
        assert_eq!(r.center(), Point::new(60.0, 40.0));
    }

    #[test]
    fn test_union_all_and_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 20.0, 15.0);
        assert_eq!(Rect::union_all(&[a, b]), Some(Rect::new(0.0, 0.0, 20.0, 15.0)));
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersect(&Rect::new(11.0, 11.0, 12.0, 12.0)), None);
        assert_eq!(Rect::union_all(&[]), None);
    }
}
