//! Placement transforms for embedded bitmaps and fill shapes.
//!
//! A placement is an axis-aligned box (`x`, `y`, `width`, `height`) in canvas
//! pixels, optionally rotated about its own center.
//!
//! ## Rotation Convention
//!
//! Rotation uses the SVG convention: clockwise positive angles, in degrees,
//! with the Y axis pointing down.
//! - 0° = no rotation
//! - 90° = rotated clockwise (right becomes down)
//!
//! ## Loose Bounds
//!
//! The canvas area touched by a rotated placement is the AABB of its four
//! rotated corners. The compositor scans that area and maps each pixel back
//! into the unrotated box with [`Placement::to_local`].

/// A point in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Where a layer's content lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation in degrees about the box center
    pub rotation: f32,
}

impl Placement {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True if the rotation is close enough to zero to have no visible effect
    pub fn is_axis_aligned(&self) -> bool {
        (self.rotation % 360.0).abs() < f32::EPSILON
    }

    /// Map a point from box-local coordinates (origin at the unrotated
    /// top-left corner) to canvas coordinates.
    ///
    /// ```text
    /// x' = cx + dx * cos(θ) - dy * sin(θ)
    /// y' = cy + dx * sin(θ) + dy * cos(θ)
    /// ```
    pub fn to_canvas(&self, local: Point) -> Point {
        let c = self.center();
        let dx = local.x - self.width / 2.0;
        let dy = local.y - self.height / 2.0;
        if self.is_axis_aligned() {
            return Point::new(c.x + dx, c.y + dy);
        }
        let (sin_a, cos_a) = self.rotation.to_radians().sin_cos();
        Point::new(c.x + dx * cos_a - dy * sin_a, c.y + dx * sin_a + dy * cos_a)
    }

    /// Inverse of [`Placement::to_canvas`]
    pub fn to_local(&self, point: Point) -> Point {
        let c = self.center();
        let dx = point.x - c.x;
        let dy = point.y - c.y;
        if self.is_axis_aligned() {
            return Point::new(dx + self.width / 2.0, dy + self.height / 2.0);
        }
        let (sin_a, cos_a) = self.rotation.to_radians().sin_cos();
        Point::new(
            dx * cos_a + dy * sin_a + self.width / 2.0,
            -dx * sin_a + dy * cos_a + self.height / 2.0,
        )
    }

    /// Whether a box-local point lies inside the unrotated box
    pub fn contains_local(&self, local: Point) -> bool {
        local.x >= 0.0 && local.y >= 0.0 && local.x < self.width && local.y < self.height
    }

    /// Loose canvas bounds: AABB of the four rotated corners
    pub fn bounds(&self) -> Bounds {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(self.width, 0.0),
            Point::new(0.0, self.height),
            Point::new(self.width, self.height),
        ]
        .map(|p| self.to_canvas(p));

        let mut bounds = Bounds {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        };
        for p in corners {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_axis_aligned_round_trip() {
        let p = Placement::new(10.0, 20.0, 100.0, 50.0);
        let local = p.to_local(Point::new(15.0, 25.0));
        assert!(approx(local.x, 5.0) && approx(local.y, 5.0));
        let back = p.to_canvas(local);
        assert!(approx(back.x, 15.0) && approx(back.y, 25.0));
    }

    #[test]
    fn test_rotation_90_clockwise() {
        // 20x20 box at origin, center (10, 10)
        let p = Placement::new(0.0, 0.0, 20.0, 20.0).with_rotation(90.0);
        // Local top-right corner rotates to bottom-right
        let q = p.to_canvas(Point::new(20.0, 0.0));
        assert!(approx(q.x, 20.0), "x was {}", q.x);
        assert!(approx(q.y, 20.0), "y was {}", q.y);
    }

    #[test]
    fn test_to_local_inverts_rotation() {
        let p = Placement::new(5.0, 7.0, 40.0, 30.0).with_rotation(33.0);
        let local = Point::new(12.5, 3.25);
        let back = p.to_local(p.to_canvas(local));
        assert!(approx(back.x, local.x) && approx(back.y, local.y));
    }

    #[test]
    fn test_bounds_unrotated() {
        let b = Placement::new(10.0, 10.0, 30.0, 20.0).bounds();
        assert!(approx(b.min_x, 10.0) && approx(b.max_x, 40.0));
        assert!(approx(b.min_y, 10.0) && approx(b.max_y, 30.0));
    }

    #[test]
    fn test_bounds_rotated_45_grow() {
        let b = Placement::new(0.0, 0.0, 100.0, 100.0)
            .with_rotation(45.0)
            .bounds();
        let diagonal = 100.0 * std::f32::consts::SQRT_2;
        assert!(approx(b.width(), diagonal), "width was {}", b.width());
        assert!(approx(b.height(), diagonal));
    }

    #[test]
    fn test_full_turn_is_axis_aligned() {
        assert!(Placement::new(0.0, 0.0, 1.0, 1.0)
            .with_rotation(360.0)
            .is_axis_aligned());
        assert!(!Placement::new(0.0, 0.0, 1.0, 1.0)
            .with_rotation(10.0)
            .is_axis_aligned());
    }

    #[test]
    fn test_contains_local() {
        let p = Placement::new(0.0, 0.0, 10.0, 10.0);
        assert!(p.contains_local(Point::new(0.0, 9.9)));
        assert!(!p.contains_local(Point::new(10.0, 5.0)));
        assert!(!p.contains_local(Point::new(-0.1, 5.0)));
    }
}
