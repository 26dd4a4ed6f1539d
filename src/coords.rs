use serde::{Deserialize, Serialize};

/// A position in either display or raster space. Which one is implied by context;
/// everything stored in annotations is raster space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where the rendered page currently sits on screen and how large its backing
/// raster is. Rebuilt every frame because the displayed size follows the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Top-left of the displayed page in viewport coordinates.
    pub origin: Point,
    pub displayed_width: f64,
    pub displayed_height: f64,
    pub raster_width: f64,
    pub raster_height: f64,
}

impl SurfaceGeometry {
    /// Raster pixels per displayed pixel. The page is always scaled uniformly,
    /// so the width ratio is authoritative.
    pub fn scale(&self) -> f64 {
        if self.displayed_width > 0.0 {
            self.raster_width / self.displayed_width
        } else {
            1.0
        }
    }

    pub fn to_raster_space(&self, pointer: Point) -> Point {
        let scale = self.scale();
        Point {
            x: (pointer.x - self.origin.x) * scale,
            y: (pointer.y - self.origin.y) * scale,
        }
    }

    pub fn to_display_space(&self, raster: Point) -> Point {
        let scale = self.scale();
        Point {
            x: raster.x / scale + self.origin.x,
            y: raster.y / scale + self.origin.y,
        }
    }

    /// True if a display-space point falls on the page.
    pub fn contains(&self, pointer: Point) -> bool {
        pointer.x >= self.origin.x
            && pointer.y >= self.origin.y
            && pointer.x <= self.origin.x + self.displayed_width
            && pointer.y <= self.origin.y + self.displayed_height
    }
}

/// Map a pointer event's viewport position into raster space. Out-of-bounds
/// positions are passed through unclamped.
pub fn to_raster_space(
    pointer_x: f64,
    pointer_y: f64,
    displayed_width: f64,
    displayed_height: f64,
    raster_width: f64,
    raster_height: f64,
    origin: Point,
) -> Point {
    SurfaceGeometry {
        origin,
        displayed_width,
        displayed_height,
        raster_width,
        raster_height,
    }
    .to_raster_space(Point::new(pointer_x, pointer_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> SurfaceGeometry {
        SurfaceGeometry {
            origin: Point::new(40.0, 25.0),
            displayed_width: 600.0,
            displayed_height: 850.0,
            raster_width: 1200.0,
            raster_height: 1700.0,
        }
    }

    #[test]
    fn test_maps_with_scale_and_origin() {
        let p = to_raster_space(340.0, 125.0, 600.0, 850.0, 1200.0, 1700.0, Point::new(40.0, 25.0));
        assert_eq!(p, Point::new(600.0, 200.0));
    }

    #[test]
    fn test_round_trip_recovers_pointer() {
        let g = geometry();
        for &(x, y) in &[(40.0, 25.0), (123.456, 789.01), (639.9, 874.2), (-5.0, 1000.0)] {
            let back = g.to_display_space(g.to_raster_space(Point::new(x, y)));
            assert!((back.x - x).abs() < 1e-9);
            assert!((back.y - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_out_of_bounds_is_not_clamped() {
        let g = geometry();
        let p = g.to_raster_space(Point::new(0.0, 0.0));
        assert_eq!(p, Point::new(-80.0, -50.0));
        assert!(!g.contains(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_zero_width_surface_does_not_divide_by_zero() {
        let mut g = geometry();
        g.displayed_width = 0.0;
        let p = g.to_raster_space(Point::new(50.0, 35.0));
        assert_eq!(p, Point::new(10.0, 10.0));
    }
}
