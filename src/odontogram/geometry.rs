// src/odontogram/geometry.rs
//! Numeric shapes produced by the layout. Rendering formats live in `render`.

use lyon::algorithms::hit_test::hit_test_path;
use lyon::math::point;
use lyon::path::{FillRule, Path};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn inset(&self, by: f64) -> Rect {
        Rect::new(
            self.x + by,
            self.y + by,
            (self.width - 2.0 * by).max(0.0),
            (self.height - 2.0 * by).max(0.0),
        )
    }
}

/// Closed polygon, points in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    fn to_path(&self) -> Path {
        let mut builder = Path::builder();
        let mut pts = self.points.iter();
        if let Some(first) = pts.next() {
            builder.begin(point(first.x as f32, first.y as f32));
            for p in pts {
                builder.line_to(point(p.x as f32, p.y as f32));
            }
            builder.end(true);
        }
        builder.build()
    }

    pub fn contains(&self, p: Point) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        hit_test_path(
            &point(p.x as f32, p.y as f32),
            self.to_path().iter(),
            FillRule::NonZero,
            0.01,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Region {
    Rect(Rect),
    Polygon(Polygon),
}

impl Region {
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Region::Rect(r) => r.contains(p),
            Region::Polygon(poly) => poly.contains(p),
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Region::Rect(r) => r.center(),
            Region::Polygon(poly) => {
                let n = poly.points.len().max(1) as f64;
                let (sx, sy) = poly
                    .points
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
                Point::new(sx / n, sy / n)
            }
        }
    }
}
