// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classification of extents into points, lines and rectangles.

use geo::{Coord, Geometry, Line};
use kurbo::Rect;

use crate::util::rect_to_polygon;

/// A single accumulated change extent, classified by its dimension.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    /// Zero width and zero height.
    Point(Coord<f64>),
    /// Exactly one of width/height is zero: a segment along the other axis.
    Line(Line<f64>),
    /// Positive width and height.
    Rect(Rect),
}

impl Shape {
    /// Classify an extent.
    ///
    /// ```rust
    /// use geodiff_geom::Shape;
    /// use kurbo::Rect;
    ///
    /// assert!(matches!(Shape::classify(Rect::new(5.0, 5.0, 5.0, 5.0)), Shape::Point(_)));
    /// assert!(matches!(Shape::classify(Rect::new(5.0, 5.0, 5.0, 9.0)), Shape::Line(_)));
    /// assert!(matches!(Shape::classify(Rect::new(5.0, 5.0, 9.0, 9.0)), Shape::Rect(_)));
    /// ```
    pub fn classify(extent: Rect) -> Self {
        let r = extent.abs();
        let zero_w = r.width() == 0.0;
        let zero_h = r.height() == 0.0;
        match (zero_w, zero_h) {
            (true, true) => Self::Point(Coord { x: r.x0, y: r.y0 }),
            // Zero-area rectangles would collapse under buffering; keep them as lines.
            (true, false) | (false, true) => Self::Line(Line::new(
                Coord { x: r.x0, y: r.y0 },
                Coord { x: r.x1, y: r.y1 },
            )),
            (false, false) => Self::Rect(r),
        }
    }

    /// The extent this shape covers.
    pub fn bounds(&self) -> Rect {
        match *self {
            Self::Point(c) => Rect::new(c.x, c.y, c.x, c.y),
            Self::Line(l) => Rect::new(l.start.x, l.start.y, l.end.x, l.end.y).abs(),
            Self::Rect(r) => r,
        }
    }

    /// Convert to a `geo` geometry.
    pub fn to_geometry(&self) -> Geometry<f64> {
        match *self {
            Self::Point(c) => Geometry::Point(c.into()),
            Self::Line(l) => Geometry::Line(l),
            Self::Rect(r) => Geometry::Polygon(rect_to_polygon(r)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_extent() {
        let s = Shape::classify(Rect::new(5.0, 5.0, 5.0, 5.0));
        assert_eq!(s, Shape::Point(Coord { x: 5.0, y: 5.0 }));
    }

    #[test]
    fn vertical_line_extent() {
        let s = Shape::classify(Rect::new(5.0, 5.0, 5.0, 9.0));
        assert_eq!(
            s,
            Shape::Line(Line::new(Coord { x: 5.0, y: 5.0 }, Coord { x: 5.0, y: 9.0 }))
        );
    }

    #[test]
    fn horizontal_line_extent() {
        let s = Shape::classify(Rect::new(1.0, 3.0, 7.0, 3.0));
        assert_eq!(
            s,
            Shape::Line(Line::new(Coord { x: 1.0, y: 3.0 }, Coord { x: 7.0, y: 3.0 }))
        );
    }

    #[test]
    fn rect_extent() {
        let s = Shape::classify(Rect::new(5.0, 5.0, 9.0, 9.0));
        assert_eq!(s, Shape::Rect(Rect::new(5.0, 5.0, 9.0, 9.0)));
        assert_eq!(s.bounds(), Rect::new(5.0, 5.0, 9.0, 9.0));
    }

    #[test]
    fn tall_thin_rect_is_not_a_line() {
        // Non-zero area with a large height must stay a rectangle.
        let s = Shape::classify(Rect::new(0.0, 0.0, 0.5, 100.0));
        assert!(matches!(s, Shape::Rect(_)));
    }
}
