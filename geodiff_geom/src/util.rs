// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between kurbo rectangles and `geo` geometries.

use geo::{BoundingRect, Coord, Polygon};
use kurbo::Rect;

/// Closed, counter-clockwise polygon for an axis-aligned rectangle.
pub fn rect_to_polygon(r: Rect) -> Polygon<f64> {
    geo::Rect::new(Coord { x: r.x0, y: r.y0 }, Coord { x: r.x1, y: r.y1 }).to_polygon()
}

/// Bounding rectangle of any `geo` geometry as a kurbo [`Rect`].
pub fn bounding_rect<G>(g: &G) -> Option<Rect>
where
    G: BoundingRect<f64>,
    G::Output: Into<Option<geo::Rect<f64>>>,
{
    let r: Option<geo::Rect<f64>> = g.bounding_rect().into();
    r.map(|r| Rect::new(r.min().x, r.min().y, r.max().x, r.max().y))
}
