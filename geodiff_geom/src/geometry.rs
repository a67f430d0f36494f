// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The unioned result of a diff: [`DiffGeometry`].

use core::fmt;

use geo::{
    Coord, Geometry, GeometryCollection, Intersects, Line, MultiPoint, MultiPolygon, Point,
    Polygon, Relate, unary_union,
};
use kurbo::Rect;

use crate::point_set::PointSet;
use crate::shape::Shape;
use crate::util::{bounding_rect, rect_to_polygon};

/// The union of every accumulated change extent.
///
/// Holds, in order: the merged polygons, the line segments not covered by any
/// polygon, and a single multi-point of the remaining distinct points. The
/// value is immutable once built.
///
/// ```rust
/// use geodiff_geom::{DiffGeometry, PointSet, Shape};
/// use kurbo::Rect;
///
/// let mut points = PointSet::new();
/// points.add(50.0, 50.0);
/// points.add(11.0, 11.0); // inside the rectangle, absorbed
/// let shapes = vec![Shape::classify(Rect::new(10.0, 10.0, 12.0, 12.0))];
///
/// let g = DiffGeometry::union(points, shapes);
/// assert_eq!(g.polygons().count(), 1);
/// assert_eq!(g.points().count(), 1);
/// let env = g.envelope().unwrap();
/// assert!((env.x0 - 10.0).abs() < 1e-9 && (env.y1 - 50.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffGeometry {
    collection: GeometryCollection<f64>,
}

impl DiffGeometry {
    /// A geometry covering nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Union a point set and a list of shapes.
    ///
    /// Rectangles are merged with a single cascaded union. Lines and points
    /// already covered by the merged area are dropped, and duplicate points
    /// are collapsed. The cost grows with the total vertex count, so callers
    /// should accumulate everything first and union once.
    pub fn union(points: PointSet, shapes: Vec<Shape>) -> Self {
        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        let mut lines: Vec<Line<f64>> = Vec::new();
        let mut loose: Vec<Coord<f64>> = Vec::with_capacity(points.num_points());
        for shape in shapes {
            match shape {
                Shape::Rect(r) => polygons.push(rect_to_polygon(r)),
                Shape::Line(l) => lines.push(l),
                Shape::Point(c) => loose.push(c),
            }
        }
        loose.extend(points.coords());

        let areal: MultiPolygon<f64> = if polygons.is_empty() {
            MultiPolygon(Vec::new())
        } else {
            unary_union(&polygons)
        };
        let has_area = !areal.0.is_empty();

        lines.sort_by(|a, b| cmp_coord(a.start, b.start).then(cmp_coord(a.end, b.end)));
        lines.dedup();
        if has_area {
            lines.retain(|l| !areal.relate(l).is_covers());
        }

        loose.sort_by(|a, b| cmp_coord(*a, *b));
        loose.dedup();
        loose.retain(|c| {
            let p = Point::from(*c);
            !(has_area && areal.intersects(&p)) && !lines.iter().any(|l| l.intersects(&p))
        });

        let mut parts: Vec<Geometry<f64>> =
            Vec::with_capacity(areal.0.len() + lines.len() + usize::from(!loose.is_empty()));
        parts.extend(areal.0.into_iter().map(Geometry::Polygon));
        parts.extend(lines.into_iter().map(Geometry::Line));
        if !loose.is_empty() {
            parts.push(Geometry::MultiPoint(loose.into_iter().map(Point::from).collect()));
        }
        Self {
            collection: GeometryCollection(parts),
        }
    }

    /// True if the geometry covers nothing.
    pub fn is_empty(&self) -> bool {
        self.collection.0.is_empty()
    }

    /// Number of top-level parts (polygons, lines and at most one multi-point).
    pub fn num_parts(&self) -> usize {
        self.collection.0.len()
    }

    /// Bounding envelope, `None` when empty.
    pub fn envelope(&self) -> Option<Rect> {
        bounding_rect(&self.collection)
    }

    /// The underlying collection.
    pub fn geometry(&self) -> &GeometryCollection<f64> {
        &self.collection
    }

    /// Consume into a `geo` geometry.
    pub fn into_geometry(self) -> Geometry<f64> {
        Geometry::GeometryCollection(self.collection)
    }

    /// Merged polygons.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<f64>> + '_ {
        self.collection.0.iter().filter_map(|g| match g {
            Geometry::Polygon(p) => Some(p),
            _ => None,
        })
    }

    /// Line segments not covered by a polygon.
    pub fn lines(&self) -> impl Iterator<Item = &Line<f64>> + '_ {
        self.collection.0.iter().filter_map(|g| match g {
            Geometry::Line(l) => Some(l),
            _ => None,
        })
    }

    /// Distinct points not covered by a polygon or a line.
    pub fn points(&self) -> impl Iterator<Item = &Point<f64>> + '_ {
        self.collection
            .0
            .iter()
            .filter_map(|g| match g {
                Geometry::MultiPoint(mp) => Some(mp),
                _ => None,
            })
            .flat_map(|mp: &MultiPoint<f64>| mp.0.iter())
    }

    /// Well-known text, for diagnostics.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DiffGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("GEOMETRYCOLLECTION EMPTY");
        }
        f.write_str("GEOMETRYCOLLECTION (")?;
        for (i, g) in self.collection.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match g {
                Geometry::Polygon(p) => {
                    f.write_str("POLYGON (")?;
                    write_ring(f, p.exterior().0.iter().copied())?;
                    for hole in p.interiors() {
                        f.write_str(", ")?;
                        write_ring(f, hole.0.iter().copied())?;
                    }
                    f.write_str(")")?;
                }
                Geometry::Line(l) => {
                    f.write_str("LINESTRING ")?;
                    write_ring(f, [l.start, l.end].into_iter())?;
                }
                Geometry::MultiPoint(mp) => {
                    f.write_str("MULTIPOINT (")?;
                    for (j, p) in mp.0.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "({} {})", p.x(), p.y())?;
                    }
                    f.write_str(")")?;
                }
                _ => f.write_str("GEOMETRYCOLLECTION EMPTY")?,
            }
        }
        f.write_str(")")
    }
}

fn write_ring(f: &mut fmt::Formatter<'_>, coords: impl Iterator<Item = Coord<f64>>) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in coords.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{} {}", c.x, c.y)?;
    }
    f.write_str(")")
}

fn cmp_coord(a: Coord<f64>, b: Coord<f64>) -> core::cmp::Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn empty_inputs_give_empty_geometry() {
        let g = DiffGeometry::union(PointSet::new(), Vec::new());
        assert!(g.is_empty());
        assert_eq!(g.envelope(), None);
        assert_eq!(g.to_wkt(), "GEOMETRYCOLLECTION EMPTY");
    }

    #[test]
    fn overlapping_rects_merge() {
        let shapes = vec![
            Shape::classify(Rect::new(0.0, 0.0, 2.0, 2.0)),
            Shape::classify(Rect::new(1.0, 1.0, 3.0, 3.0)),
        ];
        let g = DiffGeometry::union(PointSet::new(), shapes);
        assert_eq!(g.polygons().count(), 1);
        let area: f64 = g.polygons().map(|p| p.unsigned_area()).sum();
        assert!((area - 7.0).abs() < 1e-9, "area was {area}");
    }

    #[test]
    fn disjoint_rects_stay_separate() {
        let shapes = vec![
            Shape::classify(Rect::new(0.0, 0.0, 1.0, 1.0)),
            Shape::classify(Rect::new(5.0, 5.0, 6.0, 6.0)),
        ];
        let g = DiffGeometry::union(PointSet::new(), shapes);
        assert_eq!(g.polygons().count(), 2);
        let env = g.envelope().unwrap();
        assert!((env.x0 - 0.0).abs() < 1e-9, "min x was {}", env.x0);
        assert!((env.x1 - 6.0).abs() < 1e-9, "max x was {}", env.x1);
    }

    #[test]
    fn covered_lines_and_points_are_absorbed() {
        let mut points = PointSet::new();
        points.add(1.0, 1.0);
        points.add(20.0, 20.0);
        points.add(20.0, 20.0);
        points.add(30.0, 35.0); // on the line below
        let shapes = vec![
            Shape::classify(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Shape::classify(Rect::new(2.0, 2.0, 2.0, 8.0)),
            Shape::classify(Rect::new(30.0, 30.0, 30.0, 40.0)),
        ];
        let g = DiffGeometry::union(points, shapes);
        assert_eq!(g.polygons().count(), 1);
        assert_eq!(g.lines().count(), 1);
        let pts: Vec<_> = g.points().copied().collect();
        assert_eq!(pts, [Point::new(20.0, 20.0)]);
    }

    #[test]
    fn rect_and_point_scenario() {
        let mut points = PointSet::new();
        points.add(50.0, 50.0);
        let shapes = vec![Shape::classify(Rect::new(10.0, 10.0, 12.0, 12.0))];
        let g = DiffGeometry::union(points, shapes);
        let polys: Vec<_> = g.polygons().collect();
        assert_eq!(polys.len(), 1);
        assert!((polys[0].unsigned_area() - 4.0).abs() < 1e-9, "2x2 rectangle");
        assert_eq!(g.points().copied().collect::<Vec<_>>(), [Point::new(50.0, 50.0)]);
        assert!(g.to_wkt().contains("MULTIPOINT ((50 50))"));
    }
}
