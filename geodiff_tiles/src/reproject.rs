// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Moving geometries between coordinate systems.

use core::f64::consts::PI;
use core::fmt;
use std::sync::Arc;

use geo::{Coord, Geometry, MapCoords};
use hashbrown::HashMap;

use crate::error::PlanError;
use crate::grid::Srs;

/// Transforms geometries from one coordinate system to another.
pub trait Reprojector {
    /// `geometry` expressed in `to`. Equal systems must return the geometry unchanged.
    fn reproject(
        &self,
        geometry: &Geometry<f64>,
        from: Srs,
        to: Srs,
    ) -> Result<Geometry<f64>, PlanError>;
}

impl<R: Reprojector + ?Sized> Reprojector for &R {
    fn reproject(
        &self,
        geometry: &Geometry<f64>,
        from: Srs,
        to: Srs,
    ) -> Result<Geometry<f64>, PlanError> {
        (**self).reproject(geometry, from, to)
    }
}

type CoordFn = Arc<dyn Fn(Coord<f64>) -> Coord<f64> + Send + Sync>;

/// A [`Reprojector`] built from registered per-coordinate functions.
///
/// ```rust
/// use geo::{Geometry, Point};
/// use geodiff_tiles::{Reprojector, Srs, TransformRegistry};
///
/// let registry = TransformRegistry::with_web_mercator();
/// let p = Geometry::Point(Point::new(180.0, 0.0));
/// let Geometry::Point(m) = registry.reproject(&p, Srs::WGS84, Srs::WEB_MERCATOR).unwrap() else {
///     unreachable!()
/// };
/// assert!((m.x() - 20_037_508.342_789_244).abs() < 1e-6);
/// assert!(registry.reproject(&p, Srs::WGS84, Srs::epsg(2154)).is_err());
/// ```
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<(Srs, Srs), CoordFn>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self.transforms.keys().collect();
        pairs.sort();
        f.debug_struct("TransformRegistry")
            .field("transforms", &pairs)
            .finish()
    }
}

/// Semi-major axis of the spherical mercator projection.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude beyond which web mercator is undefined in practice.
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

impl TransformRegistry {
    /// A registry knowing only identity transforms.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with WGS 84 to web mercator and back.
    pub fn with_web_mercator() -> Self {
        let mut registry = Self::new();
        registry
            .register(Srs::WGS84, Srs::WEB_MERCATOR, |c| {
                let lat = c.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
                Coord {
                    x: c.x.to_radians() * EARTH_RADIUS,
                    y: (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS,
                }
            })
            .register(Srs::WEB_MERCATOR, Srs::WGS84, |c| Coord {
                x: (c.x / EARTH_RADIUS).to_degrees(),
                y: (2.0 * (c.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
            });
        registry
    }

    /// Register the transform from `from` to `to`, replacing any previous one.
    pub fn register(
        &mut self,
        from: Srs,
        to: Srs,
        f: impl Fn(Coord<f64>) -> Coord<f64> + Send + Sync + 'static,
    ) -> &mut Self {
        self.transforms.insert((from, to), Arc::new(f));
        self
    }

    /// Whether geometries can be moved from `from` to `to`.
    pub fn supports(&self, from: Srs, to: Srs) -> bool {
        from == to || self.transforms.contains_key(&(from, to))
    }
}

impl Reprojector for TransformRegistry {
    fn reproject(
        &self,
        geometry: &Geometry<f64>,
        from: Srs,
        to: Srs,
    ) -> Result<Geometry<f64>, PlanError> {
        if from == to {
            return Ok(geometry.clone());
        }
        let f = self
            .transforms
            .get(&(from, to))
            .ok_or(PlanError::Reprojection { from, to })?;
        Ok(geometry.map_coords(|c| f(c)))
    }
}
