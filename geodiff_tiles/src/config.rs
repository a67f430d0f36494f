// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable configuration of grids, layers and the planner.

use std::collections::BTreeSet;

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::grid::{GridSet, Srs};

/// Name of the parameter selecting a style.
pub const STYLES_PARAMETER: &str = "STYLES";

fn to_rect([x0, y0, x1, y1]: [f64; 4]) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

/// Definition of a [`GridSet`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSetConfig {
    /// Unique name.
    pub name: String,
    /// EPSG code of the grid's coordinate system.
    pub srs: Srs,
    /// `[min_x, min_y, max_x, max_y]` in grid coordinates.
    pub extent: [f64; 4],
    /// Tile width in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_width: u32,
    /// Tile height in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_height: u32,
    /// Map units per pixel of each zoom level, coarsest first.
    pub resolutions: Vec<f64>,
}

fn default_tile_size() -> u32 {
    256
}

impl GridSetConfig {
    /// Validate into a [`GridSet`].
    pub fn build(&self) -> Result<GridSet, PlanError> {
        GridSet::new(
            self.name.clone(),
            self.srs,
            to_rect(self.extent),
            self.tile_width,
            self.tile_height,
            self.resolutions.clone(),
        )
    }
}

/// The cached part of a grid set, as configured on a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSubsetConfig {
    /// Name of the grid set.
    pub gridset: String,
    /// First cached zoom level, the grid set's first when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_start: Option<usize>,
    /// Last cached zoom level, the grid set's last when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_stop: Option<usize>,
    /// Cached extent in grid coordinates, the grid set's extent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<[f64; 4]>,
}

impl GridSubsetConfig {
    /// Cache every level and the whole extent of `gridset`.
    pub fn full(gridset: impl Into<String>) -> Self {
        Self {
            gridset: gridset.into(),
            zoom_start: None,
            zoom_stop: None,
            extent: None,
        }
    }

    /// The configured extent.
    pub fn extent_rect(&self) -> Option<Rect> {
        self.extent.map(to_rect)
    }
}

/// A parameter whose values are cached separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFilterConfig {
    /// Parameter name, compared case-insensitively.
    pub key: String,
    /// Value used when a request does not set the parameter.
    #[serde(default)]
    pub default_value: String,
    /// Other values that are cached.
    #[serde(default)]
    pub legal_values: Vec<String>,
}

/// A cached layer.
///
/// ```rust
/// use geodiff_tiles::LayerConfig;
///
/// let layer = LayerConfig::from_json(r#"{
///     "name": "topp:roads",
///     "srs": 4326,
///     "default_style": "line",
///     "parameter_filters": [
///         { "key": "STYLES", "default_value": "line", "legal_values": ["dashed"] }
///     ],
///     "grid_subsets": [{ "gridset": "EPSG:4326", "zoom_stop": 12 }],
///     "formats": ["image/png", "image/jpeg"]
/// }"#).unwrap();
///
/// assert_eq!(layer.cached_styles().into_iter().collect::<Vec<_>>(), ["dashed", "line"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Layer name, carried by every task.
    pub name: String,
    /// Coordinate system of the layer's data, and of its diff geometries.
    pub srs: Srs,
    /// Style used when a request names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_style: Option<String>,
    /// Cached parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_filters: Vec<ParameterFilterConfig>,
    /// Grids the layer is cached on.
    pub grid_subsets: Vec<GridSubsetConfig>,
    /// Cached output formats.
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

fn default_formats() -> Vec<String> {
    vec!["image/png".to_owned()]
}

impl LayerConfig {
    /// A layer with one default format and no styles or grids.
    pub fn new(name: impl Into<String>, srs: Srs) -> Self {
        Self {
            name: name.into(),
            srs,
            default_style: None,
            parameter_filters: Vec::new(),
            grid_subsets: Vec::new(),
            formats: default_formats(),
        }
    }

    /// Parse a layer from JSON.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let layer: Self = serde_json::from_str(json)?;
        if layer.formats.is_empty() {
            return Err(PlanError::InvalidConfig(format!(
                "layer '{}' caches no format",
                layer.name
            )));
        }
        Ok(layer)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Names of the cached styles: the default style plus the default and legal
    /// values of the `STYLES` parameter filter. Never empty: a layer without
    /// any caches the unnamed style `""`.
    pub fn cached_styles(&self) -> BTreeSet<String> {
        let mut styles = BTreeSet::new();
        if let Some(style) = &self.default_style {
            styles.insert(style.clone());
        }
        if let Some(filter) = self
            .parameter_filters
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(STYLES_PARAMETER))
        {
            styles.insert(filter.default_value.clone());
            styles.extend(filter.legal_values.iter().cloned());
        }
        if styles.is_empty() {
            styles.insert(String::new());
        }
        styles
    }

    /// Whether `style` is served without a `STYLES` parameter.
    pub fn is_default_style(&self, style: &str) -> bool {
        style.is_empty() || self.default_style.as_deref() == Some(style)
    }
}

/// Tunables of the [`InvalidationPlanner`](crate::InvalidationPlanner).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Finest zoom level whose resolution sizes the buffer.
    pub max_buffer_zoom: usize,
    /// Buffer distance, in tiles of the buffer zoom level.
    pub buffer_tiles: f64,
    /// Longest mitre of a buffered corner, as a multiple of the buffer
    /// distance. Corners needing a longer mitre are bevelled. A right angle
    /// needs `sqrt(2)`.
    pub max_mitre_ratio: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_buffer_zoom: 18,
            buffer_tiles: 2.0,
            max_mitre_ratio: 5.0,
        }
    }
}
