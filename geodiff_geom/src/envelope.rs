// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A resettable bounding rectangle with an explicit null state.

use kurbo::Rect;

/// Axis-aligned extent that may be null (covering nothing).
///
/// Unlike [`Rect`], an `Envelope` distinguishes "no extent yet" from a
/// degenerate rectangle, so a point at the origin is not confused with an
/// empty envelope. It is meant to be reused: expand it, read it, then
/// [`reset`](Envelope::reset) it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    rect: Option<Rect>,
}

impl Envelope {
    /// A null envelope.
    pub const fn new() -> Self {
        Self { rect: None }
    }

    /// An envelope covering `rect` (normalized so that `x0 <= x1`, `y0 <= y1`).
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            rect: Some(rect.abs()),
        }
    }

    /// True if nothing was added since creation or the last reset.
    pub fn is_null(&self) -> bool {
        self.rect.is_none()
    }

    /// The covered rectangle, if any.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Grow to include `rect`.
    pub fn expand_to_include(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.rect = Some(match self.rect {
            Some(cur) => cur.union(rect),
            None => rect,
        });
    }

    /// Grow to include a single point.
    pub fn expand_to_include_point(&mut self, x: f64, y: f64) {
        self.expand_to_include(Rect::new(x, y, x, y));
    }

    /// Grow to include another envelope. A null `other` is a no-op.
    pub fn expand_to_include_envelope(&mut self, other: &Self) {
        if let Some(r) = other.rect {
            self.expand_to_include(r);
        }
    }

    /// Make the envelope null again.
    pub fn reset(&mut self) {
        self.rect = None;
    }

    /// Width, or zero when null.
    pub fn width(&self) -> f64 {
        self.rect.map_or(0.0, |r| r.width())
    }

    /// Height, or zero when null.
    pub fn height(&self) -> f64 {
        self.rect.map_or(0.0, |r| r.height())
    }

    /// Whether `other` lies entirely inside this envelope (inclusive edges).
    pub fn covers(&self, other: Rect) -> bool {
        let other = other.abs();
        self.rect.is_some_and(|r| {
            r.x0 <= other.x0 && r.y0 <= other.y0 && other.x1 <= r.x1 && other.y1 <= r.y1
        })
    }
}

impl From<Rect> for Envelope {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}
