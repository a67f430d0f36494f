// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Growable, single-precision coordinate storage.

use core::fmt::Debug;

/// Number of points the accumulator can hold before its first reallocation.
pub const INITIAL_CAPACITY: usize = 100;

/// A growable buffer of 2D points stored as interleaved `f32` pairs.
///
/// Coordinates are narrowed to `f32` on insertion. This is meant for approximate
/// coverage geometry where hundreds of thousands of points may be collected; it
/// is not a lossless store for feature coordinates.
///
/// Capacity starts at [`INITIAL_CAPACITY`] points and doubles whenever it is
/// exhausted.
///
/// ```rust
/// use geodiff_geom::CoordAccumulator;
///
/// let mut acc = CoordAccumulator::new();
/// acc.add(1.0, 2.0);
/// acc.add(3.0, 4.0);
/// assert_eq!(acc.len(), 2);
/// assert_eq!(acc.get(1), (3.0, 4.0));
/// ```
///
/// Views borrow the accumulator, so it cannot grow while one is alive:
///
/// ```rust,compile_fail
/// use geodiff_geom::CoordAccumulator;
///
/// let mut acc = CoordAccumulator::new();
/// acc.add(1.0, 2.0);
/// let view = acc.view(0, 1);
/// acc.add(3.0, 4.0);
/// assert_eq!(view.len(), 1);
/// ```
#[derive(Clone, PartialEq)]
pub struct CoordAccumulator {
    /// x0, y0, x1, y1, ...
    data: Vec<f32>,
}

impl CoordAccumulator {
    /// Create an empty accumulator with room for [`INITIAL_CAPACITY`] points.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create an empty accumulator with room for `points` points.
    pub fn with_capacity(points: usize) -> Self {
        Self {
            data: Vec::with_capacity(points.max(1) * 2),
        }
    }

    /// Append a point.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Coordinates are stored in single precision on purpose."
    )]
    pub fn add(&mut self, x: f64, y: f64) {
        if self.data.len() == self.data.capacity() {
            // Double explicitly rather than rely on Vec's growth policy.
            let additional = self.data.capacity().max(2);
            self.data.reserve_exact(additional);
        }
        self.data.push(x as f32);
        self.data.push(y as f32);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.data.len() / 2
    }

    /// Alias of [`CoordAccumulator::len`].
    pub fn size(&self) -> usize {
        self.len()
    }

    /// True if no point was added.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of points that fit before the next reallocation.
    pub fn capacity(&self) -> usize {
        self.data.capacity() / 2
    }

    /// Coordinates of point `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> (f64, f64) {
        assert!(
            i < self.len(),
            "index {i} out of bounds for accumulator of {} points",
            self.len()
        );
        read_point(&self.data, i)
    }

    /// Coordinates of point `i`, or `None` if out of range.
    pub fn try_get(&self, i: usize) -> Option<(f64, f64)> {
        (i < self.len()).then(|| read_point(&self.data, i))
    }

    /// A borrowed view over points `from..to`.
    ///
    /// # Panics
    ///
    /// Panics if `from > to` or `to > self.len()`.
    pub fn view(&self, from: usize, to: usize) -> AccumulatorView<'_> {
        AccumulatorView::new(&self.data, from, to)
    }

    /// A view over every point.
    pub fn as_view(&self) -> AccumulatorView<'_> {
        AccumulatorView { data: &self.data }
    }

    /// Iterate over all points in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (f64, f64)> + '_ {
        self.as_view().into_iter()
    }

    /// Remove all points, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for CoordAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CoordAccumulator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CoordAccumulator")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl Extend<(f64, f64)> for CoordAccumulator {
    fn extend<I: IntoIterator<Item = (f64, f64)>>(&mut self, iter: I) {
        for (x, y) in iter {
            self.add(x, y);
        }
    }
}

/// A zero-copy view over a contiguous run of points of a [`CoordAccumulator`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AccumulatorView<'a> {
    data: &'a [f32],
}

impl<'a> AccumulatorView<'a> {
    fn new(data: &'a [f32], from: usize, to: usize) -> Self {
        let len = data.len() / 2;
        assert!(
            from <= to && to <= len,
            "view {from}..{to} out of bounds for {len} points"
        );
        Self {
            data: &data[from * 2..to * 2],
        }
    }

    /// Number of points in the view.
    pub fn len(&self) -> usize {
        self.data.len() / 2
    }

    /// True if the view holds no point.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coordinates of point `i`, relative to the start of the view.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> (f64, f64) {
        assert!(
            i < self.len(),
            "index {i} out of bounds for view of {} points",
            self.len()
        );
        read_point(self.data, i)
    }

    /// A narrower view sharing the same storage.
    ///
    /// # Panics
    ///
    /// Panics if `from > to` or `to > self.len()`.
    pub fn sub_view(&self, from: usize, to: usize) -> Self {
        Self::new(self.data, from, to)
    }
}

impl<'a> IntoIterator for AccumulatorView<'a> {
    type Item = (f64, f64);
    type IntoIter = ViewIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        ViewIter {
            chunks: self.data.chunks_exact(2),
        }
    }
}

/// Iterator over the points of an [`AccumulatorView`].
#[derive(Clone, Debug)]
pub struct ViewIter<'a> {
    chunks: core::slice::ChunksExact<'a, f32>,
}

impl Iterator for ViewIter<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks
            .next()
            .map(|c| (f64::from(c[0]), f64::from(c[1])))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for ViewIter<'_> {}

#[inline]
fn read_point(data: &[f32], i: usize) -> (f64, f64) {
    (f64::from(data[i * 2]), f64::from(data[i * 2 + 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_round_trips() {
        let mut acc = CoordAccumulator::new();
        acc.add(1.5, -2.25);
        acc.add(1000.125, 42.0);
        assert_eq!(acc.size(), 2);
        assert_eq!(acc.get(0), (1.5, -2.25));
        assert_eq!(acc.get(1), (1000.125, 42.0));
    }

    #[test]
    fn values_are_narrowed_to_f32() {
        let mut acc = CoordAccumulator::new();
        acc.add(0.1, 1.0e10 + 1.0);
        let (x, y) = acc.get(0);
        assert_eq!(x, f64::from(0.1_f32));
        assert!((y - (1.0e10 + 1.0)).abs() <= 1024.0, "f32 keeps ~7 digits");
    }

    #[test]
    fn capacity_starts_at_100_and_doubles() {
        let mut acc = CoordAccumulator::new();
        assert!(acc.capacity() >= INITIAL_CAPACITY);
        let initial = acc.capacity();
        for i in 0..initial {
            acc.add(i as f64, 0.0);
        }
        assert_eq!(acc.capacity(), initial, "no growth before the buffer is full");
        acc.add(0.0, 0.0);
        assert!(acc.capacity() >= initial * 2, "capacity doubles on overflow");
        assert_eq!(acc.len(), initial + 1);
    }

    #[test]
    fn view_shares_storage() {
        let mut acc = CoordAccumulator::new();
        for i in 0..10 {
            acc.add(i as f64, (i * 10) as f64);
        }
        let view = acc.view(3, 7);
        assert_eq!(view.len(), 4);
        assert_eq!(view.get(0), (3.0, 30.0));
        assert_eq!(view.get(3), (6.0, 60.0));
        let inner = view.sub_view(1, 2);
        assert_eq!(inner.len(), 1);
        assert_eq!(inner.get(0), (4.0, 40.0));
        let xs: Vec<f64> = view.into_iter().map(|(x, _)| x).collect();
        assert_eq!(xs, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn empty_view_at_end_is_allowed() {
        let mut acc = CoordAccumulator::new();
        acc.add(1.0, 1.0);
        assert!(acc.view(1, 1).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_out_of_range_panics() {
        let mut acc = CoordAccumulator::new();
        acc.add(1.0, 1.0);
        let _ = acc.get(1);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn view_out_of_range_panics() {
        let acc = CoordAccumulator::new();
        let _ = acc.view(0, 1);
    }

    #[test]
    fn try_get_checks_bounds() {
        let mut acc = CoordAccumulator::new();
        acc.add(2.0, 3.0);
        assert_eq!(acc.try_get(0), Some((2.0, 3.0)));
        assert_eq!(acc.try_get(1), None);
    }

    #[test]
    fn clone_is_deep() {
        let mut acc = CoordAccumulator::new();
        acc.add(1.0, 2.0);
        let copy = acc.clone();
        acc.add(3.0, 4.0);
        assert_eq!(copy.len(), 1);
        assert_eq!(acc.len(), 2);
        assert_eq!(copy.get(0), acc.get(0));
    }
}
