//! # Column Regions
//!
//! Rectangular sub-regions of a hunk's X/Z plane. Each region spans the
//! full height of the hunk. Regions produced by [`ColumnRegions`] tile the
//! plane without overlap.

use super::Extent;

/// A rectangle of columns inside a hunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRegion {
    /// Local X of the first column.
    pub x: usize,
    /// Local Z of the first column.
    pub z: usize,
    /// Number of columns along X.
    pub width: usize,
    /// Number of columns along Z.
    pub depth: usize,
}

impl ColumnRegion {
    /// Creates a region.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, z: usize, width: usize, depth: usize) -> Self {
        Self { x, z, width, depth }
    }

    /// The region covering every column of `extent`.
    #[inline]
    #[must_use]
    pub const fn full(extent: Extent) -> Self {
        Self::new(0, 0, extent.width, extent.depth)
    }

    /// Number of columns in the region.
    #[inline]
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.width * self.depth
    }

    /// Returns true if every column of the region lies inside `extent`.
    #[inline]
    #[must_use]
    pub const fn fits(&self, extent: Extent) -> bool {
        self.x + self.width <= extent.width && self.z + self.depth <= extent.depth
    }

    /// Iterates local `(x, z)` columns, X outer and Z inner.
    pub fn columns(self) -> impl Iterator<Item = (usize, usize)> {
        (self.x..self.x + self.width)
            .flat_map(move |x| (self.z..self.z + self.depth).map(move |z| (x, z)))
    }
}

/// Tiles a hunk's column plane into regions of at most `size x size`.
///
/// Edge regions are narrower when the extent is not a multiple of `size`.
#[derive(Clone, Debug)]
pub struct ColumnRegions {
    extent: Extent,
    size: usize,
    next_x: usize,
    next_z: usize,
}

impl ColumnRegions {
    /// Creates the tiling. A `size` of zero is treated as one.
    #[must_use]
    pub fn new(extent: Extent, size: usize) -> Self {
        Self {
            extent,
            size: size.max(1),
            next_x: 0,
            next_z: 0,
        }
    }
}

impl Iterator for ColumnRegions {
    type Item = ColumnRegion;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_x >= self.extent.width {
            return None;
        }

        let region = ColumnRegion::new(
            self.next_x,
            self.next_z,
            self.size.min(self.extent.width - self.next_x),
            self.size.min(self.extent.depth - self.next_z),
        );

        self.next_z += self.size;
        if self.next_z >= self.extent.depth {
            self.next_z = 0;
            self.next_x += self.size;
        }

        Some(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_regions_tile_exactly() {
        let extent = Extent::new(16, 4, 10);
        let regions: Vec<_> = ColumnRegions::new(extent, 8).collect();
        assert_eq!(regions.len(), 4);

        let mut seen = HashSet::new();
        for region in &regions {
            assert!(region.fits(extent));
            for column in region.columns() {
                assert!(seen.insert(column), "column {column:?} covered twice");
            }
        }
        assert_eq!(seen.len(), 16 * 10);
    }

    #[test]
    fn test_edge_regions_are_narrow() {
        let regions: Vec<_> = ColumnRegions::new(Extent::new(5, 1, 5), 4).collect();
        assert_eq!(regions[0], ColumnRegion::new(0, 0, 4, 4));
        assert_eq!(regions[1], ColumnRegion::new(0, 4, 4, 1));
        assert_eq!(regions[3], ColumnRegion::new(4, 4, 1, 1));
    }
}
