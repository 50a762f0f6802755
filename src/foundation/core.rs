use crate::foundation::error::{MosaicError, MosaicResult};

/// Integer pixel rectangle: origin plus extent.
///
/// Covers the half-open ranges `[x, x + width)` and `[y, y + height)`. A rectangle with zero
/// width or height is empty.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle from origin and extent.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive).
    pub fn right(self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Bottom edge (exclusive).
    pub fn bottom(self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Number of pixels covered.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Return `true` when pixel `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && i64::from(x) < self.right()
            && i64::from(y) < self.bottom()
    }

    /// Return `true` when `other` lies entirely inside `self`. Empty rectangles are contained
    /// everywhere.
    pub fn contains_rect(self, other: Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection of two rectangles; empty when they do not overlap.
    pub fn intersect(self, other: Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if i64::from(x0) >= x1 || i64::from(y0) >= y1 {
            return Rect::new(x0, y0, 0, 0);
        }
        Rect::new(
            x0,
            y0,
            (x1 - i64::from(x0)) as u32,
            (y1 - i64::from(y0)) as u32,
        )
    }

    /// Return `true` when the two rectangles share at least one pixel.
    pub fn intersects(self, other: Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both. Empty inputs are ignored.
    pub fn union(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(
            x0,
            y0,
            (x1 - i64::from(x0)).min(i64::from(u32::MAX)) as u32,
            (y1 - i64::from(y0)).min(i64::from(u32::MAX)) as u32,
        )
    }

    /// Offset of pixel `(x, y)` relative to the origin, or `None` when outside.
    pub fn local(self, x: i32, y: i32) -> Option<(usize, usize)> {
        if !self.contains(x, y) {
            return None;
        }
        Some((
            (i64::from(x) - i64::from(self.x)) as usize,
            (i64::from(y) - i64::from(self.y)) as usize,
        ))
    }
}

/// Regular tiling of a destination rectangle.
///
/// Tiles are anchored at the bounds origin; the last column and row are clipped to the bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    bounds: Rect,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    /// Create a validated grid with non-zero tile dimensions.
    pub fn new(bounds: Rect, tile_width: u32, tile_height: u32) -> MosaicResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(MosaicError::validation("tile width/height must be > 0"));
        }
        Ok(Self {
            bounds,
            tile_width,
            tile_height,
        })
    }

    /// Rectangle tiled by this grid.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of tile columns.
    pub fn columns(&self) -> u32 {
        self.bounds.width.div_ceil(self.tile_width)
    }

    /// Number of tile rows.
    pub fn rows(&self) -> u32 {
        self.bounds.height.div_ceil(self.tile_height)
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Return `true` when the grid holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rectangle of tile `(col, row)`, clipped to the bounds.
    pub fn tile(&self, col: u32, row: u32) -> Rect {
        let x = i64::from(self.bounds.x) + i64::from(col) * i64::from(self.tile_width);
        let y = i64::from(self.bounds.y) + i64::from(row) * i64::from(self.tile_height);
        let w = (self.bounds.right() - x).min(i64::from(self.tile_width)).max(0);
        let h = (self.bounds.bottom() - y).min(i64::from(self.tile_height)).max(0);
        Rect::new(x as i32, y as i32, w as u32, h as u32)
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Rect> + '_ {
        let cols = self.columns();
        (0..self.rows()).flat_map(move |row| (0..cols).map(move |col| self.tile(col, row)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
