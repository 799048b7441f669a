//! Cell, strip and depth data model plus the pure depth → geometry math.
//!
//! Nothing in here touches the ECS schedule: every function is deterministic
//! and safe to call from any number of parallel workers.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{CELL_SIZE, MAX_DEPTH};

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

/// Which side of a road segment a strip sits on, looking along the segment
/// from its start node to its end node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Unit normal pointing away from the road on this side.
    pub fn outward_normal(self, direction: Vec2) -> Vec2 {
        let left = direction.normalize_or_zero().perp();
        match self {
            Side::Left => left,
            Side::Right => -left,
        }
    }
}

/// Per-side zoning depth in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthPair {
    pub left: u8,
    pub right: u8,
}

impl DepthPair {
    /// Full depth on both sides: an unconfigured road.
    pub const DEFAULT: Self = Self {
        left: MAX_DEPTH,
        right: MAX_DEPTH,
    };
    /// No zoning on either side.
    pub const NONE: Self = Self { left: 0, right: 0 };

    /// Build a pair, clamping each side into `0..=MAX_DEPTH`.
    pub fn new(left: u8, right: u8) -> Self {
        Self {
            left: left.min(MAX_DEPTH),
            right: right.min(MAX_DEPTH),
        }
    }

    pub fn side(self, side: Side) -> u8 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }

    pub fn is_in_range(self) -> bool {
        self.left <= MAX_DEPTH && self.right <= MAX_DEPTH
    }

    /// Same pair with both sides clamped into range.
    pub fn clamped(self) -> Self {
        Self::new(self.left, self.right)
    }
}

impl Default for DepthPair {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ZoneType {
    #[default]
    None,
    ResidentialLow,
    ResidentialMedium,
    ResidentialHigh,
    CommercialLow,
    CommercialHigh,
    Industrial,
    Office,
    MixedUse,
}

impl ZoneType {
    pub fn is_zoned(self) -> bool {
        self != ZoneType::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneCell {
    /// A building or other player content stands on this cell.
    pub occupied: bool,
    pub zone: ZoneType,
}

/// Half-open rectangle of cell indices: `min` inclusive, `max` exclusive.
///
/// `x` runs along the road, `y` away from it (row 0 touches the road).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellRect {
    pub min: UVec2,
    pub max: UVec2,
}

impl CellRect {
    /// Rectangle anchored at the road edge covering `width × depth` cells.
    pub fn from_origin(width: u32, depth: u32) -> Self {
        Self {
            min: UVec2::ZERO,
            max: UVec2::new(width, depth),
        }
    }

    pub fn width(&self) -> u32 {
        self.max.x.saturating_sub(self.min.x)
    }

    pub fn depth(&self) -> u32 {
        self.max.y.saturating_sub(self.min.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.depth() == 0
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.min.x && x < self.max.x && y >= self.min.y && y < self.max.y
    }

    /// True if every cell of `other` is also inside `self`.
    pub fn contains_rect(&self, other: &CellRect) -> bool {
        other.is_empty()
            || (other.min.x >= self.min.x
                && other.min.y >= self.min.y
                && other.max.x <= self.max.x
                && other.max.y <= self.max.y)
    }

    /// Cells inside `self` but outside `other`, row by row.
    pub fn cells_outside(&self, other: CellRect) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.min.y..self.max.y)
            .flat_map(move |y| (self.min.x..self.max.x).map(move |x| (x, y)))
            .filter(move |&(x, y)| !other.contains(x, y))
    }
}

/// Backing cell grid of one strip: `width` cells along the road by
/// `MAX_DEPTH` cells away from it.
///
/// The host owns the cell contents (it flips occupancy and zone type); the
/// overlay engine only ever reads them.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct StripCells {
    pub width: u32,
    pub cells: Vec<ZoneCell>,
}

impl StripCells {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            cells: vec![ZoneCell::default(); width as usize * MAX_DEPTH as usize],
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < MAX_DEPTH as u32
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&ZoneCell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells.get(self.index(x, y))
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut ZoneCell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let idx = self.index(x, y);
        self.cells.get_mut(idx)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Placement of a strip for one depth value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StripGeometry {
    /// World-space center of the strip.
    pub position: Vec2,
    /// `x` = cells along the road, `y` = depth in cells.
    pub size: UVec2,
    /// Cells that are currently live zoning.
    pub valid: CellRect,
}

impl StripGeometry {
    pub fn depth(&self) -> u32 {
        self.valid.depth()
    }
}

/// Compute where a strip sits and which cells are live for a given depth.
///
/// `base_anchor` is the strip center at full depth. As the depth shrinks the
/// strip retreats toward the road by `(MAX_DEPTH - depth) / 2` cells, so its
/// road-side edge stays put.
pub fn compute_strip_geometry(
    base_anchor: Vec2,
    direction: Vec2,
    depth: u8,
    side: Side,
    width: u32,
) -> StripGeometry {
    let depth = depth.min(MAX_DEPTH);
    let inward = -side.outward_normal(direction);
    let retreat = f32::from(MAX_DEPTH - depth) * 0.5 * CELL_SIZE;
    StripGeometry {
        position: base_anchor + inward * retreat,
        size: UVec2::new(width, u32::from(depth)),
        valid: CellRect::from_origin(width, u32::from(depth)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_pair_clamps() {
        assert_eq!(DepthPair::new(9, 3), DepthPair { left: 6, right: 3 });
        assert!(DepthPair::default().is_default());
        assert!(!DepthPair { left: 7, right: 0 }.is_in_range());
    }

    #[test]
    fn test_outward_normals_are_opposite() {
        let dir = Vec2::new(10.0, 0.0);
        assert_eq!(Side::Left.outward_normal(dir), Vec2::new(0.0, 1.0));
        assert_eq!(Side::Right.outward_normal(dir), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_full_depth_keeps_anchor() {
        let anchor = Vec2::new(100.0, 40.0);
        let geom = compute_strip_geometry(anchor, Vec2::X, MAX_DEPTH, Side::Left, 5);
        assert_eq!(geom.position, anchor);
        assert_eq!(geom.size, UVec2::new(5, 6));
        assert_eq!(geom.valid, CellRect::from_origin(5, 6));
    }

    #[test]
    fn test_shrinking_retreats_toward_road() {
        let anchor = Vec2::new(0.0, 40.0);
        // Left of +X is +Y, so the road is below the anchor.
        let geom = compute_strip_geometry(anchor, Vec2::X, 2, Side::Left, 4);
        assert_eq!(geom.position, Vec2::new(0.0, 40.0 - 2.0 * CELL_SIZE));
        assert_eq!(geom.depth(), 2);

        let right = compute_strip_geometry(-anchor, Vec2::X, 2, Side::Right, 4);
        assert_eq!(right.position, Vec2::new(0.0, -40.0 + 2.0 * CELL_SIZE));
    }

    #[test]
    fn test_zero_depth_has_empty_valid_rect() {
        let geom = compute_strip_geometry(Vec2::ZERO, Vec2::Y, 0, Side::Right, 3);
        assert!(geom.valid.is_empty());
        assert_eq!(geom.size.y, 0);
    }

    #[test]
    fn test_depth_above_max_is_clamped() {
        let geom = compute_strip_geometry(Vec2::ZERO, Vec2::X, 200, Side::Left, 3);
        assert_eq!(geom.depth(), MAX_DEPTH as u32);
    }

    #[test]
    fn test_cells_outside() {
        let current = CellRect::from_origin(2, 3);
        let candidate = CellRect::from_origin(2, 1);
        let retracted: Vec<_> = current.cells_outside(candidate).collect();
        assert_eq!(retracted, vec![(0, 1), (1, 1), (0, 2), (1, 2)]);
        assert!(current.contains_rect(&candidate));
        assert!(!candidate.contains_rect(&current));
    }

    #[test]
    fn test_strip_cells_bounds() {
        let mut cells = StripCells::new(4);
        assert_eq!(cells.cells.len(), 4 * MAX_DEPTH as usize);
        assert!(cells.get(4, 0).is_none());
        assert!(cells.get(0, MAX_DEPTH as u32).is_none());
        if let Some(cell) = cells.get_mut(3, 5) {
            cell.occupied = true;
        }
        assert!(cells.get(3, 5).is_some_and(|c| c.occupied));
    }
}
