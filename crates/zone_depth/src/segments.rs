//! ECS components for road segments and the strips hanging off them.
//!
//! A segment is an entity the host's road editor spawns with a
//! `ZoningSegment`. The overlay attaches up to two strip entities to it (one
//! per side) and tracks the committed and preview depth as optional
//! components, so "no override" is simply the absence of `ZoneDepth`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{CELL_SIZE, MAX_DEPTH};
use crate::grid::{compute_strip_geometry, DepthPair, Side, StripGeometry};
use crate::roads::{RoadPrefab, RoadType};

/// Host-stable segment identifier (survives save/load, unlike `Entity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// A road network edge eligible for zoning control. Written by the host.
#[derive(Component, Debug, Clone)]
pub struct ZoningSegment {
    pub id: SegmentId,
    pub start: Vec2,
    pub end: Vec2,
    pub road_type: RoadType,
}

impl ZoningSegment {
    pub fn direction(&self) -> Vec2 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// Whole cells that fit along the segment.
    pub fn width_cells(&self) -> u32 {
        (self.length() / CELL_SIZE).floor() as u32
    }
}

/// Committed per-side depth. Absent means `DepthPair::DEFAULT`.
///
/// Removal (including despawn) is recorded in `RetiredDepths`, so a segment
/// that replaces this one can still inherit the value.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[component(on_remove = crate::propagation::retire_zone_depth)]
pub struct ZoneDepth(pub DepthPair);

/// Uncommitted depth shown while the tool hovers or selects the segment.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewDepth(pub DepthPair);

/// Strip entities owned by a segment.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStrips {
    pub left: Option<Entity>,
    pub right: Option<Entity>,
}

impl SegmentStrips {
    pub fn get(&self, side: Side) -> Option<Entity> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, strip: Option<Entity>) {
        match side {
            Side::Left => self.left = strip,
            Side::Right => self.right = strip,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Side, Entity)> + '_ {
        Side::BOTH
            .into_iter()
            .filter_map(|side| self.get(side).map(|strip| (side, strip)))
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Zonable geometry on one side of a segment.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Strip {
    pub side: Side,
    /// Strip center at full depth.
    pub base_anchor: Vec2,
    /// Unit vector along the owning road.
    pub direction: Vec2,
    /// Cells along the road. Fixed for the strip's lifetime.
    pub width: u32,
    pub geometry: StripGeometry,
}

impl Strip {
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    pub fn geometry_for(&self, depth: u8) -> StripGeometry {
        compute_strip_geometry(self.base_anchor, self.direction, depth, self.side, self.width)
    }
}

/// Back-reference from a strip to the segment that owns it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripOwner(pub Entity);

/// The strip's geometry must be recomputed this cycle.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct StripDirty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureChange {
    Created,
    Upgraded,
}

/// Segment waiting for the propagation pass this tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPropagation {
    pub template: Option<Entity>,
    /// Template depth resolved at intake, used when the template is gone by
    /// the time the pass runs.
    pub template_depth: Option<DepthPair>,
    pub kind: StructureChange,
}

/// Everything needed to spawn (or re-anchor) one strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripBlueprint {
    pub side: Side,
    pub base_anchor: Vec2,
    pub direction: Vec2,
    pub width: u32,
}

impl StripBlueprint {
    /// Strip component at full depth.
    pub fn to_strip(self) -> Strip {
        Strip {
            side: self.side,
            base_anchor: self.base_anchor,
            direction: self.direction,
            width: self.width,
            geometry: compute_strip_geometry(
                self.base_anchor,
                self.direction,
                MAX_DEPTH,
                self.side,
                self.width,
            ),
        }
    }
}

/// Lay out the strips for a segment. Empty for non-zonable roads and for
/// segments too short to hold a single cell.
pub fn strip_blueprints(segment: &ZoningSegment, prefab: RoadPrefab) -> Vec<StripBlueprint> {
    let width = segment.width_cells();
    if !prefab.zonable || width == 0 {
        return Vec::new();
    }
    let direction = segment.direction();
    let offset = prefab.half_width + f32::from(MAX_DEPTH) * 0.5 * CELL_SIZE;
    Side::BOTH
        .into_iter()
        .map(|side| StripBlueprint {
            side,
            base_anchor: segment.midpoint() + side.outward_normal(direction) * offset,
            direction,
            width,
        })
        .collect()
}

/// Preview wins over committed; no override means the default.
pub fn effective_depth(committed: Option<&ZoneDepth>, preview: Option<&PreviewDepth>) -> DepthPair {
    preview
        .map(|p| p.0)
        .or(committed.map(|c| c.0))
        .unwrap_or(DepthPair::DEFAULT)
}
