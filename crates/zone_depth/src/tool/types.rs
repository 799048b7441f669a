use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::MAX_DEPTH;
use crate::grid::DepthPair;

bitflags! {
    /// Which sides of a road the tool zones.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SideMask: u8 {
        const LEFT  = 0b01;
        const RIGHT = 0b10;
        const BOTH  = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl SideMask {
    /// Flip every side: `BOTH` and `empty()` swap, as do `LEFT` and `RIGHT`.
    pub fn invert(self) -> Self {
        self.complement()
    }
}

impl Default for SideMask {
    fn default() -> Self {
        SideMask::BOTH
    }
}

/// The depth the tool applies, as configured by the player.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneToolConfig {
    pub sides: SideMask,
    pub depth: u8,
}

impl Default for ZoneToolConfig {
    fn default() -> Self {
        Self {
            sides: SideMask::BOTH,
            depth: MAX_DEPTH,
        }
    }
}

impl ZoneToolConfig {
    /// Per-side depth: `depth` where the side's bit is set, else 0.
    pub fn tool_depth(&self) -> DepthPair {
        let depth = self.depth.min(MAX_DEPTH);
        let pick = |side: SideMask| if self.sides.contains(side) { depth } else { 0 };
        DepthPair::new(pick(SideMask::LEFT), pick(SideMask::RIGHT))
    }
}

/// Debounced tool input, at most one of each kind per tick.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneToolInput {
    /// The pointer now rests on this segment, or on nothing.
    PointerMoved(Option<Entity>),
    PrimaryPressed,
    PrimaryReleased,
    InvertRequested,
    ToolToggled { enabled: bool },
    /// Change the tool's sides and depth. Out-of-range depths are clamped.
    Configure { sides: SideMask, depth: i32 },
}

/// Where the tool's interaction currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolPhase {
    #[default]
    Idle,
    /// The pointer rests on a qualifying segment that shows a hover preview.
    Hovering(Entity),
    /// Primary button held; segments the pointer crosses join the selection.
    Selecting,
    /// Released over the selection; previews are committed on settle.
    Applying,
    /// Released elsewhere; previews are discarded on settle.
    Cancelling,
}

/// Segment highlight state for the host renderer.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightedSegments {
    pub hovered: Option<Entity>,
    pub selected: Vec<Entity>,
}
