//! Query and tick methods for `TestOverlay`.

use bevy::prelude::*;

use crate::activation::OverlayActivation;
use crate::grid::{DepthPair, Side, StripGeometry};
use crate::mutation::ZoneDepthStats;
use crate::segments::{
    effective_depth, PreviewDepth, SegmentStrips, Strip, StripDirty, ZoneDepth,
};
use crate::tool::{HighlightedSegments, ZoneToolState};

use super::TestOverlay;

impl TestOverlay {
    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Run N full `Update` passes.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    // -----------------------------------------------------------------------
    // World access
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn stats(&self) -> &ZoneDepthStats {
        self.resource::<ZoneDepthStats>()
    }

    pub fn activation(&self) -> OverlayActivation {
        *self.resource::<OverlayActivation>()
    }

    pub fn tool(&self) -> &ZoneToolState {
        self.resource::<ZoneToolState>()
    }

    pub fn highlights(&self) -> &HighlightedSegments {
        self.resource::<HighlightedSegments>()
    }

    // -----------------------------------------------------------------------
    // Segments
    // -----------------------------------------------------------------------

    /// Stored committed depth; `None` means no override.
    pub fn committed_depth(&self, segment: Entity) -> Option<DepthPair> {
        self.world().get::<ZoneDepth>(segment).map(|d| d.0)
    }

    pub fn preview_depth(&self, segment: Entity) -> Option<DepthPair> {
        self.world().get::<PreviewDepth>(segment).map(|d| d.0)
    }

    pub fn effective_depth(&self, segment: Entity) -> DepthPair {
        effective_depth(
            self.world().get::<ZoneDepth>(segment),
            self.world().get::<PreviewDepth>(segment),
        )
    }

    // -----------------------------------------------------------------------
    // Strips
    // -----------------------------------------------------------------------

    pub fn strip(&self, segment: Entity, side: Side) -> Option<Entity> {
        self.world()
            .get::<SegmentStrips>(segment)
            .and_then(|strips| strips.get(side))
    }

    pub fn strip_geometry(&self, segment: Entity, side: Side) -> Option<StripGeometry> {
        let strip = self.strip(segment, side)?;
        self.world().get::<Strip>(strip).map(|s| s.geometry)
    }

    /// Depth of the strip's valid rectangle.
    pub fn strip_depth(&self, segment: Entity, side: Side) -> Option<u32> {
        self.strip_geometry(segment, side).map(|g| g.depth())
    }

    pub fn strip_count(&mut self) -> usize {
        self.world_mut().query::<&Strip>().iter(self.world()).count()
    }

    pub fn dirty_strip_count(&mut self) -> usize {
        self.world_mut()
            .query_filtered::<(), With<StripDirty>>()
            .iter(self.world())
            .count()
    }
}
