//! Deferred mutation log and the commit barrier that applies it.
//!
//! Producers (tool input, propagation, synchronization) never write segment
//! or strip state directly. They append `ZoneMutation` records to the
//! `MutationLog`; the parallel passes collect into per-thread buffers first
//! and hand a sorted batch to the log once every worker has finished.
//!
//! `apply_mutation_log` is an exclusive system scheduled at each barrier
//! point (see `ZoneDepthSet`). It drains the log in order and applies each
//! record to the `World`. Records whose target entity has disappeared in the
//! meantime are dropped with a debug log; this is routine when the host
//! despawns a segment during the tick.

use bevy::prelude::*;

use crate::grid::{DepthPair, StripCells, StripGeometry};
use crate::segments::{
    PendingPropagation, PreviewDepth, SegmentStrips, Strip, StripBlueprint, StripDirty,
    StripOwner, StructureChange, ZoneDepth, ZoningSegment,
};

// =============================================================================
// Records
// =============================================================================

/// One deferred write into segment or strip state.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneMutation {
    /// Show an uncommitted depth on a segment.
    SetPreview { segment: Entity, depth: DepthPair },
    /// Drop the segment's preview, reverting to its committed depth.
    ClearPreview { segment: Entity },
    /// Copy the segment's preview into its committed depth and drop the preview.
    CommitPreview { segment: Entity },
    /// Set the committed depth directly. The default removes the component.
    AssignDepth { segment: Entity, depth: DepthPair },
    /// Queue a segment for this tick's propagation pass.
    BeginPropagation {
        segment: Entity,
        template: Option<Entity>,
        template_depth: Option<DepthPair>,
        kind: StructureChange,
    },
    FinishPropagation { segment: Entity },
    /// Spawn strips for the sides the segment does not have yet.
    AttachStrips {
        segment: Entity,
        blueprints: Vec<StripBlueprint>,
    },
    /// Move a strip to a new full-depth anchor, keeping its cells.
    RebaseStrip {
        strip: Entity,
        base_anchor: Vec2,
        direction: Vec2,
    },
    /// Despawn every strip of a segment.
    DetachStrips { segment: Entity },
    DespawnStrip { strip: Entity },
    MarkSegmentDirty { segment: Entity },
    MarkStripDirty { strip: Entity },
    /// Accept a recomputed geometry and clear the dirty marker.
    SetStripGeometry {
        strip: Entity,
        geometry: StripGeometry,
    },
    /// A shrink was refused by the conflict policy; keep the geometry.
    KeepStripGeometry { strip: Entity },
    /// Geometry already matches; just clear the dirty marker.
    ClearStripDirty { strip: Entity },
}

impl ZoneMutation {
    /// Entity the record writes to. Used to order parallel output.
    pub fn target(&self) -> Entity {
        match self {
            ZoneMutation::SetPreview { segment, .. }
            | ZoneMutation::ClearPreview { segment }
            | ZoneMutation::CommitPreview { segment }
            | ZoneMutation::AssignDepth { segment, .. }
            | ZoneMutation::BeginPropagation { segment, .. }
            | ZoneMutation::FinishPropagation { segment }
            | ZoneMutation::AttachStrips { segment, .. }
            | ZoneMutation::DetachStrips { segment }
            | ZoneMutation::MarkSegmentDirty { segment } => *segment,
            ZoneMutation::RebaseStrip { strip, .. }
            | ZoneMutation::DespawnStrip { strip }
            | ZoneMutation::MarkStripDirty { strip }
            | ZoneMutation::SetStripGeometry { strip, .. }
            | ZoneMutation::KeepStripGeometry { strip }
            | ZoneMutation::ClearStripDirty { strip } => *strip,
        }
    }
}

/// Sort a batch produced by parallel workers into a stable order.
///
/// Records for different targets are independent, so any fixed order works;
/// the sort is stable, so records for one target keep their emission order.
pub fn sort_for_commit(batch: &mut [ZoneMutation]) {
    batch.sort_by_key(ZoneMutation::target);
}

// =============================================================================
// Resources
// =============================================================================

/// Append-only list of mutations waiting for the next barrier.
#[derive(Resource, Debug, Default)]
pub struct MutationLog {
    pending: Vec<ZoneMutation>,
}

impl MutationLog {
    pub fn push(&mut self, mutation: ZoneMutation) {
        self.pending.push(mutation);
    }

    pub fn extend(&mut self, mutations: impl IntoIterator<Item = ZoneMutation>) {
        self.pending.extend(mutations);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain everything queued so far, in insertion order.
    pub fn take(&mut self) -> Vec<ZoneMutation> {
        std::mem::take(&mut self.pending)
    }
}

/// Counters for the overlay engine, per tick and cumulative.
#[derive(Resource, Debug, Default, Clone)]
pub struct ZoneDepthStats {
    pub applied_this_tick: u32,
    pub rejected_this_tick: u32,
    pub faults_this_tick: u32,
    pub clamped_this_tick: u32,
    pub total_applied: u64,
    pub total_rejected: u64,
    pub total_faults: u64,
    pub total_clamped: u64,
}

impl ZoneDepthStats {
    pub fn begin_tick(&mut self) {
        self.applied_this_tick = 0;
        self.rejected_this_tick = 0;
        self.faults_this_tick = 0;
        self.clamped_this_tick = 0;
    }

    pub fn record_applied(&mut self, n: u32) {
        self.applied_this_tick += n;
        self.total_applied += u64::from(n);
    }

    pub fn record_rejected(&mut self, n: u32) {
        self.rejected_this_tick += n;
        self.total_rejected += u64::from(n);
    }

    pub fn record_faults(&mut self, n: u32) {
        self.faults_this_tick += n;
        self.total_faults += u64::from(n);
    }

    pub fn record_clamped(&mut self, n: u32) {
        self.clamped_this_tick += n;
        self.total_clamped += u64::from(n);
    }
}

pub fn reset_tick_stats(mut stats: ResMut<ZoneDepthStats>) {
    stats.begin_tick();
}

// =============================================================================
// Commit barrier
// =============================================================================

/// Exclusive system: apply every queued mutation in order.
pub fn apply_mutation_log(world: &mut World) {
    let mutations = world.resource_mut::<MutationLog>().take();
    if mutations.is_empty() {
        return;
    }

    let mut applied = 0u32;
    let mut rejected = 0u32;
    for mutation in &mutations {
        if apply_mutation(world, mutation) {
            applied += 1;
            if matches!(mutation, ZoneMutation::KeepStripGeometry { .. }) {
                rejected += 1;
            }
        }
    }

    let mut stats = world.resource_mut::<ZoneDepthStats>();
    stats.record_applied(applied);
    stats.record_rejected(rejected);
}

/// Apply a single record. Returns `false` if it had no effect (stale target
/// or nothing to change).
pub fn apply_mutation(world: &mut World, mutation: &ZoneMutation) -> bool {
    let target = mutation.target();
    let alive = match mutation {
        ZoneMutation::RebaseStrip { .. }
        | ZoneMutation::DespawnStrip { .. }
        | ZoneMutation::MarkStripDirty { .. }
        | ZoneMutation::SetStripGeometry { .. }
        | ZoneMutation::KeepStripGeometry { .. }
        | ZoneMutation::ClearStripDirty { .. } => world.get::<Strip>(target).is_some(),
        _ => world.get::<ZoningSegment>(target).is_some(),
    };
    if !alive {
        debug!("zone depth: dropping {mutation:?}, target {target} is gone");
        return false;
    }

    match mutation {
        ZoneMutation::SetPreview { segment, depth } => {
            world
                .entity_mut(*segment)
                .insert(PreviewDepth(depth.clamped()));
            mark_segment_dirty(world, *segment);
        }
        ZoneMutation::ClearPreview { segment } => {
            if world.get::<PreviewDepth>(*segment).is_none() {
                return false;
            }
            world.entity_mut(*segment).remove::<PreviewDepth>();
            mark_segment_dirty(world, *segment);
        }
        ZoneMutation::CommitPreview { segment } => {
            let Some(preview) = world.get::<PreviewDepth>(*segment).copied() else {
                return false;
            };
            world.entity_mut(*segment).remove::<PreviewDepth>();
            set_committed(world, *segment, preview.0);
            mark_segment_dirty(world, *segment);
        }
        ZoneMutation::AssignDepth { segment, depth } => {
            set_committed(world, *segment, *depth);
            mark_segment_dirty(world, *segment);
        }
        ZoneMutation::BeginPropagation {
            segment,
            template,
            template_depth,
            kind,
        } => {
            world.entity_mut(*segment).insert(PendingPropagation {
                template: *template,
                template_depth: *template_depth,
                kind: *kind,
            });
        }
        ZoneMutation::FinishPropagation { segment } => {
            world.entity_mut(*segment).remove::<PendingPropagation>();
        }
        ZoneMutation::AttachStrips {
            segment,
            blueprints,
        } => {
            let mut strips = world
                .get::<SegmentStrips>(*segment)
                .copied()
                .unwrap_or_default();
            let mut spawned = 0;
            for blueprint in blueprints {
                if strips.get(blueprint.side).is_some() {
                    continue;
                }
                let strip = world
                    .spawn((
                        blueprint.to_strip(),
                        StripCells::new(blueprint.width),
                        StripOwner(*segment),
                        StripDirty,
                    ))
                    .id();
                strips.set(blueprint.side, Some(strip));
                spawned += 1;
            }
            if spawned == 0 {
                return false;
            }
            world.entity_mut(*segment).insert(strips);
        }
        ZoneMutation::RebaseStrip {
            strip,
            base_anchor,
            direction,
        } => {
            if let Some(mut s) = world.get_mut::<Strip>(*strip) {
                s.base_anchor = *base_anchor;
                s.direction = *direction;
            }
            world.entity_mut(*strip).insert(StripDirty);
        }
        ZoneMutation::DetachStrips { segment } => {
            let Some(strips) = world.get::<SegmentStrips>(*segment).copied() else {
                return false;
            };
            for (_, strip) in strips.iter() {
                if world.get::<Strip>(strip).is_some() {
                    world.despawn(strip);
                }
            }
            world.entity_mut(*segment).remove::<SegmentStrips>();
        }
        ZoneMutation::DespawnStrip { strip } => {
            let owner = world.get::<StripOwner>(*strip).map(|o| o.0);
            let side = world.get::<Strip>(*strip).map(|s| s.side);
            world.despawn(*strip);
            if let (Some(owner), Some(side)) = (owner, side) {
                if let Some(mut strips) = world.get_mut::<SegmentStrips>(owner) {
                    if strips.get(side) == Some(*strip) {
                        strips.set(side, None);
                    }
                }
            }
        }
        ZoneMutation::MarkSegmentDirty { segment } => {
            mark_segment_dirty(world, *segment);
        }
        ZoneMutation::MarkStripDirty { strip } => {
            world.entity_mut(*strip).insert(StripDirty);
        }
        ZoneMutation::SetStripGeometry { strip, geometry } => {
            if let Some(mut s) = world.get_mut::<Strip>(*strip) {
                s.geometry = *geometry;
            }
            world.entity_mut(*strip).remove::<StripDirty>();
        }
        ZoneMutation::KeepStripGeometry { strip } | ZoneMutation::ClearStripDirty { strip } => {
            world.entity_mut(*strip).remove::<StripDirty>();
        }
    }
    true
}

/// Store a committed depth, removing the component for the default so
/// ordinary roads carry no override.
fn set_committed(world: &mut World, segment: Entity, depth: DepthPair) {
    let depth = depth.clamped();
    let mut entity = world.entity_mut(segment);
    if depth.is_default() {
        entity.remove::<ZoneDepth>();
    } else {
        entity.insert(ZoneDepth(depth));
    }
}

fn mark_segment_dirty(world: &mut World, segment: Entity) {
    let Some(strips) = world.get::<SegmentStrips>(segment).copied() else {
        return;
    };
    for (_, strip) in strips.iter() {
        if world.get::<Strip>(strip).is_some() {
            world.entity_mut(strip).insert(StripDirty);
        }
    }
}
