//! Synchronization pass: bring every dirty strip's geometry in line with its
//! segment's effective depth.
//!
//! Each dirty strip is handled independently on the compute task pool. The
//! workers read a snapshot of segment depths and the strip's own cells and
//! write only to a thread-local mutation buffer; nothing is applied until the
//! geometry barrier runs.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::utils::Parallel;

use crate::conflict::{may_shrink_to, ZoneDepthSettings};
use crate::error::IntegrityFault;
use crate::grid::{DepthPair, StripCells, StripGeometry};
use crate::mutation::{sort_for_commit, MutationLog, ZoneDepthStats, ZoneMutation};
use crate::segments::{
    effective_depth, PreviewDepth, Strip, StripDirty, StripOwner, ZoneDepth, ZoningSegment,
};

/// What the synchronization pass decided for one strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// New geometry accepted (growth, or a shrink the policy allows).
    Apply(StripGeometry),
    /// Candidate equals the current geometry.
    Unchanged,
    /// Shrink refused: it would retract past occupied or zoned cells.
    Rejected,
}

impl SyncOutcome {
    pub fn into_mutation(self, strip: Entity) -> ZoneMutation {
        match self {
            SyncOutcome::Apply(geometry) => ZoneMutation::SetStripGeometry { strip, geometry },
            SyncOutcome::Unchanged => ZoneMutation::ClearStripDirty { strip },
            SyncOutcome::Rejected => ZoneMutation::KeepStripGeometry { strip },
        }
    }
}

/// Reconcile one strip with the effective depth of its segment.
pub fn sync_strip(
    strip: &Strip,
    cells: &StripCells,
    effective: DepthPair,
    settings: &ZoneDepthSettings,
) -> SyncOutcome {
    let candidate = strip.geometry_for(effective.side(strip.side));
    if candidate == strip.geometry {
        return SyncOutcome::Unchanged;
    }
    let current = strip.geometry.valid;
    if candidate.valid.depth() < current.depth()
        && !may_shrink_to(cells, current, candidate.valid, settings)
    {
        return SyncOutcome::Rejected;
    }
    SyncOutcome::Apply(candidate)
}

/// Recompute geometry for every strip marked `StripDirty`.
pub fn synchronize_dirty_strips(
    settings: Res<ZoneDepthSettings>,
    segments: Query<(Entity, Option<&ZoneDepth>, Option<&PreviewDepth>), With<ZoningSegment>>,
    dirty: Query<(Entity, &Strip, &StripCells, &StripOwner), With<StripDirty>>,
    mut outputs: Local<Parallel<Vec<ZoneMutation>>>,
    mut faults: Local<Parallel<Vec<IntegrityFault>>>,
    mut log: ResMut<MutationLog>,
    mut stats: ResMut<ZoneDepthStats>,
) {
    if dirty.is_empty() {
        return;
    }
    #[cfg(feature = "trace")]
    let _span = bevy::log::info_span!("synchronize_dirty_strips").entered();

    // Read-only lookup shared by every worker.
    let depths: HashMap<Entity, DepthPair> = segments
        .iter()
        .map(|(entity, committed, preview)| (entity, effective_depth(committed, preview)))
        .collect();
    let settings = *settings;

    {
        let outputs: &Parallel<Vec<ZoneMutation>> = &outputs;
        let faults: &Parallel<Vec<IntegrityFault>> = &faults;
        let depths = &depths;
        dirty.par_iter().for_each(|(entity, strip, cells, owner)| {
            let Some(&effective) = depths.get(&owner.0) else {
                faults.scope(|f| {
                    f.push(IntegrityFault::MissingOwner {
                        strip: entity,
                        owner: owner.0,
                    })
                });
                return;
            };
            let mutation = sync_strip(strip, cells, effective, &settings).into_mutation(entity);
            outputs.scope(|out| out.push(mutation));
        });
    }

    let mut batch = Vec::new();
    outputs.drain_into(&mut batch);
    sort_for_commit(&mut batch);
    log.extend(batch);

    let mut found = Vec::new();
    faults.drain_into(&mut found);
    if !found.is_empty() {
        for fault in &found {
            error!("zone depth integrity fault: {fault}");
        }
        stats.record_faults(found.len() as u32);
    }
}

/// Re-dirty strips whose cells changed since the last run, so a shrink
/// refused earlier is retried once the blocking content is gone.
///
/// Freshly spawned strips also count as changed; their extra pass is a no-op.
pub fn mark_dirty_on_cell_edit(
    edited: Query<Entity, (With<Strip>, Without<StripDirty>, Changed<StripCells>)>,
    mut log: ResMut<MutationLog>,
) {
    log.extend(edited.iter().map(|strip| ZoneMutation::MarkStripDirty { strip }));
}

/// Re-dirty segments whose committed depth was written or removed outside
/// the log (e.g. the host restoring a save).
pub fn mark_dirty_on_depth_write(
    written: Query<Entity, (With<ZoningSegment>, Changed<ZoneDepth>)>,
    mut removed: RemovedComponents<ZoneDepth>,
    segments: Query<(), With<ZoningSegment>>,
    mut log: ResMut<MutationLog>,
) {
    let mut touched: Vec<Entity> = written.iter().collect();
    touched.extend(removed.read().filter(|&e| segments.contains(e)));
    touched.sort();
    touched.dedup();
    log.extend(
        touched
            .into_iter()
            .map(|segment| ZoneMutation::MarkSegmentDirty { segment }),
    );
}
