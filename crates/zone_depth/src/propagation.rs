//! Propagation: give newly created or upgraded segments a depth inherited
//! from their template, and keep their strips attached.
//!
//! The host announces structural changes with `SegmentStructureChanged`.
//! Intake turns each announcement into a `PendingPropagation` marker (via
//! the mutation log); the propagation pass then plans every pending segment
//! in parallel and emits depth, strip and dirty-marking mutations.

use std::collections::{HashMap, HashSet};

use bevy::ecs::component::ComponentId;
use bevy::ecs::world::DeferredWorld;
use bevy::prelude::*;
use bevy::utils::Parallel;

use crate::error::IntegrityFault;
use crate::grid::DepthPair;
use crate::mutation::{MutationLog, ZoneDepthStats, ZoneMutation};
use crate::roads::{RoadPrefab, RoadPrefabs};
use crate::segments::{
    strip_blueprints, PendingPropagation, SegmentStrips, StripOwner, StructureChange, ZoneDepth,
    ZoningSegment,
};

/// Host notification: `segment` was created or upgraded this tick.
///
/// `template` is the segment it was built from (the pre-upgrade segment, or
/// the road the player extended), if any.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStructureChanged {
    pub segment: Entity,
    pub template: Option<Entity>,
    pub kind: StructureChange,
}

/// Committed depths of `ZoneDepth` components removed since the last intake
/// pass, keyed by the entity that carried them.
///
/// A host that upgrades a road by replacing its entity despawns the old one
/// before announcing the new one; this is where the old depth survives.
#[derive(Resource, Debug, Default)]
pub struct RetiredDepths {
    depths: HashMap<Entity, DepthPair>,
}

impl RetiredDepths {
    pub fn get(&self, entity: Entity) -> Option<DepthPair> {
        self.depths.get(&entity).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    fn clear(&mut self) {
        self.depths.clear();
    }
}

/// `on_remove` hook for `ZoneDepth`.
pub fn retire_zone_depth(mut world: DeferredWorld, entity: Entity, _: ComponentId) {
    let Some(depth) = world.get::<ZoneDepth>(entity).map(|d| d.0) else {
        return;
    };
    if let Some(mut retired) = world.get_resource_mut::<RetiredDepths>() {
        retired.depths.insert(entity, depth);
    }
}

// =============================================================================
// Pure planning
// =============================================================================

/// Depth a segment inherits: the template's committed depth, else the default.
pub fn inherited_depth(template_depth: Option<DepthPair>) -> DepthPair {
    template_depth.unwrap_or(DepthPair::DEFAULT)
}

/// Everything propagation needs to know about one pending segment.
#[derive(Debug, Clone, Copy)]
pub struct PropagationInput<'a> {
    pub segment: Entity,
    pub data: &'a ZoningSegment,
    pub pending: PendingPropagation,
    pub current_depth: Option<DepthPair>,
    pub template_depth: Option<DepthPair>,
    pub strips: SegmentStrips,
    pub prefab: Option<RoadPrefab>,
}

/// Mutations that bring one pending segment up to date, in apply order.
pub fn plan_propagation(input: &PropagationInput) -> Vec<ZoneMutation> {
    let segment = input.segment;
    let mut plan = Vec::new();

    let inherited = inherited_depth(input.template_depth);
    let needs_assignment = match input.current_depth {
        // Ordinary unconfigured road: nothing to store.
        None => !inherited.is_default(),
        Some(current) => current != inherited,
    };
    if needs_assignment {
        plan.push(ZoneMutation::AssignDepth {
            segment,
            depth: inherited,
        });
    }

    let blueprints = input
        .prefab
        .map(|prefab| strip_blueprints(input.data, prefab))
        .unwrap_or_default();
    if blueprints.is_empty() {
        if !input.strips.is_empty() {
            plan.push(ZoneMutation::DetachStrips { segment });
        }
    } else {
        let mut missing = Vec::new();
        for blueprint in blueprints {
            match input.strips.get(blueprint.side) {
                Some(strip) if input.pending.kind == StructureChange::Upgraded => {
                    plan.push(ZoneMutation::RebaseStrip {
                        strip,
                        base_anchor: blueprint.base_anchor,
                        direction: blueprint.direction,
                    });
                }
                Some(_) => {}
                None => missing.push(blueprint),
            }
        }
        if !missing.is_empty() {
            plan.push(ZoneMutation::AttachStrips {
                segment,
                blueprints: missing,
            });
        }
    }

    plan.push(ZoneMutation::MarkSegmentDirty { segment });
    plan.push(ZoneMutation::FinishPropagation { segment });
    plan
}

// =============================================================================
// Systems
// =============================================================================

/// Queue every announced segment for propagation, resolving the template's
/// depth while it can still be found.
pub fn intake_structure_changes(
    mut events: EventReader<SegmentStructureChanged>,
    segments: Query<Option<&ZoneDepth>, With<ZoningSegment>>,
    mut retired: ResMut<RetiredDepths>,
    mut log: ResMut<MutationLog>,
    mut stats: ResMut<ZoneDepthStats>,
) {
    for event in events.read() {
        if !segments.contains(event.segment) {
            let fault = IntegrityFault::UnknownSegment {
                segment: event.segment,
            };
            error!("zone depth integrity fault: {fault}");
            stats.record_faults(1);
            continue;
        }
        let template_depth = event.template.and_then(|template| match segments.get(template) {
            Ok(live) => live.map(|d| d.0),
            Err(_) => retired.get(template),
        });
        log.push(ZoneMutation::BeginPropagation {
            segment: event.segment,
            template: event.template,
            template_depth,
            kind: event.kind,
        });
    }
    if !retired.is_empty() {
        retired.clear();
    }
}

/// Despawn the strips of segments the host removed.
///
/// Runs while the overlay is inactive too; the despawns wait in the log until
/// the next barrier.
pub fn detach_removed_segments(
    mut removed: RemovedComponents<ZoningSegment>,
    strips: Query<(Entity, &StripOwner)>,
    mut log: ResMut<MutationLog>,
) {
    let removed: HashSet<Entity> = removed.read().collect();
    if removed.is_empty() {
        return;
    }
    let mut orphans: Vec<Entity> = strips
        .iter()
        .filter(|(_, owner)| removed.contains(&owner.0))
        .map(|(strip, _)| strip)
        .collect();
    orphans.sort();
    debug!(
        "zone depth: {} segment(s) removed, despawning {} strip(s)",
        removed.len(),
        orphans.len()
    );
    log.extend(
        orphans
            .into_iter()
            .map(|strip| ZoneMutation::DespawnStrip { strip }),
    );
}

/// Plan every pending segment in parallel.
pub fn propagate_segment_depths(
    prefabs: Option<Res<RoadPrefabs>>,
    live: Query<Option<&ZoneDepth>, With<ZoningSegment>>,
    pending: Query<(
        Entity,
        &ZoningSegment,
        &PendingPropagation,
        Option<&ZoneDepth>,
        Option<&SegmentStrips>,
    )>,
    mut plans: Local<Parallel<Vec<(Entity, Vec<ZoneMutation>)>>>,
    mut log: ResMut<MutationLog>,
) {
    // Without prefabs the segments stay pending until activation recovers.
    let Some(prefabs) = prefabs else {
        return;
    };
    if pending.is_empty() {
        return;
    }
    #[cfg(feature = "trace")]
    let _span = bevy::log::info_span!("propagate_segment_depths").entered();

    {
        let plans: &Parallel<Vec<(Entity, Vec<ZoneMutation>)>> = &plans;
        let live = &live;
        let prefabs = &*prefabs;
        pending
            .par_iter()
            .for_each(|(segment, data, marker, depth, strips)| {
                let prefab = prefabs.get(data.road_type);
                if prefab.is_none() {
                    warn!(
                        "zone depth: no road prefab for {:?} on segment {:?}; treating it as unzonable",
                        data.road_type, data.id
                    );
                }
                let input = PropagationInput {
                    segment,
                    data,
                    pending: *marker,
                    current_depth: depth.map(|d| d.0),
                    // A live template wins: its depth may have been committed
                    // after intake.
                    template_depth: match marker.template.map(|t| live.get(t)) {
                        Some(Ok(live_depth)) => live_depth.map(|d| d.0),
                        _ => marker.template_depth,
                    },
                    strips: strips.copied().unwrap_or_default(),
                    prefab,
                };
                let plan = plan_propagation(&input);
                plans.scope(|out| out.push((segment, plan)));
            });
    }

    let mut batch = Vec::new();
    plans.drain_into(&mut batch);
    batch.sort_by_key(|(segment, _)| *segment);
    log.extend(batch.into_iter().flat_map(|(_, plan)| plan));
}
