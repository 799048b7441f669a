use bevy::prelude::*;

use crate::grid::{DepthPair, Side, StripCells};
use crate::invariant_checks::ZoneDepthViolations;
use crate::segments::{PreviewDepth, StripBlueprint, StripDirty, StripOwner, ZoneDepth};
use crate::test_harness::TestOverlay;
use crate::tool::SideMask;

#[test]
fn test_out_of_range_committed_depth_is_clamped() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(road)
        .insert(ZoneDepth(DepthPair {
            left: 9,
            right: 3,
        }));
    overlay.tick(1);

    overlay.assert_committed(road, DepthPair::new(6, 3));
    overlay.assert_strip_depth(road, Side::Right, 3);
    assert_eq!(
        overlay
            .resource::<ZoneDepthViolations>()
            .committed_out_of_range,
        1
    );
    assert_eq!(overlay.stats().clamped_this_tick, 1);
}

#[test]
fn test_out_of_range_preview_is_clamped() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(road)
        .insert(PreviewDepth(DepthPair {
            left: 0,
            right: 250,
        }));
    overlay.tick(1);

    overlay.assert_preview(road, DepthPair::new(0, 6));
    overlay.assert_strip_depth(road, Side::Left, 0);
}

#[test]
fn test_stored_default_is_removed() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(road)
        .insert(ZoneDepth(DepthPair::DEFAULT));
    overlay.tick(1);

    overlay.assert_no_override(road);
    assert_eq!(overlay.resource::<ZoneDepthViolations>().stored_default, 1);
}

#[test]
fn test_restored_depth_is_materialized() {
    // A host loading a save writes committed depths straight into the world.
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(road)
        .insert(ZoneDepth(DepthPair::new(2, 5)));
    overlay.tick(1);

    overlay.assert_strip_depth(road, Side::Left, 2);
    overlay.assert_strip_depth(road, Side::Right, 5);

    overlay.world_mut().entity_mut(road).remove::<ZoneDepth>();
    overlay.tick(1);
    overlay.assert_strips_match_effective(road);
    overlay.assert_strip_depth(road, Side::Left, 6);
}

#[test]
fn test_sync_is_idempotent_once_settled() {
    let mut overlay = TestOverlay::new().with_tool(SideMask::LEFT, 3);
    let a = overlay.spawn_local_road(0, 10);
    let b = overlay.spawn_local_road(1, 6);
    overlay.tick(1);
    overlay.click(a);
    overlay.hover(None);
    overlay.tick(3);

    let before: Vec<_> = [a, b]
        .iter()
        .flat_map(|&s| Side::BOTH.map(|side| overlay.strip_geometry(s, side)))
        .collect();
    overlay.tick(1);
    let after: Vec<_> = [a, b]
        .iter()
        .flat_map(|&s| Side::BOTH.map(|side| overlay.strip_geometry(s, side)))
        .collect();

    assert_eq!(before, after);
    assert_eq!(overlay.stats().applied_this_tick, 0);
    overlay.assert_no_dirty_strips();
}

#[test]
fn test_orphan_strip_is_reported_every_tick() {
    let mut overlay = TestOverlay::new();
    let ghost = overlay.world_mut().spawn_empty().id();
    overlay.world_mut().despawn(ghost);
    let blueprint = StripBlueprint {
        side: Side::Left,
        base_anchor: Vec2::ZERO,
        direction: Vec2::X,
        width: 3,
    };
    overlay.world_mut().spawn((
        blueprint.to_strip(),
        StripCells::new(3),
        StripOwner(ghost),
        StripDirty,
    ));

    overlay.tick(1);
    assert_eq!(overlay.stats().faults_this_tick, 1);
    assert_eq!(overlay.dirty_strip_count(), 1);

    overlay.tick(1);
    assert_eq!(overlay.stats().faults_this_tick, 1);
    assert_eq!(overlay.stats().total_faults, 2);
}
