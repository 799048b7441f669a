use bevy::prelude::*;

use crate::config::CELL_SIZE;
use crate::grid::{DepthPair, Side};
use crate::propagation::{RetiredDepths, SegmentStructureChanged};
use crate::roads::RoadType;
use crate::segments::{StructureChange, ZoneDepth};
use crate::test_harness::TestOverlay;

#[test]
fn test_new_segment_gets_full_depth_strips() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);

    assert_eq!(overlay.strip_count(), 2);
    overlay.assert_no_override(road);
    overlay.assert_strip_depth(road, Side::Left, 6);
    overlay.assert_strip_depth(road, Side::Right, 6);
    overlay.assert_no_dirty_strips();
}

#[test]
fn test_segment_inherits_template_depth() {
    let mut overlay = TestOverlay::new();
    let template = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(template)
        .insert(ZoneDepth(DepthPair::new(4, 2)));
    overlay.tick(1);

    let extension = overlay.spawn_segment_from(
        Vec2::new(10.0 * CELL_SIZE, 0.0),
        Vec2::new(20.0 * CELL_SIZE, 0.0),
        RoadType::Local,
        Some(template),
    );
    overlay.tick(1);

    overlay.assert_committed(extension, DepthPair::new(4, 2));
    overlay.assert_strip_depth(extension, Side::Left, 4);
    overlay.assert_strip_depth(extension, Side::Right, 2);
}

#[test]
fn test_segment_without_template_stays_default() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);

    overlay.assert_no_override(road);
    assert!(overlay.stats().total_applied > 0);
}

#[test]
fn test_unconfigured_template_gives_default() {
    let mut overlay = TestOverlay::new();
    let template = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    let extension = overlay.spawn_segment_from(
        Vec2::new(10.0 * CELL_SIZE, 0.0),
        Vec2::new(20.0 * CELL_SIZE, 0.0),
        RoadType::Local,
        Some(template),
    );
    overlay.tick(1);

    overlay.assert_no_override(extension);
}

#[test]
fn test_upgrade_keeps_depth_and_moves_strips() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(road)
        .insert(ZoneDepth(DepthPair::new(0, 6)));
    overlay.tick(1);
    let before = overlay.strip_geometry(road, Side::Right).unwrap();
    let left_strip = overlay.strip(road, Side::Left);

    overlay.upgrade_segment(road, RoadType::Avenue);
    overlay.tick(1);

    overlay.assert_committed(road, DepthPair::new(0, 6));
    overlay.assert_strip_depth(road, Side::Left, 0);
    overlay.assert_strip_depth(road, Side::Right, 6);
    // Same strip entity, pushed outward by the wider road.
    assert_eq!(overlay.strip(road, Side::Left), left_strip);
    let after = overlay.strip_geometry(road, Side::Right).unwrap();
    let shift = RoadType::Avenue.half_width() - RoadType::Local.half_width();
    assert!((before.position.y - after.position.y - shift).abs() < 1e-4);
}

#[test]
fn test_upgrade_to_highway_detaches_strips() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    assert_eq!(overlay.strip_count(), 2);

    overlay.upgrade_segment(road, RoadType::Highway);
    overlay.tick(1);

    assert_eq!(overlay.strip_count(), 0);
    assert_eq!(overlay.strip(road, Side::Left), None);
}

#[test]
fn test_despawned_segment_loses_its_strips() {
    let mut overlay = TestOverlay::new();
    let keep = overlay.spawn_local_road(0, 10);
    let drop = overlay.spawn_local_road(1, 10);
    overlay.tick(1);
    assert_eq!(overlay.strip_count(), 4);

    overlay.despawn_segment(drop);
    overlay.tick(1);

    assert_eq!(overlay.strip_count(), 2);
    assert!(overlay.strip(keep, Side::Left).is_some());
}

#[test]
fn test_too_short_segment_gets_no_strips() {
    let mut overlay = TestOverlay::new();
    overlay.spawn_segment(
        Vec2::ZERO,
        Vec2::new(CELL_SIZE * 0.5, 0.0),
        RoadType::Local,
    );
    overlay.tick(1);
    assert_eq!(overlay.strip_count(), 0);
}

#[test]
fn test_unknown_segment_is_an_integrity_fault() {
    let mut overlay = TestOverlay::new();
    let stray = overlay.world_mut().spawn_empty().id();
    overlay.send(SegmentStructureChanged {
        segment: stray,
        template: None,
        kind: StructureChange::Created,
    });
    overlay.tick(1);

    assert_eq!(overlay.stats().faults_this_tick, 1);
    assert_eq!(overlay.strip_count(), 0);
}

#[test]
fn test_same_tick_spawn_and_despawn_is_harmless() {
    let mut overlay = TestOverlay::new();
    let road = overlay.spawn_local_road(0, 10);
    overlay.despawn_segment(road);
    overlay.tick(2);

    assert_eq!(overlay.strip_count(), 0);
}

#[test]
fn test_path_upgraded_to_local_gains_strips() {
    let mut overlay = TestOverlay::new();
    let path = overlay.spawn_segment(
        Vec2::ZERO,
        Vec2::new(10.0 * CELL_SIZE, 0.0),
        RoadType::Path,
    );
    overlay.tick(1);
    assert_eq!(overlay.strip_count(), 0);

    assert_eq!(overlay.upgrade_to_next_tier(path), Some(RoadType::Local));
    overlay.tick(1);

    overlay.assert_strip_depth(path, Side::Left, 6);
    overlay.assert_strip_depth(path, Side::Right, 6);
    assert_eq!(overlay.upgrade_to_next_tier(path), Some(RoadType::Avenue));
}

#[test]
fn test_replacement_upgrade_inherits_despawned_template_depth() {
    let mut overlay = TestOverlay::new();
    let old = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(old)
        .insert(ZoneDepth(DepthPair::new(4, 2)));

    // Host swaps the entity in the same frame it set the depth.
    let avenue = overlay.replace_segment(old, RoadType::Avenue).unwrap();
    overlay.tick(1);

    overlay.assert_committed(avenue, DepthPair::new(4, 2));
    overlay.assert_strip_depth(avenue, Side::Left, 4);
    overlay.assert_strip_depth(avenue, Side::Right, 2);
    assert_eq!(overlay.strip_count(), 2, "old strips should be gone");
    assert!(overlay.resource::<RetiredDepths>().is_empty());
}

#[test]
fn test_replacement_upgrade_of_settled_road() {
    let mut overlay = TestOverlay::new();
    let old = overlay.spawn_local_road(0, 10);
    overlay.tick(1);
    overlay
        .world_mut()
        .entity_mut(old)
        .insert(ZoneDepth(DepthPair::new(0, 5)));
    overlay.tick(2);

    let avenue = overlay.replace_segment(old, RoadType::Avenue).unwrap();
    overlay.tick(1);

    overlay.assert_committed(avenue, DepthPair::new(0, 5));
    overlay.assert_strips_match_effective(avenue);
}

#[test]
fn test_replacement_of_unconfigured_road_stays_default() {
    let mut overlay = TestOverlay::new();
    let old = overlay.spawn_local_road(0, 10);
    overlay.tick(1);

    let avenue = overlay.replace_segment(old, RoadType::Avenue).unwrap();
    overlay.tick(1);

    overlay.assert_no_override(avenue);
    overlay.assert_strip_depth(avenue, Side::Left, 6);
}
