//! Segment spawning and input methods for `TestOverlay`.

use bevy::prelude::*;

use crate::config::CELL_SIZE;
use crate::grid::{Side, ZoneType};
use crate::propagation::SegmentStructureChanged;
use crate::roads::RoadType;
use crate::segments::{SegmentId, StructureChange, ZoningSegment};
use crate::tool::ZoneToolInput;

use super::TestOverlay;

impl TestOverlay {
    // -----------------------------------------------------------------------
    // Road network
    // -----------------------------------------------------------------------

    /// Spawn a segment and announce it as created. Takes effect on the next tick.
    pub fn spawn_segment(&mut self, start: Vec2, end: Vec2, road_type: RoadType) -> Entity {
        self.spawn_segment_from(start, end, road_type, None)
    }

    /// Spawn a segment built from `template` (e.g. extending an existing road).
    pub fn spawn_segment_from(
        &mut self,
        start: Vec2,
        end: Vec2,
        road_type: RoadType,
        template: Option<Entity>,
    ) -> Entity {
        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;
        let segment = self
            .app
            .world_mut()
            .spawn(ZoningSegment {
                id,
                start,
                end,
                road_type,
            })
            .id();
        self.send(SegmentStructureChanged {
            segment,
            template,
            kind: StructureChange::Created,
        });
        segment
    }

    /// Horizontal local road `cells` cells long, `row` rows of road spacing
    /// above the origin so several can coexist.
    pub fn spawn_local_road(&mut self, row: u32, cells: u32) -> Entity {
        let y = row as f32 * 40.0 * CELL_SIZE;
        self.spawn_segment(
            Vec2::new(0.0, y),
            Vec2::new(cells as f32 * CELL_SIZE, y),
            RoadType::Local,
        )
    }

    /// Change a segment's road type in place and announce the upgrade.
    pub fn upgrade_segment(&mut self, segment: Entity, road_type: RoadType) {
        if let Some(mut data) = self.app.world_mut().get_mut::<ZoningSegment>(segment) {
            data.road_type = road_type;
        }
        self.send(SegmentStructureChanged {
            segment,
            template: Some(segment),
            kind: StructureChange::Upgraded,
        });
    }

    /// Upgrade one tier in place. Returns the new road type, or `None` when
    /// the road is already at its top tier.
    pub fn upgrade_to_next_tier(&mut self, segment: Entity) -> Option<RoadType> {
        let next = self
            .app
            .world()
            .get::<ZoningSegment>(segment)?
            .road_type
            .upgrade_tier()?;
        self.upgrade_segment(segment, next);
        Some(next)
    }

    /// Upgrade by replacement: despawn `old`, spawn a new segment of
    /// `road_type` over the same span and announce it with `old` as template.
    pub fn replace_segment(&mut self, old: Entity, road_type: RoadType) -> Option<Entity> {
        let data = self.app.world().get::<ZoningSegment>(old)?.clone();
        self.despawn_segment(old);
        let segment = self
            .app
            .world_mut()
            .spawn(ZoningSegment { road_type, ..data })
            .id();
        self.send(SegmentStructureChanged {
            segment,
            template: Some(old),
            kind: StructureChange::Upgraded,
        });
        Some(segment)
    }

    /// Remove a segment the way the host does: despawn the entity.
    pub fn despawn_segment(&mut self, segment: Entity) {
        self.app.world_mut().despawn(segment);
    }

    // -----------------------------------------------------------------------
    // Cells
    // -----------------------------------------------------------------------

    /// Mark a strip cell occupied (a building stands there).
    pub fn occupy_cell(&mut self, segment: Entity, side: Side, x: u32, y: u32) {
        self.edit_cell(segment, side, x, y, |cell| cell.occupied = true);
    }

    pub fn clear_cell(&mut self, segment: Entity, side: Side, x: u32, y: u32) {
        self.edit_cell(segment, side, x, y, |cell| {
            cell.occupied = false;
            cell.zone = ZoneType::None;
        });
    }

    pub fn zone_cell(&mut self, segment: Entity, side: Side, x: u32, y: u32, zone: ZoneType) {
        self.edit_cell(segment, side, x, y, |cell| cell.zone = zone);
    }

    fn edit_cell(
        &mut self,
        segment: Entity,
        side: Side,
        x: u32,
        y: u32,
        edit: impl FnOnce(&mut crate::grid::ZoneCell),
    ) {
        let strip = self
            .strip(segment, side)
            .unwrap_or_else(|| panic!("segment {segment} has no {side:?} strip"));
        let mut cells = self
            .app
            .world_mut()
            .get_mut::<crate::grid::StripCells>(strip)
            .expect("strip without cells");
        let cell = cells
            .get_mut(x, y)
            .unwrap_or_else(|| panic!("cell ({x}, {y}) outside strip"));
        edit(cell);
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn send<E: Event>(&mut self, event: E) {
        self.app.world_mut().send_event(event);
    }

    pub fn hover(&mut self, segment: Option<Entity>) {
        self.send(ZoneToolInput::PointerMoved(segment));
    }

    pub fn press(&mut self) {
        self.send(ZoneToolInput::PrimaryPressed);
    }

    pub fn release(&mut self) {
        self.send(ZoneToolInput::PrimaryReleased);
    }

    /// Hover, press and release over one segment, one tick per step.
    pub fn click(&mut self, segment: Entity) {
        self.hover(Some(segment));
        self.tick(1);
        self.press();
        self.tick(1);
        self.release();
        self.tick(1);
    }
}
