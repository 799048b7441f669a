//! Zone depth overlay for road segments.
//!
//! Players pick road segments and set how many cells deep the zonable strip
//! reaches on each side. Changes show as previews first and are committed on
//! release. Committed depth is re-materialized onto each strip's cell grid
//! without retracting past buildings or existing zones, and it is inherited by
//! segments the host creates or upgrades from a template.
//!
//! Everything is driven by `ZoneDepthPlugin`. See `sets` for the per-tick
//! ordering and `mutation` for the deferred-write model.

use bevy::prelude::*;

pub mod activation;
pub mod config;
pub mod conflict;
pub mod error;
pub mod grid;
pub mod invariant_checks;
pub mod mutation;
pub mod propagation;
pub mod roads;
pub mod segments;
pub mod sets;
pub mod sync;
pub mod tool;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use activation::OverlayActivation;
pub use conflict::ZoneDepthSettings;
pub use error::IntegrityFault;
pub use grid::{DepthPair, Side, StripCells, ZoneCell, ZoneType};
pub use mutation::{MutationLog, ZoneDepthStats, ZoneMutation};
pub use propagation::SegmentStructureChanged;
pub use roads::{RoadPrefab, RoadPrefabs, RoadType};
pub use segments::{
    PreviewDepth, SegmentId, SegmentStrips, Strip, StripOwner, StructureChange, ZoneDepth,
    ZoningSegment,
};
pub use sets::ZoneDepthSet;
pub use tool::{HighlightedSegments, SideMask, ZoneToolConfig, ZoneToolInput, ZoneToolState};

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct ZoneDepthPlugin;

impl Plugin for ZoneDepthPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayActivation>()
            .init_resource::<MutationLog>()
            .init_resource::<ZoneDepthStats>()
            .init_resource::<ZoneDepthSettings>()
            .init_resource::<invariant_checks::ZoneDepthViolations>()
            .init_resource::<propagation::RetiredDepths>()
            .init_resource::<ZoneToolConfig>()
            .init_resource::<ZoneToolState>()
            .init_resource::<HighlightedSegments>()
            .add_event::<ZoneToolInput>()
            .add_event::<SegmentStructureChanged>();

        app.configure_sets(
            Update,
            (
                ZoneDepthSet::Activation,
                ZoneDepthSet::Intake,
                ZoneDepthSet::IntakeBarrier,
                ZoneDepthSet::Propagation,
                ZoneDepthSet::PropagationBarrier,
                ZoneDepthSet::Synchronization,
                ZoneDepthSet::GeometryBarrier,
                ZoneDepthSet::Feedback,
            )
                .chain(),
        );
        for set in ZoneDepthSet::GATED {
            app.configure_sets(Update, set.run_if(activation::overlay_active));
        }

        // Removals are read every tick, active or not, so none are missed.
        app.add_systems(
            Update,
            (
                mutation::reset_tick_stats,
                activation::try_activate_overlay,
                propagation::detach_removed_segments,
            )
                .chain()
                .in_set(ZoneDepthSet::Activation),
        );

        // Producers share the log, so they run in a fixed order.
        app.add_systems(
            Update,
            (
                tool::handle_zone_tool_input,
                propagation::intake_structure_changes,
                sync::mark_dirty_on_cell_edit,
                sync::mark_dirty_on_depth_write,
                invariant_checks::validate_depths,
            )
                .chain()
                .in_set(ZoneDepthSet::Intake),
        );

        for barrier in ZoneDepthSet::BARRIERS {
            app.add_systems(Update, mutation::apply_mutation_log.in_set(barrier));
        }

        app.add_systems(
            Update,
            propagation::propagate_segment_depths.in_set(ZoneDepthSet::Propagation),
        )
        .add_systems(
            Update,
            sync::synchronize_dirty_strips.in_set(ZoneDepthSet::Synchronization),
        )
        .add_systems(
            Update,
            tool::publish_highlights.in_set(ZoneDepthSet::Feedback),
        );
    }
}
