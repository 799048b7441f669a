//! ECS systems for the zone depth tool.

use bevy::prelude::*;

use crate::config::MAX_DEPTH;
use crate::grid::DepthPair;
use crate::mutation::{MutationLog, ZoneDepthStats};
use crate::segments::{SegmentStrips, Strip, ZoneDepth, ZoningSegment};

use super::state::{clamp_tool_depth, SegmentSnapshot, ZoneToolState};
use super::types::{HighlightedSegments, ZoneToolConfig, ZoneToolInput};

// =============================================================================
// Intake
// =============================================================================

/// System: run this tick's tool input through the state machine.
pub fn handle_zone_tool_input(
    mut inputs: EventReader<ZoneToolInput>,
    segments: Query<(Entity, Option<&ZoneDepth>, Option<&SegmentStrips>), With<ZoningSegment>>,
    strips: Query<&Strip>,
    mut state: ResMut<ZoneToolState>,
    mut config: ResMut<ZoneToolConfig>,
    mut log: ResMut<MutationLog>,
    mut stats: ResMut<ZoneDepthStats>,
) {
    if inputs.is_empty() {
        return;
    }

    let mut snapshot = SegmentSnapshot::default();
    for (segment, committed, owned) in &segments {
        let zonable = owned.is_some_and(|owned| {
            owned
                .iter()
                .any(|(_, strip)| strips.get(strip).is_ok_and(|s| !s.is_empty()))
        });
        let committed = committed.map_or(DepthPair::DEFAULT, |c| c.0);
        snapshot.insert(segment, zonable.then_some(committed));
    }
    state.retain_live(&snapshot);

    for &input in inputs.read() {
        if let ZoneToolInput::Configure { depth, .. } = input {
            if clamp_tool_depth(depth).1 {
                warn!("zone tool depth {depth} out of range, clamping to 0..={MAX_DEPTH}");
                stats.record_clamped(1);
            }
        }
        let mutations = state.handle(input, &mut config, &snapshot);
        log.extend(mutations);
    }
}

// =============================================================================
// Feedback
// =============================================================================

/// System: mirror hover and selection into `HighlightedSegments`.
pub fn publish_highlights(
    state: Res<ZoneToolState>,
    mut highlights: ResMut<HighlightedSegments>,
) {
    if !state.is_changed() {
        return;
    }
    highlights.set_if_neq(HighlightedSegments {
        hovered: state.hover_preview(),
        selected: state.selection().to_vec(),
    });
}
