//! Runtime invariant guards for stored segment depths.
//!
//! The host can write `ZoneDepth` directly (e.g. when loading a save), so a
//! stored value may be out of range or an explicit default. Changed depths
//! are checked once per tick; violations are logged at warn level and routed
//! back through the mutation log as clamped or normalized values.

use bevy::prelude::*;

use crate::grid::DepthPair;
use crate::mutation::{MutationLog, ZoneDepthStats, ZoneMutation};
use crate::segments::{PreviewDepth, ZoneDepth, ZoningSegment};

/// Violations found by the last validation pass. Used by integration tests.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct ZoneDepthViolations {
    pub committed_out_of_range: u32,
    pub preview_out_of_range: u32,
    pub stored_default: u32,
}

impl ZoneDepthViolations {
    pub fn total(&self) -> u32 {
        self.committed_out_of_range + self.preview_out_of_range + self.stored_default
    }
}

/// Correction for a stored committed depth, if it needs one.
pub fn committed_correction(segment: Entity, stored: DepthPair) -> Option<ZoneMutation> {
    if !stored.is_in_range() || stored.is_default() {
        Some(ZoneMutation::AssignDepth {
            segment,
            depth: stored.clamped(),
        })
    } else {
        None
    }
}

/// Correction for a stored preview depth, if it needs one.
pub fn preview_correction(segment: Entity, stored: DepthPair) -> Option<ZoneMutation> {
    (!stored.is_in_range()).then(|| ZoneMutation::SetPreview {
        segment,
        depth: stored.clamped(),
    })
}

#[allow(clippy::type_complexity)]
pub fn validate_depths(
    segments: Query<
        (Entity, Option<&ZoneDepth>, Option<&PreviewDepth>),
        (
            With<ZoningSegment>,
            Or<(Changed<ZoneDepth>, Changed<PreviewDepth>)>,
        ),
    >,
    mut log: ResMut<MutationLog>,
    mut stats: ResMut<ZoneDepthStats>,
    mut violations: ResMut<ZoneDepthViolations>,
) {
    *violations = ZoneDepthViolations::default();

    for (segment, committed, preview) in &segments {
        if let Some(&ZoneDepth(stored)) = committed {
            if let Some(fix) = committed_correction(segment, stored) {
                if stored.is_default() {
                    debug!("zone depth: removing explicit default depth on {segment}");
                    violations.stored_default += 1;
                } else {
                    warn!(
                        "Invariant violation: committed depth ({}, {}) on {segment} out of range. Clamping.",
                        stored.left, stored.right
                    );
                    violations.committed_out_of_range += 1;
                }
                log.push(fix);
            }
        }
        if let Some(&PreviewDepth(stored)) = preview {
            if let Some(fix) = preview_correction(segment, stored) {
                warn!(
                    "Invariant violation: preview depth ({}, {}) on {segment} out of range. Clamping.",
                    stored.left, stored.right
                );
                violations.preview_out_of_range += 1;
                log.push(fix);
            }
        }
    }

    let clamped = violations.committed_out_of_range + violations.preview_out_of_range;
    if clamped > 0 {
        stats.record_clamped(clamped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_DEPTH;

    #[test]
    fn test_in_range_committed_needs_no_fix() {
        let e = Entity::from_raw(1);
        assert_eq!(committed_correction(e, DepthPair::new(2, 4)), None);
    }

    #[test]
    fn test_out_of_range_committed_is_clamped() {
        let e = Entity::from_raw(1);
        let stored = DepthPair {
            left: 9,
            right: 1,
        };
        assert_eq!(
            committed_correction(e, stored),
            Some(ZoneMutation::AssignDepth {
                segment: e,
                depth: DepthPair::new(MAX_DEPTH, 1),
            })
        );
    }

    #[test]
    fn test_explicit_default_is_normalized() {
        let e = Entity::from_raw(1);
        assert!(matches!(
            committed_correction(e, DepthPair::DEFAULT),
            Some(ZoneMutation::AssignDepth { depth, .. }) if depth.is_default()
        ));
    }

    #[test]
    fn test_preview_default_is_allowed() {
        // A preview of the default is a legitimate "reset to full depth" choice.
        let e = Entity::from_raw(1);
        assert_eq!(preview_correction(e, DepthPair::DEFAULT), None);
        assert!(preview_correction(e, DepthPair { left: 0, right: 200 }).is_some());
    }
}
