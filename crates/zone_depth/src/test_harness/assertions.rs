//! Assertion helpers for `TestOverlay` integration tests.

use bevy::prelude::*;

use crate::grid::{DepthPair, Side};

use super::TestOverlay;

impl TestOverlay {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_committed(&self, segment: Entity, expected: DepthPair) {
        let actual = self.committed_depth(segment);
        assert_eq!(
            actual,
            Some(expected),
            "Expected committed depth {expected:?} on {segment}, got {actual:?}"
        );
    }

    /// Assert the segment carries no committed override (default depth).
    pub fn assert_no_override(&self, segment: Entity) {
        let actual = self.committed_depth(segment);
        assert!(
            actual.is_none(),
            "Expected no committed override on {segment}, got {actual:?}"
        );
    }

    pub fn assert_preview(&self, segment: Entity, expected: DepthPair) {
        let actual = self.preview_depth(segment);
        assert_eq!(
            actual,
            Some(expected),
            "Expected preview depth {expected:?} on {segment}, got {actual:?}"
        );
    }

    pub fn assert_no_preview(&self, segment: Entity) {
        let actual = self.preview_depth(segment);
        assert!(
            actual.is_none(),
            "Expected no preview on {segment}, got {actual:?}"
        );
    }

    pub fn assert_strip_depth(&self, segment: Entity, side: Side, expected: u32) {
        let actual = self.strip_depth(segment, side);
        assert_eq!(
            actual,
            Some(expected),
            "Expected {side:?} strip of {segment} at depth {expected}, got {actual:?}"
        );
    }

    /// Assert both strips match the segment's effective depth.
    pub fn assert_strips_match_effective(&self, segment: Entity) {
        let effective = self.effective_depth(segment);
        for side in Side::BOTH {
            self.assert_strip_depth(segment, side, u32::from(effective.side(side)));
        }
    }

    pub fn assert_no_dirty_strips(&mut self) {
        let dirty = self.dirty_strip_count();
        assert_eq!(dirty, 0, "Expected no dirty strips, found {dirty}");
    }
}
