// ---------------------------------------------------------------------------
// IntegrityFault: broken linkage between segments and strips
// ---------------------------------------------------------------------------

use std::fmt;

use bevy::prelude::Entity;

/// Upstream contract violations the overlay cannot repair on its own.
///
/// These never happen while the host honors the segment lifecycle. When they
/// do, the affected entity's mutation is dropped for the tick and the fault
/// is logged at error level and counted in `ZoneDepthStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityFault {
    /// A strip points at an owner that is not a live segment.
    MissingOwner { strip: Entity, owner: Entity },
    /// A structural change notification named an entity that is not a segment.
    UnknownSegment { segment: Entity },
}

impl fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityFault::MissingOwner { strip, owner } => {
                write!(f, "strip {strip} references missing owner segment {owner}")
            }
            IntegrityFault::UnknownSegment { segment } => {
                write!(
                    f,
                    "structure change reported for {segment}, which is not a zoning segment"
                )
            }
        }
    }
}

impl std::error::Error for IntegrityFault {}
