//! Deterministic overlay ordering via `SystemSet` phases.
//!
//! Every overlay system runs in `Update` inside one of these sets:
//!
//! ```text
//! Activation → Intake → IntakeBarrier → Propagation → PropagationBarrier
//!            → Synchronization → GeometryBarrier → Feedback
//! ```
//!
//! * **Activation** – checks that the host's road prefabs are present and
//!   queues strip despawns for removed segments. Always runs; every later set
//!   is gated on `overlay_active`.
//! * **Intake** – tool input, structural change events, edited cells and
//!   depth validation. Producers only append to the log.
//! * **IntakeBarrier** – applies the intake mutations (previews, commits,
//!   pending markers, dirty markers).
//! * **Propagation** – plans every pending segment in parallel.
//! * **PropagationBarrier** – applies inherited depths and strip attachment.
//! * **Synchronization** – recomputes every dirty strip in parallel.
//! * **GeometryBarrier** – applies the new strip geometry.
//! * **Feedback** – publishes highlight state for the host renderer. Reads
//!   only.

use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneDepthSet {
    Activation,
    Intake,
    IntakeBarrier,
    Propagation,
    PropagationBarrier,
    Synchronization,
    GeometryBarrier,
    Feedback,
}

impl ZoneDepthSet {
    /// Sets gated on the overlay being active, in execution order.
    pub const GATED: [ZoneDepthSet; 7] = [
        ZoneDepthSet::Intake,
        ZoneDepthSet::IntakeBarrier,
        ZoneDepthSet::Propagation,
        ZoneDepthSet::PropagationBarrier,
        ZoneDepthSet::Synchronization,
        ZoneDepthSet::GeometryBarrier,
        ZoneDepthSet::Feedback,
    ];

    /// The three commit barriers.
    pub const BARRIERS: [ZoneDepthSet; 3] = [
        ZoneDepthSet::IntakeBarrier,
        ZoneDepthSet::PropagationBarrier,
        ZoneDepthSet::GeometryBarrier,
    ];
}
