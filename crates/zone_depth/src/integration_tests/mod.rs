//! Integration tests for the zone depth overlay using the `TestOverlay`
//! harness.
//!
//! These spin up a headless Bevy App with `ZoneDepthPlugin` and check the
//! tool, propagation and synchronization working together across ticks.

mod invariant_tests;
mod propagation_tests;
