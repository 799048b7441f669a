//! Overlay activation.
//!
//! The overlay needs the host's `RoadPrefabs` table before it can lay out
//! strips. Until the table shows up the engine stays inactive: the tool is
//! inert and no mutation is produced. Activation is retried once per tick and
//! abandoned after `MAX_ACTIVATION_ATTEMPTS`.

use bevy::prelude::*;

use crate::config::{ACTIVATION_LOG_INTERVAL, MAX_ACTIVATION_ATTEMPTS};
use crate::roads::RoadPrefabs;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayActivation {
    /// Waiting for the host; `attempts` failed checks so far.
    Pending { attempts: u32 },
    Active,
    /// Gave up. Only a host reset (`OverlayActivation::default()`) restarts it.
    Failed,
}

impl Default for OverlayActivation {
    fn default() -> Self {
        OverlayActivation::Pending { attempts: 0 }
    }
}

impl OverlayActivation {
    pub fn is_active(self) -> bool {
        self == OverlayActivation::Active
    }

    /// State after one activation check.
    pub fn advance(self, prefabs_available: bool) -> Self {
        match (self, prefabs_available) {
            (OverlayActivation::Failed, _) => OverlayActivation::Failed,
            (_, true) => OverlayActivation::Active,
            (OverlayActivation::Active, false) => OverlayActivation::Pending { attempts: 1 },
            (OverlayActivation::Pending { attempts }, false) => {
                let attempts = attempts + 1;
                if attempts >= MAX_ACTIVATION_ATTEMPTS {
                    OverlayActivation::Failed
                } else {
                    OverlayActivation::Pending { attempts }
                }
            }
        }
    }
}

/// Run condition for every overlay set after activation.
pub fn overlay_active(activation: Res<OverlayActivation>) -> bool {
    activation.is_active()
}

pub fn try_activate_overlay(
    prefabs: Option<Res<RoadPrefabs>>,
    mut activation: ResMut<OverlayActivation>,
) {
    let before = *activation;
    if before == OverlayActivation::Failed {
        return;
    }
    let available = prefabs.is_some_and(|p| !p.is_empty());
    let after = before.advance(available);
    if after == before {
        return;
    }

    match after {
        OverlayActivation::Active => info!("zone depth overlay activated"),
        OverlayActivation::Pending { .. } if before.is_active() => {
            warn!("zone depth overlay lost its road prefabs, deactivating");
        }
        OverlayActivation::Pending { attempts } => {
            if attempts % ACTIVATION_LOG_INTERVAL == 0 {
                warn!(
                    "zone depth overlay still waiting for road prefabs ({attempts}/{MAX_ACTIVATION_ATTEMPTS} attempts)"
                );
            }
        }
        OverlayActivation::Failed => error!(
            "zone depth overlay failed to activate after {MAX_ACTIVATION_ATTEMPTS} attempts; road prefabs never became available"
        ),
    }
    *activation = after;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn test_activates_when_prefabs_arrive() {
        let state = OverlayActivation::default().advance(false).advance(true);
        assert_eq!(state, OverlayActivation::Active);
    }

    #[test]
    fn test_counts_attempts() {
        let mut state = OverlayActivation::default();
        for _ in 0..5 {
            state = state.advance(false);
        }
        assert_eq!(state, OverlayActivation::Pending { attempts: 5 });
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut state = OverlayActivation::default();
        for _ in 0..MAX_ACTIVATION_ATTEMPTS {
            state = state.advance(false);
        }
        assert_eq!(state, OverlayActivation::Failed);
        // Prefabs arriving late do not revive a failed overlay.
        assert_eq!(state.advance(true), OverlayActivation::Failed);
    }

    #[test]
    fn test_losing_prefabs_deactivates() {
        let state = OverlayActivation::Active.advance(false);
        assert_eq!(state, OverlayActivation::Pending { attempts: 1 });
    }

    #[test]
    fn test_system_activates_with_standard_prefabs() {
        let mut world = World::new();
        world.init_resource::<OverlayActivation>();
        world.insert_resource(RoadPrefabs::standard());
        let _ = world.run_system_once(try_activate_overlay);
        assert!(world.resource::<OverlayActivation>().is_active());
    }

    #[test]
    fn test_system_treats_empty_table_as_missing() {
        let mut world = World::new();
        world.init_resource::<OverlayActivation>();
        world.insert_resource(RoadPrefabs::default());
        let _ = world.run_system_once(try_activate_overlay);
        assert_eq!(
            *world.resource::<OverlayActivation>(),
            OverlayActivation::Pending { attempts: 1 }
        );
    }
}
