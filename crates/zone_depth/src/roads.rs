//! Road types and the prefab table the overlay needs to lay out strips.
//!
//! `RoadPrefabs` is supplied by the host once its road assets are loaded.
//! Until it exists the overlay stays inactive (see `activation`).

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoadType {
    #[default]
    Local, // 2-lane, zonable
    Avenue,    // 4-lane, zonable
    Boulevard, // 6-lane, zonable
    Highway,   // 4-lane divided, NO zoning
    OneWay,    // 2-lane one-way, zonable
    Path,      // pedestrian, no zoning
}

impl RoadType {
    pub const ALL: [RoadType; 6] = [
        RoadType::Local,
        RoadType::Avenue,
        RoadType::Boulevard,
        RoadType::Highway,
        RoadType::OneWay,
        RoadType::Path,
    ];

    pub fn allows_zoning(self) -> bool {
        matches!(
            self,
            RoadType::Local | RoadType::Avenue | RoadType::Boulevard | RoadType::OneWay
        )
    }

    /// Distance from the centerline to the curb, in world units.
    pub fn half_width(self) -> f32 {
        match self {
            RoadType::Local | RoadType::OneWay => 6.0,
            RoadType::Avenue => 12.0,
            RoadType::Boulevard => 18.0,
            RoadType::Highway => 16.0,
            RoadType::Path => 2.0,
        }
    }

    /// Next tier when the player upgrades the road in place.
    pub fn upgrade_tier(self) -> Option<RoadType> {
        match self {
            RoadType::Path => Some(RoadType::Local),
            RoadType::Local => Some(RoadType::Avenue),
            RoadType::Avenue => Some(RoadType::Boulevard),
            RoadType::OneWay => Some(RoadType::Avenue),
            RoadType::Boulevard | RoadType::Highway => None,
        }
    }
}

/// What the overlay needs to know about one road asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadPrefab {
    pub half_width: f32,
    pub zonable: bool,
}

impl From<RoadType> for RoadPrefab {
    fn from(road_type: RoadType) -> Self {
        Self {
            half_width: road_type.half_width(),
            zonable: road_type.allows_zoning(),
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct RoadPrefabs {
    pub prefabs: HashMap<RoadType, RoadPrefab>,
}

impl RoadPrefabs {
    /// Table built from the built-in road type defaults.
    pub fn standard() -> Self {
        Self {
            prefabs: RoadType::ALL
                .iter()
                .map(|&rt| (rt, RoadPrefab::from(rt)))
                .collect(),
        }
    }

    pub fn get(&self, road_type: RoadType) -> Option<RoadPrefab> {
        self.prefabs.get(&road_type).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}
