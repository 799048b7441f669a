//! # TestOverlay: headless integration test harness
//!
//! Wraps `bevy::app::App` + `ZoneDepthPlugin` so scenario tests can spawn
//! segments, drive the tool and tick without a window or renderer.

mod assertions;
mod queries;
mod spawning;

use bevy::app::App;
use bevy::prelude::*;

use crate::roads::RoadPrefabs;
use crate::ZoneDepthPlugin;

/// A headless Bevy App wrapping `ZoneDepthPlugin` for integration testing.
///
/// Use the spawning methods to lay out roads, `tick()` to advance, then
/// query or assert on the resulting ECS state.
pub struct TestOverlay {
    app: App,
    next_segment_id: u32,
}

impl TestOverlay {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An active overlay with the standard road prefabs and the tool
    /// switched off.
    pub fn new() -> Self {
        let mut overlay = Self::without_prefabs();
        overlay
            .app
            .world_mut()
            .insert_resource(RoadPrefabs::standard());
        overlay.app.update();
        overlay
    }

    /// An overlay whose host never provided road prefabs. Nothing has ticked.
    pub fn without_prefabs() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(ZoneDepthPlugin);
        Self {
            app,
            next_segment_id: 1,
        }
    }

    /// Switch the tool on with the given sides and depth.
    pub fn with_tool(mut self, sides: crate::tool::SideMask, depth: i32) -> Self {
        self.send(crate::tool::ZoneToolInput::Configure { sides, depth });
        self.send(crate::tool::ZoneToolInput::ToolToggled { enabled: true });
        self.tick(1);
        self
    }

    /// Override the conflict flags.
    pub fn with_settings(mut self, settings: crate::conflict::ZoneDepthSettings) -> Self {
        self.app.world_mut().insert_resource(settings);
        self
    }
}

impl Default for TestOverlay {
    fn default() -> Self {
        Self::new()
    }
}
