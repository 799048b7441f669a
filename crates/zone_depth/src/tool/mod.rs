//! Zone depth tool: hover, select and commit per-side depths on segments.
//!
//! Split into sub-modules by concern:
//! - `types`: `SideMask`, `ZoneToolConfig`, `ZoneToolInput`, `ToolPhase`,
//!   `HighlightedSegments`
//! - `state`: the `ZoneToolState` machine and the `SegmentLookup` seam
//! - `systems`: input intake and highlight feedback
//!
//! The tool never touches segment state directly. Hovering a qualifying
//! segment gives it a `PreviewDepth`; pressing turns the hover into a
//! selection that grows as the pointer crosses more segments; releasing over
//! the selection commits every preview, releasing anywhere else discards them.

pub mod state;
pub mod systems;
pub mod types;


pub use state::{clamp_tool_depth, SegmentLookup, SegmentSnapshot, ZoneToolState};
pub use systems::{handle_zone_tool_input, publish_highlights};
pub use types::{HighlightedSegments, SideMask, ToolPhase, ZoneToolConfig, ZoneToolInput};
