//! The tool's hover/selection state machine.
//!
//! Every transition is a plain method returning the mutations it needs; the
//! ECS system in `systems` only feeds it input and pushes the result into the
//! `MutationLog`. That keeps the whole machine testable without an `App`.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::MAX_DEPTH;
use crate::grid::DepthPair;
use crate::mutation::ZoneMutation;

use super::types::{ToolPhase, ZoneToolConfig, ZoneToolInput};

/// What the state machine needs to know about the segments under the pointer.
pub trait SegmentLookup {
    fn is_segment(&self, entity: Entity) -> bool;

    /// Committed depth of a segment that owns at least one non-empty strip.
    /// `None` for anything the tool cannot zone.
    fn zonable_committed(&self, entity: Entity) -> Option<DepthPair>;

    /// Whether applying `tool_depth` to `entity` would change anything.
    fn qualifies(&self, entity: Entity, tool_depth: DepthPair) -> bool {
        self.zonable_committed(entity)
            .is_some_and(|committed| committed != tool_depth)
    }
}

/// Per-tick copy of what the tool needs from every segment.
#[derive(Debug, Clone, Default)]
pub struct SegmentSnapshot {
    segments: HashMap<Entity, Option<DepthPair>>,
}

impl SegmentSnapshot {
    /// Record a segment. `zonable_committed` is `None` if it has no non-empty strip.
    pub fn insert(&mut self, segment: Entity, zonable_committed: Option<DepthPair>) {
        self.segments.insert(segment, zonable_committed);
    }
}

impl SegmentLookup for SegmentSnapshot {
    fn is_segment(&self, entity: Entity) -> bool {
        self.segments.contains_key(&entity)
    }

    fn zonable_committed(&self, entity: Entity) -> Option<DepthPair> {
        self.segments.get(&entity).copied().flatten()
    }
}

/// Clamp a requested tool depth. The flag is set when the input was out of range.
pub fn clamp_tool_depth(depth: i32) -> (u8, bool) {
    let clamped = depth.clamp(0, i32::from(MAX_DEPTH));
    (clamped as u8, clamped != depth)
}

#[derive(Resource, Debug, Clone, Default)]
pub struct ZoneToolState {
    enabled: bool,
    phase: ToolPhase,
    /// Last segment reported under the pointer, qualifying or not.
    pointer: Option<Entity>,
    /// Segment showing a hover-only preview. Never part of `selection`.
    hover_preview: Option<Entity>,
    /// Selected segments in the order they joined. No duplicates.
    selection: Vec<Entity>,
}

impl ZoneToolState {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> ToolPhase {
        self.phase
    }

    pub fn pointer(&self) -> Option<Entity> {
        self.pointer
    }

    pub fn hover_preview(&self) -> Option<Entity> {
        self.hover_preview
    }

    pub fn selection(&self) -> &[Entity] {
        &self.selection
    }

    pub fn is_selected(&self, segment: Entity) -> bool {
        self.selection.contains(&segment)
    }

    /// Feed one input through the machine and settle any release.
    pub fn handle(
        &mut self,
        input: ZoneToolInput,
        config: &mut ZoneToolConfig,
        segments: &impl SegmentLookup,
    ) -> Vec<ZoneMutation> {
        let mut out = match input {
            ZoneToolInput::ToolToggled { enabled } => return self.set_enabled(enabled),
            ZoneToolInput::Configure { sides, depth } => {
                let (depth, _) = clamp_tool_depth(depth);
                self.reconfigure(ZoneToolConfig { sides, depth }, config, segments)
            }
            _ if !self.enabled => return Vec::new(),
            ZoneToolInput::PointerMoved(hit) => self.pointer_moved(hit, config, segments),
            ZoneToolInput::PrimaryPressed => self.primary_pressed(),
            ZoneToolInput::PrimaryReleased => self.primary_released(config, segments),
            ZoneToolInput::InvertRequested => {
                let inverted = ZoneToolConfig {
                    sides: config.sides.invert(),
                    ..*config
                };
                self.reconfigure(inverted, config, segments)
            }
        };
        out.extend(self.settle());
        out
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Vec<ZoneMutation> {
        if enabled {
            self.enabled = true;
            return Vec::new();
        }
        let out = self.discard_previews();
        *self = ZoneToolState::default();
        out
    }

    pub fn pointer_moved(
        &mut self,
        hit: Option<Entity>,
        config: &ZoneToolConfig,
        segments: &impl SegmentLookup,
    ) -> Vec<ZoneMutation> {
        self.pointer = hit;
        let tool_depth = config.tool_depth();
        let mut out = Vec::new();
        match self.phase {
            ToolPhase::Idle | ToolPhase::Hovering(_) => {
                if hit == self.hover_preview {
                    return out;
                }
                if let Some(previous) = self.hover_preview.take() {
                    out.push(ZoneMutation::ClearPreview { segment: previous });
                }
                self.phase = ToolPhase::Idle;
                out.extend(self.try_hover(config, segments));
            }
            ToolPhase::Selecting => {
                if let Some(segment) = hit {
                    if !self.is_selected(segment) && segments.qualifies(segment, tool_depth) {
                        self.selection.push(segment);
                        out.push(ZoneMutation::SetPreview {
                            segment,
                            depth: tool_depth,
                        });
                    }
                }
            }
            ToolPhase::Applying | ToolPhase::Cancelling => {}
        }
        out
    }

    pub fn primary_pressed(&mut self) -> Vec<ZoneMutation> {
        if matches!(self.phase, ToolPhase::Idle | ToolPhase::Hovering(_)) {
            self.phase = ToolPhase::Selecting;
            // The hover preview becomes a selection preview as-is.
            if let Some(segment) = self.hover_preview.take() {
                self.selection.push(segment);
            }
        }
        Vec::new()
    }

    pub fn primary_released(
        &mut self,
        config: &ZoneToolConfig,
        segments: &impl SegmentLookup,
    ) -> Vec<ZoneMutation> {
        if self.phase != ToolPhase::Selecting {
            return Vec::new();
        }
        let tool_depth = config.tool_depth();
        let mut out = Vec::new();
        let over = self
            .pointer
            .filter(|&s| self.is_selected(s) || segments.qualifies(s, tool_depth));
        match over {
            Some(segment) => {
                if !self.is_selected(segment) {
                    self.selection.push(segment);
                    out.push(ZoneMutation::SetPreview {
                        segment,
                        depth: tool_depth,
                    });
                }
                self.phase = ToolPhase::Applying;
            }
            None => self.phase = ToolPhase::Cancelling,
        }
        out
    }

    /// Resolve `Applying` or `Cancelling` and return to `Idle`.
    pub fn settle(&mut self) -> Vec<ZoneMutation> {
        let out = match self.phase {
            ToolPhase::Applying => self
                .selection
                .drain(..)
                .map(|segment| ZoneMutation::CommitPreview { segment })
                .collect(),
            ToolPhase::Cancelling => self
                .selection
                .drain(..)
                .map(|segment| ZoneMutation::ClearPreview { segment })
                .collect(),
            _ => return Vec::new(),
        };
        self.phase = ToolPhase::Idle;
        out
    }

    /// Switch to a new tool configuration and re-preview everything shown.
    pub fn reconfigure(
        &mut self,
        new_config: ZoneToolConfig,
        config: &mut ZoneToolConfig,
        segments: &impl SegmentLookup,
    ) -> Vec<ZoneMutation> {
        *config = new_config;
        if !self.enabled {
            return Vec::new();
        }
        let tool_depth = config.tool_depth();
        let mut out: Vec<ZoneMutation> = self
            .selection
            .iter()
            .map(|&segment| ZoneMutation::SetPreview {
                segment,
                depth: tool_depth,
            })
            .collect();

        if let Some(segment) = self.hover_preview {
            if segments.qualifies(segment, tool_depth) {
                out.push(ZoneMutation::SetPreview {
                    segment,
                    depth: tool_depth,
                });
            } else {
                out.push(ZoneMutation::ClearPreview { segment });
                self.hover_preview = None;
                self.phase = ToolPhase::Idle;
            }
        } else if self.phase == ToolPhase::Idle {
            out.extend(self.try_hover(config, segments));
        }
        out
    }

    /// Forget segments that no longer exist.
    pub fn retain_live(&mut self, segments: &impl SegmentLookup) {
        self.selection.retain(|&s| segments.is_segment(s));
        self.pointer = self.pointer.filter(|&s| segments.is_segment(s));
        if let Some(segment) = self.hover_preview {
            if !segments.is_segment(segment) {
                self.hover_preview = None;
                self.phase = ToolPhase::Idle;
            }
        }
    }

    /// Previews to drop when the tool is switched off.
    fn discard_previews(&self) -> Vec<ZoneMutation> {
        self.hover_preview
            .iter()
            .chain(self.selection.iter())
            .map(|&segment| ZoneMutation::ClearPreview { segment })
            .collect()
    }

    /// Start a hover preview on the segment under the pointer, if it qualifies.
    fn try_hover(
        &mut self,
        config: &ZoneToolConfig,
        segments: &impl SegmentLookup,
    ) -> Option<ZoneMutation> {
        let segment = self.pointer?;
        let tool_depth = config.tool_depth();
        if !segments.qualifies(segment, tool_depth) {
            return None;
        }
        self.hover_preview = Some(segment);
        self.phase = ToolPhase::Hovering(segment);
        Some(ZoneMutation::SetPreview {
            segment,
            depth: tool_depth,
        })
    }
}
