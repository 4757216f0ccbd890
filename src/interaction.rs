//! Hover, selection and drag state, and the visual emphasis they imply.
//!
//! Nothing here draws. The renderer asks [`InteractionState::node_emphasis`]
//! and [`InteractionState::edge_emphasis`] per element and multiplies the
//! factors into its own zoom-level styling.

use std::collections::HashSet;

use crate::graph::{GraphEdge, MethodGraph};

pub const HOVER_SCALE: f32 = 1.3;
pub const HOVER_EDGE_WIDTH_SCALE: f32 = 1.5;
pub const HOVER_UNRELATED_NODE_OPACITY: f32 = 0.3;
pub const HOVER_UNRELATED_EDGE_OPACITY: f32 = 0.15;
pub const SELECTION_DIM_OPACITY: f32 = 0.3;

const HIGHLIGHT_RATE_PER_SECOND: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEmphasis {
    pub scale: f32,
    pub opacity: f32,
    /// 0 for no glow, 1 for full hover glow.
    pub glow: f32,
    pub show_label: bool,
    pub outline: bool,
}

impl Default for NodeEmphasis {
    fn default() -> Self {
        Self {
            scale: 1.0,
            opacity: 1.0,
            glow: 0.0,
            show_label: false,
            outline: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeEmphasis {
    pub opacity: f32,
    pub width_scale: f32,
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (from * (1.0 - t)) + (to * t)
}

#[derive(Clone, Debug, Default)]
pub struct InteractionState {
    hovered: Option<usize>,
    /// Last hovered node while its highlight fades out.
    fading: Option<usize>,
    highlight: f32,
    selected: Option<usize>,
    selected_neighbors: HashSet<usize>,
    dragging: Option<usize>,
}

impl InteractionState {
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Returns true when the hovered node actually changed.
    pub fn set_hovered(&mut self, hovered: Option<usize>) -> bool {
        if hovered == self.hovered {
            return false;
        }

        match hovered {
            Some(_) => self.fading = None,
            None => self.fading = self.hovered,
        }
        self.hovered = hovered;
        true
    }

    pub fn set_selected(&mut self, graph: &MethodGraph, selected: Option<usize>) {
        self.selected = selected.filter(|&index| index < graph.nodes.len());
        self.selected_neighbors = self
            .selected
            .map(|index| graph.neighbors(index).iter().copied().collect())
            .unwrap_or_default();
    }

    pub fn begin_drag(&mut self, index: usize) {
        self.dragging = Some(index);
    }

    pub fn end_drag(&mut self) -> Option<usize> {
        self.dragging.take()
    }

    /// Eases the hover highlight toward its target. Returns whether it is
    /// still moving.
    pub fn update(&mut self, dt: f32) -> bool {
        let target = if self.hovered.is_some() { 1.0 } else { 0.0 };
        let t = 1.0 - (-HIGHLIGHT_RATE_PER_SECOND * dt.max(0.0)).exp();
        self.highlight = lerp(self.highlight, target, t);

        if (self.highlight - target).abs() < 1e-3 {
            self.highlight = target;
            if target == 0.0 {
                self.fading = None;
            }
            return false;
        }
        true
    }

    fn hover_focus(&self) -> Option<usize> {
        self.hovered.or(self.fading)
    }

    pub fn node_emphasis(&self, graph: &MethodGraph, index: usize) -> NodeEmphasis {
        let mut emphasis = NodeEmphasis::default();

        if let Some(selected) = self.selected {
            if index == selected {
                emphasis.outline = true;
            } else if !self.selected_neighbors.contains(&index) {
                emphasis.opacity *= SELECTION_DIM_OPACITY;
            }
        }

        if let Some(focus) = self.hover_focus() {
            let highlight = self.highlight;
            if index == focus {
                emphasis.scale = lerp(1.0, HOVER_SCALE, highlight);
                emphasis.glow = highlight;
                emphasis.show_label = highlight > 0.05;
            } else if !graph.neighbors(focus).contains(&index) {
                emphasis.opacity *= lerp(1.0, HOVER_UNRELATED_NODE_OPACITY, highlight);
            }
        }

        emphasis
    }

    /// Emphasis for `edge` given the opacity the current zoom level assigns it.
    pub fn edge_emphasis(&self, edge: &GraphEdge, base_opacity: f32) -> EdgeEmphasis {
        let mut opacity = base_opacity;
        let mut width_scale = 1.0;

        if let Some(focus) = self.hover_focus() {
            let highlight = self.highlight;
            if edge.touches(focus) {
                opacity = lerp(opacity, 1.0, highlight);
                width_scale = lerp(1.0, HOVER_EDGE_WIDTH_SCALE, highlight);
            } else {
                opacity = lerp(opacity, HOVER_UNRELATED_EDGE_OPACITY, highlight);
            }
        }

        EdgeEmphasis {
            opacity,
            width_scale,
        }
    }
}
