//! The graph surface: one built graph, its running layout, and the view
//! state the host drives through zoom, pointer and lifecycle calls.
//!
//! Screen coordinates are relative to the surface's own top-left corner;
//! world coordinates are the layout's, where the viewport center is
//! `(width / 2, height / 2)` at the identity transform.

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::catalog::{Catalog, MethodRecord, PipelineStep};
use crate::cluster::{ClusterBoundary, ClusterRegion, ClusterStyle, cluster_regions, region_boundary};
use crate::graph::{GraphNode, LinkOptions, MethodGraph, build_graph};
use crate::interaction::InteractionState;
use crate::layout::{DRAG_ALPHA_TARGET, LayoutEngine, LayoutParams, MAX_SPACING, MIN_SPACING, Stepper};
use crate::theme::Theme;
use crate::zoom::SemanticZoom;

pub const ZOOM_STEP: f32 = 1.3;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 4.0;
pub const ENTRANCE_SECONDS: f32 = 0.6;

const NODE_BASE_RADIUS: f32 = 8.0;
const NODE_DEGREE_RADIUS: f32 = 2.5;
const NODE_MAX_RADIUS: f32 = 22.0;
const HIT_SLOP: f32 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    pub width: f32,
    pub height: f32,
    pub selected_id: Option<String>,
    pub show_clusters: bool,
    pub show_labels: bool,
    pub node_spacing: f32,
    pub link_options: LinkOptions,
    pub animate_entrance: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            selected_id: None,
            show_clusters: true,
            show_labels: true,
            node_spacing: 1.0,
            link_options: LinkOptions::default(),
            animate_entrance: true,
        }
    }
}

impl ViewConfig {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn spacing(&self) -> f32 {
        if self.node_spacing.is_finite() {
            self.node_spacing.clamp(MIN_SPACING, MAX_SPACING)
        } else {
            1.0
        }
    }

    fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

type ClickCallback = Box<dyn FnMut(&GraphNode)>;
type HoverCallback = Box<dyn FnMut(Option<&GraphNode>)>;

#[derive(Default)]
pub struct SurfaceCallbacks {
    pub on_node_click: Option<ClickCallback>,
    pub on_node_hover: Option<HoverCallback>,
}

impl SurfaceCallbacks {
    pub fn on_click(mut self, callback: impl FnMut(&GraphNode) + 'static) -> Self {
        self.on_node_click = Some(Box::new(callback));
        self
    }

    pub fn on_hover(mut self, callback: impl FnMut(Option<&GraphNode>) + 'static) -> Self {
        self.on_node_hover = Some(Box::new(callback));
        self
    }
}

/// Screen = world * scale + translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world * self.scale) + self.translate
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.translate) / self.scale
    }

    /// Scales by `factor` keeping `anchor` (screen space) fixed.
    pub fn zoomed_about(&self, anchor: Vec2, factor: f32) -> Self {
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let applied = scale / self.scale;
        Self {
            translate: anchor - ((anchor - self.translate) * applied),
            scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InertReason {
    NoNodes,
    ZeroSize,
}

struct LiveSurface {
    graph: MethodGraph,
    engine: LayoutEngine,
    stepper: Stepper,
    regions: Vec<ClusterRegion>,
    boundaries: Vec<Option<ClusterBoundary>>,
    interaction: InteractionState,
    zoom: SemanticZoom,
    transform: ViewTransform,
    entrance_elapsed: f32,
}

enum SurfaceState {
    Live(Box<LiveSurface>),
    Inert(InertReason),
    Destroyed,
}

pub struct GraphSurface {
    config: ViewConfig,
    cluster_style: ClusterStyle,
    callbacks: SurfaceCallbacks,
    state: SurfaceState,
}

impl GraphSurface {
    pub fn new(catalog: &Catalog, config: ViewConfig, callbacks: SurfaceCallbacks) -> Self {
        Self::with_theme(catalog, config, Theme::default(), callbacks)
    }

    pub fn with_theme(
        catalog: &Catalog,
        config: ViewConfig,
        theme: Theme,
        callbacks: SurfaceCallbacks,
    ) -> Self {
        let state = if !config.has_area() {
            SurfaceState::Inert(InertReason::ZeroSize)
        } else if catalog.methods.is_empty() {
            SurfaceState::Inert(InertReason::NoNodes)
        } else {
            let live = Self::build_live(
                &catalog.methods,
                &catalog.pipeline_steps,
                &config,
                &theme,
            );
            SurfaceState::Live(Box::new(live))
        };

        match &state {
            SurfaceState::Live(live) => debug!(
                nodes = live.graph.nodes.len(),
                edges = live.graph.edges.len(),
                regions = live.regions.len(),
                width = config.width,
                height = config.height,
                "graph surface built"
            ),
            SurfaceState::Inert(reason) => debug!(?reason, "graph surface inert"),
            SurfaceState::Destroyed => {}
        }

        Self {
            config,
            cluster_style: ClusterStyle::default(),
            callbacks,
            state,
        }
    }

    fn build_live(
        methods: &[MethodRecord],
        steps: &[PipelineStep],
        config: &ViewConfig,
        theme: &Theme,
    ) -> LiveSurface {
        let graph = build_graph(methods, steps, &config.link_options, theme);
        let params = LayoutParams::new(config.width, config.height, config.spacing());
        let engine = LayoutEngine::new(&graph, steps, params);
        let regions = cluster_regions(&graph, steps, theme);

        let mut interaction = InteractionState::default();
        let selected = config
            .selected_id
            .as_deref()
            .and_then(|id| graph.index_of(id));
        interaction.set_selected(&graph, selected);

        let mut live = LiveSurface {
            graph,
            engine,
            stepper: Stepper::default(),
            boundaries: vec![None; regions.len()],
            regions,
            interaction,
            zoom: SemanticZoom::default(),
            transform: ViewTransform::default(),
            entrance_elapsed: if config.animate_entrance {
                0.0
            } else {
                ENTRANCE_SECONDS
            },
        };
        refresh_boundaries(&mut live, &ClusterStyle::default());
        live
    }

    fn live(&self) -> Option<&LiveSurface> {
        match &self.state {
            SurfaceState::Live(live) => Some(&**live),
            _ => None,
        }
    }

    fn live_mut(&mut self) -> Option<&mut LiveSurface> {
        match &mut self.state {
            SurfaceState::Live(live) => Some(&mut **live),
            _ => None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn is_inert(&self) -> bool {
        self.live().is_none()
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, SurfaceState::Destroyed)
    }

    pub fn inert_reason(&self) -> Option<InertReason> {
        match self.state {
            SurfaceState::Inert(reason) => Some(reason),
            _ => None,
        }
    }

    /// A zero-size surface was probably measured before the host laid it
    /// out; an empty graph will stay empty however often it is rebuilt.
    pub fn needs_retry(&self) -> bool {
        self.inert_reason() == Some(InertReason::ZeroSize)
    }

    pub fn graph(&self) -> Option<&MethodGraph> {
        self.live().map(|live| &live.graph)
    }

    pub fn positions(&self) -> &[Vec2] {
        self.live().map(|live| live.engine.positions()).unwrap_or(&[])
    }

    pub fn regions(&self) -> &[ClusterRegion] {
        self.live().map(|live| live.regions.as_slice()).unwrap_or(&[])
    }

    /// Each region paired with its current boundary. Regions whose members
    /// have no finite position yet have no boundary.
    pub fn boundaries(&self) -> impl Iterator<Item = (&ClusterRegion, Option<&ClusterBoundary>)> {
        self.live().into_iter().flat_map(|live| {
            live.regions
                .iter()
                .zip(live.boundaries.iter().map(Option::as_ref))
        })
    }

    pub fn interaction(&self) -> Option<&InteractionState> {
        self.live().map(|live| &live.interaction)
    }

    pub fn semantic_zoom(&self) -> Option<&SemanticZoom> {
        self.live().map(|live| &live.zoom)
    }

    pub fn transform(&self) -> ViewTransform {
        self.live()
            .map(|live| live.transform)
            .unwrap_or_default()
    }

    pub fn is_simulating(&self) -> bool {
        self.live().is_some_and(|live| live.engine.is_running())
    }

    pub fn entrance_progress(&self) -> f32 {
        self.live()
            .map(|live| (live.entrance_elapsed / ENTRANCE_SECONDS).clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }

    /// World-space radius of a node before hover emphasis.
    pub fn node_radius(&self, index: usize) -> f32 {
        let Some(live) = self.live() else {
            return 0.0;
        };
        let Some(node) = live.graph.nodes.get(index) else {
            return 0.0;
        };
        base_radius(node) * live.zoom.style().node_radius_scale
    }

    pub fn viewport_center(&self) -> Vec2 {
        vec2(self.config.width * 0.5, self.config.height * 0.5)
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        if let Some(live) = self.live_mut() {
            live.transform = transform;
            live.zoom.set_scale(transform.scale);
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.viewport_center(), ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.viewport_center(), 1.0 / ZOOM_STEP);
    }

    /// Back to the initial transform.
    pub fn zoom_to_fit(&mut self) {
        self.set_transform(ViewTransform::default());
    }

    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let transform = self.transform().zoomed_about(anchor, factor);
        self.set_transform(transform);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        let mut transform = self.transform();
        transform.translate += delta;
        self.set_transform(transform);
    }

    /// Reheats the layout to full energy, keeping current positions.
    pub fn restart_layout(&mut self) {
        if let Some(live) = self.live_mut() {
            live.engine.reheat();
        }
    }

    /// Stops the layout and releases graph data and callbacks. Calling it
    /// again does nothing.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        if let SurfaceState::Live(live) = &mut self.state {
            live.engine.stop();
        }
        self.state = SurfaceState::Destroyed;
        self.callbacks = SurfaceCallbacks::default();
        debug!("graph surface destroyed");
    }

    /// Advances animation and layout by `dt` seconds. Returns whether the
    /// host should keep repainting.
    pub fn frame(&mut self, dt: f32) -> bool {
        let style = self.cluster_style;
        let Some(live) = self.live_mut() else {
            return false;
        };
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let ticks = live.stepper.advance(&mut live.engine, dt);
        if ticks > 0 {
            refresh_boundaries(live, &style);
        }
        let zoom_animating = live.zoom.update(dt);
        let hover_animating = live.interaction.update(dt);
        live.entrance_elapsed = (live.entrance_elapsed + dt).min(ENTRANCE_SECONDS);

        live.engine.is_running()
            || zoom_animating
            || hover_animating
            || live.entrance_elapsed < ENTRANCE_SECONDS
    }

    /// Topmost node under a screen point, if any.
    pub fn node_at(&self, screen: Vec2) -> Option<usize> {
        let live = self.live()?;
        let world = live.transform.screen_to_world(screen);
        let slop = HIT_SLOP / live.transform.scale;
        let radius_scale = live.zoom.style().node_radius_scale;

        live.engine
            .positions()
            .iter()
            .enumerate()
            .rev()
            .find(|(index, position)| {
                let radius = base_radius(&live.graph.nodes[*index]) * radius_scale + slop;
                (world - **position).length_sq() <= radius * radius
            })
            .map(|(index, _)| index)
    }

    /// Updates hover from the pointer, firing the hover callback on change.
    pub fn hover_at(&mut self, screen: Option<Vec2>) -> Option<usize> {
        let hit = screen.and_then(|screen| self.node_at(screen));
        let SurfaceState::Live(live) = &mut self.state else {
            return None;
        };

        if live.interaction.dragging().is_none() && live.interaction.set_hovered(hit) {
            let node = hit.and_then(|index| live.graph.nodes.get(index));
            if let Some(callback) = self.callbacks.on_node_hover.as_mut() {
                callback(node);
            }
        }
        live.interaction.hovered()
    }

    /// Fires the click callback for the node under `screen`. Returns true when
    /// the click hit a node and must not reach any enclosing handler.
    pub fn click_at(&mut self, screen: Vec2) -> bool {
        let Some(index) = self.node_at(screen) else {
            return false;
        };
        let SurfaceState::Live(live) = &self.state else {
            return false;
        };
        if let (Some(node), Some(callback)) = (
            live.graph.nodes.get(index),
            self.callbacks.on_node_click.as_mut(),
        ) {
            callback(node);
        }
        true
    }

    /// Pins the node under `screen` and warms the layout. Returns the node
    /// index when a drag started.
    pub fn begin_drag(&mut self, screen: Vec2) -> Option<usize> {
        let index = self.node_at(screen)?;
        let live = self.live_mut()?;
        let position = live.engine.position(index)?;
        live.engine.pin(index, position);
        live.engine.set_alpha_target(DRAG_ALPHA_TARGET);
        live.interaction.begin_drag(index);
        Some(index)
    }

    pub fn drag_to(&mut self, screen: Vec2) {
        let style = self.cluster_style;
        let Some(live) = self.live_mut() else {
            return;
        };
        let Some(index) = live.interaction.dragging() else {
            return;
        };
        let world = live.transform.screen_to_world(screen);
        live.engine.pin(index, world);
        refresh_boundaries(live, &style);
    }

    pub fn end_drag(&mut self) {
        let Some(live) = self.live_mut() else {
            return;
        };
        if let Some(index) = live.interaction.end_drag() {
            live.engine.unpin(index);
            live.engine.set_alpha_target(0.0);
        }
    }

    /// Render-only toggles. Takes effect on the next paint; the graph,
    /// layout and entrance state are left alone. `animate_entrance` only
    /// applies to the next build.
    pub fn set_display(&mut self, show_clusters: bool, show_labels: bool, animate_entrance: bool) {
        self.config.show_clusters = show_clusters;
        self.config.show_labels = show_labels;
        self.config.animate_entrance = animate_entrance;
    }

    /// Selection from the host, by method id. Unknown ids clear it.
    pub fn set_selected(&mut self, id: Option<&str>) {
        self.config.selected_id = id.map(str::to_owned);
        if let Some(live) = self.live_mut() {
            let index = id.and_then(|id| live.graph.index_of(id));
            live.interaction.set_selected(&live.graph, index);
        }
    }
}

impl Drop for GraphSurface {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn base_radius(node: &GraphNode) -> f32 {
    (NODE_BASE_RADIUS + (node.degree as f32).sqrt() * NODE_DEGREE_RADIUS).min(NODE_MAX_RADIUS)
}

fn refresh_boundaries(live: &mut LiveSurface, style: &ClusterStyle) {
    let positions = live.engine.positions();
    live.boundaries.clear();
    live.boundaries.extend(
        live.regions
            .iter()
            .map(|region| region_boundary(region, positions, style)),
    );
}
