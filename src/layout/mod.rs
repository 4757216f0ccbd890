//! Force-directed layout for the method graph.
//!
//! The engine owns every node position and velocity. Rendering and cluster
//! geometry only read them through [`LayoutEngine::positions`]; the one write
//! path from outside is pinning during a drag.

mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use eframe::egui::{Vec2, vec2};

use crate::catalog::PipelineStep;
use crate::graph::{LinkKind, MethodGraph};

use forces::{
    LinkSpring, ManyBodyParams, accumulate_collision_pairs, accumulate_many_body,
    apply_anchor_pull, apply_links,
};
use quadtree::{ChargeTree, ROOT};

pub const MIN_SPACING: f32 = 0.5;
pub const MAX_SPACING: f32 = 3.0;

const ALPHA_MIN: f32 = 0.001;
const VELOCITY_DECAY: f32 = 0.4;
const BARNES_HUT_THETA: f32 = 0.9;
const CHARGE_PER_SPACING: f32 = -500.0;
const CHARGE_DISTANCE_MAX: f32 = 800.0;
const COLLISION_RADIUS_PER_SPACING: f32 = 40.0;
const AXIS_PULL_PER_INVERSE_SPACING: f32 = 0.015;
const CLUSTER_PULL: f32 = 0.12;
const LINK_STRENGTH_PER_INVERSE_SPACING: f32 = 0.4;
const PHYLLOTAXIS_RADIUS: f32 = 10.0;

pub const DRAG_ALPHA_TARGET: f32 = 0.3;

/// Inputs that shape the forces; everything else is derived from these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    pub width: f32,
    pub height: f32,
    pub spacing: f32,
}

impl LayoutParams {
    pub fn new(width: f32, height: f32, spacing: f32) -> Self {
        Self {
            width,
            height,
            spacing: spacing.clamp(MIN_SPACING, MAX_SPACING),
        }
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    pub fn link_distance(&self, kind: LinkKind) -> f32 {
        kind.base_distance() * self.spacing
    }

    pub fn link_strength(&self, edge_strength: f32) -> f32 {
        edge_strength * (LINK_STRENGTH_PER_INVERSE_SPACING / self.spacing)
    }

    pub fn collision_radius(&self) -> f32 {
        COLLISION_RADIUS_PER_SPACING * self.spacing
    }

    pub fn cluster_ring_radius(&self) -> f32 {
        self.width.min(self.height) * (0.25 + self.spacing * 0.1)
    }
}

#[derive(Default)]
struct PhysicsScratch {
    predicted: Vec<Vec2>,
    collision: Vec<Vec2>,
}

pub struct LayoutEngine {
    params: LayoutParams,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Vec2>>,
    links: Vec<LinkSpring>,
    slot_by_node: Vec<Option<usize>>,
    slot_centers: Vec<Vec2>,
    alpha: f32,
    alpha_target: f32,
    alpha_decay: f32,
    running: bool,
    scratch: PhysicsScratch,
}

fn phyllotaxis(index: usize, center: Vec2) -> Vec2 {
    let radius = PHYLLOTAXIS_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    center + vec2(angle.cos(), angle.sin()) * radius
}

impl LayoutEngine {
    pub fn new(graph: &MethodGraph, steps: &[PipelineStep], params: LayoutParams) -> Self {
        let node_count = graph.nodes.len();
        let center = params.center();

        let mut ordered_steps = steps.iter().collect::<Vec<_>>();
        ordered_steps.sort_by_key(|step| step.order);
        let ring = params.cluster_ring_radius();
        let slot_centers = ordered_steps
            .iter()
            .enumerate()
            .map(|(slot, _)| {
                let angle = (slot as f32 / ordered_steps.len() as f32) * TAU - FRAC_PI_2;
                center + vec2(angle.cos(), angle.sin()) * ring
            })
            .collect::<Vec<_>>();
        let slot_by_step = ordered_steps
            .iter()
            .enumerate()
            .map(|(slot, step)| (step.id.as_str(), slot))
            .collect::<HashMap<_, _>>();
        let slot_by_node = graph
            .nodes
            .iter()
            .map(|node| slot_by_step.get(node.pipeline_step.as_str()).copied())
            .collect::<Vec<_>>();

        let links = graph
            .edges
            .iter()
            .map(|edge| {
                let source_degree = graph.nodes[edge.source].degree.max(1) as f32;
                let target_degree = graph.nodes[edge.target].degree.max(1) as f32;
                LinkSpring {
                    source: edge.source,
                    target: edge.target,
                    distance: params.link_distance(edge.kind),
                    strength: params.link_strength(edge.strength),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect::<Vec<_>>();

        Self {
            params,
            positions: (0..node_count)
                .map(|index| phyllotaxis(index, center))
                .collect(),
            velocities: vec![Vec2::ZERO; node_count],
            pins: vec![None; node_count],
            links,
            slot_by_node,
            slot_centers,
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
            running: node_count > 0,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.positions.get(index).copied()
    }

    pub fn slot_center(&self, index: usize) -> Option<Vec2> {
        self.slot_by_node
            .get(index)
            .copied()
            .flatten()
            .and_then(|slot| self.slot_centers.get(slot).copied())
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.pins.get(index).is_some_and(Option::is_some)
    }

    /// Fixes a node in place until [`Self::unpin`]. The node also moves there
    /// immediately, so the next rendered frame already shows it.
    pub fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(pin) = self.pins.get_mut(index) {
            *pin = Some(position);
            self.positions[index] = position;
            self.velocities[index] = Vec2::ZERO;
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(pin) = self.pins.get_mut(index) {
            *pin = None;
        }
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
        if self.alpha_target > 0.0 {
            self.running = !self.positions.is_empty();
        }
    }

    /// Back to full energy without touching positions.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.running = !self.positions.is_empty();
    }

    /// Halts ticking immediately. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advances the simulation by one step. Returns whether it is still
    /// running afterwards.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;
        let params = self.params;
        let center = params.center();
        let node_count = self.positions.len();

        apply_links(&self.links, &self.positions, &mut self.velocities, alpha);

        let many_body = ManyBodyParams {
            strength: CHARGE_PER_SPACING * params.spacing,
            distance_min_sq: 1.0,
            distance_max_sq: CHARGE_DISTANCE_MAX * CHARGE_DISTANCE_MAX,
            theta: BARNES_HUT_THETA,
        };
        if let Some(tree) = ChargeTree::over(&self.positions) {
            for (index, velocity) in self.velocities.iter_mut().enumerate() {
                accumulate_many_body(&tree, ROOT, index, &self.positions, many_body, alpha, velocity);
            }
        }

        apply_anchor_pull(
            &self.positions,
            std::iter::repeat(Some(center)),
            AXIS_PULL_PER_INVERSE_SPACING / params.spacing,
            alpha,
            &mut self.velocities,
        );

        let slot_centers = &self.slot_centers;
        apply_anchor_pull(
            &self.positions,
            self.slot_by_node
                .iter()
                .map(|slot| slot.and_then(|slot| slot_centers.get(slot).copied())),
            CLUSTER_PULL,
            alpha,
            &mut self.velocities,
        );

        let scratch = &mut self.scratch;
        scratch.predicted.clear();
        scratch.predicted.extend(
            self.positions
                .iter()
                .zip(&self.velocities)
                .map(|(position, velocity)| *position + *velocity),
        );
        scratch.collision.clear();
        scratch.collision.resize(node_count, Vec2::ZERO);
        if let Some(tree) = ChargeTree::over(&scratch.predicted) {
            accumulate_collision_pairs(
                &tree,
                ROOT,
                ROOT,
                &scratch.predicted,
                params.collision_radius(),
                1.0,
                &mut scratch.collision,
            );
        }
        for (velocity, push) in self.velocities.iter_mut().zip(&scratch.collision) {
            *velocity += *push;
        }

        if node_count > 0 {
            let mean = self
                .positions
                .iter()
                .fold(Vec2::ZERO, |sum, position| sum + *position)
                / node_count as f32;
            let shift = mean - center;
            for position in &mut self.positions {
                *position -= shift;
            }
        }

        for index in 0..node_count {
            match self.pins[index] {
                Some(pin) => {
                    self.positions[index] = pin;
                    self.velocities[index] = Vec2::ZERO;
                }
                None => {
                    self.velocities[index] *= 1.0 - VELOCITY_DECAY;
                    self.positions[index] += self.velocities[index];
                }
            }
        }

        if self.alpha < ALPHA_MIN && self.alpha_target <= 0.0 {
            self.running = false;
        }
        self.running
    }
}

/// Fixed-timestep driver between the host's frame clock and the engine.
#[derive(Clone, Debug)]
pub struct Stepper {
    tick_seconds: f32,
    max_ticks_per_frame: usize,
    accumulator: f32,
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 4)
    }
}

impl Stepper {
    pub fn new(tick_seconds: f32, max_ticks_per_frame: usize) -> Self {
        Self {
            tick_seconds: tick_seconds.max(1e-4),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: 0.0,
        }
    }

    /// Runs as many ticks as `elapsed` seconds cover, capped per frame, and
    /// returns how many ran. Time beyond the cap is dropped so a stalled host
    /// does not trigger a burst of catch-up work.
    pub fn advance(&mut self, engine: &mut LayoutEngine, elapsed: f32) -> usize {
        if !engine.is_running() {
            self.accumulator = 0.0;
            return 0;
        }

        self.accumulator += elapsed.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= self.tick_seconds && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.tick_seconds;
            ticks += 1;
            if !engine.tick() {
                break;
            }
        }
        if ticks == self.max_ticks_per_frame {
            self.accumulator = self.accumulator.min(self.tick_seconds);
        }
        ticks
    }
}
