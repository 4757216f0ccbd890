use eframe::egui::{Vec2, vec2};

use super::quadtree::{CellId, ChargeTree};

/// Deterministic tiny offset for coincident points, standing in for random
/// jiggle so that identical inputs always lay out identically.
pub(super) fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ManyBodyParams {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Charge contribution of `mass` nodes concentrated at `center` onto `point`.
fn charge(point: Vec2, center: Vec2, mass: f32, params: ManyBodyParams, alpha: f32) -> Vec2 {
    let delta = center - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (params.strength * mass * alpha / distance_sq.max(f32::EPSILON))
}

/// Barnes-Hut many-body velocity change for node `index`, starting at `cell`.
pub(super) fn accumulate_many_body(
    tree: &ChargeTree,
    cell: CellId,
    index: usize,
    positions: &[Vec2],
    params: ManyBodyParams,
    alpha: f32,
    velocity: &mut Vec2,
) {
    let node = &tree[cell];
    if node.charge <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.points {
            if other_index == index {
                continue;
            }
            let mut other = positions[other_index];
            if (other - point).length_sq() <= f32::EPSILON {
                other += jiggle(index, other_index);
            }
            *velocity += charge(point, other, 1.0, params, alpha);
        }
        return;
    }

    let distance_sq = (node.centroid - point).length_sq().max(f32::EPSILON);
    if (node.width * node.width) / distance_sq < params.theta * params.theta {
        *velocity += charge(point, node.centroid, node.charge, params, alpha);
        return;
    }

    for child in tree.children(cell) {
        accumulate_many_body(tree, child, index, positions, params, alpha, velocity);
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    radius: f32,
    strength: f32,
    deltas: &mut [Vec2],
) {
    let mut delta = predicted[from] - predicted[to];
    if delta.length_sq() <= f32::EPSILON {
        delta = jiggle(from, to);
    }
    let distance = delta.length();
    let min_distance = radius * 2.0;
    if distance >= min_distance {
        return;
    }

    // Equal radii share the correction evenly.
    let push = delta * ((min_distance - distance) / distance * strength * 0.5);
    deltas[from] += push;
    deltas[to] -= push;
}

/// Collision velocity changes for every overlapping pair drawn from cells
/// `a` and `b`, skipping cell pairs further apart than two radii. Passing
/// the same cell twice resolves the pairs inside it.
pub(super) fn accumulate_collision_pairs(
    tree: &ChargeTree,
    a: CellId,
    b: CellId,
    predicted: &[Vec2],
    radius: f32,
    strength: f32,
    deltas: &mut [Vec2],
) {
    let (cell_a, cell_b) = (&tree[a], &tree[b]);
    let reach = radius * 2.0;
    if cell_a.gap_sq(cell_b) > reach * reach {
        return;
    }

    if a == b {
        if cell_a.is_leaf() {
            for (position, &from) in cell_a.points.iter().enumerate() {
                for &to in &cell_a.points[position + 1..] {
                    resolve_overlap(from, to, predicted, radius, strength, deltas);
                }
            }
            return;
        }

        let children = tree.children(a).collect::<Vec<_>>();
        for (position, &first) in children.iter().enumerate() {
            accumulate_collision_pairs(tree, first, first, predicted, radius, strength, deltas);
            for &second in &children[position + 1..] {
                accumulate_collision_pairs(tree, first, second, predicted, radius, strength, deltas);
            }
        }
        return;
    }

    match (cell_a.is_leaf(), cell_b.is_leaf()) {
        (true, true) => {
            for &from in &cell_a.points {
                for &to in &cell_b.points {
                    resolve_overlap(from, to, predicted, radius, strength, deltas);
                }
            }
        }
        // Descend into the larger of two split cells.
        (false, false) if cell_a.width >= cell_b.width => {
            for child in tree.children(a) {
                accumulate_collision_pairs(tree, child, b, predicted, radius, strength, deltas);
            }
        }
        (false, true) => {
            for child in tree.children(a) {
                accumulate_collision_pairs(tree, child, b, predicted, radius, strength, deltas);
            }
        }
        _ => {
            for child in tree.children(b) {
                accumulate_collision_pairs(tree, a, child, predicted, radius, strength, deltas);
            }
        }
    }
}

/// Spring pass over all links, updating velocities in link order.
pub(super) fn apply_links(
    links: &[LinkSpring],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta = (positions[target] + velocities[target])
            - (positions[source] + velocities[source]);
        if delta.length_sq() <= f32::EPSILON {
            delta = jiggle(source, target);
        }
        let distance = delta.length();
        let correction = delta * ((distance - link.distance) / distance * alpha * link.strength);
        velocities[target] -= correction * link.bias;
        velocities[source] += correction * (1.0 - link.bias);
    }
}

/// Pulls each node toward its anchor along both axes.
pub(super) fn apply_anchor_pull(
    positions: &[Vec2],
    anchors: impl Iterator<Item = Option<Vec2>>,
    strength: f32,
    alpha: f32,
    velocities: &mut [Vec2],
) {
    for ((position, anchor), velocity) in positions.iter().zip(anchors).zip(velocities.iter_mut()) {
        if let Some(anchor) = anchor {
            *velocity += (anchor - *position) * (strength * alpha);
        }
    }
}
