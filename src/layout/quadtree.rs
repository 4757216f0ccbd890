//! Flat Barnes-Hut tree over node positions.
//!
//! Cells live in one arena. A child is always pushed after its parent, so a
//! reverse sweep over the arena visits children before parents and can fold
//! each cell's charge and centroid out of its children in one pass.

use std::ops::Index;

use eframe::egui::{Vec2, vec2};

pub(super) type CellId = usize;

pub(super) const ROOT: CellId = 0;

const MAX_POINTS_PER_CELL: usize = 8;
const MAX_SPLITS: u32 = 12;
const ROOT_PADDING: f32 = 1.0;

pub(super) struct Cell {
    /// Top-left corner of the square this cell covers.
    pub(super) min: Vec2,
    pub(super) width: f32,
    /// Charge-weighted mean of every node under the cell.
    pub(super) centroid: Vec2,
    /// Number of nodes under the cell; every node carries unit charge.
    pub(super) charge: f32,
    /// Node indices, only populated on leaves.
    pub(super) points: Vec<usize>,
    /// Children by quadrant: bit 0 set for the right half, bit 1 for the lower half.
    pub(super) children: [Option<CellId>; 4],
}

impl Cell {
    fn covering(min: Vec2, width: f32, points: Vec<usize>) -> Self {
        Self {
            min,
            width,
            centroid: Vec2::ZERO,
            charge: 0.0,
            points,
            children: [None; 4],
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    fn quadrant_of(&self, point: Vec2) -> usize {
        let mid = self.min + Vec2::splat(self.width * 0.5);
        usize::from(point.x >= mid.x) | (usize::from(point.y >= mid.y) << 1)
    }

    /// Squared length of the empty gap between two cells, zero when they touch.
    pub(super) fn gap_sq(&self, other: &Cell) -> f32 {
        let axis_gap = |a_min: f32, a_width: f32, b_min: f32, b_width: f32| {
            (b_min - (a_min + a_width)).max(a_min - (b_min + b_width)).max(0.0)
        };
        let dx = axis_gap(self.min.x, self.width, other.min.x, other.width);
        let dy = axis_gap(self.min.y, self.width, other.min.y, other.width);
        dx * dx + dy * dy
    }
}

pub(super) struct ChargeTree {
    cells: Vec<Cell>,
}

impl ChargeTree {
    /// Builds the tree over `positions`, or nothing when there are no points
    /// or any coordinate is not finite.
    pub(super) fn over(positions: &[Vec2]) -> Option<Self> {
        let (min, width) = square_extent(positions)?;
        let mut tree = Self {
            cells: vec![Cell::covering(min, width, (0..positions.len()).collect())],
        };
        tree.split(positions);
        tree.aggregate(positions);
        Some(tree)
    }

    fn split(&mut self, positions: &[Vec2]) {
        let mut pending = vec![(ROOT, 0u32)];
        while let Some((id, splits)) = pending.pop() {
            let cell = &self.cells[id];
            if splits >= MAX_SPLITS || cell.points.len() <= MAX_POINTS_PER_CELL {
                continue;
            }

            let mut buckets: [Vec<usize>; 4] = Default::default();
            for &point in &cell.points {
                buckets[cell.quadrant_of(positions[point])].push(point);
            }
            // Coincident points would split forever.
            if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
                continue;
            }

            let (min, half) = (cell.min, cell.width * 0.5);
            self.cells[id].points = Vec::new();
            for (quadrant, points) in buckets.into_iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                let offset = vec2((quadrant & 1) as f32, (quadrant >> 1) as f32) * half;
                let child = self.cells.len();
                self.cells.push(Cell::covering(min + offset, half, points));
                self.cells[id].children[quadrant] = Some(child);
                pending.push((child, splits + 1));
            }
        }
    }

    fn aggregate(&mut self, positions: &[Vec2]) {
        for id in (0..self.cells.len()).rev() {
            let cell = &self.cells[id];
            let (weighted, charge) = if cell.is_leaf() {
                cell.points
                    .iter()
                    .fold((Vec2::ZERO, 0.0), |(sum, total), &point| {
                        (sum + positions[point], total + 1.0)
                    })
            } else {
                self.children(id)
                    .map(|child| &self.cells[child])
                    .fold((Vec2::ZERO, 0.0), |(sum, total), child| {
                        (sum + child.centroid * child.charge, total + child.charge)
                    })
            };

            let cell = &mut self.cells[id];
            cell.charge = charge;
            if charge > 0.0 {
                cell.centroid = weighted / charge;
            }
        }
    }

    pub(super) fn children(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.cells[id].children.iter().flatten().copied()
    }
}

impl Index<CellId> for ChargeTree {
    type Output = Cell;

    fn index(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }
}

/// Smallest padded square holding every point, as its top-left corner and width.
fn square_extent(positions: &[Vec2]) -> Option<(Vec2, f32)> {
    let (first, rest) = positions.split_first()?;
    let (low, high) = rest
        .iter()
        .fold((*first, *first), |(low, high), point| (low.min(*point), high.max(*point)));
    if !(low.x.is_finite() && low.y.is_finite() && high.x.is_finite() && high.y.is_finite()) {
        return None;
    }

    let span = high - low;
    let width = span.x.max(span.y).max(1.0) + 2.0 * ROOT_PADDING;
    let mid = (low + high) * 0.5;
    Some((mid - Vec2::splat(width * 0.5), width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points_under(tree: &ChargeTree, id: CellId) -> usize {
        tree[id].points.len()
            + tree
                .children(id)
                .map(|child| points_under(tree, child))
                .sum::<usize>()
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = (0..100)
            .map(|index| vec2((index % 10) as f32 * 13.0, (index / 10) as f32 * 7.0))
            .collect::<Vec<_>>();
        let tree = ChargeTree::over(&positions).expect("finite points");
        assert_eq!(points_under(&tree, ROOT), positions.len());
        assert_eq!(tree[ROOT].charge, 100.0);
        assert!(!tree[ROOT].is_leaf());
    }

    #[test]
    fn parent_centroid_is_the_charge_weighted_mean() {
        let mut positions = vec![vec2(0.0, 0.0); 9];
        positions.extend(std::iter::repeat_n(vec2(100.0, 100.0), 3));
        let tree = ChargeTree::over(&positions).expect("finite points");

        let root = &tree[ROOT];
        assert_eq!(root.charge, 12.0);
        assert!((root.centroid - vec2(25.0, 25.0)).length() < 1e-3);
        for child in tree.children(ROOT) {
            let cell = &tree[child];
            assert!(cell.width < root.width);
            assert!(cell.charge == 9.0 || cell.charge == 3.0);
        }
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(4.0, 4.0); 40];
        let tree = ChargeTree::over(&positions).expect("finite points");
        assert!(tree[ROOT].is_leaf());
        assert_eq!(tree[ROOT].points.len(), 40);
    }

    #[test]
    fn non_finite_points_build_nothing() {
        assert!(ChargeTree::over(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(ChargeTree::over(&[]).is_none());
    }
}
