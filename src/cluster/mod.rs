pub mod hull;

use std::f32::consts::TAU;

use eframe::egui::{Color32, Vec2, vec2};

use crate::catalog::PipelineStep;
use crate::graph::MethodGraph;
use crate::theme::Theme;

use hull::{closed_cardinal_spline, convex_hull, expand_hull, polygon_contains};

const SINGLE_NODE_EXTRA_RADIUS: f32 = 15.0;
const PAIR_EXTRA_HALF_HEIGHT: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterStyle {
    pub padding: f32,
    pub tension: f32,
    pub samples_per_segment: usize,
}

impl Default for ClusterStyle {
    fn default() -> Self {
        Self {
            padding: 30.0,
            tension: 0.5,
            samples_per_segment: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterRegion {
    pub step_id: String,
    pub name: String,
    pub color: Color32,
    pub members: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClusterBoundary {
    Circle {
        center: Vec2,
        radius: f32,
    },
    Ellipse {
        center: Vec2,
        half_width: f32,
        half_height: f32,
        /// Rotation of the major axis in radians.
        angle: f32,
    },
    Curve {
        points: Vec<Vec2>,
    },
}

impl ClusterBoundary {
    /// Closed polyline approximating the boundary. The first point is not
    /// repeated at the end.
    pub fn outline(&self, segments: usize) -> Vec<Vec2> {
        let segments = segments.max(8);
        match self {
            Self::Circle { center, radius } => (0..segments)
                .map(|step| {
                    let angle = step as f32 / segments as f32 * TAU;
                    *center + vec2(angle.cos(), angle.sin()) * *radius
                })
                .collect(),
            Self::Ellipse {
                center,
                half_width,
                half_height,
                angle,
            } => {
                let (sin, cos) = angle.sin_cos();
                (0..segments)
                    .map(|step| {
                        let t = step as f32 / segments as f32 * TAU;
                        let local = vec2(t.cos() * *half_width, t.sin() * *half_height);
                        *center
                            + vec2(
                                (local.x * cos) - (local.y * sin),
                                (local.x * sin) + (local.y * cos),
                            )
                    })
                    .collect()
            }
            Self::Curve { points } => points.clone(),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Self::Circle { center, radius } => (point - *center).length() <= *radius,
            Self::Ellipse {
                center,
                half_width,
                half_height,
                angle,
            } => {
                let (sin, cos) = angle.sin_cos();
                let delta = point - *center;
                let local_x = (delta.x * cos) + (delta.y * sin);
                let local_y = (-delta.x * sin) + (delta.y * cos);
                let nx = local_x / half_width.max(f32::EPSILON);
                let ny = local_y / half_height.max(f32::EPSILON);
                (nx * nx) + (ny * ny) <= 1.0
            }
            Self::Curve { points } => polygon_contains(points, point),
        }
    }

    /// Topmost point of the outline, where the region label sits.
    pub fn label_anchor(&self) -> Vec2 {
        self.outline(32)
            .into_iter()
            .min_by(|a, b| a.y.total_cmp(&b.y))
            .unwrap_or(Vec2::ZERO)
    }
}

/// Partitions the graph's nodes into one region per pipeline step.
pub fn cluster_regions(
    graph: &MethodGraph,
    steps: &[PipelineStep],
    theme: &Theme,
) -> Vec<ClusterRegion> {
    graph
        .step_groups(steps)
        .into_iter()
        .map(|group| ClusterRegion {
            color: theme.step_color(&group.step_id),
            step_id: group.step_id,
            name: group.name,
            members: group.members,
        })
        .collect()
}

fn two_point_boundary(a: Vec2, b: Vec2, padding: f32) -> ClusterBoundary {
    let delta = b - a;
    ClusterBoundary::Ellipse {
        center: (a + b) * 0.5,
        half_width: (delta.length() * 0.5) + padding,
        half_height: padding + PAIR_EXTRA_HALF_HEIGHT,
        angle: delta.y.atan2(delta.x),
    }
}

/// Boundary enclosing `points` with `style.padding` of clearance.
pub fn boundary(points: &[Vec2], style: &ClusterStyle) -> Option<ClusterBoundary> {
    match points {
        [] => None,
        [single] => Some(ClusterBoundary::Circle {
            center: *single,
            radius: style.padding + SINGLE_NODE_EXTRA_RADIUS,
        }),
        [a, b] => Some(two_point_boundary(*a, *b, style.padding)),
        _ => {
            let hull = convex_hull(points);
            match hull.as_slice() {
                [] => None,
                [single] => Some(ClusterBoundary::Circle {
                    center: *single,
                    radius: style.padding + SINGLE_NODE_EXTRA_RADIUS,
                }),
                [a, b] => Some(two_point_boundary(*a, *b, style.padding)),
                _ => {
                    let expanded = expand_hull(&hull, style.padding);
                    Some(ClusterBoundary::Curve {
                        points: closed_cardinal_spline(
                            &expanded,
                            style.tension,
                            style.samples_per_segment,
                        ),
                    })
                }
            }
        }
    }
}

pub fn region_boundary(
    region: &ClusterRegion,
    positions: &[Vec2],
    style: &ClusterStyle,
) -> Option<ClusterBoundary> {
    let points = region
        .members
        .iter()
        .filter_map(|&index| positions.get(index).copied())
        .collect::<Vec<_>>();
    boundary(&points, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_is_padded_circle() {
        let style = ClusterStyle::default();
        let shape = boundary(&[vec2(3.0, 4.0)], &style).expect("boundary");
        assert_eq!(
            shape,
            ClusterBoundary::Circle {
                center: vec2(3.0, 4.0),
                radius: 45.0
            }
        );
        for point in shape.outline(24) {
            assert!(((point - vec2(3.0, 4.0)).length() - 45.0).abs() < 1e-3);
        }
    }

    #[test]
    fn pair_is_rotated_ellipse() {
        let style = ClusterStyle::default();
        let shape = boundary(&[vec2(0.0, 0.0), vec2(0.0, 100.0)], &style).expect("boundary");
        let ClusterBoundary::Ellipse {
            center,
            half_width,
            half_height,
            angle,
        } = shape
        else {
            panic!("expected ellipse, got {shape:?}");
        };
        assert_eq!(center, vec2(0.0, 50.0));
        assert_eq!(half_width, 80.0);
        assert_eq!(half_height, 50.0);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!(shape.contains(vec2(0.0, 0.0)));
        assert!(shape.contains(vec2(0.0, 100.0)));
        assert!(!shape.contains(vec2(60.0, 50.0)));
    }

    #[test]
    fn triangle_curve_encloses_members() {
        let points = [vec2(0.0, 0.0), vec2(120.0, 10.0), vec2(50.0, 90.0)];
        let shape = boundary(&points, &ClusterStyle::default()).expect("boundary");
        assert!(matches!(shape, ClusterBoundary::Curve { .. }));
        for point in points {
            assert!(shape.contains(point));
        }
    }

    #[test]
    fn collinear_triple_falls_back_to_ellipse() {
        let points = [vec2(0.0, 0.0), vec2(50.0, 0.0), vec2(100.0, 0.0)];
        let shape = boundary(&points, &ClusterStyle::default()).expect("boundary");
        assert!(matches!(shape, ClusterBoundary::Ellipse { .. }));
        for point in points {
            assert!(shape.contains(point));
        }
    }

    #[test]
    fn label_anchor_is_topmost() {
        let shape = ClusterBoundary::Circle {
            center: vec2(0.0, 0.0),
            radius: 10.0,
        };
        let anchor = shape.label_anchor();
        assert!((anchor.y + 10.0).abs() < 1e-3);
    }
}
