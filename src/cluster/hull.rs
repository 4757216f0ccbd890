use std::cmp::Ordering;

use eframe::egui::{Vec2, vec2};

fn cross(origin: Vec2, a: Vec2, b: Vec2) -> f32 {
    let oa = a - origin;
    let ob = b - origin;
    (oa.x * ob.y) - (oa.y * ob.x)
}

/// Convex hull by monotone chain. Collinear and duplicate points are dropped,
/// so three points on a line collapse to their two extremes.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted = points
        .iter()
        .copied()
        .filter(|point| point.x.is_finite() && point.y.is_finite())
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| match a.x.total_cmp(&b.x) {
        Ordering::Equal => a.y.total_cmp(&b.y),
        other => other,
    });
    sorted.dedup_by(|a, b| (*a - *b).length_sq() <= f32::EPSILON);

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for &point in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], point) <= 0.0
        {
            lower.pop();
        }
        lower.push(point);
    }

    let mut upper: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for &point in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], point) <= 0.0
        {
            upper.pop();
        }
        upper.push(point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn centroid(points: &[Vec2]) -> Vec2 {
    let sum = points.iter().fold(Vec2::ZERO, |sum, point| sum + *point);
    sum / points.len().max(1) as f32
}

fn outward_normal(a: Vec2, b: Vec2, center: Vec2) -> Vec2 {
    let edge = b - a;
    let mut normal = vec2(edge.y, -edge.x);
    let length = normal.length();
    if length <= f32::EPSILON {
        return Vec2::ZERO;
    }
    normal /= length;
    let midpoint = (a + b) * 0.5;
    if normal.dot(midpoint - center) < 0.0 {
        normal = -normal;
    }
    normal
}

/// Pushes every hull vertex out along the mean normal of its two edges.
pub fn expand_hull(hull: &[Vec2], padding: f32) -> Vec<Vec2> {
    let count = hull.len();
    if count < 3 {
        return hull.to_vec();
    }

    let center = centroid(hull);
    (0..count)
        .map(|index| {
            let previous = hull[(index + count - 1) % count];
            let current = hull[index];
            let next = hull[(index + 1) % count];

            let averaged =
                outward_normal(previous, current, center) + outward_normal(current, next, center);
            let length = averaged.length();
            let direction = if length > f32::EPSILON {
                averaged / length
            } else {
                (current - center).normalized()
            };
            current + direction * padding
        })
        .collect()
}

/// Samples a closed cardinal spline through `points`. `tension` 0 gives a
/// Catmull-Rom curve, 1 gives straight segments.
pub fn closed_cardinal_spline(points: &[Vec2], tension: f32, samples_per_segment: usize) -> Vec<Vec2> {
    let count = points.len();
    if count < 3 {
        return points.to_vec();
    }

    let samples = samples_per_segment.max(1);
    let scale = (1.0 - tension.clamp(0.0, 1.0)) * 0.5;
    let mut curve = Vec::with_capacity(count * samples);

    for index in 0..count {
        let p0 = points[(index + count - 1) % count];
        let p1 = points[index];
        let p2 = points[(index + 1) % count];
        let p3 = points[(index + 2) % count];
        let m1 = (p2 - p0) * scale;
        let m2 = (p3 - p1) * scale;

        for step in 0..samples {
            let t = step as f32 / samples as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = (2.0 * t3) - (3.0 * t2) + 1.0;
            let h10 = t3 - (2.0 * t2) + t;
            let h01 = (-2.0 * t3) + (3.0 * t2);
            let h11 = t3 - t2;
            curve.push((p1 * h00) + (m1 * h10) + (p2 * h01) + (m2 * h11));
        }
    }

    curve
}

/// Even-odd point-in-polygon test on a closed polyline.
pub fn polygon_contains(polygon: &[Vec2], point: Vec2) -> bool {
    let count = polygon.len();
    if count < 3 {
        return false;
    }

    let mut inside = false;
    let mut previous = polygon[count - 1];
    for &current in polygon {
        if (current.y > point.y) != (previous.y > point.y) {
            let t = (point.y - current.y) / (previous.y - current.y);
            let crossing_x = current.x + t * (previous.x - current.x);
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let points = [
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(5.0, 0.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
            vec2(5.0, 5.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&vec2(5.0, 5.0)));
        assert!(!hull.contains(&vec2(5.0, 0.0)));
    }

    #[test]
    fn collinear_points_collapse_to_extremes() {
        let hull = convex_hull(&[vec2(0.0, 0.0), vec2(1.0, 1.0), vec2(2.0, 2.0)]);
        assert_eq!(hull, vec![vec2(0.0, 0.0), vec2(2.0, 2.0)]);
    }

    #[test]
    fn expansion_moves_vertices_away_from_center() {
        let square = [
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ];
        let expanded = expand_hull(&square, 5.0);
        let center = vec2(5.0, 5.0);
        for (before, after) in square.iter().zip(&expanded) {
            let grown = (*after - center).length() - (*before - center).length();
            assert!((grown - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn spline_passes_through_control_points() {
        let triangle = [vec2(0.0, 0.0), vec2(20.0, 0.0), vec2(10.0, 15.0)];
        let curve = closed_cardinal_spline(&triangle, 0.5, 6);
        assert_eq!(curve.len(), 18);
        assert_eq!(curve[0], triangle[0]);
        assert_eq!(curve[6], triangle[1]);
        assert_eq!(curve[12], triangle[2]);
    }

    #[test]
    fn polygon_contains_center_not_outside() {
        let square = [
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ];
        assert!(polygon_contains(&square, vec2(5.0, 5.0)));
        assert!(!polygon_contains(&square, vec2(15.0, 5.0)));
    }
}
