use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, vec2};

use method_atlas::surface::ViewTransform;

const CURVE_SAMPLES: usize = 12;
const CURVE_BEND: f32 = 0.15;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Same color with its alpha scaled by `opacity`.
pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)) as u8)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, background: Color32, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, background);

    let step = (56.0 * transform.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 50));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(start, end).expand(padding);
    rect.intersects(bounds)
}

pub(super) fn world_to_screen(rect: Rect, transform: ViewTransform, world: Vec2) -> Pos2 {
    rect.min + transform.world_to_screen(world)
}

/// Polyline along a gentle quadratic arc from `start` to `end`, bending to
/// the left of the travel direction.
pub(super) fn curved_path(start: Pos2, end: Pos2) -> Vec<Pos2> {
    let delta = end - start;
    let normal = vec2(-delta.y, delta.x);
    let control = start + (delta * 0.5) + (normal * CURVE_BEND);

    (0..=CURVE_SAMPLES)
        .map(|step| {
            let t = step as f32 / CURVE_SAMPLES as f32;
            let inverse = 1.0 - t;
            let point = (start.to_vec2() * (inverse * inverse))
                + (control.to_vec2() * (2.0 * inverse * t))
                + (end.to_vec2() * (t * t));
            point.to_pos2()
        })
        .collect()
}

pub(super) fn stroke_path(painter: &Painter, path: Vec<Pos2>, stroke: Stroke, dash: Option<(f32, f32)>) {
    match dash {
        Some((dash_length, gap_length)) => {
            painter.extend(Shape::dashed_line(&path, stroke, dash_length, gap_length));
        }
        None => {
            painter.add(Shape::line(path, stroke));
        }
    }
}

/// Filled arrowhead whose tip sits `inset` short of `tip`, pointing from
/// `from` toward `tip`.
pub(super) fn draw_arrow_head(painter: &Painter, from: Pos2, tip: Pos2, inset: f32, size: f32, color: Color32) {
    let delta = tip - from;
    let length = delta.length();
    if length <= inset + size {
        return;
    }

    let direction = delta / length;
    let point = tip - (direction * inset);
    let back = point - (direction * size);
    let side = vec2(-direction.y, direction.x) * (size * 0.5);
    painter.add(Shape::convex_polygon(
        vec![point, back + side, back - side],
        color,
        Stroke::NONE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curved_path_keeps_endpoints() {
        let start = Pos2::new(0.0, 0.0);
        let end = Pos2::new(100.0, 0.0);
        let path = curved_path(start, end);
        assert_eq!(path.len(), CURVE_SAMPLES + 1);
        assert_eq!(path[0], start);
        assert_eq!(*path.last().expect("end"), end);
        assert!(path[CURVE_SAMPLES / 2].y.abs() > 1.0);
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let color = with_opacity(Color32::from_rgb(10, 20, 30), 0.5);
        assert_eq!(color.a(), 127);
    }
}
