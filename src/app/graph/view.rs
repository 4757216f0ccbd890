use std::f32::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2};

use method_atlas::catalog::Catalog;
use method_atlas::graph::GraphNode;
use method_atlas::interaction::{EdgeEmphasis, NodeEmphasis};
use method_atlas::surface::GraphSurface;
use method_atlas::theme::Theme;
use method_atlas::zoom::{DetailCard, LevelStyle};

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, circle_visible, curved_path, draw_arrow_head, draw_background, edge_visible,
    stroke_path, with_opacity, world_to_screen,
};

const CLUSTER_OUTLINE_SEGMENTS: usize = 48;
const MAX_DETAIL_CARDS: usize = 60;
const MAX_MODALITY_DOTS: usize = 6;
const RETRY_REPAINT_DELAY: Duration = Duration::from_millis(50);

struct Counts {
    nodes: usize,
    edges: usize,
}

fn draw_clusters(painter: &Painter, rect: Rect, surface: &GraphSurface, style: &LevelStyle, fade: f32) {
    let transform = surface.transform();
    for (region, boundary) in surface.boundaries() {
        let Some(boundary) = boundary else {
            continue;
        };

        let points = boundary
            .outline(CLUSTER_OUTLINE_SEGMENTS)
            .into_iter()
            .map(|point| world_to_screen(rect, transform, point))
            .collect::<Vec<_>>();
        let fill = with_opacity(region.color, style.cluster_opacity * fade);
        let outline = with_opacity(region.color, (style.cluster_opacity * 3.0).min(0.75) * fade);
        painter.add(Shape::convex_polygon(points.clone(), fill, Stroke::NONE));
        painter.add(Shape::closed_line(points, Stroke::new(1.5, outline)));

        let anchor = world_to_screen(rect, transform, boundary.label_anchor()) - vec2(0.0, 6.0);
        painter.text(
            anchor,
            Align2::CENTER_BOTTOM,
            &region.name,
            FontId::proportional(style.cluster_label_size),
            with_opacity(region.color, (0.35 + style.cluster_opacity * 2.0).min(1.0) * fade),
        );
    }
}

fn draw_edges(painter: &Painter, rect: Rect, surface: &GraphSurface, style: &LevelStyle, fade: f32) -> usize {
    let (Some(graph), Some(interaction)) = (surface.graph(), surface.interaction()) else {
        return 0;
    };
    let transform = surface.transform();
    let positions = surface.positions();

    let mut drawn = 0;
    for edge in &graph.edges {
        let start = world_to_screen(rect, transform, positions[edge.source]);
        let end = world_to_screen(rect, transform, positions[edge.target]);
        if !edge_visible(rect, start, end, 4.0) {
            continue;
        }

        let edge_style = edge.style();
        let EdgeEmphasis {
            opacity,
            width_scale,
        } = interaction.edge_emphasis(edge, style.edge_opacity);
        let width = style.edge_width(edge_style.width) * width_scale;
        let color = with_opacity(edge_style.color, opacity * fade);
        let stroke = Stroke::new(width, color);

        let path = if edge_style.curved {
            curved_path(start, end)
        } else {
            vec![start, end]
        };
        stroke_path(painter, path, stroke, edge_style.dash);

        if edge_style.arrow {
            let target_radius = surface.node_radius(edge.target) * transform.scale;
            draw_arrow_head(painter, start, end, target_radius + 2.0, 5.0 + width * 2.0, color);
        }
        drawn += 1;
    }
    drawn
}

fn draw_modality_dots(
    painter: &Painter,
    theme: &Theme,
    node: &GraphNode,
    center: Pos2,
    radius: f32,
    style: &LevelStyle,
    opacity: f32,
) {
    let dot_radius = style.modality_dot_radius * 0.5;
    for (slot, modality) in node.modalities.iter().take(MAX_MODALITY_DOTS).enumerate() {
        let angle = -FRAC_PI_2 + (slot as f32 * 0.55);
        let position = center + vec2(angle.cos(), angle.sin()) * (radius + dot_radius + 1.0);
        painter.circle_filled(
            position,
            dot_radius,
            with_opacity(theme.modality_color(modality), style.modality_dot_opacity * opacity),
        );
    }
}

fn draw_detail_card(
    painter: &Painter,
    catalog: &Catalog,
    theme: &Theme,
    node: &GraphNode,
    anchor: Pos2,
    card: DetailCard,
    opacity: f32,
) {
    let text_color = with_opacity(theme.label, opacity);
    let muted = with_opacity(Color32::from_gray(170), opacity);
    let mut lines = vec![(node.short_name.clone(), FontId::proportional(12.0), text_color)];

    let year = node.year.map(|year| year.to_string()).unwrap_or_else(|| "n/a".to_owned());
    let maturity = if node.maturity.is_empty() { "unrated" } else { node.maturity.as_str() };
    lines.push((format!("{year} · {maturity}"), FontId::proportional(11.0), muted));

    if card == DetailCard::Full {
        let step = catalog
            .step(&node.pipeline_step)
            .map(|step| step.name.as_str())
            .unwrap_or(node.pipeline_step.as_str());
        lines.push((format!("step: {step}"), FontId::proportional(11.0), muted));
        if !node.evidence_type.is_empty() {
            lines.push((
                format!("evidence: {}", node.evidence_type),
                FontId::proportional(11.0),
                muted,
            ));
        }
    }

    let galleys = lines
        .into_iter()
        .map(|(text, font, color)| painter.layout_no_wrap(text, font, color))
        .collect::<Vec<_>>();
    let badge_row_height = if card == DetailCard::Full && !node.modalities.is_empty() {
        16.0
    } else {
        0.0
    };
    let width = galleys
        .iter()
        .map(|galley| galley.size().x)
        .fold(0.0, f32::max)
        .max(60.0)
        + 12.0;
    let height = galleys.iter().map(|galley| galley.size().y).sum::<f32>() + badge_row_height + 10.0;

    let card_rect = Rect::from_min_size(anchor - vec2(width * 0.5, 0.0), vec2(width, height));
    painter.rect_filled(
        card_rect,
        4.0,
        with_opacity(Color32::from_rgb(28, 33, 41), 0.92 * opacity),
    );
    painter.rect_stroke(
        card_rect,
        4.0,
        Stroke::new(1.0, with_opacity(node.color, 0.6 * opacity)),
        egui::StrokeKind::Inside,
    );

    let mut cursor = card_rect.min + vec2(6.0, 5.0);
    for galley in galleys {
        let height = galley.size().y;
        painter.galley(cursor, galley, text_color);
        cursor.y += height;
    }

    if badge_row_height > 0.0 {
        let mut x = cursor.x;
        for modality in &node.modalities {
            let galley =
                painter.layout_no_wrap(modality.clone(), FontId::proportional(10.0), text_color);
            let badge = Rect::from_min_size(
                Pos2::new(x, cursor.y + 2.0),
                vec2(galley.size().x + 8.0, 13.0),
            );
            if badge.right() > card_rect.right() - 4.0 {
                break;
            }
            painter.rect_filled(
                badge,
                6.0,
                with_opacity(theme.modality_color(modality), 0.45 * opacity),
            );
            painter.galley(badge.min + vec2(4.0, 0.0), galley, text_color);
            x = badge.right() + 4.0;
        }
    }
}

impl ViewModel {
    fn draw_nodes(&self, painter: &Painter, rect: Rect, surface: &GraphSurface, style: &LevelStyle) -> usize {
        let (Some(graph), Some(interaction)) = (surface.graph(), surface.interaction()) else {
            return 0;
        };
        let transform = surface.transform();
        let positions = surface.positions();
        let fade = surface.entrance_progress();
        let show_labels = surface.config().show_labels;
        let card = surface
            .semantic_zoom()
            .map(|zoom| zoom.detail_card())
            .unwrap_or(DetailCard::None);

        // Hovered and selected nodes paint last so they sit on top.
        let mut order = (0..graph.nodes.len()).collect::<Vec<_>>();
        order.sort_by_key(|&index| {
            (interaction.selected() == Some(index)) as u8 + (interaction.hovered() == Some(index)) as u8 * 2
        });

        let mut visible = 0;
        let mut cards = Vec::new();
        for index in order {
            let node = &graph.nodes[index];
            let center = world_to_screen(rect, transform, positions[index]);
            let emphasis: NodeEmphasis = interaction.node_emphasis(graph, index);
            let radius = surface.node_radius(index) * transform.scale * emphasis.scale * fade;
            if !circle_visible(rect, center, radius + 40.0) {
                continue;
            }
            visible += 1;

            let opacity = emphasis.opacity * fade;
            if emphasis.glow > 0.0 {
                painter.circle_filled(
                    center,
                    radius + (8.0 * emphasis.glow),
                    with_opacity(self.theme.hover_glow, 0.35 * emphasis.glow * opacity),
                );
            }

            let fill = blend_color(node.color, self.theme.hover_glow, emphasis.glow * 0.25);
            painter.circle_filled(center, radius, with_opacity(fill, opacity));
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(1.0, with_opacity(Color32::from_rgb(15, 15, 15), 0.75 * opacity)),
            );
            if emphasis.outline {
                painter.circle_stroke(center, radius + 4.0, Stroke::new(2.5, self.theme.selection));
            }

            if style.modality_dots_visible() {
                draw_modality_dots(painter, &self.theme, node, center, radius, style, opacity);
            }

            let label_opacity = opacity
                * if emphasis.show_label {
                    1.0
                } else if show_labels {
                    style.label_opacity
                } else {
                    0.0
                };
            if label_opacity > 0.01 {
                painter.text(
                    center + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &node.short_name,
                    FontId::proportional(12.0),
                    with_opacity(self.theme.label, label_opacity),
                );
            }

            if card != DetailCard::None && cards.len() < MAX_DETAIL_CARDS {
                cards.push((index, center + vec2(0.0, radius + 8.0), opacity));
            }
        }

        for (index, anchor, opacity) in cards {
            draw_detail_card(
                painter,
                &self.catalog,
                &self.theme,
                &graph.nodes[index],
                anchor,
                card,
                opacity,
            );
        }

        visible
    }

    fn draw_overlay(&self, painter: &Painter, rect: Rect, surface: &GraphSurface) {
        let Some(zoom) = surface.semantic_zoom() else {
            return;
        };

        let indicator = painter.layout_no_wrap(
            zoom.indicator_text(),
            FontId::proportional(13.0),
            Color32::from_gray(225),
        );
        let indicator_rect = Rect::from_min_size(
            rect.right_bottom() - indicator.size() - vec2(22.0, 18.0),
            indicator.size() + vec2(12.0, 8.0),
        );
        painter.rect_filled(indicator_rect, 4.0, Color32::from_rgba_unmultiplied(28, 33, 41, 220));
        painter.galley(indicator_rect.min + vec2(6.0, 4.0), indicator, Color32::from_gray(225));

        let hint_opacity = zoom.hint_opacity();
        if hint_opacity > 0.0 {
            painter.text(
                rect.center_bottom() - vec2(0.0, 18.0),
                Align2::CENTER_BOTTOM,
                "Scroll to zoom · drag nodes to pin · right-drag to pan",
                FontId::proportional(13.0),
                with_opacity(Color32::from_gray(210), hint_opacity),
            );
        }

        if let Some(node) = self
            .hovered
            .as_deref()
            .and_then(|id| surface.graph().and_then(|graph| graph.node(id)))
        {
            let step = self
                .catalog
                .step(&node.pipeline_step)
                .map(|step| step.name.as_str())
                .unwrap_or(node.pipeline_step.as_str());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  links {}", node.short_name, step, node.degree),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }

    fn draw_surface(&self, painter: &Painter, rect: Rect, surface: &GraphSurface) -> Counts {
        let Some(zoom) = surface.semantic_zoom() else {
            return Counts { nodes: 0, edges: 0 };
        };
        let style = *zoom.style();
        let fade = surface.entrance_progress();

        if surface.config().show_clusters {
            draw_clusters(painter, rect, surface, &style, fade);
        }
        let edges = draw_edges(painter, rect, surface, &style, fade);
        let nodes = self.draw_nodes(painter, rect, surface, &style);
        self.draw_overlay(painter, rect, surface);

        Counts { nodes, edges }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let now = Instant::now();

        self.ensure_surface(rect.size(), now);
        let background_click = self.handle_graph_input(ui, rect, &response);
        self.drain_surface_events();
        if background_click {
            self.set_selected(None);
        }

        let frame_delta_seconds = ui.input(|input| input.stable_dt).clamp(0.0, 0.25);
        let animating = self
            .surface
            .as_mut()
            .is_some_and(|surface| surface.frame(frame_delta_seconds));

        let painter = ui.painter_at(rect);
        let transform = self
            .surface
            .as_ref()
            .map(GraphSurface::transform)
            .unwrap_or_default();
        draw_background(&painter, rect, self.theme.background, transform);

        let counts = match self.surface.as_ref() {
            Some(surface) if !surface.is_inert() => self.draw_surface(&painter, rect, surface),
            Some(surface) => {
                let message = if surface.needs_retry() {
                    "Waiting for the canvas to get a size..."
                } else {
                    "No methods match the current filter."
                };
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    message,
                    FontId::proportional(15.0),
                    Color32::from_gray(200),
                );
                Counts { nodes: 0, edges: 0 }
            }
            None => Counts { nodes: 0, edges: 0 },
        };
        self.visible_node_count = counts.nodes;
        self.visible_edge_count = counts.edges;

        if animating || response.dragged() {
            ui.ctx().request_repaint();
        }
        if let Some(remaining) = self.debouncer.remaining(now) {
            ui.ctx().request_repaint_after(remaining);
        }
        if self.surface.as_ref().is_some_and(GraphSurface::needs_retry) {
            ui.ctx().request_repaint_after(RETRY_REPAINT_DELAY);
        }
    }
}
