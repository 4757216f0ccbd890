use eframe::egui::{self, Rect, Ui, Vec2};

use method_atlas::surface::GraphSurface;

use super::super::{SurfaceEvent, ViewModel};

const WHEEL_ZOOM_PER_POINT: f32 = 0.0018;

fn local(rect: Rect, pointer: egui::Pos2) -> Vec2 {
    pointer - rect.min
}

impl ViewModel {
    fn handle_graph_zoom(surface: &mut GraphSurface, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let factor = (1.0 + (scroll * WHEEL_ZOOM_PER_POINT)).clamp(0.85, 1.15);
        surface.zoom_at(local(rect, pointer), factor);
    }

    fn handle_graph_pan(surface: &mut GraphSurface, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            surface.pan_by(response.drag_delta());
        }
    }

    fn handle_node_drag(surface: &mut GraphSurface, ui: &Ui, rect: Rect, response: &egui::Response) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = ui.input(|input| input.pointer.press_origin());
            if let Some(origin) = origin {
                surface.begin_drag(local(rect, origin));
            }
        }

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            surface.drag_to(local(rect, pointer));
        }

        if response.drag_stopped() {
            surface.end_drag();
        }
    }

    /// Routes pointer input on the canvas into the surface. Returns true when
    /// a primary click landed on empty canvas.
    pub(in crate::app) fn handle_graph_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        Self::handle_graph_zoom(surface, ui, rect, response);
        Self::handle_graph_pan(surface, response);
        Self::handle_node_drag(surface, ui, rect, response);

        let pointer = response
            .hover_pos()
            .filter(|_| response.hovered())
            .map(|pointer| local(rect, pointer));
        if surface.hover_at(pointer).is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let mut background_click = false;
        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            background_click = !surface.click_at(local(rect, pointer));
        }
        background_click
    }

    /// Applies events the surface callbacks queued during input handling.
    pub(in crate::app) fn drain_surface_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                SurfaceEvent::Clicked(id) => self.set_selected(Some(id)),
                SurfaceEvent::Hovered(id) => self.hovered = id,
            }
        }
    }
}
