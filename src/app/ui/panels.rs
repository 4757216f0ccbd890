use std::path::Path;
use std::sync::mpsc;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use method_atlas::catalog::Catalog;
use method_atlas::schedule::{RebuildDebouncer, RetryBackoff};
use method_atlas::surface::ViewConfig;
use method_atlas::theme::Theme;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) const INITIAL_METHOD_ROWS: usize = 30;
    pub(in crate::app) const METHOD_PAGE_ROWS: usize = 30;
    pub(in crate::app) const METHOD_PREFETCH_MARGIN: usize = 4;

    pub(in crate::app) fn new(catalog: Catalog, options: ViewConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel();

        Self {
            catalog,
            theme: Theme::default(),
            selected: options.selected_id.clone(),
            options,
            filter: String::new(),
            hovered: None,
            surface: None,
            surface_size: Vec2::ZERO,
            graph_dirty: false,
            debouncer: RebuildDebouncer::default(),
            retry: RetryBackoff::default(),
            retry_warned: false,
            events_tx,
            events_rx,
            method_rows_visible: Self::INITIAL_METHOD_ROWS,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        catalog_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Method Atlas");
                    ui.separator();
                    ui.label(format!("catalog: {}", catalog_path.display()));
                    ui.label(format!("methods: {}", self.catalog.methods.len()));
                    ui.label(format!("steps: {}", self.catalog.pipeline_steps.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload catalog"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }

                    ui.separator();
                    let has_surface = self.surface.as_ref().is_some_and(|surface| !surface.is_inert());
                    ui.add_enabled_ui(has_surface, |ui| {
                        if ui.button("+").on_hover_text("Zoom in").clicked()
                            && let Some(surface) = self.surface.as_mut()
                        {
                            surface.zoom_in();
                        }
                        if ui.button("-").on_hover_text("Zoom out").clicked()
                            && let Some(surface) = self.surface.as_mut()
                        {
                            surface.zoom_out();
                        }
                        if ui.button("Fit").on_hover_text("Reset pan and zoom").clicked()
                            && let Some(surface) = self.surface.as_mut()
                        {
                            surface.zoom_to_fit();
                        }
                        if ui
                            .button("Restart layout")
                            .on_hover_text("Reheat the simulation, keeping current positions")
                            .clicked()
                            && let Some(surface) = self.surface.as_mut()
                        {
                            surface.restart_layout();
                        }
                    });

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes / {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading method catalog...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        if let Some(surface) = self.surface.as_mut() {
            surface.set_selected(selected.as_deref());
        }
        self.selected = selected;
    }
}
