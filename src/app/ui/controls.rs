use eframe::egui::{self, Align, Layout, RichText, Ui};

use method_atlas::graph::LinkKind;
use method_atlas::layout::{MAX_SPACING, MIN_SPACING};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut changed = false;

        ui.label("Filter (name, id or tag)")
            .on_hover_text("Fuzzy-match methods; the graph is rebuilt from the matches.");
        changed |= ui.text_edit_singleline(&mut self.filter).changed();

        ui.separator();
        ui.label(RichText::new("Links").strong());

        let links = &mut self.options.link_options;
        changed |= ui
            .checkbox(&mut links.explicit, "Explicit relations")
            .on_hover_text("Directed links from each method's related list.")
            .changed();
        changed |= ui
            .checkbox(&mut links.same_step, "Same pipeline step")
            .changed();
        changed |= ui
            .checkbox(&mut links.shared_modality, "Shared modality")
            .changed();
        changed |= ui.checkbox(&mut links.shared_task, "Shared task").changed();
        changed |= ui
            .checkbox(&mut links.similarity, "Similarity")
            .on_hover_text("Link the most similar methods by modalities, tasks and tags.")
            .changed();

        ui.add_enabled_ui(links.similarity, |ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut links.similarity_threshold, 0.0..=1.0)
                        .step_by(0.05)
                        .text("Min similarity"),
                )
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut links.max_similar_per_node, 0..=10)
                        .text("Max similar per method"),
                )
                .changed();
        });

        ui.separator();
        ui.label(RichText::new("Layout").strong());

        changed |= ui
            .add(
                egui::Slider::new(&mut self.options.node_spacing, MIN_SPACING..=MAX_SPACING)
                    .text("Node spacing")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Scales link distance, repulsion, collision radius and cluster ring.")
            .changed();

        let mut display_changed = ui
            .checkbox(&mut self.options.show_clusters, "Show step clusters")
            .changed();
        display_changed |= ui
            .checkbox(&mut self.options.show_labels, "Show labels")
            .changed();
        display_changed |= ui
            .checkbox(&mut self.options.animate_entrance, "Animate entrance")
            .on_hover_text("Applies from the next rebuild.")
            .changed();

        if changed {
            self.graph_dirty = true;
        }
        if display_changed && let Some(surface) = self.surface.as_mut() {
            surface.set_display(
                self.options.show_clusters,
                self.options.show_labels,
                self.options.animate_entrance,
            );
        }

        ui.separator();
        self.draw_legend(ui);

        ui.separator();
        egui::CollapsingHeader::new("Methods")
            .default_open(true)
            .show(ui, |ui| self.draw_method_list(ui));
    }

    fn draw_legend(&self, ui: &mut Ui) {
        let counts = self
            .surface
            .as_ref()
            .and_then(|surface| surface.graph())
            .map(|graph| graph.edge_count_by_kind())
            .unwrap_or_default();

        egui::CollapsingHeader::new("Legend")
            .default_open(false)
            .show(ui, |ui| {
                for kind in LinkKind::ALL {
                    let count = counts
                        .iter()
                        .find(|(counted, _)| *counted == kind)
                        .map_or(0, |(_, count)| *count);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("━━").color(kind.style().color));
                        ui.label(kind.label());
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            ui.label(count.to_string());
                        });
                    });
                }

                ui.add_space(4.0);
                for step in self.catalog.ordered_steps() {
                    let color = self.theme.step_color(&step.id);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("●").color(color));
                        ui.label(step.name);
                    });
                }
            });
    }

    fn draw_method_list(&mut self, ui: &mut Ui) {
        let ids = match self.surface.as_ref().and_then(|surface| surface.graph()) {
            Some(graph) => graph
                .nodes
                .iter()
                .map(|node| (node.id.clone(), node.short_name.clone(), node.degree))
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };

        let row_count = ids.len().min(self.method_rows_visible);
        let mut should_load_more = false;
        let mut selected_id = None;

        egui::ScrollArea::vertical()
            .id_salt("method_list_scroll")
            .max_height(260.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, row_count, |ui, row_range| {
                if row_range.end + Self::METHOD_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }

                for index in row_range {
                    let Some((id, short_name, degree)) = ids.get(index) else {
                        continue;
                    };

                    let is_selected = self.selected.as_deref() == Some(id.as_str());
                    let clicked = ui
                        .horizontal(|ui| {
                            let clicked = ui.selectable_label(is_selected, short_name.as_str()).clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(format!("{degree} links"));
                            });
                            clicked
                        })
                        .inner;

                    if clicked {
                        selected_id = Some(id.clone());
                    }
                }
            });

        if let Some(id) = selected_id {
            self.set_selected(Some(id));
        }

        if should_load_more && row_count < ids.len() {
            self.method_rows_visible = (row_count + Self::METHOD_PAGE_ROWS).min(ids.len());
        }
    }
}
