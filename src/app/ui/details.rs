use eframe::egui::{self, RichText, Ui};

use method_atlas::catalog::MethodRecord;
use method_atlas::graph::LinkKind;
use method_atlas::util::short_name;

use super::super::ViewModel;

struct RelatedEntry {
    id: String,
    name: String,
    kinds: Vec<LinkKind>,
}

fn list_line(ui: &mut Ui, label: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    ui.label(format!("{label}: {}", values.join(", ")));
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Method Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a method in the graph or the method list.");
            return;
        };

        let Some(method) = self.catalog.method(&selected_id).cloned() else {
            ui.label("The selected method is not in the catalog.");
            return;
        };

        self.draw_method_summary(ui, &method);

        let related = self.related_entries(&selected_id);
        ui.label(format!("Links in current graph: {}", related.len()));

        ui.separator();
        ui.label(RichText::new("Linked methods").strong());
        if related.is_empty() {
            ui.label("No links to other methods in the current graph.");
        } else {
            let mut clicked = None;
            egui::ScrollArea::vertical()
                .id_salt("related_methods_scroll")
                .max_height(320.0)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in &related {
                        let kinds = entry
                            .kinds
                            .iter()
                            .map(|kind| kind.label())
                            .collect::<Vec<_>>()
                            .join(", ");
                        let label = format!("{}  [{kinds}]", short_name(&entry.name));
                        if ui.link(label).on_hover_text(entry.id.as_str()).clicked() {
                            clicked = Some(entry.id.clone());
                        }
                    }
                });
            if clicked.is_some() {
                self.set_selected(clicked);
            }
        }

        let missing = method
            .related_methods
            .iter()
            .filter(|id| self.catalog.method(id).is_none())
            .cloned()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            ui.separator();
            ui.small(format!("Unresolved references: {}", missing.join(", ")));
        }

        ui.add_space(8.0);
        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        }
    }

    fn draw_method_summary(&self, ui: &mut Ui, method: &MethodRecord) {
        ui.label(RichText::new(method.name.as_str()).strong());
        ui.small(method.id.as_str());
        ui.add_space(6.0);

        let step = self
            .catalog
            .step(&method.pipeline_step)
            .map(|step| step.name.as_str())
            .unwrap_or(method.pipeline_step.as_str());
        ui.label(format!("Pipeline step: {step}"));
        if let Some(year) = method.year {
            ui.label(format!("Year: {year}"));
        }
        if !method.maturity.is_empty() {
            ui.label(format!("Maturity: {}", method.maturity));
        }
        if !method.evidence_type.is_empty() {
            ui.label(format!("Evidence: {}", method.evidence_type));
        }

        list_line(ui, "Modalities", &method.modalities);
        list_line(ui, "Tasks", &method.tasks);
        list_line(ui, "Tags", &method.tags);
    }

    /// Neighbors of `selected_id` in the live graph, each with every link kind
    /// that connects the pair.
    fn related_entries(&self, selected_id: &str) -> Vec<RelatedEntry> {
        let Some(graph) = self.surface.as_ref().and_then(|surface| surface.graph()) else {
            return Vec::new();
        };
        let Some(index) = graph.index_of(selected_id) else {
            return Vec::new();
        };

        let mut entries: Vec<RelatedEntry> = Vec::new();
        for edge in graph.incident_edges(index) {
            let Some(other) = edge.other(index) else {
                continue;
            };
            let node = &graph.nodes[other];
            match entries.iter_mut().find(|entry| entry.id == node.id) {
                Some(entry) => {
                    if !entry.kinds.contains(&edge.kind) {
                        entry.kinds.push(edge.kind);
                    }
                }
                None => entries.push(RelatedEntry {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kinds: vec![edge.kind],
                }),
            }
        }

        for entry in &mut entries {
            entry.kinds.sort();
        }
        entries.sort_by(|a, b| a.kinds.cmp(&b.kinds).then_with(|| a.name.cmp(&b.name)));
        entries
    }
}
