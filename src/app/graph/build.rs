use std::time::Instant;

use eframe::egui::Vec2;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::{debug, warn};

use method_atlas::catalog::{Catalog, MethodRecord};
use method_atlas::surface::{GraphSurface, SurfaceCallbacks, ViewConfig};

use super::super::{SurfaceEvent, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

fn method_matches(matcher: &SkimMatcherV2, method: &MethodRecord, query: &str) -> bool {
    fuzzy_match_score(matcher, &method.name, query).is_some()
        || fuzzy_match_score(matcher, &method.id, query).is_some()
        || method
            .tags
            .iter()
            .any(|tag| fuzzy_match_score(matcher, tag, query).is_some())
}

impl ViewModel {
    /// The catalog subset the graph is built from: every method when the
    /// filter is empty, otherwise fuzzy matches on name, id or tag.
    pub(in crate::app) fn filtered_catalog(&self) -> Catalog {
        let query = self.filter.trim();
        if query.is_empty() {
            return self.catalog.clone();
        }

        let matcher = SkimMatcherV2::default();
        Catalog {
            pipeline_steps: self.catalog.pipeline_steps.clone(),
            methods: self
                .catalog
                .methods
                .iter()
                .filter(|method| method_matches(&matcher, method, query))
                .cloned()
                .collect(),
        }
    }

    fn surface_callbacks(&self) -> SurfaceCallbacks {
        let click_tx = self.events_tx.clone();
        let hover_tx = self.events_tx.clone();
        SurfaceCallbacks::default()
            .on_click(move |node| {
                let _ = click_tx.send(SurfaceEvent::Clicked(node.id.clone()));
            })
            .on_hover(move |node| {
                let _ = hover_tx.send(SurfaceEvent::Hovered(node.map(|node| node.id.clone())));
            })
    }

    /// Tears down the current surface and builds a fresh one at `size`. The
    /// old surface is destroyed first so two layouts never share the canvas.
    pub(in crate::app) fn rebuild_surface(&mut self, size: Vec2) {
        if let Some(mut previous) = self.surface.take() {
            previous.destroy();
        }

        let config = ViewConfig {
            width: size.x,
            height: size.y,
            selected_id: self.selected.clone(),
            ..self.options.clone()
        };
        let catalog = self.filtered_catalog();
        let surface = GraphSurface::with_theme(
            &catalog,
            config,
            self.theme.clone(),
            self.surface_callbacks(),
        );

        debug!(
            width = size.x,
            height = size.y,
            methods = catalog.methods.len(),
            inert = surface.is_inert(),
            "rebuilt graph surface"
        );

        self.hovered = None;
        self.surface_size = size;
        self.surface = Some(surface);
    }

    /// Decides whether the canvas needs a new surface this frame: immediately
    /// for the first build, after the quiet window for resizes and option
    /// changes, and on the retry schedule while the surface is zero-sized.
    pub(in crate::app) fn ensure_surface(&mut self, size: Vec2, now: Instant) {
        if self.surface.is_none() {
            self.retry.reset();
            self.rebuild_surface(size);
            self.graph_dirty = false;
            return;
        }

        if self
            .debouncer
            .request_if_changed(size, self.surface_size, self.graph_dirty, now)
        {
            self.graph_dirty = false;
        }

        if let Some(size) = self.debouncer.poll(now) {
            self.retry.reset();
            self.retry_warned = false;
            self.rebuild_surface(size);
            return;
        }

        let needs_retry = self
            .surface
            .as_ref()
            .is_some_and(GraphSurface::needs_retry);
        if !needs_retry {
            return;
        }

        if self.retry.take_due(now) {
            self.rebuild_surface(size);
        } else if !self.retry.schedule(now) && !self.retry_warned {
            warn!(
                attempts = self.retry.attempts(),
                "graph canvas still has no area; giving up on rebuild retries"
            );
            self.retry_warned = true;
        }
    }
}
