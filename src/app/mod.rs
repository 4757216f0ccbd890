use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use method_atlas::catalog::{Catalog, load_catalog};
use method_atlas::schedule::{RebuildDebouncer, RetryBackoff};
use method_atlas::surface::{GraphSurface, ViewConfig};
use method_atlas::theme::Theme;

mod graph;
mod render_utils;
mod ui;

pub struct AtlasApp {
    catalog_path: PathBuf,
    options: ViewConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Catalog, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Catalog, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Events the surface callbacks forward to the view model. Callbacks fire
/// while the surface is borrowed, so they queue instead of mutating state.
enum SurfaceEvent {
    Clicked(String),
    Hovered(Option<String>),
}

struct ViewModel {
    catalog: Catalog,
    theme: Theme,
    options: ViewConfig,
    filter: String,
    selected: Option<String>,
    hovered: Option<String>,
    surface: Option<GraphSurface>,
    surface_size: Vec2,
    graph_dirty: bool,
    debouncer: RebuildDebouncer<Vec2>,
    retry: RetryBackoff,
    retry_warned: bool,
    events_tx: Sender<SurfaceEvent>,
    events_rx: Receiver<SurfaceEvent>,
    method_rows_visible: usize,
    visible_node_count: usize,
    visible_edge_count: usize,
}

impl AtlasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, catalog_path: PathBuf, options: ViewConfig) -> Self {
        let state = Self::start_load(catalog_path.clone());
        Self {
            catalog_path,
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(catalog_path: PathBuf) -> Receiver<Result<Catalog, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_catalog(&catalog_path)
                .with_context(|| format!("failed to load catalog {}", catalog_path.display()))
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(catalog_path: PathBuf) -> AppState {
        info!(path = %catalog_path.display(), "loading catalog");
        AppState::Loading {
            rx: Self::spawn_load(catalog_path),
        }
    }

    fn ready(&self, catalog: Catalog) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(catalog, self.options.clone())))
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(catalog)) => transition = Some(Ok(catalog)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading method catalog...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the method catalog");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.catalog_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.catalog_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.catalog_path.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(catalog) => self.ready(catalog),
                Err(error) => {
                    warn!(%error, "catalog load failed");
                    AppState::Error(error)
                }
            };
        }
    }
}
