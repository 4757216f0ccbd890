mod app;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::Level;

use method_atlas::graph::LinkOptions;
use method_atlas::surface::ViewConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Catalog JSON with `pipelineSteps` and `methods`.
    #[arg(long, default_value = "data/methods.json")]
    catalog: PathBuf,

    /// Layout spacing multiplier, clamped to 0.5..=3.0.
    #[arg(long, default_value_t = 1.0)]
    spacing: f32,

    #[arg(long, default_value_t = 0.3)]
    similarity_threshold: f32,

    #[arg(long, default_value_t = 3)]
    max_similar_links: usize,

    #[arg(long)]
    same_step_links: bool,

    #[arg(long)]
    modality_links: bool,

    #[arg(long)]
    task_links: bool,

    #[arg(long)]
    no_explicit_links: bool,

    #[arg(long)]
    no_similarity_links: bool,

    #[arg(long)]
    no_clusters: bool,

    #[arg(long)]
    no_labels: bool,

    #[arg(long)]
    no_entrance: bool,

    /// Method id to select on startup.
    #[arg(long)]
    select: Option<String>,

    /// Log at debug level.
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn view_config(&self) -> ViewConfig {
        ViewConfig {
            selected_id: self.select.clone(),
            show_clusters: !self.no_clusters,
            show_labels: !self.no_labels,
            node_spacing: self.spacing,
            link_options: LinkOptions {
                explicit: !self.no_explicit_links,
                same_step: self.same_step_links,
                shared_modality: self.modality_links,
                shared_task: self.task_links,
                similarity: !self.no_similarity_links,
                similarity_threshold: self.similarity_threshold,
                max_similar_per_node: self.max_similar_links,
            },
            animate_entrance: !self.no_entrance,
            ..ViewConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let view_config = args.view_config();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Method Atlas",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::AtlasApp::new(
                cc,
                args.catalog.clone(),
                view_config.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
