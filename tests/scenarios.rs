//! End-to-end checks over small hand-built catalogs.

use std::time::{Duration, Instant};

use eframe::egui::{Vec2, vec2};
use method_atlas::catalog::{Catalog, MethodRecord, PipelineStep};
use method_atlas::graph::similarity::score;
use method_atlas::graph::{LinkKind, LinkOptions, build_graph};
use method_atlas::schedule::{REBUILD_QUIET_WINDOW, RebuildDebouncer};
use method_atlas::surface::{GraphSurface, SurfaceCallbacks, ViewConfig};
use method_atlas::theme::Theme;
use method_atlas::zoom::{DetailCard, ZoomLevel};

fn method(id: &str, step: &str) -> MethodRecord {
    MethodRecord {
        id: id.to_owned(),
        name: format!("{id} method"),
        pipeline_step: step.to_owned(),
        modalities: Vec::new(),
        tasks: Vec::new(),
        tags: Vec::new(),
        maturity: String::new(),
        evidence_type: String::new(),
        related_methods: Vec::new(),
        year: None,
    }
}

fn step(id: &str, order: i32) -> PipelineStep {
    PipelineStep {
        id: id.to_owned(),
        name: id.to_owned(),
        order,
    }
}

#[test]
fn scenario_a_single_explicit_reference() {
    let source = MethodRecord {
        related_methods: vec!["target".to_owned()],
        ..method("source", "discovery")
    };
    let methods = vec![source, method("target", "conformance")];
    let steps = vec![step("discovery", 1), step("conformance", 2)];

    let graph = build_graph(
        &methods,
        &steps,
        &LinkOptions::none().with_explicit(),
        &Theme::default(),
    );

    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].kind, LinkKind::Explicit);
    assert_eq!(graph.source_id(&graph.edges[0]), "source");
    assert_eq!(graph.target_id(&graph.edges[0]), "target");
    assert!(graph.nodes.iter().all(|node| node.degree == 1));
}

#[test]
fn scenario_b_same_step_forms_complete_graph() {
    let methods = (0..5)
        .map(|index| method(&format!("m{index}"), "discovery"))
        .collect::<Vec<_>>();
    let options = LinkOptions {
        same_step: true,
        ..LinkOptions::none()
    };

    let graph = build_graph(&methods, &[step("discovery", 1)], &options, &Theme::default());

    assert_eq!(graph.edges.len(), 10);
    assert!(graph.edges.iter().all(|edge| edge.kind == LinkKind::SameStep));
    assert!(graph.nodes.iter().all(|node| node.degree == 4));
}

#[test]
fn scenario_c_threshold_above_best_score_adds_nothing() {
    let shared = |id: &str| MethodRecord {
        modalities: vec!["event-log".to_owned(), "text".to_owned()],
        maturity: "emerging".to_owned(),
        evidence_type: "benchmark".to_owned(),
        ..method(id, "discovery")
    };
    let methods = vec![shared("a"), shared("b"), shared("c"), shared("d")];
    let steps = vec![step("discovery", 1)];

    let best = methods
        .iter()
        .flat_map(|a| methods.iter().map(move |b| (a, b)))
        .map(|(a, b)| score(a, b, &steps))
        .fold(0.0f32, f32::max);
    assert!(best <= 0.8, "fixture scores too high: {best}");

    let options = LinkOptions {
        similarity: true,
        similarity_threshold: 0.9,
        max_similar_per_node: 10,
        ..LinkOptions::none()
    };
    let graph = build_graph(&methods, &steps, &options, &Theme::default());
    assert!(graph.edges.is_empty());
}

#[test]
fn scenario_d_resize_burst_rebuilds_once_at_final_size() {
    let start = Instant::now();
    let mut debouncer = RebuildDebouncer::default();
    let mut rebuilds = Vec::new();

    let sizes = [
        vec2(640.0, 480.0),
        vec2(700.0, 480.0),
        vec2(760.0, 500.0),
        vec2(820.0, 520.0),
        vec2(900.0, 560.0),
    ];
    let mut current = vec2(640.0, 480.0);
    for (tick, size) in sizes.into_iter().enumerate() {
        let now = start + Duration::from_millis(tick as u64 * 25);
        debouncer.request_if_changed(size, current, false, now);
        rebuilds.extend(debouncer.poll(now));
    }

    // The host keeps reporting the final size every frame.
    let mut now = start + Duration::from_millis(100);
    while now < start + Duration::from_secs(1) {
        debouncer.request_if_changed(vec2(900.0, 560.0), current, false, now);
        if let Some(size) = debouncer.poll(now) {
            current = size;
            rebuilds.push(size);
        }
        now += Duration::from_millis(10);
    }

    assert_eq!(rebuilds, vec![vec2(900.0, 560.0)]);
    assert!(REBUILD_QUIET_WINDOW == Duration::from_millis(150));
}

#[test]
fn stale_reference_is_skipped() {
    let source = MethodRecord {
        related_methods: vec!["does-not-exist".to_owned()],
        ..method("source", "discovery")
    };
    let graph = build_graph(
        &[source],
        &[step("discovery", 1)],
        &LinkOptions::none().with_explicit(),
        &Theme::default(),
    );

    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
    assert_eq!(graph.nodes[0].degree, 0);
}

fn small_catalog() -> Catalog {
    let mut a = method("a", "discovery");
    a.related_methods = vec!["b".to_owned()];
    Catalog {
        pipeline_steps: vec![step("discovery", 1), step("conformance", 2)],
        methods: vec![a, method("b", "discovery"), method("c", "conformance")],
    }
}

#[test]
fn surface_settles_and_zoom_changes_bands() {
    let mut surface = GraphSurface::new(
        &small_catalog(),
        ViewConfig::sized(800.0, 600.0),
        SurfaceCallbacks::default(),
    );
    assert!(!surface.is_inert());

    let mut frames = 0;
    while surface.is_simulating() && frames < 2_000 {
        surface.frame(1.0 / 60.0);
        frames += 1;
    }
    assert!(!surface.is_simulating(), "layout never settled");

    let level = |surface: &GraphSurface| surface.semantic_zoom().map(|zoom| zoom.level());
    assert_eq!(level(&surface), Some(ZoomLevel::Normal));

    for _ in 0..4 {
        surface.zoom_in();
    }
    assert_eq!(level(&surface), Some(ZoomLevel::Full));
    assert_eq!(
        surface.semantic_zoom().map(|zoom| zoom.detail_card()),
        Some(DetailCard::Full)
    );

    surface.zoom_to_fit();
    assert_eq!(surface.transform().scale, 1.0);
    assert_eq!(surface.transform().translate, Vec2::ZERO);

    for _ in 0..10 {
        surface.zoom_out();
    }
    assert_eq!(level(&surface), Some(ZoomLevel::Abstract));
}

#[test]
fn inert_and_destroyed_handles_ignore_every_operation() {
    let mut empty = GraphSurface::new(
        &Catalog::default(),
        ViewConfig::sized(800.0, 600.0),
        SurfaceCallbacks::default(),
    );
    assert!(empty.is_inert());
    assert!(!empty.needs_retry());

    let mut live = GraphSurface::new(
        &small_catalog(),
        ViewConfig::sized(800.0, 600.0),
        SurfaceCallbacks::default(),
    );
    live.destroy();
    live.destroy();
    assert!(live.is_destroyed());

    for surface in [&mut empty, &mut live] {
        surface.zoom_in();
        surface.zoom_out();
        surface.zoom_to_fit();
        surface.restart_layout();
        assert!(!surface.frame(1.0 / 60.0));
        assert_eq!(surface.hover_at(Some(vec2(400.0, 300.0))), None);
        assert!(!surface.click_at(vec2(400.0, 300.0)));
        assert!(surface.positions().is_empty());
    }
}
