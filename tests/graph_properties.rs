//! Property tests for the relationship graph over generated catalogs.
//!
//! 1. Similarity scores are symmetric, bounded and zero against self.
//! 2. At most one edge per unordered pair.
//! 3. No node exceeds the similarity cap from the similarity stage.
//! 4. Stored degree matches incident edge count.
//! 5. Every node lands in exactly one cluster region keyed by its step.

use std::collections::HashSet;

use method_atlas::catalog::{MethodRecord, PipelineStep};
use method_atlas::cluster::cluster_regions;
use method_atlas::graph::similarity::score;
use method_atlas::graph::{LinkKind, LinkOptions, build_graph};
use method_atlas::theme::Theme;
use proptest::prelude::*;

const STEPS: [&str; 4] = ["extraction", "discovery", "conformance", "unlisted"];
const VOCABULARY: [&str; 6] = ["event-log", "text", "sensor", "petri-net", "noise", "time"];
const MATURITY: [&str; 3] = ["", "emerging", "established"];

fn steps() -> Vec<PipelineStep> {
    STEPS[..3]
        .iter()
        .enumerate()
        .map(|(order, id)| PipelineStep {
            id: (*id).to_owned(),
            name: id.to_uppercase(),
            order: order as i32,
        })
        .collect()
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(VOCABULARY.to_vec()), 0..4)
        .prop_map(|words| words.into_iter().map(str::to_owned).collect())
}

fn record_strategy() -> impl Strategy<Value = MethodRecord> {
    (
        prop::sample::select(STEPS.to_vec()),
        words(),
        words(),
        words(),
        prop::sample::select(MATURITY.to_vec()),
        prop::collection::vec(0usize..16, 0..4),
    )
        .prop_map(|(step, modalities, tasks, tags, maturity, related)| MethodRecord {
            id: String::new(),
            name: String::new(),
            pipeline_step: step.to_owned(),
            modalities,
            tasks,
            tags,
            maturity: maturity.to_owned(),
            evidence_type: String::new(),
            related_methods: related.into_iter().map(|index| format!("m{index}")).collect(),
            year: None,
        })
}

/// Catalogs of 1..12 methods with unique ids `m0..`. Related ids may point
/// past the end, which leaves them unresolved.
fn catalog_strategy() -> impl Strategy<Value = Vec<MethodRecord>> {
    prop::collection::vec(record_strategy(), 1..12).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(index, mut record)| {
                record.id = format!("m{index}");
                record.name = format!("Method number {index}");
                record
            })
            .collect()
    })
}

fn options_strategy() -> impl Strategy<Value = LinkOptions> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        0.0f32..1.0,
        0usize..5,
    )
        .prop_map(
            |(explicit, same_step, shared_modality, shared_task, similarity, threshold, cap)| {
                LinkOptions {
                    explicit,
                    same_step,
                    shared_modality,
                    shared_task,
                    similarity,
                    similarity_threshold: threshold,
                    max_similar_per_node: cap,
                }
            },
        )
}

proptest! {
    #[test]
    fn score_is_symmetric_and_bounded(a in record_strategy(), b in record_strategy()) {
        let steps = steps();
        let mut a = a;
        let mut b = b;
        a.id = "left".to_owned();
        b.id = "right".to_owned();

        let forward = score(&a, &b, &steps);
        let backward = score(&b, &a, &steps);
        prop_assert_eq!(forward, backward);
        prop_assert!((0.0..=1.0).contains(&forward), "score out of range: {}", forward);
        prop_assert_eq!(score(&a, &a, &steps), 0.0);
    }
}

proptest! {
    #[test]
    fn at_most_one_edge_per_pair(methods in catalog_strategy(), options in options_strategy()) {
        let graph = build_graph(&methods, &steps(), &options, &Theme::default());

        let mut pairs = HashSet::new();
        for edge in &graph.edges {
            prop_assert_ne!(edge.source, edge.target, "self loop on {}", edge.source);
            let pair = (edge.source.min(edge.target), edge.source.max(edge.target));
            prop_assert!(pairs.insert(pair), "duplicate edge for pair {:?}", pair);
            prop_assert!(edge.strength > 0.0 && edge.strength <= 1.0);
        }
    }
}

proptest! {
    #[test]
    fn similarity_stage_respects_cap(methods in catalog_strategy(), options in options_strategy()) {
        let graph = build_graph(&methods, &steps(), &options, &Theme::default());

        for index in 0..graph.nodes.len() {
            let similar = graph
                .incident_edges(index)
                .filter(|edge| edge.kind == LinkKind::Similar)
                .count();
            prop_assert!(
                similar <= options.max_similar_per_node,
                "node {} has {} similarity edges, cap {}",
                index,
                similar,
                options.max_similar_per_node
            );
        }
    }
}

proptest! {
    #[test]
    fn degree_matches_incident_edges(methods in catalog_strategy(), options in options_strategy()) {
        let graph = build_graph(&methods, &steps(), &options, &Theme::default());

        for (index, node) in graph.nodes.iter().enumerate() {
            let incident = graph
                .edges
                .iter()
                .map(|edge| usize::from(edge.source == index) + usize::from(edge.target == index))
                .sum::<usize>();
            prop_assert_eq!(node.degree, incident, "degree mismatch on {}", &node.id);
        }
    }
}

proptest! {
    #[test]
    fn each_node_in_exactly_one_region(methods in catalog_strategy()) {
        let steps = steps();
        let graph = build_graph(&methods, &steps, &LinkOptions::none(), &Theme::default());
        let regions = cluster_regions(&graph, &steps, &Theme::default());

        for (index, node) in graph.nodes.iter().enumerate() {
            let owners = regions
                .iter()
                .filter(|region| region.members.contains(&index))
                .collect::<Vec<_>>();
            prop_assert_eq!(owners.len(), 1, "node {} in {} regions", &node.id, owners.len());
            prop_assert_eq!(&owners[0].step_id, &node.pipeline_step);
        }
    }
}
