use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::catalog::{MethodRecord, PipelineStep};
use crate::theme::Theme;
use crate::util::short_name;

use super::similarity::{score, shared_count};
use super::{GraphEdge, GraphNode, LinkKind, LinkOptions, MethodGraph};

const EXPLICIT_STRENGTH: f32 = 1.0;
const SAME_STEP_STRENGTH: f32 = 0.3;

/// Collects edges while refusing a second edge for an unordered pair that is
/// already connected, whatever kind the first one had.
struct EdgeSet {
    edges: Vec<GraphEdge>,
    pairs: HashSet<(usize, usize)>,
}

impl EdgeSet {
    fn new() -> Self {
        Self {
            edges: Vec::new(),
            pairs: HashSet::new(),
        }
    }

    fn key(a: usize, b: usize) -> (usize, usize) {
        if a <= b { (a, b) } else { (b, a) }
    }

    fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    fn insert(&mut self, source: usize, target: usize, kind: LinkKind, strength: f32) -> bool {
        if source == target || !self.pairs.insert(Self::key(source, target)) {
            return false;
        }
        self.edges.push(GraphEdge {
            source,
            target,
            kind,
            strength: strength.clamp(f32::EPSILON, 1.0),
        });
        true
    }
}

fn make_node(method: &MethodRecord, theme: &Theme) -> GraphNode {
    GraphNode {
        id: method.id.clone(),
        name: method.name.clone(),
        short_name: short_name(&method.name),
        pipeline_step: method.pipeline_step.clone(),
        modalities: method.modalities.clone(),
        tasks: method.tasks.clone(),
        tags: method.tags.clone(),
        maturity: method.maturity.clone(),
        evidence_type: method.evidence_type.clone(),
        related_methods: method.related_methods.clone(),
        year: method.year,
        color: theme.step_color(&method.pipeline_step),
        degree: 0,
    }
}

fn add_explicit_links(
    methods: &[MethodRecord],
    index_by_id: &HashMap<&str, usize>,
    edges: &mut EdgeSet,
) {
    for (source, method) in methods.iter().enumerate() {
        for related in &method.related_methods {
            let Some(&target) = index_by_id.get(related.as_str()) else {
                continue;
            };
            edges.insert(source, target, LinkKind::Explicit, EXPLICIT_STRENGTH);
        }
    }
}

fn add_same_step_links(graph_groups: &[Vec<usize>], edges: &mut EdgeSet) {
    for members in graph_groups {
        for (position, &source) in members.iter().enumerate() {
            for &target in &members[position + 1..] {
                edges.insert(source, target, LinkKind::SameStep, SAME_STEP_STRENGTH);
            }
        }
    }
}

fn add_shared_links(
    methods: &[MethodRecord],
    kind: LinkKind,
    field: impl Fn(&MethodRecord) -> &[String],
    strength: impl Fn(usize) -> f32,
    edges: &mut EdgeSet,
) {
    for (source, a) in methods.iter().enumerate() {
        for (offset, b) in methods[source + 1..].iter().enumerate() {
            if a.pipeline_step == b.pipeline_step {
                continue;
            }
            let target = source + 1 + offset;
            if edges.contains(source, target) {
                continue;
            }
            let shared = shared_count(field(a), field(b));
            if shared > 0 {
                edges.insert(source, target, kind, strength(shared));
            }
        }
    }
}

fn add_similarity_links(
    methods: &[MethodRecord],
    steps: &[PipelineStep],
    options: &LinkOptions,
    edges: &mut EdgeSet,
) {
    let mut candidates = Vec::new();
    for (source, a) in methods.iter().enumerate() {
        for (offset, b) in methods[source + 1..].iter().enumerate() {
            let value = score(a, b, steps);
            if value >= options.similarity_threshold && value > 0.0 {
                candidates.push((source, source + 1 + offset, value));
            }
        }
    }

    candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

    let mut per_node = vec![0usize; methods.len()];
    for (source, target, value) in candidates {
        if per_node[source] >= options.max_similar_per_node
            || per_node[target] >= options.max_similar_per_node
        {
            continue;
        }
        if edges.insert(source, target, LinkKind::Similar, value) {
            per_node[source] += 1;
            per_node[target] += 1;
        }
    }
}

/// Derives the relationship graph for `methods`. Stages run in priority order
/// (explicit, same step, shared modality, shared task, similarity) and the
/// first stage to connect a pair owns it.
pub fn build_graph(
    methods: &[MethodRecord],
    steps: &[PipelineStep],
    options: &LinkOptions,
    theme: &Theme,
) -> MethodGraph {
    let mut nodes = methods
        .iter()
        .map(|method| make_node(method, theme))
        .collect::<Vec<_>>();

    let index_by_id = methods
        .iter()
        .enumerate()
        .map(|(index, method)| (method.id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut edges = EdgeSet::new();

    if options.explicit {
        add_explicit_links(methods, &index_by_id, &mut edges);
    }

    if options.same_step {
        let preview = MethodGraph::from_parts(nodes.clone(), Vec::new());
        let groups = preview
            .step_groups(steps)
            .into_iter()
            .filter(|group| group.known)
            .map(|group| group.members)
            .collect::<Vec<_>>();
        add_same_step_links(&groups, &mut edges);
    }

    if options.shared_modality {
        add_shared_links(
            methods,
            LinkKind::SharedModality,
            |method| &method.modalities,
            |shared| 0.4 + 0.1 * shared as f32,
            &mut edges,
        );
    }

    if options.shared_task {
        add_shared_links(
            methods,
            LinkKind::SharedTask,
            |method| &method.tasks,
            |shared| 0.3 + 0.15 * shared as f32,
            &mut edges,
        );
    }

    if options.similarity {
        add_similarity_links(methods, steps, options, &mut edges);
    }

    for edge in &edges.edges {
        nodes[edge.source].degree += 1;
        nodes[edge.target].degree += 1;
    }

    let graph = MethodGraph::from_parts(nodes, edges.edges);
    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        by_kind = ?graph.edge_count_by_kind(),
        "method graph built"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(id: &str, step: &str) -> MethodRecord {
        MethodRecord {
            id: id.to_owned(),
            name: format!("Method {id}"),
            pipeline_step: step.to_owned(),
            modalities: Vec::new(),
            tasks: Vec::new(),
            tags: Vec::new(),
            maturity: format!("maturity-{id}"),
            evidence_type: format!("evidence-{id}"),
            related_methods: Vec::new(),
            year: None,
        }
    }

    fn step(id: &str, order: i32) -> PipelineStep {
        PipelineStep {
            id: id.to_owned(),
            name: id.to_uppercase(),
            order,
        }
    }

    #[test]
    fn explicit_links_win_over_later_stages() {
        let mut a = method("a", "s1");
        let b = method("b", "s1");
        a.related_methods = vec!["b".into()];
        let options = LinkOptions {
            same_step: true,
            ..LinkOptions::none()
        }
        .with_explicit();

        let graph = build_graph(&[a, b], &[step("s1", 0)], &options, &Theme::default());
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].kind, LinkKind::Explicit);
        assert_eq!(graph.edges[0].strength, 1.0);
    }

    #[test]
    fn same_step_skips_unresolved_step_ids() {
        let methods = [method("a", "ghost"), method("b", "ghost"), method("c", "known")];
        let options = LinkOptions {
            same_step: true,
            ..LinkOptions::none()
        };

        let graph = build_graph(&methods, &[step("known", 0)], &options, &Theme::default());
        assert!(graph.edges.is_empty(), "unexpected edges: {:?}", graph.edges);
        assert!(graph.nodes.iter().all(|node| node.degree == 0));
    }

    #[test]
    fn mutual_references_produce_one_edge() {
        let mut a = method("a", "s1");
        let mut b = method("b", "s2");
        a.related_methods = vec!["b".into()];
        b.related_methods = vec!["a".into(), "a".into()];

        let graph = build_graph(
            &[a, b],
            &[],
            &LinkOptions::none().with_explicit(),
            &Theme::default(),
        );
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes[0].degree, 1);
        assert_eq!(graph.nodes[1].degree, 1);
    }

    #[test]
    fn self_references_are_ignored() {
        let mut a = method("a", "s1");
        a.related_methods = vec!["a".into()];
        let graph = build_graph(
            &[a],
            &[],
            &LinkOptions::none().with_explicit(),
            &Theme::default(),
        );
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn shared_modality_skips_same_step_pairs_and_scales_strength() {
        let mut a = method("a", "s1");
        let mut b = method("b", "s2");
        let mut c = method("c", "s1");
        a.modalities = vec!["event-log".into(), "ocel".into()];
        b.modalities = vec!["ocel".into(), "event-log".into()];
        c.modalities = vec!["ocel".into()];

        let options = LinkOptions {
            shared_modality: true,
            ..LinkOptions::none()
        };
        let graph = build_graph(&[a, b, c], &[], &options, &Theme::default());

        assert_eq!(graph.edges.len(), 2);
        let ab = graph
            .edges
            .iter()
            .find(|edge| edge.touches(0) && edge.touches(1))
            .expect("a-b linked");
        assert!((ab.strength - 0.6).abs() < 1e-6);
        assert!(
            !graph
                .edges
                .iter()
                .any(|edge| edge.touches(0) && edge.touches(2))
        );
    }

    #[test]
    fn shared_task_strength_is_clamped() {
        let mut a = method("a", "s1");
        let mut b = method("b", "s2");
        a.tasks = (0..6).map(|i| format!("t{i}")).collect();
        b.tasks = a.tasks.clone();
        let options = LinkOptions {
            shared_task: true,
            ..LinkOptions::none()
        };
        let graph = build_graph(&[a, b], &[], &options, &Theme::default());
        assert_eq!(graph.edges[0].kind, LinkKind::SharedTask);
        assert_eq!(graph.edges[0].strength, 1.0);
    }

    #[test]
    fn similarity_prefers_strongest_pairs_under_cap() {
        let mut methods = (0..4)
            .map(|i| method(&format!("m{i}"), "s1"))
            .collect::<Vec<_>>();
        for method in &mut methods {
            method.modalities = vec!["event-log".into()];
        }
        methods[0].tasks = vec!["discovery".into()];
        methods[1].tasks = vec!["discovery".into()];

        let options = LinkOptions {
            similarity: true,
            similarity_threshold: 0.2,
            max_similar_per_node: 1,
            ..LinkOptions::none()
        };
        let graph = build_graph(&methods, &[step("s1", 0)], &options, &Theme::default());

        assert_eq!(graph.edges.len(), 2);
        let first = graph.edges[0];
        assert_eq!((first.source, first.target), (0, 1));
        assert!((first.strength - 0.6).abs() < 1e-6);
        assert!(graph.nodes.iter().all(|node| node.degree == 1));
    }

    #[test]
    fn nodes_copy_record_fields() {
        let mut a = method("a", "s1");
        a.name = "An extraordinarily long process mining method name".into();
        a.year = Some(2019);
        let graph = build_graph(&[a], &[], &LinkOptions::default(), &Theme::default());
        let node = &graph.nodes[0];
        assert_eq!(node.short_name.chars().count(), 31);
        assert_eq!(node.year, Some(2019));
        assert_eq!(node.color, Theme::default().step_color("s1"));
    }
}
