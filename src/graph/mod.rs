mod build;
pub mod similarity;

use std::collections::HashMap;

use eframe::egui::Color32;

use crate::catalog::PipelineStep;

pub use build::build_graph;

/// Relationship that produced an edge. Each kind carries a fixed style, so
/// rendering code matches on the variant instead of looking styles up by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    Explicit,
    SameStep,
    SharedModality,
    SharedTask,
    Similar,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub color: Color32,
    pub width: f32,
    /// Dash and gap length in screen units; `None` draws a solid line.
    pub dash: Option<(f32, f32)>,
    pub curved: bool,
    pub arrow: bool,
}

impl LinkKind {
    pub const ALL: [Self; 5] = [
        Self::Explicit,
        Self::SameStep,
        Self::SharedModality,
        Self::SharedTask,
        Self::Similar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::SameStep => "same step",
            Self::SharedModality => "shared modality",
            Self::SharedTask => "shared task",
            Self::Similar => "similar",
        }
    }

    pub fn style(self) -> EdgeStyle {
        match self {
            Self::Explicit => EdgeStyle {
                color: Color32::from_rgb(226, 232, 240),
                width: 2.0,
                dash: None,
                curved: false,
                arrow: true,
            },
            Self::SameStep => EdgeStyle {
                color: Color32::from_rgb(120, 132, 150),
                width: 1.0,
                dash: Some((2.0, 4.0)),
                curved: true,
                arrow: false,
            },
            Self::SharedModality => EdgeStyle {
                color: Color32::from_rgb(110, 170, 255),
                width: 1.5,
                dash: Some((6.0, 3.0)),
                curved: true,
                arrow: false,
            },
            Self::SharedTask => EdgeStyle {
                color: Color32::from_rgb(120, 210, 150),
                width: 1.5,
                dash: Some((4.0, 4.0)),
                curved: true,
                arrow: false,
            },
            Self::Similar => EdgeStyle {
                color: Color32::from_rgb(200, 150, 255),
                width: 1.25,
                dash: None,
                curved: true,
                arrow: false,
            },
        }
    }

    /// Rest length of the link spring before the spacing multiplier.
    pub fn base_distance(self) -> f32 {
        match self {
            Self::Explicit => 150.0,
            Self::Similar => 200.0,
            Self::SameStep | Self::SharedModality | Self::SharedTask => 250.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkOptions {
    pub explicit: bool,
    pub same_step: bool,
    pub shared_modality: bool,
    pub shared_task: bool,
    pub similarity: bool,
    pub similarity_threshold: f32,
    pub max_similar_per_node: usize,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            explicit: true,
            same_step: false,
            shared_modality: false,
            shared_task: false,
            similarity: true,
            similarity_threshold: 0.3,
            max_similar_per_node: 3,
        }
    }
}

impl LinkOptions {
    pub fn none() -> Self {
        Self {
            explicit: false,
            same_step: false,
            shared_modality: false,
            shared_task: false,
            similarity: false,
            ..Self::default()
        }
    }

    pub fn with_explicit(mut self) -> Self {
        self.explicit = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub pipeline_step: String,
    pub modalities: Vec<String>,
    pub tasks: Vec<String>,
    pub tags: Vec<String>,
    pub maturity: String,
    pub evidence_type: String,
    pub related_methods: Vec<String>,
    pub year: Option<u16>,
    pub color: Color32,
    pub degree: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub kind: LinkKind,
    pub strength: f32,
}

impl GraphEdge {
    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }

    pub fn other(&self, index: usize) -> Option<usize> {
        if self.source == index {
            Some(self.target)
        } else if self.target == index {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn style(&self) -> EdgeStyle {
        self.kind.style()
    }
}

/// Nodes sharing one pipeline step id, in node index order.
#[derive(Clone, Debug, PartialEq)]
pub struct StepGroup {
    pub step_id: String,
    pub name: String,
    pub known: bool,
    pub members: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct MethodGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
}

impl MethodGraph {
    pub(crate) fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            adjacency[edge.source].push(edge.target);
            adjacency[edge.target].push(edge.source);
        }

        Self {
            nodes,
            edges,
            index_by_id,
            adjacency,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incident_edges(&self, index: usize) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.touches(index))
    }

    pub fn source_id(&self, edge: &GraphEdge) -> &str {
        &self.nodes[edge.source].id
    }

    pub fn target_id(&self, edge: &GraphEdge) -> &str {
        &self.nodes[edge.target].id
    }

    pub fn edge_count_by_kind(&self) -> Vec<(LinkKind, usize)> {
        LinkKind::ALL
            .iter()
            .map(|kind| {
                let count = self.edges.iter().filter(|edge| edge.kind == *kind).count();
                (*kind, count)
            })
            .collect()
    }

    /// Groups nodes by pipeline step: known steps first in step order, then
    /// step ids that resolve to no known step in first-seen order. Empty
    /// groups are left out.
    pub fn step_groups(&self, steps: &[PipelineStep]) -> Vec<StepGroup> {
        let mut ordered = steps.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|step| step.order);

        let mut groups = ordered
            .iter()
            .map(|step| StepGroup {
                step_id: step.id.clone(),
                name: step.name.clone(),
                known: true,
                members: Vec::new(),
            })
            .collect::<Vec<_>>();
        let mut slot_by_id = groups
            .iter()
            .enumerate()
            .map(|(slot, group)| (group.step_id.clone(), slot))
            .collect::<HashMap<_, _>>();

        for (index, node) in self.nodes.iter().enumerate() {
            let slot = match slot_by_id.get(&node.pipeline_step) {
                Some(&slot) => slot,
                None => {
                    groups.push(StepGroup {
                        step_id: node.pipeline_step.clone(),
                        name: node.pipeline_step.clone(),
                        known: false,
                        members: Vec::new(),
                    });
                    slot_by_id.insert(node.pipeline_step.clone(), groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].members.push(index);
        }

        groups.retain(|group| !group.members.is_empty());
        groups
    }
}
