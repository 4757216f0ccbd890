use std::collections::HashSet;

use crate::catalog::{MethodRecord, PipelineStep};

const MODALITY_WEIGHT: f32 = 0.25;
const TASK_WEIGHT: f32 = 0.20;
const TAG_WEIGHT: f32 = 0.10;
const SAME_STEP_BONUS: f32 = 0.15;
const ADJACENT_STEP_BONUS: f32 = 0.05;
const MATURITY_BONUS: f32 = 0.05;
const EVIDENCE_BONUS: f32 = 0.05;

/// Number of distinct items present in both lists.
pub fn shared_count(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let other = b.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut seen = HashSet::new();
    a.iter()
        .map(String::as_str)
        .filter(|item| other.contains(item) && seen.insert(*item))
        .count()
}

fn step_bonus(a: &MethodRecord, b: &MethodRecord, steps: &[PipelineStep]) -> f32 {
    let order_of = |step_id: &str| {
        steps
            .iter()
            .find(|step| step.id == step_id)
            .map(|step| step.order)
    };

    match (order_of(&a.pipeline_step), order_of(&b.pipeline_step)) {
        (Some(left), Some(right)) => match left.abs_diff(right) {
            0 => SAME_STEP_BONUS,
            1 => ADJACENT_STEP_BONUS,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// Similarity of two methods in `[0, 1]`. Symmetric; zero for the same id.
pub fn score(a: &MethodRecord, b: &MethodRecord, steps: &[PipelineStep]) -> f32 {
    if a.id == b.id {
        return 0.0;
    }

    let mut total = 0.0;
    total += shared_count(&a.modalities, &b.modalities) as f32 * MODALITY_WEIGHT;
    total += shared_count(&a.tasks, &b.tasks) as f32 * TASK_WEIGHT;
    total += shared_count(&a.tags, &b.tags) as f32 * TAG_WEIGHT;
    total += step_bonus(a, b, steps);
    if a.maturity == b.maturity {
        total += MATURITY_BONUS;
    }
    if a.evidence_type == b.evidence_type {
        total += EVIDENCE_BONUS;
    }

    total.min(1.0)
}
