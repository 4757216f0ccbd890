mod load;

use serde::Deserialize;

pub use load::{CatalogError, load_catalog, parse_catalog};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MethodRecord {
    pub id: String,
    pub name: String,
    pub pipeline_step: String,
    #[serde(default)]
    pub modalities: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub maturity: String,
    #[serde(default)]
    pub evidence_type: String,
    #[serde(default)]
    pub related_methods: Vec<String>,
    #[serde(default)]
    pub year: Option<u16>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PipelineStep {
    pub id: String,
    pub name: String,
    pub order: i32,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub pipeline_steps: Vec<PipelineStep>,
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
}

impl Catalog {
    pub fn method(&self, id: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|method| method.id == id)
    }

    pub fn step(&self, id: &str) -> Option<&PipelineStep> {
        self.pipeline_steps.iter().find(|step| step.id == id)
    }

    /// Steps ordered by their `order` field; ties keep catalog order.
    pub fn ordered_steps(&self) -> Vec<PipelineStep> {
        let mut steps = self.pipeline_steps.clone();
        steps.sort_by_key(|step| step.order);
        steps
    }
}
