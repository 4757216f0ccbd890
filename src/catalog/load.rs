use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::Catalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON")]
    Json(#[from] serde_json::Error),
    #[error("method #{index} has an empty id")]
    EmptyId { index: usize },
    #[error("duplicate method id `{0}`")]
    DuplicateMethod(String),
    #[error("duplicate pipeline step id `{0}`")]
    DuplicateStep(String),
}

pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(&raw)?;
    info!(
        path = %path.display(),
        methods = catalog.methods.len(),
        steps = catalog.pipeline_steps.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

pub fn parse_catalog(raw: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = serde_json::from_str(raw)?;

    let mut step_ids = HashSet::with_capacity(catalog.pipeline_steps.len());
    for step in &catalog.pipeline_steps {
        if !step_ids.insert(step.id.as_str()) {
            return Err(CatalogError::DuplicateStep(step.id.clone()));
        }
    }

    let mut method_ids = HashSet::with_capacity(catalog.methods.len());
    for (index, method) in catalog.methods.iter().enumerate() {
        if method.id.trim().is_empty() {
            return Err(CatalogError::EmptyId { index });
        }
        if !method_ids.insert(method.id.as_str()) {
            return Err(CatalogError::DuplicateMethod(method.id.clone()));
        }
    }

    let dangling = catalog
        .methods
        .iter()
        .flat_map(|method| method.related_methods.iter())
        .filter(|id| !method_ids.contains(id.as_str()))
        .count();
    if dangling > 0 {
        warn!(dangling, "catalog holds related-method ids that resolve to nothing");
    }

    Ok(catalog)
}
