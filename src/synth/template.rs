//! Template assembly, fingerprinting, and atomic output.
//!
//! Resources are assembled in dependency order, so the document itself
//! reads "network first, wiring last". The fingerprint is BLAKE3 over the
//! compact JSON encoding: identical declarations yield identical digests.

use crate::graph::order;
use crate::graph::types::Topology;
use crate::graph::validate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// The synthesized template document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "Description")]
    pub description: String,

    /// Fragments keyed by logical id, in dependency order
    #[serde(rename = "Resources")]
    pub resources: IndexMap<String, Value>,
}

/// Validate, order, and render a topology into a template.
pub fn synthesize(topology: &Topology) -> Result<Template, String> {
    let errors = validate::validate_topology(topology);
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
        return Err(format!(
            "{} validation error(s): {}",
            messages.len(),
            messages.join("; ")
        ));
    }

    let declaration_order = order::declaration_order(topology)?;

    let mut resources = IndexMap::new();
    for id in &declaration_order {
        let resource = topology
            .resources
            .get(id)
            .ok_or_else(|| format!("ordered id '{}' missing from topology", id))?;
        for (fragment_id, fragment) in super::emit(id, resource) {
            if resources.insert(fragment_id.clone(), fragment).is_some() {
                return Err(format!("fragment id '{}' emitted twice", fragment_id));
            }
        }
    }

    Ok(Template {
        description: topology
            .description
            .clone()
            .unwrap_or_else(|| topology.name.clone()),
        resources,
    })
}

/// Pretty JSON rendering.
pub fn to_json(template: &Template) -> Result<String, String> {
    serde_json::to_string_pretty(template).map_err(|e| format!("JSON encode error: {}", e))
}

/// YAML rendering.
pub fn to_yaml(template: &Template) -> Result<String, String> {
    serde_yaml_ng::to_string(template).map_err(|e| format!("YAML encode error: {}", e))
}

/// BLAKE3 fingerprint of the canonical (compact JSON) encoding.
pub fn fingerprint(template: &Template) -> Result<String, String> {
    let canonical =
        serde_json::to_string(template).map_err(|e| format!("JSON encode error: {}", e))?;
    Ok(format!("blake3:{}", blake3::hash(canonical.as_bytes()).to_hex()))
}

/// Write rendered output atomically (temp file + rename).
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}
