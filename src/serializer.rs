//! Serialization of the extraction output to YAML or JSON.
//!
//! The endpoint model and the found-types sink are rendered together as one
//! [`GenerationOutput`] document, suitable for downstream code generators or
//! human review.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::metadata::TypeRef;
use crate::model::{FoundTypes, RestApplicationModel};

/// The complete output of one generation run.
///
/// `found_types` is rendered as a sorted list, so serializing the same model
/// twice yields byte-identical documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutput {
    pub model: RestApplicationModel,
    pub found_types: Vec<TypeRef>,
}

impl GenerationOutput {
    pub fn new(model: RestApplicationModel, found_types: &FoundTypes) -> Self {
        Self {
            model,
            found_types: found_types.to_vec(),
        }
    }
}

/// Serializes a generation output to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(output: &GenerationOutput) -> Result<String> {
    debug!("Serializing endpoint model to YAML");
    serde_yaml::to_string(output).context("Failed to serialize endpoint model to YAML")
}

/// Serializes a generation output to JSON format with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(output: &GenerationOutput) -> Result<String> {
    debug!("Serializing endpoint model to JSON");
    serde_json::to_string_pretty(output).context("Failed to serialize endpoint model to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    );
    Ok(())
}
