//! Loading metadata registries from JSON files on disk.
//!
//! A metadata table is spread over one or more `.json` files, each carrying a
//! flat list of class definitions. The loader walks a directory tree (or
//! accepts a single file), parses every metadata file and merges them into
//! one [`MetadataRegistry`].

use log::{debug, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::metadata::{ClassDef, MetadataRegistry};

/// Shape of one metadata file: a flat list of class definitions.
#[derive(Deserialize)]
struct RegistryFile {
    classes: Vec<ClassDef>,
}

/// Loads class metadata from a directory tree of `.json` files.
///
/// # Example
///
/// ```no_run
/// use restmodel_from_metadata::loader::RegistryLoader;
/// use std::path::PathBuf;
///
/// let loader = RegistryLoader::new(PathBuf::from("./metadata"));
/// let registry = loader.load().unwrap();
/// println!("Loaded {} classes", registry.len());
/// ```
pub struct RegistryLoader {
    root_path: PathBuf,
}

impl RegistryLoader {
    /// Creates a loader rooted at a directory or at a single metadata file.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Walks the tree, parses every metadata file and merges the classes
    /// into one registry.
    ///
    /// Hidden directories and `target` are skipped. Files are processed in
    /// path order, so when the same class name appears in several files the
    /// lexicographically last file wins; every replacement is logged as a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error when a metadata file cannot be read or does not
    /// parse; an unreadable directory entry only produces a warning.
    pub fn load(&self) -> Result<MetadataRegistry> {
        let files = self.metadata_files();
        let mut registry = MetadataRegistry::new();

        for file in &files {
            for class in load_file(file)? {
                let name = class.name.clone();
                if registry.add_class(class).is_some() {
                    warn!(
                        "Class {} redefined by {}, keeping the later definition",
                        name,
                        file.display()
                    );
                }
            }
        }

        info!(
            "Loaded {} classes from {} metadata files",
            registry.len(),
            files.len()
        );
        Ok(registry)
    }

    /// Collects every `.json` file under the root, sorted by path so the
    /// merge order never depends on directory enumeration order.
    fn metadata_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_target = file_name == "target";

                !is_hidden && !is_target
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
                    {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    warn!("Failed to access path: {}", e);
                }
            }
        }

        files.sort();
        files
    }
}

fn load_file(path: &Path) -> Result<Vec<ClassDef>> {
    debug!("Loading metadata file: {}", path.display());
    let content = fs::read_to_string(path)?;
    let parsed: RegistryFile =
        serde_json::from_str(&content).map_err(|e| Error::RegistryError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(parsed.classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn class_json(name: &str) -> String {
        format!(r#"{{ "classes": [ {{ "name": "{}" }} ] }}"#, name)
    }

    #[test]
    fn test_load_merges_all_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("orders.json"), class_json("OrderController")).unwrap();
        fs::write(root.join("users.json"), class_json("UserController")).unwrap();
        fs::write(root.join("readme.md"), "# not metadata").unwrap();

        let registry = RegistryLoader::new(root.to_path_buf()).load().unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.class("OrderController").is_some());
        assert!(registry.class("UserController").is_some());
    }

    #[test]
    fn test_load_single_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.json");
        fs::write(&file, class_json("App")).unwrap();

        let registry = RegistryLoader::new(file).load().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_recurses_into_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("controllers")).unwrap();
        fs::write(root.join("app.json"), class_json("App")).unwrap();
        fs::write(
            root.join("controllers/orders.json"),
            class_json("OrderController"),
        )
        .unwrap();

        let registry = RegistryLoader::new(root.to_path_buf()).load().unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_load_skips_hidden_and_target_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join(".git/stale.json"), class_json("Stale")).unwrap();
        fs::write(root.join("target/cached.json"), class_json("Cached")).unwrap();
        fs::write(root.join("app.json"), class_json("App")).unwrap();

        let registry = RegistryLoader::new(root.to_path_buf()).load().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.class("App").is_some());
    }

    #[test]
    fn test_later_file_wins_on_duplicate_class() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("a.json"),
            r#"{ "classes": [ { "name": "OrderController", "type_params": ["T"] } ] }"#,
        )
        .unwrap();
        fs::write(root.join("b.json"), class_json("OrderController")).unwrap();

        let registry = RegistryLoader::new(root.to_path_buf()).load().unwrap();

        assert_eq!(registry.len(), 1);
        // b.json sorts after a.json and replaces its definition.
        assert!(registry
            .class("OrderController")
            .unwrap()
            .type_params
            .is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("broken.json");
        fs::write(&file, "{ not json").unwrap();

        let err = RegistryLoader::new(temp_dir.path().to_path_buf())
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::RegistryError { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_empty_directory_gives_empty_registry() {
        let temp_dir = TempDir::new().unwrap();
        let registry = RegistryLoader::new(temp_dir.path().to_path_buf())
            .load()
            .unwrap();
        assert!(registry.is_empty());
    }
}
