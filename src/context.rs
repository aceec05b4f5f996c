//! Path-accumulating context threaded down the class-to-method traversal.
//!
//! Every transition produces a new context, so sibling methods on the same
//! controller never observe each other's path-parameter bindings.

use std::collections::BTreeMap;

use crate::metadata::ClassDef;
use crate::model::MethodParameterModel;

/// Immutable traversal context: the owning controller class, the path
/// accumulated so far, and the path-parameter type bindings collected from
/// class level down to method level.
#[derive(Debug, Clone)]
pub struct ResourceContext<'a> {
    owner: &'a ClassDef,
    path: String,
    path_param_types: BTreeMap<String, MethodParameterModel>,
}

impl<'a> ResourceContext<'a> {
    /// A fresh context rooted at the controller's class-level mapping path.
    /// An empty base path means "mapped at root".
    pub fn new(owner: &'a ClassDef, base_path: &str) -> Self {
        Self {
            owner,
            path: base_path.to_string(),
            path_param_types: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &'a ClassDef {
        self.owner
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_param_type(&self, name: &str) -> Option<&MethodParameterModel> {
        self.path_param_types.get(name)
    }

    /// A descendant context with `extra` appended to the path. An empty
    /// `extra` leaves the path unchanged; otherwise the join is normalized
    /// so no duplicate separator appears at the seam.
    pub fn sub_path(&self, extra: &str) -> Self {
        let path = if extra.is_empty() {
            self.path.clone()
        } else {
            join_paths(&self.path, extra)
        };
        Self {
            owner: self.owner,
            path,
            path_param_types: self.path_param_types.clone(),
        }
    }

    /// A descendant context whose bindings are the union of this context's
    /// and `additions`, with `additions` winning on name collision.
    pub fn sub_path_param_types(
        &self,
        additions: BTreeMap<String, MethodParameterModel>,
    ) -> Self {
        let mut path_param_types = self.path_param_types.clone();
        path_param_types.extend(additions);
        Self {
            owner: self.owner,
            path: self.path.clone(),
            path_param_types,
        }
    }
}

/// Joins a base path and a sub-path, handling slashes at the seam.
fn join_paths(base: &str, extra: &str) -> String {
    if base.is_empty() {
        return extra.to_string();
    }

    let base = base.trim_end_matches('/');
    let extra = extra.trim_start_matches('/');

    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, extra)
    }
}
