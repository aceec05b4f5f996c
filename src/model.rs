//! Output data model of the extraction engine.
//!
//! One generation run accumulates a [`RestApplicationModel`] (one
//! [`RestMethodModel`] per endpoint) plus a [`FoundTypes`] sink of every type
//! reference encountered along the way. Both are handed wholesale to the
//! rendering stage once the scan completes; nothing here is mutated after
//! construction of the individual records.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::metadata::TypeRef;

/// One formal parameter of an endpoint, as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodParameterModel {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// Extra declaration-site nullability information, carried only when the
    /// host language has a nullability mechanism orthogonal to the type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullability_hint: Option<TypeRef>,
    pub required: bool,
}

impl MethodParameterModel {
    pub fn new(name: impl Into<String>, type_ref: TypeRef, required: bool) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "parameter model requires a name");
        Self {
            name,
            type_ref,
            nullability_hint: None,
            required,
        }
    }

    pub fn with_nullability_hint(mut self, hint: TypeRef) -> Self {
        self.nullability_hint = Some(hint);
        self
    }
}

/// One queried value of an endpoint.
///
/// Currently always a single scalar parameter; the enum leaves room for
/// bean-style multi-field query objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestQueryParam {
    Single(MethodParameterModel),
}

impl RestQueryParam {
    pub fn model(&self) -> &MethodParameterModel {
        match self {
            RestQueryParam::Single(model) => model,
        }
    }
}

/// HTTP verbs recognized in mapping annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Case-insensitive parse of a mapping `method` attribute entry.
    pub fn parse(value: &str) -> Option<HttpMethod> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return-type model of one endpoint. For void endpoints `optional` carries
/// no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnTypeModel {
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    pub optional: bool,
}

/// The canonical record describing one endpoint.
///
/// Path parameters are in path-template order, not declaration order; query
/// parameters preserve method-parameter declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestMethodModel {
    /// Name of the owning controller class.
    pub controller: String,
    /// Name of the canonical method.
    pub name: String,
    pub return_type: ReturnTypeModel,
    pub http_method: HttpMethod,
    /// Fully accumulated path, class-level and method-level mapping joined.
    pub path: String,
    pub path_params: Vec<MethodParameterModel>,
    pub query_params: Vec<RestQueryParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_param: Option<MethodParameterModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Process-scoped accumulator of all endpoints discovered in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestApplicationModel {
    methods: Vec<RestMethodModel>,
}

impl RestApplicationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, method: RestMethodModel) {
        self.methods.push(method);
    }

    pub fn methods(&self) -> &[RestMethodModel] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Shared sink of every type reference encountered during extraction.
///
/// Set semantics: appends are order-insensitive and duplicates collapse, the
/// rendering stage treats the content as a set. Iteration order is the total
/// order of [`TypeRef`], so output stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoundTypes(BTreeSet<TypeRef>);

impl FoundTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, type_ref: TypeRef) {
        self.0.insert(type_ref);
    }

    pub fn contains(&self, type_ref: &TypeRef) -> bool {
        self.0.contains(type_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sink content as a sorted list, the shape the renderer consumes.
    pub fn to_vec(&self) -> Vec<TypeRef> {
        self.0.iter().cloned().collect()
    }
}
