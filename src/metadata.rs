//! Class metadata surface consumed by the extraction engine.
//!
//! The extractor never touches runtime reflection. Instead it works over an
//! explicit, declarative metadata table: every class of the inspected
//! application is described by a [`ClassDef`] (annotations, type parameters,
//! ancestors, methods), and all of them live in a [`MetadataRegistry`].
//!
//! The registry is the single lookup capability the rest of the crate needs:
//! class resolution by name, inheritance chains in a fixed documented order,
//! and merged annotation lookup (an annotation whose own type declaration is
//! annotated with the requested kind contributes its attributes as defaults).
//!
//! All definitions are `serde`-deserializable so registries can be loaded
//! from JSON files (see the [`crate::loader`] module).

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{Error, Result};

/// Annotation marking a class as a REST controller.
pub const REST_CONTROLLER: &str = "RestController";
/// Annotation carrying the HTTP mapping (path, verb) of a class or method.
pub const REQUEST_MAPPING: &str = "RequestMapping";
/// Annotation binding a formal parameter to a URL template variable.
pub const PATH_VARIABLE: &str = "PathVariable";
/// Annotation binding a formal parameter to a query-string value.
pub const REQUEST_PARAM: &str = "RequestParam";
/// Annotation marking the request-body (entity) parameter.
pub const REQUEST_BODY: &str = "RequestBody";
/// Annotation marking an application entry-point class.
pub const APPLICATION: &str = "Application";
/// Declaration-site nullability annotation.
pub const NULLABLE: &str = "Nullable";

/// Pagination convenience type expanded into `page`/`size`/`sort` params.
pub const PAGEABLE: &str = "Pageable";
/// Response envelope type unwrapped to its first type argument.
pub const RESPONSE_ENTITY: &str = "ResponseEntity";

pub const ATTR_PATH: &str = "path";
pub const ATTR_METHOD: &str = "method";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_NAME: &str = "name";
pub const ATTR_REQUIRED: &str = "required";
pub const ATTR_DEFAULT_VALUE: &str = "default_value";
pub const ATTR_COMPONENTS: &str = "components";

/// Language-neutral reference to a type in the inspected application.
///
/// `Named` refers to a class (possibly a key into the registry), `Variable`
/// to a type variable declared by a generic class, `Parameterized` to a
/// generic instantiation. The total order makes every collection of type
/// references sortable, which keeps the extraction output deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    Void,
    Named { name: String },
    Variable { name: String },
    Parameterized { raw: String, args: Vec<TypeRef> },
    Array { item: Box<TypeRef> },
}

impl Default for TypeRef {
    fn default() -> Self {
        TypeRef::Void
    }
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named { name: name.into() }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        TypeRef::Variable { name: name.into() }
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Parameterized {
            raw: raw.into(),
            args,
        }
    }

    pub fn array(item: TypeRef) -> Self {
        TypeRef::Array {
            item: Box::new(item),
        }
    }

    /// The generic textual type used as the fallback for unbound path
    /// variables.
    pub fn string() -> Self {
        TypeRef::named("string")
    }

    /// The integer type used by the synthetic pagination parameters.
    pub fn long() -> Self {
        TypeRef::named("long")
    }

    /// Returns true when this reference names the given raw class, either
    /// directly or as a parameterized instantiation.
    pub fn is_named(&self, name: &str) -> bool {
        match self {
            TypeRef::Named { name: n } => n == name,
            TypeRef::Parameterized { raw, .. } => raw == name,
            _ => false,
        }
    }

    /// The erased (raw) type name. Type variables erase to `object`, the
    /// way erasure-based generics collapse them, so a generic declaration
    /// and its erasure bridge share one collision key in the resolver.
    pub fn erasure(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Named { name } => name.clone(),
            TypeRef::Variable { .. } => "object".to_string(),
            TypeRef::Parameterized { raw, .. } => raw.clone(),
            TypeRef::Array { item } => format!("{}[]", item.erasure()),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Named { name } => write!(f, "{}", name),
            TypeRef::Variable { name } => write!(f, "{}", name),
            TypeRef::Parameterized { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeRef::Array { item } => write!(f, "{}[]", item),
        }
    }
}

/// Value of one annotation attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
    StrList(Vec<String>),
}

/// One annotation use with its attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute insertion, used heavily by tests.
    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Boolean attribute with a default when absent or of another shape.
    pub fn bool_attr(&self, key: &str, default: bool) -> bool {
        match self.attributes.get(key) {
            Some(AttrValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// String attribute; `None` when absent or not a string.
    pub fn string_attr(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(AttrValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// First entry of a string-list attribute, also accepting a plain string.
    ///
    /// Mapping attributes like `path` and `method` are declared as lists but
    /// only their first entry is ever consumed.
    pub fn first_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(AttrValue::Str(s)) => Some(s.as_str()),
            Some(AttrValue::StrList(list)) => list.first().map(|s| s.as_str()),
            _ => None,
        }
    }

    /// All entries of a string-list attribute, also accepting a plain string.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.attributes.get(key) {
            Some(AttrValue::Str(s)) => vec![s.clone()],
            Some(AttrValue::StrList(list)) => list.clone(),
            _ => Vec::new(),
        }
    }
}

/// One formal parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Declaration-site nullability signal, orthogonal to the declared type.
    #[serde(default)]
    pub nullable: bool,
}

impl ParameterDef {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            annotations: Vec::new(),
            nullable: false,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// One declared method of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub return_type: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Synthetic erasure bridge, not a real endpoint declaration.
    #[serde(default)]
    pub bridge: bool,
    /// Source documentation carried into the endpoint model as a comment.
    #[serde(default)]
    pub doc: Option<String>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeRef::Void,
            annotations: Vec::new(),
            bridge: false,
            doc: None,
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_return_type(mut self, return_type: TypeRef) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn as_bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Erased parameter type list, the collision key used by the resolver.
    pub fn erased_parameter_types(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.type_ref.erasure()).collect()
    }
}

/// One class of the inspected application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    /// Type variables declared by this class, e.g. `["T"]` for `Crud<T>`.
    #[serde(default)]
    pub type_params: Vec<String>,
    /// Direct superclass, possibly parameterized (`Crud<Order>`).
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    /// Implemented interfaces, possibly parameterized.
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_type_params(mut self, params: Vec<&str>) -> Self {
        self.type_params = params.into_iter().map(String::from).collect();
        self
    }

    pub fn with_superclass(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// The metadata table of one inspected application.
///
/// Classes are indexed by name. Lookups that miss are either tolerated
/// (ancestor references during chain traversal) or fatal
/// ([`MetadataRegistry::require_class`] for seed and discovery resolution),
/// matching the error taxonomy of the extraction engine.
#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    classes: BTreeMap<String, ClassDef>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_classes(classes: Vec<ClassDef>) -> Self {
        let mut registry = Self::new();
        for class in classes {
            registry.add_class(class);
        }
        registry
    }

    /// Registers a class, replacing any previous definition with the same
    /// name. Returns the replaced definition, if any.
    pub fn add_class(&mut self, class: ClassDef) -> Option<ClassDef> {
        self.classes.insert(class.name.clone(), class)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Resolves a class name that must exist; a miss is the fatal
    /// class-loading failure of the discovery path.
    pub fn require_class(&self, name: &str) -> Result<&ClassDef> {
        self.class(name)
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The inheritance chain of a class in a fixed, documented order:
    /// the class itself, then its superclasses most-derived-first, then the
    /// interfaces of all of those breadth-first in declaration order.
    /// Ancestors missing from the registry are skipped with a debug log.
    pub fn inheritance_chain<'a>(&'a self, class: &'a ClassDef) -> Vec<&'a ClassDef> {
        let mut chain: Vec<&ClassDef> = Vec::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();

        // Superclass spine first.
        let mut current = Some(class);
        while let Some(c) = current {
            if seen.insert(&c.name) {
                chain.push(c);
            }
            current = match &c.superclass {
                Some(superclass) => {
                    let raw = superclass.erasure();
                    let resolved = self.classes.get(&raw);
                    if resolved.is_none() {
                        debug!("Superclass {} of {} is not in the registry", raw, c.name);
                    }
                    resolved
                }
                None => None,
            };
        }

        // Then interfaces, breadth-first from every class on the spine.
        let mut queue: VecDeque<String> = chain
            .iter()
            .flat_map(|c| c.interfaces.iter().map(|i| i.erasure()))
            .collect();
        while let Some(raw) = queue.pop_front() {
            match self.classes.get(&raw) {
                Some(interface) => {
                    if seen.insert(&interface.name) {
                        chain.push(interface);
                        queue.extend(interface.interfaces.iter().map(|i| i.erasure()));
                    }
                }
                None => debug!("Interface {} is not in the registry", raw),
            }
        }

        chain
    }

    /// Merges an annotation of the given kind out of an annotation list.
    ///
    /// A direct use wins as-is. Otherwise, an annotation whose own type
    /// declaration carries the requested kind is merged: the declaration's
    /// attributes act as defaults, overlaid by the use-site attributes.
    /// This is how a `GetMapping`-style shorthand contributes `method = GET`
    /// while the use site contributes the path.
    fn merge_annotation(&self, annotations: &[Annotation], kind: &str) -> Option<Annotation> {
        for annotation in annotations {
            if annotation.name == kind {
                return Some(annotation.clone());
            }
            if let Some(meta_class) = self.classes.get(&annotation.name) {
                if let Some(meta) = meta_class.annotation(kind) {
                    let mut attributes = meta.attributes.clone();
                    for (key, value) in &annotation.attributes {
                        attributes.insert(key.clone(), value.clone());
                    }
                    return Some(Annotation {
                        name: kind.to_string(),
                        attributes,
                    });
                }
            }
        }
        None
    }

    /// Merged annotation lookup on a class, walking the inheritance chain so
    /// declarations inherited from ancestors are found; the nearest
    /// declaration wins.
    pub fn find_merged_class_annotation(&self, class: &ClassDef, kind: &str) -> Option<Annotation> {
        self.inheritance_chain(class)
            .iter()
            .find_map(|c| self.merge_annotation(&c.annotations, kind))
    }

    /// Merged annotation lookup on a method declaration.
    pub fn find_merged_method_annotation(
        &self,
        method: &MethodDef,
        kind: &str,
    ) -> Option<Annotation> {
        self.merge_annotation(&method.annotations, kind)
    }

    /// Merged annotation lookup on a formal parameter.
    pub fn find_merged_parameter_annotation(
        &self,
        parameter: &ParameterDef,
        kind: &str,
    ) -> Option<Annotation> {
        self.merge_annotation(&parameter.annotations, kind)
    }
}
