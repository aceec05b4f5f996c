//! Resolution of generic types against a concrete controller class.
//!
//! A method inherited from a generic ancestor (`Crud<T>` declaring
//! `find() -> T`) carries type variables that only become concrete where a
//! subclass parameterizes the ancestor (`OrderController extends Crud<Order>`).
//! [`resolve_type`] walks the ancestor path from the concrete class to the
//! declaring class, composing the substitutions contributed by each
//! `extends`/`implements` edge, and applies the result. Variables that never
//! get bound pass through unresolved, downstream rendering treats them as
//! opaque.

use log::debug;
use std::collections::BTreeMap;

use crate::metadata::{ClassDef, MetadataRegistry, TypeRef};

/// Resolves `ty`, declared by `declaring`, against the concrete class
/// `concrete`.
pub fn resolve_type(
    registry: &MetadataRegistry,
    concrete: &ClassDef,
    ty: &TypeRef,
    declaring: &ClassDef,
) -> TypeRef {
    match substitution_for(registry, concrete, declaring) {
        Some(substitution) => apply(&substitution, ty),
        None => {
            debug!(
                "{} is not an ancestor of {}, leaving {} unresolved",
                declaring.name, concrete.name, ty
            );
            ty.clone()
        }
    }
}

/// The accumulated type-variable substitution along the path from `concrete`
/// up to `declaring`, or `None` when no ancestor path exists.
fn substitution_for(
    registry: &MetadataRegistry,
    concrete: &ClassDef,
    declaring: &ClassDef,
) -> Option<BTreeMap<String, TypeRef>> {
    walk(registry, concrete, &BTreeMap::new(), declaring)
}

fn walk(
    registry: &MetadataRegistry,
    current: &ClassDef,
    substitution: &BTreeMap<String, TypeRef>,
    declaring: &ClassDef,
) -> Option<BTreeMap<String, TypeRef>> {
    if current.name == declaring.name {
        return Some(substitution.clone());
    }

    let ancestors = current
        .superclass
        .iter()
        .chain(current.interfaces.iter());
    for ancestor_ref in ancestors {
        let Some(ancestor) = registry.class(&ancestor_ref.erasure()) else {
            continue;
        };
        let next = edge_substitution(ancestor, ancestor_ref, substitution);
        if let Some(found) = walk(registry, ancestor, &next, declaring) {
            return Some(found);
        }
    }
    None
}

/// Substitution seen by `ancestor` when reached through `ancestor_ref`:
/// each of the ancestor's type parameters maps to the corresponding type
/// argument, itself resolved through the substitution accumulated so far.
/// A raw (unparameterized) edge leaves the ancestor's variables unbound.
fn edge_substitution(
    ancestor: &ClassDef,
    ancestor_ref: &TypeRef,
    substitution: &BTreeMap<String, TypeRef>,
) -> BTreeMap<String, TypeRef> {
    let mut next = BTreeMap::new();
    if let TypeRef::Parameterized { args, .. } = ancestor_ref {
        for (param, arg) in ancestor.type_params.iter().zip(args.iter()) {
            next.insert(param.clone(), apply(substitution, arg));
        }
    }
    next
}

/// Applies a substitution recursively.
fn apply(substitution: &BTreeMap<String, TypeRef>, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Variable { name } => substitution
            .get(name)
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        TypeRef::Parameterized { raw, args } => TypeRef::Parameterized {
            raw: raw.clone(),
            args: args.iter().map(|arg| apply(substitution, arg)).collect(),
        },
        TypeRef::Array { item } => TypeRef::Array {
            item: Box::new(apply(substitution, item)),
        },
        TypeRef::Void | TypeRef::Named { .. } => ty.clone(),
    }
}
