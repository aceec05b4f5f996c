//! Canonical endpoint-method resolution across a controller's inheritance
//! chain.
//!
//! A logical endpoint can be declared several times: a generic base method,
//! the synthetic erasure bridge in a subclass, the concrete override, an
//! interface declaration. The resolver walks the inheritance chain
//! most-derived-first, groups declarations that collide on name plus erased
//! parameter types (identifying a bridge with its bridged target), and picks
//! one canonical method per group: the most derived non-bridge declaration.
//! The output is sorted by a stable key so it never depends on metadata
//! enumeration order.

use log::debug;
use std::collections::BTreeSet;

use crate::metadata::{ClassDef, MetadataRegistry, MethodDef, REQUEST_MAPPING};

/// One canonical endpoint method together with its declaring class, which is
/// needed later to resolve inherited type variables.
#[derive(Debug, Clone, Copy)]
pub struct EndpointMethod<'a> {
    pub declaring: &'a ClassDef,
    pub method: &'a MethodDef,
}

/// Collision key: method name plus erased parameter type list.
type MethodKey = (String, Vec<String>);

struct Candidate<'a> {
    /// Position of the declaring class in the inheritance chain; 0 is the
    /// controller itself, so smaller is more derived.
    depth: usize,
    declaring: &'a ClassDef,
    method: &'a MethodDef,
}

struct Group<'a> {
    keys: BTreeSet<MethodKey>,
    members: Vec<Candidate<'a>>,
}

/// Resolves the de-duplicated, canonical set of HTTP-mapped methods of a
/// controller class. Returns an empty list when nothing is mapped.
pub fn resolve_endpoint_methods<'a>(
    registry: &'a MetadataRegistry,
    controller: &'a ClassDef,
) -> Vec<EndpointMethod<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();

    for (depth, class) in registry.inheritance_chain(controller).iter().enumerate() {
        for method in &class.methods {
            // A bridge with a bare annotation list still counts when its
            // bridged target is mapped; merged lookup sees through bridges.
            let mapped = registry
                .find_merged_method_annotation(method, REQUEST_MAPPING)
                .is_some()
                || (method.bridge
                    && registry
                        .find_merged_method_annotation(find_bridged_method(class, method), REQUEST_MAPPING)
                        .is_some());
            if !mapped {
                continue;
            }

            let mut keys = BTreeSet::new();
            keys.insert(method_key(method));
            let mut members = vec![Candidate {
                depth,
                declaring: class,
                method,
            }];

            // A bridge is identified with its bridged target, joining the
            // erased declaration and the concrete one into a single group.
            if method.bridge {
                let target = find_bridged_method(class, method);
                if !std::ptr::eq(target, method) {
                    keys.insert(method_key(target));
                    members.push(Candidate {
                        depth,
                        declaring: class,
                        method: target,
                    });
                }
            }

            merge_into_groups(&mut groups, keys, members);
        }
    }

    let mut resolved: Vec<EndpointMethod<'a>> = groups.iter().map(canonical).collect();
    // Stable output order, independent of reflective enumeration order.
    resolved.sort_by(|a, b| {
        (a.declaring.name.as_str(), a.method.name.as_str(), a.method.erased_parameter_types())
            .cmp(&(b.declaring.name.as_str(), b.method.name.as_str(), b.method.erased_parameter_types()))
    });

    debug!(
        "Resolved {} canonical endpoint methods for {}",
        resolved.len(),
        controller.name
    );
    resolved
}

/// The non-bridge method a synthetic bridge forwards to: same name and arity
/// in the same class. The bridge itself when no such method exists.
pub fn find_bridged_method<'a>(class: &'a ClassDef, bridge: &'a MethodDef) -> &'a MethodDef {
    class
        .methods
        .iter()
        .find(|m| !m.bridge && m.name == bridge.name && m.parameters.len() == bridge.parameters.len())
        .unwrap_or(bridge)
}

fn method_key(method: &MethodDef) -> MethodKey {
    (method.name.clone(), method.erased_parameter_types())
}

/// Merges the new key/member set with every existing group it shares a key
/// with; distinct groups joined by the same method collapse into one.
fn merge_into_groups<'a>(
    groups: &mut Vec<Group<'a>>,
    mut keys: BTreeSet<MethodKey>,
    mut members: Vec<Candidate<'a>>,
) {
    let mut merged_indexes: Vec<usize> = groups
        .iter()
        .enumerate()
        .filter(|(_, g)| !g.keys.is_disjoint(&keys))
        .map(|(i, _)| i)
        .collect();

    // Drain from the end so earlier indexes stay valid.
    merged_indexes.reverse();
    for index in merged_indexes {
        let group = groups.remove(index);
        keys.extend(group.keys);
        members.extend(group.members);
    }

    groups.push(Group { keys, members });
}

/// The canonical representative of one collision group: prefer non-bridge
/// declarations, then the most derived one.
fn canonical<'a>(group: &Group<'a>) -> EndpointMethod<'a> {
    let best = group
        .members
        .iter()
        .filter(|c| !c.method.bridge)
        .min_by_key(|c| c.depth)
        .unwrap_or(&group.members[0]);
    EndpointMethod {
        declaring: best.declaring,
        method: best.method,
    }
}
