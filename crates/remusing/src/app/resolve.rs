//! Namespace resolution for bare identifiers.

use std::collections::BTreeSet;

use serde::Serialize;
use tree_sitter::Node;

use crate::app::capture::CaptureSet;
use crate::domain::model::{Capture, CaptureTag, NamespaceMap};

/// Bare occurrences plus the namespaces declared by `using a::b;` in the same source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub unqualified: BTreeSet<Capture>,
    pub declared: NamespaceMap,
}

impl Resolution {
    /// Build the resolution for one source.
    pub fn from_captures(captures: &CaptureSet, root: Node<'_>, source: &[u8]) -> Self {
        Self {
            unqualified: unqualified_occurrences(captures),
            declared: declared_namespaces(captures, root, source),
        }
    }

    /// Namespace for `symbol`: declarations first, then the fallback table.
    pub fn namespace_for<'a>(&'a self, symbol: &str, fallback: &'a NamespaceMap) -> Option<&'a str> {
        self.declared.get(symbol).or_else(|| fallback.get(symbol))
    }
}

/// Identifiers written without a namespace that may need one.
///
/// All type identifiers minus the qualified ones, plus called and streamed identifiers.
pub fn unqualified_occurrences(captures: &CaptureSet) -> BTreeSet<Capture> {
    let qualified: BTreeSet<Capture> = captures
        .get(CaptureTag::TypeQual)
        .chain(captures.get(CaptureTag::TypeQualTemplate))
        .cloned()
        .collect();

    captures
        .get(CaptureTag::Type)
        .filter(|capture| !qualified.contains(*capture))
        .chain(captures.get(CaptureTag::Func))
        .chain(captures.get(CaptureTag::Symbol))
        .cloned()
        .collect()
}

/// Map each name imported by `using a::b::c;` to its qualifier (`c -> a::b`).
///
/// Later declarations of the same name replace earlier ones.
pub fn declared_namespaces(captures: &CaptureSet, root: Node<'_>, source: &[u8]) -> NamespaceMap {
    let mut map = NamespaceMap::new();
    for capture in captures.get(CaptureTag::UsingQualType) {
        let Some(node) = capture.locate(root) else {
            tracing::warn!(
                start = capture.start,
                text = %capture.text,
                "using declaration no longer found in tree"
            );
            continue;
        };
        match split_qualified(node, source) {
            Some((name, scope)) => map.insert(name, scope),
            None => tracing::debug!(text = %capture.text, "using declaration has no namespace scope"),
        }
    }
    map
}

/// Split `a::b::c` into `("c", "a::b")` by following nested `scope`/`name` fields.
pub fn split_qualified(node: Node<'_>, source: &[u8]) -> Option<(String, String)> {
    let mut scope = node.child_by_field_name("scope");
    let mut name = node.child_by_field_name("name");
    let mut leaf = None;
    let mut components = Vec::new();

    while let (Some(scope_node), Some(name_node)) = (scope, name) {
        components.push(node_text(scope_node, source));
        leaf = Some(name_node);
        scope = name_node.child_by_field_name("scope");
        name = name_node.child_by_field_name("name");
    }

    let leaf = leaf?;
    Some((node_text(leaf, source), components.join("::")))
}

fn node_text(node: Node<'_>, source: &[u8]) -> String {
    String::from_utf8_lossy(&source[node.start_byte()..node.end_byte()]).into_owned()
}
