//! Domain models for captures, namespace tables, and planned edits.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use tree_sitter::Node;

/// Why a node was captured by the query battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTag {
    /// Every `type_identifier`, qualified or not.
    Type,
    /// Type name with an explicit namespace scope, e.g. `string` in `std::string`.
    TypeQual,
    /// Namespace scope of a qualified type.
    TypeScope,
    /// Type name reached through a qualified template, e.g. `vector` in `std::vector<int>`.
    TypeQualTemplate,
    /// Namespace scope of a qualified template.
    TypeScopeTemplate,
    /// Bare identifier used as a stream operand.
    Symbol,
    /// Bare identifier used as a called function.
    Func,
    /// Qualified name imported by `using a::b;`.
    UsingQualType,
    /// Whole `using a::b;` declaration.
    UsingDecl,
    /// Namespace named by `using namespace a;`.
    UsingId,
    /// Whole `using namespace a;` declaration.
    UsingNsDecl,
}

impl CaptureTag {
    pub const ALL: [CaptureTag; 11] = [
        CaptureTag::Type,
        CaptureTag::TypeQual,
        CaptureTag::TypeScope,
        CaptureTag::TypeQualTemplate,
        CaptureTag::TypeScopeTemplate,
        CaptureTag::Symbol,
        CaptureTag::Func,
        CaptureTag::UsingQualType,
        CaptureTag::UsingDecl,
        CaptureTag::UsingId,
        CaptureTag::UsingNsDecl,
    ];

    /// Capture name as written in query patterns (`@name`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureTag::Type => "type",
            CaptureTag::TypeQual => "type_qual",
            CaptureTag::TypeScope => "type_scope",
            CaptureTag::TypeQualTemplate => "type_qual_template",
            CaptureTag::TypeScopeTemplate => "type_scope_template",
            CaptureTag::Symbol => "symbol",
            CaptureTag::Func => "func",
            CaptureTag::UsingQualType => "using_qual_type",
            CaptureTag::UsingDecl => "using_decl",
            CaptureTag::UsingId => "using_id",
            CaptureTag::UsingNsDecl => "using_ns_decl",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for CaptureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged syntax node, identified by its byte span.
///
/// Equality, hashing, and ordering only look at `(start, end)`: two matches covering the same
/// bytes are the same capture even if they came from different patterns or node kinds.
#[derive(Debug, Clone, Serialize)]
pub struct Capture {
    pub start: usize,
    pub end: usize,
    pub kind: &'static str,
    pub text: String,
    pub tag: CaptureTag,
}

impl Capture {
    /// Snapshot a node into an owned capture.
    pub fn from_node(node: Node<'_>, source: &[u8], tag: CaptureTag) -> Self {
        let (start, end) = (node.start_byte(), node.end_byte());
        let text = match node.utf8_text(source) {
            Ok(text) => text.to_owned(),
            Err(_) => String::from_utf8_lossy(&source[start..end]).into_owned(),
        };
        Self {
            start,
            end,
            kind: node.kind(),
            text,
            tag,
        }
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Find the node this capture was taken from.
    ///
    /// Several nodes can share a span, so the deepest node covering the span is walked
    /// upwards through same-span parents until the recorded kind matches.
    pub fn locate<'tree>(&self, root: Node<'tree>) -> Option<Node<'tree>> {
        let mut node = root.descendant_for_byte_range(self.start, self.end)?;
        loop {
            if node.kind() == self.kind
                && node.start_byte() == self.start
                && node.end_byte() == self.end
            {
                return Some(node);
            }
            node = node
                .parent()
                .filter(|parent| parent.start_byte() == self.start && parent.end_byte() == self.end)?;
        }
    }
}

impl PartialEq for Capture {
    fn eq(&self, other: &Self) -> bool {
        self.span() == other.span()
    }
}

impl Eq for Capture {}

impl Hash for Capture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.span().hash(state);
    }
}

impl PartialOrd for Capture {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Capture {
    fn cmp(&self, other: &Self) -> Ordering {
        self.span().cmp(&other.span())
    }
}

/// Symbol name to namespace qualifier, e.g. `"string" -> "std"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceMap(BTreeMap<String, String>);

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.0.get(symbol).map(String::as_str)
    }

    /// Insert a mapping, replacing any earlier namespace for the same symbol.
    pub fn insert(&mut self, symbol: impl Into<String>, namespace: impl Into<String>) {
        self.0.insert(symbol.into(), namespace.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NamespaceMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for NamespaceMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

/// What the rewriter does with a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "namespace", rename_all = "snake_case")]
pub enum EditKind {
    /// Drop the span and any line terminators right after it.
    Delete,
    /// Prefix the span with `namespace::`.
    Qualify(String),
    /// Copy the span unchanged.
    PassThrough,
}

/// A planned change to one byte span of the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub kind: EditKind,
}

impl Edit {
    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind: EditKind::Delete,
        }
    }

    pub fn qualify(start: usize, end: usize, namespace: impl Into<String>) -> Self {
        Self {
            start,
            end,
            kind: EditKind::Qualify(namespace.into()),
        }
    }

    pub fn pass_through(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind: EditKind::PassThrough,
        }
    }
}
