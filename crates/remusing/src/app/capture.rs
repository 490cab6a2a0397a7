//! Capture collection: runs the query battery over a parsed tree.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::app::queries;
use crate::domain::errors::RewriteError;
use crate::domain::model::{Capture, CaptureTag};

/// Captures grouped by tag, each group deduplicated and ordered by span.
#[derive(Debug, Clone, Default)]
pub struct CaptureSet {
    groups: BTreeMap<CaptureTag, BTreeSet<Capture>>,
}

impl CaptureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capture. Returns `false` when the tag already holds a capture with the same span.
    pub fn insert(&mut self, capture: Capture) -> bool {
        self.groups.entry(capture.tag).or_default().insert(capture)
    }

    /// Captures recorded under `tag`, in span order.
    pub fn get(&self, tag: CaptureTag) -> impl Iterator<Item = &Capture> + '_ {
        self.groups.get(&tag).into_iter().flatten()
    }

    pub fn count(&self, tag: CaptureTag) -> usize {
        self.groups.get(&tag).map_or(0, BTreeSet::len)
    }
}

impl FromIterator<Capture> for CaptureSet {
    fn from_iter<I: IntoIterator<Item = Capture>>(iter: I) -> Self {
        let mut set = Self::new();
        for capture in iter {
            set.insert(capture);
        }
        set
    }
}

/// Compiled capture battery for one grammar.
pub struct CaptureCollector {
    query: Query,
    tags: Vec<Option<CaptureTag>>,
}

impl CaptureCollector {
    /// Compile the battery against `language`. Fails if the grammar rejects any pattern.
    pub fn new(language: &Language) -> Result<Self, RewriteError> {
        let query = Query::new(language, &queries::build_all())?;
        let tags = query
            .capture_names()
            .iter()
            .map(|name| CaptureTag::from_name(name))
            .collect();
        Ok(Self { query, tags })
    }

    /// Run every pattern over `root` and group the results.
    pub fn collect(&self, root: Node<'_>, source: &[u8]) -> CaptureSet {
        let mut cursor = QueryCursor::new();
        let mut set = CaptureSet::new();

        for (matched, index) in cursor.captures(&self.query, root, source) {
            let capture = matched.captures[index];
            let Some(tag) = self.tags.get(capture.index as usize).copied().flatten() else {
                continue;
            };
            if !imports_single_name(capture.node, tag) {
                continue;
            }
            set.insert(Capture::from_node(capture.node, source, tag));
        }

        tracing::debug!(
            types = set.count(CaptureTag::Type),
            funcs = set.count(CaptureTag::Func),
            symbols = set.count(CaptureTag::Symbol),
            using_decls = set.count(CaptureTag::UsingDecl),
            using_ns_decls = set.count(CaptureTag::UsingNsDecl),
            "collected captures"
        );
        set
    }
}

/// False for the `using_decl` shape when it matched a namespace directive or `using enum`.
fn imports_single_name(node: Node<'_>, tag: CaptureTag) -> bool {
    let declaration = match tag {
        CaptureTag::UsingDecl => Some(node),
        CaptureTag::UsingQualType => node.parent(),
        _ => return true,
    };
    let Some(declaration) = declaration else {
        return true;
    };
    let mut cursor = declaration.walk();
    let has_keyword = declaration
        .children(&mut cursor)
        .any(|child| matches!(child.kind(), "namespace" | "enum"));
    !has_keyword
}
