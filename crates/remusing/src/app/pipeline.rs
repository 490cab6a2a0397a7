//! The staged rewrite pipeline: parse, query, resolve, plan, fix.

use once_cell::unsync::OnceCell;
use tree_sitter::{Parser, Tree};

use crate::app::capture::{CaptureCollector, CaptureSet};
use crate::app::plan::{Plan, plan_edits};
use crate::app::resolve::Resolution;
use crate::app::rewrite::apply_edits;
use crate::domain::errors::RewriteError;
use crate::domain::model::NamespaceMap;
use crate::domain::symbols::default_namespace_map;
use crate::infra::grammar::Grammar;

/// How far a [`UsingRemover`] has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    NotStarted,
    Parsed,
    Queried,
    CapturesProcessed,
    Fixed,
}

/// Removes `using` declarations from one C++ source and qualifies what they imported.
///
/// Every stage runs the stages before it on demand and caches its result, so calling
/// [`UsingRemover::fix`] directly or stepping through each stage gives the same output, and
/// calling a stage twice does no extra work.
pub struct UsingRemover<'g> {
    source: Vec<u8>,
    grammar: &'g Grammar,
    fallback: NamespaceMap,
    tree: OnceCell<Tree>,
    captures: OnceCell<CaptureSet>,
    resolution: OnceCell<Resolution>,
    plan: OnceCell<Plan>,
    output: OnceCell<Vec<u8>>,
}

impl<'g> UsingRemover<'g> {
    /// Prepare a rewrite of `source` using the built-in fallback table.
    pub fn new(source: impl Into<Vec<u8>>, grammar: &'g Grammar) -> Self {
        Self {
            source: source.into(),
            grammar,
            fallback: default_namespace_map(),
            tree: OnceCell::new(),
            captures: OnceCell::new(),
            resolution: OnceCell::new(),
            plan: OnceCell::new(),
            output: OnceCell::new(),
        }
    }

    /// Use `fallback` instead of the built-in table for names no declaration covers.
    pub fn with_fallback(mut self, fallback: NamespaceMap) -> Self {
        self.set_fallback(fallback);
        self
    }

    /// Replace the fallback table, dropping any cached plan or output built from the old one.
    pub fn set_fallback(&mut self, fallback: NamespaceMap) {
        self.fallback = fallback;
        self.plan.take();
        self.output.take();
    }

    pub fn stage(&self) -> Stage {
        if self.output.get().is_some() {
            Stage::Fixed
        } else if self.resolution.get().is_some() {
            Stage::CapturesProcessed
        } else if self.captures.get().is_some() {
            Stage::Queried
        } else if self.tree.get().is_some() {
            Stage::Parsed
        } else {
            Stage::NotStarted
        }
    }

    /// Parse the source into a syntax tree.
    pub fn parse(&self) -> Result<&Tree, RewriteError> {
        self.tree.get_or_try_init(|| {
            let mut parser = Parser::new();
            parser.set_language(self.grammar.language())?;
            let tree = parser
                .parse(&self.source, None)
                .ok_or(RewriteError::ParseFailure)?;
            tracing::debug!(
                bytes = self.source.len(),
                has_error = tree.root_node().has_error(),
                "parsed source"
            );
            Ok(tree)
        })
    }

    /// Run the capture battery over the tree.
    pub fn query(&self) -> Result<&CaptureSet, RewriteError> {
        self.captures.get_or_try_init(|| {
            let tree = self.parse()?;
            let collector = CaptureCollector::new(self.grammar.language())?;
            Ok(collector.collect(tree.root_node(), &self.source))
        })
    }

    /// Work out which identifiers are bare and what the source's `using` declarations import.
    pub fn process_captures(&self) -> Result<&Resolution, RewriteError> {
        self.resolution.get_or_try_init(|| {
            let captures = self.query()?;
            let tree = self.parse()?;
            Ok(Resolution::from_captures(
                captures,
                tree.root_node(),
                &self.source,
            ))
        })
    }

    /// Plan the edits without applying them.
    pub fn plan(&self) -> Result<&Plan, RewriteError> {
        self.plan.get_or_try_init(|| {
            let resolution = self.process_captures()?;
            let captures = self.query()?;
            plan_edits(captures, resolution, &self.fallback)
        })
    }

    /// Produce the rewritten source.
    pub fn fix(&self) -> Result<&[u8], RewriteError> {
        self.output
            .get_or_try_init(|| {
                let plan = self.plan()?;
                tracing::debug!(
                    edits = plan.edits.len(),
                    changes = plan.changes(),
                    unresolved = plan.unresolved.len(),
                    "applying edits"
                );
                Ok(apply_edits(&self.source, &plan.edits))
            })
            .map(Vec::as_slice)
    }
}

/// Rewrite `source` in one call with the built-in fallback table.
pub fn remove_usings(source: &[u8], grammar: &Grammar) -> Result<Vec<u8>, RewriteError> {
    UsingRemover::new(source, grammar).fix().map(<[u8]>::to_vec)
}
