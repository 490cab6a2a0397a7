//! Domain-specific errors.

use thiserror::Error;

use crate::domain::model::CaptureTag;

/// Problems with how the tool was invoked, reported before any rewrite starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("cannot combine --in-place with an output file")]
    InPlaceWithOutput,
    #[error("no input file given and standard input is a terminal")]
    MissingInput,
}

/// Failures that abort rewriting the current input. No output is produced.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("grammar is incompatible with the tree-sitter runtime: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("parser could not produce a syntax tree")]
    ParseFailure,
    #[error("capture query failed to compile: {0}")]
    QueryCompile(#[from] tree_sitter::QueryError),
    #[error("unexpected `{kind}` node captured as `{tag}` at byte {start}")]
    UnexpectedNode {
        kind: &'static str,
        tag: CaptureTag,
        start: usize,
    },
    #[error("planned edits overlap: {first:?} and {second:?}")]
    OverlappingEdits {
        first: (usize, usize),
        second: (usize, usize),
    },
}
