//! Edit planning: turns a resolution into an ordered, non-overlapping list of edits.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::app::capture::CaptureSet;
use crate::app::resolve::Resolution;
use crate::domain::errors::RewriteError;
use crate::domain::model::{Capture, CaptureTag, Edit, EditKind, NamespaceMap};

const IDENTIFIER_KINDS: &[&str] = &["type_identifier", "identifier"];
const USING_KIND: &str = "using_declaration";

/// Ordered edits plus the bare occurrences nothing could qualify.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub edits: Vec<Edit>,
    pub unresolved: Vec<Capture>,
}

impl Plan {
    /// Number of edits that change the output.
    pub fn changes(&self) -> usize {
        self.edits
            .iter()
            .filter(|edit| !matches!(edit.kind, EditKind::PassThrough))
            .count()
    }
}

/// Plan every qualification and deletion for one source.
///
/// Edits come back sorted by `(start, end)` with duplicate spans collapsed; the first capture
/// path to claim a span keeps it. Node kinds the rewriter does not understand and overlapping
/// spans are reported as errors instead of being rewritten.
pub fn plan_edits(
    captures: &CaptureSet,
    resolution: &Resolution,
    fallback: &NamespaceMap,
) -> Result<Plan, RewriteError> {
    let mut edits: BTreeMap<(usize, usize), Edit> = BTreeMap::new();
    let mut unresolved = Vec::new();

    for capture in &resolution.unqualified {
        expect_kind(capture, IDENTIFIER_KINDS)?;
        let edit = match resolution.namespace_for(&capture.text, fallback) {
            Some(namespace) => Edit::qualify(capture.start, capture.end, namespace),
            None => {
                tracing::debug!(
                    symbol = %capture.text,
                    start = capture.start,
                    "no namespace for unqualified symbol"
                );
                unresolved.push(capture.clone());
                Edit::pass_through(capture.start, capture.end)
            }
        };
        edits.entry(capture.span()).or_insert(edit);
    }

    for capture in captures
        .get(CaptureTag::UsingDecl)
        .chain(captures.get(CaptureTag::UsingNsDecl))
    {
        expect_kind(capture, &[USING_KIND])?;
        edits
            .entry(capture.span())
            .or_insert_with(|| Edit::delete(capture.start, capture.end));
    }

    let edits: Vec<Edit> = edits.into_values().collect();
    check_disjoint(&edits)?;

    Ok(Plan { edits, unresolved })
}

fn expect_kind(capture: &Capture, kinds: &[&str]) -> Result<(), RewriteError> {
    if kinds.contains(&capture.kind) {
        Ok(())
    } else {
        Err(RewriteError::UnexpectedNode {
            kind: capture.kind,
            tag: capture.tag,
            start: capture.start,
        })
    }
}

/// Edits must be sorted; any pair where one ends after the next starts is an overlap.
pub fn check_disjoint(edits: &[Edit]) -> Result<(), RewriteError> {
    match edits.windows(2).find(|pair| pair[0].end > pair[1].start) {
        Some(pair) => Err(RewriteError::OverlappingEdits {
            first: (pair[0].start, pair[0].end),
            second: (pair[1].start, pair[1].end),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(start: usize, text: &str, kind: &'static str, tag: CaptureTag) -> Capture {
        Capture {
            start,
            end: start + text.len(),
            kind,
            text: text.into(),
            tag,
        }
    }

    fn ident(start: usize, text: &str) -> Capture {
        capture(start, text, "type_identifier", CaptureTag::Type)
    }

    fn using(start: usize, text: &str) -> Capture {
        capture(start, text, "using_declaration", CaptureTag::UsingDecl)
    }

    fn fallback() -> NamespaceMap {
        [("string", "std")].into_iter().collect()
    }

    #[test]
    fn qualifies_resolved_and_passes_through_the_rest() -> Result<(), RewriteError> {
        let resolution = Resolution {
            unqualified: [ident(0, "string"), ident(10, "custom")].into_iter().collect(),
            declared: NamespaceMap::new(),
        };
        let plan = plan_edits(&CaptureSet::new(), &resolution, &fallback())?;

        assert_eq!(
            plan.edits,
            vec![Edit::qualify(0, 6, "std"), Edit::pass_through(10, 16)]
        );
        assert_eq!(plan.unresolved.len(), 1);
        assert_eq!(plan.unresolved[0].text, "custom");
        assert_eq!(plan.changes(), 1);
        Ok(())
    }

    #[test]
    fn merges_deletions_in_source_order() -> Result<(), RewriteError> {
        let captures: CaptureSet = [
            using(40, "using a::b;"),
            capture(0, "using namespace std;", "using_declaration", CaptureTag::UsingNsDecl),
        ]
        .into_iter()
        .collect();
        let resolution = Resolution {
            unqualified: [ident(25, "string"), ident(60, "b")].into_iter().collect(),
            declared: [("b", "a")].into_iter().collect(),
        };

        let plan = plan_edits(&captures, &resolution, &fallback())?;
        let starts: Vec<_> = plan.edits.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![0, 25, 40, 60]);
        assert_eq!(plan.edits[0].kind, EditKind::Delete);
        assert_eq!(plan.edits[3].kind, EditKind::Qualify("a".into()));
        Ok(())
    }

    #[test]
    fn many_scattered_spans_stay_ordered_and_disjoint() -> Result<(), RewriteError> {
        let mut unqualified = Vec::new();
        let mut deletions = Vec::new();
        // Interleave identifiers and declarations in a shuffled order.
        for i in (0..40).rev() {
            let base = i * 100 + (i % 7) * 3;
            if i % 3 == 0 {
                deletions.push(using(base, "using x::y;"));
            } else {
                unqualified.push(ident(base, "string"));
            }
        }
        let captures: CaptureSet = deletions.into_iter().collect();
        let resolution = Resolution {
            unqualified: unqualified.into_iter().collect(),
            declared: NamespaceMap::new(),
        };

        let plan = plan_edits(&captures, &resolution, &fallback())?;
        assert_eq!(plan.edits.len(), 40);
        assert!(
            plan.edits
                .windows(2)
                .all(|pair| pair[0].start < pair[1].start && pair[0].end <= pair[1].start)
        );
        Ok(())
    }

    #[test]
    fn duplicate_span_collapses_to_one_edit() -> Result<(), RewriteError> {
        let called = capture(3, "min", "identifier", CaptureTag::Func);
        let streamed = capture(3, "min", "identifier", CaptureTag::Symbol);
        let mut unqualified = std::collections::BTreeSet::new();
        unqualified.insert(called);
        unqualified.insert(streamed);

        let resolution = Resolution {
            unqualified,
            declared: [("min", "std")].into_iter().collect(),
        };
        let plan = plan_edits(&CaptureSet::new(), &resolution, &NamespaceMap::new())?;
        assert_eq!(plan.edits, vec![Edit::qualify(3, 6, "std")]);
        Ok(())
    }

    #[test]
    fn unexpected_node_kind_is_an_error() {
        let resolution = Resolution {
            unqualified: [capture(0, "x + y", "binary_expression", CaptureTag::Symbol)]
                .into_iter()
                .collect(),
            declared: NamespaceMap::new(),
        };
        let err = plan_edits(&CaptureSet::new(), &resolution, &fallback()).unwrap_err();
        assert!(matches!(
            err,
            RewriteError::UnexpectedNode {
                kind: "binary_expression",
                ..
            }
        ));
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let edits = vec![Edit::delete(0, 20), Edit::qualify(10, 16, "std")];
        let err = check_disjoint(&edits).unwrap_err();
        assert!(matches!(
            err,
            RewriteError::OverlappingEdits {
                first: (0, 20),
                second: (10, 16)
            }
        ));
    }
}
