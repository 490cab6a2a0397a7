//! Applies a plan to the original bytes in one forward pass.

use crate::domain::model::{Edit, EditKind};

/// Rebuild `source` with `edits` applied.
///
/// `edits` must be sorted and disjoint (see [`crate::app::plan::plan_edits`]). Bytes outside
/// deleted spans, and outside the line terminators a deletion swallows, are copied unchanged.
pub fn apply_edits(source: &[u8], edits: &[Edit]) -> Vec<u8> {
    let mut output = Vec::with_capacity(source.len() + edits.len() * 8);
    let mut cursor = 0;

    for edit in edits {
        if edit.start > cursor {
            output.extend_from_slice(&source[cursor..edit.start]);
        }
        let original = &source[edit.start..edit.end];

        match &edit.kind {
            EditKind::Delete => {
                cursor = skip_line_breaks(source, edit.end);
            }
            EditKind::Qualify(namespace) => {
                output.extend_from_slice(namespace.as_bytes());
                output.extend_from_slice(b"::");
                output.extend_from_slice(original);
                cursor = edit.end;
            }
            EditKind::PassThrough => {
                output.extend_from_slice(original);
                cursor = edit.end;
            }
        }
    }

    if cursor < source.len() {
        output.extend_from_slice(&source[cursor..]);
    }
    output
}

fn skip_line_breaks(source: &[u8], from: usize) -> usize {
    let tail = source.get(from..).unwrap_or_default();
    from + tail
        .iter()
        .take_while(|byte| matches!(byte, b'\n' | b'\r'))
        .count()
}
