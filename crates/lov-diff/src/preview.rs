//! Line-level preview of a replay.
//!
//! Both documents are rendered as indented JSON and compared line by line
//! with the `similar` crate (Myers diff), producing hunks with context lines
//! suitable for a terminal.

use lov_types::to_pretty_json;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use crate::error::DiffResult;

/// Number of unchanged lines shown around each change.
const CONTEXT_LINES: usize = 3;

/// A line diff between a base document and its patched form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub hunks: Vec<PreviewHunk>,
    /// Total number of lines in the rendered base.
    pub old_lines: usize,
    /// Total number of lines in the rendered patched document.
    pub new_lines: usize,
}

impl Preview {
    /// Returns `true` if the patched document renders identically.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, PreviewLine::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, PreviewLine::Removed(_)))
            .count()
    }
}

/// A contiguous region of changed lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewHunk {
    /// First base line in this hunk (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// First patched line in this hunk (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<PreviewLine>,
}

/// A single line of a hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// Compare the rendered forms of `base` and `patched`.
pub fn preview(base: &Value, patched: &Value, indent: usize) -> DiffResult<Preview> {
    let old_text = to_pretty_json(base, indent)?;
    let new_text = to_pretty_json(patched, indent)?;

    let old_lines = old_text.lines().count();
    let new_lines = new_text.lines().count();
    if old_text == new_text {
        return Ok(Preview {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        });
    }

    let text_diff = TextDiff::from_lines(&old_text, &new_text);
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let lines = group
            .iter()
            .flat_map(|op| text_diff.iter_changes(op))
            .map(|change| {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => PreviewLine::Context(text),
                    ChangeTag::Delete => PreviewLine::Removed(text),
                    ChangeTag::Insert => PreviewLine::Added(text),
                }
            })
            .collect();

        hunks.push(PreviewHunk {
            old_start: old_range.start + 1,
            old_count: old_range.len(),
            new_start: new_range.start + 1,
            new_count: new_range.len(),
            lines,
        });
    }

    Ok(Preview {
        hunks,
        old_lines,
        new_lines,
    })
}
