//! Word-level diffing between two versions of a text.
//!
//! Texts are split into word, whitespace and punctuation tokens (see
//! [`tokenize`]); an LCS edit script over those tokens is then grouped into
//! [`DiffSegment`]s. Tokenization is lossless, so the segments always satisfy:
//!
//! - `Unchanged` + `Removed` segments, in order, spell the previous text;
//! - `Unchanged` + `Added` segments, in order, spell the current text.
//!
//! # Example
//!
//! ```
//! use pagemagic_core::diff::{diff_words, SegmentKind};
//!
//! let segments = diff_words("The cat sat.", "The black cat sat on the mat.");
//! assert_eq!(segments[1].kind, SegmentKind::Added);
//! assert_eq!(segments[1].value, "black ");
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Largest LCS table (in cells) built before falling back to a whole-block replacement.
pub const DEFAULT_CELL_BUDGET: usize = 4_000_000;

/// Classification of a diff segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SegmentKind {
    /// Present in both versions
    Unchanged,
    /// Only present in the current version
    Added,
    /// Only present in the previous version
    Removed,
}

/// A contiguous span of text classified by the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DiffSegment {
    /// How this span changed
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// The text of the span, whitespace included
    pub value: String,
}

impl DiffSegment {
    /// An unchanged span.
    pub fn unchanged(value: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Unchanged,
            value: value.into(),
        }
    }

    /// An added span.
    pub fn added(value: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Added,
            value: value.into(),
        }
    }

    /// A removed span.
    pub fn removed(value: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Removed,
            value: value.into(),
        }
    }
}

/// Word diff engine with a bounded LCS table.
#[derive(Debug, Clone, Copy)]
pub struct WordDiff {
    cell_budget: usize,
}

impl Default for WordDiff {
    fn default() -> Self {
        Self {
            cell_budget: DEFAULT_CELL_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy)]
struct TokenOp<'a> {
    op: Op,
    token: &'a str,
}

impl<'a> TokenOp<'a> {
    fn new(op: Op, token: &'a str) -> Self {
        Self { op, token }
    }
}

impl WordDiff {
    /// Create a diff engine with the default cell budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the LCS table size; larger change blocks degrade to remove-all/add-all.
    pub fn with_cell_budget(mut self, cell_budget: usize) -> Self {
        self.cell_budget = cell_budget;
        self
    }

    /// Compute the ordered segments turning `previous` into `current`.
    pub fn diff(&self, previous: &str, current: &str) -> Vec<DiffSegment> {
        if previous == current {
            if previous.is_empty() {
                return Vec::new();
            }
            return vec![DiffSegment::unchanged(previous)];
        }
        if previous.is_empty() {
            return vec![DiffSegment::added(current)];
        }
        if current.is_empty() {
            return vec![DiffSegment::removed(previous)];
        }

        let old = tokenize(previous);
        let new = tokenize(current);

        let mut ops = self.token_ops(&old, &new);
        slide_removals_left(&mut ops);
        slide_insertions_right(&mut ops);
        collect_segments(&ops)
    }

    fn token_ops<'a>(&self, old: &[&'a str], new: &[&'a str]) -> Vec<TokenOp<'a>> {
        let prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();

        // Zipping the remainders keeps the suffix from overlapping the prefix.
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        let mut ops = Vec::with_capacity(old.len().max(new.len()));
        ops.extend(old[..prefix].iter().map(|t| TokenOp::new(Op::Equal, *t)));
        self.middle_ops(
            &old[prefix..old.len() - suffix],
            &new[prefix..new.len() - suffix],
            &mut ops,
        );
        ops.extend(
            old[old.len() - suffix..]
                .iter()
                .map(|t| TokenOp::new(Op::Equal, *t)),
        );
        ops
    }

    fn middle_ops<'a>(&self, a: &[&'a str], b: &[&'a str], out: &mut Vec<TokenOp<'a>>) {
        let n = a.len();
        let m = b.len();

        if n == 0 || m == 0 {
            out.extend(a.iter().map(|t| TokenOp::new(Op::Delete, *t)));
            out.extend(b.iter().map(|t| TokenOp::new(Op::Insert, *t)));
            return;
        }

        let cells = (n + 1).saturating_mul(m + 1);
        if cells > self.cell_budget {
            log::debug!(
                "Word diff block of {}x{} tokens exceeds budget of {} cells, replacing wholesale",
                n,
                m,
                self.cell_budget
            );
            out.extend(a.iter().map(|t| TokenOp::new(Op::Delete, *t)));
            out.extend(b.iter().map(|t| TokenOp::new(Op::Insert, *t)));
            return;
        }

        // lcs[i * width + j] = LCS length of a[i..] and b[j..]
        let width = m + 1;
        let mut lcs = vec![0u32; cells];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                lcs[i * width + j] = if a[i] == b[j] {
                    lcs[(i + 1) * width + j + 1] + 1
                } else {
                    lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
                };
            }
        }

        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            if a[i] == b[j] {
                out.push(TokenOp::new(Op::Equal, a[i]));
                i += 1;
                j += 1;
            } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
                out.push(TokenOp::new(Op::Delete, a[i]));
                i += 1;
            } else {
                out.push(TokenOp::new(Op::Insert, b[j]));
                j += 1;
            }
        }
        out.extend(a[i..].iter().map(|t| TokenOp::new(Op::Delete, *t)));
        out.extend(b[j..].iter().map(|t| TokenOp::new(Op::Insert, *t)));
    }
}

/// Diff two texts word by word with the default engine.
pub fn diff_words(previous: &str, current: &str) -> Vec<DiffSegment> {
    WordDiff::new().diff(previous, current)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Space,
    Other,
}

fn classify(ch: char) -> CharClass {
    if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else if ch.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

/// Split text into word runs, whitespace runs and single punctuation characters.
///
/// Concatenating the tokens always yields the input.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<CharClass> = None;

    for (idx, ch) in text.char_indices() {
        let class = classify(ch);
        match current {
            Some(prev) if prev == class && class != CharClass::Other => continue,
            Some(_) => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            None => {}
        }
        current = Some(class);
    }

    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Find the maximal run of non-equal ops starting at `start`.
fn change_block(ops: &[TokenOp<'_>], start: usize) -> usize {
    let mut end = start;
    while end < ops.len() && ops[end].op != Op::Equal {
        end += 1;
    }
    end
}

fn is_pure(ops: &[TokenOp<'_>], op: Op) -> bool {
    ops.iter().all(|t| t.op == op)
}

/// Move pure deletion blocks as far left as equal neighbours allow.
///
/// `Hello [world ]today` becomes `Hello[ world] today`.
fn slide_removals_left(ops: &mut [TokenOp<'_>]) {
    let mut i = 0;
    while i < ops.len() {
        if ops[i].op == Op::Equal {
            i += 1;
            continue;
        }
        let (mut start, mut end) = (i, change_block(ops, i));
        if is_pure(&ops[start..end], Op::Delete) {
            while start > 0
                && ops[start - 1].op == Op::Equal
                && ops[start - 1].token == ops[end - 1].token
            {
                ops[start - 1].op = Op::Delete;
                ops[end - 1].op = Op::Equal;
                start -= 1;
                end -= 1;
            }
        }
        i = end.max(i + 1);
    }
}

/// Move pure insertion blocks as far right as equal neighbours allow.
fn slide_insertions_right(ops: &mut [TokenOp<'_>]) {
    let mut i = 0;
    while i < ops.len() {
        if ops[i].op == Op::Equal {
            i += 1;
            continue;
        }
        let (mut start, mut end) = (i, change_block(ops, i));
        if is_pure(&ops[start..end], Op::Insert) {
            while end < ops.len()
                && ops[end].op == Op::Equal
                && ops[end].token == ops[start].token
            {
                ops[start].op = Op::Equal;
                ops[end].op = Op::Insert;
                start += 1;
                end += 1;
            }
        }
        i = end;
    }
}

fn collect_segments(ops: &[TokenOp<'_>]) -> Vec<DiffSegment> {
    let mut segments = Vec::new();
    let mut i = 0;

    while i < ops.len() {
        if ops[i].op == Op::Equal {
            let mut value = String::new();
            while i < ops.len() && ops[i].op == Op::Equal {
                value.push_str(ops[i].token);
                i += 1;
            }
            segments.push(DiffSegment::unchanged(value));
            continue;
        }

        let end = change_block(ops, i);
        let mut removed = String::new();
        let mut added = String::new();
        for token_op in &ops[i..end] {
            match token_op.op {
                Op::Delete => removed.push_str(token_op.token),
                Op::Insert => added.push_str(token_op.token),
                Op::Equal => unreachable!("change blocks never contain equal ops"),
            }
        }
        if !removed.is_empty() {
            segments.push(DiffSegment::removed(removed));
        }
        if !added.is_empty() {
            segments.push(DiffSegment::added(added));
        }
        i = end;
    }

    segments
}

/// Rebuild the previous text from a segment list.
pub fn reconstruct_previous(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Added)
        .map(|s| s.value.as_str())
        .collect()
}

/// Rebuild the current text from a segment list.
pub fn reconstruct_current(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != SegmentKind::Removed)
        .map(|s| s.value.as_str())
        .collect()
}

/// Whether any segment is added or removed.
pub fn has_changes(segments: &[DiffSegment]) -> bool {
    segments.iter().any(|s| s.kind != SegmentKind::Unchanged)
}

/// Word counts per segment kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Words only in the current version
    pub added_words: usize,
    /// Words only in the previous version
    pub removed_words: usize,
    /// Words present in both
    pub unchanged_words: usize,
}

impl DiffStats {
    /// Count words in each kind of segment.
    pub fn from_segments(segments: &[DiffSegment]) -> Self {
        let mut stats = Self::default();
        for segment in segments {
            let words = tokenize(&segment.value)
                .into_iter()
                .filter(|t| t.chars().next().map(classify) == Some(CharClass::Word))
                .count();
            match segment.kind {
                SegmentKind::Added => stats.added_words += words,
                SegmentKind::Removed => stats.removed_words += words,
                SegmentKind::Unchanged => stats.unchanged_words += words,
            }
        }
        stats
    }
}
