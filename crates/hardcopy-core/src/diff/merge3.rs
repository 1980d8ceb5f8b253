//! Line-level three-way merge (spec.md §4.4 "Line-level body merge"),
//! built on `similar::TextDiff`'s base→local and base→remote edit scripts.
//!
//! Each side's diff against `base` is split into two parts: `Seg`s, which
//! tile `base`'s line range exactly (an unchanged span or a replacement for
//! a non-empty base range), and point insertions (zero-width splices
//! between two base lines). [`merge_lines`] walks both sides' segments
//! together: where neither side touches a span it passes through; where
//! exactly one side changed a span, that side's text wins; where both
//! changed to the same text it's convergent; otherwise the span becomes a
//! conflict hunk using spec.md's marker grammar. A span that one side
//! edited at a different granularity than the other is widened to the
//! smallest window that fully contains every overlapping edit from either
//! side, so no replacement is ever split mid-edit.

use std::collections::HashMap;

use similar::{DiffOp, TextDiff};

/// The seam for an external semantic merge collaborator (spec.md §4.4,
/// "optionally invoke a semantic oracle"). No implementation ships in the
/// core; callers that have one wire it in at the push pipeline layer.
pub trait SemanticMergeOracle {
    /// Attempt a semantic resolution of a conflicted merge. Return `Some`
    /// text only if it contains no residual conflict markers; `None`
    /// leaves the field diverged.
    fn resolve(&self, base: &str, local: &str, remote: &str) -> Option<String>;
}

/// The result of a three-way line merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Merge3Result {
    /// The merged text: fully resolved if `conflicted` is `false`,
    /// otherwise interspersed with conflict marker hunks.
    pub text: String,
    /// Whether any hunk required a conflict marker.
    pub conflicted: bool,
}

const LOCAL_MARKER: &str = "<<<<<<< LOCAL";
const BASE_MARKER: &str = "||||||| BASE";
const SEP_MARKER: &str = "=======";
const REMOTE_MARKER: &str = ">>>>>>> REMOTE";

/// A `[start, end)` span of base line indices: `content: None` means this
/// side left the span unchanged, `Some` carries its full replacement.
struct Seg {
    start: usize,
    end: usize,
    content: Option<Vec<String>>,
}

/// Diff `base` against `other` and split the result into base-tiling
/// [`Seg`]s plus a map of zero-width insertion points.
fn diff_against_base(base: &str, other: &str) -> (Vec<Seg>, HashMap<usize, Vec<String>>) {
    let other_lines: Vec<&str> = other.lines().collect();
    let diff = TextDiff::from_lines(base, other);
    let mut segs = Vec::new();
    let mut inserts = HashMap::new();
    for op in diff.ops() {
        match op {
            DiffOp::Equal { old_index, len, .. } if *len > 0 => {
                segs.push(Seg { start: *old_index, end: old_index + len, content: None });
            }
            DiffOp::Delete { old_index, old_len, .. } if *old_len > 0 => {
                segs.push(Seg { start: *old_index, end: old_index + old_len, content: Some(Vec::new()) });
            }
            DiffOp::Replace { old_index, old_len, new_index, new_len } if *old_len > 0 => {
                let lines = other_lines[*new_index..new_index + new_len].iter().map(|s| (*s).to_owned()).collect();
                segs.push(Seg { start: *old_index, end: old_index + old_len, content: Some(lines) });
            }
            DiffOp::Insert { old_index, new_index, new_len } => {
                let lines = other_lines[*new_index..new_index + new_len].iter().map(|s| (*s).to_owned()).collect();
                inserts.insert(*old_index, lines);
            }
            // Zero-length Equal/Delete/Replace carry no information.
            _ => {}
        }
    }
    (segs, inserts)
}

fn seg_at(segs: &[Seg], pos: usize) -> Option<&Seg> {
    segs.iter().find(|s| s.start <= pos && pos < s.end)
}

fn any_changed(segs: &[Seg], lo: usize, hi: usize) -> bool {
    segs.iter().any(|s| s.start < hi && s.end > lo && s.content.is_some())
}

fn widest_changed_end(segs: &[Seg], lo: usize, hi: usize) -> usize {
    segs.iter()
        .filter(|s| s.start < hi && s.end > lo && s.content.is_some())
        .map(|s| s.end)
        .max()
        .unwrap_or(hi)
}

fn collect_range(segs: &[Seg], lo: usize, hi: usize, base_lines: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for seg in segs {
        if seg.end <= lo || seg.start >= hi {
            continue;
        }
        match &seg.content {
            None => {
                let s = seg.start.max(lo);
                let e = seg.end.min(hi);
                out.extend(base_lines[s..e].iter().map(|x| (*x).to_string()));
            }
            Some(lines) => out.extend(lines.iter().cloned()),
        }
    }
    out
}

/// Three-way merge `local` and `remote` against their common `base`.
#[must_use]
pub fn merge_lines(base: &str, local: &str, remote: &str) -> Merge3Result {
    let base_lines: Vec<&str> = base.lines().collect();
    let n = base_lines.len();
    let (local_segs, local_ins) = diff_against_base(base, local);
    let (remote_segs, remote_ins) = diff_against_base(base, remote);

    let mut out: Vec<String> = Vec::new();
    let mut conflicted = false;
    let mut pos = 0usize;

    loop {
        match (local_ins.get(&pos), remote_ins.get(&pos)) {
            (None, None) => {}
            (Some(l), None) => out.extend(l.iter().cloned()),
            (None, Some(r)) => out.extend(r.iter().cloned()),
            (Some(l), Some(r)) if l == r => out.extend(l.iter().cloned()),
            (Some(l), Some(r)) => {
                conflicted = true;
                out.push(LOCAL_MARKER.to_owned());
                out.extend(l.iter().cloned());
                out.push(SEP_MARKER.to_owned());
                out.extend(r.iter().cloned());
                out.push(REMOTE_MARKER.to_owned());
            }
        }
        if pos >= n {
            break;
        }

        let lseg = seg_at(&local_segs, pos);
        let rseg = seg_at(&remote_segs, pos);
        let (Some(lseg), Some(rseg)) = (lseg, rseg) else {
            // Shouldn't happen: segs tile [0, n) fully. Bail out safely.
            out.extend(base_lines[pos..].iter().map(|s| (*s).to_string()));
            break;
        };

        if lseg.content.is_none() && rseg.content.is_none() {
            let end = lseg.end.min(rseg.end);
            out.extend(base_lines[pos..end].iter().map(|s| (*s).to_string()));
            pos = end;
            continue;
        }

        let mut end = lseg.end.max(rseg.end);
        loop {
            let new_end =
                widest_changed_end(&local_segs, pos, end).max(widest_changed_end(&remote_segs, pos, end));
            if new_end <= end {
                break;
            }
            end = new_end;
        }

        let local_text = collect_range(&local_segs, pos, end, &base_lines);
        let remote_text = collect_range(&remote_segs, pos, end, &base_lines);
        let local_changed = any_changed(&local_segs, pos, end);
        let remote_changed = any_changed(&remote_segs, pos, end);

        if local_text == remote_text {
            out.extend(local_text);
        } else if !remote_changed {
            out.extend(local_text);
        } else if !local_changed {
            out.extend(remote_text);
        } else {
            conflicted = true;
            out.push(LOCAL_MARKER.to_owned());
            out.extend(local_text);
            out.push(BASE_MARKER.to_owned());
            out.extend(base_lines[pos..end].iter().map(|s| (*s).to_string()));
            out.push(SEP_MARKER.to_owned());
            out.extend(remote_text);
            out.push(REMOTE_MARKER.to_owned());
        }
        pos = end;
    }

    let mut text = out.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Merge3Result { text, conflicted }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sides_merge_cleanly() {
        let result = merge_lines("a\nb\nc\n", "a\nb\nc\n", "a\nb\nc\n");
        assert!(!result.conflicted);
        assert_eq!(result.text, "a\nb\nc\n");
    }

    #[test]
    fn non_overlapping_edits_merge_cleanly() {
        let base = "one\ntwo\nthree\n";
        let local = "ONE\ntwo\nthree\n";
        let remote = "one\ntwo\nTHREE\n";
        let result = merge_lines(base, local, remote);
        assert!(!result.conflicted);
        assert_eq!(result.text, "ONE\ntwo\nTHREE\n");
    }

    #[test]
    fn same_edit_on_both_sides_merges_cleanly() {
        let base = "one\ntwo\nthree\n";
        let local = "one\nTWO\nthree\n";
        let remote = "one\nTWO\nthree\n";
        let result = merge_lines(base, local, remote);
        assert!(!result.conflicted);
        assert_eq!(result.text, "one\nTWO\nthree\n");
    }

    #[test]
    fn overlapping_edits_produce_conflict_markers() {
        let base = "one\ntwo\nthree\n";
        let local = "one\nLOCAL\nthree\n";
        let remote = "one\nREMOTE\nthree\n";
        let result = merge_lines(base, local, remote);
        assert!(result.conflicted);
        assert!(result.text.contains(LOCAL_MARKER));
        assert!(result.text.contains(BASE_MARKER));
        assert!(result.text.contains(SEP_MARKER));
        assert!(result.text.contains(REMOTE_MARKER));
        assert!(result.text.contains("LOCAL"));
        assert!(result.text.contains("REMOTE"));
    }

    #[test]
    fn pure_insertion_on_one_side_merges_cleanly() {
        let base = "one\ntwo\n";
        let local = "one\ninserted\ntwo\n";
        let remote = "one\ntwo\n";
        let result = merge_lines(base, local, remote);
        assert!(!result.conflicted);
        assert_eq!(result.text, "one\ninserted\ntwo\n");
    }

    #[test]
    fn empty_base_with_matching_additions_is_clean() {
        let result = merge_lines("", "hello\n", "hello\n");
        assert!(!result.conflicted);
        assert_eq!(result.text, "hello\n");
    }
}
