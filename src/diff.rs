//! Line-level change summaries for rewritten files.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// How many lines a rewrite touched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} line(s) rewritten (+{} -{})",
            self.files_changed,
            self.insertions.max(self.deletions),
            self.insertions,
            self.deletions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_edit() {
        let summary = DiffSummary::from_diff("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(summary.files_changed, 1);
        assert_eq!(summary.insertions, 1);
        assert_eq!(summary.deletions, 1);
    }

    #[test]
    fn test_identical_text() {
        let summary = DiffSummary::from_diff("same\n", "same\n");
        assert_eq!(summary, DiffSummary::default());
    }

    #[test]
    fn test_merge_and_display() {
        let mut total = DiffSummary::from_diff("x\n", "y\n");
        total.merge(&DiffSummary::from_diff("1\n2\n", "1\n3\n"));
        assert_eq!(total.files_changed, 2);
        assert_eq!(
            total.to_string(),
            "2 file(s) changed, 2 line(s) rewritten (+2 -2)"
        );
    }
}
