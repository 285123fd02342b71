//! Aggregate results of one rewrite pass.

use crate::diff::DiffSummary;
use crate::engine::Outcome;
use crate::error::{RewriteError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A file the pass rewrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub path: PathBuf,
    pub occurrences: usize,
    /// Lines added and removed in this file.
    pub insertions: usize,
    pub deletions: usize,
}

/// A file, or walk entry, the pass could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Occurrences one rule replaced across the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTotal {
    pub rule: String,
    pub occurrences: usize,
}

/// Counters and errors accumulated over a pass. Owned by the driver and
/// returned to the caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub files_unchanged: usize,
    pub changed: Vec<ChangedFile>,
    pub errors: Vec<FileError>,
    pub rules: Vec<RuleTotal>,
    pub lines: DiffSummary,
}

impl RunReport {
    /// Creates an empty report with one total per rule description.
    pub fn new(rules: impl IntoIterator<Item = String>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| RuleTotal {
                    rule,
                    occurrences: 0,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Records the outcome of one candidate file.
    pub fn record(&mut self, path: &Path, outcome: &Outcome) {
        self.files_scanned += 1;
        match outcome {
            Outcome::Unchanged => self.files_unchanged += 1,
            Outcome::Changed(change) => {
                self.files_changed += 1;
                self.changed.push(ChangedFile {
                    path: path.to_path_buf(),
                    occurrences: change.total(),
                    insertions: change.lines.insertions,
                    deletions: change.lines.deletions,
                });
                for (total, count) in self.rules.iter_mut().zip(&change.occurrences) {
                    total.occurrences += count;
                }
                self.lines.merge(&change.lines);
            }
            Outcome::Errored(e) => self.errors.push(FileError {
                path: Some(path.to_path_buf()),
                message: e.to_string(),
            }),
        }
    }

    /// Records a failure that happened while enumerating candidates.
    pub fn record_error(&mut self, error: &RewriteError) {
        self.errors.push(FileError {
            path: None,
            message: error.to_string(),
        });
    }

    pub fn files_errored(&self) -> usize {
        self.errors.len()
    }

    /// Total occurrences replaced across all rules.
    pub fn total_occurrences(&self) -> usize {
        self.rules.iter().map(|r| r.occurrences).sum()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files scanned:   {}", self.files_scanned)?;
        writeln!(f, "Files changed:   {}", self.files_changed)?;
        writeln!(f, "Files unchanged: {}", self.files_unchanged)?;
        writeln!(f, "Files errored:   {}", self.files_errored())?;
        writeln!(f, "Replacements:    {}", self.total_occurrences())?;

        if !self.changed.is_empty() {
            writeln!(f, "\nChanged:")?;
            for file in &self.changed {
                writeln!(
                    f,
                    "  {} ({} replacement(s), +{} -{})",
                    file.path.display(),
                    file.occurrences,
                    file.insertions,
                    file.deletions
                )?;
            }
        }

        if self.rules.iter().any(|r| r.occurrences > 0) {
            writeln!(f, "\nPer rule:")?;
            for total in &self.rules {
                writeln!(f, "  {:>5}  {}", total.occurrences, total.rule)?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(f, "\nErrors:")?;
            for error in &self.errors {
                match &error.path {
                    Some(path) => writeln!(f, "  {}: {}", path.display(), error.message)?,
                    None => writeln!(f, "  {}", error.message)?,
                }
            }
        }

        write!(f, "\n{}", self.lines)
    }
}
