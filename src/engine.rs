//! The per-file rewrite step: read, apply rules, write back if changed.

use crate::diff::DiffSummary;
use crate::error::{RewriteError, Result};
use crate::rules::{Application, RuleSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One file's content before and after the rule set ran.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub original: String,
    pub rewritten: String,
    /// Occurrence count for each rule, in rule order.
    pub occurrences: Vec<usize>,
}

impl FileRecord {
    /// Returns true if the content was modified.
    pub fn is_changed(&self) -> bool {
        self.original != self.rewritten
    }

    /// Writes the rewritten content back to disk when it differs.
    pub fn write(&self) -> Result<()> {
        if self.is_changed() {
            fs::write(&self.path, &self.rewritten).map_err(|source| RewriteError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// What happened to a single candidate file.
#[derive(Debug)]
pub enum Outcome {
    /// The rules produced identical text; nothing was written.
    Unchanged,
    /// The file was rewritten.
    Changed(Change),
    /// Reading, decoding or writing failed. The file on disk is untouched.
    Errored(RewriteError),
}

/// Details of a rewritten file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub occurrences: Vec<usize>,
    pub lines: DiffSummary,
}

impl Change {
    /// Total occurrences replaced across all rules.
    pub fn total(&self) -> usize {
        self.occurrences.iter().sum()
    }
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Outcome::Errored(_))
    }
}

/// Applies one rule set to files.
#[derive(Debug, Clone)]
pub struct RewriteEngine {
    rules: RuleSet,
}

impl RewriteEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Runs the rule set over `text` without touching the filesystem.
    pub fn rewrite_text(&self, text: &str) -> Application {
        self.rules.apply(text)
    }

    /// Reads a file and computes its rewritten content.
    pub fn load(&self, path: &Path) -> Result<FileRecord> {
        let bytes = fs::read(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let original = String::from_utf8(bytes).map_err(|_| RewriteError::Decode {
            path: path.to_path_buf(),
        })?;
        let applied = self.rewrite_text(&original);

        Ok(FileRecord {
            path: path.to_path_buf(),
            original,
            rewritten: applied.text,
            occurrences: applied.occurrences,
        })
    }

    /// Rewrites one file in place if the rules change it.
    pub fn process(&self, path: &Path) -> Outcome {
        match self.load(path) {
            Ok(record) => self.commit(record),
            Err(e) => Outcome::Errored(e),
        }
    }

    /// Writes a loaded record back if its text changed.
    ///
    /// A failed write leaves the file as it was and is reported as
    /// [`Outcome::Errored`].
    pub fn commit(&self, record: FileRecord) -> Outcome {
        if !record.is_changed() {
            debug!(path = %record.path.display(), "unchanged");
            return Outcome::Unchanged;
        }

        if let Err(e) = record.write() {
            return Outcome::Errored(e);
        }

        Outcome::Changed(Change {
            lines: DiffSummary::from_diff(&record.original, &record.rewritten),
            occurrences: record.occurrences,
        })
    }
}
