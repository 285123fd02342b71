//! Rewrite driver: scans every scope and runs the engine over each candidate.

use crate::engine::{Outcome, RewriteEngine};
use crate::error::Result;
use crate::report::RunReport;
use crate::rules::RuleSet;
use crate::select::{FileSelector, SelectionPolicy};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One pass of a rule set over one or more scopes of a project.
#[derive(Debug, Clone)]
pub struct Rewrite {
    root: PathBuf,
    scopes: Vec<SelectionPolicy>,
    rules: RuleSet,
}

impl Rewrite {
    /// Creates a rewrite rooted at the given project directory.
    pub fn in_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            scopes: Vec::new(),
            rules: RuleSet::default(),
        }
    }

    /// Adds a scope. Its root is resolved against the project root.
    pub fn scope(mut self, policy: SelectionPolicy) -> Self {
        self.scopes.push(policy);
        self
    }

    /// Adds a scope built from a policy rooted at `dir`.
    pub fn select<F>(self, dir: impl Into<PathBuf>, f: F) -> Self
    where
        F: FnOnce(SelectionPolicy) -> SelectionPolicy,
    {
        self.scope(f(SelectionPolicy::new(dir)))
    }

    /// Sets the rules to apply.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Runs the pass and returns its report.
    ///
    /// Every scope is validated before the first file is read, so a missing
    /// root or a bad glob aborts the run with nothing written. Per-file
    /// failures are recorded in the report and the pass carries on.
    pub fn run(self) -> Result<RunReport> {
        let scopes = if self.scopes.is_empty() {
            vec![SelectionPolicy::new(".")]
        } else {
            self.scopes.clone()
        };
        let selectors = scopes
            .iter()
            .map(|scope| FileSelector::new(scope.rooted_at(&self.root)))
            .collect::<Result<Vec<_>>>()?;

        let engine = RewriteEngine::new(self.rules);
        let mut report = RunReport::new(engine.rules().describe());
        let mut seen = HashSet::new();

        for selector in &selectors {
            debug!(root = %selector.policy().root.display(), "scanning");

            for candidate in selector.candidates() {
                let path = match candidate {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable entry");
                        report.record_error(&e);
                        continue;
                    }
                };
                if !seen.insert(path.clone()) {
                    continue;
                }

                let outcome = engine.process(&path);
                let shown = path.strip_prefix(&self.root).unwrap_or(&path);
                match &outcome {
                    Outcome::Changed(change) => {
                        info!(path = %shown.display(), occurrences = change.total(), "updated");
                    }
                    Outcome::Errored(e) => {
                        warn!(path = %shown.display(), error = %e, "failed");
                    }
                    Outcome::Unchanged => {}
                }
                report.record(shown, &outcome);
            }
        }

        info!(
            scanned = report.files_scanned,
            changed = report.files_changed,
            errors = report.files_errored(),
            "rewrite finished"
        );
        Ok(report)
    }
}
