//! # retext
//!
//! Batch text rewriting over a project tree.
//!
//! A pass selects files under a root, runs an ordered rule set over each
//! file's text and writes back only the files whose text changed:
//! - Select files by extension or glob, pruning excluded directories
//! - Apply regex or literal rules in order, each seeing the previous output
//! - Collect per-file outcomes into a [`RunReport`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retext::prelude::*;
//!
//! let rules = RuleSet::builder()
//!     .pattern(r#"href="(?!https?://|/|#)([^"]+\.css[^"]*)""#, r#"href="/\1""#)
//!     .literal("VisionKrono", "Kromi.online")
//!     .build()?;
//!
//! let report = Rewrite::in_dir("./my-project")
//!     .select("src", |s| s.extensions(["html", "md"]).exclude_dir("vendor"))
//!     .rules(rules)
//!     .run()?;
//!
//! println!("{report}");
//! # Ok::<(), retext::error::RewriteError>(())
//! ```
//!
//! ## Built-in Jobs
//!
//! ```rust,no_run
//! use retext::prelude::*;
//!
//! let report = presets::relocate().to_rewrite(".")?.run()?;
//! assert!(!report.has_errors());
//! # Ok::<(), retext::error::RewriteError>(())
//! ```

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod presets;
pub mod report;
pub mod rewrite;
pub mod rules;
pub mod select;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{JobConfig, RuleConfig};
    pub use crate::diff::DiffSummary;
    pub use crate::engine::{Change, FileRecord, Outcome, RewriteEngine};
    pub use crate::error::{Result, RewriteError};
    pub use crate::presets;
    pub use crate::report::{ChangedFile, FileError, RuleTotal, RunReport};
    pub use crate::rewrite::Rewrite;
    pub use crate::rules::{Application, Rule, RuleApplication, RuleSet, RuleSetBuilder};
    pub use crate::select::{Candidates, FileSelector, SelectionPolicy};
}

pub use prelude::*;
