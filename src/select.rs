//! File selection: which files under a root are candidates for rewriting.

use crate::error::{RewriteError, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The criteria deciding which files are candidates.
///
/// A policy uses either an extension allow-list or a glob; with neither set
/// every file qualifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub root: PathBuf,

    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// Extensions without the leading dot, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,

    /// Glob matched against the path relative to `root`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,

    /// Directory names pruned wherever they appear below `root`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_dirs: Vec<String>,
}

fn default_recursive() -> bool {
    true
}

impl SelectionPolicy {
    /// Creates a recursive policy that selects every file under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            extensions: Vec::new(),
            glob: None,
            exclude_dirs: Vec::new(),
        }
    }

    /// Limits the scan to direct children of the root.
    pub fn single_level(mut self) -> Self {
        self.recursive = false;
        self
    }

    /// Matches files with the given extension.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Matches files with any of the given extensions.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions.extend(exts.into_iter().map(Into::into));
        self
    }

    /// Matches files against a glob instead of extensions.
    pub fn glob(mut self, pattern: impl Into<String>) -> Self {
        self.glob = Some(pattern.into());
        self
    }

    /// Never descends into directories with this name.
    pub fn exclude_dir(mut self, name: impl Into<String>) -> Self {
        self.exclude_dirs.push(name.into());
        self
    }

    pub fn exclude_dirs(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns a copy with `root` resolved against `base`.
    pub fn rooted_at(&self, base: &Path) -> Self {
        let root = if self.root == Path::new(".") {
            base.to_path_buf()
        } else {
            base.join(&self.root)
        };
        Self {
            root,
            ..self.clone()
        }
    }
}

/// Enumerates the files a [`SelectionPolicy`] selects.
#[derive(Debug, Clone)]
pub struct FileSelector {
    policy: SelectionPolicy,
    extensions: Vec<String>,
    glob: Option<GlobMatcher>,
}

impl FileSelector {
    /// Validates the policy and checks that its root is a readable directory.
    pub fn new(policy: SelectionPolicy) -> Result<Self> {
        if !policy.extensions.is_empty() && policy.glob.is_some() {
            return Err(RewriteError::InvalidConfig(format!(
                "scope {} sets both extensions and a glob",
                policy.root.display()
            )));
        }

        let glob = match &policy.glob {
            Some(pattern) => Some(
                GlobBuilder::new(pattern)
                    .literal_separator(true)
                    .build()?
                    .compile_matcher(),
            ),
            None => None,
        };
        let extensions = policy
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        check_root(&policy.root)?;

        Ok(Self {
            policy,
            extensions,
            glob,
        })
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Starts a fresh walk. Each call enumerates from scratch.
    pub fn candidates(&self) -> Candidates<'_> {
        let mut walk = WalkDir::new(&self.policy.root)
            .follow_links(false)
            .sort_by_file_name();
        if !self.policy.recursive {
            walk = walk.max_depth(1);
        }
        Candidates {
            selector: self,
            walker: walk.into_iter(),
        }
    }

    /// Collects all candidates, failing on the first walk error.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        self.candidates().collect()
    }

    /// Tests a path relative to the root against the extension or glob filter.
    pub fn selects(&self, relative: &Path) -> bool {
        if let Some(glob) = &self.glob {
            return glob.is_match(relative);
        }
        if self.extensions.is_empty() {
            return true;
        }
        relative
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn is_excluded_dir(&self, name: &OsStr) -> bool {
        self.policy.exclude_dirs.iter().any(|d| OsStr::new(d) == name)
    }
}

fn check_root(root: &Path) -> Result<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(RewriteError::RootNotFound(root.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RewriteError::RootNotFound(root.to_path_buf()));
        }
        Err(source) => {
            return Err(RewriteError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            });
        }
    }
    fs::read_dir(root).map_err(|source| RewriteError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// A lazy walk over the files selected by a [`FileSelector`].
///
/// Walk failures below the root (an unreadable subdirectory, say) are
/// yielded as errors and the walk carries on.
pub struct Candidates<'a> {
    selector: &'a FileSelector,
    walker: walkdir::IntoIter,
}

impl Iterator for Candidates<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 && self.selector.is_excluded_dir(entry.file_name()) {
                    self.walker.skip_current_dir();
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.selector.policy.root)
                .unwrap_or(entry.path());
            if self.selector.selects(relative) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
