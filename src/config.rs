//! Serializable job definitions: a rule set plus the scopes it runs over.

use crate::error::{RewriteError, Result};
use crate::rewrite::Rewrite;
use crate::rules::RuleSet;
use crate::select::SelectionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A serializable rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleConfig {
    /// Replace using a regex pattern.
    #[serde(rename = "pattern")]
    Pattern { pattern: String, replacement: String },

    /// Replace a literal string with another.
    #[serde(rename = "literal")]
    Literal { from: String, to: String },
}

/// A named rewrite job, loadable from YAML or JSON.
///
/// # Example YAML
///
/// ```yaml
/// name: brand
/// description: Rename the product
/// scopes:
///   - root: src
///     extensions: [html, js, md]
///   - root: "."
///     recursive: false
///     glob: "*.md"
/// rules:
///   - type: literal
///     from: VisionKrono
///     to: Kromi.online
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Scopes to scan; roots are relative to the project root.
    #[serde(default)]
    pub scopes: Vec<SelectionPolicy>,

    /// The rules to apply, in order.
    pub rules: Vec<RuleConfig>,
}

impl JobConfig {
    /// Create a new, empty job.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            scopes: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Add a scope.
    pub fn with_scope(mut self, scope: SelectionPolicy) -> Self {
        self.scopes.push(scope);
        self
    }

    /// Add a regex rule.
    pub fn with_pattern(mut self, pattern: &str, replacement: &str) -> Self {
        self.rules.push(RuleConfig::Pattern {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        });
        self
    }

    /// Add a literal rule.
    pub fn with_literal(mut self, from: &str, to: &str) -> Self {
        self.rules.push(RuleConfig::Literal {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml::from_str(&content).map_err(|e| {
            RewriteError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            RewriteError::InvalidConfig(format!("Failed to parse JSON config: {}", e))
        })
    }

    /// Load config, picking the format from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            Some("yaml" | "yml") => Self::from_yaml(path),
            _ => Err(RewriteError::InvalidConfig(format!(
                "unknown config format for {} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    /// Serialize the job as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Compiles the rules, failing on the first malformed one.
    pub fn rule_set(&self) -> Result<RuleSet> {
        if self.rules.is_empty() {
            return Err(RewriteError::InvalidConfig(format!(
                "job '{}' has no rules",
                self.name
            )));
        }
        self.rules
            .iter()
            .fold(RuleSet::builder(), |builder, rule| match rule {
                RuleConfig::Pattern {
                    pattern,
                    replacement,
                } => builder.pattern(pattern, replacement),
                RuleConfig::Literal { from, to } => builder.literal(from, to),
            })
            .build()
    }

    /// Builds the rewrite driver for a project root.
    pub fn to_rewrite(&self, root: impl Into<PathBuf>) -> Result<Rewrite> {
        let mut rewrite = Rewrite::in_dir(root).rules(self.rule_set()?);
        for scope in &self.scopes {
            rewrite = rewrite.scope(scope.clone());
        }
        Ok(rewrite)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RewriteError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {}: {}", path.display(), e),
        ))
    })
}
