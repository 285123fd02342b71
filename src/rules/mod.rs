//! Ordered rule sets.

mod lookahead;
pub mod rule;

pub use rule::{Rule, RuleApplication};

use crate::error::Result;

/// An immutable, ordered list of rules. Each rule sees the output of the one
/// before it.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// The text produced by a rule set along with per-rule tallies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub text: String,
    /// Occurrence count for each rule, in rule order.
    pub occurrences: Vec<usize>,
}

impl Application {
    /// Total occurrences replaced across all rules.
    pub fn total(&self) -> usize {
        self.occurrences.iter().sum()
    }
}

impl RuleSet {
    /// Starts a new rule set builder.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Creates a rule set from already compiled rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Applies all rules to the text in order.
    pub fn apply(&self, text: &str) -> Application {
        let mut current = text.to_string();
        let mut occurrences = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let applied = rule.apply(&current);
            occurrences.push(applied.occurrences);
            current = applied.text;
        }
        Application {
            text: current,
            occurrences,
        }
    }

    /// Returns descriptions of all rules.
    pub fn describe(&self) -> Vec<String> {
        self.rules.iter().map(Rule::describe).collect()
    }

    /// Returns the rules in application order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone)]
enum RuleSpec {
    Pattern { pattern: String, replacement: String },
    Literal { needle: String, replacement: String },
}

/// Collects rules and compiles them all at once in [`RuleSetBuilder::build`],
/// so a malformed rule is reported before anything is scanned.
#[derive(Debug, Clone, Default)]
pub struct RuleSetBuilder {
    specs: Vec<RuleSpec>,
}

impl RuleSetBuilder {
    /// Adds a regex replacement.
    pub fn pattern(mut self, pattern: &str, replacement: &str) -> Self {
        self.specs.push(RuleSpec::Pattern {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        });
        self
    }

    /// Adds a literal string replacement.
    pub fn literal(mut self, needle: &str, replacement: &str) -> Self {
        self.specs.push(RuleSpec::Literal {
            needle: needle.to_string(),
            replacement: replacement.to_string(),
        });
        self
    }

    /// Compiles every rule, failing on the first malformed one.
    pub fn build(self) -> Result<RuleSet> {
        let rules = self
            .specs
            .iter()
            .map(|spec| match spec {
                RuleSpec::Pattern {
                    pattern,
                    replacement,
                } => Rule::pattern(pattern, replacement),
                RuleSpec::Literal {
                    needle,
                    replacement,
                } => Rule::literal(needle, replacement),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RuleSet::new(rules))
    }
}
