//! A single match/replace rule.

use super::lookahead::{self, Guard, MARKER_PREFIX};
use crate::error::{RewriteError, Result};
use regex::{Captures, Regex};

/// An ordered (matcher, replacement template) pair.
///
/// Templates accept `$1`, `${1}`, `$name`, `${name}` and `$$`, as well as the
/// backslash forms `\1`, `\g<1>` and `\g<name>`. Every group reference is
/// checked against the pattern when the rule is built.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    pattern: String,
    replacement: String,
    regex: Regex,
    template: String,
    guards: Vec<Guard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Pattern,
    Literal,
}

/// The result of applying one rule to a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleApplication {
    pub text: String,
    /// Matches in the input minus matches left in the output.
    pub occurrences: usize,
}

impl Rule {
    /// Creates a regex rule.
    pub fn pattern(pattern: &str, replacement: &str) -> Result<Self> {
        let lowered = lookahead::lower(pattern)?;
        let regex = Regex::new(&lowered.source)?;
        let names: Vec<&str> = regex
            .capture_names()
            .flatten()
            .filter(|n| !n.starts_with(MARKER_PREFIX))
            .collect();
        let template = expand_template(pattern, replacement, &lowered.group_map, &names)?;

        Ok(Self {
            kind: RuleKind::Pattern,
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            regex,
            template,
            guards: lowered.guards,
        })
    }

    /// Creates a rule replacing every occurrence of `needle` verbatim.
    pub fn literal(needle: &str, replacement: &str) -> Result<Self> {
        if needle.is_empty() {
            return Err(RewriteError::invalid_rule(needle, "literal needle is empty"));
        }
        Ok(Self {
            kind: RuleKind::Literal,
            pattern: needle.to_string(),
            replacement: replacement.to_string(),
            regex: Regex::new(&regex::escape(needle))?,
            template: replacement.replace('$', "$$"),
            guards: Vec::new(),
        })
    }

    /// The pattern (or literal needle) as written.
    pub fn pattern_str(&self) -> &str {
        &self.pattern
    }

    /// The replacement as written.
    pub fn replacement_str(&self) -> &str {
        &self.replacement
    }

    pub fn is_literal(&self) -> bool {
        self.kind == RuleKind::Literal
    }

    /// Counts the matches the rule would replace in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.matches(text).count()
    }

    /// Replaces every accepted match and returns the new text with the
    /// number of substitutions made.
    pub fn replace(&self, text: &str) -> (String, usize) {
        let mut out = String::new();
        let mut last = 0;
        let mut replaced = 0;

        for caps in self.matches(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            caps.expand(&self.template, &mut out);
            last = whole.end();
            replaced += 1;
        }

        if replaced == 0 {
            return (text.to_string(), 0);
        }
        out.push_str(&text[last..]);
        (out, replaced)
    }

    /// Applies the rule and tallies how many occurrences it removed.
    pub fn apply(&self, text: &str) -> RuleApplication {
        let (rewritten, before) = self.replace(text);
        let occurrences = if before == 0 {
            0
        } else {
            before.saturating_sub(self.count(&rewritten))
        };
        RuleApplication {
            text: rewritten,
            occurrences,
        }
    }

    /// Returns a description of the rule.
    pub fn describe(&self) -> String {
        match self.kind {
            RuleKind::Pattern => {
                format!("Replace pattern '{}' with '{}'", self.pattern, self.replacement)
            }
            RuleKind::Literal => {
                format!("Replace literal '{}' with '{}'", self.pattern, self.replacement)
            }
        }
    }

    fn matches<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            rule: self,
            text,
            pos: Some(0),
            last_end: None,
        }
    }

    fn rejects(&self, caps: &Captures<'_>, text: &str) -> bool {
        self.guards.iter().any(|guard| {
            caps.name(&guard.marker)
                .is_some_and(|m| guard.blocks(text, m.start()))
        })
    }
}

/// Leftmost-first matches that pass every look-ahead guard.
struct Matches<'r, 't> {
    rule: &'r Rule,
    text: &'t str,
    pos: Option<usize>,
    last_end: Option<usize>,
}

impl<'t> Iterator for Matches<'_, 't> {
    type Item = Captures<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pos = self.pos?;
            if pos > self.text.len() {
                self.pos = None;
                return None;
            }
            let Some(caps) = self.rule.regex.captures_at(self.text, pos) else {
                self.pos = None;
                return None;
            };
            let Some(whole) = caps.get(0) else {
                self.pos = None;
                return None;
            };

            // An empty match right after the previous match is skipped.
            if whole.is_empty() && self.last_end == Some(whole.start()) {
                self.pos = Some(next_boundary(self.text, whole.start()));
                continue;
            }
            // A rejected candidate resumes one character after its start.
            if self.rule.rejects(&caps, self.text) {
                self.pos = Some(next_boundary(self.text, whole.start()));
                continue;
            }

            self.last_end = Some(whole.end());
            self.pos = Some(if whole.is_empty() {
                next_boundary(self.text, whole.end())
            } else {
                whole.end()
            });
            return Some(caps);
        }
    }
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| at + c.len_utf8())
}

/// Rewrites a user template into `regex` expansion syntax with real group
/// indices, rejecting references to groups the pattern does not have.
fn expand_template(
    pattern: &str,
    template: &str,
    group_map: &[usize],
    names: &[&str],
) -> Result<String> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    let resolve = |reference: &str| -> Result<String> {
        if reference.chars().all(|c| c.is_ascii_digit()) {
            let index: usize = reference.parse().map_err(|_| {
                RewriteError::invalid_rule(pattern, format!("bad group '{reference}'"))
            })?;
            if index == 0 {
                return Ok("${0}".to_string());
            }
            group_map
                .get(index - 1)
                .map(|real| format!("${{{real}}}"))
                .ok_or_else(|| {
                    RewriteError::invalid_rule(
                        pattern,
                        format!("replacement references missing group {index}"),
                    )
                })
        } else if names.contains(&reference) {
            Ok(format!("${{{reference}}}"))
        } else {
            Err(RewriteError::invalid_rule(
                pattern,
                format!("replacement references missing group '{reference}'"),
            ))
        }
    };

    while i < chars.len() {
        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some(d) if d.is_ascii_digit() => {
                    let mut end = i + 2;
                    if chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
                        end += 1;
                    }
                    let reference: String = chars[i + 1..end].iter().collect();
                    out.push_str(&resolve(&reference)?);
                    i = end;
                }
                Some('g') if chars.get(i + 2) == Some(&'<') => {
                    let close = chars[i + 3..]
                        .iter()
                        .position(|&c| c == '>')
                        .map(|p| i + 3 + p)
                        .ok_or_else(|| {
                            RewriteError::invalid_rule(pattern, "unterminated \\g<...> reference")
                        })?;
                    let reference: String = chars[i + 3..close].iter().collect();
                    out.push_str(&resolve(&reference)?);
                    i = close + 1;
                }
                Some('\\') => {
                    out.push('\\');
                    i += 2;
                }
                Some('n') => {
                    out.push('\n');
                    i += 2;
                }
                Some('t') => {
                    out.push('\t');
                    i += 2;
                }
                _ => {
                    out.push('\\');
                    i += 1;
                }
            },
            '$' => match chars.get(i + 1) {
                Some('$') => {
                    out.push_str("$$");
                    i += 2;
                }
                Some('{') => {
                    let close = chars[i + 2..]
                        .iter()
                        .position(|&c| c == '}')
                        .map(|p| i + 2 + p)
                        .ok_or_else(|| {
                            RewriteError::invalid_rule(pattern, "unterminated ${...} reference")
                        })?;
                    let reference: String = chars[i + 2..close].iter().collect();
                    out.push_str(&resolve(&reference)?);
                    i = close + 1;
                }
                Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                    let mut end = i + 1;
                    while chars
                        .get(end)
                        .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
                    {
                        end += 1;
                    }
                    let reference: String = chars[i + 1..end].iter().collect();
                    out.push_str(&resolve(&reference)?);
                    i = end;
                }
                _ => {
                    out.push_str("$$");
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_href_becomes_absolute() {
        let rule = Rule::pattern(r#"href="(?!https?://|/|#)([^"]+\.css[^"]*)""#, r#"href="/\1""#)
            .unwrap();
        let out = rule.apply(r#"<link href="styles/app.css">"#);
        assert_eq!(out.text, r#"<link href="/styles/app.css">"#);
        assert_eq!(out.occurrences, 1);
    }

    #[test]
    fn test_guard_keeps_absolute_and_remote_paths() {
        let rule = Rule::pattern(r#"href="(?!https?://|/|#)([^"]+\.css[^"]*)""#, r#"href="/\1""#)
            .unwrap();
        let source = r##"href="/a.css" href="https://cdn.example/b.css" href="#c.css""##;
        assert_eq!(rule.apply(source).text, source);
        assert_eq!(rule.count(source), 0);
    }

    #[test]
    fn test_rejected_candidate_does_not_hide_later_match() {
        let rule = Rule::pattern(r#"href="(?!/)([^"]+\.css)""#, r#"href="/$1""#).unwrap();
        let out = rule.apply(r#"href="/x.css" href="y.css""#);
        assert_eq!(out.text, r#"href="/x.css" href="/y.css""#);
    }

    #[test]
    fn test_literal_counts_occurrences() {
        let rule = Rule::literal("VisionKrono", "Kromi.online").unwrap();
        let out = rule.apply("Welcome to VisionKrono today");
        assert_eq!(out.text, "Welcome to Kromi.online today");
        assert_eq!(out.occurrences, 1);

        let out = rule.apply("VisionKrono and VisionKrono");
        assert_eq!(out.text, "Kromi.online and Kromi.online");
        assert_eq!(out.occurrences, 2);
    }

    #[test]
    fn test_literal_replacement_keeps_dollar_signs() {
        let rule = Rule::literal("price", "$5").unwrap();
        assert_eq!(rule.apply("the price").text, "the $5");
    }

    #[test]
    fn test_literal_needle_is_not_a_regex() {
        let rule = Rule::literal("a.b", "x").unwrap();
        assert_eq!(rule.apply("a.b acb").text, "x acb");
    }

    #[test]
    fn test_occurrences_discount_matches_left_behind() {
        // Each replacement reintroduces the needle.
        let rule = Rule::literal("ab", "abab").unwrap();
        let out = rule.apply("ab");
        assert_eq!(out.text, "abab");
        assert_eq!(out.occurrences, 0);
    }

    #[test]
    fn test_markdown_link_is_retargeted() {
        let rule = Rule::pattern(r"\((\./)?([A-Za-z0-9_\-/]+\.md)\)", r"(docs/\2)").unwrap();
        assert_eq!(rule.apply("[see](./notes.md)").text, "[see](docs/notes.md)");
    }

    #[test]
    fn test_native_template_syntax() {
        let rule = Rule::pattern(r"(?P<word>old)_(\w+)", "${word}er_$2 $$").unwrap();
        assert_eq!(rule.apply("old_fn").text, "older_fn $");
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        let rule = Rule::pattern(r"cost", "$ 5").unwrap();
        assert_eq!(rule.apply("cost").text, "$ 5");
    }

    #[test]
    fn test_missing_group_fails_at_construction() {
        assert!(Rule::pattern(r"(a)", r"\2").is_err());
        assert!(Rule::pattern(r"(a)", "$2").is_err());
        assert!(Rule::pattern(r"(a)", "${name}").is_err());
        assert!(Rule::pattern(r"(a)", "$1a").is_err());
    }

    #[test]
    fn test_malformed_pattern_fails_at_construction() {
        assert!(Rule::pattern(r"([a-z", "x").is_err());
        assert!(Rule::literal("", "x").is_err());
    }

    #[test]
    fn test_empty_matches_terminate() {
        let rule = Rule::pattern(r"x*", "-").unwrap();
        assert_eq!(rule.apply("ab").text, "-a-b-");
    }

    #[test]
    fn test_multibyte_text_after_rejection() {
        let rule = Rule::pattern(r"é(?!é)", "e").unwrap();
        assert_eq!(rule.apply("ééa").text, "éea");
    }

    #[test]
    fn test_inline_flags_apply_to_lookahead() {
        let rule = Rule::pattern(r"(?i)x(?!ab)", "Y").unwrap();
        assert_eq!(rule.apply("xAB").text, "xAB");
        assert_eq!(rule.apply("xAC").text, "YAC");

        let rule =
            Rule::pattern(r#"(?i)href="(?!https?://|/|#)([^"]+\.css)""#, r#"href="/\1""#).unwrap();
        let remote = r#"href="HTTPS://cdn/x.css""#;
        assert_eq!(rule.apply(remote).text, remote);
    }

    #[test]
    fn test_backtracking_lookahead_fails_at_construction() {
        assert!(Rule::pattern(r"a+(?!b)", "X").is_err());
        assert!(Rule::pattern(r"(?:a|bc)(?!d)", "X").is_err());
    }

    #[test]
    fn test_describe() {
        let rule = Rule::literal("foo", "bar").unwrap();
        assert_eq!(rule.describe(), "Replace literal 'foo' with 'bar'");
    }
}
