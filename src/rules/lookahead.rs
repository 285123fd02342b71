//! Lowering of negative look-ahead into marker groups.
//!
//! The `regex` crate has no look-around. A `(?!body)` in a rule pattern is
//! replaced by an empty named group that records the position, and `body` is
//! compiled into a separate guard that is tried at that position after a
//! candidate match is found. Capture group numbers written by the user are
//! remapped around the inserted markers.
//!
//! A rejected candidate is never retried with a shorter match, so a
//! look-ahead is only accepted where its position is fixed by the start of
//! the match: after a prefix with no quantifier or alternation, outside any
//! quantified group and with no alternation beside it. Inline flags in
//! effect at the look-ahead are carried into its guard.

use crate::error::{RewriteError, Result};
use regex::Regex;

/// Name prefix of the inserted marker groups.
pub(crate) const MARKER_PREFIX: &str = "__retext_la";

/// A negative look-ahead lifted out of a pattern.
#[derive(Debug, Clone)]
pub(crate) struct Guard {
    pub marker: String,
    pub regex: Regex,
}

impl Guard {
    /// Returns true when the look-ahead body matches at `pos`, which means the
    /// surrounding candidate match must be rejected.
    pub fn blocks(&self, text: &str, pos: usize) -> bool {
        self.regex.is_match(&text[pos..])
    }
}

/// A pattern with its look-aheads lowered.
#[derive(Debug)]
pub(crate) struct Lowered {
    pub source: String,
    pub guards: Vec<Guard>,
    /// `group_map[k - 1]` is the real index of the user's group `k`.
    pub group_map: Vec<usize>,
}

/// An open group while scanning.
#[derive(Debug, Clone, Default)]
struct Scope {
    /// Inline flag sets in effect, in the order they were applied.
    flags: Vec<String>,
    /// A look-ahead was lowered somewhere inside this group.
    guarded: bool,
}

impl Scope {
    fn child(&self, flags: Option<String>) -> Self {
        let mut child = Scope {
            flags: self.flags.clone(),
            guarded: false,
        };
        child.flags.extend(flags);
        child
    }

    fn verbose(&self) -> bool {
        let mut on = false;
        for set in &self.flags {
            let mut negated = false;
            for c in set.chars() {
                match c {
                    '-' => negated = true,
                    'x' => on = !negated,
                    _ => {}
                }
            }
        }
        on
    }

    /// The flags as a prefix for a standalone regex.
    fn prefix(&self) -> String {
        self.flags.iter().map(|f| format!("(?{f})")).collect()
    }
}

pub(crate) fn lower(pattern: &str) -> Result<Lowered> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut source = String::with_capacity(pattern.len());
    let mut guards = Vec::new();
    let mut group_map = Vec::new();
    let mut real_groups = 0usize;
    let mut scopes = vec![Scope::default()];
    let mut fixed_prefix = true;
    let mut i = 0;

    let reject = |message: &str| RewriteError::invalid_rule(pattern, message);

    while i < chars.len() {
        let c = chars[i];
        let verbose = scopes.last().is_some_and(Scope::verbose);
        match c {
            '\\' => {
                let end = skip_escape(&chars, i);
                source.extend(&chars[i..end]);
                i = end;
            }
            '[' => {
                let end =
                    skip_class(&chars, i).ok_or_else(|| reject("unclosed character class"))?;
                source.extend(&chars[i..end]);
                i = end;
            }
            '#' if verbose => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(chars.len(), |p| i + p);
                source.extend(&chars[i..end]);
                i = end;
            }
            '*' | '+' | '?' | '{' => {
                fixed_prefix = false;
                source.push(c);
                i += 1;
            }
            '|' => {
                if scopes.last().is_some_and(|s| s.guarded) {
                    return Err(reject("alternation beside a look-ahead is not supported"));
                }
                fixed_prefix = false;
                source.push(c);
                i += 1;
            }
            ')' => {
                let closed = if scopes.len() > 1 { scopes.pop() } else { None };
                source.push(c);
                i += 1;
                if closed.is_some_and(|s| s.guarded) && quantified(&chars, i, verbose) {
                    return Err(reject("a quantified group around a look-ahead is not supported"));
                }
            }
            '(' if starts_with(&chars, i, "(?!") => {
                if !fixed_prefix {
                    return Err(reject(
                        "a look-ahead must follow a prefix without quantifiers or alternation",
                    ));
                }
                let close =
                    matching_paren(&chars, i).ok_or_else(|| reject("unclosed look-ahead"))?;
                let body: String = chars[i + 3..close].iter().collect();
                if body.contains("(?!") {
                    return Err(reject("nested look-ahead is not supported"));
                }
                let flags = scopes.last().map(Scope::prefix).unwrap_or_default();
                let regex = Regex::new(&format!(r"\A(?:{flags}(?:{body}))"))?;
                if regex.captures_len() > 1 {
                    return Err(reject("capture groups inside a look-ahead are not supported"));
                }
                if quantified(&chars, close + 1, verbose) {
                    return Err(reject("a quantified look-ahead is not supported"));
                }
                let marker = format!("{MARKER_PREFIX}{}", guards.len());
                source.push_str(&format!("(?P<{marker}>)"));
                guards.push(Guard { marker, regex });
                real_groups += 1;
                for scope in &mut scopes {
                    scope.guarded = true;
                }
                i = close + 1;
            }
            '(' if starts_with(&chars, i, "(?=")
                || starts_with(&chars, i, "(?<=")
                || starts_with(&chars, i, "(?<!") =>
            {
                return Err(reject("only negative look-ahead (?!...) is supported"));
            }
            '(' => {
                let parent = scopes.last().cloned().unwrap_or_default();
                let end = match Opener::parse(&chars, i) {
                    Opener::Capture(end) => {
                        real_groups += 1;
                        group_map.push(real_groups);
                        scopes.push(parent.child(None));
                        end
                    }
                    Opener::Flags(set, end) => {
                        if let Some(scope) = scopes.last_mut() {
                            scope.flags.push(set);
                        }
                        end
                    }
                    Opener::Scoped(set, end) => {
                        scopes.push(parent.child(set));
                        end
                    }
                };
                source.extend(&chars[i..end]);
                i = end;
            }
            _ => {
                source.push(c);
                i += 1;
            }
        }
    }

    Ok(Lowered {
        source,
        guards,
        group_map,
    })
}

/// The opening of a group, with the index just past it.
enum Opener {
    /// `(`, `(?P<name>` or `(?<name>`.
    Capture(usize),
    /// `(?flags)`, which applies to the rest of the enclosing group.
    Flags(String, usize),
    /// `(?:` or `(?flags:`.
    Scoped(Option<String>, usize),
}

impl Opener {
    fn parse(chars: &[char], open: usize) -> Self {
        if chars.get(open + 1) != Some(&'?') {
            return Opener::Capture(open + 1);
        }
        if starts_with(chars, open, "(?P<") || starts_with(chars, open, "(?<") {
            let end = chars[open..]
                .iter()
                .position(|&c| c == '>')
                .map_or(chars.len(), |p| open + p + 1);
            return Opener::Capture(end);
        }
        let mut j = open + 2;
        while chars.get(j).is_some_and(|&c| is_flag(c)) {
            j += 1;
        }
        let set: String = chars[open + 2..j].iter().collect();
        match chars.get(j) {
            Some(')') if !set.is_empty() => Opener::Flags(set, j + 1),
            Some(':') => Opener::Scoped((!set.is_empty()).then_some(set), j + 1),
            // Left for the regex parser to reject.
            _ => Opener::Scoped(None, open + 2),
        }
    }
}

fn is_flag(c: char) -> bool {
    matches!(c, 'i' | 'm' | 's' | 'U' | 'u' | 'x' | 'R' | '-')
}

/// Whether a repetition operator follows at `at`.
fn quantified(chars: &[char], at: usize, verbose: bool) -> bool {
    let mut j = at;
    while verbose && chars.get(j).is_some_and(|c| c.is_whitespace()) {
        j += 1;
    }
    matches!(chars.get(j), Some('*' | '+' | '?' | '{'))
}

fn starts_with(chars: &[char], at: usize, prefix: &str) -> bool {
    let mut idx = at;
    for p in prefix.chars() {
        if chars.get(idx) != Some(&p) {
            return false;
        }
        idx += 1;
    }
    true
}

/// Returns the index just past the escape sequence at `start`.
fn skip_escape(chars: &[char], start: usize) -> usize {
    let braced = matches!(chars.get(start + 1), Some('p' | 'P' | 'x' | 'u' | 'U'))
        && chars.get(start + 2) == Some(&'{');
    if braced {
        return chars[start..]
            .iter()
            .position(|&c| c == '}')
            .map_or(chars.len(), |p| start + p + 1);
    }
    (start + 2).min(chars.len())
}

/// Returns the index just past the class opened at `start`.
fn skip_class(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    // A leading `]` is a literal member.
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    let mut depth = 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Returns the index of the `)` closing the group opened at `open`.
fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => {
                i = skip_class(chars, i)?;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
