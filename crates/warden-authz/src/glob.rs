//! Separator-aware glob patterns for repository names and client addresses.
//!
//! # Syntax
//! - `*` matches any run of characters except `/`.
//! - `**` matches across `/` boundaries. When followed by a separator the
//!   separator is consumed as well, so `a/**/b` matches both `a/b`-style
//!   nesting and deeper paths such as `a/x/y/b`.
//! - The bare pattern `**` matches every candidate.
//! - Patterns without `*` only match the identical string.
//!
//! IP addresses have no `/`, so `127.0.0.*` treats the whole address as a
//! single segment and `*` matches the remaining octets.
//!
//! # Literal root
//! The cleaned path prefix before the first wildcard segment is the literal
//! root (`.` when the first segment already holds a wildcard). A candidate
//! equal to `.` or not longer than the root never matches, which keeps
//! `namespace/*` from matching `namespace` or `namespace/`.
use crate::AuthzResult;
use regex::Regex;

const MATCH_ALL: &str = "**";

#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Any,
    Exact,
    Compiled { regex: Regex, root: String },
}

impl GlobPattern {
    pub fn compile(pattern: &str) -> AuthzResult<Self> {
        if pattern == MATCH_ALL {
            return Ok(Self {
                pattern: pattern.to_string(),
                matcher: Matcher::Any,
            });
        }

        // Step 1: split off the literal root while rebuilding the cleaned mask.
        let mut mask = String::new();
        let mut root: Option<String> = None;
        for segment in pattern.split('/') {
            if root.is_none() && segment.contains('*') {
                root = Some(if mask.is_empty() {
                    ".".to_string()
                } else {
                    mask.clone()
                });
            }
            mask = join_path(&mask, segment);
        }

        let Some(root) = root else {
            return Ok(Self {
                pattern: pattern.to_string(),
                matcher: Matcher::Exact,
            });
        };

        // Step 2: translate the mask into an anchored expression.
        let mask = clean_path(&mask);
        let regex = Regex::new(&format!("^{}$", translate(&mask)))?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: Matcher::Compiled {
                regex,
                root: clean_path(&root),
            },
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Exact => self.pattern == candidate,
            Matcher::Compiled { regex, root } => {
                if candidate == "." || candidate.len() <= root.len() {
                    return false;
                }
                regex.is_match(candidate)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Literal prefix before the first wildcard, if the pattern has one.
    pub fn literal_root(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Compiled { root, .. } => Some(root),
            _ => None,
        }
    }
}

/// Compile `pattern` and test `candidate` against it.
///
/// A pattern that fails to compile matches nothing.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    GlobPattern::compile(pattern)
        .map(|glob| glob.matches(candidate))
        .unwrap_or(false)
}

fn translate(mask: &str) -> String {
    let chars: Vec<char> = mask.chars().collect();
    let mut out = String::with_capacity(mask.len() * 2);
    let mut idx = 0;
    while idx < chars.len() {
        let c = chars[idx];
        if c == '*' {
            if chars.get(idx + 1) == Some(&'*') {
                out.push_str("(.*)?");
                // `**` swallows the character that follows it.
                idx += 3;
                continue;
            }
            out.push_str("[^/]*");
        } else if c == '/' || c.is_ascii_alphanumeric() || u32::from(c) > 0xFF {
            out.push(c);
        } else {
            out.push_str(&format!("[\\x{:02X}]", u32::from(c)));
        }
        idx += 1;
    }
    out
}

fn join_path(base: &str, segment: &str) -> String {
    match (base.is_empty(), segment.is_empty()) {
        (true, true) => String::new(),
        (true, false) => clean_path(segment),
        _ => clean_path(&format!("{base}/{segment}")),
    }
}

/// Lexical path normalization: collapses repeated separators, drops `.`
/// segments and resolves `..` against preceding segments.
fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
