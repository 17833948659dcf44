//! Path glob patterns.
//!
//! Supports `*` and `?` within one path segment and `**` spanning any number
//! of segments. Patterns are always matched against paths relative to the
//! project root, segment by segment.

use std::path::{Component, Path, PathBuf};

use crate::error::{ResolveError, Result};

/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`: zero or more whole segments.
    AnyDepth,
    /// A single segment, possibly with `*` / `?`.
    Glob(Vec<Token>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    AnyChar,
    AnyRun,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidPattern` for an empty pattern or a `**`
    /// fused with other characters inside one segment (`a**`, `**b`).
    pub fn new(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ResolveError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim_start_matches("./").trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("pattern is empty").into());
        }

        let mut segments = Vec::new();
        for part in trimmed.split('/') {
            match part {
                "" | "." => continue,
                "**" => {
                    // Collapse runs of `**`.
                    if segments.last() != Some(&Segment::AnyDepth) {
                        segments.push(Segment::AnyDepth);
                    }
                }
                _ if part.contains("**") => {
                    return Err(invalid("'**' must be a whole path segment").into());
                }
                _ => segments.push(Segment::Glob(
                    part.chars()
                        .map(|c| match c {
                            '*' => Token::AnyRun,
                            '?' => Token::AnyChar,
                            c => Token::Char(c),
                        })
                        .collect(),
                )),
            }
        }

        if segments.is_empty() {
            return Err(invalid("pattern is empty").into());
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Whether a string contains glob metacharacters.
    pub fn is_glob(s: &str) -> bool {
        s.contains(['*', '?'])
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Leading segments that contain no wildcards.
    ///
    /// Expansion only needs to walk below this directory.
    pub fn literal_prefix(&self) -> PathBuf {
        let mut prefix = PathBuf::new();
        // The final segment always names the file itself.
        let dirs = &self.segments[..self.segments.len() - 1];
        for segment in dirs {
            let Segment::Glob(tokens) = segment else {
                break;
            };
            let literal: Option<String> = tokens
                .iter()
                .map(|t| match t {
                    Token::Char(c) => Some(*c),
                    _ => None,
                })
                .collect();
            match literal {
                Some(name) => prefix.push(name),
                None => break,
            }
        }
        prefix
    }

    /// Match a root-relative path.
    pub fn matches(&self, path: &Path) -> bool {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::Glob(tokens), rest)) => match parts.split_first() {
            Some((part, tail)) => {
                let chars: Vec<char> = part.chars().collect();
                match_tokens(tokens, &chars) && match_segments(rest, tail)
            }
            None => false,
        },
    }
}

/// Greedy match with single-star backtracking; O(tokens * chars).
fn match_tokens(tokens: &[Token], chars: &[char]) -> bool {
    let (mut t, mut c) = (0, 0);
    // Most recent `*` and the input position it resumes from.
    let mut star: Option<(usize, usize)> = None;

    while c < chars.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                star = Some((t, c));
                t += 1;
            }
            Some(Token::AnyChar) => {
                t += 1;
                c += 1;
            }
            Some(Token::Char(x)) if *x == chars[c] => {
                t += 1;
                c += 1;
            }
            _ => match star {
                Some((st, sc)) => {
                    star = Some((st, sc + 1));
                    t = st + 1;
                    c = sc + 1;
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}
