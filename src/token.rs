//! Boundary-safe token matching for formula text.
//!
//! A [`Token`] is compiled once per rename and shared read-only by every
//! surface scan. It only matches the old name when the characters on both
//! sides fall outside the identifier alphabet `[A-Za-z0-9_]`, so `Rate`
//! never matches inside `TaxRate` or `Rate_2`.
//!
//! Matching is exact-case. The `regex` crate has no look-ahead, so the left
//! boundary lives in the compiled pattern and the right boundary is checked
//! on each candidate; the right boundary character is never consumed, which
//! lets `Rate+Rate` rewrite both tokens in a single pass.

use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use thiserror::Error;

/// Characters that may appear inside an identifier.
const IDENT_CLASS: &str = "A-Za-z0-9_";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("old name must not be empty")]
    EmptyOldName,

    #[error("new name must not be empty")]
    EmptyNewName,

    #[error("failed to compile token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A compiled rename: old name, new name and the boundary pattern.
#[derive(Debug, Clone)]
pub struct Token {
    old_name: String,
    new_name: String,
    pattern: Regex,
}

impl Token {
    /// Compile a token for renaming `old_name` to `new_name`.
    ///
    /// Both names are trimmed; either being empty afterwards is an error.
    /// Every regex metacharacter in the old name is escaped.
    pub fn new(old_name: &str, new_name: &str) -> Result<Self, TokenError> {
        let old_name = old_name.trim();
        let new_name = new_name.trim();
        if old_name.is_empty() {
            return Err(TokenError::EmptyOldName);
        }
        if new_name.is_empty() {
            return Err(TokenError::EmptyNewName);
        }

        let pattern = Regex::new(&format!(
            "(?:^|[^{IDENT_CLASS}])({})",
            regex::escape(old_name)
        ))?;

        Ok(Self {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            pattern,
        })
    }

    /// A token that only searches; rewriting with it is a no-op.
    pub fn lookup(name: &str) -> Result<Self, TokenError> {
        Self::new(name, name)
    }

    pub fn old_name(&self) -> &str {
        &self.old_name
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    /// Byte ranges of every boundary-safe occurrence of the old name.
    pub fn find_iter<'t>(&'t self, text: &'t str) -> Matches<'t> {
        Matches {
            token: self,
            text,
            pos: 0,
        }
    }

    /// Whether `text` contains the old name as a standalone token.
    pub fn is_match(&self, text: &str) -> bool {
        self.find_iter(text).next().is_some()
    }

    /// Replace every standalone occurrence of the old name with the new name.
    ///
    /// Borrows the input when nothing matched.
    pub fn replace<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut out = String::new();
        let mut last = 0;
        for range in self.find_iter(text) {
            out.push_str(&text[last..range.start]);
            out.push_str(&self.new_name);
            last = range.end;
        }
        if last == 0 {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[last..]);
        Cow::Owned(out)
    }

    /// Rewritten text, or `None` when the rewrite would not change anything.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        match self.replace(text) {
            Cow::Owned(rewritten) if rewritten != text => Some(rewritten),
            _ => None,
        }
    }

    fn find_at(&self, text: &str, mut pos: usize) -> Option<Range<usize>> {
        while pos <= text.len() {
            let caps = self.pattern.captures_at(text, pos)?;
            let (whole, name) = match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(name)) => (whole, name),
                _ => return None,
            };
            if is_right_boundary(text, name.end()) {
                return Some(name.range());
            }
            // Retry just past the start of the rejected candidate.
            let start = whole.start();
            pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }
}

/// Iterator over the byte ranges of a token's occurrences.
pub struct Matches<'t> {
    token: &'t Token,
    text: &'t str,
    pos: usize,
}

impl Iterator for Matches<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.token.find_at(self.text, self.pos)?;
        self.pos = range.end;
        Some(range)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_right_boundary(text: &str, end: usize) -> bool {
    text[end..].chars().next().map_or(true, |c| !is_ident_char(c))
}
