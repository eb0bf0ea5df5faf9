//! Tool pattern parsing and matching
//!
//! Patterns gate both permission rules and hook matchers. The grammar is
//! deliberately tiny so that a settings file stays auditable by eye: a
//! literal tool family name, optionally followed by a parenthesized argument
//! prefix that may end in `*`. No regex, no character classes.

use std::fmt;

use eyre::{Result, bail};

/// A parsed tool pattern.
///
/// Forms:
/// - `""` — matches every invocation
/// - `Bash` — matches any invocation of the `Bash` tool
/// - `Bash(git status)` — exact argument match
/// - `Bash(git *)` — literal argument prefix
/// - `Bash(uv:*)` — argument prefix up to a word boundary, so `uv run x`
///   matches but `uvx run x` does not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    family: Option<String>,
    args: Option<ArgPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ArgPattern {
    Exact(String),
    Prefix(String),
    TokenPrefix(String),
}

impl Pattern {
    /// Parse a pattern string, rejecting malformed syntax.
    ///
    /// Syntax errors are configuration-load errors; a successfully parsed
    /// pattern can never fail at match time.
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Ok(Self { family: None, args: None });
        }

        let Some(open) = source.find('(') else {
            if source.contains(')') {
                bail!("Unbalanced parentheses in pattern '{}'", source);
            }
            if source.contains('*') {
                bail!("Wildcard is only valid inside parentheses in pattern '{}'", source);
            }
            return Ok(Self {
                family: Some(source.to_string()),
                args: None,
            });
        };

        let family = &source[..open];
        if family.is_empty() {
            bail!("Missing tool family in pattern '{}'", source);
        }
        if family.contains('*') {
            bail!("Wildcard is not valid in a tool family: '{}'", source);
        }

        let rest = &source[open + 1..];
        let Some(close) = rest.rfind(')') else {
            bail!("Unbalanced parentheses in pattern '{}'", source);
        };
        if close != rest.len() - 1 {
            bail!("Trailing text after ')' in pattern '{}'", source);
        }

        let sub = &rest[..close];
        if sub.contains('(') || sub.contains(')') {
            bail!("Nested parentheses in pattern '{}'", source);
        }

        let args = if let Some(prefix) = sub.strip_suffix(":*") {
            ArgPattern::TokenPrefix(prefix.to_string())
        } else if let Some(prefix) = sub.strip_suffix('*') {
            ArgPattern::Prefix(prefix.to_string())
        } else {
            ArgPattern::Exact(sub.to_string())
        };

        match &args {
            ArgPattern::Exact(text) | ArgPattern::Prefix(text) | ArgPattern::TokenPrefix(text) => {
                if text.contains('*') {
                    bail!("Wildcard is only valid at the end of pattern '{}'", source);
                }
            }
        }

        Ok(Self {
            family: Some(family.to_string()),
            args: Some(args),
        })
    }

    /// Test a candidate invocation against this pattern.
    ///
    /// Never errors: a candidate that does not fit simply does not match.
    pub fn matches(&self, tool_name: &str, arguments: &str) -> bool {
        let Some(family) = &self.family else {
            return true;
        };
        if family != tool_name {
            return false;
        }

        match &self.args {
            None => true,
            Some(ArgPattern::Exact(text)) => arguments == text,
            Some(ArgPattern::Prefix(prefix)) => arguments.starts_with(prefix.as_str()),
            Some(ArgPattern::TokenPrefix(prefix)) => {
                if arguments == prefix {
                    return true;
                }
                let Some(rest) = arguments.strip_prefix(prefix.as_str()) else {
                    return false;
                };
                // The prefix must end at a token boundary: `uv:*` covers
                // `uv run x` and `uv:sync` but not `uvx run x`.
                rest.starts_with(' ') || rest.starts_with(':')
            }
        }
    }

    /// True for the empty pattern that matches every invocation.
    pub fn is_match_all(&self) -> bool {
        self.family.is_none()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.family, &self.args) {
            (None, _) => write!(f, "*"),
            (Some(family), None) => write!(f, "{family}"),
            (Some(family), Some(ArgPattern::Exact(text))) => write!(f, "{family}({text})"),
            (Some(family), Some(ArgPattern::Prefix(text))) => write!(f, "{family}({text}*)"),
            (Some(family), Some(ArgPattern::TokenPrefix(text))) => write!(f, "{family}({text}:*)"),
        }
    }
}
