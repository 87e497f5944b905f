//! Wildcard term patterns.

use regex::Regex;

use crate::error::{LokiSearchError, Result};

/// A compiled wildcard pattern: `*` matches any run of chars, `?` matches
/// exactly one, and `\` escapes the next char.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: String,
    literal_prefix: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a wildcard pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut regex_pattern = String::from("^");
        let mut literal_prefix = String::new();
        let mut in_prefix = true;

        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '*' | '?' => {
                    in_prefix = false;
                    regex_pattern.push_str(if c == '*' { ".*" } else { "." });
                }
                _ => {
                    // A trailing backslash matches itself.
                    let literal = if c == '\\' { chars.next().unwrap_or('\\') } else { c };
                    if in_prefix {
                        literal_prefix.push(literal);
                    }
                    regex_pattern.push_str(&regex::escape(literal.encode_utf8(&mut [0; 4])));
                }
            }
        }
        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern).map_err(|e| {
            LokiSearchError::analysis(format!("Invalid wildcard pattern: {e}"))
        })?;

        Ok(WildcardPattern {
            pattern: pattern.to_string(),
            literal_prefix,
            regex,
        })
    }

    /// Get the source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The literal text before the first wildcard; every match starts with it.
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// Check if a term matches the pattern.
    pub fn matches(&self, term: &str) -> bool {
        self.regex.is_match(term)
    }
}
