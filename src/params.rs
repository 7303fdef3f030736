use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IdentifyError, Result};

/// Which parameter syntaxes the lexer recognizes.
///
/// Each kind is independent: `numbered` sigils require a digit run (`$1`),
/// `named` sigils take an identifier run (`:name`), `quoted` sigils take a
/// quoted identifier (`@"two words"`), and `custom` holds regular expressions
/// matched at the current position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamTypes {
    /// Bare `?` placeholders.
    pub positional: bool,
    pub numbered: Vec<char>,
    pub named: Vec<char>,
    pub quoted: Vec<char>,
    pub custom: Vec<String>,
}

/// Compiled form of [`ParamTypes`] consulted by the lexer.
#[derive(Debug, Clone)]
pub struct ParamMatcher {
    types: ParamTypes,
    custom: Vec<Regex>,
}

impl ParamMatcher {
    pub fn new(types: &ParamTypes) -> Result<Self> {
        let custom = types
            .custom
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
                    IdentifyError::InvalidParameterPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            types: types.clone(),
            custom,
        })
    }

    pub fn positional(&self) -> bool {
        self.types.positional
    }

    pub fn is_numbered(&self, sigil: char) -> bool {
        self.types.numbered.contains(&sigil)
    }

    pub fn is_named(&self, sigil: char) -> bool {
        self.types.named.contains(&sigil)
    }

    pub fn is_quoted(&self, sigil: char) -> bool {
        self.types.quoted.contains(&sigil)
    }

    /// Byte length of the longest non-empty custom pattern match at the start
    /// of `remaining`.
    pub fn match_custom(&self, remaining: &str) -> Option<usize> {
        self.custom
            .iter()
            .filter_map(|re| re.find(remaining))
            .map(|m| m.end())
            .filter(|&len| len > 0)
            .max()
    }

    /// Whether `sigil` may start a parameter token, given its neighbours.
    pub fn starts_parameter(
        &self,
        sigil: char,
        next: Option<char>,
        prev: Option<char>,
        remaining: &str,
    ) -> bool {
        // `::` is a cast, never a parameter
        if sigil == ':' && (prev == Some(':') || next == Some(':')) {
            return false;
        }
        if self.types.positional && sigil == '?' {
            return true;
        }
        if self.is_numbered(sigil) && next.is_some_and(|c| c.is_ascii_digit()) {
            return true;
        }
        if self.is_named(sigil) || self.is_quoted(sigil) {
            return true;
        }
        self.match_custom(remaining).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_is_not_a_parameter() {
        let types = ParamTypes {
            named: vec![':'],
            ..ParamTypes::default()
        };
        let matcher = ParamMatcher::new(&types).unwrap();
        assert!(!matcher.starts_parameter(':', Some(':'), Some('a'), "::int"));
        assert!(!matcher.starts_parameter(':', Some('i'), Some(':'), ":int"));
        assert!(matcher.starts_parameter(':', Some('i'), Some(' '), ":id"));
    }

    #[test]
    fn test_numbered_requires_digit() {
        let types = ParamTypes {
            numbered: vec!['$'],
            ..ParamTypes::default()
        };
        let matcher = ParamMatcher::new(&types).unwrap();
        assert!(matcher.starts_parameter('$', Some('1'), None, "$1"));
        assert!(!matcher.starts_parameter('$', Some('a'), None, "$a"));
        assert!(!matcher.starts_parameter('$', None, None, "$"));
    }

    #[test]
    fn test_custom_longest_match() {
        let types = ParamTypes {
            custom: vec![r"\{\w+\}".to_string(), r"\{\w+".to_string()],
            ..ParamTypes::default()
        };
        let matcher = ParamMatcher::new(&types).unwrap();
        assert_eq!(matcher.match_custom("{name} = 1"), Some(6));
        assert_eq!(matcher.match_custom("x {name}"), None);
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let types = ParamTypes {
            custom: vec!["(".to_string()],
            ..ParamTypes::default()
        };
        let err = ParamMatcher::new(&types).unwrap_err();
        assert!(matches!(err, IdentifyError::InvalidParameterPattern { .. }));
    }
}
