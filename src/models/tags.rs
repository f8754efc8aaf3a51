use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Display;

/// Separator used by the catalog feed and the profile columns
pub const TAG_DELIMITER: char = ',';

/// Normalizes a single tag to its comparison key
pub fn tag_key(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// A multi-valued attribute parsed from comma-separated text
///
/// Tokens are trimmed and empty tokens are dropped. Matching is exact per token
/// and case-insensitive, so `"Chic"` matches `"chic"` but never `"Chicano"`.
/// The original spelling of each token is kept for display and storage.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tokens: Vec<String>,
    keys: HashSet<String>,
}

impl TagSet {
    /// Parses delimited text such as `"Classic, Edgy,,Chic"`
    pub fn parse(text: &str) -> Self {
        Self::from_tokens(text.split(TAG_DELIMITER))
    }

    /// Builds a set from individual tokens, dropping blanks and duplicates
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for token in tokens {
            set.insert(token.as_ref());
        }
        set
    }

    /// Adds a token unless it is blank or already present
    pub fn insert(&mut self, token: &str) -> bool {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return false;
        }
        if self.keys.insert(tag_key(trimmed)) {
            self.tokens.push(trimmed.to_string());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.keys.contains(&tag_key(tag))
    }

    /// True when at least one token is shared
    pub fn intersects(&self, other: &TagSet) -> bool {
        let (small, large) = if self.keys.len() <= other.keys.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.keys.iter().any(|key| large.keys.contains(key))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens in first-seen order with their original spelling
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Normalized comparison keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Comma-joined storage form
    pub fn to_delimited(&self) -> String {
        self.tokens.join(",")
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl Eq for TagSet {}

impl Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_delimited())
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.tokens.iter())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::from_tokens(tokens))
    }
}
