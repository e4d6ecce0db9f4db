//! Class token list
//!
//! Space-separated token handling with classList semantics.

/// Ordered set of space-separated tokens (an element's class list)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<String>,
}

impl TokenList {
    /// Create empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a space-separated string
    pub fn from_str_value(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.add(token);
        }
        list
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if a token is present
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add a token (no-op if already present or empty)
    pub fn add(&mut self, token: &str) {
        if !token.is_empty() && !self.contains(token) {
            self.tokens.push(token.to_string());
        }
    }

    /// Remove a token
    pub fn remove(&mut self, token: &str) {
        self.tokens.retain(|t| t != token);
    }

    /// Toggle a token, returning its new presence
    pub fn toggle(&mut self, token: &str) -> bool {
        if self.contains(token) {
            self.remove(token);
            false
        } else {
            self.add(token);
            true
        }
    }

    /// Serialize as a space-separated string
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

impl std::fmt::Display for TokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_contains() {
        let list = TokenList::from_str_value("btn  btn-primary active");
        assert_eq!(list.len(), 3);
        assert!(list.contains("btn"));
        assert!(!list.contains("missing"));
    }

    #[test]
    fn test_add_is_deduplicating() {
        let mut list = TokenList::new();
        list.add("selected");
        list.add("selected");
        list.add("");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut list = TokenList::new();
        assert!(list.toggle("hover"));
        assert!(list.contains("hover"));
        assert!(!list.toggle("hover"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_value_round_trip() {
        let mut list = TokenList::new();
        list.add("a");
        list.add("b");
        assert_eq!(list.value(), "a b");
    }
}
