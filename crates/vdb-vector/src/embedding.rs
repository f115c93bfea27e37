//! Text vectorizers
//!
//! The only vectorizer shipped maps each character to its code point.
//! It is a placeholder: vectors vary in length with the input, so
//! similarity between texts of different length is only loosely meaningful.
//!
//! Author: hephaex@gmail.com

// ============================================================================
// Vectorizer Trait
// ============================================================================

/// Trait for turning text into a numeric vector
///
/// Implementations must be pure and deterministic.
pub trait Vectorizer: Send + Sync {
    /// Generate a vector for a single text
    fn vectorize(&self, text: &str) -> Vec<f32>;

    /// Get vectorizer name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Character Code Vectorizer
// ============================================================================

/// One element per character, holding its Unicode code point
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCodeVectorizer;

impl CharCodeVectorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Vectorizer for CharCodeVectorizer {
    fn vectorize(&self, text: &str) -> Vec<f32> {
        // Code points fit in 21 bits, well inside f32's exact integer range.
        text.chars().map(|c| u32::from(c) as f32).collect()
    }

    fn name(&self) -> &str {
        "char-code"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ascii_codes() {
        let v = CharCodeVectorizer::new();
        assert_eq!(v.vectorize("hi"), vec![104.0, 105.0]);
    }

    #[test]
    fn test_empty_string() {
        let v = CharCodeVectorizer::new();
        assert!(v.vectorize("").is_empty());
    }

    #[test]
    fn test_non_ascii_one_element_per_char() {
        let v = CharCodeVectorizer::new();
        let vector = v.vectorize("é😀");
        assert_eq!(vector, vec![233.0, 128_512.0]);
    }

    proptest! {
        #[test]
        fn prop_deterministic(s in ".*") {
            let v = CharCodeVectorizer::new();
            prop_assert_eq!(v.vectorize(&s), v.vectorize(&s));
        }

        #[test]
        fn prop_length_matches_char_count(s in ".*") {
            let v = CharCodeVectorizer::new();
            prop_assert_eq!(v.vectorize(&s).len(), s.chars().count());
        }
    }
}
