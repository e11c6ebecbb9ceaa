//! Commit-boundary policies.
//!
//! After every decode the streamer asks a [`BoundaryPolicy`] whether the
//! freshly decoded suffix ends at a point where decoding is unlikely to change
//! again. When it does, the text produced so far is locked in and later
//! updates only re-decode the tokens after that point.
//!
//! This is a heuristic. A policy that fires too eagerly lets subword merges
//! across the boundary go unnoticed; one that never fires makes every update
//! re-decode the whole output.

/// Sentence and clause punctuation that ends a word in most tokenizers.
pub const DEFAULT_PUNCTUATION_MARKS: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Decides whether a decoded suffix is a safe lock-in point.
pub trait BoundaryPolicy: Send + Sync {
    fn is_boundary(&self, decoded_suffix: &str) -> bool;
}

impl<F> BoundaryPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_boundary(&self, decoded_suffix: &str) -> bool {
        self(decoded_suffix)
    }
}

/// Locks in when the suffix ends with one of a fixed set of marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunctuationBoundary {
    marks: Vec<char>,
}

impl PunctuationBoundary {
    pub fn new(marks: impl IntoIterator<Item = char>) -> Self {
        Self {
            marks: marks.into_iter().collect(),
        }
    }

    pub fn marks(&self) -> &[char] {
        &self.marks
    }
}

impl Default for PunctuationBoundary {
    fn default() -> Self {
        Self::new(DEFAULT_PUNCTUATION_MARKS)
    }
}

impl BoundaryPolicy for PunctuationBoundary {
    fn is_boundary(&self, decoded_suffix: &str) -> bool {
        decoded_suffix
            .chars()
            .next_back()
            .is_some_and(|last| self.marks.contains(&last))
    }
}

/// Locks in when the suffix ends with whitespace, e.g. for tokenizers whose
/// pieces carry a trailing space or newline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhitespaceBoundary;

impl BoundaryPolicy for WhitespaceBoundary {
    fn is_boundary(&self, decoded_suffix: &str) -> bool {
        decoded_suffix
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_punctuation_marks() {
        let policy = PunctuationBoundary::default();
        for mark in ['.', ',', '!', '?', ';', ':'] {
            assert!(policy.is_boundary(&format!("word{mark}")), "{mark}");
        }
        assert!(!policy.is_boundary("word"));
        assert!(!policy.is_boundary("word. "));
        assert!(!policy.is_boundary("-"));
    }

    #[test]
    fn test_empty_suffix_is_never_a_boundary() {
        assert!(!PunctuationBoundary::default().is_boundary(""));
        assert!(!WhitespaceBoundary.is_boundary(""));
    }

    #[test]
    fn test_custom_marks_and_multibyte_tail() {
        let policy = PunctuationBoundary::new(['。', '、']);
        assert!(policy.is_boundary("こんにちは。"));
        assert!(!policy.is_boundary("hello."));
        assert_eq!(policy.marks(), &['。', '、']);
    }

    #[test]
    fn test_whitespace_boundary() {
        assert!(WhitespaceBoundary.is_boundary("hello "));
        assert!(WhitespaceBoundary.is_boundary("line\n"));
        assert!(!WhitespaceBoundary.is_boundary("hello"));
    }

    #[test]
    fn test_closure_policy() {
        let policy = |s: &str| s.ends_with("\n\n");
        assert!(policy.is_boundary("para\n\n"));
        assert!(!policy.is_boundary("para\n"));
    }
}
