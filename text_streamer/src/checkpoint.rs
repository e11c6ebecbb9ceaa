//! Locked-in prefix bookkeeping for incremental detokenization.
//!
//! Decoding `ids[..k]` and `ids[..k + 1]` need not agree on the first `k`
//! tokens' text: merges, spacing rules and special tokens can rewrite earlier
//! characters. The streamer therefore trusts only a locked-in prefix of its
//! text and re-decodes every token after the last [`Checkpoint`] on each
//! update.
//!
//! [`recompute`] is a pure function of the current [`StreamState`] and the
//! freshly decoded suffix; [`StreamState::apply`] commits its result. Keeping
//! the two apart lets the arithmetic be tested without a decoder or sinks.
//!
//! All lengths are counted in `char`s, never bytes, so a checkpoint can never
//! fall inside a multi-byte character.

use crate::{boundary::BoundaryPolicy, traits::TokenIdType};

/// Position up to which output is final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkpoint {
    /// Number of output tokens whose text is locked in
    pub token_index: usize,
    /// Char length of the locked-in text
    pub text_chars: usize,
}

/// Text decoded so far and how much of it has been delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamState {
    text: String,
    text_len: usize,
    delivered_chars: usize,
    checkpoint: Checkpoint,
}

/// Outcome of re-decoding the tokens after the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputed {
    /// Locked-in prefix followed by the new decode
    pub text: String,
    /// Part of `text` not yet delivered
    pub fragment: String,
    /// Whether the new decode ends on a commit boundary
    pub lock: bool,
    /// Whether re-decoding changed characters that were already delivered
    pub rewrote_delivered: bool,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State after the prompt echo: everything in `text` counts as delivered
    /// and locked in at `token_index`.
    pub fn seeded(text: String, token_index: usize) -> Self {
        let text_len = text.chars().count();
        Self {
            text,
            text_len,
            delivered_chars: text_len,
            checkpoint: Checkpoint {
                token_index,
                text_chars: text_len,
            },
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Char length of [`text`](Self::text)
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn delivered_chars(&self) -> usize {
        self.delivered_chars
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Output tokens after the checkpoint. Empty when nothing new arrived.
    pub fn pending_tokens<'a>(&self, output_token_ids: &'a [TokenIdType]) -> &'a [TokenIdType] {
        output_token_ids
            .get(self.checkpoint.token_index..)
            .unwrap_or_default()
    }

    /// Commit a [`Recomputed`] text. `token_count` is the length of the output
    /// sequence it was decoded from and becomes the new checkpoint when the
    /// result locks.
    pub fn apply(&mut self, text: String, lock: bool, token_count: usize) {
        self.text_len = text.chars().count();
        self.text = text;
        self.delivered_chars = self.text_len;
        if lock {
            self.checkpoint = Checkpoint {
                token_index: token_count,
                text_chars: self.text_len,
            };
        }
    }

    /// Clear everything and hand back the final text.
    pub fn reset(&mut self) -> String {
        std::mem::take(self).text
    }
}

/// Rebuild the text from the locked-in prefix and a fresh decode of the
/// tokens after the checkpoint.
///
/// A single space separates the two unless nothing has been locked in yet
/// (`token_index == 0`).
pub fn recompute(
    state: &StreamState,
    decoded_suffix: &str,
    policy: &dyn BoundaryPolicy,
) -> Recomputed {
    let locked = &state.text[..byte_offset(&state.text, state.checkpoint.text_chars)];
    let separate = state.checkpoint.token_index > 0;

    let mut text = String::with_capacity(locked.len() + decoded_suffix.len() + 1);
    text.push_str(locked);
    if separate {
        text.push(' ');
    }
    text.push_str(decoded_suffix);

    let delivered = &state.text[..byte_offset(&state.text, state.delivered_chars)];
    let rewrote_delivered = !text.starts_with(delivered);
    let fragment = text[byte_offset(&text, state.delivered_chars)..].to_string();

    Recomputed {
        text,
        fragment,
        lock: policy.is_boundary(decoded_suffix),
        rewrote_delivered,
    }
}

/// Byte offset of the `chars`-th character, clamped to the end of `s`.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::PunctuationBoundary;

    fn step(state: &mut StreamState, output: &[TokenIdType], decoded: &str) -> Recomputed {
        let result = recompute(state, decoded, &PunctuationBoundary::default());
        state.apply(result.text.clone(), result.lock, output.len());
        result
    }

    #[test]
    fn test_cold_start_has_no_separator() {
        let state = StreamState::new();
        let result = recompute(&state, "Hello", &PunctuationBoundary::default());
        assert_eq!(result.text, "Hello");
        assert_eq!(result.fragment, "Hello");
        assert!(!result.lock);
        assert!(!result.rewrote_delivered);
    }

    #[test]
    fn test_lock_then_separate() {
        let mut state = StreamState::new();

        let r = step(&mut state, &[1], "Hello");
        assert_eq!(r.fragment, "Hello");
        assert_eq!(state.checkpoint(), Checkpoint::default());

        let r = step(&mut state, &[1, 11], "Hello,");
        assert_eq!(r.fragment, ",");
        assert!(r.lock);
        assert_eq!(
            state.checkpoint(),
            Checkpoint {
                token_index: 2,
                text_chars: 6
            }
        );

        let r = step(&mut state, &[1, 11, 2], "world");
        assert_eq!(r.text, "Hello, world");
        assert_eq!(r.fragment, " world");
        assert_eq!(state.checkpoint().token_index, 2);

        let r = step(&mut state, &[1, 11, 2, 10], "world.");
        assert_eq!(r.text, "Hello, world.");
        assert_eq!(r.fragment, ".");
        assert_eq!(
            state.checkpoint(),
            Checkpoint {
                token_index: 4,
                text_chars: 13
            }
        );
        assert_eq!(state.delivered_chars(), 13);
    }

    #[test]
    fn test_unlocked_text_is_replaced_not_appended() {
        let mut state = StreamState::new();
        step(&mut state, &[1], "ab");

        // A merge rewrites the unlocked tail.
        let r = step(&mut state, &[1, 2], "abc");
        assert_eq!(r.text, "abc");
        assert_eq!(r.fragment, "c");

        let r = step(&mut state, &[1, 2, 3], "aXcd");
        assert_eq!(r.text, "aXcd");
        assert_eq!(r.fragment, "d");
        assert!(r.rewrote_delivered);
    }

    #[test]
    fn test_shrinking_decode_yields_empty_fragment() {
        let mut state = StreamState::new();
        step(&mut state, &[1, 2], "abcd");

        let r = step(&mut state, &[1, 2, 3], "ab");
        assert_eq!(r.fragment, "");
        assert!(r.rewrote_delivered);
        assert_eq!(state.delivered_chars(), 2);
        assert!(state.delivered_chars() <= state.text_len());
    }

    #[test]
    fn test_char_counting_with_multibyte_text() {
        let mut state = StreamState::new();
        let r = step(&mut state, &[1], "héllo,");
        assert!(r.lock);
        assert_eq!(state.checkpoint().text_chars, 6);
        assert_eq!(state.text_len(), 6);

        let r = step(&mut state, &[1, 2], "🎉");
        assert_eq!(r.text, "héllo, 🎉");
        assert_eq!(r.fragment, " 🎉");
        assert_eq!(state.delivered_chars(), 8);
    }

    #[test]
    fn test_seeded_state() {
        let state = StreamState::seeded("Hi there".to_string(), 2);
        assert_eq!(state.delivered_chars(), 8);
        assert_eq!(
            state.checkpoint(),
            Checkpoint {
                token_index: 2,
                text_chars: 8
            }
        );

        let result = recompute(&state, "friend", &PunctuationBoundary::default());
        assert_eq!(result.text, "Hi there friend");
        assert_eq!(result.fragment, " friend");
    }

    #[test]
    fn test_pending_tokens() {
        let mut state = StreamState::new();
        assert_eq!(state.pending_tokens(&[1, 2]), &[1, 2]);

        state.apply("a.".to_string(), true, 2);
        assert!(state.pending_tokens(&[1, 2]).is_empty());
        assert_eq!(state.pending_tokens(&[1, 2, 3]), &[3]);
        // A shorter sequence than the checkpoint has nothing pending.
        assert!(state.pending_tokens(&[1]).is_empty());
    }

    #[test]
    fn test_reset_returns_text_and_zeroes_state() {
        let mut state = StreamState::new();
        state.apply("done.".to_string(), true, 3);

        assert_eq!(state.reset(), "done.");
        assert_eq!(state, StreamState::default());
    }
}
