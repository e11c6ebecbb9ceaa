//! Mock tokenizer implementation for testing

use std::collections::HashMap;

use anyhow::Result;

use crate::traits::{Decoder, Encoder, Encoding, TokenIdType, Tokenizer as TokenizerTrait};

const SPECIAL_TOKENS: [&str; 4] = ["<bos>", "<eos>", "<|im_start|>", "<|im_end|>"];

/// Mock tokenizer for testing purposes.
///
/// Words are joined with a single space on decode, while punctuation attaches
/// to the preceding word, so `[1, 11, 2, 10]` decodes to `"Hello, world."`.
pub struct MockTokenizer {
    vocab: HashMap<String, TokenIdType>,
    reverse_vocab: HashMap<TokenIdType, String>,
}

impl Default for MockTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTokenizer {
    pub fn new() -> Self {
        let tokens = [
            ("Hello", 1),
            ("world", 2),
            ("test", 3),
            ("token", 4),
            ("streaming", 5),
            ("is", 6),
            ("fun", 7),
            ("user", 8),
            ("assistant", 9),
            (".", 10),
            (",", 11),
            ("!", 12),
            ("?", 13),
            (";", 14),
            (":", 15),
            ("<eos>", 999),
            ("<bos>", 1000),
            ("<|im_start|>", 1001),
            ("<|im_end|>", 1002),
        ];

        let vocab: HashMap<String, TokenIdType> = tokens
            .iter()
            .map(|&(token, id)| (token.to_string(), id))
            .collect();
        let reverse_vocab = vocab.iter().map(|(token, &id)| (id, token.clone())).collect();

        Self {
            vocab,
            reverse_vocab,
        }
    }

    fn is_punctuation(token: &str) -> bool {
        token.len() == 1 && token.chars().all(|c| c.is_ascii_punctuation())
    }
}

impl Encoder for MockTokenizer {
    fn encode(&self, input: &str, add_special_tokens: bool) -> Result<Encoding> {
        let mut tokens = Vec::new();
        if add_special_tokens {
            tokens.push(self.vocab["<bos>"]);
        }

        // Trailing punctuation is split off into its own tokens; unknown words are dropped
        for word in input.split_whitespace() {
            let stem = word.trim_end_matches(|c: char| c.is_ascii_punctuation());
            if let Some(&id) = self.vocab.get(stem) {
                tokens.push(id);
            }
            for mark in word[stem.len()..].chars() {
                if let Some(&id) = self.vocab.get(&mark.to_string()) {
                    tokens.push(id);
                }
            }
        }

        Ok(Encoding::Plain(tokens))
    }

    fn encode_batch(&self, inputs: &[&str], add_special_tokens: bool) -> Result<Vec<Encoding>> {
        inputs
            .iter()
            .map(|input| self.encode(input, add_special_tokens))
            .collect()
    }
}

impl Decoder for MockTokenizer {
    fn decode(&self, token_ids: &[TokenIdType], skip_special_tokens: bool) -> Result<String> {
        let mut text = String::new();
        for token in token_ids.iter().filter_map(|id| self.reverse_vocab.get(id)) {
            if skip_special_tokens && SPECIAL_TOKENS.contains(&token.as_str()) {
                continue;
            }
            if !text.is_empty() && !Self::is_punctuation(token) {
                text.push(' ');
            }
            text.push_str(token);
        }
        Ok(text)
    }
}

impl TokenizerTrait for MockTokenizer {
    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn token_to_id(&self, token: &str) -> Option<TokenIdType> {
        self.vocab.get(token).copied()
    }

    fn id_to_token(&self, id: TokenIdType) -> Option<String> {
        self.reverse_vocab.get(&id).cloned()
    }
}
