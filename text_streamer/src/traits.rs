use anyhow::Result;

/// Type alias for token IDs
pub type TokenIdType = u32;

/// Encoding side of a tokenizer, used to turn prompts into token ids
pub trait Encoder: Send + Sync {
    fn encode(&self, input: &str, add_special_tokens: bool) -> Result<Encoding>;
    fn encode_batch(&self, inputs: &[&str], add_special_tokens: bool) -> Result<Vec<Encoding>>;
}

/// Decoding side of a tokenizer.
///
/// This is the only capability a [`TextStreamer`](crate::TextStreamer) needs.
/// Implementations must be deterministic for a given input, but are free to
/// be non-prefix-stable: `decode(&ids[..k])` need not be a prefix of
/// `decode(&ids[..k + 1])`.
pub trait Decoder: Send + Sync {
    fn decode(&self, token_ids: &[TokenIdType], skip_special_tokens: bool) -> Result<String>;
}

/// Combined tokenizer trait
pub trait Tokenizer: Encoder + Decoder {
    fn vocab_size(&self) -> usize;
    fn token_to_id(&self, token: &str) -> Option<TokenIdType>;
    fn id_to_token(&self, id: TokenIdType) -> Option<String>;
}

/// Result of encoding text: the backend's native encoding or a plain id list
#[derive(Debug, Clone)]
pub enum Encoding {
    /// Hugging Face
    Hf(Box<tokenizers::tokenizer::Encoding>),
    /// Plain token ids (mock and simple backends)
    Plain(Vec<TokenIdType>),
}

impl Encoding {
    #[inline]
    pub fn token_ids(&self) -> &[TokenIdType] {
        match self {
            Encoding::Hf(inner) => inner.get_ids(),
            Encoding::Plain(inner) => inner,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.token_ids().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.token_ids().is_empty()
    }
}
