//! Incremental detokenization for LLM generation loops.
//!
//! A [`TextStreamer`] is fed the full output token sequence after every
//! generation step and delivers only the text the consumer has not seen yet,
//! tolerating decoders whose output for a prefix of the tokens is not a
//! prefix of the output for the whole sequence.

use std::{ops::Deref, sync::Arc};

use anyhow::Result;

pub mod boundary;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod huggingface;
pub mod mock;
pub mod sink;
pub mod streamer;
pub mod traits;


pub use boundary::{BoundaryPolicy, PunctuationBoundary, WhitespaceBoundary};
pub use checkpoint::Checkpoint;
pub use config::{BoundaryKind, StreamMode, TextStreamerConfig};
pub use error::{StreamerError, StreamerResult};
pub use huggingface::HuggingFaceTokenizer;
pub use sink::{EndSink, Sink, StreamEvent};
pub use streamer::{SequenceOutput, Streamer, TextStreamer, TextStreamerBuilder};
pub use traits::{Decoder, Encoder, Encoding, TokenIdType, Tokenizer as TokenizerTrait};

/// Main tokenizer handle that provides a unified interface for different tokenizer implementations
#[derive(Clone)]
pub struct Tokenizer(Arc<dyn traits::Tokenizer>);

impl Tokenizer {
    /// Load a HuggingFace `tokenizer.json`
    pub fn from_file(file_path: &str) -> Result<Tokenizer> {
        Ok(Tokenizer(Arc::new(HuggingFaceTokenizer::from_file(file_path)?)))
    }

    /// Create a tokenizer from an Arc<dyn Tokenizer>
    pub fn from_arc(tokenizer: Arc<dyn traits::Tokenizer>) -> Self {
        Tokenizer(tokenizer)
    }

    /// Create a text streamer that decodes with this tokenizer
    pub fn text_streamer(&self, config: TextStreamerConfig) -> StreamerResult<TextStreamer> {
        TextStreamer::new(Arc::new(self.clone()), config)
    }

    /// Start building a text streamer that decodes with this tokenizer
    pub fn text_streamer_builder(&self) -> TextStreamerBuilder {
        TextStreamer::builder(Arc::new(self.clone()))
    }

    pub fn encode(&self, input: &str, add_special_tokens: bool) -> Result<Encoding> {
        self.0.encode(input, add_special_tokens)
    }

    pub fn encode_batch(&self, inputs: &[&str], add_special_tokens: bool) -> Result<Vec<Encoding>> {
        self.0.encode_batch(inputs, add_special_tokens)
    }

    pub fn decode(&self, token_ids: &[TokenIdType], skip_special_tokens: bool) -> Result<String> {
        self.0.decode(token_ids, skip_special_tokens)
    }

    pub fn vocab_size(&self) -> usize {
        self.0.vocab_size()
    }

    pub fn token_to_id(&self, token: &str) -> Option<TokenIdType> {
        self.0.token_to_id(token)
    }

    pub fn id_to_token(&self, id: TokenIdType) -> Option<String> {
        self.0.id_to_token(id)
    }
}

impl Decoder for Tokenizer {
    fn decode(&self, token_ids: &[TokenIdType], skip_special_tokens: bool) -> Result<String> {
        self.0.decode(token_ids, skip_special_tokens)
    }
}

impl Deref for Tokenizer {
    type Target = Arc<dyn traits::Tokenizer>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Arc<dyn traits::Tokenizer>> for Tokenizer {
    fn from(tokenizer: Arc<dyn traits::Tokenizer>) -> Self {
        Tokenizer(tokenizer)
    }
}
