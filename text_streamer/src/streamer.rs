use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
    boundary::BoundaryPolicy,
    checkpoint::{recompute, Checkpoint, Recomputed, StreamState},
    config::{StreamMode, TextStreamerConfig},
    error::{StreamerError, StreamerResult},
    sink::{EndSink, Sink},
    traits::{Decoder, TokenIdType},
};

/// One sequence of a generation step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceOutput {
    /// The full output sequence so far, not just the newest tokens
    pub output_token_ids: Vec<TokenIdType>,
}

impl SequenceOutput {
    pub fn new(output_token_ids: impl Into<Vec<TokenIdType>>) -> Self {
        Self {
            output_token_ids: output_token_ids.into(),
        }
    }
}

impl From<Vec<TokenIdType>> for SequenceOutput {
    fn from(output_token_ids: Vec<TokenIdType>) -> Self {
        Self { output_token_ids }
    }
}

/// Interface a generation loop drives after every decoding step
pub trait Streamer {
    /// Feed the current generation state. `batch` holds one entry per sequence.
    fn update(&mut self, batch: &[SequenceOutput]) -> StreamerResult<()>;

    /// Close the stream and flush whatever is left.
    fn end(&mut self);
}

/// Streams decoded text to a sink as soon as it becomes available.
///
/// Each update re-decodes only the tokens after the last checkpoint, glues
/// the result onto the locked-in prefix and delivers whatever the consumer
/// has not seen yet. A checkpoint is taken whenever the boundary policy
/// accepts the fresh decode (by default: it ends with `. , ! ? ; :`).
///
/// Only batch size 1 is supported.
pub struct TextStreamer {
    decoder: Arc<dyn Decoder>,
    config: TextStreamerConfig,
    boundary: Box<dyn BoundaryPolicy>,
    prompt_tokens: Vec<TokenIdType>,
    prompt_consumed: bool,
    state: StreamState,
    on_stream: Option<Sink>,
    on_stream_end: Option<EndSink>,
}

impl std::fmt::Debug for TextStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStreamer")
            .field("decoder", &"Arc<dyn Decoder>")
            .field("config", &self.config)
            .field("prompt_tokens", &self.prompt_tokens.len())
            .field("prompt_consumed", &self.prompt_consumed)
            .field("state", &self.state)
            .field("on_stream", &self.on_stream.is_some())
            .field("on_stream_end", &self.on_stream_end.is_some())
            .finish()
    }
}

impl TextStreamer {
    pub fn new(decoder: Arc<dyn Decoder>, config: TextStreamerConfig) -> StreamerResult<Self> {
        Self::builder(decoder).config(config).build()
    }

    pub fn builder(decoder: Arc<dyn Decoder>) -> TextStreamerBuilder {
        TextStreamerBuilder::new(decoder)
    }

    /// Replace the prompt. With `skip_prompt` set, the next update seeds the
    /// stream from it again.
    pub fn set_prompt_tokens(&mut self, prompt_tokens: &[TokenIdType]) {
        self.prompt_tokens = prompt_tokens.to_vec();
        self.prompt_consumed = false;
    }

    pub fn set_on_stream(&mut self, sink: impl FnMut(&str) + Send + 'static) {
        self.on_stream = Some(Box::new(sink));
    }

    pub fn set_on_stream_end(&mut self, sink: impl FnMut(&str) + Send + 'static) {
        self.on_stream_end = Some(Box::new(sink));
    }

    pub fn config(&self) -> &TextStreamerConfig {
        &self.config
    }

    /// Text decoded so far
    pub fn text(&self) -> &str {
        self.state.text()
    }

    pub fn delivered_chars(&self) -> usize {
        self.state.delivered_chars()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.state.checkpoint()
    }

    pub fn prompt_consumed(&self) -> bool {
        self.prompt_consumed
    }

    fn consume_prompt(&mut self) -> StreamerResult<()> {
        let text = self.decoder.decode(&self.prompt_tokens, true)?;
        let token_index = self.prompt_tokens.len().saturating_sub(1);

        debug!(
            prompt_tokens = self.prompt_tokens.len(),
            prompt_chars = text.chars().count(),
            "Seeded text stream from prompt"
        );

        self.state = StreamState::seeded(text, token_index);
        self.prompt_consumed = true;
        Ok(())
    }
}

impl Streamer for TextStreamer {
    fn update(&mut self, batch: &[SequenceOutput]) -> StreamerResult<()> {
        let [sequence] = batch else {
            return Err(StreamerError::UnsupportedBatchSize { got: batch.len() });
        };

        if self.config.skip_prompt && !self.prompt_consumed {
            return self.consume_prompt();
        }

        let output = &sequence.output_token_ids;
        let pending = self.state.pending_tokens(output);
        if pending.is_empty() {
            trace!(tokens = output.len(), "No new tokens since checkpoint");
            return Ok(());
        }

        let decoded = self.decoder.decode(pending, true)?;
        let Recomputed {
            text,
            fragment,
            lock,
            rewrote_delivered,
        } = recompute(&self.state, &decoded, self.boundary.as_ref());

        // Nothing changed: no delivery, but a boundary still moves the checkpoint.
        if text == self.state.text() {
            trace!(tokens = output.len(), "Re-decode produced identical text");
            if lock {
                self.state.apply(text, true, output.len());
                debug!(
                    token_index = self.state.checkpoint().token_index,
                    "Locked in stream checkpoint without new text"
                );
            }
            return Ok(());
        }

        if rewrote_delivered {
            warn!(
                delivered_chars = self.state.delivered_chars(),
                "Re-decode changed text that was already delivered"
            );
        }

        self.state.apply(text, lock, output.len());

        trace!(
            pending_tokens = pending.len(),
            fragment_chars = fragment.chars().count(),
            "Decoded stream update"
        );
        if lock {
            debug!(
                token_index = self.state.checkpoint().token_index,
                text_chars = self.state.checkpoint().text_chars,
                "Locked in stream checkpoint"
            );
        }

        if let Some(sink) = self.on_stream.as_mut() {
            match self.config.mode {
                StreamMode::Incremental => sink(&fragment),
                StreamMode::Cumulative => sink(self.state.text()),
            }
        }

        Ok(())
    }

    fn end(&mut self) {
        let text = self.state.reset();
        debug!(text_chars = text.chars().count(), "Text stream ended");

        if let Some(sink) = self.on_stream_end.as_mut() {
            sink(&text);
        }
    }
}

/// Builder for [`TextStreamer`]
pub struct TextStreamerBuilder {
    decoder: Arc<dyn Decoder>,
    config: TextStreamerConfig,
    boundary: Option<Box<dyn BoundaryPolicy>>,
    prompt_tokens: Vec<TokenIdType>,
    on_stream: Option<Sink>,
    on_stream_end: Option<EndSink>,
}

impl TextStreamerBuilder {
    pub fn new(decoder: Arc<dyn Decoder>) -> Self {
        Self {
            decoder,
            config: TextStreamerConfig::default(),
            boundary: None,
            prompt_tokens: Vec::new(),
            on_stream: None,
            on_stream_end: None,
        }
    }

    pub fn config(mut self, config: TextStreamerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn skip_prompt(mut self, skip_prompt: bool) -> Self {
        self.config.skip_prompt = skip_prompt;
        self
    }

    pub fn mode(mut self, mode: StreamMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Use a custom policy instead of the one described by the config.
    pub fn boundary_policy(mut self, policy: impl BoundaryPolicy + 'static) -> Self {
        self.boundary = Some(Box::new(policy));
        self
    }

    pub fn prompt_tokens(mut self, prompt_tokens: &[TokenIdType]) -> Self {
        self.prompt_tokens = prompt_tokens.to_vec();
        self
    }

    pub fn on_stream(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_stream = Some(Box::new(sink));
        self
    }

    pub fn on_stream_end(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_stream_end = Some(Box::new(sink));
        self
    }

    /// Attach boxed sinks, e.g. the pair returned by [`crate::sink::channel`].
    pub fn sinks(mut self, sink: Sink, end_sink: EndSink) -> Self {
        self.on_stream = Some(sink);
        self.on_stream_end = Some(end_sink);
        self
    }

    pub fn build(self) -> StreamerResult<TextStreamer> {
        let boundary = match self.boundary {
            Some(policy) => policy,
            None => self.config.boundary.build()?,
        };

        Ok(TextStreamer {
            decoder: self.decoder,
            config: self.config,
            boundary,
            prompt_tokens: self.prompt_tokens,
            prompt_consumed: false,
            state: StreamState::new(),
            on_stream: self.on_stream,
            on_stream_end: self.on_stream_end,
        })
    }
}
