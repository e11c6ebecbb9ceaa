//! Delivery callbacks held by a [`TextStreamer`](crate::TextStreamer).

use tokio::sync::mpsc;
use tracing::trace;

/// Receives each text fragment produced by an update.
pub type Sink = Box<dyn FnMut(&str) + Send>;

/// Receives the final text when the stream ends.
pub type EndSink = Box<dyn FnMut(&str) + Send>;

/// Events forwarded by [`channel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Text(String),
    End(String),
}

/// Sinks that forward everything into an unbounded tokio channel, for async
/// consumers such as SSE handlers. Sends never block; events are dropped once
/// the receiver is gone.
pub fn channel() -> (Sink, EndSink, mpsc::UnboundedReceiver<StreamEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let end_tx = tx.clone();

    let sink: Sink = Box::new(move |fragment: &str| {
        if tx.send(StreamEvent::Text(fragment.to_string())).is_err() {
            trace!("stream receiver dropped, discarding fragment");
        }
    });
    let end_sink: EndSink = Box::new(move |text: &str| {
        if end_tx.send(StreamEvent::End(text.to_string())).is_err() {
            trace!("stream receiver dropped, discarding final text");
        }
    });

    (sink, end_sink, rx)
}
