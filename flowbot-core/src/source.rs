//! Inbound token abstraction.
//!
//! [`TokenSource`] is the pull side of an LLM token stream: ordered text
//! fragments until end of stream or failure. [`ChannelTokenSource`] adapts any
//! producer that pushes fragments through a channel, such as a spawned
//! completion task.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Ordered producer of text fragments. `Ok(None)` means the stream ended.
#[async_trait]
pub trait TokenSource: Send {
    async fn next_fragment(&mut self) -> anyhow::Result<Option<String>>;
}

/// Producer half of [`token_channel`]. Send `Ok(fragment)` per token, send an
/// `Err` to fail the stream, drop the sender to end it.
pub type TokenSender = mpsc::UnboundedSender<anyhow::Result<String>>;

/// [`TokenSource`] backed by an unbounded channel.
pub struct ChannelTokenSource {
    rx: mpsc::UnboundedReceiver<anyhow::Result<String>>,
}

/// Creates a channel-backed token source together with its producer handle.
pub fn token_channel() -> (TokenSender, ChannelTokenSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelTokenSource { rx })
}

#[async_trait]
impl TokenSource for ChannelTokenSource {
    async fn next_fragment(&mut self) -> anyhow::Result<Option<String>> {
        match self.rx.recv().await {
            Some(Ok(fragment)) => Ok(Some(fragment)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}
