//! Bridge from a streamed completion to a [`flowbot_core::TokenSource`].

use std::sync::Arc;

use flowbot_core::{token_channel, ChannelTokenSource};
use tracing::debug;

use crate::{ChatMessage, LlmClient, StreamChunk, StreamChunkCallback};

/// Spawns the streamed completion for `messages` on a background task and
/// returns a token source yielding its content deltas.
///
/// The source ends when the completion finishes; a completion error arrives
/// as the source's error after any fragments already produced.
pub fn spawn_reply_source(
    client: Arc<dyn LlmClient>,
    messages: Vec<ChatMessage>,
) -> ChannelTokenSource {
    let (tx, source) = token_channel();
    tokio::spawn(async move {
        let push = tx.clone();
        let mut callback: Box<StreamChunkCallback> = Box::new(move |chunk: StreamChunk| {
            let push = push.clone();
            Box::pin(async move {
                if !chunk.content.is_empty() {
                    let _ = push.send(Ok(chunk.content));
                }
                Ok(())
            })
        });

        match client.stream_reply(messages, callback.as_mut()).await {
            Ok(full) => debug!(chars = full.len(), "Completion stream finished"),
            Err(e) => {
                let _ = tx.send(Err(e));
            }
        }
        // tx and the callback's clone drop here, ending the source.
    });
    source
}
