//! Stream coalescer: turns an unpredictably paced token stream into
//! rate-limited sends and edits of one chat message, with typing notifications
//! while nothing is visible yet.
//!
//! One [`StreamCoalescer`] drives one outgoing reply. All mutable session state
//! lives on a background task fed through a channel, so pushing a token never
//! blocks and every sink call is serialized.
//!
//! # Entry points
//!
//! - **[`StreamCoalescer::start`]** - Validates the config and spawns the
//!   session task.
//! - **[`StreamCoalescer::on_token`]** - Queues one text fragment.
//! - **[`StreamCoalescer::on_stream_end`]** / **[`StreamCoalescer::on_stream_error`]** -
//!   Finalize the session: timers stop, the remaining text is flushed, the
//!   outcome is delivered.
//! - **[`StreamCoalescer::consume`]** - Pull-model driver for a [`TokenSource`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::CoalescerConfig;
use crate::error::{CoalescerError, Result};
use crate::sink::ChatSink;
use crate::source::TokenSource;

/// Terminal report for one streamed reply, delivered on the channel returned
/// by [`StreamCoalescer::start`].
#[derive(Debug)]
pub enum SessionOutcome {
    /// The stream ended normally. `text` is the full reply; `message_id` is
    /// the visible message, if any text was ever dispatched.
    Completed {
        text: String,
        message_id: Option<String>,
    },
    /// The stream failed. Whatever text arrived before the failure was flushed
    /// and stays visible as a partial answer.
    Failed {
        error: anyhow::Error,
        partial: String,
        message_id: Option<String>,
    },
}

enum SessionMsg {
    Token(String),
    End,
    Error(anyhow::Error),
}

/// Handle for one streaming reply session.
pub struct StreamCoalescer {
    tx: mpsc::UnboundedSender<SessionMsg>,
    chat_id: i64,
    task: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl StreamCoalescer {
    /// Validates `config` and starts a session for one reply in `chat_id`.
    ///
    /// `target_message` is the id of an already-sent message to edit in place
    /// (a placeholder flow); with `None` the first flush sends a new message.
    /// Returns the handle plus a receiver that resolves to the terminal
    /// [`SessionOutcome`].
    pub fn start(
        sink: Arc<dyn ChatSink>,
        chat_id: i64,
        target_message: Option<String>,
        config: CoalescerConfig,
    ) -> Result<(Self, oneshot::Receiver<SessionOutcome>)> {
        config.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let session = Session {
            sink,
            chat_id,
            config,
            buffer: String::new(),
            tokens_received: 0,
            message_id: target_message,
            last_sent: String::new(),
            dispatched: false,
        };
        let task = tokio::spawn(session.run(rx, outcome_tx));
        let coalescer = Self {
            tx,
            chat_id,
            task: Mutex::new(Some(task)),
        };
        Ok((coalescer, outcome_rx))
    }

    /// Queues one text fragment. Never blocks; fragments arriving after
    /// finalization are dropped.
    pub fn on_token(&self, token: impl Into<String>) {
        if self.tx.send(SessionMsg::Token(token.into())).is_err() {
            debug!(
                chat_id = self.chat_id,
                "Dropping token pushed after finalization"
            );
        }
    }

    /// Marks the stream complete: the typing loop stops, the remaining text is
    /// flushed, the edit loop stops. Idempotent. Returns `Err` only when the
    /// final flush failed; teardown completes either way.
    pub async fn on_stream_end(&self) -> Result<()> {
        let _ = self.tx.send(SessionMsg::End);
        self.join_session().await
    }

    /// Finalizes after an upstream failure: the same teardown as
    /// [`on_stream_end`](Self::on_stream_end), with a best-effort flush of the
    /// partial text. `error` is reported through the outcome channel.
    pub async fn on_stream_error(&self, error: anyhow::Error) -> Result<()> {
        let _ = self.tx.send(SessionMsg::Error(error));
        self.join_session().await
    }

    /// Pull-model driver: drains `source` into this session. Every fragment
    /// becomes [`on_token`](Self::on_token); end of stream or a source error
    /// finalizes the session.
    pub async fn consume<S: TokenSource>(&self, mut source: S) -> Result<()> {
        loop {
            match source.next_fragment().await {
                Ok(Some(fragment)) => self.on_token(fragment),
                Ok(None) => return self.on_stream_end().await,
                Err(e) => return self.on_stream_error(e).await,
            }
        }
    }

    /// Waits for the session task. Taking the handle out of the slot makes
    /// finalization idempotent: later calls find nothing to await.
    async fn join_session(&self) -> Result<()> {
        let task = match self.task.lock().await.take() {
            Some(task) => task,
            None => return Ok(()),
        };
        match task.await {
            Ok(result) => result,
            Err(e) => Err(CoalescerError::Session(e.to_string())),
        }
    }
}

/// Mutable state for one reply, owned by the session task.
struct Session {
    sink: Arc<dyn ChatSink>,
    chat_id: i64,
    config: CoalescerConfig,
    buffer: String,
    tokens_received: u64,
    message_id: Option<String>,
    last_sent: String,
    /// True once a send or edit succeeded. Gates the typing loop.
    dispatched: bool,
}

impl Session {
    /// Consumes session messages and timer ticks until finalization, then runs
    /// [`finish`](Self::finish). A returned error is the final-flush failure.
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<SessionMsg>,
        outcome_tx: oneshot::Sender<SessionOutcome>,
    ) -> Result<()> {
        let mut edit_tick = interval(self.config.edit_interval);
        edit_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut typing_tick = interval(self.config.typing_interval);
        typing_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Closing the channel without an explicit End (handle dropped) also
        // lands in the None arm, so an abandoned session still flushes.
        let failure = loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(SessionMsg::Token(token)) => self.apply_token(token).await,
                    Some(SessionMsg::Error(e)) => break Some(e),
                    Some(SessionMsg::End) | None => break None,
                },
                _ = edit_tick.tick() => {
                    if let Err(e) = self.flush().await {
                        warn!(
                            chat_id = self.chat_id,
                            error = %e,
                            "Periodic flush failed, retrying on the next tick"
                        );
                    }
                }
                _ = typing_tick.tick(), if self.typing_active() => {
                    self.send_typing_ping().await;
                }
            }
        };

        self.finish(failure, outcome_tx).await
    }

    fn typing_active(&self) -> bool {
        !self.dispatched
            && self.tokens_received < u64::from(self.config.first_token_threshold)
    }

    /// Appends one fragment. Once the threshold is reached and no message
    /// exists yet, flushes immediately instead of waiting for the next tick;
    /// the check repeats on every later token until the first send lands.
    async fn apply_token(&mut self, token: String) {
        self.buffer.push_str(&token);
        self.tokens_received += 1;
        if self.tokens_received >= u64::from(self.config.first_token_threshold)
            && self.message_id.is_none()
        {
            if let Err(e) = self.flush().await {
                warn!(
                    chat_id = self.chat_id,
                    error = %e,
                    "First send failed, retrying on the next token or tick"
                );
            }
        }
    }

    /// Brings the visible message up to date with the buffer. The first
    /// dispatch sends a new message, later ones edit it; blank or unchanged
    /// text is skipped without a sink call.
    async fn flush(&mut self) -> Result<()> {
        if self.buffer.trim().is_empty() {
            return Ok(());
        }
        if self.buffer == self.last_sent {
            return Ok(());
        }
        let text = self.buffer.clone();
        match &self.message_id {
            None => {
                let id = self.sink.send_message(self.chat_id, &text).await?;
                debug!(
                    chat_id = self.chat_id,
                    message_id = %id,
                    chars = text.len(),
                    "Sent first chunk"
                );
                self.message_id = Some(id);
            }
            Some(id) => {
                self.sink.edit_message(self.chat_id, id, &text).await?;
                debug!(
                    chat_id = self.chat_id,
                    message_id = %id,
                    chars = text.len(),
                    "Edited message"
                );
            }
        }
        self.last_sent = text;
        self.dispatched = true;
        Ok(())
    }

    async fn send_typing_ping(&self) {
        if let Err(e) = self.sink.send_typing(self.chat_id).await {
            warn!(chat_id = self.chat_id, error = %e, "Typing notification failed");
        }
    }

    /// Final flush plus the outcome report. Always completes; a flush failure
    /// becomes the returned [`CoalescerError::Teardown`].
    async fn finish(
        mut self,
        failure: Option<anyhow::Error>,
        outcome_tx: oneshot::Sender<SessionOutcome>,
    ) -> Result<()> {
        let flush_result = self
            .flush()
            .await
            .map_err(|e| CoalescerError::Teardown(e.to_string()));
        if let Err(ref e) = flush_result {
            error!(chat_id = self.chat_id, error = %e, "Final flush failed");
        }

        let outcome = match failure {
            None => {
                info!(
                    chat_id = self.chat_id,
                    tokens = self.tokens_received,
                    chars = self.buffer.len(),
                    "Stream complete"
                );
                SessionOutcome::Completed {
                    text: self.buffer,
                    message_id: self.message_id,
                }
            }
            Some(error) => {
                error!(
                    chat_id = self.chat_id,
                    error = %error,
                    tokens = self.tokens_received,
                    "Stream failed, partial text left in place"
                );
                SessionOutcome::Failed {
                    error,
                    partial: self.buffer,
                    message_id: self.message_id,
                }
            }
        };
        let _ = outcome_tx.send(outcome);
        flush_result
    }
}
