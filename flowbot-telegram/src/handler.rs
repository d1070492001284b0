//! Streaming chat handler: every incoming text message gets one streamed reply.
//!
//! Messages are queued per chat and processed serially, so at most one live
//! streaming session edits a given chat at a time; different chats proceed
//! concurrently.
//!
//! **Data flow:** `enqueue` → per-chat queue → `process_queue_loop` consumes
//! queue → `process_message` (start session → spawn completion source →
//! `consume` → act on the session outcome).
//!
//! # Entry points (public API)
//!
//! - **[`StreamChatHandler`]** – Holds the chat sink, the LLM client, and the
//!   pacing settings shared by every session.
//! - **[`StreamChatHandler::enqueue`]** – Queues one message for its chat and
//!   returns immediately.

use std::sync::Arc;

use chrono::Utc;
use flowbot_core::{ChatSink, CoalescerConfig, SessionOutcome, StreamCoalescer};
use flowbot_llm::{spawn_reply_source, ChatMessage, LlmClient};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::types::IncomingMessage;

// ---------- User-facing messages (shown in Telegram) ----------
const MSG_REQUEST_FAILED: &str =
    "Sorry, something went wrong while processing your request. Please try again later.";

/// Sender to the per-chat processing queue.
type QueueSender = mpsc::UnboundedSender<IncomingMessage>;

// ---------- Handler (entry: StreamChatHandler, enqueue) ----------

/// **Entry point.** Streams an LLM reply into the chat for each incoming text
/// message. Incoming messages are queued per chat and processed serially.
pub struct StreamChatHandler {
    sink: Arc<dyn ChatSink>,
    llm: Arc<dyn LlmClient>,
    pacing: CoalescerConfig,
    message_queues: dashmap::DashMap<i64, QueueSender>,
}

impl StreamChatHandler {
    /// **Entry point.** Creates a handler from the sink, the LLM client, and
    /// the pacing settings applied to every streaming session.
    pub fn new(
        sink: Arc<dyn ChatSink>,
        llm: Arc<dyn LlmClient>,
        pacing: CoalescerConfig,
    ) -> Self {
        Self {
            sink,
            llm,
            pacing,
            message_queues: dashmap::DashMap::new(),
        }
    }

    /// **Entry point.** Queues `message` for its chat and returns immediately.
    #[instrument(skip(self, message))]
    pub fn enqueue(&self, message: IncomingMessage) {
        let chat_id = message.chat_id;
        info!(
            chat_id,
            user_id = message.user_id,
            text_len = message.text.len(),
            "Queuing message for streamed reply"
        );

        let tx = self
            .message_queues
            .entry(chat_id)
            .or_insert_with(|| self.get_or_create_queue(chat_id))
            .clone();

        if tx.send(message).is_err() {
            error!(chat_id, "Failed to send message to queue (receiver dropped)");
        }
    }

    fn get_or_create_queue(&self, chat_id: i64) -> QueueSender {
        let (tx, rx) = mpsc::unbounded_channel::<IncomingMessage>();
        let sink = self.sink.clone();
        let llm = self.llm.clone();
        let pacing = self.pacing.clone();
        tokio::spawn(Self::process_queue_loop(rx, sink, llm, pacing, chat_id));
        tx
    }

    /// Consumes items from the per-chat queue and processes each with
    /// [`Self::process_message`].
    async fn process_queue_loop(
        mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
        sink: Arc<dyn ChatSink>,
        llm: Arc<dyn LlmClient>,
        pacing: CoalescerConfig,
        chat_id: i64,
    ) {
        while let Some(message) = rx.recv().await {
            let waited_ms = (Utc::now() - message.received_at).num_milliseconds();
            info!(
                chat_id,
                user_id = message.user_id,
                waited_ms,
                "Processing queued message"
            );
            if let Err(e) = Self::process_message(&sink, &llm, &pacing, &message).await {
                error!(error = %e, chat_id, "Failed to process queued message");
            }
        }
    }

    /// 1) Start a streaming session; 2) spawn the completion source; 3) pump
    /// the source through the session; 4) act on the outcome.
    async fn process_message(
        sink: &Arc<dyn ChatSink>,
        llm: &Arc<dyn LlmClient>,
        pacing: &CoalescerConfig,
        message: &IncomingMessage,
    ) -> flowbot_core::Result<()> {
        let (session, outcome_rx) =
            StreamCoalescer::start(sink.clone(), message.chat_id, None, pacing.clone())?;

        let source = spawn_reply_source(
            llm.clone(),
            vec![ChatMessage::user(message.text.clone())],
        );
        let teardown = session.consume(source).await;

        match outcome_rx.await {
            Ok(SessionOutcome::Completed { text, message_id }) => {
                info!(
                    chat_id = message.chat_id,
                    reply_len = text.len(),
                    message_id = ?message_id,
                    "Reply delivered"
                );
            }
            Ok(SessionOutcome::Failed {
                error,
                partial,
                message_id,
            }) => {
                Self::log_error_chain(&error, "Completion stream failed");
                if message_id.is_none() {
                    // Nothing visible yet; tell the user instead of staying silent.
                    if let Err(e) = sink.send_message(message.chat_id, MSG_REQUEST_FAILED).await {
                        error!(error = %e, chat_id = message.chat_id, "Failed to send failure notice");
                    }
                } else {
                    info!(
                        chat_id = message.chat_id,
                        partial_len = partial.len(),
                        "Partial reply left in place after stream failure"
                    );
                }
            }
            Err(_) => {
                warn!(
                    chat_id = message.chat_id,
                    "Session ended without reporting an outcome"
                );
            }
        }

        teardown
    }

    fn log_error_chain(e: &anyhow::Error, first_msg: &str) {
        for (i, cause) in e.chain().enumerate() {
            if i == 0 {
                error!(cause = %cause, "{}", first_msg);
            } else {
                error!(cause = %cause, "Caused by");
            }
        }
    }
}
