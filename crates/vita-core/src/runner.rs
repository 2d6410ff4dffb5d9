use crate::conversation::SessionRegistry;
use crate::error::Result;
use crate::prompt::PromptTemplate;
use crate::provider::Completer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Whether the runner currently has a model call in flight, in any session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerState {
    /// No call in flight.
    Idle,
    /// A request has been sent and the reply is pending.
    AwaitingModel,
}

/// Runs one chat turn against a session's history.
///
/// `ChatRunner` is responsible for:
/// - Rendering the prompt from the retrieved context and the session history
/// - Calling the chat model
/// - Recording the exchange, and only when the call succeeded
pub struct ChatRunner {
    completer: Arc<dyn Completer>,
    template: PromptTemplate,
    sessions: Arc<SessionRegistry>,
    in_flight: Arc<AtomicUsize>,
}

/// Counts one model call for as long as it lives, including when the
/// invoking future is dropped mid-call.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChatRunner {
    /// Creates a runner that records conversations in `sessions`.
    pub fn new(
        completer: Arc<dyn Completer>,
        template: PromptTemplate,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            completer,
            template,
            sessions,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// `AwaitingModel` while at least one session waits for a reply.
    pub fn state(&self) -> RunnerState {
        match self.in_flight.load(Ordering::SeqCst) {
            0 => RunnerState::Idle,
            _ => RunnerState::AwaitingModel,
        }
    }

    /// Answers `input` in `session_id` using `context` as retrieved knowledge.
    ///
    /// The session is created on first use. Its history lock is held for the
    /// whole call, so two invocations on one session never interleave.
    ///
    /// # Errors
    ///
    /// Returns the completer's error unchanged. The history is left exactly
    /// as it was before the call.
    pub async fn invoke(&self, session_id: &str, input: &str, context: &str) -> Result<String> {
        let log = self.sessions.get_or_create(session_id).await;
        let mut history = log.lock().await;

        let messages = self.template.render(context, history.turns(), input)?;

        let started = Instant::now();
        let outcome = {
            let _in_flight = InFlight::enter(&self.in_flight);
            self.completer.complete(&messages).await
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "chat completion failed");
                return Err(err);
            }
        };

        tracing::debug!(
            session_id,
            prompt_messages = messages.len(),
            reply_chars = reply.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat turn completed"
        );

        history.record_exchange(input, reply.clone());
        Ok(reply)
    }
}
