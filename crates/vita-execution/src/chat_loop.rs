//! The interactive read → retrieve → answer loop.

use std::io::Write;
use std::sync::Arc;
use vita_core::conversation::DEFAULT_SESSION_ID;
use vita_core::{ChatRunner, Result, Retriever, VitaError};

/// Prompt shown before each user line.
pub const USER_PROMPT: &str = "You: ";
/// Label printed before each reply.
pub const ASSISTANT_LABEL: &str = "Assistant:";
/// Inputs that end the conversation (compared case-insensitively).
pub const QUIT_COMMANDS: [&str; 2] = ["quit", "exit"];

/// Where user lines come from.
///
/// The loop owns its source and drops it when it stops, which releases the
/// underlying terminal or file.
pub trait LineSource {
    /// Blocks until a full line is available.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The line source reported end of input.
    EndOfInput,
    /// The user typed a quit command.
    Quit,
}

/// Summary of a finished conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub exit: LoopExit,
    /// Number of answered turns.
    pub turns: usize,
}

/// Top-level driver of a conversation.
pub struct ChatLoop {
    retriever: Arc<dyn Retriever>,
    runner: Arc<ChatRunner>,
    session_id: String,
    assistant_label: String,
}

impl ChatLoop {
    pub fn new(retriever: Arc<dyn Retriever>, runner: Arc<ChatRunner>) -> Self {
        Self {
            retriever,
            runner,
            session_id: DEFAULT_SESSION_ID.to_string(),
            assistant_label: ASSISTANT_LABEL.to_string(),
        }
    }

    /// Records the conversation under another session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Replaces the reply label, e.g. with a colored variant.
    pub fn with_assistant_label(mut self, label: impl Into<String>) -> Self {
        self.assistant_label = label.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Runs turns until end of input, a quit command, or the first error.
    ///
    /// Blank lines are skipped. Turns are processed strictly one after
    /// another: retrieval, model call and history update of one turn finish
    /// before the next line is read.
    ///
    /// # Errors
    ///
    /// Returns the first error from the line source, the retriever, the
    /// runner or the output, unchanged. Nothing is printed for the failed
    /// turn.
    pub async fn run<S, W>(&self, mut source: S, out: &mut W) -> Result<LoopSummary>
    where
        S: LineSource,
        W: Write,
    {
        let mut turns = 0;

        let exit = loop {
            let Some(line) = source.read_line(USER_PROMPT)? else {
                break LoopExit::EndOfInput;
            };
            let input = line.trim();

            if input.is_empty() {
                continue;
            }
            if is_quit_command(input) {
                break LoopExit::Quit;
            }

            let reply = match self.turn(input).await {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::error!(session_id = %self.session_id, turn = turns + 1, error = %err, "conversation aborted");
                    return Err(err);
                }
            };

            writeln!(out, "{} {}", self.assistant_label, reply)
                .and_then(|_| out.flush())
                .map_err(|err| VitaError::input_stream(format!("failed to write reply: {err}")))?;
            turns += 1;
        };

        tracing::info!(session_id = %self.session_id, turns, exit = ?exit, "conversation ended");
        Ok(LoopSummary { exit, turns })
    }

    async fn turn(&self, input: &str) -> Result<String> {
        let context = self.retriever.retrieve_context(input).await?;
        if context.is_empty() {
            tracing::debug!("no matching context; answering without it");
        }
        self.runner.invoke(&self.session_id, input, &context).await
    }
}

fn is_quit_command(input: &str) -> bool {
    QUIT_COMMANDS
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_commands() {
        assert!(is_quit_command("quit"));
        assert!(is_quit_command("EXIT"));
        assert!(!is_quit_command("quit now"));
        assert!(!is_quit_command("what should I eat?"));
    }
}
