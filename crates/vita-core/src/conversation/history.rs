//! Append-only conversation history.

use super::message::Turn;
use serde::{Deserialize, Serialize};

/// How much of a history log is rendered into a prompt.
///
/// The log itself is never shortened; the window only limits what the model
/// sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "turns")]
pub enum HistoryWindow {
    /// Every turn since the session started.
    #[default]
    Unbounded,
    /// Only the most recent `n` turns.
    LastTurns(usize),
}

impl HistoryWindow {
    /// Returns the suffix of `turns` that falls inside the window.
    pub fn apply<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        match *self {
            Self::Unbounded => turns,
            Self::LastTurns(n) => &turns[turns.len().saturating_sub(n)..],
        }
    }
}

impl From<Option<usize>> for HistoryWindow {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Unbounded, Self::LastTurns)
    }
}

/// Ordered log of the turns exchanged in one session.
///
/// Turns only ever enter the log in complete user/assistant pairs, so the log
/// always alternates and always has an even length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    turns: Vec<Turn>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one completed exchange: the user's input followed by the reply.
    pub fn record_exchange(&mut self, input: impl Into<String>, reply: impl Into<String>) {
        self.turns.reserve(2);
        self.turns.push(Turn::user(input));
        self.turns.push(Turn::assistant(reply));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::message::TurnRole;

    fn log_with(exchanges: usize) -> HistoryLog {
        let mut log = HistoryLog::new();
        for i in 0..exchanges {
            log.record_exchange(format!("q{i}"), format!("a{i}"));
        }
        log
    }

    #[test]
    fn test_record_exchange_alternates() {
        let log = log_with(3);
        assert_eq!(log.len(), 6);
        for (i, turn) in log.turns().iter().enumerate() {
            let expected = if i % 2 == 0 { TurnRole::User } else { TurnRole::Assistant };
            assert_eq!(turn.role(), expected);
        }
        assert_eq!(log.turns()[4].text(), "q2");
        assert_eq!(log.turns()[5].text(), "a2");
    }

    #[test]
    fn test_unbounded_window_keeps_everything() {
        let log = log_with(4);
        assert_eq!(HistoryWindow::Unbounded.apply(log.turns()).len(), 8);
    }

    #[test]
    fn test_last_turns_window_keeps_suffix() {
        let log = log_with(4);
        let visible = HistoryWindow::LastTurns(3).apply(log.turns());
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[0].text(), "a2");
        assert_eq!(visible[2].text(), "a3");
    }

    #[test]
    fn test_window_larger_than_log() {
        let log = log_with(1);
        assert_eq!(HistoryWindow::LastTurns(10).apply(log.turns()).len(), 2);
        assert!(HistoryWindow::LastTurns(0).apply(log.turns()).is_empty());
    }

    #[test]
    fn test_window_from_option() {
        assert_eq!(HistoryWindow::from(None), HistoryWindow::Unbounded);
        assert_eq!(HistoryWindow::from(Some(6)), HistoryWindow::LastTurns(6));
    }
}
