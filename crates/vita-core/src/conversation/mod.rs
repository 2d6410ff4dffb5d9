//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: turn and prompt message types (`Turn`, `TurnRole`, `PromptMessage`, `MessageRole`)
//! - `history`: the append-only `HistoryLog` and the `HistoryWindow` used when rendering it
//! - `registry`: `SessionRegistry`, mapping session ids to their logs
//!
//! # Usage
//!
//! ```ignore
//! use vita_core::conversation::{HistoryLog, SessionRegistry, Turn};
//! ```

mod history;
mod message;
mod registry;

// Re-export public API
pub use history::{HistoryLog, HistoryWindow};
pub use message::{MessageRole, PromptMessage, Turn, TurnRole};
pub use registry::{DEFAULT_SESSION_ID, SessionRegistry};
