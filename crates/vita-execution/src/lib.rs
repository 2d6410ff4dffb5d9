pub mod chat_loop;
pub mod logging;

pub use chat_loop::{ChatLoop, LineSource, LoopExit, LoopSummary};
pub use logging::init_logging;
