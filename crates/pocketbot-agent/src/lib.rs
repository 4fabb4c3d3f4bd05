//! pocketbot-agent: the bounded conversation loop.
//!
//! Drives a single instruction through at most [`turn::MAX_TOOL_STEPS`]
//! request/response cycles against the LLM endpoint, dispatching tool calls
//! in between and delivering the final answer over the send-SMS tool path.

pub mod prompt;
pub mod turn;

pub use turn::{MAX_TOOL_STEPS, TurnContext, run_turn};
