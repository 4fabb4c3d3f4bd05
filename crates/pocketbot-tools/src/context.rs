//! Shared state available to tools.

use std::sync::Arc;

use pocketbot_memory::MemoryStore;
use pocketbot_sched::scheduler::Scheduler;

use crate::gateway::CommandGateway;

/// Passed to tools at construction time so they can reach the device, the
/// memory document and the scheduler.
pub struct ToolContext {
    pub gateway: Arc<dyn CommandGateway>,
    pub memory: Arc<MemoryStore>,
    pub scheduler: Arc<Scheduler>,
    /// Default recipient for messaging tools.
    pub owner_number: String,
}
