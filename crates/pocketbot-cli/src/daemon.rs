//! The agent polling loop.
//!
//! Single-threaded cooperative schedule: once per tick, one scheduler due
//! pass, one inbox check, and — when an instruction arrived — one full
//! conversation turn before the next tick. Nothing in here is allowed to
//! take the process down; failures degrade to "no effect this tick".

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pocketbot_agent::{TurnContext, run_turn};
use pocketbot_channel_sms::SmsChannel;
use pocketbot_config::BotConfig;
use pocketbot_llm::{LlmBackend, LlmClient};
use pocketbot_memory::history::HistoryLog;
use pocketbot_memory::{MemoryDoc, MemoryStore};
use pocketbot_sched::scheduler::Scheduler;
use pocketbot_sched::store::TaskStore;
use pocketbot_store::{DataDir, StateDoc, StateStore};
use pocketbot_tools::{CommandGateway, TermuxGateway, ToolContext, create_registry};
use pocketbot_types::HistoryEntry;

pub async fn run(config: BotConfig) -> anyhow::Result<()> {
    if !config.onboarding.completed {
        warn!("Onboarding has not been completed; run `pocketbot onboard` to configure the agent");
    }
    let owner = config.user.phone_number.clone();
    if owner.is_empty() {
        warn!("No owner phone number configured; inbound messages cannot be matched");
    }

    let data_dir = DataDir::new(config.data_dir()?);
    data_dir.ensure(&data_dir.state_file(), &StateDoc::default())?;
    data_dir.ensure(&data_dir.tasks_file(), &Vec::<pocketbot_sched::Task>::new())?;
    data_dir.ensure(&data_dir.history_file(), &Vec::<HistoryEntry>::new())?;
    data_dir.ensure(&data_dir.memory_file(), &MemoryDoc::default_for(&owner))?;

    let gateway: Arc<dyn CommandGateway> = Arc::new(TermuxGateway);
    let memory = Arc::new(MemoryStore::new(data_dir.memory_file(), owner.clone()));
    let scheduler = Arc::new(Scheduler::new(TaskStore::new(data_dir.tasks_file())));
    scheduler.load().await;

    let tools = Arc::new(create_registry(Arc::new(ToolContext {
        gateway: gateway.clone(),
        memory: memory.clone(),
        scheduler: scheduler.clone(),
        owner_number: owner.clone(),
    })));
    let llm: Arc<dyn LlmBackend> = Arc::new(LlmClient::new(config.llm.clone())?);
    let channel = SmsChannel::new(
        gateway,
        StateStore::new(data_dir.state_file()),
        memory.clone(),
        owner,
    );
    let turn_ctx = TurnContext {
        llm,
        tools: tools.clone(),
        memory,
        history: HistoryLog::new(data_dir.history_file()),
    };

    info!("pocketbot waking up, resetting the inbox cursor");
    channel.sync_inbox().await;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let mut tick = tokio::time::interval(Duration::from_secs(config.agent.poll_interval_secs.max(1)));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutting down");
                break;
            }
            _ = tick.tick() => {
                scheduler.run_due_pass(Utc::now(), tools.as_ref()).await;
                if let Some(instruction) = channel.poll().await {
                    info!("Processing: {instruction}");
                    run_turn(&instruction, &turn_ctx).await;
                }
            }
        }
    }

    Ok(())
}
