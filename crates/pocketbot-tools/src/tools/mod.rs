//! Tool implementations.
//!
//! Each tool implements `DeviceTool` and declares its argument schema in a
//! `ToolSpec`; the schemas go to the LLM endpoint verbatim.

pub mod camera;
pub mod clipboard;
pub mod device_info;
pub mod files;
pub mod memory;
pub mod sms;
pub mod tasks;

use std::sync::Arc;

use crate::{DeviceTool, ToolContext};

/// Create the full tool catalog in its canonical order.
pub fn create_device_tools(ctx: Arc<ToolContext>) -> Vec<Arc<dyn DeviceTool>> {
    vec![
        Arc::new(device_info::DeviceQueryTool::battery(ctx.clone())),
        Arc::new(device_info::DeviceQueryTool::wifi(ctx.clone())),
        Arc::new(device_info::DeviceQueryTool::location(ctx.clone())),
        Arc::new(device_info::DeviceQueryTool::device_info(ctx.clone())),
        Arc::new(device_info::DeviceQueryTool::clipboard(ctx.clone())),
        Arc::new(clipboard::SetClipboardTool::new(ctx.clone())),
        Arc::new(sms::SendSmsTool::new(ctx.clone())),
        Arc::new(sms::SendMmsTool::new(ctx.clone())),
        Arc::new(camera::TakePhotoTool::new(ctx.clone())),
        Arc::new(files::ListFilesTool::new(ctx.clone())),
        Arc::new(files::ReadFileTool::new(ctx.clone())),
        Arc::new(tasks::ScheduleTaskTool::new(ctx.clone())),
        Arc::new(tasks::ListTasksTool::new(ctx.clone())),
        Arc::new(tasks::CancelTaskTool::new(ctx.clone())),
        Arc::new(memory::UpdateMemoryTool::new(ctx.clone())),
        Arc::new(memory::AddOrUpdateContactTool::new(ctx.clone())),
        Arc::new(memory::UpdateShortTermMemoryTool::new(ctx)),
    ]
}
