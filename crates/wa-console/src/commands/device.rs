//! Device command - list, select, create and delete device slots.

use crate::commands::{unknown_action, CommandHandler};
use crate::error::AppResult;
use crate::input::CommandLine;
use crate::session::Session;
use async_trait::async_trait;
use bridge_client::DeviceState;
use recipient_actions::{DeviceContext, Table};
use std::sync::Arc;
use tracing::info;

pub struct DeviceHandler {
    session: Arc<Session>,
}

impl DeviceHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    fn render(&self, context: &DeviceContext) -> String {
        let mut table = Table::new(["", "Device", "JID", "State"]);
        for device in context.devices() {
            let marker = if context.current_id() == Some(device.id.as_str()) {
                "*"
            } else {
                ""
            };
            table.push([
                marker.to_string(),
                device.id.clone(),
                device.jid.clone().unwrap_or_default(),
                state_label(device.state).to_string(),
            ]);
        }
        self.session.presenter().table(&table)
    }
}

fn state_label(state: DeviceState) -> &'static str {
    match state {
        DeviceState::LoggedIn => "logged in",
        DeviceState::LoggedOut => "logged out",
        DeviceState::Connected => "connected",
        DeviceState::Disconnected => "disconnected",
        DeviceState::Unknown => "unknown",
    }
}

#[async_trait]
impl CommandHandler for DeviceHandler {
    fn name(&self) -> &str {
        "device"
    }

    async fn execute(&self, line: &CommandLine) -> AppResult<String> {
        let mut context = self.session.devices().await;
        match line.action() {
            "list" | "" => {
                context.refresh().await?;
                Ok(self.render(&context))
            }
            "use" => {
                let id = line.require("id")?;
                if context.devices().is_empty() {
                    context.refresh().await?;
                }
                context.select(id)?;
                info!(device = id, "Device selected");
                Ok(self.session.success(format!("Using device {}", id)))
            }
            "create" => {
                let created = context.create(line.get("id")).await?;
                let message = match created {
                    Some(id) => format!("Device {} created, use app login to pair it", id),
                    None => "Device created".to_string(),
                };
                Ok(format!(
                    "{}\n{}",
                    self.session.success(message),
                    self.render(&context)
                ))
            }
            "delete" => {
                let id = line.require("id")?.to_string();
                let message = context.delete(&id).await?;
                Ok(self.session.success(message))
            }
            other => Err(unknown_action("device", other)),
        }
    }
}
