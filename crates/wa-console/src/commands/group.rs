//! Group command - group settings, membership and lookups.

use crate::commands::{fill_recipient, unknown_action, CommandHandler};
use crate::error::{AppError, AppResult};
use crate::input::CommandLine;
use crate::session::Session;
use async_trait::async_trait;
use recipient_actions::forms::{
    Decision, GroupInfoFromLinkForm, GroupLookup, GroupLookupForm, GroupNameForm, GroupSetting,
    GroupSettingForm, InviteLinkForm, LeaveGroupForm, ParticipantDecisionForm,
};
use recipient_actions::{
    ActionForm, RecipientKind, RecipientSelector, SubmissionController, Table,
};
use std::sync::Arc;

pub struct GroupHandler {
    session: Arc<Session>,
    controller: SubmissionController,
}

impl GroupHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            controller: session.controller(),
            session,
        }
    }

    async fn list(&self) -> AppResult<String> {
        let groups = self.session.client().await.groups().await?;

        let mut table = Table::new(["Group", "Name", "Members", "Admins"]);
        for group in &groups {
            let admins = group.participants.iter().filter(|p| p.is_admin).count();
            table.push([
                group.jid.clone(),
                group.name.clone(),
                group.participants.len().to_string(),
                admins.to_string(),
            ]);
        }
        Ok(self.session.presenter().table(&table))
    }

    /// Link to the server-generated participant CSV.
    async fn export(&self, line: &CommandLine) -> AppResult<String> {
        let mut selector = RecipientSelector::only(RecipientKind::Group);
        selector.set_local_part(line.get_or_default("to"));
        let group = selector.resolve()?;

        let url = self
            .session
            .client()
            .await
            .participants_export_url(&group.canonical());
        Ok(self
            .session
            .success(format!("Participants CSV for {}: {}", group, url)))
    }

    fn form(&self, line: &CommandLine) -> AppResult<Box<dyn ActionForm>> {
        let mut form: Box<dyn ActionForm> = match line.action() {
            "name" => {
                let mut form = GroupNameForm::default();
                form.name = line.get_or_default("name");
                Box::new(form)
            }
            action @ ("announce" | "locked") => {
                let setting: GroupSetting = action.parse().map_err(AppError::Usage)?;
                let mut form = GroupSettingForm::new(setting);
                form.enabled = line.flag("enabled", true)?;
                Box::new(form)
            }
            "leave" => Box::new(LeaveGroupForm::default()),
            "invite-link" => {
                let mut form = InviteLinkForm::default();
                form.reset_link = line.flag("reset", false)?;
                Box::new(form)
            }
            "info" => Box::new(GroupLookupForm::new(GroupLookup::Info)),
            "requests" => Box::new(GroupLookupForm::new(GroupLookup::ParticipantRequests)),
            "info-from-link" => {
                let mut form = GroupInfoFromLinkForm::default();
                form.link = line.get_or_default("link");
                Box::new(form)
            }
            action @ ("approve" | "reject") => {
                let decision: Decision = action.parse().map_err(AppError::Usage)?;
                let mut form = ParticipantDecisionForm::new(decision);
                form.participants = line.all("participants");
                Box::new(form)
            }
            other => return Err(unknown_action("group", other)),
        };

        if form.recipient().is_some() {
            fill_recipient(form.as_mut(), line)?;
        }
        Ok(form)
    }
}

#[async_trait]
impl CommandHandler for GroupHandler {
    fn name(&self) -> &str {
        "group"
    }

    async fn execute(&self, line: &CommandLine) -> AppResult<String> {
        match line.action() {
            "list" => self.list().await,
            "export" => self.export(line).await,
            _ => {
                let mut form = self.form(line)?;
                Ok(self.session.submit(&self.controller, form.as_mut()).await)
            }
        }
    }
}
