//! Send command - one action per message type.

use crate::commands::{
    fill_attachment, fill_recipient, fill_send_options, unknown_action, CommandHandler,
};
use crate::error::{AppError, AppResult};
use crate::input::CommandLine;
use crate::session::Session;
use async_trait::async_trait;
use recipient_actions::forms::{
    AudioForm, ChatPresenceForm, ContactForm, FileForm, LinkForm, MessageForm, PollForm,
    PresenceForm, StickerForm, VisualMediaForm,
};
use recipient_actions::{ActionForm, SubmissionController};
use std::sync::Arc;

pub struct SendHandler {
    session: Arc<Session>,
    controller: SubmissionController,
}

impl SendHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            controller: session.controller(),
            session,
        }
    }

    /// Build the form named by the action from the command line.
    async fn form(&self, line: &CommandLine) -> AppResult<Box<dyn ActionForm>> {
        let form: Box<dyn ActionForm> = match line.action() {
            "message" | "text" => {
                let mut form = MessageForm::default();
                fill_recipient(&mut form, line)?;
                form.message = line.get_or_default("message");
                fill_send_options(&mut form.options, line)?;
                Box::new(form)
            }
            action @ ("image" | "video") => {
                let mut form = if action == "image" {
                    VisualMediaForm::image()
                } else {
                    VisualMediaForm::video()
                };
                fill_recipient(&mut form, line)?;
                form.caption = line.get_or_default("caption");
                form.view_once = line.flag("view_once", false)?;
                form.compress = line.flag("compress", false)?;
                fill_send_options(&mut form.options, line)?;
                fill_attachment(&mut form.attachment, line).await?;
                Box::new(form)
            }
            "audio" => {
                let mut form = AudioForm::default();
                fill_recipient(&mut form, line)?;
                form.ptt = line.flag("ptt", false)?;
                fill_send_options(&mut form.options, line)?;
                fill_attachment(&mut form.attachment, line).await?;
                Box::new(form)
            }
            "file" | "document" => {
                let mut form = FileForm::default();
                fill_recipient(&mut form, line)?;
                form.caption = line.get_or_default("caption");
                fill_send_options(&mut form.options, line)?;
                fill_attachment(&mut form.attachment, line).await?;
                Box::new(form)
            }
            "sticker" => {
                let mut form = StickerForm::default();
                fill_recipient(&mut form, line)?;
                fill_send_options(&mut form.options, line)?;
                fill_attachment(&mut form.attachment, line).await?;
                Box::new(form)
            }
            "contact" => {
                let mut form = ContactForm::default();
                fill_recipient(&mut form, line)?;
                form.contact_name = line.get_or_default("name");
                form.contact_phone = line.get_or_default("phone");
                fill_send_options(&mut form.options, line)?;
                Box::new(form)
            }
            "link" => {
                let mut form = LinkForm::default();
                fill_recipient(&mut form, line)?;
                form.link = line.get_or_default("link");
                form.caption = line.get_or_default("caption");
                fill_send_options(&mut form.options, line)?;
                Box::new(form)
            }
            "poll" => {
                let mut form = PollForm::default();
                fill_recipient(&mut form, line)?;
                form.question = line.get_or_default("question");
                form.options = line.all("option");
                if let Some(max) = line.parse_value("max_answer")? {
                    form.max_answer = max;
                }
                if let Some(duration) = line.parse_value("duration")? {
                    form.duration_secs = duration;
                }
                Box::new(form)
            }
            "presence" => {
                let mut form = PresenceForm::default();
                if let Some(presence) = line.get("presence") {
                    form.presence = presence.parse().map_err(AppError::Usage)?;
                }
                Box::new(form)
            }
            "typing" | "chat-presence" => {
                let mut form = ChatPresenceForm::default();
                fill_recipient(&mut form, line)?;
                if let Some(state) = line.get("state") {
                    form.action = state.parse().map_err(AppError::Usage)?;
                }
                Box::new(form)
            }
            other => return Err(unknown_action("send", other)),
        };
        Ok(form)
    }
}

#[async_trait]
impl CommandHandler for SendHandler {
    fn name(&self) -> &str {
        "send"
    }

    async fn execute(&self, line: &CommandLine) -> AppResult<String> {
        let mut form = self.form(line).await?;
        Ok(self.session.submit(&self.controller, form.as_mut()).await)
    }
}
