//! Console command handlers.

mod account;
mod app;
mod chat;
mod device;
mod group;
mod help;
mod send;

pub use account::AccountHandler;
pub use app::AppHandler;
pub use chat::ChatHandler;
pub use device::DeviceHandler;
pub use group::GroupHandler;
pub use help::HelpHandler;
pub use send::SendHandler;

use crate::error::{AppError, AppResult};
use crate::input::CommandLine;
use crate::session::Session;
use async_trait::async_trait;
use recipient_actions::{
    ActionError, ActionForm, AttachmentSlot, LocalFile, RecipientKind, ResultPresenter, SendOptions,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name (e.g., "send", "chat").
    fn name(&self) -> &str;

    /// Command word typed at the prompt; defaults to the name.
    fn trigger(&self) -> &str {
        self.name()
    }

    /// Check if this handler matches the command line.
    fn matches(&self, line: &CommandLine) -> bool {
        line.command == self.trigger()
    }

    /// Execute the command, returning the text to print.
    async fn execute(&self, line: &CommandLine) -> AppResult<String>;
}

/// Every console command, bound to one session.
pub fn registry(session: Arc<Session>) -> Vec<Box<dyn CommandHandler>> {
    vec![
        Box::new(HelpHandler::new()),
        Box::new(AppHandler::new(session.clone())),
        Box::new(DeviceHandler::new(session.clone())),
        Box::new(SendHandler::new(session.clone())),
        Box::new(ChatHandler::new(session.clone())),
        Box::new(GroupHandler::new(session.clone())),
        Box::new(AccountHandler::new(session)),
    ]
}

/// Run one input line. Blank lines produce no output; errors become banners.
pub async fn dispatch(
    handlers: &[Box<dyn CommandHandler>],
    presenter: &ResultPresenter,
    input: &str,
) -> Option<String> {
    let line = match CommandLine::parse(input) {
        Ok(Some(line)) => line,
        Ok(None) => return None,
        Err(e) => return Some(presenter.banner(&error_feedback(&e))),
    };

    let Some(handler) = handlers.iter().find(|h| h.matches(&line)) else {
        return Some(presenter.banner(&recipient_actions::Feedback::Error(format!(
            "Unknown command '{}', type help",
            line.command
        ))));
    };

    match handler.execute(&line).await {
        Ok(output) => Some(output),
        Err(e) => {
            match &e {
                AppError::Usage(_)
                | AppError::Validation(_)
                | AppError::Action(ActionError::Validation(_)) => {
                    debug!(command = handler.name(), "Rejected: {}", e)
                }
                AppError::Bridge(_) | AppError::Action(ActionError::Bridge(_)) => {
                    warn!(command = handler.name(), "Bridge call failed: {}", e)
                }
                _ => error!(command = handler.name(), "Handler error: {}", e),
            }
            Some(presenter.banner(&error_feedback(&e)))
        }
    }
}

fn error_feedback(e: &AppError) -> recipient_actions::Feedback {
    recipient_actions::Feedback::Error(e.user_message())
}

pub(crate) fn unknown_action(command: &str, action: &str) -> AppError {
    if action.is_empty() {
        AppError::Usage(format!("{} needs an action, type help", command))
    } else {
        AppError::Usage(format!("unknown {} action '{}'", command, action))
    }
}

/// Apply `kind=` and `to=` to the form's recipient selector.
///
/// A `to` containing `@` is taken as a full JID and sets the kind too.
pub(crate) fn fill_recipient(form: &mut dyn ActionForm, line: &CommandLine) -> AppResult<()> {
    if let Some(kind) = line.get("kind") {
        let kind: RecipientKind = kind.parse().map_err(AppError::Usage)?;
        form.set_recipient_kind(kind)?;
    }

    let Some(to) = line.get("to") else {
        return Ok(());
    };
    if to.contains('@') {
        form.set_recipient_jid(to)?;
    } else if let Some(selector) = form.recipient_mut() {
        selector.set_local_part(to);
    }
    Ok(())
}

/// `forwarded=`, `reply=` and `duration=` shared by the send actions.
pub(crate) fn fill_send_options(options: &mut SendOptions, line: &CommandLine) -> AppResult<()> {
    options.forwarded = line.flag("forwarded", options.forwarded)?;
    if let Some(reply) = line.get("reply") {
        options.reply_to = reply.to_string();
    }
    if let Some(duration) = line.parse_value("duration")? {
        options.duration_secs = duration;
    }
    Ok(())
}

/// `file=` reads a local file, `url=` points at a remote one. The one
/// written last on the line wins.
pub(crate) async fn fill_attachment(slot: &mut AttachmentSlot, line: &CommandLine) -> AppResult<()> {
    for (key, value) in &line.params {
        match key.as_str() {
            "file" => {
                let file = LocalFile::load(value).await?;
                debug!(filename = %file.filename, size = file.size(), "Attached local file");
                slot.attach_file(file);
            }
            "url" => slot.attach_url(value.as_str()),
            _ => {}
        }
    }
    Ok(())
}
