//! Forms acting on one chat or one message of a chat.

use super::{required, ActionForm};
use crate::error::ValidationError;
use crate::recipient::RecipientSelector;
use crate::request::{ActionRequest, EphemeralDuration};
use urlencoding::encode;

/// Quick picks offered for the disappearing timer: off, 24h, 7d, 90d.
pub const DISAPPEARING_PRESETS: [u32; 4] = [0, 86_400, 604_800, 7_776_000];

#[derive(Debug, Clone)]
pub struct DisappearingForm {
    recipient: RecipientSelector,
    pub timer_secs: u32,
}

impl Default for DisappearingForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::chats(),
            timer_secs: 86_400,
        }
    }
}

impl ActionForm for DisappearingForm {
    fn action(&self) -> &'static str {
        "set disappearing timer"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        EphemeralDuration::new(self.timer_secs).map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        let chat = self.recipient.resolve()?;
        Ok(ActionRequest::json(format!("/chat/{}/disappearing", chat))
            .field("timer_seconds", self.timer_secs))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct PinChatForm {
    recipient: RecipientSelector,
    pub pinned: bool,
}

impl Default for PinChatForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::chats(),
            pinned: true,
        }
    }
}

impl ActionForm for PinChatForm {
    fn action(&self) -> &'static str {
        if self.pinned {
            "pin chat"
        } else {
            "unpin chat"
        }
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        let chat = self.recipient.resolve()?;
        Ok(ActionRequest::json(format!("/chat/{}/pin", chat)).field("pinned", self.pinned))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Emoji reaction on one message. An empty emoji is not a removal here.
#[derive(Debug, Clone)]
pub struct ReactionForm {
    recipient: RecipientSelector,
    pub message_id: String,
    pub emoji: String,
}

impl Default for ReactionForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::chats(),
            message_id: String::new(),
            emoji: String::new(),
        }
    }
}

impl ActionForm for ReactionForm {
    fn action(&self) -> &'static str {
        "react to message"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("message_id", &self.message_id)?;
        required("emoji", &self.emoji)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        let path = format!("/message/{}/reaction", encode(self.message_id.trim()));
        Ok(ActionRequest::json(path)
            .recipient(self.recipient.resolve()?)
            .field("emoji", self.emoji.trim()))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct MarkReadForm {
    recipient: RecipientSelector,
    pub message_id: String,
}

impl Default for MarkReadForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::chats(),
            message_id: String::new(),
        }
    }
}

impl ActionForm for MarkReadForm {
    fn action(&self) -> &'static str {
        "mark message read"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("message_id", &self.message_id)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        let path = format!("/message/{}/read", encode(self.message_id.trim()));
        Ok(ActionRequest::json(path).recipient(self.recipient.resolve()?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
