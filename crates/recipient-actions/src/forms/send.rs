//! Forms behind the `/send/*` endpoints.

use super::{max_chars, required, ActionForm, SendOptions, MAX_MESSAGE_CHARS};
use crate::attachment::{AttachmentRules, AttachmentSlot};
use crate::error::ValidationError;
use crate::recipient::{KindChange, RecipientSelector};
use crate::request::{ActionRequest, Modifiers};
use std::fmt;
use std::str::FromStr;

/// Plain text message.
#[derive(Debug, Clone)]
pub struct MessageForm {
    recipient: RecipientSelector,
    pub message: String,
    pub options: SendOptions,
}

impl Default for MessageForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::any(),
            message: String::new(),
            options: SendOptions::default(),
        }
    }
}

impl ActionForm for MessageForm {
    fn action(&self) -> &'static str {
        "send message"
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        self.options.on_kind_change(change);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("message", &self.message)?;
        max_chars("message", &self.message, MAX_MESSAGE_CHARS)?;
        self.options.validate()
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::json("/send/message")
            .recipient(self.recipient.resolve()?)
            .field("message", self.message.trim())
            .modifiers(self.options.modifiers(true)?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Image or video: caption, view-once and compression flags.
#[derive(Debug, Clone)]
pub struct VisualMediaForm {
    recipient: RecipientSelector,
    rules: AttachmentRules,
    path: &'static str,
    pub caption: String,
    pub view_once: bool,
    pub compress: bool,
    pub attachment: AttachmentSlot,
    pub options: SendOptions,
}

impl VisualMediaForm {
    fn new(rules: AttachmentRules, path: &'static str) -> Self {
        Self {
            recipient: RecipientSelector::any(),
            rules,
            path,
            caption: String::new(),
            view_once: false,
            compress: false,
            attachment: AttachmentSlot::default(),
            options: SendOptions::default(),
        }
    }

    pub fn image() -> Self {
        Self::new(AttachmentRules::IMAGE, "/send/image")
    }

    pub fn video() -> Self {
        Self::new(AttachmentRules::VIDEO, "/send/video")
    }

    /// View-once media can be neither forwarded nor disappearing.
    fn modifiers(&self) -> Result<Modifiers, ValidationError> {
        if self.view_once {
            return Ok(Modifiers {
                forwarded: Some(false),
                ..Modifiers::default()
            });
        }
        self.options.modifiers(false)
    }
}

impl ActionForm for VisualMediaForm {
    fn action(&self) -> &'static str {
        if self.rules.field == "video" {
            "send video"
        } else {
            "send image"
        }
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        self.options.on_kind_change(change);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        max_chars("caption", &self.caption, MAX_MESSAGE_CHARS)?;
        if !self.view_once {
            self.options.validate()?;
        }
        self.attachment.validate(&self.rules)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::multipart(self.path)
            .recipient(self.recipient.resolve()?)
            .field("caption", self.caption.trim())
            .field("view_once", self.view_once)
            .field("compress", self.compress)
            .modifiers(self.modifiers()?)
            .attachment(self.rules, &self.attachment))
    }

    fn reset(&mut self) {
        *self = Self::new(self.rules, self.path);
    }
}

/// Audio clip, optionally as a push-to-talk voice note.
#[derive(Debug, Clone)]
pub struct AudioForm {
    recipient: RecipientSelector,
    pub ptt: bool,
    pub attachment: AttachmentSlot,
    pub options: SendOptions,
}

impl Default for AudioForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::direct(),
            ptt: false,
            attachment: AttachmentSlot::default(),
            options: SendOptions::default(),
        }
    }
}

impl ActionForm for AudioForm {
    fn action(&self) -> &'static str {
        "send audio"
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        self.options.on_kind_change(change);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        self.options.validate()?;
        self.attachment.validate(&AttachmentRules::AUDIO)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::multipart("/send/audio")
            .recipient(self.recipient.resolve()?)
            .field("ptt", self.ptt)
            .modifiers(self.options.modifiers(false)?)
            .attachment(AttachmentRules::AUDIO, &self.attachment))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Generic document, capped at 10 MiB for local files.
#[derive(Debug, Clone)]
pub struct FileForm {
    recipient: RecipientSelector,
    pub caption: String,
    pub attachment: AttachmentSlot,
    pub options: SendOptions,
}

impl Default for FileForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::direct(),
            caption: String::new(),
            attachment: AttachmentSlot::default(),
            options: SendOptions::default(),
        }
    }
}

impl ActionForm for FileForm {
    fn action(&self) -> &'static str {
        "send file"
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        self.options.on_kind_change(change);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        max_chars("caption", &self.caption, MAX_MESSAGE_CHARS)?;
        self.options.validate()?;
        self.attachment.validate(&AttachmentRules::FILE)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::multipart("/send/file")
            .recipient(self.recipient.resolve()?)
            .field("caption", self.caption.trim())
            .modifiers(self.options.modifiers(false)?)
            .attachment(AttachmentRules::FILE, &self.attachment))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct StickerForm {
    recipient: RecipientSelector,
    pub attachment: AttachmentSlot,
    pub options: SendOptions,
}

impl Default for StickerForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::any(),
            attachment: AttachmentSlot::default(),
            options: SendOptions::default(),
        }
    }
}

impl ActionForm for StickerForm {
    fn action(&self) -> &'static str {
        "send sticker"
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        self.options.on_kind_change(change);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        self.options.validate()?;
        self.attachment.validate(&AttachmentRules::STICKER)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::multipart("/send/sticker")
            .recipient(self.recipient.resolve()?)
            .modifiers(self.options.modifiers(false)?)
            .attachment(AttachmentRules::STICKER, &self.attachment))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Contact card.
#[derive(Debug, Clone)]
pub struct ContactForm {
    recipient: RecipientSelector,
    pub contact_name: String,
    pub contact_phone: String,
    pub options: SendOptions,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::direct(),
            contact_name: String::new(),
            contact_phone: String::new(),
            options: SendOptions::default(),
        }
    }
}

impl ActionForm for ContactForm {
    fn action(&self) -> &'static str {
        "send contact"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("contact_name", &self.contact_name)?;
        required("contact_phone", &self.contact_phone)?;
        self.options.validate()
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::json("/send/contact")
            .recipient(self.recipient.resolve()?)
            .field("contact_name", self.contact_name.trim())
            .field("contact_phone", self.contact_phone.trim())
            .modifiers(self.options.modifiers(false)?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Link preview with a caption.
#[derive(Debug, Clone)]
pub struct LinkForm {
    recipient: RecipientSelector,
    pub link: String,
    pub caption: String,
    pub options: SendOptions,
}

impl Default for LinkForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::any(),
            link: String::new(),
            caption: String::new(),
            options: SendOptions::default(),
        }
    }
}

impl ActionForm for LinkForm {
    fn action(&self) -> &'static str {
        "send link"
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        self.options.on_kind_change(change);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("link", &self.link)?;
        max_chars("link", &self.link, MAX_MESSAGE_CHARS)?;
        required("caption", &self.caption)?;
        max_chars("caption", &self.caption, MAX_MESSAGE_CHARS)?;
        self.options.validate()?;
        crate::attachment::validate_url("link", &self.link)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::json("/send/link")
            .recipient(self.recipient.resolve()?)
            .field("link", self.link.trim())
            .field("caption", self.caption.trim())
            .modifiers(self.options.modifiers(true)?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

pub const MIN_POLL_OPTIONS: usize = 2;

#[derive(Debug, Clone)]
pub struct PollForm {
    recipient: RecipientSelector,
    pub question: String,
    pub options: Vec<String>,
    pub max_answer: u32,
    pub duration_secs: u32,
}

impl Default for PollForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::direct(),
            question: String::new(),
            options: vec![String::new(), String::new()],
            max_answer: 1,
            duration_secs: 0,
        }
    }
}

impl PollForm {
    fn trimmed_options(&self) -> Vec<String> {
        self.options.iter().map(|o| o.trim().to_string()).collect()
    }
}

impl ActionForm for PollForm {
    fn action(&self) -> &'static str {
        "send poll"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("question", &self.question)?;

        if self.options.len() < MIN_POLL_OPTIONS {
            return Err(ValidationError::TooFewOptions {
                min: MIN_POLL_OPTIONS,
            });
        }
        for option in &self.options {
            required("option", option)?;
        }
        if self.max_answer < 1 || self.max_answer as usize > self.options.len() {
            return Err(ValidationError::MaxAnswerOutOfRange {
                value: self.max_answer,
                options: self.options.len(),
            });
        }

        SendOptions {
            duration_secs: self.duration_secs,
            ..SendOptions::default()
        }
        .validate()
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        let modifiers = SendOptions {
            duration_secs: self.duration_secs,
            ..SendOptions::default()
        }
        .duration_only()?;

        Ok(ActionRequest::json("/send/poll")
            .recipient(self.recipient.resolve()?)
            .field("question", self.question.trim())
            .field("options", self.trimmed_options())
            .field("max_answer", self.max_answer)
            .modifiers(modifiers))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Global online/offline presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presence {
    #[default]
    Available,
    Unavailable,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Available => "available",
            Presence::Unavailable => "unavailable",
        }
    }
}

impl FromStr for Presence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" | "online" => Ok(Presence::Available),
            "unavailable" | "offline" => Ok(Presence::Unavailable),
            other => Err(format!("unknown presence '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresenceForm {
    pub presence: Presence,
}

impl ActionForm for PresenceForm {
    fn action(&self) -> &'static str {
        "send presence"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::json("/send/presence").field("type", self.presence.as_str()))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Typing indicator in one chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Typing {
    #[default]
    Start,
    Stop,
}

impl fmt::Display for Typing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Typing::Start => "start",
            Typing::Stop => "stop",
        })
    }
}

impl FromStr for Typing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Typing::Start),
            "stop" => Ok(Typing::Stop),
            other => Err(format!("unknown chat presence '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatPresenceForm {
    recipient: RecipientSelector,
    pub action: Typing,
}

impl Default for ChatPresenceForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::chats(),
            action: Typing::default(),
        }
    }
}

impl ActionForm for ChatPresenceForm {
    fn action(&self) -> &'static str {
        "send chat presence"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::json("/send/chat-presence")
            .recipient(self.recipient.resolve()?)
            .field("action", self.action.to_string()))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
