//! Per-action forms.
//!
//! Every form owns its fields and follows the same contract: `validate`
//! checks the recipient first, then required fields and length bounds, then
//! numeric ranges, then the attachment. `build_payload` only succeeds on a
//! valid form and `reset` restores every field to its default.

macro_rules! recipient_accessors {
    () => {
        fn recipient(&self) -> Option<&RecipientSelector> {
            Some(&self.recipient)
        }

        fn recipient_mut(&mut self) -> Option<&mut RecipientSelector> {
            Some(&mut self.recipient)
        }
    };
}

mod account;
mod chat;
mod group;
mod send;

pub use account::*;
pub use chat::*;
pub use group::*;
pub use send::*;

use crate::error::ValidationError;
use crate::recipient::{KindChange, RecipientKind, RecipientSelector};
use crate::request::{ActionRequest, EphemeralDuration, Modifiers};

pub const MAX_MESSAGE_CHARS: usize = 4096;
pub const MAX_GROUP_NAME_CHARS: usize = 25;

/// A form-validate-submit-reset widget.
pub trait ActionForm: Send {
    /// Short name used in logs.
    fn action(&self) -> &'static str;

    fn recipient(&self) -> Option<&RecipientSelector> {
        None
    }

    fn recipient_mut(&mut self) -> Option<&mut RecipientSelector> {
        None
    }

    /// Clear fields whose meaning depended on the previous kind.
    fn on_kind_change(&mut self, _change: KindChange) {}

    fn set_recipient_kind(&mut self, kind: RecipientKind) -> Result<KindChange, ValidationError> {
        let selector = self
            .recipient_mut()
            .ok_or(ValidationError::UnsupportedRecipient(kind.label()))?;
        let change = selector.set_kind(kind)?;
        if change.changed() {
            self.on_kind_change(change);
        }
        Ok(change)
    }

    /// Set kind and local part from a full JID.
    fn set_recipient_jid(&mut self, jid: &str) -> Result<KindChange, ValidationError> {
        let selector = self
            .recipient_mut()
            .ok_or(ValidationError::UnsupportedRecipient("this action"))?;
        let change = selector.set_jid(jid)?;
        if change.changed() {
            self.on_kind_change(change);
        }
        Ok(change)
    }

    fn validate(&self) -> Result<(), ValidationError>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError>;

    fn reset(&mut self);
}

/// Forwarded flag, reply id and disappearing timer shared by send forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub forwarded: bool,
    pub reply_to: String,
    pub duration_secs: u32,
}

impl SendOptions {
    /// Reply and forward make no sense for the status broadcast.
    pub fn on_kind_change(&mut self, change: KindChange) {
        if change.entered_status() {
            self.forwarded = false;
            self.reply_to.clear();
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        EphemeralDuration::new(self.duration_secs).map(|_| ())
    }

    /// Modifiers for an action that carries a forwarded flag.
    pub fn modifiers(&self, with_reply: bool) -> Result<Modifiers, ValidationError> {
        Ok(Modifiers {
            forwarded: Some(self.forwarded),
            duration: EphemeralDuration::new(self.duration_secs)?,
            reply_to: with_reply.then(|| self.reply_to.clone()),
        })
    }

    /// Modifiers for an action with only a disappearing timer.
    pub fn duration_only(&self) -> Result<Modifiers, ValidationError> {
        Ok(Modifiers {
            duration: EphemeralDuration::new(self.duration_secs)?,
            ..Modifiers::default()
        })
    }
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required { field })
    } else {
        Ok(())
    }
}

pub(crate) fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() > max {
        Err(ValidationError::TooLong { field, max })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entering_status_drops_reply_and_forward() {
        let mut options = SendOptions {
            forwarded: true,
            reply_to: "3EB0".into(),
            duration_secs: 86_400,
        };

        options.on_kind_change(KindChange {
            previous: RecipientKind::User,
            current: RecipientKind::StatusBroadcast,
        });

        assert!(!options.forwarded);
        assert!(options.reply_to.is_empty());
        assert_eq!(options.duration_secs, 86_400);
    }

    #[test]
    fn test_max_chars_counts_characters() {
        assert!(max_chars("name", &"é".repeat(25), 25).is_ok());
        assert!(max_chars("name", &"é".repeat(26), 25).is_err());
    }

    #[test]
    fn test_form_without_recipient_rejects_kind_switch() {
        let mut form = PresenceForm::default();
        assert!(form.set_recipient_kind(RecipientKind::Group).is_err());
    }
}
