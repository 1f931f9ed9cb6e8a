//! Group management forms. All of them address the group as `group_id`.

use super::{max_chars, required, ActionForm, MAX_GROUP_NAME_CHARS};
use crate::attachment::validate_url;
use crate::error::ValidationError;
use crate::recipient::{RecipientIdentifier, RecipientKind, RecipientSelector};
use crate::request::ActionRequest;
use std::str::FromStr;

const GROUP_FIELD: &str = "group_id";

fn group_selector() -> RecipientSelector {
    RecipientSelector::only(RecipientKind::Group)
}

#[derive(Debug, Clone)]
pub struct GroupNameForm {
    recipient: RecipientSelector,
    pub name: String,
}

impl Default for GroupNameForm {
    fn default() -> Self {
        Self {
            recipient: group_selector(),
            name: String::new(),
        }
    }
}

impl ActionForm for GroupNameForm {
    fn action(&self) -> &'static str {
        "rename group"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        required("name", &self.name)?;
        max_chars("name", &self.name, MAX_GROUP_NAME_CHARS)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::json("/group/name")
            .recipient_as(GROUP_FIELD, self.recipient.resolve()?)
            .field("name", self.name.trim()))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Boolean group settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupSetting {
    /// Only admins can send messages.
    #[default]
    Announce,
    /// Only admins can edit group info.
    Locked,
}

impl GroupSetting {
    fn field(self) -> &'static str {
        match self {
            GroupSetting::Announce => "announce",
            GroupSetting::Locked => "locked",
        }
    }
}

impl FromStr for GroupSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "announce" => Ok(GroupSetting::Announce),
            "locked" | "lock" => Ok(GroupSetting::Locked),
            other => Err(format!("unknown group setting '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupSettingForm {
    recipient: RecipientSelector,
    pub setting: GroupSetting,
    pub enabled: bool,
}

impl GroupSettingForm {
    pub fn new(setting: GroupSetting) -> Self {
        Self {
            recipient: group_selector(),
            setting,
            enabled: false,
        }
    }
}

impl ActionForm for GroupSettingForm {
    fn action(&self) -> &'static str {
        match self.setting {
            GroupSetting::Announce => "set group announce",
            GroupSetting::Locked => "set group locked",
        }
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        let field = self.setting.field();
        Ok(ActionRequest::json(format!("/group/{}", field))
            .recipient_as(GROUP_FIELD, self.recipient.resolve()?)
            .field(field, self.enabled))
    }

    fn reset(&mut self) {
        *self = Self::new(self.setting);
    }
}

#[derive(Debug, Clone)]
pub struct LeaveGroupForm {
    recipient: RecipientSelector,
}

impl Default for LeaveGroupForm {
    fn default() -> Self {
        Self {
            recipient: group_selector(),
        }
    }
}

impl ActionForm for LeaveGroupForm {
    fn action(&self) -> &'static str {
        "leave group"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::multipart("/group/leave")
            .recipient_as(GROUP_FIELD, self.recipient.resolve()?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fetch the invite link, optionally revoking the current one.
#[derive(Debug, Clone)]
pub struct InviteLinkForm {
    recipient: RecipientSelector,
    pub reset_link: bool,
}

impl Default for InviteLinkForm {
    fn default() -> Self {
        Self {
            recipient: group_selector(),
            reset_link: false,
        }
    }
}

impl ActionForm for InviteLinkForm {
    fn action(&self) -> &'static str {
        "group invite link"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::query("/group/invite-link")
            .recipient_as(GROUP_FIELD, self.recipient.resolve()?)
            .field("reset", self.reset_link))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read-only group lookups keyed by group id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupLookup {
    #[default]
    Info,
    ParticipantRequests,
}

#[derive(Debug, Clone)]
pub struct GroupLookupForm {
    recipient: RecipientSelector,
    pub lookup: GroupLookup,
}

impl GroupLookupForm {
    pub fn new(lookup: GroupLookup) -> Self {
        Self {
            recipient: group_selector(),
            lookup,
        }
    }
}

impl ActionForm for GroupLookupForm {
    fn action(&self) -> &'static str {
        match self.lookup {
            GroupLookup::Info => "group info",
            GroupLookup::ParticipantRequests => "participant requests",
        }
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        let path = match self.lookup {
            GroupLookup::Info => "/group/info",
            GroupLookup::ParticipantRequests => "/group/participant-requests",
        };
        Ok(ActionRequest::query(path).recipient_as(GROUP_FIELD, self.recipient.resolve()?))
    }

    fn reset(&mut self) {
        *self = Self::new(self.lookup);
    }
}

/// Preview a group from an invite link without joining.
#[derive(Debug, Clone, Default)]
pub struct GroupInfoFromLinkForm {
    pub link: String,
}

impl ActionForm for GroupInfoFromLinkForm {
    fn action(&self) -> &'static str {
        "group info from link"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required("link", &self.link)?;
        validate_url("link", &self.link)
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        Ok(ActionRequest::query("/group/info-from-link").field("link", self.link.trim()))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    #[default]
    Approve,
    Reject,
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// Approve or reject pending join requests.
#[derive(Debug, Clone)]
pub struct ParticipantDecisionForm {
    recipient: RecipientSelector,
    pub decision: Decision,
    /// Requester JIDs or bare phone numbers.
    pub participants: Vec<String>,
}

impl ParticipantDecisionForm {
    pub fn new(decision: Decision) -> Self {
        Self {
            recipient: group_selector(),
            decision,
            participants: Vec::new(),
        }
    }

    /// The bridge expects phone numbers, not JIDs.
    fn participant_numbers(&self) -> Result<Vec<String>, ValidationError> {
        self.participants
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                RecipientIdentifier::new(RecipientKind::User, p)
                    .map(|id| id.local_part().to_string())
            })
            .collect()
    }
}

impl ActionForm for ParticipantDecisionForm {
    fn action(&self) -> &'static str {
        match self.decision {
            Decision::Approve => "approve participant requests",
            Decision::Reject => "reject participant requests",
        }
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve()?;
        if self.participant_numbers()?.is_empty() {
            return Err(ValidationError::Required {
                field: "participants",
            });
        }
        Ok(())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        self.validate()?;
        let path = match self.decision {
            Decision::Approve => "/group/participant-requests/approve",
            Decision::Reject => "/group/participant-requests/reject",
        };
        Ok(ActionRequest::json(path)
            .recipient_as(GROUP_FIELD, self.recipient.resolve()?)
            .field("participants", self.participant_numbers()?))
    }

    fn reset(&mut self) {
        *self = Self::new(self.decision);
    }
}
