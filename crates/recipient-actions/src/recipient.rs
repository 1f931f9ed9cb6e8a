//! Recipient kinds, canonical identifiers and the selector that builds them.

use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

pub const USER_SUFFIX: &str = "@s.whatsapp.net";
pub const GROUP_SUFFIX: &str = "@g.us";
pub const NEWSLETTER_SUFFIX: &str = "@newsletter";
pub const STATUS_BROADCAST_JID: &str = "status@broadcast";

/// What kind of address a recipient is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecipientKind {
    #[default]
    User,
    Group,
    Newsletter,
    StatusBroadcast,
}

impl RecipientKind {
    pub const ALL: &'static [RecipientKind] = &[
        RecipientKind::User,
        RecipientKind::Group,
        RecipientKind::Newsletter,
        RecipientKind::StatusBroadcast,
    ];

    /// Every kind except the status broadcast.
    pub const DIRECT: &'static [RecipientKind] = &[
        RecipientKind::User,
        RecipientKind::Group,
        RecipientKind::Newsletter,
    ];

    pub const CHATS: &'static [RecipientKind] = &[RecipientKind::User, RecipientKind::Group];

    /// Domain suffix appended to the local part. Empty for the broadcast.
    pub fn suffix(self) -> &'static str {
        match self {
            RecipientKind::User => USER_SUFFIX,
            RecipientKind::Group => GROUP_SUFFIX,
            RecipientKind::Newsletter => NEWSLETTER_SUFFIX,
            RecipientKind::StatusBroadcast => "",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecipientKind::User => "a user",
            RecipientKind::Group => "a group",
            RecipientKind::Newsletter => "a newsletter",
            RecipientKind::StatusBroadcast => "the status broadcast",
        }
    }

    /// Infer the kind from a full JID.
    pub fn of_jid(jid: &str) -> Option<Self> {
        if jid == STATUS_BROADCAST_JID {
            return Some(RecipientKind::StatusBroadcast);
        }
        [
            RecipientKind::User,
            RecipientKind::Group,
            RecipientKind::Newsletter,
        ]
        .into_iter()
        .find(|kind| jid.ends_with(kind.suffix()))
    }
}

impl FromStr for RecipientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "private" => Ok(RecipientKind::User),
            "group" => Ok(RecipientKind::Group),
            "newsletter" | "channel" => Ok(RecipientKind::Newsletter),
            "status" | "broadcast" => Ok(RecipientKind::StatusBroadcast),
            other => Err(format!("unknown recipient kind '{}'", other)),
        }
    }
}

/// Canonical addressable identifier (`localPart + suffix`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipientIdentifier {
    local_part: String,
    kind: RecipientKind,
}

impl RecipientIdentifier {
    /// Build an identifier from raw user input.
    ///
    /// Input is trimmed; input that already carries the kind's suffix is not
    /// suffixed twice. The broadcast ignores the local part.
    pub fn new(kind: RecipientKind, raw: &str) -> Result<Self, ValidationError> {
        if kind == RecipientKind::StatusBroadcast {
            return Ok(Self::status_broadcast());
        }

        let trimmed = raw.trim();
        let local = trimmed.strip_suffix(kind.suffix()).unwrap_or(trimmed).trim();

        if local.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        if local.contains('@') {
            return Err(ValidationError::UnknownDomain(trimmed.to_string()));
        }
        if kind == RecipientKind::User {
            let digits = local.strip_prefix('+').unwrap_or(local);
            if digits.starts_with('0') {
                return Err(ValidationError::LocalPhoneFormat);
            }
        }

        Ok(Self {
            local_part: local.to_string(),
            kind,
        })
    }

    pub fn status_broadcast() -> Self {
        Self {
            local_part: String::new(),
            kind: RecipientKind::StatusBroadcast,
        }
    }

    /// Parse a full JID; a bare local part is taken as a user.
    pub fn parse(jid: &str) -> Result<Self, ValidationError> {
        let trimmed = jid.trim();
        match RecipientKind::of_jid(trimmed) {
            Some(kind) => Self::new(kind, trimmed),
            None if trimmed.contains('@') => Err(ValidationError::UnknownDomain(trimmed.to_string())),
            None => Self::new(RecipientKind::User, trimmed),
        }
    }

    pub fn kind(&self) -> RecipientKind {
        self.kind
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn canonical(&self) -> String {
        match self.kind {
            RecipientKind::StatusBroadcast => STATUS_BROADCAST_JID.to_string(),
            kind => format!("{}{}", self.local_part, kind.suffix()),
        }
    }
}

impl fmt::Display for RecipientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Effect of switching the recipient kind, used by forms to clear
/// fields that only make sense for the previous kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindChange {
    pub previous: RecipientKind,
    pub current: RecipientKind,
}

impl KindChange {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }

    pub fn left_group(&self) -> bool {
        self.previous == RecipientKind::Group && self.current != RecipientKind::Group
    }

    pub fn entered_status(&self) -> bool {
        self.previous != RecipientKind::StatusBroadcast
            && self.current == RecipientKind::StatusBroadcast
    }
}

/// Recipient input of one form: a kind picker plus the raw local part.
#[derive(Debug, Clone)]
pub struct RecipientSelector {
    kind: RecipientKind,
    default_kind: RecipientKind,
    allowed: &'static [RecipientKind],
    local_part: String,
}

impl RecipientSelector {
    pub fn new(default_kind: RecipientKind, allowed: &'static [RecipientKind]) -> Self {
        Self {
            kind: default_kind,
            default_kind,
            allowed,
            local_part: String::new(),
        }
    }

    /// Selector for forms that can also post to the status broadcast.
    pub fn any() -> Self {
        Self::new(RecipientKind::User, RecipientKind::ALL)
    }

    pub fn direct() -> Self {
        Self::new(RecipientKind::User, RecipientKind::DIRECT)
    }

    pub fn chats() -> Self {
        Self::new(RecipientKind::User, RecipientKind::CHATS)
    }

    pub fn only(kind: RecipientKind) -> Self {
        let allowed: &'static [RecipientKind] = match kind {
            RecipientKind::User => &[RecipientKind::User],
            RecipientKind::Group => &[RecipientKind::Group],
            RecipientKind::Newsletter => &[RecipientKind::Newsletter],
            RecipientKind::StatusBroadcast => &[RecipientKind::StatusBroadcast],
        };
        Self::new(kind, allowed)
    }

    pub fn kind(&self) -> RecipientKind {
        self.kind
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn allows(&self, kind: RecipientKind) -> bool {
        self.allowed.contains(&kind)
    }

    pub fn set_local_part(&mut self, raw: impl Into<String>) {
        self.local_part = raw.into();
    }

    /// Switch the kind. Switching to the broadcast clears the local part.
    pub fn set_kind(&mut self, kind: RecipientKind) -> Result<KindChange, ValidationError> {
        if !self.allows(kind) {
            return Err(ValidationError::UnsupportedRecipient(kind.label()));
        }
        let change = KindChange {
            previous: self.kind,
            current: kind,
        };
        self.kind = kind;
        if change.entered_status() {
            self.local_part.clear();
        }
        Ok(change)
    }

    /// Set kind and local part from a full JID.
    pub fn set_jid(&mut self, jid: &str) -> Result<KindChange, ValidationError> {
        let identifier = RecipientIdentifier::parse(jid)?;
        let change = self.set_kind(identifier.kind())?;
        self.local_part = identifier.local_part().to_string();
        Ok(change)
    }

    pub fn resolve(&self) -> Result<RecipientIdentifier, ValidationError> {
        RecipientIdentifier::new(self.kind, &self.local_part)
    }

    pub fn is_valid(&self) -> bool {
        self.resolve().is_ok()
    }

    /// Back to the declared default kind with an empty local part.
    pub fn reset(&mut self) {
        self.kind = self.default_kind;
        self.local_part.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_local_part_is_invalid_except_for_status() {
        for kind in RecipientKind::ALL {
            let mut selector = RecipientSelector::any();
            selector.set_kind(*kind).unwrap();
            selector.set_local_part("   ");

            if *kind == RecipientKind::StatusBroadcast {
                assert!(selector.is_valid());
            } else {
                assert!(!selector.is_valid(), "{:?} accepted an empty local part", kind);
            }
        }
    }

    #[test]
    fn test_status_ignores_local_part() {
        let id = RecipientIdentifier::new(RecipientKind::StatusBroadcast, "5511999999999").unwrap();
        assert_eq!(id.canonical(), STATUS_BROADCAST_JID);
    }

    #[test]
    fn test_group_suffix_is_appended() {
        let id = RecipientIdentifier::new(RecipientKind::Group, " 12036342 ").unwrap();
        assert_eq!(id.canonical(), "12036342@g.us");
    }

    #[test]
    fn test_group_suffix_is_not_doubled() {
        let id = RecipientIdentifier::new(RecipientKind::Group, "12036342@g.us").unwrap();
        assert_eq!(id.canonical(), "12036342@g.us");
        assert_eq!(id.local_part(), "12036342");
    }

    #[test]
    fn test_user_canonical_form() {
        let id = RecipientIdentifier::new(RecipientKind::User, "5511999999999").unwrap();
        assert_eq!(id.to_string(), "5511999999999@s.whatsapp.net");
    }

    #[test]
    fn test_user_must_be_international() {
        assert_eq!(
            RecipientIdentifier::new(RecipientKind::User, "0812345678"),
            Err(ValidationError::LocalPhoneFormat)
        );
        assert_eq!(
            RecipientIdentifier::new(RecipientKind::User, "+0812345678"),
            Err(ValidationError::LocalPhoneFormat)
        );
        assert!(RecipientIdentifier::new(RecipientKind::User, "+6281234").is_ok());
    }

    #[test]
    fn test_foreign_domain_is_rejected() {
        assert!(matches!(
            RecipientIdentifier::new(RecipientKind::Group, "123@s.whatsapp.net"),
            Err(ValidationError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_parse_infers_kind() {
        assert_eq!(
            RecipientIdentifier::parse("123@newsletter").unwrap().kind(),
            RecipientKind::Newsletter
        );
        assert_eq!(
            RecipientIdentifier::parse("status@broadcast").unwrap().kind(),
            RecipientKind::StatusBroadcast
        );
        assert_eq!(
            RecipientIdentifier::parse("5511999999999").unwrap().kind(),
            RecipientKind::User
        );
        assert!(RecipientIdentifier::parse("123@lid.example").is_err());
    }

    #[test]
    fn test_switch_to_status_clears_local_part() {
        let mut selector = RecipientSelector::any();
        selector.set_local_part("5511999999999");

        let change = selector.set_kind(RecipientKind::StatusBroadcast).unwrap();

        assert!(change.entered_status());
        assert_eq!(selector.local_part(), "");
        assert!(selector.is_valid());
    }

    #[test]
    fn test_kind_change_reports_leaving_group() {
        let mut selector = RecipientSelector::chats();
        selector.set_kind(RecipientKind::Group).unwrap();

        let change = selector.set_kind(RecipientKind::User).unwrap();

        assert!(change.left_group());
        assert!(!change.entered_status());
    }

    #[test]
    fn test_disallowed_kind_is_rejected() {
        let mut selector = RecipientSelector::chats();
        assert_eq!(
            selector.set_kind(RecipientKind::StatusBroadcast),
            Err(ValidationError::UnsupportedRecipient("the status broadcast"))
        );
        assert_eq!(selector.kind(), RecipientKind::User);
    }

    #[test]
    fn test_reset_restores_default_kind() {
        let mut selector = RecipientSelector::any();
        selector.set_kind(RecipientKind::Group).unwrap();
        selector.set_local_part("123");

        selector.reset();

        assert_eq!(selector.kind(), RecipientKind::User);
        assert!(!selector.is_valid());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Group".parse::<RecipientKind>(), Ok(RecipientKind::Group));
        assert_eq!("status".parse::<RecipientKind>(), Ok(RecipientKind::StatusBroadcast));
        assert!("fax".parse::<RecipientKind>().is_err());
    }
}
