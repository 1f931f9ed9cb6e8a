//! Account, login and lookup forms.

use super::ActionForm;
use crate::error::ValidationError;
use crate::recipient::{KindChange, RecipientKind, RecipientSelector};
use crate::request::ActionRequest;

/// Is a phone number on WhatsApp.
#[derive(Debug, Clone)]
pub struct UserCheckForm {
    recipient: RecipientSelector,
}

impl Default for UserCheckForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::only(RecipientKind::User),
        }
    }
}

impl ActionForm for UserCheckForm {
    fn action(&self) -> &'static str {
        "check user"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::query("/user/check").recipient(self.recipient.resolve()?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Profile picture of a user or group.
#[derive(Debug, Clone)]
pub struct AvatarForm {
    recipient: RecipientSelector,
    pub is_preview: bool,
    /// Only meaningful for groups.
    pub is_community: bool,
}

impl Default for AvatarForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::chats(),
            is_preview: false,
            is_community: false,
        }
    }
}

impl ActionForm for AvatarForm {
    fn action(&self) -> &'static str {
        "get avatar"
    }

    recipient_accessors!();

    fn on_kind_change(&mut self, change: KindChange) {
        if change.left_group() {
            self.is_community = false;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        let target = self.recipient.resolve()?;
        let is_community = self.is_community && target.kind() == RecipientKind::Group;
        Ok(ActionRequest::query("/user/avatar")
            .recipient(target)
            .field("is_preview", self.is_preview)
            .field("is_community", is_community))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct BusinessProfileForm {
    recipient: RecipientSelector,
}

impl Default for BusinessProfileForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::only(RecipientKind::User),
        }
    }
}

impl ActionForm for BusinessProfileForm {
    fn action(&self) -> &'static str {
        "business profile"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::query("/user/business-profile").recipient(self.recipient.resolve()?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pair a device by phone number instead of a QR code.
///
/// The bridge wants the bare number here, not a JID.
#[derive(Debug, Clone)]
pub struct LoginWithCodeForm {
    recipient: RecipientSelector,
}

impl Default for LoginWithCodeForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::only(RecipientKind::User),
        }
    }
}

impl ActionForm for LoginWithCodeForm {
    fn action(&self) -> &'static str {
        "login with code"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        let phone = self.recipient.resolve()?;
        let digits = phone.local_part().trim_start_matches('+').to_string();
        Ok(ActionRequest::query("/app/login-with-code").field("phone", digits))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct NewsletterUnfollowForm {
    recipient: RecipientSelector,
}

impl Default for NewsletterUnfollowForm {
    fn default() -> Self {
        Self {
            recipient: RecipientSelector::only(RecipientKind::Newsletter),
        }
    }
}

impl ActionForm for NewsletterUnfollowForm {
    fn action(&self) -> &'static str {
        "unfollow newsletter"
    }

    recipient_accessors!();

    fn validate(&self) -> Result<(), ValidationError> {
        self.recipient.resolve().map(|_| ())
    }

    fn build_payload(&self) -> Result<ActionRequest, ValidationError> {
        Ok(ActionRequest::json("/newsletter/unfollow")
            .recipient_as("newsletter_id", self.recipient.resolve()?))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_client::RequestBody;
    use serde_json::json;

    #[test]
    fn test_community_flag_cleared_when_leaving_group() {
        let mut form = AvatarForm::default();
        form.set_recipient_kind(RecipientKind::Group).unwrap();
        form.is_community = true;

        form.set_recipient_kind(RecipientKind::User).unwrap();

        assert!(!form.is_community);
    }

    #[test]
    fn test_avatar_query() {
        let mut form = AvatarForm::default();
        form.set_recipient_jid("12036342@g.us").unwrap();
        form.is_community = true;
        form.is_preview = true;

        let request = form.build_payload().unwrap().to_api_request();

        assert_eq!(request.path, "/user/avatar");
        assert_eq!(
            request.query,
            vec![
                ("phone".to_string(), "12036342@g.us".to_string()),
                ("is_preview".to_string(), "true".to_string()),
                ("is_community".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_user_check_requires_international_number() {
        let mut form = UserCheckForm::default();
        form.recipient_mut().unwrap().set_local_part("0812345678");
        assert_eq!(form.validate(), Err(ValidationError::LocalPhoneFormat));

        form.reset();
        assert_eq!(form.validate(), Err(ValidationError::MissingRecipient));
    }

    #[test]
    fn test_login_code_sends_digits() {
        let mut form = LoginWithCodeForm::default();
        form.recipient_mut().unwrap().set_local_part("+5511999999999");

        let request = form.build_payload().unwrap().to_api_request();

        assert_eq!(
            request.query,
            vec![("phone".to_string(), "5511999999999".to_string())]
        );
    }

    #[test]
    fn test_unfollow_payload() {
        let mut form = NewsletterUnfollowForm::default();
        form.set_recipient_jid("120363@newsletter").unwrap();

        let request = form.build_payload().unwrap().to_api_request();

        assert_eq!(
            request.body,
            Some(RequestBody::Json(json!({"newsletter_id": "120363@newsletter"})))
        );
    }
}
