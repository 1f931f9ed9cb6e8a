//! Outgoing action requests and their optional modifiers.

use crate::attachment::{AttachmentRules, AttachmentSlot};
use crate::error::ValidationError;
use crate::recipient::{RecipientIdentifier, RecipientKind};
use bridge_client::{ApiRequest, FormPart, Method};
use serde_json::{Map, Value};

pub const MIN_EPHEMERAL_SECS: u32 = 86_400;
pub const MAX_EPHEMERAL_SECS: u32 = 7_776_000;

/// Disappearing-message timer. Zero means disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EphemeralDuration(u32);

impl EphemeralDuration {
    pub const DISABLED: Self = Self(0);

    pub fn new(secs: u32) -> Result<Self, ValidationError> {
        if secs == 0 || (MIN_EPHEMERAL_SECS..=MAX_EPHEMERAL_SECS).contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(ValidationError::InvalidDuration(secs))
        }
    }

    pub fn secs(self) -> u32 {
        self.0
    }

    pub fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

/// Optional per-message modifiers.
///
/// `forwarded` is `None` for actions that have no forwarded flag at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub forwarded: Option<bool>,
    pub duration: EphemeralDuration,
    pub reply_to: Option<String>,
}

/// Scalar or list value of one body field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Int(i64),
    List(Vec<String>),
}

impl FieldValue {
    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::List(items) => Value::from(items.clone()),
        }
    }

    fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// How fields travel to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Multipart,
    Query,
}

/// Transient request assembled by a form on submit.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub method: Method,
    pub path: String,
    pub encoding: Encoding,
    pub recipient: Option<RecipientIdentifier>,
    pub recipient_field: &'static str,
    pub modifiers: Modifiers,
    pub fields: Vec<(&'static str, FieldValue)>,
    attachment: Option<(AttachmentRules, AttachmentSlot)>,
}

impl ActionRequest {
    pub fn new(method: Method, path: impl Into<String>, encoding: Encoding) -> Self {
        Self {
            method,
            path: path.into(),
            encoding,
            recipient: None,
            recipient_field: "phone",
            modifiers: Modifiers::default(),
            fields: Vec::new(),
            attachment: None,
        }
    }

    pub fn json(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path, Encoding::Json)
    }

    pub fn multipart(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path, Encoding::Multipart)
    }

    pub fn query(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, Encoding::Query)
    }

    pub fn recipient(self, recipient: RecipientIdentifier) -> Self {
        self.recipient_as("phone", recipient)
    }

    pub fn recipient_as(mut self, field: &'static str, recipient: RecipientIdentifier) -> Self {
        self.recipient_field = field;
        self.recipient = Some(recipient);
        self
    }

    pub fn field(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn attachment(mut self, rules: AttachmentRules, slot: &AttachmentSlot) -> Self {
        self.attachment = Some((rules, slot.clone()));
        self
    }

    fn targets_status(&self) -> bool {
        self.recipient
            .as_ref()
            .is_some_and(|r| r.kind() == RecipientKind::StatusBroadcast)
    }

    /// Every body field in order, with empty/default modifiers omitted.
    pub fn body_fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = Vec::with_capacity(self.fields.len() + 4);

        if let Some(recipient) = &self.recipient {
            fields.push((self.recipient_field, FieldValue::Text(recipient.canonical())));
        }
        fields.extend(self.fields.iter().cloned());

        let status = self.targets_status();
        if let Some(forwarded) = self.modifiers.forwarded {
            fields.push(("is_forwarded", FieldValue::Bool(forwarded && !status)));
        }
        if !self.modifiers.duration.is_disabled() {
            fields.push(("duration", self.modifiers.duration.secs().into()));
        }
        if let Some(reply_to) = self.modifiers.reply_to.as_deref() {
            if !status && !reply_to.trim().is_empty() {
                fields.push(("reply_message_id", FieldValue::Text(reply_to.trim().to_string())));
            }
        }

        fields
    }

    /// Lower into the transport request.
    pub fn to_api_request(&self) -> ApiRequest {
        let fields = self.body_fields();
        let mut request = ApiRequest::new(self.method, self.path.clone());

        match self.encoding {
            Encoding::Query => {
                for (name, value) in fields {
                    request = request.with_query(name, value.to_text());
                }
            }
            Encoding::Json => {
                let body: Map<String, Value> = fields
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect();
                request = request.with_json(Value::Object(body));
            }
            Encoding::Multipart => {
                let mut parts: Vec<FormPart> = fields
                    .into_iter()
                    .map(|(name, value)| FormPart::text(name, value.to_text()))
                    .collect();
                if let Some(part) = self
                    .attachment
                    .as_ref()
                    .and_then(|(rules, slot)| slot.to_part(rules))
                {
                    parts.push(part);
                }
                request = request.with_multipart(parts);
            }
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_client::RequestBody;

    fn user() -> RecipientIdentifier {
        RecipientIdentifier::new(RecipientKind::User, "5511999999999").unwrap()
    }

    fn json_body(request: &ApiRequest) -> &Map<String, Value> {
        match &request.body {
            Some(RequestBody::Json(Value::Object(map))) => map,
            other => panic!("expected JSON object body, got {:?}", other),
        }
    }

    #[test]
    fn test_duration_bounds() {
        assert!(EphemeralDuration::new(0).is_ok());
        assert!(EphemeralDuration::new(86_400).is_ok());
        assert!(EphemeralDuration::new(7_776_000).is_ok());
        assert_eq!(
            EphemeralDuration::new(86_399),
            Err(ValidationError::InvalidDuration(86_399))
        );
        assert!(EphemeralDuration::new(7_776_001).is_err());
        assert!(EphemeralDuration::new(5).is_err());
    }

    #[test]
    fn test_zero_duration_is_omitted() {
        let request = ActionRequest::json("/send/message")
            .recipient(user())
            .field("message", "hi")
            .modifiers(Modifiers {
                forwarded: Some(false),
                duration: EphemeralDuration::DISABLED,
                reply_to: None,
            })
            .to_api_request();

        let body = json_body(&request);
        assert!(!body.contains_key("duration"));
        assert_eq!(body["phone"], "5511999999999@s.whatsapp.net");
        assert_eq!(body["is_forwarded"], false);
    }

    #[test]
    fn test_duration_and_reply_are_sent_when_set() {
        let request = ActionRequest::json("/send/message")
            .recipient(user())
            .modifiers(Modifiers {
                forwarded: Some(true),
                duration: EphemeralDuration::new(604_800).unwrap(),
                reply_to: Some("3EB0ABC".into()),
            })
            .to_api_request();

        let body = json_body(&request);
        assert_eq!(body["duration"], 604_800);
        assert_eq!(body["reply_message_id"], "3EB0ABC");
        assert_eq!(body["is_forwarded"], true);
    }

    #[test]
    fn test_status_suppresses_reply_and_forwarded() {
        let request = ActionRequest::json("/send/message")
            .recipient(RecipientIdentifier::status_broadcast())
            .modifiers(Modifiers {
                forwarded: Some(true),
                duration: EphemeralDuration::DISABLED,
                reply_to: Some("3EB0ABC".into()),
            })
            .to_api_request();

        let body = json_body(&request);
        assert_eq!(body["phone"], "status@broadcast");
        assert_eq!(body["is_forwarded"], false);
        assert!(!body.contains_key("reply_message_id"));
    }

    #[test]
    fn test_query_encoding() {
        let request = ActionRequest::query("/user/avatar")
            .recipient(user())
            .field("is_preview", true)
            .to_api_request();

        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.query,
            vec![
                ("phone".to_string(), "5511999999999@s.whatsapp.net".to_string()),
                ("is_preview".to_string(), "true".to_string()),
            ]
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_multipart_includes_attachment() {
        let mut slot = AttachmentSlot::default();
        slot.attach_url("https://example.com/a.png");

        let request = ActionRequest::multipart("/send/image")
            .recipient(user())
            .field("caption", "look")
            .attachment(AttachmentRules::IMAGE, &slot)
            .to_api_request();

        match request.body {
            Some(RequestBody::Multipart(parts)) => {
                assert_eq!(parts[0], FormPart::text("phone", "5511999999999@s.whatsapp.net"));
                assert_eq!(parts[1], FormPart::text("caption", "look"));
                assert_eq!(parts[2], FormPart::text("image_url", "https://example.com/a.png"));
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }
}
