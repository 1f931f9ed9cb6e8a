//! Bridge API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP verbs used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One value of a multipart form body.
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        filename: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Named multipart form part.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File {
                filename: filename.into(),
                mime: mime.into(),
                bytes,
            },
        }
    }
}

/// Outgoing request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A single call against the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }
}

/// Success envelope returned by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Value,
}

/// Error envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub message: String,
}

/// QR login data.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginQr {
    pub qr_link: String,
    /// Seconds before the QR code expires.
    pub qr_duration: u64,
}

/// Pairing code login data.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCode {
    pub pair_code: String,
}

/// Session state of a device slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    LoggedIn,
    LoggedOut,
    Connected,
    Disconnected,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Device slot as listed by `GET /devices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    /// Older bridges report the identifier under `device`.
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub jid: Option<String>,
    #[serde(default)]
    pub state: DeviceState,
}

impl Device {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().or(self.device.as_deref())
    }
}

/// Result of `POST /devices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedDevice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Pagination block attached to list results.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub total: u64,
}

/// List results, optionally paginated.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn total(&self) -> u64 {
        self.pagination
            .map(|p| p.total)
            .unwrap_or(self.data.len() as u64)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Contact {
    pub jid: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSummary {
    pub jid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub chat_jid: Option<String>,
    #[serde(default)]
    pub sender_jid: Option<String>,
    #[serde(default)]
    pub push_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_from_me: bool,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_length: Option<u64>,
}

impl ChatMessage {
    /// Messages with a media type and a remote reference can be downloaded.
    pub fn has_media(&self) -> bool {
        self.media_type.as_deref().is_some_and(|t| !t.is_empty())
            && self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Result of `GET /message/{id}/download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadedMedia {
    pub file_path: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupParticipant {
    #[serde(rename = "JID")]
    pub jid: String,
    #[serde(rename = "PhoneNumber", default)]
    pub phone_number: Option<String>,
    #[serde(rename = "IsAdmin", default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    #[serde(rename = "JID")]
    pub jid: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "OwnerJID", default)]
    pub owner_jid: String,
    #[serde(rename = "Participants", default)]
    pub participants: Vec<GroupParticipant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Newsletter {
    pub id: String,
    #[serde(default)]
    pub thread_metadata: Option<Value>,
}

impl Newsletter {
    pub fn name(&self) -> Option<&str> {
        self.thread_metadata
            .as_ref()?
            .get("name")?
            .get("text")?
            .as_str()
    }
}
