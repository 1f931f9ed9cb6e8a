//! Bridge HTTP client.

use crate::error::BridgeError;
use crate::types::*;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Header that routes a request to one device slot.
pub const DEVICE_HEADER: &str = "X-Device-Id";

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: SecretString,
}

/// WhatsApp bridge REST API client.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct BridgeClient {
    client: Client,
    base_url: Arc<str>,
    device_id: Option<String>,
    auth: Option<BasicAuth>,
}

impl BridgeClient {
    /// Create a new bridge client.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BridgeError> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new bridge client with a request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').into(),
            device_id: None,
            auth: None,
        })
    }

    /// Attach HTTP basic credentials to every request.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: SecretString::new(password.into()),
        });
        self
    }

    /// Clone of this client tagged with a device slot.
    pub fn with_device(&self, device_id: Option<&str>) -> Self {
        Self {
            device_id: device_id.filter(|id| !id.is_empty()).map(String::from),
            ..self.clone()
        }
    }

    /// Device slot this client is tagged with.
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the bridge is reachable.
    pub async fn health_check(&self) -> bool {
        self.execute(ApiRequest::get("/devices")).await.is_ok()
    }

    /// Send one request and unwrap the response envelope.
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BridgeError> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), format!("{}{}", self.base_url, request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(device_id) = &self.device_id {
            builder = builder.header(DEVICE_HEADER, encode(device_id).into_owned());
        }
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.username, Some(auth.password.expose_secret()));
        }

        builder = match request.body {
            None => builder,
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Multipart(parts)) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await?;
        self.handle_response(response).await
    }

    /// Send one request and decode its `results` field.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, BridgeError> {
        let response = self.execute(request).await?;
        Ok(serde_json::from_value(response.results)?)
    }

    /// Request a fresh QR login code.
    pub async fn login(&self) -> Result<LoginQr, BridgeError> {
        self.fetch(ApiRequest::get("/app/login")).await
    }

    /// Request a pairing code for a phone number.
    pub async fn login_with_code(&self, phone: &str) -> Result<LoginCode, BridgeError> {
        self.fetch(ApiRequest::get("/app/login-with-code").with_query("phone", phone))
            .await
    }

    pub async fn logout(&self) -> Result<String, BridgeError> {
        Ok(self.execute(ApiRequest::get("/app/logout")).await?.message)
    }

    pub async fn reconnect(&self) -> Result<String, BridgeError> {
        Ok(self.execute(ApiRequest::get("/app/reconnect")).await?.message)
    }

    /// List device slots known to the bridge.
    pub async fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
        let response = self.execute(ApiRequest::get("/devices")).await?;
        if response.results.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(response.results)?)
    }

    /// Create a device slot, optionally with a caller-chosen id.
    pub async fn create_device(&self, device_id: Option<&str>) -> Result<CreatedDevice, BridgeError> {
        let body = match device_id {
            Some(id) if !id.is_empty() => serde_json::json!({ "device_id": id }),
            _ => serde_json::json!({}),
        };
        let response = self
            .execute(ApiRequest::post("/devices").with_json(body))
            .await?;
        if response.results.is_null() {
            return Ok(CreatedDevice::default());
        }
        Ok(serde_json::from_value(response.results)?)
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<String, BridgeError> {
        let path = format!("/devices/{}", encode(device_id));
        Ok(self.execute(ApiRequest::delete(path)).await?.message)
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>, BridgeError> {
        let page: Page<Contact> = self.fetch(ApiRequest::get("/user/my/contacts")).await?;
        Ok(page.data)
    }

    pub async fn groups(&self) -> Result<Vec<Group>, BridgeError> {
        let page: Page<Group> = self.fetch(ApiRequest::get("/user/my/groups")).await?;
        Ok(page.data)
    }

    pub async fn newsletters(&self) -> Result<Vec<Newsletter>, BridgeError> {
        let page: Page<Newsletter> = self.fetch(ApiRequest::get("/user/my/newsletters")).await?;
        Ok(page.data)
    }

    pub async fn privacy(&self) -> Result<serde_json::Value, BridgeError> {
        Ok(self.execute(ApiRequest::get("/user/my/privacy")).await?.results)
    }

    /// One page of chats; `query` carries offset/limit and filters.
    pub async fn chats(&self, query: Vec<(String, String)>) -> Result<Page<ChatSummary>, BridgeError> {
        let mut request = ApiRequest::get("/chats");
        request.query = query;
        self.fetch(request).await
    }

    /// One page of messages of a chat.
    pub async fn chat_messages(
        &self,
        chat_jid: &str,
        query: Vec<(String, String)>,
    ) -> Result<Page<ChatMessage>, BridgeError> {
        let mut request = ApiRequest::get(format!("/chat/{}/messages", chat_jid));
        request.query = query;
        self.fetch(request).await
    }

    /// Ask the bridge to fetch and store the media of a message.
    pub async fn download_media(
        &self,
        message_id: &str,
        chat_jid: &str,
    ) -> Result<DownloadedMedia, BridgeError> {
        let request = ApiRequest::get(format!("/message/{}/download", encode(message_id)))
            .with_query("phone", chat_jid);
        self.fetch(request).await
    }

    /// URL of the server-generated participant CSV of a group.
    pub fn participants_export_url(&self, group_jid: &str) -> String {
        format!(
            "{}/group/participants/export?group_id={}",
            self.base_url,
            encode(group_jid)
        )
    }

    /// Handle HTTP response, converting errors appropriately.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse, BridgeError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            debug!("Response body: {}", body.chars().take(200).collect::<String>());
            if body.trim().is_empty() {
                return Ok(ApiResponse::default());
            }
            return serde_json::from_str(&body).map_err(BridgeError::from);
        }

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) if !envelope.message.is_empty() => {
                warn!(status = status.as_u16(), "Bridge error: {}", envelope.message);
                Err(BridgeError::Api {
                    status: status.as_u16(),
                    message: envelope.message,
                })
            }
            _ => {
                warn!(status = status.as_u16(), "Bridge error without envelope");
                Err(BridgeError::Status(status.as_u16()))
            }
        }
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, BridgeError> {
    let mut form = Form::new();
    for part in parts {
        form = match part.value {
            PartValue::Text(value) => form.text(part.name, value),
            PartValue::File {
                filename,
                mime,
                bytes,
            } => {
                let file_part = Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(&mime)
                    .map_err(|e| BridgeError::InvalidPart {
                        name: part.name.clone(),
                        reason: e.to_string(),
                    })?;
                form.part(part.name, file_part)
            }
        };
    }
    Ok(form)
}
