//! Device slots and the currently selected one.
//!
//! Selecting a device has no server-side effect; it only tags later
//! requests with the device header.

use crate::error::{ActionError, ValidationError};
use bridge_client::{BridgeClient, BridgeError, Device, DeviceState};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: String,
    pub jid: Option<String>,
    pub state: DeviceState,
}

impl DeviceRecord {
    /// Devices without any identifier cannot be addressed and are skipped.
    pub fn from_device(device: &Device) -> Option<Self> {
        Some(Self {
            id: device.id()?.to_string(),
            jid: device.jid.clone().filter(|jid| !jid.is_empty()),
            state: device.state,
        })
    }
}

pub struct DeviceContext {
    client: BridgeClient,
    devices: Vec<DeviceRecord>,
    current: Option<String>,
}

impl DeviceContext {
    pub fn new(client: BridgeClient, initial: Option<String>) -> Self {
        Self {
            client: client.with_device(None),
            devices: Vec::new(),
            current: initial.filter(|id| !id.is_empty()),
        }
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&DeviceRecord> {
        let id = self.current.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }

    /// Client tagged with the selected device.
    pub fn client(&self) -> BridgeClient {
        self.client.with_device(self.current.as_deref())
    }

    /// Replace the list; the first device is selected when none is.
    pub fn update(&mut self, devices: &[Device]) {
        self.devices = devices.iter().filter_map(DeviceRecord::from_device).collect();
        if self.current.is_none() {
            if let Some(first) = self.devices.first() {
                info!(device = %first.id, "Selected first device");
                self.current = Some(first.id.clone());
            }
        }
    }

    pub fn select(&mut self, id: &str) -> Result<(), ValidationError> {
        if !self.devices.iter().any(|d| d.id == id) {
            return Err(ValidationError::UnknownDevice(id.to_string()));
        }
        self.current = Some(id.to_string());
        Ok(())
    }

    pub async fn refresh(&mut self) -> Result<&[DeviceRecord], BridgeError> {
        let devices = self.client.list_devices().await?;
        self.update(&devices);
        Ok(&self.devices)
    }

    /// Create a slot and reload the list. Returns the new id when known.
    pub async fn create(&mut self, id: Option<&str>) -> Result<Option<String>, BridgeError> {
        let created = self.client.create_device(id).await?;
        let new_id = created
            .id
            .or(created.device_id)
            .or_else(|| id.map(String::from));
        self.refresh().await?;
        Ok(new_id)
    }

    /// Log the device out, then delete it. A failed logout is ignored.
    pub async fn delete(&mut self, id: &str) -> Result<String, ActionError> {
        if let Err(err) = self.client.with_device(Some(id)).logout().await {
            warn!(device = id, "Logout before delete failed: {}", err);
        }

        let message = self.client.delete_device(id).await?;
        self.devices.retain(|d| d.id != id);
        if self.current.as_deref() == Some(id) {
            info!(device = id, "Deleted the selected device");
            self.current = None;
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_client::DEVICE_HEADER;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_devices(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "results": [
                    {"id": "office", "jid": "5511999999999@s.whatsapp.net", "state": "logged_in"},
                    {"id": "home", "state": "logged_out"},
                    {"state": "connected"}
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_refresh_selects_first_device() {
        let server = MockServer::start().await;
        mount_devices(&server).await;

        let mut context = DeviceContext::new(BridgeClient::new(server.uri()).unwrap(), None);
        let devices = context.refresh().await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(context.current_id(), Some("office"));
        assert_eq!(context.client().device_id(), Some("office"));
        assert_eq!(context.current().unwrap().state, DeviceState::LoggedIn);
    }

    #[tokio::test]
    async fn test_refresh_keeps_existing_selection() {
        let server = MockServer::start().await;
        mount_devices(&server).await;

        let mut context =
            DeviceContext::new(BridgeClient::new(server.uri()).unwrap(), Some("home".into()));
        context.refresh().await.unwrap();

        assert_eq!(context.current_id(), Some("home"));
    }

    #[tokio::test]
    async fn test_select_unknown_device() {
        let server = MockServer::start().await;
        mount_devices(&server).await;

        let mut context = DeviceContext::new(BridgeClient::new(server.uri()).unwrap(), None);
        context.refresh().await.unwrap();

        assert_eq!(
            context.select("garage"),
            Err(ValidationError::UnknownDevice("garage".into()))
        );
        assert!(context.select("home").is_ok());
        assert_eq!(context.client().device_id(), Some("home"));
    }

    #[tokio::test]
    async fn test_delete_current_device_clears_selection() {
        let server = MockServer::start().await;
        mount_devices(&server).await;

        Mock::given(method("GET"))
            .and(path("/app/logout"))
            .and(header(DEVICE_HEADER, "office"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/devices/office"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Device deleted"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut context = DeviceContext::new(BridgeClient::new(server.uri()).unwrap(), None);
        context.refresh().await.unwrap();

        let message = context.delete("office").await.unwrap();

        assert_eq!(message, "Device deleted");
        assert_eq!(context.current_id(), None);
        assert_eq!(context.devices().len(), 1);
        assert_eq!(context.client().device_id(), None);
    }
}
