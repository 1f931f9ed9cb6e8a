//! State shared by the console commands.
//!
//! One session owns the device context, the chat list and message views,
//! the QR refresher and the selected-chat handoff slot. Commands run one at
//! a time but hold the session through an `Arc`, so every mutable part sits
//! behind a Tokio mutex.

use async_trait::async_trait;
use bridge_client::{ApiRequest, ApiResponse, BridgeClient, BridgeError, ChatMessage, ChatSummary};
use recipient_actions::{
    ActionForm, ChatFilter, CoordinatorConfig, DeviceContext, Feedback, HandoffSlot,
    MediaDownloadCoordinator, MemorySlot, MessageFilter, Pager, QrLoginRefresher, ResultPresenter,
    SubmissionController, SubmitOutcome, Transport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

pub struct SessionSettings {
    pub initial_device: Option<String>,
    pub handoff: Arc<dyn HandoffSlot>,
    pub export_dir: PathBuf,
    pub chat_page_size: u64,
    pub message_page_size: u64,
    pub media: CoordinatorConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_device: None,
            handoff: Arc::new(MemorySlot::default()),
            export_dir: PathBuf::from("exports"),
            chat_page_size: 10,
            message_page_size: 20,
            media: CoordinatorConfig::default(),
        }
    }
}

/// The paged chat list with its filters.
pub struct ChatList {
    pub pager: Pager,
    pub filter: ChatFilter,
    pub rows: Vec<ChatSummary>,
}

/// Message view of one chat. Its downloader lives and dies with the view.
pub struct OpenChat {
    pub jid: String,
    pub pager: Pager,
    pub filter: MessageFilter,
    pub messages: Vec<ChatMessage>,
    pub media: MediaDownloadCoordinator,
}

pub struct Session {
    devices: Mutex<DeviceContext>,
    presenter: ResultPresenter,
    handoff: Arc<dyn HandoffSlot>,
    export_dir: PathBuf,
    message_page_size: u64,
    media: CoordinatorConfig,
    chats: Mutex<ChatList>,
    open_chat: Mutex<Option<OpenChat>>,
    qr: Mutex<Option<QrLoginRefresher>>,
}

impl Session {
    pub fn new(client: BridgeClient, settings: SessionSettings) -> Self {
        Self {
            devices: Mutex::new(DeviceContext::new(client, settings.initial_device)),
            presenter: ResultPresenter::default(),
            handoff: settings.handoff,
            export_dir: settings.export_dir,
            message_page_size: settings.message_page_size,
            media: settings.media,
            chats: Mutex::new(ChatList {
                pager: Pager::new(settings.chat_page_size),
                filter: ChatFilter::default(),
                rows: Vec::new(),
            }),
            open_chat: Mutex::new(None),
            qr: Mutex::new(None),
        }
    }

    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    pub fn handoff(&self) -> &dyn HandoffSlot {
        self.handoff.as_ref()
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub async fn devices(&self) -> MutexGuard<'_, DeviceContext> {
        self.devices.lock().await
    }

    /// Client tagged with the selected device.
    pub async fn client(&self) -> BridgeClient {
        self.devices.lock().await.client()
    }

    pub async fn chats(&self) -> MutexGuard<'_, ChatList> {
        self.chats.lock().await
    }

    pub async fn open_chat(&self) -> MutexGuard<'_, Option<OpenChat>> {
        self.open_chat.lock().await
    }

    /// Replace the message view; the previous downloader is dropped.
    pub async fn open(&self, jid: &str) -> MutexGuard<'_, Option<OpenChat>> {
        let client = Arc::new(self.client().await);
        let mut open = self.open_chat.lock().await;
        if let Some(previous) = open.take() {
            previous.media.shutdown().await;
        }
        info!(chat = jid, "Opened chat");
        *open = Some(OpenChat {
            jid: jid.to_string(),
            pager: Pager::new(self.message_page_size),
            filter: MessageFilter::default(),
            messages: Vec::new(),
            media: MediaDownloadCoordinator::new(client, self.media),
        });
        open
    }

    pub async fn qr(&self) -> MutexGuard<'_, Option<QrLoginRefresher>> {
        self.qr.lock().await
    }

    /// Controller whose requests go to whichever device is selected at send time.
    pub fn controller(self: &Arc<Self>) -> SubmissionController {
        SubmissionController::new(Arc::new(SelectedDevice(self.clone())))
    }

    pub async fn submit(
        &self,
        controller: &SubmissionController,
        form: &mut dyn ActionForm,
    ) -> String {
        let outcome = controller.submit(form).await;
        self.render_outcome(&outcome)
    }

    /// Banner, followed by the result payload when there is one.
    pub fn render_outcome(&self, outcome: &SubmitOutcome) -> String {
        let Some(feedback) = outcome.feedback() else {
            return self.error("Another request is still running");
        };
        let banner = self.presenter.banner(&feedback);
        match outcome {
            SubmitOutcome::Succeeded { results, .. } if has_content(results) => {
                let body = serde_json::to_string_pretty(results).unwrap_or_default();
                format!("{}\n{}", banner, body)
            }
            _ => banner,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.presenter.banner(&Feedback::Success(message.into()))
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.presenter.banner(&Feedback::Error(message.into()))
    }

    pub async fn shutdown(&self) {
        if let Some(mut refresher) = self.qr.lock().await.take() {
            refresher.stop();
        }
        if let Some(chat) = self.open_chat.lock().await.take() {
            chat.media.shutdown().await;
        }
    }
}

struct SelectedDevice(Arc<Session>);

#[async_trait]
impl Transport for SelectedDevice {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BridgeError> {
        self.0.client().await.execute(request).await
    }
}

fn has_content(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
