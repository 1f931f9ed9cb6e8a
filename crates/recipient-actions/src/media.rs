//! Bounded-concurrency downloader for message attachments.
//!
//! Each message id has one record moving through
//! `Pending -> Downloading -> Completed | Failed`. A dispatcher task admits
//! queued ids in FIFO order while fewer than `max_concurrent` downloads are
//! running, pausing `dispatch_delay` between admissions. A failed record only
//! goes back to `Pending` through [`MediaDownloadCoordinator::retry`] or a
//! [`RetryHandle`].

use crate::presenter::Table;
use crate::remap::ErrorRemapTable;
use crate::transport::Transport;
use bridge_client::{ApiRequest, ChatMessage, DownloadedMedia};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use urlencoding::encode;

pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;
pub const DEFAULT_DISPATCH_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub max_concurrent: usize,
    pub dispatch_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            dispatch_delay: DEFAULT_DISPATCH_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Completed,
    Failed(String),
}

impl DownloadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed(_) => "failed",
        }
    }
}

/// Download state of one message's media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMediaRecord {
    pub message_id: String,
    pub chat_jid: String,
    pub file_path: Option<String>,
    pub media_type: Option<String>,
    pub file_size: Option<u64>,
    pub filename: Option<String>,
    pub status: DownloadStatus,
}

/// A message that has something to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub message_id: String,
    pub chat_jid: String,
    pub media_type: Option<String>,
    pub filename: Option<String>,
}

impl MediaRequest {
    /// `None` when the message carries no media reference.
    pub fn from_message(message: &ChatMessage, chat_jid: &str) -> Option<Self> {
        if !message.has_media() {
            return None;
        }
        Some(Self {
            message_id: message.id.clone(),
            chat_jid: message
                .chat_jid
                .clone()
                .filter(|jid| !jid.is_empty())
                .unwrap_or_else(|| chat_jid.to_string()),
            media_type: message.media_type.clone(),
            filename: message.filename.clone(),
        })
    }
}

#[derive(Default)]
struct State {
    records: HashMap<String, DownloadedMediaRecord>,
    queue: VecDeque<String>,
    active: usize,
    peak: usize,
    closed: bool,
}

impl State {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.active == 0
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    config: CoordinatorConfig,
    state: Mutex<State>,
    /// Wakes the dispatcher: new work queued or a slot freed.
    wake: Notify,
    /// Wakes `wait_idle` callers after every completed download.
    settled: Notify,
}

impl Inner {
    async fn schedule(&self, request: MediaRequest) -> bool {
        let mut state = self.state.lock().await;
        if state.closed || state.records.contains_key(&request.message_id) {
            return false;
        }

        debug!(message_id = %request.message_id, "Queued media download");
        state.queue.push_back(request.message_id.clone());
        state.records.insert(
            request.message_id.clone(),
            DownloadedMediaRecord {
                message_id: request.message_id,
                chat_jid: request.chat_jid,
                file_path: None,
                media_type: request.media_type,
                file_size: None,
                filename: request.filename,
                status: DownloadStatus::Pending,
            },
        );
        drop(state);

        self.wake.notify_one();
        true
    }

    async fn retry(&self, message_id: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.closed {
            return false;
        }
        match state.records.get_mut(message_id) {
            Some(record) if matches!(record.status, DownloadStatus::Failed(_)) => {
                record.status = DownloadStatus::Pending;
            }
            _ => return false,
        }
        info!(message_id, "Retrying media download");
        state.queue.push_back(message_id.to_string());
        drop(state);

        self.wake.notify_one();
        true
    }

    /// Admit the next queued id if a slot is free.
    async fn admit(&self) -> Option<(String, String)> {
        let mut state = self.state.lock().await;
        if state.active >= self.config.max_concurrent {
            return None;
        }
        while let Some(message_id) = state.queue.pop_front() {
            let Some(record) = state.records.get_mut(&message_id) else {
                continue;
            };
            record.status = DownloadStatus::Downloading;
            let chat_jid = record.chat_jid.clone();

            state.active += 1;
            state.peak = state.peak.max(state.active);
            return Some((message_id, chat_jid));
        }
        None
    }

    async fn fetch(&self, message_id: &str, chat_jid: &str) -> Result<DownloadedMedia, String> {
        let request = ApiRequest::get(format!("/message/{}/download", encode(message_id)))
            .with_query("phone", chat_jid);
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| ErrorRemapTable::default().normalize(&e))?;
        serde_json::from_value(response.results).map_err(|e| format!("Invalid download result: {}", e))
    }

    async fn finish(&self, message_id: &str, result: Result<DownloadedMedia, String>) {
        let mut state = self.state.lock().await;
        state.active = state.active.saturating_sub(1);
        if let Some(record) = state.records.get_mut(message_id) {
            match result {
                Ok(media) => {
                    info!(message_id, path = %media.file_path, "Media downloaded");
                    record.file_path = Some(media.file_path);
                    if !media.media_type.is_empty() {
                        record.media_type = Some(media.media_type);
                    }
                    record.file_size = media.file_size;
                    if !media.filename.is_empty() {
                        record.filename = Some(media.filename);
                    }
                    record.status = DownloadStatus::Completed;
                }
                Err(reason) => {
                    warn!(message_id, "Media download failed: {}", reason);
                    record.status = DownloadStatus::Failed(reason);
                }
            }
        }
        drop(state);

        self.wake.notify_one();
        self.settled.notify_waiters();
    }
}

async fn dispatch_loop(inner: Arc<Inner>) {
    loop {
        if inner.state.lock().await.closed {
            return;
        }
        match inner.admit().await {
            Some((message_id, chat_jid)) => {
                debug!(%message_id, "Dispatching media download");
                let worker = inner.clone();
                tokio::spawn(async move {
                    let result = worker.fetch(&message_id, &chat_jid).await;
                    worker.finish(&message_id, result).await;
                });
                tokio::time::sleep(inner.config.dispatch_delay).await;
            }
            None => inner.wake.notified().await,
        }
    }
}

/// Sends retry requests to a coordinator without holding on to it.
#[derive(Debug, Clone)]
pub struct RetryHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl RetryHandle {
    /// Returns false once the coordinator is gone.
    pub fn request(&self, message_id: impl Into<String>) -> bool {
        self.tx.send(message_id.into()).is_ok()
    }
}

/// Per-view media downloader. Dropping it stops dispatching.
pub struct MediaDownloadCoordinator {
    inner: Arc<Inner>,
    retry_tx: mpsc::UnboundedSender<String>,
    dispatcher: JoinHandle<()>,
    retry_listener: JoinHandle<()>,
}

impl MediaDownloadCoordinator {
    /// Must be called from within a Tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, config: CoordinatorConfig) -> Self {
        let inner = Arc::new(Inner {
            transport,
            config: CoordinatorConfig {
                max_concurrent: config.max_concurrent.max(1),
                ..config
            },
            state: Mutex::new(State::default()),
            wake: Notify::new(),
            settled: Notify::new(),
        });

        let dispatcher = tokio::spawn(dispatch_loop(inner.clone()));

        let (retry_tx, mut retry_rx) = mpsc::unbounded_channel::<String>();
        let listener = inner.clone();
        let retry_listener = tokio::spawn(async move {
            while let Some(message_id) = retry_rx.recv().await {
                if !listener.retry(&message_id).await {
                    debug!(%message_id, "Ignored retry for a record that has not failed");
                }
            }
        });

        Self {
            inner,
            retry_tx,
            dispatcher,
            retry_listener,
        }
    }

    /// Queue a download unless the id already has a record.
    pub async fn schedule_download(&self, request: MediaRequest) -> bool {
        self.inner.schedule(request).await
    }

    /// Queue every message with media; returns how many were queued.
    pub async fn download_all_pending(&self, messages: &[ChatMessage], chat_jid: &str) -> usize {
        let mut queued = 0;
        for message in messages {
            if let Some(request) = MediaRequest::from_message(message, chat_jid) {
                if self.inner.schedule(request).await {
                    queued += 1;
                }
            }
        }
        queued
    }

    /// Move a failed record back to the queue.
    pub async fn retry(&self, message_id: &str) -> bool {
        self.inner.retry(message_id).await
    }

    pub fn retry_handle(&self) -> RetryHandle {
        RetryHandle {
            tx: self.retry_tx.clone(),
        }
    }

    pub async fn record(&self, message_id: &str) -> Option<DownloadedMediaRecord> {
        self.inner.state.lock().await.records.get(message_id).cloned()
    }

    pub async fn records(&self) -> Vec<DownloadedMediaRecord> {
        let state = self.inner.state.lock().await;
        let mut records: Vec<_> = state.records.values().cloned().collect();
        records.sort_by(|a, b| a.message_id.cmp(&b.message_id));
        records
    }

    /// Highest number of simultaneous downloads seen so far.
    pub async fn peak_downloading(&self) -> usize {
        self.inner.state.lock().await.peak
    }

    /// Wait until the queue is empty and nothing is downloading.
    pub async fn wait_idle(&self) {
        loop {
            let settled = self.inner.settled.notified();
            tokio::pin!(settled);
            settled.as_mut().enable();

            {
                let state = self.inner.state.lock().await;
                if state.is_idle() || state.closed {
                    return;
                }
            }
            settled.await;
        }
    }

    /// Stop dispatching and drop queued entries. Running downloads finish.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.closed = true;
        let dropped: Vec<String> = state.queue.drain(..).collect();
        for message_id in &dropped {
            state.records.remove(message_id);
        }
        drop(state);

        self.dispatcher.abort();
        self.retry_listener.abort();
        self.inner.settled.notify_waiters();
        debug!(dropped = dropped.len(), "Media coordinator shut down");
    }
}

impl Drop for MediaDownloadCoordinator {
    fn drop(&mut self) {
        self.dispatcher.abort();
        self.retry_listener.abort();
    }
}

/// Table of download records; failed rows show how to retry them.
pub fn download_table(records: &[DownloadedMediaRecord]) -> Table {
    let mut table = Table::new(["Message", "Type", "Status", "File"]);
    for record in records {
        let detail = match &record.status {
            DownloadStatus::Completed => record.file_path.clone().unwrap_or_default(),
            DownloadStatus::Failed(reason) => retry_markup(&record.message_id, reason),
            _ => record.filename.clone().unwrap_or_default(),
        };
        table.push([
            record.message_id.clone(),
            record.media_type.clone().unwrap_or_default(),
            record.status.label().to_string(),
            detail,
        ]);
    }
    table
}

/// Affordance rendered next to a failed download.
pub fn retry_markup(message_id: &str, reason: &str) -> String {
    format!("{} (retry: chat retry id={})", reason, message_id)
}
