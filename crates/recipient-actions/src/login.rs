//! QR login with automatic refresh.
//!
//! The refresher fetches a QR link, counts its lifetime down once per tick
//! and fetches a fresh one when it reaches zero. It stops on the first
//! failed fetch, on [`QrLoginRefresher::stop`] and when dropped.

use crate::remap::ErrorRemapTable;
use async_trait::async_trait;
use bridge_client::{BridgeClient, BridgeError, LoginQr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[async_trait]
pub trait QrSource: Send + Sync {
    async fn fetch_qr(&self) -> Result<LoginQr, BridgeError>;
}

#[async_trait]
impl QrSource for BridgeClient {
    async fn fetch_qr(&self) -> Result<LoginQr, BridgeError> {
        self.login().await
    }
}

/// What the login view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QrState {
    pub link: Option<String>,
    pub remaining_secs: u64,
    /// Number of QR codes fetched since the last start.
    pub fetches: u32,
    pub error: Option<String>,
    pub running: bool,
}

pub struct QrLoginRefresher {
    source: Arc<dyn QrSource>,
    tick: Duration,
    state: Arc<watch::Sender<QrState>>,
    task: Option<JoinHandle<()>>,
}

impl QrLoginRefresher {
    pub fn new(source: Arc<dyn QrSource>) -> Self {
        Self::with_tick(source, Duration::from_secs(1))
    }

    /// Countdown step; one tick is one second of QR lifetime.
    pub fn with_tick(source: Arc<dyn QrSource>, tick: Duration) -> Self {
        let (state, _) = watch::channel(QrState::default());
        Self {
            source,
            tick,
            state: Arc::new(state),
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<QrState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> QrState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start refreshing, replacing any previous run.
    pub fn start(&mut self) {
        self.stop();
        self.state.send_replace(QrState {
            running: true,
            ..QrState::default()
        });

        let source = self.source.clone();
        let state = self.state.clone();
        let tick = self.tick;
        self.task = Some(tokio::spawn(refresh_loop(source, state, tick)));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("QR refresher stopped");
        }
        self.state.send_modify(|s| s.running = false);
    }
}

impl Drop for QrLoginRefresher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn refresh_loop(source: Arc<dyn QrSource>, state: Arc<watch::Sender<QrState>>, tick: Duration) {
    loop {
        let qr = match source.fetch_qr().await {
            Ok(qr) => qr,
            Err(err) => {
                warn!("QR login fetch failed: {}", err);
                let message = ErrorRemapTable::default().normalize(&err);
                state.send_modify(|s| {
                    s.link = None;
                    s.remaining_secs = 0;
                    s.error = Some(message);
                    s.running = false;
                });
                return;
            }
        };

        let mut remaining = qr.qr_duration.max(1);
        info!(expires_in = remaining, "New QR login code");
        state.send_modify(|s| {
            s.link = Some(qr.qr_link);
            s.remaining_secs = remaining;
            s.fetches += 1;
            s.error = None;
        });

        while remaining > 0 {
            tokio::time::sleep(tick).await;
            remaining -= 1;
            state.send_modify(|s| s.remaining_secs = remaining);
        }
    }
}
