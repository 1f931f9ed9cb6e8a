//! One-shot handoff of the selected chat between two views.
//!
//! The producer puts a JID under [`SELECTED_CHAT_KEY`]; the consumer takes
//! it exactly once, which clears the slot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

pub const SELECTED_CHAT_KEY: &str = "selectedChatJid";

#[async_trait]
pub trait HandoffSlot: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> std::io::Result<()>;

    /// Read and clear.
    async fn take(&self, key: &str) -> std::io::Result<Option<String>>;
}

#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl HandoffSlot for MemorySlot {
    async fn put(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn take(&self, key: &str) -> std::io::Result<Option<String>> {
        Ok(self.values.lock().await.remove(key))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SlotFile {
    #[serde(flatten)]
    values: HashMap<String, String>,
}

/// Slot persisted as a small JSON object, so a handoff survives restarts.
#[derive(Debug)]
pub struct FileSlot {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> std::io::Result<SlotFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(SlotFile::default()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SlotFile::default()),
            Err(e) => Err(e),
        }
    }

    async fn store(&self, file: &SlotFile) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(file)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        tokio::fs::write(&self.path, bytes).await
    }
}

#[async_trait]
impl HandoffSlot for FileSlot {
    async fn put(&self, key: &str, value: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        file.values.insert(key.to_string(), value.to_string());
        self.store(&file).await
    }

    async fn take(&self, key: &str) -> std::io::Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let value = file.values.remove(key);
        if value.is_some() {
            self.store(&file).await?;
            debug!(key, "Handoff slot consumed");
        }
        Ok(value)
    }
}
