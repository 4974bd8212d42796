//! Document persistence collaborator.
//!
//! The recognition core has no file format of its own.  After every
//! committed change the coordinator hands the full block list to a
//! [`DocumentSink`]; what happens next is the sink's business.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tokio::sync::Notify;

use crate::document::block::ContentBlock;

/// Receives the committed block list.
///
/// Called from the coordinator's serialized context; implementations must
/// not block on I/O there and must not panic on I/O failure.
pub trait DocumentSink: Send + Sync {
    fn store(&self, blocks: &[ContentBlock]);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DocumentSink for NullSink {
    fn store(&self, _blocks: &[ContentBlock]) {}
}

/// Writes the block list as pretty-printed JSON.
///
/// Inside a tokio runtime the write runs on the blocking pool.  Stores
/// that arrive while a write is in flight coalesce: only the newest block
/// list is written next.  Outside a runtime the write happens inline.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    inner: Arc<SinkInner>,
}

#[derive(Debug)]
struct SinkInner {
    path: PathBuf,
    pending: Mutex<Pending>,
    idle: Notify,
}

#[derive(Debug, Default)]
struct Pending {
    latest: Option<Vec<ContentBlock>>,
    writing: bool,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                path: path.into(),
                pending: Mutex::new(Pending::default()),
                idle: Notify::new(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Read a block list written by [`store`](DocumentSink::store).
    ///
    /// A missing file is an empty document.
    pub fn load(&self) -> Result<Vec<ContentBlock>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let blocks = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(blocks)
    }

    /// Wait until every stored block list has reached the disk.
    pub async fn flush(&self) {
        loop {
            let idle = self.inner.idle.notified();
            {
                let pending = self.inner.lock();
                if !pending.writing && pending.latest.is_none() {
                    return;
                }
            }
            idle.await;
        }
    }
}

impl SinkInner {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write queued block lists until none is left.
    fn drain(&self) {
        loop {
            let next = {
                let mut pending = self.lock();
                match pending.latest.take() {
                    Some(blocks) => blocks,
                    None => {
                        pending.writing = false;
                        break;
                    }
                }
            };
            if let Err(e) = self.write(&next) {
                log::warn!("document: failed to save {}: {e:#}", self.path.display());
            }
        }
        self.idle.notify_waiters();
    }

    fn write(&self, blocks: &[ContentBlock]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(blocks)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl DocumentSink for JsonFileSink {
    fn store(&self, blocks: &[ContentBlock]) {
        {
            let mut pending = self.inner.lock();
            pending.latest = Some(blocks.to_vec());
            if pending.writing {
                return;
            }
            pending.writing = true;
        }

        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || inner.drain());
            }
            Err(_) => inner.drain(),
        }
    }
}
