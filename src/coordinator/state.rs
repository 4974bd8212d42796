//! Block state machine and the published document snapshot.
//!
//! [`BlockTable`] is the single source of truth for block content and
//! recognition results.  Only the coordinator task touches it, so every
//! transition below is serialized.
//!
//! [`DocumentSnapshot`] is what the UI sees, delivered through a
//! [`StatePublisher`] that drops updates equal to the previous one.

use std::sync::Arc;

use tokio::sync::watch;

use crate::document::{aggregate_text, BlockId, BlockKind, ContentBlock};
use crate::engine::RecognitionError;
use crate::ink::Stroke;

// ---------------------------------------------------------------------------
// BlockPhase
// ---------------------------------------------------------------------------

/// Recognition phase of one block.
///
/// ```text
/// Idle ──edit──▶ Dirty ──pass selects it──▶ Recognizing ──result──▶ Settled
///                  ▲                             │
///                  └────────edit while in flight─┘
/// Settled ──edit──▶ Dirty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockPhase {
    /// Never edited nor recognized.
    #[default]
    Idle,
    /// Content changed since the last settled result.
    Dirty,
    /// Selected by the current pass; a result is pending.
    Recognizing,
    /// Holds a result (possibly a failure placeholder) for its content.
    Settled,
}

impl BlockPhase {
    pub fn label(&self) -> &'static str {
        match self {
            BlockPhase::Idle => "Idle",
            BlockPhase::Dirty => "Dirty",
            BlockPhase::Recognizing => "Recognizing",
            BlockPhase::Settled => "Settled",
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentSnapshot
// ---------------------------------------------------------------------------

/// Outbound state for the view layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSnapshot {
    pub blocks: Vec<ContentBlock>,
    pub aggregate_text: String,
    pub is_recognizing: bool,
}

impl DocumentSnapshot {
    pub fn block(&self, id: BlockId) -> Option<&ContentBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

// ---------------------------------------------------------------------------
// StatePublisher
// ---------------------------------------------------------------------------

/// Publish-on-change cell.  Subscribers are only woken when the new value
/// differs from the current one.
#[derive(Debug)]
pub struct StatePublisher<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq> StatePublisher<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the value; returns `true` if subscribers were notified.
    pub fn publish(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }
}

// ---------------------------------------------------------------------------
// BlockTable
// ---------------------------------------------------------------------------

/// Unit of work handed to one recognition task.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: BlockId,
    pub kind: BlockKind,
    pub strokes: Arc<Vec<Stroke>>,
    /// Content revision the strokes were taken from.
    pub revision: u64,
}

/// What happened to a recognition outcome offered to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Recorded; the block is settled.
    Committed,
    /// The block was deleted before the result arrived.
    Deleted,
    /// The block was edited after its strokes were taken.
    Stale,
}

#[derive(Debug, Clone)]
struct Entry {
    block: ContentBlock,
    phase: BlockPhase,
    revision: u64,
}

/// Ordered blocks plus per-block phase and content revision.
#[derive(Debug, Clone)]
pub struct BlockTable {
    entries: Vec<Entry>,
    error_placeholder: String,
}

impl BlockTable {
    pub fn new(error_placeholder: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            error_placeholder: error_placeholder.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn blocks(&self) -> Vec<ContentBlock> {
        self.entries.iter().map(|e| e.block.clone()).collect()
    }

    pub fn phase(&self, id: BlockId) -> Option<BlockPhase> {
        self.entry(id).map(|e| e.phase)
    }

    pub fn block(&self, id: BlockId) -> Option<&ContentBlock> {
        self.entry(id).map(|e| &e.block)
    }

    /// Append an empty block.  Ignored if `id` is already present.
    pub fn add(&mut self, id: BlockId, kind: BlockKind) -> bool {
        if self.entry(id).is_some() {
            return false;
        }
        self.entries.push(Entry {
            block: ContentBlock::with_id(id, kind),
            phase: BlockPhase::Idle,
            revision: 0,
        });
        true
    }

    /// Replace the whole table with a loaded document.
    pub fn load(&mut self, blocks: Vec<ContentBlock>) {
        self.entries = blocks
            .into_iter()
            .map(|block| Entry {
                phase: if block.dirty {
                    BlockPhase::Dirty
                } else if block.recognized_text.is_some() {
                    BlockPhase::Settled
                } else {
                    BlockPhase::Idle
                },
                block,
                revision: 0,
            })
            .collect();
    }

    /// Swap in new strokes.  Any result pending for the old content becomes
    /// stale.
    pub fn update_strokes(&mut self, id: BlockId, strokes: Vec<Stroke>) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.block.strokes = strokes;
        entry.block.dirty = true;
        entry.revision += 1;
        entry.phase = BlockPhase::Dirty;
        true
    }

    pub fn remove(&mut self, id: BlockId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.block.id != id);
        self.entries.len() != before
    }

    /// Mark every block that needs recognition as in flight and return the
    /// work for it.
    pub fn select_for_pass(&mut self) -> Vec<WorkItem> {
        self.entries
            .iter_mut()
            .filter(|e| e.block.needs_recognition())
            .map(|e| {
                e.phase = BlockPhase::Recognizing;
                WorkItem {
                    id: e.block.id,
                    kind: e.block.kind,
                    strokes: Arc::new(e.block.strokes.clone()),
                    revision: e.revision,
                }
            })
            .collect()
    }

    /// Offer a recognition outcome for the content at `revision`.
    pub fn apply(
        &mut self,
        id: BlockId,
        revision: u64,
        outcome: Result<String, RecognitionError>,
    ) -> Applied {
        let placeholder = self.error_placeholder.clone();
        let Some(entry) = self.entry_mut(id) else {
            return Applied::Deleted;
        };
        if entry.revision != revision {
            return Applied::Stale;
        }

        entry.block.recognized_text = match outcome {
            Ok(text) => Some(text),
            Err(RecognitionError::NoStrokesToRecognize) => Some(String::new()),
            // Keep the last real result; an empty one is no result.
            Err(_) => match entry.block.recognized_text.take() {
                Some(text) if !text.is_empty() => Some(text),
                _ => Some(placeholder),
            },
        };
        entry.block.dirty = false;
        entry.phase = BlockPhase::Settled;
        Applied::Committed
    }

    pub fn aggregate_text(&self) -> String {
        aggregate_text(&self.blocks())
    }

    pub fn snapshot(&self, is_recognizing: bool) -> DocumentSnapshot {
        let blocks = self.blocks();
        DocumentSnapshot {
            aggregate_text: aggregate_text(&blocks),
            blocks,
            is_recognizing,
        }
    }

    fn entry(&self, id: BlockId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.block.id == id)
    }

    fn entry_mut(&mut self, id: BlockId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.block.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
