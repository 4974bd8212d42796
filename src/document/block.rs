//! Content blocks: the unit of independently recognizable ink.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::RecognitionMode;
use crate::ink::Stroke;

/// Stable block identifier, assigned at creation and never reused.
pub type BlockId = Uuid;

/// What a block holds.  Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Math,
}

impl BlockKind {
    pub fn mode(&self) -> RecognitionMode {
        match self {
            BlockKind::Text => RecognitionMode::Text,
            BlockKind::Math => RecognitionMode::Math,
        }
    }
}

/// One block of ink plus its last recognition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Owned exclusively by the block; replaced wholesale on edit.
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    /// `None` until the block has been recognized once.
    #[serde(default)]
    pub recognized_text: Option<String>,
    /// Strokes changed since the last settled recognition.
    #[serde(default)]
    pub dirty: bool,
}

impl ContentBlock {
    /// A fresh, empty block with a new id.
    pub fn new(kind: BlockKind) -> Self {
        Self::with_id(Uuid::new_v4(), kind)
    }

    pub fn with_id(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            strokes: Vec::new(),
            recognized_text: None,
            dirty: false,
        }
    }

    /// Needs a recognition pass: edited since last result, or never run.
    pub fn needs_recognition(&self) -> bool {
        self.dirty || self.recognized_text.is_none()
    }
}
