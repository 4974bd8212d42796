//! Engine-facing traits.
//!
//! The handwriting engine itself is an external collaborator.  This module
//! describes the slice of its API the recognition core relies on:
//!
//! * [`EngineFactory`] — turns a credential blob into an engine handle.
//! * [`InkEngine`]     — configuration writes, content parts and editors.
//! * [`InkEditor`]     — pointer input, idle wait and export.
//!
//! [`BlockRecognizer`] is the seam the coordinator talks through.  The
//! gateway implements it on top of the traits above; tests substitute their
//! own implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::error::{EngineError, RecognitionError};
use crate::engine::mode::RecognitionMode;
use crate::ink::{PointerSink, Stroke};

// ---------------------------------------------------------------------------
// Configuration values
// ---------------------------------------------------------------------------

/// A value written into the engine's configuration store.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    StringArray(Vec<String>),
    Number(f64),
}

// ---------------------------------------------------------------------------
// Engine objects
// ---------------------------------------------------------------------------

/// A content part created inside a named content package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPart {
    pub package: String,
    pub part_type: String,
}

/// Resolution of the offscreen renderer an editor is paired with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSpec {
    pub dpi_x: f32,
    pub dpi_y: f32,
}

/// Creates engine handles from a recognition credential.
pub trait EngineFactory: Send + Sync {
    fn create(&self, certificate: &[u8]) -> Result<Arc<dyn InkEngine>, EngineError>;
}

/// A live engine handle.  Heavyweight: one per process is expected.
///
/// Calls may block.  On the recognition path they run on the blocking pool.
pub trait InkEngine: Send + Sync {
    fn configure(&self, key: &str, value: ConfigValue) -> Result<(), EngineError>;

    /// Create a package named `package` holding one part of `part_type`.
    fn create_part(&self, package: &str, part_type: &str) -> Result<ContentPart, EngineError>;

    /// Create an editor with its renderer / tool-controller pair.
    fn create_editor(&self, renderer: RendererSpec) -> Result<Box<dyn InkEditor>, EngineError>;
}

/// An editor bound to one content part.
///
/// Calls are synchronous and may block; the session only invokes them from
/// the blocking thread pool, one call sequence at a time.
pub trait InkEditor: PointerSink + Send {
    fn set_part(&mut self, part: ContentPart) -> Result<(), EngineError>;

    fn clear(&mut self) -> Result<(), EngineError>;

    /// Block until the engine has finished recognizing pending input.
    fn wait_for_idle(&mut self);

    fn supported_export_mime_types(&self) -> Vec<String>;

    fn export(&mut self, mime_type: &str) -> Result<String, EngineError>;
}

// ---------------------------------------------------------------------------
// BlockRecognizer
// ---------------------------------------------------------------------------

/// Recognizes the strokes of one block in the given mode.
#[async_trait]
pub trait BlockRecognizer: Send + Sync {
    async fn recognize(
        &self,
        mode: RecognitionMode,
        strokes: Arc<Vec<Stroke>>,
    ) -> Result<String, RecognitionError>;

    /// Drop any cached session for `mode` so the next call builds a fresh one.
    fn invalidate(&self, mode: RecognitionMode);
}

// Compile-time assertion: the traits must stay object-safe.
const _: fn() = || {
    fn _assert_object_safe(
        _: Box<dyn EngineFactory>,
        _: Box<dyn InkEngine>,
        _: Box<dyn InkEditor>,
        _: Box<dyn BlockRecognizer>,
    ) {
    }
};
