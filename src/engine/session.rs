//! A recognition session: one editor bound to one mode.
//!
//! # Flow
//!
//! ```text
//! recognize(strokes)
//!   ├─ strokes empty?          → Err(NoStrokesToRecognize)   (engine untouched)
//!   ├─ editor missing?         → Err(EngineNotInitialized)
//!   ├─ lock editor (async, owned guard, queued per session)
//!   ├─ spawn_blocking: clear → convert → wait_for_idle        ← suspension 1
//!   └─ spawn_blocking: supported types → export(mode type)    ← suspension 2
//! ```
//!
//! The owned guard travels into each blocking closure and back, so a caller
//! that stops awaiting half-way never leaves the editor half-fed: the
//! blocking step still finishes and releases the lock when it is done.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::engine::backend::{InkEditor, InkEngine, RendererSpec};
use crate::engine::error::{EngineError, RecognitionError};
use crate::engine::mode::RecognitionMode;
use crate::ink::{Stroke, StrokeProtocolConverter};

type EditorGuard = OwnedMutexGuard<Box<dyn InkEditor>>;

/// Construction parameters shared by every session of a gateway.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub renderer: RendererSpec,
    pub converter: StrokeProtocolConverter,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            renderer: RendererSpec {
                dpi_x: 96.0,
                dpi_y: 96.0,
            },
            converter: StrokeProtocolConverter::default(),
        }
    }
}

/// One configured editor bound to a [`RecognitionMode`].
///
/// Concurrent [`recognize`](Self::recognize) calls on the same session are
/// queued on the editor lock and run one at a time.
pub struct RecognitionSession {
    mode: RecognitionMode,
    package: Option<String>,
    editor: Option<Arc<Mutex<Box<dyn InkEditor>>>>,
    converter: StrokeProtocolConverter,
}

impl std::fmt::Debug for RecognitionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionSession")
            .field("mode", &self.mode)
            .field("package", &self.package)
            .field("initialized", &self.editor.is_some())
            .finish_non_exhaustive()
    }
}

impl RecognitionSession {
    /// Build a session for `mode` on `engine`.
    ///
    /// Construction is retried once under a fresh package name.  If that
    /// also fails the session is returned uninitialized and every
    /// `recognize` call fails with [`RecognitionError::EngineNotInitialized`].
    pub fn create(engine: &dyn InkEngine, mode: RecognitionMode, settings: &SessionSettings) -> Self {
        let mut session = Self {
            mode,
            package: None,
            editor: None,
            converter: settings.converter.clone(),
        };

        for attempt in 0..2 {
            let package = unique_package_name(mode);
            match build_editor(engine, mode, &package, settings.renderer) {
                Ok(editor) => {
                    log::debug!("session: {mode} ready (package {package})");
                    session.package = Some(package);
                    session.editor = Some(Arc::new(Mutex::new(editor)));
                    break;
                }
                Err(e) if attempt == 0 => {
                    log::warn!("session: {mode} setup failed ({e}), retrying with a new package");
                }
                Err(e) => {
                    log::error!("session: {mode} left uninitialized: {e}");
                }
            }
        }

        session
    }

    pub fn mode(&self) -> RecognitionMode {
        self.mode
    }

    pub fn is_initialized(&self) -> bool {
        self.editor.is_some()
    }

    /// Name of the content package the editor's part lives in.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Feed `strokes` to the editor and return the exported text.
    pub async fn recognize(&self, strokes: Arc<Vec<Stroke>>) -> Result<String, RecognitionError> {
        if strokes.is_empty() {
            return Err(RecognitionError::NoStrokesToRecognize);
        }
        let editor = self
            .editor
            .as_ref()
            .ok_or(RecognitionError::EngineNotInitialized)?;

        let guard = Arc::clone(editor).lock_owned().await;

        let converter = self.converter.clone();
        let (guard, fed) = tokio::task::spawn_blocking(move || {
            let mut guard: EditorGuard = guard;
            let fed = feed(&mut guard, &converter, &strokes);
            (guard, fed)
        })
        .await?;
        fed?;

        let mime_type = self.mode.mime_type();
        let (_guard, exported) = tokio::task::spawn_blocking(move || {
            let mut guard: EditorGuard = guard;
            let exported = export(&mut guard, mime_type);
            (guard, exported)
        })
        .await?;

        exported
    }

    /// Best-effort reset of the editor.
    ///
    /// Skipped while a recognition holds the editor; engine failures are
    /// logged and swallowed.
    pub fn clear(&self) {
        let Some(editor) = &self.editor else {
            return;
        };
        let Ok(mut guard) = editor.try_lock() else {
            log::debug!("session: {} busy, clear skipped", self.mode);
            return;
        };
        StrokeProtocolConverter::cancel_dangling(&mut **guard);
        if let Err(e) = guard.clear() {
            log::debug!("session: {} clear failed: {e}", self.mode);
        }
    }
}

fn unique_package_name(mode: RecognitionMode) -> String {
    format!("{}-{}", mode.label(), Uuid::new_v4().simple())
}

fn build_editor(
    engine: &dyn InkEngine,
    mode: RecognitionMode,
    package: &str,
    renderer: RendererSpec,
) -> Result<Box<dyn InkEditor>, EngineError> {
    let part = engine.create_part(package, mode.part_type())?;
    let mut editor = engine.create_editor(renderer)?;
    editor.set_part(part)?;
    Ok(editor)
}

fn feed(
    editor: &mut Box<dyn InkEditor>,
    converter: &StrokeProtocolConverter,
    strokes: &[Stroke],
) -> Result<(), RecognitionError> {
    editor.clear().map_err(RecognitionError::InputRejected)?;
    converter.convert(strokes, &mut **editor)?;
    editor.wait_for_idle();
    Ok(())
}

fn export(editor: &mut Box<dyn InkEditor>, mime_type: &str) -> Result<String, RecognitionError> {
    let supported = editor.supported_export_mime_types();
    if supported.is_empty() {
        return Err(RecognitionError::NoSupportedMimeTypes);
    }
    if !supported.iter().any(|m| m == mime_type) {
        return Err(RecognitionError::InvalidMimeType);
    }
    editor
        .export(mime_type)
        .map_err(RecognitionError::ExportFailed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
