//! Scripted in-memory engine for tests.
//!
//! [`ScriptedEngine`] records every call made against it into an
//! [`EngineLog`] and follows a mutable [`Script`] for failures, delays and
//! export results.  With no scripted export queued, an editor exports
//! `"<part type>:<number of strokes fed>"`, e.g. `"text:2"`, so tests can
//! tell which content a result came from.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::engine::backend::{
    ConfigValue, ContentPart, EngineFactory, InkEditor, InkEngine, RendererSpec,
};
use crate::engine::error::EngineError;
use crate::ink::{PointerEvent, PointerKind, PointerSink};

/// Everything observed by the engine and its editors.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub config: Vec<(String, ConfigValue)>,
    pub parts: Vec<ContentPart>,
    pub editors_created: usize,
    pub pointer_events: Vec<PointerEvent>,
    pub clears: usize,
    pub idle_waits: usize,
    pub exports: Vec<String>,
}

impl EngineLog {
    pub fn config_value(&self, key: &str) -> Option<&ConfigValue> {
        self.config.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Behaviour knobs, editable while the engine is in use.
#[derive(Debug, Default)]
pub struct Script {
    pub reject_config_keys: Vec<String>,
    pub fail_part_creations: usize,
    pub fail_editor_creations: usize,
    /// `None` means both text and LaTeX are exportable.
    pub supported_mime_types: Option<Vec<String>>,
    pub export_results: VecDeque<Result<String, EngineError>>,
    pub idle_delay: Duration,
    pub create_delay: Duration,
    pub reject_pointers: bool,
}

#[derive(Default)]
struct Shared {
    log: Mutex<EngineLog>,
    script: Mutex<Script>,
}

/// In-memory [`InkEngine`].  Cheap to clone; clones share log and script.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    shared: Arc<Shared>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, EngineLog> {
        self.shared.log.lock().unwrap()
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.shared.script.lock().unwrap()
    }

    pub fn push_export(&self, result: Result<String, EngineError>) {
        self.script().export_results.push_back(result);
    }
}

impl InkEngine for ScriptedEngine {
    fn configure(&self, key: &str, value: ConfigValue) -> Result<(), EngineError> {
        if self.script().reject_config_keys.iter().any(|k| k == key) {
            return Err(EngineError::new(10, format!("rejected key {key}")));
        }
        self.log().config.push((key.to_string(), value));
        Ok(())
    }

    fn create_part(&self, package: &str, part_type: &str) -> Result<ContentPart, EngineError> {
        {
            let mut script = self.script();
            if script.fail_part_creations > 0 {
                script.fail_part_creations -= 1;
                return Err(EngineError::new(11, format!("package {package} exists")));
            }
        }
        let part = ContentPart {
            package: package.to_string(),
            part_type: part_type.to_string(),
        };
        self.log().parts.push(part.clone());
        Ok(part)
    }

    fn create_editor(&self, _renderer: RendererSpec) -> Result<Box<dyn InkEditor>, EngineError> {
        let delay = self.script().create_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        {
            let mut script = self.script();
            if script.fail_editor_creations > 0 {
                script.fail_editor_creations -= 1;
                return Err(EngineError::new(12, "editor unavailable"));
            }
        }
        self.log().editors_created += 1;
        Ok(Box::new(ScriptedEditor {
            engine: self.clone(),
            part: None,
            strokes_fed: 0,
        }))
    }
}

struct ScriptedEditor {
    engine: ScriptedEngine,
    part: Option<ContentPart>,
    strokes_fed: usize,
}

impl PointerSink for ScriptedEditor {
    fn send_pointer(&mut self, event: PointerEvent) -> Result<(), EngineError> {
        if event.kind != PointerKind::Cancel && self.engine.script().reject_pointers {
            return Err(EngineError::new(13, "pointer rejected"));
        }
        if event.kind == PointerKind::Down {
            self.strokes_fed += 1;
        }
        self.engine.log().pointer_events.push(event);
        Ok(())
    }
}

impl InkEditor for ScriptedEditor {
    fn set_part(&mut self, part: ContentPart) -> Result<(), EngineError> {
        self.part = Some(part);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), EngineError> {
        self.strokes_fed = 0;
        self.engine.log().clears += 1;
        Ok(())
    }

    fn wait_for_idle(&mut self) {
        let delay = self.engine.script().idle_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.engine.log().idle_waits += 1;
    }

    fn supported_export_mime_types(&self) -> Vec<String> {
        self.engine
            .script()
            .supported_mime_types
            .clone()
            .unwrap_or_else(|| vec!["text/plain".into(), "application/x-latex".into()])
    }

    fn export(&mut self, mime_type: &str) -> Result<String, EngineError> {
        self.engine.log().exports.push(mime_type.to_string());
        if let Some(result) = self.engine.script().export_results.pop_front() {
            return result;
        }
        let part_type = self
            .part
            .as_ref()
            .map(|p| p.part_type.to_lowercase())
            .unwrap_or_default();
        Ok(format!("{part_type}:{}", self.strokes_fed))
    }
}

/// [`EngineFactory`] handing out one shared [`ScriptedEngine`].
pub struct ScriptedFactory {
    pub engine: ScriptedEngine,
    pub reject: bool,
    pub created: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self {
            engine,
            reject: false,
            created: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new(ScriptedEngine::new())
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&self, _certificate: &[u8]) -> Result<Arc<dyn InkEngine>, EngineError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(EngineError::new(1, "invalid certificate"));
        }
        Ok(Arc::new(self.engine.clone()))
    }
}
