//! Engine initialization and per-mode session caching.
//!
//! [`RecognitionEngineGateway`] is the only owner of the engine handle and
//! of every [`RecognitionSession`].  It is constructed explicitly by the
//! hosting application and shared with the coordinator behind an `Arc`.
//!
//! # Initialization
//!
//! ```text
//! credential ──▶ EngineFactory::create ──▶ search path ──▶ temp folder ──▶ renderer cosmetics
//!   missing?        rejected?                 unresolved?     unset?          (failures ignored)
//!      └──────────────┴───────────────────────────┴──────────────┘
//!                      no engine + readable error message
//! ```
//!
//! Initialization runs lazily on first use and is never retried on its own;
//! [`reload`](RecognitionEngineGateway::reload) re-attempts it on request.
//!
//! # Session cache
//!
//! Sessions are keyed by the mode's output content type.  Asking for a mode
//! other than the last one requested drops the whole cache.
//!
//! The synchronous accessors call into the engine directly.  The
//! [`BlockRecognizer`] path moves engine bring-up and session construction
//! onto the blocking pool, like every other engine call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ConverterConfig, EngineConfig, RendererConfig};
use crate::engine::backend::{BlockRecognizer, ConfigValue, EngineFactory, InkEngine, RendererSpec};
use crate::engine::error::{EngineError, RecognitionError};
use crate::engine::mode::RecognitionMode;
use crate::engine::resources::ResourceProvider;
use crate::engine::session::{RecognitionSession, SessionSettings};
use crate::ink::{Stroke, StrokeProtocolConverter};

const KEY_SEARCH_PATH: &str = "configuration-manager.search-path";
const KEY_TEMP_FOLDER: &str = "content-package.temp-folder";
const KEY_SHADOW_X: &str = "renderer.drop-shadow.x-offset";
const KEY_SHADOW_Y: &str = "renderer.drop-shadow.y-offset";
const KEY_SHADOW_COLOR: &str = "renderer.drop-shadow.color";
const KEY_SHADOW_RADIUS: &str = "renderer.drop-shadow.radius";

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Why the engine could not be brought up.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Recognition certificate is missing. Install the certificate issued for this application.")]
    MissingCertificate,

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(#[source] EngineError),

    #[error("No recognition asset directory could be found or created")]
    NoAssetSearchPath,

    #[error("Failed to set configuration search path: {0}")]
    SearchPathRejected(#[source] EngineError),

    #[error("No temporary folder is available for content packages")]
    TempFolderUnset,

    #[error("Failed to set temporary folder: {0}")]
    TempFolderRejected(#[source] EngineError),
}

// ---------------------------------------------------------------------------
// RecognitionEngineGateway
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GatewayState {
    attempted: bool,
    engine: Option<Arc<dyn InkEngine>>,
    error: Option<GatewayError>,
    sessions: HashMap<&'static str, Arc<RecognitionSession>>,
    active_mode: Option<RecognitionMode>,
}

/// Owns the engine handle and the per-mode session cache.
///
/// Clones share the same engine and cache.
#[derive(Clone)]
pub struct RecognitionEngineGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    factory: Arc<dyn EngineFactory>,
    resources: Arc<dyn ResourceProvider>,
    renderer: RendererConfig,
    session_settings: SessionSettings,
    state: Mutex<GatewayState>,
}

impl std::fmt::Debug for RecognitionEngineGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RecognitionEngineGateway")
            .field("initialized", &state.engine.is_some())
            .field("active_mode", &state.active_mode)
            .field("cached_sessions", &state.sessions.len())
            .finish_non_exhaustive()
    }
}

impl RecognitionEngineGateway {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        resources: Arc<dyn ResourceProvider>,
        engine: &EngineConfig,
        converter: &ConverterConfig,
    ) -> Self {
        let session_settings = SessionSettings {
            renderer: RendererSpec {
                dpi_x: engine.renderer.dpi_x,
                dpi_y: engine.renderer.dpi_y,
            },
            converter: StrokeProtocolConverter::from_config(converter),
        };
        Self {
            inner: Arc::new(GatewayInner {
                factory,
                resources,
                renderer: engine.renderer.clone(),
                session_settings,
                state: Mutex::new(GatewayState::default()),
            }),
        }
    }

    /// The engine handle, initializing it on first call.
    ///
    /// Returns `None` when initialization failed; see
    /// [`error_message`](Self::error_message).
    pub fn engine(&self) -> Option<Arc<dyn InkEngine>> {
        let mut state = self.lock();
        if !state.attempted {
            self.initialize(&mut state);
        }
        state.engine.clone()
    }

    /// Human-readable reason the engine is unavailable, if it is.
    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_ref().map(ToString::to_string)
    }

    /// Drop the engine and every session, then initialize again.
    pub fn reload(&self) -> Result<(), GatewayError> {
        let mut state = self.lock();
        *state = GatewayState::default();
        self.initialize(&mut state);
        match &state.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// The cached session for `mode`, building one if needed.
    pub fn session(&self, mode: RecognitionMode) -> Result<Arc<RecognitionSession>, RecognitionError> {
        let mut state = self.lock();
        if !state.attempted {
            self.initialize(&mut state);
        }
        let engine = state
            .engine
            .clone()
            .ok_or(RecognitionError::EngineNotInitialized)?;

        if state.active_mode != Some(mode) {
            if !state.sessions.is_empty() {
                log::debug!("gateway: mode switch to {mode}, dropping {} session(s)", state.sessions.len());
            }
            state.sessions.clear();
            state.active_mode = Some(mode);
        }

        let session = state
            .sessions
            .entry(mode.mime_type())
            .or_insert_with(|| {
                Arc::new(RecognitionSession::create(&*engine, mode, &self.inner.session_settings))
            });
        Ok(Arc::clone(session))
    }

    /// Forget the cached session for `mode`.  In-flight holders keep theirs.
    pub fn invalidate_session(&self, mode: RecognitionMode) {
        if self.lock().sessions.remove(mode.mime_type()).is_some() {
            log::debug!("gateway: {mode} session invalidated");
        }
    }

    /// Forget every cached session.
    pub fn invalidate_all(&self) {
        self.lock().sessions.clear();
    }

    /// Modes that currently have a cached session.
    pub fn cached_modes(&self) -> Vec<RecognitionMode> {
        let state = self.lock();
        RecognitionMode::ALL
            .into_iter()
            .filter(|m| state.sessions.contains_key(m.mime_type()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn initialize(&self, state: &mut GatewayState) {
        state.attempted = true;
        match self.build_engine() {
            Ok(engine) => {
                log::info!("gateway: recognition engine initialized");
                state.engine = Some(engine);
                state.error = None;
            }
            Err(e) => {
                log::error!("gateway: engine unavailable: {e}");
                state.engine = None;
                state.error = Some(e);
            }
        }
    }

    fn build_engine(&self) -> Result<Arc<dyn InkEngine>, GatewayError> {
        let certificate = self
            .inner
            .resources
            .credential()
            .ok_or(GatewayError::MissingCertificate)?;

        let engine = self
            .inner
            .factory
            .create(&certificate)
            .map_err(GatewayError::InvalidCertificate)?;

        let search_path = resolve_search_path(&self.inner.resources.asset_search_candidates())?;
        engine
            .configure(
                KEY_SEARCH_PATH,
                ConfigValue::StringArray(vec![search_path.display().to_string()]),
            )
            .map_err(GatewayError::SearchPathRejected)?;
        log::info!("gateway: asset search path {}", search_path.display());

        let temp = self.inner.resources.temp_dir().ok_or(GatewayError::TempFolderUnset)?;
        engine
            .configure(KEY_TEMP_FOLDER, ConfigValue::String(temp.display().to_string()))
            .map_err(GatewayError::TempFolderRejected)?;

        let cosmetics = [
            (KEY_SHADOW_X, self.inner.renderer.drop_shadow_x_offset),
            (KEY_SHADOW_Y, self.inner.renderer.drop_shadow_y_offset),
            (KEY_SHADOW_COLOR, f64::from(self.inner.renderer.drop_shadow_color)),
            (KEY_SHADOW_RADIUS, self.inner.renderer.drop_shadow_radius),
        ];
        for (key, value) in cosmetics {
            if let Err(e) = engine.configure(key, ConfigValue::Number(value)) {
                log::debug!("gateway: ignoring {key}: {e}");
            }
        }

        Ok(engine)
    }
}

/// First existing candidate; otherwise the first candidate, created on disk.
fn resolve_search_path(candidates: &[PathBuf]) -> Result<PathBuf, GatewayError> {
    if let Some(found) = candidates.iter().find(|p| p.is_dir()) {
        return Ok(found.clone());
    }
    let fallback = candidates.first().ok_or(GatewayError::NoAssetSearchPath)?;
    log::warn!(
        "gateway: no recognition assets found, creating {}",
        fallback.display()
    );
    std::fs::create_dir_all(fallback).map_err(|e| {
        log::error!("gateway: cannot create {}: {e}", fallback.display());
        GatewayError::NoAssetSearchPath
    })?;
    Ok(fallback.clone())
}

#[async_trait]
impl BlockRecognizer for RecognitionEngineGateway {
    async fn recognize(
        &self,
        mode: RecognitionMode,
        strokes: Arc<Vec<Stroke>>,
    ) -> Result<String, RecognitionError> {
        if strokes.is_empty() {
            return Err(RecognitionError::NoStrokesToRecognize);
        }
        let gateway = self.clone();
        let session = tokio::task::spawn_blocking(move || gateway.session(mode)).await??;
        session.recognize(strokes).await
    }

    fn invalidate(&self, mode: RecognitionMode) {
        self.invalidate_session(mode);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{ScriptedEngine, ScriptedFactory};
    use std::time::{Duration, Instant};
    use tempfile::{tempdir, TempDir};

    struct StaticResources {
        credential: Option<Vec<u8>>,
        candidates: Vec<PathBuf>,
        temp: Option<PathBuf>,
    }

    impl ResourceProvider for StaticResources {
        fn credential(&self) -> Option<Vec<u8>> {
            self.credential.clone()
        }
        fn asset_search_candidates(&self) -> Vec<PathBuf> {
            self.candidates.clone()
        }
        fn temp_dir(&self) -> Option<PathBuf> {
            self.temp.clone()
        }
    }

    fn resources(dir: &TempDir) -> StaticResources {
        let conf = dir.path().join("recognition-assets/conf");
        std::fs::create_dir_all(&conf).unwrap();
        StaticResources {
            credential: Some(vec![0xAB; 8]),
            candidates: vec![dir.path().join("missing"), conf],
            temp: Some(dir.path().join("tmp")),
        }
    }

    fn gateway_with(
        factory: Arc<ScriptedFactory>,
        resources: StaticResources,
    ) -> RecognitionEngineGateway {
        let _ = env_logger::builder().is_test(true).try_init();
        RecognitionEngineGateway::new(
            factory,
            Arc::new(resources),
            &EngineConfig::default(),
            &ConverterConfig::default(),
        )
    }

    fn stroke() -> Arc<Vec<Stroke>> {
        Arc::new(vec![Stroke::from_xy(&[(0.0, 0.0), (2.0, 2.0)], 1.0)])
    }

    #[test]
    fn initializes_lazily_and_only_once() {
        let dir = tempdir().unwrap();
        let factory = Arc::new(ScriptedFactory::new(ScriptedEngine::new()));
        let gw = gateway_with(Arc::clone(&factory), resources(&dir));

        assert_eq!(factory.created(), 0);
        assert!(gw.engine().is_some());
        assert!(gw.engine().is_some());
        assert_eq!(factory.created(), 1);
        assert!(gw.error_message().is_none());
    }

    #[test]
    fn writes_search_path_temp_folder_and_cosmetics() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));
        gw.engine().unwrap();

        let log = engine.log();
        let expected = dir.path().join("recognition-assets/conf").display().to_string();
        assert_eq!(
            log.config_value(KEY_SEARCH_PATH),
            Some(&ConfigValue::StringArray(vec![expected]))
        );
        assert_eq!(
            log.config_value(KEY_TEMP_FOLDER),
            Some(&ConfigValue::String(dir.path().join("tmp").display().to_string()))
        );
        assert_eq!(log.config_value(KEY_SHADOW_Y), Some(&ConfigValue::Number(5.0)));
        assert_eq!(log.config_value(KEY_SHADOW_COLOR), Some(&ConfigValue::Number(102.0)));
    }

    #[test]
    fn missing_credential_yields_no_engine_and_a_message() {
        let dir = tempdir().unwrap();
        let mut res = resources(&dir);
        res.credential = None;
        let factory = Arc::new(ScriptedFactory::new(ScriptedEngine::new()));
        let gw = gateway_with(Arc::clone(&factory), res);

        assert!(gw.engine().is_none());
        assert!(gw.error_message().unwrap().contains("certificate"));
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn rejected_certificate_is_reported() {
        let dir = tempdir().unwrap();
        let gw = gateway_with(Arc::new(ScriptedFactory::rejecting()), resources(&dir));
        assert!(gw.engine().is_none());
        assert!(gw.error_message().unwrap().starts_with("Invalid certificate"));
    }

    #[test]
    fn unset_temp_folder_fails_initialization() {
        let dir = tempdir().unwrap();
        let mut res = resources(&dir);
        res.temp = None;
        let gw = gateway_with(Arc::new(ScriptedFactory::new(ScriptedEngine::new())), res);
        assert!(gw.engine().is_none());
        assert!(matches!(gw.reload(), Err(GatewayError::TempFolderUnset)));
    }

    #[test]
    fn rejected_search_path_fails_but_cosmetic_rejection_does_not() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        engine.script().reject_config_keys = vec![KEY_SHADOW_RADIUS.to_string()];
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));
        assert!(gw.engine().is_some());

        engine.script().reject_config_keys = vec![KEY_SEARCH_PATH.to_string()];
        assert!(matches!(gw.reload(), Err(GatewayError::SearchPathRejected(_))));
        assert!(gw.engine().is_none());
    }

    #[test]
    fn search_path_falls_back_to_creating_first_candidate() {
        let dir = tempdir().unwrap();
        let wanted = dir.path().join("bundle/recognition-assets/conf");
        let res = StaticResources {
            credential: Some(vec![1]),
            candidates: vec![wanted.clone()],
            temp: Some(dir.path().to_path_buf()),
        };
        let gw = gateway_with(Arc::new(ScriptedFactory::new(ScriptedEngine::new())), res);
        assert!(gw.engine().is_some());
        assert!(wanted.is_dir());
    }

    #[test]
    fn no_candidates_means_no_search_path() {
        let dir = tempdir().unwrap();
        let mut res = resources(&dir);
        res.candidates.clear();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(ScriptedEngine::new())), res);
        assert!(gw.engine().is_none());
        assert!(gw.error_message().unwrap().contains("asset directory"));
    }

    #[test]
    fn failed_initialization_is_not_retried_until_reload() {
        let dir = tempdir().unwrap();
        let mut res = resources(&dir);
        res.credential = None;
        let gw = gateway_with(Arc::new(ScriptedFactory::new(ScriptedEngine::new())), res);
        assert!(gw.engine().is_none());
        assert_eq!(
            gw.session(RecognitionMode::Text).unwrap_err(),
            RecognitionError::EngineNotInitialized
        );
        assert!(matches!(gw.reload(), Err(GatewayError::MissingCertificate)));
    }

    #[test]
    fn reload_recovers_and_drops_sessions() {
        let dir = tempdir().unwrap();
        let factory = Arc::new(ScriptedFactory::new(ScriptedEngine::new()));
        let gw = gateway_with(Arc::clone(&factory), resources(&dir));
        gw.session(RecognitionMode::Text).unwrap();

        assert!(gw.reload().is_ok());
        assert!(gw.cached_modes().is_empty());
        assert_eq!(factory.created(), 2);
    }

    #[test]
    fn sessions_are_cached_per_mode() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));

        let a = gw.session(RecognitionMode::Text).unwrap();
        let b = gw.session(RecognitionMode::Text).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.log().editors_created, 1);
    }

    #[test]
    fn mode_switch_invalidates_every_cached_session() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));

        let text = gw.session(RecognitionMode::Text).unwrap();
        gw.session(RecognitionMode::Math).unwrap();
        assert_eq!(gw.cached_modes(), vec![RecognitionMode::Math]);

        let text_again = gw.session(RecognitionMode::Text).unwrap();
        assert!(!Arc::ptr_eq(&text, &text_again));
        assert_eq!(gw.cached_modes(), vec![RecognitionMode::Text]);
        assert_eq!(engine.log().editors_created, 3);
    }

    #[test]
    fn invalidate_session_forces_a_fresh_one() {
        let dir = tempdir().unwrap();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(ScriptedEngine::new())), resources(&dir));

        let first = gw.session(RecognitionMode::Math).unwrap();
        gw.invalidate_session(RecognitionMode::Math);
        assert!(gw.cached_modes().is_empty());
        let second = gw.session(RecognitionMode::Math).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn recognizer_routes_through_the_mode_session() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));

        let text = BlockRecognizer::recognize(&gw, RecognitionMode::Math, stroke())
            .await
            .unwrap();
        assert_eq!(text, "math:1");
    }

    #[tokio::test]
    async fn slow_session_construction_leaves_the_runtime_responsive() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        engine.script().create_delay = Duration::from_millis(500);
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));

        let started = Instant::now();
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            started.elapsed()
        });

        let text = BlockRecognizer::recognize(&gw, RecognitionMode::Text, stroke())
            .await
            .unwrap();
        assert_eq!(text, "text:1");
        assert!(ticker.await.unwrap() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn recognizer_short_circuits_empty_strokes() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let gw = gateway_with(Arc::new(ScriptedFactory::new(engine.clone())), resources(&dir));

        let err = BlockRecognizer::recognize(&gw, RecognitionMode::Text, Arc::new(Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err, RecognitionError::NoStrokesToRecognize);
        assert!(gw.cached_modes().is_empty());
        assert_eq!(engine.log().editors_created, 0);
    }
}
