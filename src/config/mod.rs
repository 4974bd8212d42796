//! Settings and filesystem locations.
//!
//! [`AppConfig`] groups recognition scheduling, engine bootstrap and
//! converter parameters in one TOML file under [`AppPaths::settings_file`].
//! Missing keys fall back to defaults, so a partial file is valid.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ConverterConfig, EngineConfig, RecognitionConfig, RendererConfig};
