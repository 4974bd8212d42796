//! Per-user and bundled directories for settings, assets and scratch space.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\ink-to-text\
//!   macOS:   ~/Library/Application Support/ink-to-text/
//!   Linux:   ~/.config/ink-to-text/
//!
//! Data dir (recognition assets):
//!   Windows: %LOCALAPPDATA%\ink-to-text\
//!   macOS:   ~/Library/Application Support/ink-to-text/
//!   Linux:   ~/.local/share/ink-to-text/
//!
//! Resource dir (bundled next to the executable): the directory holding the
//! running binary, falling back to the current directory.

use std::path::PathBuf;

/// Sub-path of the recognition configuration bundle inside a resource root.
const ASSET_CONF: &str = "recognition-assets/conf";

/// Resolved directories; see the module docs for the per-platform layout.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// `settings.toml` inside `config_dir`.
    pub settings_file: PathBuf,
    /// Per-user data directory.
    pub data_dir: PathBuf,
    /// Directory the application's bundled resources ship in.
    pub resource_dir: PathBuf,
    /// Scratch directory handed to the engine for content packages.
    pub temp_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "ink-to-text";

    /// Resolve every directory for the current user and executable.
    ///
    /// Anything the platform cannot name resolves under `.`.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let resource_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let temp_dir = std::env::temp_dir().join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            data_dir,
            resource_dir,
            temp_dir,
        }
    }

    /// Default recognition-asset search candidates, most specific first.
    pub fn default_asset_candidates(&self) -> Vec<PathBuf> {
        vec![
            self.resource_dir.join("Resources").join(ASSET_CONF),
            self.resource_dir.join(ASSET_CONF),
            self.data_dir.join(ASSET_CONF),
        ]
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
