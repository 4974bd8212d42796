//! Platform resource lookup for engine initialization.
//!
//! The gateway never touches the filesystem layout directly; it asks a
//! [`ResourceProvider`] for the credential blob, the prioritized asset
//! search-path candidates and the scratch folder.  A missing credential or
//! search path is a configuration problem of the hosting application.

use std::path::{Path, PathBuf};

use crate::config::{AppPaths, EngineConfig};

/// File name of the credential blob when no explicit path is configured.
pub const DEFAULT_CERTIFICATE_FILE: &str = "certificate.bin";

/// Source of the engine's credential and on-disk resources.
pub trait ResourceProvider: Send + Sync {
    /// The recognition certificate, or `None` if it is absent or empty.
    fn credential(&self) -> Option<Vec<u8>>;

    /// Asset search-path candidates, most preferred first.
    fn asset_search_candidates(&self) -> Vec<PathBuf>;

    /// Folder the engine may use for temporary content packages.
    fn temp_dir(&self) -> Option<PathBuf>;
}

/// Resources bundled with the application, located through [`AppPaths`]
/// and overridden by [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct BundleResources {
    certificate_file: PathBuf,
    candidates: Vec<PathBuf>,
    temp_dir: PathBuf,
}

impl BundleResources {
    pub fn new(config: &EngineConfig, paths: &AppPaths) -> Self {
        let certificate_file = config
            .certificate_file
            .clone()
            .unwrap_or_else(|| paths.resource_dir.join(DEFAULT_CERTIFICATE_FILE));

        let mut candidates = config.asset_dirs.clone();
        for candidate in paths.default_asset_candidates() {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        let temp_dir = config
            .temp_dir
            .clone()
            .unwrap_or_else(|| paths.temp_dir.clone());

        Self {
            certificate_file,
            candidates,
            temp_dir,
        }
    }

    pub fn certificate_file(&self) -> &Path {
        &self.certificate_file
    }
}

impl ResourceProvider for BundleResources {
    fn credential(&self) -> Option<Vec<u8>> {
        match std::fs::read(&self.certificate_file) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                log::debug!(
                    "resources: certificate {} unreadable: {e}",
                    self.certificate_file.display()
                );
                None
            }
        }
    }

    fn asset_search_candidates(&self) -> Vec<PathBuf> {
        self.candidates.clone()
    }

    fn temp_dir(&self) -> Option<PathBuf> {
        Some(self.temp_dir.clone())
    }
}
