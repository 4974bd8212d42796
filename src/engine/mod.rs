//! Recognition engine boundary.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │             RecognitionEngineGateway (BlockRecognizer)        │
//! │                                                              │
//! │  ResourceProvider ──▶ EngineFactory ──▶ InkEngine (one)       │
//! │                                           │                  │
//! │             mode ──▶ session cache ──▶ RecognitionSession     │
//! │                      (keyed by type)      │  InkEditor        │
//! │                                           ▼                  │
//! │                            clear → convert → idle → export   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ink_to_text::config::{AppConfig, AppPaths};
//! use ink_to_text::engine::{BundleResources, EngineFactory, RecognitionEngineGateway};
//!
//! # fn vendor_factory() -> Arc<dyn EngineFactory> { unimplemented!() }
//! let config = AppConfig::load().unwrap_or_default();
//! let resources = BundleResources::new(&config.engine, &AppPaths::new());
//! let gateway = RecognitionEngineGateway::new(
//!     vendor_factory(),
//!     Arc::new(resources),
//!     &config.engine,
//!     &config.converter,
//! );
//! if gateway.engine().is_none() {
//!     eprintln!("{}", gateway.error_message().unwrap_or_default());
//! }
//! ```

pub mod backend;
pub mod error;
pub mod gateway;
pub mod mode;
pub mod resources;
pub mod session;

#[cfg(test)]
pub mod mock;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use backend::{
    BlockRecognizer, ConfigValue, ContentPart, EngineFactory, InkEditor, InkEngine, RendererSpec,
};
pub use error::{EngineError, RecognitionError};
pub use gateway::{GatewayError, RecognitionEngineGateway};
pub use mode::RecognitionMode;
pub use resources::{BundleResources, ResourceProvider};
pub use session::{RecognitionSession, SessionSettings};
