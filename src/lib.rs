//! Handwriting recognition core.
//!
//! Ink is organized into content blocks.  Each block is recognized on its
//! own, as plain text or as LaTeX, by an external handwriting engine, and
//! the results are merged into one document string.
//!
//! * [`ink`]         — strokes and their conversion into engine pointer events.
//! * [`engine`]      — engine initialization, per-mode sessions, error kinds.
//! * [`document`]    — content blocks, aggregate text, persistence sink.
//! * [`coordinator`] — debounced, cancellable, concurrent recognition passes.
//! * [`config`]      — TOML settings and platform paths.
//!
//! # Wiring
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ink_to_text::config::{AppConfig, AppPaths};
//! use ink_to_text::coordinator::{CoordinatorSettings, RecognitionCoordinator};
//! use ink_to_text::document::{BlockKind, JsonFileSink};
//! use ink_to_text::engine::{BundleResources, EngineFactory, RecognitionEngineGateway};
//!
//! # fn vendor_factory() -> Arc<dyn EngineFactory> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let paths = AppPaths::new();
//!
//!     let gateway = Arc::new(RecognitionEngineGateway::new(
//!         vendor_factory(),
//!         Arc::new(BundleResources::new(&config.engine, &paths)),
//!         &config.engine,
//!         &config.converter,
//!     ));
//!     let sink = JsonFileSink::new(paths.data_dir.join("document.json"));
//!     let blocks = sink.load()?;
//!
//!     let handle = RecognitionCoordinator::new(
//!         gateway,
//!         Arc::new(sink),
//!         CoordinatorSettings::from(&config.recognition),
//!     )
//!     .start();
//!     handle.load_blocks(blocks);
//!     handle.add_block(BlockKind::Math);
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod document;
pub mod engine;
pub mod ink;
