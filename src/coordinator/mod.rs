//! Recognition coordinator for a document of content blocks.
//!
//! # Architecture
//!
//! ```text
//! CoordinatorHandle ──Command (mpsc)──▶ coordinator task
//!                                         │  BlockTable (serialized)
//!                                         │  Debouncer
//!                                         │
//!                                         ├─ pass: CancellationToken
//!                                         │    └─ tokio::spawn per block
//!                                         │         └─ recognize_with_retry
//!                                         │              └─ BlockRecognizer
//!                                         │
//!                                         ├─▶ DocumentSink::store
//!                                         └─▶ StatePublisher<DocumentSnapshot>
//!                                                   │
//! subscribe() ◀──── watch::Receiver ◀───────────────┘
//! ```

pub mod debounce;
pub mod retry;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use debounce::Debouncer;
pub use retry::{recognize_with_retry, RetryPolicy};
pub use runner::{CoordinatorHandle, CoordinatorSettings, RecognitionCoordinator};
pub use state::{Applied, BlockPhase, BlockTable, DocumentSnapshot, StatePublisher, WorkItem};
