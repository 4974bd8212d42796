//! Document model: content blocks, aggregate text and the persistence
//! collaborator interface.

pub mod aggregate;
pub mod block;
pub mod sink;

pub use aggregate::{aggregate_text, BLOCK_SEPARATOR, MATH_DELIMITER};
pub use block::{BlockId, BlockKind, ContentBlock};
pub use sink::{DocumentSink, JsonFileSink, NullSink};
