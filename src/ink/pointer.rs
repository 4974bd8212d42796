//! Pointer-event protocol spoken by recognition editors.
//!
//! The engine consumes ink as a stream of pointer events, one pointer id per
//! in-progress stroke.  Anything that can absorb that stream implements
//! [`PointerSink`]; editors do, and so does a plain `Vec<PointerEvent>`,
//! which the tests use to inspect converter output.

use crate::engine::EngineError;

/// Pointer ids the engine may still hold state for from a previous feed.
pub const MAX_POINTER_ID: i32 = 9;

/// The phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Terminates any state the engine holds for the pointer id.
    /// Carries no location.
    Cancel,
}

/// A single event in the engine's input protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    /// Synthetic timestamp in milliseconds.
    pub timestamp_ms: i64,
    pub force: f32,
    pub pointer_id: i32,
}

impl PointerEvent {
    pub fn cancel(pointer_id: i32) -> Self {
        Self {
            kind: PointerKind::Cancel,
            x: 0.0,
            y: 0.0,
            timestamp_ms: 0,
            force: 0.0,
            pointer_id,
        }
    }
}

/// Receiver of pointer events.
pub trait PointerSink {
    fn send_pointer(&mut self, event: PointerEvent) -> Result<(), EngineError>;
}

impl PointerSink for Vec<PointerEvent> {
    fn send_pointer(&mut self, event: PointerEvent) -> Result<(), EngineError> {
        self.push(event);
        Ok(())
    }
}
