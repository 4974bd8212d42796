//! Ink model and the engine's pointer-event input protocol.
//!
//! * [`Stroke`] / [`InkPoint`] — immutable pen strokes captured by the
//!   drawing surface.
//! * [`PointerEvent`] / [`PointerSink`] — the down/move/up/cancel stream an
//!   editor consumes.
//! * [`StrokeProtocolConverter`] — stateless strokes → pointer-event
//!   translator.

pub mod convert;
pub mod pointer;
pub mod stroke;

pub use convert::{ConversionError, StrokeProtocolConverter};
pub use pointer::{PointerEvent, PointerKind, PointerSink, MAX_POINTER_ID};
pub use stroke::{InkPoint, Stroke, MAX_RESAMPLED_POINTS};
