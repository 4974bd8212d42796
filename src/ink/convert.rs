//! Stroke → pointer-event conversion.
//!
//! [`StrokeProtocolConverter`] is stateless: it turns a block's strokes into
//! the down / move / up / cancel stream an editor expects.  It runs on
//! whatever thread calls it; the session calls it from the blocking pool.
//!
//! ```text
//! cancel 0..=9                      (flush leftovers from a partial feed)
//! for stroke i:
//!     id = i % 9 + 1
//!     down(p0) move(p1) … move(pn-1) up(pn)   t += time_step per event
//!     cancel(id)
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::config::ConverterConfig;
use crate::engine::EngineError;
use crate::ink::pointer::{PointerEvent, PointerKind, PointerSink, MAX_POINTER_ID};
use crate::ink::stroke::{InkPoint, Stroke};

/// Failure while feeding pointer events into an editor.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("pointer {pointer_id} rejected by engine: {source}")]
    Rejected {
        pointer_id: i32,
        #[source]
        source: EngineError,
    },
}

impl ConversionError {
    /// The engine error behind the rejection.
    pub fn engine_error(&self) -> &EngineError {
        match self {
            ConversionError::Rejected { source, .. } => source,
        }
    }
}

/// Translates strokes into the engine's pointer protocol.
#[derive(Debug, Clone)]
pub struct StrokeProtocolConverter {
    resample_interval: f32,
    time_step_ms: i64,
}

impl Default for StrokeProtocolConverter {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

impl StrokeProtocolConverter {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            resample_interval: config.resample_interval,
            time_step_ms: config.time_step_ms.max(1),
        }
    }

    /// Pointer id assigned to the stroke at `index`: rotates through 1..=9.
    pub fn pointer_id_for(index: usize) -> i32 {
        (index % MAX_POINTER_ID as usize) as i32 + 1
    }

    /// Best-effort cancel of pointer ids 0..=9.  Engine refusals are ignored
    /// since the ids usually hold no state.
    pub fn cancel_dangling<S: PointerSink + ?Sized>(sink: &mut S) {
        for id in 0..=MAX_POINTER_ID {
            if let Err(e) = sink.send_pointer(PointerEvent::cancel(id)) {
                log::trace!("convert: cancel of pointer {id} ignored: {e}");
            }
        }
    }

    /// Feed `strokes` into `sink`, starting timestamps at the current
    /// wall-clock time.
    pub fn convert<S: PointerSink + ?Sized>(
        &self,
        strokes: &[Stroke],
        sink: &mut S,
    ) -> Result<(), ConversionError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        self.convert_at(strokes, sink, now_ms)
    }

    /// Feed `strokes` into `sink` with the first event stamped `start_ms`.
    ///
    /// Timestamps increase by the configured step on every down/move/up
    /// event and keep increasing across strokes.  Strokes that resample to
    /// zero points are skipped, but still consume their pointer id slot.
    pub fn convert_at<S: PointerSink + ?Sized>(
        &self,
        strokes: &[Stroke],
        sink: &mut S,
        start_ms: i64,
    ) -> Result<(), ConversionError> {
        if strokes.is_empty() {
            return Ok(());
        }

        Self::cancel_dangling(sink);

        let mut clock = start_ms;
        for (index, stroke) in strokes.iter().enumerate() {
            let points = stroke.resample(self.resample_interval);
            if points.is_empty() {
                continue;
            }

            let pointer_id = Self::pointer_id_for(index);
            clock = self.emit_stroke(&points, pointer_id, clock, sink)?;
            send(sink, PointerEvent::cancel(pointer_id))?;
            clock += self.time_step_ms;
        }

        Ok(())
    }

    /// Emit down / moves / up for one resampled stroke; returns the
    /// timestamp of the final event.
    fn emit_stroke<S: PointerSink + ?Sized>(
        &self,
        points: &[InkPoint],
        pointer_id: i32,
        start_ms: i64,
        sink: &mut S,
    ) -> Result<i64, ConversionError> {
        let event = |kind, p: &InkPoint, timestamp_ms| PointerEvent {
            kind,
            x: p.x,
            y: p.y,
            timestamp_ms,
            force: p.force,
            pointer_id,
        };

        let mut t = start_ms;
        let first = &points[0];
        send(sink, event(PointerKind::Down, first, t))?;

        if points.len() > 2 {
            for p in &points[1..points.len() - 1] {
                t += self.time_step_ms;
                send(sink, event(PointerKind::Move, p, t))?;
            }
        }

        // A single-sample stroke lifts at the same location it touched down.
        let last = points.last().unwrap_or(first);
        t += self.time_step_ms;
        send(sink, event(PointerKind::Up, last, t))?;

        Ok(t)
    }
}

fn send<S: PointerSink + ?Sized>(sink: &mut S, event: PointerEvent) -> Result<(), ConversionError> {
    sink.send_pointer(event)
        .map_err(|source| ConversionError::Rejected {
            pointer_id: event.pointer_id,
            source,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
