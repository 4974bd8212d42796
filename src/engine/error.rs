//! Recognition failure taxonomy.
//!
//! [`RecognitionError`] is the shared vocabulary the coordinator uses to
//! decide between retrying and settling a block.  Everything except
//! [`RecognitionError::NoStrokesToRecognize`] is *engine-class* and eligible
//! for the retry-after-reinitialization policy.

use thiserror::Error;

use crate::ink::ConversionError;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// An opaque failure reported by the recognition engine.
///
/// Two engine errors are considered the same failure when their `code`
/// matches; the message is diagnostic only.
#[derive(Debug, Clone, Error)]
#[error("engine error {code}: {message}")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for EngineError {}

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// All errors that can arise while recognizing one block.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// No engine handle, or the session's editor could not be constructed.
    #[error("recognition engine is not initialized")]
    EngineNotInitialized,

    /// The editor reports no exportable content types.
    #[error("editor supports no export content types")]
    NoSupportedMimeTypes,

    /// The mode's output content type is not among the supported ones.
    #[error("content type is not supported by the editor")]
    InvalidMimeType,

    /// The export call itself failed.
    #[error("export failed: {0}")]
    ExportFailed(#[source] EngineError),

    /// The block holds no ink.  Callers treat this as an empty result.
    #[error("no strokes to recognize")]
    NoStrokesToRecognize,

    /// The editor refused a clear or pointer event while strokes were fed.
    #[error("editor rejected input: {0}")]
    InputRejected(#[source] EngineError),

    /// A blocking engine task panicked or was aborted.
    #[error("recognition task failed: {0}")]
    Internal(String),
}

impl RecognitionError {
    /// `true` for failures the coordinator may retry after reinitializing
    /// the session.
    pub fn is_engine_class(&self) -> bool {
        !matches!(self, RecognitionError::NoStrokesToRecognize)
    }
}

impl PartialEq for RecognitionError {
    fn eq(&self, other: &Self) -> bool {
        use RecognitionError::*;
        match (self, other) {
            (EngineNotInitialized, EngineNotInitialized)
            | (NoSupportedMimeTypes, NoSupportedMimeTypes)
            | (InvalidMimeType, InvalidMimeType)
            | (NoStrokesToRecognize, NoStrokesToRecognize) => true,
            (ExportFailed(a), ExportFailed(b)) => a == b,
            (InputRejected(a), InputRejected(b)) => a == b,
            (Internal(a), Internal(b)) => a == b,
            _ => false,
        }
    }
}

impl From<ConversionError> for RecognitionError {
    fn from(e: ConversionError) -> Self {
        RecognitionError::InputRejected(e.engine_error().clone())
    }
}

impl From<tokio::task::JoinError> for RecognitionError {
    fn from(e: tokio::task::JoinError) -> Self {
        RecognitionError::Internal(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_strokes_is_not_engine_class() {
        assert!(!RecognitionError::NoStrokesToRecognize.is_engine_class());
        for e in [
            RecognitionError::EngineNotInitialized,
            RecognitionError::NoSupportedMimeTypes,
            RecognitionError::InvalidMimeType,
            RecognitionError::ExportFailed(EngineError::new(1, "x")),
            RecognitionError::InputRejected(EngineError::new(2, "y")),
            RecognitionError::Internal("panic".into()),
        ] {
            assert!(e.is_engine_class(), "{e:?}");
        }
    }

    #[test]
    fn unit_variants_compare_structurally() {
        assert_eq!(
            RecognitionError::EngineNotInitialized,
            RecognitionError::EngineNotInitialized
        );
        assert_ne!(
            RecognitionError::NoSupportedMimeTypes,
            RecognitionError::InvalidMimeType
        );
    }

    #[test]
    fn export_failures_compare_by_code_only() {
        let a = RecognitionError::ExportFailed(EngineError::new(42, "disk full"));
        let b = RecognitionError::ExportFailed(EngineError::new(42, "different wording"));
        let c = RecognitionError::ExportFailed(EngineError::new(43, "disk full"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn conversion_error_maps_to_input_rejected() {
        let conv = ConversionError::Rejected {
            pointer_id: 3,
            source: EngineError::new(5, "bad pointer"),
        };
        let e: RecognitionError = conv.into();
        assert_eq!(e, RecognitionError::InputRejected(EngineError::new(5, "")));
    }

    #[test]
    fn display_mentions_underlying_cause() {
        let e = RecognitionError::ExportFailed(EngineError::new(9, "timeout"));
        assert!(e.to_string().contains("timeout"));
    }
}
