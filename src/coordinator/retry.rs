//! One-shot recovery around a [`BlockRecognizer`] call.

use std::sync::Arc;

use crate::engine::{BlockRecognizer, RecognitionError, RecognitionMode};
use crate::ink::Stroke;

/// How many times an engine-class failure is retried on a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1 }
    }
}

/// Recognize `strokes`, invalidating the mode's session and retrying after
/// each engine-class failure until the policy is exhausted.
///
/// Empty input resolves to [`RecognitionError::NoStrokesToRecognize`]
/// without touching the recognizer.
pub async fn recognize_with_retry(
    recognizer: &dyn BlockRecognizer,
    mode: RecognitionMode,
    strokes: Arc<Vec<Stroke>>,
    policy: RetryPolicy,
) -> Result<String, RecognitionError> {
    if strokes.is_empty() {
        return Err(RecognitionError::NoStrokesToRecognize);
    }

    let mut attempt = 0;
    loop {
        match recognizer.recognize(mode, Arc::clone(&strokes)).await {
            Ok(text) => return Ok(text),
            Err(e) if !e.is_engine_class() => return Err(e),
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                log::warn!("coordinator: {mode} recognition failed ({e}), retry {attempt} on a fresh session");
                recognizer.invalidate(mode);
            }
            Err(e) => {
                log::error!("coordinator: {mode} recognition failed after {attempt} retries: {e}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::engine::EngineError;

    #[derive(Default)]
    struct Flaky {
        failures: Mutex<VecDeque<RecognitionError>>,
        calls: Mutex<usize>,
        invalidated: Mutex<Vec<RecognitionMode>>,
    }

    impl Flaky {
        fn failing(errors: Vec<RecognitionError>) -> Self {
            Self {
                failures: Mutex::new(errors.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl BlockRecognizer for Flaky {
        async fn recognize(
            &self,
            _mode: RecognitionMode,
            strokes: Arc<Vec<Stroke>>,
        ) -> Result<String, RecognitionError> {
            *self.calls.lock().unwrap() += 1;
            match self.failures.lock().unwrap().pop_front() {
                Some(e) => Err(e),
                None => Ok(format!("{} strokes", strokes.len())),
            }
        }

        fn invalidate(&self, mode: RecognitionMode) {
            self.invalidated.lock().unwrap().push(mode);
        }
    }

    fn ink() -> Arc<Vec<Stroke>> {
        Arc::new(vec![Stroke::from_xy(&[(0.0, 0.0), (1.0, 0.0)], 1.0)])
    }

    #[tokio::test]
    async fn empty_input_never_reaches_the_recognizer() {
        let r = Flaky::default();
        let out = recognize_with_retry(&r, RecognitionMode::Text, Arc::new(vec![]), RetryPolicy::default()).await;
        assert_eq!(out, Err(RecognitionError::NoStrokesToRecognize));
        assert_eq!(r.calls(), 0);
    }

    #[tokio::test]
    async fn one_failure_is_retried_on_a_fresh_session() {
        let r = Flaky::failing(vec![RecognitionError::EngineNotInitialized]);
        let out = recognize_with_retry(&r, RecognitionMode::Math, ink(), RetryPolicy::default()).await;
        assert_eq!(out.unwrap(), "1 strokes");
        assert_eq!(r.calls(), 2);
        assert_eq!(*r.invalidated.lock().unwrap(), vec![RecognitionMode::Math]);
    }

    #[tokio::test]
    async fn second_failure_is_terminal() {
        let r = Flaky::failing(vec![
            RecognitionError::NoSupportedMimeTypes,
            RecognitionError::ExportFailed(EngineError::new(7, "export")),
            RecognitionError::EngineNotInitialized,
        ]);
        let out = recognize_with_retry(&r, RecognitionMode::Text, ink(), RetryPolicy::default()).await;
        assert_eq!(out, Err(RecognitionError::ExportFailed(EngineError::new(7, "other"))));
        assert_eq!(r.calls(), 2);
    }

    #[tokio::test]
    async fn no_strokes_from_the_recognizer_is_not_retried() {
        let r = Flaky::failing(vec![RecognitionError::NoStrokesToRecognize]);
        let out = recognize_with_retry(&r, RecognitionMode::Text, ink(), RetryPolicy::default()).await;
        assert_eq!(out, Err(RecognitionError::NoStrokesToRecognize));
        assert_eq!(r.calls(), 1);
        assert!(r.invalidated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retry_count_is_configurable() {
        let r = Flaky::failing(vec![RecognitionError::EngineNotInitialized; 3]);
        let out = recognize_with_retry(&r, RecognitionMode::Text, ink(), RetryPolicy { max_retries: 3 }).await;
        assert!(out.is_ok());
        assert_eq!(r.calls(), 4);

        let r = Flaky::failing(vec![RecognitionError::EngineNotInitialized]);
        let out = recognize_with_retry(&r, RecognitionMode::Text, ink(), RetryPolicy { max_retries: 0 }).await;
        assert_eq!(out, Err(RecognitionError::EngineNotInitialized));
        assert_eq!(r.calls(), 1);
    }
}
