//! Bounded waiting around a single strategy invocation.
//!
//! External tools already kill their child process when the tool deadline
//! passes. This layer covers everything else: an in-process decoder that
//! loops on a hostile file, or a strategy that panics. With a timeout set,
//! the call runs on a worker thread and the caller waits on a channel with
//! `recv_timeout`. A worker that misses the deadline is abandoned; its
//! result is dropped when it eventually finishes.

use crate::strategy::{SharedStrategy, SizePair, StrategyError};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Invoke `strategy` on one file, converting panics and overruns to errors.
///
/// `timeout = None` calls the strategy on the current thread.
pub fn invoke_bounded(
    strategy: &SharedStrategy,
    source: &Path,
    output: &Path,
    timeout: Option<Duration>,
) -> Result<SizePair, StrategyError> {
    let Some(limit) = timeout else {
        return catch_unwind(AssertUnwindSafe(|| strategy.invoke(source, output)))
            .unwrap_or_else(|payload| Err(StrategyError::Panicked(panic_message(&*payload))));
    };

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(strategy);
    let (source_owned, output_owned) = (source.to_path_buf(), output.to_path_buf());
    thread::Builder::new()
        .name(format!("invoke-{}", strategy.name()))
        .spawn(move || {
            // The receiver is gone if the caller already gave up on us
            let _ = tx.send(worker.invoke(&source_owned, &output_owned));
        })?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                strategy = strategy.name(),
                source = %source.display(),
                "abandoning invocation after {limit:?}"
            );
            Err(StrategyError::TimedOut(limit))
        }
        // The sender is dropped without sending only when the worker unwinds
        Err(RecvTimeoutError::Disconnected) => Err(StrategyError::Panicked(
            "worker exited without a result".to_string(),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockBehavior, MockStrategy, write_bytes};
    use std::time::Instant;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        write_bytes(&source, 100);
        (tmp, source)
    }

    #[test]
    fn unbounded_passes_result_through() {
        let (tmp, source) = fixture();
        let strategy = MockStrategy::shared("halve", MockBehavior::Halve);
        let sizes = invoke_bounded(&strategy, &source, &tmp.path().join("o"), None).unwrap();
        assert_eq!(sizes, SizePair::new(50, 100));
    }

    #[test]
    fn bounded_passes_result_through() {
        let (tmp, source) = fixture();
        let strategy = MockStrategy::shared("halve", MockBehavior::Halve);
        let sizes = invoke_bounded(
            &strategy,
            &source,
            &tmp.path().join("o"),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(sizes, SizePair::new(50, 100));
    }

    #[test]
    fn bounded_passes_errors_through() {
        let (tmp, source) = fixture();
        let strategy = MockStrategy::shared("fail", MockBehavior::Fail);
        let err = invoke_bounded(
            &strategy,
            &source,
            &tmp.path().join("o"),
            Some(Duration::from_secs(5)),
        )
        .unwrap_err();
        assert!(matches!(err, StrategyError::Encode(_)));
    }

    #[test]
    fn slow_strategy_times_out() {
        let (tmp, source) = fixture();
        let strategy =
            MockStrategy::shared("slow", MockBehavior::Sleep(Duration::from_secs(2)));

        let start = Instant::now();
        let err = invoke_bounded(
            &strategy,
            &source,
            &tmp.path().join("o"),
            Some(Duration::from_millis(50)),
        )
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn panic_is_contained_unbounded() {
        let (tmp, source) = fixture();
        let strategy = MockStrategy::shared("boom", MockBehavior::Panic);
        let err = invoke_bounded(&strategy, &source, &tmp.path().join("o"), None).unwrap_err();
        match err {
            StrategyError::Panicked(msg) => assert_eq!(msg, "mock strategy panicked"),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn panic_is_contained_bounded() {
        let (tmp, source) = fixture();
        let strategy = MockStrategy::shared("boom", MockBehavior::Panic);
        let err = invoke_bounded(
            &strategy,
            &source,
            &tmp.path().join("o"),
            Some(Duration::from_secs(5)),
        )
        .unwrap_err();
        assert!(matches!(err, StrategyError::Panicked(_)));
    }

    #[test]
    fn panic_message_handles_owned_strings() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*payload), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*payload), "unknown panic payload");
    }
}
