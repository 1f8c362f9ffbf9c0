use std::future::Future;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::SchedulerError;
use crate::model::{WatchOutcome, WatchSpec};

/// Polls a synchronous probe until it yields a value, the attempt budget
/// runs out, or `cancel` fires. The probe receives the 1-based attempt.
pub async fn watch<T, F>(
    spec: &WatchSpec,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<WatchOutcome<T>, SchedulerError>
where
    F: FnMut(u32) -> Option<T>,
{
    watch_async(spec, cancel, move |attempt| std::future::ready(probe(attempt))).await
}

/// Like [`watch`] with an async probe.
pub async fn watch_async<T, F, Fut>(
    spec: &WatchSpec,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<WatchOutcome<T>, SchedulerError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    spec.validate()?;

    if !spec.immediate && !pause(cancel, spec.interval).await {
        return Ok(WatchOutcome::Cancelled);
    }

    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Ok(WatchOutcome::Cancelled);
        }
        attempt = attempt.saturating_add(1);
        if let Some(value) = probe(attempt).await {
            trace!(attempt, "watch satisfied");
            return Ok(WatchOutcome::Satisfied(value));
        }
        if spec.max_attempts.is_some_and(|max| attempt >= max) {
            trace!(attempt, "watch exhausted");
            return Ok(WatchOutcome::Exhausted { attempts: attempt });
        }
        if !pause(cancel, spec.delay_after(attempt)).await {
            return Ok(WatchOutcome::Cancelled);
        }
    }
}

/// Sleeps for `delay`; `false` when cancelled first.
async fn pause(cancel: &CancellationToken, delay: std::time::Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::model::Backoff;

    #[tokio::test(start_paused = true)]
    async fn bounded_watch_exhausts() {
        let spec = WatchSpec::bounded(Duration::from_millis(500), 4);
        let start = Instant::now();
        let outcome = watch(&spec, &CancellationToken::new(), |_| None::<()>)
            .await
            .unwrap();
        assert_eq!(outcome, WatchOutcome::Exhausted { attempts: 4 });
        // immediate first probe, then three waits
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn satisfied_on_matching_attempt() {
        let spec = WatchSpec::bounded(Duration::from_millis(100), 10);
        let outcome = watch(&spec, &CancellationToken::new(), |attempt| {
            (attempt == 3).then_some(attempt * 10)
        })
        .await
        .unwrap();
        assert_eq!(outcome, WatchOutcome::Satisfied(30));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_unbounded_watch() {
        let spec = WatchSpec::unbounded(Duration::from_millis(250));
        let token = CancellationToken::new();
        let probes = Arc::new(AtomicU32::new(0));
        let counter = probes.clone();
        let child = token.clone();
        let task = tokio::spawn(async move {
            watch(&spec, &child, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                None::<()>
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(1100)).await;
        token.cancel();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, WatchOutcome::Cancelled);
        assert_eq!(probes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn async_probe_with_backoff() {
        let spec = WatchSpec::bounded(Duration::from_millis(100), 5).with_backoff(
            Backoff::Exponential {
                factor: 2.0,
                max: Duration::from_millis(300),
            },
        );
        let start = Instant::now();
        let outcome = watch_async(&spec, &CancellationToken::new(), |attempt| async move {
            tokio::task::yield_now().await;
            (attempt == 4).then_some("ready")
        })
        .await
        .unwrap();
        assert_eq!(outcome, WatchOutcome::Satisfied("ready"));
        // waits of 100 + 200 + 300
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test]
    async fn invalid_spec_is_an_error() {
        let spec = WatchSpec::bounded(Duration::ZERO, 1);
        let err = watch(&spec, &CancellationToken::new(), |_| Some(()))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSpec(_)));
    }
}
