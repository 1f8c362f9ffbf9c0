use std::time::Duration;

use crate::error::SchedulerError;

/// How the wait between probes grows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Backoff {
    #[default]
    Fixed,
    Linear { step: Duration, max: Duration },
    Exponential { factor: f64, max: Duration },
}

/// "Watch for condition C": probe every `interval`, at most `max_attempts`
/// times (unbounded when `None`), growing the wait per `backoff`.
#[derive(Clone, Debug, PartialEq)]
pub struct WatchSpec {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
    /// Probe once before the first wait.
    pub immediate: bool,
}

impl WatchSpec {
    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
            backoff: Backoff::Fixed,
            immediate: true,
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            backoff: Backoff::Fixed,
            immediate: false,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.interval.is_zero() {
            return Err(SchedulerError::InvalidSpec("interval must be non-zero".into()));
        }
        if self.max_attempts == Some(0) {
            return Err(SchedulerError::InvalidSpec(
                "max_attempts must be at least 1".into(),
            ));
        }
        match self.backoff {
            Backoff::Exponential { factor, .. } if !factor.is_finite() || factor < 1.0 => Err(
                SchedulerError::InvalidSpec(format!("exponential factor {factor} must be >= 1")),
            ),
            Backoff::Linear { max, .. } | Backoff::Exponential { max, .. }
                if max < self.interval =>
            {
                Err(SchedulerError::InvalidSpec(
                    "backoff cap is below the base interval".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Wait after the `attempt`-th probe (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1);
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Linear { step, max } => {
                (self.interval + step.saturating_mul(steps)).min(max)
            }
            Backoff::Exponential { factor, max } => {
                let scale = factor.powi(steps.min(i32::MAX as u32) as i32);
                if !scale.is_finite() {
                    return max;
                }
                let nanos = (self.interval.as_nanos() as f64 * scale).round();
                if nanos >= max.as_nanos() as f64 {
                    return max;
                }
                Duration::from_nanos(nanos as u64)
            }
        }
    }
}

/// How a watch ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchOutcome<T> {
    Satisfied(T),
    Exhausted { attempts: u32 },
    Cancelled,
}

impl<T> WatchOutcome<T> {
    pub fn satisfied(self) -> Option<T> {
        match self {
            WatchOutcome::Satisfied(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, WatchOutcome::Satisfied(_))
    }
}
