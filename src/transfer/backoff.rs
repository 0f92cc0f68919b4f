use std::time::Duration;

/// Delay between retries against the same endpoint.
///
/// The penalty starts at `base` and, after each sleep, is multiplied by the
/// number of failures so far: `base, base, 2*base, 6*base, 24*base, ...`
/// i.e. `delay(k) = base * (k-1)!`. Only `base` is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    /// Delay after the `attempt`-th consecutive failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let mut d = self.base;
        for k in 1..attempt.max(1) {
            d = d.saturating_mul(k);
        }
        d
    }

    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule { penalty: self.base, failures: 0 }
    }
}

/// Running penalty, advanced once per failure.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    penalty: Duration,
    failures: u32,
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.failures += 1;
        let wait = self.penalty;
        self.penalty = self.penalty.saturating_mul(self.failures);
        Some(wait)
    }
}

/// Where one executor call stands against one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    BackoffWait { attempt: u32, delay: Duration },
    Succeeded { attempt: u32 },
    Exhausted { attempts: u32 },
}

/// Attempting -> (Succeeded | BackoffWait -> Attempting | Exhausted).
#[derive(Debug, Clone)]
pub struct RetryMachine {
    max_attempts: u32,
    schedule: BackoffSchedule,
    state: RetryState,
}

impl RetryMachine {
    pub fn new(policy: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            schedule: policy.schedule(),
            state: RetryState::Attempting { attempt: 1 },
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RetryState::Succeeded { .. } | RetryState::Exhausted { .. })
    }

    pub fn succeed(&mut self) -> RetryState {
        if let RetryState::Attempting { attempt } = self.state {
            self.state = RetryState::Succeeded { attempt };
        }
        self.state
    }

    /// Records a failed attempt. No wait follows the last permitted attempt.
    pub fn fail(&mut self) -> RetryState {
        if let RetryState::Attempting { attempt } = self.state {
            self.state = if attempt >= self.max_attempts {
                RetryState::Exhausted { attempts: attempt }
            } else {
                let delay = self.schedule.next().unwrap_or_default();
                RetryState::BackoffWait { attempt, delay }
            };
        }
        self.state
    }

    /// Leaves the wait state once the delay has been served.
    pub fn resume(&mut self) -> RetryState {
        if let RetryState::BackoffWait { attempt, .. } = self.state {
            self.state = RetryState::Attempting { attempt: attempt + 1 };
        }
        self.state
    }
}

/// Suspension point for backoff waits; tests substitute a recorder.
pub trait Sleeper {
    fn sleep(&self, d: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}
