//! Run interruption: overall deadline and external cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of interruptible sleeps
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared flag an outside party (e.g. a Ctrl-C handler) sets to cancel a run
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DeadlineExpired,
    Cancelled,
}

/// Tells workers and retry loops when to give up.
#[derive(Debug, Clone)]
pub struct StopSignal {
    budget: Option<Duration>,
    deadline: Option<Instant>,
    cancel: CancelFlag,
}

impl StopSignal {
    pub fn new(deadline: Option<Duration>, cancel: CancelFlag) -> Self {
        Self {
            budget: deadline,
            deadline: deadline.map(|d| Instant::now() + d),
            cancel,
        }
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self::new(None, CancelFlag::new())
    }

    pub fn reason(&self) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(StopReason::DeadlineExpired),
            _ => None,
        }
    }

    pub fn should_stop(&self) -> bool {
        self.reason().is_some()
    }

    /// The run deadline this signal was created with
    pub fn deadline(&self) -> Option<Duration> {
        self.budget
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Sleep for `duration` unless the signal fires first.
    ///
    /// A sleep that outlasts the deadline runs until the deadline and then
    /// reports `DeadlineExpired`.
    pub fn sleep(&self, duration: Duration) -> Result<(), StopReason> {
        let until = Instant::now() + duration;
        loop {
            if let Some(reason) = self.reason() {
                return Err(reason);
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            thread::sleep(SLEEP_SLICE.min(until - now));
        }
    }
}
