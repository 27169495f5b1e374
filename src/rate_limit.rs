use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::clock::{Clock, MonotonicClock};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate window must allow at least one request")]
    ZeroCount,
    #[error("rate window duration must be greater than zero")]
    ZeroDuration,
    #[error("at least one rate window is required")]
    NoPolicies,
}

// One quota: at most `max_count` admitted calls within any `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    max_count: u32,
    duration: Duration,
}

impl WindowPolicy {
    pub fn new(max_count: u32, duration: Duration) -> Result<Self, ConfigError> {
        if max_count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        if duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(Self {
            max_count,
            duration,
        })
    }

    pub fn per_seconds(max_count: u32, seconds: u64) -> Result<Self, ConfigError> {
        Self::new(max_count, Duration::from_secs(seconds))
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} per {}", self.max_count, human_duration(self.duration))
    }
}

// Short = the tightest configured window, Long = any wider one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialScope {
    Short,
    Long,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub window: usize,
    pub policy: WindowPolicy,
    pub scope: DenialScope,
    pub retry_after: Duration,
}

impl Denial {
    /// User-facing wait message. Short-window denials ask for a brief pause,
    /// long-window denials point much further out.
    pub fn message(&self) -> String {
        match self.scope {
            DenialScope::Short => {
                "Rate limit exceeded. Please wait a moment before trying again.".to_string()
            }
            DenialScope::Long if self.policy.duration >= DAY => {
                "Daily limit reached. Try again tomorrow.".to_string()
            }
            DenialScope::Long => format!(
                "Request limit of {} reached. Try again in {}.",
                self.policy,
                human_duration(self.retry_after)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Denied(Denial),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub policy: WindowPolicy,
    pub in_window: usize,
}

/// Sliding-window admission gate shared by every outgoing completion call.
///
/// Each policy keeps its own queue of admitted-call timestamps, oldest first.
/// All queues sit behind one lock so that evict, check and append form a single
/// critical section: two callers racing for the last slot can never both win.
pub struct RateGate {
    policies: Vec<WindowPolicy>,
    shortest: Duration,
    records: Mutex<Vec<VecDeque<Duration>>>,
    clock: Arc<dyn Clock>,
}

impl RateGate {
    pub fn new(policies: Vec<WindowPolicy>) -> Result<Self, ConfigError> {
        Self::with_clock(policies, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        policies: Vec<WindowPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let shortest = policies
            .iter()
            .map(WindowPolicy::duration)
            .min()
            .ok_or(ConfigError::NoPolicies)?;
        let records = policies.iter().map(|_| VecDeque::new()).collect();

        Ok(Self {
            policies,
            shortest,
            records: Mutex::new(records),
            clock,
        })
    }

    pub fn policies(&self) -> &[WindowPolicy] {
        &self.policies
    }

    pub fn try_admit(&self) -> Admission {
        let mut records = self.records.lock();
        let now = self.clock.now();

        for (policy, window) in self.policies.iter().zip(records.iter_mut()) {
            evict(window, now, policy.duration);
        }

        // When several windows are full, report the one that frees up last
        let denial = self
            .policies
            .iter()
            .zip(records.iter())
            .enumerate()
            .filter(|(_, (policy, window))| window.len() >= policy.max_count as usize)
            .map(|(index, (policy, window))| {
                let oldest = window.front().copied().unwrap_or(now);
                Denial {
                    window: index,
                    policy: *policy,
                    scope: if policy.duration > self.shortest {
                        DenialScope::Long
                    } else {
                        DenialScope::Short
                    },
                    retry_after: oldest.saturating_add(policy.duration).saturating_sub(now),
                }
            })
            .max_by_key(|denial| denial.retry_after);

        if let Some(denial) = denial {
            tracing::debug!(
                window = denial.window,
                policy = %denial.policy,
                retry_after_secs = denial.retry_after.as_secs(),
                "call denied by rate gate"
            );
            return Admission::Denied(denial);
        }

        for window in records.iter_mut() {
            window.push_back(now);
        }
        Admission::Admitted
    }

    pub fn check(&self) -> Result<(), Denial> {
        match self.try_admit() {
            Admission::Admitted => Ok(()),
            Admission::Denied(denial) => Err(denial),
        }
    }

    pub fn usage(&self) -> Vec<WindowUsage> {
        let mut records = self.records.lock();
        let now = self.clock.now();

        self.policies
            .iter()
            .zip(records.iter_mut())
            .map(|(policy, window)| {
                evict(window, now, policy.duration);
                WindowUsage {
                    policy: *policy,
                    in_window: window.len(),
                }
            })
            .collect()
    }
}

// Drop the oldest-first prefix of records that have aged out of the window.
// A record exactly `duration` old still counts.
fn evict(window: &mut VecDeque<Duration>, now: Duration, duration: Duration) {
    while let Some(&oldest) = window.front() {
        if now.saturating_sub(oldest) > duration {
            window.pop_front();
        } else {
            break;
        }
    }
}

fn human_duration(duration: Duration) -> String {
    let secs = duration
        .as_secs()
        .saturating_add(u64::from(duration.subsec_nanos() > 0));
    match secs {
        s if s >= 3600 => format!("{}h", s.div_ceil(3600)),
        s if s >= 60 => format!("{}m", s.div_ceil(60)),
        s => format!("{}s", s),
    }
}
