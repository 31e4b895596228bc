//! Configuration types for timer and debug combinators

use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::error::{StreamError, StreamResult};

/// Configuration for the periodic `interval` producer
#[derive(Debug, Clone)]
pub struct IntervalConfig {
    pub period: Duration,
    /// First value delivered; every later tick increments it by one
    pub start: u64,
    pub missed_tick_behavior: MissedTickBehavior,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            start: 1,
            missed_tick_behavior: MissedTickBehavior::Burst,
        }
    }
}

impl IntervalConfig {
    /// Create a configuration ticking every `period`
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    /// Set the tick period
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the first value delivered
    pub fn start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Set how ticks missed under load are caught up
    pub fn missed_tick_behavior(mut self, behavior: MissedTickBehavior) -> Self {
        self.missed_tick_behavior = behavior;
        self
    }

    /// Reject configurations the timer cannot run with
    pub fn validate(&self) -> StreamResult<()> {
        if self.period.is_zero() {
            return Err(StreamError::InvalidConfig(
                "interval period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the debug sink used by `tap` and `log`
#[derive(Debug, Clone)]
pub struct TapConfig {
    pub target: String,
    pub level: log::Level,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            target: "rs2_duplex::tap".to_string(),
            level: log::Level::Info,
        }
    }
}

impl TapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log target deliveries are reported under
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the log level deliveries are reported at
    pub fn level(mut self, level: log::Level) -> Self {
        self.level = level;
        self
    }
}
