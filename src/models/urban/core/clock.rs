use jiff::{
    SignedDuration,
    civil::{DateTime, Weekday},
};

use super::ConfigurationError;

/// Simulated date and time, advanced in fixed sub-hourly steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    current: DateTime,
    step: SignedDuration,
    index: u64,
}

impl SimClock {
    /// Creates a clock positioned at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidStep`] unless `step_seconds` is
    /// positive and divides one hour evenly.
    pub fn new(start: DateTime, step_seconds: i64) -> Result<Self, ConfigurationError> {
        if step_seconds <= 0 || 3600 % step_seconds != 0 {
            return Err(ConfigurationError::InvalidStep {
                seconds: step_seconds,
            });
        }
        Ok(Self {
            current: start,
            step: SignedDuration::from_secs(step_seconds),
            index: 0,
        })
    }

    /// Advances one step and returns the new time.
    ///
    /// # Errors
    ///
    /// Fails if the new time is outside the supported date range.
    pub fn tick(&mut self) -> Result<DateTime, jiff::Error> {
        self.current = self.current.checked_add(self.step)?;
        self.index += 1;
        Ok(self.current)
    }

    #[must_use]
    pub fn time(&self) -> DateTime {
        self.current
    }

    #[must_use]
    pub fn step(&self) -> SignedDuration {
        self.step
    }

    /// Step duration in seconds.
    #[must_use]
    pub fn step_seconds(&self) -> f64 {
        self.step.as_secs_f64()
    }

    /// Number of completed steps.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[must_use]
    pub fn steps_per_day(&self) -> u64 {
        86_400 / self.step.as_secs().unsigned_abs()
    }

    /// Seconds elapsed since midnight of the current day.
    #[must_use]
    pub fn sec_day(&self) -> f64 {
        let t = self.current.time();
        f64::from(t.hour()) * 3600.0
            + f64::from(t.minute()) * 60.0
            + f64::from(t.second())
            + f64::from(t.subsec_nanosecond()) * 1e-9
    }

    #[must_use]
    pub fn month(&self) -> i8 {
        self.current.month()
    }

    #[must_use]
    pub fn day(&self) -> i8 {
        self.current.day()
    }

    #[must_use]
    pub fn hour(&self) -> i8 {
        self.current.hour()
    }

    #[must_use]
    pub fn day_of_year(&self) -> i16 {
        self.current.day_of_year()
    }

    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.current.weekday()
    }
}
