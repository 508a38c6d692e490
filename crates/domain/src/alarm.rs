//! Alarm: a wake-up time with optional weekly repetition.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceDbError, ValidationError};
use crate::id::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub id: RecordId,
    pub hour: u8,
    pub minute: u8,
    pub enabled: bool,
    /// Snooze length in minutes.
    pub snooze_minutes: u32,
    pub tone: String,
    /// Days the alarm repeats on; empty means "once".
    pub repeat: Vec<Weekday>,
}

impl AlarmRecord {
    /// An enabled, one-shot alarm at `hour:minute`.
    #[must_use]
    pub fn new(hour: u8, minute: u8) -> Self {
        Self {
            id: RecordId::NONE,
            hour,
            minute,
            enabled: true,
            snooze_minutes: 10,
            tone: String::new(),
            repeat: Vec::new(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceDbError::Validation`] when the time of day is out of
    /// range.
    pub fn validate(&self) -> Result<(), ServiceDbError> {
        if self.hour > 23 {
            return Err(ValidationError::InvalidHour(self.hour).into());
        }
        if self.minute > 59 {
            return Err(ValidationError::InvalidMinute(self.minute).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_last_minute_of_day() {
        assert!(AlarmRecord::new(23, 59).validate().is_ok());
    }

    #[test]
    fn should_reject_out_of_range_hour() {
        assert!(matches!(
            AlarmRecord::new(24, 0).validate(),
            Err(ServiceDbError::Validation(ValidationError::InvalidHour(24)))
        ));
    }

    #[test]
    fn should_reject_out_of_range_minute() {
        assert!(matches!(
            AlarmRecord::new(7, 60).validate(),
            Err(ServiceDbError::Validation(ValidationError::InvalidMinute(60)))
        ));
    }
}
