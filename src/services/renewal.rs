//! Loan renewal date policy
//!
//! The validator is a pure function of two dates: the date proposed by the
//! librarian and today's date. It touches no entity and has no side effects.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

/// Latest acceptable renewal, in days from today (inclusive)
pub const RENEWAL_MAX_DAYS: i64 = 28;

/// Renewal date proposed to the librarian when the form is first shown
pub const RENEWAL_DEFAULT_DAYS: i64 = 21;

/// Help text shown next to the renewal date field
pub const RENEWAL_HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

/// Reason a proposed renewal date was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal in past")]
    DateInPast,

    #[error("Invalid date - renewal more than 4 weeks ahead")]
    DateTooFarAhead,
}

/// Renewal window, configurable through the `loans` config section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    pub max_days: i64,
    pub default_days: i64,
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self {
            max_days: RENEWAL_MAX_DAYS,
            default_days: RENEWAL_DEFAULT_DAYS,
        }
    }
}

impl RenewalPolicy {
    /// Check `proposed` against `[today, today + max_days]`
    pub fn validate(&self, proposed: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RenewalDateError> {
        if proposed < today {
            return Err(RenewalDateError::DateInPast);
        }
        if proposed > days_after(today, self.max_days) {
            return Err(RenewalDateError::DateTooFarAhead);
        }
        Ok(proposed)
    }

    /// Initial value of the renewal form
    pub fn suggested_date(&self, today: NaiveDate) -> NaiveDate {
        days_after(today, self.default_days)
    }
}

/// `today` shifted by `days`, saturating at the calendar bounds
fn days_after(today: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| today.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Validate a renewal date with the standard four-week window
pub fn validate_renewal(proposed: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RenewalDateError> {
    RenewalPolicy::default().validate(proposed, today)
}
