// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Visit-day guard for staff-performed transitions.
//!
//! Staff may act on an appointment only on the day it is scheduled, compared
//! at calendar-day granularity in the deployment's configured time zone.

use crate::error::DomainError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, OffsetDateTime};

/// Computes the current calendar date in the given IANA time zone.
///
/// # Arguments
///
/// * `timezone` - An IANA time zone name (e.g., "Asia/Kolkata")
/// * `now_utc` - The current instant
///
/// # Returns
///
/// The local calendar date.
///
/// # Errors
///
/// Returns an error if the time zone name is invalid or the instant cannot
/// be represented as a calendar date.
pub fn local_today(timezone: &str, now_utc: OffsetDateTime) -> Result<Date, DomainError> {
    // Parse timezone
    let tz: Tz = timezone
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(timezone.to_string()))?;

    // Convert the time instant to a chrono instant
    let utc: DateTime<Utc> = Utc
        .timestamp_opt(now_utc.unix_timestamp(), 0)
        .single()
        .ok_or_else(|| DomainError::DateOutOfRange {
            reason: "converting the current instant".to_string(),
        })?;

    let local = utc.with_timezone(&tz).date_naive();

    // Convert chrono::NaiveDate back to time::Date
    let month: time::Month = u8::try_from(local.month())
        .ok()
        .and_then(|m| time::Month::try_from(m).ok())
        .ok_or_else(|| DomainError::DateOutOfRange {
            reason: format!("converting month {}", local.month()),
        })?;
    let day: u8 = u8::try_from(local.day()).map_err(|_| DomainError::DateOutOfRange {
        reason: format!("converting day {}", local.day()),
    })?;

    Date::from_calendar_date(local.year(), month, day).map_err(|e| DomainError::DateOutOfRange {
        reason: format!("converting the local date: {e}"),
    })
}

/// Checks that a staff action is happening on the scheduled visit day.
///
/// # Arguments
///
/// * `scheduled_date` - The appointment's scheduled date
/// * `today` - The current local calendar date
///
/// # Errors
///
/// Returns `DomainError::WrongVisitDay` naming the scheduled date if the
/// dates differ.
pub fn check_visit_day(scheduled_date: Date, today: Date) -> Result<(), DomainError> {
    if scheduled_date == today {
        Ok(())
    } else {
        Err(DomainError::WrongVisitDay {
            scheduled_date,
            attempted_date: today,
        })
    }
}
