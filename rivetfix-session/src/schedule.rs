/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session schedule.
//!
//! A schedule is a recurring window in a fixed UTC offset. Each occurrence of
//! the window is one trading session: sequence numbers are reset when the
//! store's creation time belongs to an earlier occurrence than now.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc, Weekday,
};

fn day() -> TimeDelta {
    TimeDelta::days(1)
}

fn week() -> TimeDelta {
    TimeDelta::days(7)
}

/// Recurring window during which a session is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionSchedule {
    /// Always live, never rolls over.
    #[default]
    NonStop,
    /// Live every day from `start` to `end`. The window crosses midnight when
    /// `end` is before `start`. Equal times give a 24 hour window that rolls
    /// over at `start`.
    Daily {
        /// Window start, local to `offset`.
        start: NaiveTime,
        /// Window end, local to `offset`.
        end: NaiveTime,
        /// Offset the times are expressed in.
        offset: FixedOffset,
    },
    /// Live once a week from `start_day start` to `end_day end`.
    Weekly {
        /// First day of the window.
        start_day: Weekday,
        /// Window start on `start_day`.
        start: NaiveTime,
        /// Last day of the window.
        end_day: Weekday,
        /// Window end on `end_day`.
        end: NaiveTime,
        /// Offset the times are expressed in.
        offset: FixedOffset,
    },
}

impl SessionSchedule {
    /// Creates a daily schedule in UTC.
    #[must_use]
    pub fn daily(start: NaiveTime, end: NaiveTime) -> Self {
        Self::Daily {
            start,
            end,
            offset: utc_offset(),
        }
    }

    /// Creates a weekly schedule in UTC.
    #[must_use]
    pub fn weekly(start_day: Weekday, start: NaiveTime, end_day: Weekday, end: NaiveTime) -> Self {
        Self::Weekly {
            start_day,
            start,
            end_day,
            end,
            offset: utc_offset(),
        }
    }

    /// Expresses the schedule times in `offset` instead.
    #[must_use]
    pub fn with_offset(self, offset: FixedOffset) -> Self {
        match self {
            Self::NonStop => Self::NonStop,
            Self::Daily { start, end, .. } => Self::Daily { start, end, offset },
            Self::Weekly {
                start_day,
                start,
                end_day,
                end,
                ..
            } => Self::Weekly {
                start_day,
                start,
                end_day,
                end,
                offset,
            },
        }
    }

    /// Returns true for the non-stop schedule.
    #[must_use]
    pub const fn is_non_stop(&self) -> bool {
        matches!(self, Self::NonStop)
    }

    /// Returns the start of the most recent window occurrence at or before
    /// `time`, or `None` for a non-stop schedule.
    #[must_use]
    pub fn session_start(&self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (start, offset) = match *self {
            Self::NonStop => return None,
            Self::Daily { start, offset, .. } => {
                let local = local_time(time, offset);
                let mut candidate = local.date().and_time(start);
                if candidate > local {
                    candidate -= day();
                }
                (candidate, offset)
            }
            Self::Weekly {
                start_day,
                start,
                offset,
                ..
            } => {
                let local = local_time(time, offset);
                let back = days_between(start_day, local.weekday());
                let mut candidate = (local.date() - TimeDelta::days(back)).and_time(start);
                if candidate > local {
                    candidate -= week();
                }
                (candidate, offset)
            }
        };
        Some(utc_time(start, offset))
    }

    /// Returns true when `time` falls inside a window occurrence. Both window
    /// bounds are inclusive.
    #[must_use]
    pub fn is_session_time(&self, time: DateTime<Utc>) -> bool {
        match (self.session_start(time), self.duration()) {
            (Some(start), Some(duration)) => time - start <= duration,
            _ => true,
        }
    }

    /// Returns true when both times fall inside the same window occurrence.
    #[must_use]
    pub fn is_same_session(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        if self.is_non_stop() {
            return true;
        }
        self.is_session_time(a)
            && self.is_session_time(b)
            && self.session_start(a) == self.session_start(b)
    }

    fn duration(&self) -> Option<TimeDelta> {
        let span = match *self {
            Self::NonStop => return None,
            Self::Daily { start, end, .. } => {
                let span = end - start;
                if span <= TimeDelta::zero() { span + day() } else { span }
            }
            Self::Weekly {
                start_day,
                start,
                end_day,
                end,
                ..
            } => {
                let span = TimeDelta::days(days_between(start_day, end_day)) + (end - start);
                if span <= TimeDelta::zero() { span + week() } else { span }
            }
        };
        Some(span)
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn local_time(time: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    time.with_timezone(&offset).naive_local()
}

fn utc_time(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    (local - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Days from `from` forward to `to`, in `0..7`.
fn days_between(from: Weekday, to: Weekday) -> i64 {
    let diff = i64::from(to.num_days_from_monday()) - i64::from(from.num_days_from_monday());
    diff.rem_euclid(7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        // March 2024: the 11th is a Monday.
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_non_stop() {
        let schedule = SessionSchedule::NonStop;
        assert!(schedule.is_session_time(at(11, 3, 0)));
        assert!(schedule.is_same_session(at(11, 3, 0), at(20, 3, 0)));
        assert_eq!(schedule.session_start(at(11, 3, 0)), None);
    }

    #[test]
    fn test_daily_window() {
        let schedule = SessionSchedule::daily(hm(8, 0), hm(17, 0));
        assert!(!schedule.is_session_time(at(11, 7, 59)));
        assert!(schedule.is_session_time(at(11, 8, 0)));
        assert!(schedule.is_session_time(at(11, 17, 0)));
        assert!(!schedule.is_session_time(at(11, 17, 1)));
        assert_eq!(schedule.session_start(at(11, 12, 0)), Some(at(11, 8, 0)));
        assert!(schedule.is_same_session(at(11, 9, 0), at(11, 16, 0)));
        assert!(!schedule.is_same_session(at(11, 9, 0), at(12, 9, 0)));
    }

    #[test]
    fn test_daily_window_across_midnight() {
        let schedule = SessionSchedule::daily(hm(22, 0), hm(6, 0));
        assert!(schedule.is_session_time(at(11, 23, 0)));
        assert!(schedule.is_session_time(at(12, 5, 0)));
        assert!(!schedule.is_session_time(at(12, 12, 0)));
        assert!(schedule.is_same_session(at(11, 23, 0), at(12, 5, 0)));
    }

    #[test]
    fn test_daily_24_hour_window_rolls_over() {
        let schedule = SessionSchedule::daily(hm(5, 0), hm(5, 0));
        assert!(schedule.is_session_time(at(11, 4, 59)));
        assert!(schedule.is_same_session(at(11, 6, 0), at(12, 4, 0)));
        assert!(!schedule.is_same_session(at(11, 4, 0), at(11, 6, 0)));
    }

    #[test]
    fn test_weekly_window() {
        let schedule =
            SessionSchedule::weekly(Weekday::Sun, hm(18, 0), Weekday::Fri, hm(17, 0));
        // Sunday the 10th through Friday the 15th.
        assert!(schedule.is_session_time(at(10, 18, 0)));
        assert!(schedule.is_session_time(at(13, 12, 0)));
        assert!(!schedule.is_session_time(at(15, 18, 0)));
        assert!(!schedule.is_session_time(at(16, 12, 0)));
        assert_eq!(schedule.session_start(at(13, 12, 0)), Some(at(10, 18, 0)));
        assert!(schedule.is_same_session(at(11, 1, 0), at(15, 16, 0)));
        assert!(!schedule.is_same_session(at(15, 16, 0), at(18, 1, 0)));
    }

    #[test]
    fn test_offset_shifts_window() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let schedule = SessionSchedule::daily(hm(9, 0), hm(10, 0)).with_offset(offset);
        assert!(schedule.is_session_time(at(11, 7, 30)));
        assert!(!schedule.is_session_time(at(11, 9, 30)));
        assert_eq!(schedule.session_start(at(11, 7, 30)), Some(at(11, 7, 0)));
    }
}
