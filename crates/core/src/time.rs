use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    Utc,
};
use thiserror::Error;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WeekWindowError {
    #[error("week containing {at} cannot be represented")]
    OutOfRange { at: DateTime<Utc> },

    #[error("invalid utc offset: {raw}")]
    InvalidOffset { raw: String },
}

//
// ─── WEEK POLICY ───────────────────────────────────────────────────────────────
//

const MAX_OFFSET_SECS: i32 = 86_399;

/// The canonical timezone for week bounds and calendar-day grouping.
///
/// Both the window edges and the date key of every completion are derived
/// from the same offset, so a completion always lands on a day inside the
/// week it was selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekPolicy {
    offset: FixedOffset,
}

impl Default for WeekPolicy {
    fn default() -> Self {
        Self::utc()
    }
}

impl WeekPolicy {
    #[must_use]
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build a policy from an offset east of UTC, in minutes.
    ///
    /// # Errors
    ///
    /// Returns `WeekWindowError::InvalidOffset` if the offset is a day or more.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, WeekWindowError> {
        minutes
            .checked_mul(60)
            .filter(|secs| secs.abs() <= MAX_OFFSET_SECS)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| WeekWindowError::InvalidOffset {
                raw: format!("{minutes} minutes"),
            })
    }

    /// Parse `Z`, `UTC`, `+HH`, `+HHMM` or `+HH:MM` (and the `-` forms).
    ///
    /// # Errors
    ///
    /// Returns `WeekWindowError::InvalidOffset` for anything else.
    pub fn parse_offset(raw: &str) -> Result<Self, WeekWindowError> {
        let invalid = || WeekWindowError::InvalidOffset {
            raw: raw.to_string(),
        };
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let (hours, minutes) = match digits.len() {
            2 => (&digits[..2], "0"),
            4 => (&digits[..2], &digits[2..]),
            _ => return Err(invalid()),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        Self::from_offset_minutes(sign * (hours * 60 + minutes)).map_err(|_| invalid())
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day of `instant` under this policy.
    #[must_use]
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    fn local_naive(&self, instant: DateTime<Utc>) -> Option<NaiveDateTime> {
        instant
            .naive_utc()
            .checked_add_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
    }

    fn utc_from_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        local
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
            .map(|naive| naive.and_utc())
    }
}

//
// ─── WEEK WINDOW ───────────────────────────────────────────────────────────────
//

/// Inclusive `[start, end]` range of instants covering one Sunday–Saturday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    policy: WeekPolicy,
}

impl WeekWindow {
    /// Compute the week containing `now`.
    ///
    /// `start` is Sunday 00:00:00.000 and `end` is Saturday 23:59:59.999, both
    /// in the policy's offset.
    ///
    /// # Errors
    ///
    /// Returns `WeekWindowError::OutOfRange` when the week runs past the
    /// representable calendar.
    pub fn containing(now: DateTime<Utc>, policy: &WeekPolicy) -> Result<Self, WeekWindowError> {
        let out_of_range = || WeekWindowError::OutOfRange { at: now };

        let local = policy.local_naive(now).ok_or_else(out_of_range)?;
        let days_back = u64::from(local.weekday().num_days_from_sunday());
        let sunday = local
            .date()
            .checked_sub_days(Days::new(days_back))
            .ok_or_else(out_of_range)?;

        let start = policy
            .utc_from_local(sunday.and_time(NaiveTime::MIN))
            .ok_or_else(out_of_range)?;
        let end = start
            .checked_add_signed(Duration::days(7))
            .and_then(|next| next.checked_sub_signed(Duration::milliseconds(1)))
            .ok_or_else(out_of_range)?;

        Ok(Self {
            start,
            end,
            policy: *policy,
        })
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn policy(&self) -> &WeekPolicy {
        &self.policy
    }

    /// Local date of the Sunday that opens the week.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.policy.local_date(self.start)
    }

    /// Local date of the Saturday that closes the week.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.policy.local_date(self.end)
    }

    /// Both bounds are inclusive.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z, a Tuesday).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn utc_week_runs_sunday_through_saturday() {
        let window = WeekWindow::containing(fixed_now(), &WeekPolicy::utc()).unwrap();

        assert_eq!(window.start(), utc(2023, 11, 12, 0, 0, 0));
        assert_eq!(
            window.end(),
            utc(2023, 11, 18, 23, 59, 59) + Duration::milliseconds(999)
        );
        assert_eq!(window.start_date().weekday(), Weekday::Sun);
        assert_eq!(window.end_date().weekday(), Weekday::Sat);
    }

    #[test]
    fn bounds_are_inclusive() {
        let window = WeekWindow::containing(fixed_now(), &WeekPolicy::utc()).unwrap();

        assert!(window.contains(window.start()));
        assert!(window.contains(window.end()));
        assert!(!window.contains(window.start() - Duration::milliseconds(1)));
        assert!(!window.contains(window.end() + Duration::milliseconds(1)));
    }

    #[test]
    fn sunday_midnight_opens_its_own_week() {
        let sunday = utc(2023, 11, 19, 0, 0, 0);
        let window = WeekWindow::containing(sunday, &WeekPolicy::utc()).unwrap();
        assert_eq!(window.start(), sunday);

        let just_before = sunday - Duration::milliseconds(1);
        let previous = WeekWindow::containing(just_before, &WeekPolicy::utc()).unwrap();
        assert_eq!(previous.end(), just_before);
        assert_eq!(previous.start(), utc(2023, 11, 12, 0, 0, 0));
    }

    #[test]
    fn positive_offset_shifts_window_earlier_in_utc() {
        // 22:13Z on Tuesday is already 00:13 Wednesday at +02:00; same week.
        let policy = WeekPolicy::parse_offset("+02:00").unwrap();
        let window = WeekWindow::containing(fixed_now(), &policy).unwrap();

        assert_eq!(window.start(), utc(2023, 11, 11, 22, 0, 0));
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2023, 11, 12).unwrap());
        assert_eq!(
            policy.local_date(fixed_now()),
            NaiveDate::from_ymd_opt(2023, 11, 15).unwrap()
        );
    }

    #[test]
    fn offset_can_move_instant_into_next_week() {
        // Saturday 23:30Z is Sunday 01:30 at +02:00.
        let policy = WeekPolicy::parse_offset("+0200").unwrap();
        let instant = utc(2023, 11, 18, 23, 30, 0);
        let window = WeekWindow::containing(instant, &policy).unwrap();

        assert_eq!(window.start(), utc(2023, 11, 18, 22, 0, 0));
        assert!(window.contains(instant));
    }

    #[test]
    fn negative_offset_window() {
        let policy = WeekPolicy::parse_offset("-05:00").unwrap();
        let window = WeekWindow::containing(fixed_now(), &policy).unwrap();

        assert_eq!(window.start(), utc(2023, 11, 12, 5, 0, 0));
        assert_eq!(
            window.end(),
            utc(2023, 11, 19, 4, 59, 59) + Duration::milliseconds(999)
        );
    }

    #[test]
    fn parse_offset_accepts_common_forms() {
        assert_eq!(WeekPolicy::parse_offset("Z").unwrap(), WeekPolicy::utc());
        assert_eq!(WeekPolicy::parse_offset("utc").unwrap(), WeekPolicy::utc());
        assert_eq!(
            WeekPolicy::parse_offset("+05").unwrap().offset().local_minus_utc(),
            5 * 3600
        );
        assert_eq!(
            WeekPolicy::parse_offset("-0930").unwrap().offset().local_minus_utc(),
            -(9 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn parse_offset_rejects_garbage() {
        for raw in ["", "5", "+5", "+24:00", "+01:75", "+ab:cd", "EST"] {
            assert!(
                matches!(
                    WeekPolicy::parse_offset(raw),
                    Err(WeekWindowError::InvalidOffset { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn window_at_calendar_edge_is_rejected() {
        let policy = WeekPolicy::parse_offset("-01:00").unwrap();
        let err = WeekWindow::containing(DateTime::<Utc>::MIN_UTC, &policy);
        assert!(matches!(err, Err(WeekWindowError::OutOfRange { .. })));
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), fixed_now() + Duration::days(1));
        assert!(clock.is_fixed());
    }
}
