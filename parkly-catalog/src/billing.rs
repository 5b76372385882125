use chrono::{DateTime, Duration, Utc};

/// Server-computed price quote for a booking window. Caller-supplied hours
/// or amounts are never trusted; this is the only place they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub hours: i64,
    /// Major currency units.
    pub total_amount: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Invalid time range: start must be in the future and end after start")]
    InvalidTimeRange,

    #[error("Invalid duration: {hours}h exceeds the {max_hours}h maximum")]
    InvalidDuration { hours: i64, max_hours: i64 },
}

/// Small grace window so a request assembled a moment ago is not rejected by
/// clock skew between client and server.
const START_GRACE_SECONDS: i64 = 60;

/// Billable hours are the ceiling of the window duration; partial hours are
/// charged in full.
pub fn billable_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<i64> {
    if end <= start {
        return None;
    }
    let seconds = (end - start).num_seconds();
    Some((seconds + 3599) / 3600)
}

pub fn quote(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    price_per_hour: i64,
    max_hours: i64,
) -> Result<Quote, QuoteError> {
    if start < now - Duration::seconds(START_GRACE_SECONDS) || end <= start {
        return Err(QuoteError::InvalidTimeRange);
    }

    let hours = billable_hours(start, end).ok_or(QuoteError::InvalidTimeRange)?;
    if hours <= 0 || hours > max_hours {
        return Err(QuoteError::InvalidDuration { hours, max_hours });
    }

    Ok(Quote {
        hours,
        total_amount: price_per_hour * hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset_minutes: i64) -> DateTime<Utc> {
        Utc::now() + Duration::minutes(offset_minutes)
    }

    #[test]
    fn test_exact_hours() {
        let now = Utc::now();
        let q = quote(at(60), at(180), now, 100, 72).unwrap();
        assert_eq!(q.hours, 2);
        assert_eq!(q.total_amount, 200);
    }

    #[test]
    fn test_partial_hour_rounds_up() {
        let now = Utc::now();
        let q = quote(at(60), at(61), now, 100, 72).unwrap();
        assert_eq!(q.hours, 1);

        let q = quote(at(60), at(151), now, 100, 72).unwrap();
        assert_eq!(q.hours, 2);
        assert_eq!(q.total_amount, 200);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let now = Utc::now();
        assert_eq!(
            quote(at(120), at(60), now, 100, 72),
            Err(QuoteError::InvalidTimeRange)
        );
        assert_eq!(
            quote(at(60), at(60), now, 100, 72),
            Err(QuoteError::InvalidTimeRange)
        );
    }

    #[test]
    fn test_start_in_past_rejected() {
        let now = Utc::now();
        assert_eq!(
            quote(at(-120), at(60), now, 100, 72),
            Err(QuoteError::InvalidTimeRange)
        );
    }

    #[test]
    fn test_start_within_grace_accepted() {
        let now = Utc::now();
        // 30 seconds in the past is inside the skew grace window.
        let start = now - Duration::seconds(30);
        let q = quote(start, start + Duration::hours(1), now, 100, 72).unwrap();
        assert_eq!(q.hours, 1);
    }

    #[test]
    fn test_duration_over_maximum_rejected() {
        let now = Utc::now();
        let err = quote(at(60), at(60 + 80 * 60), now, 100, 72).unwrap_err();
        assert_eq!(
            err,
            QuoteError::InvalidDuration {
                hours: 80,
                max_hours: 72
            }
        );
    }

    #[test]
    fn test_caller_cannot_influence_amount() {
        // The quote derives from timestamps and stored price alone; the §8
        // scenario: 2h at 100/hr is always 200.
        let now = Utc::now();
        let q = quote(at(10), at(130), now, 100, 72).unwrap();
        assert_eq!(q.total_amount, q.hours * 100);
        assert_eq!(q.total_amount, 200);
    }
}
