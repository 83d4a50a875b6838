use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

const SAST_OFFSET_SECS: i32 = 2 * 3600;

/// South Africa Standard Time (UTC+2, no DST). All scheduling decisions and
/// the parser's date defaulting happen on this clock.
pub fn sast() -> FixedOffset {
    FixedOffset::east_opt(SAST_OFFSET_SECS).unwrap()
}

pub fn sast_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&sast())
}

/// Wall-clock time in SAST, as a naive datetime for schedule comparisons.
pub fn sast_local_now() -> NaiveDateTime {
    sast_now().naive_local()
}

pub fn sast_today() -> NaiveDate {
    sast_local_now().date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_sast_is_two_hours_ahead_of_utc() {
        let utc = Utc::now();
        let local = utc.with_timezone(&sast());
        let expected = (utc.hour() + 2) % 24;
        assert_eq!(local.hour(), expected);
    }
}
