//! Calendar arithmetic for chart buckets.

use chrono::{DateTime, Datelike, Duration, Months, Timelike, Utc};

use climate_types::{BucketWidth, Lookback, Period};

/// Move `t` back by `n` bucket widths
pub fn step_back(width: BucketWidth, t: DateTime<Utc>, n: u32) -> DateTime<Utc> {
    let n = i64::from(n);
    match width {
        BucketWidth::Minute => t - Duration::minutes(n),
        BucketWidth::Hour => t - Duration::hours(n),
        BucketWidth::Day => t - Duration::days(n),
        BucketWidth::Month => t
            .checked_sub_months(Months::new(n as u32))
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
    }
}

/// Truncate `t` to the start of its bucket (UTC)
pub fn truncate(width: BucketWidth, t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive();
    let naive = match width {
        BucketWidth::Minute => date.and_hms_opt(t.hour(), t.minute(), 0),
        BucketWidth::Hour => date.and_hms_opt(t.hour(), 0, 0),
        BucketWidth::Day => date.and_hms_opt(0, 0, 0),
        BucketWidth::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    };
    naive.map(|n| n.and_utc()).unwrap_or(t)
}

/// Earliest instant covered by a period's lookback window
pub fn window_start(period: Period, now: DateTime<Utc>) -> DateTime<Utc> {
    match period.lookback() {
        Lookback::Minutes(m) => now - Duration::minutes(m),
        Lookback::Hours(h) => now - Duration::hours(h),
        Lookback::Days(d) => now - Duration::days(d),
        Lookback::Months(m) => now
            .checked_sub_months(Months::new(m))
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate() {
        let t = Utc.with_ymd_and_hms(2024, 3, 17, 14, 37, 52).unwrap();
        assert_eq!(
            truncate(BucketWidth::Minute, t),
            Utc.with_ymd_and_hms(2024, 3, 17, 14, 37, 0).unwrap()
        );
        assert_eq!(
            truncate(BucketWidth::Hour, t),
            Utc.with_ymd_and_hms(2024, 3, 17, 14, 0, 0).unwrap()
        );
        assert_eq!(
            truncate(BucketWidth::Day, t),
            Utc.with_ymd_and_hms(2024, 3, 17, 0, 0, 0).unwrap()
        );
        assert_eq!(
            truncate(BucketWidth::Month, t),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_step_back_months_clamps_day() {
        let t = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            step_back(BucketWidth::Month, t, 1),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 17, 14, 0, 0).unwrap();
        assert_eq!(window_start(Period::Day, now), now - Duration::hours(24));
        assert_eq!(window_start(Period::Month, now), now - Duration::days(31));
        assert_eq!(
            window_start(Period::Year, now),
            Utc.with_ymd_and_hms(2023, 3, 17, 14, 0, 0).unwrap()
        );
    }
}
