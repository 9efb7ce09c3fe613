use chrono::{DateTime, Duration, Utc};

/// Maps timestamps onto fixed-width buckets aligned to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketClock {
    width_secs: i64,
}

impl BucketClock {
    /// A zero width is clamped to one minute.
    #[must_use]
    pub fn new(width_minutes: u32) -> Self {
        Self {
            width_secs: i64::from(width_minutes.max(1)) * 60,
        }
    }

    #[must_use]
    pub fn width(&self) -> Duration {
        Duration::seconds(self.width_secs)
    }

    /// `ts` truncated down to the nearest bucket boundary.
    #[must_use]
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = ts.timestamp();
        let start = secs - secs.rem_euclid(self.width_secs);
        DateTime::from_timestamp(start, 0).unwrap_or(ts)
    }

    #[must_use]
    pub fn bucket_end(&self, bucket: DateTime<Utc>) -> DateTime<Utc> {
        bucket + self.width()
    }

    /// Start of the baseline window covering `buckets` buckets before `bucket`.
    #[must_use]
    pub fn history_start(&self, bucket: DateTime<Utc>, buckets: u32) -> DateTime<Utc> {
        bucket - Duration::seconds(self.width_secs * i64::from(buckets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncates_to_width_multiple() {
        let clock = BucketClock::new(30);
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 10, 47, 12).unwrap();
        assert_eq!(
            clock.bucket_start(ts),
            Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn boundary_is_its_own_bucket() {
        let clock = BucketClock::new(15);
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 10, 45, 0).unwrap();
        assert_eq!(clock.bucket_start(ts), ts);
    }

    #[test]
    fn history_window_spans_prior_buckets() {
        let clock = BucketClock::new(30);
        let bucket = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        assert_eq!(
            clock.history_start(bucket, 6),
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
        );
        assert_eq!(
            clock.bucket_end(bucket),
            Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn zero_width_is_clamped() {
        assert_eq!(BucketClock::new(0).width(), Duration::minutes(1));
    }
}
