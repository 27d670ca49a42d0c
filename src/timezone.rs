//! Resolves the configured canonical timezone to an offset and a local clock.

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current wall-clock time in the given timezone, e.g. "Asia/Tokyo".
///
/// Returns `None` if the timezone name is not a canonical timezone.
pub fn local_now(canonical_timezone: &str) -> Option<PrimitiveDateTime> {
    get_local_offset(canonical_timezone).map(|offset| {
        let now = OffsetDateTime::now_utc().to_offset(offset);
        PrimitiveDateTime::new(now.date(), now.time())
    })
}

#[cfg(test)]
mod timezone_tests {
    use super::{get_local_offset, local_now};

    #[test]
    fn resolves_canonical_timezone() {
        assert!(get_local_offset("Asia/Tokyo").is_some());
        assert!(local_now("Etc/UTC").is_some());
    }

    #[test]
    fn rejects_invalid_timezone() {
        assert!(get_local_offset("Not/AZone").is_none());
        assert!(local_now("Not/AZone").is_none());
    }
}
