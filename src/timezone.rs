//! Helpers for working with the server's configured timezone.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// The current UTC offset of the timezone `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in the timezone `canonical_timezone`.
pub fn local_today(canonical_timezone: &str) -> Option<Date> {
    get_local_offset(canonical_timezone)
        .map(|offset| OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use super::{get_local_offset, local_today};

    #[test]
    fn utc_has_zero_offset() {
        let offset = get_local_offset("Etc/UTC").expect("Etc/UTC should be a known timezone");

        assert!(offset.is_utc());
    }

    #[test]
    fn unknown_timezone_is_none() {
        assert_eq!(get_local_offset("Middle/Earth"), None);
        assert_eq!(local_today("Middle/Earth"), None);
    }
}
