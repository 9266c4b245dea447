//! When the next newsletter goes out and what its header says.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{NewsletterError, NewsletterResult};

/// Scheduling parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpec {
    /// Tomorrow, in the configured zone.
    pub target_date: NaiveDate,
    /// e.g. `March 2nd, 2024`
    pub header_label: String,
    /// RFC 3339 send time with the zone's UTC offset.
    pub schedule_time: String,
}

impl ScheduleSpec {
    /// Schedule for the day after `now` in `tz`, sending at `send_hour` local time.
    pub fn for_tomorrow(now: DateTime<Utc>, tz: Tz, send_hour: u32) -> NewsletterResult<Self> {
        let target_date = today_in(now, tz) + Duration::days(1);

        let local = target_date
            .and_hms_opt(send_hour, 0, 0)
            .ok_or_else(|| NewsletterError::Schedule(format!("invalid send hour {send_hour}")))?;
        let send_at = tz.from_local_datetime(&local).earliest().ok_or_else(|| {
            NewsletterError::Schedule(format!("{local} does not exist in {}", tz.name()))
        })?;

        Ok(ScheduleSpec {
            target_date,
            header_label: header_label(target_date),
            schedule_time: send_at.to_rfc3339(),
        })
    }

    pub fn campaign_title(&self, prefix: &str) -> String {
        format!("{prefix} - {}", self.header_label)
    }
}

/// `1st`, `2nd`, `3rd`, `4th`, ... with the teens always `th`.
pub fn ordinal(n: u32) -> String {
    let suffix = if (10..=20).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{n}{suffix}")
}

/// Long-form header date, e.g. `March 2nd, 2024`.
pub fn header_label(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        date.format("%B"),
        ordinal(date.day()),
        date.year()
    )
}

/// Today's date in `tz`.
pub fn today_in(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    #[test]
    fn ordinal_suffixes() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (31, "31st"),
            (111, "111th"),
        ];
        for (n, expected) in cases {
            assert_eq!(ordinal(n), expected);
        }
    }

    #[test]
    fn label_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(header_label(date), "March 2nd, 2024");
    }

    #[test]
    fn winter_schedule_uses_standard_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let spec = ScheduleSpec::for_tomorrow(now, New_York, 9).unwrap();

        assert_eq!(spec.target_date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(spec.header_label, "March 2nd, 2024");
        assert_eq!(spec.schedule_time, "2024-03-02T09:00:00-05:00");
    }

    #[test]
    fn summer_schedule_uses_daylight_offset() {
        let now = Utc.with_ymd_and_hms(2024, 7, 10, 15, 0, 0).unwrap();
        let spec = ScheduleSpec::for_tomorrow(now, New_York, 9).unwrap();
        assert_eq!(spec.schedule_time, "2024-07-11T09:00:00-04:00");
    }

    #[test]
    fn tomorrow_is_local_not_utc() {
        // 02:30 UTC on the 2nd is still the evening of the 1st in New York
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 2, 30, 0).unwrap();
        let spec = ScheduleSpec::for_tomorrow(now, New_York, 9).unwrap();

        assert_eq!(today_in(now, New_York), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(spec.header_label, "March 2nd, 2024");
    }

    #[test]
    fn bad_send_hour_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        assert!(ScheduleSpec::for_tomorrow(now, New_York, 24).is_err());
    }

    #[test]
    fn title_uses_label() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let spec = ScheduleSpec::for_tomorrow(now, New_York, 9).unwrap();
        assert_eq!(spec.campaign_title("GAPSA Newsletter"), "GAPSA Newsletter - March 2nd, 2024");
    }
}
