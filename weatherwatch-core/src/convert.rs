//! Pure unit and time conversions.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ConvertError;

/// Wall-clock format the provider uses for `last_updated`.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const KPH_TO_MPH: f64 = 0.621371;

fn parse_tz(tz_name: &str) -> Result<Tz, ConvertError> {
    tz_name.parse::<Tz>().map_err(|_| ConvertError::UnknownTimezone(tz_name.to_string()))
}

/// Interpret `local` ("YYYY-MM-DD HH:MM") as wall-clock time in `tz_name`
/// and return the matching UTC instant.
///
/// The offset is resolved for the given date, so DST is honoured. A wall
/// time repeated by a fall-back transition resolves to its earliest
/// instant; a wall time skipped by a spring-forward transition is an error.
pub fn to_utc(local: &str, tz_name: &str) -> Result<DateTime<Utc>, ConvertError> {
    let naive = NaiveDateTime::parse_from_str(local.trim(), LOCAL_TIME_FORMAT).map_err(|source| {
        ConvertError::Parse { input: local.to_string(), source }
    })?;
    let tz = parse_tz(tz_name)?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            Err(ConvertError::NonexistentLocalTime { local: naive, tz: tz_name.to_string() })
        }
    }
}

/// Wall-clock time of `instant` in `tz_name`.
pub fn to_local(instant: DateTime<Utc>, tz_name: &str) -> Result<NaiveDateTime, ConvertError> {
    let tz = parse_tz(tz_name)?;
    Ok(instant.with_timezone(&tz).naive_local())
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    1.8 * c + 32.0
}

pub fn kph_to_mph(kph: f64) -> f64 {
    kph * KPH_TO_MPH
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kolkata_last_updated_to_utc() {
        let utc = to_utc("2024-09-07 16:45", "Asia/Kolkata").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 9, 7, 11, 15, 0).unwrap());
    }

    #[test]
    fn new_york_uses_daylight_offset_in_summer_and_standard_in_winter() {
        let summer = to_utc("2022-07-22 16:45", "America/New_York").unwrap();
        assert_eq!(summer, Utc.with_ymd_and_hms(2022, 7, 22, 20, 45, 0).unwrap());

        let winter = to_utc("2022-01-22 16:45", "America/New_York").unwrap();
        assert_eq!(winter, Utc.with_ymd_and_hms(2022, 1, 22, 21, 45, 0).unwrap());
    }

    #[test]
    fn repeated_wall_time_resolves_to_earliest_instant() {
        let utc = to_utc("2024-11-03 01:30", "America/New_York").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
    }

    #[test]
    fn skipped_wall_time_is_rejected() {
        let err = to_utc("2024-03-10 02:30", "America/New_York").unwrap_err();
        assert!(matches!(err, ConvertError::NonexistentLocalTime { .. }));
    }

    #[test]
    fn malformed_local_time_is_a_parse_error() {
        for input in ["2024-09-07T16:45", "07/09/2024 16:45", "2024-09-07", ""] {
            let err = to_utc(input, "Asia/Kolkata").unwrap_err();
            assert!(matches!(err, ConvertError::Parse { .. }), "input {input:?}");
        }
    }

    #[test]
    fn unknown_timezone_is_reported() {
        let err = to_utc("2024-09-07 16:45", "Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownTimezone(ref tz) if tz == "Mars/Olympus_Mons"));
    }

    #[test]
    fn utc_output_round_trips_through_the_same_timezone() {
        let cases = [
            ("2024-09-07 16:45", "Asia/Kolkata"),
            ("2022-07-22 16:45", "America/New_York"),
            ("2023-12-31 23:59", "Pacific/Auckland"),
            ("2024-03-31 03:00", "Europe/Berlin"),
        ];

        for (local, tz) in cases {
            let utc = to_utc(local, tz).unwrap();
            let back = to_local(utc, tz).unwrap().format(LOCAL_TIME_FORMAT).to_string();
            assert_eq!(back, local);
            assert_eq!(to_utc(&back, tz).unwrap(), utc);
        }
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
        assert_eq!(kph_to_mph(0.0), 0.0);
        assert_eq!(round2(kph_to_mph(100.0)), 62.14);
    }

    #[test]
    fn round2_goes_half_away_from_zero() {
        assert_eq!(round2(15.0), 15.0);
        assert_eq!(round2(2.345_000_1), 2.35);
        assert_eq!(round2(-1.005_000_1), -1.01);
    }
}
