//! Pure mapping from provider documents to display field contents.

use anyhow::Context;
use chrono::{DateTime, Datelike};

use crate::config::{DEFAULT_TZ_OFFSET_SECONDS, checked_tz_offset};
use crate::documents::{ForecastDocument, RealtimeDocument};
use crate::icons::{IconIndex, icon_index};
use crate::units::{UnitSystem, humidity_text, temperature_text, wind_text};

const DAYS: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

const MONTHS: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// How sunrise and sunset strings are treated.
///
/// Caiyun reports astro times as wall-clock `HH:MM` in the location's own
/// zone, so they are shown as received and the timezone offset is not
/// applied to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AstroTimes {
    #[default]
    ProviderLocal,
}

/// New content for every mutable field of the widget group.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldUpdates {
    pub date: String,
    pub icon: IconIndex,
    pub morning_temp: String,
    pub day_temp: String,
    pub night_temp: String,
    pub humidity: String,
    pub wind: String,
    pub sunrise: String,
    pub sunset: String,
    pub air_quality: String,
}

pub fn map_fields(
    forecast: &ForecastDocument,
    realtime: &RealtimeDocument,
    tz_offset_seconds: i64,
    units: UnitSystem,
) -> anyhow::Result<FieldUpdates> {
    let today = forecast.today()?;
    let now = realtime.conditions()?;

    let icon = icon_index(today.skycon)?;

    Ok(FieldUpdates {
        date: date_line(forecast.server_time, tz_offset_seconds)?,
        icon,
        morning_temp: temperature_text(today.min, units),
        day_temp: temperature_text(now.temperature, units),
        night_temp: temperature_text(today.max, units),
        humidity: humidity_text(now.humidity),
        wind: wind_text(now.wind.speed, units),
        sunrise: astro_text(today.sunrise, "AM", AstroTimes::default()),
        sunset: astro_text(today.sunset, "PM", AstroTimes::default()),
        air_quality: format!("AQI: {}", now.air_quality.aqi.chn),
    })
}

/// Offset for the date line. A configured offset wins over the provider's
/// `tzshift`.
pub fn local_offset(configured: Option<i64>, forecast: &ForecastDocument) -> anyhow::Result<i64> {
    match configured {
        Some(offset) => checked_tz_offset(offset),
        None => checked_tz_offset(forecast.tzshift.unwrap_or(DEFAULT_TZ_OFFSET_SECONDS))
            .context("Provider tzshift"),
    }
}

/// `"WEEKDAY MONTH DAY, YEAR"` for the local calendar day of `unix_seconds`.
pub fn date_line(unix_seconds: i64, tz_offset_seconds: i64) -> anyhow::Result<String> {
    let shifted = unix_seconds.checked_add(tz_offset_seconds).with_context(|| {
        format!("Server time {} shifted by {}s overflows", unix_seconds, tz_offset_seconds)
    })?;
    let local = DateTime::from_timestamp(shifted, 0)
        .with_context(|| format!("Server time {} is out of range", unix_seconds))?;

    Ok(format!(
        "{} {} {}, {}",
        DAYS[local.weekday().num_days_from_monday() as usize],
        MONTHS[local.month0() as usize],
        local.day(),
        local.year()
    ))
}

pub fn astro_text(time: &str, suffix: &str, treatment: AstroTimes) -> String {
    match treatment {
        AstroTimes::ProviderLocal => format!("{} {}", time, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::fixtures::{DAILY, REALTIME};

    fn documents() -> (ForecastDocument, RealtimeDocument) {
        (
            ForecastDocument::parse(DAILY).unwrap(),
            RealtimeDocument::parse(REALTIME).unwrap(),
        )
    }

    #[test]
    fn fixture_maps_to_every_field() {
        let (forecast, realtime) = documents();
        let updates = map_fields(&forecast, &realtime, 28800, UnitSystem::Metric).unwrap();

        assert_eq!(updates.date, "SUNDAY OCTOBER 19, 2025");
        assert_eq!(updates.icon, icon_index("CLEAR_DAY").unwrap());
        assert_eq!(updates.icon.code(), "01");
        assert_eq!(updates.morning_temp, " 16C");
        assert_eq!(updates.day_temp, " 21C");
        assert_eq!(updates.night_temp, " 25C");
        assert_eq!(updates.humidity, " 42%");
        assert_eq!(updates.wind, " 10m/s");
        assert_eq!(updates.sunrise, "05:58 AM");
        assert_eq!(updates.sunset, "17:21 PM");
        assert_eq!(updates.air_quality, "AQI: 49");
    }

    #[test]
    fn imperial_mode_converts_temperature_and_wind() {
        let (forecast, realtime) = documents();
        let updates = map_fields(&forecast, &realtime, 28800, UnitSystem::Imperial).unwrap();
        assert_eq!(updates.day_temp, " 70F");
        assert_eq!(updates.morning_temp, " 61F");
        assert_eq!(updates.wind, " 22mph");
    }

    #[test]
    fn astro_times_ignore_timezone_offset() {
        let (forecast, realtime) = documents();
        let east = map_fields(&forecast, &realtime, 28800, UnitSystem::Metric).unwrap();
        let west = map_fields(&forecast, &realtime, -36000, UnitSystem::Metric).unwrap();
        assert_eq!(east.sunrise, west.sunrise);
        assert_eq!(east.sunset, west.sunset);
        assert_ne!(east.date, west.date);
    }

    #[test]
    fn unknown_skycon_fails_mapping() {
        let (_, realtime) = documents();
        let forecast =
            ForecastDocument::parse(&DAILY.replace("\"CLEAR_DAY\"", "\"VOLCANIC_ASH\"")).unwrap();
        let err = map_fields(&forecast, &realtime, 0, UnitSystem::Metric).unwrap_err();
        assert!(err.to_string().contains("VOLCANIC_ASH"));
    }

    #[test]
    fn date_line_crosses_midnight_with_offset() {
        // 2024-02-29 23:30 UTC
        let ts = 1_709_249_400;
        assert_eq!(date_line(ts, 0).unwrap(), "THURSDAY FEBRUARY 29, 2024");
        assert_eq!(date_line(ts, 3600).unwrap(), "FRIDAY MARCH 1, 2024");
    }

    #[test]
    fn date_line_reports_overflow_instead_of_panicking() {
        let err = date_line(1_760_832_000, i64::MAX).unwrap_err();
        assert!(err.to_string().contains("overflows"));
        assert!(date_line(i64::MIN, -1).is_err());
    }

    #[test]
    fn configured_offset_wins_over_tzshift() {
        let (forecast, _) = documents();
        assert_eq!(local_offset(Some(-18000), &forecast).unwrap(), -18000);
        assert_eq!(local_offset(None, &forecast).unwrap(), 28800);
    }

    #[test]
    fn tzshift_fallbacks() {
        let west = ForecastDocument::parse(&DAILY.replace("\"tzshift\": 28800", "\"tzshift\": -25200"))
            .unwrap();
        assert_eq!(local_offset(None, &west).unwrap(), -25200);

        let missing = ForecastDocument::parse(&DAILY.replace("\"tzshift\": 28800,", "")).unwrap();
        assert_eq!(local_offset(None, &missing).unwrap(), DEFAULT_TZ_OFFSET_SECONDS);

        let bogus = ForecastDocument::parse(&DAILY.replace("\"tzshift\": 28800", "\"tzshift\": 100000"))
            .unwrap();
        assert!(local_offset(None, &bogus).is_err());
    }
}
