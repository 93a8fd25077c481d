use anyhow::{Context, bail};
use chrono::FixedOffset;

use crate::units::UnitSystem;

/// Used for the date line when neither the configuration nor the provider
/// names an offset.
pub const DEFAULT_TZ_OFFSET_SECONDS: i64 = 8 * 3600;

/// The deep-sleep timer counts microseconds in a `u64`.
pub const MAX_SLEEP_SECONDS: u64 = u64::MAX / 1_000_000;

/// Configuration values exactly as they were baked into the firmware.
#[derive(Clone, Copy, Debug)]
pub struct RawSettings<'a> {
    pub caiyun_token: &'a str,
    pub latitude: &'a str,
    pub longitude: &'a str,
    pub display_location: &'a str,
    pub hub_connection_string: &'a str,
    pub sleep_seconds: &'a str,
    pub tz_offset_seconds: &'a str,
    pub units: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub caiyun_token: String,
    pub latitude: f64,
    pub longitude: f64,
    pub display_location: String,
    pub hub_connection_string: String,
    pub sleep_seconds: u64,
    /// `None` defers to the provider's `tzshift`.
    pub tz_offset_seconds: Option<i64>,
    pub units: UnitSystem,
}

impl Settings {
    pub fn parse(raw: &RawSettings<'_>) -> anyhow::Result<Self> {
        if raw.caiyun_token.trim().is_empty() {
            bail!("CAIYUN_TOKEN is empty");
        }

        let latitude: f64 = raw
            .latitude
            .trim()
            .parse()
            .with_context(|| format!("LATITUDE is not a number: {:?}", raw.latitude))?;
        if !(-90.0..=90.0).contains(&latitude) {
            bail!("LATITUDE out of range: {}", latitude);
        }

        let longitude: f64 = raw
            .longitude
            .trim()
            .parse()
            .with_context(|| format!("LONGITUDE is not a number: {:?}", raw.longitude))?;
        if !(-180.0..=180.0).contains(&longitude) {
            bail!("LONGITUDE out of range: {}", longitude);
        }

        let sleep_seconds: u64 = raw
            .sleep_seconds
            .trim()
            .parse()
            .with_context(|| format!("SLEEP_SECONDS is not a whole number: {:?}", raw.sleep_seconds))?;
        if sleep_seconds == 0 {
            bail!("SLEEP_SECONDS must be greater than zero");
        }
        if sleep_seconds > MAX_SLEEP_SECONDS {
            bail!("SLEEP_SECONDS exceeds {}: {}", MAX_SLEEP_SECONDS, sleep_seconds);
        }

        let tz_offset_seconds = if raw.tz_offset_seconds.trim().is_empty() {
            None
        } else {
            let offset = raw.tz_offset_seconds.trim().parse().with_context(|| {
                format!("TZ_OFFSET_SECONDS is not a number: {:?}", raw.tz_offset_seconds)
            })?;
            Some(checked_tz_offset(offset).context("TZ_OFFSET_SECONDS")?)
        };

        let units = raw.units.parse::<UnitSystem>().context("UNITS")?;

        Ok(Self {
            caiyun_token: raw.caiyun_token.trim().to_string(),
            latitude,
            longitude,
            display_location: raw.display_location.to_string(),
            hub_connection_string: raw.hub_connection_string.trim().to_string(),
            sleep_seconds,
            tz_offset_seconds,
            units,
        })
    }
}

/// Accepts offsets chrono can represent, strictly inside one day either way.
pub fn checked_tz_offset(seconds: i64) -> anyhow::Result<i64> {
    i32::try_from(seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("UTC offset out of range: {}s", seconds))?;
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawSettings<'static> {
        RawSettings {
            caiyun_token: "token",
            latitude: "31.23",
            longitude: "121.47",
            display_location: "Shanghai",
            hub_connection_string: "HostName=h;DeviceId=d;SharedAccessKey=aGVsbG8=",
            sleep_seconds: "1800",
            tz_offset_seconds: "",
            units: "metric",
        }
    }

    #[test]
    fn parses_complete_configuration() {
        let settings = Settings::parse(&raw()).unwrap();
        assert_eq!(settings.latitude, 31.23);
        assert_eq!(settings.longitude, 121.47);
        assert_eq!(settings.sleep_seconds, 1800);
        assert_eq!(settings.tz_offset_seconds, None);
        assert_eq!(settings.units, UnitSystem::Metric);
    }

    #[test]
    fn explicit_offset_and_imperial_units() {
        let settings = Settings::parse(&RawSettings {
            tz_offset_seconds: "-18000",
            units: "Imperial",
            ..raw()
        })
        .unwrap();
        assert_eq!(settings.tz_offset_seconds, Some(-18000));
        assert_eq!(settings.units, UnitSystem::Imperial);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(Settings::parse(&RawSettings { latitude: "north", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { longitude: "200", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { sleep_seconds: "-5", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { sleep_seconds: "0", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { units: "kelvin", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { caiyun_token: " ", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { tz_offset_seconds: "east", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { tz_offset_seconds: "86400", ..raw() }).is_err());
        assert!(Settings::parse(&RawSettings { tz_offset_seconds: "-100000", ..raw() }).is_err());
        assert!(
            Settings::parse(&RawSettings { tz_offset_seconds: "9223372036854775807", ..raw() })
                .is_err()
        );
        assert!(
            Settings::parse(&RawSettings { sleep_seconds: "18446744073709551615", ..raw() })
                .is_err()
        );
    }

    #[test]
    fn accepts_boundary_values() {
        let settings = Settings::parse(&RawSettings {
            sleep_seconds: &MAX_SLEEP_SECONDS.to_string(),
            tz_offset_seconds: "-86399",
            ..raw()
        })
        .unwrap();
        assert_eq!(settings.sleep_seconds, MAX_SLEEP_SECONDS);
        assert_eq!(settings.tz_offset_seconds, Some(-86_399));
        assert!(checked_tz_offset(86_399).is_ok());
        assert!(checked_tz_offset(i64::MIN).is_err());
    }
}
