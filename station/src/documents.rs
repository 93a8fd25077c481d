//! Caiyun v2.5 response documents.
//!
//! Only the fields the station draws are modelled; serde skips the rest.

use anyhow::{Context, bail};
use serde::Deserialize;

const STATUS_OK: &str = "ok";
const API_BASE: &str = "http://api.caiyunapp.com/v2.5";

/// The two Caiyun endpoints fetched every wake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Daily,
    Realtime,
}

impl Endpoint {
    /// Caiyun takes the location as `longitude,latitude`.
    pub fn url(self, token: &str, latitude: f64, longitude: f64) -> String {
        let document = match self {
            Self::Daily => "daily.json",
            Self::Realtime => "realtime.json",
        };
        format!("{}/{}/{},{}/{}", API_BASE, token, longitude, latitude, document)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ForecastDocument {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    pub server_time: i64,
    #[serde(default)]
    pub tzshift: Option<i64>,
    result: Option<DailyResult>,
}

#[derive(Deserialize, Debug, Clone)]
struct DailyResult {
    daily: Daily,
}

#[derive(Deserialize, Debug, Clone)]
struct Daily {
    temperature: Vec<TemperatureRange>,
    skycon: Vec<DatedValue>,
    astro: Vec<Astro>,
}

#[derive(Deserialize, Debug, Clone)]
struct TemperatureRange {
    date: String,
    min: f64,
    max: f64,
}

#[derive(Deserialize, Debug, Clone)]
struct DatedValue {
    value: String,
}

#[derive(Deserialize, Debug, Clone)]
struct Astro {
    sunrise: ClockTime,
    sunset: ClockTime,
}

#[derive(Deserialize, Debug, Clone)]
struct ClockTime {
    time: String,
}

/// One forecast day, assembled from the parallel daily arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord<'a> {
    pub date: &'a str,
    pub min: f64,
    pub max: f64,
    pub skycon: &'a str,
    pub sunrise: &'a str,
    pub sunset: &'a str,
}

impl ForecastDocument {
    pub fn parse(body: &str) -> anyhow::Result<Self> {
        let document: Self =
            serde_json::from_str(body).context("Malformed daily forecast document")?;
        check_status(&document.status, document.error.as_deref(), "daily")?;
        if document.result.is_none() {
            bail!("Daily forecast document has no result");
        }
        Ok(document)
    }

    pub fn days(&self) -> Vec<DayRecord<'_>> {
        let Some(result) = &self.result else {
            return Vec::new();
        };
        let daily = &result.daily;
        daily
            .temperature
            .iter()
            .zip(&daily.skycon)
            .zip(&daily.astro)
            .map(|((temperature, skycon), astro)| DayRecord {
                date: &temperature.date,
                min: temperature.min,
                max: temperature.max,
                skycon: &skycon.value,
                sunrise: &astro.sunrise.time,
                sunset: &astro.sunset.time,
            })
            .collect()
    }

    pub fn today(&self) -> anyhow::Result<DayRecord<'_>> {
        self.days()
            .into_iter()
            .next()
            .context("Daily forecast has no entry for today")
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RealtimeDocument {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    result: Option<RealtimeResult>,
}

#[derive(Deserialize, Debug, Clone)]
struct RealtimeResult {
    realtime: Conditions,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Conditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind: Wind,
    pub air_quality: AirQuality,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AirQuality {
    pub aqi: AirQualityIndex,
}

/// Kept as a JSON number so it prints the way the provider sent it.
#[derive(Deserialize, Debug, Clone)]
pub struct AirQualityIndex {
    pub chn: serde_json::Number,
}

impl RealtimeDocument {
    pub fn parse(body: &str) -> anyhow::Result<Self> {
        let document: Self =
            serde_json::from_str(body).context("Malformed realtime conditions document")?;
        check_status(&document.status, document.error.as_deref(), "realtime")?;
        if document.result.is_none() {
            bail!("Realtime conditions document has no result");
        }
        Ok(document)
    }

    pub fn conditions(&self) -> anyhow::Result<&Conditions> {
        self.result
            .as_ref()
            .map(|r| &r.realtime)
            .context("Realtime conditions document has no result")
    }
}

fn check_status(status: &str, error: Option<&str>, which: &str) -> anyhow::Result<()> {
    if status != STATUS_OK {
        bail!(
            "Weather provider rejected {} request: status {:?}, error {:?}",
            which,
            status,
            error.unwrap_or("none")
        );
    }
    Ok(())
}
