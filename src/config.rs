use station::config::{RawSettings, Settings};

pub(crate) const WIFI_SSID: &str = env!("WIFI_SSID");
pub(crate) const WIFI_PASS: &str = env!("WIFI_PASS");
pub(crate) const TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) const WIFI_MAX_ATTEMPTS: u32 = 5;
pub(crate) const NTP_MAX_WAIT_CYCLES: u32 = 150;
pub(crate) const HTTP_TIMEOUT_MS: u64 = 15_000;
pub(crate) const HUB_EVENT_TIMEOUT_SECS: u64 = 20;
/// Used when the baked configuration itself is unusable.
pub(crate) const FALLBACK_SLEEP_SECS: u64 = 15 * 60;

pub(crate) const EPD_SPI_BAUDRATE: u32 = 1_000_000;

const RAW_SETTINGS: RawSettings<'static> = RawSettings {
    caiyun_token: env!("CAIYUN_TOKEN"),
    latitude: env!("LATITUDE"),
    longitude: env!("LONGITUDE"),
    display_location: env!("DISPLAY_LOCATION"),
    hub_connection_string: env!("IOT_HUB_CONNECTION_STRING"),
    sleep_seconds: env!("SLEEP_SECONDS"),
    tz_offset_seconds: match option_env!("TZ_OFFSET_SECONDS") {
        Some(offset) => offset,
        None => "",
    },
    units: match option_env!("UNITS") {
        Some(units) => units,
        None => "metric",
    },
};

pub(crate) fn load_settings() -> anyhow::Result<Settings> {
    Settings::parse(&RAW_SETTINGS)
}
