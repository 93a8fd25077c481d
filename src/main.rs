mod config;
mod display;
mod forecast;
mod logging;
mod network;
mod sleep;
mod telemetry;
mod time_utils;

use crate::config::FALLBACK_SLEEP_SECS;
use crate::display::{DisplayPins, EpdPanel};
use crate::forecast::CaiyunClient;
use crate::logging::{log_cycle_report, log_fault, log_stage, print_splash_screen};
use crate::network::WifiLink;
use crate::sleep::enter_deep_sleep;
use crate::telemetry::AzureHub;
use anyhow::Context;
use embassy_executor::Spawner;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::link_patches;
use station::config::Settings;
use station::cycle::WakeCycle;
use station::session::SessionSlot;
use station::widgets::WidgetGroup;
use std::time::Duration;

static SESSION_SLOT: SessionSlot = SessionSlot::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    link_patches();
    EspLogger::initialize_default();
    print_splash_screen();

    let settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            log_fault("Configuration", &e);
            enter_deep_sleep(Duration::from_secs(FALLBACK_SLEEP_SECS));
        }
    };
    // Without a configured offset, log timestamps stay in UTC.
    if let Some(offset) = settings.tz_offset_seconds {
        time_utils::set_local_offset(offset);
    }

    // A failed wake still sleeps; the next one starts from scratch.
    if let Err(e) = wake(&settings).await {
        log_fault("Wake cycle", &e);
    }

    enter_deep_sleep(Duration::from_secs(settings.sleep_seconds));
}

async fn wake(settings: &Settings) -> anyhow::Result<()> {
    let peripherals = Peripherals::take().with_context(|| "Failed to take Peripherals")?;
    let sys_loop = EspSystemEventLoop::take().with_context(|| "Failed to take event loop")?;
    let nvs = EspDefaultNvsPartition::take().with_context(|| "Failed to take NVS")?;

    log_stage("📶 Connecting to WiFi...");
    let mut wifi = WifiLink::new(peripherals.modem, sys_loop, nvs)?;
    wifi.join().await?;

    log_stage("⏳ Getting the time...");
    let _sntp = time_utils::setup_ntp().await?;

    let pins = peripherals.pins;
    let mut panel = EpdPanel::new(
        peripherals.spi2,
        DisplayPins {
            sclk: pins.gpio33.into(),
            sdo: pins.gpio34.into(),
            cs: pins.gpio36.into(),
            dc: pins.gpio37.into(),
            rst: pins.gpio38.into(),
            busy: pins.gpio39.into(),
        },
    )?;
    let mut widgets = WidgetGroup::new(&settings.display_location);

    let mut hub = AzureHub::new(&settings.hub_connection_string)
        .context("IoT Hub connection string")?;

    let report = WakeCycle {
        settings,
        slot: &SESSION_SLOT,
        source: &mut CaiyunClient,
        panel: &mut panel,
        network: &mut wifi,
        hub: &mut hub,
    }
    .run(&mut widgets)
    .await?;

    log_cycle_report(&report);
    Ok(())
}
