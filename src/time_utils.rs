use crate::config::{NTP_MAX_WAIT_CYCLES, TIMESTAMP_PATTERN};
use anyhow::{Context, bail};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use embassy_sync::once_lock::OnceLock;
use embassy_time::Timer;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::sys::esp_timer_get_time;
use log::info;

static LOCAL_OFFSET: OnceLock<FixedOffset> = OnceLock::new();

/// The hub rejects SAS tokens signed with a 1970 clock, so unlike a plain
/// logger the station cannot proceed without a synchronized time.
pub(crate) async fn setup_ntp() -> anyhow::Result<EspSntp<'static>> {
    let ntp_client = EspSntp::new_default().context("‼️ Failed to init NTP")?;
    info!("\x1b[38;5;27m ⏳ Time sync in progress...");

    let mut wait_cycles = 0;

    while ntp_client.get_sync_status() != SyncStatus::Completed {
        if wait_cycles >= NTP_MAX_WAIT_CYCLES {
            bail!(
                "⏳ NTP sync timed out after {}s",
                NTP_MAX_WAIT_CYCLES / 10
            );
        }

        Timer::after_millis(100).await;

        wait_cycles += 1;
    }

    info!("\x1b[38;5;27m ⏳ Time is synchronized: {}", get_formatted_timestamp());
    Ok(ntp_client)
}

pub(crate) fn set_local_offset(offset_seconds: i64) {
    let offset = i32::try_from(offset_seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .unwrap_or(Utc.fix());
    let _ = LOCAL_OFFSET.init(offset);
}

pub(crate) fn timestamp_unix_s() -> i64 {
    Utc::now().timestamp()
}

pub(crate) fn get_uptime_string() -> String {
    let micros = unsafe { esp_timer_get_time() };
    let seconds = micros / 1_000_000;
    let millis = (micros % 1_000_000) / 1_000;
    format!("[{:>4}.{:03}s]", seconds, millis)
}

pub(crate) fn get_formatted_timestamp() -> String {
    get_current_local_time().format(TIMESTAMP_PATTERN).to_string()
}

fn get_current_local_time() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(cached_offset())
}

fn cached_offset() -> &'static FixedOffset {
    LOCAL_OFFSET.get_or_init(|| Utc.fix())
}
