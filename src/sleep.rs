use log::info;
use std::time::Duration;

/// Arms the RTC timer and powers down. The next wake starts again at `main`.
pub(crate) fn enter_deep_sleep(duration: Duration) -> ! {
    info!("💤 Entering deep sleep for {}s", duration.as_secs());
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    unsafe { esp_idf_svc::sys::esp_deep_sleep(micros) }
}
