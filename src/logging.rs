use crate::time_utils::{get_formatted_timestamp, get_uptime_string};
use log::{error, info, warn};
use station::cycle::CycleReport;
use station::hub::CloudMessage;

const SPLASH_SCREEN: &str = r#"
  _____ ____  ____     __        __         _   _
 | ____|  _ \|  _ \    \ \      / /__  __ _| |_| |__   ___ _ __
 |  _| | |_) | | | |____\ \ /\ / / _ \/ _` | __| '_ \ / _ \ '__|
 | |___|  __/| |_| |_____\ V  V /  __/ (_| | |_| | | |  __/ |
 |_____|_|   |____/       \_/\_/ \___|\__,_|\__|_| |_|\___|_|   "#;

pub(crate) enum LogLevel {
    Info,
    Warn,
    Error,
}

pub(crate) fn print_splash_screen() {
    info!("{}", SPLASH_SCREEN);
}

pub(crate) fn log_stage(message: &str) {
    log_message(LogLevel::Info, message, &get_formatted_timestamp());
}

pub(crate) fn log_cycle_report(report: &CycleReport) {
    let ts = get_formatted_timestamp();
    let fields = &report.fields;

    let today_msg = format!(
        "[ 📅 {} | 🌡️ {} /{} /{} | 💧{} | 🌬️ {} | {} ]",
        fields.date,
        fields.morning_temp,
        fields.day_temp,
        fields.night_temp,
        fields.humidity,
        fields.wind,
        fields.air_quality
    );
    log_message(LogLevel::Info, &today_msg, &ts);

    let sky_msg = format!(
        "☀️ icon {} | 🌅 {} | 🌇 {}",
        fields.icon.code(),
        fields.sunrise,
        fields.sunset
    );
    log_message(LogLevel::Info, &sky_msg, &ts);

    log_message(
        LogLevel::Info,
        &format!("📡 Telemetry {:?}: {:?}", report.publish, report.telemetry),
        &ts,
    );
}

pub(crate) fn log_cloud_message(message: &CloudMessage) {
    let properties =
        serde_json::to_string(&message.properties).unwrap_or_else(|_| "{}".to_string());
    log_message(
        LogLevel::Info,
        &format!(
            "📨 Received message with body {:?} and properties {}",
            message.body, properties
        ),
        &get_formatted_timestamp(),
    );
}

pub(crate) fn log_hub_warning(message: &str) {
    log_message(LogLevel::Warn, message, &get_formatted_timestamp());
}

pub(crate) fn log_fault(stage: &str, error: &anyhow::Error) {
    log_message(
        LogLevel::Error,
        &format!("🚫 {} aborted: {:#}", stage, error),
        &get_formatted_timestamp(),
    );
}

fn log_message(level: LogLevel, message: &str, custom_ts: &str) {
    let uptime = get_uptime_string();
    let prefix = format!("{} [{}]", uptime, custom_ts);

    match level {
        LogLevel::Error => error!("\x1b[31m{} {}\x1b[0m", prefix, message),
        LogLevel::Warn => warn!("\x1b[38;5;11m{} {}\x1b[0m", prefix, message),
        LogLevel::Info => info!("\x1b[38;5;40m{} {}\x1b[0m", prefix, message),
    }
}
