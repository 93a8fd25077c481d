use crate::config::HTTP_TIMEOUT_MS;
use anyhow::{Context, Result, bail};
use embedded_svc::http::client::Client;
use embedded_svc::io::Read;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use log::info;
use station::config::Settings;
use station::cycle::ForecastSource;
use station::documents::{Endpoint, ForecastDocument, RealtimeDocument};
use std::time::Duration;

const MAX_BODY_BYTES: usize = 32 * 1024;

/// Caiyun over plain HTTP: the single TLS slot belongs to the hub session.
#[derive(Default)]
pub(crate) struct CaiyunClient;

impl ForecastSource for CaiyunClient {
    async fn fetch(&mut self, settings: &Settings) -> Result<(ForecastDocument, RealtimeDocument)> {
        let daily = http_get(&Endpoint::Daily.url(
            &settings.caiyun_token,
            settings.latitude,
            settings.longitude,
        ))
        .context("Daily forecast request failed")?;
        let forecast = ForecastDocument::parse(&daily)?;

        let realtime = http_get(&Endpoint::Realtime.url(
            &settings.caiyun_token,
            settings.latitude,
            settings.longitude,
        ))
        .context("Realtime conditions request failed")?;
        let realtime = RealtimeDocument::parse(&realtime)?;

        Ok((forecast, realtime))
    }
}

fn http_get(url: &str) -> Result<String> {
    let connection = EspHttpConnection::new(&Configuration {
        timeout: Some(Duration::from_millis(HTTP_TIMEOUT_MS)),
        ..Default::default()
    })?;
    let mut client = Client::wrap(connection);

    let response = client.get(url)?.submit()?;
    let status = response.status();
    info!("🌦️ HTTP GET {} -> status {}", redact_token(url), status);

    if !(200..=299).contains(&status) {
        bail!("Unexpected response code: {}", status);
    }

    let mut body: Vec<u8> = Vec::new();
    let mut buf = [0u8; 1024];
    let mut reader = response;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
        if body.len() > MAX_BODY_BYTES {
            bail!("Response too large (>{} bytes)", MAX_BODY_BYTES);
        }
    }

    let text = String::from_utf8(body).context("Response is not UTF-8")?;
    if !text.trim_start().starts_with('{') {
        bail!("Response is not JSON");
    }

    Ok(text)
}

/// The token is the path segment right after the API version.
fn redact_token(url: &str) -> String {
    match url.split('/').nth(4) {
        Some(token) if !token.is_empty() => url.replacen(token, "***", 1),
        _ => url.to_string(),
    }
}
