//! Azure IoT Hub device identity over MQTT.

use std::collections::BTreeMap;

use anyhow::{Context, anyhow, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::publish::PublishError;

const API_VERSION: &str = "2021-04-12";
pub const MQTT_TLS_PORT: u16 = 8883;
pub const TOKEN_LIFETIME_SECONDS: i64 = 3600;

type HmacSha256 = Hmac<Sha256>;

/// `HostName=…;DeviceId=…;SharedAccessKey=…` as issued by the hub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionString {
    pub host_name: String,
    pub device_id: String,
    shared_access_key: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .with_context(|| format!("Connection string segment {:?} has no '='", part))?;
            match key {
                "HostName" => host_name = Some(value.to_string()),
                "DeviceId" => device_id = Some(value.to_string()),
                "SharedAccessKey" => shared_access_key = Some(value.to_string()),
                _ => {}
            }
        }

        let (Some(host_name), Some(device_id), Some(shared_access_key)) =
            (host_name, device_id, shared_access_key)
        else {
            bail!("Connection string needs HostName, DeviceId and SharedAccessKey");
        };

        Ok(Self {
            host_name,
            device_id,
            shared_access_key,
        })
    }

    pub fn broker_url(&self) -> String {
        format!("mqtts://{}:{}", self.host_name, MQTT_TLS_PORT)
    }

    pub fn username(&self) -> String {
        format!(
            "{}/{}/?api-version={}",
            self.host_name, self.device_id, API_VERSION
        )
    }

    pub fn events_topic(&self) -> String {
        format!("devices/{}/messages/events/", self.device_id)
    }

    pub fn cloud_to_device_filter(&self) -> String {
        format!("devices/{}/messages/devicebound/#", self.device_id)
    }

    /// Shared access signature valid until `expiry_unix_s`.
    pub fn sas_token(&self, expiry_unix_s: i64) -> anyhow::Result<String> {
        let resource = url_encode(&format!("{}/devices/{}", self.host_name, self.device_id));
        let key = STANDARD
            .decode(&self.shared_access_key)
            .context("SharedAccessKey is not valid base64")?;

        let mut mac =
            HmacSha256::new_from_slice(&key).map_err(|_| anyhow!("SharedAccessKey is unusable"))?;
        mac.update(format!("{}\n{}", resource, expiry_unix_s).as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!(
            "SharedAccessSignature sr={}&sig={}&se={}",
            resource,
            url_encode(&signature),
            expiry_unix_s
        ))
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TelemetryReading {
    #[serde(rename = "Temperature")]
    pub temperature: String,
}

impl TelemetryReading {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A cloud-to-device message as delivered on the devicebound topic.
#[derive(Clone, Debug, PartialEq)]
pub struct CloudMessage {
    pub body: String,
    pub properties: BTreeMap<String, String>,
}

impl CloudMessage {
    /// The property bag is the URL-encoded query after `devicebound/`.
    pub fn from_delivery(topic: &str, payload: &[u8]) -> Self {
        let bag = topic
            .split_once("/messages/devicebound/")
            .map(|(_, rest)| rest)
            .unwrap_or_default();

        let properties = bag
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (url_decode(k), url_decode(v)),
                None => (url_decode(pair), String::new()),
            })
            .collect();

        Self {
            body: String::from_utf8_lossy(payload).into_owned(),
            properties,
        }
    }
}

/// What an MQTT event pump reports back to the session that spawned it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubEvent {
    Connected,
    Disconnected,
    Published(u32),
    Error(String),
}

/// A [`HubEvent`] stamped with the session whose pump produced it.
///
/// A dropped session's pump can still deliver an event it read just before
/// the client went away, so waiters must check the stamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEvent {
    pub session: u32,
    pub event: HubEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Awaited {
    Done,
    Pending,
    Failed(PublishError),
}

impl SessionEvent {
    /// How a waiter in session `current` should treat this event.
    pub fn judge(&self, current: u32, wanted: impl Fn(&HubEvent) -> bool) -> Awaited {
        if self.session != current {
            return Awaited::Pending;
        }
        match &self.event {
            event if wanted(event) => Awaited::Done,
            HubEvent::Disconnected => {
                Awaited::Failed(PublishError::Connectivity("hub closed the connection".into()))
            }
            HubEvent::Error(e) => Awaited::Failed(PublishError::Connectivity(e.clone())),
            _ => Awaited::Pending,
        }
    }
}

fn url_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}
