use crate::config::HUB_EVENT_TIMEOUT_SECS;
use crate::logging::{log_cloud_message, log_hub_warning};
use crate::time_utils::timestamp_unix_s;
use anyhow::Result;
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, MqttProtocolVersion,
    QoS,
};
use esp_idf_svc::sys::esp_crt_bundle_attach;
use log::info;
use station::hub::{
    Awaited, CloudMessage, ConnectionString, HubEvent, SessionEvent, TOKEN_LIFETIME_SECONDS,
};
use station::publish::{HubLink, PublishError};

const MQTT_PUMP_STACK_SIZE: usize = 6000;

static HUB_EVENTS: Channel<CriticalSectionRawMutex, SessionEvent, 4> = Channel::new();

/// Azure IoT Hub device session over MQTT/TLS.
pub(crate) struct AzureHub {
    identity: ConnectionString,
    client: Option<EspMqttClient<'static>>,
    /// Bumped on every open so events from earlier pumps can be told apart.
    session: u32,
}

impl AzureHub {
    pub(crate) fn new(connection_string: &str) -> Result<Self> {
        Ok(Self {
            identity: ConnectionString::parse(connection_string)?,
            client: None,
            session: 0,
        })
    }

    fn open(&mut self) -> Result<(), PublishError> {
        let token = self
            .identity
            .sas_token(timestamp_unix_s() + TOKEN_LIFETIME_SECONDS)
            .map_err(|e| PublishError::Credentials(format!("{:#}", e)))?;
        let username = self.identity.username();

        let config = MqttClientConfiguration {
            protocol_version: Some(MqttProtocolVersion::V3_1_1),
            client_id: Some(self.identity.device_id.as_str()),
            username: Some(username.as_str()),
            password: Some(token.as_str()),
            keep_alive_interval: Some(std::time::Duration::from_secs(60)),
            crt_bundle_attach: Some(esp_crt_bundle_attach),
            ..Default::default()
        };

        let (client, connection) = EspMqttClient::new(&self.identity.broker_url(), &config)
            .map_err(|e| PublishError::Connectivity(format!("MQTT client: {:?}", e)))?;

        self.session = self.session.wrapping_add(1);
        let session = self.session;
        std::thread::Builder::new()
            .stack_size(MQTT_PUMP_STACK_SIZE)
            .spawn(move || pump_events(connection, session))
            .map_err(|e| PublishError::Connectivity(format!("MQTT event thread: {}", e)))?;

        self.client = Some(client);
        Ok(())
    }

    fn client(&mut self) -> Result<&mut EspMqttClient<'static>, PublishError> {
        self.client
            .as_mut()
            .ok_or_else(|| PublishError::Protocol("hub session is not open".into()))
    }

    async fn wait_for(&self, wanted: impl Fn(&HubEvent) -> bool) -> Result<(), PublishError> {
        let deadline = Instant::now() + Duration::from_secs(HUB_EVENT_TIMEOUT_SECS);
        loop {
            match select(HUB_EVENTS.receive(), Timer::at(deadline)).await {
                Either::First(stamped) => match stamped.judge(self.session, &wanted) {
                    Awaited::Done => return Ok(()),
                    Awaited::Failed(e) => return Err(e),
                    Awaited::Pending => {}
                },
                Either::Second(()) => {
                    return Err(PublishError::Connectivity(format!(
                        "no answer from hub within {}s",
                        HUB_EVENT_TIMEOUT_SECS
                    )));
                }
            }
        }
    }
}

impl HubLink for AzureHub {
    async fn connect(&mut self) -> Result<(), PublishError> {
        HUB_EVENTS.clear();
        info!("☁️ Connecting to Azure IoT Hub {}...", self.identity.host_name);
        self.open()?;
        self.wait_for(|e| matches!(e, HubEvent::Connected)).await?;

        let filter = self.identity.cloud_to_device_filter();
        self.client()?
            .subscribe(&filter, QoS::AtLeastOnce)
            .map_err(|e| PublishError::Protocol(format!("subscribe {}: {:?}", filter, e)))?;
        info!("☁️ Connected to Azure IoT Hub!");
        Ok(())
    }

    async fn send(&mut self, payload: &str) -> Result<(), PublishError> {
        let topic = self.identity.events_topic();
        let id = self
            .client()?
            .publish(&topic, QoS::AtLeastOnce, false, payload.as_bytes())
            .map_err(|e| PublishError::Connectivity(format!("publish: {:?}", e)))?;
        self.wait_for(|e| matches!(e, HubEvent::Published(acked) if *acked == id))
            .await?;
        info!("☁️ Sent data to IoT Hub: {}", payload);
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<(), PublishError> {
        // Dropping the client ends the old event pump.
        self.client = None;
        self.connect().await
    }
}

fn pump_events(mut connection: EspMqttConnection, session: u32) {
    while let Ok(event) = connection.next() {
        let forwarded = match event.payload() {
            EventPayload::Connected(_) => HubEvent::Connected,
            EventPayload::Disconnected => HubEvent::Disconnected,
            EventPayload::Published(id) => HubEvent::Published(id),
            EventPayload::Error(e) => HubEvent::Error(format!("{:?}", e)),
            EventPayload::Received { topic, data, .. } => {
                log_cloud_message(&CloudMessage::from_delivery(topic.unwrap_or_default(), data));
                continue;
            }
            _ => continue,
        };

        if HUB_EVENTS
            .try_send(SessionEvent {
                session,
                event: forwarded,
            })
            .is_err()
        {
            log_hub_warning("☁️ Hub event queue full, dropping event");
        }
    }
    info!("☁️ MQTT event pump stopped");
}
