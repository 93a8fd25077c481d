use crate::config::{WIFI_MAX_ATTEMPTS, WIFI_PASS, WIFI_SSID};
use anyhow::{Result, anyhow};
use embassy_time::{Duration, Timer};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration as WifiConfig, EspWifi};
use log::{info, warn};
use station::publish::NetworkLink;

pub(crate) struct WifiLink {
    wifi: EspWifi<'static>,
}

impl WifiLink {
    pub(crate) fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self> {
        let mut wifi = EspWifi::new(modem, sys_loop, Some(nvs))?;
        wifi.set_configuration(&WifiConfig::Client(ClientConfiguration {
            ssid: WIFI_SSID
                .try_into()
                .map_err(|_| anyhow!("SSID is too long"))?,
            password: WIFI_PASS
                .try_into()
                .map_err(|_| anyhow!("Password is too long"))?,
            auth_method: if WIFI_PASS.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        }))?;

        Ok(Self { wifi })
    }

    pub(crate) async fn join(&mut self) -> Result<()> {
        if !self.wifi.is_started()? {
            self.wifi.start()?;
            info!("📶 WiFi starting...");
            Timer::after(Duration::from_millis(500)).await;
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            info!("📶 WiFi connecting (attempt {})...", attempts);
            match self.wifi.connect() {
                Ok(_) => {
                    let mut wait_counter = 0;

                    while !self.wifi.is_up()? {
                        Timer::after(Duration::from_millis(250)).await;

                        wait_counter += 1;
                        if wait_counter > 40 {
                            break;
                        }
                    }

                    if self.wifi.is_up()? {
                        break;
                    }
                }
                Err(e) => warn!("📶 Connect call failed: {:?}", e),
            }

            if attempts >= WIFI_MAX_ATTEMPTS {
                anyhow::bail!("📶 Failed to connect after {} attempts", attempts);
            }

            info!("📶 Connection refused or timed out, retrying in 2s...");
            Timer::after(Duration::from_millis(2000)).await;
        }

        let ip_info = self.wifi.sta_netif().get_ip_info()?;
        info!("📶 WiFi Connected! IP: {}", ip_info.ip);

        Ok(())
    }
}

impl NetworkLink for WifiLink {
    async fn reset(&mut self) -> Result<()> {
        info!("📶 Resetting WiFi interface");
        if let Err(e) = self.wifi.disconnect() {
            warn!("📶 Disconnect failed, stopping anyway: {:?}", e);
        }
        self.wifi.stop()?;
        Ok(())
    }

    async fn connect(&mut self) -> Result<()> {
        self.join().await
    }
}
