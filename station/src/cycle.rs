//! One wake cycle, from forecast fetch to telemetry beat.

use anyhow::Context;
use log::{debug, info};

use crate::config::Settings;
use crate::documents::{ForecastDocument, RealtimeDocument};
use crate::fields::{FieldUpdates, local_offset, map_fields};
use crate::hub::TelemetryReading;
use crate::publish::{HubLink, NetworkLink, PublishOutcome, publish_with_recovery};
use crate::session::{SessionSlot, Transport};
use crate::widgets::WidgetGroup;

/// Where the two weather documents come from.
#[allow(async_fn_in_trait)]
pub trait ForecastSource {
    async fn fetch(&mut self, settings: &Settings) -> anyhow::Result<(ForecastDocument, RealtimeDocument)>;
}

/// The physical panel. `refresh` is slow and rate limited by the hardware,
/// so a cycle calls it at most once.
pub trait Panel {
    fn refresh(&mut self, widgets: &WidgetGroup) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub fields: FieldUpdates,
    pub telemetry: TelemetryReading,
    pub publish: PublishOutcome,
}

/// Everything a wake cycle drives. Borrowed for the duration of one cycle.
pub struct WakeCycle<'a, S, P, N, H> {
    pub settings: &'a Settings,
    pub slot: &'a SessionSlot,
    pub source: &'a mut S,
    pub panel: &'a mut P,
    pub network: &'a mut N,
    pub hub: &'a mut H,
}

impl<S, P, N, H> WakeCycle<'_, S, P, N, H>
where
    S: ForecastSource,
    P: Panel,
    N: NetworkLink,
    H: HubLink,
{
    pub async fn run(self, widgets: &mut WidgetGroup) -> anyhow::Result<CycleReport> {
        info!("Getting online weather data...");
        let (forecast, realtime) = {
            let _claim = self.slot.claim("forecast", Transport::Plain)?;
            self.source.fetch(self.settings).await?
        };

        let tz_offset_seconds = local_offset(self.settings.tz_offset_seconds, &forecast)?;
        let fields = map_fields(&forecast, &realtime, tz_offset_seconds, self.settings.units)
            .context("Could not map weather data to display fields")?;
        debug!("Field updates: {:?}", fields);

        widgets.apply(&fields);
        self.panel
            .refresh(widgets)
            .context("Display refresh failed")?;
        info!("Display refreshed");

        let telemetry = TelemetryReading {
            temperature: widgets.day_temp.text.clone(),
        };
        let payload = telemetry.to_json().context("Telemetry serialization")?;

        let publish = {
            let _claim = self.slot.claim("telemetry", Transport::Tls)?;
            publish_with_recovery(self.network, self.hub, &payload).await?
        };

        Ok(CycleReport {
            fields,
            telemetry,
            publish,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawSettings;
    use crate::documents::fixtures::{DAILY, REALTIME};
    use crate::publish::PublishError;
    use crate::publish::fakes::{FakeHub, FakeNetwork};
    use embassy_futures::block_on;

    struct FixtureSource {
        daily: String,
        fetches: usize,
    }

    impl FixtureSource {
        fn new(daily: &str) -> Self {
            Self {
                daily: daily.to_string(),
                fetches: 0,
            }
        }
    }

    impl ForecastSource for FixtureSource {
        async fn fetch(
            &mut self,
            _settings: &Settings,
        ) -> anyhow::Result<(ForecastDocument, RealtimeDocument)> {
            self.fetches += 1;
            Ok((
                ForecastDocument::parse(&self.daily)?,
                RealtimeDocument::parse(REALTIME)?,
            ))
        }
    }

    #[derive(Default)]
    struct RecordingPanel {
        frames: Vec<WidgetGroup>,
    }

    impl Panel for RecordingPanel {
        fn refresh(&mut self, widgets: &WidgetGroup) -> anyhow::Result<()> {
            self.frames.push(widgets.clone());
            Ok(())
        }
    }

    fn settings() -> Settings {
        Settings::parse(&RawSettings {
            caiyun_token: "token",
            latitude: "31.23",
            longitude: "121.47",
            display_location: "Shanghai",
            hub_connection_string: "HostName=h;DeviceId=d;SharedAccessKey=aGVsbG8=",
            sleep_seconds: "1800",
            tz_offset_seconds: "28800",
            units: "metric",
        })
        .unwrap()
    }

    struct Rig {
        settings: Settings,
        slot: SessionSlot,
        source: FixtureSource,
        panel: RecordingPanel,
        network: FakeNetwork,
        hub: FakeHub,
        widgets: WidgetGroup,
    }

    impl Rig {
        fn new(daily: &str, hub: FakeHub) -> Self {
            let settings = settings();
            let widgets = WidgetGroup::new(&settings.display_location);
            Self {
                settings,
                slot: SessionSlot::new(),
                source: FixtureSource::new(daily),
                panel: RecordingPanel::default(),
                network: FakeNetwork::default(),
                hub,
                widgets,
            }
        }

        fn run(&mut self) -> anyhow::Result<CycleReport> {
            let cycle = WakeCycle {
                settings: &self.settings,
                slot: &self.slot,
                source: &mut self.source,
                panel: &mut self.panel,
                network: &mut self.network,
                hub: &mut self.hub,
            };
            block_on(cycle.run(&mut self.widgets))
        }
    }

    #[test]
    fn full_cycle_renders_once_and_sends_current_temperature() {
        let mut rig = Rig::new(DAILY, FakeHub::default());
        let report = rig.run().unwrap();

        assert_eq!(rig.source.fetches, 1);
        assert_eq!(rig.panel.frames.len(), 1);
        assert_eq!(rig.panel.frames[0].humidity.text, " 42%");
        assert_eq!(rig.panel.frames[0].city.text, "Shanghai");
        assert_eq!(report.fields.icon.code(), "01");
        assert_eq!(report.telemetry.temperature, " 21C");
        assert_eq!(rig.hub.connects, 1);
        assert_eq!(rig.hub.sent, vec![r#"{"Temperature":" 21C"}"#]);
        assert_eq!(report.publish, PublishOutcome::Sent);
        assert!(rig.slot.is_free());
    }

    #[test]
    fn unknown_skycon_stops_before_render_and_publish() {
        let daily = DAILY.replace("\"CLEAR_DAY\"", "\"METEOR_SHOWER\"");
        let mut rig = Rig::new(&daily, FakeHub::default());
        let err = rig.run().unwrap_err();

        assert!(format!("{err:#}").contains("METEOR_SHOWER"));
        assert!(rig.panel.frames.is_empty());
        assert_eq!(rig.hub.attempts, 0);
        assert!(rig.widgets.icon.index.is_none());
        assert!(rig.widgets.date.text.starts_with("****"));
        assert!(rig.slot.is_free());
    }

    #[test]
    fn repeated_hub_fault_aborts_after_rendering() {
        let lost = || PublishError::Connectivity("tls handshake".into());
        let mut rig = Rig::new(DAILY, FakeHub::scripted([Err(lost()), Err(lost())]));
        let err = rig.run().unwrap_err();

        assert!(format!("{err:#}").contains("tls handshake"));
        assert_eq!(rig.panel.frames.len(), 1);
        assert_eq!(rig.network.resets, 1);
        assert_eq!(rig.hub.reconnects, 1);
        assert!(rig.slot.is_free());
    }

    #[test]
    fn busy_slot_blocks_the_fetch() {
        let mut rig = Rig::new(DAILY, FakeHub::default());
        let slot = SessionSlot::new();
        let _held = slot.claim("someone else", Transport::Tls).unwrap();
        let cycle = WakeCycle {
            settings: &rig.settings,
            slot: &slot,
            source: &mut rig.source,
            panel: &mut rig.panel,
            network: &mut rig.network,
            hub: &mut rig.hub,
        };
        let err = block_on(cycle.run(&mut rig.widgets)).unwrap_err();

        assert!(err.downcast_ref::<crate::session::SlotBusy>().is_some());
        assert_eq!(rig.source.fetches, 0);
    }
}
