use crate::config::EPD_SPI_BAUDRATE;
use anyhow::{Context, Result, anyhow, bail};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::DrawTargetExt;
use epd_waveshare::epd1in54_v2::{Display1in54, Epd1in54};
use epd_waveshare::prelude::{DisplayRotation, WaveshareDisplay};
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::spi::config::Config as SpiConfig;
use esp_idf_svc::hal::spi::{SpiAnyPins, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::hal::units::Hertz;
use log::info;
use station::assets::Assets;
use station::cycle::Panel;
use station::widgets::WidgetGroup;

type EpdSpi = SpiDeviceDriver<'static, SpiDriver<'static>>;
type EpdDriver = Epd1in54<
    EpdSpi,
    PinDriver<'static, AnyInputPin, Input>,
    PinDriver<'static, AnyOutputPin, Output>,
    PinDriver<'static, AnyOutputPin, Output>,
    Ets,
>;

pub(crate) struct DisplayPins {
    pub(crate) sclk: AnyOutputPin,
    pub(crate) sdo: AnyOutputPin,
    pub(crate) cs: AnyOutputPin,
    pub(crate) dc: AnyOutputPin,
    pub(crate) rst: AnyOutputPin,
    pub(crate) busy: AnyInputPin,
}

/// SSD1681 1.54" 200x200 panel with the station's bitmaps.
pub(crate) struct EpdPanel {
    spi: EpdSpi,
    epd: EpdDriver,
    frame: Display1in54,
    assets: Assets,
    refreshed: bool,
}

impl EpdPanel {
    pub(crate) fn new(
        spi: impl Peripheral<P = impl SpiAnyPins> + 'static,
        pins: DisplayPins,
    ) -> Result<Self> {
        let mut spi = SpiDeviceDriver::new_single(
            spi,
            pins.sclk,
            pins.sdo,
            Option::<AnyIOPin>::None,
            Some(pins.cs),
            &SpiDriverConfig::new(),
            &SpiConfig::new().baudrate(Hertz(EPD_SPI_BAUDRATE)),
        )
        .context("Failed to initialize EPD SPI")?;

        let epd = Epd1in54::new(
            &mut spi,
            PinDriver::input(pins.busy)?,
            PinDriver::output(pins.dc)?,
            PinDriver::output(pins.rst)?,
            &mut Ets,
            None,
        )
        .map_err(|e| anyhow!("EPD init failed: {:?}", e))?;

        let mut frame = Display1in54::default();
        frame.set_rotation(DisplayRotation::Rotate90);

        let assets = Assets::load()?;
        info!("🖼️ E-paper panel initialized");

        Ok(Self {
            spi,
            epd,
            frame,
            assets,
            refreshed: false,
        })
    }
}

impl Panel for EpdPanel {
    fn refresh(&mut self, widgets: &WidgetGroup) -> Result<()> {
        if self.refreshed {
            bail!("Panel was already refreshed this wake");
        }

        widgets
            .draw(&self.assets, &mut self.frame.color_converted::<BinaryColor>())
            .map_err(|e| anyhow!("Drawing the frame failed: {:?}", e))?;

        self.epd
            .update_and_display_frame(&mut self.spi, self.frame.buffer(), &mut Ets)
            .map_err(|e| anyhow!("EPD refresh failed: {:?}", e))?;
        self.refreshed = true;

        self.epd
            .sleep(&mut self.spi, &mut Ets)
            .map_err(|e| anyhow!("EPD sleep failed: {:?}", e))?;

        Ok(())
    }
}
