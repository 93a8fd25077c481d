//! Fixed screen layout of the 200x200 panel.
//!
//! The layout is built once per wake; [`WidgetGroup::apply`] only swaps the
//! contents of its slots.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use crate::assets::{Assets, INK, LARGE_TILE};
use crate::fields::FieldUpdates;
use crate::icons::IconIndex;

const FONT: &MonoFont<'static> = &FONT_6X10;

/// Which point of a label sits on its anchored position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    MiddleLeft,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextField {
    pub text: String,
    anchor: Anchor,
    position: Point,
}

impl TextField {
    fn new(text: impl Into<String>, anchor: Anchor, x: i32, y: i32) -> Self {
        Self {
            text: text.into(),
            anchor,
            position: Point::new(x, y),
        }
    }

    pub fn bounding_box(&self) -> Rectangle {
        let glyph = FONT.character_size;
        let size = Size::new(
            glyph.width * self.text.chars().count() as u32,
            glyph.height,
        );
        let offset = match self.anchor {
            Anchor::TopLeft => Point::zero(),
            Anchor::TopCenter => Point::new(size.width as i32 / 2, 0),
            Anchor::MiddleLeft => Point::new(0, size.height as i32 / 2),
        };
        Rectangle::new(self.position - offset, size)
    }

    fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let style = MonoTextStyle::new(FONT, INK);
        Text::with_baseline(&self.text, self.bounding_box().top_left, style, Baseline::Top)
            .draw(target)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IconField {
    pub index: Option<IconIndex>,
    origin: Point,
}

impl IconField {
    pub fn bounding_box(&self) -> Rectangle {
        Rectangle::new(self.origin, LARGE_TILE)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WidgetGroup {
    pub date: TextField,
    pub city: TextField,
    pub icon: IconField,
    pub morning_temp: TextField,
    pub day_temp: TextField,
    pub night_temp: TextField,
    pub humidity: TextField,
    pub wind: TextField,
    pub sunrise: TextField,
    pub sunset: TextField,
    pub air_quality: TextField,
}

impl WidgetGroup {
    pub fn new(location: &str) -> Self {
        Self {
            date: TextField::new("*".repeat(30), Anchor::TopLeft, 15, 13),
            city: TextField::new(location, Anchor::TopLeft, 15, 24),
            icon: IconField {
                index: None,
                origin: Point::new(10, 39),
            },
            morning_temp: TextField::new("+100F", Anchor::TopCenter, 118, 59),
            day_temp: TextField::new("+100F", Anchor::TopCenter, 149, 59),
            night_temp: TextField::new("+100F", Anchor::TopCenter, 180, 59),
            humidity: TextField::new("100%", Anchor::MiddleLeft, 105, 95),
            wind: TextField::new("99m/s", Anchor::MiddleLeft, 155, 95),
            sunrise: TextField::new("6:12 AM", Anchor::MiddleLeft, 45, 117),
            sunset: TextField::new("12:12 PM", Anchor::MiddleLeft, 130, 117),
            air_quality: TextField::new("AQI: 49.5", Anchor::TopCenter, 45, 95),
        }
    }

    pub fn apply(&mut self, updates: &FieldUpdates) {
        self.date.text.clone_from(&updates.date);
        self.icon.index = Some(updates.icon);
        self.morning_temp.text.clone_from(&updates.morning_temp);
        self.day_temp.text.clone_from(&updates.day_temp);
        self.night_temp.text.clone_from(&updates.night_temp);
        self.humidity.text.clone_from(&updates.humidity);
        self.wind.text.clone_from(&updates.wind);
        self.sunrise.text.clone_from(&updates.sunrise);
        self.sunset.text.clone_from(&updates.sunset);
        self.air_quality.text.clone_from(&updates.air_quality);
    }

    fn labels(&self) -> [&TextField; 10] {
        [
            &self.date,
            &self.city,
            &self.morning_temp,
            &self.day_temp,
            &self.night_temp,
            &self.humidity,
            &self.wind,
            &self.sunrise,
            &self.sunset,
            &self.air_quality,
        ]
    }

    /// Paints the whole group onto a cleared target. Nothing reaches the
    /// panel until the caller flushes the frame.
    pub fn draw<D>(&self, assets: &Assets, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        assets.draw_background(target)?;
        if let Some(index) = self.icon.index {
            assets.draw_icon(index, self.icon.origin, target)?;
        }
        for label in self.labels() {
            label.draw(target)?;
        }
        Ok(())
    }
}
