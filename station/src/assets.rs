//! Background and icon bitmaps baked into the firmware image.

use anyhow::{anyhow, ensure};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use tinybmp::Bmp;

use crate::icons::{ICON_MAP, IconIndex};

static BACKGROUND_BMP: &[u8] = include_bytes!("../assets/background.bmp");
static ICONS_LARGE_BMP: &[u8] = include_bytes!("../assets/icons_70px.bmp");

pub const PANEL_SIZE: Size = Size::new(200, 200);
pub const LARGE_TILE: Size = Size::new(70, 70);

/// Ink on the panel; `Off` is bare paper.
pub const INK: BinaryColor = BinaryColor::On;

// Bitmaps decode light pixels as `On`, so their dark pixels are the ink.
fn is_ink(color: BinaryColor) -> bool {
    color == BinaryColor::Off
}

pub struct Assets {
    background: Bmp<'static, BinaryColor>,
    icons_large: Bmp<'static, BinaryColor>,
}

impl Assets {
    pub fn load() -> anyhow::Result<Self> {
        let background = Bmp::from_slice(BACKGROUND_BMP)
            .map_err(|e| anyhow!("Background bitmap is unreadable: {:?}", e))?;
        let icons_large = Bmp::from_slice(ICONS_LARGE_BMP)
            .map_err(|e| anyhow!("Icon sheet is unreadable: {:?}", e))?;

        ensure!(
            background.size() == PANEL_SIZE,
            "Background is {:?}, panel is {:?}",
            background.size(),
            PANEL_SIZE
        );
        ensure!(
            icons_large.size() == Size::new(LARGE_TILE.width * ICON_MAP.len() as u32, LARGE_TILE.height),
            "Icon sheet is {:?}, expected {} tiles of {:?}",
            icons_large.size(),
            ICON_MAP.len(),
            LARGE_TILE
        );

        Ok(Self {
            background,
            icons_large,
        })
    }

    pub fn draw_background<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.draw_iter(
            self.background
                .pixels()
                .filter(|Pixel(_, color)| is_ink(*color))
                .map(|Pixel(point, _)| Pixel(point, INK)),
        )
    }

    /// Draws the sheet tile at `index` with its top-left corner at `origin`.
    pub fn draw_icon<D>(&self, index: IconIndex, origin: Point, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let tile = tile_area(index);
        target.draw_iter(
            self.icons_large
                .pixels()
                .filter(|Pixel(point, color)| tile.contains(*point) && is_ink(*color))
                .map(|Pixel(point, _)| Pixel(point - tile.top_left + origin, INK)),
        )
    }
}

fn tile_area(index: IconIndex) -> Rectangle {
    Rectangle::new(
        Point::new((index.get() as u32 * LARGE_TILE.width) as i32, 0),
        LARGE_TILE,
    )
}
