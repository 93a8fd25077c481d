use std::fmt;

/// Sprite sheet tile order; a tile's index is its position here.
pub const ICON_MAP: [&str; 9] = ["01", "02", "03", "04", "09", "10", "11", "13", "50"];

/// Every skycon the Caiyun API documents, with the sheet code it is drawn as.
const SKYCON_TABLE: [(&str, &str); 20] = [
    ("CLEAR_DAY", "01"),
    ("CLEAR_NIGHT", "01"),
    ("PARTLY_CLOUDY_DAY", "02"),
    ("PARTLY_CLOUDY_NIGHT", "02"),
    ("CLOUDY", "03"),
    ("WIND", "04"),
    ("LIGHT_RAIN", "10"),
    ("MODERATE_RAIN", "10"),
    ("HEAVY_RAIN", "10"),
    ("STORM_RAIN", "11"),
    ("LIGHT_SNOW", "13"),
    ("MODERATE_SNOW", "13"),
    ("HEAVY_SNOW", "13"),
    ("STORM_SNOW", "13"),
    ("LIGHT_HAZE", "50"),
    ("MODERATE_HAZE", "50"),
    ("HEAVY_HAZE", "50"),
    ("FOG", "50"),
    ("DUST", "50"),
    ("SAND", "50"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconIndex(u8);

impl IconIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }

    pub fn code(self) -> &'static str {
        ICON_MAP[self.get()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSkycon(pub String);

impl fmt::Display for UnknownSkycon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no icon for sky condition {:?}", self.0)
    }
}

impl std::error::Error for UnknownSkycon {}

pub fn icon_code(skycon: &str) -> Result<&'static str, UnknownSkycon> {
    SKYCON_TABLE
        .iter()
        .find(|(name, _)| *name == skycon)
        .map(|(_, code)| *code)
        .ok_or_else(|| UnknownSkycon(skycon.to_string()))
}

pub fn icon_index(skycon: &str) -> Result<IconIndex, UnknownSkycon> {
    let code = icon_code(skycon)?;
    ICON_MAP
        .iter()
        .position(|c| *c == code)
        .map(|i| IconIndex(i as u8))
        .ok_or_else(|| UnknownSkycon(skycon.to_string()))
}
