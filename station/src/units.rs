use std::fmt;
use std::str::FromStr;

const MPH_PER_MS: f64 = 2.23694;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug)]
pub struct UnknownUnitSystem(String);

impl fmt::Display for UnknownUnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit system {:?}, expected metric or imperial", self.0)
    }
}

impl std::error::Error for UnknownUnitSystem {}

impl FromStr for UnitSystem {
    type Err = UnknownUnitSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(UnknownUnitSystem(other.to_string())),
        }
    }
}

/// Celsius in, three-wide rounded label out. The provider already reports
/// Celsius, so metric mode passes the value through unchanged.
pub fn temperature_text(celsius: f64, units: UnitSystem) -> String {
    match units {
        UnitSystem::Metric => format!("{:3.0}C", celsius),
        UnitSystem::Imperial => format!("{:3.0}F", 32.0 + 1.8 * celsius),
    }
}

pub fn wind_text(speed: f64, units: UnitSystem) -> String {
    match units {
        UnitSystem::Metric => format!("{:3.0}m/s", speed),
        UnitSystem::Imperial => format!("{:3.0}mph", MPH_PER_MS * speed),
    }
}

/// Fraction in `0..=1` to a whole percentage.
pub fn humidity_text(fraction: f64) -> String {
    let percent = (fraction * 100.0).round().clamp(0.0, 100.0) as u8;
    format!("{:3}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_temperature_is_unconverted() {
        assert_eq!(temperature_text(21.2, UnitSystem::Metric), " 21C");
        assert_eq!(temperature_text(-3.4, UnitSystem::Metric), " -3C");
        assert_eq!(temperature_text(104.0, UnitSystem::Metric), "104C");
    }

    #[test]
    fn imperial_temperature_from_celsius() {
        assert_eq!(temperature_text(0.0, UnitSystem::Imperial), " 32F");
        assert_eq!(temperature_text(20.0, UnitSystem::Imperial), " 68F");
        assert_eq!(temperature_text(-40.0, UnitSystem::Imperial), "-40F");
    }

    #[test]
    fn wind_in_both_systems() {
        assert_eq!(wind_text(10.0, UnitSystem::Metric), " 10m/s");
        assert_eq!(wind_text(10.0, UnitSystem::Imperial), " 22mph");
        assert_eq!(wind_text(3.2, UnitSystem::Metric), "  3m/s");
    }

    #[test]
    fn humidity_rounds_to_whole_percent() {
        assert_eq!(humidity_text(0.42), " 42%");
        assert_eq!(humidity_text(0.29), " 29%");
        assert_eq!(humidity_text(1.0), "100%");
        assert_eq!(humidity_text(0.0), "  0%");
    }

    #[test]
    fn unit_system_from_config_string() {
        assert_eq!("metric".parse::<UnitSystem>().unwrap(), UnitSystem::Metric);
        assert_eq!(" IMPERIAL ".parse::<UnitSystem>().unwrap(), UnitSystem::Imperial);
        assert!("kelvin".parse::<UnitSystem>().is_err());
    }
}
