use serde::{Deserialize, Serialize};

use crate::normalize::CoordinateError;

/// Base URL for provider condition icons.
pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Token shown in place of a reading the provider did not report.
pub const UNAVAILABLE: &str = "unavailable";

/// Populated-center code used when the source cell is blank.
pub const DEFAULT_POPULATED_CENTER_CODE: &str = "1";

/// A validated WGS84 position. Deserialization goes through `Coordinates::new`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    /// Latitude must lie in [-90, 90], longitude in [-180, 180], both finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One educational institution from the source workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub modular_code: String,
    pub level: String,
    pub address: String,
    pub department: String,
    pub province: String,
    pub district: String,
    pub populated_center_code: String,
    pub populated_center: Option<String>,
    pub coordinates: Coordinates,
}

impl LocationRecord {
    pub fn level_category(&self) -> LevelCategory {
        LevelCategory::classify(&self.level)
    }
}

/// Broad education level, used to style map markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelCategory {
    Initial,
    Primary,
    Secondary,
    Other,
}

impl LevelCategory {
    /// Classify a free-text level/modality such as "Inicial - Jardín".
    pub fn classify(level: &str) -> Self {
        if level.contains("Inicial") {
            LevelCategory::Initial
        } else if level.contains("Primaria") {
            LevelCategory::Primary
        } else if level.contains("Secundaria") {
            LevelCategory::Secondary
        } else {
            LevelCategory::Other
        }
    }

    pub fn marker_color(&self) -> &'static str {
        match self {
            LevelCategory::Initial => "blue",
            LevelCategory::Primary => "green",
            LevelCategory::Secondary => "orange",
            LevelCategory::Other => "red",
        }
    }

    /// Font Awesome glyph name for the marker.
    pub fn marker_icon(&self) -> &'static str {
        match self {
            LevelCategory::Initial => "child",
            LevelCategory::Primary => "pencil",
            LevelCategory::Secondary => "graduation-cap",
            LevelCategory::Other => "info-circle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    Small,
    Large,
}

/// Current conditions at one coordinate pair. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub pressure_hpa: u32,
    pub cloudiness_pct: Option<u8>,
    pub visibility_m: Option<u32>,
    pub description: String,
    pub icon: String,
    /// Local clock time, `HH:MM`.
    pub sunrise: String,
    /// Local clock time, `HH:MM`.
    pub sunset: String,
}

impl WeatherSnapshot {
    pub fn icon_url(&self, size: IconSize) -> String {
        match size {
            IconSize::Small => format!("{ICON_BASE_URL}/{}.png", self.icon),
            IconSize::Large => format!("{ICON_BASE_URL}/{}@4x.png", self.icon),
        }
    }

    pub fn cloudiness_display(&self) -> String {
        self.cloudiness_pct
            .map(|v| format!("{v}%"))
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }

    pub fn visibility_display(&self) -> String {
        self.visibility_m
            .map(|v| format!("{v} m"))
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }
}

/// Why a weather lookup produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unavailable {
    /// HTTP status when the provider answered with an error.
    pub status: Option<u16>,
    pub message: String,
}

/// Result of one weather lookup as seen by callers: a snapshot or an explicit miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WeatherOutcome {
    Available(WeatherSnapshot),
    Unavailable(Unavailable),
}

impl WeatherOutcome {
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            WeatherOutcome::Available(snapshot) => Some(snapshot),
            WeatherOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, WeatherOutcome::Available(_))
    }
}
