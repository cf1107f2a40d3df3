use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_SHEET: &str = "II.EE_COORDENADAS";

/// Which clock sunrise/sunset are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SunClock {
    /// Local clock of the machine running the tool.
    #[default]
    System,
    /// UTC offset reported by the provider for the queried location.
    Location,
}

/// Weather provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// Never committed to source; set via `geoclima configure` or the environment.
    pub api_key: Option<String>,
    pub base_url: String,
    pub units: String,
    pub lang: String,
    /// Request timeout; `None` leaves the HTTP client's default in place.
    pub timeout_secs: Option<u64>,
    pub clock: SunClock,
    /// Simultaneous requests during bulk enrichment; 1 means strictly sequential.
    pub concurrency: usize,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
            lang: "es".to_string(),
            timeout_secs: None,
            clock: SunClock::default(),
            concurrency: 1,
        }
    }
}

/// Where the school list lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub workbook: Option<PathBuf>,
    pub sheet: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            workbook: None,
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
/// lang = "es"
///
/// [data]
/// workbook = "MONITOREO DE II.EE PRIORIZADAS.xlsx"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherSettings,
    pub data: DataSettings,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "geoclima", "geoclima")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Blank keys count as unset.
    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.weather.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.weather.api_key.as_deref()
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `geoclima configure` or set OPENWEATHER_API_KEY."
            )
        })
    }

    pub fn require_workbook(&self) -> Result<&Path> {
        self.data.workbook.as_deref().ok_or_else(|| {
            anyhow!(
                "No workbook configured.\n\
                 Hint: run `geoclima configure` or pass --workbook <PATH>."
            )
        })
    }
}
