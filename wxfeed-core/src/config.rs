use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_SERVER: &str = "http://api.openweathermap.org";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Unit system requested from the server and applied by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units=` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "m" | "metric" => Ok(Units::Metric),
            "i" | "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow!(
                "Unknown unit system '{value}'. Supported values: metric (M), imperial (I)."
            )),
        }
    }
}

/// Station configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// city = "Melksham"
/// country = "UK"
/// units = "metric"
/// language = "en"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheme and host of the weather service.
    pub server: String,
    pub api_key: String,
    pub city: String,
    pub country: String,
    pub units: Units,
    pub language: String,
    /// Enforced by the transport; the pipeline itself never times out.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            api_key: String::new(),
            city: String::new(),
            country: String::new(),
            units: Units::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
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

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxfeed", "wxfeed")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check that a refresh can be attempted with this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "No API key configured.\n\
                 Hint: run `wxfeed configure` and enter your API key."
            ));
        }
        if self.city.trim().is_empty() {
            return Err(anyhow!(
                "No location configured.\n\
                 Hint: run `wxfeed configure` and enter a city and country."
            ));
        }
        Url::parse(&self.server)
            .with_context(|| format!("Invalid server URL '{}'", self.server))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        Config {
            api_key: "KEY".into(),
            city: "Melksham".into(),
            country: "UK".into(),
            ..Config::default()
        }
    }

    #[test]
    fn units_parse_short_and_long_forms() {
        assert_eq!(Units::try_from("M").unwrap(), Units::Metric);
        assert_eq!(Units::try_from("imperial").unwrap(), Units::Imperial);
        assert_eq!(Units::try_from("I").unwrap(), Units::Imperial);
        for units in Units::all() {
            assert_eq!(Units::try_from(units.as_query()).unwrap(), *units);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = Units::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn validate_errors_when_api_key_missing() {
        let cfg = Config { api_key: String::new(), ..configured() };
        let err = cfg.validate().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `wxfeed configure`"));
    }

    #[test]
    fn validate_errors_when_city_missing() {
        let cfg = Config { city: "  ".into(), ..configured() };
        assert!(cfg.validate().unwrap_err().to_string().contains("No location configured"));
    }

    #[test]
    fn validate_rejects_bad_server() {
        let cfg = Config { server: "not a url".into(), ..configured() };
        assert!(cfg.validate().unwrap_err().to_string().contains("Invalid server URL"));
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config { units: Units::Imperial, language: "de".into(), ..configured() };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"K\"\ncity = \"Bath\"\nunits = \"imperial\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.units, Units::Imperial);
        assert_eq!(cfg.server, DEFAULT_SERVER);
        assert_eq!(cfg.language, DEFAULT_LANGUAGE);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
