use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    gateway::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT},
    location::DEFAULT_RESOLVER_URL,
    units::UnitSystem,
};

/// Weather service endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_url")]
    pub base_url: String,

    /// api.weather.gov rejects requests without a User-Agent; the
    /// operators ask for contact details in it.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_service_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Postal code lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_resolver_url")]
    pub base_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: default_resolver_url(),
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_resolver_url() -> String {
    DEFAULT_RESOLVER_URL.to_string()
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_postal_code = "95134"
/// units = "us"
///
/// [service]
/// user_agent = "wxsnap (me@example.com)"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub default_postal_code: Option<String>,

    /// Unit selector, e.g. "us", "f" or "si".
    pub units: Option<String>,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Configured postal code, or a hint on how to set one.
    pub fn default_postal_code(&self) -> Result<&str> {
        self.default_postal_code.as_deref().ok_or_else(|| {
            anyhow!(
                "No postal code given and no default configured.\n\
                 Hint: pass one to `wxsnap show <postal-code>` or run `wxsnap configure`."
            )
        })
    }

    /// Unit system from the configured selector. Imperial when unset.
    pub fn unit_system(&self) -> UnitSystem {
        UnitSystem::from_selector(self.units.as_deref().unwrap_or("us"))
    }

    pub fn set_default_postal_code(&mut self, postal_code: impl Into<String>) {
        self.default_postal_code = Some(postal_code.into());
    }

    pub fn set_units(&mut self, selector: impl Into<String>) {
        self.units = Some(selector.into());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxsnap", "wxsnap")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_postal_code_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_postal_code().unwrap_err();

        assert!(err.to_string().contains("no default configured"));
        assert!(err.to_string().contains("Hint: pass one"));
    }

    #[test]
    fn unit_system_defaults_to_imperial() {
        let mut cfg = Config::default();
        assert_eq!(cfg.unit_system(), UnitSystem::Imperial);

        cfg.set_units("si");
        assert_eq!(cfg.unit_system(), UnitSystem::Metric);

        cfg.set_units("F");
        assert_eq!(cfg.unit_system(), UnitSystem::Imperial);
    }

    #[test]
    fn partial_toml_fills_endpoint_defaults() {
        let cfg = Config::from_toml(
            r#"
            default_postal_code = "95134"

            [service]
            user_agent = "wxsnap-test (ops@example.com)"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.default_postal_code().unwrap(), "95134");
        assert_eq!(cfg.service.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.service.user_agent, "wxsnap-test (ops@example.com)");
        assert_eq!(cfg.resolver.base_url, DEFAULT_RESOLVER_URL);
        assert_eq!(cfg.units, None);
    }

    #[test]
    fn toml_round_trip_preserves_settings() {
        let mut cfg = Config::default();
        cfg.set_default_postal_code("10001");
        cfg.set_units("si");

        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }
}
