use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, File};
use std::path::Path;
use std::time::Duration;

use crate::host::ticks_to_duration;
use crate::models::TierTagError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub refresh: RefreshSettings,
    pub placeholder: PlaceholderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Placeholder resolved against the score source for each player
    pub score_query: String,
    pub initial_delay_ticks: u64,
    pub period_ticks: u64,
    pub query_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderSettings {
    pub identifier: String,
    pub author: String,
    pub version: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "TierTag".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            score_query: "%hnybpvpelo_elo%".to_string(),
            initial_delay_ticks: 0,
            period_ticks: 20 * 60, // 60 seconds
            query_timeout_ms: 5_000,
        }
    }
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            identifier: "tiertag".to_string(),
            author: "TierTag".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            refresh: RefreshSettings::default(),
            placeholder: PlaceholderSettings::default(),
        }
    }
}

impl RefreshSettings {
    pub fn initial_delay(&self) -> Duration {
        ticks_to_duration(self.initial_delay_ticks)
    }
    
    pub fn period(&self) -> Duration {
        ticks_to_duration(self.period_ticks)
    }
    
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TIER_TAG").separator("__"))
            .build()?;
        
        s.try_deserialize()
    }
    
    /// Layered settings that have also passed validation
    pub fn load() -> crate::models::Result<Self> {
        let settings = Self::new()?;
        settings.validate().map_err(TierTagError::InvalidSettings)?;
        Ok(settings)
    }
    
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;
        
        s.try_deserialize()
    }
    
    pub fn validate(&self) -> Result<(), String> {
        if self.refresh.period_ticks == 0 {
            return Err("Refresh period must be at least one tick".to_string());
        }
        
        if self.refresh.query_timeout_ms == 0 {
            return Err("Score query timeout must be positive".to_string());
        }
        
        if self.refresh.score_query.trim().is_empty() {
            return Err("Score query must not be empty".to_string());
        }
        
        if self.placeholder.identifier.trim().is_empty() {
            return Err("Placeholder identifier must not be empty".to_string());
        }
        
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.refresh.period(), Duration::from_secs(60));
        assert_eq!(settings.refresh.initial_delay(), Duration::ZERO);
        assert_eq!(settings.refresh.query_timeout(), Duration::from_secs(5));
        assert_eq!(settings.placeholder.identifier, "tiertag");
    }
    
    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.refresh.period_ticks = 0;
        assert!(settings.validate().is_err());
        
        let mut settings = Settings::default();
        settings.placeholder.identifier = "  ".to_string();
        assert!(settings.validate().is_err());
        
        let mut settings = Settings::default();
        settings.refresh.query_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }
    
    #[test]
    fn test_from_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("tier-tag-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(&path, "[refresh]\nperiod_ticks = 200\n").unwrap();
        
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.refresh.period_ticks, 200);
        assert_eq!(settings.refresh.score_query, "%hnybpvpelo_elo%");
        
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
