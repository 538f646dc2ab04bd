//! Configuration de l'explorateur

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::{AnalysisOptions, SatelliteSource};
use crate::dates::validate_date_range;

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// URL du backend d'analyse (sans `/ndvi-tiles/`)
    pub api_url: String,

    /// URL du relais de chat
    pub chat_url: String,

    /// Timeout des requêtes HTTP (secondes)
    pub timeout_secs: u64,

    /// Intervalle de lecture automatique (millisecondes)
    pub playback_ms: u64,

    /// Options par défaut des requêtes d'analyse
    pub analysis: AnalysisOptions,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".into(),
            chat_url: "http://127.0.0.1:3000/api/chat".into(),
            timeout_secs: 30,
            playback_ms: 1000,
            analysis: AnalysisOptions::default(),
        }
    }
}

impl ExplorerConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("NDVI_API_URL").unwrap_or(defaults.api_url),
            chat_url: std::env::var("NDVI_CHAT_URL").unwrap_or(defaults.chat_url),
            timeout_secs: std::env::var("NDVI_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            playback_ms: std::env::var("NDVI_PLAYBACK_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.playback_ms),
            analysis: AnalysisOptions {
                satellite_source: std::env::var("NDVI_SATELLITE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
                start_date: std::env::var("NDVI_START_DATE")
                    .unwrap_or(defaults.analysis.start_date),
                end_date: std::env::var("NDVI_END_DATE").unwrap_or(defaults.analysis.end_date),
                ..defaults.analysis
            },
        }
    }

    /// Charge une configuration depuis un fichier JSON
    ///
    /// Les champs absents prennent leur valeur par défaut.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Vérifie les dates d'analyse
    pub fn validate(&self) -> Result<()> {
        validate_date_range(&self.analysis.start_date, &self.analysis.end_date)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_ms)
    }

    pub fn with_satellite(mut self, satellite: SatelliteSource) -> Self {
        self.analysis.satellite_source = satellite;
        self
    }
}
