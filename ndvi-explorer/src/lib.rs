//! # ndvi-explorer
//!
//! Exploration NDVI d'une région dessinée : analyse par le backend Earth
//! Engine, lecture de la série temporelle et assistant conversationnel.
//!
//! ## Features
//!
//! - Client HTTP du backend (`/ndvi-tiles/`, `/auth-status/`)
//! - Session d'analyse : le dernier polygone confirmé gagne, lecture
//!   automatique, notifications `watch`
//! - Relais de chat avec contexte de la frame courante
//! - Rapport JSON et CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Analyse d'un polygone GeoJSON, puis lecture de la timeline
//! ndvi-explorer analyze --polygon ./field.geojson --play
//!
//! # Polygone en ligne, Landsat 9, rapport JSON
//! ndvi-explorer analyze --coords "48.85,2.35;48.86,2.36;48.87,2.34" \
//!     --satellite landsat-9 --report ./report.json
//!
//! # Vérifier l'authentification Earth Engine du backend
//! ndvi-explorer auth-status
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod dates;
pub mod fingerprint;
pub mod report;
pub mod session;

pub use api::{AnalysisBackend, AnalysisClient, ApiError};
pub use config::ExplorerConfig;
pub use report::{AnalysisReport, AnalysisStatus};
pub use session::{AnalysisSession, FetchStatus};
