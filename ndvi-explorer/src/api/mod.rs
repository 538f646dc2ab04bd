//! Accès au backend d'analyse NDVI
//!
//! - `types` : corps de requête et réponses (serde)
//! - `client` : client HTTP `reqwest`
//! - `frames` : assemblage des frames de la timeline depuis une réponse

pub mod client;
pub mod frames;
pub mod types;

use futures::future::BoxFuture;
use thiserror::Error;

pub use client::AnalysisClient;
pub use frames::{build_frames, summarize};
pub use types::{AnalysisOptions, AuthStatus, NdviRequest, NdviResponse, SatelliteSource};

/// Erreurs d'appel au backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse non-2xx ; `detail` est le message du backend tel quel
    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(status: u16, detail: impl Into<String>) -> Self {
        Self::Status {
            status,
            detail: detail.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Message affiché à l'utilisateur
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Backend d'analyse
///
/// Les méthodes retournent des futures boxées pour rester utilisables en
/// `dyn AnalysisBackend` depuis les tâches de la session.
pub trait AnalysisBackend: Send + Sync {
    /// `POST /ndvi-tiles/`
    fn fetch_ndvi(&self, request: NdviRequest) -> BoxFuture<'_, Result<NdviResponse, ApiError>>;

    /// `GET /auth-status/` ; ne renvoie jamais d'erreur, un serveur
    /// injoignable donne [`AuthStatus::unreachable`]
    fn auth_status(&self) -> BoxFuture<'_, AuthStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_is_verbatim() {
        let err = ApiError::status(400, "Polygon too large for analysis");
        assert_eq!(err.to_string(), "Polygon too large for analysis");
        assert_eq!(err.user_message(), "Polygon too large for analysis");
    }

    #[test]
    fn test_decode_message() {
        let err = ApiError::decode("missing field `ndvi_tiles`");
        assert_eq!(err.user_message(), "Invalid response: missing field `ndvi_tiles`");
    }
}
