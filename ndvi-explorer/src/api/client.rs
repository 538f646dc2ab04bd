//! Client HTTP du backend d'analyse

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{AuthStatus, NdviRequest, NdviResponse};
use super::{AnalysisBackend, ApiError};
use crate::config::ExplorerConfig;

const NDVI_TILES_PATH: &str = "ndvi-tiles/";
const AUTH_STATUS_PATH: &str = "auth-status/";

/// Client `reqwest` vers le backend Earth Engine
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    base_url: String,
    http: Client,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &ExplorerConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_ndvi(&self, request: NdviRequest) -> Result<NdviResponse, ApiError> {
        let url = self.endpoint(NDVI_TILES_PATH);
        info!(
            url = %url,
            satellite = %request.options.satellite_source,
            start = %request.options.start_date,
            end = %request.options.end_date,
            "Requesting NDVI analysis"
        );

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = error_detail(status.as_u16(), &body);
            warn!(status = status.as_u16(), detail = %detail, "NDVI request rejected");
            return Err(ApiError::status(status.as_u16(), detail));
        }

        let parsed: NdviResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::decode(e.to_string()))?;
        debug!(
            frames = parsed.time_series.as_ref().map_or(0, |ts| ts.data.len()),
            "NDVI response decoded"
        );
        Ok(parsed)
    }

    async fn get_auth_status(&self) -> Result<AuthStatus, ApiError> {
        let url = self.endpoint(AUTH_STATUS_PATH);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), error_detail(status.as_u16(), &body)));
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::decode(e.to_string()))
    }
}

impl AnalysisBackend for AnalysisClient {
    fn fetch_ndvi(&self, request: NdviRequest) -> BoxFuture<'_, Result<NdviResponse, ApiError>> {
        Box::pin(self.post_ndvi(request))
    }

    fn auth_status(&self) -> BoxFuture<'_, AuthStatus> {
        Box::pin(async move {
            match self.get_auth_status().await {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "Auth status check failed");
                    AuthStatus::unreachable()
                }
            }
        })
    }
}

/// Message d'erreur d'une réponse non-2xx
///
/// Le champ `detail` du corps JSON s'il existe, sinon `API error: {status}`.
pub fn error_detail(status: u16, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    match detail {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Null) | Some(Value::String(_)) | None => format!("API error: {}", status),
        Some(other) => other.to_string(),
    }
}
