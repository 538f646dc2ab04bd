//! Types échangés avec le backend d'analyse

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Source satellite des images NDVI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SatelliteSource {
    #[default]
    #[serde(rename = "sentinel-2")]
    Sentinel2,
    #[serde(rename = "landsat-8")]
    Landsat8,
    #[serde(rename = "landsat-9")]
    Landsat9,
}

impl SatelliteSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SatelliteSource::Sentinel2 => "sentinel-2",
            SatelliteSource::Landsat8 => "landsat-8",
            SatelliteSource::Landsat9 => "landsat-9",
        }
    }
}

impl fmt::Display for SatelliteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SatelliteSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sentinel-2" | "sentinel2" | "s2" => Ok(SatelliteSource::Sentinel2),
            "landsat-8" | "landsat8" | "l8" => Ok(SatelliteSource::Landsat8),
            "landsat-9" | "landsat9" | "l9" => Ok(SatelliteSource::Landsat9),
            _ => Err(format!(
                "Invalid satellite source: {}. Use: sentinel-2, landsat-8, landsat-9",
                s
            )),
        }
    }
}

/// Options d'une requête d'analyse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub satellite_source: SatelliteSource,
    pub start_date: String,
    pub end_date: String,
    pub time_series: bool,
    pub include_weather: bool,
    pub include_topography: bool,
    pub include_landcover: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            satellite_source: SatelliteSource::Sentinel2,
            start_date: "2024-11-01".to_string(),
            end_date: "2025-05-01".to_string(),
            time_series: true,
            include_weather: true,
            include_topography: false,
            include_landcover: true,
        }
    }
}

/// Corps de `POST /ndvi-tiles/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviRequest {
    pub polygon: geojson::Geometry,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

impl NdviRequest {
    pub fn new(polygon: geojson::Geometry, options: AnalysisOptions) -> Self {
        Self { polygon, options }
    }
}

/// Réponse de `POST /ndvi-tiles/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdviResponse {
    pub ndvi_tiles: TileDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topography: Option<Topography>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landcover: Option<LandCover>,
}

/// Tuiles NDVI médianes sur la période
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub url: String,
    #[serde(default)]
    pub attribution: String,
    pub min: f64,
    pub max: f64,
    pub satellite: String,
    pub start_date: String,
    pub end_date: String,
}

/// Série temporelle NDVI
///
/// Le backend remplace la série par `{ "error": "..." }` quand elle échoue.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default)]
    pub data: Vec<TimeSeriesPoint>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub timestamps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<NdviSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_visualization: Option<RgbComposite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub ndvi: f64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NdviSummary {
    pub min_ndvi: Option<f64>,
    pub max_ndvi: Option<f64>,
    pub mean_ndvi: Option<f64>,
}

/// Composite RGB (R = première date, G = milieu, B = dernière)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbComposite {
    pub url: String,
    #[serde(default)]
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSeries {
    #[serde(default)]
    pub data: Vec<WeatherPoint>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub date: String,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topography {
    pub elevation: ElevationStats,
    pub slope: SlopeStats,
    pub aspect: AspectStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
    pub min_meters: f64,
    pub max_meters: f64,
    pub mean_meters: f64,
    #[serde(default)]
    pub tile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeStats {
    pub min_degrees: f64,
    pub max_degrees: f64,
    pub mean_degrees: f64,
    #[serde(default)]
    pub tile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectStats {
    pub min_degrees: f64,
    pub max_degrees: f64,
    pub mean_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCover {
    pub land_cover: LandCoverClasses,
    pub vegetation: VegetationBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverClasses {
    /// Classe → part de la surface
    pub classes: BTreeMap<String, ClassShare>,
    pub dominant_class: String,
    #[serde(default)]
    pub tile_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassShare {
    pub percentage: f64,
    pub area_hectares: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VegetationBreakdown {
    pub tree_cover_percent: f64,
    pub non_tree_vegetation_percent: f64,
    pub non_vegetated_percent: f64,
}

/// Réponse de `GET /auth-status/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
}

impl AuthStatus {
    /// Statut retourné quand le serveur est injoignable
    pub fn unreachable() -> Self {
        Self {
            authenticated: false,
            message: "Could not connect to API server".to_string(),
            instructions: None,
        }
    }
}
