//! Types de données pour le crate ndvi-core

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::CoreError;

/// Nombre minimal de sommets pour former une région
pub const MIN_VERTICES: usize = 3;

/// Position géographique dans l'ordre de la carte (lat, lng)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

/// `geo` travaille en (x, y) = (lng, lat)
impl From<LatLng> for geo::Coord {
    fn from(p: LatLng) -> Self {
        geo::Coord { x: p.lng, y: p.lat }
    }
}

impl From<geo::Coord> for LatLng {
    fn from(c: geo::Coord) -> Self {
        Self { lat: c.y, lng: c.x }
    }
}

/// Région d'intérêt sélectionnée par l'utilisateur
///
/// `coordinates` est soit vide (rien de sélectionné), soit un anneau d'au moins
/// [`MIN_VERTICES`] sommets. Une région n'est jamais modifiée partiellement :
/// chaque édition produit une nouvelle valeur.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    /// Nom lisible, dérivé du centre
    pub name: String,

    /// Centre de la bounding box, absent si la région est vide
    pub center: Option<LatLng>,

    /// Sommets (lat, lng) dans l'ordre du dessin
    pub coordinates: Vec<LatLng>,
}

impl Region {
    /// Région vide : signal explicite de désélection
    pub fn empty() -> Self {
        Self::default()
    }

    /// Construit une région depuis les sommets bruts de l'outil de dessin
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidPolygon` si moins de 3 sommets.
    pub fn from_vertices(coordinates: Vec<LatLng>) -> Result<Self, CoreError> {
        if coordinates.len() < MIN_VERTICES {
            return Err(CoreError::invalid_polygon(coordinates.len()));
        }

        let center = geometry::bounds_center(&coordinates)
            .ok_or_else(|| CoreError::invalid_polygon(coordinates.len()))?;

        Ok(Self {
            name: region_name(center),
            center: Some(center),
            coordinates,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Polygone GeoJSON (lng, lat) fermé
    pub fn to_geojson(&self) -> geojson::Geometry {
        geometry::to_geojson(&self.coordinates)
    }

    /// Centre moyen des sommets (affichage uniquement)
    pub fn mean_center(&self) -> LatLng {
        geometry::polygon_center(&self.coordinates)
    }
}

/// Nom affiché dans la confirmation : `Selected Region (51.5050, -0.0900)`
pub fn region_name(center: LatLng) -> String {
    format!("Selected Region ({:.4}, {:.4})", center.lat, center.lng)
}

/// Une frame de la série temporelle NDVI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineFrame {
    /// Date ISO (YYYY-MM-DD)
    pub date: String,

    /// NDVI moyen sur la région
    pub ndvi: f64,

    /// Template d'URL des tuiles pour cette date
    pub url: String,

    /// Température moyenne (°C)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Précipitations (mm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
}

impl TimelineFrame {
    pub fn new(date: impl Into<String>, ndvi: f64, url: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ndvi,
            url: url.into(),
            temperature: None,
            precipitation: None,
        }
    }

    pub fn with_weather(mut self, temperature: Option<f64>, precipitation: Option<f64>) -> Self {
        self.temperature = temperature;
        self.precipitation = precipitation;
        self
    }
}
