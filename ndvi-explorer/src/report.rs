//! Rapport d'analyse d'une région
//!
//! Collecte le résultat d'un fetch (tuiles, série NDVI, météo, couches
//! annexes) pour l'affichage console et l'export JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use ndvi_core::{LatLng, Region, TimelineFrame};

use crate::api::frames::summarize;
use crate::api::types::{NdviResponse, NdviSummary, RgbComposite};
use crate::fingerprint::region_id;

/// Statut global de l'analyse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    /// Tuiles et série temporelle disponibles
    Success,
    /// Tuiles disponibles, série temporelle absente ou en erreur
    PartialSuccess,
    /// Requête échouée
    Failed,
}

/// Part d'une classe d'occupation du sol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandCoverShare {
    pub class: String,
    pub percentage: f64,
    pub area_hectares: f64,
}

/// Rapport complet d'analyse
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub region_name: String,
    /// Empreinte de la région
    pub region_id: String,
    pub center: Option<LatLng>,
    pub vertices: usize,
    pub duration_secs: f64,
    pub status: AnalysisStatus,

    pub satellite: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Tuile NDVI médiane
    pub tile_url: Option<String>,

    pub frames: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub summary: NdviSummary,
    pub rgb_composite: Option<RgbComposite>,
    pub weather_points: usize,

    pub dominant_land_cover: Option<String>,
    /// Classes triées par part décroissante
    pub land_cover: Vec<LandCoverShare>,
    pub mean_elevation_m: Option<f64>,
    pub mean_slope_deg: Option<f64>,

    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl AnalysisReport {
    /// Crée un rapport vide pour une région
    pub fn new(region: &Region) -> Self {
        Self {
            region_name: region.name.clone(),
            region_id: region_id(region),
            center: region.center,
            vertices: region.coordinates.len(),
            duration_secs: 0.0,
            status: AnalysisStatus::Failed,
            satellite: None,
            start_date: None,
            end_date: None,
            tile_url: None,
            frames: 0,
            first_date: None,
            last_date: None,
            summary: NdviSummary::default(),
            rgb_composite: None,
            weather_points: 0,
            dominant_land_cover: None,
            land_cover: Vec::new(),
            mean_elevation_m: None,
            mean_slope_deg: None,
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Enregistre une réponse du backend et les frames qui en sont issues
    pub fn record_response(&mut self, response: &NdviResponse, frames: &[TimelineFrame]) {
        let tiles = &response.ndvi_tiles;
        self.satellite = Some(tiles.satellite.clone());
        self.start_date = Some(tiles.start_date.clone());
        self.end_date = Some(tiles.end_date.clone());
        self.tile_url = Some(tiles.url.clone());

        self.frames = frames.len();
        self.first_date = frames.first().map(|f| f.date.clone());
        self.last_date = frames.last().map(|f| f.date.clone());
        self.summary = summarize(response, frames);

        if let Some(series) = &response.time_series {
            self.rgb_composite = series.rgb_visualization.clone();
            if let Some(error) = &series.error {
                self.warnings.push(format!("Time series unavailable: {}", error));
            }
            let skipped = series.data.len().saturating_sub(frames.len());
            if skipped > 0 {
                self.warnings
                    .push(format!("{} time series entries skipped (invalid date)", skipped));
            }
        }

        self.weather_points = response.weather.as_ref().map_or(0, |w| w.data.len());

        if let Some(landcover) = &response.landcover {
            self.dominant_land_cover = Some(landcover.land_cover.dominant_class.clone());
            let mut shares: Vec<LandCoverShare> = landcover
                .land_cover
                .classes
                .iter()
                .map(|(class, share)| LandCoverShare {
                    class: class.clone(),
                    percentage: share.percentage,
                    area_hectares: share.area_hectares,
                })
                .collect();
            shares.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
            self.land_cover = shares;
        }

        if let Some(topo) = &response.topography {
            self.mean_elevation_m = Some(topo.elevation.mean_meters);
            self.mean_slope_deg = Some(topo.slope.mean_degrees);
        }
    }

    /// Enregistre l'échec de la requête
    pub fn record_failure(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    /// Définit la durée de l'analyse
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.error.is_some() || self.tile_url.is_none() {
            AnalysisStatus::Failed
        } else if self.frames == 0 || !self.warnings.is_empty() {
            AnalysisStatus::PartialSuccess
        } else {
            AnalysisStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("NDVI ANALYSIS - {}", self.region_name);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!("Region: {} ({})", region_header(self.center, self.vertices), self.region_id);

        if let Some(error) = &self.error {
            println!("\nError: {}", error);
        }

        if let (Some(sat), Some(start), Some(end)) =
            (&self.satellite, &self.start_date, &self.end_date)
        {
            println!("\n--- NDVI ---");
            println!("Satellite: {} ({} to {})", sat, start, end);
            println!(
                "Frames: {}{}",
                self.frames,
                match (&self.first_date, &self.last_date) {
                    (Some(first), Some(last)) => format!(" ({} to {})", first, last),
                    _ => String::new(),
                }
            );
            println!(
                "NDVI min / mean / max: {} / {} / {}",
                format_ndvi(self.summary.min_ndvi),
                format_ndvi(self.summary.mean_ndvi),
                format_ndvi(self.summary.max_ndvi)
            );
            if let Some(rgb) = &self.rgb_composite {
                println!("Change composite (R/G/B): {}", rgb.dates.join(" / "));
            }
            if self.weather_points > 0 {
                println!("Weather observations: {}", self.weather_points);
            }
        }

        if let Some(dominant) = &self.dominant_land_cover {
            println!("\n--- LAND COVER ---");
            println!("Dominant: {}", dominant);
            for share in self.land_cover.iter().take(5) {
                println!(
                    "  {}: {:.1}% ({:.1} ha)",
                    share.class, share.percentage, share.area_hectares
                );
            }
        }

        if let (Some(elevation), Some(slope)) = (self.mean_elevation_m, self.mean_slope_deg) {
            println!("\n--- TOPOGRAPHY ---");
            println!("Mean elevation: {:.0} m", elevation);
            println!("Mean slope: {:.1}°", slope);
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in &self.warnings {
                println!("  {}", w);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} frames, mean NDVI {}, {:?}",
            self.region_name,
            self.frames,
            format_ndvi(self.summary.mean_ndvi),
            self.status
        )
    }
}

/// NDVI à 3 décimales, `N/A` si absent
pub fn format_ndvi(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.3}", v))
}

/// Valeur de frame : NDVI (4 décimales), température et précipitations
/// (1 décimale)
pub fn format_frame(frame: &TimelineFrame) -> String {
    let mut line = format!("{}  NDVI {:.4}", frame.date, frame.ndvi);
    if let Some(t) = frame.temperature {
        line.push_str(&format!("  {:.1}°C", t));
    }
    if let Some(p) = frame.precipitation {
        line.push_str(&format!("  {:.1} mm", p));
    }
    line
}

/// En-tête de région : `Lat: 48.8566, Lng: 2.3522 (5 points)`
pub fn region_header(center: Option<LatLng>, vertices: usize) -> String {
    match center {
        Some(c) => format!("Lat: {:.4}, Lng: {:.4} ({} points)", c.lat, c.lng, vertices),
        None => "No region selected".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{TileDescriptor, TimeSeries};

    fn region() -> Region {
        Region::from_vertices(vec![
            LatLng::new(48.80, 2.30),
            LatLng::new(48.90, 2.30),
            LatLng::new(48.90, 2.40),
        ])
        .unwrap()
    }

    fn response(series: Option<TimeSeries>) -> NdviResponse {
        NdviResponse {
            ndvi_tiles: TileDescriptor {
                url: "median".into(),
                attribution: String::new(),
                min: 0.0,
                max: 1.0,
                satellite: "sentinel-2".into(),
                start_date: "2024-11-01".into(),
                end_date: "2025-05-01".into(),
            },
            time_series: series,
            weather: None,
            topography: None,
            landcover: None,
        }
    }

    fn frames() -> Vec<TimelineFrame> {
        vec![
            TimelineFrame::new("2024-12-01", 0.3, "a"),
            TimelineFrame::new("2024-12-11", 0.5, "b"),
        ]
    }

    #[test]
    fn test_report_new() {
        let report = AnalysisReport::new(&region());
        assert_eq!(report.region_name, "Selected Region (48.8500, 2.3500)");
        assert_eq!(report.vertices, 3);
        assert_eq!(report.region_id.len(), 16);
    }

    #[test]
    fn test_finalize_success() {
        let mut report = AnalysisReport::new(&region());
        report.record_response(&response(Some(TimeSeries::default())), &frames());
        report.finalize();

        assert_eq!(report.status, AnalysisStatus::Success);
        assert_eq!(report.first_date.as_deref(), Some("2024-12-01"));
        assert_eq!(report.summary.max_ndvi, Some(0.5));
    }

    #[test]
    fn test_finalize_partial_on_series_error() {
        let mut report = AnalysisReport::new(&region());
        let series = TimeSeries {
            error: Some("Collection is empty".into()),
            ..TimeSeries::default()
        };
        report.record_response(&response(Some(series)), &[]);
        report.finalize();

        assert_eq!(report.status, AnalysisStatus::PartialSuccess);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_finalize_failed() {
        let mut report = AnalysisReport::new(&region());
        report.record_failure("Earth Engine not initialized");
        report.finalize();

        assert_eq!(report.status, AnalysisStatus::Failed);
        assert!(report.summary().contains("Failed"));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_ndvi(Some(0.45678)), "0.457");
        assert_eq!(format_ndvi(None), "N/A");

        let frame = TimelineFrame::new("2024-12-01", 0.42, "t").with_weather(Some(7.24), Some(0.0));
        assert_eq!(format_frame(&frame), "2024-12-01  NDVI 0.4200  7.2°C  0.0 mm");

        assert_eq!(
            region_header(Some(LatLng::new(48.8566, 2.3522)), 5),
            "Lat: 48.8566, Lng: 2.3522 (5 points)"
        );
    }
}
