//! Assemblage des frames de la timeline
//!
//! Chaque point de la série NDVI devient une frame ; la météo est rattachée
//! par date quand elle existe.

use std::collections::HashMap;

use ndvi_core::TimelineFrame;
use tracing::warn;

use super::types::{NdviResponse, NdviSummary, WeatherPoint};
use crate::dates::is_iso_date;

/// Frames de la série temporelle d'une réponse, dans l'ordre du backend
pub fn build_frames(response: &NdviResponse) -> Vec<TimelineFrame> {
    let Some(series) = &response.time_series else {
        return Vec::new();
    };
    if let Some(error) = &series.error {
        warn!(error = %error, "Time series unavailable");
    }

    let weather: HashMap<&str, &WeatherPoint> = response
        .weather
        .iter()
        .flat_map(|w| w.data.iter())
        .map(|p| (p.date.as_str(), p))
        .collect();

    series
        .data
        .iter()
        .filter(|point| {
            let valid = is_iso_date(&point.date);
            if !valid {
                warn!(date = %point.date, "Skipping time series entry with invalid date");
            }
            valid
        })
        .map(|point| {
            let frame = TimelineFrame::new(point.date.clone(), point.ndvi, point.url.clone());
            match weather.get(point.date.as_str()) {
                Some(w) => frame.with_weather(w.temperature_celsius, w.precipitation_mm),
                None => frame,
            }
        })
        .collect()
}

/// Statistiques NDVI : celles du backend, sinon calculées sur les frames
pub fn summarize(response: &NdviResponse, frames: &[TimelineFrame]) -> NdviSummary {
    if let Some(summary) = response.time_series.as_ref().and_then(|ts| ts.summary) {
        if summary.mean_ndvi.is_some() {
            return summary;
        }
    }

    if frames.is_empty() {
        return NdviSummary::default();
    }

    let values = frames.iter().map(|f| f.ndvi);
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.sum::<f64>() / frames.len() as f64;

    NdviSummary {
        min_ndvi: Some(min),
        max_ndvi: Some(max),
        mean_ndvi: Some(mean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{TileDescriptor, TimeSeries, TimeSeriesPoint, WeatherSeries};

    fn response(points: &[(&str, f64)], weather: &[(&str, f64, f64)]) -> NdviResponse {
        NdviResponse {
            ndvi_tiles: TileDescriptor {
                url: "median".to_string(),
                attribution: String::new(),
                min: 0.0,
                max: 1.0,
                satellite: "sentinel-2".to_string(),
                start_date: "2024-11-01".to_string(),
                end_date: "2025-05-01".to_string(),
            },
            time_series: Some(TimeSeries {
                data: points
                    .iter()
                    .map(|(date, ndvi)| TimeSeriesPoint {
                        date: date.to_string(),
                        ndvi: *ndvi,
                        url: format!("tile-{date}"),
                    })
                    .collect(),
                count: points.len(),
                ..TimeSeries::default()
            }),
            weather: Some(WeatherSeries {
                data: weather
                    .iter()
                    .map(|(date, t, p)| WeatherPoint {
                        date: date.to_string(),
                        temperature_celsius: Some(*t),
                        precipitation_mm: Some(*p),
                    })
                    .collect(),
                count: weather.len(),
            }),
            topography: None,
            landcover: None,
        }
    }

    #[test]
    fn test_weather_merged_by_date() {
        let r = response(
            &[("2024-12-01", 0.3), ("2024-12-11", 0.4)],
            &[("2024-12-11", 8.5, 2.0)],
        );
        let frames = build_frames(&r);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].temperature, None);
        assert_eq!(frames[1].temperature, Some(8.5));
        assert_eq!(frames[1].precipitation, Some(2.0));
        assert_eq!(frames[1].url, "tile-2024-12-11");
    }

    #[test]
    fn test_invalid_dates_skipped() {
        let r = response(&[("2024-12-01", 0.3), ("12/11/2024", 0.4)], &[]);
        let frames = build_frames(&r);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].date, "2024-12-01");
    }

    #[test]
    fn test_no_time_series() {
        let mut r = response(&[], &[]);
        r.time_series = None;
        assert!(build_frames(&r).is_empty());
        assert_eq!(summarize(&r, &[]), NdviSummary::default());
    }

    #[test]
    fn test_summary_prefers_backend() {
        let mut r = response(&[("2024-12-01", 0.2), ("2024-12-11", 0.6)], &[]);
        let backend = NdviSummary {
            min_ndvi: Some(0.1),
            max_ndvi: Some(0.9),
            mean_ndvi: Some(0.5),
        };
        if let Some(ts) = r.time_series.as_mut() {
            ts.summary = Some(backend);
        }
        let frames = build_frames(&r);
        assert_eq!(summarize(&r, &frames), backend);
    }

    #[test]
    fn test_summary_computed_from_frames() {
        let r = response(&[("2024-12-01", 0.2), ("2024-12-11", 0.6), ("2024-12-21", 0.4)], &[]);
        let frames = build_frames(&r);
        let summary = summarize(&r, &frames);

        assert_eq!(summary.min_ndvi, Some(0.2));
        assert_eq!(summary.max_ndvi, Some(0.6));
        assert!((summary.mean_ndvi.unwrap() - 0.4).abs() < 1e-12);
    }
}
