//! Utilitaires géométriques purs (centre, conversion GeoJSON)
//!
//! Les coordonnées d'entrée sont dans l'ordre de la carte (lat, lng) ;
//! GeoJSON impose l'ordre inverse (lng, lat).

use geo::{BoundingRect, Coord, LineString};
use geojson::{Geometry, Position, Value};

use crate::types::LatLng;

/// Moyenne arithmétique des sommets
///
/// Ce n'est pas un vrai centroïde de polygone : c'est l'approximation utilisée
/// pour l'affichage. Retourne (0, 0) pour une liste vide.
pub fn polygon_center(coordinates: &[LatLng]) -> LatLng {
    if coordinates.is_empty() {
        return LatLng::default();
    }

    let n = coordinates.len() as f64;
    let (sum_lat, sum_lng) = coordinates
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));

    LatLng::new(sum_lat / n, sum_lng / n)
}

/// Centre de la bounding box des sommets (centre canonique d'une région)
pub fn bounds_center(coordinates: &[LatLng]) -> Option<LatLng> {
    let line: LineString = coordinates.iter().map(|&p| Coord::from(p)).collect();
    let rect = line.bounding_rect()?;
    Some(rect.center().into())
}

/// Anneau GeoJSON fermé : inversion des axes puis fermeture si besoin
pub fn closed_ring(coordinates: &[LatLng]) -> Vec<Position> {
    let mut ring: Vec<Position> = coordinates.iter().map(|p| vec![p.lng, p.lat]).collect();

    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = first.clone();
            ring.push(first);
        }
    }

    ring
}

/// Convertit une liste de sommets en polygone GeoJSON
pub fn to_geojson(coordinates: &[LatLng]) -> Geometry {
    Geometry::new(Value::Polygon(vec![closed_ring(coordinates)]))
}
