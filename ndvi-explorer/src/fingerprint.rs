//! Empreinte stable d'une région
//!
//! L'empreinte est normalisée pour être indépendante du sommet de départ et
//! de la fermeture de l'anneau : redessiner le même polygone donne le même
//! identifiant.

use blake3::Hasher;
use ndvi_core::{LatLng, Region};

/// Pas de quantification : 1e-7 degré (~1 cm)
const SCALE: f64 = 10_000_000.0;

/// Empreinte blake3 d'une région (vide pour une région vide)
pub fn region_fingerprint(region: &Region) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(b"REGION");
    for (lat, lng) in canonical_ring(&region.coordinates) {
        hasher.update(&lat.to_le_bytes());
        hasher.update(&lng.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Identifiant hexadécimal court (16 caractères) pour les logs et rapports
pub fn region_id(region: &Region) -> String {
    hex::encode(&region_fingerprint(region)[..8])
}

/// Sommets quantifiés, sans sommet de fermeture, tournés pour commencer au
/// plus petit (lat, lng)
fn canonical_ring(vertices: &[LatLng]) -> Vec<(i64, i64)> {
    let mut ring: Vec<(i64, i64)> = vertices.iter().map(|p| quantize(*p)).collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let start = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, vertex)| *vertex)
        .map_or(0, |(i, _)| i);
    ring.rotate_left(start);
    ring
}

fn quantize(p: LatLng) -> (i64, i64) {
    ((p.lat * SCALE).round() as i64, (p.lng * SCALE).round() as i64)
}
