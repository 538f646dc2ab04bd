//! Interface minimale avec la bibliothèque cartographique
//!
//! Le sélecteur de région et la synchronisation d'overlay ne connaissent la
//! carte qu'à travers [`MapSurface`]. Les événements de l'outil de dessin
//! arrivent sous forme de [`DrawEvent`].

use std::collections::BTreeSet;

use tracing::debug;

use crate::types::{LatLng, Region};

/// Handle d'un polygone affiché sur la carte
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualId(pub u64);

/// Capacités de la carte utilisées par le cœur
pub trait MapSurface {
    /// Affiche le polygone d'une région et retourne son handle
    fn show_polygon(&mut self, region: &Region) -> VisualId;

    /// Retire un polygone précédemment affiché
    fn remove_polygon(&mut self, visual: VisualId);

    /// Remplace la couche de tuiles NDVI (`None` retire l'overlay)
    fn set_overlay_url(&mut self, url: Option<&str>);

    /// Cadre la vue sur la région
    fn fit_to_region(&mut self, region: &Region);
}

impl<S: MapSurface + ?Sized> MapSurface for Box<S> {
    fn show_polygon(&mut self, region: &Region) -> VisualId {
        (**self).show_polygon(region)
    }

    fn remove_polygon(&mut self, visual: VisualId) {
        (**self).remove_polygon(visual)
    }

    fn set_overlay_url(&mut self, url: Option<&str>) {
        (**self).set_overlay_url(url)
    }

    fn fit_to_region(&mut self, region: &Region) {
        (**self).fit_to_region(region)
    }
}

/// Événements émis par l'outil de dessin
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// L'utilisateur commence à dessiner un polygone
    DrawStart,
    /// L'utilisateur commence à éditer le polygone existant
    EditStart,
    /// Dessin ou édition abandonné sans résultat
    Stop,
    /// Polygone terminé (sommets dans l'ordre de la carte)
    Created(Vec<LatLng>),
    /// Polygone édité
    Edited(Vec<LatLng>),
    /// Polygone supprimé
    Deleted,
}

/// Carte sans rendu : garde la trace des polygones et de l'overlay
///
/// Utilisée par la CLI et les tests.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_id: u64,
    visuals: BTreeSet<VisualId>,
    overlay_url: Option<String>,
    overlay_changes: usize,
    fitted: Option<Region>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polygones actuellement affichés
    pub fn visuals(&self) -> impl Iterator<Item = VisualId> + '_ {
        self.visuals.iter().copied()
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    pub fn overlay_url(&self) -> Option<&str> {
        self.overlay_url.as_deref()
    }

    /// Nombre de remplacements effectifs de l'overlay
    pub fn overlay_changes(&self) -> usize {
        self.overlay_changes
    }

    /// Dernière région cadrée
    pub fn fitted(&self) -> Option<&Region> {
        self.fitted.as_ref()
    }
}

impl MapSurface for HeadlessSurface {
    fn show_polygon(&mut self, region: &Region) -> VisualId {
        self.next_id += 1;
        let id = VisualId(self.next_id);
        self.visuals.insert(id);
        debug!(visual = id.0, vertices = region.coordinates.len(), "Polygon shown");
        id
    }

    fn remove_polygon(&mut self, visual: VisualId) {
        if self.visuals.remove(&visual) {
            debug!(visual = visual.0, "Polygon removed");
        }
    }

    fn set_overlay_url(&mut self, url: Option<&str>) {
        if self.overlay_url.as_deref() == url {
            return;
        }
        self.overlay_url = url.map(str::to_string);
        self.overlay_changes += 1;
        debug!(url = ?url, "Overlay replaced");
    }

    fn fit_to_region(&mut self, region: &Region) {
        self.fitted = Some(region.clone());
    }
}
