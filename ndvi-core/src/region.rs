//! Cycle de vie de la région sélectionnée
//!
//! `Empty → Drawing/Editing → PendingConfirmation → Confirmed`, avec retour à
//! `Empty` depuis n'importe quel état par suppression.
//!
//! Le sélecteur est le seul propriétaire de la région courante et du polygone
//! affiché : il n'existe jamais plus d'un polygone sur la carte. Seule une
//! confirmation (ou une suppression) émet une région vers le reste de
//! l'application.

use tracing::debug;

use crate::surface::{DrawEvent, MapSurface, VisualId};
use crate::types::{LatLng, Region};
use crate::CoreError;

/// État observable du sélecteur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    Drawing,
    Editing,
    PendingConfirmation,
    Confirmed,
}

impl SelectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionState::Empty => "empty",
            SelectionState::Drawing => "drawing",
            SelectionState::Editing => "editing",
            SelectionState::PendingConfirmation => "pending confirmation",
            SelectionState::Confirmed => "confirmed",
        }
    }

    /// Une interaction utilisateur est en cours
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            SelectionState::Drawing | SelectionState::Editing | SelectionState::PendingConfirmation
        )
    }
}

/// Interaction en cours avec l'outil de dessin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Idle,
    Drawing,
    Editing,
}

/// Région en attente de confirmation, avec son polygone affiché
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRegion {
    pub region: Region,
    pub visual: VisualId,
}

/// Machine à états de sélection de région
#[derive(Debug)]
pub struct RegionSelector<S> {
    surface: S,
    activity: Activity,
    pending: Option<PendingRegion>,
    confirmed: Option<Region>,
    /// Le polygone affiché (en attente ou confirmé)
    visual: Option<VisualId>,
}

impl<S: MapSurface> RegionSelector<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            activity: Activity::Idle,
            pending: None,
            confirmed: None,
            visual: None,
        }
    }

    pub fn state(&self) -> SelectionState {
        match self.activity {
            Activity::Drawing => SelectionState::Drawing,
            Activity::Editing => SelectionState::Editing,
            Activity::Idle if self.pending.is_some() => SelectionState::PendingConfirmation,
            Activity::Idle if self.confirmed.is_some() => SelectionState::Confirmed,
            Activity::Idle => SelectionState::Empty,
        }
    }

    pub fn pending(&self) -> Option<&PendingRegion> {
        self.pending.as_ref()
    }

    pub fn confirmed(&self) -> Option<&Region> {
        self.confirmed.as_ref()
    }

    /// Handle du polygone actuellement affiché
    pub fn visual(&self) -> Option<VisualId> {
        self.visual
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Route un événement de l'outil de dessin
    ///
    /// Retourne la région émise en aval, le cas échéant (suppression seulement :
    /// un dessin ou une édition attend une confirmation).
    pub fn handle(&mut self, event: DrawEvent) -> Option<Region> {
        match event {
            DrawEvent::DrawStart => self.begin_drawing(),
            DrawEvent::EditStart => self.begin_editing(),
            DrawEvent::Stop => self.stop_interaction(),
            DrawEvent::Created(vertices) => {
                self.on_draw_complete(vertices);
            }
            DrawEvent::Edited(vertices) => {
                self.on_edit_complete(vertices);
            }
            DrawEvent::Deleted => return Some(self.on_delete()),
        }
        None
    }

    pub fn begin_drawing(&mut self) {
        self.activity = Activity::Drawing;
        debug!(state = self.state().as_str(), "Drawing started");
    }

    pub fn begin_editing(&mut self) {
        self.activity = Activity::Editing;
        debug!(state = self.state().as_str(), "Editing started");
    }

    /// Dessin ou édition abandonné : retour à l'état précédent
    pub fn stop_interaction(&mut self) {
        self.activity = Activity::Idle;
        debug!(state = self.state().as_str(), "Interaction stopped");
    }

    /// Fin du dessin d'un polygone
    ///
    /// Moins de 3 sommets : rien ne change. Sinon la région passe en attente
    /// de confirmation et remplace le polygone affiché ; la région confirmée
    /// précédente reste inchangée tant que l'utilisateur n'a pas tranché.
    pub fn on_draw_complete(&mut self, vertices: Vec<LatLng>) -> Option<&Region> {
        self.stage(vertices, "draw")
    }

    /// Fin de l'édition du polygone : nouvelle confirmation requise
    pub fn on_edit_complete(&mut self, vertices: Vec<LatLng>) -> Option<&Region> {
        self.stage(vertices, "edit")
    }

    fn stage(&mut self, vertices: Vec<LatLng>, origin: &'static str) -> Option<&Region> {
        let region = match Region::from_vertices(vertices) {
            Ok(region) => region,
            Err(e) => {
                debug!(origin, error = %e, "Polygon ignored");
                return None;
            }
        };

        self.activity = Activity::Idle;
        self.clear_visual();
        let visual = self.surface.show_polygon(&region);
        self.visual = Some(visual);

        debug!(
            origin,
            name = %region.name,
            vertices = region.coordinates.len(),
            "Region pending confirmation"
        );
        self.pending = Some(PendingRegion { region, visual });
        self.pending.as_ref().map(|p| &p.region)
    }

    /// Valide la région en attente et l'émet en aval
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidTransition` hors de l'état `PendingConfirmation`.
    pub fn confirm(&mut self) -> Result<Region, CoreError> {
        let state = self.state();
        if state != SelectionState::PendingConfirmation {
            return Err(CoreError::invalid_transition("confirm", state.as_str()));
        }
        let Some(pending) = self.pending.take() else {
            return Err(CoreError::invalid_transition("confirm", state.as_str()));
        };

        debug!(name = %pending.region.name, "Region confirmed");
        self.confirmed = Some(pending.region.clone());
        Ok(pending.region)
    }

    /// Abandonne la région en attente
    ///
    /// Le polygone en attente disparaît ; la région confirmée précédente, s'il
    /// y en a une, est réaffichée.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidTransition` hors de l'état `PendingConfirmation`.
    pub fn cancel(&mut self) -> Result<(), CoreError> {
        let state = self.state();
        if state != SelectionState::PendingConfirmation {
            return Err(CoreError::invalid_transition("cancel", state.as_str()));
        }

        self.pending = None;
        self.clear_visual();
        if let Some(confirmed) = &self.confirmed {
            self.visual = Some(self.surface.show_polygon(confirmed));
        }

        debug!(state = self.state().as_str(), "Pending region cancelled");
        Ok(())
    }

    /// Suppression : efface tout et émet toujours une région vide
    pub fn on_delete(&mut self) -> Region {
        self.activity = Activity::Idle;
        self.pending = None;
        self.confirmed = None;
        self.clear_visual();

        debug!("Region deleted");
        Region::empty()
    }

    /// Mise à jour programmatique (ex: restauration d'une région confirmée)
    ///
    /// Ignorée pendant une interaction utilisateur : le dessin est prioritaire.
    /// Une région vide équivaut à une suppression. Retourne la région émise.
    pub fn set_external_region(&mut self, region: Region) -> Option<Region> {
        let state = self.state();
        if state.is_interactive() {
            debug!(state = state.as_str(), "External region ignored during interaction");
            return None;
        }

        if region.is_empty() {
            return Some(self.on_delete());
        }

        let name = region.name;
        let mut region = match Region::from_vertices(region.coordinates) {
            Ok(region) => region,
            Err(e) => {
                debug!(error = %e, "External region ignored");
                return None;
            }
        };
        if !name.is_empty() {
            region.name = name;
        }

        self.clear_visual();
        self.visual = Some(self.surface.show_polygon(&region));
        self.surface.fit_to_region(&region);

        debug!(name = %region.name, "External region applied");
        self.confirmed = Some(region.clone());
        Some(region)
    }

    fn clear_visual(&mut self) {
        if let Some(visual) = self.visual.take() {
            self.surface.remove_polygon(visual);
        }
    }
}
