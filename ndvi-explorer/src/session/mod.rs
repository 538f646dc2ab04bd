//! Session d'analyse : région, fetch et timeline
//!
//! La session relie le sélecteur de région au backend et à la timeline :
//!
//! - chaque confirmation lance un fetch identifié par un jeton croissant ;
//!   seule la réponse du dernier jeton est appliquée (les autres sont
//!   ignorées à l'arrivée)
//! - un seul timer de lecture automatique existe à la fois
//! - les consommateurs lisent des instantanés ou s'abonnent aux canaux
//!   `watch` (région, timeline, statut)
//!
//! Les tâches lancées ne gardent qu'une référence faible sur l'état : après
//! `shutdown()` (ou le drop de la session) leurs callbacks n'ont plus d'effet.
//!
//! Les méthodes qui lancent des tâches doivent être appelées depuis un
//! runtime Tokio.

mod playback;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ndvi_core::{
    CoreError, DrawEvent, MapSurface, Region, RegionSelector, SelectionState, TimelineController,
    TimelineFrame, TimelineSnapshot,
};

use crate::api::types::NdviSummary;
use crate::api::{
    build_frames, summarize, AnalysisBackend, AnalysisOptions, ApiError, NdviRequest, NdviResponse,
};
use crate::chat::ChatContext;
use crate::config::ExplorerConfig;
use crate::fingerprint::region_id;

/// Message du fetch interrompu par la fermeture de la session
pub const SESSION_CLOSED: &str = "Session closed";

/// Statut du dernier fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    /// Aucune région confirmée
    Idle,
    Loading { request: u64 },
    Ready { request: u64, frames: usize },
    /// Échec ; les frames affichées sont conservées
    Failed { request: u64, message: String },
}

impl FetchStatus {
    pub fn request(&self) -> Option<u64> {
        match self {
            FetchStatus::Idle => None,
            FetchStatus::Loading { request }
            | FetchStatus::Ready { request, .. }
            | FetchStatus::Failed { request, .. } => Some(*request),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading { .. })
    }
}

/// État partagé entre la session et ses tâches
pub(crate) struct Shared<S> {
    selector: RegionSelector<S>,
    timeline: TimelineController,
    /// Jeton du dernier fetch lancé (0 = aucun)
    latest_request: u64,
    fetches: Vec<JoinHandle<()>>,
    response: Option<Arc<NdviResponse>>,
    region_id: Option<String>,
    autoplay: Option<JoinHandle<()>>,
    autoplay_generation: u64,
    disposed: bool,
    region_tx: watch::Sender<Region>,
    timeline_tx: watch::Sender<TimelineSnapshot>,
    status_tx: watch::Sender<FetchStatus>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: MapSurface> Shared<S> {
    /// Publie l'instantané de la timeline et synchronise l'overlay
    ///
    /// L'overlay suit la frame courante, sinon la tuile médiane de la
    /// dernière réponse, sinon rien.
    fn publish_timeline(&mut self) {
        let overlay = self
            .timeline
            .current_frame()
            .map(|f| f.url.clone())
            .or_else(|| self.response.as_ref().map(|r| r.ndvi_tiles.url.clone()));
        self.selector.surface_mut().set_overlay_url(overlay.as_deref());
        self.timeline_tx.send_replace(self.timeline.snapshot());
    }

    fn stop_autoplay(&mut self) {
        self.autoplay_generation += 1;
        if let Some(handle) = self.autoplay.take() {
            handle.abort();
        }
    }

    fn autoplay_running(&self) -> bool {
        self.autoplay.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Applique le résultat d'un fetch s'il est toujours le plus récent
    fn complete_fetch(&mut self, request: u64, result: Result<NdviResponse, ApiError>) {
        if self.disposed {
            return;
        }
        if request != self.latest_request {
            debug!(request, latest = self.latest_request, "Stale response discarded");
            return;
        }

        match result {
            Ok(response) => {
                let frames = build_frames(&response);
                let count = frames.len();
                self.stop_autoplay();
                self.timeline.load(frames);
                self.response = Some(Arc::new(response));
                info!(request, frames = count, "NDVI analysis loaded");
                self.status_tx
                    .send_replace(FetchStatus::Ready { request, frames: count });
                self.publish_timeline();
            }
            Err(e) => {
                let message = e.user_message();
                warn!(request, error = %message, "NDVI analysis failed");
                self.status_tx
                    .send_replace(FetchStatus::Failed { request, message });
            }
        }
    }

    /// Région effacée : les fetchs en cours deviennent obsolètes
    fn clear(&mut self) {
        self.latest_request += 1;
        self.stop_autoplay();
        self.timeline.load(Vec::new());
        self.response = None;
        self.region_id = None;
        self.region_tx.send_replace(Region::empty());
        self.status_tx.send_replace(FetchStatus::Idle);
        self.publish_timeline();
        debug!("Analysis cleared");
    }
}

/// Session d'analyse d'une région
pub struct AnalysisSession<S: MapSurface + Send + 'static> {
    shared: Arc<Mutex<Shared<S>>>,
    backend: Arc<dyn AnalysisBackend>,
    options: AnalysisOptions,
}

impl<S: MapSurface + Send + 'static> AnalysisSession<S> {
    pub fn new(surface: S, backend: Arc<dyn AnalysisBackend>, options: AnalysisOptions) -> Self {
        let timeline = TimelineController::new();
        let (region_tx, _) = watch::channel(Region::empty());
        let (timeline_tx, _) = watch::channel(timeline.snapshot());
        let (status_tx, _) = watch::channel(FetchStatus::Idle);

        Self {
            shared: Arc::new(Mutex::new(Shared {
                selector: RegionSelector::new(surface),
                timeline,
                latest_request: 0,
                fetches: Vec::new(),
                response: None,
                region_id: None,
                autoplay: None,
                autoplay_generation: 0,
                disposed: false,
                region_tx,
                timeline_tx,
                status_tx,
            })),
            backend,
            options,
        }
    }

    pub fn from_config(
        surface: S,
        backend: Arc<dyn AnalysisBackend>,
        config: &ExplorerConfig,
    ) -> Self {
        let session = Self::new(surface, backend, config.analysis.clone());
        session.set_interval(config.playback_interval());
        session
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    // --- Région ---

    /// Route un événement de l'outil de dessin
    pub fn handle_draw_event(&self, event: DrawEvent) {
        let mut guard = lock(&self.shared);
        if guard.disposed {
            return;
        }
        if let Some(emitted) = guard.selector.handle(event) {
            if emitted.is_empty() {
                guard.clear();
            }
        }
    }

    /// Confirme la région en attente et lance son analyse
    ///
    /// Retourne le jeton du fetch lancé.
    pub fn confirm(&self) -> Result<u64, CoreError> {
        let mut guard = lock(&self.shared);
        let region = guard.selector.confirm()?;
        Ok(self.start_fetch(&mut guard, region))
    }

    pub fn cancel(&self) -> Result<(), CoreError> {
        lock(&self.shared).selector.cancel()
    }

    /// Supprime la région et efface l'analyse
    pub fn delete(&self) {
        let mut guard = lock(&self.shared);
        if guard.disposed {
            return;
        }
        guard.selector.on_delete();
        guard.clear();
    }

    /// Applique une région venue de l'extérieur (restauration)
    ///
    /// Ignorée pendant un dessin. Retourne le jeton du fetch lancé, `None` si
    /// la région est ignorée ou vide (effacement).
    pub fn restore_region(&self, region: Region) -> Option<u64> {
        let mut guard = lock(&self.shared);
        if guard.disposed {
            return None;
        }
        let emitted = guard.selector.set_external_region(region)?;
        if emitted.is_empty() {
            guard.clear();
            return None;
        }
        Some(self.start_fetch(&mut guard, emitted))
    }

    fn start_fetch(&self, guard: &mut MutexGuard<'_, Shared<S>>, region: Region) -> u64 {
        guard.latest_request += 1;
        let request = guard.latest_request;
        let id = region_id(&region);

        info!(
            request,
            region = %id,
            name = %region.name,
            vertices = region.coordinates.len(),
            "Starting NDVI analysis"
        );

        let body = NdviRequest::new(region.to_geojson(), self.options.clone());
        guard.region_id = Some(id);
        guard.region_tx.send_replace(region);
        guard.status_tx.send_replace(FetchStatus::Loading { request });

        if guard.disposed {
            return request;
        }

        let backend = Arc::clone(&self.backend);
        let shared = Arc::downgrade(&self.shared);
        let handle = tokio::spawn(async move {
            let result = backend.fetch_ndvi(body).await;
            if let Some(shared) = shared.upgrade() {
                lock(&shared).complete_fetch(request, result);
            }
        });

        guard.fetches.retain(|h| !h.is_finished());
        guard.fetches.push(handle);
        request
    }

    /// Attend la fin du fetch `request` (ou son remplacement)
    pub async fn wait_for_fetch(&self, request: u64) -> FetchStatus {
        let mut rx = self.subscribe_status();
        let settled = rx
            .wait_for(|s| !(s.is_loading() && s.request() == Some(request)))
            .await
            .map(|s| s.clone());
        settled.unwrap_or(FetchStatus::Idle)
    }

    // --- Timeline ---

    /// Démarre la lecture ; sans effet avec moins de 2 frames
    pub fn play(&self) -> bool {
        let mut guard = lock(&self.shared);
        if guard.disposed {
            return false;
        }
        if guard.timeline.play() && !guard.autoplay_running() {
            self.spawn_autoplay(&mut guard);
        }
        guard.publish_timeline();
        guard.timeline.is_playing()
    }

    pub fn pause(&self) {
        let mut guard = lock(&self.shared);
        guard.timeline.pause();
        guard.stop_autoplay();
        guard.publish_timeline();
    }

    pub fn toggle_playback(&self) -> bool {
        let playing = lock(&self.shared).timeline.is_playing();
        if playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Frame suivante (navigation manuelle : met la lecture en pause)
    pub fn step_next(&self) -> Option<TimelineFrame> {
        let mut guard = lock(&self.shared);
        guard.timeline.pause();
        guard.stop_autoplay();
        let frame = guard.timeline.next().cloned();
        guard.publish_timeline();
        frame
    }

    /// Frame précédente (navigation manuelle : met la lecture en pause)
    pub fn step_previous(&self) -> Option<TimelineFrame> {
        let mut guard = lock(&self.shared);
        guard.timeline.pause();
        guard.stop_autoplay();
        let frame = guard.timeline.previous().cloned();
        guard.publish_timeline();
        frame
    }

    /// Positionne le curseur (scrubbing : met la lecture en pause)
    pub fn scrub(&self, index: usize) -> Result<TimelineFrame, CoreError> {
        let mut guard = lock(&self.shared);
        let frame = guard.timeline.seek(index)?.clone();
        guard.timeline.pause();
        guard.stop_autoplay();
        guard.publish_timeline();
        Ok(frame)
    }

    /// Change la vitesse ; un timer actif est replanifié une seule fois
    pub fn set_interval(&self, interval: Duration) {
        let mut guard = lock(&self.shared);
        guard.timeline.set_interval(interval);
        if guard.timeline.is_playing() && !guard.disposed {
            self.spawn_autoplay(&mut guard);
        }
        guard.publish_timeline();
    }

    fn spawn_autoplay(&self, guard: &mut MutexGuard<'_, Shared<S>>) {
        guard.stop_autoplay();
        let generation = guard.autoplay_generation;
        let period = guard.timeline.interval();
        debug!(generation, period_ms = period.as_millis() as u64, "Autoplay started");

        let shared = Arc::downgrade(&self.shared);
        guard.autoplay = Some(tokio::spawn(playback::run(shared, generation, period)));
    }

    // --- Lecture de l'état ---

    pub fn state(&self) -> SelectionState {
        lock(&self.shared).selector.state()
    }

    pub fn confirmed_region(&self) -> Option<Region> {
        lock(&self.shared).selector.confirmed().cloned()
    }

    pub fn pending_region(&self) -> Option<Region> {
        lock(&self.shared).selector.pending().map(|p| p.region.clone())
    }

    /// Empreinte de la région du dernier fetch
    pub fn region_id(&self) -> Option<String> {
        lock(&self.shared).region_id.clone()
    }

    pub fn latest_request(&self) -> u64 {
        lock(&self.shared).latest_request
    }

    pub fn timeline(&self) -> TimelineSnapshot {
        lock(&self.shared).timeline.snapshot()
    }

    pub fn frames(&self) -> Vec<TimelineFrame> {
        lock(&self.shared).timeline.frames().to_vec()
    }

    pub fn status(&self) -> FetchStatus {
        lock(&self.shared).status_tx.borrow().clone()
    }

    pub fn response(&self) -> Option<Arc<NdviResponse>> {
        lock(&self.shared).response.clone()
    }

    /// Statistiques NDVI de la dernière réponse
    pub fn summary(&self) -> Option<NdviSummary> {
        let guard = lock(&self.shared);
        guard
            .response
            .as_ref()
            .map(|r| summarize(r, guard.timeline.frames()))
    }

    /// Contexte de chat pour la région et la frame courantes
    pub fn chat_context(&self) -> ChatContext {
        let guard = lock(&self.shared);
        ChatContext::new(
            guard.selector.confirmed(),
            guard.timeline.current_frame(),
            guard.response.as_deref(),
        )
    }

    /// Accès en lecture à la carte
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(lock(&self.shared).selector.surface())
    }

    pub fn subscribe_region(&self) -> watch::Receiver<Region> {
        lock(&self.shared).region_tx.subscribe()
    }

    pub fn subscribe_timeline(&self) -> watch::Receiver<TimelineSnapshot> {
        lock(&self.shared).timeline_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<FetchStatus> {
        lock(&self.shared).status_tx.subscribe()
    }

    /// Arrête la lecture, annule les fetchs en cours et neutralise les
    /// callbacks tardifs
    pub fn shutdown(&self) {
        let mut guard = lock(&self.shared);
        if guard.disposed {
            return;
        }
        guard.disposed = true;
        guard.stop_autoplay();
        guard.timeline.pause();
        for handle in guard.fetches.drain(..) {
            handle.abort();
        }
        // un fetch annulé ne doit pas rester en chargement
        let pending = guard.status_tx.borrow().is_loading();
        if pending {
            let request = guard.latest_request;
            guard.status_tx.send_replace(FetchStatus::Failed {
                request,
                message: SESSION_CLOSED.to_string(),
            });
        }
        debug!(latest = guard.latest_request, "Session shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.shared).disposed
    }
}

impl<S: MapSurface + Send + 'static> Drop for AnalysisSession<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
