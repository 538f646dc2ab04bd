//! Contrôleur de lecture de la série temporelle NDVI
//!
//! Parcours déterministe d'une séquence de frames avec un curseur. La lecture
//! automatique fait une seule boucle : passer la dernière frame revient au
//! début et arrête la lecture.
//!
//! Le contrôleur ne possède pas de timer : l'appelant planifie les `next()`
//! toutes les `interval()` tant que `is_playing()` est vrai.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::TimelineFrame;
use crate::CoreError;

/// Intervalle par défaut entre deux frames
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Intervalle minimal accepté
pub const MIN_INTERVAL: Duration = Duration::from_millis(50);

/// État de la timeline, propriété exclusive du contrôleur
#[derive(Debug, Clone)]
pub struct TimelineController {
    frames: Vec<TimelineFrame>,
    current_index: usize,
    is_playing: bool,
    interval: Duration,
}

/// Vue de la timeline pour la couche de présentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    pub current: Option<TimelineFrame>,
    pub current_index: usize,
    pub frame_count: usize,
    pub is_playing: bool,
    pub interval_ms: u64,
}

impl TimelineSnapshot {
    /// Libellé du curseur : `Frame 2 of 5`
    pub fn label(&self) -> Option<String> {
        self.current
            .as_ref()
            .map(|_| format!("Frame {} of {}", self.current_index + 1, self.frame_count))
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineController {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            frames: Vec::new(),
            current_index: 0,
            is_playing: false,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Remplace les frames : curseur à 0, lecture arrêtée
    pub fn load(&mut self, frames: Vec<TimelineFrame>) {
        if frames.windows(2).any(|w| w[0].date > w[1].date) {
            warn!(frames = frames.len(), "Timeline frames are not sorted by date");
        }

        debug!(frames = frames.len(), "Timeline loaded");
        self.frames = frames;
        self.current_index = 0;
        self.is_playing = false;
    }

    /// Démarre la lecture ; sans effet avec moins de 2 frames
    pub fn play(&mut self) -> bool {
        if self.can_navigate() {
            self.is_playing = true;
        }
        self.is_playing
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    pub fn toggle_playback(&mut self) -> bool {
        if self.is_playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Frame suivante ; passer la dernière frame arrête la lecture
    pub fn next(&mut self) -> Option<&TimelineFrame> {
        if self.frames.is_empty() {
            return None;
        }

        let next = (self.current_index + 1) % self.frames.len();
        if next == 0 {
            if self.is_playing {
                debug!("Timeline wrapped, playback stopped");
            }
            self.is_playing = false;
        }
        self.current_index = next;
        self.current_frame()
    }

    /// Frame précédente (boucle vers la fin), sans toucher à la lecture
    pub fn previous(&mut self) -> Option<&TimelineFrame> {
        if self.frames.is_empty() {
            return None;
        }

        let len = self.frames.len();
        self.current_index = (self.current_index + len - 1) % len;
        self.current_frame()
    }

    /// Positionne le curseur
    ///
    /// Ne met pas la lecture en pause : un scrubbing manuel doit aussi
    /// appeler `pause()`.
    ///
    /// # Errors
    ///
    /// `CoreError::IndexOutOfRange` si `index` n'existe pas.
    pub fn seek(&mut self, index: usize) -> Result<&TimelineFrame, CoreError> {
        if index >= self.frames.len() {
            return Err(CoreError::index_out_of_range(index, self.frames.len()));
        }
        self.current_index = index;
        Ok(&self.frames[index])
    }

    pub fn current_frame(&self) -> Option<&TimelineFrame> {
        self.frames.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn frames(&self) -> &[TimelineFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Navigation possible (au moins 2 frames)
    pub fn can_navigate(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change la vitesse de lecture (bornée par [`MIN_INTERVAL`])
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(MIN_INTERVAL);
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            current: self.current_frame().cloned(),
            current_index: self.current_index,
            frame_count: self.frames.len(),
            is_playing: self.is_playing,
            interval_ms: self.interval.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<TimelineFrame> {
        (0..n)
            .map(|i| {
                TimelineFrame::new(
                    format!("2024-12-{:02}", i + 1),
                    0.1 * i as f64,
                    format!("https://tiles/{i}/{{z}}/{{x}}/{{y}}"),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_timeline() {
        let mut tl = TimelineController::new();
        tl.load(Vec::new());
        assert!(tl.current_frame().is_none());
        assert!(tl.next().is_none());
        assert!(tl.previous().is_none());
        assert!(!tl.play());
        assert!(!tl.can_navigate());
        assert_eq!(tl.snapshot().label(), None);
    }

    #[test]
    fn test_next_wraps_and_stops() {
        let mut tl = TimelineController::new();
        tl.load(frames(3));
        assert!(tl.play());

        tl.next();
        assert_eq!((tl.current_index(), tl.is_playing()), (1, true));
        tl.next();
        assert_eq!((tl.current_index(), tl.is_playing()), (2, true));
        tl.next();
        assert_eq!((tl.current_index(), tl.is_playing()), (0, false));
    }

    #[test]
    fn test_previous_wraps_without_pausing() {
        let mut tl = TimelineController::new();
        tl.load(frames(3));
        tl.play();
        let frame = tl.previous().cloned().unwrap();
        assert_eq!(tl.current_index(), 2);
        assert_eq!(frame.date, "2024-12-03");
        assert!(tl.is_playing());
    }

    #[test]
    fn test_seek_bounds() {
        let mut tl = TimelineController::new();
        tl.load(frames(3));
        assert_eq!(tl.seek(2).unwrap().date, "2024-12-03");
        assert_eq!(
            tl.seek(3),
            Err(CoreError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(tl.current_index(), 2);
    }

    #[test]
    fn test_load_resets_state() {
        let mut tl = TimelineController::new();
        tl.load(frames(4));
        tl.seek(3).unwrap();
        tl.play();

        tl.load(frames(2));
        assert_eq!(tl.current_index(), 0);
        assert!(!tl.is_playing());
    }

    #[test]
    fn test_single_frame_never_plays() {
        let mut tl = TimelineController::new();
        tl.load(frames(1));
        assert!(!tl.play());
        assert!(!tl.toggle_playback());
        assert!(!tl.is_playing());
    }

    #[test]
    fn test_interval_is_clamped() {
        let mut tl = TimelineController::with_interval(Duration::ZERO);
        assert_eq!(tl.interval(), MIN_INTERVAL);
        tl.set_interval(Duration::from_millis(250));
        assert_eq!(tl.snapshot().interval_ms, 250);
    }

    #[test]
    fn test_snapshot_label() {
        let mut tl = TimelineController::new();
        tl.load(frames(5));
        tl.seek(1).unwrap();
        assert_eq!(tl.snapshot().label().as_deref(), Some("Frame 2 of 5"));
    }
}
