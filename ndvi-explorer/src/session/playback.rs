//! Timer de lecture automatique

use std::sync::{Mutex, Weak};
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use ndvi_core::MapSurface;

use super::{lock, Shared};

/// Avance la timeline toutes les `period` tant que la génération est active
///
/// La boucle s'arrête seule quand la lecture s'arrête (pause, fin de
/// boucle), quand une nouvelle génération la remplace ou quand la session
/// disparaît.
pub(super) async fn run<S>(shared: Weak<Mutex<Shared<S>>>, generation: u64, period: Duration)
where
    S: MapSurface + Send + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let mut guard = lock(&shared);
        if guard.disposed
            || guard.autoplay_generation != generation
            || !guard.timeline.is_playing()
        {
            break;
        }

        guard.timeline.next();
        guard.publish_timeline();

        if !guard.timeline.is_playing() {
            debug!(generation, "Autoplay finished");
            guard.autoplay = None;
            break;
        }
    }
}
