//! # ndvi-core
//!
//! Cœur de l'explorateur NDVI : sélection de région et lecture de la série
//! temporelle, sans I/O.
//!
//! ## Features
//!
//! - Machine à états du polygone sélectionné (dessin, confirmation, édition, suppression)
//! - Contrôleur de timeline (lecture, pause, pas à pas, scrubbing, boucle unique)
//! - Conversion GeoJSON et calcul de centre avec les types `geo`/`geojson`
//! - Carte abstraite derrière le trait [`MapSurface`]
//!
//! ## Usage
//!
//! ```rust
//! use ndvi_core::{HeadlessSurface, LatLng, RegionSelector};
//!
//! let mut selector = RegionSelector::new(HeadlessSurface::new());
//! selector.on_draw_complete(vec![
//!     LatLng::new(51.50, -0.10),
//!     LatLng::new(51.51, -0.10),
//!     LatLng::new(51.51, -0.08),
//! ]);
//! let region = selector.confirm()?;
//! assert_eq!(region.name, "Selected Region (51.5050, -0.0900)");
//! # Ok::<(), ndvi_core::CoreError>(())
//! ```

pub mod error;
pub mod geometry;
pub mod region;
pub mod surface;
pub mod timeline;
pub mod types;

pub use error::CoreError;
pub use region::{PendingRegion, RegionSelector, SelectionState};
pub use surface::{DrawEvent, HeadlessSurface, MapSurface, VisualId};
pub use timeline::{TimelineController, TimelineSnapshot};
pub use types::{region_name, LatLng, Region, TimelineFrame};
