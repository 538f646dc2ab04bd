//! Définition et implémentation des commandes CLI
//!
//! - `analyze`: polygone → NDVI, météo, occupation du sol
//! - `auth-status`: état de l'authentification du backend
//! - `chat`: question à l'assistant sur une région

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use ndvi_core::{DrawEvent, HeadlessSurface, LatLng};
use ndvi_explorer::api::{AnalysisBackend, AnalysisClient, SatelliteSource};
use ndvi_explorer::chat::{ChatClient, Conversation, Role};
use ndvi_explorer::report::{format_frame, AnalysisReport};
use ndvi_explorer::session::{AnalysisSession, FetchStatus};
use ndvi_explorer::ExplorerConfig;

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze NDVI, weather and land cover for a polygon
    Analyze {
        #[command(flatten)]
        polygon: PolygonArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Play the NDVI timeline in the terminal once loaded
        #[arg(long)]
        play: bool,

        /// Playback interval in milliseconds (défaut : env NDVI_PLAYBACK_MS / 1000)
        #[arg(long)]
        interval: Option<u64>,

        /// Write the analysis report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check the analysis backend authentication status
    AuthStatus {
        /// Analysis API base URL (défaut : env NDVI_API_URL)
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Ask the assistant a question about a region
    Chat {
        /// Question to ask
        message: String,

        #[command(flatten)]
        polygon: PolygonArgs,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Chat relay URL (défaut : env NDVI_CHAT_URL)
        #[arg(long)]
        chat_url: Option<String>,
    },
}

/// Source du polygone
#[derive(Args, Debug, Clone)]
pub struct PolygonArgs {
    /// GeoJSON file (Polygon geometry, Feature or FeatureCollection)
    #[arg(long, conflicts_with = "coords")]
    pub polygon: Option<PathBuf>,

    /// Vertices as "lat,lng;lat,lng;..."
    #[arg(long)]
    pub coords: Option<String>,
}

/// Paramètres de la requête d'analyse
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// JSON config file (défaut : variables d'environnement)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Analysis API base URL (défaut : env NDVI_API_URL / http://127.0.0.1:8000)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Satellite source: sentinel-2, landsat-8, landsat-9
    #[arg(long)]
    pub satellite: Option<SatelliteSource>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Skip the per-date time series
    #[arg(long)]
    pub no_time_series: bool,

    /// Skip weather data
    #[arg(long)]
    pub no_weather: bool,

    /// Include topography (elevation, slope, aspect)
    #[arg(long)]
    pub topography: bool,

    /// Skip land cover classification
    #[arg(long)]
    pub no_landcover: bool,
}

impl AnalysisArgs {
    /// Configuration : fichier ou environnement, puis options CLI
    pub fn resolve(&self) -> Result<ExplorerConfig> {
        let mut config = match &self.config {
            Some(path) => ExplorerConfig::load(path)?,
            None => ExplorerConfig::from_env(),
        };

        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(satellite) = self.satellite {
            config = config.with_satellite(satellite);
        }
        if let Some(start) = &self.start {
            config.analysis.start_date = start.clone();
        }
        if let Some(end) = &self.end {
            config.analysis.end_date = end.clone();
        }
        config.analysis.time_series &= !self.no_time_series;
        config.analysis.include_weather &= !self.no_weather;
        config.analysis.include_topography |= self.topography;
        config.analysis.include_landcover &= !self.no_landcover;

        config.validate()?;
        Ok(config)
    }
}

/// Sommets `lat,lng;lat,lng;...`
pub fn parse_coords(raw: &str) -> Result<Vec<LatLng>> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<LatLng> {
            let (lat, lng) = pair
                .split_once(',')
                .with_context(|| format!("Invalid vertex '{}': expected lat,lng", pair))?;
            let lat: f64 = lat
                .trim()
                .parse()
                .with_context(|| format!("Invalid latitude in '{}'", pair))?;
            let lng: f64 = lng
                .trim()
                .parse()
                .with_context(|| format!("Invalid longitude in '{}'", pair))?;
            Ok(LatLng::new(lat, lng))
        })
        .collect()
}

/// Premier polygone d'un fichier GeoJSON, en (lat, lng), sans sommet de
/// fermeture
pub fn load_polygon(path: &Path) -> Result<Vec<LatLng>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read polygon file: {}", path.display()))?;
    let geojson = geojson::GeoJson::from_str(&content).context("Failed to parse GeoJSON")?;

    let geometry = match geojson {
        geojson::GeoJson::Geometry(g) => Some(g),
        geojson::GeoJson::Feature(f) => f.geometry,
        geojson::GeoJson::FeatureCollection(fc) => {
            fc.features.into_iter().find_map(|f| f.geometry)
        }
    };

    let ring = match geometry.map(|g| g.value) {
        Some(geojson::Value::Polygon(rings)) => rings.into_iter().next(),
        Some(geojson::Value::MultiPolygon(polys)) => {
            polys.into_iter().next().and_then(|rings| rings.into_iter().next())
        }
        _ => None,
    }
    .context("GeoJSON contains no polygon")?;

    let mut vertices: Vec<LatLng> = ring
        .iter()
        .filter(|pos| pos.len() >= 2)
        .map(|pos| LatLng::new(pos[1], pos[0]))
        .collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    Ok(vertices)
}

impl PolygonArgs {
    pub fn is_set(&self) -> bool {
        self.polygon.is_some() || self.coords.is_some()
    }

    pub fn vertices(&self) -> Result<Vec<LatLng>> {
        match (&self.polygon, &self.coords) {
            (Some(path), _) => load_polygon(path),
            (None, Some(coords)) => parse_coords(coords),
            (None, None) => {
                anyhow::bail!("A polygon is required: use --polygon <file> or --coords")
            }
        }
    }
}

/// Dessine, confirme et attend le résultat de l'analyse
async fn analyze_region(
    vertices: Vec<LatLng>,
    config: &ExplorerConfig,
) -> Result<(AnalysisSession<HeadlessSurface>, AnalysisReport)> {
    let client: Arc<dyn AnalysisBackend> = Arc::new(AnalysisClient::from_config(config)?);
    let session = AnalysisSession::from_config(HeadlessSurface::new(), client, config);

    session.handle_draw_event(DrawEvent::DrawStart);
    session.handle_draw_event(DrawEvent::Created(vertices.clone()));
    let Some(region) = session.pending_region() else {
        anyhow::bail!(
            "Invalid polygon: {} vertices, at least 3 required",
            vertices.len()
        );
    };

    info!(
        name = %region.name,
        vertices = region.coordinates.len(),
        api = %config.api_url,
        "Analyzing region"
    );
    let start = Instant::now();
    let request = session.confirm()?;
    let status = session.wait_for_fetch(request).await;

    let mut report = AnalysisReport::new(&region);
    match &status {
        FetchStatus::Ready { .. } => {
            if let Some(response) = session.response() {
                report.record_response(&response, &session.frames());
            }
        }
        FetchStatus::Failed { message, .. } => report.record_failure(message),
        other => warn!(status = ?other, "Unexpected analysis status"),
    }
    report.set_duration(start.elapsed());
    report.finalize();

    Ok((session, report))
}

/// Exécute la commande analyze
pub async fn cmd_analyze(
    polygon: &PolygonArgs,
    analysis: &AnalysisArgs,
    play: bool,
    interval: Option<u64>,
    report_path: Option<&Path>,
) -> Result<()> {
    let mut config = analysis.resolve()?;
    if let Some(ms) = interval {
        config.playback_ms = ms;
    }

    let (session, report) = analyze_region(polygon.vertices()?, &config).await?;
    report.display();

    if play {
        play_timeline(&session).await?;
    }

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .context(format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    session.shutdown();
    info!("{}", report.summary());
    Ok(())
}

/// Joue la timeline une fois, frame par frame (Ctrl-C pour arrêter)
async fn play_timeline(session: &AnalysisSession<HeadlessSurface>) -> Result<()> {
    let mut timeline = session.subscribe_timeline();
    if !session.play() {
        warn!(frames = session.timeline().frame_count, "Not enough frames to play");
        return Ok(());
    }

    println!("\n--- TIMELINE ---");
    loop {
        let snapshot = timeline.borrow_and_update().clone();
        if !snapshot.is_playing {
            break;
        }
        if let (Some(frame), Some(label)) = (&snapshot.current, snapshot.label()) {
            println!("[{}] {}", label, format_frame(frame));
        }

        tokio::select! {
            changed = timeline.changed() => changed.context("Timeline closed")?,
            _ = tokio::signal::ctrl_c() => {
                session.pause();
                break;
            }
        }
    }
    Ok(())
}

/// Exécute la commande auth-status
pub async fn cmd_auth_status(api_url: Option<String>) -> Result<()> {
    let mut config = ExplorerConfig::from_env();
    if let Some(url) = api_url {
        config.api_url = url;
    }

    let client = AnalysisClient::new(&config.api_url, Duration::from_secs(10))?;
    let status = client.auth_status().await;

    println!(
        "{}: {}",
        if status.authenticated { "Authenticated" } else { "Not authenticated" },
        status.message
    );
    for line in status.instructions.iter().flatten() {
        println!("  - {}", line);
    }
    Ok(())
}

/// Exécute la commande chat
pub async fn cmd_chat(
    message: &str,
    polygon: &PolygonArgs,
    analysis: &AnalysisArgs,
    chat_url: Option<String>,
) -> Result<()> {
    let mut config = analysis.resolve()?;
    if let Some(url) = chat_url {
        config.chat_url = url;
    }

    let session = if polygon.is_set() {
        Some(analyze_region(polygon.vertices()?, &config).await?.0)
    } else {
        info!("Chatting without a region");
        None
    };
    let context = session
        .as_ref()
        .map(|s| s.chat_context())
        .unwrap_or_default();

    let relay = Arc::new(ChatClient::new(&config.chat_url, config.timeout())?);
    let mut conversation = Conversation::new(relay);
    conversation.send(message, &context).await;

    for msg in conversation.messages() {
        let who = match msg.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("{:>9}: {}", who, msg.content);
    }

    if let Some(session) = session {
        session.shutdown();
    }
    Ok(())
}
