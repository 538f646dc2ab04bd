//! Point d'entrée CLI pour ndvi-explorer

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Explorer l'indice de végétation NDVI d'une région
#[derive(Parser)]
#[command(name = "ndvi-explorer")]
#[command(author, version)]
#[command(about = "Analyse NDVI, météo et occupation du sol pour un polygone")]
#[command(long_about = "Envoie un polygone au backend d'analyse Earth Engine, charge la série temporelle NDVI et la rejoue dans le terminal.\n\nLa configuration vient des variables NDVI_* (ou d'un fichier .env), surchargées par les options.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze {
            polygon,
            analysis,
            play,
            interval,
            report,
        } => {
            info!(polygon = ?polygon.polygon, coords = ?polygon.coords, "Analyse NDVI");
            cli::cmd_analyze(&polygon, &analysis, play, interval, report.as_deref()).await?;
        }
        Commands::AuthStatus { api_url } => {
            cli::cmd_auth_status(api_url).await?;
        }
        Commands::Chat {
            message,
            polygon,
            analysis,
            chat_url,
        } => {
            cli::cmd_chat(&message, &polygon, &analysis, chat_url).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
