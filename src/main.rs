use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foodgram_sdk::{
    actions::create_ingredients, routes, schema::NewIngredient, AppState, Config, SharedState,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, EnvFilter};
use warp::Filter;

#[derive(Parser)]
#[command(name = "foodgram")]
#[command(version, about = "Recipe sharing backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Load ingredients from a JSON fixture of `{"name", "measurement_unit"}` objects
    LoadIngredients {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    let state = connect(config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state).await,
        Commands::LoadIngredients { path } => load_ingredients(&path, &state).await,
    }
}

async fn connect(config: Config) -> Result<SharedState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(AppState::new(pool, config))
}

async fn serve(state: SharedState) -> Result<()> {
    let address = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let media = warp::path("media").and(warp::fs::dir(state.storage.root().clone()));

    // The api filter recovers every rejection, so media goes first.
    let app = media
        .or(routes::api(state.clone()))
        .with(warp::log("foodgram::api"));

    let (address, server) = warp::serve(app)
        .try_bind_with_graceful_shutdown(address, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .with_context(|| format!("Failed to bind {address}"))?;

    log::info!("Server running on {address}");
    server.await;
    log::info!("Server shutting down");
    Ok(())
}

async fn load_ingredients(path: &PathBuf, state: &SharedState) -> Result<()> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let ingredients: Vec<NewIngredient> =
        serde_json::from_str(&data).context("Invalid ingredient fixture")?;

    let inserted = create_ingredients(&ingredients, &state.pool).await?;
    log::info!(
        "Loaded {inserted} new ingredients ({} in fixture)",
        ingredients.len()
    );
    Ok(())
}
