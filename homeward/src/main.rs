use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use homeward::cli::cli::Args;
use homeward::config::app_config::AppConfig;
use homeward::core::reconciler::MapStateReconciler;
use homeward::core::session::MapSession;
use homeward::data::home_store::JsonFileHomeStore;
use homeward::data::location::{self, LocationSource, ReplayLocationSource};
use homeward::models::route::RouteFailure;
use homeward::render::map_view::ConsoleMapView;
use homeward::services::directions::OpenRouteServiceClient;
use homeward::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())
        .context("failed to set up tracing subscriber")?;

    let mut config = match args.config() {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(base_url) = args.base_url() {
        config.directions.base_url = base_url.to_string();
    }
    if let Some(home_file) = args.home_file() {
        config.home_store_path = Some(home_file.to_path_buf());
    }
    config = config.with_env_overrides();
    if let Some(api_key) = args.api_key() {
        config.directions.api_key = api_key.to_string();
    }

    println!("Homeward route replay");
    println!("Track: {}, home store: {}, pacing: {}",
             args.track().display(),
             config.home_store_path().display(),
             if args.no_pacing() { "disabled" } else { "enabled" });

    let points = location::load_track(args.track())
        .with_context(|| format!("failed to load track {}", args.track().display()))?;
    let mut source = ReplayLocationSource::new(points);
    if args.no_pacing() {
        source = source.unpaced();
    }
    info!(points = source.len(), "Loaded track");

    let client = OpenRouteServiceClient::new(&config.directions)
        .context("failed to build directions client")?;
    info!(endpoint = client.endpoint(), "Directions client ready");

    let store = JsonFileHomeStore::new(config.home_store_path());
    let reconciler = MapStateReconciler::with_close_zoom(store, ConsoleMapView::new(), config.map.close_zoom);
    let (handle, session) = MapSession::new(reconciler, Arc::new(client));

    if args.delete_home() {
        handle.delete_home().await;
    }
    if let Some(home) = args.select_home() {
        handle.enable_select_mode().await;
        handle.long_press(home).await;
    }

    let subscription = source.subscribe(config.location);
    let state = session.run(subscription).await;
    drop(handle);

    println!("\nFinal state");
    println!("  current: {}", state.current().map(|c| c.to_string()).unwrap_or_else(|| "none".into()));
    println!("  home:    {}", state.home().map(|c| c.to_string()).unwrap_or_else(|| "none".into()));
    match state.route() {
        Some(Ok(path)) => println!("  route:   {} points", path.len()),
        Some(Err(failure)) => println!("  route:   failed ({})", describe(failure)),
        None => println!("  route:   none"),
    }

    logging::print_timing_report();
    Ok(())
}

fn describe(failure: &RouteFailure) -> String {
    format!("{}; {}", failure.user_message(), failure)
}
