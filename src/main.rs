use anyhow::Context;
use clap::Parser;
use locus_finder::{
    sdk::config::ServiceConfig,
    sdk::locus::{suggest_once, FitOptions, LocusError},
    sdk::util::log::{init_logging, level_for},
    ConstraintDraft, ConstraintStore, MapView, RemoteLocusService, ResultOrchestrator,
};
use std::{fs::File, io::Write};

/// Finds the area reachable from every given address within its time budget
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// A constraint as "ADDRESS;MODE;TIME;UNCERTAINTY", e.g. "Rennes;driving;30;5".
    /// Repeat for every constraint.
    #[arg(short, long = "constraint")]
    constraints: Vec<ConstraintDraft>,

    /// Print address suggestions for this text instead of computing a locus
    #[arg(short, long)]
    suggest: Option<String>,

    /// Base URL of the locus service (overrides LOCUS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Map width in pixels, used to fit the viewport
    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    /// Map height in pixels, used to fit the viewport
    #[arg(long, default_value_t = 768.0)]
    height: f64,

    /// Where to write the resulting map view
    #[arg(short, long, default_value = "locus_view.json")]
    output: String,

    /// Log requests and state transitions
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(level_for(cli.verbose));

    let mut config = ServiceConfig::from_env().context("Failed to read service configuration")?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url);
    }
    let service = RemoteLocusService::new(&config).context("Failed to build HTTP client")?;
    log::info!("Using locus service at {}", service.base_url());

    if let Some(query) = &cli.suggest {
        let candidates = suggest_once(&service, query).await;
        log::info!("{} suggestion(s) for \"{}\"", candidates.len(), query);
        for candidate in &candidates {
            println!("{}", candidate.display_name);
        }
        return Ok(());
    }

    let store = ConstraintStore::new();
    for mut draft in cli.constraints {
        match draft.take() {
            Ok(constraint) => {
                store.append(constraint);
            }
            Err(LocusError::EmptyAddress) => log::warn!("Skipping constraint without an address"),
            Err(e) => return Err(e).context("Invalid constraint"),
        }
    }

    let orchestrator = ResultOrchestrator::new(service, store.clone());
    orchestrator.run_until_settled().await;

    let state = orchestrator.state();
    if let Some(error) = &state.error {
        log::error!("{}", error);
        for detail in &state.error_details {
            log::error!("  {}", detail);
        }
    }

    let view = MapView::derive(
        &store.snapshot(),
        &state,
        (cli.width, cli.height),
        &FitOptions::default(),
    );
    log::info!(
        "{} region(s), {} of {} constraint(s) located",
        view.regions.len(),
        view.markers.len(),
        view.constraints.len()
    );
    if let Some(viewport) = &view.viewport {
        log::info!(
            "Viewport centered on ({:.5}, {:.5}) at zoom {}",
            viewport.center.0,
            viewport.center.1,
            viewport.zoom
        );
    }

    let json_output = serde_json::to_string_pretty(&view)?;
    let mut file = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output))?;
    file.write_all(json_output.as_bytes())?;
    log::info!("Map view written to {}", cli.output);

    Ok(())
}
