use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use granja::{
    alerts::{catalog, summarize, AlertFeed, AlertFilter, ProducerSize, Severity, Tab, UserProfile},
    config::AppConfig,
    entities::CropForm,
    farm::Farm,
    forms::Validate,
    layout::LayoutLoader,
    risk::{RiskModelKind, RiskScorer, RiskThresholds},
    web::{self, WebServerConfig},
    FarmStats,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Virtual farm planner for Andean smallholders")]
struct Cli {
    /// Path to the YAML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the dashboard and JSON API
    Serve {
        /// Override the listen host
        #[arg(long)]
        host: Option<String>,

        /// Override the listen port
        #[arg(long)]
        port: Option<u16>,

        /// Layout YAML to start from instead of an empty farm
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Score a crop form file
    Risk {
        /// Crop form YAML or JSON file
        #[arg(long)]
        form: PathBuf,

        /// Risk model (seasonal or site); defaults to the configured one
        #[arg(long)]
        model: Option<RiskModelKind>,
    },
    /// List alerts ranked for a profile
    Alerts {
        /// Profile YAML file with location, crops and producer_size
        #[arg(long)]
        profile: Option<PathBuf>,

        /// all, for_you, web, or a category
        #[arg(long, default_value = "all")]
        tab: String,

        #[arg(long)]
        severity: Option<Severity>,

        /// Free-text search over title and description
        #[arg(long)]
        search: Option<String>,

        /// Include results from the simulated web search
        #[arg(long)]
        web: bool,

        /// Hide inactive and expired alerts
        #[arg(long)]
        current: bool,
    },
    /// Print statistics for a layout
    Stats {
        #[arg(long)]
        layout: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    location: String,
    #[serde(default)]
    crops: Vec<String>,
    #[serde(default)]
    producer_size: ProducerSize,
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("granja={default_level},warn").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_yaml(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging.level);

    match cli.command {
        Command::Serve { host, port, layout } => serve(config, host, port, layout).await,
        Command::Risk { form, model } => score_form(&config, &form, model),
        Command::Alerts {
            profile,
            tab,
            severity,
            search,
            web,
            current,
        } => {
            let filter = AlertFilter {
                tab: tab.parse::<Tab>().map_err(anyhow::Error::msg)?,
                severity,
                location: None,
                query: search,
                current_at: current.then(Utc::now),
            };
            list_alerts(&config, profile.as_deref(), filter, web).await
        }
        Command::Stats { layout } => {
            let farm = load_layout(&config, &layout)?;
            print_stats(&farm.stats());
            Ok(())
        }
    }
}

fn load_layout(config: &AppConfig, path: &Path) -> Result<Farm> {
    let layout = LayoutLoader::new(".").load(path)?;
    let farm = layout
        .build_farm(config)
        .with_context(|| format!("Layout '{}' has an invalid placement", layout.name))?;
    Ok(farm)
}

async fn serve(
    config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    layout: Option<PathBuf>,
) -> Result<()> {
    let farm = match layout {
        Some(path) => load_layout(&config, &path)?,
        None => Farm::from_config(&config)?,
    };
    let alerts = AlertFeed::builtin()?;
    info!(
        rows = farm.grid().rows(),
        cols = farm.grid().cols(),
        model = farm.scorer().model_name(),
        alerts = alerts.len(),
        "starting server"
    );
    web::run(WebServerConfig {
        farm,
        alerts,
        web_search_delay: Duration::from_millis(config.alerts.web_search_delay_ms),
        host: host.unwrap_or(config.server.host),
        port: port.unwrap_or(config.server.port),
    })
    .await
}

fn score_form(config: &AppConfig, path: &Path, model: Option<RiskModelKind>) -> Result<()> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read crop form {}", path.display()))?;
    let form: CropForm = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    for error in form.validate() {
        warn!(field = %error.field, "{}", error.message);
    }

    let scorer = RiskScorer::new(
        model.unwrap_or(config.risk.model).build(),
        RiskThresholds {
            low_below: config.risk.low_below,
            medium_below: config.risk.medium_below,
        },
    );
    let assessment = scorer.assess(&form);
    println!(
        "{} ({}): climate risk {}/100, {} [model: {}]",
        if form.name.is_empty() { "unnamed crop" } else { form.name.as_str() },
        form.crop_type,
        assessment.score,
        assessment.level,
        assessment.model
    );
    if assessment.critical {
        println!("critical climate risk: review water source and irrigation");
    }
    Ok(())
}

async fn list_alerts(
    config: &AppConfig,
    profile_path: Option<&Path>,
    filter: AlertFilter,
    include_web: bool,
) -> Result<()> {
    let profile = match profile_path {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read profile {}", path.display()))?;
            let file: ProfileFile = serde_yaml::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            UserProfile::configure(&file.location, file.crops, file.producer_size)?
        }
        None => UserProfile::default(),
    };

    let mut feed = AlertFeed::builtin()?;
    if include_web {
        let delay = Duration::from_millis(config.alerts.web_search_delay_ms);
        feed.set_web_results(catalog::web_search(&profile, delay).await?);
    }

    let ranked = feed.personalized(&profile);
    let summary = summarize(&ranked);
    println!(
        "{} critical | {} for you | {} from web",
        summary.critical, summary.for_you, summary.web
    );
    for scored in filter.apply(ranked) {
        let alert = &scored.alert;
        println!(
            "[{:>3}] {:<13} {} ({})",
            scored.relevance,
            alert.severity.to_string(),
            alert.title,
            alert.location
        );
    }
    Ok(())
}

fn print_stats(stats: &FarmStats) {
    let counts = &stats.counts;
    println!(
        "crops {} | suppliers {} | customers {} | workers {} | warehouses {} | reservoirs {}",
        counts.crops,
        counts.suppliers,
        counts.customers,
        counts.workers,
        counts.warehouses,
        counts.reservoirs
    );
    println!("cultivated area: {:.2} ha", stats.cultivated_area_ha);
    println!(
        "purchases: {:.0} kg worth {:.2}",
        stats.purchase_volume_kg, stats.purchase_value
    );
    println!("storage capacity: {:.1}", stats.storage_capacity);
    println!(
        "water: {:.0} of {:.0} L stored",
        stats.stored_water_liters, stats.water_capacity_liters
    );
    println!(
        "occupancy: {}/{} cells ({}%)",
        stats.occupied,
        stats.occupied + stats.empty,
        stats.occupancy_pct
    );
    match stats.mean_climate_risk {
        Some(mean) => println!(
            "mean climate risk: {:.1} ({} critical)",
            mean, stats.critical_crops
        ),
        None => println!("mean climate risk: n/a"),
    }
}
