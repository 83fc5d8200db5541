use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nightmode_execution::{Engine, Memory, State};
use nightmode_simulator::{SimulatorConfig, SqliteState, ValidatedConfig};
use nightmode_types::{PlayerId, PlayerProfile, TapBatch};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file).
    ///
    /// When neither sets it, players live in memory and are gone once the command exits.
    #[arg(long)]
    database_path: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    max_taps_per_second: Option<u32>,

    #[arg(long)]
    daily_bonus_per_level: Option<u64>,

    /// Upper bound on each engine operation in milliseconds.
    #[arg(long)]
    request_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or refresh a player from login identity.
    Upsert {
        platform_id: u64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Show a player's state.
    State { platform_id: u64 },
    /// Submit a batch of taps (1-50).
    Tap {
        platform_id: u64,
        #[arg(long, default_value_t = 1)]
        taps: u32,
    },
    DailyBonus { platform_id: u64 },
    /// Apply the referral bonus from `referrer` to the player.
    Refer {
        platform_id: u64,
        #[arg(long)]
        referrer: u64,
    },
    Lottery { platform_id: u64 },
    Leaderboard {
        #[arg(long)]
        limit: Option<usize>,
    },
    LotteryEntries,
}

fn build_config(args: &Args) -> Result<ValidatedConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config file {}", path.display()))?;
            SimulatorConfig::from_yaml(&contents).context("Could not parse config file")?
        }
        None => SimulatorConfig::default(),
    };

    if let Some(path) = &args.database_path {
        config.database_path = Some(path.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(cap) = args.max_taps_per_second {
        config.progression.max_taps_per_second = cap;
    }
    if let Some(bonus) = args.daily_bonus_per_level {
        config.progression.daily_bonus_per_level = bonus;
    }
    if let Some(timeout_ms) = args.request_timeout_ms {
        config.progression.request_timeout_ms = Some(timeout_ms);
    }

    Ok(config.validate()?)
}

fn init_tracing(level: Level) -> Result<()> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .and_then(|value| {
            let trimmed = value.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        });

    if let Some(endpoint) = endpoint {
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "nightmode".to_string());
        let rate = std::env::var("OTEL_SAMPLING_RATE")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .map(|value| value.clamp(0.0, 1.0))
            .unwrap_or(1.0);
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()
            .context("failed to build OTLP exporter")?;
        let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(rate))
            .with_resource(
                opentelemetry_sdk::Resource::builder_empty()
                    .with_attributes([opentelemetry::KeyValue::new("service.name", service_name)])
                    .build(),
            )
            .with_batch_exporter(exporter)
            .build();
        let tracer = tracer_provider.tracer("nightmode");
        opentelemetry::global::set_tracer_provider(tracer_provider);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(LevelFilter::from_level(level)),
            )
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
    } else {
        // Logs go to stderr so stdout carries only the JSON result.
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(level)
            .init();
    }

    Ok(())
}

async fn run<S: State>(engine: &Engine<S>, command: &Command) -> Result<serde_json::Value> {
    let value = match command {
        Command::Upsert {
            platform_id,
            username,
            first_name,
            last_name,
        } => {
            let profile = PlayerProfile {
                platform_id: *platform_id,
                username: username.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
            };
            serde_json::to_value(engine.upsert_player(profile).await?)?
        }
        Command::State { platform_id } => {
            let id = PlayerId::from_platform_id(*platform_id);
            serde_json::to_value(engine.get_state(&id).await?)?
        }
        Command::Tap { platform_id, taps } => {
            let id = PlayerId::from_platform_id(*platform_id);
            let batch = TapBatch::new(*taps)?;
            serde_json::to_value(engine.record_taps(&id, batch).await?)?
        }
        Command::DailyBonus { platform_id } => {
            let id = PlayerId::from_platform_id(*platform_id);
            serde_json::to_value(engine.claim_daily_bonus(&id).await?)?
        }
        Command::Refer {
            platform_id,
            referrer,
        } => {
            let id = PlayerId::from_platform_id(*platform_id);
            serde_json::to_value(engine.apply_referral(&id, *referrer).await?)?
        }
        Command::Lottery { platform_id } => {
            let id = PlayerId::from_platform_id(*platform_id);
            serde_json::to_value(engine.enter_lottery(&id).await?)?
        }
        Command::Leaderboard { limit } => {
            serde_json::to_value(engine.top_by_points(*limit).await?)?
        }
        Command::LotteryEntries => serde_json::to_value(engine.lottery_entries().await?)?,
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();
    let config = build_config(&args)?;

    // Create logger
    init_tracing(config.log_level)?;

    let output = match &config.database_path {
        Some(path) => {
            let state = SqliteState::open(path)
                .with_context(|| format!("open database {}", path.display()))?;
            info!(path = %path.display(), "using sqlite state");
            let engine = Engine::new(state, config.progression.clone());
            run(&engine, &args.command).await?
        }
        None => {
            warn!("no database_path set, state is discarded when this command exits");
            let engine = Engine::new(Memory::new(), config.progression.clone());
            run(&engine, &args.command).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
