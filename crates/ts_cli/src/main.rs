use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ts_core::types::{NewsCategory, NewsCountry, ScriptTone, DEFAULT_TREND_LIMIT};
use ts_core::{Config, TrendQuery, Voice};
use ts_pipeline::{AudioOptions, HttpStageClient, PipelineController, ScriptOptions};
use ts_web::{create_app, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn news trends into short-video scripts and voiceovers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address, overrides TRENDSPARK_ADDR
        #[arg(long)]
        addr: Option<String>,
    },
    /// Drive every stage against a running server
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Base URL of the API, defaults to the configured bind address
    #[arg(long)]
    api: Option<String>,

    /// Free-text search; when absent top headlines are used
    #[arg(long)]
    keywords: Option<String>,

    #[arg(long, default_value = "technology")]
    category: NewsCategory,

    #[arg(long, default_value = "us")]
    country: NewsCountry,

    #[arg(long, default_value_t = DEFAULT_TREND_LIMIT)]
    limit: u32,

    /// Which trend to work on, starting at 1
    #[arg(long, default_value_t = 1)]
    pick: usize,

    /// Target script length in seconds
    #[arg(long, default_value_t = 90)]
    duration: u32,

    #[arg(long, default_value = "informative")]
    tone: ScriptTone,

    /// Voice for the audio, defaults to TTS_DEFAULT_VOICE
    #[arg(long)]
    voice: Option<Voice>,

    #[arg(long)]
    model: Option<String>,

    /// Directory the audio file is written to
    #[arg(long, default_value = ".")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ts_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Serve { addr } => serve(config, addr).await,
        Commands::Run(args) => run(config, args).await,
    }
}

async fn serve(config: Config, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.addr.clone());
    let state = AppState::from_config(&config).context("Failed to build provider clients")?;

    let providers = state.providers;
    for (name, configured) in [
        ("NEWS_API_KEY", providers.news),
        ("GROQ_API_KEY", providers.chat),
        ("OPENAI_API_KEY", providers.speech),
    ] {
        if !configured {
            warn!("🔑 {} is not set, the matching stage will be unavailable", name);
        }
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Web server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .await
        .context("Server error")?;
    Ok(())
}

async fn run(config: Config, args: RunArgs) -> Result<()> {
    let api = args.api.unwrap_or_else(|| format!("http://{}", config.addr));
    let controller = PipelineController::new(HttpStageClient::new(&api)?);

    let query = match args.keywords {
        Some(keywords) => TrendQuery::keywords(keywords),
        None => TrendQuery::headlines(args.category, args.country),
    }
    .with_limit(args.limit);

    let trends = controller.load_trends(&query).await?;
    println!("{}", controller.status());
    for (i, item) in trends.iter().enumerate() {
        println!(
            "{:>3}. {} ({})",
            i + 1,
            item.title.as_deref().unwrap_or("untitled"),
            item.source.as_deref().unwrap_or("unknown source")
        );
    }

    let index = args.pick.checked_sub(1).context("--pick starts at 1")?;
    controller.select_trend(index)?;
    println!("{}", controller.status());

    controller.extract().await?;
    println!("{}", controller.status());

    let ideas = controller.generate_ideas().await?;
    println!("{}\n\n{}\n", controller.status(), ideas.text);

    let script_options = ScriptOptions {
        duration_secs: Some(args.duration),
        tone: Some(args.tone.to_string()),
    };
    let script = controller.write_script(&script_options).await?;
    println!("{}\n\n{}\n", controller.status(), script.text);

    let audio_options = AudioOptions {
        voice: args.voice.unwrap_or(config.speech.default_voice),
        model: args.model,
    };
    controller.generate_audio(&audio_options).await?;
    println!("{}", controller.status());

    let path = controller.save_audio(&args.output).await?;
    println!("🎧 {}", path.display());
    Ok(())
}
