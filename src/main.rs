use anyhow::{Context, Result};
use clap::Parser;
use serene_voice::policy::{ResponsePolicy, SeededDice};
use serene_voice::transcript::SpeechFeed;
use serene_voice::{
    create_router, AppState, Config, HttpSessionService, LineSpeechSource, Orchestrator,
    OrchestratorDeps, PersonaCatalog, PushSpeechSource, SoundCatalog, SpeechSource, WavFileSink,
    WebSocketTransport,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "serene-voice", version, about = "Voice-guided therapy session client")]
struct Cli {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/serene-voice")]
    config: String,

    /// Seed for the meditation suggestion dice (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Read finalized utterances from stdin instead of POST /session/transcript
    #[arg(long)]
    stdin: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Serene Voice v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Session service: {}", cfg.backend.base_url);

    let service = HttpSessionService::new(&cfg.backend.base_url, cfg.request_timeout())
        .context("Failed to build session service client")?;

    let sink = WavFileSink::new(&cfg.audio.output_dir, cfg.audio.realtime)?;
    info!("Writing clips to {}", cfg.audio.output_dir.display());

    let dice = match cli.seed.or(cfg.policy.seed) {
        Some(seed) => {
            info!("Suggestion dice seeded with {}", seed);
            SeededDice::from_seed(seed)
        }
        None => SeededDice::from_entropy(),
    };
    let mut policy = ResponsePolicy::heuristic(Box::new(dice))
        .with_probability(cfg.policy.suggestion_probability);
    if let Some(keywords) = cfg.policy.keywords.clone() {
        policy = policy.with_keywords(keywords);
    }

    let (speech, speech_feed): (Box<dyn SpeechSource>, Option<SpeechFeed>) = if cli.stdin {
        info!("Speech input: stdin lines");
        (Box::new(LineSpeechSource::new()), None)
    } else {
        info!("Speech input: POST /session/transcript");
        let source = PushSpeechSource::new();
        let feed = source.feed();
        (Box::new(source), Some(feed))
    };

    let personas = PersonaCatalog::default();
    let sounds = SoundCatalog::default();

    let deps = OrchestratorDeps {
        service: Arc::new(service),
        transport: Arc::new(WebSocketTransport),
        speech,
        sink: Arc::new(sink),
        policy,
    };
    let orchestrator =
        Orchestrator::new(deps, cfg.session_config()).with_catalogs(personas.clone(), sounds.clone());
    let (handle, orchestrator_task) = orchestrator.spawn();

    let app = create_router(AppState::new(handle, speech_feed, personas, sounds));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    // Dropping the router released every handle; the loop tears down and exits
    orchestrator_task.await?;

    Ok(())
}
