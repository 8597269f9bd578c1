use anyhow::{Context, Result};
use audiobook_assistant::session::SchedulerConfig;
use audiobook_assistant::transcribe::{TranscriptClient, Transcriber};
use audiobook_assistant::{create_router, AppState, AudiobookSession, ChatClient, Config};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "audiobook-assistant", version, about = "Audiobook player with a chat assistant")]
struct Args {
    /// Config file to load (extension optional, defaults apply if missing)
    #[arg(long, default_value = "config/audiobook-assistant")]
    config: String,

    /// Override the HTTP port from the config
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    let port = args.port.unwrap_or(cfg.service.http.port);

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; chat and transcription requests will fail");
    }

    let chat = Arc::new(ChatClient::new(&cfg.openai, api_key.clone()));
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(TranscriptClient::new(&cfg.openai, api_key));

    let session = AudiobookSession::new(
        chat,
        Arc::clone(&transcriber),
        SchedulerConfig {
            window: Duration::from_secs(cfg.context.window_secs),
            ..SchedulerConfig::default()
        },
    );

    let uploads_dir = std::path::PathBuf::from(&cfg.audio.uploads_path);
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .with_context(|| format!("Failed to create uploads directory {:?}", uploads_dir))?;

    let state = AppState {
        session,
        transcriber,
        uploads_dir,
        max_upload_bytes: (cfg.audio.max_upload_mb as usize) * 1024 * 1024,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
