use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub openai: OpenAiConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Directory where uploaded audiobooks are stored and served from.
    pub uploads_path: String,

    /// Upper bound for uploaded file bodies, in megabytes.
    pub max_upload_mb: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Context extraction settings for the scheduler.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    /// Total transcription window in seconds (half before, half after the
    /// playback position). Also the periodic tick interval and the debounce
    /// interval.
    pub window_secs: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "audiobook-assistant")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 3000)?
            .set_default("audio.uploads_path", "public/uploads")?
            .set_default("audio.max_upload_mb", 512)?
            .set_default("openai.api_base", "https://api.openai.com/v1")?
            .set_default("openai.chat_model", "gpt-4")?
            .set_default("openai.transcription_model", "whisper-1")?
            .set_default("openai.temperature", 0.7)?
            .set_default("openai.max_tokens", 150)?
            .set_default("context.window_secs", 30)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("AUDIOBOOK").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
