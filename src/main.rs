//! Application entry point for text-to-podcast.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse CLI arguments and load [`Settings`] from disk (defaults on a
//!    missing file).
//! 3. Apply CLI/environment secret overrides (API key, storage token).
//! 4. Read the content record JSON.
//! 5. Warn if ffmpeg is not on `PATH` (multi-chunk runs need it).
//! 6. Build the Google TTS engine, the GCS store, and the [`Pipeline`].
//! 7. Run the pipeline and print the published object name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use text_to_podcast::{
    audio::ffmpeg_available,
    config::Settings,
    content::ContentRecord,
    pipeline::Pipeline,
    store::GcsStore,
    tts::GoogleTtsEngine,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "text-to-podcast",
    about = "Convert a saved article into a podcast episode",
    version
)]
struct Cli {
    /// Content record JSON file (sourceUrl + text + optional metadata)
    record: PathBuf,

    /// Settings file (TOML); defaults are used when the file is missing
    #[arg(
        long,
        short,
        env = "TEXT_TO_PODCAST_CONFIG",
        default_value = "text-to-podcast.toml"
    )]
    config: PathBuf,

    /// Google TTS API key; overrides the settings file when set
    #[arg(long, env = "TTS_API_KEY")]
    api_key: Option<String>,

    /// Object store bearer token; overrides the settings file when set
    #[arg(long, env = "STORAGE_TOKEN")]
    storage_token: Option<String>,

    /// Target storage bucket; overrides the settings file when set
    #[arg(long, env = "STORAGE_BUCKET")]
    bucket: Option<String>,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. CLI + configuration
    let cli = Cli::parse();
    log::info!("text-to-podcast starting up");

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;

    // 3. Secrets can come from flags or the environment instead of the file.
    if let Some(api_key) = cli.api_key {
        settings.synthesis.api_key = api_key;
    }
    if let Some(token) = cli.storage_token {
        settings.storage.token = token;
    }
    if let Some(bucket) = cli.bucket {
        settings.storage.bucket = bucket;
    }

    // 4. Input record
    let record = read_record(&cli.record)?;
    log::info!("loaded record for {}", record.source_url);

    // 5. ffmpeg is only needed past the single-chunk fast path, so its
    //    absence is a warning here and a hard error later if it matters.
    if !ffmpeg_available().await {
        log::warn!("ffmpeg not found on PATH; multi-chunk assembly will fail");
    }

    // 6. Pipeline wiring
    let pipeline = Pipeline::new(
        &settings,
        Arc::new(GoogleTtsEngine::from_config(&settings.synthesis)),
        Arc::new(GcsStore::from_config(&settings.storage)),
    );

    // 7. Run
    let published = pipeline.run(&record).await?;
    println!("{}", published.name);
    Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<ContentRecord> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading record from {}", path.display()))?;
    let record: ContentRecord = serde_json::from_str(&data)
        .with_context(|| format!("parsing record JSON from {}", path.display()))?;
    Ok(record)
}
