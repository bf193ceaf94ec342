//! Al-Hadi Media CLI: upload media, watch the live stream, delete stored files.
//!
//! Reads the same environment as the relay server (`SUPABASE_URL`,
//! `SUPABASE_ANON_KEY`, `RELAY_ENDPOINT`, `LIVE_STREAM_URLS`, ...).

use alhadi_cli::{content_type_for, init_tracing, watch_player};
use alhadi_core::{Config, FileUpload, MediaKind};
use alhadi_db::{attach_upload, MediaLink, PostgrestStore};
use alhadi_player::{HttpProbeFactory, PlayerSettings, StreamPlayer, StreamStatus};
use alhadi_upload::{
    ChunkedStrategy, DirectStrategy, FfprobeDurationProbe, RelayStrategy, ResilientUploader,
    UploadStrategy, UploadTask, UploaderSettings,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "alhadi", about = "Al-Hadi Media operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyKind {
    /// Straight to storage
    Direct,
    /// Whole file through the relay server
    Relay,
    /// Fixed-size chunks through the relay server
    Chunked,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video or thumbnail
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// video or image; inferred from the file extension when omitted
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, value_enum, default_value = "direct")]
        strategy: StrategyKind,
        /// Program id to link the uploaded file to
        #[arg(long)]
        program: Option<String>,
    },
    /// Play the live stream headlessly and print state transitions
    WatchStream {
        /// Candidate URL, in order; repeat for fallbacks. Defaults to LIVE_STREAM_URLS.
        #[arg(long = "url")]
        urls: Vec<String>,
        /// Exit once the stream is available or unavailable
        #[arg(long)]
        once: bool,
        /// Seconds to wait before retrying an unavailable stream
        #[arg(long, default_value = "30")]
        retry_after: u64,
    },
    /// Delete a stored file by path or public URL
    DeleteFile {
        target: String,
    },
}

fn load_config() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn build_strategy(
    config: &Config,
    kind: StrategyKind,
) -> anyhow::Result<Arc<dyn UploadStrategy>> {
    let relay_endpoint = || {
        config
            .relay_endpoint
            .clone()
            .context("RELAY_ENDPOINT must be set for relayed uploads")
    };

    let strategy: Arc<dyn UploadStrategy> = match kind {
        StrategyKind::Direct => {
            let storage = alhadi_storage::create_storage(config)
                .await
                .context("Failed to initialize storage")?;
            Arc::new(DirectStrategy::new(storage))
        }
        StrategyKind::Relay => Arc::new(RelayStrategy::new(relay_endpoint()?)),
        StrategyKind::Chunked => Arc::new(ChunkedStrategy::new(
            relay_endpoint()?,
            config.upload_chunk_size_bytes,
        )),
    };
    Ok(strategy)
}

async fn upload(
    config: &Config,
    file: PathBuf,
    kind: Option<String>,
    strategy: StrategyKind,
    program: Option<String>,
) -> anyhow::Result<()> {
    let content_type = content_type_for(&file);
    let kind = match kind {
        Some(kind) => kind.parse::<MediaKind>()?,
        None => MediaKind::from_mime(content_type)
            .with_context(|| format!("Cannot infer media kind of {}; pass --kind", file.display()))?,
    };

    let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    let uploader = ResilientUploader::new(build_strategy(config, strategy).await?)
        .with_settings(UploaderSettings::default().cache_control(config.upload_cache_control.clone()))
        .with_probe(Arc::new(FfprobeDurationProbe::new(config.ffprobe_path.clone())));

    let task = UploadTask::new(FileUpload::new(name, content_type, data), kind);
    let mut progress = task.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last = 0;
        while progress.changed().await.is_ok() {
            let current = progress.borrow_and_update().progress;
            if current > last {
                tracing::info!(progress = current, "Uploading");
                last = current;
            }
        }
    });

    let result = uploader.run(&task).await;
    reporter.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => bail!("{}", e.localized_message()),
    };

    if let Some(program_id) = program {
        let url = config
            .supabase_url
            .clone()
            .context("SUPABASE_URL must be set to link a program")?;
        let key = config
            .supabase_anon_key
            .clone()
            .context("SUPABASE_ANON_KEY must be set to link a program")?;
        let store = PostgrestStore::new(url, key);
        let link = MediaLink {
            kind,
            public_url: outcome.public_url.clone(),
            duration: outcome.duration.clone(),
        };
        attach_upload(&store, &program_id, &link)
            .await
            .with_context(|| format!("Failed to link upload to program {}", program_id))?;
    }

    print_json(&serde_json::json!({
        "success": true,
        "url": outcome.public_url,
        "filePath": outcome.storage_path,
        "fileName": outcome.generated_name,
        "duration": outcome.duration,
        "strategy": uploader.strategy_name(),
    }))
}

async fn watch_stream(
    config: &Config,
    urls: Vec<String>,
    once: bool,
    retry_after: Duration,
) -> anyhow::Result<()> {
    let candidates = if urls.is_empty() {
        config.live_stream_urls.clone()
    } else {
        urls
    };

    let player = StreamPlayer::mount(
        candidates,
        Arc::new(HttpProbeFactory::new()),
        None,
        PlayerSettings::from_config(config),
    );
    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => None,
        status = watch_player(&player, once, retry_after, |line| println!("{}", line)) => status,
    };

    player.unmount().await;

    if outcome == Some(StreamStatus::Unavailable) {
        bail!("Live stream unavailable");
    }
    Ok(())
}

async fn delete_file(config: &Config, target: &str) -> anyhow::Result<()> {
    let target = target.trim();
    if target.is_empty() {
        bail!("File path is required");
    }

    let storage = alhadi_storage::create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    let path = storage
        .path_from_public_url(target)
        .unwrap_or_else(|| target.to_string());

    storage
        .remove(std::slice::from_ref(&path))
        .await
        .with_context(|| format!("Failed to delete {}", path))?;

    print_json(&serde_json::json!({ "success": true, "path": path }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Commands::Upload {
            file,
            kind,
            strategy,
            program,
        } => upload(&config, file, kind, strategy, program).await,
        Commands::WatchStream {
            urls,
            once,
            retry_after,
        } => watch_stream(&config, urls, once, Duration::from_secs(retry_after)).await,
        Commands::DeleteFile { target } => delete_file(&config, &target).await,
    }
}
