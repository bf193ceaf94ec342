//! Configuration module
//!
//! Settings for the relay server, the storage and record collaborators, the
//! uploader and the live stream player, read from the environment.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const STORAGE_BUCKET: &str = "videos";
const UPLOAD_CACHE_CONTROL: &str = "3600";
const UPLOAD_CHUNK_SIZE_KB: usize = 1024;
const CHUNK_SESSION_TTL_SECS: u64 = 900;
const FFPROBE_PATH: &str = "ffprobe";
const STREAM_LOAD_TIMEOUT_SECS: u64 = 45;

/// Live stream endpoints tried in order when `LIVE_STREAM_URLS` is unset.
pub const DEFAULT_LIVE_STREAM_URLS: [&str; 2] = [
    "https://672a3a5c8e335.streamlock.net:443/alhadi/smil:alhadimedia.smil/playlist.m3u8",
    "https://g.decdn.net/haditv.co.uk/haditv6.m3u8",
];

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub storage_bucket: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload_cache_control: String,
    pub upload_chunk_size_bytes: usize,
    pub chunk_session_ttl_secs: u64,
    pub relay_endpoint: Option<String>,
    pub ffprobe_path: String,
    pub live_stream_urls: Vec<String>,
    pub stream_load_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup. Does not validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = var("PORT")
            .unwrap_or_else(|| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Supabase,
        };

        let upload_chunk_size_kb = var("UPLOAD_CHUNK_SIZE_KB")
            .unwrap_or_else(|| UPLOAD_CHUNK_SIZE_KB.to_string())
            .parse::<usize>()
            .unwrap_or(UPLOAD_CHUNK_SIZE_KB);

        let live_stream_urls = match var("LIVE_STREAM_URLS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_LIVE_STREAM_URLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(Config {
            environment,
            server_port,
            storage_backend,
            supabase_url: var("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_anon_key: var("SUPABASE_ANON_KEY"),
            storage_bucket: var("STORAGE_BUCKET").unwrap_or_else(|| STORAGE_BUCKET.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            upload_cache_control: var("UPLOAD_CACHE_CONTROL")
                .unwrap_or_else(|| UPLOAD_CACHE_CONTROL.to_string()),
            upload_chunk_size_bytes: upload_chunk_size_kb * 1024,
            chunk_session_ttl_secs: var("CHUNK_SESSION_TTL_SECS")
                .unwrap_or_else(|| CHUNK_SESSION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(CHUNK_SESSION_TTL_SECS),
            relay_endpoint: var("RELAY_ENDPOINT").map(|u| u.trim_end_matches('/').to_string()),
            ffprobe_path: var("FFPROBE_PATH").unwrap_or_else(|| FFPROBE_PATH.to_string()),
            live_stream_urls,
            stream_load_timeout_secs: var("STREAM_LOAD_TIMEOUT_SECS")
                .unwrap_or_else(|| STREAM_LOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(STREAM_LOAD_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::Supabase => {
                if self.supabase_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_URL must be set when using supabase storage backend"
                    ));
                }
                if self.supabase_anon_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_ANON_KEY must be set when using supabase storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.live_stream_urls.is_empty() {
            return Err(anyhow::anyhow!(
                "LIVE_STREAM_URLS must contain at least one stream URL"
            ));
        }

        if self.upload_chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CHUNK_SIZE_KB must be greater than zero"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn stream_load_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_load_timeout_secs)
    }

    pub fn chunk_session_ttl(&self) -> Duration {
        Duration::from_secs(self.chunk_session_ttl_secs)
    }
}
