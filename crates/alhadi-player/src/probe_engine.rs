//! Headless decode engine that only checks a stream is reachable.
//!
//! It fetches the manifest, the starting variant playlist and the first
//! segment, reporting each milestone the way a real decoder would. Nothing is
//! decoded, so media errors can never be recovered.

use crate::element::MediaElement;
use crate::engine::{
    DecodeEngine, EngineError, EngineEvent, EngineEvents, EngineFactory, EngineTuning, ErrorKind,
};
use m3u8_rs::Playlist;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Failure fetching one playlist or segment.
#[derive(Debug)]
enum FetchError {
    Network(String),
    Parse(String),
}

impl FetchError {
    fn into_event(self) -> EngineEvent {
        match self {
            FetchError::Network(details) => EngineEvent::fatal(ErrorKind::Network, details),
            FetchError::Parse(details) => EngineEvent::fatal(ErrorKind::Media, details),
        }
    }
}

#[derive(Clone)]
pub struct HttpProbeFactory {
    client: Client,
}

impl HttpProbeFactory {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpProbeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for HttpProbeFactory {
    fn is_supported(&self) -> bool {
        true
    }

    fn create(
        &self,
        tuning: &EngineTuning,
        events: EngineEvents,
    ) -> Result<Box<dyn DecodeEngine>, EngineError> {
        Ok(Box::new(HttpProbeEngine {
            client: self.client.clone(),
            tuning: tuning.clone(),
            events,
            task: None,
        }))
    }
}

pub struct HttpProbeEngine {
    client: Client,
    tuning: EngineTuning,
    events: EngineEvents,
    task: Option<JoinHandle<()>>,
}

impl DecodeEngine for HttpProbeEngine {
    fn attach_media(&mut self, _element: Arc<dyn MediaElement>) {
        tracing::debug!("Probe engine ignores attached media element");
    }

    fn load_source(&mut self, url: &str) -> Result<(), EngineError> {
        let manifest_url =
            Url::parse(url).map_err(|e| EngineError::Load(format!("invalid URL {}: {}", url, e)))?;

        if let Some(task) = self.task.take() {
            task.abort();
        }

        let probe = Probe {
            client: self.client.clone(),
            tuning: self.tuning.clone(),
            events: self.events.clone(),
        };
        self.task = Some(tokio::spawn(async move { probe.run(manifest_url).await }));
        Ok(())
    }

    fn recover_media_error(&mut self) -> Result<(), EngineError> {
        Err(EngineError::RecoveryUnsupported)
    }

    fn destroy(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HttpProbeEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

struct Probe {
    client: Client,
    tuning: EngineTuning,
    events: EngineEvents,
}

impl Probe {
    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Probe event dropped, engine already torn down");
        }
    }

    async fn run(self, manifest_url: Url) {
        if let Err(e) = self.walk(manifest_url).await {
            self.emit(e.into_event());
        }
    }

    async fn walk(&self, manifest_url: Url) -> Result<(), FetchError> {
        let body = self
            .fetch(
                &manifest_url,
                self.tuning.manifest_loading_timeout,
                self.tuning.manifest_loading_max_retry,
            )
            .await?;

        let (level_url, media) = match parse(&manifest_url, &body)? {
            Playlist::MasterPlaylist(master) => {
                if master.variants.is_empty() {
                    return Err(FetchError::Parse("master playlist has no variants".into()));
                }
                self.emit(EngineEvent::ManifestParsed);

                let level = self.tuning.start_level.min(master.variants.len() - 1);
                let level_url = join(&manifest_url, &master.variants[level].uri)?;
                let body = self
                    .fetch(
                        &level_url,
                        self.tuning.level_loading_timeout,
                        self.tuning.level_loading_max_retry,
                    )
                    .await?;
                match parse(&level_url, &body)? {
                    Playlist::MediaPlaylist(media) => (level_url, media),
                    Playlist::MasterPlaylist(_) => {
                        return Err(FetchError::Parse(format!(
                            "expected media playlist at {}",
                            level_url
                        )))
                    }
                }
            }
            Playlist::MediaPlaylist(media) => {
                self.emit(EngineEvent::ManifestParsed);
                (manifest_url, media)
            }
        };
        self.emit(EngineEvent::LevelLoaded);

        let segment = media
            .segments
            .first()
            .ok_or_else(|| FetchError::Parse(format!("no segments in {}", level_url)))?;
        let segment_url = join(&level_url, &segment.uri)?;
        self.fetch(
            &segment_url,
            self.tuning.frag_loading_timeout,
            self.tuning.frag_loading_max_retry,
        )
        .await?;
        self.emit(EngineEvent::FragLoaded);

        tracing::debug!(url = %segment_url, "Stream probe reached first fragment");
        Ok(())
    }

    /// GET with per-attempt timeout; failed attempts before the last are
    /// reported as non-fatal.
    async fn fetch(&self, url: &Url, timeout: Duration, max_retry: u32) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(reason) if attempt < max_retry => {
                    attempt += 1;
                    tracing::debug!(url = %url, attempt, error = %reason, "Stream fetch failed, retrying");
                    self.emit(EngineEvent::non_fatal(ErrorKind::Network, reason));
                }
                Err(reason) => return Err(FetchError::Network(reason)),
            }
        }
    }

    async fn fetch_once(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| format!("{}: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{}: HTTP {}", url, status.as_u16()));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("{}: {}", url, e))
    }
}

fn parse(url: &Url, body: &[u8]) -> Result<Playlist, FetchError> {
    m3u8_rs::parse_playlist_res(body)
        .map_err(|_| FetchError::Parse(format!("unparsable playlist at {}", url)))
}

fn join(base: &Url, uri: &str) -> Result<Url, FetchError> {
    base.join(uri)
        .map_err(|e| FetchError::Parse(format!("bad URI {} in {}: {}", uri, base, e)))
}
