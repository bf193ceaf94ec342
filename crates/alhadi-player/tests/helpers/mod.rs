//! Scripted engine and element doubles for player tests.

#![allow(dead_code)]

use alhadi_player::{
    DecodeEngine, EngineError, EngineEvent, EngineEvents, EngineFactory, EngineTuning,
    FullscreenVendor, MediaElement, PlaybackError, StreamSnapshot,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Engine factory whose engines replay scripted events per load of a URL.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    pub scripts: Arc<Mutex<HashMap<String, VecDeque<Vec<EngineEvent>>>>>,
    pub loads: Arc<Mutex<Vec<String>>>,
    pub senders: Arc<Mutex<Vec<EngineEvents>>>,
    pub destroyed: Arc<AtomicUsize>,
    pub recoveries: Arc<AtomicUsize>,
    pub recovery_supported: Arc<AtomicBool>,
    /// URLs whose `load_source` fails.
    pub rejected: Arc<Mutex<Vec<String>>>,
    pub unsupported: bool,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        let factory = Self::default();
        factory.recovery_supported.store(true, Ordering::SeqCst);
        factory
    }

    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::new()
        }
    }

    /// Events emitted on the next load of `url`.
    pub fn script(&self, url: &str, events: Vec<EngineEvent>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(events);
        self
    }

    pub fn reject(&self, url: &str) -> &Self {
        self.rejected.lock().unwrap().push(url.to_string());
        self
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    /// Emit an event from the most recently created engine.
    pub fn emit(&self, event: EngineEvent) {
        let senders = self.senders.lock().unwrap();
        let _ = senders.last().unwrap().send(event);
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl EngineFactory for ScriptedFactory {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    fn create(
        &self,
        _tuning: &EngineTuning,
        events: EngineEvents,
    ) -> Result<Box<dyn DecodeEngine>, EngineError> {
        self.senders.lock().unwrap().push(events.clone());
        Ok(Box::new(ScriptedEngine {
            factory: self.clone(),
            events,
        }))
    }
}

struct ScriptedEngine {
    factory: ScriptedFactory,
    events: EngineEvents,
}

impl DecodeEngine for ScriptedEngine {
    fn attach_media(&mut self, _element: Arc<dyn MediaElement>) {}

    fn load_source(&mut self, url: &str) -> Result<(), EngineError> {
        self.factory.loads.lock().unwrap().push(url.to_string());
        if self.factory.rejected.lock().unwrap().iter().any(|u| u == url) {
            return Err(EngineError::Load(format!("invalid URL {}", url)));
        }
        let script = self
            .factory
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_default();
        for event in script {
            let _ = self.events.send(event);
        }
        Ok(())
    }

    fn recover_media_error(&mut self) -> Result<(), EngineError> {
        if self.factory.recovery_supported.load(Ordering::SeqCst) {
            self.factory.recoveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            Err(EngineError::RecoveryUnsupported)
        }
    }

    fn destroy(&mut self) {
        self.factory.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Media element recording control calls.
#[derive(Default)]
pub struct FakeElement {
    pub muted: AtomicBool,
    pub paused: AtomicBool,
    pub reject_play: AtomicBool,
    pub play_calls: AtomicUsize,
    /// Vendors whose fullscreen API exists.
    pub vendors: Mutex<Vec<FullscreenVendor>>,
    pub fullscreen_calls: Mutex<Vec<(FullscreenVendor, bool)>>,
}

impl FakeElement {
    pub fn with_vendors(vendors: &[FullscreenVendor]) -> Self {
        let element = Self::default();
        *element.vendors.lock().unwrap() = vendors.to_vec();
        element
    }

    fn fullscreen(&self, vendor: FullscreenVendor, entering: bool) -> Result<(), PlaybackError> {
        if self.vendors.lock().unwrap().contains(&vendor) {
            self.fullscreen_calls.lock().unwrap().push((vendor, entering));
            Ok(())
        } else {
            Err(PlaybackError::FullscreenUnavailable { vendor })
        }
    }
}

#[async_trait]
impl MediaElement for FakeElement {
    async fn play(&self) -> Result<(), PlaybackError> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(PlaybackError::PlayRejected("NotAllowedError".into()));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn request_fullscreen(&self, vendor: FullscreenVendor) -> Result<(), PlaybackError> {
        self.fullscreen(vendor, true)
    }

    fn exit_fullscreen(&self, vendor: FullscreenVendor) -> Result<(), PlaybackError> {
        self.fullscreen(vendor, false)
    }
}

/// Wait until the published snapshot satisfies `pred`.
pub async fn wait_for(
    rx: &mut watch::Receiver<StreamSnapshot>,
    pred: impl FnMut(&StreamSnapshot) -> bool,
) -> StreamSnapshot {
    tokio::time::timeout(Duration::from_secs(300), rx.wait_for(pred))
        .await
        .expect("timed out waiting for player state")
        .expect("player task ended")
        .clone()
}
