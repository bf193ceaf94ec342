//! Async driver binding a `StreamSession` to engines and timers.

use crate::element::MediaElement;
use crate::engine::{DecodeEngine, EngineEvent, EngineFactory};
use crate::session::{Effect, SessionInput, StreamSession, StreamSnapshot};
use crate::settings::PlayerSettings;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

enum Command {
    Retry,
}

struct ActiveEngine {
    engine: Box<dyn DecodeEngine>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
}

/// Everything a mounted player owns. Dropped as a unit on unmount.
struct Runtime {
    factory: Arc<dyn EngineFactory>,
    element: Option<Arc<dyn MediaElement>>,
    settings: PlayerSettings,
    engine: Option<ActiveEngine>,
    deadline: Option<Instant>,
    ticker: Option<Interval>,
    reset_at: Option<Instant>,
}

impl Runtime {
    fn teardown(&mut self) {
        if let Some(mut active) = self.engine.take() {
            active.engine.destroy();
        }
        self.deadline = None;
        self.ticker = None;
        self.reset_at = None;
    }

    /// Perform one effect; follow-up inputs are queued on `pending`.
    fn apply(&mut self, effect: Effect, pending: &mut VecDeque<SessionInput>) {
        match effect {
            Effect::Teardown => self.teardown(),
            Effect::Load { index, url } => {
                if !self.factory.is_supported() {
                    pending.push_back(SessionInput::EngineUnsupported);
                    return;
                }

                let (tx, rx) = mpsc::unbounded_channel();
                let mut engine = match self.factory.create(&self.settings.tuning, tx) {
                    Ok(engine) => engine,
                    Err(e) => {
                        pending.push_back(SessionInput::EngineLoadFailed(e.to_string()));
                        return;
                    }
                };

                if let Err(e) = engine.load_source(&url) {
                    engine.destroy();
                    pending.push_back(SessionInput::SourceRejected(e.to_string()));
                    return;
                }
                if let Some(element) = &self.element {
                    engine.attach_media(element.clone());
                }

                let now = Instant::now();
                self.deadline = Some(now + self.settings.load_timeout);
                let mut ticker = tokio::time::interval_at(
                    now + self.settings.progress_interval,
                    self.settings.progress_interval,
                );
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(ticker);
                self.reset_at = None;
                self.engine = Some(ActiveEngine { engine, events: rx });

                tracing::debug!(active_index = index, url = %url, "Stream engine started");
            }
            Effect::RecoverMedia => {
                let recovered = match self.engine.as_mut() {
                    Some(active) => active.engine.recover_media_error(),
                    None => Err(crate::engine::EngineError::RecoveryUnsupported),
                };
                if let Err(e) = recovered {
                    tracing::debug!(error = %e, "Media error recovery failed");
                    pending.push_back(SessionInput::RecoveryUnsupported);
                }
            }
            Effect::Settle => {
                self.deadline = None;
                self.ticker = None;
                self.reset_at = Some(Instant::now() + self.settings.settle_delay);
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn tick_opt(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_event(engine: Option<&mut ActiveEngine>) -> Option<EngineEvent> {
    match engine {
        Some(active) => active.events.recv().await,
        None => std::future::pending().await,
    }
}

/// A mounted live player.
///
/// Mounting starts loading the first candidate right away. State is published
/// on a watch channel; `unmount` (or dropping the player) releases the engine
/// and stops every timer.
pub struct StreamPlayer {
    state: watch::Receiver<StreamSnapshot>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StreamPlayer {
    pub fn mount(
        candidates: Vec<String>,
        factory: Arc<dyn EngineFactory>,
        element: Option<Arc<dyn MediaElement>>,
        settings: PlayerSettings,
    ) -> Self {
        let session = StreamSession::new(candidates).with_progress_cap(settings.progress_cap);
        let (state_tx, state_rx) = watch::channel(session.snapshot());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let runtime = Runtime {
            factory,
            element,
            settings,
            engine: None,
            deadline: None,
            ticker: None,
            reset_at: None,
        };

        let handle = tokio::spawn(drive(
            session,
            runtime,
            state_tx,
            commands_rx,
            cancel.clone(),
        ));

        Self {
            state: state_rx,
            commands: commands_tx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.state.borrow().clone()
    }

    /// Start over from the first candidate.
    pub fn retry(&self) {
        if self.commands.send(Command::Retry).is_err() {
            tracing::debug!("Retry ignored, player already unmounted");
        }
    }

    /// Release the engine and timers, waiting for the driver to finish.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Stream player task ended abnormally");
            }
        }
    }
}

impl Drop for StreamPlayer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive(
    mut session: StreamSession,
    mut runtime: Runtime,
    state: watch::Sender<StreamSnapshot>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    let mut pending = VecDeque::from([SessionInput::Start]);

    loop {
        while let Some(input) = pending.pop_front() {
            for effect in session.handle(input) {
                runtime.apply(effect, &mut pending);
            }
            state.send_if_modified(|current| {
                let next = session.snapshot();
                let changed = *current != next;
                *current = next;
                changed
            });
        }

        let max_step = runtime.settings.progress_max_step;
        tokio::select! {
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(Command::Retry) => {
                    tracing::info!("Retrying live stream");
                    pending.push_back(SessionInput::Retry);
                }
                None => break,
            },
            Some(event) = next_event(runtime.engine.as_mut()) => {
                pending.push_back(SessionInput::Engine(event));
            }
            _ = sleep_until_opt(runtime.deadline) => {
                runtime.deadline = None;
                pending.push_back(SessionInput::LoadTimeout);
            }
            _ = tick_opt(runtime.ticker.as_mut()) => {
                let step = rand::rng().random_range(0..=max_step);
                pending.push_back(SessionInput::ProgressTick(step));
            }
            _ = sleep_until_opt(runtime.reset_at) => {
                runtime.reset_at = None;
                pending.push_back(SessionInput::ProgressReset);
            }
        }
    }

    runtime.teardown();
    tracing::debug!("Stream player unmounted");
}
