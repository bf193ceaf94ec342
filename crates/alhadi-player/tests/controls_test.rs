mod helpers;

use alhadi_player::messages;
use alhadi_player::{
    FullscreenVendor, PlaybackControls, PlaybackError, StreamSnapshot, StreamStatus,
};
use helpers::FakeElement;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::watch;

fn available() -> StreamSnapshot {
    StreamSnapshot {
        status: StreamStatus::Available,
        ..StreamSnapshot::default()
    }
}

#[tokio::test]
async fn test_play_requires_available_stream() {
    let element = Arc::new(FakeElement::default());
    let (_tx, rx) = watch::channel(StreamSnapshot::default());
    let controls = PlaybackControls::new(element.clone(), rx);

    assert_eq!(controls.toggle_play().await, Err(PlaybackError::NotAvailable));
    assert_eq!(element.play_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_toggle_play_and_pause() {
    let element = Arc::new(FakeElement::default());
    let (_tx, rx) = watch::channel(available());
    let controls = PlaybackControls::new(element.clone(), rx);

    controls.toggle_play().await.unwrap();
    assert!(controls.snapshot().playing);
    assert!(!controls.snapshot().busy);

    controls.toggle_play().await.unwrap();
    assert!(!controls.snapshot().playing);
    assert!(element.paused.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_rejected_play_is_a_transient_error() {
    let element = Arc::new(FakeElement::default());
    element.reject_play.store(true, Ordering::SeqCst);
    let (tx, rx) = watch::channel(available());
    let controls = PlaybackControls::new(element.clone(), rx);

    let err = controls.toggle_play().await.unwrap_err();
    assert!(matches!(err, PlaybackError::PlayRejected(_)));

    let state = controls.snapshot();
    assert!(!state.playing);
    assert_eq!(state.error.as_deref(), Some(messages::PLAYBACK_FAILED));
    assert_eq!(tx.borrow().status, StreamStatus::Available);
}

#[tokio::test]
async fn test_toggle_mute_flips_element() {
    let element = Arc::new(FakeElement::default());
    let (_tx, rx) = watch::channel(available());
    let controls = PlaybackControls::new(element.clone(), rx);

    controls.toggle_mute();
    assert!(element.muted.load(Ordering::SeqCst));
    assert!(controls.snapshot().muted);
    controls.toggle_mute();
    assert!(!element.muted.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_fullscreen_uses_first_available_vendor() {
    let element = Arc::new(FakeElement::with_vendors(&[
        FullscreenVendor::Moz,
        FullscreenVendor::Ms,
    ]));
    let (_tx, rx) = watch::channel(available());
    let controls = PlaybackControls::new(element.clone(), rx);

    assert_eq!(controls.toggle_fullscreen(), Ok(FullscreenVendor::Moz));
    assert!(!controls.snapshot().fullscreen);

    controls.on_fullscreen_change(true);
    assert!(controls.snapshot().fullscreen);

    assert_eq!(controls.toggle_fullscreen(), Ok(FullscreenVendor::Moz));
    assert_eq!(
        *element.fullscreen_calls.lock().unwrap(),
        vec![(FullscreenVendor::Moz, true), (FullscreenVendor::Moz, false)]
    );
}

#[tokio::test]
async fn test_fullscreen_without_any_api() {
    let element = Arc::new(FakeElement::default());
    let (_tx, rx) = watch::channel(available());
    let controls = PlaybackControls::new(element, rx);

    assert_eq!(controls.toggle_fullscreen(), Err(PlaybackError::NoFullscreen));
}
