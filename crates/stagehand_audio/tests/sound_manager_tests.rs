//! Integration tests for stagehand_audio

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stagehand_audio::*;
use stagehand_tick::{DeferredInvoker, RampState, Tick};

type Clip = String;

fn manager(channels: usize) -> SoundManager<MemoryChannel<Clip>> {
    SoundManager::new(
        SoundManagerConfig::new()
            .with_channels(channels)
            .with_one_shot_channel(channels - 1),
        |_| MemoryChannel::new(),
    )
    .unwrap()
}

fn sound_list() -> SoundList<Clip> {
    serde_json::from_str(
        r#"{
            "table": [
                {"key": "bgm_title", "value": "title.ogg"},
                {"key": "sfx_jump", "value": "jump_a.wav"},
                {"key": "sfx_jump", "value": "jump_b.wav"}
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn test_sound_list_attach_and_play() {
    let mut sounds = manager(3);
    assert!(sound_list().attach(&mut sounds));

    sounds.play_bgm("bgm_title", 0).unwrap();
    sounds.play_one_shot("sfx_jump", 0.8).unwrap();

    assert_eq!(sounds.channel(0).clip().map(String::as_str), Some("title.ogg"));
    assert_eq!(
        sounds.channel(2).one_shots(),
        &[("jump_b.wav".to_string(), 0.8)]
    );
}

#[test]
fn test_list_without_register_on_load_keeps_table() {
    let mut sounds = manager(1);
    sound_list().attach(&mut sounds);

    let inert = SoundList::new(SoundTable::from_entries([(
        "other".to_string(),
        "other.wav".to_string(),
    )]))
    .with_register_on_load(false);
    assert!(!inert.attach(&mut sounds));
    assert!(sounds.sound_table().contains_key("bgm_title"));
}

#[test]
fn test_index_requests_clamp() {
    let mut sounds = manager(3);
    sound_list().attach(&mut sounds);

    sounds.play_index(0, -1, false).unwrap();
    sounds.play_index(2, 5, false).unwrap();

    assert_eq!(sounds.channel(0).clip().map(String::as_str), Some("title.ogg"));
    assert_eq!(sounds.channel(2).clip().map(String::as_str), Some("jump_b.wav"));
    assert!(sounds.channel(1).clip().is_none());
}

#[test]
fn test_fade_out_then_stop_via_deferred() {
    let mut sounds = manager(2);
    sound_list().attach(&mut sounds);
    sounds.play_bgm("bgm_title", 1).unwrap();

    let done = Arc::new(AtomicUsize::new(0));
    let d = done.clone();
    sounds
        .start_fade(
            3,
            0.0,
            1,
            Some(Box::new(move || {
                d.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();

    let mut frames = 0;
    while sounds.is_fading() {
        sounds.tick();
        frames += 1;
    }
    assert_eq!(frames, 3);
    assert_eq!(sounds.channel(1).volume(), 0.0);
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(sounds.fade_state(), RampState::Idle);

    // Deferred work runs on the next frame, never the current one
    let stopped = Arc::new(AtomicUsize::new(0));
    let s = stopped.clone();
    let mut invoker = DeferredInvoker::new();
    invoker.after(0, move || {
        s.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(stopped.load(Ordering::SeqCst), 0);
    invoker.tick();
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fade_all_uses_configured_targets() {
    let mut sounds = SoundManager::new(
        SoundManagerConfig::new()
            .with_channels(2)
            .with_fade_volumes(0.1, 0.9),
        |_| MemoryChannel::<Clip>::new(),
    )
    .unwrap();

    sounds.start_fade_in_all(2, None, None).unwrap();
    sounds.tick();
    sounds.tick();
    assert!(sounds.channels().iter().all(|c| c.volume() == 0.1));

    sounds.start_fade_out_all(7, None, None).unwrap();
    for _ in 0..7 {
        sounds.tick();
    }
    assert!(sounds.channels().iter().all(|c| c.volume() == 0.9));
}

#[test]
fn test_channel_count_is_clamped() {
    let sounds = SoundManager::new(SoundManagerConfig::new().with_channels(64), |_| {
        MemoryChannel::<Clip>::new()
    })
    .unwrap();
    assert_eq!(sounds.channel_count(), MAX_CHANNELS);
}
