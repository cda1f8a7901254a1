//! Simulated host frame loop
//!
//! Stands in for an engine: owns the singleton registry, registers the sound
//! and fade managers, and runs scheduled commands through the command
//! registry while ticking everything once per frame.

use std::sync::Arc;

use parking_lot::Mutex;
use stagehand_audio::{AudioError, MemoryChannel, SoundManager};
use stagehand_core::{CommandRegistry, RegistryError, SingletonGuard, SingletonRegistry};
use stagehand_fade::{FadeManager, MemoryOverlay};
use stagehand_tick::{DeferredInvoker, OwnerToken, SequenceStatus, Tick};
use thiserror::Error;

use crate::config::{CommandArgs, ConfigError, DemoConfig};

pub type DemoSounds = SoundManager<MemoryChannel<String>>;
pub type DemoFade = FadeManager<MemoryOverlay>;
pub type StageCommands = CommandRegistry<Stage, CommandArgs>;

/// Fade length used when a command gives none
const DEFAULT_FADE_STEPS: i32 = 30;

/// Everything the scheduled commands act on
pub struct Stage {
    pub sounds: DemoSounds,
    pub fade: DemoFade,
}

impl Stage {
    /// Check if any fade is still running
    pub fn is_settled(&self) -> bool {
        !self.sounds.is_fading() && !self.fade.is_fading()
    }
}

impl Tick for Stage {
    fn tick(&mut self) {
        self.sounds.tick();
        self.fade.tick();
    }
}

/// Commands the demo schedule can name
pub fn stage_commands() -> StageCommands {
    CommandRegistry::new()
        .with("play", |stage: &mut Stage, args: CommandArgs| {
            let looping = args.looping;
            report("play", play(stage, &args, looping));
        })
        .with("play_bgm", |stage: &mut Stage, args: CommandArgs| {
            report("play_bgm", play(stage, &args, true));
        })
        .with("play_one_shot", |stage: &mut Stage, args: CommandArgs| {
            let volume = args.volume.unwrap_or(1.0);
            let result = match &args.key {
                Some(key) => stage.sounds.play_one_shot(key, volume),
                None => stage.sounds.play_one_shot_index(args.index.unwrap_or(0), volume),
            };
            report("play_one_shot", result);
        })
        .with("pause", |stage: &mut Stage, args: CommandArgs| {
            stage.sounds.pause(args.channel)
        })
        .with("resume", |stage: &mut Stage, args: CommandArgs| {
            stage.sounds.resume(args.channel)
        })
        .with("stop", |stage: &mut Stage, args: CommandArgs| {
            stage.sounds.stop(args.channel)
        })
        .with("clear_sounds", |stage: &mut Stage, _| stage.sounds.clear_sound_table())
        .with("sound_fade_in", |stage: &mut Stage, args: CommandArgs| {
            let result = stage
                .sounds
                .start_fade_in(steps(&args), args.target, args.channel, None);
            report("sound_fade_in", result);
        })
        .with("sound_fade_out", |stage: &mut Stage, args: CommandArgs| {
            let result = stage
                .sounds
                .start_fade_out(steps(&args), args.target, args.channel, None);
            report("sound_fade_out", result);
        })
        .with("sound_fade_in_all", |stage: &mut Stage, args: CommandArgs| {
            let result = stage.sounds.start_fade_in_all(steps(&args), args.target, None);
            report("sound_fade_in_all", result);
        })
        .with("sound_fade_out_all", |stage: &mut Stage, args: CommandArgs| {
            let result = stage.sounds.start_fade_out_all(steps(&args), args.target, None);
            report("sound_fade_out_all", result);
        })
        .with("screen_fade_in", |stage: &mut Stage, args: CommandArgs| {
            let result = stage.fade.start_fade_in(
                steps(&args),
                Some(Box::new(|| log::info!("Screen is dark"))),
            );
            report("screen_fade_in", result);
        })
        .with("screen_fade_out", |stage: &mut Stage, args: CommandArgs| {
            let result = stage.fade.start_fade_out(
                steps(&args),
                Some(Box::new(|| log::info!("Screen is clear"))),
            );
            report("screen_fade_out", result);
        })
        .with("reset_overlay", |stage: &mut Stage, _| stage.fade.initialize())
}

fn play(stage: &mut Stage, args: &CommandArgs, looping: bool) -> Result<(), AudioError> {
    match &args.key {
        Some(key) => stage.sounds.play(key, args.channel, looping),
        None => stage
            .sounds
            .play_index(args.index.unwrap_or(0), args.channel, looping),
    }
}

fn steps(args: &CommandArgs) -> i32 {
    args.steps.unwrap_or(DEFAULT_FADE_STEPS)
}

fn report<E: std::fmt::Display>(command: &str, result: Result<(), E>) {
    if let Err(e) = result {
        log::warn!("{} skipped: {}", command, e);
    }
}

/// Demo errors
#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoSummary {
    /// Frames simulated
    pub frames: u32,
    /// Deferred callbacks that fired
    pub fired: usize,
    /// Scheduled work dropped with the scene
    pub dropped: usize,
    /// Frame the stage first settled after the schedule
    pub settled_at: Option<u32>,
}

/// Frame loop over a [`Stage`]
pub struct Demo {
    singletons: SingletonRegistry,
    invoker: DeferredInvoker,
    scene: Option<OwnerToken>,
    settled_at: Arc<Mutex<Option<u32>>>,
    frame: Arc<Mutex<u32>>,
    frames: u32,
    unload_at: Option<u32>,
    stage_slot: SingletonGuard<Mutex<Stage>>,
    command_slot: SingletonGuard<StageCommands>,
}

impl Demo {
    /// Build the stage from `config`, register it, and schedule its commands
    pub fn new(config: &DemoConfig, singletons: SingletonRegistry) -> Result<Self, DemoError> {
        let mut sounds = SoundManager::new(config.sound.clone(), |_| MemoryChannel::new())?;
        config.sounds.attach(&mut sounds);
        let fade = FadeManager::new(MemoryOverlay::new(), config.overlay.clone());

        let stage_slot = singletons.register_persistent(Arc::new(Mutex::new(Stage { sounds, fade })))?;
        // Transient: dropped when the scene unloads
        let command_slot = singletons.register(Arc::new(stage_commands()))?;

        let mut demo = Self {
            singletons,
            invoker: DeferredInvoker::new(),
            scene: Some(OwnerToken::new()),
            settled_at: Arc::new(Mutex::new(None)),
            frame: Arc::new(Mutex::new(0)),
            frames: config.frames,
            unload_at: config.unload_at,
            stage_slot,
            command_slot,
        };
        demo.schedule(config);
        Ok(demo)
    }

    fn schedule(&mut self, config: &DemoConfig) {
        let Some(scene) = &self.scene else {
            return;
        };

        for scheduled in &config.schedule {
            let stage = self.stage_slot.instance().clone();
            let commands = self.command_slot.instance().clone();
            let name = scheduled.command.clone();
            let args = scheduled.args.clone();
            self.invoker.after_owned(scene, scheduled.at, move || {
                log::debug!("Running command {}", name);
                report(&name, commands.invoke(&mut stage.lock(), &name, args));
            });
        }

        // Wait out the schedule, then until every fade has settled
        let stage = self.stage_slot.instance().clone();
        let frame = self.frame.clone();
        let mut wait = config.last_scheduled_frame().max(1);
        let settled = move || {
            wait = wait.saturating_sub(1);
            if wait == 0 && stage.lock().is_settled() {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Pending
            }
        };
        let settled_at = self.settled_at.clone();
        self.invoker.after_sequence(settled, move || {
            let at = *frame.lock();
            log::info!("Stage settled on frame {}", at);
            *settled_at.lock() = Some(at);
        });
    }

    /// Drop scene-bound work and transient singletons
    pub fn unload_scene(&mut self) -> usize {
        if self.scene.take().is_none() {
            return 0;
        }
        let removed = self.singletons.clear_transient();
        log::info!("Scene unloaded ({} transient singletons removed)", removed);
        removed
    }

    /// Run every frame, returning what happened
    pub fn run(&mut self) -> DemoSummary {
        let scheduled = self.invoker.pending();
        let mut fired = 0;

        for frame in 1..=self.frames {
            *self.frame.lock() = frame;
            if self.unload_at == Some(frame) {
                self.unload_scene();
            }

            match self.singletons.resolve::<Mutex<Stage>>() {
                Ok(stage) => stage.lock().tick(),
                Err(e) => log::error!("Frame {}: {}", frame, e),
            }
            fired += self.invoker.advance();
        }

        let summary = DemoSummary {
            frames: self.frames,
            fired,
            dropped: scheduled.saturating_sub(fired + self.invoker.pending()),
            settled_at: *self.settled_at.lock(),
        };
        log::info!(
            "Demo finished: {} frames, {} callbacks fired, {} dropped",
            summary.frames,
            summary.fired,
            summary.dropped
        );
        summary
    }

    /// Stage driven by this demo
    pub fn stage(&self) -> &Arc<Mutex<Stage>> {
        self.stage_slot.instance()
    }
}
