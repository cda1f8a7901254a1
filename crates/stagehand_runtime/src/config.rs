//! Demo configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `STAGEHAND_CHANNELS`, `STAGEHAND_FRAMES`
//! 2. Config file: `--config <path>`, the first argument, or `STAGEHAND_CONFIG`,
//!    falling back to `stagehand.toml` in the working directory
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! frames = 120
//! unload_at = 100
//!
//! [sound]
//! channels = 2
//!
//! [[sounds.table]]
//! key = "bgm_title"
//! value = "title.ogg"
//!
//! [[schedule]]
//! at = 0
//! command = "play_bgm"
//! args = { key = "bgm_title", channel = 0 }
//!
//! [[schedule]]
//! at = 60
//! command = "screen_fade_in"
//! args = { steps = 30 }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stagehand_audio::{SoundList, SoundManagerConfig};
use stagehand_fade::OverlaySetup;
use thiserror::Error;

/// Config file used when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "stagehand.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidOverride { name: &'static str, value: String },
}

/// Arguments passed to a scheduled command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandArgs {
    /// Sound key
    pub key: Option<String>,
    /// Sound index, used when no key is given
    pub index: Option<isize>,
    /// Target channel
    pub channel: isize,
    /// Loop playback
    pub looping: bool,
    /// One-shot volume
    pub volume: Option<f32>,
    /// Fade length in frames
    pub steps: Option<i32>,
    /// Fade target
    pub target: Option<f32>,
}

/// A command run on a given frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    /// Frames from startup
    pub at: u32,
    /// Registered command name
    pub command: String,
    #[serde(default)]
    pub args: CommandArgs,
}

/// Complete demo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Frames to simulate
    pub frames: u32,
    /// Frame on which the scene is unloaded, if any
    pub unload_at: Option<u32>,
    /// Sound manager settings
    pub sound: SoundManagerConfig,
    /// Sounds installed at startup
    pub sounds: SoundList<String>,
    /// Fade overlay layout
    pub overlay: OverlaySetup,
    /// Commands to run
    pub schedule: Vec<ScheduledCommand>,
    /// Config file path (for reporting)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 180,
            unload_at: None,
            sound: SoundManagerConfig::default(),
            sounds: SoundList::default(),
            overlay: OverlaySetup::default(),
            schedule: Vec::new(),
            config_path: None,
        }
    }
}

impl DemoConfig {
    /// Load from the file at `path` (defaults if it does not exist), then apply env overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let config = Self::load_from_file(path)?;
            log::info!("Loaded config from {}", path.display());
            config
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `STAGEHAND_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("STAGEHAND_CHANNELS") {
            self.sound.channels = parse_override("STAGEHAND_CHANNELS", value)?;
            log::info!("Channel count overridden: {}", self.sound.channels);
        }
        if let Some(value) = lookup("STAGEHAND_FRAMES") {
            self.frames = parse_override("STAGEHAND_FRAMES", value)?;
            log::info!("Frame count overridden: {}", self.frames);
        }
        Ok(())
    }

    /// Last frame any scheduled command runs on
    pub fn last_scheduled_frame(&self) -> u32 {
        self.schedule.iter().map(|c| c.at).max().unwrap_or(0)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        log::info!("=== Stagehand Demo Configuration ===");
        match &self.config_path {
            Some(path) => log::info!("  Config: {}", path.display()),
            None => log::info!("  Config: (defaults)"),
        }
        log::info!("  Frames: {}", self.frames);
        log::info!("  Channels: {}", self.sound.channels);
        log::info!("  Sounds: {}", self.sounds.table.count());
        log::info!("  Scheduled commands: {}", self.schedule.len());
        if let Some(frame) = self.unload_at {
            log::info!("  Scene unload at frame {}", frame);
        }
        log::info!("=====================================");
    }
}

fn parse_override<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { name, value })
}

/// Config path from `--config <path>`, the first positional argument, or `STAGEHAND_CONFIG`
pub fn resolve_config_path<I>(args: I, env: Option<String>) -> PathBuf
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut positional = None;
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            return PathBuf::from(path);
        } else if positional.is_none() && !arg.starts_with('-') {
            positional = Some(arg);
        }
    }
    positional
        .or(env)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
