//! Stagehand demo runtime
//!
//! Drives the sound and fade managers through a simulated frame loop, running
//! the commands scheduled in the config file.
//!
//! Run with: cargo run -p stagehand_runtime -- --config stagehand.toml

mod config;
mod demo;

use config::DemoConfig;
use demo::{Demo, DemoError};
use stagehand_audio::Channel;
use stagehand_core::SingletonRegistry;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    let path = config::resolve_config_path(
        std::env::args().skip(1),
        std::env::var("STAGEHAND_CONFIG").ok(),
    );
    let config = DemoConfig::load(&path)?;
    config.print_summary();

    let mut demo = Demo::new(&config, SingletonRegistry::new())?;
    let summary = demo.run();
    if summary.settled_at.is_none() {
        log::warn!("Stage still fading after {} frames", summary.frames);
    }

    let stage = demo.stage().lock();
    log::info!(
        "Final state: channel 0 volume {:.2}, overlay alpha {:.2}",
        stage.sounds.channel(0).volume(),
        stage.fade.alpha()
    );
    Ok(())
}
