/// Entry point: terminal setup, the frame host, and teardown.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use env_logger::{Env, Target};

use config::{ConfigSource, GameConfig};
use domain::controls::FrameInput;
use sim::driver::{self, FrameHost, FramePacer};
use sim::event::GameEvent;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sprite::SpriteAsset;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    report_config_source(&config.source);

    let mut world = WorldState::new(&config);
    let mut renderer = Renderer::new();

    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };
    log::info!("terminal ready (key release events: {honor_release})");

    let mut gamepad = GamepadState::new();
    gamepad.load_button_config(&config.gamepad);
    if gamepad.connected {
        log::info!("gamepad detected");
    }

    let mut host = TerminalHost {
        keyboard: InputState::new(honor_release),
        gamepad,
        renderer,
        sprite: SpriteAsset::load(config.sprite_path.clone()),
        pacer: FramePacer::new(Duration::from_millis(config.display.frame_ms)),
        last_message: String::new(),
    };

    let result = driver::run(&mut world, &mut host, |_, input, _| input.quit);

    if let Err(e) = host.renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(frames) => log::info!("quit after {frames} frames"),
        Err(e) => {
            log::error!("frame loop failed: {e}");
            eprintln!("Game error: {e}");
        }
    }

    println!();
    println!("Thanks for playing Cheese Chase!");
    println!("{}", world.message);
}

#[derive(Debug, thiserror::Error)]
enum LogInitError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logger already installed: {0}")]
    Install(#[from] log::SetLoggerError),
}

/// Route `log` output to the configured file. The terminal belongs to the
/// renderer, so with no usable file logging stays off.
fn init_logging(config: &GameConfig) {
    let Some(path) = &config.log_file else { return };
    if let Err(e) = install_file_logger(path, &config.log_level) {
        eprintln!("Logging disabled: {e}");
    }
}

fn install_file_logger(path: &Path, level: &str) -> Result<(), LogInitError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogInitError::Open { path: path.to_path_buf(), source })?;
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn report_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::Defaults => log::info!("no config.toml found, using defaults"),
        ConfigSource::File(path) => log::info!("loaded config from {}", path.display()),
        ConfigSource::Fallback { path, reason } => {
            log::warn!("ignoring {}: {reason}; using defaults", path.display());
        }
    }
}

/// Terminal, keyboard, gamepad and sprite wired into the frame loop.
struct TerminalHost {
    keyboard: InputState,
    gamepad: GamepadState,
    renderer: Renderer,
    sprite: SpriteAsset,
    pacer: FramePacer,
    last_message: String,
}

impl FrameHost for TerminalHost {
    fn poll_input(&mut self) -> FrameInput {
        self.keyboard.drain_events();
        self.gamepad.update();

        let mut input = self.keyboard.snapshot();
        self.gamepad.merge_into(&mut input);
        input
    }

    fn on_events(&mut self, _world: &WorldState, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Restarted => log::info!("run restarted"),
                GameEvent::PlayerJumped => log::debug!("player jumped"),
                GameEvent::CheeseJumped { platform } => {
                    log::debug!("cheese jumped toward platform {platform}");
                }
                GameEvent::Ended { outcome, frame } => {
                    log::info!("run ended at frame {frame}: {outcome:?}");
                }
            }
        }
    }

    fn present(&mut self, world: &WorldState) -> io::Result<()> {
        if !self.sprite.is_complete() {
            self.sprite.poll();
        }
        if world.message != self.last_message {
            log::debug!("status: {}", world.message);
            self.last_message.clone_from(&world.message);
        }
        self.renderer.render(world, self.sprite.get())
    }

    fn wait_frame(&mut self) {
        self.pacer.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unopenable_log_file_is_reported() {
        let err = install_file_logger(Path::new("/nonexistent/cheese-chase/log.txt"), "info").unwrap_err();
        assert!(matches!(err, LogInitError::Open { .. }));
    }

    #[test]
    fn second_logger_install_is_reported() {
        let path = std::env::temp_dir().join(format!("cheese-chase-log-{}.txt", std::process::id()));
        let _ = install_file_logger(&path, "info");
        let err = install_file_logger(&path, "info").unwrap_err();
        assert!(matches!(err, LogInitError::Install(_)));
        let _ = std::fs::remove_file(path);
    }
}
