/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in constants if the file is missing, unreadable,
/// or fails validation. Every key is optional.
///
/// ```toml
/// [world]
/// width = 800.0
/// gravity = 0.6
///
/// [cheese]
/// run_speed = 2.2
///
/// [general]
/// log_level = "debug"
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "config.toml";

// ── Errors ──

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub cheese: CheeseConfig,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
    pub sprite_path: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    /// Where the settings came from. Reported once logging is up.
    pub source: ConfigSource,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    /// A config file was found but rejected; defaults are in effect.
    Fallback { path: PathBuf, reason: String },
}

/// World constants. Units are canvas pixels, velocities are per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub gravity: f32,
    pub friction: f32,
    /// Distance from the bottom edge to the ground line.
    pub ground_offset: f32,
    /// Distance from the right edge to the finish line.
    pub level_end_margin: f32,
    /// How far below a platform's top a falling body may already be and still land on it.
    pub landing_tolerance: f32,
}

impl WorldConfig {
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_offset
    }

    pub fn level_end_x(&self) -> f32 {
        self.width - self.level_end_margin
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerConfig {
    pub spawn_x: f32,
    pub width: f32,
    pub height: f32,
    /// Horizontal acceleration per frame while a direction is held.
    pub speed: f32,
    /// Upward impulse applied on jump.
    pub jump: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheeseConfig {
    pub spawn_x: f32,
    pub radius: f32,
    pub run_speed: f32,
    pub jump: f32,
    /// Horizontal window ahead of the cheese in which platforms trigger a jump.
    pub lookahead: f32,
    /// A platform must be at least this much higher than the cheese's feet to jump for it.
    pub min_rise: f32,
    /// Capture distance = radius + player's larger side * this fraction.
    pub capture_fraction: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayConfig {
    pub frame_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    cheese: TomlCheese,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default = "default_height")]
    height: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_friction")]
    friction: f32,
    #[serde(default = "default_ground_offset")]
    ground_offset: f32,
    #[serde(default = "default_level_end_margin")]
    level_end_margin: f32,
    #[serde(default = "default_landing_tolerance")]
    landing_tolerance: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_x")]
    spawn_x: f32,
    #[serde(default = "default_player_w")]
    width: f32,
    #[serde(default = "default_player_h")]
    height: f32,
    #[serde(default = "default_player_speed")]
    speed: f32,
    #[serde(default = "default_player_jump")]
    jump: f32,
}

#[derive(Deserialize, Debug)]
struct TomlCheese {
    #[serde(default = "default_cheese_x")]
    spawn_x: f32,
    #[serde(default = "default_cheese_r")]
    radius: f32,
    #[serde(default = "default_cheese_speed")]
    run_speed: f32,
    #[serde(default = "default_cheese_jump")]
    jump: f32,
    #[serde(default = "default_lookahead")]
    lookahead: f32,
    #[serde(default = "default_min_rise")]
    min_rise: f32,
    #[serde(default = "default_capture_fraction")]
    capture_fraction: f32,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_sprite")]
    sprite: String,
    /// Empty string disables the log file.
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_width() -> f32 { 800.0 }
fn default_height() -> f32 { 400.0 }
fn default_gravity() -> f32 { 0.6 }
fn default_friction() -> f32 { 0.85 }
fn default_ground_offset() -> f32 { 60.0 }
fn default_level_end_margin() -> f32 { 40.0 }
fn default_landing_tolerance() -> f32 { 4.0 }

fn default_player_x() -> f32 { 60.0 }
fn default_player_w() -> f32 { 48.0 }
fn default_player_h() -> f32 { 64.0 }
fn default_player_speed() -> f32 { 0.9 }
fn default_player_jump() -> f32 { 12.0 }

fn default_cheese_x() -> f32 { 180.0 }
fn default_cheese_r() -> f32 { 18.0 }
fn default_cheese_speed() -> f32 { 2.2 }
fn default_cheese_jump() -> f32 { 10.5 }
fn default_lookahead() -> f32 { 40.0 }
fn default_min_rise() -> f32 { 6.0 }
fn default_capture_fraction() -> f32 { 1.0 / 3.0 }

fn default_frame_ms() -> u64 { 16 }   // ~60 Hz

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

fn default_sprite() -> String { "assets/player.txt".into() }
fn default_log_file() -> String { "cheese-chase.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            width: default_width(),
            height: default_height(),
            gravity: default_gravity(),
            friction: default_friction(),
            ground_offset: default_ground_offset(),
            level_end_margin: default_level_end_margin(),
            landing_tolerance: default_landing_tolerance(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            spawn_x: default_player_x(),
            width: default_player_w(),
            height: default_player_h(),
            speed: default_player_speed(),
            jump: default_player_jump(),
        }
    }
}

impl Default for TomlCheese {
    fn default() -> Self {
        TomlCheese {
            spawn_x: default_cheese_x(),
            radius: default_cheese_r(),
            run_speed: default_cheese_speed(),
            jump: default_cheese_jump(),
            lookahead: default_lookahead(),
            min_rise: default_min_rise(),
            capture_fraction: default_capture_fraction(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { frame_ms: default_frame_ms() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            restart: default_pad_restart(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            sprite: default_sprite(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        let log_file = if t.general.log_file.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(t.general.log_file))
        };
        GameConfig {
            world: WorldConfig {
                width: t.world.width,
                height: t.world.height,
                gravity: t.world.gravity,
                friction: t.world.friction,
                ground_offset: t.world.ground_offset,
                level_end_margin: t.world.level_end_margin,
                landing_tolerance: t.world.landing_tolerance,
            },
            player: PlayerConfig {
                spawn_x: t.player.spawn_x,
                width: t.player.width,
                height: t.player.height,
                speed: t.player.speed,
                jump: t.player.jump,
            },
            cheese: CheeseConfig {
                spawn_x: t.cheese.spawn_x,
                radius: t.cheese.radius,
                run_speed: t.cheese.run_speed,
                jump: t.cheese.jump,
                lookahead: t.cheese.lookahead,
                min_rise: t.cheese.min_rise,
                capture_fraction: t.cheese.capture_fraction,
            },
            display: DisplayConfig { frame_ms: t.display.frame_ms },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                restart: t.gamepad.restart,
                quit: t.gamepad.quit,
            },
            sprite_path: PathBuf::from(t.general.sprite),
            log_file,
            log_level: t.general.log_level,
            source: ConfigSource::Defaults,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// A rejected file falls back to defaults; the reason ends up in `source`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let Some(path) = search_dirs.iter().map(|d| d.join(CONFIG_FILE)).find(|p| p.exists()) else {
            return GameConfig::default();
        };

        match Self::from_file(&path) {
            Ok(mut cfg) => {
                cfg.sprite_path = resolve_relative(&path, &cfg.sprite_path);
                cfg.log_file = cfg.log_file.map(|f| resolve_relative(&path, &f));
                cfg.source = ConfigSource::File(path);
                cfg
            }
            Err(e) => GameConfig {
                source: ConfigSource::Fallback { path, reason: e.to_string() },
                ..GameConfig::default()
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig::from(parsed);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would break the physics invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        let (p, c) = (&self.player, &self.cheese);
        let fields = [
            ("world.width", w.width),
            ("world.height", w.height),
            ("world.gravity", w.gravity),
            ("world.friction", w.friction),
            ("world.ground_offset", w.ground_offset),
            ("world.level_end_margin", w.level_end_margin),
            ("world.landing_tolerance", w.landing_tolerance),
            ("player.spawn_x", p.spawn_x),
            ("player.width", p.width),
            ("player.height", p.height),
            ("player.speed", p.speed),
            ("player.jump", p.jump),
            ("cheese.spawn_x", c.spawn_x),
            ("cheese.radius", c.radius),
            ("cheese.run_speed", c.run_speed),
            ("cheese.jump", c.jump),
            ("cheese.lookahead", c.lookahead),
            ("cheese.min_rise", c.min_rise),
            ("cheese.capture_fraction", c.capture_fraction),
        ];
        if let Some((name, v)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be a finite number, got {v}")));
        }
        let non_negative = [
            ("world.landing_tolerance", w.landing_tolerance),
            ("cheese.lookahead", c.lookahead),
            ("cheese.capture_fraction", c.capture_fraction),
        ];
        if let Some((name, v)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::Invalid(format!("{name} must not be negative, got {v}")));
        }

        if !(w.width > 0.0 && w.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "world size must be positive, got {}x{}", w.width, w.height
            )));
        }
        if !(0.0..w.height).contains(&w.ground_offset) {
            return Err(ConfigError::Invalid(format!(
                "ground_offset {} puts the ground outside the world", w.ground_offset
            )));
        }
        if !(0.0..=1.0).contains(&w.friction) {
            return Err(ConfigError::Invalid(format!(
                "friction must be within [0, 1], got {}", w.friction
            )));
        }
        if !(0.0..w.width).contains(&w.level_end_margin) {
            return Err(ConfigError::Invalid(format!(
                "level_end_margin {} puts the finish line outside the world", w.level_end_margin
            )));
        }

        if p.width <= 0.0 || p.height <= 0.0 || p.width > w.width || p.height > w.ground_y() {
            return Err(ConfigError::Invalid(format!(
                "player size {}x{} does not fit the world", p.width, p.height
            )));
        }
        let diameter = c.radius * 2.0;
        if c.radius <= 0.0 || diameter > w.width || diameter > w.ground_y() {
            return Err(ConfigError::Invalid(format!(
                "cheese radius {} does not fit the world", c.radius
            )));
        }
        if self.display.frame_ms == 0 {
            return Err(ConfigError::Invalid("display.frame_ms must be at least 1".into()));
        }
        Ok(())
    }
}

/// Relative asset paths in a config file are relative to that file.
fn resolve_relative(config_path: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) => dir.join(target),
        None => target.to_path_buf(),
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
