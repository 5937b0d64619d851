/// WorldState: the simulation context for one running game.
///
/// Owned by the frame loop and passed by `&mut` into every step; nothing
/// lives in globals. Constants are copied in from `GameConfig` at startup
/// and never change afterwards.
///
/// ## Lifecycle
///
/// ```text
///   new() ──► Playing ──(capture | escape)──► Ended(outcome)
///                ▲                                 │
///                └──────────── reset() ◄───────────┘
/// ```
///
/// `reset()` may be called in any phase and is idempotent.

use crate::config::{CheeseConfig, GameConfig, PlayerConfig, WorldConfig};
use crate::domain::entity::{Cheese, Platform, Player};
use crate::domain::rules::Outcome;
use super::level;

pub const START_MESSAGE: &str = "Catch the cheese before it gets away!";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Ended(Outcome),
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    // ── Constants ──
    pub bounds: WorldConfig,
    pub player_cfg: PlayerConfig,
    pub cheese_cfg: CheeseConfig,

    // ── Geometry (fixed at startup) ──
    pub platforms: Vec<Platform>,

    // ── Entities ──
    pub player: Player,
    pub cheese: Cheese,

    // ── Meta ──
    pub phase: Phase,
    /// Status line: instruction while playing, outcome once ended.
    pub message: String,
    /// Simulated frames since the last reset.
    pub frame: u64,
}

impl WorldState {
    pub fn new(config: &GameConfig) -> Self {
        let bounds = config.world;
        WorldState {
            bounds,
            player_cfg: config.player,
            cheese_cfg: config.cheese,
            platforms: level::course_platforms(&bounds),
            player: Player::spawn(&config.player, &bounds),
            cheese: Cheese::spawn(&config.cheese, &bounds),
            phase: Phase::Playing,
            message: START_MESSAGE.to_string(),
            frame: 0,
        }
    }

    /// Put both entities back at their spawns and start a fresh run.
    pub fn reset(&mut self) {
        self.player = Player::spawn(&self.player_cfg, &self.bounds);
        self.cheese = Cheese::spawn(&self.cheese_cfg, &self.bounds);
        self.phase = Phase::Playing;
        self.message = START_MESSAGE.to_string();
        self.frame = 0;
    }

    /// End the run. Ignored if it already ended.
    pub fn finish(&mut self, outcome: Outcome) {
        if self.is_over() {
            return;
        }
        self.phase = Phase::Ended(outcome);
        self.message = outcome.message().to_string();
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Ended(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Ended(o) => Some(o),
            Phase::Playing => None,
        }
    }
}
