/// Win / lose rules.
///
/// Pure functions: they report an outcome, the caller applies it.
///
/// | Check   | Condition                                                   | Result   |
/// |---------|-------------------------------------------------------------|----------|
/// | capture | center distance < radius + max(w, h) * capture_fraction     | Captured |
/// | escape  | cheese right edge >= level end                              | Escaped  |
///
/// Capture is checked first, so a frame where both hold is a capture.

use crate::config::{CheeseConfig, WorldConfig};
use super::entity::Body;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Captured,
    Escaped,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Captured => "You caught the cheese!",
            Outcome::Escaped => "The cheese got away! Press R to try again.",
        }
    }
}

pub fn is_captured(player: &Body, cheese: &Body, capture_fraction: f32) -> bool {
    let (px, py) = player.center();
    let (cx, cy) = cheese.center();
    let dist = (cx - px).hypot(cy - py);
    let radius = cheese.width() / 2.0;
    dist < radius + player.width().max(player.height()) * capture_fraction
}

pub fn has_escaped(cheese: &Body, level_end_x: f32) -> bool {
    cheese.right() >= level_end_x
}

pub fn check_outcome(
    player: &Body,
    cheese: &Body,
    cfg: &CheeseConfig,
    world: &WorldConfig,
) -> Option<Outcome> {
    if is_captured(player, cheese, cfg.capture_fraction) {
        Some(Outcome::Captured)
    } else if has_escaped(cheese, world.level_end_x()) {
        Some(Outcome::Escaped)
    } else {
        None
    }
}
