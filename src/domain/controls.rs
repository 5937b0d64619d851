/// Input mapper: held-key snapshot → player acceleration / jump.
///
/// The snapshot is collected once per frame by the presentation layer
/// (keyboard, gamepad) and handed to the simulation as a `FrameInput`.

use std::collections::HashMap;

use super::entity::Player;

/// Logical key identifier. Letter keys are stored lowercase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Left,
    Right,
    Up,
    Space,
    Char(char),
}

impl Key {
    /// Fold case on letters and treat `' '` as `Space`.
    pub fn normalized(self) -> Key {
        match self {
            Key::Char(' ') => Key::Space,
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

pub const KEYS_LEFT: &[Key] = &[Key::Left, Key::Char('a')];
pub const KEYS_RIGHT: &[Key] = &[Key::Right, Key::Char('d')];
pub const KEYS_JUMP: &[Key] = &[Key::Up, Key::Char('w'), Key::Space];

/// Which keys are held right now.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeldKeys {
    held: HashMap<Key, bool>,
}

impl HeldKeys {
    pub fn new() -> Self {
        HeldKeys::default()
    }

    pub fn set(&mut self, key: Key, held: bool) {
        self.held.insert(key.normalized(), held);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.get(&key.normalized()).copied().unwrap_or(false)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_held(*k))
    }
}

/// Everything the simulation reads from the outside world in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub keys: HeldKeys,
    /// Restart was requested this frame (edge, not held).
    pub restart: bool,
    /// Leave the game loop.
    pub quit: bool,
}

/// Apply held keys to the player. Returns true if a jump started.
///
/// Left and right each add `speed` per frame with no cap (friction is the
/// only limit). Jump only works from the ground.
pub fn apply(player: &mut Player, keys: &HeldKeys) -> bool {
    let body = &mut player.body;
    if keys.any_held(KEYS_LEFT) {
        body.vx -= player.speed;
    }
    if keys.any_held(KEYS_RIGHT) {
        body.vx += player.speed;
    }
    if keys.any_held(KEYS_JUMP) && body.grounded {
        body.vy = -player.jump;
        body.grounded = false;
        return true;
    }
    false
}
