/// Keyboard state tracker.
///
/// Turns the terminal's key event stream into the per-frame `FrameInput`
/// snapshot the simulation reads:
///   - held keys for running and jumping
///   - restart on key-down of `r`, independent of held tracking
///   - quit on Esc, `q`, or Ctrl+C
///
/// Uses crossterm's Release events when the terminal supports keyboard
/// enhancement. Otherwise a key counts as released once no Press/Repeat
/// event has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::controls::{FrameInput, Key};

/// Only used when the terminal doesn't report Release events.
/// Must outlast the OS key-repeat delay or a held key flickers.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each game key.
    last_active: HashMap<Key, Instant>,

    restart: bool,
    quit: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

/// Game key for a terminal key code. Anything else is ignored.
pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Char(c) => Some(Key::Char(c).normalized()),
        _ => None,
    }
}

impl InputState {
    pub fn new(honor_release: bool) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            restart: false,
            quit: false,
            honor_release,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.restart = false;
        self.quit = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    /// Build this frame's snapshot.
    pub fn snapshot(&self) -> FrameInput {
        let mut input = FrameInput::default();
        for key in self.last_active.keys() {
            input.keys.set(*key, true);
        }
        input.restart = self.restart;
        input.quit = self.quit;
        input
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let is_press = key.kind == KeyEventKind::Press;

        if is_press {
            match key.code {
                KeyCode::Esc => self.quit = true,
                KeyCode::Char('c') | KeyCode::Char('C')
                    if key.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    self.quit = true;
                    return;
                }
                _ => {}
            }
        }

        let Some(game_key) = map_key(key.code) else { return };

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&game_key);
            }
            KeyEventKind::Release => {
                // Unreliable without enhancement; the timeout handles it
            }
            _ => {
                match game_key {
                    Key::Char('r') if is_press => self.restart = true,
                    Key::Char('q') if is_press => self.quit = true,
                    _ => {}
                }
                self.last_active.insert(game_key, now);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        if self.honor_release {
            return;
        }
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    #[cfg(test)]
    fn clear_edges(&mut self) {
        self.restart = false;
        self.quit = false;
    }
}
