/// Events emitted during a simulation step.
/// The presentation layer consumes these for logging.

use crate::domain::rules::Outcome;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Restarted,
    PlayerJumped,
    CheeseJumped { platform: usize },
    Ended { outcome: Outcome, frame: u64 },
}
