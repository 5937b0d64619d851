/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Restart request (any phase)
///   2. Ended? stop here, nothing moves until restart
///   3. Player input
///   4. Cheese AI
///   5. Physics: player (with friction), then cheese
///   6. Win / lose check (capture before escape)

use crate::domain::controls::{self, FrameInput};
use crate::domain::{ai, physics, rules};
use super::event::GameEvent;
use super::world::WorldState;

pub fn step(world: &mut WorldState, input: &FrameInput) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.restart {
        world.reset();
        events.push(GameEvent::Restarted);
    }

    if world.is_over() {
        return events;
    }

    if controls::apply(&mut world.player, &input.keys) {
        events.push(GameEvent::PlayerJumped);
    }
    if let Some(platform) = ai::pursue(&mut world.cheese.body, &world.platforms, &world.cheese_cfg) {
        events.push(GameEvent::CheeseJumped { platform });
    }

    physics::apply(&mut world.player.body, &world.platforms, &world.bounds, true);
    physics::apply(&mut world.cheese.body, &world.platforms, &world.bounds, false);

    world.frame += 1;

    if let Some(outcome) = rules::check_outcome(
        &world.player.body,
        &world.cheese.body,
        &world.cheese_cfg,
        &world.bounds,
    ) {
        world.finish(outcome);
        events.push(GameEvent::Ended { outcome, frame: world.frame });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::controls::Key;
    use crate::domain::rules::Outcome;
    use crate::sim::world::Phase;

    fn world() -> WorldState {
        WorldState::new(&GameConfig::default())
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn holding(keys: &[Key]) -> FrameInput {
        let mut input = FrameInput::default();
        for k in keys {
            input.keys.set(*k, true);
        }
        input
    }

    fn restart() -> FrameInput {
        FrameInput { restart: true, ..FrameInput::default() }
    }

    #[test]
    fn idle_run_ends_in_escape() {
        let mut w = world();
        let mut ended = None;
        for _ in 0..400 {
            for e in step(&mut w, &idle()) {
                if let GameEvent::Ended { outcome, frame } = e {
                    ended = Some((outcome, frame));
                }
            }
            if w.is_over() {
                break;
            }
        }
        let (outcome, frame) = ended.expect("run should end");
        assert_eq!(outcome, Outcome::Escaped);
        assert!(frame > 200 && frame < 300, "escaped at frame {frame}");
        assert_eq!(w.message, Outcome::Escaped.message());
    }

    #[test]
    fn cheese_jumps_for_a_platform_on_the_way() {
        let mut w = world();
        let mut jumped = false;
        for _ in 0..250 {
            let events = step(&mut w, &idle());
            jumped |= events.iter().any(|e| matches!(e, GameEvent::CheeseJumped { .. }));
            if w.is_over() {
                break;
            }
        }
        assert!(jumped);
    }

    #[test]
    fn touching_the_cheese_captures_it() {
        let mut w = world();
        w.player.body.x = w.cheese.body.x - 20.0;
        let events = step(&mut w, &idle());
        assert_eq!(w.phase, Phase::Ended(Outcome::Captured));
        assert_eq!(w.message, Outcome::Captured.message());
        assert!(events.contains(&GameEvent::Ended { outcome: Outcome::Captured, frame: 1 }));
    }

    #[test]
    fn capture_and_escape_in_same_frame_is_capture() {
        let mut w = world();
        w.cheese.body.x = 730.0;
        w.player.body.x = 715.0;
        step(&mut w, &idle());
        assert_eq!(w.outcome(), Some(Outcome::Captured));
    }

    #[test]
    fn ended_world_is_frozen() {
        let mut w = world();
        w.finish(Outcome::Escaped);
        let before = w.clone();
        let events = step(&mut w, &holding(&[Key::Right, Key::Space]));
        assert!(events.is_empty());
        assert_eq!(w, before);
    }

    #[test]
    fn restart_resumes_play() {
        let mut w = world();
        w.finish(Outcome::Escaped);
        let events = step(&mut w, &restart());
        assert_eq!(events.first(), Some(&GameEvent::Restarted));
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.frame, 1);
    }

    #[test]
    fn jump_after_landing() {
        let mut w = world();
        step(&mut w, &idle());
        assert!(w.player.body.grounded);
        let events = step(&mut w, &holding(&[Key::Space]));
        assert!(events.contains(&GameEvent::PlayerJumped));
        assert!(w.player.body.vy < 0.0);
        assert!(!w.player.body.grounded);
    }

    #[test]
    fn left_at_world_edge_clamps_without_zeroing_velocity() {
        let mut w = world();
        w.player.body.x = 0.0;
        step(&mut w, &holding(&[Key::Left]));
        assert_eq!(w.player.body.x, 0.0);
        assert!(w.player.body.vx < 0.0);
    }

    #[test]
    fn running_right_moves_player() {
        let mut w = world();
        for _ in 0..30 {
            step(&mut w, &holding(&[Key::Char('d')]));
        }
        assert!(w.player.body.x > 100.0);
    }
}
