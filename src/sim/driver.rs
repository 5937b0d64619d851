/// Frame loop driver.
///
/// Runs `poll input → step → present → wait` until the stop condition says
/// otherwise. The host supplies everything that touches the outside world,
/// so tests can run a fixed number of frames with scripted input and no
/// terminal.

use std::io;
use std::time::{Duration, Instant};

use crate::domain::controls::FrameInput;
use super::event::GameEvent;
use super::step;
use super::world::WorldState;

/// The outside world as seen by the frame loop.
pub trait FrameHost {
    /// Collect this frame's input snapshot.
    fn poll_input(&mut self) -> FrameInput;

    /// Called after every step with the events it produced.
    fn on_events(&mut self, _world: &WorldState, _events: &[GameEvent]) {}

    /// Draw the current state. Runs every frame, including after the game ended.
    fn present(&mut self, world: &WorldState) -> io::Result<()>;

    /// Block until the next frame is due.
    fn wait_frame(&mut self) {}
}

/// Run until `stop(world, input, frames_so_far)` returns true.
/// The stop check sees the freshly polled input before it is applied.
/// Returns the number of frames executed.
pub fn run<H, S>(world: &mut WorldState, host: &mut H, mut stop: S) -> io::Result<u64>
where
    H: FrameHost,
    S: FnMut(&WorldState, &FrameInput, u64) -> bool,
{
    let mut frames: u64 = 0;
    loop {
        let input = host.poll_input();
        if stop(world, &input, frames) {
            break;
        }

        let events = step::step(world, &input);
        host.on_events(world, &events);
        host.present(world)?;
        frames += 1;

        host.wait_frame();
    }
    Ok(frames)
}

/// Fixed-rate pacing for the frame loop.
pub struct FramePacer {
    interval: Duration,
    last: Instant,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        FramePacer { interval, last: Instant::now() }
    }

    /// Sleep off whatever is left of the current frame.
    /// A frame that overran starts the next one immediately.
    pub fn wait(&mut self) {
        let elapsed = self.last.elapsed();
        if elapsed < self.interval {
            std::thread::sleep(self.interval - elapsed);
        }
        self.last = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::controls::Key;
    use crate::domain::rules::Outcome;

    /// Replays a fixed input script, then idles.
    #[derive(Default)]
    struct ScriptedHost {
        script: Vec<FrameInput>,
        polled: usize,
        presented: usize,
        events: Vec<GameEvent>,
        fail_present_at: Option<usize>,
    }

    impl FrameHost for ScriptedHost {
        fn poll_input(&mut self) -> FrameInput {
            let input = self.script.get(self.polled).cloned().unwrap_or_default();
            self.polled += 1;
            input
        }

        fn on_events(&mut self, _world: &WorldState, events: &[GameEvent]) {
            self.events.extend_from_slice(events);
        }

        fn present(&mut self, _world: &WorldState) -> io::Result<()> {
            if self.fail_present_at == Some(self.presented) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"));
            }
            self.presented += 1;
            Ok(())
        }
    }

    fn world() -> WorldState {
        WorldState::new(&GameConfig::default())
    }

    /// Stop after exactly `n` frames.
    fn after_frames(n: u64) -> impl FnMut(&WorldState, &FrameInput, u64) -> bool {
        move |_, _, frames| frames >= n
    }

    #[test]
    fn runs_exact_frame_count() {
        let mut w = world();
        let mut host = ScriptedHost::default();
        let frames = run(&mut w, &mut host, after_frames(10)).unwrap();
        assert_eq!(frames, 10);
        assert_eq!(host.presented, 10);
        assert_eq!(w.frame, 10);
    }

    #[test]
    fn quit_input_stops_before_stepping() {
        let mut w = world();
        let quit = FrameInput { quit: true, ..FrameInput::default() };
        let mut host = ScriptedHost {
            script: vec![FrameInput::default(), FrameInput::default(), quit],
            ..ScriptedHost::default()
        };
        let frames = run(&mut w, &mut host, |_, input, _| input.quit).unwrap();
        assert_eq!(frames, 2);
        assert_eq!(w.frame, 2);
    }

    #[test]
    fn keeps_presenting_after_game_over() {
        let mut w = world();
        let mut host = ScriptedHost::default();
        let frames = run(&mut w, &mut host, after_frames(400)).unwrap();
        assert_eq!(frames, 400);
        assert_eq!(host.presented, 400);
        assert_eq!(w.outcome(), Some(Outcome::Escaped));
        // Simulation stopped counting once the run ended
        assert!(w.frame < 400);
        let ended = host.events.iter().filter(|e| matches!(e, GameEvent::Ended { .. })).count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn same_script_same_result() {
        let mut script = Vec::new();
        for i in 0..120 {
            let mut input = FrameInput::default();
            input.keys.set(Key::Right, true);
            input.keys.set(Key::Up, i % 30 == 0);
            script.push(input);
        }

        let mut a = world();
        let mut b = world();
        let mut host_a = ScriptedHost { script: script.clone(), ..ScriptedHost::default() };
        let mut host_b = ScriptedHost { script, ..ScriptedHost::default() };
        run(&mut a, &mut host_a, after_frames(120)).unwrap();
        run(&mut b, &mut host_b, after_frames(120)).unwrap();
        assert_eq!(a, b);
        assert_eq!(host_a.events, host_b.events);
    }

    #[test]
    fn present_error_propagates() {
        let mut w = world();
        let mut host = ScriptedHost { fail_present_at: Some(3), ..ScriptedHost::default() };
        let err = run(&mut w, &mut host, after_frames(10)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(host.presented, 3);
    }

    #[test]
    fn pacer_waits_out_the_interval() {
        let mut pacer = FramePacer::new(Duration::from_millis(5));
        let start = Instant::now();
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(9));
    }
}
