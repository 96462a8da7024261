//! Blocking frame-paced host loop
//!
//! Drives a [`Session`] at the target tick rate on the calling thread. The
//! tick function itself is pure, so this loop is only pacing and plumbing:
//! sample input, tick, hand the snapshot to the sink, sleep the remainder of
//! the frame. Tests and other hosts can skip it and step sessions manually.

use std::thread;
use std::time::{Duration, Instant};

use crate::consts::{PAUSE_POLL_INTERVAL, TICK_INTERVAL};
use crate::session::Session;
use crate::sim::{FrameSnapshot, GamePhase, InputSnapshot, TerminalEvent};

/// Host request applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Pause,
    Resume,
    Restart,
    Stop,
}

/// Source of per-tick sensor readings and host requests
///
/// A missing or denied sensor is not an error: return zero vectors and the
/// marble simply responds to whatever inputs remain.
pub trait InputSource {
    fn sample(&mut self) -> InputSnapshot;

    /// Pending host request, if any; polled once per loop iteration
    fn poll_command(&mut self) -> Option<SessionCommand> {
        None
    }
}

/// Consumer of per-tick snapshots (rendering, audio, recording)
pub trait FrameSink {
    fn present(&mut self, snapshot: &FrameSnapshot);
}

/// Run `session` until it ends, blocking the calling thread
///
/// Starts the session if it is idle. Returns the terminal event when the
/// playthrough completes or the marble is lost, or `None` when a stop
/// request ends the session early. While paused the loop drops to a slow
/// poll so a backgrounded host burns no cycles on physics.
pub fn run(
    session: &mut Session,
    input: &mut dyn InputSource,
    sink: &mut dyn FrameSink,
) -> Option<TerminalEvent> {
    if session.phase() == GamePhase::Idle {
        session.start();
    }

    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();

        match input.poll_command() {
            Some(SessionCommand::Pause) => session.pause(),
            Some(SessionCommand::Resume) => session.resume(),
            Some(SessionCommand::Restart) => {
                session.restart();
                last_tick = Instant::now();
            }
            Some(SessionCommand::Stop) => session.stop(),
            None => {}
        }

        if session.phase() == GamePhase::Paused {
            thread::sleep(Duration::from_secs_f32(PAUSE_POLL_INTERVAL));
            // The frozen interval must not count as elapsed play time.
            last_tick = Instant::now();
            continue;
        }

        let dt = frame_start.duration_since(last_tick).as_secs_f32();
        last_tick = frame_start;

        let Some(snapshot) = session.tick(&input.sample(), dt) else {
            return None;
        };
        sink.present(&snapshot);

        if let Some(terminal) = snapshot.terminal_event {
            return Some(terminal);
        }

        let spent = frame_start.elapsed();
        let budget = Duration::from_secs_f32(TICK_INTERVAL);
        if spent > budget {
            log::warn!(
                "frame overran its budget: {:.1}ms of {:.1}ms",
                spent.as_secs_f32() * 1000.0,
                TICK_INTERVAL * 1000.0
            );
        } else {
            thread::sleep(budget - spent);
        }
    }
}
