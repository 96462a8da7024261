//! Tilt Maze entry point
//!
//! Headless demo host: loads a `.ggb` level and drives a session through the
//! frame-paced loop with synthetic keyboard tilt steering toward the goal,
//! printing one snapshot per second as JSON. Rendering and sensor hosts
//! embed the library the same way.

use std::cell::Cell;
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use glam::Vec2;

use tilt_maze::consts::TARGET_FRAME_RATE;
use tilt_maze::runner::{self, FrameSink, InputSource};
use tilt_maze::sim::FrameSnapshot;
use tilt_maze::{InputSnapshot, LevelCache, Session, TerminalEvent};

/// Steers toward the goal with synthetic keyboard tilt
///
/// Reads the marble position the sink recorded on the previous frame.
struct GoalSeeker {
    goal: Vec2,
    player: Rc<Cell<Vec2>>,
}

impl InputSource for GoalSeeker {
    fn sample(&mut self) -> InputSnapshot {
        let to_goal = self.goal - self.player.get();
        InputSnapshot::from_keys(
            to_goal.x < -1.0,
            to_goal.x > 1.0,
            to_goal.y < -1.0,
            to_goal.y > 1.0,
        )
    }
}

struct JsonPrinter {
    frame: u32,
    player: Rc<Cell<Vec2>>,
}

impl FrameSink for JsonPrinter {
    fn present(&mut self, snapshot: &FrameSnapshot) {
        self.player.set(snapshot.player_position);
        self.frame += 1;
        if self.frame % TARGET_FRAME_RATE == 0 || snapshot.terminal_event.is_some() {
            match serde_json::to_string(snapshot) {
                Ok(json) => println!("{json}"),
                Err(err) => log::error!("failed to serialize snapshot: {err}"),
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: tilt-maze <level.ggb>");
        return ExitCode::FAILURE;
    };

    let cache = LevelCache::default();
    let level = match cache.load(Path::new(&path)) {
        Ok(level) => level,
        Err(err) => {
            log::error!("could not load level {path:?}: {err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "level {}: {} walls, {} holes, {}x{}",
        level.id,
        level.walls.len(),
        level.holes.len(),
        level.map_width,
        level.map_height
    );

    let player = Rc::new(Cell::new(level.start_position));
    let mut input = GoalSeeker {
        goal: level.goal_position,
        player: Rc::clone(&player),
    };
    let mut sink = JsonPrinter { frame: 0, player };

    let mut session = Session::new(level);
    match runner::run(&mut session, &mut input, &mut sink) {
        Some(TerminalEvent::Completed { elapsed_time }) => {
            log::info!("completed in {elapsed_time:.2}s");
        }
        Some(TerminalEvent::GameOver) => log::info!("marble lost"),
        None => log::info!("session stopped"),
    }
    ExitCode::SUCCESS
}
