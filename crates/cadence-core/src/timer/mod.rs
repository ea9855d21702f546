mod driver;
mod engine;

pub use driver::{run_countdown, CancellationToken, CountdownOutcome};
pub use engine::{FocusTimer, TimerState};
