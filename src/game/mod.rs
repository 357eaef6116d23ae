mod session;

pub use session::{Outcome, Phase, Session, SessionEvent};

use std::fmt;
use std::time::Duration;

/// Rounds per session unless overridden on the command line.
pub const DEFAULT_ROUNDS: u32 = 10;
/// Guessing time per round, seconds, unless overridden on the command line.
pub const DEFAULT_TIME_LIMIT_SECS: u64 = 5;
/// How long the reveal stays on screen.
pub const RESULT_TIME: Duration = Duration::from_millis(3000);
/// How long the signal line is held high after a missed round.
pub const SIGNAL_HOLD: Duration = Duration::from_millis(2500);
/// Dead time between rounds, so a keystroke aimed at round N is not
/// consumed by round N+1.
pub const INPUT_SETTLE: Duration = Duration::from_millis(500);

/// Final report handed back to the caller when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u32,
    pub rounds_played: u32,
    pub total_rounds: u32,
}

impl fmt::Display for GameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.score, self.total_rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_renders_score_over_total() {
        let summary = GameSummary {
            score: 7,
            rounds_played: 10,
            total_rounds: 10,
        };
        assert_eq!(summary.to_string(), "7 / 10");
    }
}
