use std::time::{Duration, Instant};

use super::{GameSummary, INPUT_SETTLE, RESULT_TIME, SIGNAL_HOLD};

/// How a guessing phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    TimedOut,
}

impl Outcome {
    /// Time expiry and a wrong guess are treated identically for
    /// signaling; only a correct guess never raises the line.
    pub fn missed(self) -> bool {
        !matches!(self, Outcome::Correct)
    }
}

/// Current phase of the round lifecycle. Each variant owns exactly the
/// timers and flags it needs.
#[derive(Debug, Clone, Copy)]
pub enum Phase {
    /// Silhouette on screen, countdown running, input accumulating.
    Guessing { deadline: Instant },
    /// Sprite and name revealed statically; the signal line is raised and
    /// lowered from here on missed rounds.
    ShowingResult {
        since: Instant,
        outcome: Outcome,
        signal_raised: bool,
        signal_lowered: bool,
    },
    /// Input-settle buffer before the next round.
    Transitioning { since: Instant },
    /// All rounds played.
    Finished,
}

/// Side effects that became due, for the shell to carry out in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The countdown ran out before a submit.
    TimeExpired,
    /// Drive the peripheral line high.
    RaiseSignal,
    /// Drive the peripheral line low.
    LowerSignal,
    /// Load the next species and call [`Session::begin_round`].
    AdvanceRound,
    /// The session is over.
    Finished(GameSummary),
}

/// Round-lifecycle state machine.
///
/// Pure: the caller feeds wall-clock instants in and maps the returned
/// [`SessionEvent`]s onto sounds, serial writes and fetches, so the whole
/// lifecycle can be driven with synthetic time under test.
pub struct Session {
    target: String,
    phase: Phase,
    round: u32,
    total_rounds: u32,
    score: u32,
    guess_time: Duration,
}

impl Session {
    pub fn new(first_target: String, total_rounds: u32, guess_time: Duration, now: Instant) -> Self {
        Self {
            target: first_target,
            phase: Phase::Guessing {
                deadline: now + guess_time,
            },
            round: 1,
            total_rounds,
            score: 0,
            guess_time,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// 1-based index of the current round.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Lowercase name the current guess is checked against.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Time left on the countdown, clamped at zero.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::Guessing { deadline } => deadline.saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    /// Summary as of now; also valid for a session aborted early.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            rounds_played: self.round,
            total_rounds: self.total_rounds,
        }
    }

    /// Check a submitted guess against the target, case-insensitively,
    /// for exact equality. Returns `None` outside the guessing phase:
    /// stray submits are discarded.
    pub fn submit(&mut self, guess: &str, now: Instant) -> Option<Outcome> {
        let Phase::Guessing { .. } = self.phase else {
            return None;
        };
        let outcome = if guess.to_lowercase() == self.target {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        if outcome == Outcome::Correct {
            self.score += 1;
        }
        self.phase = Phase::ShowingResult {
            since: now,
            outcome,
            signal_raised: false,
            signal_lowered: false,
        };
        Some(outcome)
    }

    /// Install the next round's target and restart the countdown. Called
    /// by the shell in response to [`SessionEvent::AdvanceRound`], after
    /// the (blocking) sprite fetch.
    pub fn begin_round(&mut self, target: String, now: Instant) {
        self.target = target;
        self.phase = Phase::Guessing {
            deadline: now + self.guess_time,
        };
    }

    /// Advance timers and return the side effects that became due.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match &mut self.phase {
            Phase::Guessing { deadline } => {
                if now >= *deadline {
                    events.push(SessionEvent::TimeExpired);
                    self.phase = Phase::ShowingResult {
                        since: now,
                        outcome: Outcome::TimedOut,
                        signal_raised: false,
                        signal_lowered: false,
                    };
                }
            }
            Phase::ShowingResult {
                since,
                outcome,
                signal_raised,
                signal_lowered,
            } => {
                if !*signal_raised && outcome.missed() {
                    *signal_raised = true;
                    events.push(SessionEvent::RaiseSignal);
                }
                if *signal_raised && !*signal_lowered && now.duration_since(*since) >= SIGNAL_HOLD {
                    *signal_lowered = true;
                    events.push(SessionEvent::LowerSignal);
                }
                if now.duration_since(*since) >= RESULT_TIME {
                    self.phase = Phase::Transitioning { since: now };
                }
            }
            Phase::Transitioning { since } => {
                if now.duration_since(*since) >= INPUT_SETTLE {
                    if self.round < self.total_rounds {
                        self.round += 1;
                        // Hold the old target until begin_round installs
                        // the new one; no submits can land in between
                        // because the shell advances synchronously.
                        self.phase = Phase::Guessing {
                            deadline: now + self.guess_time,
                        };
                        events.push(SessionEvent::AdvanceRound);
                    } else {
                        self.phase = Phase::Finished;
                        events.push(SessionEvent::Finished(self.summary()));
                    }
                }
            }
            Phase::Finished => {}
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUESS: Duration = Duration::from_secs(5);

    fn session(now: Instant) -> Session {
        Session::new("pikachu".to_string(), 10, GUESS, now)
    }

    fn at(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    /// Drive one round to the point where the next one starts (or the
    /// session finishes), returning all events seen along the way.
    fn run_round(s: &mut Session, t0: Instant, guess: Option<&str>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut now = t0;
        if let Some(guess) = guess {
            s.submit(guess, now);
        } else {
            now = at(t0, 5_000);
            events.extend(s.tick(now));
        }
        for step in [0, 2_500, 3_000, 3_500] {
            events.extend(s.tick(now + Duration::from_millis(step)));
        }
        if matches!(s.phase(), Phase::Guessing { .. }) {
            s.begin_round("pikachu".to_string(), now + Duration::from_millis(3_500));
        }
        events
    }

    #[test]
    fn case_insensitive_match_round_trips() {
        let t0 = Instant::now();
        for variant in ["pikachu", "PIKACHU", "PiKaChu", "Pikachu"] {
            let mut s = session(t0);
            assert_eq!(s.submit(variant, t0), Some(Outcome::Correct));
        }
    }

    #[test]
    fn wrong_guess_scores_nothing_and_raises_then_lowers() {
        let t0 = Instant::now();
        let mut s = session(t0);
        assert_eq!(s.submit("rattata", t0), Some(Outcome::Incorrect));
        assert_eq!(s.score(), 0);

        // Raise comes on the first result tick, lower only after the hold.
        assert_eq!(s.tick(at(t0, 100)), vec![SessionEvent::RaiseSignal]);
        assert_eq!(s.tick(at(t0, 2_000)), vec![]);
        assert_eq!(s.tick(at(t0, 2_500)), vec![SessionEvent::LowerSignal]);
        assert_eq!(s.tick(at(t0, 2_900)), vec![]);
    }

    #[test]
    fn correct_guess_never_touches_the_signal_line() {
        let t0 = Instant::now();
        let mut s = session(t0);
        assert_eq!(s.submit("Pikachu", t0), Some(Outcome::Correct));
        assert_eq!(s.score(), 1);

        for millis in [0, 1_000, 2_500, 2_999] {
            assert_eq!(s.tick(at(t0, millis)), vec![]);
        }
    }

    #[test]
    fn timeout_is_signaled_like_a_wrong_guess() {
        let t0 = Instant::now();
        let mut s = session(t0);
        assert_eq!(s.tick(at(t0, 4_999)), vec![]);
        assert_eq!(s.tick(at(t0, 5_000)), vec![SessionEvent::TimeExpired]);

        let t1 = at(t0, 5_000);
        assert_eq!(s.tick(at(t1, 0)), vec![SessionEvent::RaiseSignal]);
        assert_eq!(s.tick(at(t1, 2_500)), vec![SessionEvent::LowerSignal]);
    }

    #[test]
    fn stray_submits_outside_guessing_are_discarded() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.submit("rattata", t0);
        assert_eq!(s.submit("pikachu", at(t0, 100)), None);
        assert_eq!(s.score(), 0);

        // Still none during the input-settle buffer.
        s.tick(at(t0, 3_000));
        assert!(matches!(s.phase(), Phase::Transitioning { .. }));
        assert_eq!(s.submit("pikachu", at(t0, 3_100)), None);
    }

    #[test]
    fn result_holds_then_transition_buffers_input() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.submit("pikachu", t0);
        s.tick(at(t0, 2_999));
        assert!(matches!(s.phase(), Phase::ShowingResult { .. }));
        s.tick(at(t0, 3_000));
        assert!(matches!(s.phase(), Phase::Transitioning { .. }));

        let t1 = at(t0, 3_000);
        s.tick(at(t1, 499));
        assert!(matches!(s.phase(), Phase::Transitioning { .. }));
        let events = s.tick(at(t1, 500));
        assert_eq!(events, vec![SessionEvent::AdvanceRound]);
        assert_eq!(s.round(), 2);
    }

    #[test]
    fn begin_round_restarts_the_countdown() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.submit("rattata", t0);
        let t1 = at(t0, 60_000);
        s.begin_round("mew".to_string(), t1);
        assert_eq!(s.target(), "mew");
        assert_eq!(s.remaining(t1), GUESS);
        assert_eq!(s.remaining(at(t1, 1_500)), Duration::from_millis(3_500));
    }

    #[test]
    fn ten_rounds_with_seven_correct_reports_seven_of_ten() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let mut all_events = Vec::new();
        let mut now = t0;

        for round in 0..10 {
            let guess = if round < 7 { Some("pikachu") } else { None };
            all_events.extend(run_round(&mut s, now, guess));
            now += Duration::from_secs(60);
        }

        let summary = match all_events.last() {
            Some(SessionEvent::Finished(summary)) => *summary,
            other => panic!("expected Finished, got {other:?}"),
        };
        assert_eq!(summary.score, 7);
        assert_eq!(summary.to_string(), "7 / 10");
        assert!(matches!(s.phase(), Phase::Finished));

        // Only the 3 timed-out rounds touched the signal line.
        let raises = all_events
            .iter()
            .filter(|e| matches!(e, SessionEvent::RaiseSignal))
            .count();
        let lowers = all_events
            .iter()
            .filter(|e| matches!(e, SessionEvent::LowerSignal))
            .count();
        assert_eq!(raises, 3);
        assert_eq!(lowers, 3);
    }

    #[test]
    fn full_session_without_peripheral_completes() {
        use crate::signal::{Signal, SignalLink};

        let t0 = Instant::now();
        let mut link = SignalLink::disconnected();
        let mut s = session(t0);
        let mut now = t0;
        let mut finished = None;

        for _ in 0..10 {
            for event in run_round(&mut s, now, None) {
                match event {
                    SessionEvent::RaiseSignal => link.send(Signal::Raise),
                    SessionEvent::LowerSignal => link.send(Signal::Lower),
                    SessionEvent::Finished(summary) => finished = Some(summary),
                    _ => {}
                }
            }
            now += Duration::from_secs(60);
        }

        let summary = finished.expect("session should finish");
        assert_eq!(summary.to_string(), "0 / 10");
        assert!(!link.is_connected());
    }

    #[test]
    fn finished_session_stays_finished() {
        let t0 = Instant::now();
        let mut s = Session::new("mew".to_string(), 1, GUESS, t0);
        let events = run_round(&mut s, t0, Some("mew"));
        assert!(matches!(events.last(), Some(SessionEvent::Finished(_))));
        assert_eq!(s.tick(at(t0, 120_000)), vec![]);
        assert_eq!(s.submit("mew", at(t0, 120_000)), None);
    }
}
