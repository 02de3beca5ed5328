use crate::sequence::tapping_digit;
use crate::session::Block;
use std::time::Duration;
use tracing::info;

/// Markers drawn across the screen during a tapping window
pub const MARKER_COUNT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialTiming {
    /// Rest before a block's first trial
    pub first_rest: Duration,
    pub rest: Duration,
    pub tap: Duration,
}

impl Default for TrialTiming {
    fn default() -> Self {
        Self {
            first_rest: Duration::from_secs(10),
            rest: Duration::from_secs(30),
            tap: Duration::from_secs(30),
        }
    }
}

/// Row of markers that fills left to right with each accepted key, then empties right to left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerTrack {
    lit: usize,
    filling: bool,
    len: usize,
}

impl MarkerTrack {
    pub fn new(len: usize) -> Self {
        Self {
            lit: 0,
            filling: true,
            len,
        }
    }

    pub fn advance(&mut self) {
        if self.filling {
            self.lit += 1;
            if self.lit >= self.len {
                self.filling = false;
            }
        } else {
            self.lit = self.lit.saturating_sub(1);
            if self.lit == 0 {
                self.filling = true;
            }
        }
    }

    pub fn lit(&self) -> usize {
        self.lit
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.len);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    /// Instruction screen, waiting for the participant to start
    Intro,
    Rest { remaining: Duration },
    Tap { remaining: Duration },
    Complete,
}

/// Keystrokes captured in one closed tapping window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedTrial {
    pub trial: u32,
    pub stream: Vec<u8>,
}

/// Drives one block through intro, then rest and tapping for each trial
#[derive(Debug)]
pub struct BlockRun {
    pub block: Block,
    timing: TrialTiming,
    trial: u32,
    phase: TrialPhase,
    stream: Vec<u8>,
    markers: MarkerTrack,
}

impl BlockRun {
    pub fn new(block: Block, timing: TrialTiming) -> Self {
        Self {
            block,
            timing,
            trial: 0,
            phase: TrialPhase::Intro,
            stream: Vec::new(),
            markers: MarkerTrack::new(MARKER_COUNT),
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// 1-based index of the current trial, 0 before the first rest
    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    pub fn markers(&self) -> &MarkerTrack {
        &self.markers
    }

    pub fn timing(&self) -> &TrialTiming {
        &self.timing
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TrialPhase::Complete
    }

    /// Leave the instruction screen
    pub fn start(&mut self) {
        if self.phase != TrialPhase::Intro {
            return;
        }
        info!(
            trials = self.block.trials,
            "Running finger tapping task. {} trials with target sequence {}",
            self.block.trials,
            self.block.target
        );
        if self.block.trials == 0 {
            self.phase = TrialPhase::Complete;
        } else {
            self.begin_rest();
        }
    }

    fn begin_rest(&mut self) {
        self.trial += 1;
        let remaining = if self.trial == 1 {
            self.timing.first_rest
        } else {
            info!("Resting");
            self.timing.rest
        };
        self.phase = TrialPhase::Rest { remaining };
    }

    fn begin_tap(&mut self) {
        info!("Trial: {}", self.trial);
        self.stream.clear();
        self.markers.reset();
        self.phase = TrialPhase::Tap {
            remaining: self.timing.tap,
        };
    }

    /// Advance the clock. Returns the captured stream when a tapping window closes.
    pub fn on_tick(&mut self, elapsed: Duration) -> Option<CapturedTrial> {
        match self.phase {
            TrialPhase::Rest { remaining } => {
                match remaining.checked_sub(elapsed).filter(|r| !r.is_zero()) {
                    Some(remaining) => self.phase = TrialPhase::Rest { remaining },
                    None => self.begin_tap(),
                }
                None
            }
            TrialPhase::Tap { remaining } => {
                match remaining.checked_sub(elapsed).filter(|r| !r.is_zero()) {
                    Some(remaining) => {
                        self.phase = TrialPhase::Tap { remaining };
                        None
                    }
                    None => Some(self.close_window()),
                }
            }
            TrialPhase::Intro | TrialPhase::Complete => None,
        }
    }

    fn close_window(&mut self) -> CapturedTrial {
        let captured = CapturedTrial {
            trial: self.trial,
            stream: std::mem::take(&mut self.stream),
        };
        self.markers.reset();
        if self.trial < self.block.trials {
            self.begin_rest();
        } else {
            self.phase = TrialPhase::Complete;
        }
        captured
    }

    /// Record a key press. Only tapping keys pressed inside a tapping window count.
    pub fn press(&mut self, c: char) -> bool {
        if !matches!(self.phase, TrialPhase::Tap { .. }) {
            return false;
        }
        match tapping_digit(c) {
            Some(digit) => {
                self.stream.push(digit);
                self.markers.advance();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::practice_plan;

    fn timing() -> TrialTiming {
        TrialTiming {
            first_rest: Duration::from_millis(100),
            rest: Duration::from_millis(300),
            tap: Duration::from_millis(200),
        }
    }

    fn block_with_trials(trials: u32) -> Block {
        let mut block = practice_plan().remove(0);
        block.trials = trials;
        block
    }

    #[test]
    fn test_marker_track_fills_then_empties() {
        let mut markers = MarkerTrack::new(3);
        let mut seen = vec![];
        for _ in 0..7 {
            markers.advance();
            seen.push(markers.lit());
        }
        assert_eq!(seen, vec![1, 2, 3, 2, 1, 0, 1]);
    }

    #[test]
    fn test_default_timing() {
        let t = TrialTiming::default();
        assert_eq!(t.first_rest, Duration::from_secs(10));
        assert_eq!(t.rest, Duration::from_secs(30));
        assert_eq!(t.tap, Duration::from_secs(30));
    }

    #[test]
    fn test_starts_in_intro() {
        let mut run = BlockRun::new(block_with_trials(1), timing());
        assert_eq!(run.phase(), TrialPhase::Intro);
        assert_eq!(run.trial(), 0);
        assert!(!run.press('1'));
        assert_eq!(run.on_tick(Duration::from_secs(5)), None);
        assert_eq!(run.phase(), TrialPhase::Intro);
    }

    #[test]
    fn test_first_rest_is_short() {
        let mut run = BlockRun::new(block_with_trials(2), timing());
        run.start();
        assert_eq!(
            run.phase(),
            TrialPhase::Rest {
                remaining: Duration::from_millis(100)
            }
        );
        assert_eq!(run.trial(), 1);
    }

    #[test]
    fn test_keys_ignored_while_resting() {
        let mut run = BlockRun::new(block_with_trials(1), timing());
        run.start();
        assert!(!run.press('1'));
        assert!(run.stream().is_empty());
    }

    #[test]
    fn test_full_block_cycle() {
        let mut run = BlockRun::new(block_with_trials(2), timing());
        run.start();

        assert_eq!(run.on_tick(Duration::from_millis(100)), None);
        assert_matches::assert_matches!(run.phase(), TrialPhase::Tap { .. });

        assert!(run.press('3'));
        assert!(run.press('2'));
        assert!(!run.press('5'));
        assert!(!run.press('x'));
        assert!(run.press('4'));
        assert_eq!(run.markers().lit(), 3);

        assert_eq!(run.on_tick(Duration::from_millis(150)), None);
        let captured = run.on_tick(Duration::from_millis(50)).unwrap();
        assert_eq!(
            captured,
            CapturedTrial {
                trial: 1,
                stream: vec![3, 2, 4]
            }
        );
        assert_eq!(run.markers().lit(), 0);

        // Second trial rests for the full interval
        assert_eq!(
            run.phase(),
            TrialPhase::Rest {
                remaining: Duration::from_millis(300)
            }
        );
        assert_eq!(run.trial(), 2);
        run.on_tick(Duration::from_millis(300));
        let captured = run.on_tick(Duration::from_millis(500)).unwrap();
        assert_eq!(captured.trial, 2);
        assert!(captured.stream.is_empty());
        assert!(run.is_complete());
        assert_eq!(run.on_tick(Duration::from_secs(1)), None);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut run = BlockRun::new(block_with_trials(1), timing());
        run.start();
        run.on_tick(Duration::from_millis(40));
        run.start();
        assert_eq!(
            run.phase(),
            TrialPhase::Rest {
                remaining: Duration::from_millis(60)
            }
        );
    }

    #[test]
    fn test_zero_trial_block_completes_immediately() {
        let mut run = BlockRun::new(block_with_trials(0), timing());
        run.start();
        assert!(run.is_complete());
    }
}
