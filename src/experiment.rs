use crate::record::TrialRecord;
use crate::scorer::{score, ScoreError};
use crate::session::Block;
use crate::sequence::SequenceType;
use crate::trial::{BlockRun, CapturedTrial, TrialTiming};
use crate::util::BlockSummary;
use std::time::Duration;
use tracing::{debug, info};

/// Runs the blocks of one session in order and collects the scored rows
#[derive(Debug)]
pub struct Experiment {
    participant: String,
    timing: TrialTiming,
    pending: std::vec::IntoIter<Block>,
    current: Option<BlockRun>,
    results: Vec<TrialRecord>,
    block_start: usize,
    /// Practice runs capture keystrokes but never score or store them
    scoring: bool,
}

impl Experiment {
    pub fn new(participant: &str, blocks: Vec<Block>, timing: TrialTiming) -> Self {
        let scoring = blocks
            .iter()
            .all(|b| b.sequence_type != SequenceType::Practice);
        let mut pending = blocks.into_iter();
        let current = pending.next().map(|b| BlockRun::new(b, timing));
        Self {
            participant: participant.to_string(),
            timing,
            pending,
            current,
            results: Vec::new(),
            block_start: 0,
            scoring,
        }
    }

    pub fn current(&self) -> Option<&BlockRun> {
        self.current.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Rows scored so far, in trial order
    pub fn results(&self) -> &[TrialRecord] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TrialRecord> {
        self.results
    }

    /// Dismiss the current block's instruction screen
    pub fn start_block(&mut self) {
        if let Some(run) = self.current.as_mut() {
            info!(block = %run.block.label, "Presenting introduction screen");
            run.start();
            self.advance_if_complete();
        }
    }

    pub fn press(&mut self, c: char) -> bool {
        self.current.as_mut().is_some_and(|run| run.press(c))
    }

    pub fn on_tick(&mut self, elapsed: Duration) -> Result<(), ScoreError> {
        let captured = match self.current.as_mut() {
            Some(run) => run.on_tick(elapsed),
            None => return Ok(()),
        };
        if let Some(captured) = captured {
            self.finish_trial(captured)?;
        }
        self.advance_if_complete();
        Ok(())
    }

    fn finish_trial(&mut self, captured: CapturedTrial) -> Result<(), ScoreError> {
        let Some(run) = self.current.as_ref() else {
            return Ok(());
        };
        if !self.scoring {
            debug!(
                trial = captured.trial,
                keys = captured.stream.len(),
                "practice trial not scored"
            );
            return Ok(());
        }

        let block = &run.block;
        let result = score(&captured.stream, block.target.keys())?;
        if result.never_matched() {
            debug!(
                block = %block.label,
                trial = captured.trial,
                "target sequence was never produced; accuracy recorded as NaN"
            );
        }
        debug!(
            block = %block.label,
            trial = captured.trial,
            keys = captured.stream.len(),
            speed = result.speed,
            errors = result.errors,
            accuracy = result.accuracy,
            "trial scored"
        );

        self.results.push(TrialRecord::new(
            &self.participant,
            &block.label,
            &block.target,
            block.sequence_type,
            captured.trial,
            captured.stream,
            result,
        ));
        Ok(())
    }

    fn advance_if_complete(&mut self) {
        if !self.current.as_ref().is_some_and(BlockRun::is_complete) {
            return;
        }
        if let Some(run) = self.current.as_ref() {
            if self.scoring {
                let scores: Vec<_> = self.results[self.block_start..]
                    .iter()
                    .map(TrialRecord::score)
                    .collect();
                let summary = BlockSummary::from_scores(&scores);
                info!(
                    block = %run.block.label,
                    trials = summary.trials,
                    mean_speed = summary.mean_speed.unwrap_or(f64::NAN),
                    speed_sd = summary.speed_sd.unwrap_or(f64::NAN),
                    total_errors = summary.total_errors,
                    mean_accuracy = summary.mean_accuracy.unwrap_or(f64::NAN),
                    zero_speed_trials = summary.zero_speed_trials,
                    "block complete"
                );
            }
        }
        self.block_start = self.results.len();
        self.current = self.pending.next().map(|b| BlockRun::new(b, self.timing));
    }
}
