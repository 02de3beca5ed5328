use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Consecutive mismatching scan positions that close an error episode on their own.
pub const MAX_CONTIGUOUS_ERRORS: u32 = 5;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    #[error("target sequence must contain at least one key")]
    EmptyTarget,
}

/// Outcome of scoring one tapping window against its target sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Complete repetitions, plus fractional credit for a partial one at the tail
    pub speed: f64,
    /// Error episodes
    pub errors: u32,
    /// `1 - errors / speed`, NaN when speed is zero
    pub accuracy: f64,
}

impl ScoreResult {
    fn from_counts(speed: f64, errors: u32) -> Self {
        let accuracy = if speed == 0.0 {
            f64::NAN
        } else {
            1.0 - errors as f64 / speed
        };
        Self {
            speed,
            errors,
            accuracy,
        }
    }

    /// The target never appeared anywhere in the stream.
    pub fn never_matched(&self) -> bool {
        self.speed == 0.0
    }
}

/// Running tallies of a scan. `run` counts mismatching positions not yet closed.
#[derive(Debug, Default)]
struct Tally {
    speed: f64,
    errors: u32,
    run: u32,
}

impl Tally {
    fn close_pending(&mut self) {
        if self.run >= 1 {
            self.errors += 1;
            self.run = 0;
        }
    }

    fn mismatch(&mut self, at_end: bool) {
        self.run += 1;
        if self.run == MAX_CONTIGUOUS_ERRORS || at_end {
            self.errors += 1;
            self.run = 0;
        }
    }
}

/// Score a captured keystroke stream against the target sequence.
///
/// The stream is scanned once, left to right. While a full target-length window
/// still fits, a matching window earns one repetition and skips ahead by the
/// target length; a mismatch advances a single position and extends the current
/// error episode. Once fewer keys than the target length remain, the suffix is
/// compared against ever shorter prefixes of the target (dropping one key from
/// the front of the suffix and one from the back of the prefix each round) and
/// the first alignment earns proportional credit.
pub fn score<T: PartialEq>(stream: &[T], target: &[T]) -> Result<ScoreResult, ScoreError> {
    let len = target.len();
    if len == 0 {
        return Err(ScoreError::EmptyTarget);
    }

    let mut tally = Tally::default();
    let mut i = 0;

    while stream.len() - i >= len {
        if stream[i..i + len] == *target {
            tally.speed += 1.0;
            i += len;
            tally.close_pending();
        } else {
            i += 1;
            tally.mismatch(i == stream.len());
        }
    }

    // Tail: 0 < remaining < len. Both windows shrink together so they always have
    // equal length; `i` is the start of the stream suffix.
    while i < stream.len() {
        let remaining = stream.len() - i;
        if stream[i..] == target[..remaining] {
            tally.speed += remaining as f64 / len as f64;
            tally.close_pending();
            break;
        }
        tally.mismatch(remaining == 1);
        i += 1;
    }

    let result = ScoreResult::from_counts(tally.speed, tally.errors);
    if result.never_matched() {
        warn!(
            stream_len = stream.len(),
            "issue with this stream - speed is zero"
        );
    }
    Ok(result)
}
