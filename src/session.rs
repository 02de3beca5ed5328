use crate::record::TrialRecord;
use crate::sequence::{Sequence, SequenceType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PRACTICE_SEQUENCE: [u8; 5] = [3, 2, 4, 1, 3];
const SEQUENCE_ONE: [u8; 5] = [4, 1, 3, 2, 4];
const SEQUENCE_TWO: [u8; 5] = [2, 3, 1, 4, 2];

/// Highest session number in the study design
pub const LAST_PLANNED_SESSION: u32 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(
        "participant id {0:?} is not numeric; pass --sequence-order and --test-order to counterbalance manually"
    )]
    NonNumericParticipant(String),
    #[error("participant has already completed {LAST_PLANNED_SESSION} sessions; pass --allow-extra-session to run session {0}")]
    ExtraSession(u32),
    #[error("there is already a log file stored for this participant/session ({}); please resolve before continuing", .0.display())]
    LogExists(PathBuf),
    #[error("participant id {0:?} cannot be used in a file name")]
    InvalidParticipant(String),
}

/// Which sequence the participant learns first
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
pub enum SequenceOrder {
    X,
    Y,
}

/// Order of the old/new blocks in the final test session
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
pub enum TestOrder {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counterbalance {
    pub sequence_order: SequenceOrder,
    pub test_order: TestOrder,
}

impl Counterbalance {
    /// Factorial crossing of both factors with sequence order varying fastest,
    /// assigned cyclically by participant number
    const CONDITIONS: [(SequenceOrder, TestOrder); 4] = [
        (SequenceOrder::X, TestOrder::A),
        (SequenceOrder::Y, TestOrder::A),
        (SequenceOrder::X, TestOrder::B),
        (SequenceOrder::Y, TestOrder::B),
    ];

    pub fn assign(participant: &str) -> Result<Self, SessionError> {
        let number: u64 = participant
            .trim()
            .parse()
            .map_err(|_| SessionError::NonNumericParticipant(participant.to_string()))?;
        let (sequence_order, test_order) = Self::CONDITIONS[(number % 4) as usize];
        Ok(Self {
            sequence_order,
            test_order,
        })
    }

    /// (old, new) sequences for this participant
    pub fn sequences(&self) -> (Sequence, Sequence) {
        let (old, new) = match self.sequence_order {
            SequenceOrder::X => (SEQUENCE_ONE, SEQUENCE_TWO),
            SequenceOrder::Y => (SEQUENCE_TWO, SEQUENCE_ONE),
        };
        (Sequence::builtin(&old), Sequence::builtin(&new))
    }
}

/// A run of trials on one target sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: String,
    pub sequence_type: SequenceType,
    pub target: Sequence,
    pub trials: u32,
}

impl Block {
    fn new(
        session: u32,
        part: char,
        sequence_type: SequenceType,
        target: Sequence,
        trials: u32,
    ) -> Self {
        Self {
            label: format!("{session}{part}"),
            sequence_type,
            target,
            trials,
        }
    }
}

pub fn practice_plan() -> Vec<Block> {
    vec![Block::new(
        1,
        'a',
        SequenceType::Practice,
        Sequence::builtin(&PRACTICE_SEQUENCE),
        1,
    )]
}

/// Blocks to run in a numbered session
pub fn session_plan(session: u32, cb: Counterbalance) -> Vec<Block> {
    let (old, new) = cb.sequences();
    match session {
        1 => vec![Block::new(1, 'a', SequenceType::Old, old, 12)],
        2 => vec![
            Block::new(2, 'a', SequenceType::Old, old, 3),
            Block::new(2, 'b', SequenceType::New, new, 12),
        ],
        n => {
            let old_block = (SequenceType::Old, old);
            let new_block = (SequenceType::New, new);
            let (first, second) = match cb.test_order {
                TestOrder::A => (old_block, new_block),
                TestOrder::B => (new_block, old_block),
            };
            vec![
                Block::new(n, 'a', first.0, first.1, 3),
                Block::new(n, 'b', second.0, second.1, 3),
            ]
        }
    }
}

/// Session number encoded at the start of a block label such as `2b`
pub fn session_number(label: &str) -> Option<u32> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Session a participant should run next, given their stored rows in trial order
pub fn next_session(history: &[TrialRecord]) -> u32 {
    history
        .last()
        .and_then(|r| session_number(&r.session))
        .map_or(1, |n| n + 1)
}

pub fn check_session_allowed(session: u32, allow_extra: bool) -> Result<(), SessionError> {
    if session > LAST_PLANNED_SESSION && !allow_extra {
        return Err(SessionError::ExtraSession(session));
    }
    Ok(())
}

/// Refuse to start a numbered session over an existing session log
pub fn check_log_free(log_path: &Path) -> Result<(), SessionError> {
    if log_path.exists() {
        return Err(SessionError::LogExists(log_path.to_path_buf()));
    }
    Ok(())
}

/// Participant ids name result and log files, so they must stay inside the data directory
pub fn check_participant_id(participant: &str) -> Result<(), SessionError> {
    let bad = participant.is_empty()
        || participant.starts_with('.')
        || participant
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
    if bad {
        return Err(SessionError::InvalidParticipant(participant.to_string()));
    }
    Ok(())
}
