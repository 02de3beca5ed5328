use crate::scorer::ScoreResult;
use crate::sequence::{Sequence, SequenceType};
use serde::{Deserialize, Serialize};

/// One scored trial, as written to the participant's result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant: String,
    pub session: String,
    #[serde(rename = "targetSequence")]
    pub target_sequence: Sequence,
    #[serde(rename = "sequenceType")]
    pub sequence_type: SequenceType,
    pub trial: u32,
    #[serde(with = "stream_list")]
    pub stream: Vec<u8>,
    pub speed: f64,
    pub errors: u32,
    pub accuracy: f64,
}

impl TrialRecord {
    pub fn new(
        participant: &str,
        session: &str,
        target: &Sequence,
        sequence_type: SequenceType,
        trial: u32,
        stream: Vec<u8>,
        result: ScoreResult,
    ) -> Self {
        Self {
            participant: participant.to_string(),
            session: session.to_string(),
            target_sequence: target.clone(),
            sequence_type,
            trial,
            stream,
            speed: result.speed,
            errors: result.errors,
            accuracy: result.accuracy,
        }
    }

    pub fn score(&self) -> ScoreResult {
        ScoreResult {
            speed: self.speed,
            errors: self.errors,
            accuracy: self.accuracy,
        }
    }
}

/// Keystroke streams are stored as a bracketed list, `[4, 1, 3, 2, 4]`, so a row
/// stays a flat record.
pub mod stream_list {
    use itertools::Itertools;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn format(stream: &[u8]) -> String {
        format!("[{}]", stream.iter().join(", "))
    }

    pub fn parse(s: &str) -> Result<Vec<u8>, String> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| format!("stream {s:?} is not a bracketed list"))?;

        inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<u8>()
                    .map_err(|e| format!("bad key {item:?} in stream: {e}"))
            })
            .collect()
    }

    pub fn serialize<S: Serializer>(stream: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(stream))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(D::Error::custom)
    }
}
