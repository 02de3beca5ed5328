use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Keys accepted during a tapping window, one per finger of the left hand
pub const TAPPING_KEYS: [char; 4] = ['1', '2', '3', '4'];

/// Map a pressed key to its tapping digit, if it belongs to the tapping alphabet
pub fn tapping_digit(c: char) -> Option<u8> {
    if TAPPING_KEYS.contains(&c) {
        c.to_digit(10).map(|d| d as u8)
    } else {
        None
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence is empty")]
    Empty,
    #[error("invalid key {0:?} in sequence, expected digits 1-9")]
    InvalidKey(char),
    #[error("key {0} is outside the digit alphabet 1-9")]
    OutOfRange(u8),
}

/// Digit sequence a participant is asked to reproduce, e.g. `41324`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sequence(Vec<u8>);

impl Sequence {
    pub fn new(keys: Vec<u8>) -> Result<Self, SequenceError> {
        if keys.is_empty() {
            return Err(SequenceError::Empty);
        }
        if let Some(&bad) = keys.iter().find(|&&k| k == 0 || k > 9) {
            return Err(SequenceError::OutOfRange(bad));
        }
        Ok(Self(keys))
    }

    /// Wrap one of the study's fixed sequences
    pub(crate) fn builtin(keys: &[u8]) -> Self {
        debug_assert!(!keys.is_empty() && keys.iter().all(|&k| (1..=9).contains(&k)));
        Self(keys.to_vec())
    }

    pub fn keys(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Sequence {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keys = s
            .trim()
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) if d > 0 => Ok(d as u8),
                _ => Err(SequenceError::InvalidKey(c)),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Self::new(keys)
    }
}

impl TryFrom<String> for Sequence {
    type Error = SequenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sequence> for String {
    fn from(seq: Sequence) -> Self {
        seq.to_string()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// Whether a block uses the participant's trained sequence, the novel one, or the practice one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SequenceType {
    Old,
    New,
    Practice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence() {
        let seq: Sequence = "41324".parse().unwrap();
        assert_eq!(seq.keys(), &[4, 1, 3, 2, 4]);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.to_string(), "41324");
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert_eq!("".parse::<Sequence>(), Err(SequenceError::Empty));
        assert_eq!("  ".parse::<Sequence>(), Err(SequenceError::Empty));
        assert_eq!(
            "41a24".parse::<Sequence>(),
            Err(SequenceError::InvalidKey('a'))
        );
        assert_eq!(
            "41024".parse::<Sequence>(),
            Err(SequenceError::InvalidKey('0'))
        );
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(Sequence::new(vec![]), Err(SequenceError::Empty));
        assert_eq!(Sequence::new(vec![1, 0]), Err(SequenceError::OutOfRange(0)));
        assert_eq!(Sequence::new(vec![1, 12]), Err(SequenceError::OutOfRange(12)));
    }

    #[test]
    fn test_tapping_digit() {
        assert_eq!(tapping_digit('1'), Some(1));
        assert_eq!(tapping_digit('4'), Some(4));
        assert_eq!(tapping_digit('5'), None);
        assert_eq!(tapping_digit('a'), None);
        assert_eq!(tapping_digit(' '), None);
    }

    #[test]
    fn test_sequence_type_display() {
        assert_eq!(SequenceType::Old.to_string(), "old");
        assert_eq!(SequenceType::New.to_string(), "new");
        assert_eq!(SequenceType::Practice.to_string(), "practice");
    }

    #[test]
    fn test_sequence_serde_as_string() {
        let seq: Sequence = "23142".parse().unwrap();
        let json = serde_json::to_string(&seq).unwrap();
        assert_eq!(json, "\"23142\"");
        let back: Sequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }
}
