use crate::session::Counterbalance;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const EXPERIMENT_NAME: &str = "Sequence learning task";

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Details collected once, on a participant's first session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demographics {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// Everything written at the top of a session log
#[derive(Debug, Clone)]
pub struct SessionHeader {
    pub researcher: String,
    pub location: String,
    pub date: DateTime<Local>,
    pub participant: String,
    pub session: u32,
    pub counterbalance: Counterbalance,
    pub demographics: Demographics,
}

impl SessionHeader {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("experiment: {EXPERIMENT_NAME}"),
            format!("researcher: {}", self.researcher),
            format!("location: {}", self.location),
            format!("date: {}", self.date.format("%d %b %Y %H:%M:%S")),
            format!("participant: {}", self.participant),
        ];
        if self.session == 1 {
            let or_blank = |v: Option<String>| v.unwrap_or_default();
            lines.push(format!(
                "gender: {}",
                or_blank(self.demographics.gender.map(|g| g.to_string()))
            ));
            lines.push(format!(
                "age: {}",
                or_blank(self.demographics.age.map(|a| a.to_string()))
            ));
        }
        lines.push(format!("session: {}", self.session));
        lines.push(format!(
            "sequence Order: {}",
            self.counterbalance.sequence_order
        ));
        lines.push(format!("testOrder: {}", self.counterbalance.test_order));
        lines
    }

    pub fn log(&self) {
        for line in self.lines() {
            info!("{line}");
        }
        info!("..........................................");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SequenceOrder, TestOrder};
    use chrono::TimeZone;

    fn header(session: u32) -> SessionHeader {
        SessionHeader {
            researcher: "TH".into(),
            location: "Lab".into(),
            date: Local.with_ymd_and_hms(2014, 4, 14, 9, 30, 0).unwrap(),
            participant: "12".into(),
            session,
            counterbalance: Counterbalance {
                sequence_order: SequenceOrder::Y,
                test_order: TestOrder::A,
            },
            demographics: Demographics {
                age: Some(24),
                gender: Some(Gender::Female),
            },
        }
    }

    #[test]
    fn first_session_includes_demographics() {
        let lines = header(1).lines();
        assert_eq!(lines[0], "experiment: Sequence learning task");
        assert_eq!(lines[3], "date: 14 Apr 2014 09:30:00");
        assert!(lines.contains(&"gender: female".to_string()));
        assert!(lines.contains(&"age: 24".to_string()));
        assert_eq!(lines.last().unwrap(), "testOrder: A");
    }

    #[test]
    fn later_sessions_skip_demographics() {
        let lines = header(2).lines();
        assert!(!lines.iter().any(|l| l.starts_with("age")));
        assert!(lines.contains(&"session: 2".to_string()));
        assert!(lines.contains(&"sequence Order: Y".to_string()));
    }
}
