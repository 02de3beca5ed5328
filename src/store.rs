use crate::record::{stream_list, TrialRecord};
use crate::sequence::{Sequence, SequenceType};
use chrono::Local;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed stored row: {0}")]
    Malformed(String),
}

/// Storage backend for the result table
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Csv,
    Sqlite,
}

pub trait TrialStore {
    /// All stored rows for a participant, in trial order
    fn history(&self, participant: &str) -> Result<Vec<TrialRecord>, StoreError>;

    /// Append a session's rows to the participant's table. Returns where they were written.
    fn append(&mut self, participant: &str, rows: &[TrialRecord]) -> Result<PathBuf, StoreError>;
}

pub fn open_store(kind: StoreKind, data_dir: &Path) -> Result<Box<dyn TrialStore>, StoreError> {
    Ok(match kind {
        StoreKind::Csv => Box::new(CsvTrialStore::new(data_dir)),
        StoreKind::Sqlite => Box::new(SqliteTrialStore::open(data_dir.join("trials.db"))?),
    })
}

/// One `P<participant>.csv` file per participant
#[derive(Debug, Clone)]
pub struct CsvTrialStore {
    dir: PathBuf,
}

impl CsvTrialStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, participant: &str) -> PathBuf {
        self.dir.join(format!("P{participant}.csv"))
    }

    fn fallback_path_for(&self, participant: &str) -> PathBuf {
        self.dir.join(format!("P{participant}_problemSaving.csv"))
    }

    fn write_table(path: &Path, rows: &[TrialRecord]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl TrialStore for CsvTrialStore {
    fn history(&self, participant: &str) -> Result<Vec<TrialRecord>, StoreError> {
        let path = self.path_for(participant);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<TrialRecord>, _>>()?;
        Ok(rows)
    }

    fn append(&mut self, participant: &str, rows: &[TrialRecord]) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let mut table = self.history(participant)?;
        table.extend_from_slice(rows);

        self.write_with_fallback(participant, &table)
    }
}

impl CsvTrialStore {
    /// Write the whole table, retrying once under a different name if the
    /// participant's file cannot be written (e.g. it is open elsewhere).
    fn write_with_fallback(
        &self,
        participant: &str,
        table: &[TrialRecord],
    ) -> Result<PathBuf, StoreError> {
        let path = self.path_for(participant);
        let e = match Self::write_table(&path, table) {
            Ok(()) => {
                info!("Data saved with file name: {}", path.display());
                return Ok(path);
            }
            Err(e) => e,
        };

        let fallback = self.fallback_path_for(participant);
        warn!(
            "Problem encountered saving data ({e}); attempting to save data with different filename: {}",
            fallback.display()
        );
        match Self::write_table(&fallback, table) {
            Ok(()) => {
                info!("Data saved with file name: {}", fallback.display());
                Ok(fallback)
            }
            Err(e) => {
                error!("Major error: Data could not be saved");
                Err(e)
            }
        }
    }
}

/// All participants in one `trials` table
#[derive(Debug)]
pub struct SqliteTrialStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteTrialStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS trials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                participant TEXT NOT NULL,
                session TEXT NOT NULL,
                target_sequence TEXT NOT NULL,
                sequence_type TEXT NOT NULL,
                trial INTEGER NOT NULL,
                stream TEXT NOT NULL,
                speed REAL NOT NULL,
                errors INTEGER NOT NULL,
                accuracy REAL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trials_participant ON trials(participant)",
            [],
        )?;

        Ok(Self { conn, path })
    }
}

fn parse_sequence_type(s: &str) -> Result<SequenceType, StoreError> {
    match s {
        "old" => Ok(SequenceType::Old),
        "new" => Ok(SequenceType::New),
        "practice" => Ok(SequenceType::Practice),
        other => Err(StoreError::Malformed(format!("unknown sequence type {other:?}"))),
    }
}

impl TrialStore for SqliteTrialStore {
    fn history(&self, participant: &str) -> Result<Vec<TrialRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT participant, session, target_sequence, sequence_type, trial, stream, speed, errors, accuracy
            FROM trials
            WHERE participant = ?1
            ORDER BY id
            "#,
        )?;

        let raw = stmt
            .query_map([participant], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, u32>(7)?,
                    row.get::<_, Option<f64>>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(participant, session, target, kind, trial, stream, speed, errors, accuracy)| {
                    Ok(TrialRecord {
                        participant,
                        session,
                        target_sequence: target
                            .parse::<Sequence>()
                            .map_err(|e| StoreError::Malformed(e.to_string()))?,
                        sequence_type: parse_sequence_type(&kind)?,
                        trial,
                        stream: stream_list::parse(&stream).map_err(StoreError::Malformed)?,
                        speed,
                        errors,
                        // SQLite has no NaN; undefined accuracy is stored as NULL
                        accuracy: accuracy.unwrap_or(f64::NAN),
                    })
                },
            )
            .collect()
    }

    fn append(&mut self, _participant: &str, rows: &[TrialRecord]) -> Result<PathBuf, StoreError> {
        let recorded_at = Local::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        for row in rows {
            tx.execute(
                r#"
                INSERT INTO trials
                (participant, session, target_sequence, sequence_type, trial, stream, speed, errors, accuracy, recorded_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    row.participant,
                    row.session,
                    row.target_sequence.to_string(),
                    row.sequence_type.to_string(),
                    row.trial,
                    stream_list::format(&row.stream),
                    row.speed,
                    row.errors,
                    Some(row.accuracy).filter(|a| !a.is_nan()),
                    recorded_at,
                ],
            )?;
        }

        tx.commit()?;
        info!("Data saved to database: {}", self.path.display());
        Ok(self.path.clone())
    }
}
