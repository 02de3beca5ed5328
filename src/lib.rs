// Task model, scoring and storage; the terminal front end lives in the binary.
pub mod app_dirs;
pub mod config;
pub mod experiment;
pub mod logging;
pub mod participant;
pub mod record;
pub mod runtime;
pub mod scorer;
pub mod sequence;
pub mod session;
pub mod store;
pub mod trial;
pub mod util;

pub use scorer::{score, ScoreError, ScoreResult};
