use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file for a numbered session, `P<participant>S<session>_log.txt`
pub fn session_log_path(data_dir: &Path, participant: &str, session: u32) -> PathBuf {
    data_dir.join(format!("P{participant}S{session}_log.txt"))
}

pub fn practice_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("practice_log.txt")
}

/// Route tracing output to `path`, appending. The terminal belongs to the UI,
/// so nothing is written to stdout or stderr.
pub fn init(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_paths() {
        let dir = Path::new("data");
        assert_eq!(
            session_log_path(dir, "7", 2),
            PathBuf::from("data/P7S2_log.txt")
        );
        assert_eq!(practice_log_path(dir), PathBuf::from("data/practice_log.txt"));
    }
}
