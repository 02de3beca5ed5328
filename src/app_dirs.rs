use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "fingertap")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("fingertap_config.json"))
    }

    /// Where result tables and session logs go unless configured otherwise
    pub fn data_dir() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("data"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}
