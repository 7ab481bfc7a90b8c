use anyhow::Result;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "social-support-app";

/// Resolve the application data folder (absolute path).
///
/// `SUPPORT_WIZARD_DATA_DIR` overrides the platform default, which keeps
/// tests and portable installs away from the user's real data.
pub fn resolve_data_folder() -> PathBuf {
    if let Some(dir) = std::env::var_os("SUPPORT_WIZARD_DATA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join(APP_DIR_NAME)
}

/// Location of the single persisted application record.
pub fn resolve_state_file() -> PathBuf {
    resolve_data_folder().join("application.json")
}

/// Resolve (and create) the log folder.
pub fn resolve_log_folder() -> Result<PathBuf> {
    let log_dir = resolve_data_folder().join("logs");
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
    Ok(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_file_lives_under_the_data_folder() {
        let state = resolve_state_file();
        assert!(state.ends_with("application.json"));
        assert!(state.starts_with(resolve_data_folder()));
    }
}
