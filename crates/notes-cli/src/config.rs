//! Configuration: where notes live and how exports are named.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Directory name under the platform's local data dir
const APP_DIR: &str = "Notes";
const NOTES_FILE: &str = "notes.json";

#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
}

impl Config {
    /// Use `data_dir` if given, else `<local data dir>/Notes`.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_local_dir()
                .context("Could not determine the local data directory; pass --data-dir")?
                .join(APP_DIR),
        };
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn notes_file(&self) -> PathBuf {
        self.data_dir.join(NOTES_FILE)
    }

    /// `Notes_backup_<yyyyMMdd>.json`
    pub fn default_export_name(date: NaiveDate) -> String {
        format!("Notes_backup_{}.json", date.format("%Y%m%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/my-notes"))).unwrap();
        assert_eq!(config.data_dir(), Path::new("/tmp/my-notes"));
        assert_eq!(config.notes_file(), PathBuf::from("/tmp/my-notes/notes.json"));
    }

    #[test]
    fn test_default_export_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Config::default_export_name(date), "Notes_backup_20240309.json");
    }
}
