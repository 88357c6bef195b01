//! Per-run artifact directory.
//!
//! Layout: `<root>/<mode>/<timestamp>/` holding index listings, the primary
//! and replica name lists, one `<index>_<category>_export.ndjson` file per
//! exported category, and the run logs. Files are only ever created or
//! overwritten; nothing here deletes them.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::Category;

/// File holding the source listing.
pub const SOURCE_LISTING: &str = "source_indexes.json";
/// File holding the target listing.
pub const TARGET_LISTING: &str = "target_indexes.json";
/// File holding primary index names.
pub const PRIMARIES_LIST: &str = "primaries-list.txt";
/// File holding replica index names.
pub const REPLICAS_LIST: &str = "replica-list.txt";
/// File holding replica link issues.
pub const LINK_ISSUES: &str = "link-issues.txt";
/// File holding validation findings.
pub const FINDINGS: &str = "findings.json";

/// Which kind of run owns the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Export/import run.
    Migrate,
    /// Listing and classification only.
    Plan,
    /// Source/target comparison.
    Validate,
}

impl RunMode {
    /// Directory name for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Migrate => "migrate",
            Self::Plan => "plan",
            Self::Validate => "validate",
        }
    }
}

/// Which account an export belongs to when both are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Source account.
    Source,
    /// Target account.
    Target,
}

impl Side {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

/// Millisecond-precision UTC timestamp used to name run directories.
pub fn run_timestamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S%3f").to_string()
}

/// Name of the export file for `index` and `category`.
pub fn export_file_name(index: &str, category: Category) -> String {
    format!("{index}_{category}_export.ndjson")
}

/// Joins names the way the review lists are written: `",\n"` separated.
pub fn format_name_list(names: &[String]) -> String {
    let mut list = names.join(",\n");
    list.push('\n');
    list
}

/// The artifact directory of one run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    dir: PathBuf,
}

impl RunArtifacts {
    /// Creates `<root>/<mode>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Artifact`] if the directory cannot be created.
    pub fn create(root: &Path, mode: RunMode) -> Result<Self> {
        Self::create_at(root.join(mode.as_str()).join(run_timestamp()))
    }

    /// Uses `dir` as the run directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Artifact`] if the directory cannot be created.
    pub fn create_at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| Error::artifact(&dir, e))?;
        Ok(Self { dir })
    }

    /// Run directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a file in the run directory.
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Export file used by migration.
    pub fn export_path(&self, index: &str, category: Category) -> PathBuf {
        self.dir.join(export_file_name(index, category))
    }

    /// Export file used by validation, under `source/` or `target/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Artifact`] if the side directory cannot be created.
    pub fn side_export_path(&self, side: Side, index: &str, category: Category) -> Result<PathBuf> {
        let dir = self.dir.join(side.as_str());
        std::fs::create_dir_all(&dir).map_err(|e| Error::artifact(&dir, e))?;
        Ok(dir.join(export_file_name(index, category)))
    }

    /// Writes `value` as pretty JSON to `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(file);
        let body = serde_json::to_vec_pretty(value)?;
        std::fs::write(&path, body).map_err(|e| Error::artifact(&path, e))?;
        Ok(path)
    }

    /// Writes a name list to `file`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Artifact`] if the write fails.
    pub fn write_names(&self, file: &str, names: &[String]) -> Result<PathBuf> {
        self.write_text(file, &format_name_list(names))
    }

    /// Writes plain text to `file`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Artifact`] if the write fails.
    pub fn write_text(&self, file: &str, body: &str) -> Result<PathBuf> {
        let path = self.path(file);
        std::fs::write(&path, body).map_err(|e| Error::artifact(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_timestamp_has_millisecond_precision() {
        let ts = run_timestamp();
        assert_eq!(ts.len(), 17);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("hub.products", Category::Rules),
            "hub.products_rules_export.ndjson"
        );
    }

    #[test]
    fn test_format_name_list() {
        let names = vec!["a.one".to_string(), "b.two".to_string()];
        assert_eq!(format_name_list(&names), "a.one,\nb.two\n");
        assert_eq!(format_name_list(&[]), "\n");
    }

    #[test]
    fn test_create_lays_out_mode_and_timestamp() {
        let root = TempDir::new().unwrap();
        let artifacts = RunArtifacts::create(root.path(), RunMode::Validate).unwrap();

        assert!(artifacts.dir().is_dir());
        assert!(artifacts.dir().starts_with(root.path().join("validate")));

        let path = artifacts
            .side_export_path(Side::Target, "h.p", Category::Settings)
            .unwrap();
        assert_eq!(
            path,
            artifacts.dir().join("target").join("h.p_settings_export.ndjson")
        );
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_write_names_and_json() {
        let root = TempDir::new().unwrap();
        let artifacts = RunArtifacts::create_at(root.path().join("run")).unwrap();

        let list = artifacts
            .write_names(PRIMARIES_LIST, &["h.p".to_string()])
            .unwrap();
        assert_eq!(std::fs::read_to_string(list).unwrap(), "h.p\n");

        let json = artifacts.write_json(FINDINGS, &vec![1, 2]).unwrap();
        let parsed: Vec<u32> = serde_json::from_slice(&std::fs::read(json).unwrap()).unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }
}
