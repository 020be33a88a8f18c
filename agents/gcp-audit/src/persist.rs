//! Report persistence with fallback
//!
//! Tier order: primary directory (must already exist and be writable),
//! fallback directory (created on demand), then an inline `data:` URI.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use tracing::{info, warn};

use crate::error::AuditError;

/// Prefix of the inline fallback location
pub const DATA_URI_PREFIX: &str =
    "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,";

/// Writes finished reports and returns where they landed
#[derive(Debug, Clone)]
pub struct ArtifactPersister {
    primary_dir: Option<PathBuf>,
    fallback_dir: PathBuf,
}

impl ArtifactPersister {
    pub fn new(primary_dir: Option<PathBuf>, fallback_dir: PathBuf) -> Self {
        Self {
            primary_dir,
            fallback_dir,
        }
    }

    /// Persist `bytes` as `file_name`
    ///
    /// Returns an absolute path (tiers 1-2) or a `data:` URI (tier 3).
    pub fn persist(&self, bytes: &[u8], file_name: &str) -> Result<String, AuditError> {
        if let Some(primary) = &self.primary_dir {
            match write_into(primary, file_name, bytes, false) {
                Ok(path) => {
                    info!(path = %path, "💾 Report written to primary directory");
                    return Ok(path);
                }
                Err(e) => warn!(dir = ?primary, error = %e, "Primary report directory unusable"),
            }
        } else {
            warn!("No primary report directory configured");
        }

        match write_into(&self.fallback_dir, file_name, bytes, true) {
            Ok(path) => {
                info!(path = %path, "💾 Report written to fallback directory");
                return Ok(path);
            }
            Err(e) => warn!(
                dir = ?self.fallback_dir,
                error = %e,
                "Fallback report directory unusable, embedding report inline"
            ),
        }

        Ok(data_uri(bytes))
    }
}

/// Inline `data:` URI embedding the artifact
pub fn data_uri(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("{DATA_URI_PREFIX}{encoded}")
}

fn write_into(dir: &Path, file_name: &str, bytes: &[u8], create: bool) -> std::io::Result<String> {
    if create && !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    ensure_writable_dir(dir)?;

    // Stage under a side name so a failed write never leaves a truncated report
    let path = dir.join(file_name);
    let staging = dir.join(format!(".{file_name}.partial"));
    if let Err(e) = fs::write(&staging, bytes).and_then(|_| fs::rename(&staging, &path)) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    let absolute = fs::canonicalize(&path).unwrap_or(path);
    Ok(absolute.display().to_string())
}

fn ensure_writable_dir(dir: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(dir)?;

    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Not a directory: {}", dir.display()),
        ));
    }

    if metadata.permissions().readonly() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("Directory is not writable: {}", dir.display()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ARTIFACT: &[u8] = b"PK\x03\x04 fake workbook bytes";

    #[test]
    fn test_primary_directory_wins() {
        let home = tempdir().unwrap();
        let temp = tempdir().unwrap();
        let persister =
            ArtifactPersister::new(Some(home.path().to_path_buf()), temp.path().to_path_buf());

        let location = persister.persist(ARTIFACT, "report.xlsx").unwrap();

        let expected = fs::canonicalize(home.path().join("report.xlsx")).unwrap();
        assert_eq!(location, expected.display().to_string());
        assert_eq!(fs::read(&expected).unwrap(), ARTIFACT);
    }

    #[test]
    fn test_missing_primary_falls_back_to_temp() {
        let base = tempdir().unwrap();
        let temp = tempdir().unwrap();
        let missing_home = base.path().join("no-such-home");
        let persister = ArtifactPersister::new(Some(missing_home.clone()), temp.path().to_path_buf());

        let location = persister.persist(ARTIFACT, "report.xlsx").unwrap();

        assert!(!location.starts_with("data:"));
        assert!(Path::new(&location).is_absolute());
        assert!(Path::new(&location).starts_with(fs::canonicalize(temp.path()).unwrap()));
        // Primary tier is never created
        assert!(!missing_home.exists());
    }

    #[test]
    fn test_fallback_directory_is_created() {
        let base = tempdir().unwrap();
        let nested = base.path().join("audit").join("reports");
        let persister = ArtifactPersister::new(None, nested.clone());

        let location = persister.persist(ARTIFACT, "report.xlsx").unwrap();

        assert!(nested.is_dir());
        assert_eq!(fs::read(&location).unwrap(), ARTIFACT);
    }

    #[test]
    fn test_total_fallback_embeds_artifact() {
        let base = tempdir().unwrap();
        // A regular file blocks directory creation beneath it
        let blocker = base.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let persister = ArtifactPersister::new(
            Some(base.path().join("missing")),
            blocker.join("nested"),
        );

        let location = persister.persist(ARTIFACT, "report.xlsx").unwrap();

        assert!(location.starts_with(DATA_URI_PREFIX));
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&location[DATA_URI_PREFIX.len()..])
            .unwrap();
        assert_eq!(decoded, ARTIFACT);
    }

    #[test]
    fn test_primary_that_is_a_file_is_skipped() {
        let base = tempdir().unwrap();
        let not_a_dir = base.path().join("home-file");
        fs::write(&not_a_dir, b"x").unwrap();
        let temp = tempdir().unwrap();

        let persister = ArtifactPersister::new(Some(not_a_dir), temp.path().to_path_buf());
        let location = persister.persist(ARTIFACT, "report.xlsx").unwrap();

        assert!(Path::new(&location).starts_with(fs::canonicalize(temp.path()).unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_primary_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let base = tempdir().unwrap();
        let home = base.path().join("home");
        fs::create_dir(&home).unwrap();
        fs::set_permissions(&home, fs::Permissions::from_mode(0o555)).unwrap();
        let temp = tempdir().unwrap();

        let persister = ArtifactPersister::new(Some(home.clone()), temp.path().to_path_buf());
        let location = persister.persist(ARTIFACT, "report.xlsx");

        fs::set_permissions(&home, fs::Permissions::from_mode(0o755)).unwrap();
        let location = location.unwrap();

        assert!(!location.starts_with("data:"));
        assert!(Path::new(&location).starts_with(fs::canonicalize(temp.path()).unwrap()));
        assert_eq!(fs::read_dir(&home).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let home = tempdir().unwrap();
        // A directory squatting on the report name makes the final rename fail
        fs::create_dir(home.path().join("report.xlsx")).unwrap();
        let temp = tempdir().unwrap();

        let persister =
            ArtifactPersister::new(Some(home.path().to_path_buf()), temp.path().to_path_buf());
        let location = persister.persist(ARTIFACT, "report.xlsx").unwrap();

        assert!(Path::new(&location).starts_with(fs::canonicalize(temp.path()).unwrap()));
        assert_eq!(fs::read(&location).unwrap(), ARTIFACT);
        let leftovers: Vec<_> = fs::read_dir(home.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("report.xlsx")]);
    }
}
