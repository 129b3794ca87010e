//! Attachment resolution.
//!
//! An explicit resume wins when it exists; otherwise, with auto-attach on,
//! the most recently modified file in the upload directory is used. Extra
//! configured attachments are unioned in. Nothing here is fatal: missing
//! files are warned about and skipped.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::CampaignConfig;

/// Resolves the files attached to every message of a run.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    resume_path: Option<PathBuf>,
    upload_dir: PathBuf,
    auto_attach: bool,
    extra: Vec<PathBuf>,
}

impl AttachmentResolver {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            resume_path: None,
            upload_dir: upload_dir.into(),
            auto_attach: true,
            extra: Vec::new(),
        }
    }

    pub fn from_config(config: &CampaignConfig) -> Self {
        Self {
            resume_path: config.resume_path.clone(),
            upload_dir: config.resume_upload_dir.clone(),
            auto_attach: config.auto_attach_resume,
            extra: config.attachment_paths.clone(),
        }
    }

    pub fn with_resume_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resume_path = Some(path.into());
        self
    }

    pub fn with_auto_attach(mut self, enabled: bool) -> Self {
        self.auto_attach = enabled;
        self
    }

    pub fn with_extra(mut self, paths: Vec<PathBuf>) -> Self {
        self.extra = paths;
        self
    }

    /// The resume to attach, if any.
    pub fn resume(&self) -> Option<PathBuf> {
        if let Some(path) = &self.resume_path {
            if path.is_file() {
                return Some(path.clone());
            }
            warn!(path = %path.display(), "Configured resume not found");
        }
        if self.auto_attach {
            let latest = latest_file(&self.upload_dir);
            if let Some(path) = &latest {
                debug!(path = %path.display(), "Auto-attaching most recent upload");
            }
            return latest;
        }
        None
    }

    /// Resume plus extra attachments, de-duplicated by path string.
    pub fn resolve(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.resume()
            .into_iter()
            .chain(self.extra.iter().cloned())
            .filter(|p| seen.insert(p.to_string_lossy().into_owned()))
            .collect()
    }
}

/// Most recently modified regular file in `dir`. Equal times keep the
/// lexicographically greatest path so the result is stable.
pub fn latest_file(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Upload directory not readable");
            return None;
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, entry.path()))
        })
        .max()
        .map(|(_, path)| path)
}

/// Keep only the attachments that exist right now.
pub fn verify(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                warn!(path = %path.display(), "Attachment missing, skipping");
            }
            exists
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, mtime_secs: i64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
        path
    }

    #[test]
    fn newest_upload_is_attached() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "old.pdf", 1_000);
        let newest = touch(tmp.path(), "newest.pdf", 3_000);
        touch(tmp.path(), "middle.pdf", 2_000);

        let resolver = AttachmentResolver::new(tmp.path());
        assert_eq!(resolver.resolve(), vec![newest]);
    }

    #[test]
    fn explicit_resume_wins() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "upload.pdf", 5_000);
        let explicit = tmp.path().join("explicit.pdf");
        fs::write(&explicit, "cv").unwrap();

        let resolver = AttachmentResolver::new(tmp.path()).with_resume_path(&explicit);
        assert_eq!(resolver.resolve(), vec![explicit]);
    }

    #[test]
    fn missing_explicit_resume_falls_back_to_uploads() {
        let tmp = TempDir::new().unwrap();
        let upload = touch(tmp.path(), "upload.pdf", 5_000);

        let resolver = AttachmentResolver::new(tmp.path()).with_resume_path(tmp.path().join("nope.pdf"));
        assert_eq!(resolver.resolve(), vec![upload]);
    }

    #[test]
    fn auto_attach_disabled_attaches_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "upload.pdf", 5_000);

        let resolver = AttachmentResolver::new(tmp.path()).with_auto_attach(false);
        assert!(resolver.resolve().is_empty());
    }

    #[test]
    fn empty_or_absent_upload_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(AttachmentResolver::new(tmp.path()).resolve().is_empty());
        assert!(AttachmentResolver::new(tmp.path().join("absent")).resolve().is_empty());
    }

    #[test]
    fn subdirectories_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "cv.pdf", 1_000);
        fs::create_dir(tmp.path().join("newer_dir")).unwrap();
        assert_eq!(latest_file(tmp.path()), Some(file));
    }

    #[test]
    fn extras_are_unioned_and_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let resume = touch(tmp.path(), "cv.pdf", 1_000);
        let letter = tmp.path().join("letter.pdf");

        let resolver = AttachmentResolver::new(tmp.path()).with_extra(vec![
            resume.clone(),
            letter.clone(),
            letter.clone(),
        ]);
        assert_eq!(resolver.resolve(), vec![resume, letter]);
    }

    #[test]
    fn verify_skips_missing_files() {
        let tmp = TempDir::new().unwrap();
        let present = touch(tmp.path(), "cv.pdf", 1_000);
        let missing = tmp.path().join("gone.pdf");
        assert_eq!(verify(&[missing, present.clone()]), vec![present]);
    }
}
