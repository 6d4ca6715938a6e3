use patentdraft_core::error::FileNamerError;
use patentdraft_core::naming::resolve_with;
use std::path::{Path, PathBuf};

/// Pick a free output path for `title` inside `dir`.
///
/// A path whose existence cannot be determined counts as taken, so an
/// existing document is never chosen for overwrite.
pub fn resolve(title: &str, dir: &Path) -> Result<PathBuf, FileNamerError> {
    resolve_with(title, dir, |path| path.try_exists().unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentdraft_core::naming::{candidate_file_name, MAX_COUNTER};
    use std::fs;

    #[test]
    fn test_resolve_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(candidate_file_name("智能灌溉系统", None)), "old").unwrap();
        fs::write(dir.path().join(candidate_file_name("智能灌溉系统", Some(1))), "old").unwrap();

        let path = resolve("智能灌溉系统", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("智能灌溉系统_专利交底书_2.md"));
        assert!(!path.exists(), "resolve must not create the file");
    }

    #[test]
    fn test_resolve_fails_after_every_counter_is_taken() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(candidate_file_name("t", None)), "").unwrap();
        for n in 1..=MAX_COUNTER {
            fs::write(dir.path().join(candidate_file_name("t", Some(n))), "").unwrap();
        }

        assert!(matches!(
            resolve("t", dir.path()),
            Err(FileNamerError::ExhaustedAttempts { .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 101);
    }
}
