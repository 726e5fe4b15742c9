use crate::logbook::RunLog;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

const RCLONE_BIN: &str = "/usr/bin/rclone";

/// The three external operations against remote storage.
///
/// Each is a synchronous, blocking subprocess; only the exit status is
/// meaningful, stdout and stderr are never parsed. `Ok(true)` is a zero
/// exit status, `Ok(false)` non-zero, `Err` means the tool could not run.
pub trait Remote {
    fn ensure_dir(&self, dest: &str) -> io::Result<bool>;
    fn copy(&self, local: &Path, dest: &str) -> io::Result<bool>;
    fn check_size(&self, local: &Path, dest: &str) -> io::Result<bool>;
}

/// Production remote backed by the rclone binary.
pub struct Rclone;

impl Remote for Rclone {
    fn ensure_dir(&self, dest: &str) -> io::Result<bool> {
        Ok(Command::new(RCLONE_BIN)
            .args(["mkdir", dest])
            .status()?
            .success())
    }

    fn copy(&self, local: &Path, dest: &str) -> io::Result<bool> {
        Ok(Command::new(RCLONE_BIN)
            .arg("copy")
            .arg(local)
            .arg(dest)
            .status()?
            .success())
    }

    fn check_size(&self, local: &Path, dest: &str) -> io::Result<bool> {
        Ok(Command::new(RCLONE_BIN)
            .args(["check", "--size-only"])
            .arg(local)
            .arg(dest)
            .status()?
            .success())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Upload confirmed by size, local artifact deleted.
    Verified,
    /// Copy step failed; artifact kept for the next run.
    CopyFailed,
    /// Sizes differ; artifact kept for manual inspection.
    Mismatch,
}

/// Uploads the archive and confirms it landed, deleting on success only.
///
/// No step retries within a run; a failed directory is reported through the
/// run log and retried by the next scheduled run.
pub fn verify(remote: &dyn Remote, zip_path: &Path, dest: &str, log: &mut RunLog) -> VerifyOutcome {
    // Create-if-absent; "already exists" is a zero exit. A genuine failure
    // here surfaces again at the copy step, so keep going.
    match remote.ensure_dir(dest) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            log.info(format!("Could not ensure remote directory {dest}, continuing"));
        }
    }

    log.info(format!("Uploading {} to {dest}", zip_path.display()));
    match remote.copy(zip_path, dest) {
        Ok(true) => {}
        Ok(false) => {
            log.error(format!("Failed to upload {} to {dest}", zip_path.display()));
            return VerifyOutcome::CopyFailed;
        }
        Err(e) => {
            log.error(format!("Could not run the upload tool: {e}"));
            return VerifyOutcome::CopyFailed;
        }
    }

    match remote.check_size(zip_path, dest) {
        Ok(true) => {
            log.info(format!("Verified {} against {dest}", zip_path.display()));
            if let Err(e) = fs::remove_file(zip_path) {
                log.error(format!(
                    "Could not remove local archive {}: {e}",
                    zip_path.display()
                ));
            }
            VerifyOutcome::Verified
        }
        Ok(false) => {
            log.error(format!(
                "Size check failed for {} against {dest}, keeping local archive",
                zip_path.display()
            ));
            VerifyOutcome::Mismatch
        }
        Err(e) => {
            log.error(format!(
                "Could not run the size check: {e}, keeping local archive"
            ));
            VerifyOutcome::Mismatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Scripted remote recording every call it receives.
    pub struct MockRemote {
        pub mkdir_ok: bool,
        pub copy_ok: bool,
        pub check_ok: bool,
        pub calls: RefCell<Vec<String>>,
    }

    impl MockRemote {
        pub fn new(mkdir_ok: bool, copy_ok: bool, check_ok: bool) -> Self {
            MockRemote {
                mkdir_ok,
                copy_ok,
                check_ok,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Remote for MockRemote {
        fn ensure_dir(&self, dest: &str) -> io::Result<bool> {
            self.calls.borrow_mut().push(format!("mkdir {dest}"));
            Ok(self.mkdir_ok)
        }

        fn copy(&self, local: &Path, dest: &str) -> io::Result<bool> {
            self.calls
                .borrow_mut()
                .push(format!("copy {} {dest}", local.display()));
            Ok(self.copy_ok)
        }

        fn check_size(&self, local: &Path, dest: &str) -> io::Result<bool> {
            self.calls
                .borrow_mut()
                .push(format!("check {} {dest}", local.display()));
            Ok(self.check_ok)
        }
    }

    fn staged_zip(scratch: &TempDir) -> std::path::PathBuf {
        let path = scratch.path().join("21_0819.zip");
        fs::write(&path, "zip bytes").unwrap();
        path
    }

    #[test]
    fn test_verified_upload_deletes_artifact() {
        let scratch = TempDir::new().unwrap();
        let zip = staged_zip(&scratch);
        let remote = MockRemote::new(true, true, true);
        let mut log = RunLog::new();

        let outcome = verify(&remote, &zip, "bellahtw:data/Undulator/Y2021/08-Aug", &mut log);
        assert_eq!(outcome, VerifyOutcome::Verified);
        assert!(!zip.exists());

        let calls = remote.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("mkdir "));
        assert!(calls[1].starts_with("copy "));
        assert!(calls[2].starts_with("check "));
    }

    #[test]
    fn test_failed_copy_keeps_artifact_and_skips_check() {
        let scratch = TempDir::new().unwrap();
        let zip = staged_zip(&scratch);
        let remote = MockRemote::new(true, false, true);
        let mut log = RunLog::new();

        let outcome = verify(&remote, &zip, "bella:data/Y2021/04-Apr", &mut log);
        assert_eq!(outcome, VerifyOutcome::CopyFailed);
        assert!(zip.exists());
        assert!(remote.calls.borrow().iter().all(|c| !c.starts_with("check")));
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn test_size_mismatch_keeps_artifact() {
        let scratch = TempDir::new().unwrap();
        let zip = staged_zip(&scratch);
        let remote = MockRemote::new(true, true, false);
        let mut log = RunLog::new();

        let outcome = verify(&remote, &zip, "bella:data/Y2021/04-Apr", &mut log);
        assert_eq!(outcome, VerifyOutcome::Mismatch);
        assert!(zip.exists());
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn test_mkdir_failure_does_not_abort_upload() {
        let scratch = TempDir::new().unwrap();
        let zip = staged_zip(&scratch);
        let remote = MockRemote::new(false, true, true);
        let mut log = RunLog::new();

        let outcome = verify(&remote, &zip, "bella:data/Y2021/04-Apr", &mut log);
        assert_eq!(outcome, VerifyOutcome::Verified);
        assert!(!zip.exists());
    }
}
