use crate::archive::{self, ArchiveOutcome};
use crate::config::{MailSettings, MountEntry, OwnerTable};
use crate::logbook::RunLog;
use crate::notify::{self, Mailer};
use crate::paths;
use crate::sync::{self, Remote, VerifyOutcome};
use chrono::{Datelike, NaiveDate};
use human_bytes::human_bytes;
use std::path::Path;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunCounts {
    /// Directories archived, uploaded and verified.
    pub archived: usize,
    /// Directories skipped because no data existed for the date.
    pub skipped: usize,
    /// Directories that hit an archiving or upload failure.
    pub failed: usize,
}

/// Runs the whole backup for one date, strictly sequentially.
///
/// Every per-directory failure is converted into a log entry and the loop
/// moves on; nothing here aborts the run. The daily and one-shot entry
/// points both drive this same function.
#[allow(clippy::too_many_arguments)]
pub fn run(
    date: NaiveDate,
    mounts_cfg: &[MountEntry],
    scratch: &Path,
    remote: &dyn Remote,
    mailer: &dyn Mailer,
    owners: &OwnerTable,
    mail: &MailSettings,
    mount_live: &dyn Fn(&str) -> bool,
    log: &mut RunLog,
) -> RunCounts {
    let mut counts = RunCounts::default();

    for entry in mounts_cfg {
        if !mount_live(&entry.mount) {
            log.error(format!(
                "Mount point {} is not mounted, skipping its directories",
                entry.mount
            ));
            continue;
        }

        for label in &entry.labels {
            process_dir(
                date, entry, label, scratch, remote, mailer, owners, mail, log, &mut counts,
            );
        }
    }

    log.info(format!(
        "Run finished: {} archived, {} skipped, {} failed",
        counts.archived, counts.skipped, counts.failed
    ));
    counts
}

#[allow(clippy::too_many_arguments)]
fn process_dir(
    date: NaiveDate,
    entry: &MountEntry,
    label: &str,
    scratch: &Path,
    remote: &dyn Remote,
    mailer: &dyn Mailer,
    owners: &OwnerTable,
    mail: &MailSettings,
    log: &mut RunLog,
    counts: &mut RunCounts,
) {
    let resolved = match paths::resolve(
        date.year(),
        date.month(),
        date.day(),
        &entry.mount,
        label,
        &entry.remote,
    ) {
        Ok(r) => r,
        Err(e) => {
            log.error(format!("Could not resolve paths under {}: {e}", entry.mount));
            counts.failed += 1;
            return;
        }
    };

    match archive::stage(Path::new(&resolved.src_root), &resolved.leaf, scratch) {
        Ok(ArchiveOutcome::SkippedMissing) => {
            log.info(format!(
                "Source directory {} does not exist, nothing to do",
                resolved.src_dir
            ));
            counts.skipped += 1;
        }
        Ok(ArchiveOutcome::SkippedEmpty) => {
            log.info(format!(
                "No data in source directory {}, nothing to do",
                resolved.src_dir
            ));
            counts.skipped += 1;
        }
        Err(e) => {
            log.error(format!("Failed to archive {}: {e:#}", resolved.src_dir));
            counts.failed += 1;
        }
        Ok(ArchiveOutcome::Created { zip_path, bytes }) => {
            log.info(format!(
                "Archived {} ({})",
                resolved.src_dir,
                human_bytes(bytes as f64)
            ));
            match sync::verify(remote, &zip_path, &resolved.dest, log) {
                VerifyOutcome::Verified => {
                    counts.archived += 1;
                    if let Some(owner) = owners.get(label) {
                        match mailer.send(&notify::owner_notice(owner, &resolved.dest, mail)) {
                            Ok(()) => log.info(format!(
                                "Notified {} ({})",
                                owner.display_name, owner.recipient
                            )),
                            Err(e) => log.error(format!(
                                "Failed to notify {}: {e:#}",
                                owner.recipient
                            )),
                        }
                    }
                }
                VerifyOutcome::CopyFailed | VerifyOutcome::Mismatch => {
                    counts.failed += 1;
                }
            }
        }
    }
}
