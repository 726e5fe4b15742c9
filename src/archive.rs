use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::{CompressionMethod, DateTime as ZipDateTime, ZipWriter, write::SimpleFileOptions};

#[derive(Debug, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Archive written to scratch, ready for upload.
    Created { zip_path: PathBuf, bytes: u64 },
    /// `src_root/leaf` is not a directory; nothing was written.
    SkippedMissing,
    /// The leaf directory exists but holds no entries; nothing was written.
    SkippedEmpty,
}

/// Packages one day's leaf directory into `<scratch>/<leaf>.zip`.
///
/// Entries are rooted at `leaf/...` so extraction reproduces the leaf
/// directory, not the absolute path. A stale zip from an earlier failed run
/// is overwritten. Entry order and timestamps are fixed, so staging the same
/// unchanged tree twice yields byte-identical archives.
pub fn stage(src_root: &Path, leaf: &str, scratch: &Path) -> Result<ArchiveOutcome> {
    let src_dir = src_root.join(leaf);
    if !src_dir.is_dir() {
        return Ok(ArchiveOutcome::SkippedMissing);
    }

    let mut entries = fs::read_dir(&src_dir)
        .with_context(|| format!("failed to read source directory {}", src_dir.display()))?;
    if entries.next().is_none() {
        return Ok(ArchiveOutcome::SkippedEmpty);
    }

    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(&src_dir).min_depth(1) {
        let entry =
            entry.with_context(|| format!("failed to walk source tree {}", src_dir.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src_root)
            .context("walked entry escaped the source root")?
            .to_path_buf();
        if entry.file_type().is_dir() {
            dirs.push(rel);
        } else {
            files.push(rel);
        }
    }
    dirs.sort();
    files.sort();

    let zip_path = scratch.join(format!("{leaf}.zip"));
    let zip_file = File::create(&zip_path)
        .with_context(|| format!("failed to create archive {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(zip_file);

    // Fixed timestamp keeps reruns byte-identical for the size-only check.
    let fixed_time = ZipDateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .context("failed to build archive timestamp")?;
    let dir_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(fixed_time)
        .unix_permissions(0o755);
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(fixed_time)
        .unix_permissions(0o644);

    zip.add_directory(leaf, dir_options)
        .with_context(|| format!("failed to add {leaf} to archive"))?;
    for rel in &dirs {
        zip.add_directory(zip_name(rel), dir_options)
            .with_context(|| format!("failed to add directory {} to archive", rel.display()))?;
    }
    for rel in &files {
        let full = src_root.join(rel);
        let mut source = File::open(&full)
            .with_context(|| format!("failed to open {} for archiving", full.display()))?;
        zip.start_file(zip_name(rel), file_options)
            .with_context(|| format!("failed to add file {} to archive", rel.display()))?;
        io::copy(&mut source, &mut zip)
            .with_context(|| format!("failed to compress {}", full.display()))?;
    }
    zip.finish().context("failed to finalize archive")?;

    let bytes = fs::metadata(&zip_path)
        .with_context(|| format!("failed to stat archive {}", zip_path.display()))?
        .len();
    Ok(ArchiveOutcome::Created { zip_path, bytes })
}

fn zip_name(rel: &Path) -> String {
    rel.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
