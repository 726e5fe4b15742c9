use thiserror::Error;

/// Fixed English month abbreviations used in the year/month directory names.
pub const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("month must be an integer between 1 and 12, got {0}")]
    InvalidMonth(u32),
}

/// All path strings derived from one (date, mount, label) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Innermost date-stamped directory name, e.g. `21_0406`.
    pub leaf: String,
    /// Year/month segment shared by source and destination, e.g. `Y2021/04-Apr`.
    pub root: String,
    /// Absolute directory the archive is rooted at, e.g. `/bella/htw/Undulator/Y2021/04-Apr`.
    pub src_root: String,
    /// The raw-data directory itself: `src_root/leaf`.
    pub src_dir: String,
    /// Remote destination, e.g. `bellahtw:data/Undulator/Y2021/04-Apr`.
    pub dest: String,
}

/// Derives source and destination paths for one day of data.
///
/// Pure string construction, no filesystem access. `mount` and a non-empty
/// `label` are expected to carry their trailing slash, matching the mount
/// table. Day/month combinations invalid for the given year are the caller's
/// responsibility (a `NaiveDate` upstream); only the month range is checked
/// here.
pub fn resolve(
    year: i32,
    month: u32,
    day: u32,
    mount: &str,
    label: &str,
    remote: &str,
) -> Result<ResolvedPaths, PathError> {
    if !(1..=12).contains(&month) {
        return Err(PathError::InvalidMonth(month));
    }

    let leaf = format!("{:02}_{:02}{:02}", year.rem_euclid(100), month, day);
    let root = format!("Y{:04}/{:02}-{}", year, month, MONTH_ABBREV[month as usize - 1]);
    let src_root = format!("{mount}{label}{root}");
    let src_dir = format!("{src_root}/{leaf}");
    let dest = format!("{remote}:data/{label}{root}");

    Ok(ResolvedPaths {
        leaf,
        root,
        src_root,
        src_dir,
        dest,
    })
}
