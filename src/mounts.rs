use std::fs;

/// Checks that a configured mount point is an active mount.
///
/// Guards against archiving an empty local directory after the network
/// mount has dropped. An unreadable `/proc/mounts` counts as not live.
#[must_use]
pub fn is_live(mount: &str) -> bool {
    match fs::read_to_string("/proc/mounts") {
        Ok(content) => mount_listed(&content, mount),
        Err(_) => false,
    }
}

fn mount_listed(proc_mounts: &str, mount: &str) -> bool {
    // /proc/mounts: device mountpoint fstype options dump pass
    let want = mount.trim_end_matches('/');
    proc_mounts
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|mountpoint| mountpoint == want)
}
