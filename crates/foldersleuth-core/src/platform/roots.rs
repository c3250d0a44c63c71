/// Scan-root enumeration.
///
/// On Windows the roots are the local logical drives (network drives are
/// excluded). Elsewhere they are the mount points of real filesystems read
/// from `/proc/self/mounts`, or just `/` when that table is unavailable.
///
/// Failures are logged and produce an empty list; they never propagate.
use std::path::PathBuf;

/// List the roots a scan can start from.
pub fn list_roots() -> Vec<PathBuf> {
    let roots = imp::list_roots();
    tracing::info!("Loaded {} scan roots", roots.len());
    roots
}

#[cfg(windows)]
mod imp {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use std::path::PathBuf;
    use windows::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDriveStringsW};

    // Drive type constant from the Windows API.
    const DRIVE_REMOTE_VAL: u32 = 4;

    pub(super) fn list_roots() -> Vec<PathBuf> {
        let mut roots = Vec::new();

        // GetLogicalDriveStringsW returns null-separated drive root strings.
        let mut buffer = [0u16; 256];
        let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };

        if len == 0 || len as usize > buffer.len() {
            tracing::warn!("GetLogicalDriveStringsW returned {len}");
            return roots;
        }

        let full = OsString::from_wide(&buffer[..len as usize]);
        let full_str = full.to_string_lossy();

        for root in full_str.split('\0').filter(|s| !s.is_empty()) {
            let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
            let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

            let raw_type = unsafe { GetDriveTypeW(root_pcwstr) };
            if raw_type == DRIVE_REMOTE_VAL {
                continue;
            }
            roots.push(PathBuf::from(root));
        }

        roots
    }
}

#[cfg(not(windows))]
mod imp {
    use std::path::PathBuf;

    const MOUNT_TABLE: &str = "/proc/self/mounts";

    /// Filesystem types that never hold user files worth scanning.
    const PSEUDO_FILESYSTEMS: &[&str] = &[
        "proc",
        "sysfs",
        "devtmpfs",
        "devpts",
        "tmpfs",
        "cgroup",
        "cgroup2",
        "securityfs",
        "pstore",
        "bpf",
        "debugfs",
        "tracefs",
        "configfs",
        "fusectl",
        "mqueue",
        "hugetlbfs",
        "autofs",
        "binfmt_misc",
        "overlay",
        "squashfs",
        "nsfs",
        "efivarfs",
        "rpc_pipefs",
    ];

    pub(super) fn list_roots() -> Vec<PathBuf> {
        match std::fs::read_to_string(MOUNT_TABLE) {
            Ok(table) => {
                let roots = parse_mount_table(&table);
                if roots.is_empty() {
                    vec![PathBuf::from("/")]
                } else {
                    roots
                }
            }
            Err(err) => {
                tracing::debug!("Cannot read {MOUNT_TABLE} ({err}); using /");
                vec![PathBuf::from("/")]
            }
        }
    }

    /// Mount points of real filesystems, in table order, without duplicates.
    pub(super) fn parse_mount_table(table: &str) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for line in table.lines() {
            let mut fields = line.split_whitespace();
            let (Some(_device), Some(mount_point), Some(fs_type)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if PSEUDO_FILESYSTEMS.contains(&fs_type) {
                continue;
            }
            let path = PathBuf::from(unescape_mount_point(mount_point));
            if !roots.contains(&path) {
                roots.push(path);
            }
        }
        roots
    }

    /// The kernel escapes space, tab, newline and backslash as `\ooo` octal.
    fn unescape_mount_point(raw: &str) -> String {
        let bytes = raw.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\\' && i + 4 <= bytes.len() {
                let digits = &bytes[i + 1..i + 4];
                if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                    let value = digits
                        .iter()
                        .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                    if let Ok(value) = u8::try_from(value) {
                        out.push(value);
                        i += 4;
                        continue;
                    }
                }
            }
            out.push(bytes[i]);
            i += 1;
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_pseudo_filesystems_are_skipped() {
            let table = "\
sysfs /sys sysfs rw,nosuid 0 0
proc /proc proc rw,nosuid 0 0
/dev/sda1 / ext4 rw,relatime 0 0
tmpfs /run tmpfs rw 0 0
/dev/sdb1 /mnt/data xfs rw 0 0
/dev/sda1 / ext4 rw,relatime 0 0
";
            assert_eq!(
                parse_mount_table(table),
                vec![PathBuf::from("/"), PathBuf::from("/mnt/data")]
            );
        }

        #[test]
        fn test_escaped_mount_points() {
            let table = "/dev/sdc1 /media/usb\\040stick vfat rw 0 0\n";
            assert_eq!(
                parse_mount_table(table),
                vec![PathBuf::from("/media/usb stick")]
            );
        }

        #[test]
        fn test_malformed_lines_are_ignored() {
            assert!(parse_mount_table("garbage\n\n/dev/x\n").is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The result is environment-dependent; it must not panic and, on any
    /// non-Windows host, always offers at least one root.
    #[test]
    fn list_roots_does_not_panic() {
        let roots = list_roots();
        if cfg!(not(windows)) {
            assert!(!roots.is_empty());
        }
    }
}
