//! Socket inode to owning process correlation.
//!
//! The kernel offers no direct "who owns this socket" query. The cache walks
//! every process directory under the proc root, follows each descriptor link
//! and records the inodes of socket-backed descriptors.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Column width of the program column, including the separator.
pub const PROGNAME_WIDTH: usize = 20;
/// Column width of the security context column.
pub const LABEL_WIDTH: usize = 50;
/// Placeholder for anything the cache cannot tell.
pub const UNKNOWN: &str = "-";

/// Outcome of the most recent process walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanStatus {
    /// `build` has not run since the last `clear`.
    #[default]
    NotLoaded,
    Complete,
    /// Some processes could not be inspected.
    Partial,
    /// Nothing could be read, either the process list itself or every
    /// process that was tried.
    Unreadable,
}

#[derive(Debug, Clone)]
struct ProcessRecord {
    program: String,
    label: String,
}

/// Mapping from socket inode to `pid/program` and security context.
///
/// Built once per cycle with [`ProcessCache::build`], read with
/// [`ProcessCache::lookup`], dropped with [`ProcessCache::clear`].
#[derive(Debug)]
pub struct ProcessCache {
    root: PathBuf,
    with_labels: bool,
    entries: HashMap<u64, ProcessRecord>,
    status: ScanStatus,
}

impl ProcessCache {
    pub fn new(root: impl Into<PathBuf>, with_labels: bool) -> Self {
        Self {
            root: root.into(),
            with_labels,
            entries: HashMap::new(),
            status: ScanStatus::NotLoaded,
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.status != ScanStatus::NotLoaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk the process table unless that already happened this cycle.
    pub fn build(&mut self) -> ScanStatus {
        if !self.is_loaded() {
            self.status = self.scan();
            tracing::info!(
                root = %self.root.display(),
                sockets = self.entries.len(),
                status = ?self.status,
                "process table scanned"
            );
        }
        self.status
    }

    /// `pid/program` owning `inode`, or `-`.
    pub fn lookup(&self, inode: u64) -> &str {
        self.entries
            .get(&inode)
            .map(|r| r.program.as_str())
            .unwrap_or(UNKNOWN)
    }

    /// Security context of the owner of `inode`, or `-`.
    pub fn lookup_label(&self, inode: u64) -> &str {
        self.entries
            .get(&inode)
            .map(|r| r.label.as_str())
            .unwrap_or(UNKNOWN)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.status = ScanStatus::NotLoaded;
    }

    /// Mark the table as already walked with the given outcome.
    #[cfg(test)]
    pub(crate) fn assume_status(&mut self, status: ScanStatus) {
        self.status = status;
    }

    /// Later owners of an already known inode are ignored.
    fn insert(&mut self, inode: u64, program: &str, label: &str) {
        self.entries.entry(inode).or_insert_with(|| ProcessRecord {
            program: program.to_string(),
            label: label.to_string(),
        });
    }

    #[cfg(target_os = "linux")]
    fn scan(&mut self) -> ScanStatus {
        let processes = match procfs::process::all_processes_with_root(&self.root) {
            Ok(iter) => iter,
            Err(e) => {
                tracing::warn!(root = %self.root.display(), "cannot list processes: {}", e);
                return ScanStatus::Unreadable;
            }
        };

        let mut denied = false;
        for process in processes {
            let process = match process {
                Ok(p) => p,
                Err(procfs::ProcError::PermissionDenied(_)) => {
                    denied = true;
                    continue;
                }
                Err(e) => {
                    tracing::debug!("skipping process: {}", e);
                    continue;
                }
            };
            match self.scan_process(&process) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => denied = true,
                // The process exited while we were looking at it.
                Err(e) => tracing::debug!(pid = process.pid, "skipping process: {}", e),
            }
        }

        walk_outcome(denied, !self.entries.is_empty())
    }

    #[cfg(not(target_os = "linux"))]
    fn scan(&mut self) -> ScanStatus {
        tracing::warn!("process correlation is only available on Linux");
        ScanStatus::Unreadable
    }

    #[cfg(target_os = "linux")]
    fn scan_process(&mut self, process: &procfs::process::Process) -> io::Result<()> {
        let pid = process.pid;
        let proc_dir = self.root.join(pid.to_string());
        // Resolved on the first socket descriptor only.
        let mut owner: Option<(String, String)> = None;

        for entry in fs::read_dir(proc_dir.join("fd"))? {
            let Ok(entry) = entry else { continue };
            let is_fd = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(|c: char| c.is_ascii_digit()));
            if !is_fd {
                continue;
            }
            let Ok(target) = fs::read_link(entry.path()) else {
                continue;
            };
            let Some(inode) = socket_inode(&target.to_string_lossy()) else {
                continue;
            };

            if owner.is_none() {
                let Ok(cmdline) = process.cmdline() else {
                    continue;
                };
                let label = if self.with_labels {
                    read_label(&proc_dir)
                } else {
                    UNKNOWN.to_string()
                };
                owner = Some((program_name(pid, &cmdline), label));
            }
            if let Some((program, label)) = &owner {
                self.insert(inode, program, label);
            }
        }
        Ok(())
    }
}

/// Summarise a process walk from whether any process refused inspection
/// and whether any socket owner was found.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn walk_outcome(denied: bool, found: bool) -> ScanStatus {
    match (denied, found) {
        (false, _) => ScanStatus::Complete,
        (true, false) => ScanStatus::Unreadable,
        (true, true) => ScanStatus::Partial,
    }
}

/// Extract the inode from a descriptor link target.
///
/// Accepts `socket:[12345]` and the older `[0000]:12345` form.
pub fn socket_inode(target: &str) -> Option<u64> {
    let digits = if let Some(rest) = target.strip_prefix("socket:[") {
        rest.strip_suffix(']')?
    } else {
        target.strip_prefix("[0000]:")?
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `pid/name`, where name is the basename of an absolute first argument
/// or the first argument as given.
pub fn program_name(pid: i32, cmdline: &[String]) -> String {
    let first = cmdline.first().map(String::as_str).unwrap_or_default();
    let name = if first.starts_with('/') {
        first.rsplit('/').next().unwrap_or(first)
    } else {
        first
    };
    let full = format!("{}/{}", pid, name);
    full.chars().take(PROGNAME_WIDTH - 1).collect()
}

fn read_label(proc_dir: &Path) -> String {
    match fs::read_to_string(proc_dir.join("attr").join("current")) {
        Ok(text) => {
            let label = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            if label.is_empty() {
                UNKNOWN.to_string()
            } else {
                fit_label(label)
            }
        }
        Err(_) => UNKNOWN.to_string(),
    }
}

/// Long contexts keep their tail, which carries the type and level.
fn fit_label(label: &str) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() < LABEL_WIDTH {
        label.to_string()
    } else {
        chars[chars.len() - (LABEL_WIDTH - 2)..].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_outcome() {
        assert_eq!(walk_outcome(false, true), ScanStatus::Complete);
        assert_eq!(walk_outcome(false, false), ScanStatus::Complete);
        assert_eq!(walk_outcome(true, true), ScanStatus::Partial);
        assert_eq!(walk_outcome(true, false), ScanStatus::Unreadable);
    }

    #[test]
    fn test_socket_inode_shapes() {
        assert_eq!(socket_inode("socket:[500]"), Some(500));
        assert_eq!(socket_inode("[0000]:12345"), Some(12345));
        assert_eq!(socket_inode("socket:[]"), None);
        assert_eq!(socket_inode("socket:[12a]"), None);
        assert_eq!(socket_inode("pipe:[500]"), None);
        assert_eq!(socket_inode("/dev/null"), None);
        assert_eq!(socket_inode("anon_inode:[eventfd]"), None);
    }

    #[test]
    fn test_program_name_basename_only_for_absolute_paths() {
        let abs = vec!["/usr/bin/foo".to_string(), "--flag".to_string()];
        assert_eq!(program_name(42, &abs), "42/foo");
        let rel = vec!["bin/foo".to_string()];
        assert_eq!(program_name(42, &rel), "42/bin/foo");
        assert_eq!(program_name(7, &[]), "7/");
    }

    #[test]
    fn test_program_name_is_bounded() {
        let long = vec!["/opt/a-really-long-daemon-name".to_string()];
        let name = program_name(123456, &long);
        assert_eq!(name.len(), PROGNAME_WIDTH - 1);
        assert!(name.starts_with("123456/a-really"));
    }

    #[test]
    fn test_long_labels_keep_the_tail() {
        let short = "system_u:system_r:sshd_t:s0-s0:c0.c1023";
        assert_eq!(fit_label(short), short);
        let long = format!("{}:s0", "x".repeat(60));
        let fitted = fit_label(&long);
        assert_eq!(fitted.chars().count(), LABEL_WIDTH - 2);
        assert!(fitted.ends_with(":s0"));
    }

    #[test]
    fn test_unknown_inode_and_unbuilt_cache() {
        let cache = ProcessCache::new("/nonexistent", false);
        assert_eq!(cache.status(), ScanStatus::NotLoaded);
        assert_eq!(cache.lookup(500), UNKNOWN);
        assert_eq!(cache.lookup_label(500), UNKNOWN);
    }

    #[test]
    fn test_first_writer_wins() {
        let mut cache = ProcessCache::new("/nonexistent", false);
        cache.insert(9, "1/first", "-");
        cache.insert(9, "2/second", "-");
        assert_eq!(cache.lookup(9), "1/first");
        assert_eq!(cache.len(), 1);
    }

    #[cfg(target_os = "linux")]
    mod synthetic {
        use super::super::*;
        use std::os::unix::fs::symlink;

        fn make_process(root: &Path, pid: u32, cmdline: &str, links: &[(&str, &str)]) {
            let dir = root.join(pid.to_string());
            fs::create_dir_all(dir.join("fd")).unwrap();
            fs::write(dir.join("cmdline"), cmdline).unwrap();
            for (fd, target) in links {
                symlink(target, dir.join("fd").join(fd)).unwrap();
            }
        }

        #[test]
        fn test_builds_from_synthetic_tree() {
            let root = tempfile::tempdir().unwrap();
            make_process(
                root.path(),
                4242,
                "/usr/bin/foo\0--flag\0",
                &[("0", "/dev/null"), ("3", "socket:[500]"), ("4", "[0000]:501")],
            );
            fs::create_dir_all(root.path().join("net")).unwrap();

            let mut cache = ProcessCache::new(root.path(), false);
            assert_eq!(cache.build(), ScanStatus::Complete);
            assert_eq!(cache.lookup(500), "4242/foo");
            assert_eq!(cache.lookup(501), "4242/foo");
            assert_eq!(cache.lookup(502), UNKNOWN);
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn test_labels_read_from_attr_current() {
            let root = tempfile::tempdir().unwrap();
            make_process(root.path(), 10, "sshd\0", &[("5", "socket:[77]")]);
            let attr = root.path().join("10").join("attr");
            fs::create_dir_all(&attr).unwrap();
            fs::write(attr.join("current"), "system_u:system_r:sshd_t:s0\0").unwrap();
            make_process(root.path(), 11, "nolabel\0", &[("5", "socket:[78]")]);

            let mut cache = ProcessCache::new(root.path(), true);
            cache.build();
            assert_eq!(cache.lookup(77), "10/sshd");
            assert_eq!(cache.lookup_label(77), "system_u:system_r:sshd_t:s0");
            assert_eq!(cache.lookup_label(78), UNKNOWN);
        }

        #[test]
        fn test_clear_forces_rescan() {
            let root = tempfile::tempdir().unwrap();
            make_process(root.path(), 1, "/sbin/init\0", &[("7", "socket:[1000]")]);

            let mut cache = ProcessCache::new(root.path(), false);
            cache.build();
            assert_eq!(cache.lookup(1000), "1/init");

            make_process(root.path(), 2, "/bin/late\0", &[("3", "socket:[2000]")]);
            cache.build();
            assert_eq!(cache.lookup(2000), UNKNOWN);

            cache.clear();
            assert_eq!(cache.status(), ScanStatus::NotLoaded);
            cache.build();
            assert_eq!(cache.lookup(2000), "2/late");
        }

        #[test]
        fn test_missing_root_is_unreadable() {
            let root = tempfile::tempdir().unwrap();
            let mut cache = ProcessCache::new(root.path().join("gone"), false);
            assert_eq!(cache.build(), ScanStatus::Unreadable);
            assert_eq!(cache.lookup(1), UNKNOWN);
        }
    }
}
