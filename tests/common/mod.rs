#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

pub const INET_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";
pub const UNIX_HEADER: &str = "Num       RefCount Protocol Flags    Type St Inode Path";

/// A throwaway proc root plus an empty etc root.
pub struct Fixture {
    pub proc_root: TempDir,
    pub etc_root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Fixture {
            proc_root: tempfile::tempdir().unwrap(),
            etc_root: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(fixture.proc_root.path().join("net")).unwrap();
        fixture
    }

    /// Write `net/<name>` with the given rows below the usual header.
    pub fn table(&self, name: &str, header: &str, rows: &[&str]) -> &Self {
        let path = self.proc_root.path().join("net").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut body = format!("{}\n", header);
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        fs::write(path, body).unwrap();
        self
    }

    /// A process directory whose descriptors point at `targets`.
    pub fn process(&self, pid: u32, cmdline: &str, targets: &[&str]) -> &Self {
        let dir = self.proc_root.path().join(pid.to_string());
        fs::create_dir_all(dir.join("fd")).unwrap();
        fs::write(dir.join("cmdline"), cmdline).unwrap();
        for (fd, target) in targets.iter().enumerate() {
            symlink(target, dir.join("fd").join(fd.to_string())).unwrap();
        }
        self
    }

    pub fn etc(&self, name: &str, body: &str) -> &Self {
        fs::write(self.etc_root.path().join(name), body).unwrap();
        self
    }

    pub fn proc_path(&self) -> &Path {
        self.proc_root.path()
    }

    /// The binary pointed at this fixture.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("rnetstat").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--proc-root")
            .arg(self.proc_root.path())
            .arg("--etc-root")
            .arg(self.etc_root.path())
            .args(args);
        cmd
    }
}

/// A TCP or UDP row: `local` and `remote` are already in kernel hex form.
pub fn inet_row(
    slot: u32,
    local: &str,
    remote: &str,
    state: &str,
    uid: u32,
    inode: u64,
) -> String {
    format!(
        "{:>4}: {} {} {} 00000000:00000000 00:00000000 00000000 {:>5}        0 {} 1 0000000000000000 20 4 30 10 -1",
        slot, local, remote, state, uid, inode
    )
}
