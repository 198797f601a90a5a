mod common;

use common::{inet_row, Fixture, INET_HEADER, UNIX_HEADER};
use predicates::prelude::*;

// ---------------------------------------------------------------------------
// Banner tests
// ---------------------------------------------------------------------------

#[test]
fn test_default_banners() {
    let fixture = Fixture::new();
    fixture
        .command(&["-n"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Active Internet connections (w/o servers)\nProto Recv-Q Send-Q Local Address",
        ))
        .stdout(predicate::str::contains("Active UNIX domain sockets (w/o servers)"))
        .stdout(predicate::str::contains("Group Memberships").not());
}

#[test]
fn test_extended_and_program_columns_in_banner() {
    let fixture = Fixture::new();
    fixture.table("tcp", INET_HEADER, &[]);
    fixture
        .command(&["-t", "-n", "-e", "-p", "-a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(servers and established)"))
        .stdout(predicate::str::contains(" User       Inode      PID/Program name"));
}

// ---------------------------------------------------------------------------
// Row tests
// ---------------------------------------------------------------------------

#[test]
fn test_tcp_row_numeric() {
    let fixture = Fixture::new();
    let row = inet_row(0, "0100007F:1F90", "0100007F:9C40", "01", 1000, 100);
    fixture.table("tcp", INET_HEADER, &[row.as_str()]);

    fixture
        .command(&["-t", "-n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:8080"))
        .stdout(predicate::str::contains("127.0.0.1:40000"))
        .stdout(predicate::str::contains("ESTABLISHED"));
}

#[test]
fn test_service_names_from_etc_root() {
    let fixture = Fixture::new();
    let row = inet_row(0, "0100007F:0016", "0100007F:9C40", "01", 0, 100);
    fixture
        .table("tcp", INET_HEADER, &[row.as_str()])
        .etc("services", "ssh 22/tcp\n")
        .etc("hosts", "127.0.0.1 localhost\n");

    fixture
        .command(&["-t"])
        .assert()
        .success()
        .stdout(predicate::str::contains("localhost:ssh"))
        .stdout(predicate::str::contains("localhost:40000"));
}

#[test]
fn test_extended_columns_show_uid_and_inode() {
    let fixture = Fixture::new();
    let row = inet_row(0, "0100007F:1F90", "0100007F:9C40", "01", 4321, 98765);
    fixture.table("tcp", INET_HEADER, &[row.as_str()]);

    fixture
        .command(&["-t", "-n", "-e"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4321"))
        .stdout(predicate::str::contains("98765"));
}

#[test]
fn test_program_column_from_process_tree() {
    let fixture = Fixture::new();
    let row = inet_row(0, "0100007F:1F90", "0100007F:9C40", "01", 0, 555);
    fixture
        .table("tcp", INET_HEADER, &[row.as_str()])
        .process(4242, "/usr/sbin/nginx\0-g\0daemon off;\0", &["/dev/null", "socket:[555]"]);

    fixture
        .command(&["-t", "-n", "-p"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4242/nginx"))
        .stderr(predicate::str::contains("Not all processes").not());
}

#[test]
fn test_unknown_owner_is_dash() {
    let fixture = Fixture::new();
    let row = inet_row(0, "0100007F:1F90", "0100007F:9C40", "01", 0, 556);
    fixture
        .table("tcp", INET_HEADER, &[row.as_str()])
        .process(1, "/sbin/init\0", &["socket:[1]"]);

    let output = fixture.command(&["-t", "-n", "-p"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.contains("127.0.0.1:8080"))
        .unwrap();
    assert!(line.trim_end().ends_with('-'), "{}", line);
}

#[test]
fn test_timers_column() {
    let fixture = Fixture::new();
    fixture.table(
        "tcp",
        INET_HEADER,
        &["   0: 0100007F:1F90 0100007F:9C40 01 00000000:00000000 02:000000C8 00000003  1000        0 100 1 0000000000000000 20 4 30 10 -1"],
    );
    fixture
        .command(&["-t", "-n", "-o"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" Timer"))
        .stdout(predicate::str::contains("keepalive ("));
}

#[test]
fn test_unix_rows() {
    let fixture = Fixture::new();
    fixture.table(
        "unix",
        UNIX_HEADER,
        &[
            "0000000000000000: 00000002 00000000 00010000 0001 01 3000 /run/listen.sock",
            "0000000000000000: 00000003 00000000 00000000 0001 03 3001 /run/conn.sock",
        ],
    );

    fixture
        .command(&["-x", "-n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/run/conn.sock"))
        .stdout(predicate::str::contains("CONNECTED"))
        .stdout(predicate::str::contains("/run/listen.sock").not());

    fixture
        .command(&["-x", "-n", "-l"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/run/listen.sock"))
        .stdout(predicate::str::contains("[ ACC ]"))
        .stdout(predicate::str::contains("LISTENING"));
}

#[test]
fn test_group_memberships() {
    let fixture = Fixture::new();
    fixture.table(
        "igmp",
        "Idx\tDevice    : Count Querier\tGroup    Users Timer\tReporter",
        &[
            "1\tlo        :     1      V3",
            "\t\t\t\t010000E0     1 0:00000000\t\t0",
        ],
    );

    fixture
        .command(&["-g", "-n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IPv6/IPv4 Group Memberships"))
        .stdout(predicate::str::contains("224.0.0.1"))
        .stdout(predicate::str::contains("Active Internet connections").not());
}

#[test]
fn test_sctp_endpoint_listed_with_all() {
    let fixture = Fixture::new();
    fixture.table(
        "sctp/eps",
        " ENDPT     SOCK   STY SST HBKT LPORT   UID INODE LADDRS",
        &["ffff88017e0a0200 ffff880299f7fa00 2   10  29   3868      0 12345 10.0.0.1 192.168.1.1"],
    );

    fixture
        .command(&["-S", "-n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.1").not());

    fixture
        .command(&["-S", "-n", "-a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.1:3868"))
        .stdout(predicate::str::contains("192.168.1.1"));
}
