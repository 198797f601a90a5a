use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "rnetstat",
    version,
    about = "Print network connections, multicast memberships and owning processes"
)]
pub struct CliArgs {
    /// Show TCP sockets
    #[arg(short = 't', long = "tcp")]
    pub tcp: bool,

    /// Show UDP sockets
    #[arg(short = 'u', long = "udp")]
    pub udp: bool,

    /// Show UDP-Lite sockets
    #[arg(short = 'U', long = "udplite")]
    pub udplite: bool,

    /// Show RAW sockets
    #[arg(short = 'w', long = "raw")]
    pub raw: bool,

    /// Show SCTP endpoints and associations
    #[arg(short = 'S', long = "sctp")]
    pub sctp: bool,

    /// Show UNIX domain sockets
    #[arg(short = 'x', long = "unix")]
    pub unix: bool,

    /// Show IPv4/IPv6 multicast group memberships
    #[arg(short = 'g', long = "groups")]
    pub groups: bool,

    /// Only IPv4
    #[arg(short = '4', long = "inet")]
    pub inet: bool,

    /// Only IPv6
    #[arg(short = '6', long = "inet6")]
    pub inet6: bool,

    /// Display listening sockets only
    #[arg(short = 'l', long = "listening")]
    pub listening: bool,

    /// Display all sockets, listening and connected
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Display user and inode columns
    #[arg(short = 'e', long = "extend", action = clap::ArgAction::Count)]
    pub extend: u8,

    /// Display PID/program name for sockets
    #[arg(short = 'p', long = "program")]
    pub program: bool,

    /// Display the security context of the owning process (implies -p)
    #[arg(short = 'Z', long = "context")]
    pub context: bool,

    /// Display timers
    #[arg(short = 'o', long = "timers")]
    pub timers: bool,

    /// Don't truncate addresses
    #[arg(short = 'W', long = "wide")]
    pub wide: bool,

    /// Don't resolve names
    #[arg(short = 'n', long = "numeric")]
    pub numeric: bool,

    /// Don't resolve host names
    #[arg(long = "numeric-hosts")]
    pub numeric_hosts: bool,

    /// Don't resolve port names
    #[arg(long = "numeric-ports")]
    pub numeric_ports: bool,

    /// Don't resolve user names
    #[arg(long = "numeric-users")]
    pub numeric_users: bool,

    /// Continuous listing, once per second unless a delay is given
    #[arg(short = 'c', long = "continuous")]
    pub continuous: bool,

    /// Be verbose
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Directory holding the process and net tables
    #[arg(long = "proc-root", value_name = "DIR", default_value = "/proc", hide = true)]
    pub proc_root: PathBuf,

    /// Directory holding the hosts and services databases
    #[arg(long = "etc-root", value_name = "DIR", default_value = "/etc", hide = true)]
    pub etc_root: PathBuf,

    /// Seconds between listings; implies -c
    #[arg(value_name = "DELAY")]
    pub delay: Option<u64>,
}
