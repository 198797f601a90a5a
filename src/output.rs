use std::net::IpAddr;

use crate::config::{Config, Numeric};
use crate::correlate::{ProcessCache, LABEL_WIDTH, PROGNAME_WIDTH, UNKNOWN};
use crate::filter::Selection;
use crate::model::{Protocol, SocketDescriptor, TimerInfo, UnixSocket};
use crate::resolve::NameResolver;

/// `address:service` width before truncation, excluding the colon.
const ADDRESS_WIDTH: usize = 22;
/// Longest service name kept when an endpoint is truncated.
const SERVICE_WIDTH: usize = ADDRESS_WIDTH - 4;
/// Width of `Proto Recv-Q Send-Q ` used to indent SCTP continuation rows.
const GROUP_INDENT: usize = 20;

const PROGNAME_BANNER: &str = "PID/Program name";
const LABEL_BANNER: &str = " Security Context";

/// Renders decoded records as netstat-style table rows.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    pub selection: Selection,
    pub numeric: Numeric,
    /// `-e`: user and inode columns.
    pub extended: bool,
    /// `-p`: PID/program column.
    pub programs: bool,
    /// `-Z`: security context column.
    pub labels: bool,
    /// `-o`: timer column.
    pub timers: bool,
    /// `-W`: never truncate endpoints.
    pub wide: bool,
    pub ticks_per_second: u64,
}

impl OutputFormatter {
    /// Build an `OutputFormatter` from the run configuration.
    pub fn from_config(config: &Config) -> Self {
        OutputFormatter {
            selection: config.selection,
            numeric: config.numeric,
            extended: config.extended,
            programs: config.programs,
            labels: config.labels,
            timers: config.timers,
            wide: config.wide,
            ticks_per_second: clock_ticks(),
        }
    }

    fn selection_label(&self) -> &'static str {
        match self.selection {
            Selection::All => "(servers and established)",
            Selection::Listening => "(only servers)",
            Selection::Connected => "(w/o servers)",
        }
    }

    fn owner_banner(&self) -> String {
        let mut banner = String::new();
        if self.programs {
            banner.push_str(&format!(" {:<width$}", PROGNAME_BANNER, width = PROGNAME_WIDTH));
        }
        if self.labels {
            banner.push_str(&format!("{:<width$}", LABEL_BANNER, width = LABEL_WIDTH));
        }
        banner
    }

    /// Title and column header for the internet tables.
    pub fn inet_banner(&self) -> String {
        let mut header = String::from(
            "Proto Recv-Q Send-Q Local Address           Foreign Address         State      ",
        );
        if self.extended {
            header.push_str(" User       Inode     ");
        }
        header.push_str(&self.owner_banner());
        if self.timers {
            header.push_str(" Timer");
        }
        format!(
            "Active Internet connections {}\n{}",
            self.selection_label(),
            header
        )
    }

    pub fn igmp_banner(&self) -> String {
        [
            "IPv6/IPv4 Group Memberships",
            "Interface       RefCnt Group",
            "--------------- ------ ---------------------",
        ]
        .join("\n")
    }

    pub fn unix_banner(&self) -> String {
        format!(
            "Active UNIX domain sockets {}\n\
             Proto RefCnt Flags       Type       State         I-Node  {} Path",
            self.selection_label(),
            self.owner_banner()
        )
    }

    // -----------------------------------------------------------------------
    // Rows
    // -----------------------------------------------------------------------

    /// Rows for one decoded socket. Most records produce one row; SCTP
    /// produces one per address.
    pub fn socket_rows(
        &self,
        sock: &SocketDescriptor,
        resolver: &dyn NameResolver,
        cache: &ProcessCache,
    ) -> Vec<String> {
        match sock.protocol {
            Protocol::SctpEndpoint => self.sctp_endpoint_rows(sock, resolver, cache),
            Protocol::SctpAssociation => self.sctp_association_rows(sock, resolver, cache),
            Protocol::IgmpMembership => vec![self.membership_row(sock, resolver)],
            _ => vec![self.inet_row(sock, resolver, cache)],
        }
    }

    fn inet_row(
        &self,
        sock: &SocketDescriptor,
        resolver: &dyn NameResolver,
        cache: &ProcessCache,
    ) -> String {
        let service = sock.protocol.service_name();
        let local = self.endpoint(resolver, sock.local.addr(), sock.local.port, service);
        let remote = self.endpoint(resolver, sock.remote.addr(), sock.remote.port, service);
        let mut row = format!(
            "{:<5} {:>6} {:>6} {:<23} {:<23} {:<11}",
            sock.protocol.tag(sock.family),
            sock.queues.receive,
            sock.queues.transmit,
            local,
            remote,
            sock.state.to_string()
        );
        row.push_str(&self.trailer(sock, cache));
        row
    }

    fn sctp_endpoint_rows(
        &self,
        sock: &SocketDescriptor,
        resolver: &dyn NameResolver,
        cache: &ProcessCache,
    ) -> Vec<String> {
        let service = resolver.service(sock.local.port, "sctp", self.numeric.ports);
        let addrs = addresses_or_wildcard(&sock.local.addrs, sock);
        let mut rows: Vec<String> = addrs
            .iter()
            .enumerate()
            .map(|(i, addr)| {
                let prefix = if i == 0 { "sctp" } else { "" };
                let state = if i == 0 { sock.state.to_string() } else { String::new() };
                let local = format!("{}:{}", resolver.host(*addr, self.numeric.hosts), service);
                format!(
                    "{:<indent$}{:<47} {:<11}",
                    prefix,
                    local,
                    state,
                    indent = GROUP_INDENT
                )
            })
            .collect();
        if let Some(last) = rows.last_mut() {
            last.push_str(&self.trailer(sock, cache));
        }
        rows
    }

    fn sctp_association_rows(
        &self,
        sock: &SocketDescriptor,
        resolver: &dyn NameResolver,
        cache: &ProcessCache,
    ) -> Vec<String> {
        let local_service = resolver.service(sock.local.port, "sctp", self.numeric.ports);
        let remote_service = resolver.service(sock.remote.port, "sctp", self.numeric.ports);
        let count = sock.local.addrs.len().max(sock.remote.addrs.len()).max(1);

        let side = |addr: Option<&IpAddr>, service: &str, first: bool| match addr {
            Some(addr) if first => {
                format!("{}:{}", resolver.host(*addr, self.numeric.hosts), service)
            }
            Some(addr) => resolver.host(*addr, self.numeric.hosts),
            None => String::new(),
        };

        let mut rows = Vec::with_capacity(count);
        for i in 0..count {
            let first = i == 0;
            let prefix = if first {
                format!("sctp  {:>6} {:>6} ", sock.queues.receive, sock.queues.transmit)
            } else {
                " ".repeat(GROUP_INDENT)
            };
            let state = if first { sock.state.to_string() } else { String::new() };
            rows.push(format!(
                "{}{:<23} {:<23} {:<11}",
                prefix,
                side(sock.local.addrs.get(i), &local_service, first),
                side(sock.remote.addrs.get(i), &remote_service, first),
                state
            ));
        }
        if let Some(last) = rows.last_mut() {
            last.push_str(&self.trailer(sock, cache));
        }
        rows
    }

    fn membership_row(&self, sock: &SocketDescriptor, resolver: &dyn NameResolver) -> String {
        let (interface, ref_count) = sock
            .membership
            .as_ref()
            .map(|m| (m.interface.as_str(), m.ref_count))
            .unwrap_or(("", 0));
        format!(
            "{:<15} {:<6} {}",
            interface,
            ref_count,
            resolver.host(sock.local.addr(), self.numeric.hosts)
        )
    }

    pub fn unix_row(&self, sock: &UnixSocket, cache: &ProcessCache) -> String {
        let mut row = format!(
            "{:<5} {:<6} {:<11} {:<10} {:<13} ",
            sock.protocol_label(),
            sock.ref_count,
            sock.flags_label(),
            sock.kind.to_string(),
            sock.state_label()
        );
        match sock.inode {
            Some(inode) => row.push_str(&format!("{:<8}", inode)),
            None => row.push_str("-       "),
        }
        if self.programs {
            let program = sock.inode.map(|i| cache.lookup(i)).unwrap_or(UNKNOWN);
            row.push_str(&format!(" {:<width$}", program, width = PROGNAME_WIDTH));
        }
        if self.labels {
            let label = sock.inode.map(|i| cache.lookup_label(i)).unwrap_or(UNKNOWN);
            row.push_str(&format!(" {:<width$}", label, width = LABEL_WIDTH));
        }
        row.push(' ');
        row.push_str(&sock.path);
        row
    }

    /// Optional user, inode, program, context and timer columns.
    fn trailer(&self, sock: &SocketDescriptor, cache: &ProcessCache) -> String {
        let mut out = String::new();
        if self.extended {
            out.push_str(&format!(" {:<10} {:<10}", self.user(sock.uid), sock.inode));
        }
        if self.programs {
            out.push_str(&format!(
                " {:<width$}",
                cache.lookup(sock.inode),
                width = PROGNAME_WIDTH
            ));
        }
        if self.labels {
            out.push_str(&format!(
                " {:<width$}",
                cache.lookup_label(sock.inode),
                width = LABEL_WIDTH
            ));
        }
        if self.timers {
            out.push(' ');
            out.push_str(&self.timer_label(sock));
        }
        out
    }

    // -----------------------------------------------------------------------
    // Columns
    // -----------------------------------------------------------------------

    /// `host:service`, shortened to the column unless wide output is on.
    pub fn endpoint(
        &self,
        resolver: &dyn NameResolver,
        addr: IpAddr,
        port: u16,
        protocol: &str,
    ) -> String {
        let host = resolver.host(addr, self.numeric.hosts);
        let service = resolver.service(port, protocol, self.numeric.ports);
        fit_endpoint(&host, &service, self.wide)
    }

    fn user(&self, uid: u32) -> String {
        if self.numeric.users {
            return uid.to_string();
        }
        users::get_user_by_uid(uid)
            .map(|u| u.name().to_string_lossy().to_string())
            .unwrap_or_else(|| uid.to_string())
    }

    pub fn timer_label(&self, sock: &SocketDescriptor) -> String {
        let Some(timer) = sock.timer else {
            return String::new();
        };
        let TimerInfo {
            kind,
            jiffies,
            mut retransmits,
            timeout,
        } = timer;
        let seconds = jiffies as f64 / self.ticks_per_second.max(1) as f64;

        let name = match sock.protocol {
            Protocol::Tcp => match kind {
                0 => "off".to_string(),
                1 => "on".to_string(),
                2 => "keepalive".to_string(),
                3 => "timewait".to_string(),
                4 => "probe".to_string(),
                other => format!("unkn-{}", other),
            },
            Protocol::Udp | Protocol::UdpLite | Protocol::Raw => {
                if sock.protocol != Protocol::Raw {
                    retransmits = 0;
                }
                match kind {
                    0 => "off".to_string(),
                    1 | 2 => format!("on{}", kind),
                    other => format!("unkn-{}", other),
                }
            }
            _ => return String::new(),
        };

        if kind == 0 {
            format!("{} (0.00/{}/{})", name, retransmits, timeout)
        } else {
            format!("{} ({:.2}/{}/{})", name, seconds, retransmits, timeout)
        }
    }
}

fn addresses_or_wildcard(addrs: &[IpAddr], sock: &SocketDescriptor) -> Vec<IpAddr> {
    if addrs.is_empty() {
        vec![sock.family.unspecified()]
    } else {
        addrs.to_vec()
    }
}

/// Take at most `width` characters.
fn fit_str(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Join host and service, keeping the service readable when the pair is
/// too long for the column.
fn fit_endpoint(host: &str, service: &str, wide: bool) -> String {
    let host_len = host.chars().count();
    let service_len = service.chars().count();
    if wide || host_len + service_len <= ADDRESS_WIDTH {
        return format!("{}:{}", host, service);
    }
    let service_len = service_len.min(SERVICE_WIDTH);
    let host_len = ADDRESS_WIDTH - service_len;
    format!("{}:{}", fit_str(host, host_len), fit_str(service, service_len))
}

#[cfg(target_os = "linux")]
fn clock_ticks() -> u64 {
    procfs::ticks_per_second()
}

#[cfg(not(target_os = "linux"))]
fn clock_ticks() -> u64 {
    100
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
