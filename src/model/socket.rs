use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::state::{SocketState, UnixState, UnixType};

/// Which kernel table a record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    UdpLite,
    Raw,
    SctpEndpoint,
    SctpAssociation,
    IgmpMembership,
    Unix,
}

impl Protocol {
    /// Short tag printed in the `Proto` column.
    pub fn tag(&self, family: AddressFamily) -> &'static str {
        let v6 = family == AddressFamily::Ipv6;
        match self {
            Protocol::Tcp if v6 => "tcp6",
            Protocol::Tcp => "tcp",
            Protocol::Udp if v6 => "udp6",
            Protocol::Udp => "udp",
            Protocol::UdpLite if v6 => "udpl6",
            Protocol::UdpLite => "udpl",
            Protocol::Raw if v6 => "raw6",
            Protocol::Raw => "raw",
            Protocol::SctpEndpoint | Protocol::SctpAssociation => "sctp",
            Protocol::IgmpMembership if v6 => "igmp6",
            Protocol::IgmpMembership => "igmp",
            Protocol::Unix => "unix",
        }
    }

    /// Protocol name used when looking up service names for ports.
    pub fn service_name(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp | Protocol::UdpLite => "udp",
            Protocol::Raw => "raw",
            Protocol::SctpEndpoint | Protocol::SctpAssociation => "sctp",
            Protocol::IgmpMembership => "igmp",
            Protocol::Unix => "unix",
        }
    }

    /// Tables where one socket can show up once per address family.
    pub fn suppresses_duplicates(&self) -> bool {
        matches!(self, Protocol::Tcp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::UdpLite => write!(f, "UDP-Lite"),
            Protocol::Raw => write!(f, "RAW"),
            Protocol::SctpEndpoint => write!(f, "SCTP endpoint"),
            Protocol::SctpAssociation => write!(f, "SCTP association"),
            Protocol::IgmpMembership => write!(f, "IGMP"),
            Protocol::Unix => write!(f, "unix"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    pub fn unspecified(&self) -> IpAddr {
        match self {
            AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "inet"),
            AddressFamily::Ipv6 => write!(f, "inet6"),
        }
    }
}

/// One side of a connection.
///
/// Most tables report exactly one address per side. SCTP is multi-homed and
/// reports an ordered list, which is kept here so the table can print one row
/// per address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub addrs: Vec<IpAddr>,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: IpAddr, port: u16) -> Self {
        Self {
            addrs: vec![addr],
            port,
        }
    }

    pub fn empty() -> Self {
        Self {
            addrs: Vec::new(),
            port: 0,
        }
    }

    /// Primary address, or the IPv4 wildcard when none was reported.
    pub fn addr(&self) -> IpAddr {
        self.addrs
            .first()
            .copied()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    /// True when no address on this side is set.
    pub fn is_null(&self) -> bool {
        self.addrs.iter().all(|a| a.is_unspecified())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueLengths {
    pub receive: u64,
    pub transmit: u64,
}

/// Raw timer columns; rendering depends on the protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerInfo {
    pub kind: u32,
    pub jiffies: u64,
    pub retransmits: u64,
    pub timeout: u64,
}

/// Interface and reference count of a multicast group membership row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub interface: String,
    pub ref_count: u32,
}

/// One decoded row of an internet protocol table. Never mutated after the
/// decoder hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketDescriptor {
    pub protocol: Protocol,
    pub family: AddressFamily,
    pub local: Endpoint,
    pub remote: Endpoint,
    pub state: SocketState,
    pub queues: QueueLengths,
    pub timer: Option<TimerInfo>,
    pub uid: u32,
    /// Correlation key into the process cache; 0 when unknown.
    pub inode: u64,
    pub membership: Option<Membership>,
}

/// One decoded row of `/proc/net/unix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixSocket {
    pub ref_count: u64,
    pub protocol: u64,
    pub flags: u64,
    pub kind: UnixType,
    pub state: UnixState,
    /// `None` on kernels whose table has no inode column.
    pub inode: Option<u64>,
    pub path: String,
}

impl UnixSocket {
    pub const ACCEPT_CONNECTIONS: u64 = 1 << 16;
    pub const WAIT_DATA: u64 = 1 << 17;
    pub const NO_SPACE: u64 = 1 << 18;

    pub fn is_listening(&self) -> bool {
        self.state == UnixState::Unconnected && self.flags & Self::ACCEPT_CONNECTIONS != 0
    }

    pub fn state_label(&self) -> String {
        match self.state {
            UnixState::Unconnected if self.is_listening() => "LISTENING".to_string(),
            other => other.to_string(),
        }
    }

    pub fn flags_label(&self) -> String {
        let mut label = String::from("[ ");
        if self.flags & Self::ACCEPT_CONNECTIONS != 0 {
            label.push_str("ACC ");
        }
        if self.flags & Self::WAIT_DATA != 0 {
            label.push_str("W ");
        }
        if self.flags & Self::NO_SPACE != 0 {
            label.push_str("N ");
        }
        label.push(']');
        label
    }

    pub fn protocol_label(&self) -> &'static str {
        if self.protocol == 0 {
            "unix"
        } else {
            "??"
        }
    }
}

/// Anything a protocol decoder can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Socket(SocketDescriptor),
    Unix(UnixSocket),
}
