use crate::model::{AddressFamily, Protocol, Record, SocketDescriptor, UnixSocket};

/// Which sockets a cycle reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Sockets with a peer (established-style).
    #[default]
    Connected,
    /// Sockets without a peer.
    Listening,
    All,
}

/// Address families requested with `-4` / `-6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySet {
    pub ipv4: bool,
    pub ipv6: bool,
}

impl Default for FamilySet {
    fn default() -> Self {
        Self {
            ipv4: true,
            ipv6: true,
        }
    }
}

impl FamilySet {
    pub fn contains(&self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::Ipv4 => self.ipv4,
            AddressFamily::Ipv6 => self.ipv6,
        }
    }
}

/// Post-decode filter deciding which records reach the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketFilter {
    pub selection: Selection,
    pub families: FamilySet,
}

impl SocketFilter {
    pub fn new(selection: Selection, families: FamilySet) -> Self {
        Self {
            selection,
            families,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match record {
            Record::Socket(sock) => self.matches_family(sock) && self.matches_socket(sock),
            Record::Unix(sock) => self.matches_unix(sock),
        }
    }

    /// SCTP rows without any parsable address have no family of their own
    /// and pass either family restriction.
    fn matches_family(&self, sock: &SocketDescriptor) -> bool {
        let sctp = matches!(
            sock.protocol,
            Protocol::SctpEndpoint | Protocol::SctpAssociation
        );
        if sctp && sock.local.addrs.is_empty() && sock.remote.addrs.is_empty() {
            return true;
        }
        self.families.contains(sock.family)
    }

    fn matches_socket(&self, sock: &SocketDescriptor) -> bool {
        let listening = match sock.protocol {
            Protocol::Tcp => sock.remote.port == 0,
            Protocol::Udp | Protocol::UdpLite | Protocol::Raw => sock.remote.is_null(),
            Protocol::SctpEndpoint => {
                return self.selection != Selection::Connected;
            }
            Protocol::SctpAssociation => {
                return self.selection != Selection::Listening;
            }
            Protocol::IgmpMembership => return true,
            Protocol::Unix => false,
        };
        self.admits(listening)
    }

    fn matches_unix(&self, sock: &UnixSocket) -> bool {
        self.admits(sock.is_listening())
    }

    fn admits(&self, listening: bool) -> bool {
        match self.selection {
            Selection::All => true,
            Selection::Listening => listening,
            Selection::Connected => !listening,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
