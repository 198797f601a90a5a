use std::collections::HashSet;
use std::net::IpAddr;

use crate::model::SocketDescriptor;

/// Connection four-tuples already emitted in the current cycle.
///
/// A dual-stack socket can be listed by both the IPv4 and the IPv6 table.
/// Addresses are keyed by their canonical text so an IPv4-mapped IPv6
/// address collides with the plain IPv4 form.
#[derive(Debug, Default)]
pub struct SeenIndex {
    seen: HashSet<String>,
}

fn canonical(addr: IpAddr) -> String {
    addr.to_canonical().to_string()
}

impl SeenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tuple. Returns `true` the first time it is seen in this
    /// cycle and `false` for every repeat.
    ///
    /// Addresses are bracketed in the key because IPv6 text contains colons.
    pub fn check_and_insert(
        &mut self,
        local: &str,
        local_port: u16,
        remote: &str,
        remote_port: u16,
    ) -> bool {
        let key = format!("[{}]:{}|[{}]:{}", local, local_port, remote, remote_port);
        self.seen.insert(key)
    }

    /// Whether `sock` should be emitted. Protocols that cannot be reported
    /// twice always pass and are not recorded.
    pub fn admit(&mut self, sock: &SocketDescriptor) -> bool {
        if !sock.protocol.suppresses_duplicates() {
            return true;
        }
        self.check_and_insert(
            &canonical(sock.local.addr()),
            sock.local.port,
            &canonical(sock.remote.addr()),
            sock.remote.port,
        )
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressFamily, Endpoint, Protocol, QueueLengths, SocketState, TcpState};
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn make_tcp(local: IpAddr, lport: u16, remote: IpAddr, rport: u16) -> SocketDescriptor {
        SocketDescriptor {
            protocol: Protocol::Tcp,
            family: AddressFamily::of(&local),
            local: Endpoint::new(local, lport),
            remote: Endpoint::new(remote, rport),
            state: SocketState::Tcp(TcpState::Established),
            queues: QueueLengths::default(),
            timer: None,
            uid: 0,
            inode: 7,
            membership: None,
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut index = SeenIndex::new();
        assert!(index.check_and_insert("10.0.0.1", 22, "10.0.0.2", 5555));
        assert!(!index.check_and_insert("10.0.0.1", 22, "10.0.0.2", 5555));
        assert!(index.check_and_insert("10.0.0.1", 22, "10.0.0.2", 5556));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_mapped_ipv6_duplicate_is_suppressed() {
        let v4 = make_tcp(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            8080,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            40000,
        );
        let mapped = make_tcp(
            IpAddr::V6(Ipv4Addr::LOCALHOST.to_ipv6_mapped()),
            8080,
            IpAddr::V6(Ipv4Addr::new(127, 0, 0, 1).to_ipv6_mapped()),
            40000,
        );

        let mut index = SeenIndex::new();
        let emitted = [&v4, &mapped].iter().filter(|s| index.admit(s)).count();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn test_colons_in_ipv6_text_do_not_merge_tuples() {
        let v6 = |text: &str| IpAddr::V6(text.parse::<Ipv6Addr>().unwrap());
        let first = make_tcp(v6("0:0:1::1"), 1, v6("1:0:0:1:1::"), 1);
        let second = make_tcp(v6("0:0:1::1:1"), 1, v6("0:0:1:1::"), 1);

        let mut index = SeenIndex::new();
        assert!(index.admit(&first));
        assert!(index.admit(&second));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_real_ipv6_is_distinct() {
        let any4 = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let any6 = IpAddr::V6(Ipv6Addr::UNSPECIFIED);
        let v4 = make_tcp(any4, 22, any4, 0);
        let v6 = make_tcp(any6, 22, any6, 0);

        let mut index = SeenIndex::new();
        assert!(index.admit(&v4));
        assert!(index.admit(&v6));
    }

    #[test]
    fn test_clear_starts_a_new_cycle() {
        let lo = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let sock = make_tcp(lo, 80, lo, 1);
        let mut index = SeenIndex::new();
        assert!(index.admit(&sock));
        assert!(!index.admit(&sock));
        index.clear();
        assert_eq!(index.len(), 0);
        assert!(index.admit(&sock));
    }

    #[test]
    fn test_untracked_protocols_pass_through() {
        let mut sock = make_tcp(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            53,
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            0,
        );
        sock.protocol = Protocol::Udp;
        let mut index = SeenIndex::new();
        assert!(index.admit(&sock));
        assert!(index.admit(&sock));
        assert_eq!(index.len(), 0);
    }
}
