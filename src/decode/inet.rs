use std::net::IpAddr;

use super::Decoded;
use crate::addr;
use crate::model::{
    AddressFamily, Endpoint, Protocol, QueueLengths, Record, SocketDescriptor, SocketState,
    TcpState, TimerInfo,
};

/// TCP rows must reach the retransmit column.
pub(crate) const TCP_MIN_FIELDS: usize = 11;
/// UDP, UDP-Lite and RAW rows must reach the timer column.
pub(crate) const DATAGRAM_MIN_FIELDS: usize = 10;

/// Columns of a `/proc/net/{tcp,udp,udplite,raw}[6]` row.
///
/// `matched` counts converted fields in column order and stops at the first
/// column that fails to parse, so a truncated row reports how far it got.
#[derive(Debug, Default)]
struct InetRow<'a> {
    matched: usize,
    local_hex: &'a str,
    local_port: u16,
    remote_hex: &'a str,
    remote_port: u16,
    state: u32,
    tx_queue: u64,
    rx_queue: u64,
    timer_kind: u32,
    timer_jiffies: u64,
    retransmits: u64,
    uid: u32,
    timeout: u64,
    inode: u64,
}

fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

fn hex_pair(field: &str) -> (Option<&str>, Option<&str>) {
    match field.split_once(':') {
        Some((a, b)) => (Some(a), Some(b)),
        None => (Some(field), None),
    }
}

impl<'a> InetRow<'a> {
    fn scan(line: &'a str) -> Self {
        let mut row = InetRow::default();
        let _ = row.fill(line);
        row
    }

    fn fill(&mut self, line: &'a str) -> Option<()> {
        let mut tokens = line.split_whitespace();

        tokens.next()?.strip_suffix(':')?.parse::<u64>().ok()?;
        self.matched += 1;

        let (addr, port) = tokens.next()?.rsplit_once(':')?;
        self.local_hex = Some(addr).filter(|a| is_hex(a))?;
        self.matched += 1;
        self.local_port = u16::from_str_radix(port, 16).ok()?;
        self.matched += 1;

        let (addr, port) = tokens.next()?.rsplit_once(':')?;
        self.remote_hex = Some(addr).filter(|a| is_hex(a))?;
        self.matched += 1;
        self.remote_port = u16::from_str_radix(port, 16).ok()?;
        self.matched += 1;

        self.state = u32::from_str_radix(tokens.next()?, 16).ok()?;
        self.matched += 1;

        let (tx, rx) = hex_pair(tokens.next()?);
        self.tx_queue = u64::from_str_radix(tx?, 16).ok()?;
        self.matched += 1;
        self.rx_queue = u64::from_str_radix(rx?, 16).ok()?;
        self.matched += 1;

        let (kind, when) = hex_pair(tokens.next()?);
        self.timer_kind = u32::from_str_radix(kind?, 16).ok()?;
        self.matched += 1;
        self.timer_jiffies = u64::from_str_radix(when?, 16).ok()?;
        self.matched += 1;

        self.retransmits = u64::from_str_radix(tokens.next()?, 16).ok()?;
        self.matched += 1;

        self.uid = tokens.next()?.parse().ok()?;
        self.matched += 1;

        // Printed with %d; treat a negative timeout as zero.
        let timeout: i64 = tokens.next()?.parse().ok()?;
        self.timeout = timeout.max(0) as u64;
        self.matched += 1;

        self.inode = tokens.next()?.parse().ok()?;
        self.matched += 1;

        Some(())
    }
}

fn decode_address(hex: &str) -> Result<IpAddr, String> {
    match hex.len() {
        8 | 32 => addr::decode_packed(hex).ok_or_else(|| format!("bad address {}", hex)),
        n => Err(format!("unsupported address family ({} hex digits)", n)),
    }
}

/// Decode one row of the TCP, UDP, UDP-Lite or RAW tables.
pub(crate) fn decode(protocol: Protocol, line_no: usize, line: &str) -> Decoded {
    if line_no == 0 {
        return Decoded::Skip;
    }

    let row = InetRow::scan(line);
    let min_fields = match protocol {
        Protocol::Tcp => TCP_MIN_FIELDS,
        _ => DATAGRAM_MIN_FIELDS,
    };
    if row.matched < min_fields {
        return Decoded::Malformed(format!(
            "bogus {} line: {} of {} fields",
            protocol.service_name(),
            row.matched,
            min_fields
        ));
    }

    let local = match decode_address(row.local_hex) {
        Ok(a) => a,
        Err(reason) => return Decoded::Malformed(reason),
    };
    let remote = match decode_address(row.remote_hex) {
        Ok(a) => a,
        Err(reason) => return Decoded::Malformed(reason),
    };
    let family = AddressFamily::of(&local);
    if AddressFamily::of(&remote) != family {
        return Decoded::Malformed("local and remote address families differ".to_string());
    }

    let state = match protocol {
        Protocol::Tcp => SocketState::Tcp(TcpState::from_code(row.state)),
        Protocol::Raw => SocketState::Raw(row.state),
        _ => SocketState::Datagram(TcpState::from_code(row.state)),
    };

    Decoded::Record(Record::Socket(SocketDescriptor {
        protocol,
        family,
        local: Endpoint::new(local, row.local_port),
        remote: Endpoint::new(remote, row.remote_port),
        state,
        queues: QueueLengths {
            receive: row.rx_queue,
            transmit: row.tx_queue,
        },
        timer: Some(TimerInfo {
            kind: row.timer_kind,
            jiffies: row.timer_jiffies,
            retransmits: row.retransmits,
            timeout: row.timeout,
        }),
        uid: row.uid,
        inode: row.inode,
        membership: None,
    }))
}
