//! `/proc/net/sctp/eps` and `/proc/net/sctp/assocs`.
//!
//! Both tables print ports and counters in decimal and addresses as text.
//! Newer kernels append numeric columns after the address lists, so an
//! address list ends at the first token that is not an address.

use std::net::IpAddr;

use super::Decoded;
use crate::addr::parse_sctp_address;
use crate::model::{
    AddressFamily, Endpoint, Protocol, QueueLengths, Record, SocketDescriptor, SocketState,
};

/// ENDPT SOCK STY SST HBKT LPORT UID INODE
pub(crate) const ENDPOINT_MIN_FIELDS: usize = 8;
/// ASSOC SOCK STY SST ST HBKT ASSOC-ID TX_QUEUE RX_QUEUE UID INODE LPORT RPORT
pub(crate) const ASSOCIATION_MIN_FIELDS: usize = 13;

fn address_list<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<IpAddr> {
    tokens.map_while(parse_sctp_address).collect()
}

/// Family of the first address. Rows without one are tagged IPv4 and left
/// to the filter, which lets them through either family restriction.
fn family_of(addrs: &[IpAddr]) -> AddressFamily {
    match addrs.first() {
        Some(addr) => AddressFamily::of(addr),
        None => {
            tracing::debug!("sctp row without a parsable address");
            AddressFamily::Ipv4
        }
    }
}

fn number<T: std::str::FromStr>(text: &str, column: &str) -> Result<T, String> {
    text.parse()
        .map_err(|_| format!("bad {} column {:?}", column, text))
}

pub(crate) fn decode_endpoint(line_no: usize, line: &str) -> Decoded {
    if line_no == 0 {
        return Decoded::Skip;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < ENDPOINT_MIN_FIELDS {
        return Decoded::Malformed(format!(
            "bogus sctp eps line: {} of {} fields",
            tokens.len(),
            ENDPOINT_MIN_FIELDS
        ));
    }
    match endpoint_record(&tokens) {
        Ok(record) => Decoded::Record(record),
        Err(reason) => Decoded::Malformed(reason),
    }
}

fn endpoint_record(tokens: &[&str]) -> Result<Record, String> {
    let state: u32 = number(tokens[3], "state")?;
    let port: u16 = number(tokens[5], "port")?;
    let uid: u32 = number(tokens[6], "uid")?;
    let inode: u64 = number(tokens[7], "inode")?;
    let addrs = address_list(tokens[8..].iter().copied());

    Ok(Record::Socket(SocketDescriptor {
        protocol: Protocol::SctpEndpoint,
        family: family_of(&addrs),
        local: Endpoint { addrs, port },
        remote: Endpoint::empty(),
        state: SocketState::Sctp(state),
        queues: QueueLengths::default(),
        timer: None,
        uid,
        inode,
        membership: None,
    }))
}

pub(crate) fn decode_association(line_no: usize, line: &str) -> Decoded {
    if line_no == 0 {
        return Decoded::Skip;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < ASSOCIATION_MIN_FIELDS {
        return Decoded::Malformed(format!(
            "bogus sctp assoc line: {} of {} fields",
            tokens.len(),
            ASSOCIATION_MIN_FIELDS
        ));
    }
    match association_record(&tokens) {
        Ok(record) => Decoded::Record(record),
        Err(reason) => Decoded::Malformed(reason),
    }
}

fn association_record(tokens: &[&str]) -> Result<Record, String> {
    let state: u32 = number(tokens[3], "state")?;
    let transmit: u64 = number(tokens[7], "tx_queue")?;
    let receive: u64 = number(tokens[8], "rx_queue")?;
    let uid: u32 = number(tokens[9], "uid")?;
    let inode: u64 = number(tokens[10], "inode")?;
    let local_port: u16 = number(tokens[11], "lport")?;
    let remote_port: u16 = number(tokens[12], "rport")?;

    let lists = &tokens[13..];
    let (local_tokens, remote_tokens) = match lists.iter().position(|t| *t == "<->") {
        Some(split) => (&lists[..split], &lists[split + 1..]),
        None => (lists, &[][..]),
    };
    let local = address_list(local_tokens.iter().copied());
    let remote = address_list(remote_tokens.iter().copied());

    Ok(Record::Socket(SocketDescriptor {
        protocol: Protocol::SctpAssociation,
        family: family_of(&local),
        local: Endpoint {
            addrs: local,
            port: local_port,
        },
        remote: Endpoint {
            addrs: remote,
            port: remote_port,
        },
        state: SocketState::Sctp(state),
        queues: QueueLengths { receive, transmit },
        timer: None,
        uid,
        inode,
        membership: None,
    }))
}
