//! Decoding of the packed hexadecimal addresses found in `/proc/net/*`.
//!
//! The kernel prints an IPv4 address as one 32-bit word and an IPv6 address
//! as four 32-bit words, each word formatted with `%08X` from its in-memory
//! (host order) value. Decoding therefore parses each word and takes its
//! native-endian bytes.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const IPV4_HEX_LEN: usize = 8;
const IPV6_HEX_LEN: usize = 32;

fn parse_word(hex: &str) -> Option<u32> {
    if hex.len() != IPV4_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Decode an 8-digit host-order IPv4 word.
pub fn decode_ipv4(hex: &str) -> Option<Ipv4Addr> {
    parse_word(hex).map(|word| Ipv4Addr::from(word.to_ne_bytes()))
}

/// Decode a 32-digit IPv6 address made of four host-order words.
pub fn decode_ipv6(hex: &str) -> Option<Ipv6Addr> {
    if hex.len() != IPV6_HEX_LEN {
        return None;
    }
    let mut octets = [0u8; 16];
    for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
        let start = i * IPV4_HEX_LEN;
        let word = parse_word(hex.get(start..start + IPV4_HEX_LEN)?)?;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    Some(Ipv6Addr::from(octets))
}

/// Decode a 32-digit IPv6 address already in network byte order, as printed
/// by `/proc/net/igmp6`.
pub fn decode_ipv6_network_order(hex: &str) -> Option<Ipv6Addr> {
    if hex.len() != IPV6_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u128::from_str_radix(hex, 16).ok().map(Ipv6Addr::from)
}

/// Decode a packed address, picking the family from the digit count.
pub fn decode_packed(hex: &str) -> Option<IpAddr> {
    match hex.len() {
        IPV4_HEX_LEN => decode_ipv4(hex).map(IpAddr::V4),
        IPV6_HEX_LEN => decode_ipv6(hex).map(IpAddr::V6),
        _ => None,
    }
}

/// Split an `ADDR:PORT` column into the decoded address and port.
pub fn decode_endpoint(field: &str) -> Option<(IpAddr, u16)> {
    let (addr, port) = field.rsplit_once(':')?;
    let addr = decode_packed(addr)?;
    let port = u16::from_str_radix(port, 16).ok()?;
    Some((addr, port))
}

/// Parse the textual addresses SCTP tables print: dotted IPv4 or
/// colon-separated IPv6. A leading `*` marks the primary path.
pub fn parse_sctp_address(text: &str) -> Option<IpAddr> {
    let text = text.strip_prefix('*').unwrap_or(text);
    if text.contains(':') {
        text.parse::<Ipv6Addr>().ok().map(IpAddr::V6)
    } else {
        text.parse::<Ipv4Addr>().ok().map(IpAddr::V4)
    }
}
