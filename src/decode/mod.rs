//! Line decoders for the `/proc/net` protocol tables.
//!
//! Every table gets its own [`Decoder`] variant. A decoder is created fresh
//! for each file pass, so per-file carry-over state (IGMP device rows, the
//! UNIX inode column flag) never leaks from one file into the next.

mod igmp;
mod inet;
mod sctp;
mod unix;

pub use igmp::IgmpDecoder;
pub use unix::UnixDecoder;

use crate::model::{Protocol, Record};

/// Outcome of decoding a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Record(Record),
    /// Header lines and rows that only update decoder state.
    Skip,
    /// The line did not match the table layout; the reason is logged by the
    /// caller together with the path and line number.
    Malformed(String),
}

#[derive(Debug, Clone)]
pub enum Decoder {
    Tcp,
    Udp,
    UdpLite,
    Raw,
    SctpEndpoints,
    SctpAssociations,
    Igmp(IgmpDecoder),
    Unix(UnixDecoder),
}

impl Decoder {
    pub fn for_protocol(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Tcp => Decoder::Tcp,
            Protocol::Udp => Decoder::Udp,
            Protocol::UdpLite => Decoder::UdpLite,
            Protocol::Raw => Decoder::Raw,
            Protocol::SctpEndpoint => Decoder::SctpEndpoints,
            Protocol::SctpAssociation => Decoder::SctpAssociations,
            Protocol::IgmpMembership => Decoder::Igmp(IgmpDecoder::default()),
            Protocol::Unix => Decoder::Unix(UnixDecoder::default()),
        }
    }

    /// Decode one line. `line_no` is zero-based within the source file.
    pub fn decode(&mut self, line_no: usize, line: &str) -> Decoded {
        match self {
            Decoder::Tcp => inet::decode(Protocol::Tcp, line_no, line),
            Decoder::Udp => inet::decode(Protocol::Udp, line_no, line),
            Decoder::UdpLite => inet::decode(Protocol::UdpLite, line_no, line),
            Decoder::Raw => inet::decode(Protocol::Raw, line_no, line),
            Decoder::SctpEndpoints => sctp::decode_endpoint(line_no, line),
            Decoder::SctpAssociations => sctp::decode_association(line_no, line),
            Decoder::Igmp(state) => state.decode(line_no, line),
            Decoder::Unix(state) => state.decode(line_no, line),
        }
    }
}
