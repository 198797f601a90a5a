use std::fmt;

/// Kernel TCP state numbering, shared by the UDP, RAW and SCTP tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown(u32),
}

impl TcpState {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => TcpState::Established,
            2 => TcpState::SynSent,
            3 => TcpState::SynRecv,
            4 => TcpState::FinWait1,
            5 => TcpState::FinWait2,
            6 => TcpState::TimeWait,
            7 => TcpState::Close,
            8 => TcpState::CloseWait,
            9 => TcpState::LastAck,
            10 => TcpState::Listen,
            11 => TcpState::Closing,
            other => TcpState::Unknown(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            TcpState::Established => 1,
            TcpState::SynSent => 2,
            TcpState::SynRecv => 3,
            TcpState::FinWait1 => 4,
            TcpState::FinWait2 => 5,
            TcpState::TimeWait => 6,
            TcpState::Close => 7,
            TcpState::CloseWait => 8,
            TcpState::LastAck => 9,
            TcpState::Listen => 10,
            TcpState::Closing => 11,
            TcpState::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcpState::Established => write!(f, "ESTABLISHED"),
            TcpState::SynSent => write!(f, "SYN_SENT"),
            TcpState::SynRecv => write!(f, "SYN_RECV"),
            TcpState::FinWait1 => write!(f, "FIN_WAIT1"),
            TcpState::FinWait2 => write!(f, "FIN_WAIT2"),
            TcpState::TimeWait => write!(f, "TIME_WAIT"),
            TcpState::Close => write!(f, "CLOSE"),
            TcpState::CloseWait => write!(f, "CLOSE_WAIT"),
            TcpState::LastAck => write!(f, "LAST_ACK"),
            TcpState::Listen => write!(f, "LISTEN"),
            TcpState::Closing => write!(f, "CLOSING"),
            TcpState::Unknown(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

/// Per-protocol view of the state column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Tcp(TcpState),
    /// UDP and UDP-Lite only distinguish connected and closed sockets.
    Datagram(TcpState),
    /// RAW sockets print the bare number.
    Raw(u32),
    /// SCTP accepts codes 0 through 10 only.
    Sctp(u32),
    /// Multicast memberships carry no state.
    Stateless,
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketState::Tcp(state) => write!(f, "{}", state),
            SocketState::Datagram(TcpState::Established) => write!(f, "ESTABLISHED"),
            SocketState::Datagram(TcpState::Close) => Ok(()),
            SocketState::Datagram(other) => write!(f, "UNKNOWN({})", other.code()),
            SocketState::Raw(code) => write!(f, "{}", code),
            SocketState::Sctp(0) => Ok(()),
            SocketState::Sctp(code @ 1..=10) => write!(f, "{}", TcpState::from_code(*code)),
            SocketState::Sctp(code) => write!(f, "UNKNOWN({})", code),
            SocketState::Stateless => Ok(()),
        }
    }
}

/// `socket_state` values from the unix table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnixState {
    Free,
    Unconnected,
    Connecting,
    Connected,
    Disconnecting,
    Unknown(u32),
}

impl UnixState {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => UnixState::Free,
            1 => UnixState::Unconnected,
            2 => UnixState::Connecting,
            3 => UnixState::Connected,
            4 => UnixState::Disconnecting,
            other => UnixState::Unknown(other),
        }
    }
}

impl fmt::Display for UnixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnixState::Free => write!(f, "FREE"),
            UnixState::Unconnected => Ok(()),
            UnixState::Connecting => write!(f, "CONNECTING"),
            UnixState::Connected => write!(f, "CONNECTED"),
            UnixState::Disconnecting => write!(f, "DISCONNECTING"),
            UnixState::Unknown(_) => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnixType {
    Stream,
    Dgram,
    Raw,
    Rdm,
    SeqPacket,
    Unknown(u32),
}

impl UnixType {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => UnixType::Stream,
            2 => UnixType::Dgram,
            3 => UnixType::Raw,
            4 => UnixType::Rdm,
            5 => UnixType::SeqPacket,
            other => UnixType::Unknown(other),
        }
    }
}

impl fmt::Display for UnixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnixType::Stream => write!(f, "STREAM"),
            UnixType::Dgram => write!(f, "DGRAM"),
            UnixType::Raw => write!(f, "RAW"),
            UnixType::Rdm => write!(f, "RDM"),
            UnixType::SeqPacket => write!(f, "SEQPACKET"),
            UnixType::Unknown(_) => write!(f, "UNKNOWN"),
        }
    }
}
