pub mod socket;
pub mod state;

pub use socket::{
    AddressFamily, Endpoint, Membership, Protocol, QueueLengths, Record, SocketDescriptor,
    TimerInfo, UnixSocket,
};
pub use state::{SocketState, TcpState, UnixState, UnixType};
