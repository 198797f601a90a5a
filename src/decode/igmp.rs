use std::net::IpAddr;

use super::Decoded;
use crate::addr;
use crate::model::{
    AddressFamily, Endpoint, Membership, Protocol, QueueLengths, Record, SocketDescriptor,
    SocketState,
};

/// `<group> <users>` under an interface row of `/proc/net/igmp`.
pub(crate) const IGMP_GROUP_MIN_FIELDS: usize = 2;
/// `<idx> <device> <group> <users>` in `/proc/net/igmp6`.
pub(crate) const IGMP6_MIN_FIELDS: usize = 4;

const DEVICE_WIDTH: usize = 10;

/// Decoder for the multicast membership tables.
///
/// `/proc/net/igmp` prints one interface row followed by tab-indented group
/// rows, so the decoder remembers the last interface it saw. `/proc/net/igmp6`
/// has no header at all; the first line tells the two formats apart.
#[derive(Debug, Clone, Default)]
pub struct IgmpDecoder {
    device: String,
    has_index: bool,
    v6: bool,
}

impl IgmpDecoder {
    pub fn decode(&mut self, line_no: usize, line: &str) -> Decoded {
        if line_no == 0 {
            if line.contains("Device") {
                self.v6 = false;
                self.has_index = line.starts_with("Idx");
                return Decoded::Skip;
            }
            self.v6 = true;
        }

        if self.v6 {
            self.decode_v6(line)
        } else if line.starts_with('\t') {
            self.decode_group(line)
        } else {
            self.decode_interface(line)
        }
    }

    fn decode_interface(&mut self, line: &str) -> Decoded {
        let rest = if self.has_index {
            match line.split_once('\t') {
                Some((idx, rest)) if idx.trim().parse::<u32>().is_ok() => rest,
                _ => return Decoded::Malformed("bogus igmp interface line".to_string()),
            }
        } else {
            line
        };
        let name: String = rest.chars().take(DEVICE_WIDTH).collect();
        let name = name.split(':').next().unwrap_or_default().trim();
        if name.is_empty() {
            return Decoded::Malformed("bogus igmp interface line".to_string());
        }
        self.device = name.to_string();
        Decoded::Skip
    }

    fn decode_group(&self, line: &str) -> Decoded {
        let mut tokens = line.split_whitespace();
        let group = tokens.next().and_then(addr::decode_ipv4);
        let users = tokens.next().and_then(|t| t.parse::<u32>().ok());
        match (group, users) {
            (Some(group), Some(users)) => {
                Decoded::Record(membership(&self.device, IpAddr::V4(group), users))
            }
            (group, _) => Decoded::Malformed(format!(
                "bogus igmp line: {} of {} fields",
                usize::from(group.is_some()),
                IGMP_GROUP_MIN_FIELDS
            )),
        }
    }

    fn decode_v6(&self, line: &str) -> Decoded {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < IGMP6_MIN_FIELDS {
            return Decoded::Malformed(format!(
                "bogus igmp6 line: {} of {} fields",
                tokens.len(),
                IGMP6_MIN_FIELDS
            ));
        }
        let parsed = (
            tokens[0].parse::<u32>().ok(),
            addr::decode_ipv6_network_order(tokens[2]),
            tokens[3].parse::<u32>().ok(),
        );
        match parsed {
            (Some(_), Some(group), Some(users)) => {
                Decoded::Record(membership(tokens[1], IpAddr::V6(group), users))
            }
            _ => Decoded::Malformed("bogus igmp6 line".to_string()),
        }
    }
}

fn membership(interface: &str, group: IpAddr, ref_count: u32) -> Record {
    Record::Socket(SocketDescriptor {
        protocol: Protocol::IgmpMembership,
        family: AddressFamily::of(&group),
        local: Endpoint::new(group, 0),
        remote: Endpoint::empty(),
        state: SocketState::Stateless,
        queues: QueueLengths::default(),
        timer: None,
        uid: 0,
        inode: 0,
        membership: Some(Membership {
            interface: interface.to_string(),
            ref_count,
        }),
    })
}
