use super::Decoded;
use crate::model::{Record, UnixSocket, UnixState, UnixType};

/// `Num RefCount Protocol Flags Type St`
pub(crate) const UNIX_MIN_FIELDS: usize = 6;

/// Decoder for `/proc/net/unix`. Old kernels omit the inode column; the
/// header says which layout follows.
#[derive(Debug, Clone, Default)]
pub struct UnixDecoder {
    has_inode: bool,
}

fn hex(text: &str) -> Option<u64> {
    u64::from_str_radix(text, 16).ok()
}

fn hex32(text: &str) -> Option<u32> {
    u32::from_str_radix(text, 16).ok()
}

/// Type and state columns are 32-bit codes.
const NARROW_COLUMNS: std::ops::Range<usize> = 4..6;

impl UnixDecoder {
    pub fn decode(&mut self, line_no: usize, line: &str) -> Decoded {
        if line_no == 0 {
            self.has_inode = line.contains("Inode");
            return Decoded::Skip;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let matched = self.count_fields(&tokens);
        if matched < UNIX_MIN_FIELDS {
            return Decoded::Malformed(format!(
                "bogus unix line: {} of {} fields",
                matched, UNIX_MIN_FIELDS
            ));
        }

        // count_fields has validated the first six columns.
        let ref_count = hex(tokens[1]).unwrap_or_default();
        let protocol = hex(tokens[2]).unwrap_or_default();
        let flags = hex(tokens[3]).unwrap_or_default();
        let kind = hex32(tokens[4]).unwrap_or_default();
        let state = hex32(tokens[5]).unwrap_or_default();

        let (inode, path_tokens) = if self.has_inode {
            match tokens.get(6).and_then(|t| t.parse::<u64>().ok()) {
                Some(inode) => (Some(inode), &tokens[7..]),
                None => (None, &tokens[6..]),
            }
        } else {
            (None, &tokens[6..])
        };

        Decoded::Record(Record::Unix(UnixSocket {
            ref_count,
            protocol,
            flags,
            kind: UnixType::from_code(kind),
            state: UnixState::from_code(state),
            inode,
            path: path_tokens.join(" "),
        }))
    }

    fn count_fields(&self, tokens: &[&str]) -> usize {
        let Some(slot) = tokens.first() else {
            return 0;
        };
        if !slot.ends_with(':') || hex(slot.trim_end_matches(':')).is_none() {
            return 0;
        }
        1 + tokens
            .iter()
            .enumerate()
            .take(UNIX_MIN_FIELDS)
            .skip(1)
            .take_while(|(i, t)| {
                if NARROW_COLUMNS.contains(i) {
                    hex32(t).is_some()
                } else {
                    hex(t).is_some()
                }
            })
            .count()
    }
}
