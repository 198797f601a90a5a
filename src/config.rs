use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::error::{NetstatError, Result};
use crate::filter::{FamilySet, Selection, SocketFilter};

/// Protocol tables a cycle reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolSet {
    pub tcp: bool,
    pub sctp: bool,
    pub udp: bool,
    pub udplite: bool,
    pub raw: bool,
    pub igmp: bool,
    pub unix: bool,
}

impl ProtocolSet {
    /// Any table printed under the "Active Internet connections" banner.
    pub fn any_inet(&self) -> bool {
        self.tcp || self.sctp || self.udp || self.udplite || self.raw
    }
}

/// Which lookups are replaced by numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Numeric {
    pub hosts: bool,
    pub ports: bool,
    pub users: bool,
}

/// Everything one run needs, validated.
#[derive(Debug, Clone)]
pub struct Config {
    pub selection: Selection,
    pub families: FamilySet,
    pub protocols: ProtocolSet,
    /// The protocol set came from explicit protocol flags.
    pub explicit_protocols: bool,
    pub numeric: Numeric,
    pub extended: bool,
    pub programs: bool,
    pub labels: bool,
    pub timers: bool,
    pub wide: bool,
    /// `Some` in continuous mode.
    pub interval: Option<Duration>,
    pub verbose: bool,
    pub proc_root: PathBuf,
    pub etc_root: PathBuf,
}

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const SYSTEM_ETC: &str = "/etc";

impl Config {
    /// Build a `Config` from parsed CLI arguments.
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let selection = if args.all {
            Selection::All
        } else if args.listening {
            Selection::Listening
        } else {
            Selection::Connected
        };

        let families = match (args.inet, args.inet6) {
            (true, false) => FamilySet {
                ipv4: true,
                ipv6: false,
            },
            (false, true) => FamilySet {
                ipv4: false,
                ipv6: true,
            },
            _ => FamilySet::default(),
        };

        let mut protocols = ProtocolSet {
            tcp: args.tcp,
            sctp: args.sctp,
            udp: args.udp,
            udplite: args.udplite,
            raw: args.raw,
            igmp: args.groups,
            unix: args.unix,
        };
        let explicit_protocols = protocols != ProtocolSet::default();

        // A family flag alone selects every internet protocol.
        if (args.inet || args.inet6) && !protocols.any_inet() {
            protocols.tcp = true;
            protocols.sctp = true;
            protocols.udp = true;
            protocols.udplite = true;
            protocols.raw = true;
        }
        if protocols == ProtocolSet::default() {
            protocols = ProtocolSet {
                tcp: true,
                sctp: true,
                udp: true,
                udplite: true,
                raw: true,
                igmp: false,
                unix: true,
            };
        }

        let interval = match args.delay {
            Some(0) => {
                return Err(NetstatError::Config(
                    "delay must be a positive number of seconds".to_string(),
                ))
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None if args.continuous => Some(DEFAULT_INTERVAL),
            None => None,
        };

        Ok(Config {
            selection,
            families,
            protocols,
            explicit_protocols,
            numeric: Numeric {
                hosts: args.numeric || args.numeric_hosts,
                ports: args.numeric || args.numeric_ports,
                users: args.numeric || args.numeric_users,
            },
            extended: args.extend > 0,
            programs: args.program || args.context,
            labels: args.context,
            timers: args.timers,
            wide: args.wide,
            interval,
            verbose: args.verbose,
            proc_root: args.proc_root.clone(),
            etc_root: args.etc_root.clone(),
        })
    }

    pub fn filter(&self) -> SocketFilter {
        SocketFilter::new(self.selection, self.families)
    }

    /// Whether the process table has to be walked at all.
    pub fn needs_correlation(&self) -> bool {
        self.programs || self.labels
    }

    /// Reverse DNS only applies to the real system databases.
    pub fn reverse_dns(&self) -> bool {
        !self.numeric.hosts && self.etc_root == PathBuf::from(SYSTEM_ETC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn make_config(args: &[&str]) -> Result<Config> {
        let cli = CliArgs::try_parse_from(std::iter::once("rnetstat").chain(args.iter().copied()))
            .unwrap();
        Config::from_cli(&cli)
    }

    #[test]
    fn test_defaults_cover_everything_but_groups() {
        let config = make_config(&[]).unwrap();
        assert!(config.protocols.tcp && config.protocols.unix && config.protocols.sctp);
        assert!(!config.protocols.igmp);
        assert!(!config.explicit_protocols);
        assert_eq!(config.selection, Selection::Connected);
        assert!(config.interval.is_none());
        assert!(!config.needs_correlation());
    }

    #[test]
    fn test_family_flag_drops_unix() {
        let config = make_config(&["-4"]).unwrap();
        assert!(config.protocols.tcp && config.protocols.raw);
        assert!(!config.protocols.unix);
        assert!(config.families.ipv4 && !config.families.ipv6);
        assert!(!config.explicit_protocols);
    }

    #[test]
    fn test_explicit_protocols() {
        let config = make_config(&["-t", "-x"]).unwrap();
        assert!(config.protocols.tcp && config.protocols.unix);
        assert!(!config.protocols.udp && !config.protocols.sctp);
        assert!(config.explicit_protocols);
    }

    #[test]
    fn test_all_wins_over_listening() {
        assert_eq!(make_config(&["-l", "-a"]).unwrap().selection, Selection::All);
        assert_eq!(make_config(&["-l"]).unwrap().selection, Selection::Listening);
    }

    #[test]
    fn test_numeric_flags_are_independent() {
        let config = make_config(&["--numeric-ports"]).unwrap();
        assert_eq!(
            config.numeric,
            Numeric {
                hosts: false,
                ports: true,
                users: false
            }
        );
        let config = make_config(&["-n"]).unwrap();
        assert!(config.numeric.hosts && config.numeric.ports && config.numeric.users);
        assert!(!config.reverse_dns());
    }

    #[test]
    fn test_context_implies_programs() {
        let config = make_config(&["-Z"]).unwrap();
        assert!(config.programs && config.labels);
        assert!(config.needs_correlation());
    }

    #[test]
    fn test_interval() {
        assert_eq!(make_config(&["-c"]).unwrap().interval, Some(Duration::from_secs(1)));
        assert_eq!(make_config(&["3"]).unwrap().interval, Some(Duration::from_secs(3)));
        assert!(matches!(make_config(&["0"]), Err(NetstatError::Config(_))));
    }
}
