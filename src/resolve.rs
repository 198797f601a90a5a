//! Host and service names for the address columns.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

/// Turns raw addresses and ports into display text.
pub trait NameResolver {
    fn host(&self, addr: IpAddr, numeric: bool) -> String;
    fn service(&self, port: u16, protocol: &str, numeric: bool) -> String;
}

/// Resolver backed by the `hosts` and `services` files of an etc root,
/// optionally falling back to reverse DNS for hosts.
///
/// Each file is read at most once, on first use.
#[derive(Debug)]
pub struct NameDatabase {
    etc_root: PathBuf,
    reverse_dns: bool,
    hosts: OnceCell<HashMap<IpAddr, String>>,
    services: OnceCell<HashMap<(u16, String), String>>,
}

impl NameDatabase {
    pub fn new(etc_root: impl Into<PathBuf>, reverse_dns: bool) -> Self {
        Self {
            etc_root: etc_root.into(),
            reverse_dns,
            hosts: OnceCell::new(),
            services: OnceCell::new(),
        }
    }

    fn read_table(&self, name: &str) -> String {
        let path = self.etc_root.join(name);
        fs::read_to_string(&path).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), "name database unavailable: {}", e);
            String::new()
        })
    }

    fn hosts(&self) -> &HashMap<IpAddr, String> {
        self.hosts.get_or_init(|| parse_hosts(&self.read_table("hosts")))
    }

    fn services(&self) -> &HashMap<(u16, String), String> {
        self.services
            .get_or_init(|| parse_services(&self.read_table("services")))
    }
}

impl NameResolver for NameDatabase {
    fn host(&self, addr: IpAddr, numeric: bool) -> String {
        if numeric || addr.is_unspecified() {
            return addr.to_string();
        }
        if let Some(name) = self.hosts().get(&addr) {
            return name.clone();
        }
        if self.reverse_dns {
            if let Ok(name) = dns_lookup::lookup_addr(&addr) {
                return name;
            }
        }
        addr.to_string()
    }

    fn service(&self, port: u16, protocol: &str, numeric: bool) -> String {
        if port == 0 {
            return "*".to_string();
        }
        if numeric {
            return port.to_string();
        }
        self.services()
            .get(&(port, protocol.to_string()))
            .cloned()
            .unwrap_or_else(|| port.to_string())
    }
}

fn without_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default()
}

/// `address canonical-name [aliases...]`; the first line for an address wins.
fn parse_hosts(text: &str) -> HashMap<IpAddr, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let mut fields = without_comment(line).split_whitespace();
        let (Some(addr), Some(name)) = (fields.next(), fields.next()) else {
            continue;
        };
        if let Ok(addr) = addr.parse::<IpAddr>() {
            map.entry(addr).or_insert_with(|| name.to_string());
        }
    }
    map
}

/// `name port/protocol [aliases...]`; the first line for a pair wins.
fn parse_services(text: &str) -> HashMap<(u16, String), String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let mut fields = without_comment(line).split_whitespace();
        let (Some(name), Some(entry)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some((port, protocol)) = entry.split_once('/') else {
            continue;
        };
        if let Ok(port) = port.parse::<u16>() {
            map.entry((port, protocol.to_ascii_lowercase()))
                .or_insert_with(|| name.to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn make_db() -> (tempfile::TempDir, NameDatabase) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("hosts"),
            "# comment\n127.0.0.1\tlocalhost loopback\n::1 ip6-localhost\n127.0.0.1 shadowed\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("services"),
            "ssh\t\t22/tcp\t\t\t# SSH Remote Login Protocol\n\
             http-alt 8080/tcp webcache\n\
             domain 53/udp\n",
        )
        .unwrap();
        let db = NameDatabase::new(dir.path(), false);
        (dir, db)
    }

    #[test]
    fn test_host_lookup_and_fallback() {
        let (_dir, db) = make_db();
        assert_eq!(db.host(IpAddr::V4(Ipv4Addr::LOCALHOST), false), "localhost");
        assert_eq!(db.host(IpAddr::V6(Ipv6Addr::LOCALHOST), false), "ip6-localhost");
        assert_eq!(db.host(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)), false), "10.1.2.3");
        assert_eq!(db.host(IpAddr::V4(Ipv4Addr::LOCALHOST), true), "127.0.0.1");
        assert_eq!(db.host(IpAddr::V4(Ipv4Addr::UNSPECIFIED), false), "0.0.0.0");
    }

    #[test]
    fn test_service_lookup_is_per_protocol() {
        let (_dir, db) = make_db();
        assert_eq!(db.service(22, "tcp", false), "ssh");
        assert_eq!(db.service(8080, "tcp", false), "http-alt");
        assert_eq!(db.service(53, "udp", false), "domain");
        assert_eq!(db.service(53, "tcp", false), "53");
        assert_eq!(db.service(22, "tcp", true), "22");
    }

    #[test]
    fn test_port_zero_is_wildcard() {
        let (_dir, db) = make_db();
        assert_eq!(db.service(0, "tcp", false), "*");
        assert_eq!(db.service(0, "udp", true), "*");
    }

    #[test]
    fn test_missing_databases_fall_back_to_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let db = NameDatabase::new(dir.path().join("none"), false);
        assert_eq!(db.service(22, "tcp", false), "22");
        assert_eq!(db.host(IpAddr::V4(Ipv4Addr::LOCALHOST), false), "127.0.0.1");
    }
}
