use std::collections::{HashMap, HashSet};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use log::trace;

const TCP_LISTEN: u8  = 0x0A;
const EPHEMERAL:  u16 = 32768;

const TABLES: &[(&str, &str, &str)] = &[
    ("/proc/net/tcp",  "IPv4", "TCP"),
    ("/proc/net/tcp6", "IPv6", "TCP"),
    ("/proc/net/udp",  "IPv4", "UDP"),
    ("/proc/net/udp6", "IPv6", "UDP"),
];

#[derive(Debug, Eq, PartialEq)]
pub struct Socket {
    pub inbound:  bool,
    pub family:   &'static str,
    pub protocol: &'static str,
    pub address:  SocketAddr,
}

#[derive(Debug)]
struct Entry {
    local:  SocketAddr,
    remote: SocketAddr,
    state:  u8,
    inode:  u64,
}

/// Socket inodes of the host mapped to their endpoints.
pub fn sockets() -> HashMap<u64, Socket> {
    let mut map = HashMap::new();
    for &(path, family, protocol) in TABLES {
        match fs::read_to_string(path) {
            Ok(table) => parse(&table, family, protocol, &mut map),
            Err(e)    => trace!("unable to read {}: {}", path, e),
        }
    }
    map
}

pub fn parse(table: &str, family: &'static str, protocol: &'static str, map: &mut HashMap<u64, Socket>) {
    let entries = table.lines().skip(1).filter_map(entry).collect::<Vec<_>>();

    let listening = entries.iter().filter(|e| e.listening(protocol)).map(|e| {
        e.local.port()
    }).collect::<HashSet<_>>();

    for e in entries {
        if e.unknown_peer(protocol) {
            continue;
        }

        // accepted connections share the listener's local port
        let (inbound, address) = match e.listening(protocol) {
            true                                        => (true,  e.local),
            false if listening.contains(&e.local.port()) => (true,  e.remote),
            false                                       => (false, e.remote),
        };

        map.insert(e.inode, Socket {
            inbound:  inbound,
            family:   family,
            protocol: protocol,
            address:  address,
        });
    }
}

impl Entry {
    fn listening(&self, protocol: &str) -> bool {
        match protocol {
            "TCP" => self.state == TCP_LISTEN,
            _     => self.unconnected() && self.local.port() < EPHEMERAL,
        }
    }

    // unconnected datagram clients on an ephemeral port, e.g. sendto()
    fn unknown_peer(&self, protocol: &str) -> bool {
        protocol != "TCP" && self.unconnected() && self.local.port() >= EPHEMERAL
    }

    fn unconnected(&self) -> bool {
        self.remote.ip().is_unspecified() && self.remote.port() == 0
    }
}

fn entry(line: &str) -> Option<Entry> {
    let fields = line.split_whitespace().collect::<Vec<_>>();
    Some(Entry {
        local:  addr(fields.get(1)?)?,
        remote: addr(fields.get(2)?)?,
        state:  u8::from_str_radix(fields.get(3)?, 16).ok()?,
        inode:  fields.get(9)?.parse().ok()?,
    })
}

// Addresses are printed as 32-bit words in host byte order.
fn addr(field: &str) -> Option<SocketAddr> {
    let mut split = field.split(':');
    let ip   = split.next()?;
    let port = u16::from_str_radix(split.next()?, 16).ok()?;

    let ip = match ip.len() {
        8  => IpAddr::V4(Ipv4Addr::from(word(ip)?)),
        32 => {
            let mut octets = [0u8; 16];
            for (n, chunk) in octets.chunks_mut(4).enumerate() {
                chunk.copy_from_slice(&word(&ip[n * 8..n * 8 + 8])?);
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _  => return None,
    };

    Some(SocketAddr::new(ip, port))
}

fn word(hex: &str) -> Option<[u8; 4]> {
    Some(u32::from_str_radix(hex, 16).ok()?.to_ne_bytes())
}
