use std::collections::HashSet;
use std::io::Write;
use anyhow::Result;
use crate::store::Connection;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Eq, PartialEq)]
pub enum Line<'a> {
    Title(bool),
    Family(&'a str),
    Protocol(&'a str),
    Address(&'a str),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
struct Key<'a> {
    inbound:  bool,
    family:   &'a str,
    protocol: &'a str,
    address:  &'a str,
}

// Headers already printed for the group the last address belongs to.
#[derive(Copy, Clone, Debug)]
enum Group<'a> {
    None,
    Family { inbound: bool, family: &'a str },
    Protocol { inbound: bool, family: &'a str, protocol: &'a str },
}

pub fn print<W: Write>(conns: &[Connection], out: &mut W) -> Result<()> {
    for line in lines(conns) {
        match line {
            Line::Title(false)   => writeln!(out, "\nRemote connections:")?,
            Line::Title(true)    => writeln!(out, "\nIncoming connections:")?,
            Line::Family(name)   => writeln!(out, "    {}", name)?,
            Line::Protocol(name) => writeln!(out, "      {}", name)?,
            Line::Address(addr)  => writeln!(out, "        {}", addr)?,
        }
    }
    Ok(())
}

/// Report lines for connections already ordered by direction, family
/// and time. Repeated endpoints are reported once.
pub fn lines(conns: &[Connection]) -> Vec<Line> {
    let mut seen  = HashSet::new();
    let mut group = Group::None;
    let mut lines = Vec::new();

    for key in conns.iter().map(Key::from) {
        if !seen.insert(key) {
            continue;
        }

        let (same_direction, same_family, same_protocol) = match group {
            Group::None                                   => (false, false, false),
            Group::Family { inbound, family }             => (
                inbound == key.inbound,
                inbound == key.inbound && family == key.family,
                false,
            ),
            Group::Protocol { inbound, family, protocol } => (
                inbound == key.inbound,
                inbound == key.inbound && family == key.family,
                inbound == key.inbound && family == key.family && protocol == key.protocol,
            ),
        };

        if !same_direction {
            lines.push(Line::Title(key.inbound));
        }

        if !same_family {
            lines.push(Line::Family(key.family));
            group = Group::Family { inbound: key.inbound, family: key.family };
        }

        if !same_protocol {
            lines.push(Line::Protocol(key.protocol));
            group = Group::Protocol {
                inbound:  key.inbound,
                family:   key.family,
                protocol: key.protocol,
            };
        }

        lines.push(Line::Address(key.address));
    }

    lines
}

impl<'a> From<&'a Connection> for Key<'a> {
    fn from(conn: &'a Connection) -> Self {
        Self {
            inbound:  conn.inbound,
            family:   conn.family.as_deref().unwrap_or(UNKNOWN),
            protocol: conn.protocol.as_deref().unwrap_or(UNKNOWN),
            address:  conn.address.as_deref().unwrap_or(UNKNOWN),
        }
    }
}
