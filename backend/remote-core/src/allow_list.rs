//! Network allow-list consulted before anything else happens on a socket.
//!
//! Built once from a comma separated list of addresses and CIDR prefixes.
//! A bare IPv4 address means `/32`, a bare IPv6 address `/128`. One bad entry
//! fails the whole list; there is no best-effort allow-list.

use crate::error::AllowListError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::net::{IpAddr, SocketAddr};
use std::panic::Location;

use ipnet::IpNet;
use log::warn;

const ENTRY_SEPARATOR: char = ',';
const PREFIX_SEPARATOR: char = '/';

/// Immutable set of permitted address ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowRange {
    allows: Vec<IpNet>,
}

impl AllowRange {
    /// Parse a comma separated allow-list.
    ///
    /// Blank entries are skipped. A list with no entries at all denies every
    /// address.
    ///
    /// # Errors
    ///
    /// Returns [`AllowListError::Parse`] for the first entry that is neither an
    /// IP address nor a CIDR prefix.
    pub fn new(csv: &str) -> Result<Self, AllowListError> {
        let mut allows = Vec::new();

        for entry in csv
            .split(ENTRY_SEPARATOR)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            allows.push(parse_entry(entry)?);
        }

        if allows.is_empty() {
            warn!("Allow list is empty, every connection will be refused");
        }

        Ok(Self { allows })
    }

    /// True iff `addr` falls into at least one range.
    ///
    /// IPv4-mapped IPv6 addresses are matched as the IPv4 address they carry.
    pub fn contains(&self, addr: IpAddr) -> bool {
        let addr = addr.to_canonical();
        self.allows.iter().any(|net| net.contains(&addr))
    }

    /// Same as [`contains`](Self::contains) for textual addresses. Anything
    /// that does not parse as an address is outside the range.
    pub fn contains_str(&self, addr: &str) -> bool {
        addr.trim()
            .parse::<IpAddr>()
            .map(|ip| self.contains(ip))
            .unwrap_or(false)
    }

    /// Check the remote end of an accepted connection.
    pub fn contains_peer(&self, peer: SocketAddr) -> bool {
        self.contains(peer.ip())
    }

    pub fn len(&self) -> usize {
        self.allows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allows.is_empty()
    }
}

impl Display for AllowRange {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let entries: Vec<String> = self.allows.iter().map(IpNet::to_string).collect();
        write!(formatter, "{}", entries.join(","))
    }
}

fn parse_entry(entry: &str) -> Result<IpNet, AllowListError> {
    if entry.contains(PREFIX_SEPARATOR) {
        return entry.parse::<IpNet>().map_err(|e| AllowListError::Parse {
            entry: entry.to_string(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    // Bare address: a host prefix of full length.
    entry
        .parse::<IpAddr>()
        .map(IpNet::from)
        .map_err(|e| AllowListError::Parse {
            entry: entry.to_string(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}
