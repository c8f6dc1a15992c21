//! Local interface lookup for SOCKS-mode backends.

use std::io;
use std::net::Ipv4Addr;

/// Result of looking up which interface owns an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceLookup {
    /// The address belongs to this up interface.
    Named(String),
    /// The address is local, but the platform cannot name its interface.
    Anonymous,
    /// No up interface carries the address.
    NotFound,
}

impl InterfaceLookup {
    /// Interface name to bind outbound sockets to, if known.
    pub fn into_name(self) -> Option<String> {
        match self {
            InterfaceLookup::Named(name) => Some(name),
            InterfaceLookup::Anonymous | InterfaceLookup::NotFound => None,
        }
    }
}

/// Device name behind an address label: `eth0:1` is carried by `eth0`.
#[cfg(unix)]
fn device_name(label: &str) -> &str {
    label.split_once(':').map_or(label, |(device, _)| device)
}

/// Find the up interface that carries `ip`.
#[cfg(unix)]
pub fn find_interface(ip: Ipv4Addr) -> io::Result<InterfaceLookup> {
    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;
    use std::net::SocketAddrV4;

    for ifa in getifaddrs().map_err(io::Error::from)? {
        if !ifa.flags.contains(InterfaceFlags::IFF_UP) {
            continue;
        }
        let Some(sin) = ifa.address.as_ref().and_then(|a| a.as_sockaddr_in()) else {
            continue;
        };
        if *SocketAddrV4::from(*sin).ip() == ip {
            return Ok(InterfaceLookup::Named(
                device_name(&ifa.interface_name).to_string(),
            ));
        }
    }
    Ok(InterfaceLookup::NotFound)
}

/// Find the up interface that carries `ip`.
///
/// Without interface enumeration, an address counts as local when a socket
/// can bind to it.
#[cfg(not(unix))]
pub fn find_interface(ip: Ipv4Addr) -> io::Result<InterfaceLookup> {
    match std::net::TcpListener::bind((ip, 0)) {
        Ok(_) => Ok(InterfaceLookup::Anonymous),
        Err(e) if e.kind() == io::ErrorKind::AddrNotAvailable => Ok(InterfaceLookup::NotFound),
        Err(e) => Err(e),
    }
}
