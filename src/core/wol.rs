//! Wake-on-LAN magic packets.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use crate::config::WakeConfig;
use crate::constants;
use crate::error::{Error, Result};

/// Parses a MAC address into six octets.
///
/// Accepts `:`, `-` or `.` separated forms (`AA:BB:CC:DD:EE:FF`,
/// `aa-bb-cc-dd-ee-ff`, `aabb.ccdd.eeff`) as well as 12 bare hex digits.
///
/// # Errors
///
/// Returns [`Error::InvalidMac`] if the input is not exactly 12 hex digits
/// once separators are removed.
pub fn parse_mac(input: &str) -> Result<[u8; 6]> {
    let trimmed = input.trim();
    let hex: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();

    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidMac(trimmed.to_string()));
    }

    let mut mac = [0u8; 6];
    for (i, octet) in mac.iter_mut().enumerate() {
        *octet = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| Error::InvalidMac(trimmed.to_string()))?;
    }
    Ok(mac)
}

/// Builds the 102-byte payload: six `0xFF` bytes, then the MAC sixteen times.
pub fn magic_packet(mac: [u8; 6]) -> [u8; constants::MAGIC_PACKET_LEN] {
    let mut packet = [0xFFu8; constants::MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac);
    }
    packet
}

/// Broadcasts magic packets over UDP.
#[derive(Debug, Clone, Copy)]
pub struct WakeSender {
    target: SocketAddrV4,
}

impl Default for WakeSender {
    fn default() -> Self {
        Self::new(Ipv4Addr::BROADCAST, constants::WOL_PORT)
    }
}

impl WakeSender {
    /// Sender targeting `address:port`.
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self {
            target: SocketAddrV4::new(address, port),
        }
    }

    /// Sender configured from `[wake]`.
    pub fn from_config(config: &WakeConfig) -> Self {
        Self::new(config.broadcast, config.port)
    }

    /// Destination of outgoing packets.
    pub fn target(&self) -> SocketAddrV4 {
        self.target
    }

    /// Sends one magic packet for `mac_address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMac`] for a malformed address and
    /// [`Error::Io`] if the socket cannot be opened or the send fails.
    pub fn wake(&self, mac_address: &str) -> Result<String> {
        let mac = parse_mac(mac_address)?;
        let packet = magic_packet(mac);

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(|e| Error::io("Failed to open UDP socket", e))?;
        socket
            .set_broadcast(true)
            .map_err(|e| Error::io("Failed to enable broadcast", e))?;
        socket
            .send_to(&packet, self.target)
            .map_err(|e| Error::io(format!("Failed to send magic packet to {}", self.target), e))?;

        Ok(format!("Magic packet sent to {}", mac_address.trim()))
    }
}
