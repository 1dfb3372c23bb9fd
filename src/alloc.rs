use crate::error::{Error, Result};
use crate::store::ConfigStore;

/// Interfaces wg0 to wg9, subnetworks 10.0.0.0/28 to 10.0.9.0/28.
pub const MAX_SLOTS: u8 = 10;
pub const SERVER_MASK: u8 = 28;
pub const CLIENT_MASK: u8 = 32;
/// 10.0.x.0 is the network address, 10.0.x.1 the server, 10.0.x.15 broadcast.
pub const FIRST_CLIENT_HOST: u8 = 2;
pub const LAST_CLIENT_HOST: u8 = 14;

/// A numeric interface slot, typed from allocation onward so the subnet and
/// port derivations never re-parse a formatted identity string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSlot(u8);

impl ServerSlot {
    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn identity(&self) -> String {
        format!("wg{}", self.0)
    }

    pub fn file_name(&self) -> String {
        format!("wg{}.conf", self.0)
    }

    /// Server-side address within the slot's subnet.
    pub fn address(&self) -> String {
        format!("10.0.{}.1", self.0)
    }

    pub fn address_cidr(&self) -> String {
        format!("10.0.{}.1/{}", self.0, SERVER_MASK)
    }

    pub fn port(&self, base_port: u16) -> u16 {
        base_port + u16::from(self.0)
    }

    /**
     * @brief Recover the numeric slot from an operator-typed identity.
     *
     * Digits embedded in the identity are concatenated left-to-right, so
     * `wg3` yields slot 3. Only used at the selection boundary; everywhere
     * else the slot stays typed from the moment it is allocated.
     */
    pub fn from_identity(identity: &str) -> Self {
        let id = identity
            .chars()
            .filter(|c| c.is_ascii_digit())
            .fold(0u32, |acc, c| {
                acc.saturating_mul(10)
                    .saturating_add(u32::from(c) - u32::from('0'))
            });
        Self(u8::try_from(id).unwrap_or(u8::MAX))
    }
}

/// A client address within a server's subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddress {
    slot_id: u8,
    host: u8,
}

impl PeerAddress {
    pub fn host(&self) -> u8 {
        self.host
    }

    pub fn cidr(&self) -> String {
        format!("10.0.{}.{}/{}", self.slot_id, self.host, CLIENT_MASK)
    }
}

/**
 * @brief Pick the lowest interface slot with no config file in the store.
 * @return The free slot, or SlotsExhausted when wg0-wg9 all exist.
 */
pub fn allocate_server_slot(store: &ConfigStore) -> Result<ServerSlot> {
    let files = store.list_server_files()?;
    for id in 0..MAX_SLOTS {
        let slot = ServerSlot(id);
        if !files.iter().any(|f| *f == slot.file_name()) {
            return Ok(slot);
        }
    }
    Err(Error::SlotsExhausted)
}

/**
 * @brief Pick the lowest free client address on a server.
 *
 * The server config is parsed once; candidate hosts 2..=14 are checked
 * against the parsed allowed-IPs rather than against formatted lines.
 *
 * @param identity Server identity as typed or allocated, e.g. `wg3`.
 * @return The free address, or AddressesExhausted when every host is taken.
 */
pub fn allocate_peer_slot(store: &ConfigStore, identity: &str) -> Result<PeerAddress> {
    let slot = ServerSlot::from_identity(identity);
    let parsed = store.parse_server(identity)?;
    for host in FIRST_CLIENT_HOST..=LAST_CLIENT_HOST {
        let candidate = PeerAddress {
            slot_id: slot.id(),
            host,
        };
        if !parsed.claims_address(&candidate.cidr()) {
            return Ok(candidate);
        }
    }
    Err(Error::AddressesExhausted(identity.to_string()))
}
