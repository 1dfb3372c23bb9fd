use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::warn;

use crate::alloc::{self, ServerSlot};
use crate::census;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::keys;
use crate::qr;
use crate::request;
use crate::service;
use crate::store::{ClientFields, ConfigStore, ServerFields};

/// Request-scoped aggregate threaded through one provisioning workflow.
/// Built fresh per request, populated stage by stage, dropped when the
/// request ends on any path; only its effects on the store persist.
#[derive(Debug, Default)]
pub struct Provisioning {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub private_key: String,
    pub public_key: String,
    /// Public key of the serving interface, filled on the client path only.
    pub server_public_key: String,
}

/**
 * @brief Provision the next free wg interface.
 *
 * Allocates the lowest free slot, generates the keypair and writes the
 * server config. Service bring-up afterwards is best-effort: a failed
 * `systemctl` leaves the written config in place and is only logged.
 */
pub fn add_server(settings: &Settings, store: &ConfigStore) -> Result<Provisioning> {
    let _lock = store.lock()?;
    let slot = alloc::allocate_server_slot(store)?;
    let keypair = keys::generate_keypair();
    let wgs = Provisioning {
        name: slot.identity(),
        address: slot.address(),
        port: slot.port(settings.base_port),
        private_key: keypair.private_b64,
        public_key: keypair.public_b64,
        ..Default::default()
    };
    let uplink = service::detect_uplink(settings.uplink_iface.as_deref());
    store.create_server_file(
        &wgs.name,
        &ServerFields {
            address_cidr: &slot.address_cidr(),
            listen_port: wgs.port,
            private_key: &wgs.private_key,
            uplink: &uplink,
        },
    )?;
    println!("{} config has been created", wgs.name);
    println!(
        "ALERT: if you are using a firewall, be sure to open port {}",
        wgs.port
    );
    if settings.manage_services {
        match service::enable_persistent(&wgs.name).and_then(|_| service::start(&wgs.name)) {
            Ok(()) => println!("service wg-quick@{} is up and running", wgs.name),
            Err(e) => warn!("service bring-up for {} failed: {}", wgs.name, e),
        }
    }
    Ok(wgs)
}

/**
 * @brief Provision a client on an interactively selected server.
 *
 * Discovers the public address first, so a dead echo endpoint aborts before
 * anything is allocated or written. The server's public key is derived from
 * the PrivateKey already stored in its config.
 *
 * @param name Client name, becomes `<name>.conf` in the scratch directory.
 * @param issue_dns Whether to write a DNS line into the client config.
 * @return Path of the written client config.
 */
pub fn add_client<R: BufRead, W: Write>(
    settings: &Settings,
    store: &ConfigStore,
    name: &str,
    issue_dns: bool,
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf> {
    let public_ip = request::public_ip(&settings.ip_endpoint)?;
    let server = census::select_server(store, input, output)?;
    let slot = ServerSlot::from_identity(&server);
    let _lock = store.lock()?;
    if settings.manage_services {
        if let Err(e) = service::down(&server) {
            warn!("couldn't stop {}: {}", server, e);
        }
    }
    let keypair = keys::generate_keypair();
    let parsed = store.parse_server(&server)?;
    let server_private = parsed
        .private_key
        .ok_or_else(|| Error::InvalidKey(format!("no PrivateKey in the {} config", server)))?;
    let peer = alloc::allocate_peer_slot(store, &server)?;
    let wgs = Provisioning {
        name: name.to_string(),
        address: peer.cidr(),
        port: slot.port(settings.base_port),
        private_key: keypair.private_b64,
        public_key: keypair.public_b64,
        server_public_key: keys::derive_public_key(&server_private)?,
    };
    store.append_peer(&server, &wgs.public_key, &wgs.address)?;
    println!("{} has been added to the {} config", wgs.name, server);
    let endpoint = format!("{}:{}", public_ip, wgs.port);
    let fields = ClientFields {
        address_cidr: &wgs.address,
        private_key: &wgs.private_key,
        server_public_key: &wgs.server_public_key,
        endpoint: &endpoint,
    };
    let dns = issue_dns.then_some(settings.dns.as_str());
    let path = store.write_client_file(&wgs.name, &fields, dns)?;
    println!(
        "{}.conf has been created and is located in {}",
        wgs.name,
        settings.scratch_dir.display()
    );
    match qr::render(&fields.render(dns)) {
        Ok(image) => println!("{}", image),
        Err(e) => warn!("couldn't render the QR code: {}", e),
    }
    if settings.manage_services {
        match service::up(&server) {
            Ok(()) => println!("server {} is running", server),
            Err(e) => warn!("couldn't start {}: {}", server, e),
        }
    }
    Ok(path)
}
