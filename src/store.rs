use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Server configs carry the private key, owner-only.
const SERVER_FILE_MODE: u32 = 0o700;
const CLIENT_FILE_MODE: u32 = 0o664;
const LOCK_FILE: &str = ".wirewizard.lock";

/// The directory of per-server `.conf` files, acting as the system of record.
/// One file per interface, `[Interface]` block followed by one `[Peer]` block
/// per provisioned client. Generated client-side configs go to a separate
/// scratch directory.
pub struct ConfigStore {
    dir: PathBuf,
    scratch: PathBuf,
}

/// `[Interface]` fields for a freshly provisioned server.
pub struct ServerFields<'a> {
    pub address_cidr: &'a str,
    pub listen_port: u16,
    pub private_key: &'a str,
    pub uplink: &'a str,
}

/// Fields for a standalone client-side config.
pub struct ClientFields<'a> {
    pub address_cidr: &'a str,
    pub private_key: &'a str,
    pub server_public_key: &'a str,
    pub endpoint: &'a str,
}

impl ClientFields<'_> {
    /**
     * @brief Render the full client config text.
     * @param dns Optional resolver written as a DNS line.
     */
    pub fn render(&self, dns: Option<&str>) -> String {
        let mut text = format!(
            "[Interface]\nAddress = {}\nPrivateKey = {}\n",
            self.address_cidr, self.private_key
        );
        if let Some(dns) = dns {
            text.push_str(&format!("DNS = {}\n", dns));
        }
        text.push_str(&format!(
            "\n[Peer]\nPublicKey = {}\nEndpoint = {}\nAllowedIPs = 0.0.0.0/0\nPersistentKeepalive = 20\n",
            self.server_public_key, self.endpoint
        ));
        text
    }
}

impl ConfigStore {
    /**
     * @brief Open the store, verifying the directory is readable up front.
     * @param dir Directory of server configs.
     * @param scratch Directory for generated client configs.
     * @return ConfigStore or StoreUnavailable.
     */
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(dir: P, scratch: Q) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::read_dir(&dir).map_err(|e| Error::StoreUnavailable {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self {
            dir,
            scratch: scratch.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn server_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{}.conf", identity))
    }

    /**
     * @brief List server config filenames, sorted for stable census output.
     * @return Filenames minus dotfiles (the lock file lives in the store too).
     */
    pub fn list_server_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::StoreUnavailable {
            path: self.dir.clone(),
            source: e,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::StoreUnavailable {
                path: self.dir.clone(),
                source: e,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    pub fn read_lines(&self, identity: &str) -> Result<Vec<String>> {
        let path = self.server_path(identity);
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ConfigNotFound(identity.to_string()),
            _ => Error::ReadFailure {
                path: path.clone(),
                source: e,
            },
        })?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            lines.push(line.map_err(|e| Error::ReadFailure {
                path: path.clone(),
                source: e,
            })?);
        }
        Ok(lines)
    }

    /**
     * @brief Parse one server config into a structured record.
     *
     * Allocation and census work against this record instead of matching
     * formatted lines byte-for-byte against the file.
     */
    pub fn parse_server(&self, identity: &str) -> Result<ServerFile> {
        Ok(ServerFile::parse(self.read_lines(identity)?))
    }

    /**
     * @brief Write the `[Interface]` block for a new server, mode 0700.
     * @param identity Server identity, e.g. `wg3`.
     * @param fields Address, port, private key and uplink for the rules.
     */
    pub fn create_server_file(&self, identity: &str, fields: &ServerFields) -> Result<()> {
        let path = self.server_path(identity);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(SERVER_FILE_MODE)
            .open(&path)
            .map_err(|e| Error::WriteFailure {
                path: path.clone(),
                source: e,
            })?;
        let text = format!(
            "[Interface]\n\
             Address = {}\n\
             ListenPort = {}\n\
             PrivateKey = {}\n\
             SaveConfig = true\n\
             PostUp = iptables -A FORWARD -i %i -j ACCEPT; iptables -t nat -A POSTROUTING -o {uplink} -j MASQUERADE\n\
             PostDown = iptables -D FORWARD -i %i -j ACCEPT; iptables -t nat -D POSTROUTING -o {uplink} -j MASQUERADE\n\
             MTU = 1420\n",
            fields.address_cidr,
            fields.listen_port,
            fields.private_key,
            uplink = fields.uplink,
        );
        file.write_all(text.as_bytes()).map_err(|e| Error::WriteFailure {
            path: path.clone(),
            source: e,
        })?;
        debug!("created server config {}", path.display());
        Ok(())
    }

    /**
     * @brief Append a `[Peer]` block after all existing content.
     *
     * Uniqueness of the address is the allocator's job, not re-checked here.
     */
    pub fn append_peer(&self, identity: &str, public_key: &str, allowed_ips: &str) -> Result<()> {
        let path = self.server_path(identity);
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::ConfigNotFound(identity.to_string()),
                _ => Error::WriteFailure {
                    path: path.clone(),
                    source: e,
                },
            })?;
        let block = format!("\n[Peer]\nPublicKey = {}\nAllowedIPs = {}\n", public_key, allowed_ips);
        file.write_all(block.as_bytes()).map_err(|e| Error::WriteFailure {
            path: path.clone(),
            source: e,
        })?;
        debug!("appended peer {} to {}", allowed_ips, path.display());
        Ok(())
    }

    /**
     * @brief Write a standalone client config to the scratch directory, mode 0664.
     * @return Path of the written file.
     */
    pub fn write_client_file(
        &self,
        name: &str,
        fields: &ClientFields,
        dns: Option<&str>,
    ) -> Result<PathBuf> {
        let path = self.scratch.join(format!("{}.conf", name));
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(CLIENT_FILE_MODE)
            .open(&path)
            .map_err(|e| Error::WriteFailure {
                path: path.clone(),
                source: e,
            })?;
        file.write_all(fields.render(dns).as_bytes())
            .map_err(|e| Error::WriteFailure {
                path: path.clone(),
                source: e,
            })?;
        // The open mode passes through the umask; group write has to be
        // restored explicitly.
        fs::set_permissions(&path, Permissions::from_mode(CLIENT_FILE_MODE)).map_err(|e| {
            Error::WriteFailure {
                path: path.clone(),
                source: e,
            }
        })?;
        Ok(path)
    }

    /**
     * @brief Take the advisory lock guarding allocate-then-persist sequences.
     *
     * A second invocation against the same store fails with StoreLocked
     * instead of racing the first one to the same slot or address.
     */
    pub fn lock(&self) -> Result<StoreLock> {
        let path = self.dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(StoreLock { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::StoreLocked(path)),
            Err(e) => Err(Error::WriteFailure { path, source: e }),
        }
    }
}

/// Held for the span of one allocate-then-persist sequence; the lock file is
/// removed on drop on every exit path.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Structured view of one server config.
#[derive(Debug, Default)]
pub struct ServerFile {
    pub address: Option<String>,
    pub listen_port: Option<u16>,
    pub private_key: Option<String>,
    pub peers: Vec<PeerEntry>,
}

#[derive(Debug, Default)]
pub struct PeerEntry {
    pub public_key: Option<String>,
    pub allowed_ips: Vec<String>,
}

impl ServerFile {
    pub fn parse<I: IntoIterator<Item = String>>(lines: I) -> Self {
        let mut parsed = ServerFile::default();
        let mut in_peer = false;
        for raw in lines {
            let line = raw.trim_end();
            if line == "[Peer]" {
                parsed.peers.push(PeerEntry::default());
                in_peer = true;
                continue;
            }
            if line == "[Interface]" {
                in_peer = false;
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if in_peer {
                if let Some(peer) = parsed.peers.last_mut() {
                    match key {
                        "PublicKey" => peer.public_key = Some(value.to_string()),
                        "AllowedIPs" => peer.allowed_ips.push(value.to_string()),
                        _ => {}
                    }
                }
            } else {
                match key {
                    "Address" => parsed.address = Some(value.to_string()),
                    "ListenPort" => parsed.listen_port = value.parse().ok(),
                    "PrivateKey" => parsed.private_key = Some(value.to_string()),
                    _ => {}
                }
            }
        }
        parsed
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// True when any peer already claims the candidate address.
    pub fn claims_address(&self, cidr: &str) -> bool {
        self.peers
            .iter()
            .any(|p| p.allowed_ips.iter().any(|a| a == cidr))
    }
}
