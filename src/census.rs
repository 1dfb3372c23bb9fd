use std::io::{BufRead, Read, Write};

use crate::error::{Error, Result};
use crate::store::ConfigStore;

/// The banner the fleet has always shown, even though hosts 2..=14 leave
/// room for 13 clients.
pub const DISPLAYED_CAPACITY: u8 = 14;

/// Bound on the operator's typed server identity.
const IDENTITY_INPUT_LIMIT: u64 = 16;

const CONF_SUFFIX: &str = ".conf";

/**
 * @brief Number of `[Peer]` blocks in one server config.
 * @param identity Server identity, e.g. `wg0`.
 * @return 0 for a server with no clients yet.
 */
pub fn count_peers(store: &ConfigStore, identity: &str) -> Result<usize> {
    Ok(store.parse_server(identity)?.peer_count())
}

/**
 * @brief Census of every server in the store with its client count.
 *
 * Display names strip the `.conf` suffix. Fails with StoreEmpty when the
 * store holds no config at all, which is distinct from the store directory
 * being unreadable.
 */
pub fn list_servers_with_counts(store: &ConfigStore) -> Result<Vec<(String, usize)>> {
    let mut out = Vec::new();
    for name in store.list_server_files()? {
        let Some(display) = name.strip_suffix(CONF_SUFFIX) else {
            continue;
        };
        let count = count_peers(store, display)?;
        out.push((display.to_string(), count));
    }
    if out.is_empty() {
        return Err(Error::StoreEmpty(store.dir().to_path_buf()));
    }
    Ok(out)
}

/// Print the census the way the operator has always seen it.
pub fn write_census<W: Write>(output: &mut W, servers: &[(String, usize)]) {
    for (name, count) in servers {
        let _ = writeln!(output, ">server: {}", name);
        let _ = writeln!(output, "          |__ clients: {}/{}", count, DISPLAYED_CAPACITY);
    }
}

/**
 * @brief Show the census and read the operator's server choice.
 *
 * The typed identity is returned verbatim after trimming the line
 * terminator; an identity that names no config surfaces later as
 * ConfigNotFound when the caller opens it.
 */
pub fn select_server<R: BufRead, W: Write>(
    store: &ConfigStore,
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    let servers = list_servers_with_counts(store)?;
    write_census(output, &servers);
    let _ = write!(output, "Select a server: ");
    let _ = output.flush();
    let mut line = String::new();
    input
        .take(IDENTITY_INPUT_LIMIT)
        .read_line(&mut line)
        .map_err(|e| Error::ReadFailure {
            path: "stdin".into(),
            source: e,
        })?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
