use std::fs;

use tempfile::TempDir;
use wirewizard::census::count_peers;
use wirewizard::error::Error;
use wirewizard::store::{ClientFields, ConfigStore, ServerFields};

fn open_store() -> (TempDir, TempDir, ConfigStore) {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let store = ConfigStore::open(dir.path(), scratch.path()).unwrap();
    (dir, scratch, store)
}

fn seed_wg0(store: &ConfigStore) {
    store
        .create_server_file(
            "wg0",
            &ServerFields {
                address_cidr: "10.0.0.1/28",
                listen_port: 51820,
                private_key: "SERVER-PRIV",
                uplink: "eth0",
            },
        )
        .unwrap();
}

#[test]
fn server_file_grammar_is_line_exact() {
    let (dir, _s, store) = open_store();
    seed_wg0(&store);
    let text = fs::read_to_string(dir.path().join("wg0.conf")).unwrap();
    assert_eq!(
        text,
        "[Interface]\n\
         Address = 10.0.0.1/28\n\
         ListenPort = 51820\n\
         PrivateKey = SERVER-PRIV\n\
         SaveConfig = true\n\
         PostUp = iptables -A FORWARD -i %i -j ACCEPT; iptables -t nat -A POSTROUTING -o eth0 -j MASQUERADE\n\
         PostDown = iptables -D FORWARD -i %i -j ACCEPT; iptables -t nat -D POSTROUTING -o eth0 -j MASQUERADE\n\
         MTU = 1420\n"
    );
}

#[test]
fn append_peer_adds_one_block_after_existing_content() {
    let (dir, _s, store) = open_store();
    seed_wg0(&store);
    store.append_peer("wg0", "CLIENT-PUB", "10.0.0.2/32").unwrap();
    let text = fs::read_to_string(dir.path().join("wg0.conf")).unwrap();
    assert!(text.ends_with(
        "MTU = 1420\n\n[Peer]\nPublicKey = CLIENT-PUB\nAllowedIPs = 10.0.0.2/32\n"
    ));
    assert_eq!(count_peers(&store, "wg0").unwrap(), 1);
}

#[test]
fn append_to_missing_server_is_config_not_found() {
    let (_d, _s, store) = open_store();
    assert!(matches!(
        store.append_peer("wg4", "PUB", "10.0.4.2/32"),
        Err(Error::ConfigNotFound(ref s)) if s == "wg4"
    ));
}

#[test]
fn client_file_with_dns() {
    let (_d, scratch, store) = open_store();
    let fields = ClientFields {
        address_cidr: "10.0.0.2/32",
        private_key: "CLIENT-PRIV",
        server_public_key: "SERVER-PUB",
        endpoint: "203.0.113.7:51820",
    };
    let path = store.write_client_file("laptop", &fields, Some("1.1.1.1")).unwrap();
    assert_eq!(path, scratch.path().join("laptop.conf"));
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "[Interface]\n\
         Address = 10.0.0.2/32\n\
         PrivateKey = CLIENT-PRIV\n\
         DNS = 1.1.1.1\n\
         \n\
         [Peer]\n\
         PublicKey = SERVER-PUB\n\
         Endpoint = 203.0.113.7:51820\n\
         AllowedIPs = 0.0.0.0/0\n\
         PersistentKeepalive = 20\n"
    );
}

#[test]
fn client_file_without_dns() {
    let (_d, _scratch, store) = open_store();
    let fields = ClientFields {
        address_cidr: "10.0.0.3/32",
        private_key: "CLIENT-PRIV",
        server_public_key: "SERVER-PUB",
        endpoint: "203.0.113.7:51820",
    };
    let path = store.write_client_file("phone", &fields, None).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("DNS"));
    assert!(text.contains("PersistentKeepalive = 20\n"));
}

#[cfg(unix)]
#[test]
fn file_modes_follow_the_fleet_convention() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, _scratch, store) = open_store();
    seed_wg0(&store);
    let fields = ClientFields {
        address_cidr: "10.0.0.2/32",
        private_key: "CLIENT-PRIV",
        server_public_key: "SERVER-PUB",
        endpoint: "203.0.113.7:51820",
    };
    let client = store.write_client_file("laptop", &fields, None).unwrap();
    let server_mode = fs::metadata(dir.path().join("wg0.conf")).unwrap().permissions().mode();
    let client_mode = fs::metadata(&client).unwrap().permissions().mode();
    assert_eq!(server_mode & 0o777, 0o700);
    assert_eq!(client_mode & 0o777, 0o664);
}

#[test]
fn parse_server_round_trips_created_content() {
    let (_d, _s, store) = open_store();
    seed_wg0(&store);
    store.append_peer("wg0", "PUB-A", "10.0.0.2/32").unwrap();
    store.append_peer("wg0", "PUB-B", "10.0.0.3/32").unwrap();
    let parsed = store.parse_server("wg0").unwrap();
    assert_eq!(parsed.private_key.as_deref(), Some("SERVER-PRIV"));
    assert_eq!(parsed.listen_port, Some(51820));
    assert_eq!(parsed.peer_count(), 2);
    assert!(parsed.claims_address("10.0.0.2/32"));
    assert!(parsed.claims_address("10.0.0.3/32"));
    assert!(!parsed.claims_address("10.0.0.4/32"));
}

#[test]
fn read_lines_missing_config_is_not_found() {
    let (_d, _s, store) = open_store();
    assert!(matches!(
        store.read_lines("wg8"),
        Err(Error::ConfigNotFound(ref s)) if s == "wg8"
    ));
}

#[test]
fn lock_excludes_a_second_run_until_dropped() {
    let (_d, _s, store) = open_store();
    let guard = store.lock().unwrap();
    assert!(matches!(store.lock(), Err(Error::StoreLocked(_))));
    drop(guard);
    store.lock().unwrap();
}

#[test]
fn lock_error_names_the_file_to_remove() {
    let (_d, _s, store) = open_store();
    let _guard = store.lock().unwrap();
    let err = store.lock().unwrap_err();
    assert!(err.to_string().contains(".wirewizard.lock"));
}

#[test]
fn lock_file_never_shows_up_in_listings() {
    let (_d, _s, store) = open_store();
    seed_wg0(&store);
    let _guard = store.lock().unwrap();
    assert_eq!(store.list_server_files().unwrap(), vec!["wg0.conf"]);
}
