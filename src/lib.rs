/* \page WireWizardOverview WireWizard Overview
WireGuard fleet provisioning components.

- Tool settings loading (`config.rs`).
- Error kinds shared across the crate (`error.rs`).
- Configuration store over the wg config directory (`store.rs`).
- Interface slot and client address allocation (`alloc.rs`).
- Per-server client census and interactive selection (`census.rs`).
- Key material generation and derivation (`keys.rs`).
- Server and client provisioning workflows (`provision.rs`).
- Public address discovery (`request.rs`).
- wg-quick and systemctl control, uplink detection (`service.rs`).
- Terminal QR rendering (`qr.rs`).
*/
pub mod alloc;
pub mod census;
pub mod config;
pub mod error;
pub mod keys;
pub mod provision;
pub mod qr;
pub mod request;
pub mod service;
pub mod store;
