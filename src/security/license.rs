//! Device-bound licence checks.
//!
//! The licence key for a machine is the SHA-256 hex digest of its 48-bit
//! hardware node identifier in decimal. This is a weak, offline scheme:
//! anyone on the machine can compute the key.

use sha2::{Digest, Sha256};

use crate::telemetry::{self, log_security_event, SecurityEvent};

/// Multicast bit of a 48-bit node id; set on ids not taken from hardware.
const MULTICAST_BIT: u64 = 1 << 40;
const NODE_MASK: u64 = (1 << 48) - 1;

/// 48-bit node identifier of this machine.
///
/// Uses the first hardware MAC address. Without one, derives a stable id
/// from the hostname and marks it with the multicast bit.
pub fn node_id() -> u64 {
    match mac_address::get_mac_address() {
        Ok(Some(mac)) => mac_to_node(mac.bytes()),
        Ok(None) => {
            tracing::debug!("No network interface with a MAC address, using hostname node id");
            hostname_node()
        }
        Err(e) => {
            tracing::warn!(error = %e, "MAC address lookup failed, using hostname node id");
            hostname_node()
        }
    }
}

fn mac_to_node(bytes: [u8; 6]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

fn hostname_node() -> u64 {
    let name = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_default();
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 6];
    bytes.copy_from_slice(&digest[..6]);
    (mac_to_node(bytes) & NODE_MASK) | MULTICAST_BIT
}

/// Licence fingerprint for a node id.
pub fn fingerprint(node: u64) -> String {
    hex::encode(Sha256::digest(node.to_string().as_bytes()))
}

/// Fingerprint of this machine.
pub fn device_id() -> String {
    fingerprint(node_id())
}

/// True iff `key` is this machine's fingerprint. Recomputed on every call.
pub fn validate_license(key: &str) -> bool {
    let expected = device_id();
    let valid = constant_time_compare(key.as_bytes(), expected.as_bytes());
    telemetry::record_license_check(valid);
    if valid {
        log_security_event(SecurityEvent::LicenseAccepted, "Licence key matches device", &[]);
    } else {
        let candidate_len = key.len().to_string();
        log_security_event(
            SecurityEvent::LicenseRejected,
            "Licence key does not match device",
            &[("candidate_len", candidate_len.as_str())],
        );
    }
    valid
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[path = "license_tests.rs"]
mod tests;
