//! Structured logging, security events and metrics.
//!
//! Secret values never pass through here; callers log sources, lengths
//! and paths only.

use tracing_subscriber::EnvFilter;

/// Security-relevant events in the credential pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// The placeholder encryption key was handed out.
    PlaceholderKeyInUse,
    /// Strict mode refused the placeholder encryption key.
    PlaceholderKeyRejected,
    /// The `.env` file exists but could not be read.
    ConfigUnreadable,
    /// A model token failed authentication or decoding.
    DecryptionFailed,
    LicenseAccepted,
    LicenseRejected,
}

impl SecurityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEvent::PlaceholderKeyInUse => "placeholder_key_in_use",
            SecurityEvent::PlaceholderKeyRejected => "placeholder_key_rejected",
            SecurityEvent::ConfigUnreadable => "config_unreadable",
            SecurityEvent::DecryptionFailed => "decryption_failed",
            SecurityEvent::LicenseAccepted => "license_accepted",
            SecurityEvent::LicenseRejected => "license_rejected",
        }
    }

    fn level(&self) -> tracing::Level {
        match self {
            SecurityEvent::LicenseAccepted => tracing::Level::INFO,
            SecurityEvent::PlaceholderKeyInUse
            | SecurityEvent::ConfigUnreadable
            | SecurityEvent::LicenseRejected => tracing::Level::WARN,
            SecurityEvent::PlaceholderKeyRejected | SecurityEvent::DecryptionFailed => {
                tracing::Level::ERROR
            }
        }
    }
}

impl std::fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit a security event on the `ava::security` target.
pub fn log_security_event(event: SecurityEvent, message: &str, fields: &[(&str, &str)]) {
    let details = format_fields(fields);
    let level = event.level();
    if level == tracing::Level::ERROR {
        tracing::error!(target: "ava::security", event = event.as_str(), details = %details, "{}", message);
    } else if level == tracing::Level::WARN {
        tracing::warn!(target: "ava::security", event = event.as_str(), details = %details, "{}", message);
    } else {
        tracing::info!(target: "ava::security", event = event.as_str(), details = %details, "{}", message);
    }
}

fn format_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count one model decryption attempt.
pub fn record_decryption(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("ava_model_decrypt_total", "outcome" => outcome).increment(1);
}

/// Count one hand-out of the placeholder key.
pub fn record_placeholder_key() {
    metrics::counter!("ava_placeholder_key_total").increment(1);
}

/// Count one licence check.
pub fn record_license_check(valid: bool) {
    let outcome = if valid { "valid" } else { "invalid" };
    metrics::counter!("ava_license_checks_total", "outcome" => outcome).increment(1);
}

/// Install the global tracing subscriber on stderr.
///
/// Filter comes from `RUST_LOG`, defaulting to `warn`. Calling this twice
/// is harmless; the second install is ignored.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
