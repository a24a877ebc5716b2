//! Security mechanism configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for a negotiated security mechanism.
///
/// Enumerates everything the handshake needs up front: the target host and
/// service as the mechanism sees them, the mechanism identifier sent in the
/// opening message, and any mechanism-specific options by name.
///
/// # Example
///
/// ```
/// use bytewire::secure::SecurityConfig;
///
/// let config = SecurityConfig::new("db01.internal", "rpc", "GSSAPI")
///     .with_option("qop", "auth-conf");
/// assert_eq!(config.mechanism, "GSSAPI");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Server host name.
    pub host: String,
    /// Service name on the server.
    pub service: String,
    /// Mechanism identifier (e.g. "GSSAPI", "PLAIN").
    pub mechanism: String,
    /// Mechanism-specific option names and values.
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl SecurityConfig {
    /// Create a configuration with no mechanism-specific options.
    pub fn new(
        host: impl Into<String>,
        service: impl Into<String>,
        mechanism: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            service: service.into(),
            mechanism: mechanism.into(),
            options: HashMap::new(),
        }
    }

    /// Add a mechanism-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
