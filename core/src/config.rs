//! Transport configuration.
//!
//! The only knob is the default client identity. Everything about timeouts,
//! retries and trust evaluation belongs to the native transport.

use serde::{Deserialize, Serialize};

/// Environment variable read by `TransportConfig::from_env`.
pub const IDENTITY_SUBJECT_ENV: &str = "ROUNDTRIP_IDENTITY_SUBJECT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Subject name of the client certificate presented to servers that ask
    /// for one. `None` and `""` both mean no client certificate.
    pub identity_subject_name: Option<String>,
}

impl TransportConfig {
    pub fn with_identity_subject(subject: impl Into<String>) -> Self {
        Self {
            identity_subject_name: Some(subject.into()),
        }
    }

    pub fn from_env() -> Self {
        Self {
            identity_subject_name: std::env::var(IDENTITY_SUBJECT_ENV).ok(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The configured subject, with the empty string normalized away.
    pub fn identity_subject(&self) -> Option<&str> {
        self.identity_subject_name.as_deref().filter(|s| !s.is_empty())
    }
}
