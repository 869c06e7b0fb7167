//! Construction-time settings shared by every request a `Requester` issues.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ClientError;

/// Timeout and transport security for a `Requester`.
///
/// Deserializes from `{ "timeout_ms": 3000, "secure": true }`; both fields
/// are optional and default to no timeout over plaintext HTTP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Option<Duration>,
    pub secure: bool,
}

impl ClientConfig {
    pub fn new(timeout: Option<Duration>, secure: bool) -> Self {
        Self { timeout, secure }
    }

    pub fn from_json(raw: &str) -> Result<Self, ClientError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// `https` when `secure`, `http` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
