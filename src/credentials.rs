use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::rfc3339;

/// Represents the credential state used to authenticate service requests.
/// Long-lived key pairs carry no session token and no expiration; temporary
/// keys issued by STS carry both.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rfc3339::serialize",
        deserialize_with = "rfc3339::deserialize"
    )]
    pub expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        // ref. <https://doc.rust-lang.org/1.0.0/style/ownership/constructors.html>
        Self {
            access_key_id: String::from(access_key_id),
            secret_access_key: String::from(secret_access_key),
            session_token: None,
            expiration: None,
        }
    }
}

/// Represents the original long-lived key pair, captured before any role
/// assumption has replaced the credential state.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct BaseCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Captures the original key pair the first time it is seen and restores it
/// on every later call, so STS exchanges are never signed with temporary
/// keys handed back by a prior assume-role exchange.
///
/// The cell is owned by the client [`Context`](crate::Context) rather than
/// being process-global, so its lifecycle is explicit; sharing the context
/// across manager instances gives the same first-write-wins behavior.
#[derive(Debug, Default)]
pub struct BaseCredentialCache {
    base: OnceLock<BaseCredentials>,
}

impl BaseCredentialCache {
    pub fn new() -> Self {
        Self {
            base: OnceLock::new(),
        }
    }

    /// Merges the captured base key pair into "creds" in place, capturing
    /// it from "creds" first if nothing has been captured yet. Fields other
    /// than the key pair are left untouched. Never fails; concurrent first
    /// use initializes the cell at most once.
    pub fn restore(&self, creds: &mut Credentials) -> BaseCredentials {
        let base = self.base.get_or_init(|| BaseCredentials {
            access_key_id: creds.access_key_id.clone(),
            secret_access_key: creds.secret_access_key.clone(),
        });

        creds.access_key_id = base.access_key_id.clone();
        creds.secret_access_key = base.secret_access_key.clone();

        base.clone()
    }

    /// Returns the captured key pair, if any.
    pub fn get(&self) -> Option<&BaseCredentials> {
        self.base.get()
    }
}
