pub mod credentials;
pub mod dispatch;
pub mod errors;
pub mod sts;
pub mod utils;

use std::{
    env,
    sync::{Arc, Mutex},
};

use crate::{
    credentials::{BaseCredentialCache, BaseCredentials, Credentials},
    errors::{Error, Result},
};

/// Fallback region when none is configured.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Shared client context: the region plus the credential state the signed
/// request executor authenticates with. Share one context (via "Arc")
/// across all manager instances of a process so the original key pair is
/// captured exactly once.
#[derive(Debug)]
pub struct Context {
    pub region: String,
    credentials: Mutex<Credentials>,
    base: BaseCredentialCache,
}

impl Context {
    pub fn new(region: &str, credentials: Credentials) -> Self {
        Self {
            region: String::from(region),
            credentials: Mutex::new(credentials),
            base: BaseCredentialCache::new(),
        }
    }

    /// Restores the original key pair into the held credentials, capturing
    /// it on first use. Service managers call this on construction so the
    /// executor never signs with temporary keys from a prior exchange.
    pub fn restore_base_credentials(&self) -> BaseCredentials {
        let mut creds = self.credentials.lock().expect("poisoned credentials lock");
        self.base.restore(&mut creds)
    }

    /// Returns a snapshot of the current credential state.
    pub fn credentials(&self) -> Credentials {
        self.credentials
            .lock()
            .expect("poisoned credentials lock")
            .clone()
    }

    /// Overwrites the credential state, e.g. after the caller merges an
    /// assume-role result back into the client.
    pub fn replace_credentials(&self, creds: Credentials) {
        *self.credentials.lock().expect("poisoned credentials lock") = creds;
    }

    /// Returns the captured base key pair, if one has been captured yet.
    pub fn base_credentials(&self) -> Option<BaseCredentials> {
        self.base.get().cloned()
    }
}

/// Loads a client context from default environments.
///
/// The region resolves from the argument, then "AWS_REGION", then
/// "AWS_DEFAULT_REGION", then [`DEFAULT_REGION`]. Key material comes from
/// "AWS_ACCESS_KEY_ID"/"AWS_SECRET_ACCESS_KEY" with an optional
/// "AWS_SESSION_TOKEN".
pub fn load_context(reg: Option<String>) -> Result<Arc<Context>> {
    log::info!("loading client context for region {:?}", reg);
    let region = reg
        .or_else(|| env::var("AWS_REGION").ok())
        .or_else(|| env::var("AWS_DEFAULT_REGION").ok())
        .unwrap_or_else(|| String::from(DEFAULT_REGION));

    let access_key_id = env::var("AWS_ACCESS_KEY_ID").map_err(|_| Error::Other {
        message: String::from("AWS_ACCESS_KEY_ID not set"),
        retryable: false,
    })?;
    let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| Error::Other {
        message: String::from("AWS_SECRET_ACCESS_KEY not set"),
        retryable: false,
    })?;

    let mut credentials = Credentials::new(&access_key_id, &secret_access_key);
    credentials.session_token = env::var("AWS_SESSION_TOKEN").ok();

    Ok(Arc::new(Context::new(&region, credentials)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_restore_base_credentials_survives_overwrite() {
        let ctx = Context::new("us-east-1", Credentials::new("AKIDORIGINAL", "original-secret"));
        assert_eq!(ctx.base_credentials(), None);
        let base = ctx.restore_base_credentials();
        assert_eq!(base.access_key_id, "AKIDORIGINAL");
        assert_eq!(ctx.base_credentials(), Some(base.clone()));

        // The caller merges an assume-role result back into the client.
        let mut temp = Credentials::new("ASIATEMP", "temp-secret");
        temp.session_token = Some(String::from("tok"));
        ctx.replace_credentials(temp);

        let base = ctx.restore_base_credentials();
        assert_eq!(base.access_key_id, "AKIDORIGINAL");
        assert_eq!(base.secret_access_key, "original-secret");

        let creds = ctx.credentials();
        assert_eq!(creds.access_key_id, "AKIDORIGINAL");
        assert_eq!(creds.secret_access_key, "original-secret");
        assert_eq!(creds.session_token, Some(String::from("tok")));
    }

    #[test]
    #[serial]
    fn test_load_context_from_env() {
        env::set_var("AWS_ACCESS_KEY_ID", "AKIDTEST");
        env::set_var("AWS_SECRET_ACCESS_KEY", "secret");
        env::set_var("AWS_SESSION_TOKEN", "tok");
        env::remove_var("AWS_REGION");
        env::remove_var("AWS_DEFAULT_REGION");

        let ctx = load_context(Some(String::from("us-east-1"))).unwrap();
        assert_eq!(ctx.region, "us-east-1");
        let creds = ctx.credentials();
        assert_eq!(creds.access_key_id, "AKIDTEST");
        assert_eq!(creds.secret_access_key, "secret");
        assert_eq!(creds.session_token, Some(String::from("tok")));

        env::set_var("AWS_REGION", "eu-central-1");
        let ctx = load_context(None).unwrap();
        assert_eq!(ctx.region, "eu-central-1");

        env::remove_var("AWS_REGION");
        let ctx = load_context(None).unwrap();
        assert_eq!(ctx.region, DEFAULT_REGION);

        env::remove_var("AWS_ACCESS_KEY_ID");
        env::remove_var("AWS_SECRET_ACCESS_KEY");
        env::remove_var("AWS_SESSION_TOKEN");
    }

    #[test]
    #[serial]
    fn test_load_context_missing_key_material() {
        env::remove_var("AWS_ACCESS_KEY_ID");
        env::remove_var("AWS_SECRET_ACCESS_KEY");

        let err = load_context(None).unwrap_err();
        assert!(!err.retryable());
        assert!(err.message().contains("AWS_ACCESS_KEY_ID"));
    }
}
