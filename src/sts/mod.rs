use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    dispatch::{Dispatch, Params},
    errors::{Error, Result},
    utils::rfc3339,
    Context,
};

/// Supported version of the STS API.
/// ref. <https://docs.aws.amazon.com/STS/latest/APIReference/Welcome.html>
pub const API_VERSION: &str = "2011-06-15";

/// Implements the STS manager on top of a signed request executor.
#[derive(Clone)]
pub struct Manager {
    pub region: String,
    context: Arc<Context>,
    dispatcher: Arc<dyn Dispatch>,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl Manager {
    /// Creates a manager over the shared context and executor. Restores the
    /// original key pair into the context so this manager's requests are
    /// signed with the long-lived credentials even after a prior
    /// assume-role result has been merged back into the client.
    pub fn new(context: Arc<Context>, dispatcher: Arc<dyn Dispatch>) -> Self {
        context.restore_base_credentials();
        Self {
            region: context.region.clone(),
            context,
            dispatcher,
        }
    }

    /// Returns the shared client context.
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Assumes an IAM role and returns the temporary credentials scoped to
    /// it. When "session_name" is absent a random one is generated; an
    /// "external_id" is forwarded verbatim only when provided. The returned
    /// record is the caller's to store, refresh or discard.
    /// ref. <https://docs.aws.amazon.com/STS/latest/APIReference/API_AssumeRole.html>
    pub async fn assume_role(
        &self,
        role_arn: &str,
        session_name: Option<&str>,
        external_id: Option<&str>,
    ) -> Result<AssumedRoleCredentials> {
        if role_arn.is_empty() {
            return Err(Error::Other {
                message: String::from("empty role ARN"),
                retryable: false,
            });
        }

        log::info!("assuming role '{role_arn}' in region '{}'", self.region);
        let params = assume_role_params(role_arn, session_name, external_id);
        let body = self.dispatcher.dispatch("/", &params).await?;

        let envelope: AssumeRoleEnvelope =
            serde_json::from_value(body).map_err(|e| Error::Response {
                message: format!("failed to decode AssumeRole response ({e})"),
            })?;
        let result = envelope.response.result;

        Ok(AssumedRoleCredentials {
            access_key_id: result.credentials.access_key_id,
            secret_access_key: result.credentials.secret_access_key,
            session_token: result.credentials.session_token,
            expiration: result.credentials.expiration,
            assumed_role_arn: result.assumed_role_user.arn,
            assumed_role_id: result.assumed_role_user.assumed_role_id,
        })
    }

    /// Queries the caller identity bound to the base credentials.
    /// ref. <https://docs.aws.amazon.com/STS/latest/APIReference/API_GetCallerIdentity.html>
    pub async fn get_identity(&self) -> Result<Identity> {
        log::info!("fetching STS caller identity");
        let mut params = Params::new();
        params.insert(String::from("Action"), String::from("GetCallerIdentity"));
        params.insert(String::from("Version"), String::from(API_VERSION));

        let body = self.dispatcher.dispatch("/", &params).await?;

        let envelope: GetCallerIdentityEnvelope =
            serde_json::from_value(body).map_err(|e| Error::Response {
                message: format!("failed to decode GetCallerIdentity response ({e})"),
            })?;
        let result = envelope.response.result;

        Ok(Identity::new(
            &result.account,
            &result.arn,
            &result.user_id,
        ))
    }
}

/// Builds the AssumeRole parameter set.
fn assume_role_params(
    role_arn: &str,
    session_name: Option<&str>,
    external_id: Option<&str>,
) -> Params {
    let mut params = Params::new();
    params.insert(String::from("Action"), String::from("AssumeRole"));
    params.insert(String::from("Version"), String::from(API_VERSION));
    params.insert(String::from("RoleArn"), String::from(role_arn));
    params.insert(
        String::from("RoleSessionName"),
        session_name.map_or_else(generate_session_name, String::from),
    );
    if let Some(id) = external_id {
        params.insert(String::from("ExternalId"), String::from(id));
    }
    params
}

/// Generates a session name when the caller does not provide one.
/// Alphanumeric only, so it carries no separator characters.
fn generate_session_name() -> String {
    random_manager::secure_string(32)
}

/// Represents the temporary credentials of an assumed-role session,
/// together with the assumed-role session identity.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct AssumedRoleCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[serde(with = "rfc3339::serde_format")]
    pub expiration: DateTime<Utc>,
    pub assumed_role_arn: String,
    pub assumed_role_id: String,
}

/// Represents the caller identity.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct Identity {
    pub account_id: String,
    pub role_arn: String,
    pub user_id: String,
}

impl Identity {
    pub fn new(account_id: &str, role_arn: &str, user_id: &str) -> Self {
        // ref. <https://doc.rust-lang.org/1.0.0/style/ownership/constructors.html>
        Self {
            account_id: String::from(account_id),
            role_arn: String::from(role_arn),
            user_id: String::from(user_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssumeRoleEnvelope {
    #[serde(rename = "AssumeRoleResponse")]
    response: AssumeRoleResponse,
}

#[derive(Debug, Deserialize)]
struct AssumeRoleResponse {
    #[serde(rename = "AssumeRoleResult")]
    result: AssumeRoleResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResult {
    credentials: SessionCredentials,
    assumed_role_user: AssumedRoleUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionCredentials {
    session_token: String,
    secret_access_key: String,
    access_key_id: String,
    #[serde(deserialize_with = "rfc3339::serde_format::deserialize")]
    expiration: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumedRoleUser {
    arn: String,
    assumed_role_id: String,
}

#[derive(Debug, Deserialize)]
struct GetCallerIdentityEnvelope {
    #[serde(rename = "GetCallerIdentityResponse")]
    response: GetCallerIdentityResponse,
}

#[derive(Debug, Deserialize)]
struct GetCallerIdentityResponse {
    #[serde(rename = "GetCallerIdentityResult")]
    result: GetCallerIdentityResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityResult {
    account: String,
    arn: String,
    user_id: String,
}
