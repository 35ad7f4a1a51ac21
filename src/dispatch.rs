use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

/// Query parameters of a signed service request, ordered by key.
pub type Params = BTreeMap<String, String>;

/// Executes signed requests against the service endpoint.
///
/// Implementations own request signing, transport, timeouts and retry
/// policy. Requests are signed with the base credentials held by the shared
/// [`Context`](crate::Context), never with temporary keys handed back by a
/// prior exchange. The response body is returned parsed into a nested
/// key-value structure; transport, authentication and service failures map
/// to [`Error::API`](crate::errors::Error::API) with the executor's own
/// retryable classification.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Sends the parameter set to "path" and returns the parsed body.
    async fn dispatch(&self, path: &str, params: &Params) -> Result<Value>;
}
