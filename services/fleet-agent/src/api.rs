//! Controller transport: one action-parameterised POST endpoint.
//!
//! Every failure comes back as an `ApiReply` value; callers never see an
//! `Err` from this boundary, and a dead controller never stops the loop.

use std::time::Duration;

use serde::Serialize;

use outpost_common::{AgentAction, ApiReply};

/// Header carrying the shared agent token.
pub const TOKEN_HEADER: &str = "X-Agent-Token";

/// Per-call budget, connection establishment included.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Seam between the run loop and the wire, so the loop is testable with
/// a recording stub.
#[allow(async_fn_in_trait)]
pub trait ControllerApi {
    /// POST `{base_url}?action={action}`, with an optional JSON payload.
    async fn call<P: Serialize + Sync>(&self, action: AgentAction, payload: Option<&P>)
        -> ApiReply;
}

/// Production transport over `reqwest`.
pub struct ControllerClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ControllerClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }
}

impl ControllerApi for ControllerClient {
    async fn call<P: Serialize + Sync>(
        &self,
        action: AgentAction,
        payload: Option<&P>,
    ) -> ApiReply {
        let mut request = self
            .client
            .post(&self.base_url)
            .query(&[("action", action.as_str())])
            .header(TOKEN_HEADER, &self.token);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return ApiReply::failure(transport_error(&err)),
        };

        let status = response.status();
        if !status.is_success() {
            return ApiReply::failure(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
        }

        match response.json::<ApiReply>().await {
            Ok(reply) => reply,
            Err(err) => ApiReply::failure(err.to_string()),
        }
    }
}

/// Connection-level failures keep the `URL Error:` label the controller
/// operators already grep for; anything else surfaces its own message.
fn transport_error(err: &reqwest::Error) -> String {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        format!("URL Error: {err}")
    } else {
        err.to_string()
    }
}
