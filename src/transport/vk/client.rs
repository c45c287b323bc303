//! HTTP client for the VK method API and long-poll checks.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    dto::message::Reply,
    transport::{Messenger, TransportError},
};

use super::{
    error::{VkError, VkResult},
    models::{Envelope, Group, GroupsResponse, LongPollServer, PollResponse, UserProfile},
};

/// Extra time granted to an `a_check` request on top of its `wait` parameter.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Thin VK API client authenticated with a community token.
#[derive(Clone)]
pub struct VkClient {
    client: Client,
    base_url: Arc<str>,
    token: Arc<str>,
    version: Arc<str>,
}

impl VkClient {
    /// Client for the method API at `base_url`, authenticated with `token`.
    pub fn new(base_url: &str, token: &str, version: &str) -> VkResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| VkError::ClientBuilder { source })?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: Arc::from(token),
            version: Arc::from(version),
        })
    }

    /// Invoke an API method and unwrap its response envelope.
    async fn call<T>(&self, method: &'static str, params: &[(&str, String)]) -> VkResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .post(url)
            .query(&[("access_token", &*self.token), ("v", &*self.version)])
            .form(params)
            .send()
            .await
            .map_err(|source| VkError::RequestSend { method, source })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(VkError::RequestStatus { method, status });
        }

        let envelope = response
            .json::<Envelope<T>>()
            .await
            .map_err(|source| VkError::DecodeResponse { method, source })?;

        match envelope {
            Envelope {
                error: Some(error), ..
            } => Err(VkError::Api {
                method,
                code: error.error_code,
                message: error.error_msg,
            }),
            Envelope {
                response: Some(response),
                ..
            } => Ok(response),
            _ => Err(VkError::EmptyEnvelope { method }),
        }
    }

    /// The community the token belongs to.
    pub async fn own_group(&self) -> VkResult<Group> {
        let response: GroupsResponse = self.call("groups.getById", &[]).await?;
        response.groups.into_iter().next().ok_or(VkError::NoGroup)
    }

    /// Fresh Bots Long Poll server, key and cursor for `group_id`.
    pub async fn long_poll_server(&self, group_id: i64) -> VkResult<LongPollServer> {
        self.call(
            "groups.getLongPollServer",
            &[("group_id", group_id.to_string())],
        )
        .await
    }

    /// Wait up to `wait` for events after `ts` on a Bots Long Poll server.
    pub async fn poll(
        &self,
        server: &LongPollServer,
        ts: &str,
        wait: Duration,
    ) -> VkResult<PollResponse> {
        const METHOD: &str = "a_check";
        let wait_secs = wait.as_secs().to_string();
        let response = self
            .client
            .get(&server.server)
            .query(&[
                ("act", METHOD),
                ("key", server.key.as_str()),
                ("ts", ts),
                ("wait", wait_secs.as_str()),
            ])
            .timeout(wait + POLL_GRACE)
            .send()
            .await
            .map_err(|source| VkError::RequestSend {
                method: METHOD,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VkError::RequestStatus {
                method: METHOD,
                status,
            });
        }

        response
            .json::<PollResponse>()
            .await
            .map_err(|source| VkError::DecodeResponse {
                method: METHOD,
                source,
            })
    }

    /// Screen name of `user_id`, falling back to "First Last".
    pub async fn user_display_name(&self, user_id: i64) -> Result<String, TransportError> {
        let profiles: Vec<UserProfile> = self
            .call(
                "users.get",
                &[
                    ("user_ids", user_id.to_string()),
                    ("fields", "screen_name".to_owned()),
                ],
            )
            .await?;
        profiles
            .first()
            .map(UserProfile::display_name)
            .ok_or(TransportError::UnknownUser(user_id))
    }

    /// Send `reply` to `peer_id`, returning the new message id.
    pub async fn send_message(&self, peer_id: i64, reply: &Reply) -> VkResult<i64> {
        let mut params = vec![
            ("peer_id", peer_id.to_string()),
            ("message", reply.text.clone()),
            ("random_id", rand::random::<i32>().to_string()),
        ];
        if let Some(keyboard) = &reply.keyboard {
            let json = keyboard
                .to_json()
                .map_err(|source| VkError::EncodeKeyboard { source })?;
            params.push(("keyboard", json));
        }

        let message_id = self.call("messages.send", &params).await?;
        debug!(peer_id, message_id, "message sent");
        Ok(message_id)
    }
}

impl Messenger for VkClient {
    fn send(&self, peer_id: i64, reply: Reply) -> BoxFuture<'static, Result<(), TransportError>> {
        let client = self.clone();
        Box::pin(async move {
            client.send_message(peer_id, &reply).await?;
            Ok(())
        })
    }

    fn display_name(&self, user_id: i64) -> BoxFuture<'static, Result<String, TransportError>> {
        let client = self.clone();
        Box::pin(async move { client.user_display_name(user_id).await })
    }
}
