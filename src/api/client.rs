//! HTTP client for the third-party Instagram API provider.

use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::types::*;
use crate::error::{Error, Result};

/// Provider base URL.
const API_BASE: &str = "https://v1.rocketapi.io/instagram";

/// Per-request deadline. Generous on purpose; there is no retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1000);

/// One credentialed client instance for the API provider.
///
/// Requests are blocking; each logical operation is a typed method, so call
/// sites are verified at compile time instead of dispatching by name.
pub struct RocketClient {
    http: Client,
    token: String,
}

impl RocketClient {
    pub fn new(token: String, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, token })
    }

    /// Issue one provider request and unwrap the response envelope.
    fn call<T: DeserializeOwned>(&self, endpoint: &str, params: serde_json::Value) -> Result<T> {
        let url = format!("{}/{}", API_BASE, endpoint);
        tracing::debug!("POST {} {}", url, params);

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, format!("Token {}", self.token))
            .json(&params)
            .send()?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(60));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(Error::Remote(format!("{}: HTTP {}", endpoint, status)));
        }

        let text = response.text()?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
            Error::Remote(format!(
                "Failed to parse {} response: {} - Response: {}",
                endpoint,
                e,
                &text[..text.len().min(500)]
            ))
        })?;

        if envelope.response.status_code == Some(404) {
            return Err(Error::AccountNotFound(endpoint.to_string()));
        }
        if envelope.status != "done" {
            return Err(Error::Remote(format!(
                "{}: provider status '{}'",
                endpoint, envelope.status
            )));
        }

        Ok(envelope.response.body)
    }

    /// Resolve a username to its lookup payload (contains the numeric id).
    pub fn lookup_user(&self, username: &str) -> Result<UserLookupPayload> {
        self.call("user/get_info", json!({ "username": username }))
            .map_err(|e| match e {
                Error::AccountNotFound(_) => Error::AccountNotFound(username.to_string()),
                e => e,
            })
    }

    /// Full profile for a numeric user id.
    pub fn fetch_profile(&self, user_id: u64) -> Result<ProfilePayload> {
        self.call("user/get_info_by_id", json!({ "id": user_id }))
            .map_err(|e| match e {
                Error::AccountNotFound(_) => Error::AccountNotFound(user_id.to_string()),
                e => e,
            })
    }

    /// One page of an account's posts.
    pub fn fetch_media_page(
        &self,
        user_id: u64,
        count: usize,
        max_id: Option<&str>,
    ) -> Result<MediaPagePayload> {
        self.call("user/get_media", page_params(user_id, count, max_id))
    }

    /// The account's live story reel.
    pub fn fetch_stories(&self, user_id: u64) -> Result<StoriesPayload> {
        self.call("user/get_stories", json!({ "id": user_id }))
    }

    /// Index of the account's highlight reels.
    pub fn fetch_highlight_index(&self, user_id: u64) -> Result<HighlightIndexPayload> {
        self.call("user/get_highlights", json!({ "id": user_id }))
    }

    /// Stories belonging to one highlight reel.
    pub fn fetch_highlight_stories(&self, highlight_id: &str) -> Result<StoriesPayload> {
        self.call("highlight/get_stories", json!({ "id": highlight_id }))
    }

    /// One page of the account's followers.
    pub fn fetch_followers_page(
        &self,
        user_id: u64,
        count: usize,
        max_id: Option<&str>,
    ) -> Result<FollowPagePayload> {
        self.call("user/get_followers", page_params(user_id, count, max_id))
    }

    /// One page of the accounts the user follows.
    pub fn fetch_following_page(
        &self,
        user_id: u64,
        count: usize,
        max_id: Option<&str>,
    ) -> Result<FollowPagePayload> {
        self.call("user/get_following", page_params(user_id, count, max_id))
    }
}

fn page_params(user_id: u64, count: usize, max_id: Option<&str>) -> serde_json::Value {
    let mut params = json!({ "id": user_id, "count": count });
    if let Some(max_id) = max_id {
        params["max_id"] = json!(max_id);
    }
    params
}

/// A set of credentialed client instances sharing the request load.
///
/// Call sites pick a random instance per request; requests are never issued
/// concurrently.
pub struct ClientPool {
    clients: Vec<RocketClient>,
}

impl ClientPool {
    /// Build one client per token.
    pub fn new(tokens: &[String], user_agent: &str) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::MissingConfig("account.tokens".to_string()));
        }

        let clients = tokens
            .iter()
            .map(|token| RocketClient::new(token.clone(), user_agent))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clients })
    }

    /// A random instance, to spread requests across tokens.
    pub fn pick(&self) -> &RocketClient {
        let index = rand::thread_rng().gen_range(0..self.clients.len());
        &self.clients[index]
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
