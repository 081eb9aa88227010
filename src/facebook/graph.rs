use crate::config::FacebookConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Graph error code for an expired or revoked access token
pub const TOKEN_INVALID_CODE: i64 = 190;

/// Friends requested per call; paging is not followed
const FRIENDS_LIMIT: &str = "5000";

/// Errors returned by the Graph API client
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph answered with an `error` object
    #[error("Graph API error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        kind: Option<String>,
    },

    /// Request never produced a response
    #[error("Graph API request failed: {0}")]
    Transport(reqwest::Error),

    /// Response body was not what the endpoint documents
    #[error("Unexpected Graph API response: {0}")]
    Decode(String),
}

impl GraphError {
    /// Token expired or revoked; the stored token must be dropped
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, GraphError::Api { code, .. } if *code == TOKEN_INVALID_CODE)
    }

    /// Graph error code, when the failure came from Graph itself
    pub fn code(&self) -> Option<i64> {
        match self {
            GraphError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Message suitable for sync attempt rows and API responses
    pub fn message(&self) -> String {
        match self {
            GraphError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// JSON summary stored as the raw response of a failed attempt
    pub fn to_json(&self) -> Value {
        match self {
            GraphError::Api {
                code,
                message,
                kind,
            } => json!({ "message": message, "type": kind, "code": code }),
            other => json!({ "message": other.to_string() }),
        }
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the access token
        GraphError::Transport(err.without_url())
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: i64,
}

/// One entry of `/me/friends`
#[derive(Debug, Clone, Deserialize)]
pub struct GraphFriend {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `/me/friends` page; only friends who also use the app are listed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendList {
    #[serde(default)]
    pub data: Vec<GraphFriend>,
}

impl FriendList {
    pub fn ids(&self) -> Vec<String> {
        self.data.iter().map(|f| f.id.clone()).collect()
    }
}

/// Result of exchanging a short-lived token
#[derive(Debug, Clone, Deserialize)]
pub struct LongLivedToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Thin client over the Facebook Graph API
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    version: String,
    app_id: String,
    app_secret: String,
}

impl GraphClient {
    /// Create a new client from Facebook settings
    pub fn new(config: &FacebookConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.graph_url.trim_end_matches('/').to_string(),
            version: config.graph_version.clone(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.version, path)
    }

    /// Fetch the caller's friends who also use the app
    pub async fn fetch_friends(&self, access_token: &str) -> Result<FriendList, GraphError> {
        let response = self
            .http
            .get(self.endpoint("me/friends"))
            .query(&[("limit", FRIENDS_LIMIT), ("access_token", access_token)])
            .send()
            .await?;

        let friends: FriendList = Self::decode(response).await?;
        debug!("Graph returned {} friends", friends.data.len());
        Ok(friends)
    }

    /// Exchange a short-lived user token for a long-lived one (about 60 days)
    pub async fn exchange_token(&self, short_lived_token: &str) -> Result<LongLivedToken, GraphError> {
        if self.app_id.is_empty() || self.app_secret.is_empty() {
            return Err(GraphError::Decode(
                "Facebook app credentials are not configured".to_string(),
            ));
        }

        let response = self
            .http
            .get(self.endpoint("oauth/access_token"))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("fb_exchange_token", short_lived_token),
            ])
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Graph reports failures as `{"error": {...}}`, usually with a 4xx status
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GraphError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GraphError::Decode(e.without_url().to_string()))?;

        if let Some(error) = body.get("error") {
            let error: GraphErrorBody = serde_json::from_value(error.clone())
                .map_err(|e| GraphError::Decode(e.to_string()))?;
            warn!("Graph API error {}: {}", error.code, error.message);
            return Err(GraphError::Api {
                code: error.code,
                message: error.message,
                kind: error.kind,
            });
        }

        if !status.is_success() {
            return Err(GraphError::Decode(format!("HTTP {}", status.as_u16())));
        }

        serde_json::from_value(body).map_err(|e| GraphError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GraphClient {
        GraphClient::new(&FacebookConfig {
            app_id: "app".to_string(),
            app_secret: "secret".to_string(),
            graph_url: server.uri(),
            graph_version: "v18.0".to_string(),
        })
    }

    #[tokio::test]
    async fn test_fetch_friends_parses_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v18.0/me/friends"))
            .and(query_param("limit", "5000"))
            .and(query_param("access_token", "short"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "10", "name": "Ann" }, { "id": "11" }],
                "summary": { "total_count": 250 }
            })))
            .mount(&server)
            .await;

        let friends = client_for(&server).fetch_friends("short").await.unwrap();
        assert_eq!(friends.ids(), vec!["10".to_string(), "11".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_token_is_recognized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v18.0/me/friends"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "Error validating access token: Session has expired",
                    "type": "OAuthException",
                    "code": 190
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_friends("stale").await.unwrap_err();
        assert!(err.is_token_invalid());
        assert_eq!(err.code(), Some(190));
        assert_eq!(err.to_json()["type"], "OAuthException");
    }

    #[tokio::test]
    async fn test_other_api_errors_keep_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Application request limit reached", "code": 4 }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_friends("t").await.unwrap_err();
        assert!(!err.is_token_invalid());
        assert_eq!(err.message(), "Application request limit reached");
    }

    #[tokio::test]
    async fn test_exchange_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v18.0/oauth/access_token"))
            .and(query_param("grant_type", "fb_exchange_token"))
            .and(query_param("fb_exchange_token", "short"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "long",
                "token_type": "bearer",
                "expires_in": 5183944
            })))
            .mount(&server)
            .await;

        let token = client_for(&server).exchange_token("short").await.unwrap();
        assert_eq!(token.access_token, "long");
        assert_eq!(token.expires_in, Some(5183944));
    }

    #[tokio::test]
    async fn test_exchange_requires_app_credentials() {
        let client = GraphClient::new(&FacebookConfig::default());
        assert!(client.exchange_token("short").await.is_err());
    }
}
