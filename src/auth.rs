use crate::config::SupabaseConfig;
use crate::error::{AppError, AppResult};
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Extract the bearer token from an `Authorization` header
///
/// # Returns
/// * `Ok(&str)` - The token without the `Bearer ` prefix
/// * `Err(AppError::Unauthorized)` - Header missing, empty or not a bearer credential
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    // Scheme names are case-insensitive
    let token = match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") => token.trim(),
        _ => {
            return Err(AppError::Unauthorized(
                "Invalid authorization header".to_string(),
            ))
        }
    };

    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing authorization header".to_string()));
    }

    Ok(token)
}

/// Require the caller to present the service-role key
pub fn require_service_role(headers: &HeaderMap, service_role_key: &str) -> AppResult<()> {
    let token = bearer_token(headers)?;

    if service_role_key.is_empty() {
        warn!("Service-role request rejected: SUPABASE_SERVICE_ROLE_KEY is not configured");
        return Err(AppError::Unauthorized(
            "Unauthorized - service role required".to_string(),
        ));
    }

    // Compare digests, not the raw keys
    let presented = Sha256::digest(token.as_bytes());
    let expected = Sha256::digest(service_role_key.as_bytes());

    if presented != expected {
        return Err(AppError::Unauthorized(
            "Unauthorized - service role required".to_string(),
        ));
    }

    Ok(())
}

/// Authenticated end user resolved from a Supabase JWT
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves user JWTs through the Supabase auth endpoint
#[derive(Clone)]
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseAuthClient {
    pub fn new(config: &SupabaseConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let api_key = if config.anon_key.is_empty() {
            config.service_role_key.clone()
        } else {
            config.anon_key.clone()
        };

        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Resolve the user behind a JWT (`GET /auth/v1/user`)
    pub async fn get_user(&self, jwt: &str) -> AppResult<AuthUser> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(jwt)
            .send()
            .await
            .map_err(|e| {
                warn!("Auth lookup failed: {}", e);
                AppError::ExternalService("Authentication service unavailable".to_string())
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }

        response
            .json::<AuthUser>()
            .await
            .map_err(|_| AppError::Unauthorized("Unauthorized".to_string()))
    }

    /// Resolve the user behind the request's bearer token
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthUser> {
        let jwt = bearer_token(headers)?;
        self.get_user(jwt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")).unwrap(), "abc");
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers_with("Bearer ")).is_err());
        assert_eq!(bearer_token(&headers_with("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        for value in ["abc", "Basic YWRtaW46c2VjcmV0", "Token abc", "Bearerabc"] {
            let err = bearer_token(&headers_with(value)).unwrap_err();
            assert_eq!(err.status_code(), 401);
            assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid authorization header"));
        }
    }

    #[test]
    fn test_service_role_requires_exact_key() {
        assert!(require_service_role(&headers_with("Bearer service-key"), "service-key").is_ok());
        assert!(require_service_role(&headers_with("Bearer service-ke"), "service-key").is_err());
        assert!(require_service_role(&headers_with("Bearer anything"), "").is_err());

        let err = require_service_role(&HeaderMap::new(), "service-key").unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_get_user_resolves_id() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header_eq("apikey", "anon"))
            .and(header_eq("authorization", "Bearer user-jwt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": user_id, "email": "a@school.edu" })),
            )
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&SupabaseConfig {
            url: server.uri(),
            service_role_key: "service".to_string(),
            anon_key: "anon".to_string(),
        });

        let user = client.get_user("user-jwt").await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn test_rejected_jwt_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "bad jwt" })))
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&SupabaseConfig {
            url: server.uri(),
            ..Default::default()
        });

        let err = client.get_user("expired").await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
