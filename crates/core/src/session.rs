//! API key session and the authorize exchange

use crate::error::{Error, Result};
use crate::http::HttpGateway;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    token: String,
}

/// Credentials of one client instance.
///
/// The outcome of [`Session::authorize`] is written once: either the bearer
/// token or the reason the service refused it. Neither is replaced afterwards.
pub struct Session {
    api_key: String,
    user_identifier: Option<String>,
    authorization: OnceLock<std::result::Result<String, String>>,
}

impl Session {
    pub fn new(api_key: impl Into<String>, user_identifier: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_identifier,
            authorization: OnceLock::new(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn user_identifier(&self) -> Option<&str> {
        self.user_identifier.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.authorization.get(), Some(Ok(_)))
    }

    /// `Authorization` header value, or `NotAuthenticated` unless authorize succeeded
    pub fn bearer(&self) -> Result<&str> {
        match self.authorization.get() {
            Some(Ok(token)) => Ok(token),
            _ => Err(Error::NotAuthenticated),
        }
    }

    /// Exchange the API key for a bearer token.
    ///
    /// Runs at most once per session. After a success this is a no-op; after
    /// a refusal the same `Authentication` error is returned again without a
    /// request, and every authenticated call fails with `NotAuthenticated`.
    pub async fn authorize(&self, gateway: &HttpGateway) -> Result<()> {
        match self.authorization.get() {
            Some(Ok(_)) => {
                debug!("session already authorized");
                return Ok(());
            }
            Some(Err(reason)) => return Err(Error::Authentication(reason.clone())),
            None => {}
        }

        let outcome = self.request_token(gateway).await;
        let stored = match outcome {
            Ok(token) => Ok(format!("Bearer {}", token)),
            Err(Error::Authentication(reason)) => Err(reason),
            Err(other) => Err(other.to_string()),
        };

        // A concurrent authorize may have won; the first outcome is kept either way.
        let _ = self.authorization.set(stored);

        match self.authorization.get() {
            Some(Ok(_)) => {
                info!("authorized against the WeTransfer API");
                Ok(())
            }
            Some(Err(reason)) => {
                warn!(%reason, "authorization refused; session disabled");
                Err(Error::Authentication(reason.clone()))
            }
            None => Err(Error::NotAuthenticated),
        }
    }

    async fn request_token(&self, gateway: &HttpGateway) -> Result<String> {
        let body = self
            .user_identifier
            .as_ref()
            .map(|id| json!({ "user_identifier": id }));

        let response = gateway.post_with_api_key(self, "authorize", body).await?;
        let authorized: AuthorizeResponse = response
            .expect_status(StatusCode::OK)
            .and_then(|r| r.json())
            .map_err(Error::Authentication)?;

        if authorized.token.is_empty() {
            return Err(Error::Authentication("200: empty token".to_string()));
        }

        Ok(authorized.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"***")
            .field("user_identifier", &self.user_identifier)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = Session::new("key", None);
        assert!(!session.is_authenticated());
        assert!(matches!(session.bearer(), Err(Error::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_unreachable_service_disables_session() {
        let gateway = HttpGateway::new(
            "http://127.0.0.1:1/v2",
            std::time::Duration::from_secs(2),
            false,
        )
        .unwrap();
        let session = Session::new("key", None);

        let first = session.authorize(&gateway).await.unwrap_err();
        let second = session.authorize(&gateway).await.unwrap_err();

        match (first, second) {
            (Error::Authentication(a), Error::Authentication(b)) => assert_eq!(a, b),
            other => panic!("unexpected errors: {other:?}"),
        }
        assert!(!session.is_authenticated());
        assert!(matches!(session.bearer(), Err(Error::NotAuthenticated)));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let session = Session::new("super-secret", Some("user".to_string()));
        let printed = format!("{:?}", session);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("user"));
    }
}
