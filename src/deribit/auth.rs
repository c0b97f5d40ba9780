use crate::core::config::SessionConfig;
use crate::core::errors::SessionError;
use crate::deribit::types::AuthResult;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};

const AUTH_SCOPE: &str = "trade:read_write";

/// Handshake progress. `Failed` is terminal for this session instance;
/// no automatic re-authentication or token refresh is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingToken,
    Authenticated,
    Failed,
}

/// Client-credentials authenticator.
///
/// Builds the `public/auth` parameter envelope and interprets its result;
/// the session drives it through the request engine. The access token is
/// kept wrapped and gates every private call.
#[derive(Debug)]
pub struct Authenticator {
    state: AuthState,
    access_token: Option<Secret<String>>,
    refresh_token: Option<Secret<String>>,
    expires_in: Option<i64>,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator {
    pub fn new() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            access_token: None,
            refresh_token: None,
            expires_in: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Start the handshake: produce the `public/auth` params and move to
    /// `AwaitingToken`.
    pub fn begin(&mut self, config: &SessionConfig) -> Value {
        self.state = AuthState::AwaitingToken;
        json!({
            "grant_type": "client_credentials",
            "client_id": config.client_id.expose_secret(),
            "client_secret": config.client_secret.expose_secret(),
            "scope": AUTH_SCOPE,
        })
    }

    /// Finish the handshake from the `public/auth` result. A payload
    /// without an `access_token` leaves the authenticator `Failed`.
    pub fn complete(&mut self, result: Value) -> Result<(), SessionError> {
        let parsed: AuthResult = match serde_json::from_value(result) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.state = AuthState::Failed;
                return Err(SessionError::Authentication(format!(
                    "malformed auth result: {}",
                    e
                )));
            }
        };

        self.access_token = Some(Secret::new(parsed.access_token));
        self.refresh_token = parsed.refresh_token.map(Secret::new);
        self.expires_in = parsed.expires_in;
        self.state = AuthState::Authenticated;
        Ok(())
    }

    /// Record a rejected handshake. Terminal.
    pub fn fail(&mut self) {
        self.state = AuthState::Failed;
    }

    pub fn access_token(&self) -> Option<&Secret<String>> {
        self.access_token.as_ref()
    }

    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> SessionConfig {
        SessionConfig::new("client-id".into(), "client-secret".into())
    }

    #[test]
    fn begin_builds_client_credentials_params() {
        let mut auth = Authenticator::new();
        let params = auth.begin(&test_config());

        assert_eq!(params["grant_type"], "client_credentials");
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["client_secret"], "client-secret");
        assert_eq!(params["scope"], "trade:read_write");
        assert_eq!(auth.state(), AuthState::AwaitingToken);
    }

    #[test]
    fn complete_stores_token_and_authenticates() {
        let mut auth = Authenticator::new();
        auth.begin(&test_config());
        auth.complete(json!({
            "access_token": "tok-123",
            "refresh_token": "ref-456",
            "expires_in": 900,
            "scope": "trade:read_write"
        }))
        .unwrap();

        assert!(auth.is_authenticated());
        assert_eq!(auth.access_token().unwrap().expose_secret(), "tok-123");
        assert_eq!(auth.expires_in(), Some(900));
    }

    #[test]
    fn missing_access_token_is_terminal_failure() {
        let mut auth = Authenticator::new();
        auth.begin(&test_config());
        let err = auth.complete(json!({"token_type": "bearer"})).unwrap_err();

        assert!(matches!(err, SessionError::Authentication(_)));
        assert_eq!(auth.state(), AuthState::Failed);
        assert!(auth.access_token().is_none());
    }
}
