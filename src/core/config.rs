use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

pub const MAINNET_WS_URL: &str = "wss://www.deribit.com/ws/api/v2";
pub const TESTNET_WS_URL: &str = "wss://test.deribit.com/ws/api/v2";

/// Session configuration: client credentials plus endpoint selection.
///
/// Credentials are held behind `secrecy::Secret` and never serialized or
/// logged in the clear.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub client_id: Secret<String>,
    pub client_secret: Secret<String>,
    pub testnet: bool,
    pub ws_url: Option<String>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for SessionConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SessionConfig", 4)?;
        state.serialize_field("client_id", "[REDACTED]")?;
        state.serialize_field("client_secret", "[REDACTED]")?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("ws_url", &self.ws_url)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for SessionConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SessionConfigHelper {
            client_id: String,
            client_secret: String,
            #[serde(default)]
            testnet: bool,
            #[serde(default)]
            ws_url: Option<String>,
        }

        let helper = SessionConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            client_id: Secret::new(helper.client_id),
            client_secret: Secret::new(helper.client_secret),
            testnet: helper.testnet,
            ws_url: helper.ws_url,
        })
    }
}

impl SessionConfig {
    /// Create a new configuration with client credentials
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id: Secret::new(client_id),
            client_secret: Secret::new(client_secret),
            testnet: false,
            ws_url: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DERIBIT_CLIENT_ID`
    /// - `DERIBIT_CLIENT_SECRET`
    /// - `DERIBIT_TESTNET` (optional, defaults to false)
    /// - `DERIBIT_WS_URL` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = env::var("DERIBIT_CLIENT_ID")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("DERIBIT_CLIENT_ID".into()))?;

        let client_secret = env::var("DERIBIT_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("DERIBIT_CLIENT_SECRET".into()))?;

        let testnet = env::var("DERIBIT_TESTNET")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let ws_url = env::var("DERIBIT_WS_URL").ok();

        Ok(Self {
            client_id: Secret::new(client_id),
            client_secret: Secret::new(client_secret),
            testnet,
            ws_url,
        })
    }

    /// Create configuration from a .env file and environment variables
    ///
    /// Loads `.env` first when it exists, then reads the standard variable
    /// names. Never commit `.env` files to version control.
    #[cfg(feature = "env-file")]
    pub fn from_env_file() -> Result<Self, ConfigError> {
        match dotenv::dotenv() {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // no .env file, system environment still applies
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file: {}",
                    e
                )));
            }
        }

        Self::from_env()
    }

    /// Check if this configuration carries usable credentials
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.expose_secret().is_empty()
            && !self.client_secret.expose_secret().is_empty()
    }

    /// Set testnet mode
    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Set a custom WebSocket endpoint
    #[must_use]
    pub fn ws_url(mut self, ws_url: String) -> Self {
        self.ws_url = Some(ws_url);
        self
    }

    /// Resolve the WebSocket endpoint for this configuration
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.ws_url.clone().unwrap_or_else(|| {
            if self.testnet {
                TESTNET_WS_URL.to_string()
            } else {
                MAINNET_WS_URL.to_string()
            }
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
