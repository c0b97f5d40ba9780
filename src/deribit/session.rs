use crate::core::config::SessionConfig;
use crate::core::errors::SessionError;
use crate::core::kernel::{RpcClient, WsTransport};
use crate::core::traits::TradeStore;
use crate::core::types::SessionState;
use crate::deribit::auth::Authenticator;
use serde_json::Value;
use std::sync::Mutex;
use tracing::{info, instrument};

/// One authenticated trading session against Deribit.
///
/// The session exclusively owns its WebSocket connection, access token and
/// store handle. All calls run through the single-flight request engine,
/// so issuance order is the observable order. A session whose handshake
/// failed, or whose transport dropped, is not revived in place: construct
/// a new one.
pub struct DeribitSession<T: WsTransport> {
    rpc: RpcClient<T>,
    config: SessionConfig,
    lifecycle: Mutex<Lifecycle>,
    store: Option<Box<dyn TradeStore>>,
}

struct Lifecycle {
    state: SessionState,
    auth: Authenticator,
}

impl<T: WsTransport> DeribitSession<T> {
    /// Assemble a session over an already-constructed transport. Nothing
    /// is connected until `connect` is called.
    pub fn with_transport(
        transport: T,
        config: SessionConfig,
        store: Option<Box<dyn TradeStore>>,
    ) -> Self {
        Self {
            rpc: RpcClient::new(transport),
            config,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Disconnected,
                auth: Authenticator::new(),
            }),
            store,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lifecycle.lock().expect("lifecycle lock poisoned").state
    }

    fn set_state(&self, state: SessionState) {
        self.lifecycle.lock().expect("lifecycle lock poisoned").state = state;
    }

    /// Open the WebSocket connection.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<(), SessionError> {
        self.rpc.connect().await?;
        self.set_state(SessionState::Connected);
        info!("connected");
        Ok(())
    }

    /// Run the client-credentials handshake and gate private calls on its
    /// outcome. A rejected or malformed handshake leaves the session
    /// `Failed`, which is terminal for this instance.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<(), SessionError> {
        let params = {
            let mut lifecycle = self.lifecycle.lock().expect("lifecycle lock poisoned");
            match lifecycle.state {
                SessionState::Authenticated => return Ok(()),
                SessionState::Disconnected => {
                    return Err(SessionError::Transport(
                        "cannot authenticate while disconnected".to_string(),
                    ));
                }
                SessionState::Failed => {
                    return Err(SessionError::Authentication(
                        "session already failed, reconstruct it".to_string(),
                    ));
                }
                SessionState::Connected => lifecycle.auth.begin(&self.config),
            }
        };

        match self.rpc.call("public/auth", params).await {
            Ok(result) => {
                let mut lifecycle = self.lifecycle.lock().expect("lifecycle lock poisoned");
                match lifecycle.auth.complete(result) {
                    Ok(()) => {
                        lifecycle.state = SessionState::Authenticated;
                        info!("authenticated");
                        Ok(())
                    }
                    Err(e) => {
                        lifecycle.state = SessionState::Failed;
                        Err(e)
                    }
                }
            }
            Err(SessionError::Exchange { code, message }) => {
                let mut lifecycle = self.lifecycle.lock().expect("lifecycle lock poisoned");
                lifecycle.auth.fail();
                lifecycle.state = SessionState::Failed;
                Err(SessionError::Authentication(format!(
                    "handshake rejected: {} - {}",
                    code, message
                )))
            }
            Err(e) => {
                self.track_failure(&e);
                Err(e)
            }
        }
    }

    /// Close the connection and release the transport. The store handle is
    /// dropped with the session.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<(), SessionError> {
        self.rpc.close().await?;
        self.set_state(SessionState::Disconnected);
        info!("closed");
        Ok(())
    }

    /// Issue an authenticated call. Rejected locally, without touching the
    /// transport, unless the handshake has succeeded.
    pub(crate) async fn private_call(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, SessionError> {
        {
            let lifecycle = self.lifecycle.lock().expect("lifecycle lock poisoned");
            if lifecycle.state != SessionState::Authenticated || !lifecycle.auth.is_authenticated()
            {
                return Err(SessionError::NotAuthenticated);
            }
        }
        self.dispatch(method, params).await
    }

    /// Issue a public call. Usable from `Connected` on; a failed session
    /// stays unusable.
    pub(crate) async fn public_call(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, SessionError> {
        match self.state() {
            SessionState::Disconnected => {
                return Err(SessionError::Transport("not connected".to_string()));
            }
            SessionState::Failed => {
                return Err(SessionError::Authentication(
                    "session already failed, reconstruct it".to_string(),
                ));
            }
            SessionState::Connected | SessionState::Authenticated => {}
        }
        self.dispatch(method, params).await
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        let result = self.rpc.call(method, params).await;
        if let Err(e) = &result {
            self.track_failure(e);
        }
        result
    }

    /// A lost transport leaves the session `Disconnected`.
    fn track_failure(&self, error: &SessionError) {
        if matches!(error, SessionError::Transport(_)) {
            self.set_state(SessionState::Disconnected);
        }
    }

    pub(crate) fn store(&self) -> Option<&dyn TradeStore> {
        self.store.as_deref()
    }
}
