//! Single sign-on login flow.
//!
//! The provider window is opened by the caller with the `auth_url` published
//! in [`SsoState::AwaitingProvider`]; the flow then polls the backend with the
//! ticket until a session shows up, the attempts run out or it is cancelled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::error::Result;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 300;
pub const TIMED_OUT: &str = "timed out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsoProvider {
    Google,
    Github,
}

impl fmt::Display for SsoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SsoProvider::Google => f.write_str("google"),
            SsoProvider::Github => f.write_str("github"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoTicket {
    pub uuid: String,
    pub auth_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoSession {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsoState {
    Idle,
    AwaitingProvider { auth_url: String },
    Polling { attempt: u32 },
    Success(SsoSession),
    Failed(String),
    Cancelled,
}

impl SsoState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SsoState::Success(_) | SsoState::Failed(_) | SsoState::Cancelled
        )
    }
}

/// Authentication backend reached by the flow.
#[async_trait]
pub trait SsoBackend: Send + Sync + 'static {
    /// Creates a login ticket for `provider`.
    async fn generate(&self, provider: SsoProvider) -> Result<SsoTicket>;

    /// `None` while the user has not finished logging in with the provider.
    async fn poll(&self, provider: SsoProvider, uuid: &str) -> Result<Option<SsoSession>>;
}

#[derive(Debug, Clone, Copy)]
pub struct SsoConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Handle to a running login flow. Dropping it cancels the flow.
pub struct SsoFlow {
    state: watch::Receiver<SsoState>,
    cancel: CancellationToken,
    task: JoinHandle<SsoState>,
    _cancel_on_drop: DropGuard,
}

impl SsoFlow {
    pub fn start<B: SsoBackend>(backend: Arc<B>, provider: SsoProvider, config: SsoConfig) -> Self {
        let (tx, rx) = watch::channel(SsoState::Idle);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(backend, provider, config, tx, cancel.clone()));

        Self {
            state: rx,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    pub fn state(&self) -> SsoState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SsoState> {
        self.state.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the flow to reach a terminal state.
    pub async fn wait(self) -> SsoState {
        let SsoFlow {
            task,
            _cancel_on_drop,
            ..
        } = self;

        match task.await {
            Ok(state) => state,
            Err(e) => {
                warn!("SSO task failed: {}", e);
                SsoState::Failed(e.to_string())
            }
        }
    }
}

async fn run<B: SsoBackend>(
    backend: Arc<B>,
    provider: SsoProvider,
    config: SsoConfig,
    tx: watch::Sender<SsoState>,
    cancel: CancellationToken,
) -> SsoState {
    let state = tokio::select! {
        _ = cancel.cancelled() => SsoState::Cancelled,
        state = drive(backend.as_ref(), provider, config, &tx) => state,
    };

    match &state {
        SsoState::Success(_) => info!("SSO login with {} succeeded", provider),
        SsoState::Failed(reason) => warn!("SSO login with {} failed: {}", provider, reason),
        _ => info!("SSO login with {} cancelled", provider),
    }

    tx.send_replace(state.clone());
    state
}

async fn drive<B: SsoBackend>(
    backend: &B,
    provider: SsoProvider,
    config: SsoConfig,
    tx: &watch::Sender<SsoState>,
) -> SsoState {
    let ticket = match backend.generate(provider).await {
        Ok(ticket) => ticket,
        Err(e) => return SsoState::Failed(e.to_string()),
    };

    tx.send_replace(SsoState::AwaitingProvider {
        auth_url: ticket.auth_url.clone(),
    });

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.poll_interval).await;
        tx.send_replace(SsoState::Polling { attempt });

        match backend.poll(provider, &ticket.uuid).await {
            Ok(Some(session)) => return SsoState::Success(session),
            Ok(None) => debug!("SSO ticket {} not ready (attempt {})", ticket.uuid, attempt),
            Err(e) => warn!("SSO poll attempt {} failed: {}", attempt, e),
        }
    }

    SsoState::Failed(TIMED_OUT.to_string())
}
