//! Network reachability checks.
//!
//! The sync layer asks [`Connectivity::is_online`] once at the start of every
//! load and every mutation. There is no subscription: a reconnect is only
//! noticed the next time something asks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use url::Url;

/// Answers "is the backend reachable right now?".
pub trait Connectivity: Send + Sync {
    /// Return `true` if remote calls are expected to succeed.
    fn is_online(&self) -> impl std::future::Future<Output = bool> + Send;
}

/// Connectivity flag set by hand. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct ManualConnectivity {
    online: Arc<AtomicBool>,
}

impl ManualConnectivity {
    /// Create a flag with the given initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// A flag that starts online.
    #[must_use]
    pub fn online() -> Self {
        Self::new(true)
    }

    /// A flag that starts offline.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(false)
    }

    /// Flip the flag.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ManualConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Errors building a [`ProbeConnectivity`].
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The server URL has no host.
    #[error("server url {0} has no host")]
    NoHost(Url),
    /// The server URL has no port and the scheme has no default.
    #[error("server url {0} has no port")]
    NoPort(Url),
}

/// Probes reachability by opening a TCP connection to the backend.
///
/// Online means a connection to the server's host and port completes within
/// the timeout. The connection is dropped immediately.
#[derive(Debug, Clone)]
pub struct ProbeConnectivity {
    target: String,
    timeout: Duration,
}

impl ProbeConnectivity {
    /// Build a probe for the host and port of `server`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the URL has no host or no usable port.
    pub fn new(server: &Url, timeout: Duration) -> Result<Self, ProbeError> {
        let host = server
            .host_str()
            .ok_or_else(|| ProbeError::NoHost(server.clone()))?;
        let port = server
            .port_or_known_default()
            .ok_or_else(|| ProbeError::NoPort(server.clone()))?;
        let target = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        Ok(Self { target, timeout })
    }

    /// The `host:port` being probed.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Connectivity for ProbeConnectivity {
    async fn is_online(&self) -> bool {
        let attempt = tokio::net::TcpStream::connect(&self.target);
        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                tracing::debug!(target_addr = %self.target, error = %err, "probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(target_addr = %self.target, "probe timed out");
                false
            }
        }
    }
}

/// Either a manual flag or a live probe, chosen at startup.
#[derive(Debug, Clone)]
pub enum AnyConnectivity {
    /// Fixed or test-controlled state.
    Manual(ManualConnectivity),
    /// Live TCP probe.
    Probe(ProbeConnectivity),
}

impl Connectivity for AnyConnectivity {
    async fn is_online(&self) -> bool {
        match self {
            Self::Manual(manual) => manual.is_online().await,
            Self::Probe(probe) => probe.is_online().await,
        }
    }
}
