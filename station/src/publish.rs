//! One telemetry beat per wake, with a single reconnect on connectivity loss.

use std::fmt;

use log::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Link, socket or broker reachability; worth one reconnect.
    Connectivity(String),
    /// The hub refused or mangled the exchange.
    Protocol(String),
    /// Connection string or token problems; reconnecting cannot help.
    Credentials(String),
}

impl PublishError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity(msg) => write!(f, "hub connectivity fault: {}", msg),
            Self::Protocol(msg) => write!(f, "hub protocol fault: {}", msg),
            Self::Credentials(msg) => write!(f, "hub credential fault: {}", msg),
        }
    }
}

impl std::error::Error for PublishError {}

/// The station's network interface as seen by the recovery sequence.
#[allow(async_fn_in_trait)]
pub trait NetworkLink {
    async fn reset(&mut self) -> anyhow::Result<()>;
    async fn connect(&mut self) -> anyhow::Result<()>;
}

/// A session with the cloud message hub.
#[allow(async_fn_in_trait)]
pub trait HubLink {
    async fn connect(&mut self) -> Result<(), PublishError>;
    async fn send(&mut self, payload: &str) -> Result<(), PublishError>;
    async fn reconnect(&mut self) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Sent,
    SentAfterReconnect,
}

#[derive(Debug)]
pub enum RecoveryFailure {
    Network(anyhow::Error),
    Hub(PublishError),
}

impl fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network recovery failed: {:#}", e),
            Self::Hub(e) => write!(f, "{}", e),
        }
    }
}

/// Connects, sends `payload` once and, on a retriable fault, runs exactly one
/// reset → reconnect → hub reconnect → resend sequence. Anything else, and
/// any fault inside the recovery sequence, is returned to the caller.
pub async fn publish_with_recovery<N, H>(
    network: &mut N,
    hub: &mut H,
    payload: &str,
) -> anyhow::Result<PublishOutcome>
where
    N: NetworkLink,
    H: HubLink,
{
    let first = match hub.connect().await {
        Ok(()) => hub.send(payload).await,
        Err(e) => Err(e),
    };

    match first {
        Ok(()) => {
            info!("Telemetry sent");
            Ok(PublishOutcome::Sent)
        }
        Err(e) if e.is_retriable() => {
            warn!("Connection error, reconnecting: {}", e);
            recover_and_resend(network, hub, payload)
                .await
                .map_err(|failure| anyhow::anyhow!("Telemetry recovery failed: {}", failure))?;
            info!("Telemetry sent after reconnect");
            Ok(PublishOutcome::SentAfterReconnect)
        }
        Err(e) => Err(anyhow::Error::new(e).context("Telemetry publish failed")),
    }
}

async fn recover_and_resend<N, H>(
    network: &mut N,
    hub: &mut H,
    payload: &str,
) -> Result<(), RecoveryFailure>
where
    N: NetworkLink,
    H: HubLink,
{
    network.reset().await.map_err(RecoveryFailure::Network)?;
    network.connect().await.map_err(RecoveryFailure::Network)?;
    hub.reconnect().await.map_err(RecoveryFailure::Hub)?;
    hub.send(payload).await.map_err(RecoveryFailure::Hub)
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct FakeNetwork {
        pub resets: usize,
        pub connects: usize,
        pub fail_connect: bool,
    }

    impl NetworkLink for FakeNetwork {
        async fn reset(&mut self) -> anyhow::Result<()> {
            self.resets += 1;
            Ok(())
        }

        async fn connect(&mut self) -> anyhow::Result<()> {
            self.connects += 1;
            if self.fail_connect {
                anyhow::bail!("no access point");
            }
            Ok(())
        }
    }

    /// Scripted send results, consumed in order; an empty script succeeds.
    #[derive(Default)]
    pub struct FakeHub {
        pub sends: VecDeque<Result<(), PublishError>>,
        pub sent: Vec<String>,
        pub attempts: usize,
        pub connects: usize,
        pub reconnects: usize,
    }

    impl FakeHub {
        pub fn scripted(results: impl IntoIterator<Item = Result<(), PublishError>>) -> Self {
            Self {
                sends: results.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    impl HubLink for FakeHub {
        async fn connect(&mut self) -> Result<(), PublishError> {
            self.connects += 1;
            Ok(())
        }

        async fn send(&mut self, payload: &str) -> Result<(), PublishError> {
            self.attempts += 1;
            let result = self.sends.pop_front().unwrap_or(Ok(()));
            if result.is_ok() {
                self.sent.push(payload.to_string());
            }
            result
        }

        async fn reconnect(&mut self) -> Result<(), PublishError> {
            self.reconnects += 1;
            Ok(())
        }
    }
}
