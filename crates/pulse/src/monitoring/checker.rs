use std::time::{Duration, Instant};

use tracing::debug;

use super::types::{Outcome, Target, TargetKind};
use crate::error::ProbeError;

/// Default timeout for a single HTTP probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(7000);

/// Checker trait for probing a single target
///
/// Implementations never fail on network trouble: an unreachable endpoint is a
/// down [`Outcome`]. `Err` is reserved for the probe itself misbehaving, which
/// the scheduler logs and leaves out of the cycle.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, target: &Target) -> Result<Outcome, ProbeError>;
}

/// HTTP GET checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Probe an arbitrary URL, used by ad-hoc tests as well as targets.
    pub async fn check_url(&self, url: &str) -> Outcome {
        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                // Drain the body so latency covers the full response.
                let status = response.status();
                if let Err(e) = response.bytes().await {
                    debug!(url, error = %e, "HTTP probe failed reading body");
                    return Outcome::unreachable();
                }
                let latency = start.elapsed().as_millis() as u64;

                // Consider 2xx and 3xx as success
                if status.is_success() || status.is_redirection() {
                    Outcome::up(status.as_u16(), latency)
                } else {
                    Outcome::rejected(status.as_u16(), latency)
                }
            }
            Err(e) => {
                debug!(url, error = %e, "HTTP probe failed");
                Outcome::unreachable()
            }
        }
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &Target) -> Result<Outcome, ProbeError> {
        match target.kind {
            TargetKind::Http => Ok(self.check_url(&target.url).await),
        }
    }
}
