//! Startup readiness handshake.
//!
//! The backend exposes no dedicated health route, so any HTTP answer (a 404
//! included) means its server loop is up. Connection errors mean it is not.

use crate::supervisor::{ReadinessSettings, SupervisorError, SupervisorResult};

use std::panic::Location;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use error_location::ErrorLocation;
use tracing::{debug, info};

pub struct ReadinessProbe {
    client: reqwest::Client,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReadinessProbe {
    pub fn new(settings: &ReadinessSettings) -> SupervisorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(settings.timeout_secs),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `base_url` until the backend answers.
    ///
    /// `exited` is consulted between attempts so a backend that dies during
    /// startup fails fast instead of running out the full timeout.
    /// Returns how long the backend took to answer.
    #[track_caller]
    pub fn wait_ready<'a, F>(
        &'a self,
        base_url: &'a str,
        exited: F,
    ) -> impl Future<Output = SupervisorResult<Duration>> + 'a
    where
        F: Fn() -> Option<ExitStatus> + 'a,
    {
        let location = Location::caller();
        self.poll_until_ready(base_url, exited, location)
    }

    async fn poll_until_ready<F>(
        &self,
        base_url: &str,
        exited: F,
        location: &'static Location<'static>,
    ) -> SupervisorResult<Duration>
    where
        F: Fn() -> Option<ExitStatus>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        while start.elapsed() < self.timeout {
            if let Some(status) = exited() {
                return Err(SupervisorError::BackendExited {
                    status: status.to_string(),
                    location: ErrorLocation::from(location),
                });
            }

            attempts += 1;
            match self.client.get(base_url).send().await {
                Ok(resp) => {
                    let elapsed = start.elapsed();
                    info!(
                        "Backend answered HTTP {} after {elapsed:?} ({attempts} attempts)",
                        resp.status()
                    );
                    return Ok(elapsed);
                }
                Err(e) => debug!("Backend not ready yet: {e}"),
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(SupervisorError::StartupTimeout {
            timeout_secs: self.timeout.as_secs(),
            location: ErrorLocation::from(location),
        })
    }
}
