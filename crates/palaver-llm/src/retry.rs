use std::future::Future;
use std::time::Duration;

use tracing::warn;

use palaver_core::config::RetryConfig;
use palaver_core::error::{ModelCallError, PalaverError, Result};
use palaver_core::traits::ModelClient;
use palaver_core::types::ModelOutput;

/// Bounded fixed-delay retry around a fallible model call.
///
/// A retry-requested failure sleeps `retry_delay_ms` between attempts
/// and exhausts into an `AgentRun` error wrapping the last message. A
/// transient backend failure sleeps the longer `transient_delay_ms`
/// and exhausts by surfacing the original error unchanged. Fatal
/// failures propagate immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Total attempts made before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Run `op` with retries per the configured policy.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ModelCallError>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(ModelCallError::RetryRequested(message)) => {
                    if attempt < max_attempts {
                        warn!(
                            attempt,
                            max_attempts,
                            %message,
                            "model requested retry"
                        );
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms))
                            .await;
                        continue;
                    }
                    return Err(PalaverError::AgentRun(format!(
                        "max retries exceeded: {message}"
                    )));
                }
                Err(err @ ModelCallError::Transient(_)) => {
                    if attempt < max_attempts {
                        warn!(
                            attempt,
                            max_attempts,
                            error = %err,
                            "transient backend failure, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(self.config.transient_delay_ms))
                            .await;
                        continue;
                    }
                    // Re-raised unchanged, not wrapped.
                    return Err(PalaverError::Model(err));
                }
                Err(err) => return Err(PalaverError::Model(err)),
            }
        }
    }

    /// Convenience wrapper: invoke a model client with retries.
    pub async fn invoke(&self, client: &dyn ModelClient, prompt: &str) -> Result<ModelOutput> {
        self.run(|| client.invoke(prompt)).await
    }
}
