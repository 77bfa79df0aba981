//! Results polling loop.
//!
//! Every attempt is a full connect, `BET_RESULT`, read one line, close cycle.
//! `NOT_READY` is the only answer that is retried; transport and protocol
//! failures end the loop immediately.

use std::num::NonZeroU32;
use std::time::Duration;

use frames::PollOutcome;

use crate::cancel::CancellationFlag;
use crate::connection::Connector;
use crate::error::ClientError;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub retry_delay: Duration,
    /// `None` polls until the server answers definitively or cancellation.
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            max_attempts: None,
        }
    }
}

/// Terminal result of the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Empty when the server answered `NO_WINNERS`.
    pub winners: Vec<String>,
    pub attempts: u32,
}

/// Ask for the agency's results until they are ready.
pub async fn poll_until_resolved<C>(
    connector: &C,
    agency_id: &str,
    settings: &PollSettings,
    cancel: &CancellationFlag,
) -> Result<Resolution, ClientError>
where
    C: Connector,
{
    let request = frames::bet_result_request(agency_id);
    let mut attempts = 0_u32;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(attempts, "results polling cancelled");
            return Err(ClientError::Cancelled);
        }
        if settings.max_attempts.is_some_and(|max| attempts >= max.get()) {
            return Err(ClientError::PollAttemptsExhausted { attempts });
        }

        attempts = attempts.saturating_add(1);
        let outcome = poll_once(connector, &request)
            .await
            .map_err(|source| ClientError::Poll {
                attempts,
                source: Box::new(source),
            })?;

        match outcome {
            PollOutcome::Pending => {
                tracing::debug!(attempt = attempts, delay = ?settings.retry_delay, "results not ready");
                if cancel.sleep(settings.retry_delay).await {
                    tracing::info!(attempts, "results polling cancelled");
                    return Err(ClientError::Cancelled);
                }
            }
            PollOutcome::NoWinners => {
                return Ok(Resolution {
                    winners: Vec::new(),
                    attempts,
                });
            }
            PollOutcome::Winners(winners) => return Ok(Resolution { winners, attempts }),
        }
    }
}

async fn poll_once<C>(connector: &C, request: &str) -> Result<PollOutcome, ClientError>
where
    C: Connector,
{
    let mut conn = connector.connect().await?;
    let result: Result<PollOutcome, ClientError> = async {
        conn.send(request).await?;
        let line = conn.recv_line().await?;
        Ok(PollOutcome::parse(&line)?)
    }
    .await;
    conn.close().await;
    result
}

#[cfg(test)]
#[path = "poll_test.rs"]
mod tests;
