//! Client session controller.
//!
//! Runs the submission phase on one connection, closes it, then runs the
//! results polling loop (one fresh connection per attempt). Cancellation is
//! checked before each phase; the phases check it again at their own loop
//! boundaries.

use std::num::NonZeroUsize;

use frames::{BetRecord, SingleBetAck};

use crate::cancel::CancellationFlag;
use crate::connection::Connector;
use crate::error::ClientError;
use crate::poll::{self, PollSettings};
use crate::submit::{self, SubmissionReport};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub agency_id: String,
    pub max_batch_size: NonZeroUsize,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub submission: SubmissionReport,
    pub winners: Vec<String>,
    pub poll_attempts: u32,
}

pub struct Session<C> {
    settings: SessionSettings,
    connector: C,
    cancel: CancellationFlag,
}

impl<C> Session<C>
where
    C: Connector,
{
    pub fn new(settings: SessionSettings, connector: C, cancel: CancellationFlag) -> Self {
        Self {
            settings,
            connector,
            cancel,
        }
    }

    /// Submit `bets` in batches, then poll until the agency's winners are known.
    pub async fn run(&self, bets: &[BetRecord]) -> Result<SessionReport, ClientError> {
        let agency = self.settings.agency_id.as_str();

        self.checkpoint("submission")?;
        tracing::info!(agency, bets = bets.len(), batch_size = self.settings.max_batch_size.get(), "submitting bets");
        let submission = self
            .submit_phase(bets)
            .await
            .inspect_err(|error| log_phase_failure("submission", agency, error))?;
        tracing::info!(
            agency,
            batches = submission.batches,
            total = submission.total_processed,
            server_total = submission.server_total,
            "all bets sent"
        );

        self.checkpoint("results")?;
        tracing::info!(agency, "polling for winners");
        let resolution = poll::poll_until_resolved(&self.connector, agency, &self.settings.poll, &self.cancel)
            .await
            .inspect_err(|error| log_phase_failure("results", agency, error))?;
        tracing::info!(
            agency,
            winners = resolution.winners.len(),
            attempts = resolution.attempts,
            "winners received"
        );

        Ok(SessionReport {
            submission,
            winners: resolution.winners,
            poll_attempts: resolution.attempts,
        })
    }

    /// Submit one bet on its own connection. No polling follows.
    pub async fn run_single(&self, bet: &BetRecord) -> Result<SingleBetAck, ClientError> {
        let agency = self.settings.agency_id.as_str();
        self.checkpoint("single bet")?;

        let mut conn = self
            .connector
            .connect()
            .await
            .inspect_err(|error| log_phase_failure("single bet", agency, error))?;
        let result = submit::submit_single(&mut conn, bet).await;
        conn.close().await;

        let ack = result.inspect_err(|error| log_phase_failure("single bet", agency, error))?;
        tracing::info!(agency, document = %ack.document, number = %ack.number, "bet stored");
        Ok(ack)
    }

    async fn submit_phase(&self, bets: &[BetRecord]) -> Result<SubmissionReport, ClientError> {
        let mut conn = self.connector.connect().await?;
        let result = submit::submit(&mut conn, bets, self.settings.max_batch_size, &self.cancel).await;
        conn.close().await;
        result
    }

    fn checkpoint(&self, phase: &'static str) -> Result<(), ClientError> {
        if self.cancel.is_cancelled() {
            tracing::info!(phase, "shutdown requested; skipping phase");
            return Err(ClientError::Cancelled);
        }
        Ok(())
    }
}

fn log_phase_failure(phase: &'static str, agency: &str, error: &ClientError) {
    if matches!(error, ClientError::Cancelled) {
        return;
    }
    tracing::error!(phase, agency, kind = error.kind(), error = %error, "phase failed");
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
