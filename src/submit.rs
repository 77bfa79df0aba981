//! Batch submission engine.
//!
//! DESIGN
//! ======
//! Bets go out in source order, in consecutive chunks of at most
//! `max_batch_size`. Each chunk is one frame followed by exactly one reply
//! line. The phase is bracketed by `NEW_BET` and `ALL_SENT` control frames.
//!
//! There is no retry. A rejected batch ends the phase, and the running total
//! at that point is informational only: the server protocol has no way to
//! resume a partially accepted submission.

use std::num::NonZeroUsize;

use frames::{ALL_SENT, BatchReply, BetRecord, NEW_BET, SingleBetAck};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::cancel::CancellationFlag;
use crate::connection::Connection;
use crate::error::ClientError;

/// Totals for a completed submission phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReport {
    pub batches: usize,
    /// Sum of the per-batch processed counts acknowledged by the server.
    pub total_processed: u64,
    /// The server's own running total from the last acknowledgement.
    pub server_total: u64,
}

/// Split bets into consecutive batches of at most `max_batch_size`.
pub fn partition(bets: &[BetRecord], max_batch_size: NonZeroUsize) -> std::slice::Chunks<'_, BetRecord> {
    bets.chunks(max_batch_size.get())
}

/// Submit every bet over `conn` and announce the end of the phase.
pub async fn submit<S>(
    conn: &mut Connection<S>,
    bets: &[BetRecord],
    max_batch_size: NonZeroUsize,
    cancel: &CancellationFlag,
) -> Result<SubmissionReport, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.send(NEW_BET).await?;

    let mut report = SubmissionReport {
        batches: 0,
        total_processed: 0,
        server_total: 0,
    };

    for (index, batch) in partition(bets, max_batch_size).enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(sent_batches = report.batches, "submission cancelled");
            return Err(ClientError::Cancelled);
        }

        let number = index + 1;
        let payload = frames::encode_batch(batch);
        tracing::debug!(batch = number, batch_size = batch.len(), bytes = payload.len(), "sending batch");
        conn.send(&payload).await?;

        let line = conn.recv_line().await?;
        match frames::parse_batch_reply(&line)? {
            BatchReply::Rejected => {
                tracing::warn!(
                    batch = number,
                    acknowledged = report.total_processed,
                    "server rejected batch"
                );
                return Err(ClientError::ServerRejectedBatch {
                    batch: number,
                    acknowledged: report.total_processed,
                });
            }
            BatchReply::Ack(ack) => {
                report.batches = number;
                report.total_processed = report.total_processed.saturating_add(ack.processed_in_batch);
                report.server_total = ack.total_processed;
                tracing::info!(
                    batch = number,
                    processed = ack.processed_in_batch,
                    total = report.total_processed,
                    "batch acknowledged"
                );
            }
        }
    }

    conn.send(ALL_SENT).await?;
    Ok(report)
}

/// Submit one bet on its own and check the server echoed exactly that bet.
pub async fn submit_single<S>(conn: &mut Connection<S>, bet: &BetRecord) -> Result<SingleBetAck, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    conn.send(&bet.encode()).await?;
    let line = conn.recv_line().await?;
    let ack = SingleBetAck::parse(&line)?;

    if !ack.confirms(bet) {
        return Err(ClientError::AckMismatch {
            document: bet.document.clone(),
            number: bet.number.clone(),
            got_document: ack.document,
            got_number: ack.number,
        });
    }
    Ok(ack)
}

#[cfg(test)]
#[path = "submit_test.rs"]
mod tests;
