//! Error taxonomy shared by the submission, polling and session layers.

use frames::{FrameError, ResponseError};

use crate::bets::BetSourceError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection i/o failed: {0}")]
    Io(#[source] std::io::Error),
    #[error("message of {len} bytes exceeds max frame payload of {max} bytes; lower the batch size")]
    MessageTooLarge { len: usize, max: usize },
    #[error("server rejected batch {batch} after {acknowledged} acknowledged bets")]
    ServerRejectedBatch { batch: usize, acknowledged: u64 },
    #[error("{0}")]
    MalformedResponse(#[from] ResponseError),
    #[error("results poll failed on attempt {attempts}: {source}")]
    Poll {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },
    #[error("results still not ready after {attempts} attempts")]
    PollAttemptsExhausted { attempts: u32 },
    #[error("server acknowledged {got_document},{got_number} instead of {document},{number}")]
    AckMismatch {
        document: String,
        number: String,
        got_document: String,
        got_number: String,
    },
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Source(#[from] BetSourceError),
}

impl From<FrameError> for ClientError {
    fn from(error: FrameError) -> Self {
        match error {
            FrameError::TooLarge { len, max } => Self::MessageTooLarge { len, max },
            FrameError::LineTooLong { max } => Self::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("response line exceeds {max} bytes"),
            )),
            FrameError::Io(error) => Self::Io(error),
        }
    }
}

impl ClientError {
    /// Short machine-friendly label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Io(_) => "io",
            Self::MessageTooLarge { .. } => "message_too_large",
            Self::ServerRejectedBatch { .. } => "server_rejected_batch",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Poll { .. } => "poll",
            Self::PollAttemptsExhausted { .. } => "poll_attempts_exhausted",
            Self::AckMismatch { .. } => "ack_mismatch",
            Self::Cancelled => "cancelled",
            Self::Source(_) => "bet_source",
        }
    }
}
