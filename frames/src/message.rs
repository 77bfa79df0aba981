//! Message vocabulary: bet records, control tokens and response grammars.

/// Announces the start of a submission phase.
pub const NEW_BET: &str = "NEW_BET";
/// Announces that every batch of the submission phase has been sent.
pub const ALL_SENT: &str = "ALL_SENT";
/// Prefix of the results request; the agency id follows after a comma.
pub const BET_RESULT: &str = "BET_RESULT";
/// Server reply rejecting a batch.
pub const ERR_INVALID_BET: &str = "ERR_INVALID_BET";
/// Poll reply while the draw has not happened yet.
pub const NOT_READY: &str = "NOT_READY";
/// Poll reply when the agency has no winners.
pub const NO_WINNERS: &str = "NO_WINNERS";

/// Separator between bet lines inside a batch payload.
pub const BATCH_SEPARATOR: char = '|';
/// Separator between winner identifiers in a poll reply.
pub const WINNER_SEPARATOR: char = '|';

/// Error returned when a server line does not match the expected grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("malformed {expected} response: {line:?}")]
    Malformed { expected: &'static str, line: String },
}

impl ResponseError {
    fn malformed(expected: &'static str, line: &str) -> Self {
        Self::Malformed {
            expected,
            line: line.to_owned(),
        }
    }
}

/// One lottery bet placed through an agency.
///
/// `number` stays textual so leading zeros survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetRecord {
    pub agency_id: String,
    pub first_name: String,
    pub last_name: String,
    pub document: String,
    /// ISO date text, e.g. `1999-03-17`.
    pub birthdate: String,
    pub number: String,
}

impl BetRecord {
    /// Encode as `agency,first,last,document,birthdate,number\n`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{},{}\n",
            self.agency_id,
            self.first_name,
            self.last_name,
            self.document,
            self.birthdate,
            self.number
        )
    }
}

/// Encode bets as one batch payload: bet lines joined with `|`.
#[must_use]
pub fn encode_batch(bets: &[BetRecord]) -> String {
    let mut out = String::new();
    for (index, bet) in bets.iter().enumerate() {
        if index > 0 {
            out.push(BATCH_SEPARATOR);
        }
        out.push_str(&bet.encode());
    }
    out
}

/// Build the `BET_RESULT,<agency>` poll request.
#[must_use]
pub fn bet_result_request(agency_id: &str) -> String {
    format!("{BET_RESULT},{agency_id}")
}

// =============================================================================
// BATCH ACKNOWLEDGEMENT
// =============================================================================

/// Counters returned by the server after a batch is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAck {
    pub processed_in_batch: u64,
    pub total_processed: u64,
}

/// Server verdict for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchReply {
    Ack(BatchAck),
    Rejected,
}

/// Parse the reply to a batch: `ERR_INVALID_BET` or `<processed>,<total>`.
///
/// Fields past the second are ignored.
///
/// # Errors
///
/// Returns [`ResponseError::Malformed`] when there are fewer than two fields
/// or either of the first two is not an unsigned integer.
pub fn parse_batch_reply(line: &str) -> Result<BatchReply, ResponseError> {
    let line = line.trim();
    if line == ERR_INVALID_BET {
        return Ok(BatchReply::Rejected);
    }

    let mut fields = line.split(',');
    let (Some(processed), Some(total)) = (fields.next(), fields.next()) else {
        return Err(ResponseError::malformed("batch ack", line));
    };
    let processed_in_batch = processed
        .trim()
        .parse::<u64>()
        .map_err(|_| ResponseError::malformed("batch ack", line))?;
    let total_processed = total
        .trim()
        .parse::<u64>()
        .map_err(|_| ResponseError::malformed("batch ack", line))?;

    Ok(BatchReply::Ack(BatchAck {
        processed_in_batch,
        total_processed,
    }))
}

// =============================================================================
// POLL OUTCOME
// =============================================================================

/// Answer to one `BET_RESULT` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The draw has not happened; ask again later.
    Pending,
    /// The draw happened and this agency has no winners.
    NoWinners,
    /// Winner identifiers in server order.
    Winners(Vec<String>),
}

impl PollOutcome {
    /// Parse a poll reply.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Malformed`] for an empty line or a winner
    /// list containing an empty identifier.
    pub fn parse(line: &str) -> Result<Self, ResponseError> {
        let line = line.trim();
        match line {
            NOT_READY => Ok(Self::Pending),
            NO_WINNERS => Ok(Self::NoWinners),
            "" => Err(ResponseError::malformed("poll", line)),
            _ => {
                let winners: Vec<String> = line
                    .split(WINNER_SEPARATOR)
                    .map(|id| id.trim().to_owned())
                    .collect();
                if winners.iter().any(String::is_empty) {
                    return Err(ResponseError::malformed("poll", line));
                }
                Ok(Self::Winners(winners))
            }
        }
    }
}

// =============================================================================
// SINGLE BET ACKNOWLEDGEMENT
// =============================================================================

/// Echo of a single submitted bet: `<document>,<number>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleBetAck {
    pub document: String,
    pub number: String,
}

impl SingleBetAck {
    /// Parse the echo line.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Malformed`] unless the line has exactly two
    /// non-empty comma-separated fields.
    pub fn parse(line: &str) -> Result<Self, ResponseError> {
        let line = line.trim();
        let Some((document, number)) = line.split_once(',') else {
            return Err(ResponseError::malformed("bet ack", line));
        };
        let (document, number) = (document.trim(), number.trim());
        if document.is_empty() || number.is_empty() || number.contains(',') {
            return Err(ResponseError::malformed("bet ack", line));
        }
        Ok(Self {
            document: document.to_owned(),
            number: number.to_owned(),
        })
    }

    /// True when the echo names exactly this bet.
    #[must_use]
    pub fn confirms(&self, bet: &BetRecord) -> bool {
        self.document == bet.document && self.number == bet.number
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
