//! Agency bet file loading.
//!
//! Each non-empty line is `first_name,last_name,document,birthdate,number`.
//! The agency id is not in the file; it comes from configuration.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use frames::{BATCH_SEPARATOR, BetRecord};

#[derive(Debug, thiserror::Error)]
pub enum BetSourceError {
    #[error("failed to open bet file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read bet file {} at line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Load every valid bet from `path`, in file order.
///
/// Malformed lines are logged and skipped.
pub fn load_bets(path: &Path, agency_id: &str) -> Result<Vec<BetRecord>, BetSourceError> {
    let file = File::open(path).map_err(|source| BetSourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_bets(BufReader::new(file), path, agency_id)
}

fn read_bets<R: BufRead>(reader: R, path: &Path, agency_id: &str) -> Result<Vec<BetRecord>, BetSourceError> {
    let mut bets = Vec::new();
    let mut skipped = 0_usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| BetSourceError::Read {
            path: path.to_path_buf(),
            line: line_no,
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_bet_line(&line, agency_id) {
            Some(bet) => bets.push(bet),
            None => {
                skipped += 1;
                tracing::warn!(line = line_no, content = %line, "skipping malformed bet record");
            }
        }
    }

    tracing::debug!(path = %path.display(), loaded = bets.len(), skipped, "bet file loaded");
    Ok(bets)
}

fn parse_bet_line(line: &str, agency_id: &str) -> Option<BetRecord> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split(',').map(str::trim).collect();
    let [first_name, last_name, document, birthdate, number] = fields.as_slice() else {
        return None;
    };
    // A pipe inside a field would split the record when batched.
    if fields.iter().any(|field| field.contains(BATCH_SEPARATOR)) {
        return None;
    }
    if document.is_empty() || number.is_empty() {
        return None;
    }

    Some(BetRecord {
        agency_id: agency_id.to_owned(),
        first_name: (*first_name).to_owned(),
        last_name: (*last_name).to_owned(),
        document: (*document).to_owned(),
        birthdate: (*birthdate).to_owned(),
        number: (*number).to_owned(),
    })
}

#[cfg(test)]
#[path = "bets_test.rs"]
mod tests;
