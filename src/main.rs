mod bets;
mod cancel;
mod config;
mod connection;
mod error;
mod poll;
mod session;
mod submit;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cancel::CancellationFlag;
use crate::config::{Cli, ClientConfig};
use crate::connection::TcpConnector;
use crate::error::ClientError;
use crate::poll::PollSettings;
use crate::session::{Session, SessionSettings};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ClientConfig::load(Cli::parse()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("invalid configuration: {error}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_level);

    tracing::info!(
        agency = %config.id,
        server = %config.server_address,
        batch_size = config.max_batch_size.get(),
        "client starting"
    );

    let cancel = CancellationFlag::new();
    let _signals = cancel::spawn_signal_listener(cancel.clone());

    match run(&config, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ClientError::Cancelled) => {
            tracing::info!(agency = %config.id, "client stopped by shutdown signal");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(agency = %config.id, kind = error.kind(), error = %error, "client failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &ClientConfig, cancel: CancellationFlag) -> Result<(), ClientError> {
    let connector = TcpConnector::new(config.server_address.clone(), config.connect_delay, config.io_timeout);
    let settings = SessionSettings {
        agency_id: config.id.clone(),
        max_batch_size: config.max_batch_size,
        poll: PollSettings {
            retry_delay: config.poll_retry,
            max_attempts: config.poll_max_attempts,
        },
    };
    let session = Session::new(settings, connector, cancel);

    if let Some(bet) = &config.single_bet {
        session.run_single(bet).await?;
        return Ok(());
    }

    let bets = bets::load_bets(&config.data_file, &config.id)?;
    let report = session.run(&bets).await?;
    tracing::info!(
        agency = %config.id,
        submitted = report.submission.total_processed,
        winners = report.winners.len(),
        poll_attempts = report.poll_attempts,
        "client finished"
    );
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
