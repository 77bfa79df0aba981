//! Connection wrapper and connection factory.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::ClientError;

/// One open connection to the lottery server.
///
/// Writes go out as length-prefixed frames; reads come back as text lines.
pub struct Connection<S> {
    stream: BufReader<S>,
    io_timeout: Option<Duration>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, io_timeout: Option<Duration>) -> Self {
        Self {
            stream: BufReader::new(stream),
            io_timeout,
        }
    }

    /// Send `payload` as one frame.
    pub async fn send(&mut self, payload: &str) -> Result<(), ClientError> {
        bounded(
            self.io_timeout,
            frames::write_frame(&mut self.stream, payload.as_bytes()),
        )
        .await
    }

    /// Receive one response line, terminator stripped.
    pub async fn recv_line(&mut self) -> Result<String, ClientError> {
        bounded(self.io_timeout, frames::read_line(&mut self.stream)).await
    }

    /// Shut down the write half and drop the stream.
    pub async fn close(mut self) {
        if let Err(error) = self.stream.get_mut().shutdown().await {
            tracing::debug!(error = %error, "connection shutdown failed");
        }
    }
}

async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, frames::FrameError>>,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ClientError::Io(std::io::ErrorKind::TimedOut.into()))?,
        None => fut.await,
    };
    result.map_err(ClientError::from)
}

/// Opens connections for the session and for every poll attempt.
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    fn connect(&self) -> impl Future<Output = Result<Connection<Self::Stream>, ClientError>> + Send;
}

/// Dials the server over TCP after a fixed pre-connect delay.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    connect_delay: Duration,
    io_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>, connect_delay: Duration, io_timeout: Option<Duration>) -> Self {
        Self {
            address: address.into(),
            connect_delay,
            io_timeout,
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> Result<Connection<TcpStream>, ClientError> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let dial = TcpStream::connect(self.address.as_str());
        let stream = match self.io_timeout {
            Some(limit) => tokio::time::timeout(limit, dial)
                .await
                .unwrap_or_else(|_| Err(std::io::ErrorKind::TimedOut.into())),
            None => dial.await,
        }
        .map_err(|source| ClientError::Connect {
            address: self.address.clone(),
            source,
        })?;

        if let Err(error) = stream.set_nodelay(true) {
            tracing::debug!(error = %error, "failed to set TCP_NODELAY");
        }
        tracing::debug!(address = %self.address, "connected");
        Ok(Connection::new(stream, self.io_timeout))
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
